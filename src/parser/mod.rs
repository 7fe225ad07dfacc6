/// Identifier normalization and the name mappers (class stems, file stems, attribute identifiers).
pub mod names;
/// Keyword-based read-only screening of user statements.
pub mod read_only;
/// Thin wrapper around `sqlparser` for projection and join analysis.
pub mod sql_parser;
