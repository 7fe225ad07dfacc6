/// Writes generated artifacts into the target project tree.
pub mod materializer;
/// Builds a Markdown summary of a generation run.
pub mod report;
