//! Keyword-based read-only check for user-supplied statements.
//!
//! This is a syntactic screen, not a parse. Statements whose leading keyword
//! writes data, changes the schema or the connection are refused; anything
//! else is left to the engine, which reports unknown words as syntax errors.
//! A `WITH` statement is judged by the statement that follows its CTE list.
//! Multi-statement input is only caught when the engine refuses it.

use crate::error::ScaffoldError;

/// Leading keywords of statements that must not run against the sample database.
const REJECTED_KEYWORDS: [&str; 19] = [
    "INSERT", "UPDATE", "DELETE", "REPLACE", "UPSERT", "DROP", "ALTER", "CREATE", "PRAGMA",
    "ATTACH", "DETACH", "VACUUM", "REINDEX", "ANALYZE", "BEGIN", "COMMIT", "END", "ROLLBACK",
    "SAVEPOINT",
];

/// Statements a CTE list may introduce that write data.
const MUTATING_KEYWORDS: [&str; 4] = ["INSERT", "UPDATE", "DELETE", "REPLACE"];

/// Verify that `statement` does not start like a mutating statement.
///
/// Returns [`ScaffoldError::NotReadOnly`] carrying the offending keyword
/// otherwise. An empty statement is reported with an empty keyword.
pub fn check_read_only(statement: &str) -> Result<(), ScaffoldError> {
    let tokens = top_level_tokens(statement);
    let first = match tokens.first() {
        None => {
            return Err(ScaffoldError::NotReadOnly {
                keyword: String::new(),
            })
        }
        Some(Token::Word(word)) => word.as_str(),
        Some(_) => return Ok(()),
    };

    if REJECTED_KEYWORDS.contains(&first) {
        return Err(not_read_only(first));
    }

    if first == "WITH" {
        let keyword = match cte_body_keyword(&tokens) {
            Some(keyword) => MUTATING_KEYWORDS.contains(&keyword).then_some(keyword),
            None => bare_mutating_keyword(&tokens),
        };
        if let Some(keyword) = keyword {
            return Err(not_read_only(keyword));
        }
    }

    Ok(())
}

/// True when [`check_read_only`] accepts the statement.
pub fn is_read_only(statement: &str) -> bool {
    check_read_only(statement).is_ok()
}

fn not_read_only(keyword: &str) -> ScaffoldError {
    ScaffoldError::NotReadOnly {
        keyword: keyword.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// Bare word, upper-cased.
    Word(String),
    /// `"..."`, `` `...` `` or `[...]`.
    QuotedIdentifier,
    /// `'...'`.
    Literal,
    /// A whole parenthesised group.
    Group,
    Comma,
    Other,
}

/// Tokens found at parenthesis depth 0; comments are dropped.
fn top_level_tokens(statement: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut depth = 0usize;
    let mut chars = statement.chars().peekable();

    while let Some(ch) = chars.next() {
        let is_word_char = ch.is_alphanumeric() || ch == '_';
        if !is_word_char && !word.is_empty() {
            if depth == 0 {
                tokens.push(Token::Word(word.to_ascii_uppercase()));
            }
            word.clear();
        }

        match ch {
            _ if is_word_char => word.push(ch),
            '-' if chars.peek() == Some(&'-') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for c in chars.by_ref() {
                    if previous == '*' && c == '/' {
                        break;
                    }
                    previous = c;
                }
            }
            '\'' | '"' | '`' | '[' => {
                let close = if ch == '[' { ']' } else { ch };
                for c in chars.by_ref() {
                    if c == close {
                        break;
                    }
                }
                if depth == 0 {
                    tokens.push(if ch == '\'' {
                        Token::Literal
                    } else {
                        Token::QuotedIdentifier
                    });
                }
            }
            '(' => {
                if depth == 0 {
                    tokens.push(Token::Group);
                }
                depth += 1;
            }
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => tokens.push(Token::Comma),
            c if c.is_whitespace() || depth > 0 => {}
            _ => tokens.push(Token::Other),
        }
    }
    if !word.is_empty() && depth == 0 {
        tokens.push(Token::Word(word.to_ascii_uppercase()));
    }
    tokens
}

/// Leading keyword of the statement following a `WITH` CTE list.
///
/// `None` when the list does not have the
/// `name [(columns)] AS [NOT] [MATERIALIZED] (...)` shape.
fn cte_body_keyword(tokens: &[Token]) -> Option<&str> {
    let mut rest = tokens.get(1..)?;
    if let [Token::Word(word), tail @ ..] = rest {
        if word == "RECURSIVE" {
            rest = tail;
        }
    }

    loop {
        rest = match rest {
            [Token::Word(_) | Token::QuotedIdentifier, tail @ ..] => tail,
            _ => return None,
        };
        if let [Token::Group, tail @ ..] = rest {
            rest = tail;
        }
        rest = match rest {
            [Token::Word(word), tail @ ..] if word == "AS" => tail,
            _ => return None,
        };
        for optional in ["NOT", "MATERIALIZED"] {
            if let [Token::Word(word), tail @ ..] = rest {
                if word == optional {
                    rest = tail;
                }
            }
        }
        rest = match rest {
            [Token::Group, tail @ ..] => tail,
            _ => return None,
        };
        match rest {
            [Token::Comma, tail @ ..] => rest = tail,
            [Token::Word(word), ..] => return Some(word.as_str()),
            _ => return None,
        }
    }
}

/// First mutating keyword used as a keyword rather than a function call.
fn bare_mutating_keyword(tokens: &[Token]) -> Option<&str> {
    tokens.iter().enumerate().skip(1).find_map(|(idx, token)| match token {
        Token::Word(word)
            if MUTATING_KEYWORDS.contains(&word.as_str())
                && tokens.get(idx + 1) != Some(&Token::Group) =>
        {
            Some(word.as_str())
        }
        _ => None,
    })
}
