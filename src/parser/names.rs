/// Return the identifier without surrounding double quotes, backticks or brackets.
pub fn unquote_identifier(ident: &str) -> &str {
    for (open, close) in [('"', '"'), ('`', '`'), ('[', ']')] {
        if let Some(inner) = ident.strip_prefix(open).and_then(|s| s.strip_suffix(close)) {
            return inner;
        }
    }
    ident
}

/// Normalize an identifier for case-insensitive matching.
///
/// Trims whitespace, removes surrounding quotes on a single identifier,
/// and lowercases the result.
pub fn normalize_identifier(ident: &str) -> String {
    unquote_identifier(ident.trim()).to_ascii_lowercase()
}

/// Split a potentially schema-qualified name into `(schema, relation)`.
///
/// Handles dots inside quoted identifiers, e.g. `"my.schema"."table.name"`.
pub fn split_schema_and_relation(name: &str) -> Option<(String, String)> {
    let mut in_quotes = false;
    let mut start = 0usize;
    let mut parts: Vec<&str> = Vec::new();

    for (idx, ch) in name.char_indices() {
        match ch {
            '"' | '`' => in_quotes = !in_quotes,
            '.' if !in_quotes => {
                parts.push(name[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(name[start..].trim());

    if parts.len() < 2 {
        return None;
    }

    let schema = unquote_identifier(parts[parts.len() - 2]).to_string();
    let relation = unquote_identifier(parts[parts.len() - 1]).to_string();
    Some((schema, relation))
}

/// Normalize an object name to its terminal relation identifier.
///
/// Examples:
/// - `"main.users"` -> `"users"`
/// - `"\"main\".\"Users\""` -> `"users"`
pub fn normalize_relation_name(name: &str) -> String {
    if let Some((_, relation)) = split_schema_and_relation(name.trim()) {
        return normalize_identifier(&relation);
    }
    normalize_identifier(name)
}

/// Split free text into words.
///
/// Any run of characters outside `[A-Za-z0-9]` separates words, and camel-case
/// transitions start a new word (`fooBar`, `foo2Bar`, `HTTPServer`). All three
/// name mappers below share this rule, so a class stem and a file stem derived
/// from the same input always contain the same words.
pub fn split_words(raw: &str) -> Vec<String> {
    let chars: Vec<char> = raw.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (idx, &ch) in chars.iter().enumerate() {
        if !ch.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(prev) = current.chars().last() {
            let next_is_lower = chars.get(idx + 1).is_some_and(char::is_ascii_lowercase);
            let boundary = ch.is_ascii_uppercase()
                && (prev.is_ascii_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_ascii_uppercase() && next_is_lower));
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Derive a type-name stem: `"My Cool Plugin!"` -> `"MyCoolPlugin"`.
///
/// Rules:
/// - each word title-cased (`HTTP` -> `Http`) and concatenated
/// - if starting with a digit, prefix with `"P"`
/// - if no words remain, return `"Plugin"`
pub fn to_class_name_stem(raw: &str) -> String {
    let stem: String = split_words(raw)
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => {
                    let mut titled = first.to_ascii_uppercase().to_string();
                    titled.push_str(&chars.as_str().to_ascii_lowercase());
                    titled
                }
            }
        })
        .collect();

    if stem.is_empty() {
        return "Plugin".to_string();
    }
    if stem.starts_with(|ch: char| ch.is_ascii_digit()) {
        return format!("P{stem}");
    }
    stem
}

/// Derive a file-name stem: `"My Cool Plugin!"` -> `"my_cool_plugin"`.
///
/// Rules:
/// - words lowercased and joined with `_`
/// - if starting with a digit, prefix with `"p"`
/// - if no words remain, return `"plugin"`
pub fn to_file_name_stem(raw: &str) -> String {
    let stem = snake_words(raw);
    if stem.is_empty() {
        return "plugin".to_string();
    }
    if stem.starts_with(|ch: char| ch.is_ascii_digit()) {
        return format!("p{stem}");
    }
    stem
}

/// Derive an attribute identifier from a result column name.
///
/// Same word rule as [`to_file_name_stem`], except that a leading underscore
/// in the source name is kept (`_rowid` stays `_rowid`) and a leading digit
/// is prefixed with `col_`. Returns an empty string when the name contains no
/// words at all; callers substitute a positional name in that case.
pub fn to_attribute_identifier(raw: &str) -> String {
    let stem = snake_words(raw);
    if stem.is_empty() {
        return stem;
    }
    if raw.trim_start().starts_with('_') {
        return format!("_{stem}");
    }
    if stem.starts_with(|ch: char| ch.is_ascii_digit()) {
        return format!("col_{stem}");
    }
    stem
}

fn snake_words(raw: &str) -> String {
    split_words(raw)
        .iter()
        .map(|word| word.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}
