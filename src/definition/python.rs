use crate::executor::result::SampleValue;
use crate::mapping::attributes::TargetType;
use crate::parser::names::split_words;

/// Single-quoted Python string literal of `text`.
pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Python `bytes` literal of `bytes`.
pub fn bytes_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push_str("b'");
    for &byte in bytes {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            0x20..=0x7e => out.push(char::from(byte)),
            _ => out.push_str(&format!("\\x{byte:02x}")),
        }
    }
    out.push('\'');
    out
}

/// Python literal equal to a sampled value.
pub fn value_literal(value: &SampleValue) -> String {
    match value {
        SampleValue::Null => "None".to_string(),
        SampleValue::Integer(v) => v.to_string(),
        SampleValue::Real(v) if v.is_nan() => "float('nan')".to_string(),
        SampleValue::Real(v) if v.is_infinite() => {
            if *v > 0.0 {
                "float('inf')".to_string()
            } else {
                "float('-inf')".to_string()
            }
        }
        SampleValue::Real(v) => format!("{v:?}"),
        SampleValue::Text(text) => string_literal(text),
        SampleValue::Blob(bytes) => bytes_literal(bytes),
    }
}

/// Python builtin type of a target type.
pub fn type_name(target_type: TargetType) -> &'static str {
    match target_type {
        TargetType::Integer => "int",
        TargetType::FloatingPoint => "float",
        TargetType::String => "str",
        TargetType::ByteSequence => "bytes",
    }
}

/// Collapse every whitespace run to one space, for one-line SQL literals.
pub fn single_line(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Human label of an identifier: `last_visited_time` -> `Last Visited Time`.
pub fn label(identifier: &str) -> String {
    split_words(identifier)
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text safe inside a triple-quoted docstring.
pub fn docstring_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '"' | '\\' => '\'',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect()
}
