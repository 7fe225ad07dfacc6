use serde::Serialize;

use crate::parser::names::{to_class_name_stem, to_file_name_stem};

/// Names derived once per generation run from the user-supplied plugin name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginIdentity {
    /// Name exactly as entered.
    pub raw_name: String,
    /// Type-name stem, e.g. `TestUsers`.
    pub class_name_stem: String,
    /// File-name stem, e.g. `test_users`.
    pub file_name_stem: String,
    /// Namespace-qualified discriminator of generated records, e.g. `sqlite:test_users`.
    pub data_type_tag: String,
}

impl PluginIdentity {
    /// Derive every name from `raw_name`; never fails.
    ///
    /// An empty `namespace` yields an unqualified data type tag.
    pub fn derive(raw_name: &str, namespace: &str) -> Self {
        let class_name_stem = to_class_name_stem(raw_name);
        let file_name_stem = to_file_name_stem(raw_name);
        let namespace = namespace.trim();
        let data_type_tag = if namespace.is_empty() {
            file_name_stem.clone()
        } else {
            format!("{namespace}:{file_name_stem}")
        };

        Self {
            raw_name: raw_name.to_string(),
            class_name_stem,
            file_name_stem,
            data_type_tag,
        }
    }
}
