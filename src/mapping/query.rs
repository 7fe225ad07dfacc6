use serde::{Deserialize, Serialize};

use crate::executor::result::QueryResult;
use crate::mapping::attributes::AttributeModel;
use crate::parser::names::{to_class_name_stem, to_file_name_stem};

/// A named statement supplied by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedQuery {
    /// Short human name, e.g. `"Users"`.
    pub name: String,
    /// SQL text.
    pub sql: String,
}

impl NamedQuery {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// A successfully executed query together with its attribute model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedQuery {
    /// Name as supplied.
    pub name: String,
    /// Type-name stem of the query, e.g. `Users`.
    pub class_name_stem: String,
    /// Snake-case stem of the query, e.g. `users`.
    pub identifier: String,
    /// SQL text as executed.
    pub statement: String,
    /// Attributes in column order.
    pub model: AttributeModel,
    /// Rows sampled while executing the query.
    #[serde(skip)]
    pub result: QueryResult,
}

impl MappedQuery {
    /// Map an executed query; the name stems follow the plugin-name rules.
    pub fn new(name: &str, result: QueryResult) -> Self {
        Self {
            name: name.to_string(),
            class_name_stem: to_class_name_stem(name),
            identifier: to_file_name_stem(name),
            statement: result.statement.clone(),
            model: AttributeModel::build(&result),
            result,
        }
    }
}
