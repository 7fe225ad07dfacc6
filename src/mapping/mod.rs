/// Attribute model built from query result columns.
pub mod attributes;
/// Ordered template context and its required keys.
pub mod context;
/// Plugin identity derived from the user-supplied plugin name.
pub mod identity;
/// Named queries and their mapped results.
pub mod query;

pub use attributes::{Attribute, AttributeModel, TargetType};
pub use context::{ContextValue, TemplateContext};
pub use identity::PluginIdentity;
pub use query::{MappedQuery, NamedQuery};
