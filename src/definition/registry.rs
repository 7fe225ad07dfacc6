use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::definition::plaso::PlasoDefinition;
use crate::definition::Definition;
use crate::error::ScaffoldError;

/// Thread-safe table of definitions keyed by name.
///
/// Lookups hand out `Arc` clones, so a definition removed while a generation
/// run holds it stays alive until that run finishes.
#[derive(Default)]
pub struct DefinitionRegistry {
    definitions: RwLock<BTreeMap<String, Arc<dyn Definition>>>,
}

impl DefinitionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in definition.
    pub fn with_builtin_definitions() -> Self {
        let registry = Self::new();
        registry.insert(Arc::new(PlasoDefinition::new()));
        registry
    }

    /// Publish `definition` under its name.
    ///
    /// Fails with [`ScaffoldError::DuplicateDefinition`] when the name is
    /// taken, and with [`ScaffoldError::InvalidConvention`] when its path
    /// convention could escape the project root.
    pub fn register(&self, definition: Arc<dyn Definition>) -> Result<(), ScaffoldError> {
        definition.path_convention().validate()?;

        let name = definition.name().to_string();
        let mut definitions = self
            .definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if definitions.contains_key(&name) {
            return Err(ScaffoldError::DuplicateDefinition(name));
        }
        definitions.insert(name.clone(), definition);
        info!(definition = %name, "registered definition");
        Ok(())
    }

    /// Remove the definition called `name`.
    pub fn deregister(&self, name: &str) -> Result<Arc<dyn Definition>, ScaffoldError> {
        let removed = self
            .definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .ok_or_else(|| ScaffoldError::UnknownDefinition(name.to_string()))?;
        info!(definition = name, "deregistered definition");
        Ok(removed)
    }

    /// Definition called `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Definition>, ScaffoldError> {
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| ScaffoldError::UnknownDefinition(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn list(&self) -> Vec<String> {
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Deregister everything.
    ///
    /// Works on a snapshot of the names, so definitions registered
    /// concurrently may survive the call.
    pub fn clear(&self) {
        for name in self.list() {
            if let Err(err) = self.deregister(&name) {
                debug!(definition = %name, error = %err, "definition already gone");
            }
        }
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, definition: Arc<dyn Definition>) {
        self.definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(definition.name().to_string(), definition);
    }
}

impl std::fmt::Debug for DefinitionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionRegistry")
            .field("definitions", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn builtin_registry_lists_plaso() {
        let registry = DefinitionRegistry::with_builtin_definitions();
        assert_eq!(registry.list(), vec!["plaso".to_string()]);
        assert_eq!(registry.get("plaso").map(|d| d.name().to_string()), Ok("plaso".to_string()));
    }

    #[test]
    fn duplicate_and_unknown_names_are_errors() {
        let registry = DefinitionRegistry::with_builtin_definitions();
        let err = registry
            .register(Arc::new(PlasoDefinition::new()))
            .expect_err("duplicate should fail");
        assert_eq!(err.kind(), ErrorKind::DuplicateDefinition);

        assert_eq!(
            registry.deregister("missing").err(),
            Some(ScaffoldError::UnknownDefinition("missing".to_string()))
        );
    }

    #[test]
    fn clear_empties_the_registry() {
        let registry = DefinitionRegistry::with_builtin_definitions();
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.get("plaso").is_err());
    }
}
