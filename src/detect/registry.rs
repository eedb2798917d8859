use std::collections::HashMap;

use anyhow::{anyhow, Result};

use super::backend::DetectorBackend;

/// Name-keyed registry of detector backends.
///
/// The daemon registers every backend compiled into the build and selects
/// one by its configured name. The first registered backend becomes the
/// default.
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn DetectorBackend>>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: DetectorBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Box::new(backend));
    }

    /// Remove a backend by name, handing ownership to the caller.
    pub fn take(&mut self, name: &str) -> Result<Box<dyn DetectorBackend>> {
        self.backends
            .remove(name)
            .ok_or_else(|| anyhow!("backend '{}' not registered (available: {:?})", name, self.list()))
    }

    /// Remove the default backend, handing ownership to the caller.
    pub fn take_default(&mut self) -> Result<Box<dyn DetectorBackend>> {
        let name = self
            .default_name
            .clone()
            .ok_or_else(|| anyhow!("no backend registered"))?;
        self.take(&name)
    }

    /// List registered backend names.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::backends::scripted::ScriptedBackend;
    use crate::detect::ColorBackend;

    #[test]
    fn first_registered_backend_is_default() {
        let mut registry = BackendRegistry::new();
        registry.register(ColorBackend::new());
        registry.register(ScriptedBackend::new());

        assert_eq!(registry.list(), vec!["color", "scripted"]);
        let default = registry.take_default().unwrap();
        assert_eq!(default.name(), "color");
    }

    #[test]
    fn take_unknown_backend_is_an_error() {
        let mut registry = BackendRegistry::new();
        registry.register(ColorBackend::new());
        assert!(registry.take("tract").is_err());
    }
}
