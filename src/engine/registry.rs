// src/engine/registry.rs

//! Lookup table from case paths to case bodies.
//!
//! Suites name a case body by `path`. The registry resolves that string to a
//! registered [`TestCase`]: first by exact key, then by the path's file stem,
//! so `path = "test/reboot_test.py"` finds the body registered as
//! `reboot_test`.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ModuleRef;
use crate::engine::case::{CaseContext, FnCase, TestCase};
use crate::errors::{DevbatError, Result};

/// Helper object handed to case bodies through `CaseContext::module`.
pub trait ExtraModule: Send + Sync + Debug {
    fn as_any(&self) -> &dyn Any;
}

/// Modules resolved for one suite, keyed by name.
pub type ExtraModules = BTreeMap<String, Arc<dyn ExtraModule>>;

#[derive(Default)]
pub struct CaseRegistry {
    cases: HashMap<String, Arc<dyn TestCase>>,
    modules: HashMap<String, Arc<dyn ExtraModule>>,
}

impl Debug for CaseRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaseRegistry")
            .field("cases", &self.case_keys())
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the bodies in [`crate::cases`].
    pub fn with_builtin_cases() -> Self {
        let mut registry = Self::new();
        crate::cases::register_builtin(&mut registry);
        registry
    }

    pub fn register(&mut self, key: impl Into<String>, case: impl TestCase + 'static) -> &mut Self {
        let key = key.into();
        debug!(%key, "registered case body");
        self.cases.insert(key, Arc::new(case));
        self
    }

    pub fn register_fn<F>(&mut self, key: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&mut CaseContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(key, FnCase(f))
    }

    pub fn register_module(
        &mut self,
        name: impl Into<String>,
        module: impl ExtraModule + 'static,
    ) -> &mut Self {
        self.modules.insert(name.into(), Arc::new(module));
        self
    }

    /// Exact key first, then the path's file stem.
    pub fn resolve(&self, path: &str) -> Option<Arc<dyn TestCase>> {
        if let Some(case) = self.cases.get(path) {
            return Some(Arc::clone(case));
        }
        Path::new(path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| self.cases.get(stem))
            .map(Arc::clone)
    }

    /// Resolve a suite's `[[external_lib]]` list. Unknown names are fatal.
    pub fn resolve_modules(&self, refs: &[ModuleRef]) -> Result<ExtraModules> {
        let mut resolved = ExtraModules::new();
        for module in refs {
            let Some(found) = self.modules.get(&module.name) else {
                return Err(DevbatError::ConfigError(format!(
                    "external library '{}' is not registered",
                    module.name
                )));
            };
            info!(name = %module.name, path = ?module.path, "external library loaded");
            resolved.insert(module.name.clone(), Arc::clone(found));
        }
        Ok(resolved)
    }

    /// Registered case keys, sorted.
    pub fn case_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.cases.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
