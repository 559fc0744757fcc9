// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A name-keyed locator for module instances.
//!
//! The [`Registry`] maps a module name to the most recently registered
//! instance under that name. Entries are never removed: registering again
//! under an existing name replaces the instance, last write wins.

use crate::module::{Module, ModuleRef};
use std::collections::HashMap;
use std::sync::Arc;

/// A module registry keyed by name.
///
/// # Example
///
/// ```rust
/// use mediator_core::{Module, ModuleRef, Registry};
///
/// struct Router { routes: usize }
/// impl Module for Router {}
///
/// let mut registry = Registry::new();
/// registry.register("router", ModuleRef::new(Router { routes: 3 }));
///
/// let router = registry.get::<Router>("router").unwrap();
/// assert_eq!(router.routes, 3);
/// ```
#[derive(Default, Debug)]
pub struct Registry {
    modules: HashMap<String, ModuleRef>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Stores `instance` under `name`, returning the instance it replaced.
    pub fn register(&mut self, name: impl Into<String>, instance: ModuleRef) -> Option<ModuleRef> {
        self.modules.insert(name.into(), instance)
    }

    /// Returns the current instance registered under `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ModuleRef> {
        self.modules.get(name).cloned()
    }

    /// Returns the instance under `name` if it is a `T`.
    #[must_use]
    pub fn get<T: Module>(&self, name: &str) -> Option<Arc<T>> {
        self.modules.get(name).and_then(ModuleRef::downcast::<T>)
    }

    /// Returns `true` if an instance is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if no modules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeRouter {
        name: String,
    }
    impl Module for FakeRouter {}

    struct FakePages {}
    impl Module for FakePages {}

    #[test]
    fn test_register_and_get() {
        let mut registry = Registry::new();
        registry.register(
            "router",
            ModuleRef::new(FakeRouter {
                name: "main".to_string(),
            }),
        );

        let retrieved = registry.get::<FakeRouter>("router").unwrap();
        assert_eq!(retrieved.name, "main");
    }

    #[test]
    fn test_lookup_missing_returns_none() {
        let registry = Registry::new();
        assert!(registry.lookup("router").is_none());
        assert!(registry.get::<FakeRouter>("router").is_none());
    }

    #[test]
    fn test_get_with_wrong_type_returns_none() {
        let mut registry = Registry::new();
        registry.register("pages", ModuleRef::new(FakePages {}));
        assert!(registry.get::<FakeRouter>("pages").is_none());
        assert!(registry.lookup("pages").is_some());
    }

    #[test]
    fn test_multiple_modules() {
        let mut registry = Registry::new();
        registry.register(
            "router",
            ModuleRef::new(FakeRouter {
                name: "r".to_string(),
            }),
        );
        registry.register("pages", ModuleRef::new(FakePages {}));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("router"));
        assert!(registry.contains("pages"));
        assert_eq!(registry.names(), vec!["pages", "router"]);
    }

    #[test]
    fn test_replace_module() {
        let mut registry = Registry::new();
        let old = ModuleRef::new(FakeRouter {
            name: "old".to_string(),
        });
        let new = ModuleRef::new(FakeRouter {
            name: "new".to_string(),
        });

        assert!(registry.register("router", old.clone()).is_none());
        let replaced = registry.register("router", new.clone()).unwrap();

        assert!(replaced.ptr_eq(&old));
        assert!(registry.lookup("router").unwrap().ptr_eq(&new));
        assert_eq!(registry.get::<FakeRouter>("router").unwrap().name, "new");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_default_is_empty() {
        let registry = Registry::default();
        assert!(registry.is_empty());
    }
}
