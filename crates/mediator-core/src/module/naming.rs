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

//! Policies that extract a registry name from a module.

use super::Module;

/// Resolves the name a module is registered under.
///
/// Returning `None` means the module cannot be registered.
pub trait NamingPolicy: Send + Sync {
    /// Returns the registry name for `module`, if it has one.
    fn resolve(&self, module: &dyn Module) -> Option<String>;
}

/// The standard precedence: `options.id`, `options.name`, `id`, `name`.
///
/// The first non-empty value wins. Modules without options fall straight
/// through to the top-level fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultNamingPolicy;

impl NamingPolicy for DefaultNamingPolicy {
    fn resolve(&self, module: &dyn Module) -> Option<String> {
        let options = module.options();
        options
            .and_then(|o| non_empty(o.id.as_deref()))
            .or_else(|| options.and_then(|o| non_empty(o.name.as_deref())))
            .or_else(|| non_empty(module.id()))
            .or_else(|| non_empty(module.name()))
            .map(str::to_owned)
    }
}

impl<F> NamingPolicy for F
where
    F: Fn(&dyn Module) -> Option<String> + Send + Sync,
{
    fn resolve(&self, module: &dyn Module) -> Option<String> {
        self(module)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleOptions;

    #[derive(Default)]
    struct Probe {
        options: Option<ModuleOptions>,
        id: Option<String>,
        name: Option<String>,
    }

    impl Module for Probe {
        fn options(&self) -> Option<&ModuleOptions> {
            self.options.as_ref()
        }

        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }

        fn name(&self) -> Option<&str> {
            self.name.as_deref()
        }
    }

    fn resolve(probe: &Probe) -> Option<String> {
        DefaultNamingPolicy.resolve(probe)
    }

    #[test]
    fn options_id_wins() {
        let probe = Probe {
            options: Some(ModuleOptions::new().with_id("opt-id").with_name("opt-name")),
            id: Some("top-id".into()),
            name: Some("top-name".into()),
        };
        assert_eq!(resolve(&probe).as_deref(), Some("opt-id"));
    }

    #[test]
    fn options_name_before_top_level() {
        let probe = Probe {
            options: Some(ModuleOptions::new().with_name("opt-name")),
            id: Some("top-id".into()),
            ..Default::default()
        };
        assert_eq!(resolve(&probe).as_deref(), Some("opt-name"));
    }

    #[test]
    fn empty_options_fall_through() {
        let probe = Probe {
            options: Some(ModuleOptions::new().with_id("")),
            id: Some("top-id".into()),
            ..Default::default()
        };
        assert_eq!(resolve(&probe).as_deref(), Some("top-id"));
    }

    #[test]
    fn without_options_uses_id_then_name() {
        let by_name = Probe {
            name: Some("top-name".into()),
            ..Default::default()
        };
        assert_eq!(resolve(&by_name).as_deref(), Some("top-name"));

        let by_id = Probe {
            id: Some("top-id".into()),
            name: Some("top-name".into()),
            ..Default::default()
        };
        assert_eq!(resolve(&by_id).as_deref(), Some("top-id"));
    }

    #[test]
    fn nothing_resolves_to_none() {
        let probe = Probe {
            options: Some(ModuleOptions::new()),
            id: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(resolve(&probe), None);
    }

    #[test]
    fn closures_are_policies() {
        let policy = |module: &dyn Module| module.name().map(|n| n.to_uppercase());
        let probe = Probe {
            id: Some("ignored".into()),
            name: Some("pages".into()),
            ..Default::default()
        };
        assert_eq!(policy.resolve(&probe).as_deref(), Some("PAGES"));
    }
}
