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

//! Module options with deep-merge patching.

use crate::error::MediatorError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options attached to a module.
///
/// `id` and `name` are the identity fields the naming policy inspects. Any
/// other keys land in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleOptions {
    /// Preferred identifier of the module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Fallback identifier, used when `id` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Module-specific settings.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModuleOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `id` field.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the `name` field.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a module-specific key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Looks up a module-specific key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Builds options from a JSON object.
    pub fn from_value(value: Value) -> Result<Self, MediatorError> {
        serde_json::from_value(value).map_err(MediatorError::InvalidOptions)
    }

    /// Merges `patch` into these options.
    ///
    /// Identity fields are replaced when the patch sets them. Nested JSON
    /// objects in `extra` are merged key by key; any other value replaces the
    /// existing one.
    pub fn patch(&mut self, patch: ModuleOptions) {
        if patch.id.is_some() {
            self.id = patch.id;
        }
        if patch.name.is_some() {
            self.name = patch.name;
        }
        merge_map(&mut self.extra, patch.extra);
    }
}

fn merge_map(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_map(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}
