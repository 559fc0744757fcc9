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

//! Configuration for the [`Mediator`](crate::Mediator).

use crate::error::MediatorError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Event announcing that a module instance has been created.
pub const DEFAULT_CREATED_EVENT: &str = "created";

/// Prefix of the name-scoped event re-broadcast after registration.
pub const DEFAULT_SCOPED_EVENT_PREFIX: &str = "created:";

/// Configuration for the Mediator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorConfig {
    /// Bus event the registration listener subscribes to.
    pub created_event: String,
    /// Prefix prepended to a module name to form its scoped creation event.
    pub scoped_event_prefix: String,
    /// Log instances without a resolvable name at `warn` instead of `debug`.
    pub warn_on_unnamed: bool,
    /// When set, a warning is logged each time a new waiter pushes the
    /// pending list above this size.
    pub pending_warn_threshold: Option<usize>,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            created_event: DEFAULT_CREATED_EVENT.to_string(),
            scoped_event_prefix: DEFAULT_SCOPED_EVENT_PREFIX.to_string(),
            warn_on_unnamed: false,
            pending_warn_threshold: None,
        }
    }
}

impl MediatorConfig {
    /// Parses a configuration from a JSON document.
    ///
    /// Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self, MediatorError> {
        serde_json::from_str(json).map_err(MediatorError::InvalidConfig)
    }

    /// Reads and parses a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MediatorError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| MediatorError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&contents)?;
        log::debug!("Loaded mediator config from '{}'", path.display());
        Ok(config)
    }

    /// Returns the name-scoped creation event for `name`.
    pub fn scoped_event(&self, name: &str) -> String {
        format!("{}{}", self.scoped_event_prefix, name)
    }
}
