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

//! Error types for the mediator crate.
//!
//! Registration and resolution never fail; unresolvable input is dropped or
//! left pending. Only loading configuration and options can produce errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading mediator configuration or module options.
#[derive(Debug, Error)]
pub enum MediatorError {
    /// A configuration file could not be read.
    #[error("failed to read config file '{}': {source}", path.display())]
    ConfigRead {
        /// Path of the file that failed to load.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration document was not valid JSON for [`MediatorConfig`](crate::MediatorConfig).
    #[error("invalid mediator config: {0}")]
    InvalidConfig(#[source] serde_json::Error),

    /// A JSON value could not be converted into [`ModuleOptions`](crate::ModuleOptions).
    #[error("invalid module options: {0}")]
    InvalidOptions(#[source] serde_json::Error),
}
