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

//! Error reports that modules publish on the bus.

use crate::module::ModuleRef;
use serde_json::Value;
use std::fmt;

/// Who raised an [`ErrorReport`].
#[derive(Debug, Clone, Default)]
pub enum ErrorTarget {
    /// A free-form label, usually the module name.
    Name(String),
    /// The module instance itself.
    Module(ModuleRef),
    /// The origin is not known.
    #[default]
    Unknown,
}

impl ErrorTarget {
    /// Human-readable label: the name, the module's type name, or `UnknownTarget`.
    pub fn label(&self) -> &str {
        match self {
            ErrorTarget::Name(name) => name,
            ErrorTarget::Module(module) => module.short_type_name(),
            ErrorTarget::Unknown => "UnknownTarget",
        }
    }
}

impl fmt::Display for ErrorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An error raised by a module and broadcast on the bus.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    /// The module or label the error concerns.
    pub target: ErrorTarget,
    /// A description of what went wrong.
    pub message: String,
    /// Optional structured context.
    pub data: Option<Value>,
}

impl ErrorReport {
    /// Creates a report without extra data.
    pub fn new(target: ErrorTarget, message: impl Into<String>) -> Self {
        Self {
            target,
            message: message.into(),
            data: None,
        }
    }

    /// Attaches structured context to the report.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error {}: {}", self.target, self.message)?;
        if let Some(data) = &self.data {
            write!(f, " {data}")?;
        }
        Ok(())
    }
}
