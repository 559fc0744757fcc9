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

use super::report::ErrorReport;
use crate::module::ModuleRef;
use serde_json::Value;

/// The value carried by a bus event.
#[derive(Debug, Clone, Default)]
pub enum Payload {
    /// No data.
    #[default]
    Empty,
    /// A module instance, as carried by creation events.
    Module(ModuleRef),
    /// Arbitrary structured data.
    Value(Value),
    /// An error report.
    Error(ErrorReport),
}

impl Payload {
    /// Returns the module if this payload carries one.
    pub fn as_module(&self) -> Option<&ModuleRef> {
        match self {
            Payload::Module(module) => Some(module),
            _ => None,
        }
    }

    /// Returns the JSON value if this payload carries one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Payload::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the error report if this payload carries one.
    pub fn as_error(&self) -> Option<&ErrorReport> {
        match self {
            Payload::Error(report) => Some(report),
            _ => None,
        }
    }
}

impl From<ModuleRef> for Payload {
    fn from(module: ModuleRef) -> Self {
        Payload::Module(module)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Value(value)
    }
}

impl From<ErrorReport> for Payload {
    fn from(report: ErrorReport) -> Self {
        Payload::Error(report)
    }
}
