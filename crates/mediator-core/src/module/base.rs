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

//! A reusable base for modules with options and their own event streams.

use super::{Module, ModuleOptions};
use crate::event::{Bus, EventBus, Handler, Payload, SubscriptionId};

/// Building block for modules that expose an input and an output event stream.
///
/// Events sent *to* the module go through [`trigger`](Self::trigger) and are
/// handled by whatever the module registered with
/// [`on_input`](Self::on_input). Events the module publishes go through
/// [`emit`](Self::emit) and are observed with [`on`](Self::on).
///
/// Embed it in a concrete module and forward [`Module::options`] to it, or
/// register a bare `ModuleBase` when options are all a module needs.
#[derive(Debug, Default)]
pub struct ModuleBase {
    options: ModuleOptions,
    input: EventBus,
    output: EventBus,
}

impl ModuleBase {
    /// Creates a base whose options are `defaults` patched with `options`.
    pub fn new(defaults: ModuleOptions, options: Option<ModuleOptions>) -> Self {
        let mut merged = defaults;
        if let Some(options) = options {
            merged.patch(options);
        }
        Self {
            options: merged,
            input: EventBus::new(),
            output: EventBus::new(),
        }
    }

    /// Creates a base with only the given options.
    pub fn with_options(options: ModuleOptions) -> Self {
        Self::new(options, None)
    }

    /// Current options.
    pub fn get_options(&self) -> &ModuleOptions {
        &self.options
    }

    /// Merges `patch` into the current options.
    pub fn set_options(&mut self, patch: ModuleOptions) {
        self.options.patch(patch);
    }

    /// Sends an event into the module.
    pub fn trigger(&self, event: &str, payload: Payload) {
        self.input.emit(event, payload);
    }

    /// Handles events sent into the module.
    pub fn on_input(&self, event: &str, handler: Handler) -> SubscriptionId {
        self.input.on(event, handler)
    }

    /// Publishes an event from the module.
    pub fn emit(&self, event: &str, payload: Payload) {
        self.output.emit(event, payload);
    }

    /// Observes events published by the module.
    pub fn on(&self, event: &str, handler: Handler) -> SubscriptionId {
        self.output.on(event, handler)
    }

    /// Removes a subscription made with [`on`](Self::on).
    pub fn off(&self, id: SubscriptionId) -> bool {
        self.output.off(id)
    }

    /// Removes a subscription made with [`on_input`](Self::on_input).
    pub fn off_input(&self, id: SubscriptionId) -> bool {
        self.input.off(id)
    }

    /// The stream of events sent into the module.
    pub fn input(&self) -> &EventBus {
        &self.input
    }

    /// The stream of events published by the module.
    pub fn output(&self) -> &EventBus {
        &self.output
    }
}

impl Module for ModuleBase {
    fn options(&self) -> Option<&ModuleOptions> {
        Some(&self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{DefaultNamingPolicy, NamingPolicy};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[test]
    fn options_start_from_defaults() {
        let defaults = ModuleOptions::new().with("size", json!([100, 100]));
        let base = ModuleBase::new(defaults, Some(ModuleOptions::new().with_id("pages")));

        assert_eq!(base.get_options().id.as_deref(), Some("pages"));
        assert_eq!(base.get_options().get("size"), Some(&json!([100, 100])));
        assert_eq!(DefaultNamingPolicy.resolve(&base).as_deref(), Some("pages"));
    }

    #[test]
    fn set_options_patches() {
        let mut base = ModuleBase::with_options(ModuleOptions::new().with_name("menu"));
        base.set_options(ModuleOptions::new().with("open", json!(true)));

        assert_eq!(base.get_options().name.as_deref(), Some("menu"));
        assert_eq!(base.get_options().get("open"), Some(&json!(true)));
    }

    #[test]
    fn input_and_output_are_separate() {
        let base = ModuleBase::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inputs = Arc::clone(&seen);
        let in_id = base.on_input(
            "set",
            Arc::new(move |_: &Payload| inputs.lock().unwrap().push("input")),
        );
        let outputs = Arc::clone(&seen);
        let out_id = base.on(
            "set",
            Arc::new(move |_: &Payload| outputs.lock().unwrap().push("output")),
        );

        base.trigger("set", Payload::Empty);
        base.emit("set", Payload::Empty);
        assert_eq!(*seen.lock().unwrap(), vec!["input", "output"]);

        assert!(base.off(out_id));
        base.emit("set", Payload::Empty);
        assert_eq!(seen.lock().unwrap().len(), 2);

        assert!(base.off_input(in_id));
        base.trigger("set", Payload::Empty);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }
}
