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

//! Logs error reports published on the bus.
//!
//! Modules publish failures instead of handling them locally:
//!
//! ```rust
//! use mediator_core::{Bus, ErrorReport, ErrorTarget, EventBus, Payload};
//! use mediator_telemetry::ErrorMediator;
//! use std::sync::Arc;
//!
//! let bus = Arc::new(EventBus::new());
//! let errors = ErrorMediator::attach(bus.clone());
//!
//! bus.emit(
//!     "error",
//!     Payload::Error(ErrorReport::new(ErrorTarget::Name("Router".into()), "no route")),
//! );
//! assert_eq!(errors.reported(), 1);
//! ```

use mediator_core::{Bus, ErrorReport, Payload, SubscriptionId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Bus event carrying [`ErrorReport`]s.
pub const ERROR_EVENT: &str = "error";

/// Subscribes to error events and writes each report to the log.
pub struct ErrorMediator {
    bus: Arc<dyn Bus>,
    id: SubscriptionId,
    reported: Arc<AtomicUsize>,
}

impl ErrorMediator {
    /// Listens for [`ERROR_EVENT`] on `bus`.
    pub fn attach(bus: Arc<dyn Bus>) -> Self {
        Self::attach_to(bus, ERROR_EVENT)
    }

    /// Listens for `event` on `bus`.
    pub fn attach_to(bus: Arc<dyn Bus>, event: &str) -> Self {
        let reported = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reported);
        let topic = event.to_string();
        let id = bus.on(
            event,
            Arc::new(move |payload: &Payload| match payload.as_error() {
                Some(report) => {
                    counter.fetch_add(1, Ordering::Relaxed);
                    log::error!("{}", format_report(report));
                }
                None => {
                    log::warn!("ErrorMediator: malformed '{topic}' event: {payload:?}");
                }
            }),
        );
        log::debug!("ErrorMediator: listening for '{event}' events.");
        Self { bus, id, reported }
    }

    /// Number of reports logged so far.
    pub fn reported(&self) -> usize {
        self.reported.load(Ordering::Relaxed)
    }

    /// Stops listening. Returns `false` if the subscription was already gone.
    pub fn detach(self) -> bool {
        self.bus.off(self.id)
    }
}

/// Renders a report as `Error <target>: <message> <data>`.
pub fn format_report(report: &ErrorReport) -> String {
    report.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediator_core::{ErrorTarget, EventBus, Module, ModuleRef};
    use serde_json::json;

    struct Pages;
    impl Module for Pages {}

    #[test]
    fn formats_each_target_kind() {
        let by_name = ErrorReport::new(ErrorTarget::Name("Router".into()), "no route");
        assert_eq!(format_report(&by_name), "Error Router: no route");

        let by_module = ErrorReport::new(ErrorTarget::Module(ModuleRef::new(Pages)), "bad page")
            .with_data(json!({ "index": 3 }));
        assert_eq!(format_report(&by_module), r#"Error Pages: bad page {"index":3}"#);

        let unknown = ErrorReport::new(ErrorTarget::Unknown, "boom");
        assert_eq!(format_report(&unknown), "Error UnknownTarget: boom");
    }

    #[test]
    fn counts_only_error_payloads() {
        let bus = Arc::new(EventBus::new());
        let errors = ErrorMediator::attach(bus.clone());

        bus.emit(
            ERROR_EVENT,
            Payload::Error(ErrorReport::new(ErrorTarget::Unknown, "first")),
        );
        bus.emit(ERROR_EVENT, Payload::Value(json!("not a report")));
        bus.emit("other", Payload::Error(ErrorReport::new(ErrorTarget::Unknown, "x")));

        assert_eq!(errors.reported(), 1);
    }

    #[test]
    fn custom_event_and_detach() {
        let bus = Arc::new(EventBus::new());
        let errors = ErrorMediator::attach_to(bus.clone(), "failure");
        assert_eq!(bus.listener_count("failure"), 1);

        assert!(errors.detach());
        assert_eq!(bus.listener_count("failure"), 0);
    }
}
