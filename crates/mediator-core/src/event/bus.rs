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

use super::payload::Payload;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A callback invoked with the payload of each matching event.
pub type Handler = Arc<dyn Fn(&Payload) + Send + Sync>;

/// Identifies one subscription on a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// A named-event publish/subscribe bus with synchronous delivery.
///
/// Implementations must deliver an emitted event to every handler that was
/// subscribed to its name before the call to [`emit`](Bus::emit), on the
/// emitting thread, before `emit` returns.
pub trait Bus: Send + Sync {
    /// Delivers `payload` to every handler subscribed to `event`.
    fn emit(&self, event: &str, payload: Payload);

    /// Subscribes `handler` to `event`.
    fn on(&self, event: &str, handler: Handler) -> SubscriptionId;

    /// Removes a subscription. Returns `false` if it did not exist.
    fn off(&self, id: SubscriptionId) -> bool;
}

/// In-process synchronous event bus.
///
/// Handlers for an event run in subscription order. The handler list is
/// snapshotted before dispatch, so handlers may subscribe, unsubscribe or
/// emit while an event is being delivered; changes apply from the next emit.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<HashMap<String, Vec<(SubscriptionId, Handler)>>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Creates a new EventBus with no subscribers.
    pub fn new() -> Self {
        log::debug!("EventBus initialized.");
        Self::default()
    }

    /// Mirrors every payload emitted for `event` into a channel.
    ///
    /// The receiver can be drained from any thread. Dropping it does not
    /// remove the subscription; call [`off`](Bus::off) with the returned id.
    pub fn tap(&self, event: &str) -> (SubscriptionId, flume::Receiver<Payload>) {
        let (sender, receiver) = flume::unbounded();
        let topic = event.to_string();
        let id = self.on(
            event,
            Arc::new(move |payload: &Payload| {
                if let Err(e) = sender.send(payload.clone()) {
                    log::trace!("EventBus: tap on '{topic}' dropped a payload: {e}");
                }
            }),
        );
        (id, receiver)
    }

    /// Returns the number of handlers subscribed to `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners().get(event).map_or(0, Vec::len)
    }

    fn listeners(&self) -> MutexGuard<'_, HashMap<String, Vec<(SubscriptionId, Handler)>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Bus for EventBus {
    fn emit(&self, event: &str, payload: Payload) {
        let handlers: Vec<Handler> = self
            .listeners()
            .get(event)
            .map(|entries| entries.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        log::trace!("EventBus: '{event}' -> {} handler(s)", handlers.len());

        for handler in handlers {
            handler(&payload);
        }
    }

    fn on(&self, event: &str, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners()
            .entry(event.to_string())
            .or_default()
            .push((id, handler));
        log::trace!("EventBus: subscribed {id:?} to '{event}'");
        id
    }

    fn off(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners();
        let mut removed = false;
        listeners.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|(sub, _)| *sub != id);
            removed |= entries.len() != before;
            !entries.is_empty()
        });
        removed
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners();
        let mut events: Vec<(&String, usize)> =
            listeners.iter().map(|(k, v)| (k, v.len())).collect();
        events.sort();
        f.debug_struct("EventBus").field("events", &events).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::TryRecvError;
    use serde_json::json;
    use std::{thread, time::Duration};

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> Handler {
        let log = Arc::clone(log);
        Arc::new(move |payload: &Payload| {
            let value = payload.as_value().cloned().unwrap_or_default();
            log.lock().unwrap().push(format!("{tag}:{value}"));
        })
    }

    #[test]
    fn emit_without_subscribers() {
        let bus = EventBus::new();
        // Should not panic even with no subscribers
        bus.emit("nobody-listens", Payload::Empty);
        assert_eq!(bus.listener_count("nobody-listens"), 0);
    }

    #[test]
    fn handlers_run_in_subscription_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.on("tick", recorder(&log, "first"));
        bus.on("tick", recorder(&log, "second"));
        bus.on("other", recorder(&log, "other"));

        bus.emit("tick", Payload::Value(json!(1)));

        assert_eq!(*log.lock().unwrap(), vec!["first:1", "second:1"]);
    }

    #[test]
    fn off_removes_only_that_subscription() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = bus.on("tick", recorder(&log, "first"));
        bus.on("tick", recorder(&log, "second"));

        assert!(bus.off(first));
        assert!(!bus.off(first), "second removal should report nothing removed");
        bus.emit("tick", Payload::Value(json!(2)));

        assert_eq!(*log.lock().unwrap(), vec!["second:2"]);
        assert_eq!(bus.listener_count("tick"), 1);
    }

    #[test]
    fn subscription_made_during_emit_applies_to_next_emit() {
        let bus = Arc::new(EventBus::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner_bus = Arc::clone(&bus);
        let inner_log = Arc::clone(&log);
        bus.on(
            "tick",
            Arc::new(move |_: &Payload| {
                inner_bus.on("tick", recorder(&inner_log, "late"));
            }),
        );

        bus.emit("tick", Payload::Value(json!(1)));
        assert!(log.lock().unwrap().is_empty());

        bus.emit("tick", Payload::Value(json!(2)));
        assert_eq!(*log.lock().unwrap(), vec!["late:2"]);
    }

    #[test]
    fn nested_emit_is_delivered_synchronously() {
        let bus = Arc::new(EventBus::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner_bus = Arc::clone(&bus);
        bus.on(
            "outer",
            Arc::new(move |_: &Payload| inner_bus.emit("inner", Payload::Value(json!("x")))),
        );
        bus.on("inner", recorder(&log, "inner"));

        bus.emit("outer", Payload::Empty);
        assert_eq!(*log.lock().unwrap(), vec![r#"inner:"x""#]);
    }

    #[test]
    fn tap_mirrors_payloads() {
        let bus = EventBus::new();
        let (_, receiver) = bus.tap("created:Router");

        bus.emit("created:Router", Payload::Value(json!("a")));
        bus.emit("created:Router", Payload::Value(json!("b")));

        let received: Vec<_> = receiver
            .try_iter()
            .filter_map(|p| p.as_value().cloned())
            .collect();
        assert_eq!(received, vec![json!("a"), json!("b")]);
        assert_eq!(receiver.try_recv().err(), Some(TryRecvError::Empty));
    }

    #[test]
    fn tap_receives_from_other_thread() {
        let bus = Arc::new(EventBus::new());
        let (_, receiver) = bus.tap("ping");

        let emitter = Arc::clone(&bus);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            emitter.emit("ping", Payload::Value(json!(7)));
        });

        match receiver.recv_timeout(Duration::from_secs(1)) {
            Ok(payload) => assert_eq!(payload.as_value(), Some(&json!(7))),
            Err(e) => panic!("Failed to receive event from thread: {e:?}"),
        }
        handle.join().expect("Thread join failed");
    }

    #[test]
    fn tap_survives_dropped_receiver() {
        let bus = EventBus::new();
        let (id, receiver) = bus.tap("ping");
        drop(receiver);

        bus.emit("ping", Payload::Empty);
        assert!(bus.off(id));
    }
}
