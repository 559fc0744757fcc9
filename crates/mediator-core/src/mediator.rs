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

//! The mediator context: registration, readiness and gated subscriptions.
//!
//! A [`Mediator`] owns a [`Registry`] and the list of pending waiters, and
//! listens on an injected [`Bus`] for creation events:
//!
//! ```text
//! emit("created", module)
//!     └─► naming policy ──► Registry::register ──► resolve waiters ──► emit("created:<name>", module)
//! ```
//!
//! Everything runs synchronously on the caller's stack. No lock is held while
//! a user callback runs, so callbacks may register modules, call
//! [`ready`](Mediator::ready) or cancel handles freely.

use crate::config::MediatorConfig;
use crate::event::{Bus, Handler, Payload, SubscriptionId};
use crate::module::{DefaultNamingPolicy, Module, ModuleRef, NamingPolicy};
use crate::registry::Registry;
use crate::waiter::{PendingWaiter, WaiterId, WaiterList};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct State {
    registry: Registry,
    waiters: WaiterList,
}

struct Inner {
    bus: Arc<dyn Bus>,
    config: MediatorConfig,
    naming: Box<dyn NamingPolicy>,
    state: Mutex<State>,
    listener: Mutex<Option<SubscriptionId>>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let listener = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(id) = listener {
            self.bus.off(id);
        }
    }
}

/// Registry of named modules with deferred dependency resolution.
///
/// Cloning a `Mediator` yields another handle to the same registry. The
/// creation listener is removed from the bus by [`detach`](Self::detach) or
/// when the last handle is dropped.
///
/// A pending callback that captures a `Mediator` clone keeps the mediator
/// alive, so dropping every outside handle does not tear it down. Capture a
/// [`WeakMediator`] from [`downgrade`](Self::downgrade) instead, or call
/// [`detach`](Self::detach) explicitly.
#[derive(Clone)]
pub struct Mediator {
    inner: Arc<Inner>,
}

impl Mediator {
    /// Creates a mediator on `bus` with the default configuration.
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self::with_config(bus, MediatorConfig::default())
    }

    /// Creates a mediator on `bus` with the given configuration.
    pub fn with_config(bus: Arc<dyn Bus>, config: MediatorConfig) -> Self {
        Self::with_naming_policy(bus, config, DefaultNamingPolicy)
    }

    /// Creates a mediator that names modules with a custom policy.
    pub fn with_naming_policy(
        bus: Arc<dyn Bus>,
        config: MediatorConfig,
        naming: impl NamingPolicy + 'static,
    ) -> Self {
        let inner = Arc::new(Inner {
            bus,
            config,
            naming: Box::new(naming),
            state: Mutex::new(State::default()),
            listener: Mutex::new(None),
        });

        let weak = Arc::downgrade(&inner);
        let listener: Handler = Arc::new(move |payload: &Payload| {
            if let Some(inner) = weak.upgrade() {
                Mediator { inner }.on_created(payload);
            }
        });
        let id = inner.bus.on(&inner.config.created_event, listener);
        *lock(&inner.listener) = Some(id);

        log::info!(
            "Mediator: listening for '{}' events.",
            inner.config.created_event
        );
        Self { inner }
    }

    /// Creates a handle that does not keep the mediator alive.
    pub fn downgrade(&self) -> WeakMediator {
        WeakMediator {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// The bus this mediator listens on.
    pub fn bus(&self) -> &Arc<dyn Bus> {
        &self.inner.bus
    }

    /// The active configuration.
    pub fn config(&self) -> &MediatorConfig {
        &self.inner.config
    }

    /// The name-scoped event emitted when `name` is registered.
    pub fn scoped_event(&self, name: &str) -> String {
        self.inner.config.scoped_event(name)
    }

    /// Stops listening for creation events.
    ///
    /// Already registered modules and pending waiters are kept, and direct
    /// calls to [`register`](Self::register) keep working. Returns `false` if
    /// the mediator was already detached.
    pub fn detach(&self) -> bool {
        let listener = lock(&self.inner.listener).take();
        match listener {
            Some(id) => {
                self.inner.bus.off(id);
                log::info!("Mediator: detached from the bus.");
                true
            }
            None => false,
        }
    }

    /// Emits the creation event for `instance` on the bus.
    ///
    /// This is what a module does once it is constructed; the mediator picks
    /// it up like any other creation event.
    pub fn announce(&self, instance: ModuleRef) {
        self.inner
            .bus
            .emit(&self.inner.config.created_event, Payload::Module(instance));
    }

    /// Registers `instance` under `name` without going through the bus.
    ///
    /// The previous instance under `name`, if any, is replaced. Waiters whose
    /// last missing name was `name` fire before this returns, then
    /// `"<prefix><name>"` is emitted with the instance.
    pub fn register(&self, name: impl Into<String>, instance: ModuleRef) {
        let name = name.into();
        let replaced = self
            .inner
            .state()
            .registry
            .register(name.clone(), instance.clone());

        if replaced.is_some() {
            log::debug!("Mediator: replaced module '{name}'.");
        } else {
            log::info!(
                "Mediator: registered module '{name}' ({}).",
                instance.short_type_name()
            );
        }

        self.notify_available(&name);
        self.inner
            .bus
            .emit(&self.inner.config.scoped_event(&name), Payload::Module(instance));
    }

    /// Returns the module registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<ModuleRef> {
        self.inner.state().registry.lookup(name)
    }

    /// Returns the module registered under `name` if it is a `T`.
    pub fn get<T: Module>(&self, name: &str) -> Option<Arc<T>> {
        self.inner.state().registry.get::<T>(name)
    }

    /// Returns `true` if a module is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.state().registry.contains(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.inner.state().registry.names()
    }

    /// Runs `callback` once every module in `names` is registered.
    ///
    /// If they all are already, `callback` runs before this returns.
    /// Otherwise it is queued and runs exactly once, inside the registration
    /// that supplies the last missing name. Instances are passed in the order
    /// of `names` and are the latest registered for each name at that point.
    ///
    /// Empty `names` calls back immediately with no instances. Names that are
    /// never registered keep the callback pending until the returned handle
    /// is cancelled.
    ///
    /// ## Arguments
    /// * `names` - The modules to wait for, in callback argument order.
    /// * `callback` - Receives one instance per entry of `names`.
    ///
    /// ## Returns
    /// A handle to cancel the callback while it is still queued.
    pub fn ready<F>(&self, names: &[&str], callback: F) -> WaitHandle
    where
        F: FnOnce(Vec<ModuleRef>) + Send + 'static,
    {
        let names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        let mut state = self.inner.state();
        let missing: HashSet<String> = names
            .iter()
            .filter(|name| !state.registry.contains(name.as_str()))
            .cloned()
            .collect();

        if missing.is_empty() {
            let instances: Vec<ModuleRef> = names
                .iter()
                .filter_map(|name| state.registry.lookup(name))
                .collect();
            drop(state);
            callback(instances);
            return WaitHandle {
                id: None,
                inner: Arc::downgrade(&self.inner),
            };
        }

        let mut waiting_on: Vec<&String> = missing.iter().collect();
        waiting_on.sort();
        let waiting_on = waiting_on
            .into_iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        let id = state.waiters.push(missing, names, Box::new(callback));
        let pending = state.waiters.len();
        drop(state);

        log::debug!("Mediator: {id} waiting on [{waiting_on}].");
        if let Some(threshold) = self.inner.config.pending_warn_threshold {
            if pending > threshold {
                log::warn!(
                    "Mediator: {pending} waiters pending (threshold {threshold}); latest is waiting on [{waiting_on}]."
                );
            }
        }

        WaitHandle {
            id: Some(id),
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Subscribes to `event`, delivering each firing once `names` are registered.
    ///
    /// Every firing runs `handler` at most once, with that firing's payload
    /// and the instances for `names`. A firing that arrives before the
    /// dependencies exist is queued and delivered when they do, after the
    /// event itself has finished dispatching. With empty `names` the handler
    /// runs synchronously on every firing.
    ///
    /// ## Arguments
    /// * `event` - The bus event to subscribe to.
    /// * `names` - The modules each firing waits for.
    /// * `handler` - Receives the firing's payload and the instances for `names`.
    ///
    /// ## Returns
    /// A subscription that stops future firings and drops queued ones when cancelled.
    pub fn on<F>(&self, event: &str, names: &[&str], handler: F) -> Subscription
    where
        F: Fn(&Payload, &[ModuleRef]) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        let names: Arc<[String]> = names.iter().map(|name| name.to_string()).collect();
        let queued: Arc<Mutex<Vec<WaiterId>>> = Arc::default();
        let topic = event.to_string();

        let weak = Arc::downgrade(&self.inner);
        let tracked = Arc::clone(&queued);
        let gate: Handler = Arc::new(move |payload: &Payload| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mediator = Mediator { inner };
            let data = payload.clone();
            let handler = Arc::clone(&handler);
            let required: Vec<&str> = names.iter().map(String::as_str).collect();

            let wait = mediator.ready(&required, move |instances| {
                (*handler)(&data, instances.as_slice());
            });

            if let Some(id) = wait.id() {
                log::debug!("Mediator: '{topic}' firing queued behind {id}.");
                let mut tracked = lock(&tracked);
                let state = mediator.inner.state();
                tracked.retain(|queued| state.waiters.contains(*queued));
                tracked.push(id);
            }
        });

        let id = self.inner.bus.on(event, gate);
        Subscription {
            id,
            bus: Arc::clone(&self.inner.bus),
            queued,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Snapshot of every pending waiter, in creation order.
    pub fn pending(&self) -> Vec<PendingWaiter> {
        self.inner.state().waiters.pending()
    }

    /// Number of pending waiters.
    pub fn pending_count(&self) -> usize {
        self.inner.state().waiters.len()
    }

    /// Logs a warning for every pending waiter and returns how many there are.
    pub fn report_pending(&self) -> usize {
        let pending = self.pending();
        for waiter in &pending {
            log::warn!(
                "Mediator: {} still waiting on [{}] (requested [{}]).",
                waiter.id,
                waiter.outstanding.join(", "),
                waiter.names.join(", ")
            );
        }
        pending.len()
    }

    fn on_created(&self, payload: &Payload) {
        let Some(module) = payload.as_module() else {
            log::debug!(
                "Mediator: ignoring '{}' event without a module payload.",
                self.inner.config.created_event
            );
            return;
        };

        match self.inner.naming.resolve(&**module) {
            Some(name) => self.register(name, module.clone()),
            None if self.inner.config.warn_on_unnamed => {
                log::warn!(
                    "Mediator: dropping {} instance without a resolvable name.",
                    module.short_type_name()
                );
            }
            None => {
                log::debug!(
                    "Mediator: dropping {} instance without a resolvable name.",
                    module.short_type_name()
                );
            }
        }
    }

    fn notify_available(&self, name: &str) {
        let completed = self.inner.state().waiters.mark_available(name);
        if completed.is_empty() {
            return;
        }
        log::debug!(
            "Mediator: '{name}' completed {} waiter(s).",
            completed.len()
        );

        for id in completed {
            let (waiter, instances) = {
                let mut state = self.inner.state();
                let Some(waiter) = state.waiters.take(id) else {
                    log::trace!("Mediator: {id} was cancelled before it could fire.");
                    continue;
                };
                match waiter.instances(&state.registry) {
                    Some(instances) => (waiter, instances),
                    None => {
                        log::error!(
                            "Mediator: {id} completed but [{}] is not fully registered.",
                            waiter.names().join(", ")
                        );
                        continue;
                    }
                }
            };
            log::trace!("Mediator: firing {id}.");
            waiter.invoke(instances);
        }
    }
}

impl fmt::Debug for Mediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state();
        f.debug_struct("Mediator")
            .field("config", &self.inner.config)
            .field("modules", &state.registry.names())
            .field("pending", &state.waiters.len())
            .finish()
    }
}

/// A non-owning handle to a [`Mediator`].
///
/// Safe to capture in pending callbacks: it does not keep the mediator or its
/// bus listener alive.
#[derive(Clone)]
pub struct WeakMediator {
    inner: Weak<Inner>,
}

impl WeakMediator {
    /// Returns the mediator if any strong handle still exists.
    pub fn upgrade(&self) -> Option<Mediator> {
        self.inner.upgrade().map(|inner| Mediator { inner })
    }
}

impl fmt::Debug for WeakMediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakMediator")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Handle to a [`ready`](Mediator::ready) request.
///
/// Dropping the handle does not cancel the request.
#[derive(Debug, Clone)]
pub struct WaitHandle {
    id: Option<WaiterId>,
    inner: Weak<Inner>,
}

impl WaitHandle {
    /// The waiter id, or `None` if the callback ran immediately.
    pub fn id(&self) -> Option<WaiterId> {
        self.id
    }

    /// Returns `true` while the callback is queued.
    pub fn is_pending(&self) -> bool {
        match (self.id, self.inner.upgrade()) {
            (Some(id), Some(inner)) => inner.state().waiters.contains(id),
            _ => false,
        }
    }

    /// Drops the queued callback without running it.
    ///
    /// Returns `false` if the callback already ran or was never queued.
    pub fn cancel(&self) -> bool {
        let (Some(id), Some(inner)) = (self.id, self.inner.upgrade()) else {
            return false;
        };
        let cancelled = inner.state().waiters.cancel(id);
        if cancelled {
            log::debug!("Mediator: {id} cancelled.");
        }
        cancelled
    }
}

/// Handle to an [`on`](Mediator::on) subscription.
///
/// Dropping the handle keeps the subscription alive.
pub struct Subscription {
    id: SubscriptionId,
    bus: Arc<dyn Bus>,
    queued: Arc<Mutex<Vec<WaiterId>>>,
    inner: Weak<Inner>,
}

impl Subscription {
    /// The underlying bus subscription.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Number of firings still waiting for their dependencies.
    pub fn queued(&self) -> usize {
        let Some(inner) = self.inner.upgrade() else {
            return 0;
        };
        let queued = lock(&self.queued);
        let state = inner.state();
        queued.iter().filter(|id| state.waiters.contains(**id)).count()
    }

    /// Unsubscribes from the bus and drops every queued firing.
    ///
    /// Returns the number of queued firings that were dropped.
    pub fn cancel(&self) -> usize {
        self.bus.off(self.id);
        let queued = std::mem::take(&mut *lock(&self.queued));
        let Some(inner) = self.inner.upgrade() else {
            return 0;
        };
        let mut state = inner.state();
        let dropped = queued
            .into_iter()
            .filter(|id| state.waiters.cancel(*id))
            .count();
        log::debug!(
            "Mediator: subscription {:?} cancelled, {dropped} queued firing(s) dropped.",
            self.id
        );
        dropped
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBus;
    use crate::module::ModuleOptions;

    struct Named(&'static str);
    impl Module for Named {
        fn name(&self) -> Option<&str> {
            Some(self.0)
        }
    }

    #[test]
    fn listener_is_installed_and_removed() {
        let bus = Arc::new(EventBus::new());
        let mediator = Mediator::new(bus.clone());
        assert_eq!(bus.listener_count("created"), 1);

        assert!(mediator.detach());
        assert!(!mediator.detach());
        assert_eq!(bus.listener_count("created"), 0);

        bus.emit("created", Payload::Module(ModuleRef::new(Named("late"))));
        assert!(!mediator.contains("late"));
    }

    #[test]
    fn dropping_last_handle_unsubscribes() {
        let bus = Arc::new(EventBus::new());
        let mediator = Mediator::new(bus.clone());
        let clone = mediator.clone();

        drop(mediator);
        assert_eq!(bus.listener_count("created"), 1);
        drop(clone);
        assert_eq!(bus.listener_count("created"), 0);
    }

    #[test]
    fn dropping_last_handle_with_cyclic_waiter_requires_detach() {
        let bus = Arc::new(EventBus::new());
        let mediator = Mediator::new(bus.clone());
        let weak = mediator.downgrade();
        let captured = mediator.clone();
        let handle = mediator.ready(&["never"], move |_| {
            let _ = captured.names();
        });

        // The queued callback owns a strong handle.
        drop(mediator);
        assert_eq!(bus.listener_count("created"), 1);

        let mediator = weak.upgrade().unwrap();
        assert!(mediator.detach());
        assert_eq!(bus.listener_count("created"), 0);

        assert!(handle.cancel());
        drop(mediator);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn weak_handle_in_callback_does_not_keep_mediator_alive() {
        let bus = Arc::new(EventBus::new());
        let mediator = Mediator::new(bus.clone());
        let weak = mediator.downgrade();
        let captured = weak.clone();
        mediator.ready(&["never"], move |_| {
            if let Some(mediator) = captured.upgrade() {
                let _ = mediator.names();
            }
        });

        drop(mediator);
        assert_eq!(bus.listener_count("created"), 0);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn custom_created_event() {
        let bus = Arc::new(EventBus::new());
        let config = MediatorConfig {
            created_event: "spawned".to_string(),
            scoped_event_prefix: "spawned/".to_string(),
            ..Default::default()
        };
        let mediator = Mediator::with_config(bus.clone(), config);
        let (_, scoped) = bus.tap("spawned/menu");

        bus.emit("created", Payload::Module(ModuleRef::new(Named("ignored"))));
        mediator.announce(ModuleRef::new(Named("menu")));

        assert!(!mediator.contains("ignored"));
        assert!(mediator.contains("menu"));
        assert_eq!(scoped.try_iter().count(), 1);
        assert_eq!(mediator.scoped_event("menu"), "spawned/menu");
    }

    #[test]
    fn custom_naming_policy() {
        let bus = Arc::new(EventBus::new());
        let mediator = Mediator::with_naming_policy(
            bus,
            MediatorConfig::default(),
            |module: &dyn Module| module.name().map(|n| format!("ui.{n}")),
        );

        mediator.announce(ModuleRef::new(Named("menu")));
        assert_eq!(mediator.names(), vec!["ui.menu"]);
    }

    #[test]
    fn non_module_payloads_are_ignored() {
        let bus = Arc::new(EventBus::new());
        let mediator = Mediator::new(bus.clone());

        bus.emit("created", Payload::Value(serde_json::json!({ "name": "x" })));
        bus.emit("created", Payload::Empty);
        assert!(mediator.names().is_empty());
    }

    #[test]
    fn options_identity_is_used() {
        let bus = Arc::new(EventBus::new());
        let mediator = Mediator::new(bus);
        let base = crate::module::ModuleBase::with_options(ModuleOptions::new().with_id("pages"));

        mediator.announce(ModuleRef::new(base));
        assert!(mediator.get::<crate::module::ModuleBase>("pages").is_some());
    }

    #[test]
    fn report_pending_counts_waiters() {
        let bus = Arc::new(EventBus::new());
        let config = MediatorConfig {
            pending_warn_threshold: Some(0),
            ..Default::default()
        };
        let mediator = Mediator::with_config(bus, config);

        mediator.ready(&["A"], |_| {});
        mediator.ready(&["A", "B"], |_| {});
        assert_eq!(mediator.report_pending(), 2);
        assert_eq!(mediator.pending()[1].outstanding, vec!["A", "B"]);
    }

    #[test]
    fn wait_handle_outlives_mediator() {
        let bus = Arc::new(EventBus::new());
        let mediator = Mediator::new(bus);
        let handle = mediator.ready(&["never"], |_| {});
        assert!(handle.is_pending());

        drop(mediator);
        assert!(!handle.is_pending());
        assert!(!handle.cancel());
    }
}
