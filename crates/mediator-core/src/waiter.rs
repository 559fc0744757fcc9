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

//! Pending callbacks blocked on not-yet-registered module names.
//!
//! A waiter keeps two views of its dependencies: the full ordered list of
//! names, which fixes the argument order of its callback, and the set of
//! names still missing, which shrinks as modules arrive. Resolution happens
//! in two steps so that callbacks never run while the list is borrowed:
//!
//! 1. [`WaiterList::mark_available`] strikes a name from every waiter and
//!    returns the ids of the waiters it completed, in creation order.
//! 2. Each completed waiter is removed with [`WaiterList::take`] and only then
//!    invoked. A waiter that is no longer in the list (cancelled, or already
//!    taken) is skipped, so none fires twice.

use crate::module::ModuleRef;
use crate::registry::Registry;
use std::collections::HashSet;
use std::fmt;

/// The callback of a waiter, receiving one instance per requested name.
pub type ReadyCallback = Box<dyn FnOnce(Vec<ModuleRef>) + Send>;

/// Identifies a waiter for cancellation and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaiterId(u64);

impl fmt::Display for WaiterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "waiter#{}", self.0)
    }
}

struct Waiter {
    id: WaiterId,
    outstanding: HashSet<String>,
    names: Vec<String>,
    callback: ReadyCallback,
}

/// A waiter whose dependencies are all present, removed from the list and
/// ready to be invoked.
pub struct CompletedWaiter {
    names: Vec<String>,
    callback: ReadyCallback,
}

impl CompletedWaiter {
    /// The requested names, in callback argument order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Looks up the current instance for every requested name.
    ///
    /// Returns `None` if any name is missing from `registry`.
    pub fn instances(&self, registry: &Registry) -> Option<Vec<ModuleRef>> {
        self.names.iter().map(|name| registry.lookup(name)).collect()
    }

    /// Invokes the callback, consuming the waiter.
    pub fn invoke(self, instances: Vec<ModuleRef>) {
        (self.callback)(instances);
    }
}

/// A read-only view of a pending waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWaiter {
    /// The waiter's id.
    pub id: WaiterId,
    /// Names still missing, sorted.
    pub outstanding: Vec<String>,
    /// All requested names, in callback argument order.
    pub names: Vec<String>,
}

/// Waiters in creation order.
#[derive(Default)]
pub struct WaiterList {
    waiters: Vec<Waiter>,
    next_id: u64,
}

impl WaiterList {
    /// Appends a waiter blocked on `outstanding`.
    ///
    /// `names` is the full request in callback argument order; `outstanding`
    /// is the subset not yet registered and must not be empty.
    pub fn push(
        &mut self,
        outstanding: HashSet<String>,
        names: Vec<String>,
        callback: ReadyCallback,
    ) -> WaiterId {
        debug_assert!(!outstanding.is_empty(), "satisfied waiters must not be queued");
        let id = WaiterId(self.next_id);
        self.next_id += 1;
        self.waiters.push(Waiter {
            id,
            outstanding,
            names,
            callback,
        });
        id
    }

    /// Removes `name` from every waiter's outstanding set.
    ///
    /// Returns the ids of the waiters this call completed, in creation order.
    /// Completed waiters stay in the list until [`take`](Self::take)n.
    pub fn mark_available(&mut self, name: &str) -> Vec<WaiterId> {
        self.waiters
            .iter_mut()
            .filter_map(|waiter| {
                let completed = waiter.outstanding.remove(name) && waiter.outstanding.is_empty();
                completed.then_some(waiter.id)
            })
            .collect()
    }

    /// Removes a waiter whose dependencies are all present.
    ///
    /// Returns `None` if the waiter is gone or still has outstanding names.
    pub fn take(&mut self, id: WaiterId) -> Option<CompletedWaiter> {
        let index = self
            .waiters
            .iter()
            .position(|waiter| waiter.id == id && waiter.outstanding.is_empty())?;
        let waiter = self.waiters.remove(index);
        Some(CompletedWaiter {
            names: waiter.names,
            callback: waiter.callback,
        })
    }

    /// Drops a waiter without invoking it. Returns `false` if it was not pending.
    pub fn cancel(&mut self, id: WaiterId) -> bool {
        let before = self.waiters.len();
        self.waiters.retain(|waiter| waiter.id != id);
        self.waiters.len() != before
    }

    /// Returns `true` if the waiter is still in the list.
    pub fn contains(&self, id: WaiterId) -> bool {
        self.waiters.iter().any(|waiter| waiter.id == id)
    }

    /// Number of waiters in the list.
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    /// Snapshot of every waiter, in creation order.
    pub fn pending(&self) -> Vec<PendingWaiter> {
        self.waiters
            .iter()
            .map(|waiter| {
                let mut outstanding: Vec<String> = waiter.outstanding.iter().cloned().collect();
                outstanding.sort();
                PendingWaiter {
                    id: waiter.id,
                    outstanding,
                    names: waiter.names.clone(),
                }
            })
            .collect()
    }
}

impl fmt::Debug for WaiterList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.pending()).finish()
    }
}
