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

//! # Mediator Core
//!
//! Named module registry with deferred dependency resolution.
//!
//! Modules announce themselves on a shared [`Bus`] and are stored by name.
//! Consumers ask the [`Mediator`] to run a callback once a set of named
//! modules exists, or subscribe to bus events gated on those modules.
//!
//! The waiter bookkeeping behind [`Mediator::ready`] is internal; only its
//! ids and snapshots are public:
//!
//! ```compile_fail
//! use mediator_core::waiter::WaiterList;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod event;
pub mod mediator;
pub mod module;
pub mod registry;
pub(crate) mod waiter;

pub use config::MediatorConfig;
pub use error::MediatorError;
pub use event::{Bus, ErrorReport, ErrorTarget, EventBus, Handler, Payload, SubscriptionId};
pub use mediator::{Mediator, Subscription, WaitHandle, WeakMediator};
pub use module::{
    AsAny, DefaultNamingPolicy, Module, ModuleBase, ModuleOptions, ModuleRef, NamingPolicy,
};
pub use registry::Registry;
pub use waiter::{PendingWaiter, WaiterId};
