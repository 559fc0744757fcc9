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

//! Provides the publish/subscribe primitives the mediator is built on.
//!
//! The [`Bus`] trait is the contract the mediator consumes: named events,
//! synchronous same-thread delivery, and unsubscription by id. [`EventBus`]
//! is the in-process implementation; any other bus honouring the same
//! delivery rules can be injected instead.

mod bus;
mod payload;
mod report;

pub use self::bus::{Bus, EventBus, Handler, SubscriptionId};
pub use self::payload::Payload;
pub use self::report::{ErrorReport, ErrorTarget};
