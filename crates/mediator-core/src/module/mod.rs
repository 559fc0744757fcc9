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

//! Module instances and the capability used to name them.
//!
//! A module is any `Send + Sync` value implementing [`Module`]. The trait only
//! exposes the fields a [`NamingPolicy`] may probe; everything else about the
//! instance stays opaque to the registry. Shared handles are passed around as
//! [`ModuleRef`] and can be downcast back to their concrete type.

mod base;
mod naming;
mod options;

pub use self::base::ModuleBase;
pub use self::naming::{DefaultNamingPolicy, NamingPolicy};
pub use self::options::ModuleOptions;

use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Type-erasure helpers, implemented for every `Any + Send + Sync` type.
pub trait AsAny: Any + Send + Sync {
    /// Borrows the value as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Converts a shared handle into a type-erased one for [`Arc::downcast`].
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// The fully qualified name of the concrete type.
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// An instance that can be registered with the mediator.
///
/// All accessors default to `None`. Implement the ones that carry the
/// module's identity; [`DefaultNamingPolicy`] checks `options().id`,
/// `options().name`, `id()` and `name()` in that order.
pub trait Module: AsAny {
    /// Options the module was configured with, if any.
    fn options(&self) -> Option<&ModuleOptions> {
        None
    }

    /// Top-level identifier.
    fn id(&self) -> Option<&str> {
        None
    }

    /// Top-level display name.
    fn name(&self) -> Option<&str> {
        None
    }
}

/// A shared, cheaply clonable handle to a registered module.
#[derive(Clone)]
pub struct ModuleRef(Arc<dyn Module>);

impl ModuleRef {
    /// Wraps a module value in a new shared handle.
    pub fn new<M: Module>(module: M) -> Self {
        Self(Arc::new(module))
    }

    /// Wraps an existing shared module.
    pub fn from_arc(module: Arc<dyn Module>) -> Self {
        Self(module)
    }

    /// Returns the concrete module if it is a `T`.
    pub fn downcast<T: Module>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.0).into_any_arc().downcast::<T>().ok()
    }

    /// Borrows the concrete module if it is a `T`.
    pub fn downcast_ref<T: Module>(&self) -> Option<&T> {
        (*self.0).as_any().downcast_ref::<T>()
    }

    /// Returns `true` if both handles point at the same instance.
    pub fn ptr_eq(&self, other: &ModuleRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The unqualified name of the concrete module type.
    pub fn short_type_name(&self) -> &'static str {
        let full = (*self.0).type_name();
        // Strip generic arguments before taking the last path segment.
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Borrows the underlying shared pointer.
    pub fn as_arc(&self) -> &Arc<dyn Module> {
        &self.0
    }
}

impl Deref for ModuleRef {
    type Target = dyn Module;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl<M: Module> From<Arc<M>> for ModuleRef {
    fn from(module: Arc<M>) -> Self {
        Self(module)
    }
}

impl fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRef")
            .field("type", &self.short_type_name())
            .field("name", &DefaultNamingPolicy.resolve(&*self.0))
            .finish()
    }
}
