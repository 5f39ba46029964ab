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

//! The hidden per-host record.

use crate::identity_map::WeakObject;
use hostgate_core::{
    BuildFlags, ComponentMeta, GateResolver, HostFlags, HostId, InstanceValue, LifecycleGate,
    RuntimeKey,
};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// A strong, type-erased reference to a host or instance.
pub type HostObject = Arc<dyn Any + Send + Sync>;

/// A readiness gate together with the resolver that settles it.
struct Readiness {
    gate: LifecycleGate<()>,
    resolver: GateResolver<()>,
}

impl Readiness {
    fn new() -> Self {
        let (gate, resolver) = LifecycleGate::new();
        Self { gate, resolver }
    }
}

struct BoundInstance {
    key: RuntimeKey,
    object: HostObject,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Framework-private state of one host.
///
/// A `HostRef` is created by the registry when a host is upgraded and handed
/// out as an `Arc<HostRef>`. It holds the host only weakly: the record never
/// keeps its host alive. The optional parts (render count, instance-ready
/// gate, ready gate) exist only if the registry's [`BuildFlags`] enabled them
/// when the record was created.
pub struct HostRef {
    id: HostId,
    flags: AtomicU32,
    host_key: RuntimeKey,
    host_element: WeakObject,
    component_meta: Arc<ComponentMeta>,
    instance_values: Mutex<HashMap<String, InstanceValue>>,
    lazy_instance: Mutex<Option<BoundInstance>>,
    render_count: Option<AtomicU32>,
    instance_ready: Option<Readiness>,
    ready: Option<Readiness>,
}

impl HostRef {
    /// Builds a fresh record for `host`, shaped by `build`.
    pub(crate) fn new<H>(
        id: HostId,
        host: &Arc<H>,
        component_meta: Arc<ComponentMeta>,
        build: &BuildFlags,
    ) -> Self
    where
        H: Any + Send + Sync,
    {
        let weak: Weak<H> = Arc::downgrade(host);
        let host_element: WeakObject = weak;
        Self {
            id,
            flags: AtomicU32::new(HostFlags::NONE.bits()),
            host_key: RuntimeKey::of(host),
            host_element,
            component_meta,
            instance_values: Mutex::new(HashMap::new()),
            lazy_instance: Mutex::new(None),
            render_count: build.dev_mode.then(|| AtomicU32::new(0)),
            instance_ready: build.lazy_load.then(Readiness::new),
            ready: build.async_loading.then(Readiness::new),
        }
    }

    /// Returns the arena slot of this record.
    pub fn id(&self) -> HostId {
        self.id
    }

    // --- Flags ---

    /// Returns the current lifecycle flags.
    pub fn flags(&self) -> HostFlags {
        HostFlags::from_bits(self.flags.load(Ordering::Acquire))
    }

    /// Sets every flag of `flags`.
    pub fn insert_flags(&self, flags: HostFlags) {
        self.flags.fetch_or(flags.bits(), Ordering::AcqRel);
    }

    /// Clears every flag of `flags`.
    pub fn remove_flags(&self, flags: HostFlags) {
        self.flags.fetch_and(!flags.bits(), Ordering::AcqRel);
    }

    /// Returns `true` if every flag of `flags` is set.
    pub fn has_flags(&self, flags: HostFlags) -> bool {
        self.flags().contains(flags)
    }

    // --- Host ---

    /// Returns the identity of the host this record belongs to.
    pub fn host_key(&self) -> RuntimeKey {
        self.host_key
    }

    /// Returns the host, or `None` if it has been dropped.
    pub fn host_element(&self) -> Option<HostObject> {
        self.host_element.upgrade()
    }

    /// Returns the host downcast to its concrete type.
    pub fn host_as<H: Any + Send + Sync>(&self) -> Option<Arc<H>> {
        self.host_element()?.downcast::<H>().ok()
    }

    /// Returns `true` while the host is reachable from outside the registry.
    pub fn is_host_alive(&self) -> bool {
        self.host_element.strong_count() > 0
    }

    /// Returns the shared component descriptor.
    pub fn component_meta(&self) -> &Arc<ComponentMeta> {
        &self.component_meta
    }

    /// Returns `true` if `name` is a declared member of the component.
    pub fn is_member(&self, name: &str) -> bool {
        self.component_meta.has_member(name)
    }

    // --- Instance values ---

    /// Returns the cached value of a property.
    pub fn get_value(&self, name: &str) -> Option<InstanceValue> {
        lock(&self.instance_values).get(name).cloned()
    }

    /// Caches `value` for a property and returns the previous value.
    pub fn set_value(&self, name: impl Into<String>, value: InstanceValue) -> Option<InstanceValue> {
        let name = name.into();
        if !self.component_meta.has_member(&name) {
            log::trace!(
                "Caching undeclared property '{name}' on <{}>",
                self.component_meta.tag_name
            );
        }
        lock(&self.instance_values).insert(name, value)
    }

    /// Removes the cached value of a property.
    pub fn remove_value(&self, name: &str) -> Option<InstanceValue> {
        lock(&self.instance_values).remove(name)
    }

    /// Returns the names of every cached property, in no particular order.
    pub fn value_names(&self) -> Vec<String> {
        lock(&self.instance_values).keys().cloned().collect()
    }

    /// Returns `true` if no property value is cached.
    pub fn has_no_values(&self) -> bool {
        lock(&self.instance_values).is_empty()
    }

    // --- Lazy instance ---

    /// Returns the bound instance, if any.
    pub fn lazy_instance(&self) -> Option<HostObject> {
        lock(&self.lazy_instance)
            .as_ref()
            .map(|bound| Arc::clone(&bound.object))
    }

    /// Returns the bound instance downcast to its concrete type.
    pub fn instance_as<I: Any + Send + Sync>(&self) -> Option<Arc<I>> {
        self.lazy_instance()?.downcast::<I>().ok()
    }

    /// Returns the identity of the bound instance, if any.
    pub fn instance_key(&self) -> Option<RuntimeKey> {
        lock(&self.lazy_instance).as_ref().map(|bound| bound.key)
    }

    /// Binds `object` as the instance and returns the key of the instance it
    /// replaced, if any.
    pub(crate) fn bind_instance(&self, object: HostObject) -> Option<RuntimeKey> {
        let key = RuntimeKey::of(&object);
        lock(&self.lazy_instance)
            .replace(BoundInstance { key, object })
            .map(|previous| previous.key)
    }

    // --- Render accounting ---

    /// Returns the number of completed renders, or `None` outside dev mode.
    pub fn render_count(&self) -> Option<u32> {
        self.render_count
            .as_ref()
            .map(|count| count.load(Ordering::Acquire))
    }

    /// Records a completed render pass.
    ///
    /// Sets [`HostFlags::HAS_RENDERED`] and, in dev mode, bumps the render
    /// count. Returns the new count in dev mode.
    pub fn note_render(&self) -> Option<u32> {
        self.insert_flags(HostFlags::HAS_RENDERED);
        self.render_count
            .as_ref()
            .map(|count| count.fetch_add(1, Ordering::AcqRel) + 1)
    }

    // --- Lifecycle gates ---

    /// Returns the gate settled once an instance is bound.
    ///
    /// `None` when the registry was built without `lazy_load`.
    pub fn instance_ready(&self) -> Option<&LifecycleGate<()>> {
        self.instance_ready.as_ref().map(|r| &r.gate)
    }

    /// Returns the gate settled once the first render/hydration completes.
    ///
    /// `None` when the registry was built without `async_loading`.
    pub fn ready(&self) -> Option<&LifecycleGate<()>> {
        self.ready.as_ref().map(|r| &r.gate)
    }

    /// Waits until an instance is bound.
    ///
    /// Returns `None` at once when the record has no instance-ready gate.
    pub async fn on_instance(&self) -> Option<()> {
        match self.instance_ready() {
            Some(gate) => Some(gate.wait().await),
            None => None,
        }
    }

    /// Waits until the first render/hydration pass completes.
    ///
    /// Returns `None` at once when the record has no ready gate.
    pub async fn on_ready(&self) -> Option<()> {
        match self.ready() {
            Some(gate) => Some(gate.wait().await),
            None => None,
        }
    }

    /// Settles the instance-ready gate. Returns `true` only for the call that
    /// actually settled it.
    pub(crate) fn settle_instance_ready(&self) -> bool {
        self.instance_ready
            .as_ref()
            .is_some_and(|r| r.resolver.resolve(()))
    }

    /// Signals that the first render/hydration pass completed.
    ///
    /// Sets [`HostFlags::HAS_LOADED_COMPONENT`] and settles the ready gate.
    /// Returns `true` only for the call that actually settled the gate;
    /// repeated calls and records without a ready gate return `false`.
    pub fn mark_ready(&self) -> bool {
        self.insert_flags(HostFlags::HAS_LOADED_COMPONENT);
        let settled = self
            .ready
            .as_ref()
            .is_some_and(|r| r.resolver.resolve(()));
        if settled {
            log::debug!("{} <{}> is ready", self.id, self.component_meta.tag_name);
        }
        settled
    }
}

impl fmt::Debug for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRef")
            .field("id", &self.id)
            .field("tag_name", &self.component_meta.tag_name)
            .field("flags", &self.flags())
            .field("host_alive", &self.is_host_alive())
            .field("instance_bound", &self.instance_key().is_some())
            .field("render_count", &self.render_count())
            .finish_non_exhaustive()
    }
}
