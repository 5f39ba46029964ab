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

//! Weak association from host and instance identities to record slots.

use hostgate_core::ids::{HostId, RuntimeKey};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// An erased, non-owning reference to a host or instance.
pub type WeakObject = Weak<dyn Any + Send + Sync>;

#[derive(Clone)]
struct Binding {
    /// Keeps the key's address pinned without keeping the object alive.
    target: WeakObject,
    record: HostId,
}

/// A side table mapping object identities to record ids.
///
/// The map never holds a strong reference to a key object: each entry stores
/// a `Weak`, so inserting a host does not extend its lifetime. An entry whose
/// object has been dropped is treated exactly like a missing entry until it is
/// removed, either one at a time with [`remove`](IdentityMap::remove) or in
/// bulk with [`purge_dead`](IdentityMap::purge_dead).
///
/// Holding the `Weak` also keeps the allocation's address reserved, so a new
/// object can never be given the key of a dead one while its entry exists.
#[derive(Default)]
pub struct IdentityMap {
    bindings: HashMap<RuntimeKey, Binding>,
}

impl IdentityMap {
    /// Creates an empty identity map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `object` with `record`.
    ///
    /// A second insertion under the same key replaces the first (last write
    /// wins) and returns the record id that was live there before, if any.
    pub fn insert<T>(&mut self, object: &Arc<T>, record: HostId) -> Option<HostId>
    where
        T: Any + Send + Sync,
    {
        let target: Arc<dyn Any + Send + Sync> = object.clone();
        self.insert_erased(&target, record)
    }

    /// Same as [`insert`](IdentityMap::insert) for an already erased object.
    pub fn insert_erased(
        &mut self,
        object: &Arc<dyn Any + Send + Sync>,
        record: HostId,
    ) -> Option<HostId> {
        let key = RuntimeKey::of(object);
        let binding = Binding {
            target: Arc::downgrade(object),
            record,
        };
        self.bindings
            .insert(key, binding)
            .filter(|previous| previous.target.strong_count() > 0)
            .map(|previous| previous.record)
    }

    /// Looks up the record id bound to `key`.
    ///
    /// Returns `None` if the key was never inserted, was removed, or its object
    /// is no longer alive.
    pub fn get(&self, key: RuntimeKey) -> Option<HostId> {
        self.bindings
            .get(&key)
            .filter(|binding| binding.target.strong_count() > 0)
            .map(|binding| binding.record)
    }

    /// Looks up the record id bound to `key` whether its object is alive or
    /// not, together with that liveness.
    pub fn get_with_liveness(&self, key: RuntimeKey) -> Option<(HostId, bool)> {
        self.bindings
            .get(&key)
            .map(|binding| (binding.record, binding.target.strong_count() > 0))
    }

    /// Returns `true` if `key` is bound to a live object.
    pub fn contains(&self, key: RuntimeKey) -> bool {
        self.get(key).is_some()
    }

    /// Removes the entry of `key`, returning its record id whether the object
    /// is alive or not.
    pub fn remove(&mut self, key: RuntimeKey) -> Option<HostId> {
        self.bindings.remove(&key).map(|binding| binding.record)
    }

    /// Removes every entry whose object has been dropped and returns them.
    pub fn purge_dead(&mut self) -> Vec<(RuntimeKey, HostId)> {
        let mut dead = Vec::new();
        self.bindings.retain(|key, binding| {
            let alive = binding.target.strong_count() > 0;
            if !alive {
                dead.push((*key, binding.record));
            }
            alive
        });
        dead
    }

    /// Returns the number of entries, including dead ones not yet purged.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
