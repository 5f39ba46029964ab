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

//! The host registry: registration protocol, identity lookup and teardown.

use crate::attach::{ListenerAttacher, NoopAttacher};
use crate::host_ref::{HostObject, HostRef};
use crate::identity_map::IdentityMap;
use crate::queues::HostQueues;
use crate::record_store::RecordStore;
use hostgate_core::{BuildFlags, ComponentMeta, HostId, LifecycleGate, RegistryError, RuntimeKey};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Everything guarded by the registry lock.
#[derive(Default)]
struct RegistryState {
    records: RecordStore,
    identities: IdentityMap,
    /// Host-owned queues, keyed like the identity map. The key's address stays
    /// pinned by the `Weak` the record keeps of its host.
    queues: HashMap<RuntimeKey, Arc<HostQueues>>,
}

impl RegistryState {
    /// Frees the slot of `id` and unlinks every key still pointing at it.
    fn discard(&mut self, id: HostId) -> Option<Arc<HostRef>> {
        let record = self.records.release(id)?;
        if let Some(instance_key) = record.instance_key() {
            if self.identities.get(instance_key) == Some(id) {
                self.identities.remove(instance_key);
            }
        }
        let host_key = record.host_key();
        match self.identities.get(host_key) {
            Some(other) if other != id => {}
            _ => {
                self.identities.remove(host_key);
                self.queues.remove(&host_key);
            }
        }
        Some(record)
    }
}

/// The per-host identity registry.
///
/// The registry associates hidden [`HostRef`] records with public host objects
/// (and, once loaded, with their instances) without ever holding the host or
/// the instance key strongly. It is the only shared mutable resource of the
/// lifecycle machinery and guards its tables with a single lock; every
/// operation is synchronous and never suspends.
///
/// # Registration order
///
/// [`register_host`](HostRegistry::register_host) runs the listener attacher
/// *before* the host is inserted into the identity map. If the attacher fails,
/// the record is discarded and the host stays unregistered.
pub struct HostRegistry {
    build: BuildFlags,
    attacher: Arc<dyn ListenerAttacher>,
    state: RwLock<RegistryState>,
}

impl HostRegistry {
    /// Creates an empty registry that attaches no listeners.
    pub fn new(build: BuildFlags) -> Self {
        Self::with_attacher(build, NoopAttacher)
    }

    /// Creates an empty registry using `attacher` to install listeners.
    pub fn with_attacher(build: BuildFlags, attacher: impl ListenerAttacher + 'static) -> Self {
        log::info!("Host registry initialized with {build:?}.");
        Self {
            build,
            attacher: Arc::new(attacher),
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Returns the build flags every record of this registry is shaped by.
    pub fn build_flags(&self) -> BuildFlags {
        self.build
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        // Each table update is completed before the guard is released, so a
        // poisoned lock still holds consistent tables.
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Registration ---

    /// Creates and registers the record of a freshly upgraded host.
    ///
    /// The record starts with no flags, no cached values and no instance. The
    /// render count, the instance-ready gate, the ready gate and the host
    /// queues are created according to the registry's [`BuildFlags`]. The
    /// listener attacher is then called with `is_initial_attach = true`, and
    /// only if it succeeds is `host` inserted into the identity map.
    ///
    /// Registering a host that is already registered is a
    /// [`RegistryError::DoubleRegistration`] in dev mode. Otherwise the new
    /// record replaces the old one.
    pub fn register_host<H>(
        &self,
        host: &Arc<H>,
        component_meta: Arc<ComponentMeta>,
    ) -> Result<Arc<HostRef>, RegistryError>
    where
        H: Any + Send + Sync,
    {
        let key = RuntimeKey::of(host);
        let (id, seen) = {
            let mut state = self.write();
            let seen = state.identities.get(key);
            if let Some(existing) = seen {
                if self.build.dev_mode {
                    return Err(RegistryError::DoubleRegistration { key, existing });
                }
                log::warn!("Host {key} registered again without release; replacing {existing}.");
            }
            (state.records.reserve(), seen)
        };

        let record = Arc::new(HostRef::new(id, host, component_meta, &self.build));
        let queues = self.build.async_loading.then(|| Arc::new(HostQueues::new()));

        // The lock is not held here, so the attacher may use the registry.
        let element: HostObject = host.clone();
        let meta = Arc::clone(record.component_meta());
        if let Err(source) = self.attacher.attach(&element, &record, &meta.listeners, true) {
            self.write().records.release(id);
            log::error!("Listener attachment failed for <{}>: {source:#}", meta.tag_name);
            return Err(RegistryError::AttachmentFailed {
                tag_name: meta.tag_name.clone(),
                source,
            });
        }

        {
            let mut state = self.write();
            // Another registration of the same host may have completed while
            // the attacher ran.
            if let Some(existing) = state.identities.get(key).filter(|&e| Some(e) != seen) {
                if self.build.dev_mode {
                    state.records.release(id);
                    return Err(RegistryError::DoubleRegistration { key, existing });
                }
                log::warn!("Host {key} registered concurrently; replacing {existing}.");
            }
            let filled = state.records.fill(Arc::clone(&record));
            debug_assert!(filled, "reserved slot {id} was taken by another record");
            if let Some(previous) = state.identities.insert(host, id) {
                state.discard(previous);
            }
            if let Some(queues) = queues {
                state.queues.insert(key, queues);
            }
        }

        log::debug!("Registered {id} for <{}> at {key}.", meta.tag_name);
        Ok(record)
    }

    /// Binds a loaded instance to its host's record.
    ///
    /// After this call, looking up either the host or `instance` yields
    /// `record`, and the record's instance-ready gate (if any) is settled.
    ///
    /// Binding to a record that is not registered is a
    /// [`RegistryError::PrematureInstanceBinding`] in dev mode. Otherwise the
    /// instance is bound and the gate settled, but `instance` is not made
    /// resolvable. Binding a second instance replaces the first one, whose
    /// key stops resolving.
    pub fn register_instance<I>(
        &self,
        instance: &Arc<I>,
        record: &Arc<HostRef>,
    ) -> Result<Arc<HostRef>, RegistryError>
    where
        I: Any + Send + Sync,
    {
        let id = record.id();
        let key = RuntimeKey::of(instance);
        {
            let mut state = self.write();
            let registered = state
                .records
                .get(id)
                .is_some_and(|live| Arc::ptr_eq(live, record));
            if !registered {
                if self.build.dev_mode {
                    return Err(RegistryError::PrematureInstanceBinding { record: id });
                }
                log::warn!("Binding an instance to unregistered record {id}.");
            }

            let object: HostObject = instance.clone();
            if let Some(previous) = record.bind_instance(object) {
                log::warn!("Instance of {id} rebound; replacing {previous}.");
                if previous != key && state.identities.get(previous) == Some(id) {
                    state.identities.remove(previous);
                }
            }
            if registered {
                state.identities.insert(instance, id);
            }
        }

        if record.settle_instance_ready() {
            log::debug!("Instance of {id} is ready at {key}.");
        }
        Ok(Arc::clone(record))
    }

    // --- Lookup ---

    /// Returns the record of a host or bound instance.
    ///
    /// `None` is the normal answer for an object that was never registered, has
    /// been released, or whose host has been dropped.
    pub fn lookup<K: ?Sized>(&self, object: &Arc<K>) -> Option<Arc<HostRef>> {
        self.lookup_key(RuntimeKey::of(object))
    }

    /// Returns the record bound to `key`.
    ///
    /// A lookup that lands on the record of a dropped host reclaims that record
    /// before answering `None`.
    pub fn lookup_key(&self, key: RuntimeKey) -> Option<Arc<HostRef>> {
        let stale = {
            let state = self.read();
            match state.identities.get_with_liveness(key) {
                None => None,
                Some((id, alive)) => match state.records.get(id) {
                    Some(record) if alive && record.is_host_alive() => {
                        log::trace!("Lookup of {key}: hit");
                        return Some(Arc::clone(record));
                    }
                    _ => Some(id),
                },
            }
        };
        log::trace!("Lookup of {key}: miss");
        if let Some(id) = stale {
            self.reclaim_stale(key, id);
        }
        None
    }

    /// Drops the binding of `key` and the record `id` it points at, provided
    /// they are still dead once the write lock is held.
    fn reclaim_stale(&self, key: RuntimeKey, id: HostId) {
        let mut state = self.write();
        let still_stale = match state.identities.get_with_liveness(key) {
            Some((bound, alive)) if bound == id => {
                !alive || state.records.get(id).map_or(true, |r| !r.is_host_alive())
            }
            _ => false,
        };
        if !still_stale {
            return;
        }
        state.identities.remove(key);
        if let Some(record) = state.discard(id) {
            log::debug!(
                "Reclaimed {id} (<{}>) of a dropped host on lookup.",
                record.component_meta().tag_name
            );
        }
    }

    /// Returns the record stored under `id`, if it is live and its host is
    /// still reachable.
    pub fn record_by_id(&self, id: HostId) -> Option<Arc<HostRef>> {
        self.read()
            .records
            .get(id)
            .filter(|record| record.is_host_alive())
            .cloned()
    }

    /// Returns the render and child queues of a registered host.
    ///
    /// `None` if the host is not registered or the registry was built without
    /// `async_loading`.
    pub fn host_queues<H: ?Sized>(&self, host: &Arc<H>) -> Option<Arc<HostQueues>> {
        let key = RuntimeKey::of(host);
        let state = self.read();
        if !state.identities.contains(key) {
            return None;
        }
        state.queues.get(&key).cloned()
    }

    /// Returns the number of records held, including those of dropped hosts
    /// that have been neither looked up nor purged since.
    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    /// Returns `true` if no record is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // --- Readiness ---

    /// Waits for the ready gate of every host that is registered and alive at
    /// the time of the call, and returns how many gates were awaited.
    ///
    /// Returns immediately with `0` when the registry was built without
    /// `async_loading`.
    pub async fn all_ready(&self) -> usize {
        let gates: Vec<LifecycleGate<()>> = {
            let state = self.read();
            state
                .records
                .records()
                .filter(|record| record.is_host_alive())
                .filter_map(|record| record.ready().cloned())
                .collect()
        };
        let count = gates.len();
        for gate in gates {
            gate.wait().await;
        }
        count
    }

    // --- Teardown ---

    /// Unregisters a host that is being destroyed.
    ///
    /// Removes the host and its bound instance from the identity map, drops its
    /// queues, frees the record's slot and returns the record. Returns `None`
    /// if the host was not registered.
    pub fn release_host<H: ?Sized>(&self, host: &Arc<H>) -> Option<Arc<HostRef>> {
        let key = RuntimeKey::of(host);
        let mut state = self.write();
        let id = state.identities.remove(key)?;
        let record = state.discard(id);
        if let Some(record) = &record {
            log::debug!("Released {} (<{}>).", id, record.component_meta().tag_name);
        }
        record
    }

    /// Reclaims the records of every host that has been dropped without being
    /// released, and returns how many were reclaimed.
    pub fn purge_dead(&self) -> usize {
        let mut state = self.write();
        let dead = state.identities.purge_dead();
        let reclaimed = dead
            .into_iter()
            .filter(|(_, id)| state.discard(*id).is_some())
            .count();
        if reclaimed > 0 {
            log::debug!("Purged {reclaimed} records of dropped hosts.");
        }
        reclaimed
    }
}

impl Default for HostRegistry {
    fn default() -> Self {
        Self::new(BuildFlags::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(tag: &str) -> Arc<ComponentMeta> {
        Arc::new(ComponentMeta::new(tag))
    }

    #[test]
    fn test_lookup_unregistered_is_none() {
        let registry = HostRegistry::new(BuildFlags::development());
        let host = Arc::new(String::from("elm"));
        assert!(registry.lookup(&host).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_then_lookup() {
        let registry = HostRegistry::new(BuildFlags::development());
        let host = Arc::new(String::from("elm"));
        let record = registry.register_host(&host, meta("cmp-a")).unwrap();

        let found = registry.lookup(&host).expect("Registered host should resolve");
        assert!(Arc::ptr_eq(&found, &record));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_double_registration_in_dev_mode() {
        let registry = HostRegistry::new(BuildFlags::development());
        let host = Arc::new(0u32);
        let first = registry.register_host(&host, meta("cmp-a")).unwrap();

        match registry.register_host(&host, meta("cmp-a")) {
            Err(RegistryError::DoubleRegistration { existing, .. }) => {
                assert_eq!(existing, first.id());
            }
            other => panic!("Expected DoubleRegistration, got {other:?}"),
        }
        assert!(Arc::ptr_eq(&registry.lookup(&host).unwrap(), &first));
    }

    #[test]
    fn test_double_registration_last_write_wins_in_production() {
        let registry = HostRegistry::new(BuildFlags::production());
        let host = Arc::new(0u32);
        let first = registry.register_host(&host, meta("cmp-a")).unwrap();
        let second = registry.register_host(&host, meta("cmp-a")).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&registry.lookup(&host).unwrap(), &second));
        assert_eq!(registry.len(), 1, "The replaced record should be discarded");
        assert!(registry.record_by_id(first.id()).is_none());
    }

    #[test]
    fn test_lookup_reclaims_record_of_dropped_host() {
        let registry = HostRegistry::new(BuildFlags::production());
        let host = Arc::new(String::from("elm"));
        let instance = Arc::new(vec![1u8, 2, 3]);
        let record = registry.register_host(&host, meta("cmp-a")).unwrap();
        registry.register_instance(&instance, &record).unwrap();
        let id = record.id();
        assert_eq!(Arc::strong_count(&instance), 2);

        drop(record);
        drop(host);
        assert!(registry.lookup(&instance).is_none());

        assert_eq!(registry.len(), 0);
        assert_eq!(Arc::strong_count(&instance), 1, "The reclaimed record must release its instance");
        assert!(registry.record_by_id(id).is_none());
        assert_eq!(registry.purge_dead(), 0);
    }

    #[test]
    fn test_lookup_by_stale_host_key_reclaims() {
        let registry = HostRegistry::new(BuildFlags::production());
        let host = Arc::new(0u32);
        let key = registry.register_host(&host, meta("cmp-a")).unwrap().host_key();

        drop(host);
        assert!(registry.lookup_key(key).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_release_frees_slot() {
        let registry = HostRegistry::new(BuildFlags::production());
        let host = Arc::new(0u32);
        let record = registry.register_host(&host, meta("cmp-a")).unwrap();

        let released = registry.release_host(&host).unwrap();
        assert!(Arc::ptr_eq(&released, &record));
        assert!(registry.lookup(&host).is_none());
        assert!(registry.host_queues(&host).is_none());
        assert!(registry.record_by_id(record.id()).is_none());
        assert!(registry.release_host(&host).is_none());
    }
}
