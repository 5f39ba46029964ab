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

//! Internal record storage and slot management.

use crate::host_ref::HostRef;
use hostgate_core::ids::HostId;
use std::sync::Arc;

/// A slot of the arena: the current id (including generation) and the record,
/// which is `Some` only while the slot holds a fully registered host.
type Slot = (HostId, Option<Arc<HostRef>>);

/// Internal arena of host records.
///
/// The `RecordStore` maintains a dense list of slots. Registration happens in
/// two steps: [`reserve`](RecordStore::reserve) hands out an id for a record
/// under construction, and [`fill`](RecordStore::fill) publishes the record
/// once it is complete. A reserved but unfilled slot resolves to nothing, so a
/// half-built record is never observable. Released slots are recycled through
/// a free list with a bumped generation.
#[derive(Default)]
pub(crate) struct RecordStore {
    slots: Vec<Slot>,
    /// Slot indices available for reuse, enabling $O(1)$ allocation.
    freed_slots: Vec<u32>,
    /// Number of filled slots.
    live: usize,
}

impl RecordStore {
    /// Creates a new, empty `RecordStore`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new or recycled `HostId` for a record under construction.
    ///
    /// If there are indices in the free list, one is popped and reused with
    /// the generation it was given on release. Otherwise, a new slot is appended.
    pub fn reserve(&mut self) -> HostId {
        if let Some(index) = self.freed_slots.pop() {
            self.slots[index as usize].0
        } else {
            let id = HostId {
                index: self.slots.len() as u32,
                generation: 0,
            };
            self.slots.push((id, None));
            id
        }
    }

    /// Publishes `record` into its reserved slot.
    ///
    /// Returns `false` if the id is stale or the slot is already filled.
    pub fn fill(&mut self, record: Arc<HostRef>) -> bool {
        let id = record.id();
        match self.slots.get_mut(id.index as usize) {
            Some((slot_id, slot @ None)) if *slot_id == id => {
                *slot = Some(record);
                self.live += 1;
                true
            }
            _ => false,
        }
    }

    /// Returns the record stored under `id` if the generation matches.
    pub fn get(&self, id: HostId) -> Option<&Arc<HostRef>> {
        self.slots
            .get(id.index as usize)
            .and_then(|(slot_id, record)| {
                if *slot_id == id {
                    record.as_ref()
                } else {
                    None
                }
            })
    }

    /// Releases the slot of `id`, returning its record if it was filled.
    ///
    /// Works for reserved-but-unfilled slots too, which is how an aborted
    /// registration gives its id back. The generation is bumped right away, so
    /// `id` and every copy of it are stale from here on.
    pub fn release(&mut self, id: HostId) -> Option<Arc<HostRef>> {
        let (slot_id, record) = self.slots.get_mut(id.index as usize)?;
        if *slot_id != id {
            return None;
        }
        slot_id.generation = slot_id.generation.wrapping_add(1);
        let record = record.take();
        if record.is_some() {
            self.live -= 1;
        }
        self.freed_slots.push(id.index);
        record
    }

    /// Returns the number of filled slots.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns an iterator over every filled record.
    pub fn records(&self) -> impl Iterator<Item = &Arc<HostRef>> {
        self.slots.iter().filter_map(|(_, record)| record.as_ref())
    }
}
