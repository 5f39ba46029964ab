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

//! Identity types shared by the record arena and the identity map.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A handle to a host record slot in the record arena.
///
/// It combines an index with a generation count to solve the "ABA problem".
/// When a host is released, its slot can be recycled for a new host, but the
/// generation is incremented. This ensures that a stale `HostId` pointing to a
/// recycled slot can never resolve to the record of an unrelated host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostId {
    /// The index of the record slot in the arena.
    pub index: u32,
    /// A generation counter that is incremented each time the index is recycled.
    pub generation: u32,
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host#{}v{}", self.index, self.generation)
    }
}

/// The identity of a host object or a bound instance.
///
/// Two `Arc`s produce the same key if and only if they point to the same
/// allocation. The key carries no ownership: it neither keeps the object alive
/// nor lets anyone reach it. Whoever stores a key next to a `Weak` of the same
/// allocation is guaranteed that the address is not reused while that `Weak`
/// exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuntimeKey(usize);

impl RuntimeKey {
    /// Returns the key of the allocation behind `object`.
    pub fn of<T: ?Sized>(object: &Arc<T>) -> Self {
        Self(Arc::as_ptr(object) as *const () as usize)
    }

    /// Returns the raw address this key was derived from.
    pub fn addr(&self) -> usize {
        self.0
    }
}

impl fmt::Display for RuntimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
