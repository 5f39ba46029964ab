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

//! # Hostgate Data
//!
//! Storage side of the host lifecycle machinery: the arena of hidden host
//! records, the weak identity map from hosts and instances to those records,
//! the host-owned render/child queues, and the [`HostRegistry`] that ties them
//! together.
//!
//! The identity of a host is its allocation: hosts and instances are passed
//! as `Arc`s and are only ever held weakly by the registry.

#![warn(missing_docs)]

mod attach;
mod host_ref;
mod identity_map;
mod queues;
mod record_store;
mod registry;

pub use attach::{ListenerAttacher, NoopAttacher};
pub use host_ref::{HostObject, HostRef};
pub use identity_map::{IdentityMap, WeakObject};
pub use queues::{HostQueues, RenderCallback};
pub use registry::HostRegistry;

pub use hostgate_core::{
    BuildFlags, ComponentMeta, GateResolver, HostFlags, HostId, InstanceValue, LifecycleGate,
    ListenerFlags, ListenerMeta, MemberFlags, MemberMeta, RegistryError, RuntimeKey,
};
