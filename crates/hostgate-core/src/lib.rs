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

//! # Hostgate Core
//!
//! Foundational crate containing the identifiers, shared component metadata,
//! lifecycle gates and error contracts used by the host registry.
//!
//! Nothing in this crate owns host state. The storage side (record arena,
//! identity map, registry) lives in `hostgate-data`.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod flags;
pub mod gate;
pub mod ids;
pub mod meta;

pub use config::BuildFlags;
pub use error::RegistryError;
pub use flags::{HostFlags, ListenerFlags, MemberFlags};
pub use gate::{GateResolver, LifecycleGate};
pub use ids::{HostId, RuntimeKey};
pub use meta::{ComponentMeta, InstanceValue, ListenerMeta, MemberMeta};
