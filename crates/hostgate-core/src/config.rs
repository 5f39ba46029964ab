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

//! Build switches that decide which optional record fields exist.

use serde::{Deserialize, Serialize};

/// Build-time configuration of the host registry.
///
/// The flags are resolved before the registry is constructed and never change
/// afterwards. Every record created by a registry is shaped by them: a record
/// built with `lazy_load` disabled has no instance-ready gate at all, rather
/// than a gate that never settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildFlags {
    /// Tracks render counts and rejects contract violations (double
    /// registration, premature instance binding) with an error instead of
    /// tolerating them.
    pub dev_mode: bool,
    /// Creates the instance-ready gate on every record.
    pub lazy_load: bool,
    /// Creates the overall-ready gate and the host-owned render/child queues.
    pub async_loading: bool,
}

impl Default for BuildFlags {
    fn default() -> Self {
        Self {
            dev_mode: cfg!(debug_assertions),
            lazy_load: true,
            async_loading: true,
        }
    }
}

impl BuildFlags {
    /// Every optional feature enabled, including developer checks.
    pub fn development() -> Self {
        Self {
            dev_mode: true,
            lazy_load: true,
            async_loading: true,
        }
    }

    /// Lazy and async loading enabled, developer checks disabled.
    pub fn production() -> Self {
        Self {
            dev_mode: false,
            lazy_load: true,
            async_loading: true,
        }
    }

    /// No optional feature: records carry no gates, no queues and no render count.
    pub fn minimal() -> Self {
        Self {
            dev_mode: false,
            lazy_load: false,
            async_loading: false,
        }
    }

    /// Returns the flags with `dev_mode` set to `enabled`.
    pub fn with_dev_mode(mut self, enabled: bool) -> Self {
        self.dev_mode = enabled;
        self
    }

    /// Returns the flags with `lazy_load` set to `enabled`.
    pub fn with_lazy_load(mut self, enabled: bool) -> Self {
        self.lazy_load = enabled;
        self
    }

    /// Returns the flags with `async_loading` set to `enabled`.
    pub fn with_async_loading(mut self, enabled: bool) -> Self {
        self.async_loading = enabled;
        self
    }

    /// Parses flags from a JSON object. Missing keys keep their default value.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
