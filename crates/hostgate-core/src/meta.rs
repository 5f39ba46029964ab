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

//! Immutable per-component descriptors shared by every host of one kind.

use crate::flags::{ListenerFlags, MemberFlags};
use serde::{Deserialize, Serialize};

/// The value cached for a declared property of a host.
pub type InstanceValue = serde_json::Value;

/// A declared event binding of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerMeta {
    /// The native event name, e.g. `click`.
    pub event_name: String,
    /// The instance method the event dispatches into.
    pub handler: String,
    /// Listener options.
    #[serde(default)]
    pub flags: ListenerFlags,
}

impl ListenerMeta {
    /// Creates a listener binding with no options.
    pub fn new(event_name: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            handler: handler.into(),
            flags: ListenerFlags::NONE,
        }
    }

    /// Returns the binding with `flags` added.
    pub fn with_flags(mut self, flags: ListenerFlags) -> Self {
        self.flags |= flags;
        self
    }
}

/// A declared member (property, state, method or event) of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberMeta {
    /// The member name as seen on the public API.
    pub name: String,
    /// The member kind and options.
    pub flags: MemberFlags,
}

/// Descriptor of one component kind.
///
/// A `ComponentMeta` is built once (usually from compiler output) and then
/// shared behind an `Arc` by every host record of that kind. It is never
/// mutated after registration starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMeta {
    /// The custom element tag, e.g. `cmp-a`.
    pub tag_name: String,
    /// Declared event bindings, in declaration order.
    #[serde(default)]
    pub listeners: Vec<ListenerMeta>,
    /// Declared members, in declaration order.
    #[serde(default)]
    pub members: Vec<MemberMeta>,
}

impl ComponentMeta {
    /// Creates a descriptor with no listeners and no members.
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            listeners: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Returns the descriptor with an additional listener.
    pub fn with_listener(mut self, listener: ListenerMeta) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Returns the descriptor with an additional member.
    pub fn with_member(mut self, name: impl Into<String>, flags: MemberFlags) -> Self {
        self.members.push(MemberMeta {
            name: name.into(),
            flags,
        });
        self
    }

    /// Looks up a declared member by name.
    pub fn member(&self, name: &str) -> Option<&MemberMeta> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Returns `true` if `name` is a declared member of this component.
    pub fn has_member(&self, name: &str) -> bool {
        self.member(name).is_some()
    }
}
