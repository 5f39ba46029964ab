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

//! Bit sets describing host lifecycle state and declared component members.
//!
//! Multiple flags can be combined using bitwise operations.

use serde::{Deserialize, Serialize};

macro_rules! flag_set {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name {
            bits: u32,
        }

        impl $name {
            /// No flags set.
            pub const NONE: Self = Self { bits: 0 };

            /// Creates a new set of flags from raw bits.
            pub const fn from_bits(bits: u32) -> Self {
                Self { bits }
            }

            /// Returns the raw bits.
            pub const fn bits(&self) -> u32 {
                self.bits
            }

            /// Combines two sets of flags.
            pub const fn union(self, other: Self) -> Self {
                Self {
                    bits: self.bits | other.bits,
                }
            }

            /// Returns the flags of `self` that are not in `other`.
            pub const fn difference(self, other: Self) -> Self {
                Self {
                    bits: self.bits & !other.bits,
                }
            }

            /// Checks if every flag of `other` is set in `self`.
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// Checks if at least one flag of `other` is set in `self`.
            pub const fn intersects(&self, other: Self) -> bool {
                (self.bits & other.bits) != 0
            }

            /// Checks if these flags are empty.
            pub const fn is_empty(&self) -> bool {
                self.bits == 0
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self::Output {
                self.union(rhs)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                *self = self.union(rhs);
            }
        }
    };
}

flag_set! {
    /// Lifecycle and behavioral state of a single host.
    ///
    /// A freshly registered host starts with [`HostFlags::NONE`].
    HostFlags
}

impl HostFlags {
    /// The host has been connected to a document at least once.
    pub const HAS_CONNECTED: Self = Self::from_bits(1 << 0);
    /// The host completed at least one render pass.
    pub const HAS_RENDERED: Self = Self::from_bits(1 << 1);
    /// The host is waiting for its children to become ready.
    pub const IS_WAITING_FOR_CHILDREN: Self = Self::from_bits(1 << 2);
    /// The lazy instance is currently being constructed.
    pub const IS_CONSTRUCTING_INSTANCE: Self = Self::from_bits(1 << 3);
    /// An update has been queued for the next render pass.
    pub const IS_QUEUED_FOR_UPDATE: Self = Self::from_bits(1 << 4);
    /// The component finished its initialization phase.
    pub const HAS_INITIALIZED_COMPONENT: Self = Self::from_bits(1 << 5);
    /// The first render/hydration pass completed.
    pub const HAS_LOADED_COMPONENT: Self = Self::from_bits(1 << 6);
    /// Property watchers may fire.
    pub const IS_WATCH_READY: Self = Self::from_bits(1 << 7);
    /// Declared listeners may dispatch into the instance.
    pub const IS_LISTEN_READY: Self = Self::from_bits(1 << 8);
    /// Another render was requested while one was in flight.
    pub const NEEDS_RERENDER: Self = Self::from_bits(1 << 9);
}

flag_set! {
    /// Options of a declared event listener.
    ListenerFlags
}

impl ListenerFlags {
    /// The handler never cancels the event.
    pub const PASSIVE: Self = Self::from_bits(1 << 0);
    /// The handler runs in the capture phase.
    pub const CAPTURE: Self = Self::from_bits(1 << 1);
    /// The handler is installed on the document instead of the host.
    pub const TARGET_DOCUMENT: Self = Self::from_bits(1 << 2);
    /// The handler is installed on the window instead of the host.
    pub const TARGET_WINDOW: Self = Self::from_bits(1 << 3);
    /// The handler is installed on the document body instead of the host.
    pub const TARGET_BODY: Self = Self::from_bits(1 << 4);
}

flag_set! {
    /// Kind and options of a declared component member.
    MemberFlags
}

impl MemberFlags {
    /// A string-typed property.
    pub const STRING: Self = Self::from_bits(1 << 0);
    /// A number-typed property.
    pub const NUMBER: Self = Self::from_bits(1 << 1);
    /// A boolean-typed property.
    pub const BOOLEAN: Self = Self::from_bits(1 << 2);
    /// A property accepting any value.
    pub const ANY: Self = Self::from_bits(1 << 3);
    /// Internal state, not reflected on the public API.
    pub const STATE: Self = Self::from_bits(1 << 5);
    /// A public method.
    pub const METHOD: Self = Self::from_bits(1 << 6);
    /// An emitted event.
    pub const EVENT: Self = Self::from_bits(1 << 7);
    /// The property is reflected to an attribute.
    pub const REFLECT_ATTR: Self = Self::from_bits(1 << 9);
    /// The component may write the property itself.
    pub const MUTABLE: Self = Self::from_bits(1 << 10);

    /// Every flag describing a public property.
    pub const PROP: Self = Self::from_bits(
        Self::STRING.bits() | Self::NUMBER.bits() | Self::BOOLEAN.bits() | Self::ANY.bits(),
    );
}
