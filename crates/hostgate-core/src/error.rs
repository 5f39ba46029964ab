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

//! Error types surfaced by host registration and instance binding.
//!
//! Lookup misses and repeated gate settlement are not errors: the former is
//! reported as `None`, the latter as a `false` return from the resolver.

use crate::ids::{HostId, RuntimeKey};
use std::fmt;

/// An error returned by the host registry.
#[derive(Debug)]
pub enum RegistryError {
    /// The host was registered again without being released first.
    DoubleRegistration {
        /// The identity of the host.
        key: RuntimeKey,
        /// The record that is already registered for the host.
        existing: HostId,
    },
    /// An instance was bound to a record that is not (or no longer) registered.
    PrematureInstanceBinding {
        /// The record the instance was bound to.
        record: HostId,
    },
    /// The listener attachment collaborator failed during registration.
    ///
    /// The host is left unregistered when this is returned.
    AttachmentFailed {
        /// The tag of the component being registered.
        tag_name: String,
        /// The error reported by the collaborator.
        source: anyhow::Error,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DoubleRegistration { key, existing } => {
                write!(f, "Host {key} is already registered as {existing}")
            }
            RegistryError::PrematureInstanceBinding { record } => {
                write!(
                    f,
                    "Cannot bind an instance to {record}: the host was never registered"
                )
            }
            RegistryError::AttachmentFailed { tag_name, source } => {
                write!(f, "Listener attachment failed for '{tag_name}': {source}")
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::AttachmentFailed { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_attachment_failure_exposes_source() {
        let err = RegistryError::AttachmentFailed {
            tag_name: "cmp-a".into(),
            source: anyhow::anyhow!("no such event target"),
        };
        assert_eq!(
            err.to_string(),
            "Listener attachment failed for 'cmp-a': no such event target"
        );
        assert_eq!(err.source().unwrap().to_string(), "no such event target");
    }

    #[test]
    fn test_premature_binding_has_no_source() {
        let err = RegistryError::PrematureInstanceBinding {
            record: HostId {
                index: 0,
                generation: 2,
            },
        };
        assert!(err.source().is_none());
        assert!(err.to_string().contains("host#0v2"));
    }
}
