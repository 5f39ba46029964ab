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

//! The boundary to the listener attachment collaborator.

use crate::host_ref::{HostObject, HostRef};
use hostgate_core::ListenerMeta;
use std::sync::Arc;

/// Installs a component's declared event bindings on its host.
///
/// The registry never wires events itself. It calls the attacher once per host
/// registration, after the record is fully built and before the host becomes
/// visible through lookup. An error aborts the registration: the host stays
/// unregistered and the error is handed back to the caller.
///
/// Handlers that dispatch into the instance should keep the record through a
/// `Weak` and wait for [`HostRef::instance_ready`] before dispatching.
pub trait ListenerAttacher: Send + Sync {
    /// Installs `listeners` on `host` for `record`.
    fn attach(
        &self,
        host: &HostObject,
        record: &Arc<HostRef>,
        listeners: &[ListenerMeta],
        is_initial_attach: bool,
    ) -> anyhow::Result<()>;
}

/// An attacher that installs nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAttacher;

impl ListenerAttacher for NoopAttacher {
    fn attach(
        &self,
        _host: &HostObject,
        _record: &Arc<HostRef>,
        _listeners: &[ListenerMeta],
        _is_initial_attach: bool,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<F> ListenerAttacher for F
where
    F: Fn(&HostObject, &Arc<HostRef>, &[ListenerMeta], bool) -> anyhow::Result<()> + Send + Sync,
{
    fn attach(
        &self,
        host: &HostObject,
        record: &Arc<HostRef>,
        listeners: &[ListenerMeta],
        is_initial_attach: bool,
    ) -> anyhow::Result<()> {
        self(host, record, listeners, is_initial_attach)
    }
}
