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

//! Render and hydration queues owned by the host side.
//!
//! These queues belong to the host, not to its hidden record, and are consumed
//! by the rendering engine. They are kept in their own side table so they can
//! never collide with a member the component declares on its public API.

use hostgate_core::LifecycleGate;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A callback run once the host's pending render completes.
pub type RenderCallback = Box<dyn FnOnce() + Send + 'static>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The pending-render and pending-child queues of one host.
#[derive(Default)]
pub struct HostQueues {
    pending_renders: Mutex<VecDeque<RenderCallback>>,
    pending_children: Mutex<VecDeque<LifecycleGate<()>>>,
}

impl HostQueues {
    /// Creates empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a callback for the end of the pending render.
    pub fn push_render_callback<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        lock(&self.pending_renders).push_back(Box::new(callback));
    }

    /// Runs every queued render callback in insertion order and returns how
    /// many ran.
    ///
    /// The queue is detached before the callbacks run, so a callback may queue
    /// new work for the next render without deadlocking.
    pub fn drain_render_callbacks(&self) -> usize {
        let callbacks = std::mem::take(&mut *lock(&self.pending_renders));
        let count = callbacks.len();
        for callback in callbacks {
            callback();
        }
        count
    }

    /// Returns the number of queued render callbacks.
    pub fn pending_render_count(&self) -> usize {
        lock(&self.pending_renders).len()
    }

    /// Queues the readiness gate of a child the host must wait for.
    pub fn push_pending_child(&self, child_ready: LifecycleGate<()>) {
        lock(&self.pending_children).push_back(child_ready);
    }

    /// Returns the number of children still queued.
    pub fn pending_child_count(&self) -> usize {
        lock(&self.pending_children).len()
    }

    /// Waits for every queued child in order, then returns how many were
    /// awaited.
    ///
    /// Children queued while this call is waiting are awaited too.
    pub async fn wait_for_children(&self) -> usize {
        let mut awaited = 0;
        loop {
            let next = lock(&self.pending_children).pop_front();
            match next {
                Some(child) => {
                    child.wait().await;
                    awaited += 1;
                }
                None => return awaited,
            }
        }
    }
}

impl fmt::Debug for HostQueues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostQueues")
            .field("pending_renders", &self.pending_render_count())
            .field("pending_children", &self.pending_child_count())
            .finish()
    }
}
