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

//! One-shot deferred readiness signals.
//!
//! A [`LifecycleGate`] starts `Pending` and is settled exactly once through its
//! paired [`GateResolver`]. Every awaiter, whether it started waiting before or
//! after settlement, observes the same value. Resolving an already settled
//! gate is a no-op.
//!
//! The gate itself never times out and cannot be cancelled. Dropping a
//! pending `wait()` future only stops that awaiter.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

enum GateState<T> {
    Pending,
    Settled(T),
}

struct Shared<T> {
    state: Mutex<GateState<T>>,
    notify: Notify,
}

impl<T> Shared<T> {
    fn state(&self) -> MutexGuard<'_, GateState<T>> {
        // The state is a single enum write; a panic elsewhere cannot leave it torn.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The awaiting side of a one-shot readiness signal.
///
/// Cloning a gate is cheap and every clone observes the same settlement.
pub struct LifecycleGate<T> {
    shared: Arc<Shared<T>>,
}

/// The settling side of a one-shot readiness signal.
pub struct GateResolver<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone> LifecycleGate<T> {
    /// Creates a pending gate and the resolver that settles it.
    pub fn new() -> (Self, GateResolver<T>) {
        let shared = Arc::new(Shared {
            state: Mutex::new(GateState::Pending),
            notify: Notify::new(),
        });
        (
            Self {
                shared: Arc::clone(&shared),
            },
            GateResolver { shared },
        )
    }

    /// Creates a gate that is already settled with `value`.
    pub fn settled(value: T) -> Self {
        let (gate, resolver) = Self::new();
        resolver.resolve(value);
        gate
    }

    /// Returns `true` once the resolver has fired.
    pub fn is_settled(&self) -> bool {
        matches!(*self.shared.state(), GateState::Settled(_))
    }

    /// Returns the settled value without waiting.
    pub fn try_get(&self) -> Option<T> {
        match &*self.shared.state() {
            GateState::Settled(value) => Some(value.clone()),
            GateState::Pending => None,
        }
    }

    /// Waits until the gate is settled and returns the settled value.
    ///
    /// Returns immediately if the gate was settled before the call.
    pub async fn wait(&self) -> T {
        loop {
            // Registered before the state check so a concurrent resolve is not missed.
            let notified = self.shared.notify.notified();
            if let Some(value) = self.try_get() {
                return value;
            }
            notified.await;
        }
    }
}

impl<T> GateResolver<T> {
    /// Settles the gate with `value` and wakes every awaiter.
    ///
    /// Returns `false` (and drops `value`) if the gate was already settled.
    pub fn resolve(&self, value: T) -> bool {
        {
            let mut state = self.shared.state();
            if let GateState::Settled(_) = *state {
                log::trace!("Ignoring repeated settlement of a lifecycle gate.");
                return false;
            }
            *state = GateState::Settled(value);
        }
        self.shared.notify.notify_waiters();
        true
    }

    /// Returns `true` once this resolver (or a clone of it) has fired.
    pub fn is_settled(&self) -> bool {
        matches!(*self.shared.state(), GateState::Settled(_))
    }
}

impl<T> Clone for LifecycleGate<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Clone for GateResolver<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for LifecycleGate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settled = matches!(*self.shared.state(), GateState::Settled(_));
        f.debug_struct("LifecycleGate")
            .field("settled", &settled)
            .finish()
    }
}

impl<T> fmt::Debug for GateResolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateResolver")
            .field("settled", &self.is_settled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_resolve_before_wait_is_buffered() {
        let (gate, resolver) = LifecycleGate::new();
        assert!(resolver.resolve(7u32));

        assert_eq!(gate.wait().await, 7);
        assert_eq!(gate.try_get(), Some(7));
    }

    #[tokio::test]
    async fn test_second_resolve_is_noop() {
        let (gate, resolver) = LifecycleGate::new();
        assert!(resolver.resolve("first"));
        assert!(!resolver.resolve("second"));
        assert!(!resolver.clone().resolve("third"));

        assert_eq!(gate.wait().await, "first");
    }

    #[tokio::test]
    async fn test_pending_gate_does_not_settle() {
        let (gate, _resolver) = LifecycleGate::<()>::new();
        let waited = tokio::time::timeout(Duration::from_millis(20), gate.wait()).await;
        assert!(waited.is_err(), "A pending gate must keep its awaiters suspended");
        assert!(!gate.is_settled());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_all_awaiters_observe_same_value() {
        let (gate, resolver) = LifecycleGate::new();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move { gate.wait().await }));
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(resolver.resolve(42u64));
        assert!(!resolver.resolve(0));

        for handle in handles {
            let value = tokio::time::timeout(Duration::from_secs(1), handle)
                .await
                .expect("Awaiter should wake after settlement")
                .expect("Awaiter task panicked");
            assert_eq!(value, 42);
        }
    }

    #[test]
    fn test_settled_constructor() {
        let gate = LifecycleGate::settled(());
        assert!(gate.is_settled());
        assert_eq!(format!("{gate:?}"), "LifecycleGate { settled: true }");
    }
}
