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

use anyhow::bail;
use hostgate_data::{
    BuildFlags, ComponentMeta, HostObject, HostRef, HostRegistry, ListenerAttacher, ListenerMeta,
    RegistryError,
};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct Element;

/// Records every call it receives.
#[derive(Default)]
struct RecordingAttacher {
    calls: Mutex<Vec<(Vec<String>, bool, bool)>>,
    registry_view: Mutex<Option<Arc<HostRegistry>>>,
}

impl ListenerAttacher for RecordingAttacher {
    fn attach(
        &self,
        host: &HostObject,
        record: &Arc<HostRef>,
        listeners: &[ListenerMeta],
        is_initial_attach: bool,
    ) -> anyhow::Result<()> {
        let events = listeners.iter().map(|l| l.event_name.clone()).collect();
        // Whether the host is already visible through lookup while attaching.
        let visible = self
            .registry_view
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|registry| registry.lookup(host).is_some());
        assert!(record.is_host_alive());
        self.calls
            .lock()
            .unwrap()
            .push((events, is_initial_attach, visible));
        Ok(())
    }
}

fn meta_with_listeners() -> Arc<ComponentMeta> {
    Arc::new(
        ComponentMeta::new("cmp-list")
            .with_listener(ListenerMeta::new("click", "onClick"))
            .with_listener(ListenerMeta::new("keydown", "onKey")),
    )
}

#[test]
fn test_attacher_receives_declared_listeners() {
    let attacher = Arc::new(RecordingAttacher::default());
    let registry = Arc::new(HostRegistry::with_attacher(
        BuildFlags::development(),
        SharedAttacher(Arc::clone(&attacher)),
    ));
    *attacher.registry_view.lock().unwrap() = Some(Arc::clone(&registry));

    let elm = Arc::new(Element);
    registry.register_host(&elm, meta_with_listeners()).unwrap();

    let calls = attacher.calls.lock().unwrap();
    assert_eq!(calls.len(), 1, "Attachment happens once per registration");
    let (events, is_initial, visible) = &calls[0];
    assert_eq!(events, &vec!["click".to_string(), "keydown".to_string()]);
    assert!(*is_initial);
    assert!(!*visible, "The host must not be visible before attachment succeeds");

    // Break the registry <-> attacher cycle.
    attacher.registry_view.lock().unwrap().take();
}

#[test]
fn test_attachment_failure_leaves_host_unregistered() {
    let failing = |_: &HostObject, _: &Arc<HostRef>, _: &[ListenerMeta], _: bool| -> anyhow::Result<()> {
        bail!("event target detached")
    };
    let registry = HostRegistry::with_attacher(BuildFlags::development(), failing);
    let elm = Arc::new(Element);

    let err = registry
        .register_host(&elm, meta_with_listeners())
        .unwrap_err();
    match &err {
        RegistryError::AttachmentFailed { tag_name, source } => {
            assert_eq!(tag_name, "cmp-list");
            assert_eq!(source.to_string(), "event target detached");
        }
        other => panic!("Expected AttachmentFailed, got {other:?}"),
    }

    assert!(registry.lookup(&elm).is_none());
    assert!(registry.host_queues(&elm).is_none());
    assert!(registry.is_empty());
    assert_eq!(Arc::strong_count(&elm), 1);
}

#[test]
fn test_failed_registration_can_be_retried() {
    let fail_next = Arc::new(Mutex::new(true));
    let flag = Arc::clone(&fail_next);
    let flaky = move |_: &HostObject, _: &Arc<HostRef>, _: &[ListenerMeta], _: bool| -> anyhow::Result<()> {
        if std::mem::replace(&mut *flag.lock().unwrap(), false) {
            bail!("transient failure");
        }
        Ok(())
    };
    let registry = HostRegistry::with_attacher(BuildFlags::development(), flaky);
    let elm = Arc::new(Element);

    assert!(registry.register_host(&elm, meta_with_listeners()).is_err());
    let record = registry
        .register_host(&elm, meta_with_listeners())
        .expect("A failed registration must not count as a registration");
    assert!(Arc::ptr_eq(&registry.lookup(&elm).unwrap(), &record));
    assert_eq!(record.id().index, 0, "The aborted slot should be recycled");
}

/// Registers the same host a second time from inside its first attachment,
/// the way a concurrent upgrade would interleave.
#[derive(Clone, Default)]
struct ReentrantAttacher {
    registry: Arc<Mutex<Option<Arc<HostRegistry>>>>,
    inner_result: Arc<Mutex<Option<Result<Arc<HostRef>, RegistryError>>>>,
}

impl ListenerAttacher for ReentrantAttacher {
    fn attach(
        &self,
        host: &HostObject,
        _: &Arc<HostRef>,
        _: &[ListenerMeta],
        _: bool,
    ) -> anyhow::Result<()> {
        let registry = self.registry.lock().unwrap().take();
        if let Some(registry) = registry {
            let elm = Arc::clone(host).downcast::<Element>().unwrap();
            let result = registry.register_host(&elm, meta_with_listeners());
            *self.inner_result.lock().unwrap() = Some(result);
        }
        Ok(())
    }
}

#[test]
fn test_interleaved_double_registration_is_reported_in_dev_mode() {
    let attacher = ReentrantAttacher::default();
    let registry = Arc::new(HostRegistry::with_attacher(
        BuildFlags::development(),
        attacher.clone(),
    ));
    *attacher.registry.lock().unwrap() = Some(Arc::clone(&registry));
    let elm = Arc::new(Element);

    let outer = registry.register_host(&elm, meta_with_listeners());

    let inner = attacher
        .inner_result
        .lock()
        .unwrap()
        .take()
        .expect("The attacher should have registered the host")
        .expect("The first completed registration wins");
    match outer {
        Err(RegistryError::DoubleRegistration { existing, .. }) => {
            assert_eq!(existing, inner.id());
        }
        other => panic!("Expected DoubleRegistration, got {other:?}"),
    }
    assert!(Arc::ptr_eq(&registry.lookup(&elm).unwrap(), &inner));
    assert_eq!(registry.len(), 1, "The losing registration must free its slot");
}

/// Lets a test keep a handle to an attacher it hands to the registry.
struct SharedAttacher(Arc<RecordingAttacher>);

impl ListenerAttacher for SharedAttacher {
    fn attach(
        &self,
        host: &HostObject,
        record: &Arc<HostRef>,
        listeners: &[ListenerMeta],
        is_initial_attach: bool,
    ) -> anyhow::Result<()> {
        self.0.attach(host, record, listeners, is_initial_attach)
    }
}
