use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::map_view::PointerKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifetime {
    Persistent,
    /// Retired after the first delivered event.
    Once,
}

struct Registration {
    id: u64,
    kind: PointerKind,
    lifetime: Lifetime,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    live: Vec<Registration>,
}

#[derive(Clone, Default)]
pub struct PointerListeners {
    registry: Rc<RefCell<Registry>>,
}

#[must_use = "the listener is removed as soon as the handle is dropped"]
pub struct ListenerHandle {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl PointerListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen(&self, kind: PointerKind, lifetime: Lifetime) -> ListenerHandle {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.live.push(Registration { id, kind, lifetime });
        ListenerHandle {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    pub fn is_listening(&self, kind: PointerKind) -> bool {
        self.registry
            .borrow()
            .live
            .iter()
            .any(|registration| registration.kind == kind)
    }

    pub fn dispatch(&self, kind: PointerKind) -> bool {
        let mut registry = self.registry.borrow_mut();
        let delivered = registry
            .live
            .iter()
            .any(|registration| registration.kind == kind);
        registry.live.retain(|registration| {
            !(registration.kind == kind && registration.lifetime == Lifetime::Once)
        });
        delivered
    }

    pub fn len(&self) -> usize {
        self.registry.borrow().live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .borrow_mut()
                .live
                .retain(|registration| registration.id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_handle_unregisters() {
        let listeners = PointerListeners::new();
        let handle = listeners.listen(PointerKind::Move, Lifetime::Persistent);
        assert!(listeners.is_listening(PointerKind::Move));
        drop(handle);
        assert!(!listeners.is_listening(PointerKind::Move));
        assert!(listeners.is_empty());
    }

    #[test]
    fn once_listener_fires_a_single_time() {
        let listeners = PointerListeners::new();
        let _up = listeners.listen(PointerKind::Up, Lifetime::Once);
        assert!(listeners.dispatch(PointerKind::Up));
        assert!(!listeners.dispatch(PointerKind::Up));
    }

    #[test]
    fn persistent_listener_survives_dispatch() {
        let listeners = PointerListeners::new();
        let _moves = listeners.listen(PointerKind::Move, Lifetime::Persistent);
        assert!(listeners.dispatch(PointerKind::Move));
        assert!(listeners.dispatch(PointerKind::Move));
        assert!(!listeners.dispatch(PointerKind::Leave));
    }

    #[test]
    fn handle_outliving_registry_is_harmless() {
        let handle = {
            let listeners = PointerListeners::new();
            listeners.listen(PointerKind::Leave, Lifetime::Once)
        };
        drop(handle);
    }

    #[test]
    fn repeated_sessions_do_not_accumulate() {
        let listeners = PointerListeners::new();
        for _ in 0..10 {
            let handles = vec![
                listeners.listen(PointerKind::Move, Lifetime::Persistent),
                listeners.listen(PointerKind::Up, Lifetime::Once),
                listeners.listen(PointerKind::Leave, Lifetime::Once),
            ];
            assert_eq!(listeners.len(), 3);
            drop(handles);
        }
        assert!(listeners.is_empty());
    }
}
