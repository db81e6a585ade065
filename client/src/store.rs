//! Observable single-threaded state cells.
//!
//! Subscribers run synchronously after each write, on the same call chain, and
//! must not write back into the cell they are observing.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(&T)>;

struct Subscribers<T> {
    next_id: u64,
    list: Vec<(u64, Callback<T>)>,
}

pub struct Observable<T> {
    value: RefCell<T>,
    subscribers: Rc<RefCell<Subscribers<T>>>,
}

#[must_use = "the subscription ends as soon as it is dropped"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl<T: 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            subscribers: Rc::new(RefCell::new(Subscribers {
                next_id: 0,
                list: Vec::new(),
            })),
        }
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = value;
        self.notify();
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.value.borrow_mut());
        self.notify();
        result
    }

    pub fn try_update<R>(&self, f: impl FnOnce(&mut T) -> Option<R>) -> Option<R> {
        let result = f(&mut self.value.borrow_mut());
        if result.is_some() {
            self.notify();
        }
        result
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.next_id += 1;
            let id = subscribers.next_id;
            subscribers.list.push((id, Rc::new(callback)));
            id
        };
        let weak: Weak<RefCell<Subscribers<T>>> = Rc::downgrade(&self.subscribers);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(subscribers) = weak.upgrade() {
                    subscribers.borrow_mut().list.retain(|(other, _)| *other != id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().list.len()
    }

    pub fn read_only(&self) -> ReadOnly<'_, T> {
        ReadOnly { inner: self }
    }

    fn notify(&self) {
        let callbacks = self
            .subscribers
            .borrow()
            .list
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect::<Vec<_>>();
        if callbacks.is_empty() {
            return;
        }
        let value = self.value.borrow();
        for callback in callbacks {
            callback(&value);
        }
    }
}

pub struct ReadOnly<'a, T> {
    inner: &'a Observable<T>,
}

impl<T: 'static> ReadOnly<'_, T> {
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.with(f)
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.inner.subscribe(callback)
    }
}
