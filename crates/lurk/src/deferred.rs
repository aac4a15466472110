//! A settle-once completion that many awaiters can share.
use std::{
    cell::RefCell,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll, Waker},
};

struct State<T> {
    value: Option<T>,
    wakers: Vec<Waker>,
}

/// A value that will be available at some point in the future.
///
/// Clones share the same slot: the first call to [`Deferred::settle`] wins, and
/// every clone awaiting the `Deferred` receives a clone of that value. Later
/// awaits resolve immediately.
pub struct Deferred<T> {
    state: Rc<RefCell<State<T>>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl<T> Deferred<T> {
    pub fn new() -> Self {
        Deferred {
            state: Rc::new(RefCell::new(State {
                value: None,
                wakers: vec![],
            })),
        }
    }

    /// Create a `Deferred` that has already settled.
    pub fn settled(value: T) -> Self {
        let deferred = Self::new();
        deferred.settle(value);
        deferred
    }

    /// Settle with the given value.
    ///
    /// Returns `false` if this `Deferred` had already settled, in which case the
    /// given value is dropped.
    pub fn settle(&self, value: T) -> bool {
        let wakers = {
            let mut state = self.state.borrow_mut();
            if state.value.is_some() {
                return false;
            }
            state.value = Some(value);
            std::mem::take(&mut state.wakers)
        };
        // Wake outside the borrow, wakers may poll us synchronously.
        for waker in wakers {
            waker.wake();
        }
        true
    }

    pub fn is_settled(&self) -> bool {
        self.state.borrow().value.is_some()
    }

    /// Returns whether `other` shares this `Deferred`'s slot.
    pub fn ptr_eq(&self, other: &Deferred<T>) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl<T: Clone> Deferred<T> {
    /// The settled value, if any.
    pub fn peek(&self) -> Option<T> {
        self.state.borrow().value.clone()
    }
}

impl<T: Clone> Future for Deferred<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.state.borrow_mut();
        if let Some(value) = state.value.as_ref() {
            Poll::Ready(value.clone())
        } else {
            if !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                state.wakers.push(cx.waker().clone());
            }
            Poll::Pending
        }
    }
}
