//! Watch handles: a completion plus the cleanup that must run before it settles.
use std::{
    cell::{Cell, RefCell},
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

use crate::{
    deferred::Deferred,
    error::{CancelledSnafu, Result},
};

/// Settles a watch exactly once, tearing down its resources first.
pub(crate) struct Settler<T> {
    done: Deferred<Result<T>>,
    settling: Cell<bool>,
    cleanups: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl<T: 'static> Settler<T> {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Settler {
            done: Deferred::new(),
            settling: Cell::new(false),
            cleanups: Default::default(),
        })
    }

    /// Register teardown to run when the watch settles. Runs immediately if it
    /// already has.
    pub(crate) fn on_cleanup(&self, f: impl FnOnce() + 'static) {
        if self.settling.get() {
            f();
        } else {
            self.cleanups.borrow_mut().push(Box::new(f));
        }
    }

    /// Run every cleanup, then settle. Returns `false` if the watch had already
    /// settled (or is settling), in which case nothing happens.
    pub(crate) fn settle(&self, result: Result<T>) -> bool {
        if self.settling.replace(true) {
            return false;
        }
        let cleanups = std::mem::take(&mut *self.cleanups.borrow_mut());
        for cleanup in cleanups {
            cleanup();
        }
        self.done.settle(result)
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.settling.get()
    }
}

/// A cancellation capability, handed to callers that want to stop a watch
/// from elsewhere.
#[derive(Clone)]
pub struct Cancel(Rc<dyn Fn()>);

impl Cancel {
    pub(crate) fn new(f: impl Fn() + 'static) -> Self {
        Cancel(Rc::new(f))
    }

    /// Tear the watch down. Does nothing once the watch has settled.
    pub fn cancel(&self) {
        (self.0)()
    }
}

impl std::fmt::Debug for Cancel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Cancel")
    }
}

/// An in-progress (or finished) observation of DOM state.
///
/// Awaiting a `Watch` yields its single outcome. Dropping it before it settles
/// cancels it, which removes its listeners and timers; use [`Watch::detach`]
/// to let it run unobserved instead.
pub struct Watch<T> {
    done: Deferred<Result<T>>,
    cancel: Option<Cancel>,
}

impl<T: Clone + 'static> Watch<T> {
    pub(crate) fn new(settler: &Rc<Settler<T>>) -> Self {
        let canceller = settler.clone();
        Watch {
            done: settler.done.clone(),
            cancel: Some(Cancel::new(move || {
                if canceller.settle(CancelledSnafu.fail()) {
                    log::debug!("watch cancelled");
                }
            })),
        }
    }

    /// A watch that has already settled, with nothing to clean up.
    pub fn settled(result: Result<T>) -> Self {
        Watch {
            done: Deferred::settled(result),
            cancel: None,
        }
    }

    /// Cancel the watch. Calling this more than once, or after the watch
    /// settled, does nothing.
    pub fn cancel(&self) {
        if let Some(cancel) = self.cancel.as_ref() {
            cancel.cancel();
        }
    }

    /// A handle that cancels this watch from elsewhere.
    pub fn canceller(&self) -> Cancel {
        self.cancel.clone().unwrap_or_else(|| Cancel::new(|| {}))
    }

    pub fn is_settled(&self) -> bool {
        self.done.is_settled()
    }

    /// The outcome, if the watch has settled.
    pub fn peek(&self) -> Option<Result<T>> {
        self.done.peek()
    }

    /// Let the watch run to completion without holding on to it.
    pub fn detach(mut self) {
        self.cancel = None;
    }

    /// The shared completion underlying this watch.
    pub fn completion(&self) -> Deferred<Result<T>> {
        self.done.clone()
    }
}

impl<T> Drop for Watch<T> {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            if !self.done.is_settled() {
                log::trace!("dropping unsettled watch");
                cancel.cancel();
            }
        }
    }
}

impl<T: Clone> Future for Watch<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().done).poll(cx)
    }
}

#[cfg(test)]
mod test {
    use futures_lite::future::{block_on, poll_once};

    use super::*;
    use crate::error::Error;

    #[test]
    fn cleanup_runs_once_before_settling() {
        let settler = Settler::<u32>::new();
        let watch = Watch::new(&settler);
        let log = Rc::new(RefCell::new(vec![]));

        let cleanup_log = log.clone();
        let done = settler.done.clone();
        settler.on_cleanup(move || {
            cleanup_log
                .borrow_mut()
                .push(format!("cleanup, settled: {}", done.is_settled()));
        });

        assert!(settler.settle(Ok(7)));
        assert!(!settler.settle(Ok(8)));
        watch.cancel();
        assert_eq!(*log.borrow(), vec!["cleanup, settled: false".to_string()]);
        assert_eq!(block_on(watch), Ok(7));
    }

    #[test]
    fn cancel_is_idempotent() {
        let settler = Settler::<()>::new();
        let mut watch = Watch::new(&settler);
        let cleanups = Rc::new(Cell::new(0));
        let counter = cleanups.clone();
        settler.on_cleanup(move || counter.set(counter.get() + 1));

        assert!(block_on(poll_once(&mut watch)).is_none());
        let cancel = watch.canceller();
        cancel.cancel();
        watch.cancel();
        cancel.cancel();
        assert_eq!(cleanups.get(), 1);
        assert_eq!(block_on(watch), Err(Error::Cancelled));
    }

    #[test]
    fn dropping_an_unsettled_watch_cancels_it() {
        let settler = Settler::<()>::new();
        let cleanups = Rc::new(Cell::new(0));
        let counter = cleanups.clone();
        settler.on_cleanup(move || counter.set(counter.get() + 1));
        drop(Watch::new(&settler));
        assert_eq!(cleanups.get(), 1);
        assert!(settler.is_settled());

        let settler = Settler::<()>::new();
        Watch::new(&settler).detach();
        assert!(!settler.is_settled());
    }

    #[test]
    fn late_cleanup_runs_immediately() {
        let settler = Settler::<()>::new();
        settler.settle(Ok(()));
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        settler.on_cleanup(move || flag.set(true));
        assert!(ran.get());
    }
}
