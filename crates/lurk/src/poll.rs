//! Timer substrate: polling intervals, one-shot timeouts and debouncing.
//!
//! Every handle here is cheap to clone and cancelling it any number of times,
//! from anywhere (including from inside its own callback), clears the
//! underlying timer at most once.
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::platform::{Platform, TimerId};

/// A fixed-interval condition check.
pub struct Interval<P: Platform> {
    platform: P,
    id: Rc<Cell<Option<TimerId>>>,
}

impl<P: Platform> Clone for Interval<P> {
    fn clone(&self) -> Self {
        Self {
            platform: self.platform.clone(),
            id: self.id.clone(),
        }
    }
}

impl<P: Platform> Interval<P> {
    /// Invoke `check` every `millis` milliseconds until it returns `true` or the
    /// interval is cancelled.
    pub fn start(platform: &P, millis: u32, mut check: impl FnMut() -> bool + 'static) -> Self {
        let id: Rc<Cell<Option<TimerId>>> = Default::default();
        let tick_id = id.clone();
        let tick_platform = platform.clone();
        let timer = platform.set_interval(
            millis,
            Box::new(move || {
                // A clone may have cancelled us while this tick was queued.
                if tick_id.get().is_none() {
                    return;
                }
                if check() {
                    if let Some(timer) = tick_id.take() {
                        log::trace!("interval {timer:?} satisfied");
                        tick_platform.clear_timer(timer);
                    }
                }
            }),
        );
        id.set(Some(timer));
        Interval {
            platform: platform.clone(),
            id,
        }
    }

    /// Stop polling. Returns `true` if this call is the one that stopped it.
    pub fn cancel(&self) -> bool {
        if let Some(timer) = self.id.take() {
            self.platform.clear_timer(timer);
            true
        } else {
            false
        }
    }

    pub fn is_running(&self) -> bool {
        self.id.get().is_some()
    }
}

/// A one-shot timer.
pub struct Timeout<P: Platform> {
    platform: P,
    id: Rc<Cell<Option<TimerId>>>,
}

impl<P: Platform> Clone for Timeout<P> {
    fn clone(&self) -> Self {
        Self {
            platform: self.platform.clone(),
            id: self.id.clone(),
        }
    }
}

impl<P: Platform> Timeout<P> {
    pub fn start(platform: &P, millis: u32, f: impl FnOnce() + 'static) -> Self {
        let id: Rc<Cell<Option<TimerId>>> = Default::default();
        let fire_id = id.clone();
        let timer = platform.set_timeout(
            millis,
            Box::new(move || {
                // Taking the id marks us finished, so a later cancel is a no-op.
                if fire_id.take().is_some() {
                    f();
                }
            }),
        );
        id.set(Some(timer));
        Timeout {
            platform: platform.clone(),
            id,
        }
    }

    /// Returns `true` if this call is the one that prevented the timeout.
    pub fn cancel(&self) -> bool {
        if let Some(timer) = self.id.take() {
            self.platform.clear_timer(timer);
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.id.get().is_some()
    }
}

/// A delayed, re-triggerable callback.
///
/// Each [`Debounce::call`] restarts the window. The callback runs with the
/// most recent value once a full window passes without another call.
pub struct Debounce<P: Platform, T> {
    platform: P,
    millis: u32,
    pending: Rc<RefCell<Option<Timeout<P>>>>,
    f: Rc<dyn Fn(T)>,
}

impl<P: Platform, T> Clone for Debounce<P, T> {
    fn clone(&self) -> Self {
        Self {
            platform: self.platform.clone(),
            millis: self.millis,
            pending: self.pending.clone(),
            f: self.f.clone(),
        }
    }
}

impl<P: Platform, T: 'static> Debounce<P, T> {
    pub fn new(platform: &P, millis: u32, f: impl Fn(T) + 'static) -> Self {
        Debounce {
            platform: platform.clone(),
            millis,
            pending: Default::default(),
            f: Rc::new(f),
        }
    }

    pub fn call(&self, value: T) {
        self.cancel();
        let f = self.f.clone();
        let pending = self.pending.clone();
        let timeout = Timeout::start(&self.platform, self.millis, move || {
            pending.borrow_mut().take();
            f(value);
        });
        *self.pending.borrow_mut() = Some(timeout);
    }

    /// Drop any pending call.
    pub fn cancel(&self) {
        // Release the borrow before clearing, clearing may re-enter.
        let pending = self.pending.borrow_mut().take();
        if let Some(timeout) = pending {
            timeout.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .borrow()
            .as_ref()
            .map(Timeout::is_pending)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use crate::sim::Sim;

    #[test]
    fn interval_stops_when_satisfied() {
        let sim = Sim::new();
        let ticks = Rc::new(Cell::new(0));
        let counter = ticks.clone();
        let interval = Interval::start(&sim, 10, move || {
            counter.set(counter.get() + 1);
            counter.get() == 3
        });
        sim.advance(100);
        assert_eq!(ticks.get(), 3);
        assert!(!interval.is_running());
        assert_eq!(sim.active_timers(), 0);
        assert_eq!(sim.clear_calls(), 1);
        // Cancelling a stopped interval does nothing.
        assert!(!interval.cancel());
        assert_eq!(sim.clear_calls(), 1);
    }

    #[test]
    fn interval_cancelled_from_inside_its_check_clears_once() {
        let sim = Sim::new();
        let slot: Rc<RefCell<Option<Interval<Sim>>>> = Default::default();
        let inner = slot.clone();
        let interval = Interval::start(&sim, 10, move || {
            if let Some(interval) = inner.borrow().as_ref() {
                interval.cancel();
            }
            true
        });
        *slot.borrow_mut() = Some(interval.clone());
        sim.advance(10);
        assert!(!interval.is_running());
        assert_eq!(sim.clear_calls(), 1);
        interval.cancel();
        interval.cancel();
        assert_eq!(sim.clear_calls(), 1);
    }

    #[test]
    fn cancelled_interval_never_checks_again() {
        let sim = Sim::new();
        let ticks = Rc::new(Cell::new(0));
        let counter = ticks.clone();
        let interval = Interval::start(&sim, 10, move || {
            counter.set(counter.get() + 1);
            false
        });
        sim.advance(25);
        assert_eq!(ticks.get(), 2);
        assert!(interval.cancel());
        sim.advance(100);
        assert_eq!(ticks.get(), 2);
    }

    #[test]
    fn timeout_fires_once_and_cancel_after_fire_is_noop() {
        let sim = Sim::new();
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let timeout = Timeout::start(&sim, 200, move || counter.set(counter.get() + 1));
        sim.advance(199);
        assert_eq!(fired.get(), 0);
        sim.advance(1);
        assert_eq!(fired.get(), 1);
        assert!(!timeout.cancel());
        assert_eq!(sim.clear_calls(), 0);
    }

    #[test]
    fn debounce_coalesces_calls() {
        let sim = Sim::new();
        let seen = Rc::new(RefCell::new(vec![]));
        let log = seen.clone();
        let debounce = Debounce::new(&sim, 100, move |n: u32| log.borrow_mut().push(n));
        debounce.call(1);
        sim.advance(50);
        debounce.call(2);
        sim.advance(50);
        debounce.call(3);
        assert!(debounce.is_pending());
        sim.advance(99);
        assert!(seen.borrow().is_empty());
        sim.advance(1);
        assert_eq!(*seen.borrow(), vec![3]);
        assert!(!debounce.is_pending());
    }
}
