//! Waiting for elements to stop moving, or to go away.
use std::cell::Cell;

use crate::{
    context::Lifecycle,
    error::{NotFoundSnafu, TimeoutSnafu},
    platform::{ElementRef, Platform, find_element},
    poll::{Interval, Timeout},
    watch::{Settler, Watch},
};

impl<P: Platform> Lifecycle<P> {
    /// Resolves once the element's bounding rect is the same on two
    /// consecutive polls, and fails with [`Error::Timeout`](crate::Error::Timeout)
    /// if that has not happened within `timeout_ms`.
    pub fn element_stopped_moving(
        &self,
        element: impl Into<ElementRef<P::Element>>,
        timeout_ms: u32,
    ) -> Watch<()> {
        let element = element.into();
        let platform = self.platform();
        let Some(element) = find_element(platform, &element) else {
            return Watch::settled(
                NotFoundSnafu {
                    name: element.to_string(),
                }
                .fail(),
            );
        };

        let settler = Settler::new();
        let watch = Watch::new(&settler);
        let previous = Cell::new(platform.bounding_rect(&element));
        let poll = Interval::start(platform, self.config().motion_poll_ms, {
            let platform = platform.clone();
            let settler = settler.clone();
            move || {
                let rect = platform.bounding_rect(&element);
                if rect == previous.replace(rect) {
                    settler.settle(Ok(()));
                    true
                } else {
                    false
                }
            }
        });
        let deadline = Timeout::start(platform, timeout_ms, {
            let settler = settler.clone();
            move || {
                settler.settle(
                    TimeoutSnafu {
                        what: "element to stop animating",
                        millis: timeout_ms,
                    }
                    .fail(),
                );
            }
        });
        settler.on_cleanup(move || {
            poll.cancel();
            deadline.cancel();
        });
        watch
    }

    /// [`Lifecycle::element_stopped_moving`] with the configured timeout.
    pub fn element_settled(&self, element: impl Into<ElementRef<P::Element>>) -> Watch<()> {
        self.element_stopped_moving(element, self.config().motion_timeout_ms)
    }

    /// Resolves once the element has been removed from its parent.
    pub fn watch_element_for_close(&self, element: &P::Element) -> Watch<()> {
        let platform = self.platform();
        if !platform.is_attached(element) {
            return Watch::settled(Ok(()));
        }
        let settler = Settler::new();
        let watch = Watch::new(&settler);
        let poll = Interval::start(platform, self.config().close_poll_ms, {
            let platform = platform.clone();
            let element = element.clone();
            let settler = settler.clone();
            move || {
                if platform.is_attached(&element) {
                    return false;
                }
                log::debug!("{element:?} was closed");
                settler.settle(Ok(()));
                true
            }
        });
        settler.on_cleanup(move || {
            poll.cancel();
        });
        watch
    }
}

#[cfg(test)]
mod test {
    use futures_lite::future::block_on;

    use super::*;
    use crate::{error::Error, platform::Rect, sim::Sim};

    #[test]
    fn still_element_resolves_on_first_poll() {
        let sim = Sim::ready();
        let lifecycle = Lifecycle::new(sim.clone());
        let el = sim.create_element("div");
        el.set_rect(Rect::at(0.0, 0.0, 10.0, 10.0));
        let watch = lifecycle.element_stopped_moving(&el, 200);
        sim.advance(49);
        assert!(!watch.is_settled());
        sim.advance(1);
        assert_eq!(block_on(watch), Ok(()));
        assert_eq!(sim.active_timers(), 0);
    }

    #[test]
    fn compares_against_the_previous_tick() {
        let sim = Sim::ready();
        let lifecycle = Lifecycle::new(sim.clone());
        let el = sim.create_element("div");
        let watch = lifecycle.element_stopped_moving(&el, 1000);
        el.set_rect(Rect::at(5.0, 0.0, 10.0, 10.0));
        sim.advance(50);
        assert!(!watch.is_settled());
        // Unchanged since the last tick, even though it moved since the start.
        sim.advance(50);
        assert_eq!(watch.peek(), Some(Ok(())));
    }

    #[test]
    fn constant_motion_times_out() {
        let sim = Sim::ready();
        let lifecycle = Lifecycle::new(sim.clone());
        let el = sim.create_element("div");
        let watch = lifecycle.element_stopped_moving(&el, 200);
        for step in 1..=4 {
            el.set_rect(Rect::at(step as f64 * 10.0, 0.0, 10.0, 10.0));
            sim.advance(50);
        }
        let err = block_on(watch).unwrap_err();
        assert_eq!(
            err,
            Error::Timeout {
                what: "element to stop animating".into(),
                millis: 200
            }
        );
        assert_eq!(
            err.to_string(),
            "Timed out waiting for element to stop animating after 200ms"
        );
        assert_eq!(sim.active_timers(), 0);
    }

    #[test]
    fn missing_element_is_not_found() {
        let sim = Sim::ready();
        let lifecycle = Lifecycle::new(sim.clone());
        let watch = lifecycle.element_settled("gone".to_string());
        assert!(matches!(watch.peek(), Some(Err(Error::NotFound { .. }))));
    }

    #[test]
    fn close_watch_sees_detachment() {
        let sim = Sim::ready();
        let lifecycle = Lifecycle::new(sim.clone());
        let el = sim.create_element("div");
        assert!(lifecycle.watch_element_for_close(&el).is_settled());

        sim.body_element().append_child(&el);
        let watch = lifecycle.watch_element_for_close(&el);
        sim.advance(100);
        assert!(!watch.is_settled());
        el.remove();
        sim.advance(50);
        assert_eq!(watch.peek(), Some(Ok(())));
        assert_eq!(sim.active_timers(), 0);
    }
}
