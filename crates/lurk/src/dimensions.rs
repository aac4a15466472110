//! Element size watching.
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use serde::{Deserialize, Serialize};

use crate::{
    context::Lifecycle,
    event::Listener,
    platform::{Dimensions, Platform, Target},
    poll::{Debounce, Interval},
    watch::{Settler, Watch},
};

/// Which axes to watch, how often, and how large a change must be.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionOptions {
    pub width: bool,
    pub height: bool,
    /// Poll interval. Changes are reported once they have been stable for
    /// four times this long.
    #[serde(alias = "delay")]
    pub delay_ms: u32,
    /// A change on an axis counts only if it is strictly larger than this.
    pub threshold: f64,
}

impl Default for DimensionOptions {
    fn default() -> Self {
        DimensionOptions {
            width: true,
            height: true,
            delay_ms: 50,
            threshold: 0.0,
        }
    }
}

impl DimensionOptions {
    pub fn width_only() -> Self {
        DimensionOptions {
            height: false,
            ..Default::default()
        }
    }

    pub fn height_only() -> Self {
        DimensionOptions {
            width: false,
            ..Default::default()
        }
    }

    /// Whether `next` differs significantly from `prev` on an enabled axis.
    pub fn is_significant(&self, prev: Dimensions, next: Dimensions) -> bool {
        (self.width && (next.width - prev.width).abs() > self.threshold)
            || (self.height && (next.height - prev.height).abs() > self.threshold)
    }
}

/// A partial [`DimensionOptions`], eg as passed from JavaScript. Fields left
/// out keep the value of the options it is applied to.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DimensionOverrides {
    pub width: Option<bool>,
    pub height: Option<bool>,
    #[serde(alias = "delay")]
    pub delay_ms: Option<u32>,
    pub threshold: Option<f64>,
}

impl DimensionOverrides {
    pub fn apply(self, base: DimensionOptions) -> DimensionOptions {
        DimensionOptions {
            width: self.width.unwrap_or(base.width),
            height: self.height.unwrap_or(base.height),
            delay_ms: self.delay_ms.unwrap_or(base.delay_ms),
            threshold: self.threshold.unwrap_or(base.threshold),
        }
    }
}

/// Compares an element's offset dimensions against a baseline.
pub struct DimensionTracker<P: Platform> {
    platform: P,
    element: P::Element,
    options: DimensionOptions,
    baseline: Cell<Dimensions>,
}

impl<P: Platform> DimensionTracker<P> {
    /// The current dimensions, if they changed significantly since the
    /// baseline.
    pub fn check(&self) -> Option<Dimensions> {
        let current = self.platform.offset_dimensions(&self.element);
        self.options
            .is_significant(self.baseline.get(), current)
            .then_some(current)
    }

    /// Make the current dimensions the new baseline, and return them.
    pub fn reset(&self) -> Dimensions {
        let current = self.platform.offset_dimensions(&self.element);
        self.baseline.set(current);
        current
    }

    pub fn baseline(&self) -> Dimensions {
        self.baseline.get()
    }
}

impl<P: Platform> Lifecycle<P> {
    /// Default dimension options, with the poll interval taken from the config.
    pub fn dimension_options(&self) -> DimensionOptions {
        DimensionOptions {
            delay_ms: self.config().dimension_delay_ms,
            ..Default::default()
        }
    }

    /// Start tracking `element` with its current dimensions as the baseline.
    pub fn track_dimensions(
        &self,
        element: &P::Element,
        options: DimensionOptions,
    ) -> DimensionTracker<P> {
        let platform = self.platform().clone();
        let baseline = platform.offset_dimensions(element);
        DimensionTracker {
            platform,
            element: element.clone(),
            options,
            baseline: Cell::new(baseline),
        }
    }

    /// Resolves with the element's new dimensions once they have changed and
    /// then held still for a debounce window.
    ///
    /// Changes are picked up by polling every `options.delay_ms` and by the
    /// window's `resize` event. A size that ends up back where it started
    /// is not a change, and the watch keeps going.
    pub fn on_dimensions_change(
        &self,
        element: &P::Element,
        options: DimensionOptions,
    ) -> Watch<Dimensions> {
        let platform = self.platform();
        let settler = Settler::new();
        let watch = Watch::new(&settler);
        let tracker = Rc::new(self.track_dimensions(element, options.clone()));
        let original = tracker.baseline();
        let window_ms = options
            .delay_ms
            .saturating_mul(self.config().dimension_debounce_factor);

        let resolve = Debounce::new(platform, window_ms, {
            let settler = settler.clone();
            let options = options.clone();
            move |dimensions: Dimensions| {
                if options.is_significant(original, dimensions) {
                    settler.settle(Ok(dimensions));
                } else {
                    log::debug!("dimensions returned to {dimensions:?}, still watching");
                }
            }
        });

        let on_change: Rc<dyn Fn() -> bool> = Rc::new({
            let tracker = tracker.clone();
            let resolve = resolve.clone();
            move || match tracker.check() {
                Some(dimensions) => {
                    log::trace!("dimensions changed to {dimensions:?}");
                    tracker.reset();
                    resolve.call(dimensions);
                    true
                }
                None => false,
            }
        });

        let poll = Interval::start(platform, options.delay_ms, {
            let on_change = on_change.clone();
            move || {
                on_change();
                false
            }
        });

        let resize: Rc<RefCell<Option<Listener<P>>>> = Default::default();
        let listener = Listener::new(platform, Target::Window, "resize", {
            let resize = resize.clone();
            move |_| {
                if on_change() {
                    let listener = resize.borrow_mut().take();
                    if let Some(listener) = listener {
                        listener.cancel();
                    }
                }
            }
        });
        *resize.borrow_mut() = Some(listener);

        settler.on_cleanup(move || {
            poll.cancel();
            let listener = resize.borrow_mut().take();
            if let Some(listener) = listener {
                listener.cancel();
            }
            resolve.cancel();
        });
        watch
    }

    /// Whether the element's offset dimensions equal the viewport's on the
    /// requested axes.
    pub fn dimensions_match_viewport(&self, element: &P::Element, width: bool, height: bool) -> bool {
        let platform = self.platform();
        let dimensions = platform.offset_dimensions(element);
        let viewport = platform.viewport();
        (!width || dimensions.width == viewport.width)
            && (!height || dimensions.height == viewport.height)
    }

    /// Whether the element takes part in layout: it has an offset size, or
    /// renders as at least one box even if that box is empty.
    pub fn is_element_visible(&self, element: &P::Element) -> bool {
        let platform = self.platform();
        let offset = platform.offset_dimensions(element);
        offset.width != 0.0 || offset.height != 0.0 || platform.client_rects_len(element) > 0
    }
}

#[cfg(test)]
mod test {
    use futures_lite::future::block_on;

    use super::*;
    use crate::sim::Sim;

    fn setup() -> (Sim, Lifecycle<Sim>, crate::sim::SimElement) {
        let sim = Sim::ready();
        let lifecycle = Lifecycle::new(sim.clone());
        let el = sim.create_element("div");
        el.set_offset_dimensions(100.0, 50.0);
        sim.body_element().append_child(&el);
        (sim, lifecycle, el)
    }

    #[test]
    fn resolves_once_after_the_debounce_window() {
        let (sim, lifecycle, el) = setup();
        let watch = lifecycle.on_dimensions_change(&el, DimensionOptions::default());
        sim.advance(120);
        assert!(!watch.is_settled());

        el.set_offset_dimensions(140.0, 50.0);
        // Seen at t=150, reported at t=350.
        sim.advance(60);
        assert!(!watch.is_settled());
        sim.advance(160);
        assert!(!watch.is_settled());
        sim.advance(30);
        assert_eq!(watch.peek(), Some(Ok(Dimensions::new(140.0, 50.0))));
        assert_eq!(sim.active_timers(), 0);
        assert_eq!(sim.listener_count(), 0);

        el.set_offset_dimensions(10.0, 10.0);
        sim.advance(1000);
        assert_eq!(block_on(watch), Ok(Dimensions::new(140.0, 50.0)));
    }

    #[test]
    fn changes_within_threshold_or_on_ignored_axes_do_not_count() {
        let (sim, lifecycle, el) = setup();
        let options = DimensionOptions {
            threshold: 5.0,
            ..DimensionOptions::width_only()
        };
        let watch = lifecycle.on_dimensions_change(&el, options);
        el.set_offset_dimensions(104.0, 500.0);
        sim.advance(1000);
        assert!(!watch.is_settled());

        el.set_offset_dimensions(106.0, 500.0);
        sim.advance(1000);
        assert_eq!(watch.peek(), Some(Ok(Dimensions::new(106.0, 500.0))));
    }

    #[test]
    fn resize_event_is_seen_before_the_next_poll() {
        let (sim, lifecycle, el) = setup();
        let watch = lifecycle.on_dimensions_change(&el, DimensionOptions::default());
        sim.advance(10);
        el.set_offset_dimensions(200.0, 50.0);
        sim.resize_window(800.0, 600.0);
        // The resize listener removes itself once it sees a change.
        assert_eq!(sim.listener_count(), 0);
        sim.advance(200);
        assert_eq!(watch.peek(), Some(Ok(Dimensions::new(200.0, 50.0))));
    }

    #[test]
    fn returning_to_the_original_size_is_not_a_change() {
        let (sim, lifecycle, el) = setup();
        let watch = lifecycle.on_dimensions_change(&el, DimensionOptions::default());
        el.set_offset_dimensions(120.0, 50.0);
        sim.advance(50);
        el.set_offset_dimensions(100.0, 50.0);
        sim.advance(400);
        assert!(!watch.is_settled());
        el.set_offset_dimensions(90.0, 50.0);
        sim.advance(400);
        assert_eq!(watch.peek(), Some(Ok(Dimensions::new(90.0, 50.0))));
    }

    #[test]
    fn cancel_tears_everything_down_once() {
        let (sim, lifecycle, el) = setup();
        let watch = lifecycle.on_dimensions_change(&el, DimensionOptions::default());
        el.set_offset_dimensions(120.0, 50.0);
        sim.advance(50);
        // Poll plus pending debounce.
        assert_eq!(sim.active_timers(), 2);
        watch.cancel();
        watch.cancel();
        assert_eq!(sim.active_timers(), 0);
        assert_eq!(sim.listener_count(), 0);
        assert_eq!(sim.unlisten_calls(), 1);
        assert_eq!(block_on(watch), Err(crate::Error::Cancelled));
    }

    #[test]
    fn viewport_and_visibility() {
        let (sim, lifecycle, el) = setup();
        assert!(!lifecycle.dimensions_match_viewport(&el, true, true));
        el.set_offset_dimensions(1024.0, 50.0);
        assert!(lifecycle.dimensions_match_viewport(&el, true, false));
        assert!(!lifecycle.dimensions_match_viewport(&el, true, true));

        assert!(lifecycle.is_element_visible(&el));
        let empty = sim.create_element("div");
        assert!(!lifecycle.is_element_visible(&empty));
        // Zero-sized, but laid out.
        sim.body_element().append_child(&empty);
        assert!(lifecycle.is_element_visible(&empty));
        crate::style::hide_element(&sim, &empty);
        assert!(!lifecycle.is_element_visible(&empty));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: DimensionOptions = serde_json::from_str(r#"{"height": false}"#).unwrap();
        assert_eq!(options, DimensionOptions::width_only());

        let options: DimensionOptions =
            serde_json::from_str(r#"{"delay": 200, "threshold": 3}"#).unwrap();
        assert_eq!(options.delay_ms, 200);
        assert_eq!(options.threshold, 3.0);
    }

    #[test]
    fn overrides_keep_the_configured_delay() {
        let sim = Sim::ready();
        let config = crate::Config {
            dimension_delay_ms: 80,
            ..Default::default()
        };
        let lifecycle = Lifecycle::with_config(sim, config);

        let overrides: DimensionOverrides = serde_json::from_str(r#"{"threshold": 3}"#).unwrap();
        let options = overrides.apply(lifecycle.dimension_options());
        assert_eq!(options.delay_ms, 80);
        assert_eq!(options.threshold, 3.0);
        assert!(options.width && options.height);

        let overrides: DimensionOverrides =
            serde_json::from_str(r#"{"delay": 200, "width": false}"#).unwrap();
        let options = overrides.apply(lifecycle.dimension_options());
        assert_eq!(options, DimensionOptions {
            width: false,
            delay_ms: 200,
            ..Default::default()
        });
        assert_eq!(
            DimensionOverrides::default().apply(lifecycle.dimension_options()),
            lifecycle.dimension_options()
        );
    }
}
