//! Page load timing.
use std::future::Future;

use crate::{context::Lifecycle, platform::Platform};

impl<P: Platform> Lifecycle<P> {
    /// Whether the platform's navigation timing can be trusted.
    ///
    /// The high resolution clock must be relative to navigation (far from the
    /// wall clock) and must have moved past the connection phase. Decided
    /// once per context.
    pub fn enable_performance(&self) -> bool {
        self.memo().memoize_global("enable_performance", || {
            let platform = self.platform();
            let Some(timing) = platform.navigation_timing() else {
                return false;
            };
            let now = platform.now();
            let enabled = timing.connect_end > 0.0
                && timing.navigation_start > 0.0
                && (now - platform.epoch_millis()).abs() > 1000.0
                && now - (timing.connect_end - timing.navigation_start) > 0.0;
            log::debug!("performance timing enabled: {enabled}");
            enabled
        })
    }

    /// Milliseconds from the end of the connection to the document becoming
    /// interactive, once the document is ready.
    ///
    /// `None` when navigation timing is unavailable or untrustworthy, or a
    /// milestone was never recorded.
    pub fn page_render_time(&self) -> impl Future<Output = Option<f64>> + 'static + use<P> {
        let ready = self.document_ready();
        let lifecycle = self.clone();
        async move {
            ready.await;
            if !lifecycle.enable_performance() {
                return None;
            }
            let timing = lifecycle.platform().navigation_timing()?;
            (timing.connect_end > 0.0 && timing.dom_interactive > 0.0)
                .then(|| timing.dom_interactive - timing.connect_end)
        }
    }
}

#[cfg(test)]
mod test {
    use futures_lite::future::{block_on, poll_once};

    use super::*;
    use crate::{platform::NavigationTiming, sim::Sim};

    const START: f64 = 1_700_000_000_000.0;

    fn timing(connect_end: f64, dom_interactive: f64) -> NavigationTiming {
        NavigationTiming {
            navigation_start: START,
            connect_end: START + connect_end,
            dom_interactive: if dom_interactive > 0.0 {
                START + dom_interactive
            } else {
                0.0
            },
        }
    }

    #[test]
    fn render_time_waits_for_the_document() {
        let sim = Sim::new();
        sim.set_navigation_timing(Some(timing(40.0, 340.0)));
        let lifecycle = Lifecycle::new(sim.clone());
        let mut render = Box::pin(lifecycle.page_render_time());
        sim.advance(500);
        assert!(block_on(poll_once(&mut render)).is_none());
        sim.finish_loading();
        assert_eq!(block_on(render), Some(300.0));
    }

    #[test]
    fn missing_or_untrusted_timing_is_none() {
        let sim = Sim::ready();
        let lifecycle = Lifecycle::new(sim.clone());
        assert!(!lifecycle.enable_performance());
        assert_eq!(block_on(lifecycle.page_render_time()), None);

        // A clock that reads like the wall clock is not navigation relative.
        let sim = Sim::ready();
        sim.set_epoch_millis(0.0);
        sim.set_navigation_timing(Some(timing(40.0, 340.0)));
        assert_eq!(block_on(Lifecycle::new(sim).page_render_time()), None);
    }

    #[test]
    fn unrecorded_milestone_is_none() {
        let sim = Sim::ready();
        sim.advance(100);
        sim.set_navigation_timing(Some(timing(40.0, 0.0)));
        let lifecycle = Lifecycle::new(sim);
        assert!(lifecycle.enable_performance());
        assert_eq!(block_on(lifecycle.page_render_time()), None);
    }

    #[test]
    fn decision_is_memoized() {
        let sim = Sim::ready();
        sim.advance(100);
        sim.set_navigation_timing(Some(timing(40.0, 340.0)));
        let lifecycle = Lifecycle::new(sim.clone());
        assert!(lifecycle.enable_performance());
        sim.set_navigation_timing(None);
        assert!(lifecycle.enable_performance());
    }
}
