//! CSS animation orchestration.
//!
//! [`Lifecycle::animate`] applies a keyframes animation to an element and
//! resolves when it is over. Browsers are unreliable about animation events,
//! so every step has a fallback:
//!
//! * no `@keyframes` rule with that name (or unreadable stylesheets): resolve
//!   right away, there is nothing to wait for
//! * no start event within the start timeout: the animation never ran,
//!   resolve
//! * no end event within the caller's timeout after starting: resolve
//!
//! It fails when the element cannot be found, and when an end event reports
//! a different animation than the one requested.
use std::{
    cell::{Cell, RefCell},
    future::Future,
    rc::Rc,
};

use crate::{
    context::Lifecycle,
    error::{AnimationMismatchSnafu, NotFoundSnafu, Result},
    event::EventGroup,
    platform::{ElementRef, Platform, PlatformEvent, Target, find_element},
    poll::Timeout,
    style::{hide_element, set_vendor_css, show_element},
    watch::{Cancel, Settler, Watch},
};

pub const ANIMATION_START_EVENTS: [&str; 4] = [
    "animationstart",
    "webkitAnimationStart",
    "oAnimationStart",
    "MSAnimationStart",
];

pub const ANIMATION_END_EVENTS: [&str; 4] = [
    "animationend",
    "webkitAnimationEnd",
    "oAnimationEnd",
    "MSAnimationEnd",
];

/// Receives the handle that cancels an animation once it is armed.
pub type RegisterCleanup = Box<dyn FnOnce(Cancel)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunState {
    Idle,
    Started,
    Settled,
}

/// Everything one `animate` call has armed.
struct Run<P: Platform> {
    state: Cell<RunState>,
    start_timeout: RefCell<Option<Timeout<P>>>,
    end_timeout: RefCell<Option<Timeout<P>>>,
    start_events: RefCell<Option<EventGroup<P>>>,
    end_events: RefCell<Option<EventGroup<P>>>,
}

impl<P: Platform> Run<P> {
    fn new() -> Self {
        Run {
            state: Cell::new(RunState::Idle),
            start_timeout: Default::default(),
            end_timeout: Default::default(),
            start_events: Default::default(),
            end_events: Default::default(),
        }
    }

    fn cancel_start(&self) {
        let timeout = self.start_timeout.take();
        if let Some(timeout) = timeout {
            timeout.cancel();
        }
        let events = self.start_events.take();
        if let Some(events) = events {
            events.cancel();
        }
    }

    fn cancel_end(&self) {
        let timeout = self.end_timeout.take();
        if let Some(timeout) = timeout {
            timeout.cancel();
        }
        let events = self.end_events.take();
        if let Some(events) = events {
            events.cancel();
        }
    }
}

impl<P: Platform> Lifecycle<P> {
    /// Whether a stylesheet of the element's document defines `@keyframes
    /// name`.
    ///
    /// The scan stops at the first stylesheet whose rules cannot be read, and
    /// reports the animation as missing.
    pub fn is_valid_animation(&self, element: &P::Element, name: &str) -> bool {
        let platform = self.platform();
        for sheet in platform.style_sheets(element) {
            match platform.keyframes_names(&sheet) {
                Ok(names) => {
                    if names.iter().any(|n| n == name) {
                        return true;
                    }
                }
                Err(err) => {
                    log::debug!("{err}, treating '{name}' as missing");
                    return false;
                }
            }
        }
        false
    }

    /// Run the animation `name` on `element` with the configured end timeout.
    pub fn animate(&self, element: impl Into<ElementRef<P::Element>>, name: &str) -> Watch<()> {
        self.animate_with(element, name, None, self.config().animation_timeout_ms)
    }

    /// Run the animation `name` on `element`.
    ///
    /// `register_cleanup` is handed a [`Cancel`] once the animation is armed;
    /// cancelling through it clears the animation and fails the watch with
    /// [`Error::Cancelled`](crate::Error::Cancelled). `timeout_ms` bounds the
    /// wait for the end event after the animation has started.
    pub fn animate_with(
        &self,
        element: impl Into<ElementRef<P::Element>>,
        name: &str,
        register_cleanup: Option<RegisterCleanup>,
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
        if !self.is_valid_animation(&element, name) {
            log::debug!("no keyframes named '{name}'");
            return Watch::settled(Ok(()));
        }

        let settler = Settler::<()>::new();
        let watch = Watch::new(&settler);
        let run = Rc::new(Run::<P>::new());
        let name: Rc<str> = name.into();

        settler.on_cleanup({
            let run = run.clone();
            let platform = platform.clone();
            let element = element.clone();
            move || {
                run.state.set(RunState::Settled);
                set_vendor_css(&platform, &element, "animation-name", "");
                run.cancel_start();
                run.cancel_end();
            }
        });

        set_vendor_css(platform, &element, "animation-name", &name);

        let start_events = EventGroup::bind(
            platform,
            Target::Element(&element),
            &ANIMATION_START_EVENTS,
            {
                let run = run.clone();
                let settler = settler.clone();
                let platform = platform.clone();
                let element = element.clone();
                let name = name.clone();
                move |event: P::Event| {
                    if run.state.get() != RunState::Idle
                        || !event.is_targeting(&element)
                        || event.animation_name().as_deref() != Some(&*name)
                    {
                        return;
                    }
                    event.stop_propagation();
                    // Later spellings of this same start are never seen.
                    run.cancel_start();
                    run.state.set(RunState::Started);
                    log::debug!("animation '{name}' started");

                    let settler = settler.clone();
                    let name = name.clone();
                    let end = Timeout::start(&platform, timeout_ms, move || {
                        log::debug!("no end event for '{name}' after {timeout_ms}ms");
                        settler.settle(Ok(()));
                    });
                    *run.end_timeout.borrow_mut() = Some(end);
                }
            },
        );
        *run.start_events.borrow_mut() = Some(start_events);

        let end_events = EventGroup::bind(
            platform,
            Target::Element(&element),
            &ANIMATION_END_EVENTS,
            {
                let run = run.clone();
                let settler = settler.clone();
                let element = element.clone();
                let name = name.clone();
                move |event: P::Event| {
                    if run.state.get() == RunState::Settled || !event.is_targeting(&element) {
                        return;
                    }
                    let outcome = match event.animation_name() {
                        Some(found) if *found != *name => AnimationMismatchSnafu {
                            expected: &*name,
                            found,
                        }
                        .fail(),
                        _ => Ok(()),
                    };
                    settler.settle(outcome);
                }
            },
        );
        *run.end_events.borrow_mut() = Some(end_events);

        let start_timeout = Timeout::start(platform, self.config().animation_start_timeout_ms, {
            let run = run.clone();
            let settler = settler.clone();
            let name = name.clone();
            move || {
                if run.state.get() == RunState::Idle {
                    log::debug!("animation '{name}' never started");
                    settler.settle(Ok(()));
                }
            }
        });
        *run.start_timeout.borrow_mut() = Some(start_timeout);

        if let Some(register_cleanup) = register_cleanup {
            register_cleanup(watch.canceller());
        }
        watch
    }

    /// Start the animation, then show the element.
    pub fn show_and_animate(
        &self,
        element: &P::Element,
        name: &str,
        register_cleanup: Option<RegisterCleanup>,
    ) -> Watch<()> {
        let watch = self.animate_with(
            element,
            name,
            register_cleanup,
            self.config().animation_timeout_ms,
        );
        show_element(self.platform(), element);
        watch
    }

    /// Run the animation, then hide the element if it succeeded.
    pub fn animate_and_hide(
        &self,
        element: &P::Element,
        name: &str,
        register_cleanup: Option<RegisterCleanup>,
    ) -> impl Future<Output = Result<()>> + 'static {
        let watch = self.animate_with(
            element,
            name,
            register_cleanup,
            self.config().animation_timeout_ms,
        );
        let platform = self.platform().clone();
        let element = element.clone();
        async move {
            watch.await?;
            hide_element(&platform, &element);
            Ok(())
        }
    }
}
