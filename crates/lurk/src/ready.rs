//! Document and element readiness.
use std::{cell::RefCell, future::Future, rc::Rc};

use snafu::OptionExt;

use crate::{
    context::Lifecycle,
    deferred::Deferred,
    error::{NotFoundSnafu, ResourceUnavailableSnafu, Result},
    event::Listener,
    platform::{ElementRef, Platform, Target, find_element},
    poll::Interval,
    watch::{Settler, Watch},
};

/// Remove the listener held in `slot`, if it is still there.
fn take_and_cancel<P: Platform>(slot: &RefCell<Option<Listener<P>>>) {
    let listener = slot.borrow_mut().take();
    if let Some(listener) = listener {
        listener.cancel();
    }
}

impl<P: Platform> Lifecycle<P> {
    /// Resolves once the document has a body and has finished loading.
    ///
    /// Every call returns the same completion. If the document is already
    /// ready that completion is settled before this returns.
    pub fn document_ready(&self) -> Deferred<()> {
        self.inner
            .memo
            .memoize_global("document_ready", || self.watch_document_ready())
    }

    fn watch_document_ready(&self) -> Deferred<()> {
        let platform = self.platform();
        let ready = Deferred::new();
        if platform.is_document_ready() {
            ready.settle(());
            return ready;
        }

        log::debug!("waiting for the document to finish loading");
        // Whichever of the load event and the poll sees readiness first wins,
        // and tears the other down.
        let load: Rc<RefCell<Option<Listener<P>>>> = Default::default();
        let poll = Interval::start(platform, self.config().document_poll_ms, {
            let platform = platform.clone();
            let ready = ready.clone();
            let load = load.clone();
            move || {
                if !platform.is_document_ready() {
                    return false;
                }
                take_and_cancel(&load);
                ready.settle(());
                true
            }
        });
        let listener = Listener::new(platform, Target::Window, "load", {
            let platform = platform.clone();
            let ready = ready.clone();
            let load = load.clone();
            move |_| {
                if platform.is_document_ready() {
                    poll.cancel();
                    take_and_cancel(&load);
                    ready.settle(());
                }
            }
        });
        *load.borrow_mut() = Some(listener);
        ready
    }

    /// Resolves when the window fires `load`, or right away if the document
    /// has already loaded.
    pub fn window_ready(&self) -> Deferred<()> {
        self.inner.memo.memoize_global("window_ready", || {
            let platform = self.platform();
            let ready = Deferred::new();
            if platform.is_document_ready() {
                ready.settle(());
                return ready;
            }
            let slot: Rc<RefCell<Option<Listener<P>>>> = Default::default();
            let listener = Listener::new(platform, Target::Window, "load", {
                let ready = ready.clone();
                let slot = slot.clone();
                move |_| {
                    take_and_cancel(&slot);
                    ready.settle(());
                }
            });
            *slot.borrow_mut() = Some(listener);
            ready
        })
    }

    /// The document's body, once the document is ready.
    pub fn document_body(&self) -> impl Future<Output = Result<P::Element>> + 'static {
        let ready = self.document_ready();
        let platform = self.platform().clone();
        async move {
            ready.await;
            platform.body().context(ResourceUnavailableSnafu {
                what: "document body",
            })
        }
    }

    /// Look an element up right now.
    pub fn get_element(&self, element: impl Into<ElementRef<P::Element>>) -> Result<P::Element> {
        let element = element.into();
        find_element(self.platform(), &element).context(NotFoundSnafu {
            name: element.to_string(),
        })
    }

    /// Resolves with the element as soon as it can be found.
    ///
    /// Fails with [`Error::NotFound`](crate::Error::NotFound) once the document
    /// is ready and the element still does not exist. When that is already
    /// the case this fails without polling.
    pub fn element_ready(&self, element: impl Into<ElementRef<P::Element>>) -> Watch<P::Element> {
        let element = element.into();
        let platform = self.platform();
        if let Some(found) = find_element(platform, &element) {
            return Watch::settled(Ok(found));
        }
        if platform.is_document_ready() {
            log::debug!("document is ready and {element} is missing");
            return Watch::settled(
                NotFoundSnafu {
                    name: element.to_string(),
                }
                .fail(),
            );
        }

        let settler = Settler::new();
        let watch = Watch::new(&settler);
        let poll = Interval::start(platform, self.config().element_poll_ms, {
            let platform = platform.clone();
            let settler = settler.clone();
            move || match find_element(&platform, &element) {
                Some(found) => {
                    settler.settle(Ok(found));
                    true
                }
                None if platform.is_document_ready() => {
                    settler.settle(
                        NotFoundSnafu {
                            name: element.to_string(),
                        }
                        .fail(),
                    );
                    true
                }
                None => false,
            }
        });
        settler.on_cleanup(move || {
            poll.cancel();
        });
        watch
    }
}
