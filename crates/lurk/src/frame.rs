//! Frame load tracking.
use std::{cell::RefCell, future::Future, rc::Rc};

use snafu::OptionExt;

use crate::{
    context::Lifecycle,
    deferred::Deferred,
    error::{FrameLoadSnafu, ResourceUnavailableSnafu, Result},
    event::OwnedEventGroup,
    platform::{Platform, PlatformEvent},
};

impl<P: Platform> Lifecycle<P> {
    /// The shared load completion of `frame`, subscribing on first use.
    fn frame_completion(&self, frame: &P::Element) -> Deferred<Result<()>> {
        let platform = self.platform();
        let key = platform.node_key(frame);
        if let Some(loaded) = self.inner.frames.borrow().get(&key) {
            return loaded.clone();
        }

        let loaded = Deferred::new();
        // Stored before subscribing so a reentrant call finds it.
        self.inner.frames.borrow_mut().insert(key, loaded.clone());
        log::debug!("waiting for frame {key:?} to load");

        // Nothing here may hold the frame: a frame removed before it loads
        // must stay collectable. The handler gets it back from the event.
        let slot: Rc<RefCell<Option<OwnedEventGroup<P>>>> = Default::default();
        let group = OwnedEventGroup::bind(platform, frame, &["load", "error"], {
            let platform = platform.clone();
            let loaded = loaded.clone();
            let slot = slot.clone();
            move |event: P::Event| {
                let Some(frame) = event.current_element() else {
                    log::warn!("frame {key:?} '{}' event has no current element", event.name());
                    return;
                };
                let outcome = if event.name() == "load" {
                    platform.link_frame_window(&frame);
                    Ok(())
                } else if platform.content_window(&frame).is_some() {
                    log::warn!("frame {key:?} reported an error but has a window");
                    Ok(())
                } else {
                    FrameLoadSnafu {
                        reason: format!("'{}' event and no content window", event.name()),
                    }
                    .fail()
                };
                let group = slot.borrow_mut().take();
                if let Some(group) = group {
                    group.cancel(&frame);
                }
                loaded.settle(outcome);
            }
        });
        *slot.borrow_mut() = Some(group);
        loaded
    }

    /// Resolves with the frame once it fires `load`.
    ///
    /// Concurrent and later calls for the same frame share one completion and
    /// one set of listeners. An `error` event still resolves if the frame has
    /// a content window, and fails with
    /// [`Error::FrameLoad`](crate::Error::FrameLoad) otherwise.
    pub fn frame_load(&self, frame: &P::Element) -> impl Future<Output = Result<P::Element>> + 'static + use<P> {
        let loaded = self.frame_completion(frame);
        let frame = frame.clone();
        async move { loaded.await.map(|()| frame) }
    }

    /// The frame's content window, waiting for the frame to load if it does
    /// not have one yet.
    pub fn frame_window(&self, frame: &P::Element) -> impl Future<Output = Result<P::Window>> + 'static + use<P> {
        let platform = self.platform().clone();
        let state = match platform.content_window(frame) {
            Some(window) => Ok(window),
            None => Err(self.frame_completion(frame)),
        };
        let frame = frame.clone();
        async move {
            let loaded = match state {
                Ok(window) => return Ok(window),
                Err(loaded) => loaded,
            };
            loaded.await?;
            platform
                .content_window(&frame)
                .context(ResourceUnavailableSnafu {
                    what: "frame window after load",
                })
        }
    }
}
