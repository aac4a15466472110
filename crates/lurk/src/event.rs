//! Event listener handles.
use std::{cell::RefCell, rc::Rc};

use crate::platform::{ListenerId, Platform, Target};

/// A registered listener. Cancelling it removes the listener exactly once.
pub struct Listener<P: Platform> {
    platform: P,
    id: Rc<RefCell<Option<ListenerId>>>,
}

impl<P: Platform> Clone for Listener<P> {
    fn clone(&self) -> Self {
        Self {
            platform: self.platform.clone(),
            id: self.id.clone(),
        }
    }
}

impl<P: Platform> Listener<P> {
    pub fn new(
        platform: &P,
        target: Target<'_, P::Element>,
        event_name: &str,
        handler: impl FnMut(P::Event) + 'static,
    ) -> Self {
        let id = platform.listen(target, event_name, Box::new(handler));
        log::trace!("listening for '{event_name}' as {id:?}");
        Listener {
            platform: platform.clone(),
            id: Rc::new(RefCell::new(Some(id))),
        }
    }

    /// Returns `true` if this call is the one that removed the listener.
    pub fn cancel(&self) -> bool {
        let id = self.id.borrow_mut().take();
        if let Some(id) = id {
            log::trace!("removing listener {id:?}");
            self.platform.unlisten(id);
            true
        } else {
            false
        }
    }

    pub fn is_listening(&self) -> bool {
        self.id.borrow().is_some()
    }
}

/// One logical event delivered under several names.
///
/// Browsers disagree on the spelling of some events (`animationstart`,
/// `webkitAnimationStart`, ...). An `EventGroup` listens for every spelling
/// with one shared handler and is cancelled as a unit.
pub struct EventGroup<P: Platform> {
    listeners: Rc<RefCell<Vec<Listener<P>>>>,
}

impl<P: Platform> Clone for EventGroup<P> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<P: Platform> EventGroup<P> {
    pub fn bind(
        platform: &P,
        target: Target<'_, P::Element>,
        event_names: &[&str],
        handler: impl Fn(P::Event) + 'static,
    ) -> Self {
        let handler = Rc::new(handler);
        let listeners = event_names
            .iter()
            .map(|name| {
                let handler = handler.clone();
                Listener::new(platform, target, name, move |event| handler(event))
            })
            .collect();
        EventGroup {
            listeners: Rc::new(RefCell::new(listeners)),
        }
    }

    /// Remove every listener in the group. Returns `true` if this call removed
    /// them.
    pub fn cancel(&self) -> bool {
        // Take the listeners first so a reentrant cancel finds nothing to do.
        let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        let mut removed = false;
        for listener in listeners {
            removed |= listener.cancel();
        }
        removed
    }

    pub fn is_bound(&self) -> bool {
        self.listeners.borrow().iter().any(Listener::is_listening)
    }
}

/// An [`EventGroup`] whose listeners belong to the element.
///
/// The group never holds the element, so an element that goes away with the
/// group still bound is not kept alive by it. Cancelling needs the element
/// back, which a handler gets from
/// [`PlatformEvent::current_element`](crate::platform::PlatformEvent::current_element).
pub struct OwnedEventGroup<P: Platform> {
    platform: P,
    ids: Rc<RefCell<Vec<ListenerId>>>,
}

impl<P: Platform> Clone for OwnedEventGroup<P> {
    fn clone(&self) -> Self {
        Self {
            platform: self.platform.clone(),
            ids: self.ids.clone(),
        }
    }
}

impl<P: Platform> OwnedEventGroup<P> {
    pub fn bind(
        platform: &P,
        element: &P::Element,
        event_names: &[&str],
        handler: impl Fn(P::Event) + 'static,
    ) -> Self {
        let handler = Rc::new(handler);
        let ids = event_names
            .iter()
            .map(|name| {
                let handler = handler.clone();
                let id = platform.listen_owned(element, name, Box::new(move |event| handler(event)));
                log::trace!("element owns '{name}' listener {id:?}");
                id
            })
            .collect();
        OwnedEventGroup {
            platform: platform.clone(),
            ids: Rc::new(RefCell::new(ids)),
        }
    }

    /// Remove every listener from `element`. Returns `true` if this call
    /// removed them.
    pub fn cancel(&self, element: &P::Element) -> bool {
        let ids = std::mem::take(&mut *self.ids.borrow_mut());
        for id in &ids {
            self.platform.unlisten_owned(element, *id);
        }
        !ids.is_empty()
    }

    pub fn is_bound(&self) -> bool {
        !self.ids.borrow().is_empty()
    }
}
