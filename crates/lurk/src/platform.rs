//! The boundary between lifecycle logic and a concrete DOM.
//!
//! Everything `lurk` observes or mutates goes through [`Platform`]. The browser
//! implementation lives in [`crate::web`], the in-memory one in [`crate::sim`].
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifies a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Identifies a registered event listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Identity of a DOM node that does not keep the node alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

/// Width and height of an element in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Dimensions { width, height }
    }
}

/// An element's bounding client rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// A rect at (`left`, `top`) with the given size.
    pub fn at(left: f64, top: f64, width: f64, height: f64) -> Self {
        Rect {
            top,
            bottom: top + height,
            left,
            right: left + width,
            width,
            height,
        }
    }
}

/// Navigation milestones of the current page, in milliseconds since the epoch.
///
/// A milestone the browser has not reached (or does not report) is `0.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationTiming {
    pub navigation_start: f64,
    pub connect_end: f64,
    pub dom_interactive: f64,
}

/// Something an event listener can be attached to.
#[derive(Debug)]
pub enum Target<'a, E> {
    Window,
    Element(&'a E),
}

impl<E> Clone for Target<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Target<'_, E> {}

/// A way to name an element: either the element itself or a string that is
/// looked up as an id first and a CSS selector second.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementRef<E> {
    Element(E),
    Selector(String),
}

impl<E> ElementRef<E> {
    pub fn selector(selector: impl Into<String>) -> Self {
        ElementRef::Selector(selector.into())
    }
}

impl<E: Clone> From<&E> for ElementRef<E> {
    fn from(element: &E) -> Self {
        ElementRef::Element(element.clone())
    }
}

impl<E> From<String> for ElementRef<E> {
    fn from(selector: String) -> Self {
        ElementRef::Selector(selector)
    }
}

impl<E: std::fmt::Debug> std::fmt::Display for ElementRef<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementRef::Element(element) => write!(f, "{element:?}"),
            ElementRef::Selector(selector) => write!(f, "\"{selector}\""),
        }
    }
}

/// An event delivered to a listener.
pub trait PlatformEvent: 'static {
    type Element;

    /// The event's type, eg `"animationend"`.
    fn name(&self) -> String;

    /// Whether the event was dispatched at `element` (as opposed to bubbling
    /// up to it from a descendant).
    fn is_targeting(&self, element: &Self::Element) -> bool;

    /// The `animationName` carried by animation events.
    fn animation_name(&self) -> Option<String>;

    fn stop_propagation(&self);

    /// The element whose listener is handling the event, if it was
    /// registered on an element.
    fn current_element(&self) -> Option<Self::Element>;
}

/// A DOM environment.
///
/// Implementations are cheap handles (`Clone`) onto shared, single-threaded
/// state. Callbacks handed to the platform may call back into it, so
/// implementations must not hold borrows while invoking them.
pub trait Platform: Clone + 'static {
    type Element: Clone + PartialEq + std::fmt::Debug + 'static;
    type Window: Clone + std::fmt::Debug + 'static;
    type Event: PlatformEvent<Element = Self::Element>;
    type StyleSheet;

    /// Milliseconds elapsed since navigation started.
    fn now(&self) -> f64;

    /// Wall-clock milliseconds since the epoch.
    fn epoch_millis(&self) -> f64;

    /// `None` when the platform has no navigation timing.
    fn navigation_timing(&self) -> Option<NavigationTiming>;

    fn set_timeout(&self, millis: u32, f: Box<dyn FnOnce()>) -> TimerId;

    fn set_interval(&self, millis: u32, f: Box<dyn FnMut()>) -> TimerId;

    /// Clears a timeout or an interval. Clearing an unknown or finished timer
    /// does nothing.
    fn clear_timer(&self, id: TimerId);

    fn listen(
        &self,
        target: Target<'_, Self::Element>,
        event_name: &str,
        handler: Box<dyn FnMut(Self::Event)>,
    ) -> ListenerId;

    /// Removes a listener. Removing an unknown listener does nothing.
    fn unlisten(&self, id: ListenerId);

    /// Listen on an element without the platform holding on to the element.
    ///
    /// The registration is owned by the element, so an element that is
    /// dropped without the listener ever being removed takes it along.
    fn listen_owned(
        &self,
        element: &Self::Element,
        event_name: &str,
        handler: Box<dyn FnMut(Self::Event)>,
    ) -> ListenerId;

    /// Removes a listener added with [`Platform::listen_owned`].
    fn unlisten_owned(&self, element: &Self::Element, id: ListenerId);

    /// The document has a body and has finished loading.
    fn is_document_ready(&self) -> bool;

    fn body(&self) -> Option<Self::Element>;

    /// Look up an element by id, falling back to a CSS selector query.
    fn query(&self, selector: &str) -> Option<Self::Element>;

    fn viewport(&self) -> Dimensions;

    fn node_key(&self, element: &Self::Element) -> NodeKey;

    /// Whether the element currently has a parent node.
    fn is_attached(&self, element: &Self::Element) -> bool;

    fn offset_dimensions(&self, element: &Self::Element) -> Dimensions;

    fn bounding_rect(&self, element: &Self::Element) -> Rect;

    /// The number of layout boxes the element renders as. Zero for detached
    /// elements and elements that are not displayed.
    fn client_rects_len(&self, element: &Self::Element) -> usize;

    /// Stylesheets of the element's owning document, in document order.
    fn style_sheets(&self, element: &Self::Element) -> Vec<Self::StyleSheet>;

    /// Names of the keyframes rules in a stylesheet.
    ///
    /// Errs when the rules cannot be read, eg for a cross-origin sheet.
    fn keyframes_names(&self, sheet: &Self::StyleSheet) -> Result<Vec<String>, Error>;

    /// Set an inline style property. An empty value removes the property.
    fn set_style(&self, element: &Self::Element, name: &str, value: &str, important: bool);

    fn add_class(&self, element: &Self::Element, name: &str);

    fn remove_class(&self, element: &Self::Element, name: &str);

    /// The content window of a frame element, if it has one.
    fn content_window(&self, frame: &Self::Element) -> Option<Self::Window>;

    /// Record the relationship between a loaded frame and its content window.
    fn link_frame_window(&self, frame: &Self::Element);
}

/// Element lookup shared by every tracker.
pub(crate) fn find_element<P: Platform>(
    platform: &P,
    element: &ElementRef<P::Element>,
) -> Option<P::Element> {
    match element {
        ElementRef::Element(element) => Some(element.clone()),
        ElementRef::Selector(selector) => platform.query(selector),
    }
}
