//! An in-memory document driven by a virtual clock.
//!
//! `Sim` implements [`Platform`] without a browser. Time only moves when
//! [`Sim::advance`] is called, and events only happen when they are
//! dispatched, which makes every race in the lifecycle trackers reproducible.
//!
//! ```rust
//! use lurk::{prelude::*, sim::Sim};
//!
//! let sim = Sim::new();
//! let lifecycle = Lifecycle::new(sim.clone());
//! let ready = lifecycle.document_ready();
//! assert!(!ready.is_settled());
//! sim.finish_loading();
//! assert!(ready.is_settled());
//! ```
use std::{
    cell::{Cell, RefCell},
    collections::{BTreeSet, HashMap},
    rc::{Rc, Weak},
};

use crate::{
    error::{Error, StyleSheetSnafu},
    platform::{
        Dimensions, ListenerId, NavigationTiming, NodeKey, Platform, PlatformEvent, Rect, Target,
        TimerId,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TargetKey {
    Window,
    Node(u64),
}

enum TimerCallback {
    Once(Box<dyn FnOnce()>),
    Repeat(Box<dyn FnMut()>),
}

struct SimTimer {
    due: u64,
    period: Option<u64>,
    callback: TimerCallback,
}

type Handler = Rc<RefCell<Box<dyn FnMut(SimEvent)>>>;

struct SimListener {
    id: u64,
    target: TargetKey,
    name: String,
    handler: Handler,
}

struct ElementData {
    key: u64,
    tag: String,
    id: RefCell<Option<String>>,
    classes: RefCell<Vec<String>>,
    styles: RefCell<Vec<(String, String, bool)>>,
    parent: RefCell<Weak<ElementData>>,
    children: RefCell<Vec<SimElement>>,
    offset: Cell<Dimensions>,
    rect: Cell<Rect>,
    content_window: RefCell<Option<SimWindow>>,
    linked: Cell<bool>,
}

/// An element of a [`Sim`] document.
#[derive(Clone)]
pub struct SimElement {
    inner: Rc<ElementData>,
}

impl PartialEq for SimElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for SimElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}", self.inner.tag)?;
        if let Some(id) = self.inner.id.borrow().as_ref() {
            write!(f, " id=\"{id}\"")?;
        }
        f.write_str(">")
    }
}

impl SimElement {
    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    pub fn id(&self) -> Option<String> {
        self.inner.id.borrow().clone()
    }

    pub fn set_id(&self, id: impl Into<String>) {
        *self.inner.id.borrow_mut() = Some(id.into());
    }

    /// Append `child`, detaching it from any previous parent.
    pub fn append_child(&self, child: &SimElement) {
        child.remove();
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
        self.inner.children.borrow_mut().push(child.clone());
    }

    /// Detach this element from its parent.
    pub fn remove(&self) {
        let parent = self.parent();
        if let Some(parent) = parent {
            parent.inner.children.borrow_mut().retain(|c| c != self);
        }
        *self.inner.parent.borrow_mut() = Weak::new();
    }

    pub fn parent(&self) -> Option<SimElement> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| SimElement { inner })
    }

    pub fn children(&self) -> Vec<SimElement> {
        self.inner.children.borrow().clone()
    }

    /// The inline style value for `name`, if set.
    pub fn style(&self, name: &str) -> Option<String> {
        self.inner
            .styles
            .borrow()
            .iter()
            .find(|(k, _, _)| k == name)
            .map(|(_, v, _)| v.clone())
    }

    pub fn style_is_important(&self, name: &str) -> bool {
        self.inner
            .styles
            .borrow()
            .iter()
            .any(|(k, _, important)| k == name && *important)
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.inner.classes.borrow().iter().any(|c| c == name)
    }

    pub fn set_offset_dimensions(&self, width: f64, height: f64) {
        self.inner.offset.set(Dimensions { width, height });
    }

    pub fn set_rect(&self, rect: Rect) {
        self.inner.rect.set(rect);
    }

    /// Give this (frame) element a content window, or take it away.
    pub fn set_content_window(&self, window: Option<SimWindow>) {
        *self.inner.content_window.borrow_mut() = window;
    }

    /// Whether the platform was asked to link this frame to its window.
    pub fn is_linked(&self) -> bool {
        self.inner.linked.get()
    }

    /// A handle that does not keep the element alive.
    pub fn downgrade(&self) -> WeakSimElement {
        WeakSimElement(Rc::downgrade(&self.inner))
    }

    fn find(&self, matches: &impl Fn(&SimElement) -> bool) -> Option<SimElement> {
        if matches(self) {
            return Some(self.clone());
        }
        self.children().iter().find_map(|child| child.find(matches))
    }
}

/// A [`SimElement`] that may have been dropped.
#[derive(Clone, Debug)]
pub struct WeakSimElement(Weak<ElementData>);

impl WeakSimElement {
    pub fn upgrade(&self) -> Option<SimElement> {
        self.0.upgrade().map(|inner| SimElement { inner })
    }
}

/// A frame's content window.
#[derive(Clone, Debug, PartialEq)]
pub struct SimWindow {
    pub name: String,
}

impl SimWindow {
    pub fn new(name: impl Into<String>) -> Self {
        SimWindow { name: name.into() }
    }
}

/// A stylesheet of a [`Sim`] document.
#[derive(Clone, Debug, Default)]
pub struct SimStyleSheet {
    pub keyframes: Vec<String>,
    /// Cross-origin sheets refuse to list their rules.
    pub cross_origin: bool,
}

impl SimStyleSheet {
    pub fn with_keyframes(names: &[&str]) -> Self {
        SimStyleSheet {
            keyframes: names.iter().map(|s| s.to_string()).collect(),
            cross_origin: false,
        }
    }

    pub fn cross_origin() -> Self {
        SimStyleSheet {
            keyframes: vec![],
            cross_origin: true,
        }
    }
}

struct EventData {
    name: String,
    animation_name: Option<String>,
    target: Cell<Option<TargetKey>>,
    current: RefCell<Option<SimElement>>,
    stopped: Cell<bool>,
}

/// An event dispatched through a [`Sim`] document.
#[derive(Clone)]
pub struct SimEvent {
    inner: Rc<EventData>,
}

impl std::fmt::Debug for SimEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEvent")
            .field("name", &self.inner.name)
            .field("animation_name", &self.inner.animation_name)
            .finish()
    }
}

impl SimEvent {
    pub fn new(name: impl Into<String>) -> Self {
        SimEvent {
            inner: Rc::new(EventData {
                name: name.into(),
                animation_name: None,
                target: Cell::new(None),
                current: RefCell::new(None),
                stopped: Cell::new(false),
            }),
        }
    }

    /// An animation event, eg `SimEvent::animation("animationend", "spin")`.
    pub fn animation(name: impl Into<String>, animation_name: impl Into<String>) -> Self {
        SimEvent {
            inner: Rc::new(EventData {
                name: name.into(),
                animation_name: Some(animation_name.into()),
                target: Cell::new(None),
                current: RefCell::new(None),
                stopped: Cell::new(false),
            }),
        }
    }

    /// Whether a listener stopped this event's propagation.
    pub fn propagation_stopped(&self) -> bool {
        self.inner.stopped.get()
    }
}

impl PlatformEvent for SimEvent {
    type Element = SimElement;

    fn name(&self) -> String {
        self.inner.name.clone()
    }

    fn is_targeting(&self, element: &SimElement) -> bool {
        self.inner.target.get() == Some(TargetKey::Node(element.inner.key))
    }

    fn animation_name(&self) -> Option<String> {
        self.inner.animation_name.clone()
    }

    fn stop_propagation(&self) {
        self.inner.stopped.set(true);
    }

    fn current_element(&self) -> Option<SimElement> {
        self.inner.current.borrow().clone()
    }
}

struct SimState {
    now: Cell<u64>,
    next_id: Cell<u64>,
    timers: RefCell<HashMap<u64, SimTimer>>,
    queue: RefCell<BTreeSet<(u64, u64)>>,
    /// The repeating timer currently running, and whether it was cleared
    /// while running.
    in_flight: Cell<Option<(u64, bool)>>,
    listeners: RefCell<Vec<SimListener>>,
    clear_calls: Cell<usize>,
    unlisten_calls: Cell<usize>,
    ready: Cell<bool>,
    root: SimElement,
    body: RefCell<Option<SimElement>>,
    sheets: RefCell<Vec<SimStyleSheet>>,
    viewport: Cell<Dimensions>,
    /// Wall-clock time at virtual time zero.
    epoch: Cell<f64>,
    timing: Cell<Option<NavigationTiming>>,
}

/// A simulated document, window and clock.
#[derive(Clone)]
pub struct Sim {
    state: Rc<SimState>,
}

impl Default for Sim {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Sim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sim")
            .field("now", &self.state.now.get())
            .field("timers", &self.active_timers())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

fn new_element(key: u64, tag: &str) -> SimElement {
    SimElement {
        inner: Rc::new(ElementData {
            key,
            tag: tag.to_string(),
            id: Default::default(),
            classes: Default::default(),
            styles: Default::default(),
            parent: Default::default(),
            children: Default::default(),
            offset: Default::default(),
            rect: Default::default(),
            content_window: Default::default(),
            linked: Default::default(),
        }),
    }
}

impl Sim {
    /// A loading document (not yet ready) with an `html` root and a `body`.
    pub fn new() -> Self {
        let root = new_element(1, "html");
        let body = new_element(2, "body");
        root.append_child(&body);
        Sim {
            state: Rc::new(SimState {
                now: Cell::new(0),
                next_id: Cell::new(3),
                timers: Default::default(),
                queue: Default::default(),
                in_flight: Cell::new(None),
                listeners: Default::default(),
                clear_calls: Cell::new(0),
                unlisten_calls: Cell::new(0),
                ready: Cell::new(false),
                root,
                body: RefCell::new(Some(body)),
                sheets: Default::default(),
                viewport: Cell::new(Dimensions::new(1024.0, 768.0)),
                epoch: Cell::new(1_700_000_000_000.0),
                timing: Cell::new(None),
            }),
        }
    }

    /// A document that has already finished loading.
    pub fn ready() -> Self {
        let sim = Self::new();
        sim.state.ready.set(true);
        sim
    }

    fn next_id(&self) -> u64 {
        let id = self.state.next_id.get();
        self.state.next_id.set(id + 1);
        id
    }

    pub fn create_element(&self, tag: &str) -> SimElement {
        new_element(self.next_id(), tag)
    }

    /// The document's body.
    ///
    /// ## Panics
    /// Panics if the body was removed with [`Sim::remove_body`].
    pub fn body_element(&self) -> SimElement {
        self.state
            .body
            .borrow()
            .clone()
            .expect("sim document has no body")
    }

    pub fn remove_body(&self) {
        if let Some(body) = self.state.body.borrow_mut().take() {
            body.remove();
        }
    }

    /// Mark the document complete and fire the window's `load` event.
    pub fn finish_loading(&self) {
        self.state.ready.set(true);
        self.dispatch_window(SimEvent::new("load"));
    }

    /// Set the document's ready state without firing any event.
    pub fn set_ready(&self, ready: bool) {
        self.state.ready.set(ready);
    }

    pub fn add_style_sheet(&self, sheet: SimStyleSheet) {
        self.state.sheets.borrow_mut().push(sheet);
    }

    /// Resize the viewport and fire the window's `resize` event.
    pub fn resize_window(&self, width: f64, height: f64) {
        self.state.viewport.set(Dimensions::new(width, height));
        self.dispatch_window(SimEvent::new("resize"));
    }

    /// Set the wall-clock time that virtual time zero corresponds to.
    pub fn set_epoch_millis(&self, epoch: f64) {
        self.state.epoch.set(epoch);
    }

    /// Report (or stop reporting) navigation timing.
    pub fn set_navigation_timing(&self, timing: Option<NavigationTiming>) {
        self.state.timing.set(timing);
    }

    /// The virtual time, in milliseconds.
    pub fn now_millis(&self) -> u64 {
        self.state.now.get()
    }

    /// Move the clock forward, firing every timer that comes due, in order.
    ///
    /// Must not be called from inside a timer or listener callback.
    pub fn advance(&self, millis: u64) {
        let until = self.state.now.get() + millis;
        loop {
            let next = self.state.queue.borrow().iter().next().copied();
            let Some((due, id)) = next.filter(|(due, _)| *due <= until) else {
                break;
            };
            self.state.queue.borrow_mut().remove(&(due, id));
            let timer = self.state.timers.borrow_mut().remove(&id);
            let Some(timer) = timer else {
                continue;
            };
            self.state.now.set(due);
            match timer.callback {
                TimerCallback::Once(f) => f(),
                TimerCallback::Repeat(mut f) => {
                    self.state.in_flight.set(Some((id, false)));
                    f();
                    let cleared = matches!(self.state.in_flight.take(), Some((_, true)));
                    if !cleared {
                        let period = timer.period.unwrap_or(1);
                        self.schedule(
                            id,
                            SimTimer {
                                due: due + period,
                                period: timer.period,
                                callback: TimerCallback::Repeat(f),
                            },
                        );
                    }
                }
            }
        }
        self.state.now.set(until);
    }

    fn schedule(&self, id: u64, timer: SimTimer) {
        self.state.queue.borrow_mut().insert((timer.due, id));
        self.state.timers.borrow_mut().insert(id, timer);
    }

    /// Dispatch `event` at `element`, bubbling through its ancestors until a
    /// listener stops its propagation.
    pub fn dispatch(&self, element: &SimElement, event: SimEvent) {
        event
            .inner
            .target
            .set(Some(TargetKey::Node(element.inner.key)));
        let mut node = Some(element.clone());
        while let Some(current) = node {
            *event.inner.current.borrow_mut() = Some(current.clone());
            self.deliver(TargetKey::Node(current.inner.key), &event);
            if event.propagation_stopped() {
                break;
            }
            node = current.parent();
        }
        event.inner.current.borrow_mut().take();
    }

    /// Whether the element is in the document and neither it nor an
    /// ancestor has `display: none`.
    fn is_rendered(&self, element: &SimElement) -> bool {
        let mut node = element.clone();
        loop {
            if node.style("display").as_deref() == Some("none") {
                return false;
            }
            match node.parent() {
                Some(parent) => node = parent,
                None => return node == self.state.root,
            }
        }
    }

    pub fn dispatch_window(&self, event: SimEvent) {
        event.inner.target.set(Some(TargetKey::Window));
        self.deliver(TargetKey::Window, &event);
    }

    fn deliver(&self, target: TargetKey, event: &SimEvent) {
        let handlers: Vec<(u64, Handler)> = self
            .state
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.target == target && l.name == event.inner.name)
            .map(|l| (l.id, l.handler.clone()))
            .collect();
        for (id, handler) in handlers {
            // An earlier handler may have removed this one.
            let registered = self.state.listeners.borrow().iter().any(|l| l.id == id);
            if !registered {
                continue;
            }
            match handler.try_borrow_mut() {
                Ok(mut handler) => handler(event.clone()),
                Err(_) => log::warn!("listener {id} re-entered by its own event"),
            };
        }
    }

    /// Timers scheduled and not yet fired or cleared.
    pub fn active_timers(&self) -> usize {
        self.state.timers.borrow().len()
    }

    /// Registered listeners, across all targets.
    pub fn listener_count(&self) -> usize {
        self.state.listeners.borrow().len()
    }

    /// Registered listeners for `event_name` on `element`.
    pub fn listeners_on(&self, element: &SimElement, event_name: &str) -> usize {
        let target = TargetKey::Node(element.inner.key);
        self.state
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.target == target && l.name == event_name)
            .count()
    }

    /// How many times `clear_timer` has been called.
    pub fn clear_calls(&self) -> usize {
        self.state.clear_calls.get()
    }

    /// How many times `unlisten` has been called.
    pub fn unlisten_calls(&self) -> usize {
        self.state.unlisten_calls.get()
    }
}

impl Platform for Sim {
    type Element = SimElement;
    type Window = SimWindow;
    type Event = SimEvent;
    type StyleSheet = SimStyleSheet;

    fn now(&self) -> f64 {
        self.state.now.get() as f64
    }

    fn epoch_millis(&self) -> f64 {
        self.state.epoch.get() + self.now()
    }

    fn navigation_timing(&self) -> Option<NavigationTiming> {
        self.state.timing.get()
    }

    fn set_timeout(&self, millis: u32, f: Box<dyn FnOnce()>) -> TimerId {
        let id = self.next_id();
        self.schedule(
            id,
            SimTimer {
                due: self.state.now.get() + millis as u64,
                period: None,
                callback: TimerCallback::Once(f),
            },
        );
        TimerId(id)
    }

    fn set_interval(&self, millis: u32, f: Box<dyn FnMut()>) -> TimerId {
        let id = self.next_id();
        let period = (millis as u64).max(1);
        self.schedule(
            id,
            SimTimer {
                due: self.state.now.get() + period,
                period: Some(period),
                callback: TimerCallback::Repeat(f),
            },
        );
        TimerId(id)
    }

    fn clear_timer(&self, TimerId(id): TimerId) {
        self.state.clear_calls.set(self.state.clear_calls.get() + 1);
        let removed = self.state.timers.borrow_mut().remove(&id);
        if let Some(timer) = removed {
            self.state.queue.borrow_mut().remove(&(timer.due, id));
        } else if let Some((running, _)) = self.state.in_flight.get() {
            if running == id {
                self.state.in_flight.set(Some((id, true)));
            }
        }
    }

    fn listen(
        &self,
        target: Target<'_, SimElement>,
        event_name: &str,
        handler: Box<dyn FnMut(SimEvent)>,
    ) -> ListenerId {
        let id = self.next_id();
        let target = match target {
            Target::Window => TargetKey::Window,
            Target::Element(element) => TargetKey::Node(element.inner.key),
        };
        self.state.listeners.borrow_mut().push(SimListener {
            id,
            target,
            name: event_name.to_string(),
            handler: Rc::new(RefCell::new(handler)),
        });
        ListenerId(id)
    }

    fn unlisten(&self, ListenerId(id): ListenerId) {
        self.state
            .unlisten_calls
            .set(self.state.unlisten_calls.get() + 1);
        // Dropping a handler may run arbitrary drop code, so not under the borrow.
        let removed: Vec<SimListener> = {
            let mut listeners = self.state.listeners.borrow_mut();
            let (removed, kept) = std::mem::take(&mut *listeners)
                .into_iter()
                .partition(|l| l.id == id);
            *listeners = kept;
            removed
        };
        drop(removed);
    }

    fn listen_owned(
        &self,
        element: &SimElement,
        event_name: &str,
        handler: Box<dyn FnMut(SimEvent)>,
    ) -> ListenerId {
        // The listener table only records node keys, never elements.
        self.listen(Target::Element(element), event_name, handler)
    }

    fn unlisten_owned(&self, _: &SimElement, id: ListenerId) {
        self.unlisten(id);
    }

    fn is_document_ready(&self) -> bool {
        self.state.ready.get() && self.state.body.borrow().is_some()
    }

    fn body(&self) -> Option<SimElement> {
        self.state.body.borrow().clone()
    }

    fn query(&self, selector: &str) -> Option<SimElement> {
        let root = &self.state.root;
        if let Some(found) = root.find(&|el| el.id().as_deref() == Some(selector)) {
            return Some(found);
        }
        if let Some(id) = selector.strip_prefix('#') {
            root.find(&|el| el.id().as_deref() == Some(id))
        } else if let Some(class) = selector.strip_prefix('.') {
            root.find(&|el| el.has_class(class))
        } else {
            root.find(&|el| el.tag().eq_ignore_ascii_case(selector))
        }
    }

    fn viewport(&self) -> Dimensions {
        self.state.viewport.get()
    }

    fn node_key(&self, element: &SimElement) -> NodeKey {
        NodeKey(element.inner.key)
    }

    fn is_attached(&self, element: &SimElement) -> bool {
        element.parent().is_some()
    }

    fn offset_dimensions(&self, element: &SimElement) -> Dimensions {
        element.inner.offset.get()
    }

    fn bounding_rect(&self, element: &SimElement) -> Rect {
        element.inner.rect.get()
    }

    fn client_rects_len(&self, element: &SimElement) -> usize {
        usize::from(self.is_rendered(element))
    }

    fn style_sheets(&self, _: &SimElement) -> Vec<SimStyleSheet> {
        self.state.sheets.borrow().clone()
    }

    fn keyframes_names(&self, sheet: &SimStyleSheet) -> Result<Vec<String>, Error> {
        if sheet.cross_origin {
            StyleSheetSnafu {
                reason: "cross-origin stylesheet",
            }
            .fail()
        } else {
            Ok(sheet.keyframes.clone())
        }
    }

    fn set_style(&self, element: &SimElement, name: &str, value: &str, important: bool) {
        let mut styles = element.inner.styles.borrow_mut();
        styles.retain(|(k, _, _)| k != name);
        if !value.is_empty() {
            styles.push((name.to_string(), value.to_string(), important));
        }
    }

    fn add_class(&self, element: &SimElement, name: &str) {
        if !element.has_class(name) {
            element.inner.classes.borrow_mut().push(name.to_string());
        }
    }

    fn remove_class(&self, element: &SimElement, name: &str) {
        element.inner.classes.borrow_mut().retain(|c| c != name);
    }

    fn content_window(&self, frame: &SimElement) -> Option<SimWindow> {
        frame.inner.content_window.borrow().clone()
    }

    fn link_frame_window(&self, frame: &SimElement) {
        frame.inner.linked.set(true);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn timers_fire_in_due_order() {
        let sim = Sim::new();
        let log = Rc::new(RefCell::new(vec![]));
        for (millis, label) in [(30, "c"), (10, "a"), (20, "b")] {
            let log = log.clone();
            sim.set_timeout(millis, Box::new(move || log.borrow_mut().push(label)));
        }
        sim.advance(25);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert_eq!(sim.now_millis(), 25);
        sim.advance(5);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(sim.active_timers(), 0);
    }

    #[test]
    fn query_by_id_selector_class_and_tag() {
        let sim = Sim::new();
        let body = sim.body_element();
        let div = sim.create_element("div");
        div.set_id("main");
        sim.add_class(&div, "panel");
        body.append_child(&div);

        assert_eq!(sim.query("main"), Some(div.clone()));
        assert_eq!(sim.query("#main"), Some(div.clone()));
        assert_eq!(sim.query(".panel"), Some(div.clone()));
        assert_eq!(sim.query("div"), Some(div.clone()));
        assert_eq!(sim.query("#other"), None);

        div.remove();
        assert_eq!(sim.query("main"), None);
        assert!(!sim.is_attached(&div));
    }

    #[test]
    fn stopped_events_do_not_bubble() {
        let sim = Sim::new();
        let parent = sim.create_element("div");
        let child = sim.create_element("span");
        parent.append_child(&child);
        let parent_hits = Rc::new(Cell::new(0));
        let hits = parent_hits.clone();
        sim.listen(
            Target::Element(&parent),
            "animationstart",
            Box::new(move |_| hits.set(hits.get() + 1)),
        );
        sim.dispatch(&child, SimEvent::new("animationstart"));
        assert_eq!(parent_hits.get(), 1);

        sim.listen(
            Target::Element(&child),
            "animationstart",
            Box::new(|event: SimEvent| event.stop_propagation()),
        );
        sim.dispatch(&child, SimEvent::new("animationstart"));
        assert_eq!(parent_hits.get(), 1);
    }

    #[test]
    fn current_element_follows_bubbling() {
        let sim = Sim::new();
        let parent = sim.create_element("div");
        let child = sim.create_element("span");
        parent.append_child(&child);
        let seen = Rc::new(RefCell::new(vec![]));
        for el in [&parent, &child] {
            let seen = seen.clone();
            sim.listen_owned(
                el,
                "load",
                Box::new(move |event: SimEvent| seen.borrow_mut().push(event.current_element())),
            );
        }
        let event = SimEvent::new("load");
        sim.dispatch(&child, event.clone());
        assert_eq!(*seen.borrow(), vec![Some(child), Some(parent)]);
        assert_eq!(event.current_element(), None);
    }

    #[test]
    fn only_rendered_elements_have_client_rects() {
        let sim = Sim::new();
        let wrapper = sim.create_element("div");
        let el = sim.create_element("span");
        wrapper.append_child(&el);
        assert_eq!(sim.client_rects_len(&el), 0);
        sim.body_element().append_child(&wrapper);
        assert_eq!(sim.client_rects_len(&el), 1);
        sim.set_style(&wrapper, "display", "none", true);
        assert_eq!(sim.client_rects_len(&el), 0);
    }
}
