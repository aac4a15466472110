//! The browser platform, through `web-sys`.
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::{Rc, Weak},
};

use snafu::OptionExt;
use wasm_bindgen::{JsCast, JsValue, prelude::Closure};

use crate::{
    context::Lifecycle,
    error::{Error, ResourceUnavailableSnafu, Result, StyleSheetSnafu},
    platform::{
        Dimensions, ListenerId, NavigationTiming, NodeKey, Platform, PlatformEvent, Rect, Target,
        TimerId,
    },
};

pub mod js;

/// Drop `value` once the current JS task is done.
///
/// Timer and listener closures remove themselves while they run, and a
/// `Closure` must not be freed from inside its own invocation.
fn retire<T: 'static>(value: T) {
    wasm_bindgen_futures::spawn_local(async move { drop(value) });
}

fn js_reason(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{err:?}"))
}

struct Timer {
    handle: i32,
    repeat: bool,
    _closure: Closure<dyn FnMut()>,
}

struct Registered {
    target: web_sys::EventTarget,
    name: String,
    closure: Closure<dyn FnMut(JsValue)>,
}

struct WebState {
    window: web_sys::Window,
    next_id: Cell<u64>,
    timers: RefCell<HashMap<u64, Timer>>,
    listeners: RefCell<HashMap<u64, Registered>>,
    /// Listeners owned by their element: the name and closure, never the target.
    owned: RefCell<HashMap<u64, (String, Closure<dyn FnMut(JsValue)>)>>,
    /// Element -> numeric node key.
    node_keys: js_sys::WeakMap,
    /// Content window -> frame element, for linked frames.
    frame_windows: js_sys::WeakMap,
}

/// The browser's window and document.
#[derive(Clone)]
pub struct Web {
    state: Rc<WebState>,
}

impl std::fmt::Debug for Web {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Web")
            .field("timers", &self.state.timers.borrow().len())
            .field("listeners", &self.state.listeners.borrow().len())
            .finish()
    }
}

/// An event delivered by the browser.
#[derive(Clone, Debug)]
pub struct WebEvent(pub web_sys::Event);

impl PlatformEvent for WebEvent {
    type Element = web_sys::Element;

    fn name(&self) -> String {
        self.0.type_()
    }

    fn is_targeting(&self, element: &web_sys::Element) -> bool {
        let element: &JsValue = element.as_ref();
        self.0
            .target()
            .is_some_and(|target| AsRef::<JsValue>::as_ref(&target) == element)
    }

    fn animation_name(&self) -> Option<String> {
        // Read reflectively, prefixed animation events are not all `AnimationEvent`s.
        js_sys::Reflect::get(&self.0, &JsValue::from_str("animationName"))
            .ok()
            .and_then(|name| name.as_string())
    }

    fn stop_propagation(&self) {
        self.0.stop_propagation();
    }

    fn current_element(&self) -> Option<web_sys::Element> {
        self.0
            .current_target()
            .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
    }
}

impl Web {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().context(ResourceUnavailableSnafu {
            what: "global window",
        })?;
        Ok(Web {
            state: Rc::new(WebState {
                window,
                next_id: Cell::new(1),
                timers: Default::default(),
                listeners: Default::default(),
                owned: Default::default(),
                node_keys: js_sys::WeakMap::new(),
                frame_windows: js_sys::WeakMap::new(),
            }),
        })
    }

    pub fn window(&self) -> &web_sys::Window {
        &self.state.window
    }

    pub fn document(&self) -> Option<web_sys::Document> {
        self.state.window.document()
    }

    /// The frame element a content window was linked to when it loaded.
    pub fn frame_for_window(&self, window: &web_sys::Window) -> Option<web_sys::Element> {
        self.state
            .frame_windows
            .get(window.as_ref())
            .dyn_into::<web_sys::Element>()
            .ok()
    }

    fn next_id(&self) -> u64 {
        let id = self.state.next_id.get();
        self.state.next_id.set(id + 1);
        id
    }

    fn schedule(&self, millis: u32, repeat: bool, mut f: Box<dyn FnMut()>) -> TimerId {
        let id = self.next_id();
        let state: Weak<WebState> = Rc::downgrade(&self.state);
        let closure = Closure::wrap(Box::new(move || {
            if let Some(state) = state.upgrade().filter(|_| !repeat) {
                let timer = state.timers.borrow_mut().remove(&id);
                if let Some(timer) = timer {
                    retire(timer);
                }
            }
            f();
        }) as Box<dyn FnMut()>);

        let millis = i32::try_from(millis).unwrap_or(i32::MAX);
        let window = &self.state.window;
        let handle = if repeat {
            window.set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                millis,
            )
        } else {
            window.set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                millis,
            )
        };
        match handle {
            Ok(handle) => {
                self.state.timers.borrow_mut().insert(
                    id,
                    Timer {
                        handle,
                        repeat,
                        _closure: closure,
                    },
                );
            }
            Err(err) => log::warn!("could not schedule timer: {}", js_reason(&err)),
        }
        TimerId(id)
    }

    fn event_closure(mut handler: Box<dyn FnMut(WebEvent)>) -> Closure<dyn FnMut(JsValue)> {
        Closure::wrap(Box::new(move |value: JsValue| {
            // Event listeners are only ever called with events.
            handler(WebEvent(value.unchecked_into()));
        }) as Box<dyn FnMut(JsValue)>)
    }

    fn event_target(&self, target: Target<'_, web_sys::Element>) -> web_sys::EventTarget {
        match target {
            Target::Window => AsRef::<web_sys::EventTarget>::as_ref(&self.state.window).clone(),
            Target::Element(element) => AsRef::<web_sys::EventTarget>::as_ref(element).clone(),
        }
    }
}

impl Platform for Web {
    type Element = web_sys::Element;
    type Window = web_sys::Window;
    type Event = WebEvent;
    type StyleSheet = web_sys::StyleSheet;

    fn now(&self) -> f64 {
        self.state
            .window
            .performance()
            .map(|performance| performance.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    fn epoch_millis(&self) -> f64 {
        js_sys::Date::now()
    }

    fn navigation_timing(&self) -> Option<NavigationTiming> {
        let timing = self.state.window.performance()?.timing();
        Some(NavigationTiming {
            navigation_start: timing.navigation_start(),
            connect_end: timing.connect_end(),
            dom_interactive: timing.dom_interactive(),
        })
    }

    fn set_timeout(&self, millis: u32, f: Box<dyn FnOnce()>) -> TimerId {
        let mut f = Some(f);
        self.schedule(
            millis,
            false,
            Box::new(move || {
                if let Some(f) = f.take() {
                    f();
                }
            }),
        )
    }

    fn set_interval(&self, millis: u32, f: Box<dyn FnMut()>) -> TimerId {
        self.schedule(millis, true, f)
    }

    fn clear_timer(&self, TimerId(id): TimerId) {
        let timer = self.state.timers.borrow_mut().remove(&id);
        if let Some(timer) = timer {
            if timer.repeat {
                self.state.window.clear_interval_with_handle(timer.handle);
            } else {
                self.state.window.clear_timeout_with_handle(timer.handle);
            }
            retire(timer);
        }
    }

    fn listen(
        &self,
        target: Target<'_, web_sys::Element>,
        event_name: &str,
        handler: Box<dyn FnMut(WebEvent)>,
    ) -> ListenerId {
        let id = self.next_id();
        let target = self.event_target(target);
        let closure = Self::event_closure(handler);
        match target.add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref())
        {
            Ok(()) => {
                self.state.listeners.borrow_mut().insert(
                    id,
                    Registered {
                        target,
                        name: event_name.to_string(),
                        closure,
                    },
                );
            }
            Err(err) => log::warn!("could not listen for '{event_name}': {}", js_reason(&err)),
        }
        ListenerId(id)
    }

    fn unlisten(&self, ListenerId(id): ListenerId) {
        let registered = self.state.listeners.borrow_mut().remove(&id);
        if let Some(registered) = registered {
            if let Err(err) = registered.target.remove_event_listener_with_callback(
                &registered.name,
                registered.closure.as_ref().unchecked_ref(),
            ) {
                log::warn!(
                    "could not remove '{}' listener: {}",
                    registered.name,
                    js_reason(&err)
                );
            }
            retire(registered);
        }
    }

    fn listen_owned(
        &self,
        element: &web_sys::Element,
        event_name: &str,
        handler: Box<dyn FnMut(WebEvent)>,
    ) -> ListenerId {
        let id = self.next_id();
        let closure = Self::event_closure(handler);
        match element.add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref())
        {
            Ok(()) => {
                self.state
                    .owned
                    .borrow_mut()
                    .insert(id, (event_name.to_string(), closure));
            }
            Err(err) => log::warn!("could not listen for '{event_name}': {}", js_reason(&err)),
        }
        ListenerId(id)
    }

    fn unlisten_owned(&self, element: &web_sys::Element, ListenerId(id): ListenerId) {
        let owned = self.state.owned.borrow_mut().remove(&id);
        if let Some((name, closure)) = owned {
            if let Err(err) =
                element.remove_event_listener_with_callback(&name, closure.as_ref().unchecked_ref())
            {
                log::warn!("could not remove '{name}' listener: {}", js_reason(&err));
            }
            retire(closure);
        }
    }

    fn is_document_ready(&self) -> bool {
        self.document().is_some_and(|doc| {
            let state = js_sys::Reflect::get(&doc, &JsValue::from_str("readyState"))
                .ok()
                .and_then(|state| state.as_string());
            doc.body().is_some() && state.as_deref() == Some("complete")
        })
    }

    fn body(&self) -> Option<web_sys::Element> {
        self.document()?.body().map(Into::into)
    }

    fn query(&self, selector: &str) -> Option<web_sys::Element> {
        let doc = self.document()?;
        doc.get_element_by_id(selector)
            .or_else(|| doc.query_selector(selector).ok().flatten())
    }

    fn viewport(&self) -> Dimensions {
        let window = &self.state.window;
        let read = |value: std::result::Result<JsValue, JsValue>| {
            value.ok().and_then(|v| v.as_f64()).unwrap_or_default()
        };
        Dimensions::new(read(window.inner_width()), read(window.inner_height()))
    }

    fn node_key(&self, element: &web_sys::Element) -> NodeKey {
        let keys = &self.state.node_keys;
        if let Some(key) = keys.get(element.as_ref()).as_f64() {
            return NodeKey(key as u64);
        }
        let key = self.next_id();
        keys.set(element.as_ref(), &JsValue::from_f64(key as f64));
        NodeKey(key)
    }

    fn is_attached(&self, element: &web_sys::Element) -> bool {
        element.parent_node().is_some()
    }

    fn offset_dimensions(&self, element: &web_sys::Element) -> Dimensions {
        match element.dyn_ref::<web_sys::HtmlElement>() {
            Some(html) => Dimensions::new(html.offset_width() as f64, html.offset_height() as f64),
            None => Dimensions::new(element.client_width() as f64, element.client_height() as f64),
        }
    }

    fn bounding_rect(&self, element: &web_sys::Element) -> Rect {
        let rect = element.get_bounding_client_rect();
        Rect {
            top: rect.top(),
            bottom: rect.bottom(),
            left: rect.left(),
            right: rect.right(),
            width: rect.width(),
            height: rect.height(),
        }
    }

    fn client_rects_len(&self, element: &web_sys::Element) -> usize {
        element.get_client_rects().length() as usize
    }

    fn style_sheets(&self, element: &web_sys::Element) -> Vec<web_sys::StyleSheet> {
        let Some(doc) = element.owner_document().or_else(|| self.document()) else {
            return vec![];
        };
        let sheets = doc.style_sheets();
        (0..sheets.length()).filter_map(|i| sheets.item(i)).collect()
    }

    fn keyframes_names(&self, sheet: &web_sys::StyleSheet) -> Result<Vec<String>, Error> {
        let Some(sheet) = sheet.dyn_ref::<web_sys::CssStyleSheet>() else {
            return Ok(vec![]);
        };
        let rules = sheet.css_rules().map_err(|err| {
            StyleSheetSnafu {
                reason: js_reason(&err),
            }
            .build()
        })?;
        Ok((0..rules.length())
            .filter_map(|i| rules.item(i))
            .filter(|rule| rule.type_() == web_sys::CssRule::KEYFRAMES_RULE)
            .filter_map(|rule| rule.dyn_into::<web_sys::CssKeyframesRule>().ok())
            .map(|rule| rule.name())
            .collect())
    }

    fn set_style(&self, element: &web_sys::Element, name: &str, value: &str, important: bool) {
        let Some(html) = element.dyn_ref::<web_sys::HtmlElement>() else {
            log::warn!("cannot style non-html element {element:?}");
            return;
        };
        let style = html.style();
        let result = if value.is_empty() {
            style.remove_property(name).map(|_| ())
        } else {
            let priority = if important { "important" } else { "" };
            style.set_property_with_priority(name, value, priority)
        };
        if let Err(err) = result {
            log::warn!("could not set style '{name}': {}", js_reason(&err));
        }
    }

    fn add_class(&self, element: &web_sys::Element, name: &str) {
        if let Err(err) = element.class_list().add_1(name) {
            log::warn!("could not add class '{name}': {}", js_reason(&err));
        }
    }

    fn remove_class(&self, element: &web_sys::Element, name: &str) {
        if let Err(err) = element.class_list().remove_1(name) {
            log::warn!("could not remove class '{name}': {}", js_reason(&err));
        }
    }

    fn content_window(&self, frame: &web_sys::Element) -> Option<web_sys::Window> {
        frame
            .dyn_ref::<web_sys::HtmlIFrameElement>()?
            .content_window()
    }

    fn link_frame_window(&self, frame: &web_sys::Element) {
        if let Some(window) = self.content_window(frame) {
            self.state.frame_windows.set(window.as_ref(), frame.as_ref());
        }
    }
}

thread_local! {
    static LIFECYCLE: RefCell<Option<Lifecycle<Web>>> = const { RefCell::new(None) };
}

/// The page's shared context, created on first use.
pub fn lifecycle() -> Result<Lifecycle<Web>> {
    LIFECYCLE.with(|slot| {
        if let Some(lifecycle) = slot.borrow().as_ref() {
            return Ok(lifecycle.clone());
        }
        let lifecycle = Lifecycle::new(Web::new()?);
        *slot.borrow_mut() = Some(lifecycle.clone());
        Ok(lifecycle)
    })
}

/// Replace the page's shared context with one using `config`.
///
/// Anything memoized by the previous context (document readiness, frame
/// loads) is forgotten, so this is meant to be called once at startup.
pub fn configure(config: crate::Config) -> Result<Lifecycle<Web>> {
    let lifecycle = Lifecycle::with_config(Web::new()?, config);
    LIFECYCLE.with(|slot| *slot.borrow_mut() = Some(lifecycle.clone()));
    Ok(lifecycle)
}
