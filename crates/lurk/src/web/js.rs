//! JavaScript bindings.
//!
//! Every export returns a `Promise`. Rejections are JS `Error`s whose `name`
//! is the [`Error::kind`] of the failure, eg `"TimeoutError"`.
//!
//! ```js
//! import init, * as lurk from "./lurk.js";
//!
//! await init();
//! lurk.init("debug", { animation_timeout_ms: 800 });
//! const frame = await lurk.frameLoad(document.getElementById("checkout"));
//! await lurk.animate(frame, "slide-in");
//! ```
use js_sys::Promise;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use super::{Web, configure, lifecycle};
use crate::{
    Config, Error, Lifecycle, animate::RegisterCleanup, dimensions::DimensionOverrides,
    platform::ElementRef, watch::Cancel,
};

impl From<Error> for JsValue {
    fn from(err: Error) -> Self {
        let js_err = js_sys::Error::new(&err.to_string());
        js_err.set_name(err.kind());
        js_err.into()
    }
}

fn js_error(message: &str) -> JsValue {
    js_sys::Error::new(message).into()
}

/// Deserialize a plain JS object, or produce the default for `undefined`
/// and `null`.
fn from_js<T: DeserializeOwned + Default>(value: &JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    let json = js_sys::JSON::stringify(value)?
        .as_string()
        .ok_or_else(|| js_error("options are not serializable"))?;
    serde_json::from_str(&json).map_err(|err| js_error(&format!("invalid options: {err}")))
}

fn element_ref(identifier: JsValue) -> Result<ElementRef<web_sys::Element>, JsValue> {
    if let Some(selector) = identifier.as_string() {
        return Ok(ElementRef::Selector(selector));
    }
    identifier
        .dyn_into::<web_sys::Element>()
        .map(ElementRef::Element)
        .map_err(|_| js_error("expected an element or a selector"))
}

fn with_lifecycle<F>(f: impl FnOnce(Lifecycle<Web>) -> Result<F, JsValue>) -> Promise
where
    F: std::future::Future<Output = Result<JsValue, JsValue>> + 'static,
{
    let future = lifecycle().map_err(JsValue::from).and_then(f);
    future_to_promise(async move { future?.await })
}

/// Install the console logger and panic hook, and configure the page's
/// context from an optional config object.
#[wasm_bindgen]
pub fn init(level: Option<String>, config: JsValue) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let level = level
        .as_deref()
        .unwrap_or("info")
        .parse::<log::Level>()
        .map_err(|err| js_error(&format!("invalid log level: {err}")))?;
    if console_log::init_with_level(level).is_err() {
        log::debug!("logger was already installed");
    }
    let config: Config = from_js(&config)?;
    log::info!("lurk initialised with {config:?}");
    configure(config)?;
    Ok(())
}

#[wasm_bindgen(js_name = waitForDocumentReady)]
pub fn wait_for_document_ready() -> Promise {
    with_lifecycle(|lifecycle| {
        let ready = lifecycle.document_ready();
        Ok(async move {
            ready.await;
            Ok::<_, JsValue>(JsValue::UNDEFINED)
        })
    })
}

#[wasm_bindgen(js_name = elementReady)]
pub fn element_ready(identifier: JsValue) -> Promise {
    with_lifecycle(|lifecycle| {
        let watch = lifecycle.element_ready(element_ref(identifier)?);
        Ok(async move { Ok::<_, JsValue>(JsValue::from(watch.await?)) })
    })
}

#[wasm_bindgen(js_name = frameLoad)]
pub fn frame_load(frame: web_sys::Element) -> Promise {
    with_lifecycle(|lifecycle| {
        let load = lifecycle.frame_load(&frame);
        Ok(async move { Ok::<_, JsValue>(JsValue::from(load.await?)) })
    })
}

#[wasm_bindgen(js_name = frameWindow)]
pub fn frame_window(frame: web_sys::Element) -> Promise {
    with_lifecycle(|lifecycle| {
        let window = lifecycle.frame_window(&frame);
        Ok(async move { Ok::<_, JsValue>(JsValue::from(window.await?)) })
    })
}

/// `options` is a partial `{ width, height, delay, threshold }`; missing
/// fields come from the configured defaults. Resolves with `{ width, height }`.
#[wasm_bindgen(js_name = onDimensionsChange)]
pub fn on_dimensions_change(element: web_sys::Element, options: JsValue) -> Promise {
    with_lifecycle(|lifecycle| {
        let overrides: DimensionOverrides = from_js(&options)?;
        let options = overrides.apply(lifecycle.dimension_options());
        let watch = lifecycle.on_dimensions_change(&element, options);
        Ok(async move {
            let dimensions = watch.await?;
            let json = serde_json::to_string(&dimensions)
                .map_err(|err| js_error(&err.to_string()))?;
            js_sys::JSON::parse(&json)
        })
    })
}

/// `registerCleanup`, if given, is called with a function that cancels the
/// animation.
#[wasm_bindgen]
pub fn animate(
    element: JsValue,
    name: String,
    register_cleanup: Option<js_sys::Function>,
    timeout_ms: Option<u32>,
) -> Promise {
    with_lifecycle(|lifecycle| {
        let register: Option<RegisterCleanup> = register_cleanup.map(|register| {
            Box::new(move |cancel: Cancel| {
                let cancel = Closure::<dyn Fn()>::new(move || cancel.cancel()).into_js_value();
                if let Err(err) = register.call1(&JsValue::NULL, &cancel) {
                    log::warn!("registerCleanup threw: {err:?}");
                }
            }) as RegisterCleanup
        });
        let timeout_ms = timeout_ms.unwrap_or(lifecycle.config().animation_timeout_ms);
        let watch = lifecycle.animate_with(element_ref(element)?, &name, register, timeout_ms);
        Ok(async move {
            watch.await?;
            Ok::<_, JsValue>(JsValue::UNDEFINED)
        })
    })
}

/// Resolves with the render time in milliseconds, or `undefined`.
#[wasm_bindgen(js_name = getPageRenderTime)]
pub fn get_page_render_time() -> Promise {
    with_lifecycle(|lifecycle| {
        let render_time = lifecycle.page_render_time();
        Ok(async move {
            Ok::<_, JsValue>(render_time.await.map_or(JsValue::UNDEFINED, JsValue::from_f64))
        })
    })
}

#[wasm_bindgen(js_name = elementStoppedMoving)]
pub fn element_stopped_moving(element: JsValue, timeout_ms: Option<u32>) -> Promise {
    with_lifecycle(|lifecycle| {
        let timeout_ms = timeout_ms.unwrap_or(lifecycle.config().motion_timeout_ms);
        let watch = lifecycle.element_stopped_moving(element_ref(element)?, timeout_ms);
        Ok(async move {
            watch.await?;
            Ok::<_, JsValue>(JsValue::UNDEFINED)
        })
    })
}
