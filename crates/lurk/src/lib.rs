//! Futures for waiting on DOM lifecycle.
//!
//! `lurk` turns the parts of a browser document that are only observable
//! through raw callbacks and polling into cancellable, timeout-bounded
//! futures:
//!
//! * document readiness and element presence ([`Lifecycle::document_ready`],
//!   [`Lifecycle::element_ready`])
//! * iframe load ([`Lifecycle::frame_load`], [`Lifecycle::frame_window`])
//! * element size ([`Lifecycle::on_dimensions_change`])
//! * CSS animations ([`Lifecycle::animate`]) and motion
//!   ([`Lifecycle::element_stopped_moving`])
//! * page render time ([`Lifecycle::page_render_time`])
//!
//! ## Platforms
//!
//! All DOM access goes through the [`Platform`](platform::Platform) trait. With
//! the `web` feature, [`web::Web`] drives the browser through `web-sys`. With
//! the `sim` feature, [`sim::Sim`] is an in-memory document with a virtual
//! clock, which is what the test-suite runs against.
//!
//! ## Watches
//!
//! Most trackers return a [`Watch`]. A watch settles exactly once, and tears
//! down every listener and timer it registered before doing so. Dropping an
//! unsettled watch cancels it.
//!
//! ```rust
//! use lurk::{prelude::*, sim::Sim};
//! use futures_lite::future::block_on;
//!
//! let sim = Sim::ready();
//! let lifecycle = Lifecycle::new(sim.clone());
//! let panel = sim.create_element("div");
//! panel.set_id("panel");
//! sim.body_element().append_child(&panel);
//!
//! let found = block_on(lifecycle.element_ready("panel".to_string())).unwrap();
//! assert_eq!(found, panel);
//! ```
pub mod animate;
pub mod config;
pub mod context;
pub mod deferred;
pub mod dimensions;
pub mod error;
pub mod event;
pub mod frame;
pub mod memo;
pub mod motion;
pub mod platform;
pub mod poll;
pub mod ready;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod style;
pub mod text;
pub mod timing;
pub mod url;
pub mod watch;
#[cfg(feature = "web")]
pub mod web;

pub use config::Config;
pub use context::Lifecycle;
pub use deferred::Deferred;
pub use error::{Error, Result};
pub use watch::{Cancel, Watch};

pub mod prelude {
    //! Re-exports of the types most callers need.
    pub use crate::{
        Cancel, Config, Deferred, Error, Lifecycle, Result, Watch,
        dimensions::DimensionOptions,
        platform::{Dimensions, ElementRef, Platform, PlatformEvent, Rect},
    };
}

#[cfg(test)]
pub(crate) fn init_test_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Trace)
        .try_init();
}
