#![cfg(feature = "sim")]
//! A page's worth of lifecycle, driven through the public api.
use futures_lite::future::{block_on, poll_once};
use lurk::{
    prelude::*,
    sim::{Sim, SimEvent, SimStyleSheet, SimWindow},
};

#[test]
fn checkout_frame_slides_in_once_loaded() {
    let _ = env_logger::builder().is_test(true).try_init();
    let sim = Sim::new();
    sim.add_style_sheet(SimStyleSheet::with_keyframes(&["slide-in", "slide-out"]));
    let lifecycle = Lifecycle::with_config(
        sim.clone(),
        Config::default().with_animation_timeout_ms(400),
    );

    let mut ready = lifecycle.document_ready();
    let mut frame_ready = lifecycle.element_ready(ElementRef::selector("#checkout"));
    assert!(block_on(poll_once(&mut frame_ready)).is_none());

    // The frame is inserted while the page is still loading.
    sim.advance(25);
    let frame = sim.create_element("iframe");
    frame.set_id("checkout");
    sim.body_element().append_child(&frame);
    sim.advance(10);
    assert_eq!(block_on(frame_ready), Ok(frame.clone()));
    assert!(block_on(poll_once(&mut ready)).is_none());

    let load = lifecycle.frame_load(&frame);
    frame.set_content_window(Some(SimWindow::new("checkout")));
    sim.dispatch(&frame, SimEvent::new("load"));
    assert_eq!(block_on(load), Ok(frame.clone()));
    assert_eq!(
        block_on(lifecycle.frame_window(&frame)),
        Ok(SimWindow::new("checkout"))
    );

    sim.finish_loading();
    block_on(ready);

    lurk::style::hide_element(&sim, &frame);
    let shown = lifecycle.show_and_animate(&frame, "slide-in", None);
    assert_eq!(frame.style("display"), None);
    sim.dispatch(&frame, SimEvent::animation("animationstart", "slide-in"));
    sim.dispatch(&frame, SimEvent::animation("animationend", "slide-in"));
    assert_eq!(block_on(shown), Ok(()));

    let hidden = lifecycle.animate_and_hide(&frame, "slide-out", None);
    sim.dispatch(&frame, SimEvent::animation("animationstart", "slide-out"));
    // No end event: the configured timeout ends the animation.
    sim.advance(400);
    assert_eq!(block_on(hidden), Ok(()));
    assert_eq!(frame.style("display").as_deref(), Some("none"));

    assert_eq!(sim.active_timers(), 0);
    assert_eq!(sim.listener_count(), 0);
}

#[test]
fn errors_surface_through_watches() {
    let sim = Sim::ready();
    let lifecycle = Lifecycle::new(sim.clone());

    let missing = block_on(lifecycle.element_ready(ElementRef::selector("#gone")));
    assert_eq!(
        missing.as_ref().map_err(Error::kind),
        Err("NotFoundError")
    );

    let el = sim.create_element("div");
    sim.body_element().append_child(&el);
    let moving = lifecycle.element_stopped_moving(&el, 200);
    // Keep the element moving on every poll.
    for step in 1..=4 {
        el.set_rect(Rect::at(step as f64 * 10.0, 0.0, 10.0, 10.0));
        sim.advance(50);
    }
    let err = block_on(moving).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Timed out waiting for element to stop animating after 200ms"
    );
    assert_eq!(sim.active_timers(), 0);
}

#[test]
fn dropping_a_watch_tears_it_down() {
    let sim = Sim::new();
    let lifecycle = Lifecycle::new(sim.clone());
    let el = sim.create_element("div");
    sim.body_element().append_child(&el);
    sim.add_style_sheet(SimStyleSheet::with_keyframes(&["pulse"]));

    let animation = lifecycle.animate(&el, "pulse");
    let element = lifecycle.element_ready(ElementRef::selector("#later"));
    assert!(sim.active_timers() > 0);
    assert!(sim.listener_count() > 0);
    drop(animation);
    drop(element);
    assert_eq!(sim.active_timers(), 0);
    assert_eq!(sim.listener_count(), 0);
    assert_eq!(el.style("animation-name"), None);
}
