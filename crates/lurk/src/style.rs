//! Inline style and class helpers.
use crate::platform::Platform;

const VENDOR_PREFIXES: [&str; 4] = ["-webkit-", "-moz-", "-ms-", "-o-"];

/// Set a property and each of its vendor-prefixed variants to the same
/// value. An empty value removes them all.
pub fn set_vendor_css<P: Platform>(platform: &P, element: &P::Element, name: &str, value: &str) {
    platform.set_style(element, name, value, false);
    for prefix in VENDOR_PREFIXES {
        platform.set_style(element, &format!("{prefix}{name}"), value, false);
    }
}

/// Remove any inline `display` override.
pub fn show_element<P: Platform>(platform: &P, element: &P::Element) {
    platform.set_style(element, "display", "", false);
}

pub fn hide_element<P: Platform>(platform: &P, element: &P::Element) {
    platform.set_style(element, "display", "none", true);
}

/// Remove any inline `visibility` override.
pub fn make_element_visible<P: Platform>(platform: &P, element: &P::Element) {
    platform.set_style(element, "visibility", "", false);
}

pub fn make_element_invisible<P: Platform>(platform: &P, element: &P::Element) {
    platform.set_style(element, "visibility", "hidden", true);
}

pub fn add_class<P: Platform>(platform: &P, element: &P::Element, name: &str) {
    log::trace!("adding class '{name}' to {element:?}");
    platform.add_class(element, name);
}

pub fn remove_class<P: Platform>(platform: &P, element: &P::Element, name: &str) {
    log::trace!("removing class '{name}' from {element:?}");
    platform.remove_class(element, name);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::Sim;

    #[test]
    fn vendor_css_sets_and_clears_every_variant() {
        let sim = Sim::new();
        let el = sim.create_element("div");
        set_vendor_css(&sim, &el, "animation-name", "spin");
        for name in [
            "animation-name",
            "-webkit-animation-name",
            "-moz-animation-name",
            "-ms-animation-name",
            "-o-animation-name",
        ] {
            assert_eq!(el.style(name).as_deref(), Some("spin"), "{name}");
        }
        set_vendor_css(&sim, &el, "animation-name", "");
        assert_eq!(el.style("-o-animation-name"), None);
    }

    #[test]
    fn hide_and_show() {
        let sim = Sim::new();
        let el = sim.create_element("div");
        hide_element(&sim, &el);
        assert_eq!(el.style("display").as_deref(), Some("none"));
        assert!(el.style_is_important("display"));
        show_element(&sim, &el);
        assert_eq!(el.style("display"), None);

        make_element_invisible(&sim, &el);
        assert_eq!(el.style("visibility").as_deref(), Some("hidden"));
        make_element_visible(&sim, &el);
        assert_eq!(el.style("visibility"), None);
    }

    #[test]
    fn classes() {
        let sim = Sim::new();
        let el = sim.create_element("div");
        add_class(&sim, &el, "open");
        add_class(&sim, &el, "open");
        assert!(el.has_class("open"));
        remove_class(&sim, &el, "open");
        assert!(!el.has_class("open"));
    }
}
