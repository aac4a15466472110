//! Timing configuration.
use serde::{Deserialize, Serialize};

/// Poll intervals and timeouts used by the trackers, in milliseconds.
///
/// Deserializes with every missing field at its default, so a partial JSON
/// object such as `{"animation_timeout_ms": 300}` is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How often `element_ready` looks for its element.
    pub element_poll_ms: u32,
    /// How often `document_ready` re-checks the document.
    pub document_poll_ms: u32,
    /// How long `animate` waits for the animation to start.
    pub animation_start_timeout_ms: u32,
    /// Default fallback for an animation whose end event never fires.
    pub animation_timeout_ms: u32,
    pub motion_poll_ms: u32,
    pub motion_timeout_ms: u32,
    /// How often `watch_element_for_close` checks for detachment.
    pub close_poll_ms: u32,
    /// Default poll interval of `on_dimensions_change`.
    pub dimension_delay_ms: u32,
    /// The dimension debounce window, as a multiple of its poll interval.
    pub dimension_debounce_factor: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            element_poll_ms: 10,
            document_poll_ms: 10,
            animation_start_timeout_ms: 200,
            animation_timeout_ms: 1000,
            motion_poll_ms: 50,
            motion_timeout_ms: 5000,
            close_poll_ms: 50,
            dimension_delay_ms: 50,
            dimension_debounce_factor: 4,
        }
    }
}

impl Config {
    pub fn with_animation_timeout_ms(mut self, millis: u32) -> Self {
        self.animation_timeout_ms = millis;
        self
    }

    pub fn with_motion_timeout_ms(mut self, millis: u32) -> Self {
        self.motion_timeout_ms = millis;
        self
    }

    pub fn with_element_poll_ms(mut self, millis: u32) -> Self {
        self.element_poll_ms = millis;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"animation_timeout_ms": 300, "element_poll_ms": 25}"#).unwrap();
        assert_eq!(
            config,
            Config::default()
                .with_animation_timeout_ms(300)
                .with_element_poll_ms(25)
        );
        assert_eq!(config.motion_timeout_ms, 5000);

        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn round_trips_through_json() {
        let config = Config::default().with_motion_timeout_ms(750);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<Config>(&json).unwrap(), config);
    }
}
