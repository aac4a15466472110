//! Errors.
use snafu::Snafu;

/// Failures surfaced by lifecycle watches.
///
/// `Clone` because a single settled outcome is handed to every awaiter of a
/// shared completion.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The element never appeared before the document became fully ready.
    #[snafu(display("Document is ready and element {name} does not exist"))]
    NotFound { name: String },

    #[snafu(display("Timed out waiting for {what} after {millis}ms"))]
    Timeout { what: String, millis: u32 },

    /// An end event reported a different animation than the one requested.
    #[snafu(display("Expected animation name to be {expected}, found {found}"))]
    AnimationMismatch { expected: String, found: String },

    #[snafu(display("Could not find {what}"))]
    ResourceUnavailable { what: String },

    /// The frame fired an error event and has no content window.
    #[snafu(display("Frame failed to load: {reason}"))]
    FrameLoad { reason: String },

    #[snafu(display("Could not read stylesheet rules: {reason}"))]
    StyleSheet { reason: String },

    #[snafu(display("Watch was cancelled before it settled"))]
    Cancelled,
}

impl Error {
    /// A short, stable name for the kind of error.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "NotFoundError",
            Error::Timeout { .. } => "TimeoutError",
            Error::AnimationMismatch { .. } => "AnimationMismatchError",
            Error::ResourceUnavailable { .. } => "ResourceUnavailableError",
            Error::FrameLoad { .. } => "FrameLoadError",
            Error::StyleSheet { .. } => "StyleSheetError",
            Error::Cancelled => "CancelledError",
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_and_kind() {
        let err = NotFoundSnafu { name: "#missing" }.build();
        assert_eq!(
            err.to_string(),
            "Document is ready and element #missing does not exist"
        );
        assert_eq!(err.kind(), "NotFoundError");

        let err = AnimationMismatchSnafu {
            expected: "spin",
            found: "fade",
        }
        .build();
        assert_eq!(
            err.to_string(),
            "Expected animation name to be spin, found fade"
        );
        assert_eq!(CancelledSnafu.build().kind(), "CancelledError");
    }
}
