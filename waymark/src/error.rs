//! Error types used by the crate.

use thiserror::Error;
use waymark_types::error::WaymarkTypesError;

use crate::marker::MarkerId;

/// Waymark error type.
#[derive(Debug, Error)]
pub enum MarkerError {
    /// The marker was removed or was never created by this manager.
    #[error("marker {0} is not managed by this manager")]
    UnknownMarker(MarkerId),
    /// Input geometry cannot be used for a marker.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(&'static str),
    /// The operation requires a marker with a built point geometry.
    #[error("marker does not have a point geometry")]
    NotAPoint,
    /// Coordinates cannot be projected into the map coordinate system.
    #[error(transparent)]
    Projection(#[from] WaymarkTypesError),
    /// Styling text cannot be parsed into a draw rule.
    #[error("invalid styling: {0}")]
    Styling(String),
    /// Draw rule refers to a style not defined in the scene.
    #[error("style '{0}' is not defined in the scene")]
    UnknownStyle(String),
    /// Style function failed to compile or to evaluate.
    #[error("style function error: {0}")]
    Script(String),
}

impl From<serde_json::Error> for MarkerError {
    fn from(value: serde_json::Error) -> Self {
        Self::Styling(value.to_string())
    }
}
