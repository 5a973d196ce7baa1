//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error, PartialEq)]
pub enum WaymarkTypesError {
    /// A point cannot be represented in the target coordinate system.
    #[error("point ({lon}, {lat}) cannot be projected")]
    Projection {
        /// Longitude of the point in degrees.
        lon: f64,
        /// Latitude of the point in degrees.
        lat: f64,
    },
}
