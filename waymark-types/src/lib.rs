//! This crate contains the geometric primitives used by `waymark` markers: geographic points,
//! projections from geographic to planar metric coordinates, and bounding boxes in cartesian space.

pub mod cartesian;
pub mod error;
pub mod geo;

pub use cartesian::{CartesianPoint2d, Point2d, Rect};
pub use geo::{GeoPoint, GeoPoint2d, NewGeoPoint, Projection};
