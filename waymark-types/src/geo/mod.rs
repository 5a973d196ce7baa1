//! Points in geographic coordinates (longitude and latitude) (see [`GeoPoint`]) and their conversion into planar
//! metric coordinates (see [`Projection`]).

mod datum;
mod point;
mod projection;
mod web_mercator;

pub use datum::Datum;
pub use point::{GeoPoint, GeoPoint2d, NewGeoPoint};
pub use projection::Projection;
pub use web_mercator::WebMercator;
