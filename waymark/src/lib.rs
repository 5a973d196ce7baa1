//! Waymark keeps map markers ready to be rendered. A marker is a point, a polyline or a polygon given in geographic
//! coordinates, together with a styling text that tells which style of the [`Scene`] draws it and with which
//! parameters.
//!
//! # Quick start
//!
//! ```no_run
//! use waymark::builder::{PointStyle, PolylineStyle};
//! use waymark::waymark_types::lonlat;
//! use waymark::{MarkerManager, Scene};
//!
//! let scene = Scene::new()
//!     .with_style(PointStyle::new("points", 1))
//!     .with_style(PolylineStyle::new("lines", 2))
//!     .with_function("route_width", "$zoom > 14 ? 6 : 3");
//!
//! let mut manager = MarkerManager::default();
//! manager.bind_scene(scene);
//!
//! let route = manager.create_marker(
//!     r##"{"style": "lines", "color": "#3366FF", "width": {"function": "route_width"}}"##,
//! );
//! manager
//!     .set_polyline(route, &[lonlat!(13.38, 52.51), lonlat!(13.41, 52.52)])
//!     .unwrap();
//!
//! // Meshes are rebuilt for the new zoom level.
//! manager.advance_zoom(15);
//! let mesh = manager.marker(route).and_then(|m| m.mesh()).unwrap();
//! ```
//!
//! # Main components
//!
//! * [`MarkerManager`] owns all the markers and is the only way to change them. Every change of a marker geometry
//!   or styling rebuilds its mesh immediately.
//! * [`Marker`] stores the marker geometry in its own local frame: coordinates are projected into the
//!   [`MapProjection`](scene::MapProjection) and normalized by the marker bounds, so that the mesh vertices can be
//!   stored as `f32` without losing precision.
//! * [`style`] parses styling text and resolves zoom-dependent parameters and style functions.
//! * [`builder`] contains styles and their builders that tessellate marker geometries with `lyon`.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod builder;
mod color;
pub mod config;
pub mod error;
mod manager;
pub mod marker;
pub mod scene;
pub mod style;

pub use color::Color;
pub use config::ManagerConfig;
pub use error::MarkerError;
pub use manager::MarkerManager;
pub use marker::{Feature, Marker, MarkerId};
pub use scene::Scene;
pub use waymark_types;
