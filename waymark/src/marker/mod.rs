//! [`Marker`] is a single map overlay: a point, a polyline or a polygon with its own styling and mesh.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use nalgebra::Point3;
use waymark_types::{Point2d, Rect};

use crate::builder::MarkerMesh;
use crate::style::DrawRuleData;

mod ease;

pub use ease::{Ease, EaseType};

/// Identifier of a marker, unique for the lifetime of the [`MarkerManager`](crate::MarkerManager) that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(u64);

impl MarkerId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

impl Display for MarkerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of marker geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// Single point.
    Point,
    /// Polyline.
    Line,
    /// Polygon with optional holes.
    Polygon,
}

impl GeometryKind {
    /// Name of the kind, as seen by style functions through the `$geometry` keyword.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Line => "line",
            Self::Polygon => "polygon",
        }
    }
}

/// Marker geometry in the marker local frame.
///
/// A local frame position is `(projected - origin) / extent`, so coordinates of a polyline or polygon are roughly in
/// `[0, 1]`. A point is always at the origin of its frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    /// Point at the marker origin.
    Point,
    /// Line through the points.
    Polyline(Vec<Point3<f32>>),
    /// Polygon. The first ring is the outer boundary, the rest are holes.
    Polygon(Vec<Vec<Point3<f32>>>),
}

impl Feature {
    /// Kind of the geometry.
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Point => GeometryKind::Point,
            Self::Polyline(_) => GeometryKind::Line,
            Self::Polygon(_) => GeometryKind::Polygon,
        }
    }
}

/// A map marker.
///
/// Markers are owned and mutated by a [`MarkerManager`](crate::MarkerManager), users get read access to them.
#[derive(Debug, Clone)]
pub struct Marker {
    id: MarkerId,
    styling_source: String,
    styling: Option<Arc<DrawRuleData>>,
    feature: Option<Feature>,
    bounds: Rect,
    origin: Point2d,
    extent: f64,
    mesh: Option<MarkerMesh>,
    built_zoom: Option<i32>,
    ease: Option<Ease>,
}

impl Marker {
    pub(crate) fn new(id: MarkerId) -> Self {
        Self {
            id,
            styling_source: String::new(),
            styling: None,
            feature: None,
            bounds: Rect::new(0.0, 0.0, 0.0, 0.0),
            origin: Point2d::origin(),
            extent: 1.0,
            mesh: None,
            built_zoom: None,
            ease: None,
        }
    }

    /// Id of the marker.
    pub fn id(&self) -> MarkerId {
        self.id
    }

    /// Styling text the marker was created or last restyled with.
    pub fn styling_source(&self) -> &str {
        &self.styling_source
    }

    /// Parsed styling of the marker.
    pub fn styling(&self) -> Option<&Arc<DrawRuleData>> {
        self.styling.as_ref()
    }

    /// Geometry of the marker in the local frame.
    pub fn feature(&self) -> Option<&Feature> {
        self.feature.as_ref()
    }

    /// Bounding rectangle of the marker in projected coordinates.
    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    /// Origin of the local frame: south-west corner of the bounds.
    pub fn origin(&self) -> Point2d {
        self.origin
    }

    /// Size of the local frame in projected meters.
    pub fn extent(&self) -> f64 {
        self.extent
    }

    /// Built mesh.
    pub fn mesh(&self) -> Option<&MarkerMesh> {
        self.mesh.as_ref()
    }

    /// Zoom level the marker was last built for, or `None` if it was never built.
    pub fn built_zoom(&self) -> Option<i32> {
        self.built_zoom
    }

    /// Running position animation.
    pub fn ease(&self) -> Option<&Ease> {
        self.ease.as_ref()
    }

    /// Returns true if the marker has a point geometry with a built mesh.
    pub fn is_built_point(&self) -> bool {
        self.mesh.is_some() && matches!(self.feature, Some(Feature::Point))
    }

    /// Converts a projected point into the local frame of the marker.
    pub fn to_local(&self, projected: &Point2d) -> Point3<f32> {
        let scale = 1.0 / self.extent;
        Point3::new(
            ((projected.x - self.origin.x) * scale) as f32,
            ((projected.y - self.origin.y) * scale) as f32,
            0.0,
        )
    }

    pub(crate) fn set_bounds(&mut self, bounds: Rect, min_extent: f64) {
        self.origin = bounds.min_corner();
        self.extent = bounds.width().max(bounds.height()).max(min_extent);
        self.bounds = bounds;
    }

    /// Moves a point marker without rebuilding its mesh.
    pub(crate) fn move_to(&mut self, position: Point2d, min_extent: f64) {
        self.set_bounds(Rect::from_point(&position), min_extent);
        if let Some(mesh) = &mut self.mesh {
            mesh.relocate(self.origin, self.extent);
        }
    }

    pub(crate) fn set_feature(&mut self, feature: Feature) {
        if feature.kind() != GeometryKind::Point {
            self.ease = None;
        }

        self.feature = Some(feature);
    }

    pub(crate) fn set_styling_source(&mut self, source: &str) {
        self.styling_source = source.to_string();
    }

    pub(crate) fn replace_styling(&mut self, styling: Option<Arc<DrawRuleData>>) {
        self.styling = styling;
    }

    pub(crate) fn set_mesh(&mut self, mesh: MarkerMesh) {
        self.built_zoom = Some(mesh.zoom());
        self.mesh = Some(mesh);
    }

    /// Drops the mesh. `built_zoom` is kept so that the marker is not rebuilt until the zoom level changes.
    pub(crate) fn clear_mesh(&mut self, zoom: Option<i32>) {
        self.mesh = None;
        self.built_zoom = zoom;
    }

    pub(crate) fn set_ease(&mut self, ease: Ease) {
        self.ease = Some(ease);
    }

    pub(crate) fn cancel_ease(&mut self) {
        self.ease = None;
    }

    /// Advances the position animation. Returns the new position, or `None` if there is no animation.
    pub(crate) fn advance_ease(&mut self, dt: std::time::Duration) -> Option<Point2d> {
        let ease = self.ease.as_mut()?;
        let position = ease.advance(dt);
        if ease.is_finished() {
            self.ease = None;
        }

        Some(position)
    }
}
