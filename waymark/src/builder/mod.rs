//! Style builders tessellate marker features into meshes.
//!
//! All builders work in the marker local frame. Style parameters given in pixels (line width, point size) are
//! converted into local units for the zoom level the mesh is built for, except for points, which are billboards:
//! their vertices all sit at the local origin, and the screen-space offset of every vertex is stored in
//! [`MeshVertex::normal`].

use lyon::lyon_tessellation::{
    FillVertex, FillVertexConstructor, StrokeVertex, StrokeVertexConstructor, VertexBuffers,
};
use waymark_types::geo::Datum;
use waymark_types::Point2d;

use crate::marker::{Feature, Marker};
use crate::style::DrawRule;

mod point;
mod polygon;
mod polyline;

pub use point::{PointBuilder, PointStyle};
pub use polygon::{PolygonBuilder, PolygonStyle};
pub use polyline::{PolylineBuilder, PolylineStyle};

/// Size of a map tile in pixels, used to compute the resolution of a zoom level.
pub const TILE_SIZE: f64 = 256.0;

/// Projected meters per screen pixel at the given zoom level.
pub fn meters_per_pixel(zoom: i32) -> f64 {
    Datum::WGS84.equator_length() / (TILE_SIZE * 2f64.powi(zoom))
}

/// Builder of meshes for one style.
///
/// A builder is set up for every marker build, then given the marker feature and the resolved draw rule, and then
/// produces the mesh. The same builder is reused for all markers with the same style.
pub trait StyleBuilder {
    /// Prepares the builder to build a mesh for the marker at the given zoom level.
    fn setup(&mut self, marker: &Marker, zoom: i32);
    /// Tessellates the feature. Features of kinds the style cannot draw are skipped.
    fn add_feature(&mut self, feature: &Feature, rule: &DrawRule);
    /// Returns the tessellation of all features added since the last `setup`.
    fn build(&mut self) -> VertexBuffers<MeshVertex, u32>;
    /// Id of the style the builder belongs to.
    fn style_id(&self) -> u32;
}

/// Vertex of a marker mesh.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Position in the marker local frame.
    pub position: [f32; 3],
    /// RGBA color, each channel in `[0, 1]`.
    pub color: [f32; 4],
    /// Screen-space offset in pixels.
    pub normal: [f32; 2],
}

impl MeshVertex {
    /// Creates a new vertex.
    pub fn new(position: [f32; 3], color: [f32; 4], normal: [f32; 2]) -> Self {
        Self {
            position,
            color,
            normal,
        }
    }
}

/// Tessellated marker, ready to be uploaded to the GPU.
#[derive(Debug, Clone)]
pub struct MarkerMesh {
    style_id: u32,
    zoom: i32,
    order: i32,
    origin: Point2d,
    extent: f64,
    vertices: VertexBuffers<MeshVertex, u32>,
}

impl MarkerMesh {
    /// Creates a new mesh.
    pub fn new(
        style_id: u32,
        zoom: i32,
        order: i32,
        origin: Point2d,
        extent: f64,
        vertices: VertexBuffers<MeshVertex, u32>,
    ) -> Self {
        Self {
            style_id,
            zoom,
            order,
            origin,
            extent,
            vertices,
        }
    }

    /// Id of the style the mesh was built with.
    pub fn style_id(&self) -> u32 {
        self.style_id
    }

    /// Zoom level the mesh was built for.
    pub fn zoom(&self) -> i32 {
        self.zoom
    }

    /// Draw order of the mesh.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Origin of the local frame the vertices are given in.
    pub fn origin(&self) -> Point2d {
        self.origin
    }

    /// Extent of the local frame the vertices are given in.
    pub fn extent(&self) -> f64 {
        self.extent
    }

    /// Vertices and indices of the mesh.
    pub fn vertices(&self) -> &VertexBuffers<MeshVertex, u32> {
        &self.vertices
    }

    /// Returns true if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.vertices.indices.is_empty()
    }

    pub(crate) fn relocate(&mut self, origin: Point2d, extent: f64) {
        self.origin = origin;
        self.extent = extent;
    }

    /// Converts a local frame position of a vertex into projected coordinates.
    pub fn to_projected(&self, position: [f32; 3]) -> Point2d {
        Point2d::new(
            self.origin.x + position[0] as f64 * self.extent,
            self.origin.y + position[1] as f64 * self.extent,
        )
    }
}

/// Tessellation path coordinates are in pixels. The constructor scales them back into the local frame.
struct LocalVertexConstructor {
    color: [f32; 4],
    units_per_pixel: f32,
}

impl LocalVertexConstructor {
    fn create_vertex(&self, position: lyon::math::Point) -> MeshVertex {
        MeshVertex::new(
            [
                position.x * self.units_per_pixel,
                position.y * self.units_per_pixel,
                0.0,
            ],
            self.color,
            [0.0, 0.0],
        )
    }
}

impl FillVertexConstructor<MeshVertex> for LocalVertexConstructor {
    fn new_vertex(&mut self, vertex: FillVertex) -> MeshVertex {
        self.create_vertex(vertex.position())
    }
}

impl StrokeVertexConstructor<MeshVertex> for LocalVertexConstructor {
    fn new_vertex(&mut self, vertex: StrokeVertex) -> MeshVertex {
        self.create_vertex(vertex.position())
    }
}

/// All vertices are placed at the local origin, tessellated coordinates become the screen offset.
struct BillboardVertexConstructor {
    color: [f32; 4],
}

impl BillboardVertexConstructor {
    fn create_vertex(&self, offset: lyon::math::Point) -> MeshVertex {
        MeshVertex::new([0.0, 0.0, 0.0], self.color, [offset.x, offset.y])
    }
}

impl FillVertexConstructor<MeshVertex> for BillboardVertexConstructor {
    fn new_vertex(&mut self, vertex: FillVertex) -> MeshVertex {
        self.create_vertex(vertex.position())
    }
}

impl StrokeVertexConstructor<MeshVertex> for BillboardVertexConstructor {
    fn new_vertex(&mut self, vertex: StrokeVertex) -> MeshVertex {
        self.create_vertex(vertex.position())
    }
}

/// Local frame units per pixel for the marker at the zoom level.
fn units_per_pixel(marker: &Marker, zoom: i32) -> f32 {
    (meters_per_pixel(zoom) / marker.extent()) as f32
}

fn path_point(position: &nalgebra::Point3<f32>, units_per_pixel: f32) -> lyon::math::Point {
    lyon::math::point(position.x / units_per_pixel, position.y / units_per_pixel)
}
