//! [`MarkerManager`] owns all markers of a map and keeps their meshes up to date.

use std::sync::Arc;
use std::time::Duration;

use ahash::HashMap;
use waymark_types::error::WaymarkTypesError;
use waymark_types::{GeoPoint, GeoPoint2d, Point2d, Projection, Rect};

use crate::builder::{MarkerMesh, StyleBuilder};
use crate::config::ManagerConfig;
use crate::error::MarkerError;
use crate::marker::{Ease, EaseType, Feature, Marker, MarkerId};
use crate::scene::Scene;
use crate::style::{DrawRuleData, StyleContext, StyleParamKey};

/// Creates, updates and removes markers, and rebuilds their meshes when geometry, styling or the zoom level
/// changes.
///
/// All operations are synchronous. A mesh is rebuilt immediately when a marker is changed, so after any call the
/// markers returned by [`MarkerManager::markers`] are ready to be rendered.
///
/// ```ignore
/// let scene = Scene::new().with_style(PolylineStyle::new("lines", 1));
/// let mut manager = MarkerManager::default();
/// manager.bind_scene(scene);
///
/// let id = manager.create_marker(r##"{"style": "lines", "color": "#FF0000", "width": 3}"##);
/// manager.set_polyline(id, &[lonlat!(10.0, 20.0), lonlat!(11.0, 21.0)])?;
/// ```
pub struct MarkerManager {
    config: ManagerConfig,
    scene: Scene,
    builders: HashMap<String, Box<dyn StyleBuilder>>,
    context: StyleContext,
    // Number of scene functions already compiled by the context.
    compiled_functions: usize,
    markers: Vec<Marker>,
    next_id: u64,
    zoom: i32,
}

impl std::fmt::Debug for MarkerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerManager")
            .field("config", &self.config)
            .field("scene", &self.scene)
            .field("markers", &self.markers)
            .field("zoom", &self.zoom)
            .finish()
    }
}

impl Default for MarkerManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl MarkerManager {
    /// Creates a manager with an empty scene.
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            zoom: config.initial_zoom,
            config,
            scene: Scene::new(),
            builders: HashMap::default(),
            context: StyleContext::default(),
            compiled_functions: 0,
            markers: Vec::new(),
            next_id: 1,
        }
    }

    /// Replaces the scene. A builder is created for every style of the scene, and all scene functions are
    /// compiled.
    ///
    /// Styling of existing markers is parsed again against the new scene, so that function references resolve to the
    /// functions of the new scene. Existing markers keep their meshes until they are rebuilt.
    pub fn bind_scene(&mut self, scene: Scene) {
        self.scene = scene;
        self.context.init_functions(&self.scene);
        self.compiled_functions = self.scene.functions().len();
        self.builders = self
            .scene
            .styles()
            .iter()
            .map(|style| (style.name().to_string(), style.create_builder()))
            .collect();

        for marker in &mut self.markers {
            let styling = parse_styling(marker, &mut self.scene);
            marker.replace_styling(styling);
        }
        self.compile_new_functions();

        log::debug!(
            "Bound scene with {} styles and {} functions",
            self.scene.styles().len(),
            self.compiled_functions
        );
    }

    /// Current scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Configuration of the manager.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Zoom level meshes are built for.
    pub fn zoom(&self) -> i32 {
        self.zoom
    }

    /// All markers in the order they were created.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Marker with the given id.
    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id() == id)
    }

    /// Creates a new marker with the given styling. The marker has no geometry, so no mesh is built until one of
    /// the `set_point`, `set_polyline` or `set_polygon` methods is called.
    ///
    /// Invalid styling does not prevent marker creation, the marker is simply never drawn.
    pub fn create_marker(&mut self, styling: &str) -> MarkerId {
        let id = MarkerId::new(self.next_id);
        self.next_id += 1;

        self.markers.push(Marker::new(id));
        self.apply_styling(self.markers.len() - 1, styling);

        id
    }

    /// Removes the marker. Returns false if there is no such marker.
    pub fn remove_marker(&mut self, id: MarkerId) -> bool {
        match self.index_of(id) {
            Ok(index) => {
                self.markers.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// Removes all markers.
    pub fn clear(&mut self) {
        self.markers.clear();
    }

    /// Replaces the styling of the marker and rebuilds it.
    ///
    /// If the styling cannot be parsed, the marker loses its styling and mesh, but this is not considered an error.
    pub fn set_styling(&mut self, id: MarkerId, styling: &str) -> Result<(), MarkerError> {
        let index = self.index_of(id)?;
        self.apply_styling(index, styling);
        Ok(())
    }

    /// Sets a point geometry of the marker.
    ///
    /// If the marker already has a built point geometry, it is only moved to the new position. Any running
    /// position animation is stopped.
    pub fn set_point(&mut self, id: MarkerId, position: GeoPoint2d) -> Result<(), MarkerError> {
        let index = self.index_of(id)?;
        let projected = self.project(&position)?;

        let min_extent = self.config.min_extent;
        let marker = &mut self.markers[index];
        marker.cancel_ease();

        if marker.is_built_point() {
            log::trace!("Moving point marker {id}");
            marker.move_to(projected, min_extent);
        } else {
            marker.set_bounds(Rect::from_point(&projected), min_extent);
            marker.set_feature(Feature::Point);
            self.build(index);
        }

        Ok(())
    }

    /// Starts moving a point marker to the new position. The animation is driven by
    /// [`MarkerManager::update_eases`].
    ///
    /// Fails with [`MarkerError::NotAPoint`] if the marker does not have a built point geometry.
    pub fn set_point_eased(
        &mut self,
        id: MarkerId,
        position: GeoPoint2d,
        duration: Duration,
        ease: EaseType,
    ) -> Result<(), MarkerError> {
        let index = self.index_of(id)?;
        if !self.markers[index].is_built_point() {
            return Err(MarkerError::NotAPoint);
        }

        let target = self.project(&position)?;
        let marker = &mut self.markers[index];
        let start = marker.origin();
        marker.set_ease(Ease::new(start, target, duration, ease));

        Ok(())
    }

    /// Advances position animations of all markers by `dt`. Returns true if any marker moved.
    pub fn update_eases(&mut self, dt: Duration) -> bool {
        let min_extent = self.config.min_extent;
        let mut moved = false;
        for marker in &mut self.markers {
            if let Some(position) = marker.advance_ease(dt) {
                marker.move_to(position, min_extent);
                moved = true;
            }
        }

        moved
    }

    /// Sets a polyline geometry of the marker. The polyline must have at least 2 points.
    ///
    /// On error the marker is not changed.
    pub fn set_polyline(&mut self, id: MarkerId, points: &[GeoPoint2d]) -> Result<(), MarkerError> {
        let index = self.index_of(id)?;
        if points.len() < 2 {
            return Err(MarkerError::InvalidGeometry(
                "polyline must have at least 2 points",
            ));
        }

        let projected = self.project_all(points)?;
        let bounds = Rect::from_points(projected.iter())
            .ok_or(MarkerError::InvalidGeometry("polyline is empty"))?;

        let marker = &mut self.markers[index];
        marker.set_bounds(bounds, self.config.min_extent);
        let line = projected.iter().map(|p| marker.to_local(p)).collect();
        marker.set_feature(Feature::Polyline(line));

        self.build(index);
        Ok(())
    }

    /// Sets a polygon geometry of the marker. The first ring is the outer boundary of the polygon, the rest of
    /// the rings are holes. There must be at least one ring, and every ring must have at least 3 points.
    ///
    /// On error the marker is not changed.
    pub fn set_polygon<R: AsRef<[GeoPoint2d]>>(
        &mut self,
        id: MarkerId,
        rings: &[R],
    ) -> Result<(), MarkerError> {
        let index = self.index_of(id)?;
        if rings.is_empty() {
            return Err(MarkerError::InvalidGeometry(
                "polygon must have at least one ring",
            ));
        }
        if rings.iter().any(|ring| ring.as_ref().len() < 3) {
            return Err(MarkerError::InvalidGeometry(
                "polygon ring must have at least 3 points",
            ));
        }

        let projected = rings
            .iter()
            .map(|ring| self.project_all(ring.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let bounds = Rect::from_points(projected.iter().flatten())
            .ok_or(MarkerError::InvalidGeometry("polygon is empty"))?;

        let marker = &mut self.markers[index];
        marker.set_bounds(bounds, self.config.min_extent);
        let polygon = projected
            .iter()
            .map(|ring| ring.iter().map(|p| marker.to_local(p)).collect())
            .collect();
        marker.set_feature(Feature::Polygon(polygon));

        self.build(index);
        Ok(())
    }

    /// Sets the zoom level and rebuilds all markers that were built for a different zoom level.
    ///
    /// Returns false if the zoom level did not change or no marker needed to be rebuilt.
    pub fn advance_zoom(&mut self, zoom: i32) -> bool {
        if zoom == self.zoom {
            return false;
        }

        self.zoom = zoom;
        let mut rebuilt = false;
        for marker in &mut self.markers {
            if marker.built_zoom() != Some(zoom) {
                rebuilt |= build_marker(marker, &mut self.builders, &mut self.context, zoom);
            }
        }

        log::debug!("Zoom changed to {zoom}, markers rebuilt: {rebuilt}");
        rebuilt
    }

    fn index_of(&self, id: MarkerId) -> Result<usize, MarkerError> {
        self.markers
            .iter()
            .position(|m| m.id() == id)
            .ok_or(MarkerError::UnknownMarker(id))
    }

    fn project(&self, point: &GeoPoint2d) -> Result<Point2d, MarkerError> {
        self.scene.projection().project(point).ok_or_else(|| {
            WaymarkTypesError::Projection {
                lon: point.lon(),
                lat: point.lat(),
            }
            .into()
        })
    }

    fn project_all(&self, points: &[GeoPoint2d]) -> Result<Vec<Point2d>, MarkerError> {
        points.iter().map(|p| self.project(p)).collect()
    }

    fn apply_styling(&mut self, index: usize, styling: &str) {
        let marker = &mut self.markers[index];
        marker.set_styling_source(styling);
        let draw_rule = parse_styling(marker, &mut self.scene);
        marker.replace_styling(draw_rule);

        self.compile_new_functions();
        self.build(index);
    }

    fn compile_new_functions(&mut self) {
        for function in self.scene.functions().iter().skip(self.compiled_functions) {
            self.context.add_function(function);
        }
        self.compiled_functions = self.scene.functions().len();
    }

    fn build(&mut self, index: usize) {
        build_marker(
            &mut self.markers[index],
            &mut self.builders,
            &mut self.context,
            self.zoom,
        );
    }
}

/// Parses the styling text of the marker against the scene. Invalid styling is logged and results in no draw rule.
fn parse_styling(marker: &Marker, scene: &mut Scene) -> Option<Arc<DrawRuleData>> {
    match DrawRuleData::parse(marker.styling_source(), scene) {
        Ok(data) => Some(Arc::new(data)),
        Err(err) => {
            log::warn!("Invalid styling of marker {}: {err}", marker.id());
            None
        }
    }
}

/// Builds the mesh of the marker for the zoom level. Returns false if the marker has no styling or geometry, and so
/// nothing was attempted.
fn build_marker(
    marker: &mut Marker,
    builders: &mut HashMap<String, Box<dyn StyleBuilder>>,
    context: &mut StyleContext,
    zoom: i32,
) -> bool {
    let (Some(styling), Some(kind)) = (
        marker.styling().cloned(),
        marker.feature().map(Feature::kind),
    ) else {
        marker.clear_mesh(None);
        return false;
    };

    let Some(builder) = builders.get_mut(styling.style_name()) else {
        let err = MarkerError::UnknownStyle(styling.style_name().to_string());
        log::warn!("Cannot build marker {}: {err}", marker.id());
        marker.clear_mesh(Some(zoom));
        return true;
    };

    context.set_keyword_zoom(zoom);
    context.set_keyword_geometry(Some(kind));

    let rule = match styling.evaluate(context) {
        Ok(Some(rule)) => rule,
        Ok(None) => {
            log::trace!("Marker {} is not drawn at zoom {zoom}", marker.id());
            marker.clear_mesh(Some(zoom));
            return true;
        }
        Err(err) => {
            log::warn!("Failed to evaluate styling of marker {}: {err}", marker.id());
            marker.clear_mesh(Some(zoom));
            return true;
        }
    };

    builder.setup(marker, zoom);
    if let Some(feature) = marker.feature() {
        builder.add_feature(feature, &rule);
    }
    let vertices = builder.build();

    log::debug!(
        "Built marker {} at zoom {zoom}: {} vertices",
        marker.id(),
        vertices.vertices.len()
    );

    let order = rule.number(StyleParamKey::Order).unwrap_or(0.0) as i32;
    let mesh = MarkerMesh::new(
        builder.style_id(),
        zoom,
        order,
        marker.origin(),
        marker.extent(),
        vertices,
    );
    marker.set_mesh(mesh);

    true
}
