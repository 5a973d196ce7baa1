use lyon::lyon_tessellation::{
    BuffersBuilder, LineCap, LineJoin, StrokeOptions, StrokeTessellator, VertexBuffers,
};
use lyon::path::Path;

use crate::builder::{
    path_point, units_per_pixel, LocalVertexConstructor, MeshVertex, StyleBuilder,
};
use crate::marker::{Feature, Marker};
use crate::scene::Style;
use crate::style::{DrawRule, StyleParamKey};
use crate::Color;

const DEFAULT_WIDTH: f64 = 1.0;

/// Style stroking polyline markers.
#[derive(Debug, Clone)]
pub struct PolylineStyle {
    name: String,
    id: u32,
}

impl PolylineStyle {
    /// Creates a new style.
    pub fn new(name: impl Into<String>, id: u32) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

impl Style for PolylineStyle {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn create_builder(&self) -> Box<dyn StyleBuilder> {
        Box::new(PolylineBuilder::new(self.id))
    }
}

/// Builder of [`PolylineStyle`] meshes.
///
/// The line is tessellated with the `width` given in pixels, so the mesh is only valid for the zoom level it was
/// built for.
pub struct PolylineBuilder {
    style_id: u32,
    units_per_pixel: f32,
    tessellator: StrokeTessellator,
    buffers: VertexBuffers<MeshVertex, u32>,
}

impl PolylineBuilder {
    /// Creates a new builder for the style with the given id.
    pub fn new(style_id: u32) -> Self {
        Self {
            style_id,
            units_per_pixel: 1.0,
            tessellator: StrokeTessellator::new(),
            buffers: VertexBuffers::new(),
        }
    }
}

impl StyleBuilder for PolylineBuilder {
    fn setup(&mut self, marker: &Marker, zoom: i32) {
        self.units_per_pixel = units_per_pixel(marker, zoom);
        self.buffers = VertexBuffers::new();
    }

    fn add_feature(&mut self, feature: &Feature, rule: &DrawRule) {
        let Feature::Polyline(points) = feature else {
            log::debug!("Line style cannot draw {:?} features", feature.kind());
            return;
        };

        if !self.units_per_pixel.is_normal() {
            log::warn!("Cannot tessellate line at resolution {}", self.units_per_pixel);
            return;
        }

        let width = rule.number(StyleParamKey::Width).unwrap_or(DEFAULT_WIDTH);
        if width <= 0.0 {
            return;
        }

        let mut iterator = points.iter();
        let Some(first) = iterator.next() else {
            return;
        };

        let mut path_builder = Path::builder();
        path_builder.begin(path_point(first, self.units_per_pixel));
        for p in iterator {
            path_builder.line_to(path_point(p, self.units_per_pixel));
        }
        path_builder.end(false);
        let path = path_builder.build();

        let vertex_constructor = LocalVertexConstructor {
            color: rule
                .color(StyleParamKey::Color)
                .unwrap_or(Color::WHITE)
                .to_f32_array(),
            units_per_pixel: self.units_per_pixel,
        };

        if let Err(err) = self.tessellator.tessellate_path(
            &path,
            &StrokeOptions::DEFAULT
                .with_line_width(width as f32)
                .with_line_cap(LineCap::Butt)
                .with_line_join(LineJoin::MiterClip)
                .with_tolerance(0.1),
            &mut BuffersBuilder::new(&mut self.buffers, vertex_constructor),
        ) {
            log::warn!("Line tessellation failed: {err:?}");
        }
    }

    fn build(&mut self) -> VertexBuffers<MeshVertex, u32> {
        std::mem::replace(&mut self.buffers, VertexBuffers::new())
    }

    fn style_id(&self) -> u32 {
        self.style_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::meters_per_pixel;
    use crate::marker::MarkerId;
    use crate::scene::Scene;
    use crate::style::{DrawRuleData, StyleContext};
    use approx::assert_abs_diff_eq;
    use nalgebra::Point3;
    use waymark_types::Rect;

    fn build(zoom: i32, width: f64) -> VertexBuffers<MeshVertex, u32> {
        let mut scene = Scene::new();
        let data = DrawRuleData::parse(
            &format!(r#"{{"style": "lines", "width": {width}}}"#),
            &mut scene,
        )
        .unwrap();
        let mut context = StyleContext::default();
        context.init_functions(&scene);
        context.set_keyword_zoom(zoom);
        let rule = data.evaluate(&context).unwrap().unwrap();

        let mut marker = Marker::new(MarkerId::new(1));
        marker.set_bounds(Rect::new(0.0, 0.0, 10_000.0, 10_000.0), 1.0);

        let mut builder = PolylineBuilder::new(2);
        builder.setup(&marker, zoom);
        builder.add_feature(
            &Feature::Polyline(vec![Point3::new(0.0, 0.5, 0.0), Point3::new(1.0, 0.5, 0.0)]),
            &rule,
        );
        builder.build()
    }

    fn thickness(buffers: &VertexBuffers<MeshVertex, u32>) -> f32 {
        let (min, max) = buffers
            .vertices
            .iter()
            .fold((f32::MAX, f32::MIN), |(min, max), v| {
                (min.min(v.position[1]), max.max(v.position[1]))
            });
        max - min
    }

    #[test]
    fn width_is_converted_to_local_units() {
        let buffers = build(12, 4.0);
        assert!(!buffers.indices.is_empty());

        let expected = (4.0 * meters_per_pixel(12) / 10_000.0) as f32;
        assert_abs_diff_eq!(thickness(&buffers), expected, epsilon = 1e-5);
    }

    #[test]
    fn higher_zoom_gives_thinner_line() {
        let low = thickness(&build(10, 4.0));
        let high = thickness(&build(11, 4.0));
        assert_abs_diff_eq!(low / high, 2.0, epsilon = 1e-3);
    }

    #[test]
    fn zero_width_is_not_drawn() {
        assert!(build(10, 0.0).indices.is_empty());
    }
}
