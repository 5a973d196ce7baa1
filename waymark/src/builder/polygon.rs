use lyon::lyon_tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, LineJoin, StrokeOptions,
    StrokeTessellator, VertexBuffers,
};
use lyon::path::Path;

use crate::builder::{
    path_point, units_per_pixel, LocalVertexConstructor, MeshVertex, StyleBuilder,
};
use crate::marker::{Feature, Marker};
use crate::scene::Style;
use crate::style::{DrawRule, StyleParamKey};
use crate::Color;

/// Style filling polygon markers, with an optional outline.
#[derive(Debug, Clone)]
pub struct PolygonStyle {
    name: String,
    id: u32,
}

impl PolygonStyle {
    /// Creates a new style.
    pub fn new(name: impl Into<String>, id: u32) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

impl Style for PolygonStyle {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn create_builder(&self) -> Box<dyn StyleBuilder> {
        Box::new(PolygonBuilder::new(self.id))
    }
}

/// Builder of [`PolygonStyle`] meshes.
///
/// Rings are filled with the even-odd rule. Parameters: `color` (fill), `outline_color`, `outline_width` (pixels).
pub struct PolygonBuilder {
    style_id: u32,
    units_per_pixel: f32,
    fill_tessellator: FillTessellator,
    stroke_tessellator: StrokeTessellator,
    buffers: VertexBuffers<MeshVertex, u32>,
}

impl PolygonBuilder {
    /// Creates a new builder for the style with the given id.
    pub fn new(style_id: u32) -> Self {
        Self {
            style_id,
            units_per_pixel: 1.0,
            fill_tessellator: FillTessellator::new(),
            stroke_tessellator: StrokeTessellator::new(),
            buffers: VertexBuffers::new(),
        }
    }

    fn build_path(rings: &[Vec<nalgebra::Point3<f32>>], units_per_pixel: f32) -> Path {
        let mut path_builder = Path::builder();
        for ring in rings {
            let mut iterator = ring.iter();
            let Some(first) = iterator.next() else {
                continue;
            };

            path_builder.begin(path_point(first, units_per_pixel));
            for p in iterator {
                path_builder.line_to(path_point(p, units_per_pixel));
            }
            path_builder.end(true);
        }

        path_builder.build()
    }
}

impl StyleBuilder for PolygonBuilder {
    fn setup(&mut self, marker: &Marker, zoom: i32) {
        self.units_per_pixel = units_per_pixel(marker, zoom);
        self.buffers = VertexBuffers::new();
    }

    fn add_feature(&mut self, feature: &Feature, rule: &DrawRule) {
        let Feature::Polygon(rings) = feature else {
            log::debug!("Polygon style cannot draw {:?} features", feature.kind());
            return;
        };

        if !self.units_per_pixel.is_normal() {
            log::warn!("Cannot tessellate polygon at resolution {}", self.units_per_pixel);
            return;
        }

        let path = Self::build_path(rings, self.units_per_pixel);
        let color = rule.color(StyleParamKey::Color).unwrap_or(Color::WHITE);

        if !color.is_transparent() {
            let vertex_constructor = LocalVertexConstructor {
                color: color.to_f32_array(),
                units_per_pixel: self.units_per_pixel,
            };

            if let Err(err) = self.fill_tessellator.tessellate_path(
                &path,
                &FillOptions::DEFAULT.with_fill_rule(FillRule::EvenOdd),
                &mut BuffersBuilder::new(&mut self.buffers, vertex_constructor),
            ) {
                log::warn!("Polygon tessellation failed: {err:?}");
                return;
            }
        }

        let outline_width = rule.number(StyleParamKey::OutlineWidth).unwrap_or(0.0);
        if outline_width > 0.0 {
            let outline_color = rule
                .color(StyleParamKey::OutlineColor)
                .unwrap_or(Color::BLACK);
            let vertex_constructor = LocalVertexConstructor {
                color: outline_color.to_f32_array(),
                units_per_pixel: self.units_per_pixel,
            };

            if let Err(err) = self.stroke_tessellator.tessellate_path(
                &path,
                &StrokeOptions::DEFAULT
                    .with_line_width(outline_width as f32)
                    .with_line_join(LineJoin::MiterClip),
                &mut BuffersBuilder::new(&mut self.buffers, vertex_constructor),
            ) {
                log::warn!("Polygon outline tessellation failed: {err:?}");
            }
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
    use crate::marker::MarkerId;
    use crate::scene::Scene;
    use crate::style::{DrawRuleData, StyleContext};
    use nalgebra::Point3;
    use waymark_types::Rect;

    fn rule(styling: &str) -> DrawRule {
        let mut scene = Scene::new();
        let data = DrawRuleData::parse(styling, &mut scene).unwrap();
        let mut context = StyleContext::default();
        context.init_functions(&scene);
        data.evaluate(&context).unwrap().unwrap()
    }

    fn marker() -> Marker {
        let mut marker = Marker::new(MarkerId::new(1));
        marker.set_bounds(Rect::new(0.0, 0.0, 1000.0, 1000.0), 1.0);
        marker
    }

    fn square(min: f32, max: f32) -> Vec<Point3<f32>> {
        vec![
            Point3::new(min, min, 0.0),
            Point3::new(max, min, 0.0),
            Point3::new(max, max, 0.0),
            Point3::new(min, max, 0.0),
        ]
    }

    fn triangle_area(buffers: &VertexBuffers<MeshVertex, u32>) -> f32 {
        buffers
            .indices
            .chunks(3)
            .map(|t| {
                let [a, b, c] = [t[0], t[1], t[2]].map(|i| buffers.vertices[i as usize].position);
                ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])).abs() / 2.0
            })
            .sum()
    }

    #[test]
    fn hole_is_not_filled() {
        let mut builder = PolygonBuilder::new(3);
        builder.setup(&marker(), 10);
        builder.add_feature(
            &Feature::Polygon(vec![square(0.0, 1.0), square(0.25, 0.75)]),
            &rule(r##"{"style": "polygons", "color": "#FF0000"}"##),
        );

        let buffers = builder.build();
        assert!(!buffers.indices.is_empty());
        approx::assert_abs_diff_eq!(triangle_area(&buffers), 0.75, epsilon = 1e-4);
        assert!(buffers
            .vertices
            .iter()
            .all(|v| v.color == Color::RED.to_f32_array()));
    }

    #[test]
    fn outline_adds_vertices() {
        let feature = Feature::Polygon(vec![square(0.0, 1.0)]);

        let mut builder = PolygonBuilder::new(3);
        builder.setup(&marker(), 10);
        builder.add_feature(&feature, &rule(r#"{"style": "polygons"}"#));
        let fill_only = builder.build().vertices.len();

        builder.setup(&marker(), 10);
        builder.add_feature(
            &feature,
            &rule(r#"{"style": "polygons", "outline_width": 2}"#),
        );
        let with_outline = builder.build().vertices.len();

        assert!(with_outline > fill_only);
    }

    #[test]
    fn other_features_are_skipped() {
        let mut builder = PolygonBuilder::new(3);
        builder.setup(&marker(), 10);
        builder.add_feature(&Feature::Point, &rule(r#"{"style": "polygons"}"#));
        assert!(builder.build().indices.is_empty());
        assert_eq!(builder.style_id(), 3);
    }
}
