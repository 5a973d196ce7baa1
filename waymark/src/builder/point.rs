use lyon::lyon_tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, StrokeOptions, StrokeTessellator, VertexBuffers,
};
use lyon::path::Path;

use crate::builder::{BillboardVertexConstructor, MeshVertex, StyleBuilder};
use crate::marker::{Feature, Marker};
use crate::scene::Style;
use crate::style::{DrawRule, StyleParamKey};
use crate::Color;

const DEFAULT_SIZE: f64 = 16.0;

/// Style drawing point markers as screen-aligned squares.
#[derive(Debug, Clone)]
pub struct PointStyle {
    name: String,
    id: u32,
}

impl PointStyle {
    /// Creates a new style.
    pub fn new(name: impl Into<String>, id: u32) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

impl Style for PointStyle {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn create_builder(&self) -> Box<dyn StyleBuilder> {
        Box::new(PointBuilder::new(self.id))
    }
}

/// Builder of [`PointStyle`] meshes.
///
/// The mesh does not depend on the marker position, so moving a point does not require a rebuild.
pub struct PointBuilder {
    style_id: u32,
    fill_tessellator: FillTessellator,
    stroke_tessellator: StrokeTessellator,
    buffers: VertexBuffers<MeshVertex, u32>,
}

impl PointBuilder {
    /// Creates a new builder for the style with the given id.
    pub fn new(style_id: u32) -> Self {
        Self {
            style_id,
            fill_tessellator: FillTessellator::new(),
            stroke_tessellator: StrokeTessellator::new(),
            buffers: VertexBuffers::new(),
        }
    }
}

fn square_path(size: f32) -> Path {
    let half = size / 2.0;
    let mut path_builder = Path::builder();
    path_builder.begin(lyon::math::point(-half, -half));
    path_builder.line_to(lyon::math::point(half, -half));
    path_builder.line_to(lyon::math::point(half, half));
    path_builder.line_to(lyon::math::point(-half, half));
    path_builder.end(true);
    path_builder.build()
}

impl StyleBuilder for PointBuilder {
    fn setup(&mut self, _marker: &Marker, _zoom: i32) {
        self.buffers = VertexBuffers::new();
    }

    fn add_feature(&mut self, feature: &Feature, rule: &DrawRule) {
        if !matches!(feature, Feature::Point) {
            log::debug!("Point style cannot draw {:?} features", feature.kind());
            return;
        }

        let size = rule.number(StyleParamKey::Size).unwrap_or(DEFAULT_SIZE);
        if size <= 0.0 {
            return;
        }

        let path = square_path(size as f32);

        let outline_width = rule.number(StyleParamKey::OutlineWidth).unwrap_or(0.0);
        if outline_width > 0.0 {
            let vertex_constructor = BillboardVertexConstructor {
                color: rule
                    .color(StyleParamKey::OutlineColor)
                    .unwrap_or(Color::BLACK)
                    .to_f32_array(),
            };

            if let Err(err) = self.stroke_tessellator.tessellate_path(
                &path,
                &StrokeOptions::DEFAULT.with_line_width(outline_width as f32 * 2.0),
                &mut BuffersBuilder::new(&mut self.buffers, vertex_constructor),
            ) {
                log::warn!("Point outline tessellation failed: {err:?}");
                return;
            }
        }

        let fill = rule.color(StyleParamKey::Color).unwrap_or(Color::WHITE);
        if !fill.is_transparent() {
            let vertex_constructor = BillboardVertexConstructor {
                color: fill.to_f32_array(),
            };

            if let Err(err) = self.fill_tessellator.tessellate_path(
                &path,
                &FillOptions::DEFAULT,
                &mut BuffersBuilder::new(&mut self.buffers, vertex_constructor),
            ) {
                log::warn!("Point tessellation failed: {err:?}");
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

    fn build(styling: &str) -> VertexBuffers<MeshVertex, u32> {
        let mut scene = Scene::new();
        let data = DrawRuleData::parse(styling, &mut scene).unwrap();
        let mut context = StyleContext::default();
        context.init_functions(&scene);
        let rule = data.evaluate(&context).unwrap().unwrap();

        let mut builder = PointBuilder::new(1);
        builder.setup(&Marker::new(MarkerId::new(1)), 0);
        builder.add_feature(&Feature::Point, &rule);
        builder.build()
    }

    #[test]
    fn point_is_billboard_quad() {
        let buffers = build(r#"{"style": "points", "size": 10}"#);

        assert_eq!(buffers.indices.len(), 6);
        for vertex in &buffers.vertices {
            assert_eq!(vertex.position, [0.0, 0.0, 0.0]);
            assert_eq!(vertex.normal[0].abs(), 5.0);
            assert_eq!(vertex.normal[1].abs(), 5.0);
        }
    }

    #[test]
    fn outline_is_drawn_below_fill() {
        let buffers = build(
            r##"{"style": "points", "size": 10, "outline_width": 1, "outline_color": "#00FF00"}"##,
        );

        assert!(buffers.indices.len() > 6);
        assert_eq!(buffers.vertices[0].color, Color::GREEN.to_f32_array());
    }
}
