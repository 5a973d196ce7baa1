//! [`Scene`] is the set of styles, style functions and the map projection markers are built with.

use std::fmt::Debug;
use std::sync::Arc;

use waymark_types::geo::WebMercator;
use waymark_types::{GeoPoint2d, Point2d};

use crate::builder::StyleBuilder;

/// Projection used to convert marker coordinates into the map coordinate system.
pub type MapProjection = WebMercator<GeoPoint2d, Point2d>;

/// A style defines a way to tessellate marker geometries.
///
/// Every style of a scene gets its own [`StyleBuilder`] instance in a
/// [`MarkerManager`](crate::MarkerManager), which is shared by all markers using the style.
pub trait Style: Debug {
    /// Unique name of the style. Draw rules refer to styles by this name.
    fn name(&self) -> &str;
    /// Numeric id of the style. Built meshes are tagged with this id.
    fn id(&self) -> u32;
    /// Creates a new builder for the style.
    fn create_builder(&self) -> Box<dyn StyleBuilder>;
}

/// Source code of a style function, as defined in a scene or inline in a marker styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneFunction {
    /// Name the function can be referenced by. Inline functions are anonymous.
    pub name: Option<String>,
    /// Source of the function.
    pub source: String,
}

impl SceneFunction {
    /// Creates a named function.
    pub fn named(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            source: source.into(),
        }
    }

    /// Creates an anonymous function.
    pub fn anonymous(source: impl Into<String>) -> Self {
        Self {
            name: None,
            source: source.into(),
        }
    }
}

/// Scene contains everything markers need to be styled: the map projection, the set of styles, and the list of
/// style functions.
///
/// The list of functions only grows: new functions are appended when styling with inline functions is parsed, and
/// the index of a function never changes.
#[derive(Debug, Default)]
pub struct Scene {
    projection: MapProjection,
    styles: Vec<Arc<dyn Style>>,
    functions: Vec<SceneFunction>,
}

impl Scene {
    /// Creates an empty scene with Web Mercator projection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a style to the scene. A style with the same name replaces the previously added one.
    pub fn with_style(mut self, style: impl Style + 'static) -> Self {
        self.add_style(Arc::new(style));
        self
    }

    /// Adds a style to the scene. A style with the same name replaces the previously added one.
    pub fn add_style(&mut self, style: Arc<dyn Style>) {
        match self.styles.iter_mut().find(|s| s.name() == style.name()) {
            Some(existing) => *existing = style,
            None => self.styles.push(style),
        }
    }

    /// Adds a named style function to the scene.
    pub fn with_function(mut self, name: &str, source: &str) -> Self {
        self.add_function(SceneFunction::named(name, source));
        self
    }

    /// Appends a function to the function list and returns its index. If the same function is already in the list,
    /// the index of the existing one is returned instead.
    pub fn add_function(&mut self, function: SceneFunction) -> usize {
        if let Some(index) = self.functions.iter().position(|f| *f == function) {
            return index;
        }

        self.functions.push(function);
        self.functions.len() - 1
    }

    /// Index of a named function.
    pub fn function_index(&self, name: &str) -> Option<usize> {
        self.functions
            .iter()
            .position(|f| f.name.as_deref() == Some(name))
    }

    /// All functions of the scene in the order they were added.
    pub fn functions(&self) -> &[SceneFunction] {
        &self.functions
    }

    /// Styles of the scene.
    pub fn styles(&self) -> &[Arc<dyn Style>] {
        &self.styles
    }

    /// Map projection.
    pub fn projection(&self) -> &MapProjection {
        &self.projection
    }
}
