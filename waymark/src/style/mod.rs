//! Marker styling: parsing of styling text into [`DrawRuleData`] and its evaluation into a [`DrawRule`] for the
//! current zoom level.
//!
//! Styling is a JSON object. The `style` key names the [`Style`](crate::scene::Style) the marker is built with, the
//! rest of the keys are style parameters:
//!
//! ```json
//! {
//!     "style": "lines",
//!     "color": "#3366FF",
//!     "width": [[10, 2.0], [16, 6.0]],
//!     "visible": { "function": "$zoom > 8" }
//! }
//! ```
//!
//! A parameter value may be a literal, a list of [`Stops`] or a reference to a style function: either the name of a
//! scene function or an inline function source.

use ahash::{HashMap, HashMapExt};
use serde_json::Value;

use crate::error::MarkerError;
use crate::scene::{Scene, SceneFunction};
use crate::Color;

mod context;
mod expression;
mod stops;

pub use context::{FunctionId, Globals, ScriptEngine, StyleContext};
pub use expression::ExpressionEngine;
pub use stops::Stops;

/// Concrete value of a style parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    /// Boolean flag.
    Bool(bool),
    /// Number.
    Number(f64),
    /// Color.
    Color(Color),
    /// String.
    String(String),
}

/// Kind of value a style parameter expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// [`StyleValue::Bool`]
    Bool,
    /// [`StyleValue::Number`]
    Number,
    /// [`StyleValue::Color`]
    Color,
}

/// Known style parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleParamKey {
    /// Fill color of polygons and points, stroke color of lines.
    Color,
    /// Width of lines in pixels.
    Width,
    /// Size of points in pixels.
    Size,
    /// Drawing order of the mesh.
    Order,
    /// If false, the marker is not built.
    Visible,
    /// Minimum zoom level (inclusive) the marker is built at.
    MinZoom,
    /// Maximum zoom level (inclusive) the marker is built at.
    MaxZoom,
    /// Color of polygon and point outlines.
    OutlineColor,
    /// Width of polygon and point outlines in pixels.
    OutlineWidth,
}

impl StyleParamKey {
    /// Parses the key from its name in styling text.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "color" => Self::Color,
            "width" => Self::Width,
            "size" => Self::Size,
            "order" => Self::Order,
            "visible" => Self::Visible,
            "min_zoom" => Self::MinZoom,
            "max_zoom" => Self::MaxZoom,
            "outline_color" => Self::OutlineColor,
            "outline_width" => Self::OutlineWidth,
            _ => return None,
        })
    }

    /// Kind of value the parameter expects.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Color | Self::OutlineColor => ValueKind::Color,
            Self::Visible => ValueKind::Bool,
            Self::Width
            | Self::Size
            | Self::Order
            | Self::MinZoom
            | Self::MaxZoom
            | Self::OutlineWidth => ValueKind::Number,
        }
    }
}

/// Unresolved value of a style parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleParamValue {
    /// Value that does not depend on the context.
    Value(StyleValue),
    /// Zoom-dependent value.
    Stops(Stops),
    /// Value computed by the scene function with the given index.
    Function(usize),
}

/// A style parameter of a draw rule.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleParam {
    /// Parameter key.
    pub key: StyleParamKey,
    /// Parameter value.
    pub value: StyleParamValue,
}

/// Parsed styling of a marker: the style name and unresolved parameters.
///
/// Draw rule data is immutable. When styling of a marker changes, new data is parsed and replaces the old one.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRuleData {
    style_name: String,
    params: Vec<StyleParam>,
}

impl DrawRuleData {
    /// Creates new rule data.
    pub fn new(style_name: impl Into<String>, params: Vec<StyleParam>) -> Self {
        Self {
            style_name: style_name.into(),
            params,
        }
    }

    /// Parses styling text.
    ///
    /// Inline function sources are appended to the scene function list, function names are resolved against it.
    pub fn parse(styling: &str, scene: &mut Scene) -> Result<Self, MarkerError> {
        let Value::Object(node) = serde_json::from_str::<Value>(styling)? else {
            return Err(MarkerError::Styling("styling must be an object".into()));
        };

        let style_name = match node.get("style") {
            Some(Value::String(name)) => name.clone(),
            Some(_) => return Err(MarkerError::Styling("'style' must be a string".into())),
            None => return Err(MarkerError::Styling("'style' is not set".into())),
        };

        let mut params = Vec::with_capacity(node.len());
        for (name, value) in &node {
            if name == "style" {
                continue;
            }

            let Some(key) = StyleParamKey::from_name(name) else {
                log::debug!("Ignoring unknown style parameter '{name}'");
                continue;
            };

            let value = parse_param_value(key, value, scene)?;
            params.push(StyleParam { key, value });
        }

        Ok(Self { style_name, params })
    }

    /// Name of the style the rule refers to.
    pub fn style_name(&self) -> &str {
        &self.style_name
    }

    /// Unresolved parameters.
    pub fn params(&self) -> &[StyleParam] {
        &self.params
    }

    /// Resolves parameters of the rule for the context.
    ///
    /// Returns `Ok(None)` if the rule does not apply in the given context, e.g. the `visible` parameter is false or
    /// the zoom level is outside of the `min_zoom..=max_zoom` range.
    pub fn evaluate(&self, context: &StyleContext) -> Result<Option<DrawRule>, MarkerError> {
        let mut values = HashMap::with_capacity(self.params.len());
        for param in &self.params {
            let value = match &param.value {
                StyleParamValue::Value(value) => value.clone(),
                StyleParamValue::Stops(stops) => stops.evaluate(context.globals().zoom),
                StyleParamValue::Function(index) => {
                    coerce(param.key, context.eval_function(*index)?)?
                }
            };
            values.insert(param.key, value);
        }

        let rule = DrawRule {
            style_name: self.style_name.clone(),
            values,
        };

        let zoom = context.globals().zoom;
        let visible = rule.bool(StyleParamKey::Visible).unwrap_or(true)
            && rule.number(StyleParamKey::MinZoom).map_or(true, |min| zoom >= min)
            && rule.number(StyleParamKey::MaxZoom).map_or(true, |max| zoom <= max);

        Ok(visible.then_some(rule))
    }
}

fn parse_param_value(
    key: StyleParamKey,
    value: &Value,
    scene: &mut Scene,
) -> Result<StyleParamValue, MarkerError> {
    match value {
        Value::Object(object) => {
            let Some(Value::String(function)) = object.get("function") else {
                return Err(MarkerError::Styling(format!(
                    "{key:?}: object values must be functions"
                )));
            };

            let index = match scene.function_index(function) {
                Some(index) => index,
                None => scene.add_function(SceneFunction::anonymous(function.as_str())),
            };
            Ok(StyleParamValue::Function(index))
        }
        Value::Array(frames) => {
            let mut parsed = Vec::with_capacity(frames.len());
            for frame in frames {
                let (Some(zoom), Some(value)) = (
                    frame.get(0).and_then(Value::as_f64),
                    frame.get(1).filter(|_| frame.as_array().map(Vec::len) == Some(2)),
                ) else {
                    return Err(MarkerError::Styling(format!(
                        "{key:?}: stops must be [zoom, value] pairs"
                    )));
                };
                parsed.push((zoom, parse_literal(key, value)?));
            }

            Stops::new(parsed)
                .map(StyleParamValue::Stops)
                .ok_or_else(|| MarkerError::Styling(format!("{key:?}: invalid stops")))
        }
        _ => Ok(StyleParamValue::Value(parse_literal(key, value)?)),
    }
}

fn parse_literal(key: StyleParamKey, value: &Value) -> Result<StyleValue, MarkerError> {
    let parsed = match (key.kind(), value) {
        (ValueKind::Bool, Value::Bool(v)) => Some(StyleValue::Bool(*v)),
        (ValueKind::Number, Value::Number(v)) => v.as_f64().map(StyleValue::Number),
        (ValueKind::Color, Value::String(v)) => Color::try_from_hex(v).map(StyleValue::Color),
        _ => None,
    };

    parsed.ok_or_else(|| MarkerError::Styling(format!("{key:?}: invalid value {value}")))
}

fn coerce(key: StyleParamKey, value: StyleValue) -> Result<StyleValue, MarkerError> {
    let coerced = match (key.kind(), value) {
        (ValueKind::Bool, v @ StyleValue::Bool(_)) => Some(v),
        (ValueKind::Bool, StyleValue::Number(v)) => Some(StyleValue::Bool(v != 0.0)),
        (ValueKind::Number, v @ StyleValue::Number(_)) => Some(v),
        (ValueKind::Color, v @ StyleValue::Color(_)) => Some(v),
        (ValueKind::Color, StyleValue::String(v)) => Color::try_from_hex(&v).map(StyleValue::Color),
        _ => None,
    };

    coerced.ok_or_else(|| {
        MarkerError::Script(format!("function result is not valid for {key:?}"))
    })
}

/// Draw rule with parameters resolved for a specific context.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRule {
    style_name: String,
    values: HashMap<StyleParamKey, StyleValue>,
}

impl DrawRule {
    /// Name of the style the rule refers to.
    pub fn style_name(&self) -> &str {
        &self.style_name
    }

    /// Resolved value of the parameter.
    pub fn get(&self, key: StyleParamKey) -> Option<&StyleValue> {
        self.values.get(&key)
    }

    /// Numeric value of the parameter.
    pub fn number(&self, key: StyleParamKey) -> Option<f64> {
        match self.values.get(&key) {
            Some(StyleValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    /// Color value of the parameter.
    pub fn color(&self, key: StyleParamKey) -> Option<Color> {
        match self.values.get(&key) {
            Some(StyleValue::Color(v)) => Some(*v),
            _ => None,
        }
    }

    /// Boolean value of the parameter.
    pub fn bool(&self, key: StyleParamKey) -> Option<bool> {
        match self.values.get(&key) {
            Some(StyleValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }
}
