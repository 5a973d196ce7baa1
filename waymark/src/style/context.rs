use crate::error::MarkerError;
use crate::marker::GeometryKind;
use crate::scene::{Scene, SceneFunction};
use crate::style::expression::ExpressionEngine;
use crate::style::StyleValue;

/// Id of a function compiled by a [`ScriptEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub u32);

/// Keywords available to style functions during evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Globals {
    /// Zoom level the rule is evaluated for (`$zoom`).
    pub zoom: f64,
    /// Kind of the geometry being styled (`$geometry`).
    pub geometry: Option<GeometryKind>,
}

/// Engine that compiles and evaluates scripted style functions.
///
/// Compilation is considered expensive, so a [`StyleContext`] registers every function exactly once and then only
/// evaluates the compiled function by its id.
pub trait ScriptEngine {
    /// Compiles a function and returns the id it can be evaluated by.
    fn register(&mut self, function: &SceneFunction) -> Result<FunctionId, MarkerError>;
    /// Evaluates a previously compiled function.
    fn evaluate(&self, id: FunctionId, globals: &Globals) -> Result<StyleValue, MarkerError>;
    /// Drops all compiled functions.
    fn clear(&mut self);
}

/// Context draw rules are evaluated against.
///
/// The context is mutable state reused for every build: the zoom keyword is set before each rule evaluation. It is
/// not meant to be shared between concurrent builds.
pub struct StyleContext {
    engine: Box<dyn ScriptEngine>,
    // Indexed by the scene function index.
    functions: Vec<Option<FunctionId>>,
    globals: Globals,
}

impl Default for StyleContext {
    fn default() -> Self {
        Self::new(Box::new(ExpressionEngine::default()))
    }
}

impl std::fmt::Debug for StyleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleContext")
            .field("functions", &self.functions)
            .field("globals", &self.globals)
            .finish()
    }
}

impl StyleContext {
    /// Creates a new context with the given script engine.
    pub fn new(engine: Box<dyn ScriptEngine>) -> Self {
        Self {
            engine,
            functions: Vec::new(),
            globals: Globals::default(),
        }
    }

    /// Drops all compiled functions and compiles all functions of the scene.
    pub fn init_functions(&mut self, scene: &Scene) {
        self.engine.clear();
        self.functions.clear();
        for function in scene.functions() {
            self.add_function(function);
        }
    }

    /// Compiles the next scene function. Functions must be added in the order of the scene function list.
    ///
    /// A function that fails to compile still takes its index, and evaluating it returns an error.
    pub fn add_function(&mut self, function: &SceneFunction) {
        let id = match self.engine.register(function) {
            Ok(id) => Some(id),
            Err(err) => {
                log::warn!("Failed to compile style function '{}': {err}", function.source);
                None
            }
        };

        self.functions.push(id);
    }

    /// Number of scene functions known to the context.
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Sets the `$zoom` keyword.
    pub fn set_keyword_zoom(&mut self, zoom: i32) {
        self.globals.zoom = zoom as f64;
    }

    /// Sets the `$geometry` keyword.
    pub fn set_keyword_geometry(&mut self, geometry: Option<GeometryKind>) {
        self.globals.geometry = geometry;
    }

    /// Current keywords.
    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    /// Evaluates the scene function with the given index.
    pub fn eval_function(&self, index: usize) -> Result<StyleValue, MarkerError> {
        match self.functions.get(index) {
            Some(Some(id)) => self.engine.evaluate(*id, &self.globals),
            Some(None) => Err(MarkerError::Script(format!(
                "function {index} failed to compile"
            ))),
            None => Err(MarkerError::Script(format!(
                "function {index} is not compiled"
            ))),
        }
    }
}
