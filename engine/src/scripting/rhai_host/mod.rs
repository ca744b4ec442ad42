//! Rhai game states
//!
//! The whole script runs again on every frame. Scripts keep state in
//! top-level variables (which survive between runs) or in the game
//! database, and block with `show()` or `delay()` when they need more
//! than one frame. After each run the `nextstate` variable names the
//! state to switch to.

mod api;

#[cfg(test)]
mod tests;

use crate::context::EngineContext;
use crate::graphics::Surface;
use crate::scripting::transition::Transition;
use crate::state::{GameState, StateError};
use rhai::{Dynamic, Engine, EvalAltResult, Map, Position, Scope, AST};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, error, info, warn};

/// Variable the script assigns the next state's name to
pub const NEXT_STATE_VAR: &str = "nextstate";

pub(crate) type RhaiResult<T> = Result<T, Box<EvalAltResult>>;

/// Position of the `print` cursor, shared with the script's `cursor` object
#[derive(Debug, Clone, Default)]
pub struct TextCursor(Rc<RefCell<(i64, i64)>>);

impl TextCursor {
    pub fn get(&self) -> (i64, i64) {
        *self.0.borrow()
    }

    pub fn set(&self, x: i64, y: i64) {
        *self.0.borrow_mut() = (x, y);
    }

    fn x(&mut self) -> i64 {
        self.0.borrow().0
    }

    fn y(&mut self) -> i64 {
        self.0.borrow().1
    }

    fn set_x(&mut self, x: i64) {
        self.0.borrow_mut().0 = x;
    }

    fn set_y(&mut self, y: i64) {
        self.0.borrow_mut().1 = y;
    }
}

/// Host data the registered functions reach through
pub(crate) struct HostData {
    pub state_name: String,
    /// Bound only while the script runs
    pub surface: Option<Surface>,
    pub cursor: TextCursor,
}

pub(crate) type SharedHost = Rc<RefCell<HostData>>;

/// Error that unwinds a script when the engine quits
pub(crate) fn halt() -> Box<EvalAltResult> {
    EvalAltResult::ErrorTerminated(Dynamic::UNIT, Position::NONE).into()
}

/// Whether `err` is the unwinding caused by `halt`
pub fn is_halt(err: &EvalAltResult) -> bool {
    match err {
        EvalAltResult::ErrorTerminated(..) => true,
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => is_halt(inner),
        EvalAltResult::ErrorInModule(_, inner, _) => is_halt(inner),
        _ => false,
    }
}

/// Engine with the same guard rails as every other script engine
fn sandboxed_engine() -> Engine {
    let mut engine = Engine::new();

    // No operation limit: blocking loops around show() run indefinitely
    engine.set_max_expr_depths(100, 100);
    engine.set_max_call_levels(50);
    engine.set_max_string_size(10_000);
    engine.set_max_array_size(10_000);
    engine.set_max_map_size(1_000);

    engine.disable_symbol("eval");
    engine
}

struct Interpreter {
    engine: Engine,
    ast: AST,
    scope: Scope<'static>,
    data: SharedHost,
}

/// A game state driven by a Rhai script
pub struct RhaiState {
    name: String,
    script: String,
    interpreter: Option<Interpreter>,
}

impl RhaiState {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            script: String::new(),
            interpreter: None,
        }
    }

    /// Current value of a script variable, for inspection
    pub fn variable(&self, name: &str) -> Option<Dynamic> {
        self.interpreter
            .as_ref()
            .and_then(|i| i.scope.get_value::<Dynamic>(name))
    }

    fn style_map(&self, ctx: &EngineContext) -> Map {
        let mut style = Map::new();
        for key in ["background", "foreground", "border_color", "font"] {
            let value = ctx.config.style(&self.name, &key.replace('_', "-")).to_string();
            style.insert(key.into(), Dynamic::from(value));
        }
        for key in [
            "margin",
            "padding",
            "border",
            "border_radius",
            "button_padding",
            "button_border_radius",
        ] {
            let value = ctx.config.style_int(&self.name, &key.replace('_', "-"));
            style.insert(key.into(), Dynamic::from(value));
        }
        style
    }

}

fn report(state: &str, script: &str, err: &EvalAltResult) {
    error!(
        state = %state,
        script = %script,
        line = err.position().line().unwrap_or(0),
        error = %err,
        "Rhai script failed"
    );
}

impl GameState for RhaiState {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, ctx: &EngineContext) -> Result<(), StateError> {
        info!(state = %self.name, "Initializing Rhai state");
        ctx.frame.borrow_mut().input_mut().reset_keys();

        let script_path = ctx
            .config
            .require(&self.name, "script")
            .map_err(|source| StateError::Config {
                state: self.name.clone(),
                source,
            })?
            .to_string();
        self.script = script_path.clone();

        info!(state = %self.name, script = %script_path, "Loading Rhai script");
        let source = ctx
            .resources
            .borrow()
            .load_script(&script_path)
            .map_err(|source| StateError::Resource {
                state: self.name.clone(),
                source,
            })?;

        let data = Rc::new(RefCell::new(HostData {
            state_name: self.name.clone(),
            surface: None,
            cursor: TextCursor::default(),
        }));

        let mut engine = sandboxed_engine();
        engine
            .register_type_with_name::<TextCursor>("Cursor")
            .register_get_set("x", TextCursor::x, TextCursor::set_x)
            .register_get_set("y", TextCursor::y, TextCursor::set_y);
        api::register(&mut engine, ctx, &data);

        let ast = engine.compile(&source).map_err(|e| StateError::Script {
            state: self.name.clone(),
            script: script_path.clone(),
            message: format!("line {}: {}", e.position().line().unwrap_or(0), e),
        })?;

        let mut scope = Scope::new();
        scope.push_dynamic(NEXT_STATE_VAR, Dynamic::UNIT);
        scope.push("width", ctx.settings.virtual_width as i64);
        scope.push("height", ctx.settings.virtual_height as i64);
        scope.push("cursor", data.borrow().cursor.clone());
        scope.push("mouse", api::MouseView::new(ctx.frame.clone()));
        scope.push("style", self.style_map(ctx));

        self.interpreter = Some(Interpreter {
            engine,
            ast,
            scope,
            data,
        });
        Ok(())
    }

    fn update(&mut self, ctx: &EngineContext, surface: &mut Surface) -> Option<Transition> {
        let Some(interpreter) = self.interpreter.as_mut() else {
            error!(state = %self.name, "Unable to run Rhai script because of earlier problems");
            return Some(Transition::Quit);
        };

        interpreter.scope.set_value("width", surface.width() as i64);
        interpreter.scope.set_value("height", surface.height() as i64);
        interpreter.data.borrow_mut().surface = Some(std::mem::take(surface));

        let result = interpreter
            .engine
            .run_ast_with_scope(&mut interpreter.scope, &interpreter.ast);

        if let Some(bound) = interpreter.data.borrow_mut().surface.take() {
            *surface = bound;
        }
        // Re-declared top-level variables would otherwise pile up
        interpreter.scope = interpreter.scope.clone_visible();

        if let Err(err) = result {
            if is_halt(&err) {
                debug!(state = %self.name, "Rhai script halted by quit");
            } else {
                report(&self.name, &self.script, &err);
            }
            return Some(Transition::Quit);
        }

        match interpreter.scope.get_value::<Dynamic>(NEXT_STATE_VAR) {
            Some(next) if !next.is_unit() => {
                let next = next.to_string();
                debug!(state = %self.name, next = %next, "Rhai script chose next state");
                Some(Transition::Switch(next))
            }
            _ => {
                warn!(state = %self.name, "Rhai script didn't specify a nextstate; terminating");
                Some(Transition::Quit)
            }
        }
    }

    fn deinit(&mut self, _ctx: &EngineContext) {
        if self.interpreter.take().is_some() {
            info!(state = %self.name, "Rhai state closed");
        }
    }
}
