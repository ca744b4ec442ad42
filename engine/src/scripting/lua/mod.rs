//! Lua game states
//!
//! A Lua state runs its script once at `init`. The script registers
//! callbacks (`onUpdate`, `setTimeout`, `atExit`) which the engine then
//! drives every frame. Engine services are exposed as global tables
//! (`G`, `Keyboard`, `Mouse`, `Sound`, `GameDB`, `LocalDB`, `Map`, `Game`).

mod modules;


use crate::context::EngineContext;
use crate::graphics::{Color, Surface};
use crate::io::LoadedMap;
use crate::scripting::scheduler::{CallbackRegistry, TimeoutList};
use crate::scripting::transition::{PendingTransition, Transition};
use crate::state::{GameState, StateError};
use mlua::{
    Error as LuaError, Function, Lua, LuaOptions, RegistryKey, Result as LuaResult, StdLib,
    UserData, Value,
};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Global holding the per-state data handle inside the interpreter
pub const STATE_DATA_VAR: &str = "___state_data";

/// Message of the error raised by drawing calls made outside `update`
pub const OUTSIDE_UPDATE: &str = "Call to graphics function outside of a screen update";

/// Raised into script code when the engine quits during `advanceFrame`
#[derive(Debug, Error)]
#[error("engine quit requested")]
pub struct QuitRequested;

/// Per-state data shared between the host and the bindings
pub(crate) struct LuaStateData {
    pub state_name: String,
    /// Bound only while `update` runs
    pub surface: Option<Surface>,
    pub map: Option<Rc<RefCell<LoadedMap>>>,
    pub timeouts: TimeoutList<RegistryKey>,
    pub callbacks: CallbackRegistry<RegistryKey>,
    pub transition: PendingTransition,
}

pub(crate) type SharedData = Rc<RefCell<LuaStateData>>;

/// Userdata stored in `___state_data`
#[derive(Clone)]
pub(crate) struct StateDataHandle(SharedData);

impl UserData for StateDataHandle {}

/// Fetch the state data through the reserved global
///
/// Returns `None`, after logging, if a script replaced the global.
pub(crate) fn state_data(lua: &Lua) -> Option<SharedData> {
    let handle = match lua.globals().get::<_, Value>(STATE_DATA_VAR) {
        Ok(Value::UserData(ud)) => ud.borrow::<StateDataHandle>().ok().map(|h| h.0.clone()),
        _ => None,
    };
    if handle.is_none() {
        error!(var = STATE_DATA_VAR, "Variable got tampered with");
    }
    handle
}

/// Run `draw` against the bound surface, or fail if none is bound
pub(crate) fn with_surface<R>(lua: &Lua, draw: impl FnOnce(&mut Surface) -> R) -> LuaResult<Option<R>> {
    let Some(data) = state_data(lua) else {
        return Ok(None);
    };
    let mut data = data.borrow_mut();
    match data.surface.as_mut() {
        Some(surface) => Ok(Some(draw(surface))),
        None => Err(LuaError::RuntimeError(OUTSIDE_UPDATE.to_string())),
    }
}

/// Whether `err` was caused by `QuitRequested`
pub fn is_quit(err: &LuaError) -> bool {
    match err {
        LuaError::CallbackError { cause, .. } => is_quit(cause),
        LuaError::ExternalError(inner) => inner.downcast_ref::<QuitRequested>().is_some(),
        _ => false,
    }
}

/// Log a callback failure; quitting is not a failure
fn report(state: &str, what: &str, err: &LuaError) {
    if is_quit(err) {
        debug!(state = state, callback = what, "Callback unwound by quit");
    } else {
        error!(state = state, callback = what, error = %err, "Unable to execute callback");
    }
}

/// Call the function stored under `key`, logging any failure
fn call_key(lua: &Lua, key: &RegistryKey, state: &str, what: &str) {
    match lua.registry_value::<Function>(key) {
        Ok(func) => {
            if let Err(e) = func.call::<_, ()>(()) {
                report(state, what, &e);
            }
        }
        Err(e) => error!(state = state, callback = what, error = %e, "Lost callback reference"),
    }
}

/// Fire every due timer once, releasing each reference afterwards
pub(crate) fn process_timeouts(lua: &Lua, data: &SharedData, ctx: &EngineContext) {
    let state = data.borrow().state_name.clone();
    let mut scan = data.borrow_mut().timeouts.begin_scan();
    loop {
        let now = ctx.frame.borrow().ticks();
        let Some(key) = data.borrow_mut().timeouts.next_due(&mut scan, now) else {
            break;
        };
        call_key(lua, &key, &state, "setTimeout");
        if let Err(e) = lua.remove_registry_value(key) {
            warn!(state = %state, error = %e, "Failed to release timeout");
        }
    }
}

/// Create an interpreter with only the sandboxed standard libraries
///
/// Nothing that reaches the host filesystem or process is available.
pub(crate) fn sandbox() -> LuaResult<Lua> {
    let libs = StdLib::COROUTINE | StdLib::TABLE | StdLib::STRING | StdLib::UTF8 | StdLib::MATH;
    let lua = Lua::new_with(libs, LuaOptions::default())?;
    {
        let globals = lua.globals();
        globals.set("dofile", Value::Nil)?;
        globals.set("loadfile", Value::Nil)?;
    }
    Ok(lua)
}

/// A game state driven by a Lua script
pub struct LuaState {
    name: String,
    script: String,
    lua: Option<Lua>,
    data: Option<SharedData>,
}

impl LuaState {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            script: String::new(),
            lua: None,
            data: None,
        }
    }

    /// The interpreter, while the state is initialised
    pub fn lua(&self) -> Option<&Lua> {
        self.lua.as_ref()
    }

    fn script_error(&self, err: LuaError) -> StateError {
        StateError::Script {
            state: self.name.clone(),
            script: self.script.clone(),
            message: err.to_string(),
        }
    }

    /// Whether the reserved global still refers to this state's data
    fn data_intact(&self, lua: &Lua, data: &SharedData) -> bool {
        state_data(lua).is_some_and(|found| Rc::ptr_eq(&found, data))
    }

    fn setup(&mut self, ctx: &EngineContext) -> Result<(), StateError> {
        let script_path = ctx
            .config
            .require(&self.name, "script")
            .map_err(|source| StateError::Config {
                state: self.name.clone(),
                source,
            })?
            .to_string();
        self.script = script_path.clone();

        let source = ctx
            .resources
            .borrow()
            .load_script(&script_path)
            .map_err(|source| StateError::Resource {
                state: self.name.clone(),
                source,
            })?;

        let lua = sandbox().map_err(|e| self.script_error(e))?;
        let data = Rc::new(RefCell::new(LuaStateData {
            state_name: self.name.clone(),
            surface: None,
            map: None,
            timeouts: TimeoutList::new(),
            callbacks: CallbackRegistry::new(),
            transition: PendingTransition::default(),
        }));
        lua.globals()
            .set(STATE_DATA_VAR, StateDataHandle(data.clone()))
            .map_err(|e| self.script_error(e))?;
        self.data = Some(data.clone());
        let lua = self.lua.insert(lua);

        let map = match ctx.config.get(&self.name, "map") {
            Some(map_path) => {
                let text = ctx
                    .resources
                    .borrow()
                    .load_script(map_path)
                    .map_err(|source| StateError::Resource {
                        state: self.name.clone(),
                        source,
                    })?;
                let loaded = LoadedMap::load(&text, &mut ctx.resources.borrow_mut()).map_err(
                    |source| StateError::Map {
                        state: self.name.clone(),
                        source,
                    },
                )?;
                Some(Rc::new(RefCell::new(loaded)))
            }
            None => {
                info!(state = %self.name, "Lua state does not specify a map file");
                None
            }
        };
        data.borrow_mut().map = map.clone();

        let registered = modules::register_all(lua, ctx, map);
        if let Err(e) = registered {
            return Err(StateError::Script {
                state: self.name.clone(),
                script: script_path,
                message: e.to_string(),
            });
        }

        info!(state = %self.name, script = %script_path, "Running script");
        let result = lua.load(source.as_str()).set_name(script_path.as_str()).exec();
        result.map_err(|e| StateError::Script {
            state: self.name.clone(),
            script: script_path,
            message: e.to_string(),
        })
    }
}

impl GameState for LuaState {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, ctx: &EngineContext) -> Result<(), StateError> {
        info!(state = %self.name, "Initializing Lua state");
        self.setup(ctx)
    }

    fn update(&mut self, ctx: &EngineContext, surface: &mut Surface) -> Option<Transition> {
        let (Some(lua), Some(data)) = (self.lua.as_ref(), self.data.clone()) else {
            error!(state = %self.name, "Unable to run Lua state because of earlier problems");
            return Some(Transition::Quit);
        };
        if !self.data_intact(lua, &data) {
            error!(state = %self.name, "Skipping update of tampered state");
            return None;
        }

        if let Ok(g) = lua.globals().get::<_, mlua::Table>("G") {
            let sized = g
                .set("SCREEN_WIDTH", surface.width())
                .and_then(|_| g.set("SCREEN_HEIGHT", surface.height()));
            if let Err(e) = sized {
                warn!(state = %self.name, error = %e, "Unable to set screen size");
            }
        }

        surface.set_color(Color::BLACK);
        surface.clear(Color::BLACK);
        data.borrow_mut().surface = Some(std::mem::take(surface));

        process_timeouts(lua, &data, ctx);

        // Callbacks added during this pass first run next frame
        let count = data.borrow().callbacks.frame_len();
        for index in 0..count {
            let func = {
                let data = data.borrow();
                match data.callbacks.frame_callback(index) {
                    Some(key) => lua.registry_value::<Function>(key),
                    None => break,
                }
            };
            match func {
                Ok(func) => {
                    if let Err(e) = func.call::<_, ()>(()) {
                        report(&self.name, "onUpdate", &e);
                    }
                }
                Err(e) => error!(state = %self.name, error = %e, "Lost onUpdate callback"),
            }
        }

        let mut data = data.borrow_mut();
        if let Some(bound) = data.surface.take() {
            *surface = bound;
        }
        let transition = data.transition.take();
        match &transition {
            Some(Transition::Quit) => {
                warn!(state = %self.name, "Lua script didn't specify a next state; terminating")
            }
            Some(Transition::Switch(next)) => {
                info!(state = %self.name, next = %next, "Lua script changing state")
            }
            None => {}
        }
        transition
    }

    fn deinit(&mut self, ctx: &EngineContext) {
        let data = self.data.take();
        let Some(lua) = self.lua.take() else {
            return;
        };

        match data {
            Some(data) if self.data_intact(&lua, &data) => {
                loop {
                    let key = data.borrow_mut().callbacks.pop_exit();
                    let Some(key) = key else {
                        break;
                    };
                    call_key(&lua, &key, &self.name, "atExit");
                    if let Err(e) = lua.remove_registry_value(key) {
                        warn!(state = %self.name, error = %e, "Failed to release atExit callback");
                    }
                }

                let mut data = data.borrow_mut();
                data.map = None;
                let keys: Vec<RegistryKey> = data
                    .callbacks
                    .drain()
                    .into_iter()
                    .chain(data.timeouts.drain())
                    .collect();
                for key in keys {
                    if let Err(e) = lua.remove_registry_value(key) {
                        warn!(state = %self.name, error = %e, "Failed to release callback");
                    }
                }
                data.transition.take();
                data.surface = None;
            }
            _ => error!(state = %self.name, "State data got tampered with; skipping atExit callbacks"),
        }

        ctx.mixer.borrow_mut().halt_all();
        drop(lua);
        info!(state = %self.name, "Lua state closed");
    }
}
