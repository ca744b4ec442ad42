//! Logging, imports, callback registration, frame control and `Game`

use super::super::{is_quit, process_timeouts, state_data, QuitRequested};
use crate::context::EngineContext;
use crate::scripting::scheduler::MAX_TIMEOUTS;
use mlua::{Error as LuaError, Function, Lua, Result as LuaResult, Value};
use tracing::{info, warn};

fn log_text(lua: &Lua, value: Value) -> LuaResult<Option<String>> {
    Ok(lua
        .coerce_string(value)?
        .map(|s| s.to_string_lossy().into_owned()))
}

pub(super) fn register(lua: &Lua, ctx: &EngineContext) -> LuaResult<()> {
    let globals = lua.globals();

    let log = lua.create_function(|lua, message: Value| {
        if let Some(text) = log_text(lua, message)? {
            info!(source = "lua", "{}", text);
        }
        Ok(())
    })?;
    globals.set("print", log.clone())?;
    globals.set("log", log)?;

    let ctx_import = ctx.clone();
    globals.set(
        "import",
        lua.create_function(move |lua, path: String| {
            let text = ctx_import
                .resources
                .borrow()
                .load_script(&path)
                .map_err(|e| LuaError::RuntimeError(format!("Could not import {path}: {e}")))?;
            info!(script = %path, "Imported script");
            if let Err(e) = lua.load(text.as_str()).set_name(path.as_str()).exec() {
                if is_quit(&e) {
                    return Err(e);
                }
                warn!(script = %path, error = %e, "Unable to execute imported script");
            }
            Ok(())
        })?,
    )?;

    let ctx_timeout = ctx.clone();
    globals.set(
        "setTimeout",
        lua.create_function(move |lua, (func, ms): (Function, i64)| {
            let Some(data) = state_data(lua) else {
                return Ok(());
            };
            if data.borrow().timeouts.is_full() {
                return Err(LuaError::RuntimeError(format!(
                    "Maximum number of timeouts [{MAX_TIMEOUTS}] reached"
                )));
            }
            let key = lua.create_registry_value(func)?;
            let now = ctx_timeout.frame.borrow().ticks();
            data.borrow_mut()
                .timeouts
                .register(key, ms.max(0) as u64, now)
                .map_err(|e| LuaError::RuntimeError(e.to_string()))?;
            Ok(())
        })?,
    )?;

    globals.set(
        "onUpdate",
        lua.create_function(|lua, func: Function| {
            let Some(data) = state_data(lua) else {
                return Ok(None);
            };
            let key = lua.create_registry_value(func)?;
            let id = data.borrow_mut().callbacks.on_frame(key);
            Ok(Some(id.0))
        })?,
    )?;

    globals.set(
        "atExit",
        lua.create_function(|lua, func: Function| {
            let Some(data) = state_data(lua) else {
                return Ok(());
            };
            let key = lua.create_registry_value(func)?;
            data.borrow_mut().callbacks.on_exit(key);
            Ok(())
        })?,
    )?;

    let ctx_frame = ctx.clone();
    globals.set(
        "advanceFrame",
        lua.create_function(move |lua, ()| {
            let Some(data) = state_data(lua) else {
                return Ok(());
            };
            process_timeouts(lua, &data, &ctx_frame);
            {
                let mut data = data.borrow_mut();
                let mut frame = ctx_frame.frame.borrow_mut();
                match data.surface.as_mut() {
                    Some(surface) => frame.advance_frame(surface),
                    None => frame.advance_frame(&mut ctx_frame.new_surface()),
                }
            }
            if ctx_frame.quit_requested() {
                return Err(LuaError::external(QuitRequested));
            }
            Ok(())
        })?,
    )?;

    let game = lua.create_table()?;
    game.set(
        "changeState",
        lua.create_function(|lua, next: Option<String>| {
            if let Some(data) = state_data(lua) {
                data.borrow_mut().transition.request(next);
            }
            Ok(())
        })?,
    )?;
    let ctx_style = ctx.clone();
    game.set(
        "getStyle",
        lua.create_function(move |lua, key: String| {
            let Some(data) = state_data(lua) else {
                return Ok(String::new());
            };
            let state = data.borrow().state_name.clone();
            Ok(ctx_style.config.style(&state, &key).to_string())
        })?,
    )?;
    globals.set("Game", game)?;

    Ok(())
}
