//! Script-facing tables registered into every Lua state

mod audio;
mod globals;
mod graphics;
mod input;
mod map;
mod store;

use crate::context::EngineContext;
use crate::io::LoadedMap;
use mlua::{Lua, Result as LuaResult};
use std::cell::RefCell;
use std::rc::Rc;

/// Register every global the scripts can use
pub(super) fn register_all(
    lua: &Lua,
    ctx: &EngineContext,
    map: Option<Rc<RefCell<LoadedMap>>>,
) -> LuaResult<()> {
    globals::register(lua, ctx)?;
    graphics::register(lua, ctx)?;
    input::register(lua, ctx)?;
    audio::register(lua, ctx)?;
    store::register(lua, ctx)?;
    map::register(lua, ctx, map)?;
    Ok(())
}
