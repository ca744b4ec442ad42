//! `Keyboard` and `Mouse` tables

use crate::context::EngineContext;
use crate::input::MouseButton;
use mlua::{Lua, Result as LuaResult};

pub(super) fn register(lua: &Lua, ctx: &EngineContext) -> LuaResult<()> {
    let keyboard = lua.create_table()?;
    let frame = ctx.frame.clone();
    keyboard.set(
        "down",
        lua.create_function(move |_, key: Option<String>| {
            let frame = frame.borrow();
            Ok(match key {
                Some(key) => frame.input().key_down(&key),
                None => frame.input().any_key().is_some(),
            })
        })?,
    )?;
    let frame = ctx.frame.clone();
    keyboard.set(
        "reset",
        lua.create_function(move |_, ()| {
            frame.borrow_mut().input_mut().reset_keys();
            Ok(())
        })?,
    )?;
    lua.globals().set("Keyboard", keyboard)?;

    let mouse = lua.create_table()?;
    mouse.set("LEFT", MouseButton::Left as i64)?;
    mouse.set("MIDDLE", MouseButton::Middle as i64)?;
    mouse.set("RIGHT", MouseButton::Right as i64)?;

    let frame = ctx.frame.clone();
    mouse.set(
        "position",
        lua.create_function(move |_, ()| Ok(frame.borrow().input().mouse_position))?,
    )?;
    let frame = ctx.frame.clone();
    mouse.set(
        "down",
        lua.create_function(move |_, button: i64| {
            Ok(MouseButton::from_index(button)
                .is_some_and(|b| frame.borrow().input().button_down(b)))
        })?,
    )?;
    let frame = ctx.frame.clone();
    mouse.set(
        "click",
        lua.create_function(move |_, button: i64| {
            Ok(MouseButton::from_index(button).is_some_and(|b| frame.borrow().input().clicked(b)))
        })?,
    )?;
    lua.globals().set("Mouse", mouse)?;

    Ok(())
}
