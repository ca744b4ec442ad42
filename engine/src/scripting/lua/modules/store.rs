//! `GameDB` (shared) and `LocalDB` (per save) key/value tables

use crate::context::EngineContext;
use crate::io::{GameDb, StoreScope};
use mlua::{Lua, Result as LuaResult, Table, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Which namespace of the store a table talks to
#[derive(Clone, Copy)]
enum Scope {
    Shared,
    Local,
}

impl Scope {
    fn read<R>(self, db: &Rc<RefCell<GameDb>>, f: impl FnOnce(&StoreScope) -> R) -> R {
        let db = db.borrow();
        match self {
            Scope::Shared => f(db.shared()),
            Scope::Local => f(db.local()),
        }
    }

    fn write(self, db: &Rc<RefCell<GameDb>>, key: &str, value: String) {
        let mut db = db.borrow_mut();
        match self {
            Scope::Shared => db.shared_mut().set(key, value),
            Scope::Local => db.local_mut().set(key, value),
        }
    }
}

fn scope_table<'lua>(lua: &'lua Lua, ctx: &EngineContext, scope: Scope) -> LuaResult<Table<'lua>> {
    let table = lua.create_table()?;

    let db = ctx.store.clone();
    table.set(
        "set",
        lua.create_function(move |lua, (key, value): (String, Value)| {
            let text = lua
                .coerce_string(value)?
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            scope.write(&db, &key, text);
            Ok(())
        })?,
    )?;

    let db = ctx.store.clone();
    table.set(
        "get",
        lua.create_function(move |lua, (key, default): (String, Value)| {
            match scope.read(&db, |s| s.get(&key).map(str::to_string)) {
                Some(value) => Ok(Value::String(lua.create_string(&value)?)),
                None => Ok(default),
            }
        })?,
    )?;

    let db = ctx.store.clone();
    table.set(
        "has",
        lua.create_function(move |_, key: String| Ok(scope.read(&db, |s| s.has(&key))))?,
    )?;

    Ok(table)
}

pub(super) fn register(lua: &Lua, ctx: &EngineContext) -> LuaResult<()> {
    lua.globals()
        .set("GameDB", scope_table(lua, ctx, Scope::Shared)?)?;
    lua.globals()
        .set("LocalDB", scope_table(lua, ctx, Scope::Local)?)?;
    Ok(())
}
