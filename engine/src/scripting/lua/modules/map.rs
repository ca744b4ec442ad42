//! The `Map` table and `CellObj` handles
//!
//! Rows, columns and layers are 1-based on the script side.

use super::super::with_surface;
use crate::context::EngineContext;
use crate::io::{LoadedMap, MapCell, MapError, TileRef, LAYER_COUNT};
use mlua::{
    AnyUserData, Error as LuaError, Lua, MetaMethod, Result as LuaResult, UserData,
    UserDataMethods,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Script handle to one map cell
pub(crate) struct CellObj {
    map: Rc<RefCell<LoadedMap>>,
    row: i64,
    col: i64,
}

impl CellObj {
    fn read<R>(&self, f: impl FnOnce(&MapCell) -> R) -> LuaResult<R> {
        let map = self.map.borrow();
        let cell = map.map.cell(self.row, self.col).map_err(map_error)?;
        Ok(f(cell))
    }
}

fn map_error(err: MapError) -> LuaError {
    LuaError::RuntimeError(err.to_string())
}

fn layer_index(layer: i64, what: &str) -> LuaResult<usize> {
    if layer < 1 || layer > LAYER_COUNT as i64 {
        return Err(LuaError::RuntimeError(format!(
            "Invalid layer {layer} passed to {what}"
        )));
    }
    Ok(layer as usize - 1)
}

impl UserData for CellObj {
    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        // Returns the cell itself so calls can be chained
        methods.add_function(
            "set",
            |_, (ud, layer, si, ti): (AnyUserData<'lua>, i64, i32, i32)| {
                {
                    let this = ud.borrow::<CellObj>()?;
                    let layer = layer_index(layer, "CellObj:set()")?;
                    if si < 0 {
                        return Err(LuaError::RuntimeError(
                            "Invalid si passed to CellObj:set()".to_string(),
                        ));
                    }
                    this.map
                        .borrow_mut()
                        .map
                        .set_tile(this.row, this.col, layer, TileRef { si, ti })
                        .map_err(map_error)?;
                }
                Ok(ud)
            },
        );
        methods.add_method("get", |_, this, layer: i64| {
            let layer = layer_index(layer, "CellObj:get()")?;
            this.read(|cell| (cell.tiles[layer].si, cell.tiles[layer].ti))
        });
        methods.add_method("getId", |_, this, ()| this.read(|cell| cell.id.clone()));
        methods.add_method("getClass", |_, this, ()| this.read(|cell| cell.class.clone()));
        methods.add_method("isBarrier", |_, this, ()| this.read(|cell| cell.barrier));
        methods.add_method("setBarrier", |_, this, barrier: bool| {
            let mut map = this.map.borrow_mut();
            map.map
                .cell_mut(this.row, this.col)
                .map_err(map_error)?
                .barrier = barrier;
            Ok(())
        });
        methods.add_meta_method(MetaMethod::ToString, |_, _, ()| Ok("CellObj"));
    }
}

fn cell_fn(
    lua: &Lua,
    map: Option<Rc<RefCell<LoadedMap>>>,
) -> LuaResult<mlua::Function<'_>> {
    lua.create_function(move |_, (r, c): (i64, i64)| {
        let Some(map) = map.as_ref() else {
            return Err(LuaError::RuntimeError(
                "Attempt to access a cell of non-existent Map".to_string(),
            ));
        };
        let (rows, cols) = {
            let map = map.borrow();
            (map.map.rows as i64, map.map.cols as i64)
        };
        if r < 1 || r > rows {
            return Err(LuaError::RuntimeError("Invalid r value in Map.cell()".to_string()));
        }
        if c < 1 || c > cols {
            return Err(LuaError::RuntimeError("Invalid c value in Map.cell()".to_string()));
        }
        Ok(CellObj {
            map: map.clone(),
            row: r - 1,
            col: c - 1,
        })
    })
}

pub(super) fn register(
    lua: &Lua,
    ctx: &EngineContext,
    map: Option<Rc<RefCell<LoadedMap>>>,
) -> LuaResult<()> {
    lua.globals().set("Cell", cell_fn(lua, map.clone())?)?;

    let Some(map) = map else {
        lua.globals().set("Map", mlua::Value::Nil)?;
        return Ok(());
    };

    let table = lua.create_table()?;
    table.set("BACKGROUND", 1)?;
    table.set("CENTER", 2)?;
    table.set("FOREGROUND", 3)?;
    {
        let loaded = map.borrow();
        table.set("ROWS", loaded.map.rows)?;
        table.set("COLS", loaded.map.cols)?;
        table.set("TILE_WIDTH", loaded.map.tile_width)?;
        table.set("TILE_HEIGHT", loaded.map.tile_height)?;
    }

    let resources = ctx.resources.clone();
    let render_map = map.clone();
    table.set(
        "render",
        lua.create_function(move |lua, (layer, sx, sy): (i64, Option<i32>, Option<i32>)| {
            if layer < 1 || layer > LAYER_COUNT as i64 {
                return Err(LuaError::RuntimeError(format!(
                    "Attempt to render non-existent Map layer {layer}"
                )));
            }
            let map = render_map.borrow();
            let resources = resources.borrow();
            with_surface(lua, |surface| {
                map.render(
                    surface,
                    &resources,
                    layer as usize - 1,
                    sx.unwrap_or(0),
                    sy.unwrap_or(0),
                )
            })?
            .transpose()
            .map_err(map_error)?;
            Ok(())
        })?,
    )?;
    table.set("cell", cell_fn(lua, Some(map))?)?;
    lua.globals().set("Map", table)?;

    Ok(())
}
