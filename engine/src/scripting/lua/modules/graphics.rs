//! The `G` drawing table and the `Bmp` bitmap wrapper

use super::super::{state_data, with_surface};
use crate::context::EngineContext;
use crate::graphics::{Blit, Color, Font, Surface};
use crate::io::{BitmapId, ResourceCache};
use mlua::{
    AnyUserData, Error as LuaError, FromLuaMulti, Function, Lua, MetaMethod, Result as LuaResult,
    UserData, UserDataMethods, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Script handle to a cached bitmap; dropping it never frees the bitmap
pub(crate) struct BmpObj {
    pub id: BitmapId,
    resources: Rc<RefCell<ResourceCache>>,
}

impl BmpObj {
    fn dims(&self) -> (i32, i32) {
        self.resources
            .borrow()
            .bitmap(self.id)
            .map(|b| (b.width(), b.height()))
            .unwrap_or((0, 0))
    }
}

impl UserData for BmpObj {
    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_method("setMask", |_, this, color: Value| {
            let mask = to_color(color)?;
            this.resources.borrow_mut().set_mask(this.id, mask);
            Ok(())
        });
        methods.add_method("width", |_, this, ()| Ok(this.dims().0));
        methods.add_method("height", |_, this, ()| Ok(this.dims().1));
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            let path = this
                .resources
                .borrow()
                .bitmap(this.id)
                .map(|b| b.path.clone())
                .unwrap_or_default();
            Ok(format!("BmpObj[{path}]"))
        });
    }
}

/// Accept a color name, `#rrggbb` text or a packed `0xRRGGBB` integer
pub(super) fn to_color(value: Value) -> LuaResult<Color> {
    match value {
        Value::Integer(i) => Ok(Color::from_u32(i as u32)),
        Value::Number(n) => Ok(Color::from_u32(n as u32)),
        Value::String(s) => s
            .to_str()?
            .parse::<Color>()
            .map_err(|e| LuaError::RuntimeError(e.to_string())),
        other => Err(LuaError::RuntimeError(format!(
            "expected a color, got {}",
            other.type_name()
        ))),
    }
}

/// A `G` function that only records into the bound surface
fn draw_fn<'lua, A, F>(lua: &'lua Lua, draw: F) -> LuaResult<Function<'lua>>
where
    A: for<'a> FromLuaMulti<'a>,
    F: Fn(&mut Surface, A) + 'static,
{
    lua.create_function(move |lua, args: A| {
        with_surface(lua, |surface| draw(surface, args))?;
        Ok(())
    })
}

fn style_of(lua: &Lua, ctx: &EngineContext, key: &str) -> String {
    state_data(lua)
        .map(|data| {
            let state = data.borrow().state_name.clone();
            ctx.config.style(&state, key).to_string()
        })
        .unwrap_or_default()
}

pub(super) fn register(lua: &Lua, ctx: &EngineContext) -> LuaResult<()> {
    let g = lua.create_table()?;
    g.set("FPS", ctx.settings.fps)?;
    g.set("SCREEN_WIDTH", ctx.settings.virtual_width)?;
    g.set("SCREEN_HEIGHT", ctx.settings.virtual_height)?;

    let ctx_color = ctx.clone();
    g.set(
        "setColor",
        lua.create_function(move |lua, color: Option<Value>| {
            let color = match color {
                Some(value) => to_color(value)?,
                None => style_of(lua, &ctx_color, "foreground")
                    .parse::<Color>()
                    .map_err(|e| LuaError::RuntimeError(e.to_string()))?,
            };
            with_surface(lua, |surface| surface.set_color(color))?;
            Ok(())
        })?,
    )?;

    g.set(
        "clip",
        draw_fn(lua, |s, (x0, y0, x1, y1): (i32, i32, i32, i32)| {
            s.push_clip(x0, y0, x1, y1)
        })?,
    )?;
    g.set("unclip", draw_fn(lua, |s, ()| s.pop_clip())?)?;
    g.set("pixel", draw_fn(lua, |s, (x, y): (i32, i32)| s.pixel(x, y))?)?;
    g.set(
        "line",
        draw_fn(lua, |s, (x0, y0, x1, y1): (i32, i32, i32, i32)| {
            s.line(x0, y0, x1, y1)
        })?,
    )?;
    g.set(
        "rect",
        draw_fn(lua, |s, (x0, y0, x1, y1): (i32, i32, i32, i32)| {
            s.rect(x0, y0, x1, y1)
        })?,
    )?;
    g.set(
        "fillRect",
        draw_fn(lua, |s, (x0, y0, x1, y1): (i32, i32, i32, i32)| {
            s.fill_rect(x0, y0, x1, y1)
        })?,
    )?;
    g.set(
        "circle",
        draw_fn(lua, |s, (x, y, r): (i32, i32, i32)| s.circle(x, y, r))?,
    )?;
    g.set(
        "fillCircle",
        draw_fn(lua, |s, (x, y, r): (i32, i32, i32)| s.fill_circle(x, y, r))?,
    )?;
    g.set(
        "ellipse",
        draw_fn(lua, |s, (x0, y0, x1, y1): (i32, i32, i32, i32)| {
            s.ellipse(x0, y0, x1, y1)
        })?,
    )?;
    g.set(
        "roundRect",
        draw_fn(lua, |s, (x0, y0, x1, y1, r): (i32, i32, i32, i32, i32)| {
            s.round_rect(x0, y0, x1, y1, r)
        })?,
    )?;
    g.set(
        "fillRoundRect",
        draw_fn(lua, |s, (x0, y0, x1, y1, r): (i32, i32, i32, i32, i32)| {
            s.fill_round_rect(x0, y0, x1, y1, r)
        })?,
    )?;
    g.set(
        "curve",
        draw_fn(
            lua,
            |s, (x0, y0, x1, y1, x2, y2): (i32, i32, i32, i32, i32, i32)| {
                s.curve(x0, y0, x1, y1, x2, y2)
            },
        )?,
    )?;

    g.set(
        "lerp",
        lua.create_function(|lua, (from, to, t): (Value, Value, f64)| {
            let color = to_color(from)?.lerp(to_color(to)?, t);
            with_surface(lua, |surface| surface.set_color(color))?;
            Ok(color.to_u32())
        })?,
    )?;

    g.set(
        "print",
        lua.create_function(|lua, (x, y, text): (i32, i32, Value)| {
            let text = lua
                .coerce_string(text)?
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            with_surface(lua, |surface| surface.puts(x, y, &text))?;
            Ok(())
        })?,
    )?;

    let ctx_font = ctx.clone();
    g.set(
        "setFont",
        lua.create_function(move |lua, name: Option<String>| {
            let name = name.unwrap_or_else(|| style_of(lua, &ctx_font, "font"));
            let font = name.parse::<Font>().map_err(LuaError::RuntimeError)?;
            with_surface(lua, |surface| surface.set_font(font))?;
            Ok(())
        })?,
    )?;

    g.set(
        "textDims",
        lua.create_function(|lua, text: String| {
            let dims = with_surface(lua, |surface| {
                (surface.text_width(&text), surface.text_height(&text))
            })?;
            Ok(dims.unwrap_or((0, 0)))
        })?,
    )?;

    type BlitArgs<'lua> = (
        AnyUserData<'lua>,
        i32,
        i32,
        Option<i32>,
        Option<i32>,
        Option<i32>,
        Option<i32>,
    );
    g.set(
        "blit",
        lua.create_function(|lua, (bmp, dx, dy, sx, sy, w, h): BlitArgs| {
            let bmp = bmp.borrow::<BmpObj>()?;
            let (mask, bw, bh) = {
                let resources = bmp.resources.borrow();
                match resources.bitmap(bmp.id) {
                    Some(b) => (b.mask, b.width(), b.height()),
                    None => return Ok(()),
                }
            };
            let blit = Blit {
                bitmap: bmp.id,
                dx,
                dy,
                sx: sx.unwrap_or(0),
                sy: sy.unwrap_or(0),
                w: w.unwrap_or(bw),
                h: h.unwrap_or(bh),
                mask,
            };
            with_surface(lua, |surface| surface.blit(blit))?;
            Ok(())
        })?,
    )?;

    lua.globals().set("G", g)?;

    let resources = ctx.resources.clone();
    lua.globals().set(
        "Bmp",
        lua.create_function(move |_, path: String| {
            let id = resources
                .borrow_mut()
                .load_bitmap(&path)
                .map_err(|e| LuaError::RuntimeError(format!("Unable to load bitmap '{path}': {e}")))?;
            Ok(BmpObj {
                id,
                resources: resources.clone(),
            })
        })?,
    )?;

    Ok(())
}
