//! Global functions available to Rhai states

use super::{halt, RhaiResult, SharedHost};
use crate::context::EngineContext;
use crate::frame::FrameDriver;
use crate::graphics::{Blit, Color, Font, Surface};
use crate::io::{GameDb, StoreScope};
use rhai::{Dynamic, Engine, EvalAltResult};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

const OUTSIDE_UPDATE: &str = "Call to graphics function outside of a screen update";

/// Script view of the mouse position, read live from the frame driver
#[derive(Clone)]
pub struct MouseView(Rc<RefCell<FrameDriver>>);

impl MouseView {
    pub fn new(frame: Rc<RefCell<FrameDriver>>) -> Self {
        Self(frame)
    }

    fn x(&mut self) -> i64 {
        self.0.borrow().input().mouse_position.0 as i64
    }

    fn y(&mut self) -> i64 {
        self.0.borrow().input().mouse_position.1 as i64
    }
}

fn with_surface<R>(data: &SharedHost, draw: impl FnOnce(&mut Surface) -> R) -> RhaiResult<R> {
    let mut data = data.borrow_mut();
    match data.surface.as_mut() {
        Some(surface) => Ok(draw(surface)),
        None => Err(OUTSIDE_UPDATE.into()),
    }
}

fn parse_color(spec: &str) -> RhaiResult<Color> {
    spec.parse::<Color>()
        .map_err(|e| -> Box<EvalAltResult> { e.to_string().into() })
}

/// Present the frame and pump input, unwinding the script on quit
fn show_frame(ctx: &EngineContext, data: &SharedHost) -> RhaiResult<()> {
    {
        let mut data = data.borrow_mut();
        let mut frame = ctx.frame.borrow_mut();
        match data.surface.as_mut() {
            Some(surface) => frame.advance_frame(surface),
            None => frame.advance_frame(&mut ctx.new_surface()),
        }
    }
    if ctx.quit_requested() {
        return Err(halt());
    }
    Ok(())
}

fn style(ctx: &EngineContext, data: &SharedHost, key: &str) -> String {
    let state = data.borrow().state_name.clone();
    ctx.config.style(&state, key).to_string()
}

/// Print at the cursor and move it to the next line
fn print_at_cursor(data: &SharedHost, text: &str) {
    let mut data = data.borrow_mut();
    let (x, y) = data.cursor.get();
    let Some(surface) = data.surface.as_mut() else {
        warn!(text = text, "print outside of a screen update");
        return;
    };
    let (x, y) = (x as i32, y as i32);
    surface.puts(x, y, text);
    let h = surface.text_height(text).max(8);
    data.cursor.set(x as i64, (y + h + 1) as i64);
}

fn register_drawing(engine: &mut Engine, data: &SharedHost) {
    let d = data.clone();
    engine.register_fn("pixel", move |x: i64, y: i64| {
        with_surface(&d, |s| s.pixel(x as i32, y as i32))
    });
    let d = data.clone();
    engine.register_fn("line", move |x0: i64, y0: i64, x1: i64, y1: i64| {
        with_surface(&d, |s| s.line(x0 as i32, y0 as i32, x1 as i32, y1 as i32))
    });
    let d = data.clone();
    engine.register_fn("rect", move |x0: i64, y0: i64, x1: i64, y1: i64| {
        with_surface(&d, |s| s.rect(x0 as i32, y0 as i32, x1 as i32, y1 as i32))
    });
    let d = data.clone();
    engine.register_fn("fillrect", move |x0: i64, y0: i64, x1: i64, y1: i64| {
        with_surface(&d, |s| {
            s.fill_rect(x0 as i32, y0 as i32, x1 as i32, y1 as i32)
        })
    });
    let d = data.clone();
    engine.register_fn("circle", move |x: i64, y: i64, r: i64| {
        with_surface(&d, |s| s.circle(x as i32, y as i32, r as i32))
    });
    let d = data.clone();
    engine.register_fn("fillcircle", move |x: i64, y: i64, r: i64| {
        with_surface(&d, |s| s.fill_circle(x as i32, y as i32, r as i32))
    });
    let d = data.clone();
    engine.register_fn("ellipse", move |x0: i64, y0: i64, x1: i64, y1: i64| {
        with_surface(&d, |s| s.ellipse(x0 as i32, y0 as i32, x1 as i32, y1 as i32))
    });
    let d = data.clone();
    engine.register_fn(
        "roundrect",
        move |x0: i64, y0: i64, x1: i64, y1: i64, r: i64| {
            with_surface(&d, |s| {
                s.round_rect(x0 as i32, y0 as i32, x1 as i32, y1 as i32, r as i32)
            })
        },
    );
    let d = data.clone();
    engine.register_fn(
        "fillroundrect",
        move |x0: i64, y0: i64, x1: i64, y1: i64, r: i64| {
            with_surface(&d, |s| {
                s.fill_round_rect(x0 as i32, y0 as i32, x1 as i32, y1 as i32, r as i32)
            })
        },
    );
    let d = data.clone();
    engine.register_fn(
        "curve",
        move |x0: i64, y0: i64, x1: i64, y1: i64, x2: i64, y2: i64| {
            with_surface(&d, |s| {
                s.curve(
                    x0 as i32, y0 as i32, x1 as i32, y1 as i32, x2 as i32, y2 as i32,
                )
            })
        },
    );
}

fn register_bitmaps(engine: &mut Engine, ctx: &EngineContext, data: &SharedHost) {
    let resources = ctx.resources.clone();
    engine.register_fn("loadbmp", move |file: &str| -> RhaiResult<()> {
        resources
            .borrow_mut()
            .load_bitmap(file)
            .map(|_| ())
            .map_err(|e| format!("Unable to load bitmap '{file}': {e}").into())
    });

    // Plain blit centered on the screen, meant for backgrounds
    let resources = ctx.resources.clone();
    let d = data.clone();
    engine.register_fn("draw", move |file: &str| -> RhaiResult<()> {
        let mut resources = resources.borrow_mut();
        let id = resources
            .load_bitmap(file)
            .map_err(|e| -> Box<EvalAltResult> {
                format!("Unable to load bitmap '{file}': {e}").into()
            })?;
        let (w, h) = resources
            .bitmap(id)
            .map(|b| (b.width(), b.height()))
            .unwrap_or((0, 0));
        with_surface(&d, |s| {
            let (dx, dy) = ((s.width() - w) >> 1, (s.height() - h) >> 1);
            s.blit(Blit {
                bitmap: id,
                dx,
                dy,
                sx: 0,
                sy: 0,
                w,
                h,
                mask: None,
            })
        })
    });

    let resources = ctx.resources.clone();
    engine.register_fn("setmask", move |file: &str, mask: &str| -> RhaiResult<()> {
        let mask = parse_color(mask)?;
        let mut resources = resources.borrow_mut();
        let id = resources
            .load_bitmap(file)
            .map_err(|e| -> Box<EvalAltResult> {
                format!("Unable to load bitmap '{file}': {e}").into()
            })?;
        resources.set_mask(id, mask);
        Ok(())
    });

    let masked_blit = {
        let resources = ctx.resources.clone();
        let d = data.clone();
        Rc::new(
            move |file: &str, dx: i64, dy: i64, src: Option<(i64, i64, i64, i64)>| -> RhaiResult<()> {
                let mut resources = resources.borrow_mut();
                let id = resources
                    .load_bitmap(file)
                    .map_err(|e| -> Box<EvalAltResult> {
                        format!("Unable to load bitmap '{file}': {e}").into()
                    })?;
                let Some(bitmap) = resources.bitmap(id) else {
                    return Ok(());
                };
                let (sx, sy, w, h) =
                    src.unwrap_or((0, 0, bitmap.width() as i64, bitmap.height() as i64));
                let blit = Blit {
                    bitmap: id,
                    dx: dx as i32,
                    dy: dy as i32,
                    sx: sx as i32,
                    sy: sy as i32,
                    w: w as i32,
                    h: h as i32,
                    mask: bitmap.mask,
                };
                with_surface(&d, |s| s.blit(blit))
            },
        )
    };
    let blit = masked_blit.clone();
    engine.register_fn("blit", move |file: &str, dx: i64, dy: i64| {
        blit(file, dx, dy, None)
    });
    let blit = masked_blit;
    engine.register_fn(
        "blit",
        move |file: &str, dx: i64, dy: i64, sx: i64, sy: i64, w: i64, h: i64| {
            blit(file, dx, dy, Some((sx, sy, w, h)))
        },
    );
}

fn scope_of(db: &GameDb, local: bool) -> &StoreScope {
    if local {
        db.local()
    } else {
        db.shared()
    }
}

fn register_store(engine: &mut Engine, ctx: &EngineContext, prefix: &str, local: bool) {
    let store = ctx.store.clone();
    engine.register_fn(format!("{prefix}_get"), move |key: &str| -> Dynamic {
        let db = store.borrow();
        scope_of(&db, local)
            .get(key)
            .map(|v| Dynamic::from(v.to_string()))
            .unwrap_or(Dynamic::UNIT)
    });
    let store = ctx.store.clone();
    engine.register_fn(
        format!("{prefix}_get"),
        move |key: &str, default: Dynamic| -> Dynamic {
            let db = store.borrow();
            scope_of(&db, local)
                .get(key)
                .map(|v| Dynamic::from(v.to_string()))
                .unwrap_or(default)
        },
    );
    let store = ctx.store.clone();
    engine.register_fn(format!("{prefix}_has"), move |key: &str| {
        scope_of(&store.borrow(), local).has(key)
    });

    let store = ctx.store.clone();
    engine.register_fn(format!("{prefix}_set"), move |key: &str, value: Dynamic| {
        let mut db = store.borrow_mut();
        let scope = if local {
            db.local_mut()
        } else {
            db.shared_mut()
        };
        scope.set(key, value.to_string());
    });
}

/// Register every function, plus the `Mouse` type and print redirection
pub(super) fn register(engine: &mut Engine, ctx: &EngineContext, data: &SharedHost) {
    engine
        .register_type_with_name::<MouseView>("Mouse")
        .register_get("x", MouseView::x)
        .register_get("y", MouseView::y);

    let d = data.clone();
    engine.on_print(move |text| print_at_cursor(&d, text));
    engine.on_debug(|text, source, pos| {
        debug!(source = "rhai", script = source.unwrap_or(""), line = pos.line().unwrap_or(0), "{}", text);
    });

    let (c, d) = (ctx.clone(), data.clone());
    engine.register_fn("cls", move || -> RhaiResult<()> {
        let color = parse_color(&style(&c, &d, "background"))?;
        with_surface(&d, |s| {
            s.set_color(color);
            s.clear(color)
        })
    });
    let d = data.clone();
    engine.register_fn("cls", move |color: &str| -> RhaiResult<()> {
        let color = parse_color(color)?;
        with_surface(&d, |s| {
            s.set_color(color);
            s.clear(color)
        })
    });

    let (c, d) = (ctx.clone(), data.clone());
    engine.register_fn("show", move || show_frame(&c, &d));

    let (c, d) = (ctx.clone(), data.clone());
    engine.register_fn("color", move || -> RhaiResult<()> {
        let color = parse_color(&style(&c, &d, "foreground"))?;
        with_surface(&d, |s| s.set_color(color))
    });
    let d = data.clone();
    engine.register_fn("color", move |color: &str| -> RhaiResult<()> {
        let color = parse_color(color)?;
        with_surface(&d, |s| s.set_color(color))
    });

    let set_font = {
        let d = data.clone();
        Rc::new(move |name: &str| -> RhaiResult<String> {
            let font = name.parse::<Font>().unwrap_or_default();
            with_surface(&d, |s| s.set_font(font))?;
            Ok(font.name().to_string())
        })
    };
    let (c, d, f) = (ctx.clone(), data.clone(), set_font.clone());
    engine.register_fn("font", move || f(style(&c, &d, "font").as_str()));
    let f = set_font;
    engine.register_fn("font", move |name: &str| f(name));

    let d = data.clone();
    engine.register_fn("gotoxy", move |x: i64, y: i64| d.borrow().cursor.set(x, y));

    let d = data.clone();
    engine.register_fn("centertext", move |text: &str| {
        with_surface(&d, |s| {
            let x = (s.width() - s.text_width(text)) >> 1;
            let y = (s.height() - s.text_height(text)) >> 1;
            s.puts(x, y, text)
        })
    });

    let frame = ctx.frame.clone();
    engine.register_fn("kbhit", move || frame.borrow().input().any_key().is_some());
    let frame = ctx.frame.clone();
    engine.register_fn("kbhit", move |key: &str| frame.borrow().input().key_down(key));
    let frame = ctx.frame.clone();
    engine.register_fn("kbclr", move || frame.borrow_mut().input_mut().reset_keys());
    let frame = ctx.frame.clone();
    engine.register_fn("kbclr", move |key: &str| {
        frame.borrow_mut().input_mut().release_key(key)
    });

    engine.register_fn("log", |message: Dynamic| {
        info!(source = "rhai", "{}", message);
    });

    let particles = ctx.particles.clone();
    engine.register_fn("clear_particles", move || particles.borrow_mut().clear());

    let (c, d) = (ctx.clone(), data.clone());
    engine.register_fn("delay", move |ms: i64| -> RhaiResult<()> {
        let start = c.frame.borrow().ticks();
        loop {
            show_frame(&c, &d)?;
            let pause = c.frame.borrow().frame_ms();
            c.frame.borrow_mut().sleep(pause);
            if c.frame.borrow().ticks().saturating_sub(start) >= ms.max(0) as u64 {
                return Ok(());
            }
        }
    });

    register_drawing(engine, data);
    register_bitmaps(engine, ctx, data);
    register_store(engine, ctx, "db", false);
    register_store(engine, ctx, "local", true);
}
