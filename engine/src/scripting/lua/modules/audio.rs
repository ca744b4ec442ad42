//! `Sound` channel control plus the `Wav` and `Music` wrappers

use crate::audio::{channel_index, Loops, Mixer};
use crate::context::EngineContext;
use crate::io::{MusicId, SoundId};
use mlua::{
    AnyUserData, Error as LuaError, Lua, MetaMethod, Result as LuaResult, UserData,
    UserDataMethods, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Script handle to a cached sound effect
pub(crate) struct SndObj {
    pub id: SoundId,
    path: String,
}

impl UserData for SndObj {
    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!("SndObj[{}]", this.path))
        });
    }
}

/// Script handle to a cached music track
pub(crate) struct MusicObj {
    pub id: MusicId,
    path: String,
    mixer: Rc<RefCell<dyn Mixer>>,
}

impl UserData for MusicObj {
    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_method("play", |_, this, loops: Option<i64>| {
            this.mixer.borrow_mut().play_music(this.id, loops_of(loops));
            Ok(())
        });
        methods.add_method("halt", |_, this, ()| {
            this.mixer.borrow_mut().halt_music();
            Ok(())
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!("MusicObj[{}]", this.path))
        });
    }
}

/// A missing or negative count repeats forever
fn loops_of(count: Option<i64>) -> Loops {
    match count {
        Some(n) if n >= 0 => Loops::Times(n.clamp(1, u32::MAX as i64) as u32),
        _ => Loops::Forever,
    }
}

fn channel(ch: Option<i64>) -> LuaResult<Option<usize>> {
    ch.map(channel_index)
        .transpose()
        .map_err(|e| LuaError::RuntimeError(e.to_string()))
}

fn sound_id(snd: &AnyUserData) -> LuaResult<SoundId> {
    Ok(snd.borrow::<SndObj>()?.id)
}

pub(super) fn register(lua: &Lua, ctx: &EngineContext) -> LuaResult<()> {
    let sound = lua.create_table()?;

    let mixer = ctx.mixer.clone();
    sound.set(
        "play",
        lua.create_function(move |_, snd: AnyUserData| {
            let id = sound_id(&snd)?;
            mixer
                .borrow_mut()
                .play(id, Loops::Times(1))
                .map_err(|e| LuaError::RuntimeError(format!("Sound.play(): {e}")))
        })?,
    )?;

    let mixer = ctx.mixer.clone();
    sound.set(
        "loop",
        lua.create_function(move |_, (snd, count): (AnyUserData, Option<i64>)| {
            let id = sound_id(&snd)?;
            mixer
                .borrow_mut()
                .play(id, loops_of(count))
                .map_err(|e| LuaError::RuntimeError(format!("Sound.loop(): {e}")))
        })?,
    )?;

    let mixer = ctx.mixer.clone();
    sound.set(
        "pause",
        lua.create_function(move |_, ch: Option<i64>| {
            mixer.borrow_mut().pause(channel(ch)?);
            Ok(())
        })?,
    )?;

    let mixer = ctx.mixer.clone();
    sound.set(
        "resume",
        lua.create_function(move |_, ch: Option<i64>| {
            mixer.borrow_mut().resume(channel(ch)?);
            Ok(())
        })?,
    )?;

    let mixer = ctx.mixer.clone();
    sound.set(
        "halt",
        lua.create_function(move |_, ch: Option<i64>| {
            mixer.borrow_mut().halt(channel(ch)?);
            Ok(())
        })?,
    )?;

    // With a channel these answer yes/no, without one they count channels
    let mixer = ctx.mixer.clone();
    sound.set(
        "playing",
        lua.create_function(move |_, ch: Option<i64>| {
            let selected = channel(ch)?;
            let count = mixer.borrow().playing(selected);
            Ok(match selected {
                Some(_) => Value::Boolean(count > 0),
                None => Value::Integer(count as i64),
            })
        })?,
    )?;

    let mixer = ctx.mixer.clone();
    sound.set(
        "paused",
        lua.create_function(move |_, ch: Option<i64>| {
            let selected = channel(ch)?;
            let count = mixer.borrow().paused(selected);
            Ok(match selected {
                Some(_) => Value::Boolean(count > 0),
                None => Value::Integer(count as i64),
            })
        })?,
    )?;

    let mixer = ctx.mixer.clone();
    sound.set(
        "volume",
        lua.create_function(move |_, (first, second): (f64, Option<f64>)| {
            let (selected, volume) = match second {
                Some(volume) => (channel(Some(first as i64))?, volume),
                None => (None, first),
            };
            Ok(mixer.borrow_mut().volume(selected, volume))
        })?,
    )?;
    lua.globals().set("Sound", sound)?;

    let resources = ctx.resources.clone();
    lua.globals().set(
        "Wav",
        lua.create_function(move |_, path: String| {
            let id = resources.borrow_mut().load_sound(&path).map_err(|e| {
                LuaError::RuntimeError(format!("Unable to load WAV file '{path}': {e}"))
            })?;
            Ok(SndObj { id, path })
        })?,
    )?;

    let resources = ctx.resources.clone();
    let mixer = ctx.mixer.clone();
    lua.globals().set(
        "Music",
        lua.create_function(move |_, path: String| {
            let id = resources.borrow_mut().load_music(&path).map_err(|e| {
                LuaError::RuntimeError(format!("Unable to load music file '{path}': {e}"))
            })?;
            Ok(MusicObj {
                id,
                path,
                mixer: mixer.clone(),
            })
        })?,
    )?;

    Ok(())
}
