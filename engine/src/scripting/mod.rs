//! Scripted game states
//!
//! Two hosts are provided. Lua states run their script once and are then
//! driven through the callbacks it registered. Rhai states re-run their
//! whole script on every frame and name the next state in a variable.
//! Both share the timer/callback bookkeeping and the deferred transition.

mod lua;
mod rhai_host;
pub mod scheduler;
pub mod transition;

pub use lua::{is_quit, LuaState, QuitRequested, OUTSIDE_UPDATE, STATE_DATA_VAR};
pub use rhai_host::{is_halt, RhaiState, TextCursor, NEXT_STATE_VAR};
pub use scheduler::{CallbackId, CallbackRegistry, SchedulerError, TimeoutList, MAX_TIMEOUTS};
pub use transition::{PendingTransition, Transition};

// Re-export commonly used interpreter types
pub use rhai::{Dynamic, EvalAltResult};
