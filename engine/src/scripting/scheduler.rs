//! Callback scheduling for scripted states
//!
//! Holds script callbacks of any handle type `C`: one-shot timers with a
//! fixed capacity, callbacks run every frame in registration order, and
//! callbacks run once, newest first, when the state exits.

use thiserror::Error;
use tracing::trace;

/// Maximum number of pending timers per state
pub const MAX_TIMEOUTS: usize = 20;

/// Errors raised when registering callbacks
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("too many pending timeouts (limit is {0})")]
    Capacity(usize),
}

#[derive(Debug)]
struct Timeout<C> {
    callback: C,
    delay_ms: u64,
    registered_at: u64,
    epoch: u64,
}

/// Cursor for one pass over the timer list
#[derive(Debug)]
pub struct TimeoutScan {
    index: usize,
    epoch: u64,
}

/// Fixed-capacity list of one-shot timers
///
/// Fired timers are removed by moving the last timer into their slot, so
/// the relative firing order of different timers is not preserved.
#[derive(Debug)]
pub struct TimeoutList<C> {
    slots: Vec<Timeout<C>>,
    epoch: u64,
}

impl<C> Default for TimeoutList<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> TimeoutList<C> {
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(MAX_TIMEOUTS),
            epoch: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= MAX_TIMEOUTS
    }

    /// Register `callback` to fire once `delay_ms` after `now`
    pub fn register(&mut self, callback: C, delay_ms: u64, now: u64) -> Result<(), SchedulerError> {
        if self.is_full() {
            return Err(SchedulerError::Capacity(MAX_TIMEOUTS));
        }
        self.slots.push(Timeout {
            callback,
            delay_ms,
            registered_at: now,
            epoch: self.epoch,
        });
        trace!(delay_ms, pending = self.slots.len(), "Registered timeout");
        Ok(())
    }

    /// Start a pass; timers registered from here on wait for the next pass
    pub fn begin_scan(&mut self) -> TimeoutScan {
        self.epoch += 1;
        TimeoutScan {
            index: 0,
            epoch: self.epoch,
        }
    }

    /// Remove and return the next due timer of this pass
    ///
    /// The caller runs the callback between calls, and may register new
    /// timers while doing so.
    pub fn next_due(&mut self, scan: &mut TimeoutScan, now: u64) -> Option<C> {
        while scan.index < self.slots.len() {
            let timeout = &self.slots[scan.index];
            let elapsed = now.saturating_sub(timeout.registered_at);
            if timeout.epoch < scan.epoch && elapsed >= timeout.delay_ms {
                // The slot is refilled from the end; stay on this index
                let fired = self.slots.swap_remove(scan.index);
                return Some(fired.callback);
            }
            scan.index += 1;
        }
        None
    }

    /// Remove every pending timer
    pub fn drain(&mut self) -> Vec<C> {
        self.slots.drain(..).map(|t| t.callback).collect()
    }
}

/// Identifier returned when a per-frame callback is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(pub u64);

/// Per-frame and on-exit callback lists
#[derive(Debug)]
pub struct CallbackRegistry<C> {
    per_frame: Vec<(CallbackId, C)>,
    on_exit: Vec<C>,
    next_id: u64,
}

impl<C> Default for CallbackRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CallbackRegistry<C> {
    pub fn new() -> Self {
        Self {
            per_frame: Vec::new(),
            on_exit: Vec::new(),
            next_id: 1,
        }
    }

    /// Append a callback to the per-frame list
    pub fn on_frame(&mut self, callback: C) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.per_frame.push((id, callback));
        id
    }

    /// Add a callback that runs when the state exits
    pub fn on_exit(&mut self, callback: C) {
        self.on_exit.push(callback);
    }

    /// Number of per-frame callbacks
    pub fn frame_len(&self) -> usize {
        self.per_frame.len()
    }

    pub fn exit_len(&self) -> usize {
        self.on_exit.len()
    }

    /// Per-frame callback at `index`, in registration order
    pub fn frame_callback(&self, index: usize) -> Option<&C> {
        self.per_frame.get(index).map(|(_, c)| c)
    }

    /// Pop the most recently registered on-exit callback
    pub fn pop_exit(&mut self) -> Option<C> {
        self.on_exit.pop()
    }

    /// Remove every callback of both lists
    pub fn drain(&mut self) -> Vec<C> {
        let mut all: Vec<C> = self.per_frame.drain(..).map(|(_, c)| c).collect();
        all.extend(self.on_exit.drain(..));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire_all(list: &mut TimeoutList<&'static str>, now: u64) -> Vec<&'static str> {
        let mut scan = list.begin_scan();
        let mut fired = Vec::new();
        while let Some(cb) = list.next_due(&mut scan, now) {
            fired.push(cb);
        }
        fired
    }

    #[test]
    fn test_timer_fires_once_when_due() {
        let mut list = TimeoutList::new();
        list.register("a", 100, 1000).unwrap();

        assert!(fire_all(&mut list, 1099).is_empty());
        assert_eq!(fire_all(&mut list, 1100), vec!["a"]);
        assert!(fire_all(&mut list, 5000).is_empty());
        assert!(list.is_empty());
    }

    #[test]
    fn test_capacity_error_on_twenty_first() {
        let mut list = TimeoutList::new();
        for _ in 0..MAX_TIMEOUTS {
            list.register("t", 10, 0).unwrap();
        }
        assert_eq!(
            list.register("t", 10, 0),
            Err(SchedulerError::Capacity(MAX_TIMEOUTS))
        );

        // Firing one frees its slot for the next registration
        let mut scan = list.begin_scan();
        assert!(list.next_due(&mut scan, 10).is_some());
        list.register("t", 10, 0).unwrap();
    }

    #[test]
    fn test_swap_remove_rechecks_moved_slot() {
        let mut list = TimeoutList::new();
        list.register("a", 10, 0).unwrap();
        list.register("b", 99, 0).unwrap();
        list.register("c", 10, 0).unwrap();

        // "a" fires, "c" moves into slot 0 and is still seen in this pass
        assert_eq!(fire_all(&mut list, 10), vec!["a", "c"]);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_registered_during_scan_waits_for_next_pass() {
        let mut list = TimeoutList::new();
        list.register("a", 0, 0).unwrap();

        let mut scan = list.begin_scan();
        assert_eq!(list.next_due(&mut scan, 5), Some("a"));
        list.register("b", 0, 5).unwrap();
        assert_eq!(list.next_due(&mut scan, 5), None);

        assert_eq!(fire_all(&mut list, 5), vec!["b"]);
    }

    #[test]
    fn test_frame_callbacks_keep_order_and_exit_is_lifo() {
        let mut registry = CallbackRegistry::new();
        let first = registry.on_frame("one");
        let second = registry.on_frame("two");
        registry.on_frame("three");
        assert_ne!(first, second);

        let order: Vec<_> = (0..registry.frame_len())
            .filter_map(|i| registry.frame_callback(i).copied())
            .collect();
        assert_eq!(order, vec!["one", "two", "three"]);

        registry.on_exit("x");
        registry.on_exit("y");
        assert_eq!(registry.pop_exit(), Some("y"));
        assert_eq!(registry.pop_exit(), Some("x"));
        assert_eq!(registry.pop_exit(), None);

        assert_eq!(registry.drain().len(), 3);
        assert_eq!(registry.frame_len(), 0);
    }
}
