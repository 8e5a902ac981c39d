//! Countdown engine implementation.
//!
//! The engine is a second-granularity state machine. It does not schedule
//! itself - the host is responsible for calling `tick()` once per second
//! while the timer is running (see [`crate::driver`]).
//!
//! ## Mode cycle
//!
//! ```text
//! Focus -> ShortBreak -> Focus -> ... (every 4th Focus) -> LongBreak -> Focus
//! ```
//!
//! Every completion leaves the engine paused in the next mode. Completion
//! hooks run on a background thread and never delay `tick()`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(Durations::default());
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Some(Event::SessionCompleted) when a mode finishes
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::format::format_clock;
use super::mode::{parse_minutes, Durations, Mode};

use crate::alerts::{CompletionHook, HookDispatcher};
use crate::events::Event;

/// Point-in-time view of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: Mode,
    pub is_running: bool,
    pub remaining_seconds: u32,
    pub completed_focus_sessions: u32,
}

impl TimerState {
    pub fn clock(&self) -> String {
        format_clock(self.remaining_seconds)
    }
}

/// Core countdown engine.
///
/// Owns the configured durations and the countdown state. Mutated only
/// through the command methods and `tick()`.
pub struct TimerEngine {
    durations: Durations,
    mode: Mode,
    is_running: bool,
    remaining_seconds: u32,
    completed_focus_sessions: u32,
    hooks: HookDispatcher,
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("durations", &self.durations)
            .field("mode", &self.mode)
            .field("is_running", &self.is_running)
            .field("remaining_seconds", &self.remaining_seconds)
            .field("completed_focus_sessions", &self.completed_focus_sessions)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl TimerEngine {
    /// Create a paused engine in Focus mode with the full focus duration.
    pub fn new(durations: Durations) -> Self {
        Self {
            durations,
            mode: Mode::Focus,
            is_running: false,
            remaining_seconds: durations.seconds(Mode::Focus),
            completed_focus_sessions: 0,
            hooks: HookDispatcher::new(),
        }
    }

    /// Register a hook that is told about every completion.
    pub fn add_hook(&mut self, hook: Box<dyn CompletionHook>) {
        self.hooks.add(Arc::from(hook));
    }

    pub fn with_hook(mut self, hook: Box<dyn CompletionHook>) -> Self {
        self.add_hook(hook);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        TimerState {
            mode: self.mode,
            is_running: self.is_running,
            remaining_seconds: self.remaining_seconds,
            completed_focus_sessions: self.completed_focus_sessions,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn completed_focus_sessions(&self) -> u32 {
        self.completed_focus_sessions
    }

    pub fn durations(&self) -> &Durations {
        &self.durations
    }

    pub fn total_seconds(&self) -> u32 {
        self.durations.seconds(self.mode)
    }

    /// Remaining time as `MM:SS`.
    pub fn clock(&self) -> String {
        format_clock(self.remaining_seconds)
    }

    /// 0.0 .. 1.0 progress within the current mode.
    pub fn progress(&self) -> f64 {
        let total = self.total_seconds();
        if total == 0 {
            return 0.0;
        }
        (1.0 - (self.remaining_seconds as f64 / total as f64)).clamp(0.0, 1.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            mode: self.mode,
            is_running: self.is_running,
            remaining_seconds: self.remaining_seconds,
            total_seconds: self.total_seconds(),
            clock: self.clock(),
            completed_focus_sessions: self.completed_focus_sessions,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Change the configured duration of `mode`.
    ///
    /// Non-positive values are ignored and `None` is returned. When `mode`
    /// is the active mode the countdown restarts from the new duration,
    /// whether or not it is running.
    pub fn set_duration(&mut self, mode: Mode, minutes: i64) -> Option<Event> {
        if !self.durations.set(mode, minutes) {
            tracing::debug!(%mode, minutes, "ignoring invalid duration");
            return None;
        }
        let applied_now = mode == self.mode;
        if applied_now {
            self.remaining_seconds = self.durations.seconds(mode);
        }
        Some(Event::DurationChanged {
            mode,
            minutes: self.durations.minutes(mode),
            applied_now,
            at: Utc::now(),
        })
    }

    /// Like [`set_duration`](Self::set_duration), for raw user text.
    pub fn set_duration_input(&mut self, mode: Mode, input: &str) -> Option<Event> {
        match parse_minutes(input) {
            Some(minutes) => self.set_duration(mode, minutes),
            None => {
                tracing::debug!(%mode, input, "ignoring non-numeric duration");
                None
            }
        }
    }

    pub fn start(&mut self) -> Option<Event> {
        if self.is_running {
            return None;
        }
        self.is_running = true;
        Some(Event::TimerStarted {
            mode: self.mode,
            remaining_seconds: self.remaining_seconds,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.is_running {
            return None;
        }
        self.is_running = false;
        Some(Event::TimerPaused {
            mode: self.mode,
            remaining_seconds: self.remaining_seconds,
            at: Utc::now(),
        })
    }

    pub fn toggle_start_pause(&mut self) -> Option<Event> {
        if self.is_running {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Back to a paused, full-length Focus countdown.
    ///
    /// The completed-session count is kept.
    pub fn reset(&mut self) -> Option<Event> {
        self.is_running = false;
        self.mode = Mode::Focus;
        self.remaining_seconds = self.durations.seconds(Mode::Focus);
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Manually enter `new_mode`. Always pauses and never counts a session.
    pub fn switch_mode(&mut self, new_mode: Mode) -> Option<Event> {
        let from = self.mode;
        self.is_running = false;
        self.mode = new_mode;
        self.remaining_seconds = self.durations.seconds(new_mode);
        Some(Event::ModeSwitched {
            from,
            to: new_mode,
            at: Utc::now(),
        })
    }

    /// Call once per second. Returns `Some(Event::SessionCompleted)` when
    /// the countdown of the current mode finishes.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.is_running {
            return None;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return None;
        }
        Some(self.complete())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Event {
        let previous_mode = self.mode;
        if previous_mode == Mode::Focus {
            self.completed_focus_sessions = self.completed_focus_sessions.saturating_add(1);
        }
        let next_mode = previous_mode.next_after_completion(self.completed_focus_sessions);

        self.is_running = false;
        self.mode = next_mode;
        self.remaining_seconds = self.durations.seconds(next_mode);

        tracing::info!(
            previous = %previous_mode,
            next = %next_mode,
            completed = self.completed_focus_sessions,
            "session complete"
        );
        self.hooks.dispatch(previous_mode);

        Event::SessionCompleted {
            previous_mode,
            next_mode,
            completed_focus_sessions: self.completed_focus_sessions,
            at: Utc::now(),
        }
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(Durations::default())
    }
}
