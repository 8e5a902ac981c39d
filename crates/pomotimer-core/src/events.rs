use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Mode;

/// Every observable state change of the engine produces an Event.
/// Front ends render them; completion hooks react to `SessionCompleted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: Mode,
        remaining_seconds: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: Mode,
        remaining_seconds: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    ModeSwitched {
        from: Mode,
        to: Mode,
        at: DateTime<Utc>,
    },
    DurationChanged {
        mode: Mode,
        minutes: u32,
        /// Whether the edit targeted the active mode and reset the countdown.
        applied_now: bool,
        at: DateTime<Utc>,
    },
    /// The countdown reached zero while running.
    SessionCompleted {
        previous_mode: Mode,
        next_mode: Mode,
        completed_focus_sessions: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: Mode,
        is_running: bool,
        remaining_seconds: u32,
        total_seconds: u32,
        clock: String,
        completed_focus_sessions: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn is_completion(&self) -> bool {
        matches!(self, Event::SessionCompleted { .. })
    }
}
