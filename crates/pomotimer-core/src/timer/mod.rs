mod engine;
mod format;
mod mode;

pub use engine::{TimerEngine, TimerState};
pub use format::format_clock;
pub use mode::{
    parse_minutes, validate_minutes, Durations, Mode, FOCUS_SESSIONS_PER_LONG_BREAK,
};
