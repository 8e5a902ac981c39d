use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Number of focus completions that earn a long break.
pub const FOCUS_SESSIONS_PER_LONG_BREAK: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    #[default]
    Focus,
    ShortBreak,
    LongBreak,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Focus, Mode::ShortBreak, Mode::LongBreak];

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Focus => "Focus",
            Mode::ShortBreak => "Short Break",
            Mode::LongBreak => "Long Break",
        }
    }

    /// Mode entered after this one completes, given the focus count
    /// *after* any increment for this completion.
    pub fn next_after_completion(&self, completed_focus_sessions: u32) -> Mode {
        match self {
            Mode::Focus if completed_focus_sessions % FOCUS_SESSIONS_PER_LONG_BREAK == 0 => {
                Mode::LongBreak
            }
            Mode::Focus => Mode::ShortBreak,
            Mode::ShortBreak | Mode::LongBreak => Mode::Focus,
        }
    }
}

/// Accepts the serialized names plus the short aliases used on the
/// command line (`short`, `long`).
impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "focus" | "f" => Ok(Mode::Focus),
            "shortbreak" | "short_break" | "short" => Ok(Mode::ShortBreak),
            "longbreak" | "long_break" | "long" => Ok(Mode::LongBreak),
            other => Err(ConfigError::InvalidValue {
                key: "mode".into(),
                message: format!("unknown mode '{other}'"),
            }),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Configured length of each mode, in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
}

fn default_focus_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
        }
    }
}

impl Durations {
    pub fn minutes(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Focus => self.focus_minutes,
            Mode::ShortBreak => self.short_break_minutes,
            Mode::LongBreak => self.long_break_minutes,
        }
    }

    /// Duration of `mode` in seconds.
    pub fn seconds(&self, mode: Mode) -> u32 {
        self.minutes(mode).saturating_mul(60)
    }

    /// Store a new duration if it is a valid one.
    ///
    /// Returns `false` (and changes nothing) when `minutes` is not positive
    /// or cannot be expressed in seconds.
    pub fn set(&mut self, mode: Mode, minutes: i64) -> bool {
        let Some(minutes) = validate_minutes(minutes) else {
            return false;
        };
        match mode {
            Mode::Focus => self.focus_minutes = minutes,
            Mode::ShortBreak => self.short_break_minutes = minutes,
            Mode::LongBreak => self.long_break_minutes = minutes,
        }
        true
    }

    /// Whether every duration is positive.
    pub fn is_valid(&self) -> bool {
        Mode::ALL
            .iter()
            .all(|m| validate_minutes(self.minutes(*m) as i64).is_some())
    }
}

/// Accept a minute count only if it is positive and `minutes * 60` fits in a `u32`.
pub fn validate_minutes(minutes: i64) -> Option<u32> {
    if minutes <= 0 {
        return None;
    }
    let minutes = u32::try_from(minutes).ok()?;
    minutes.checked_mul(60)?;
    Some(minutes)
}

/// Parse raw user text as a minute count.
///
/// Leading/trailing whitespace is ignored; anything that is not an integer
/// (empty, `abc`, `12.5`) yields `None`.
pub fn parse_minutes(input: &str) -> Option<i64> {
    input.trim().parse::<i64>().ok()
}
