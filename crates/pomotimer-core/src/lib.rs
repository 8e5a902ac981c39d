//! # Pomotimer Core Library
//!
//! Business logic for the Pomotimer focus/break timer. The terminal front
//! end in `pomotimer-cli` is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a second-granularity state machine cycling through
//!   Focus, Short Break and Long Break; the caller delivers `tick()`
//! - **Driver**: a tokio host that owns the engine, serializes commands and
//!   keeps a one-second tick source armed only while the timer runs
//! - **Alerts**: completion hooks for desktop notifications and sound
//! - **Storage**: TOML-based preferences (durations, alerts)
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerHost`]: Periodic host for the engine
//! - [`CompletionHook`]: Trait for completion side effects
//! - [`Config`]: Preference management

pub mod alerts;
pub mod driver;
pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use alerts::{Alert, CompletionHook, DesktopNotifier, SoundPlayer};
pub use driver::{Command, HostChannels, HostHandle, HostOptions, TimerHost};
pub use error::{ConfigError, CoreError};
pub use events::Event;
pub use storage::Config;
pub use timer::{format_clock, Durations, Mode, TimerEngine, TimerState};
