//! Periodic host for the timer engine.
//!
//! The engine never schedules itself. `TimerHost` owns it on a single task,
//! serializes user commands and one-second ticks, and keeps a tick source
//! armed only while the engine is running:
//!
//! ```text
//! is_running false -> true   arm a 1s interval (first tick one second later)
//! is_running true  -> false  drop the interval (pause, reset, switch, completion)
//! shutdown / handles dropped drop the interval and return the final state
//! ```

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::timer::{Mode, TimerEngine, TimerState};

const TICK_PERIOD: Duration = Duration::from_secs(1);
const COMMAND_BUFFER: usize = 32;

/// User commands accepted by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Toggle,
    Reset,
    SwitchMode(Mode),
    SetDuration { mode: Mode, minutes: i64 },
    /// Raw user text; validated the same way as `SetDuration`.
    SetDurationInput { mode: Mode, input: String },
    Shutdown,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HostOptions {
    /// Start the next countdown right after a completion.
    pub auto_start_next: bool,
}

/// Cloneable sender for host commands.
#[derive(Debug, Clone)]
pub struct HostHandle {
    tx: mpsc::Sender<Command>,
}

impl HostHandle {
    pub async fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).await.map_err(|_| CoreError::HostClosed)
    }

    pub async fn start(&self) -> Result<()> {
        self.send(Command::Start).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(Command::Pause).await
    }

    pub async fn toggle(&self) -> Result<()> {
        self.send(Command::Toggle).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.send(Command::Reset).await
    }

    pub async fn switch_mode(&self, mode: Mode) -> Result<()> {
        self.send(Command::SwitchMode(mode)).await
    }

    pub async fn set_duration(&self, mode: Mode, minutes: i64) -> Result<()> {
        self.send(Command::SetDuration { mode, minutes }).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }
}

/// Receiving side handed to front ends.
#[derive(Debug)]
pub struct HostChannels {
    pub handle: HostHandle,
    /// Latest state, updated after every command and tick.
    pub state: watch::Receiver<TimerState>,
    /// Every event the engine produced, in order.
    pub events: mpsc::UnboundedReceiver<Event>,
}

pub struct TimerHost {
    engine: TimerEngine,
    options: HostOptions,
    commands: mpsc::Receiver<Command>,
    state_tx: watch::Sender<TimerState>,
    events_tx: mpsc::UnboundedSender<Event>,
}

impl TimerHost {
    pub fn new(engine: TimerEngine, options: HostOptions) -> (Self, HostChannels) {
        let (tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state) = watch::channel(engine.state());
        let (events_tx, events) = mpsc::unbounded_channel();
        let host = Self {
            engine,
            options,
            commands,
            state_tx,
            events_tx,
        };
        let channels = HostChannels {
            handle: HostHandle { tx },
            state,
            events,
        };
        (host, channels)
    }

    /// Spawn the host on the current tokio runtime.
    pub fn spawn(engine: TimerEngine, options: HostOptions) -> (HostChannels, JoinHandle<TimerState>) {
        let (host, channels) = Self::new(engine, options);
        (channels, tokio::spawn(host.run()))
    }

    /// Drive the engine until shutdown. Returns the final state.
    pub async fn run(mut self) -> TimerState {
        let mut ticker: Option<Interval> = None;
        self.sync_ticker(&mut ticker);

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => {
                    match command {
                        None | Some(Command::Shutdown) => {
                            tracing::debug!("timer host shutting down");
                            break;
                        }
                        Some(command) => self.apply(command),
                    }
                }

                _ = next_tick(&mut ticker) => self.on_tick(),
            }
            self.sync_ticker(&mut ticker);
            self.state_tx.send_replace(self.engine.state());
        }

        self.engine.state()
    }

    fn apply(&mut self, command: Command) {
        tracing::debug!(?command, "applying command");
        let event = match command {
            Command::Start => self.engine.start(),
            Command::Pause => self.engine.pause(),
            Command::Toggle => self.engine.toggle_start_pause(),
            Command::Reset => self.engine.reset(),
            Command::SwitchMode(mode) => self.engine.switch_mode(mode),
            Command::SetDuration { mode, minutes } => self.engine.set_duration(mode, minutes),
            Command::SetDurationInput { mode, input } => {
                self.engine.set_duration_input(mode, &input)
            }
            Command::Shutdown => None,
        };
        self.publish(event);
    }

    fn on_tick(&mut self) {
        let Some(completed) = self.engine.tick() else {
            return;
        };
        self.publish(Some(completed));
        if self.options.auto_start_next {
            let started = self.engine.start();
            self.publish(started);
        }
    }

    fn publish(&self, event: Option<Event>) {
        if let Some(event) = event {
            // Front ends may have gone away; the timer keeps going.
            let _ = self.events_tx.send(event);
        }
    }

    fn sync_ticker(&self, ticker: &mut Option<Interval>) {
        match (self.engine.is_running(), ticker.is_some()) {
            (true, false) => {
                let mut interval = tokio::time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                *ticker = Some(interval);
                tracing::debug!("tick source armed");
            }
            (false, true) => {
                *ticker = None;
                tracing::debug!("tick source cancelled");
            }
            _ => {}
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
