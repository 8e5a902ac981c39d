//! Completion alerts.
//!
//! The engine only knows the [`CompletionHook`] trait. The adapters here
//! turn a finished mode into a desktop notification or a sound; both are
//! best-effort and never feed back into the timer.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{mpsc, Arc, OnceLock};

use notify_rust::Notification;

use crate::error::{CoreError, Result};
use crate::timer::Mode;

/// Side effect run after every completion transition.
pub trait CompletionHook: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Called with the mode that just finished.
    fn on_session_complete(&self, previous: Mode) -> Result<()>;
}

/// Runs completion hooks off the caller's thread.
///
/// Completions are queued to one worker thread, so hooks see them in
/// order and a slow hook never holds up the countdown. The worker exits
/// once the dispatcher is dropped and the queue is drained.
#[derive(Default)]
pub struct HookDispatcher {
    hooks: Vec<Arc<dyn CompletionHook>>,
    queue: Option<mpsc::Sender<Mode>>,
}

impl HookDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, hook: Arc<dyn CompletionHook>) {
        self.hooks.push(hook);
        // The running worker keeps its old list; the next completion starts one with this list.
        self.queue = None;
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Queue `previous` for every registered hook and return immediately.
    pub fn dispatch(&mut self, previous: Mode) {
        if self.hooks.is_empty() {
            return;
        }
        if let Some(queue) = &self.queue {
            if queue.send(previous).is_ok() {
                return;
            }
        }
        match self.spawn_worker() {
            Ok(queue) => {
                // The receiver was just created and is alive.
                let _ = queue.send(previous);
                self.queue = Some(queue);
            }
            Err(e) => tracing::warn!(error = %e, "could not start completion hook worker"),
        }
    }

    fn spawn_worker(&self) -> std::io::Result<mpsc::Sender<Mode>> {
        let (tx, rx) = mpsc::channel::<Mode>();
        let hooks = self.hooks.clone();
        std::thread::Builder::new()
            .name("pomotimer-hooks".into())
            .spawn(move || {
                for previous in rx {
                    run_hooks(&hooks, previous);
                }
            })?;
        Ok(tx)
    }
}

fn run_hooks(hooks: &[Arc<dyn CompletionHook>], previous: Mode) {
    for hook in hooks {
        if let Err(e) = hook.on_session_complete(previous) {
            tracing::warn!(hook = hook.name(), error = %e, "completion hook failed");
        }
    }
}

/// Title and body shown when a mode finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    pub title: &'static str,
    pub body: &'static str,
}

impl Alert {
    pub fn for_completed(mode: Mode) -> Self {
        match mode {
            Mode::Focus => Alert {
                title: "Focus session complete!",
                body: "Take a short break or continue when ready.",
            },
            Mode::ShortBreak => Alert {
                title: "Short break over!",
                body: "Time to get back to work!",
            },
            Mode::LongBreak => Alert {
                title: "Long break over!",
                body: "Time to get back to work!",
            },
        }
    }
}

/// Raises a desktop notification through the platform notification service.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    appname: String,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            appname: "pomotimer".into(),
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionHook for DesktopNotifier {
    fn name(&self) -> &str {
        "notification"
    }

    fn on_session_complete(&self, previous: Mode) -> Result<()> {
        let alert = Alert::for_completed(previous);
        Notification::new()
            .summary(alert.title)
            .body(alert.body)
            .appname(&self.appname)
            .icon("alarm-clock")
            .show()
            .map_err(|e| CoreError::hook(self.name(), e.to_string()))?;
        Ok(())
    }
}

/// Well-known system sounds tried in order when no file is configured.
const SYSTEM_SOUNDS: &[(&str, &str)] = &[
    ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
    ("aplay", "/usr/share/sounds/sound-icons/guitar-11.wav"),
    ("aplay", "/usr/share/sounds/generic.wav"),
    ("afplay", "/System/Library/Sounds/Glass.aiff"),
];

/// A resolved player program and the file it plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub program: String,
    pub file: PathBuf,
}

/// Plays the completion sound with an external player.
///
/// The player is resolved on first use and cached for the lifetime of the
/// value. Without a usable player the terminal bell is rung instead.
#[derive(Debug, Default)]
pub struct SoundPlayer {
    sound_file: Option<PathBuf>,
    resolved: OnceLock<Option<Player>>,
}

impl SoundPlayer {
    pub fn new(sound_file: Option<PathBuf>) -> Self {
        Self {
            sound_file,
            resolved: OnceLock::new(),
        }
    }

    /// The player in use, resolving it if needed.
    pub fn player(&self) -> Option<&Player> {
        self.resolved
            .get_or_init(|| resolve_player(self.sound_file.as_deref(), SYSTEM_SOUNDS))
            .as_ref()
    }

    fn ring_bell(&self) -> Result<()> {
        use std::io::Write;
        let mut err = std::io::stderr();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}

impl CompletionHook for SoundPlayer {
    fn name(&self) -> &str {
        "sound"
    }

    fn on_session_complete(&self, _previous: Mode) -> Result<()> {
        let Some(player) = self.player() else {
            return self.ring_bell();
        };
        let spawned = Command::new(&player.program)
            .arg(&player.file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(mut child) => {
                // Reap in the background so finished players don't linger.
                std::thread::spawn(move || {
                    let _ = child.wait();
                });
                Ok(())
            }
            Err(e) => {
                self.ring_bell()?;
                Err(CoreError::Hook {
                    hook: self.name().into(),
                    message: format!("failed to run {}", player.program),
                    source: Some(Box::new(e)),
                })
            }
        }
    }
}

fn default_program() -> &'static str {
    if cfg!(target_os = "macos") {
        "afplay"
    } else {
        "paplay"
    }
}

fn resolve_player(sound_file: Option<&Path>, candidates: &[(&str, &str)]) -> Option<Player> {
    if let Some(file) = sound_file.filter(|f| !f.as_os_str().is_empty()) {
        if file.exists() {
            return Some(Player {
                program: default_program().into(),
                file: file.to_path_buf(),
            });
        }
        tracing::warn!(file = %file.display(), "configured sound file not found");
    }
    candidates
        .iter()
        .find(|(_, file)| Path::new(file).exists())
        .map(|(program, file)| Player {
            program: (*program).into(),
            file: PathBuf::from(file),
        })
}
