use std::io::{self, IsTerminal, Write};

use clap::Args;
use pomotimer_core::{
    Alert, Command, Config, DesktopNotifier, Event, HostOptions, Mode, SoundPlayer, TimerEngine,
    TimerHost, TimerState,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Focus minutes for this run (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    focus: Option<u32>,
    /// Short break minutes for this run (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    short: Option<u32>,
    /// Long break minutes for this run (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    long: Option<u32>,
    /// Disable the completion sound
    #[arg(long)]
    no_sound: bool,
    /// Disable desktop notifications
    #[arg(long)]
    no_notify: bool,
    /// Start the next countdown automatically after each completion
    #[arg(long)]
    auto_start: bool,
    /// Print every event as a JSON line instead of the clock
    #[arg(long)]
    json: bool,
}

/// A parsed line of user input.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Command(Command),
    Help,
    Quit,
}

const HELP: &str = "commands: [enter]/t toggle, s start, p pause, r reset, \
focus|short|long switch mode, set <focus|short|long> <minutes>, q quit";

fn parse_input(line: &str) -> Option<Input> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Some(Input::Command(Command::Toggle));
    };
    let input = match first.to_lowercase().as_str() {
        "t" | "toggle" => Input::Command(Command::Toggle),
        "s" | "start" => Input::Command(Command::Start),
        "p" | "pause" => Input::Command(Command::Pause),
        "r" | "reset" => Input::Command(Command::Reset),
        "q" | "quit" | "exit" => Input::Quit,
        "h" | "help" | "?" => Input::Help,
        "set" => {
            let mode = words.next()?.parse::<Mode>().ok()?;
            let input = words.next()?.to_string();
            Input::Command(Command::SetDurationInput { mode, input })
        }
        other => Input::Command(Command::SwitchMode(other.parse::<Mode>().ok()?)),
    };
    Some(input)
}

fn status_line(state: &TimerState) -> String {
    let flag = if state.is_running { "" } else { "  (paused)" };
    format!(
        "{:<11} {}  sessions: {}{}",
        state.mode.label(),
        state.clock(),
        state.completed_focus_sessions,
        flag
    )
}

/// Session output. Every write error is returned to the caller, so a
/// closed stdout ends the run with `error: ...`.
struct Display {
    json: bool,
    tty: bool,
}

const CLEAR_LINE: &str = "\r\x1b[2K";

impl Display {
    fn state(&self, out: &mut impl Write, state: &TimerState) -> io::Result<()> {
        if self.json {
            return Ok(());
        }
        if self.tty {
            write!(out, "{CLEAR_LINE}{}", status_line(state))?;
            out.flush()
        } else {
            writeln!(out, "{}", status_line(state))
        }
    }

    fn event(
        &self,
        out: &mut impl Write,
        event: &Event,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.json {
            writeln!(out, "{}", serde_json::to_string(event)?)?;
            return Ok(());
        }
        if let Event::SessionCompleted { previous_mode, .. } = event {
            let alert = Alert::for_completed(*previous_mode);
            let prefix = if self.tty { CLEAR_LINE } else { "" };
            writeln!(out, "{prefix}{} {}", alert.title, alert.body)?;
        }
        Ok(())
    }

    fn summary(
        &self,
        out: &mut impl Write,
        last: &TimerState,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.json {
            writeln!(out, "{}", serde_json::to_string(last)?)?;
            return Ok(());
        }
        if self.tty {
            writeln!(out)?;
        }
        writeln!(
            out,
            "Stopped in {} at {} ({} focus sessions completed)",
            last.mode.label(),
            last.clock(),
            last.completed_focus_sessions
        )?;
        Ok(())
    }
}

fn build_engine(config: &Config, args: &RunArgs) -> TimerEngine {
    let mut durations = config.durations;
    for (mode, minutes) in [
        (Mode::Focus, args.focus),
        (Mode::ShortBreak, args.short),
        (Mode::LongBreak, args.long),
    ] {
        if let Some(minutes) = minutes {
            durations.set(mode, i64::from(minutes));
        }
    }

    let mut engine = TimerEngine::new(durations);
    if config.alerts.notifications && !args.no_notify {
        engine.add_hook(Box::new(DesktopNotifier::new()));
    }
    if config.alerts.sound && !args.no_sound {
        engine.add_hook(Box::new(SoundPlayer::new(config.sound_file())));
    }
    engine
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let engine = build_engine(&config, &args);
    let options = HostOptions {
        auto_start_next: args.auto_start || config.timer.auto_start_next,
    };
    let display = Display {
        json: args.json,
        tty: io::stdout().is_terminal(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let last = runtime.block_on(session(engine, options, &display))?;
    display.summary(&mut io::stdout().lock(), &last)
}

async fn session(
    engine: TimerEngine,
    options: HostOptions,
    display: &Display,
) -> Result<TimerState, Box<dyn std::error::Error>> {
    let (mut channels, join) = TimerHost::spawn(engine, options);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if display.tty {
        eprintln!("{HELP}");
    }
    let initial = *channels.state.borrow_and_update();
    display.state(&mut io::stdout().lock(), &initial)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_input(&line) {
                    Some(Input::Quit) => break,
                    Some(Input::Help) => eprintln!("{HELP}"),
                    Some(Input::Command(command)) => channels.handle.send(command).await?,
                    None => eprintln!("unknown command: {}", line.trim()),
                }
            }
            changed = channels.state.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *channels.state.borrow_and_update();
                display.state(&mut io::stdout().lock(), &state)?;
            }
            Some(event) = channels.events.recv() => {
                display.event(&mut io::stdout().lock(), &event)?;
            }
        }
    }

    // The host may already be gone if its channels closed first.
    let _ = channels.handle.shutdown().await;
    Ok(join.await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomotimer_core::Durations;

    #[test]
    fn parses_control_words() {
        assert_eq!(parse_input(""), Some(Input::Command(Command::Toggle)));
        assert_eq!(parse_input("  s "), Some(Input::Command(Command::Start)));
        assert_eq!(parse_input("PAUSE"), Some(Input::Command(Command::Pause)));
        assert_eq!(parse_input("r"), Some(Input::Command(Command::Reset)));
        assert_eq!(parse_input("q"), Some(Input::Quit));
        assert_eq!(parse_input("?"), Some(Input::Help));
    }

    #[test]
    fn parses_mode_switches() {
        assert_eq!(
            parse_input("short"),
            Some(Input::Command(Command::SwitchMode(Mode::ShortBreak)))
        );
        assert_eq!(
            parse_input("longBreak"),
            Some(Input::Command(Command::SwitchMode(Mode::LongBreak)))
        );
        assert_eq!(parse_input("nap"), None);
    }

    #[test]
    fn parses_duration_edits_without_validating() {
        assert_eq!(
            parse_input("set focus 40"),
            Some(Input::Command(Command::SetDurationInput {
                mode: Mode::Focus,
                input: "40".into(),
            }))
        );
        // The engine decides; "-3" is passed through and rejected there.
        assert_eq!(
            parse_input("set long -3"),
            Some(Input::Command(Command::SetDurationInput {
                mode: Mode::LongBreak,
                input: "-3".into(),
            }))
        );
        assert_eq!(parse_input("set focus"), None);
        assert_eq!(parse_input("set nap 5"), None);
    }

    #[test]
    fn status_line_shows_clock_and_pause() {
        let state = TimerState {
            mode: Mode::ShortBreak,
            is_running: false,
            remaining_seconds: 299,
            completed_focus_sessions: 3,
        };
        assert_eq!(status_line(&state), "Short Break 04:59  sessions: 3  (paused)");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    fn paused_focus() -> TimerState {
        TimerState {
            mode: Mode::Focus,
            is_running: false,
            remaining_seconds: 1500,
            completed_focus_sessions: 0,
        }
    }

    #[test]
    fn display_reports_write_errors() {
        let state = paused_focus();
        let mut engine = TimerEngine::new(Durations {
            focus_minutes: 1,
            ..Durations::default()
        });
        engine.start();
        let completed = (0..60).find_map(|_| engine.tick()).unwrap();
        for (json, tty) in [(false, false), (false, true), (true, false)] {
            let display = Display { json, tty };
            assert!(display.event(&mut ClosedPipe, &completed).is_err());
            assert!(display.summary(&mut ClosedPipe, &state).is_err());
        }
        let plain = Display { json: false, tty: false };
        let terminal = Display { json: false, tty: true };
        assert_eq!(
            plain.state(&mut ClosedPipe, &state).unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
        assert!(terminal.state(&mut ClosedPipe, &state).is_err());
    }

    #[test]
    fn display_renders_lines() {
        let state = paused_focus();
        let plain = Display { json: false, tty: false };
        let mut out = Vec::new();
        plain.state(&mut out, &state).unwrap();
        plain.summary(&mut out, &state).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Focus       25:00  sessions: 0  (paused)\n\
             Stopped in Focus at 25:00 (0 focus sessions completed)\n"
        );

        let json = Display { json: true, tty: false };
        let mut out = Vec::new();
        json.state(&mut out, &state).unwrap();
        assert!(out.is_empty());
        json.summary(&mut out, &state).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["remaining_seconds"], 1500);
    }
}
