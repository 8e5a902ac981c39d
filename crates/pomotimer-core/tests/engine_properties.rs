//! Property tests for the countdown engine invariants.

use pomotimer_core::{Durations, Mode, TimerEngine};
use proptest::prelude::*;

fn any_mode() -> impl Strategy<Value = Mode> {
    prop_oneof![
        Just(Mode::Focus),
        Just(Mode::ShortBreak),
        Just(Mode::LongBreak),
    ]
}

proptest! {
    #[test]
    fn focus_edit_while_focused_sets_remaining(minutes in 1i64..=10_000, running in any::<bool>()) {
        let mut engine = TimerEngine::default();
        if running {
            engine.start();
            engine.tick();
        }
        engine.set_duration(Mode::Focus, minutes);
        prop_assert_eq!(engine.remaining_seconds() as i64, minutes * 60);
        prop_assert_eq!(engine.is_running(), running);
    }

    #[test]
    fn non_positive_edits_change_nothing(mode in any_mode(), minutes in i64::MIN..=0) {
        let mut engine = TimerEngine::default();
        engine.start();
        engine.tick();
        let before = engine.state();
        prop_assert!(engine.set_duration(mode, minutes).is_none());
        prop_assert_eq!(engine.state(), before);
        prop_assert_eq!(engine.durations(), &Durations::default());
    }

    #[test]
    fn non_numeric_edits_change_nothing(mode in any_mode(), input in "[a-zA-Z .,]*") {
        let mut engine = TimerEngine::default();
        let before = engine.state();
        prop_assert!(engine.set_duration_input(mode, &input).is_none());
        prop_assert_eq!(engine.state(), before);
        prop_assert_eq!(engine.durations(), &Durations::default());
    }

    #[test]
    fn paused_ticks_are_ignored(ticks in 0usize..5_000, advance in 0usize..100) {
        let mut engine = TimerEngine::default();
        engine.start();
        for _ in 0..advance {
            engine.tick();
        }
        engine.pause();
        let before = engine.state();
        for _ in 0..ticks {
            prop_assert!(engine.tick().is_none());
        }
        prop_assert_eq!(engine.state(), before);
    }

    #[test]
    fn switch_mode_always_pauses(mode in any_mode(), running in any::<bool>()) {
        let mut engine = TimerEngine::new(Durations {
            focus_minutes: 30,
            short_break_minutes: 7,
            long_break_minutes: 21,
        });
        if running {
            engine.start();
        }
        engine.switch_mode(mode);
        prop_assert!(!engine.is_running());
        prop_assert_eq!(engine.mode(), mode);
        prop_assert_eq!(engine.remaining_seconds(), engine.durations().seconds(mode));
    }

    #[test]
    fn inactive_mode_edits_leave_countdown(minutes in 1i64..=600, advance in 0usize..200) {
        let mut engine = TimerEngine::default();
        engine.start();
        for _ in 0..advance {
            engine.tick();
        }
        let remaining = engine.remaining_seconds();
        engine.set_duration(Mode::ShortBreak, minutes);
        engine.set_duration(Mode::LongBreak, minutes);
        prop_assert_eq!(engine.remaining_seconds(), remaining);
    }

    #[test]
    fn pause_is_idempotent(advance in 0usize..50) {
        let mut once = TimerEngine::default();
        let mut twice = TimerEngine::default();
        for engine in [&mut once, &mut twice] {
            engine.start();
            for _ in 0..advance {
                engine.tick();
            }
        }
        once.pause();
        twice.pause();
        twice.pause();
        prop_assert_eq!(once.state(), twice.state());
    }
}

#[test]
fn every_fourth_focus_completion_routes_to_long_break() {
    let mut engine = TimerEngine::default();
    for n in 1..=12u32 {
        engine.switch_mode(Mode::Focus);
        engine.set_duration(Mode::Focus, 1);
        engine.start();
        while engine.tick().is_none() {}
        assert_eq!(engine.completed_focus_sessions(), n);
        let expected = if n % 4 == 0 { Mode::LongBreak } else { Mode::ShortBreak };
        assert_eq!(engine.mode(), expected, "after completion {n}");
    }
}

#[test]
fn same_value_edits_are_idempotent() {
    let mut engine = TimerEngine::default();
    engine.start();
    for _ in 0..10 {
        engine.tick();
    }
    let before = engine.state();

    // Inactive mode: nothing observable changes.
    assert!(engine.set_duration(Mode::ShortBreak, 5).is_some());
    assert_eq!(engine.durations(), &Durations::default());
    assert_eq!(engine.state(), before);

    // Active mode: only the countdown restarts from the same length.
    assert!(engine.set_duration(Mode::Focus, 25).is_some());
    assert_eq!(engine.durations(), &Durations::default());
    assert_eq!(engine.remaining_seconds(), 1500);
    assert_eq!(engine.mode(), before.mode);
    assert_eq!(engine.is_running(), before.is_running);
    assert_eq!(
        engine.completed_focus_sessions(),
        before.completed_focus_sessions
    );

    let once = engine.state();
    engine.set_duration(Mode::Focus, 25);
    assert_eq!(engine.state(), once);
}
