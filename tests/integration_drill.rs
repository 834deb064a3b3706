use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use jtype::drill::{is_complete_against, CompareMode, Drill, Key};
use jtype::judge::{RunKind, RunOutcome, RunTicket, RunTracker};
use jtype::runtime::{Event, Events, RunMessage};
use jtype::TICK_RATE_MS;

// Headless flow: keys injected through the runtime hub drive a drill to
// completion without a TTY.
#[test]
fn headless_typing_flow_completes() {
    let mut drill = Drill::new("hi\n".to_string(), CompareMode::Strict, 3.0);

    let events = Events::new();
    let tx = events.sender();
    for code in [KeyCode::Char('h'), KeyCode::Char('i'), KeyCode::Enter] {
        tx.send(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
            .unwrap();
    }

    for _ in 0..10u32 {
        match events.next().unwrap() {
            Event::Key(key) => {
                match key.code {
                    KeyCode::Char(c) => drill.write(c),
                    KeyCode::Enter => drill.enter(),
                    KeyCode::Backspace => drill.backspace(),
                    _ => {}
                }
                if drill.is_complete() {
                    break;
                }
            }
            Event::Tick => drill.on_tick(),
            _ => {}
        }
    }

    assert!(drill.is_complete());
    assert!(drill.elapsed_ms() < 10_000);
    assert!(drill.accuracy() == 100.0);
}

#[test]
fn completion_requires_exact_equality() {
    let target = "class A{}\n";
    assert!(is_complete_against("class A{}\n", target, CompareMode::Strict));
    assert!(!is_complete_against("class A{}", target, CompareMode::Strict));

    // Strict mode does not normalize comments or indentation away.
    assert!(!is_complete_against(
        "class A{} // done\n",
        target,
        CompareMode::Strict
    ));
}

#[test]
fn boundary_rejection_holds_at_full_length() {
    let mut drill = Drill::new("ab".to_string(), CompareMode::Strict, 3.0);
    drill.write('a');
    drill.write('c'); // wrong, accepted
    assert_eq!(drill.cursor_pos(), 2);

    for c in "xyz".chars() {
        drill.write(c);
    }
    assert_eq!(drill.cursor_pos(), 2, "typed never grows past the target");
    assert!(!drill.is_complete());
}

#[test]
fn backspace_is_total() {
    let mut drill = Drill::new("abc".to_string(), CompareMode::Strict, 3.0);
    drill.backspace();
    assert_eq!(drill.cursor_pos(), 0);

    drill.write('a');
    drill.write('b');
    let before = drill.cursor_pos();
    drill.backspace();
    assert_eq!(drill.cursor_pos(), before - 1);
}

#[test]
fn auto_advance_countdown_is_tick_driven_and_skippable() {
    let mut drill = Drill::new("x".to_string(), CompareMode::Strict, 3.0);
    drill.write('x');
    assert!(drill.is_complete());
    assert_eq!(drill.advance_in_secs(), Some(3));

    // Wall-clock time alone must not advance it.
    std::thread::sleep(Duration::from_millis(30));
    assert!(!drill.should_advance());

    for _ in 0..=(3000 / TICK_RATE_MS) {
        drill.on_tick();
    }
    assert!(drill.should_advance());
}

#[test]
fn navigation_reset_is_a_fresh_drill() {
    // Navigation is modeled as dropping the drill and building a new one;
    // nothing carries over.
    let mut drill = Drill::new("abc".to_string(), CompareMode::Strict, 3.0);
    drill.write('a');
    assert!(drill.has_started());

    drill = Drill::new("def".to_string(), CompareMode::Strict, 3.0);
    assert!(!drill.has_started());
    assert_eq!(drill.cursor_pos(), 0);
    assert_eq!(drill.elapsed_ms(), 0);
    assert!(!drill.should_advance());
}

#[test]
fn ignore_comments_mode_end_to_end() {
    let target = "class A {\n  // count\n  int x;\n}\n";
    let mut drill = Drill::new(target.to_string(), CompareMode::IgnoreComments, 3.0);

    // Type everything except the comment text; the comment's line stays blank.
    for c in "class A {\n\nint x;\n}".chars() {
        drill.on_key(if c == '\n' { Key::Enter } else { Key::Char(c) });
    }

    assert!(
        drill.is_complete(),
        "comment-insensitive comparison should accept the uncommented rendition: {:?}",
        drill.typed_string()
    );
}

#[test]
fn run_results_round_trip_through_the_event_hub() {
    let events = Events::new();
    let tx = events.sender();
    let mut tracker = RunTracker::default();

    let ticket = tracker.begin(RunKind::Target).unwrap();
    // Worker thread reports back through the same channel the app drains.
    std::thread::spawn(move || {
        let outcome = RunOutcome {
            status: "Accepted".into(),
            stdout: "Hi\n".into(),
            ..RunOutcome::default()
        };
        tx.send(Event::RunDone(RunMessage {
            ticket,
            result: Ok(outcome),
        }))
        .unwrap();
    });

    match events.next().unwrap() {
        Event::RunDone(msg) => {
            assert!(tracker.accept(msg.ticket));
            assert_eq!(msg.result.unwrap().combined(), "Hi");
        }
        other => panic!("expected RunDone, got {other:?}"),
    }
}

#[test]
fn stale_run_result_is_detectable_after_navigation() {
    let mut tracker = RunTracker::default();
    let stale = tracker.begin(RunKind::Typed).unwrap();
    tracker.invalidate(); // snippet changed while the request was in flight

    assert!(!tracker.accept(stale));

    // And the duplicate-suppression does not deadlock future runs.
    let fresh: RunTicket = tracker.begin(RunKind::Typed).unwrap();
    assert!(tracker.accept(fresh));
}
