//! End-to-end turn cycles against a headless host.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use tracing_test::traced_test;
use vorple_backend::{EngineCall, HeadlessHost};
use vorple_core::{Event, KeyCode, KeyEvent};
use vorple_runtime::{
    CommandOptions, EventCategory, FilterAction, FilterFn, FilterOptions, HookInput, InputMode,
    KeyDispatch, Notification, START_STORY_COMMAND, Session, SessionConfig, TurnMode,
    TurnOutcome, TurnStructure, deferred,
};

fn started() -> Session<HeadlessHost> {
    let mut session = Session::new(
        HeadlessHost::new(),
        SessionConfig {
            id_seed: Some(9),
            ..SessionConfig::default()
        },
    );
    session.start();
    session
}

fn turn(command: &str, content: &str) -> TurnStructure {
    TurnStructure {
        previous_command: command.into(),
        content: content.into(),
        prompt: ">".into(),
    }
}

/// A session that has rendered its opening turn and waits for a command.
fn ready() -> Session<HeadlessHost> {
    let mut session = started();
    session.complete_turn(turn("", "Welcome"), TurnMode::Line);
    session
}

fn rendered(outcome: TurnOutcome) -> vorple_runtime::RenderedTurn {
    match outcome {
        TurnOutcome::Rendered(turn) => turn,
        other => panic!("expected a rendered turn, got {other:?}"),
    }
}

#[test]
fn commands_dispatch_one_per_turn_in_order() {
    let mut session = ready();
    session.send_command("north", CommandOptions::default());
    session.send_command("take lamp", CommandOptions::default());
    session.send_command("south", CommandOptions::default());
    assert_eq!(session.host().engine.lines(), vec!["north"]);
    assert_eq!(session.queued_commands(), 2);

    session.complete_turn(turn("north", "Forest"), TurnMode::Line);
    assert_eq!(session.host().engine.lines(), vec!["north", "take lamp"]);

    session.complete_turn(turn("take lamp", "Taken."), TurnMode::Line);
    assert_eq!(session.host().engine.lines(), vec!["north", "take lamp", "south"]);
    assert!(!session.is_interactive());
}

#[test]
fn hide_command_lasts_one_turn() {
    let mut session = ready();
    session.hide_command(true);
    let first = rendered(session.complete_turn(turn("x", "one"), TurnMode::Line));
    assert!(!first.command_visible);
    assert!(first.output_visible);

    let second = rendered(session.complete_turn(turn("y", "two"), TurnMode::Line));
    assert!(second.command_visible);
}

#[test]
fn output_filters_run_by_priority() {
    let mut session = ready();
    fn edit(f: fn(&str) -> String) -> FilterFn {
        FilterFn::output(move |turn, _| {
            let mut next = turn.clone();
            next.content.text = f(&turn.content.text);
            FilterAction::Continue(next)
        })
    }
    session.register_filter(edit(|s| format!("{s}!")), FilterOptions::named("B").with_priority(5));
    session.register_filter(edit(str::to_uppercase), FilterOptions::named("A").with_priority(10));

    let out = rendered(session.complete_turn(turn("", "hello"), TurnMode::Line));
    assert_eq!(out.content.content.text, "HELLO!");
}

#[test]
fn silent_commands_skip_filters_and_rendering() {
    let mut session = ready();
    session.register_filter(
        FilterFn::input(|_, _| FilterAction::Continue("rewritten".into())),
        FilterOptions::named("rewrite"),
    );
    session.send_silent_command("score");
    assert_eq!(session.host().engine.lines(), vec!["score"]);

    let outcome = session.complete_turn(turn("score", "You have 0 points."), TurnMode::Line);
    assert_eq!(outcome, TurnOutcome::Suppressed);
}

#[test]
fn hidden_command_restores_the_typed_text() {
    let mut session = ready();
    session.prompt_mut().set_value("exa");
    session.send_command("look", CommandOptions::default().hide_command(true));
    assert_eq!(session.prompt().value, "");

    let out = rendered(session.complete_turn(turn("look", "Room"), TurnMode::Line));
    assert_eq!(out.prompt_value, "exa");
    assert_eq!(session.prompt().value, "exa");
}

#[test]
fn meta_and_dialog_turns_notify() {
    let mut session = ready();
    session.set_turn_type("meta");
    let outcome = session.complete_turn(turn("score", "<p>5 points</p>"), TurnMode::Line);
    assert_eq!(outcome, TurnOutcome::Notified(Notification::toast("<p>5 points</p>")));

    session.set_turn_type("dialog");
    session.complete_turn(turn("", "Really quit?"), TurnMode::Line);
    let notes = session.take_notifications();
    assert_eq!(notes.len(), 2);
    assert!(notes[1].modal);
}

#[test]
fn error_turn_type_resets_on_next_command() {
    let mut session = ready();
    session.set_turn_type("error");
    let out = rendered(session.complete_turn(turn("xyzzy", "Nothing happens."), TurnMode::Line));
    assert!(out.content.meta);
    assert!(out.content.content.classes.contains("transient"));

    session.send_command("look", CommandOptions::default());
    assert_eq!(session.turn().turn_type, vorple_runtime::TurnType::Normal);
}

#[test]
fn filters_queue_follow_up_commands() {
    let mut session = ready();
    session.register_filter(
        FilterFn::input(|text, ctx| {
            if text == "hint" {
                ctx.send_command("help", CommandOptions::default());
            }
            FilterAction::Unchanged
        }),
        FilterOptions::named("hinter"),
    );
    session.send_command("hint", CommandOptions::default());
    assert_eq!(session.queued_commands(), 1);

    session.complete_turn(turn("hint", "No hints."), TurnMode::Line);
    assert_eq!(session.host().engine.lines(), vec!["hint", "help"]);
}

#[test]
fn primary_commands_restore_the_main_turn() {
    let mut session = started();
    session.send_command("look", CommandOptions::default());
    session.send_silent_primary_command("__setup");
    session.complete_turn(turn("", "Welcome"), TurnMode::Line);
    assert_eq!(session.host().engine.lines(), vec!["__setup"]);

    session.complete_turn(turn("__setup", ""), TurnMode::Line);
    assert_eq!(session.host().engine.lines(), vec!["__setup", "look"]);
    assert!(session.turn().command_visible);
    assert!(session.turn().output_visible);
}

#[test]
fn vorple_stories_get_the_start_command() {
    let mut session = started();
    session.set_vorple_story();
    session.send_command("about", CommandOptions::default());
    session.complete_turn(turn("", "Loading"), TurnMode::Line);
    assert_eq!(session.host().engine.lines(), vec!["about"]);

    session.complete_turn(turn("about", "A story."), TurnMode::Line);
    assert_eq!(session.host().engine.lines(), vec!["about", START_STORY_COMMAND]);
}

#[test]
fn deferred_keypress_waits_for_pump() {
    let mut session = started();
    let (source, pending) = deferred();
    let _ = session.add_event_listener(&["submitKeypress"], move |_| pending.clone());

    session.wait_for_key();
    let dispatch = session.send_key(Event::Key(KeyEvent::new(KeyCode::from_char('y'))));
    assert_eq!(dispatch, KeyDispatch::Deferred(KeyCode::from_char('y')));
    assert_eq!(session.mode(), InputMode::Buffer);
    assert_eq!(session.pump(), 0);
    assert!(session.host().engine.calls().is_empty());

    source.resolve();
    assert_eq!(session.pump(), 1);
    assert_eq!(
        session.host().engine.calls(),
        &[EngineCall::Char(KeyCode::from_char('y'))]
    );
    assert_eq!(session.parked_signals(), 0);
}

#[test]
fn a_stalled_signal_does_not_block_later_ones() {
    let mut session = ready();
    let gates: Rc<RefCell<Vec<_>>> = Rc::new(RefCell::new(Vec::new()));
    let gates_in = Rc::clone(&gates);
    let _ = session.add_event_listener(&["submitCommand"], move |meta| {
        let (source, pending) = deferred();
        gates_in.borrow_mut().push((meta.input.clone(), source));
        pending
    });

    session.send_command("first", CommandOptions::default());
    session.complete_turn(turn("first", ""), TurnMode::Line);
    session.send_command("second", CommandOptions::default());
    assert_eq!(session.parked_signals(), 2);

    let (input, source) = gates.borrow_mut().pop().unwrap();
    assert_eq!(input, Some(HookInput::Text("second".into())));
    source.resolve();
    assert_eq!(session.pump(), 1);
    assert_eq!(session.host().engine.lines(), vec!["second"]);
    assert_eq!(session.parked_signals(), 1);
}

#[test]
fn char_turns_wait_for_a_key_and_hold_commands() {
    let mut session = started();
    session.send_command("look", CommandOptions::default());
    let seen = Rc::new(RefCell::new(0));
    let count = Rc::clone(&seen);
    let _ = session.add_event_listener(&["expectKeypress"], move |_| *count.borrow_mut() += 1);

    session.complete_turn(TurnStructure::default(), TurnMode::Char);
    assert_eq!(session.mode(), InputMode::GetKey);
    assert_eq!(*seen.borrow(), 1);
    assert!(session.host().engine.lines().is_empty());

    session.send_key(Event::Key(KeyEvent::new(KeyCode::SPACE)));
    assert_eq!(session.host().engine.chars(), vec![KeyCode::SPACE]);
}

#[test]
fn failing_story_code_is_reported_and_the_turn_goes_on() {
    let mut session = ready();
    session.queue_expression("broken(", || Err("unexpected end of input".into()));
    session.send_command("look", CommandOptions::default());
    session.complete_turn(turn("look", "Room"), TurnMode::Line);

    let errors = session.take_errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("broken("));
    assert!(session.is_interactive());
}

#[test]
fn listeners_see_submitted_commands() {
    let mut session = ready();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    let handle = session.add_event_listener(&["submitCommand", "expectCommand"], move |meta| {
        log.borrow_mut().push((meta.category, meta.user_action));
    });

    session.submit_line("inventory");
    session.complete_turn(turn("inventory", "You carry nothing."), TurnMode::Line);
    assert_eq!(
        *seen.borrow(),
        vec![
            (EventCategory::SubmitCommand, true),
            (EventCategory::ExpectCommand, false),
        ]
    );
    assert!(session.remove_listener(&handle));
}

#[test]
#[traced_test]
fn vetoed_commands_are_traced() {
    let mut session = ready();
    session.register_filter(FilterFn::input(|_, _| FilterAction::Suppress), FilterOptions::named("veto"));
    session.send_command("xyzzy", CommandOptions::default());
    assert!(session.host().engine.lines().is_empty());
    assert!(logs_contain("command dropped by input filter"));
}
