#![forbid(unsafe_code)]

//! End-to-end edit scenarios against the in-memory engine.
//!
//! Run:
//!   cargo test -p graphedit-runtime --test edit_scenarios

use std::cell::RefCell;
use std::rc::Rc;

use graphedit_core::{
    EntityPath, Feed, GraphQuery, MetaKey, NodeName, OperatorState, ParamPath, PlugPath, Value,
};
use graphedit_harness::{EngineProbe, standard_engine};
use graphedit_runtime::edit::{set_operator_state, set_operator_states, set_selection};
use graphedit_runtime::{
    ArgsList, Change, Command, CompoundCmd, ConnectFeedCmd, CreateNodeCmd, EraseNodeCmd, Event,
    HistoryConfig, MessageLog, MessageLogConfig, MetaTarget, Mode, Origin, RenameNodeCmd, Session,
    SetParameterCmd, SetPlugFlagCmd, SetVector3Cmd, Severity, UndoStack, move_nodes, select,
    set_frame_bounds, set_meta, unfeed_and_erase,
};

// ============================================================================
// Helpers
// ============================================================================

fn setup() -> (Session, UndoStack, EngineProbe) {
    let engine = standard_engine();
    let probe = engine.probe();
    let session = Session::new(engine);
    let stack = UndoStack::for_session(&session, HistoryConfig::unlimited());
    (session, stack, probe)
}

fn name(raw: &str) -> NodeName {
    NodeName::new(raw)
}

fn position(session: &Session, node: &NodeName) -> Option<Value> {
    session.engine().meta(&EntityPath::from(node), &MetaKey::position())
}

fn record_events(session: &Session) -> (Rc<RefCell<Vec<Event>>>, graphedit_runtime::Subscription) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let sub = session
        .hub()
        .subscribe(move |event| sink.borrow_mut().push(event.clone()));
    (seen, sub)
}

/// `A.out -> B.in` and `B.out -> C.in`.
fn chain(session: &mut Session) -> (NodeName, NodeName, NodeName) {
    let a = CreateNodeCmd::once(session, "Body", &name("A")).unwrap();
    let b = CreateNodeCmd::once(session, "Body", &name("B")).unwrap();
    let c = CreateNodeCmd::once(session, "Body", &name("C")).unwrap();
    ConnectFeedCmd::once(session, &PlugPath::on(&b, "in"), &PlugPath::on(&a, "out")).unwrap();
    ConnectFeedCmd::once(session, &PlugPath::on(&c, "in"), &PlugPath::on(&b, "out")).unwrap();
    (a, b, c)
}

// ============================================================================
// Create, move, merge, undo
// ============================================================================

#[test]
fn drag_merges_into_one_entry_and_undo_restores_start() {
    let (mut session, mut stack, _probe) = setup();
    let foo = CreateNodeCmd::on_stack(&mut session, &mut stack, "Body", &name("Foo")).unwrap();
    move_nodes(&mut session, Mode::Once, &[(foo.clone(), [0.0, 0.0])], false);

    let first = move_nodes(
        &mut session,
        Mode::Stack(&mut stack),
        &[(foo.clone(), [10.0, 20.0])],
        true,
    );
    assert!(first.is_success());
    move_nodes(&mut session, Mode::Stack(&mut stack), &[(foo.clone(), [15.0, 25.0])], true);

    assert_eq!(stack.len(), 2, "create + one merged move");
    assert_eq!(stack.undo_label(), Some("Move Foo"));
    assert_eq!(position(&session, &foo), Some(Value::Vec2([15.0, 25.0])));

    let undone = stack.undo(&mut session).unwrap().unwrap();
    assert_eq!(undone, "Move Foo");
    assert_eq!(position(&session, &foo), Some(Value::Vec2([0.0, 0.0])));
    assert!(session.engine().node_exists(&foo));

    stack.undo(&mut session).unwrap().unwrap();
    assert!(!session.engine().node_exists(&foo));
    assert!(!stack.can_undo());

    stack.redo(&mut session).unwrap().unwrap();
    stack.redo(&mut session).unwrap().unwrap();
    assert!(session.engine().node_exists(&foo));
    assert_eq!(position(&session, &foo), Some(Value::Vec2([15.0, 25.0])));
}

#[test]
fn non_mergeable_edits_stay_separate() {
    let (mut session, mut stack, _probe) = setup();
    let foo = CreateNodeCmd::once(&mut session, "Body", &name("Foo")).unwrap();
    move_nodes(&mut session, Mode::Stack(&mut stack), &[(foo.clone(), [1.0, 1.0])], false);
    move_nodes(&mut session, Mode::Stack(&mut stack), &[(foo, [2.0, 2.0])], false);
    assert_eq!(stack.len(), 2);
}

#[test]
fn merge_only_reaches_the_top_entry() {
    let (mut session, mut stack, _probe) = setup();
    let foo = CreateNodeCmd::once(&mut session, "Body", &name("Foo")).unwrap();
    let mass = ParamPath::on(&foo, "mass");

    SetParameterCmd::on_stack(&mut session, &mut stack, &mass, 0, &Value::Float(2.0), true)
        .unwrap();
    move_nodes(&mut session, Mode::Stack(&mut stack), &[(foo, [5.0, 5.0])], true);
    SetParameterCmd::on_stack(&mut session, &mut stack, &mass, 0, &Value::Float(3.0), true)
        .unwrap();

    assert_eq!(stack.len(), 3);
    stack.undo(&mut session).unwrap().unwrap();
    assert_eq!(session.engine().parameter(&mass, 0), Some(Value::Float(2.0)));
}

#[test]
fn parameter_drag_keeps_first_old_value() {
    let (mut session, mut stack, _probe) = setup();
    let foo = CreateNodeCmd::once(&mut session, "Body", &name("Foo")).unwrap();
    let mass = ParamPath::on(&foo, "mass");
    for v in [2.0, 3.0, 4.0] {
        SetParameterCmd::on_stack(&mut session, &mut stack, &mass, 0, &Value::Float(v), true)
            .unwrap();
    }
    assert_eq!(stack.len(), 1);
    match stack.top() {
        Some(Command::SetParameter(cmd)) => {
            assert_eq!(cmd.old(), &Value::Float(1.0));
            assert_eq!(cmd.new_value(), &Value::Float(4.0));
        }
        other => panic!("unexpected top {other:?}"),
    }
    stack.undo(&mut session).unwrap().unwrap();
    assert_eq!(session.engine().parameter(&mass, 0), Some(Value::Float(1.0)));
}

#[test]
fn clamped_value_is_what_gets_recorded() {
    let (mut session, mut stack, _probe) = setup();
    let foo = CreateNodeCmd::once(&mut session, "Body", &name("Foo")).unwrap();
    let mass = ParamPath::on(&foo, "mass");
    let huge = Value::Float(5000.0);
    let stored =
        SetParameterCmd::on_stack(&mut session, &mut stack, &mass, 0, &huge, false).unwrap();
    assert_eq!(stored, Value::Float(1000.0));
    match stack.top() {
        Some(Command::SetParameter(cmd)) => assert_eq!(cmd.new_value(), &Value::Float(1000.0)),
        other => panic!("unexpected top {other:?}"),
    }
}

// ============================================================================
// Compound erase
// ============================================================================

#[test]
fn unfeed_and_erase_is_one_entry_and_undo_restores_feeds() {
    let (mut session, mut stack, _probe) = setup();
    let (a, b, c) = chain(&mut session);

    unfeed_and_erase(&mut session, Mode::Stack(&mut stack), &b).unwrap();
    assert_eq!(stack.len(), 1);
    let top = stack.top().unwrap();
    assert_eq!(top.label(), "Erase B");
    assert_eq!(top.children().len(), 3, "two unfeeds then the erase");
    assert!(!session.engine().node_exists(&b));
    assert_eq!(session.engine().feed_source(&PlugPath::on(&c, "in")), None);

    stack.undo(&mut session).unwrap().unwrap();
    assert!(session.engine().node_exists(&b));
    assert_eq!(
        session.engine().feed_source(&PlugPath::on(&b, "in")),
        Some(PlugPath::on(&a, "out"))
    );
    assert_eq!(
        session.engine().feed_source(&PlugPath::on(&c, "in")),
        Some(PlugPath::on(&b, "out"))
    );

    stack.redo(&mut session).unwrap().unwrap();
    assert!(!session.engine().node_exists(&b));
    assert!(session.engine().feeds_of(&b).is_empty());
}

#[test]
fn failed_erase_rolls_back_unfeeds() {
    let (mut session, mut stack, probe) = setup();
    let (a, b, c) = chain(&mut session);
    probe.reject(b.as_str());

    let err = unfeed_and_erase(&mut session, Mode::Stack(&mut stack), &b).unwrap_err();
    assert_eq!(err.operation, "erase_node");
    assert!(stack.is_empty(), "nothing materialized");
    assert!(session.engine().node_exists(&b));
    assert_eq!(
        session.engine().feed_source(&PlugPath::on(&b, "in")),
        Some(PlugPath::on(&a, "out"))
    );
    assert_eq!(
        session.engine().feed_source(&PlugPath::on(&c, "in")),
        Some(PlugPath::on(&b, "out"))
    );
}

#[test]
fn erase_scope_nests_engine_calls() {
    let (mut session, mut stack, _probe) = setup();
    let (_, b, _) = chain(&mut session);
    unfeed_and_erase(&mut session, Mode::Stack(&mut stack), &b).unwrap();
    assert_eq!(session.call_stack().depth(), 0);
    assert!(session.call_stack().deepest() >= 2);
}

// ============================================================================
// Plain erase
// ============================================================================

#[test]
fn erase_on_stack_undo_restores_node_and_feeds() {
    let (mut session, mut stack, _probe) = setup();
    let (a, b, c) = chain(&mut session);
    let before = session.engine().feeds_of(&b);
    assert_eq!(before.len(), 2);

    EraseNodeCmd::on_stack(&mut session, &mut stack, &b).unwrap();
    assert_eq!(stack.undo_label(), Some("Erase B"));
    let Some(Command::EraseNode(erase)) = stack.top() else {
        panic!("expected an erase entry");
    };
    assert_eq!(erase.feeds().len(), 2);
    assert!(!erase.snapshot().is_empty());
    assert!(!session.engine().node_exists(&b));
    assert!(session.engine().feeds_of(&a).is_empty());

    stack.undo(&mut session).unwrap().unwrap();
    assert!(session.engine().node_exists(&b));
    let mut after = session.engine().feeds_of(&b);
    after.sort_by(|x, y| x.input.as_str().cmp(y.input.as_str()));
    assert_eq!(
        after,
        vec![
            Feed {
                input: PlugPath::on(&b, "in"),
                output: PlugPath::on(&a, "out"),
            },
            Feed {
                input: PlugPath::on(&c, "in"),
                output: PlugPath::on(&b, "out"),
            },
        ]
    );

    stack.redo(&mut session).unwrap().unwrap();
    assert!(!session.engine().node_exists(&b));
    assert_eq!(session.engine().feed_source(&PlugPath::on(&c, "in")), None);
}

#[test]
fn erase_announces_every_cut_feed_before_the_erase() {
    let (mut session, _stack, _probe) = setup();
    let (_, b, _) = chain(&mut session);
    let (seen, _sub) = record_events(&session);

    EraseNodeCmd::once(&mut session, &b).unwrap();
    let changes: Vec<Change> = seen
        .borrow()
        .iter()
        .filter_map(|event| event.change().cloned())
        .collect();
    assert_eq!(changes.len(), 3, "two unfeeds then the erase");
    for change in &changes[..2] {
        assert!(
            matches!(change, Change::Feed { output, .. } if output.is_empty()),
            "{change:?}"
        );
    }
    assert!(matches!(&changes[2], Change::NodeErased { name } if *name == b));
}

#[test]
fn erase_redo_refreshes_the_snapshot() {
    let (mut session, mut stack, _probe) = setup();
    let foo = CreateNodeCmd::once(&mut session, "Body", &name("Foo")).unwrap();
    let mass = ParamPath::on(&foo, "mass");
    EraseNodeCmd::on_stack(&mut session, &mut stack, &foo).unwrap();

    stack.undo(&mut session).unwrap().unwrap();
    SetParameterCmd::once(&mut session, &mass, 0, &Value::Float(7.0)).unwrap();
    stack.redo(&mut session).unwrap().unwrap();
    assert!(!session.engine().node_exists(&foo));

    stack.undo(&mut session).unwrap().unwrap();
    assert_eq!(session.engine().parameter(&mass, 0), Some(Value::Float(7.0)));
}

#[test]
fn erase_refused_when_snapshot_fails() {
    let (mut session, mut stack, probe) = setup();
    let log = MessageLog::attach(session.hub(), &MessageLogConfig::default());
    let foo = CreateNodeCmd::once(&mut session, "Body", &name("Foo")).unwrap();
    probe.reject(foo.as_str());
    probe.clear_calls();

    let err = EraseNodeCmd::on_stack(&mut session, &mut stack, &foo).unwrap_err();
    assert_eq!(err.operation, "erase_node");
    assert!(err.message.contains("cannot snapshot"), "{}", err.message);
    assert_eq!(probe.count("export_entity"), 1);
    assert_eq!(probe.count("erase_node"), 0);
    assert!(session.engine().node_exists(&foo));
    assert!(stack.is_empty());
    assert!(log.count_at_least(Severity::Error) >= 1);
}

#[test]
fn redo_of_create_refuses_a_different_name() {
    let (mut session, mut stack, _probe) = setup();
    let foo = CreateNodeCmd::on_stack(&mut session, &mut stack, "Body", &name("Foo")).unwrap();
    let mass = ParamPath::on(&foo, "mass");
    SetParameterCmd::on_stack(&mut session, &mut stack, &mass, 0, &Value::Float(7.0), false)
        .unwrap();
    stack.undo(&mut session).unwrap().unwrap();
    stack.undo(&mut session).unwrap().unwrap();

    // Someone else takes the name while the create is undone.
    let other = CreateNodeCmd::once(&mut session, "Body", &name("Foo")).unwrap();
    assert_eq!(other, foo);

    let err = stack.redo(&mut session).unwrap().unwrap_err();
    assert_eq!(err.origin, Origin::Redo);
    assert!(err.failures[0].contains("Foo1"), "{:?}", err.failures);
    assert!(!session.engine().node_exists(&name("Foo1")), "stray node erased");
    assert_eq!(session.engine().parameter(&mass, 0), Some(Value::Float(1.0)));
}

// ============================================================================
// Rename and feeds
// ============================================================================

#[test]
fn rename_records_normalized_name() {
    let (mut session, mut stack, _probe) = setup();
    let foo = CreateNodeCmd::once(&mut session, "Body", &name("Foo")).unwrap();
    let renamed =
        RenameNodeCmd::on_stack(&mut session, &mut stack, &foo, &name("Bar baz")).unwrap();
    assert_eq!(renamed, name("Bar_baz"));
    assert_eq!(stack.undo_label(), Some("Rename Foo to Bar_baz"));

    stack.undo(&mut session).unwrap().unwrap();
    assert!(session.engine().node_exists(&foo));
    assert!(!session.engine().node_exists(&renamed));
}

#[test]
fn refused_feed_is_not_recorded() {
    let (mut session, mut stack, _probe) = setup();
    let a = CreateNodeCmd::once(&mut session, "Body", &name("A")).unwrap();
    let err = ConnectFeedCmd::on_stack(
        &mut session,
        &mut stack,
        &PlugPath::on(&a, "in"),
        &PlugPath::on(&a, "out"),
    )
    .unwrap_err();
    assert_eq!(err.operation, "connect_feed");
    assert!(stack.is_empty());
}

// ============================================================================
// Batches
// ============================================================================

#[test]
fn batch_keeps_the_applied_subset() {
    let (mut session, mut stack, probe) = setup();
    let nodes: Vec<NodeName> = ["A", "B", "C"]
        .into_iter()
        .map(|n| CreateNodeCmd::once(&mut session, "Body", &name(n)).unwrap())
        .collect();
    probe.reject("B");

    let outcome = set_operator_state(
        &mut session,
        Mode::Stack(&mut stack),
        &nodes,
        OperatorState::Disabled,
    );
    assert_eq!(outcome.applied, vec![name("A"), name("C")]);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(outcome.rejected[0].0, name("B"));
    assert!(outcome.is_success(), "partial success still counts");

    match stack.top() {
        Some(Command::SetOperatorState(batch)) => assert_eq!(batch.len(), 2),
        other => panic!("unexpected top {other:?}"),
    }

    stack.undo(&mut session).unwrap().unwrap();
    for node in &nodes {
        assert_eq!(session.engine().operator_state(node), Some(OperatorState::Enabled));
    }
}

#[test]
fn batch_skips_noops_without_calling_engine() {
    let (mut session, mut stack, probe) = setup();
    let nodes: Vec<NodeName> = ["A", "B", "C"]
        .into_iter()
        .map(|n| CreateNodeCmd::once(&mut session, "Body", &name(n)).unwrap())
        .collect();
    set_operator_state(&mut session, Mode::Once, &nodes[..2], OperatorState::Bypassed);
    probe.clear_calls();

    let outcome = set_operator_state(
        &mut session,
        Mode::Stack(&mut stack),
        &nodes,
        OperatorState::Bypassed,
    );
    assert_eq!(outcome.skipped, 2);
    assert_eq!(outcome.applied, vec![name("C")]);
    assert_eq!(probe.targets("set_operator_state"), vec!["C"]);
}

#[test]
fn batch_of_noops_records_nothing() {
    let (mut session, mut stack, probe) = setup();
    let a = CreateNodeCmd::once(&mut session, "Body", &name("A")).unwrap();
    probe.clear_calls();
    let outcome = set_selection(&mut session, Mode::Stack(&mut stack), &[], &[a]);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(probe.call_count(), 0);
    assert!(stack.is_empty());
}

#[test]
fn unknown_batch_target_is_rejected_individually() {
    let (mut session, mut stack, probe) = setup();
    let a = CreateNodeCmd::once(&mut session, "Body", &name("A")).unwrap();
    probe.clear_calls();
    let outcome = set_operator_state(
        &mut session,
        Mode::Stack(&mut stack),
        &[a.clone(), name("Ghost")],
        OperatorState::Disabled,
    );
    assert_eq!(outcome.applied, vec![a]);
    assert_eq!(outcome.rejected[0].0, name("Ghost"));
    assert_eq!(probe.count("set_operator_state"), 1);
}

#[test]
fn frame_bounds_live_on_root() {
    let (mut session, mut stack, _probe) = setup();
    set_frame_bounds(&mut session, Mode::Stack(&mut stack), 1.0, 48.0, false);
    assert_eq!(
        session.engine().meta(&EntityPath::root(), &MetaKey::frame_bounds()),
        Some(Value::Vec2([1.0, 48.0]))
    );
    stack.undo(&mut session).unwrap().unwrap();
    assert_eq!(session.engine().meta(&EntityPath::root(), &MetaKey::frame_bounds()), None);
}

// ============================================================================
// Replay failure, notifications, clean state
// ============================================================================

#[test]
fn refused_undo_moves_cursor_and_reports() {
    let (mut session, mut stack, probe) = setup();
    let log = MessageLog::attach(session.hub(), &MessageLogConfig::default());
    let foo = CreateNodeCmd::once(&mut session, "Body", &name("Foo")).unwrap();
    let mass = ParamPath::on(&foo, "mass");
    SetParameterCmd::on_stack(&mut session, &mut stack, &mass, 0, &Value::Float(5.0), false)
        .unwrap();

    probe.reject(mass.as_str());
    let err = stack.undo(&mut session).unwrap().unwrap_err();
    assert_eq!(err.origin, Origin::Undo);
    assert_eq!(err.failures.len(), 1);
    assert_eq!(stack.index(), 0, "cursor moved despite the refusal");
    assert_eq!(session.engine().parameter(&mass, 0), Some(Value::Float(5.0)));
    assert!(log.count_at_least(Severity::Error) >= 1);

    probe.allow_all();
    stack.redo(&mut session).unwrap().unwrap();
    assert_eq!(stack.index(), 1);
}

#[test]
fn undo_events_carry_their_origin() {
    let (mut session, mut stack, _probe) = setup();
    let (seen, _sub) = record_events(&session);
    CreateNodeCmd::on_stack(&mut session, &mut stack, "Body", &name("Foo")).unwrap();
    stack.undo(&mut session).unwrap().unwrap();

    let origins: Vec<Origin> = seen
        .borrow()
        .iter()
        .filter_map(|event| match event {
            Event::Changed { origin, success: true, .. } => Some(*origin),
            _ => None,
        })
        .collect();
    assert_eq!(origins, vec![Origin::Edit, Origin::Undo]);
}

#[test]
fn clean_signal_follows_the_cursor() {
    let (mut session, mut stack, _probe) = setup();
    let (seen, _sub) = record_events(&session);
    let foo = CreateNodeCmd::on_stack(&mut session, &mut stack, "Body", &name("Foo")).unwrap();
    stack.set_clean();
    move_nodes(&mut session, Mode::Stack(&mut stack), &[(foo, [3.0, 4.0])], false);
    stack.undo(&mut session).unwrap().unwrap();

    let signals: Vec<bool> = seen
        .borrow()
        .iter()
        .filter_map(|event| match event {
            Event::CleanChanged(clean) => Some(*clean),
            _ => None,
        })
        .collect();
    assert_eq!(signals, vec![false, true, false, true]);
    assert!(stack.is_clean());
}

#[test]
fn push_after_undo_drops_redo_tail() {
    let (mut session, mut stack, _probe) = setup();
    let foo = CreateNodeCmd::on_stack(&mut session, &mut stack, "Body", &name("Foo")).unwrap();
    move_nodes(&mut session, Mode::Stack(&mut stack), &[(foo.clone(), [1.0, 0.0])], false);
    stack.undo(&mut session).unwrap().unwrap();
    assert!(stack.can_redo());

    move_nodes(&mut session, Mode::Stack(&mut stack), &[(foo, [2.0, 0.0])], false);
    assert!(!stack.can_redo());
    assert_eq!(stack.len(), 2);
}

// ============================================================================
// Vector, plug flag and metadata edits
// ============================================================================

#[test]
fn vector3_is_clamped_and_undone_whole() {
    let (mut session, mut stack, _probe) = setup();
    let force = CreateNodeCmd::once(&mut session, "Force", &name("Wind")).unwrap();
    let direction = ParamPath::on(&force, "direction");

    let stored =
        SetVector3Cmd::on_stack(&mut session, &mut stack, &direction, [2.0, 0.5, -3.0], false)
            .unwrap();
    assert_eq!(stored, [1.0, 0.5, -1.0]);
    stack.undo(&mut session).unwrap().unwrap();
    assert_eq!(session.engine().parameter_vector3(&direction), Some([0.0, 0.0, 1.0]));
    stack.redo(&mut session).unwrap().unwrap();
    assert_eq!(session.engine().parameter_vector3(&direction), Some([1.0, 0.5, -1.0]));
}

#[test]
fn vector3_refused_on_scalar_parameter() {
    let (mut session, mut stack, probe) = setup();
    let foo = CreateNodeCmd::once(&mut session, "Body", &name("Foo")).unwrap();
    probe.clear_calls();
    let mass = ParamPath::on(&foo, "mass");
    let err = SetVector3Cmd::on_stack(&mut session, &mut stack, &mass, [1.0; 3], false)
        .unwrap_err();
    assert_eq!(err.operation, "set_parameter_vector3");
    assert_eq!(probe.call_count(), 0);
    assert!(stack.is_empty());
}

#[test]
fn plug_flag_round_trip() {
    let (mut session, mut stack, _probe) = setup();
    let foo = CreateNodeCmd::once(&mut session, "Body", &name("Foo")).unwrap();
    let plug = PlugPath::on(&foo, "in");

    SetPlugFlagCmd::on_stack(&mut session, &mut stack, &plug, true).unwrap();
    assert_eq!(stack.undo_label(), Some("Expose Foo.in"));
    assert_eq!(session.engine().group_plug_flag(&plug), Some(true));
    stack.undo(&mut session).unwrap().unwrap();
    assert_eq!(session.engine().group_plug_flag(&plug), Some(false));

    let missing = SetPlugFlagCmd::once(&mut session, &PlugPath::on(&foo, "nope"), true);
    assert!(missing.is_err());
}

#[test]
fn selection_undo_restores_deselected() {
    let (mut session, mut stack, _probe) = setup();
    let a = CreateNodeCmd::once(&mut session, "Body", &name("A")).unwrap();
    let b = CreateNodeCmd::once(&mut session, "Body", &name("B")).unwrap();
    let (seen, _sub) = record_events(&session);

    let outcome = select(&mut session, Mode::Stack(&mut stack), &[a.clone(), b.clone()], true);
    assert_eq!(outcome.changed(), 2);
    assert_eq!(stack.undo_label(), Some("Select 2 nodes"));
    let selections = seen
        .borrow()
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::Changed {
                    change: Change::Selection { selected: true, .. },
                    ..
                }
            )
        })
        .count();
    assert_eq!(selections, 2);

    stack.undo(&mut session).unwrap().unwrap();
    for node in [&a, &b] {
        assert_eq!(
            session.engine().meta(&EntityPath::from(node), &MetaKey::selected()),
            Some(Value::Bool(false))
        );
    }
}

#[test]
fn per_node_states_in_one_entry() {
    let (mut session, mut stack, _probe) = setup();
    let a = CreateNodeCmd::once(&mut session, "Body", &name("A")).unwrap();
    let b = CreateNodeCmd::once(&mut session, "Body", &name("B")).unwrap();
    let list = ArgsList::new()
        .with(a.clone(), OperatorState::Disabled)
        .with(b.clone(), OperatorState::Bypassed);

    let outcome = set_operator_states(&mut session, Mode::Stack(&mut stack), &list);
    assert_eq!(outcome.changed(), 2);
    assert_eq!(stack.len(), 1);
    assert_eq!(session.engine().operator_state(&b), Some(OperatorState::Bypassed));

    stack.undo(&mut session).unwrap().unwrap();
    assert_eq!(session.engine().operator_state(&a), Some(OperatorState::Enabled));
    assert_eq!(session.engine().operator_state(&b), Some(OperatorState::Enabled));
}

#[test]
fn arbitrary_meta_key_unset_on_undo() {
    let (mut session, mut stack, _probe) = setup();
    let a = CreateNodeCmd::once(&mut session, "Body", &name("A")).unwrap();
    let target = MetaTarget::new(&a, MetaKey::new("color"));
    let list = ArgsList::new().with(target.clone(), Some(Value::Text("teal".into())));

    set_meta(&mut session, Mode::Stack(&mut stack), "Color A", &list, false);
    assert_eq!(
        session.engine().meta(&target.entity, &target.key),
        Some(Value::Text("teal".into()))
    );
    stack.undo(&mut session).unwrap().unwrap();
    assert_eq!(session.engine().meta(&target.entity, &target.key), None);
}

#[test]
fn rename_onto_taken_name_is_refused() {
    let (mut session, mut stack, _probe) = setup();
    let a = CreateNodeCmd::once(&mut session, "Body", &name("A")).unwrap();
    let b = CreateNodeCmd::once(&mut session, "Body", &name("B")).unwrap();
    let err = RenameNodeCmd::on_stack(&mut session, &mut stack, &a, &b).unwrap_err();
    assert_eq!(err.operation, "rename_node");
    assert!(stack.is_empty());
    assert!(session.engine().node_exists(&a));
}

#[test]
fn compound_built_by_hand_undoes_in_reverse() {
    let (mut session, mut stack, _probe) = setup();
    let mut compound = CompoundCmd::new("Add rig");
    let body = CreateNodeCmd::as_child(&mut session, &mut compound, "Body", &name("Rig")).unwrap();
    let mass = ParamPath::on(&body, "mass");
    SetParameterCmd::as_child(&mut session, &mut compound, &mass, 0, &Value::Float(9.0)).unwrap();
    assert!(compound.commit(Mode::Stack(&mut stack)));
    assert_eq!(stack.len(), 1);

    stack.undo(&mut session).unwrap().unwrap();
    assert!(!session.engine().node_exists(&body));
    stack.redo(&mut session).unwrap().unwrap();
    assert_eq!(
        session.engine().parameter(&ParamPath::on(&body, "mass"), 0),
        Some(Value::Float(9.0))
    );

    assert!(!CompoundCmd::new("Nothing").commit(Mode::Stack(&mut stack)));
    assert_eq!(stack.len(), 1);
}
