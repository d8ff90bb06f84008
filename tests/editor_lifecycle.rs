mod common;

use common::{edge, editor, node, FakeGateway};
use serde_json::json;
use tradeflow::{
    editor::{Key, KeyEvent, Phase, Route, RunStatus, ShortcutAction},
    error::{EditorError, Operation, ValidationError},
    gateway::GatewayError,
    workflow::{
        catalog::{NodeConfig, NodeKind},
        types::{Connection, ExecutionReport, LogEntry, LogLevel, Node, Position, RunOutcome},
    },
};

#[tokio::test]
async fn load_reseeds_ids_and_adopts_active_flag() {
    let gateway = FakeGateway::new();
    let id = gateway.seed(
        "Breakout",
        vec![node("node_3", NodeKind::Start), node("node_7", NodeKind::PlaceOrder)],
        vec![edge("node_3", "node_7")],
    );
    let (controller, cache) = editor(&gateway);

    controller.load(id).await.unwrap();

    assert_eq!(controller.phase(), Phase::Ready);
    assert_eq!(controller.workflow_id(), Some(id));
    assert!(!controller.is_active());
    assert!(!controller.is_dirty());
    assert!(cache.is_document_cached(id));

    let added = controller.edit(|graph| graph.add_node(NodeKind::Delay, Position::new(5.0, 5.0)));
    assert_eq!(added, "node_8");
    assert!(controller.is_dirty());
}

#[tokio::test]
async fn loading_unknown_workflow_reports_not_found() {
    let gateway = FakeGateway::new();
    let (controller, _) = editor(&gateway);

    assert_eq!(controller.load(99).await, Err(EditorError::NotFound));
    assert_eq!(controller.phase(), Phase::Empty);
    assert!(!controller.is_in_flight(Operation::Load));
}

#[tokio::test]
async fn save_clears_dirty_and_invalidates_cache() {
    let gateway = FakeGateway::new();
    let id = gateway.seed("Scalper", vec![node("node_1", NodeKind::Start)], Vec::new());
    let (controller, cache) = editor(&gateway);
    controller.load(id).await.unwrap();

    controller.edit(|graph| {
        let order = graph.add_node(NodeKind::PlaceOrder, Position::new(0.0, 120.0));
        graph.connect(Connection::new("node_1", order));
    });
    assert!(controller.is_dirty());

    assert_eq!(controller.save().await, Ok(id));

    assert!(!controller.is_dirty());
    assert!(!cache.is_document_cached(id));
    assert!(!cache.is_listing_cached());
    let stored = gateway.stored(id).unwrap();
    assert_eq!(stored.nodes.len(), 2);
    assert_eq!(stored.edges.len(), 1);
}

#[tokio::test]
async fn edits_during_save_keep_model_dirty() {
    let gateway = FakeGateway::new();
    let id = gateway.seed("Scalper", Vec::new(), Vec::new());
    let (controller, _) = editor(&gateway);
    controller.load(id).await.unwrap();
    controller.edit(|graph| graph.set_name("Scalper v2"));

    let gate = gateway.hold("update");
    let (saved, ()) = tokio::join!(controller.save(), async {
        assert!(controller.is_in_flight(Operation::Save));
        controller.edit(|graph| graph.add_node(NodeKind::Notify, Position::new(0.0, 0.0)));
        gate.notify_one();
    });

    assert_eq!(saved, Ok(id));
    assert!(controller.is_dirty());
    assert_eq!(gateway.stored(id).unwrap().name, "Scalper v2");
    assert!(gateway.stored(id).unwrap().nodes.is_empty());
}

#[tokio::test]
async fn failed_save_stays_dirty_and_can_retry() {
    let gateway = FakeGateway::new();
    let id = gateway.seed("Swing", Vec::new(), Vec::new());
    let (controller, _) = editor(&gateway);
    controller.load(id).await.unwrap();
    controller.edit(|graph| graph.add_node(NodeKind::Start, Position::new(0.0, 0.0)));

    gateway.fail_next("update", GatewayError::Transport("connection reset".into()));
    assert_eq!(
        controller.save().await,
        Err(EditorError::Transport("connection reset".into()))
    );
    assert!(controller.is_dirty());
    assert_eq!(controller.view(|graph| graph.nodes().len()), 1);

    assert_eq!(controller.save().await, Ok(id));
    assert!(!controller.is_dirty());
}

#[tokio::test]
async fn second_save_while_saving_is_refused() {
    let gateway = FakeGateway::new();
    let id = gateway.seed("Scalper", Vec::new(), Vec::new());
    let (controller, _) = editor(&gateway);
    controller.load(id).await.unwrap();
    controller.edit(|graph| graph.set_name("Scalper v3"));

    let gate = gateway.hold("update");
    let (saved, ()) = tokio::join!(controller.save(), async {
        assert_eq!(
            controller.save().await,
            Err(EditorError::InFlight(Operation::Save))
        );
        gate.notify_one();
    });

    assert_eq!(saved, Ok(id));
    assert_eq!(gateway.call_count("update"), 1);
    assert!(!controller.is_in_flight(Operation::Save));
}

#[tokio::test]
async fn deactivate_waits_for_pending_activate() {
    let gateway = FakeGateway::new();
    let id = gateway.seed("Hedge", Vec::new(), Vec::new());
    let (controller, _) = editor(&gateway);
    controller.load(id).await.unwrap();

    let gate = gateway.hold("activate");
    let (activated, ()) = tokio::join!(controller.activate(), async {
        assert_eq!(
            controller.deactivate().await,
            Err(EditorError::InFlight(Operation::Deactivate))
        );
        assert_eq!(
            controller.activate().await,
            Err(EditorError::InFlight(Operation::Activate))
        );
        gate.notify_one();
    });

    assert_eq!(activated, Ok(()));
    assert!(controller.is_active());
    assert_eq!(gateway.call_count("activate"), 1);
    assert_eq!(gateway.call_count("deactivate"), 0);
}

#[tokio::test]
async fn foreign_node_types_survive_load_save_and_export() {
    let gateway = FakeGateway::new();
    let foreign = Node::new(
        "node_4",
        Position::new(40.0, 80.0),
        NodeConfig::Unknown {
            kind: "smart_order".to_string(),
            data: json!({"symbol": "NIFTY", "position_size": 50}),
        },
    );
    let id = gateway.seed(
        "Options desk",
        vec![node("node_1", NodeKind::Start), foreign.clone()],
        vec![edge("node_1", "node_4")],
    );
    let (controller, _) = editor(&gateway);
    controller.load(id).await.unwrap();

    let added = controller.edit(|graph| graph.add_node(NodeKind::Notify, Position::new(0.0, 0.0)));
    assert_eq!(added, "node_5");
    controller.save().await.unwrap();

    let stored = gateway.stored(id).unwrap();
    assert_eq!(stored.nodes[1], foreign);
    assert_eq!(stored.edges.len(), 1);

    let file = controller.export().await.unwrap();
    let exported: serde_json::Value = serde_json::from_str(&file.contents).unwrap();
    assert_eq!(exported["nodes"][1]["type"], "smart_order");
    assert_eq!(exported["nodes"][1]["data"]["position_size"], 50);
}

#[tokio::test]
async fn empty_name_is_rejected_without_gateway_calls() {
    let gateway = FakeGateway::new();
    let (controller, _) = editor(&gateway);
    controller.new_draft();
    controller.edit(|graph| graph.set_name("   "));

    assert_eq!(
        controller.save().await,
        Err(EditorError::Validation(ValidationError::EmptyName))
    );
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn draft_save_creates_then_adopts_id() {
    let gateway = FakeGateway::new();
    let (controller, _) = editor(&gateway);
    controller.new_draft();
    assert_eq!(controller.route(), Route::NewWorkflow);
    controller.edit(|graph| {
        graph.set_name("Expiry day");
        graph.add_node(NodeKind::TimeTrigger, Position::new(0.0, 0.0));
    });

    let id = controller.save().await.unwrap();

    assert_eq!(gateway.calls(), vec!["create", "update"]);
    assert_eq!(controller.workflow_id(), Some(id));
    assert_eq!(controller.route(), Route::EditWorkflow(id));
    assert_eq!(gateway.stored(id).unwrap().nodes.len(), 1);
    assert!(!controller.is_dirty());
}

#[tokio::test]
async fn toggles_are_idempotent_and_failures_keep_flag() {
    let gateway = FakeGateway::new();
    let id = gateway.seed("Hedge", Vec::new(), Vec::new());
    let (controller, _) = editor(&gateway);
    controller.load(id).await.unwrap();

    controller.deactivate().await.unwrap();
    assert!(!controller.is_active());

    controller.activate().await.unwrap();
    controller.activate().await.unwrap();
    assert!(controller.is_active());
    assert!(gateway.stored(id).unwrap().is_active);

    gateway.fail_next("deactivate", GatewayError::Transport("timeout".into()));
    assert!(controller.deactivate().await.is_err());
    assert!(controller.is_active());
}

#[tokio::test]
async fn execute_shows_running_before_response() {
    let gateway = FakeGateway::new();
    let id = gateway.seed("Momentum", vec![node("node_1", NodeKind::Start)], Vec::new());
    let (controller, _) = editor(&gateway);
    controller.load(id).await.unwrap();

    let report = ExecutionReport {
        status: RunOutcome::Failure,
        message: "margin check failed".into(),
        logs: vec![
            LogEntry::now(LogLevel::Info, "starting"),
            LogEntry::now(LogLevel::Error, "insufficient margin"),
        ],
    };
    gateway.set_report(report);

    let gate = gateway.hold("execute");
    let (result, ()) = tokio::join!(controller.execute(), async {
        assert_eq!(controller.run_status(), RunStatus::Running);
        assert!(controller.log().entries().is_empty());
        assert_eq!(
            controller.execute().await,
            Err(EditorError::InFlight(Operation::Execute))
        );
        gate.notify_one();
    });

    assert_eq!(result, Ok(RunStatus::Error));
    let log = controller.log();
    assert_eq!(log.entries().len(), 2);
    assert_eq!(log.message(), Some("margin check failed"));
    assert_eq!(gateway.call_count("execute"), 1);
}

#[tokio::test]
async fn execute_transport_failure_synthesizes_one_entry() {
    let gateway = FakeGateway::new();
    let id = gateway.seed("Momentum", Vec::new(), Vec::new());
    let (controller, _) = editor(&gateway);
    controller.load(id).await.unwrap();

    gateway.fail_next("execute", GatewayError::Transport("connection refused".into()));
    assert!(controller.execute().await.is_err());

    let log = controller.log();
    assert_eq!(log.status(), RunStatus::Error);
    assert_eq!(log.entries().len(), 1);
    assert_eq!(log.entries()[0].level, LogLevel::Error);
    assert_eq!(log.entries()[0].message, "connection refused");
}

#[tokio::test]
async fn operations_needing_an_id_refuse_drafts() {
    let gateway = FakeGateway::new();
    let (controller, _) = editor(&gateway);
    controller.new_draft();

    assert_eq!(controller.execute().await, Err(EditorError::NotLoaded));
    assert_eq!(controller.activate().await, Err(EditorError::NotLoaded));
    assert_eq!(controller.export().await.unwrap_err(), EditorError::NotLoaded);
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn import_validates_locally_then_navigates() {
    let gateway = FakeGateway::new();
    let (controller, cache) = editor(&gateway);

    assert_eq!(
        controller.import(r#"{"name":"X"}"#).await,
        Err(EditorError::Validation(ValidationError::MissingField("nodes")))
    );
    assert!(matches!(
        controller.import("not json").await,
        Err(EditorError::Validation(ValidationError::MalformedJson(_)))
    ));
    assert!(gateway.calls().is_empty());

    cache.list().await.unwrap();
    let id = controller
        .import(r#"{"name":"X","nodes":[],"edges":[]}"#)
        .await
        .unwrap();

    assert_eq!(controller.route(), Route::EditWorkflow(id));
    assert_eq!(gateway.call_count("import"), 1);
    assert!(!cache.is_listing_cached());
}

#[tokio::test]
async fn export_names_file_after_workflow() {
    let gateway = FakeGateway::new();
    let id = gateway.seed("Bank Nifty: Straddle", vec![node("node_1", NodeKind::Start)], Vec::new());
    let (controller, _) = editor(&gateway);
    controller.load(id).await.unwrap();

    let file = controller.export().await.unwrap();

    assert_eq!(file.file_name, "bank_nifty_straddle.json");
    assert!(file.contents.contains("\"node_1\""));
}

#[tokio::test]
async fn shortcuts_respect_focus_and_dirty_guards() {
    let gateway = FakeGateway::new();
    let id = gateway.seed(
        "Guards",
        vec![node("node_1", NodeKind::Start), node("node_2", NodeKind::Notify)],
        vec![edge("node_1", "node_2")],
    );
    let (controller, _) = editor(&gateway);
    controller.load(id).await.unwrap();

    let save = KeyEvent::new(Key::Char('s')).with_ctrl();
    assert_eq!(controller.handle_key(save).await, Ok(None));

    controller.edit(|graph| graph.select_node(Some("node_2")));
    let typing = KeyEvent::new(Key::Backspace).in_text_input();
    assert_eq!(controller.handle_key(typing).await, Ok(None));
    assert_eq!(controller.view(|graph| graph.nodes().len()), 2);

    assert_eq!(
        controller.handle_key(KeyEvent::new(Key::Delete)).await,
        Ok(Some(ShortcutAction::DeleteSelected))
    );
    assert_eq!(controller.view(|graph| (graph.nodes().len(), graph.edges().len())), (1, 0));

    assert_eq!(controller.handle_key(save).await, Ok(Some(ShortcutAction::Save)));
    assert!(!controller.is_dirty());
    assert_eq!(gateway.call_count("update"), 1);

    controller.handle_key(KeyEvent::new(Key::Char('?'))).await.unwrap();
    assert!(controller.help_open());
    controller.edit(|graph| graph.select_node(Some("node_1")));
    controller.handle_key(KeyEvent::new(Key::Escape)).await.unwrap();
    assert!(!controller.help_open());
    assert!(!controller.view(|graph| graph.has_selection()));
}

#[tokio::test]
async fn late_run_report_is_dropped_after_reset() {
    let gateway = FakeGateway::new();
    let id = gateway.seed("Old", Vec::new(), Vec::new());
    let (controller, _) = editor(&gateway);
    controller.load(id).await.unwrap();

    let gate = gateway.hold("execute");
    let (result, ()) = tokio::join!(controller.execute(), async {
        controller.reset_workflow();
        gate.notify_one();
    });

    assert!(result.is_ok());
    assert_eq!(controller.phase(), Phase::Empty);
    assert_eq!(controller.run_status(), RunStatus::Idle);
    assert!(controller.log().entries().is_empty());
}
