//! Cycles that go through the real transaction client against a local
//! stand-in for the ESPN write API.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    routing::post,
    Router,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use waiverwire::engine::cycle::{CycleOrchestrator, RunMode};
use waiverwire::engine::executor::Executor;
use waiverwire::engine::machine::CycleState;
use waiverwire::platforms::transaction::TransactionRequestBuilder;
use waiverwire::platforms::writer::{TransactionClient, WriteEndpoint};

use crate::fake_league::*;

#[derive(Clone, Debug)]
struct Seen {
    path: String,
    headers: HeaderMap,
    body: Value,
}

#[derive(Clone, Default)]
struct WriteApi {
    seen: Arc<Mutex<Vec<Seen>>>,
    replies: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
}

impl WriteApi {
    fn reply(&self, status: StatusCode, body: &str) {
        self.replies.lock().unwrap().push_back((status, body.to_string()));
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

async fn record(
    State(api): State<WriteApi>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    api.seen.lock().unwrap().push(Seen {
        path: uri.path().to_string(),
        headers,
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });
    api.replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::OK, String::new()))
}

/// Start the stand-in and return its base URL.
async fn start(api: WriteApi) -> String {
    let app = Router::new()
        .route("/*path", post(record))
        .with_state(api);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.ok() });
    format!("http://{addr}")
}

fn orchestrator_with_client(path: &str, league: &FakeLeague, client: TransactionClient) -> CycleOrchestrator {
    CycleOrchestrator::new(
        Arc::new(league.clone()),
        Executor::new(Arc::new(client)),
        options(path),
    )
}

#[tokio::test]
async fn add_drop_is_posted_with_espn_headers_and_default_body() {
    let api = WriteApi::default();
    let base = start(api.clone()).await;
    let client = TransactionClient::new(
        WriteEndpoint::new(&base, false),
        WriteEndpoint::new(&base, true),
        5,
    )
    .unwrap();
    let path = context_file(json!({}));
    let _cleanup = Cleanup(path.clone());
    let league = FakeLeague::new(roster(), free_agents());
    let orch = orchestrator_with_client(&path, &league, client);

    let report = orch.run_cycle(RunMode::Programmatic { confirm: true }).await.unwrap();
    assert_eq!(report.state, CycleState::Executed);
    assert_eq!(report.weekly_transactions_used, 1);

    let seen = api.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0].path,
        "/apis/v3/games/fba/seasons/2026/segments/0/leagues/777/transactions"
    );
    assert_eq!(seen[0].headers["x-fantasy-platform"], "espn-fantasy-web");
    assert_eq!(seen[0].headers["x-fantasy-source"], "kona");
    assert_eq!(seen[0].headers["cookie"], "SWID={ABC-123}; espn_s2=s2cookie");
    assert_eq!(seen[0].body["type"], "ROSTER");
    assert_eq!(seen[0].body["memberId"], "3");
    assert_eq!(seen[0].body["items"][0], json!({"playerId": 201, "type": "ADD", "fromSlotId": 0}));
    assert_eq!(seen[0].body["items"][1], json!({"playerId": 106, "type": "DROP", "fromSlotId": 0}));
}

#[tokio::test]
async fn error_message_in_a_200_response_is_a_rejection() {
    let api = WriteApi::default();
    api.reply(
        StatusCode::OK,
        r#"{"messages": [{"message": "Error: player is on waivers"}]}"#,
    );
    let base = start(api.clone()).await;
    let client = TransactionClient::new(
        WriteEndpoint::new(&base, false),
        WriteEndpoint::new(&base, true),
        5,
    )
    .unwrap();
    let path = context_file(json!({}));
    let _cleanup = Cleanup(path.clone());
    let league = FakeLeague::new(roster(), free_agents());
    let orch = orchestrator_with_client(&path, &league, client);

    let report = orch.run_cycle(RunMode::Programmatic { confirm: true }).await.unwrap();
    assert_eq!(report.state, CycleState::Failed);
    assert!(report.actions.last().unwrap().contains("player is on waivers"));
    assert_eq!(orch.last_run().unwrap().weekly_transactions_used, 0);
}

#[tokio::test]
async fn server_error_body_is_truncated_in_the_outcome() {
    let api = WriteApi::default();
    api.reply(StatusCode::INTERNAL_SERVER_ERROR, &"x".repeat(800));
    let base = start(api.clone()).await;
    let client = TransactionClient::new(
        WriteEndpoint::new(&base, false),
        WriteEndpoint::new(&base, true),
        5,
    )
    .unwrap();
    let path = context_file(json!({}));
    let _cleanup = Cleanup(path.clone());
    let league = FakeLeague::new(roster(), free_agents());
    let orch = orchestrator_with_client(&path, &league, client);

    let report = orch.run_cycle(RunMode::Programmatic { confirm: true }).await.unwrap();
    let line = report.actions.last().unwrap();
    assert!(line.contains("HTTP 500"));
    assert!(line.ends_with(&"x".repeat(500)));
    assert!(!line.ends_with(&"x".repeat(501)));
}

#[tokio::test]
async fn lineup_swap_uses_captured_template_and_trailing_slash() {
    let api = WriteApi::default();
    let base = start(api.clone()).await;
    let template = r#"{"teamId": {team_id}, "memberId": "{member_id}",
        "scoringPeriodId": {scoring_period_id},
        "items": [{"playerId": {replacement_player_id}, "toLineupSlotId": {starter_slot_id}},
                  {"playerId": {starter_player_id}, "toLineupSlotId": {bench_slot_id}}]}"#;
    let client = TransactionClient::new(
        WriteEndpoint::new(&base, false),
        WriteEndpoint::new(&base, true)
            .with_body(TransactionRequestBuilder::with_template(template)),
        5,
    )
    .unwrap();
    let path = context_file(json!({}));
    let _cleanup = Cleanup(path.clone());
    let league = FakeLeague::new(roster(), free_agents());
    let orch = orchestrator_with_client(&path, &league, client);

    let report = orch.execute_lineup().await.unwrap();
    assert!(report.executed);

    let seen = api.seen();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].path.ends_with("/leagues/777/transactions/"));
    assert_eq!(
        seen[0].body,
        json!({
            "teamId": 3,
            "memberId": "{ABC-123}",
            "scoringPeriodId": 42,
            "items": [{"playerId": 104, "toLineupSlotId": 4},
                      {"playerId": 103, "toLineupSlotId": 9}]
        })
    );
}
