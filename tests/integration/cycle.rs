//! Full daily cycles through the orchestrator with in-memory fakes.

use chrono::Utc;
use serde_json::json;

use waiverwire::engine::cycle::RunMode;
use waiverwire::engine::machine::CycleState;
use waiverwire::platforms::transaction::{TransactionItems, TransactionKind};
use waiverwire::storage;
use waiverwire::types::{FantasyError, Player, TrackingState};

use crate::fake_league::*;

const EXECUTED_LINE: &str = "Executed stream: dropped End Of Bench (9.00) for Hot Streamer (19.50).";

fn this_week() -> String {
    TrackingState::week_key_for(Utc::now())
}

#[tokio::test]
async fn confirmed_cycles_spend_the_weekly_budget_then_stop() {
    let path = context_file(json!({}));
    let _cleanup = Cleanup(path.clone());
    let league = FakeLeague::new(roster(), free_agents());
    let writer = FakeWriter::new();
    let orch = orchestrator(&path, &league, &writer);

    let first = orch.run_cycle(RunMode::Programmatic { confirm: true }).await.unwrap();
    assert_eq!(first.state, CycleState::Executed);
    assert_eq!(first.actions.last().unwrap(), EXECUTED_LINE);
    assert_eq!(first.weekly_transactions_used, 1);

    let sent = writer.submitted();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind(), TransactionKind::AddDrop);
    assert_eq!(sent[0].league_id, 777);
    assert_eq!(sent[0].team_id, TEAM_ID);
    assert_eq!(sent[0].scoring_period_id, 42);
    assert_eq!(
        sent[0].items,
        TransactionItems::AddDrop {
            drop_player_id: 106,
            add_player_id: 201
        }
    );
    assert_eq!(writer.cookies()[0], "SWID={ABC-123}; espn_s2=s2cookie");

    // The platform still reports zero; the local counter wins.
    let second = orch.run_cycle(RunMode::Programmatic { confirm: true }).await.unwrap();
    assert_eq!(second.state, CycleState::Executed);
    assert_eq!(second.weekly_transactions_used, 2);

    let third = orch.run_cycle(RunMode::Programmatic { confirm: true }).await.unwrap();
    assert_eq!(third.state, CycleState::Skipped);
    assert_eq!(
        third.actions.last().unwrap(),
        "Streaming skipped: weekly transaction limit reached (2/2)."
    );
    assert_eq!(writer.submitted().len(), 2);
    assert_eq!(orch.last_run().unwrap().weekly_transactions_used, 2);
}

#[tokio::test]
async fn platform_counter_ahead_of_tracking_is_adopted() {
    let path = context_file(json!({
        "tracking": {"weekly_transactions_used": 0, "week_key": this_week()}
    }));
    let _cleanup = Cleanup(path.clone());
    let league = FakeLeague::new(roster(), free_agents());
    league.set_transactions_used(Some(2));
    let writer = FakeWriter::new();
    let orch = orchestrator(&path, &league, &writer);

    let report = orch.run_cycle(RunMode::Programmatic { confirm: true }).await.unwrap();
    assert_eq!(report.state, CycleState::Skipped);
    assert!(report.actions.last().unwrap().contains("(2/2)"));
    assert!(writer.submitted().is_empty());
}

#[tokio::test]
async fn rejected_transaction_leaves_counter_untouched() {
    let path = context_file(json!({}));
    let _cleanup = Cleanup(path.clone());
    let league = FakeLeague::new(roster(), free_agents());
    let writer = FakeWriter::new();
    writer.reject_next(FantasyError::PlatformRejection("Roster is locked".into()));
    let orch = orchestrator(&path, &league, &writer);

    let report = orch.run_cycle(RunMode::Programmatic { confirm: true }).await.unwrap();
    assert_eq!(report.state, CycleState::Failed);
    assert_eq!(
        report.actions.last().unwrap(),
        "Streaming failed: ESPN transaction error: Roster is locked"
    );
    assert_eq!(report.weekly_transactions_used, 0);
    assert_eq!(writer.submitted().len(), 1);

    let saved = orch.last_run().unwrap();
    assert_eq!(saved.weekly_transactions_used, 0);
    assert_eq!(saved.last_state.as_deref(), Some("failed"));
}

#[tokio::test]
async fn http_failure_is_reported_with_status() {
    let path = context_file(json!({}));
    let _cleanup = Cleanup(path.clone());
    let league = FakeLeague::new(roster(), free_agents());
    let writer = FakeWriter::new();
    writer.reject_next(FantasyError::HttpStatus {
        status: 409,
        body: "conflict".into(),
    });
    let orch = orchestrator(&path, &league, &writer);

    let report = orch.run_cycle(RunMode::Programmatic { confirm: true }).await.unwrap();
    assert!(!report.executed());
    assert!(report.actions.last().unwrap().contains("HTTP 409"));
    assert_eq!(report.weekly_transactions_used, 0);
}

#[tokio::test]
async fn unresolved_player_ids_block_the_write() {
    let path = context_file(json!({}));
    let _cleanup = Cleanup(path.clone());
    let nameless = vec![Player::new("Mystery Man", "FA").with_averages(25.0, 25.0)];
    let league = FakeLeague::new(roster(), nameless);
    let writer = FakeWriter::new();
    let orch = orchestrator(&path, &league, &writer);

    let report = orch.run_cycle(RunMode::Programmatic { confirm: true }).await.unwrap();
    assert_eq!(report.state, CycleState::Skipped);
    assert!(report
        .actions
        .last()
        .unwrap()
        .starts_with("Streaming blocked: unable to resolve ESPN player IDs"));
    assert!(writer.submitted().is_empty());
    assert_eq!(report.weekly_transactions_used, 0);

    let saved = orch.last_run().unwrap();
    assert_eq!(saved.last_state.as_deref(), Some("skipped"));
    assert_eq!(saved.weekly_transactions_used, 0);
}

#[tokio::test]
async fn dry_run_previews_without_writing() {
    let path = context_file(json!({}));
    let _cleanup = Cleanup(path.clone());
    let league = FakeLeague::new(roster(), free_agents());
    let writer = FakeWriter::new();
    let orch = orchestrator(&path, &league, &writer);

    let report = orch.run_cycle(RunMode::DryRun).await.unwrap();
    assert_eq!(report.state, CycleState::Skipped);
    assert_eq!(report.mode, "dry_run");
    assert_eq!(report.actions.last().unwrap(), "WOULD DROP End Of Bench FOR Hot Streamer");
    assert!(report.actions.iter().any(|a| a.contains("Back From Injury")));
    assert!(report.actions.iter().any(|a| a.contains("Sprained Ankle")));
    assert!(writer.submitted().is_empty());

    let saved = orch.last_run().unwrap();
    assert_eq!(saved.last_mode.as_deref(), Some("dry_run"));
    assert_eq!(saved.moves_made_today, report.actions);
    assert_eq!(saved.weekly_transactions_used, 0);
}

#[tokio::test]
async fn decline_records_proposals_without_writing() {
    let path = context_file(json!({}));
    let _cleanup = Cleanup(path.clone());
    let league = FakeLeague::new(roster(), free_agents());
    let writer = FakeWriter::new();
    let orch = orchestrator(&path, &league, &writer);

    let report = orch.run_cycle(RunMode::Programmatic { confirm: false }).await.unwrap();
    assert_eq!(report.state, CycleState::Declined);
    assert_eq!(
        report.actions.last().unwrap(),
        "Declined: WOULD DROP End Of Bench FOR Hot Streamer"
    );
    assert!(writer.submitted().is_empty());
}

#[tokio::test]
async fn free_agent_failure_still_yields_ir_and_lineup_advice() {
    let path = context_file(json!({}));
    let _cleanup = Cleanup(path.clone());
    let league = FakeLeague::new(roster(), free_agents());
    league.fail_free_agents(FantasyError::Transport("connection reset".into()));
    let writer = FakeWriter::new();
    let orch = orchestrator(&path, &league, &writer);

    let report = orch.run_cycle(RunMode::Programmatic { confirm: true }).await.unwrap();
    assert_eq!(report.state, CycleState::Skipped);
    assert_eq!(report.suggestions.ir.len(), 2);
    assert_eq!(report.suggestions.lineup.len(), 1);
    assert!(report
        .actions
        .iter()
        .any(|a| a.starts_with("IR move not yet implemented: ")));
    assert!(report.actions.last().unwrap().contains("connection reset"));
    assert!(writer.submitted().is_empty());
}

#[tokio::test]
async fn new_week_resets_the_counter() {
    let path = context_file(json!({
        "tracking": {"weekly_transactions_used": 2, "week_key": "2020-W01"}
    }));
    let _cleanup = Cleanup(path.clone());
    let league = FakeLeague::new(roster(), free_agents());
    let writer = FakeWriter::new();
    let orch = orchestrator(&path, &league, &writer);

    let report = orch.run_cycle(RunMode::Programmatic { confirm: true }).await.unwrap();
    assert_eq!(report.state, CycleState::Executed);
    assert_eq!(report.weekly_transactions_used, 1);

    let saved = orch.last_run().unwrap();
    assert_eq!(saved.week_key, Some(this_week()));
}

#[tokio::test]
async fn free_agent_pool_is_read_for_the_roster_scoring_period() {
    let path = context_file(json!({}));
    let _cleanup = Cleanup(path.clone());
    let league = FakeLeague::new(roster(), free_agents());
    let orch = orchestrator(&path, &league, &FakeWriter::new());

    let suggestions = orch.analyze().await.unwrap();
    assert_eq!(suggestions.scoring_period_id, 42);
    assert_eq!(league.free_agent_calls(), vec![(42, 10)]);

    // analyze never persists
    let saved = storage::load_context(&path).unwrap().unwrap();
    assert!(saved.tracking.last_run_utc.is_none());
}

#[tokio::test]
async fn unknown_context_keys_survive_a_cycle() {
    let path = context_file(json!({"notes": {"trade_block": ["Steady Wing"]}}));
    let _cleanup = Cleanup(path.clone());
    let league = FakeLeague::new(roster(), free_agents());
    let orch = orchestrator(&path, &league, &FakeWriter::new());

    orch.run_cycle(RunMode::DryRun).await.unwrap();

    let saved = storage::load_context(&path).unwrap().unwrap();
    assert_eq!(saved.extra["notes"]["trade_block"][0], "Steady Wing");
    assert_eq!(saved.season.current_record.as_deref(), Some("10-4"));
}

#[tokio::test]
async fn missing_team_fails_the_cycle_and_is_recorded() {
    let path = context_file(json!({}));
    let _cleanup = Cleanup(path.clone());
    let mut other = roster();
    other.team_id = 99;
    let league = FakeLeague::new(other, free_agents());
    let orch = orchestrator(&path, &league, &FakeWriter::new());

    let err = orch.run_cycle(RunMode::DryRun).await.unwrap_err();
    assert!(matches!(err, FantasyError::Lookup(_)));

    let saved = orch.last_run().unwrap();
    assert_eq!(saved.last_state.as_deref(), Some("failed"));
    assert!(saved.moves_made_today[0].starts_with("Cycle failed: "));
}

#[tokio::test]
async fn placeholder_credentials_stop_before_any_read() {
    let path = context_file(json!({
        "league": {
            "league_id": 777, "team_id": TEAM_ID, "season_year": 2026,
            "espn_auth": {"swid": "<YOUR_SWID>", "espn_s2": "s2cookie"}
        }
    }));
    let _cleanup = Cleanup(path.clone());
    let league = FakeLeague::new(roster(), free_agents());
    league.fail_roster(FantasyError::Transport("must not be called".into()));
    let orch = orchestrator(&path, &league, &FakeWriter::new());

    let err = orch.run_cycle(RunMode::DryRun).await.unwrap_err();
    assert!(err.is_fatal_setup());
    assert!(league.free_agent_calls().is_empty());
}

#[tokio::test]
async fn lineup_fix_swaps_the_injured_starter_without_spending_budget() {
    let path = context_file(json!({}));
    let _cleanup = Cleanup(path.clone());
    let league = FakeLeague::new(roster(), free_agents());
    let writer = FakeWriter::new();
    let orch = orchestrator(&path, &league, &writer);

    let status = orch.lineup_status().await.unwrap();
    assert_eq!(status.team_name, "Night Shift");
    assert_eq!(status.fixes.len(), 1);
    assert_eq!(status.fixes[0].starter.name, "Sprained Ankle");
    assert_eq!(status.fixes[0].replacement.name, "Spare Big");

    let report = orch.execute_lineup().await.unwrap();
    assert!(report.executed);
    assert_eq!(report.state, CycleState::Executed);
    assert!(report.actions[0].starts_with("Executed lineup swap: "));

    let sent = writer.submitted();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind(), TransactionKind::LineupSwap);
    assert_eq!(sent[0].member_id, "{ABC-123}");
    assert_eq!(
        sent[0].items,
        TransactionItems::LineupSwap {
            starter_player_id: 103,
            replacement_player_id: 104,
            starter_slot_id: 4,
            bench_slot_id: 9,
        }
    );

    let saved = orch.last_run().unwrap();
    assert_eq!(saved.weekly_transactions_used, 0);
    assert_eq!(saved.last_mode.as_deref(), Some("execute_lineup"));
}

#[tokio::test]
async fn healthy_lineup_needs_no_write() {
    let path = context_file(json!({}));
    let _cleanup = Cleanup(path.clone());
    let mut healthy = roster();
    for p in &mut healthy.players {
        p.injury_status = Some("ACTIVE".into());
    }
    let league = FakeLeague::new(healthy, free_agents());
    let writer = FakeWriter::new();
    let orch = orchestrator(&path, &league, &writer);

    let report = orch.execute_lineup().await.unwrap();
    assert!(!report.executed);
    assert_eq!(report.state, CycleState::Skipped);
    assert_eq!(report.actions, vec!["No injured starters need a lineup fix.".to_string()]);
    assert!(writer.submitted().is_empty());
}
