//! In-memory league for integration testing.
//!
//! `FakeLeague` serves a fixed roster and free-agent pool; `FakeWriter`
//! records every submitted transaction and answers with a scripted result.
//! Both are cheap to clone and share their state, so a test can keep a
//! handle for assertions after moving one into the orchestrator.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use waiverwire::config::AppConfig;
use waiverwire::engine::cycle::{CycleOptions, CycleOrchestrator};
use waiverwire::engine::executor::Executor;
use waiverwire::platforms::transaction::TransactionRequest;
use waiverwire::platforms::{
    Credentials, LeagueReader, LeagueRef, TransactionReceipt, TransactionWriter,
};
use waiverwire::types::{FantasyError, Player, RosterSnapshot};

#[derive(Clone)]
pub struct FakeLeague {
    roster: Arc<Mutex<RosterSnapshot>>,
    free_agents: Arc<Mutex<Result<Vec<Player>, FantasyError>>>,
    roster_error: Arc<Mutex<Option<FantasyError>>>,
    free_agent_calls: Arc<Mutex<Vec<(u32, usize)>>>,
}

impl FakeLeague {
    pub fn new(roster: RosterSnapshot, free_agents: Vec<Player>) -> Self {
        Self {
            roster: Arc::new(Mutex::new(roster)),
            free_agents: Arc::new(Mutex::new(Ok(free_agents))),
            roster_error: Arc::new(Mutex::new(None)),
            free_agent_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn fail_free_agents(&self, err: FantasyError) {
        *self.free_agents.lock().unwrap() = Err(err);
    }

    pub fn fail_roster(&self, err: FantasyError) {
        *self.roster_error.lock().unwrap() = Some(err);
    }

    /// Platform-reported counter on the next roster read.
    pub fn set_transactions_used(&self, used: Option<u32>) {
        self.roster.lock().unwrap().transactions_used = used;
    }

    pub fn free_agent_calls(&self) -> Vec<(u32, usize)> {
        self.free_agent_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LeagueReader for FakeLeague {
    async fn roster(
        &self,
        league: &LeagueRef,
        _credentials: &Credentials,
    ) -> Result<RosterSnapshot, FantasyError> {
        if let Some(err) = self.roster_error.lock().unwrap().clone() {
            return Err(err);
        }
        let roster = self.roster.lock().unwrap().clone();
        if roster.team_id != league.team_id {
            return Err(FantasyError::Lookup(format!(
                "team {} not found in league {}",
                league.team_id, league.league_id
            )));
        }
        Ok(roster)
    }

    async fn free_agents(
        &self,
        _league: &LeagueRef,
        _credentials: &Credentials,
        scoring_period_id: u32,
        size: usize,
    ) -> Result<Vec<Player>, FantasyError> {
        self.free_agent_calls
            .lock()
            .unwrap()
            .push((scoring_period_id, size));
        self.free_agents
            .lock()
            .unwrap()
            .clone()
            .map(|pool| pool.into_iter().take(size).collect())
    }
}

#[derive(Clone, Default)]
pub struct FakeWriter {
    submitted: Arc<Mutex<Vec<TransactionRequest>>>,
    cookies: Arc<Mutex<Vec<String>>>,
    /// Scripted failures, consumed in order; an empty script accepts.
    script: Arc<Mutex<VecDeque<FantasyError>>>,
}

impl FakeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_next(&self, err: FantasyError) {
        self.script.lock().unwrap().push_back(err);
    }

    pub fn submitted(&self) -> Vec<TransactionRequest> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn cookies(&self) -> Vec<String> {
        self.cookies.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionWriter for FakeWriter {
    async fn submit(
        &self,
        request: &TransactionRequest,
        credentials: &Credentials,
    ) -> Result<TransactionReceipt, FantasyError> {
        self.submitted.lock().unwrap().push(request.clone());
        self.cookies.lock().unwrap().push(credentials.cookie_header());
        if let Some(err) = self.script.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(TransactionReceipt {
            kind: request.kind(),
            url: "memory://transactions".into(),
            status: 200,
            response: None,
            timestamp: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub const TEAM_ID: i64 = 3;

/// Two healthy starters, one starter ruled OUT, a bench player, and an
/// IR player who is healthy again.
pub fn roster() -> RosterSnapshot {
    RosterSnapshot {
        team_id: TEAM_ID,
        team_name: "Night Shift".into(),
        scoring_period_id: 42,
        players: vec![
            Player::new("Franchise Guard", "PG").with_id(101).with_averages(48.0, 50.0).with_rank(8),
            Player::new("Steady Wing", "SF").with_id(102).with_averages(30.0, 31.0).with_rank(60),
            Player::new("Sprained Ankle", "C").with_id(103).with_averages(26.0, 25.0).with_rank(110).with_status("OUT"),
            Player::new("Spare Big", "BE").with_id(104).with_averages(27.0, 28.0).with_rank(140),
            Player::new("Back From Injury", "IR").with_id(105).with_averages(24.0, 24.0).with_rank(120).with_status("ACTIVE"),
            Player::new("End Of Bench", "BE").with_id(106).with_averages(9.0, 10.0).with_rank(300),
        ],
        transactions_used: Some(0),
        acquisition_limit: None,
    }
}

pub fn free_agents() -> Vec<Player> {
    vec![
        Player::new("Hot Streamer", "FA").with_id(201).with_averages(19.5, 20.0).with_rank(150),
        Player::new("Deep Reserve", "FA").with_id(202).with_averages(12.0, 12.0).with_rank(260),
    ]
}

/// Write a fresh context file and return its path.
pub fn context_file(extra: serde_json::Value) -> String {
    let path = std::env::temp_dir()
        .join(format!("waiverwire_it_{}.json", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .to_string();
    let mut ctx = serde_json::json!({
        "league": {
            "league_id": 777,
            "team_id": TEAM_ID,
            "season_year": 2026,
            "espn_auth": {"swid": "{ABC-123}", "espn_s2": "s2cookie"}
        },
        "strategy": {
            "protection_guardrails": {
                "untouchables": ["Franchise Guard"],
                "drop_block_orank_better_than": 75
            },
            "tiered_streaming": {"min_points_gain": 3.0, "weekly_transaction_limit": 2}
        },
        "season": {"current_record": "10-4"}
    });
    if let (Some(base), Some(extra)) = (ctx.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    std::fs::write(&path, serde_json::to_string_pretty(&ctx).unwrap()).unwrap();
    path
}

pub fn options(path: &str) -> CycleOptions {
    let mut cfg = AppConfig::default();
    cfg.agent.context_path = path.to_string();
    // No env lookups: credentials come from the context file.
    cfg.espn.swid_env = String::new();
    cfg.espn.espn_s2_env = String::new();
    CycleOptions::from_config(&cfg)
}

pub fn orchestrator(path: &str, league: &FakeLeague, writer: &FakeWriter) -> CycleOrchestrator {
    CycleOrchestrator::new(
        Arc::new(league.clone()),
        Executor::new(Arc::new(writer.clone())),
        options(path),
    )
}

/// Removes the context file when the test ends, pass or fail.
pub struct Cleanup(pub String);

impl Drop for Cleanup {
    fn drop(&mut self) {
        std::fs::remove_file(&self.0).ok();
    }
}
