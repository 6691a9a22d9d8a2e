//! Cycle orchestrator.
//!
//! One cycle: load context → read roster and free agents → build
//! suggestions → confirm (per mode) → at most one write → persist context.
//! The context is written exactly once per cycle, including on read failures
//! after setup, so the stored tracking always reflects the latest attempt.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::engine::accountant::Accountant;
use crate::engine::confirm::{Confirmer, Decision};
use crate::engine::executor::{Executor, LineupResult, StreamingResult, WriteTarget};
use crate::engine::machine::{CycleEvent, CycleMachine, CycleState};
use crate::platforms::{Credentials, LeagueReader, LeagueRef};
use crate::storage;
use crate::strategy::candidates::{lineup_fixes, LineupFix};
use crate::strategy::{build_suggestions, Suggestions};
use crate::types::{FantasyError, LeagueContext, Proposal, TrackingState};

// ---------------------------------------------------------------------------
// Options and modes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CycleOptions {
    pub context_path: String,
    pub swid_env: String,
    pub espn_s2_env: String,
    pub free_agent_pool_size: usize,
    pub max_regenerations: u32,
}

impl CycleOptions {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            context_path: cfg.agent.context_path.clone(),
            swid_env: cfg.espn.swid_env.clone(),
            espn_s2_env: cfg.espn.espn_s2_env.clone(),
            free_agent_pool_size: cfg.espn.free_agent_pool_size,
            max_regenerations: cfg.agent.max_regenerations,
        }
    }
}

/// How a cycle gets (or skips) confirmation.
pub enum RunMode<'a> {
    /// Render proposals only; never writes.
    DryRun,
    /// Decided up front by the caller (CLI flag or HTTP request).
    Programmatic { confirm: bool },
    /// Ask a confirmer, which may request fresh proposals.
    Interactive(&'a mut dyn Confirmer),
}

impl RunMode<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            RunMode::DryRun => "dry_run",
            RunMode::Programmatic { .. } => "programmatic",
            RunMode::Interactive(_) => "interactive",
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub state: CycleState,
    pub mode: String,
    pub actions: Vec<String>,
    pub suggestions: Suggestions,
    pub regenerations: u32,
    pub weekly_transactions_used: u32,
    #[serde(skip)]
    pub streaming: Option<StreamingResult>,
}

impl CycleReport {
    pub fn executed(&self) -> bool {
        self.state == CycleState::Executed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LineupStatus {
    pub team_name: String,
    pub scoring_period_id: u32,
    pub fixes: Vec<LineupFix>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineupReport {
    pub executed: bool,
    pub state: CycleState,
    pub actions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct CycleOrchestrator {
    reader: Arc<dyn LeagueReader>,
    executor: Executor,
    options: CycleOptions,
}

impl CycleOrchestrator {
    pub fn new(reader: Arc<dyn LeagueReader>, executor: Executor, options: CycleOptions) -> Self {
        Self {
            reader,
            executor,
            options,
        }
    }

    pub fn options(&self) -> &CycleOptions {
        &self.options
    }

    // -- Context --------------------------------------------------------

    fn load_context(&self) -> Result<LeagueContext, FantasyError> {
        let path = &self.options.context_path;
        storage::load_context(path)
            .map_err(|e| FantasyError::Configuration(format!("{e:#}")))?
            .ok_or_else(|| FantasyError::Configuration(format!("league context not found at {path}")))
    }

    fn save_context(&self, context: &LeagueContext) -> Result<(), FantasyError> {
        storage::save_context(context, &self.options.context_path)
            .map_err(|e| FantasyError::Storage(format!("{e:#}")))
    }

    /// Validate identity and credentials before any platform I/O.
    fn prepare(&self, context: &LeagueContext) -> Result<(LeagueRef, Credentials), FantasyError> {
        let league = LeagueRef::from_section(&context.league)?;
        let credentials = Credentials::resolve(
            &context.league.espn_auth,
            &self.options.swid_env,
            &self.options.espn_s2_env,
        )?;
        Ok((league, credentials))
    }

    /// Read a fresh roster and free-agent pool and build suggestions.
    async fn generate(
        &self,
        context: &mut LeagueContext,
        league: &LeagueRef,
        credentials: &Credentials,
    ) -> Result<Suggestions, FantasyError> {
        let roster = self.reader.roster(league, credentials).await?;
        let budget = Accountant::budget(&mut context.tracking, &roster, &context.strategy.tiered_streaming);
        let free_agents = self
            .reader
            .free_agents(
                league,
                credentials,
                roster.scoring_period_id,
                self.options.free_agent_pool_size,
            )
            .await;
        if let Err(e) = &free_agents {
            warn!(error = %e, "Free agent read failed");
        }
        Ok(build_suggestions(&roster, free_agents, &context.strategy, budget))
    }

    /// Record a failed cycle and persist it, then hand the error back.
    fn fail(&self, context: &mut LeagueContext, mode: &str, err: FantasyError) -> FantasyError {
        error!(error = %err, mode, "Cycle failed");
        let line = format!("Cycle failed: {err}");
        Accountant::record_run(&mut context.tracking, &[line], mode, CycleState::Failed, Utc::now());
        if let Err(save_err) = self.save_context(context) {
            error!(error = %save_err, "Could not persist failed cycle");
        }
        err
    }

    // -- Operations -----------------------------------------------------

    /// Suggestions only: no confirmation, no writes, nothing persisted.
    pub async fn analyze(&self) -> Result<Suggestions, FantasyError> {
        let mut context = self.load_context()?;
        Accountant::open_week(&mut context.tracking, Utc::now());
        let (league, credentials) = self.prepare(&context)?;
        self.generate(&mut context, &league, &credentials).await
    }

    /// Run one full cycle.
    pub async fn run_cycle(&self, mut mode: RunMode<'_>) -> Result<CycleReport, FantasyError> {
        let label = mode.label();
        let mut context = self.load_context()?;
        Accountant::open_week(&mut context.tracking, Utc::now());
        let (league, credentials) = self.prepare(&context)?;

        info!(mode = label, league_id = league.league_id, team_id = league.team_id, "Cycle starting");

        let mut machine = CycleMachine::new(self.options.max_regenerations);
        let mut suggestions = match self.generate(&mut context, &league, &credentials).await {
            Ok(s) => s,
            Err(e) => return Err(self.fail(&mut context, label, e)),
        };
        machine.apply(CycleEvent::Generated).map_err(transition_error)?;

        let mut confirmed = false;
        loop {
            let actionable = suggestions.is_actionable();
            match &mut mode {
                RunMode::DryRun => {
                    machine.apply(CycleEvent::Preview).map_err(transition_error)?;
                }
                RunMode::Programmatic { confirm } => {
                    confirmed = *confirm;
                    let event = match (actionable, *confirm) {
                        (false, _) => CycleEvent::NothingToExecute,
                        (true, true) => CycleEvent::Confirm,
                        (true, false) => CycleEvent::Decline,
                    };
                    machine.apply(event).map_err(transition_error)?;
                }
                RunMode::Interactive(confirmer) => {
                    if !actionable {
                        machine
                            .apply(CycleEvent::NothingToExecute)
                            .map_err(transition_error)?;
                        break;
                    }
                    machine
                        .apply(CycleEvent::RequestConfirmation)
                        .map_err(transition_error)?;
                    let decision = confirmer.decide(&suggestions).unwrap_or_else(|e| {
                        warn!(error = %e, "Confirmation failed, declining");
                        Decision::Decline
                    });
                    match decision {
                        Decision::Confirm => {
                            confirmed = true;
                            machine.apply(CycleEvent::Confirm).map_err(transition_error)?;
                        }
                        Decision::Decline => {
                            machine.apply(CycleEvent::Decline).map_err(transition_error)?;
                        }
                        Decision::Regenerate => {
                            let next = machine
                                .apply(CycleEvent::Regenerate)
                                .map_err(transition_error)?;
                            if next == CycleState::ProposalsGenerated {
                                info!(regeneration = machine.regenerations(), "Regenerating proposals");
                                suggestions = match self.generate(&mut context, &league, &credentials).await {
                                    Ok(s) => s,
                                    Err(e) => return Err(self.fail(&mut context, label, e)),
                                };
                                continue;
                            }
                            warn!(cap = self.options.max_regenerations, "Regeneration cap reached, declining");
                        }
                    }
                }
            }
            break;
        }

        // Execute at most one write.
        let streaming = match machine.state() {
            CycleState::Executing => {
                let target = WriteTarget {
                    league: &league,
                    credentials: &credentials,
                    scoring_period_id: suggestions.scoring_period_id,
                };
                let result = self
                    .executor
                    .execute_streaming(&suggestions.streaming.outcome, &target, &mut context.tracking)
                    .await;
                let event = match &result {
                    StreamingResult::Skipped(_) => CycleEvent::Blocked,
                    other => CycleEvent::Completed {
                        success: other.is_executed(),
                    },
                };
                machine.apply(event).map_err(transition_error)?;
                result
            }
            _ => Executor::preview(&suggestions.streaming.outcome),
        };

        let mut actions: Vec<String> = suggestions
            .ir
            .iter()
            .map(|p| ir_line(p, confirmed))
            .chain(suggestions.lineup.iter().map(ToString::to_string))
            .collect();
        actions.push(match machine.state() {
            CycleState::Declined => format!("Declined: {}", streaming.action_line()),
            _ => streaming.action_line(),
        });

        let state = machine.state();
        let actions = Accountant::record_run(&mut context.tracking, &actions, label, state, Utc::now());
        self.save_context(&context)?;

        info!(state = %state, actions = actions.len(), "Cycle complete");
        Ok(CycleReport {
            state,
            mode: label.to_string(),
            actions,
            suggestions,
            regenerations: machine.regenerations(),
            weekly_transactions_used: context.tracking.weekly_transactions_used,
            streaming: Some(streaming),
        })
    }

    /// Starters who cannot play, paired with bench replacements. Read-only.
    pub async fn lineup_status(&self) -> Result<LineupStatus, FantasyError> {
        let context = self.load_context()?;
        let (league, credentials) = self.prepare(&context)?;
        let roster = self.reader.roster(&league, &credentials).await?;
        Ok(LineupStatus {
            fixes: lineup_fixes(&roster.players),
            team_name: roster.team_name,
            scoring_period_id: roster.scoring_period_id,
        })
    }

    /// Execute the top lineup fix, if any. One write at most.
    pub async fn execute_lineup(&self) -> Result<LineupReport, FantasyError> {
        const MODE: &str = "execute_lineup";
        let mut context = self.load_context()?;
        Accountant::open_week(&mut context.tracking, Utc::now());
        let (league, credentials) = self.prepare(&context)?;

        let roster = match self.reader.roster(&league, &credentials).await {
            Ok(r) => r,
            Err(e) => return Err(self.fail(&mut context, MODE, e)),
        };
        let fixes = lineup_fixes(&roster.players);
        let target = WriteTarget {
            league: &league,
            credentials: &credentials,
            scoring_period_id: roster.scoring_period_id,
        };
        let result = self.executor.execute_lineup_fix(fixes.first(), &target).await;

        let state = match &result {
            LineupResult::Executed { .. } => CycleState::Executed,
            LineupResult::Failed { .. } => CycleState::Failed,
            LineupResult::NothingToFix | LineupResult::Blocked(_) => CycleState::Skipped,
        };
        let actions = Accountant::record_run(
            &mut context.tracking,
            &[result.action_line()],
            MODE,
            state,
            Utc::now(),
        );
        self.save_context(&context)?;

        Ok(LineupReport {
            executed: result.is_executed(),
            state,
            actions,
        })
    }

    /// Tracking state from the last persisted run.
    pub fn last_run(&self) -> Result<TrackingState, FantasyError> {
        Ok(self.load_context()?.tracking)
    }
}

fn ir_line(proposal: &Proposal, confirmed: bool) -> String {
    if confirmed {
        format!("IR move not yet implemented: {proposal}")
    } else {
        proposal.to_string()
    }
}

fn transition_error(e: crate::engine::machine::InvalidTransition) -> FantasyError {
    FantasyError::Internal(format!("cycle state machine: {e}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
