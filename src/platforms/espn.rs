//! ESPN Fantasy Basketball read client.
//!
//! Base URL: https://lm-api-reads.fantasy.espn.com
//! League:   /apis/v3/games/fba/seasons/{year}/segments/0/leagues/{league_id}
//! Auth: `SWID` and `espn_s2` cookies (private leagues).
//!
//! Roster reads use the `mRoster`, `mTeam` and `mSettings` views; free agents
//! use `kona_player_info` filtered through the `x-fantasy-filter` header.

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use super::writer::{truncate_chars, MAX_ERROR_BODY_CHARS};
use super::{slots, Credentials, LeagueReader, LeagueRef};
use crate::types::{FantasyError, Player, RosterSnapshot};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const LEAGUE_PATH: &str = "/apis/v3/games/fba/seasons/{year}/segments/0/leagues/{league_id}";

/// Stat source: 0 = actual, 1 = projected.
const STAT_SOURCE_ACTUAL: u8 = 0;
const STAT_SOURCE_PROJECTED: u8 = 1;
/// Split 0 is the full season.
const STAT_SPLIT_SEASON: u8 = 0;

/// Slot label given to players outside the roster.
const FREE_AGENT_SLOT: &str = "FA";

// ---------------------------------------------------------------------------
// API response types (ESPN JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnLeague {
    #[serde(default)]
    scoring_period_id: u32,
    #[serde(default)]
    status: Option<EspnLeagueStatus>,
    #[serde(default)]
    settings: Option<EspnSettings>,
    #[serde(default)]
    teams: Vec<EspnTeam>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnLeagueStatus {
    #[serde(default)]
    current_matchup_period: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnSettings {
    #[serde(default)]
    acquisition_settings: Option<EspnAcquisitionSettings>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnAcquisitionSettings {
    /// -1 means unlimited.
    #[serde(default)]
    acquisition_limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnTeam {
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    roster: Option<EspnRoster>,
    #[serde(default)]
    transaction_counter: Option<EspnTransactionCounter>,
}

impl EspnTeam {
    fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        let parts: Vec<&str> = [self.location.as_deref(), self.nickname.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            format!("Team {}", self.id)
        } else {
            parts.join(" ")
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnTransactionCounter {
    /// Matchup period id (as string key) → acquisitions made.
    #[serde(default)]
    matchup_acquisition_totals: HashMap<String, u32>,
}

#[derive(Debug, Deserialize)]
struct EspnRoster {
    #[serde(default)]
    entries: Vec<EspnRosterEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnRosterEntry {
    #[serde(default)]
    player_id: Option<i64>,
    #[serde(default)]
    lineup_slot_id: Option<u16>,
    #[serde(default)]
    injury_status: Option<String>,
    player_pool_entry: EspnPlayerPoolEntry,
}

#[derive(Debug, Deserialize)]
struct EspnPlayerPoolEntry {
    player: EspnPlayer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnPlayer {
    #[serde(default)]
    id: Option<i64>,
    full_name: String,
    #[serde(default)]
    default_position_id: Option<u8>,
    #[serde(default)]
    injury_status: Option<String>,
    #[serde(default)]
    stats: Vec<EspnStat>,
    #[serde(default)]
    ratings: HashMap<String, EspnRating>,
    #[serde(default)]
    draft_ranks_by_rank_type: HashMap<String, EspnDraftRank>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnStat {
    #[serde(default)]
    season_id: Option<i32>,
    #[serde(default)]
    stat_source_id: Option<u8>,
    #[serde(default)]
    stat_split_type_id: Option<u8>,
    #[serde(default)]
    applied_average: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnRating {
    #[serde(default)]
    total_ranking: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EspnDraftRank {
    #[serde(default)]
    rank: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EspnPlayerPool {
    #[serde(default)]
    players: Vec<EspnPoolPlayer>,
}

#[derive(Debug, Deserialize)]
struct EspnPoolPlayer {
    #[serde(default)]
    id: Option<i64>,
    player: EspnPlayer,
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

fn position_name(id: u8) -> Option<&'static str> {
    match id {
        1 => Some("PG"),
        2 => Some("SG"),
        3 => Some("SF"),
        4 => Some("PF"),
        5 => Some("C"),
        6 => Some("G"),
        7 => Some("F"),
        _ => None,
    }
}

fn season_average(stats: &[EspnStat], season_year: i32, source: u8) -> Option<f64> {
    stats
        .iter()
        .find(|s| {
            s.season_id == Some(season_year)
                && s.stat_source_id == Some(source)
                && s.stat_split_type_id.unwrap_or(STAT_SPLIT_SEASON) == STAT_SPLIT_SEASON
        })
        .and_then(|s| s.applied_average)
}

fn convert_player(
    raw: &EspnPlayer,
    fallback_id: Option<i64>,
    slot: &str,
    entry_status: Option<&str>,
    season_year: i32,
) -> Player {
    let injury_status = raw
        .injury_status
        .as_deref()
        .or(entry_status)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Player {
        player_id: raw.id.or(fallback_id),
        name: raw.full_name.clone(),
        slot: slot.to_string(),
        position: raw
            .default_position_id
            .and_then(position_name)
            .map(str::to_string),
        injury_status,
        injury_note: None,
        rank: raw.ratings.get("0").and_then(|r| r.total_ranking).filter(|r| *r > 0),
        projected_rank: None,
        draft_rank: raw
            .draft_ranks_by_rank_type
            .get("STANDARD")
            .and_then(|r| r.rank)
            .filter(|r| *r > 0),
        avg_points: season_average(&raw.stats, season_year, STAT_SOURCE_ACTUAL),
        projected_avg_points: season_average(&raw.stats, season_year, STAT_SOURCE_PROJECTED),
    }
}

/// Build the managed team's snapshot from a league document.
fn parse_roster(body: &str, league: &LeagueRef) -> Result<RosterSnapshot, FantasyError> {
    let parsed: EspnLeague = serde_json::from_str(body)
        .map_err(|e| FantasyError::Transport(format!("unexpected league payload: {e}")))?;

    let team = parsed
        .teams
        .iter()
        .find(|t| t.id == league.team_id)
        .ok_or_else(|| {
            FantasyError::Lookup(format!(
                "team {} not found in league {}",
                league.team_id, league.league_id
            ))
        })?;

    let players = team
        .roster
        .as_ref()
        .map(|r| r.entries.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|entry| {
            let slot = entry.lineup_slot_id.map_or("BE", slots::read_slot_name);
            convert_player(
                &entry.player_pool_entry.player,
                entry.player_id,
                slot,
                entry.injury_status.as_deref(),
                league.season_year,
            )
        })
        .collect();

    let matchup_period = parsed.status.as_ref().and_then(|s| s.current_matchup_period);
    let transactions_used = match (matchup_period, team.transaction_counter.as_ref()) {
        (Some(period), Some(counter)) => counter
            .matchup_acquisition_totals
            .get(&period.to_string())
            .copied(),
        _ => None,
    };

    let acquisition_limit = parsed
        .settings
        .as_ref()
        .and_then(|s| s.acquisition_settings.as_ref())
        .and_then(|a| a.acquisition_limit)
        .filter(|limit| *limit >= 0)
        .and_then(|limit| u32::try_from(limit).ok());

    Ok(RosterSnapshot {
        team_id: team.id,
        team_name: team.display_name(),
        scoring_period_id: parsed.scoring_period_id,
        players,
        transactions_used,
        acquisition_limit,
    })
}

fn parse_free_agents(body: &str, season_year: i32, size: usize) -> Result<Vec<Player>, FantasyError> {
    let parsed: EspnPlayerPool = serde_json::from_str(body)
        .map_err(|e| FantasyError::Transport(format!("unexpected player pool payload: {e}")))?;
    Ok(parsed
        .players
        .iter()
        .take(size)
        .map(|p| convert_player(&p.player, p.id, FREE_AGENT_SLOT, None, season_year))
        .collect())
}

/// `x-fantasy-filter` for unowned players, most-owned first.
fn free_agent_filter(size: usize) -> Value {
    json!({
        "players": {
            "filterStatus": {"value": ["FREEAGENT", "WAIVERS"]},
            "limit": size,
            "sortPercOwned": {"sortPriority": 1, "sortAsc": false},
            "sortDraftRanks": {"sortPriority": 100, "sortAsc": true, "value": "STANDARD"}
        }
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// ESPN read client.
pub struct EspnReadClient {
    http: Client,
    base_url: String,
}

impl EspnReadClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, FantasyError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("waiverwire/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn league_url(&self, league: &LeagueRef) -> String {
        let path = LEAGUE_PATH
            .replace("{year}", &league.season_year.to_string())
            .replace("{league_id}", &league.league_id.to_string());
        format!("{}{path}", self.base_url)
    }

    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        credentials: &Credentials,
        filter: Option<&Value>,
    ) -> Result<String, FantasyError> {
        let mut req = self
            .http
            .get(url)
            .query(query)
            .header(COOKIE, credentials.cookie_header());
        if let Some(filter) = filter {
            req = req.header("x-fantasy-filter", filter.to_string());
        }
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        if status >= 400 {
            return Err(FantasyError::HttpStatus {
                status,
                body: truncate_chars(&text, MAX_ERROR_BODY_CHARS),
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl LeagueReader for EspnReadClient {
    async fn roster(
        &self,
        league: &LeagueRef,
        credentials: &Credentials,
    ) -> Result<RosterSnapshot, FantasyError> {
        let query = [
            ("view", "mRoster".to_string()),
            ("view", "mTeam".to_string()),
            ("view", "mSettings".to_string()),
        ];
        let body = self
            .get(&self.league_url(league), &query, credentials, None)
            .await?;
        let snapshot = parse_roster(&body, league)?;
        info!(
            team = %snapshot.team_name,
            players = snapshot.players.len(),
            scoring_period = snapshot.scoring_period_id,
            used = ?snapshot.transactions_used,
            "Fetched roster"
        );
        Ok(snapshot)
    }

    async fn free_agents(
        &self,
        league: &LeagueRef,
        credentials: &Credentials,
        scoring_period_id: u32,
        size: usize,
    ) -> Result<Vec<Player>, FantasyError> {
        let query = [
            ("view", "kona_player_info".to_string()),
            ("scoringPeriodId", scoring_period_id.to_string()),
        ];
        let filter = free_agent_filter(size);
        let body = self
            .get(&self.league_url(league), &query, credentials, Some(&filter))
            .await?;
        let players = parse_free_agents(&body, league.season_year, size)?;
        debug!(count = players.len(), "Fetched free agents");
        Ok(players)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
