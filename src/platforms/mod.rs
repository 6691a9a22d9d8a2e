//! Platform integrations.
//!
//! Defines the read (`LeagueReader`) and write (`TransactionWriter`) seams
//! and the ESPN implementations:
//! - `espn`: roster and free-agent reads
//! - `writer`: add/drop and lineup-swap writes against the transactions endpoint
//! - `transaction`: request bodies (built-in or from a captured template)
//! - `slots`: lineup slot name ↔ numeric slot ID

pub mod espn;
pub mod slots;
pub mod transaction;
pub mod writer;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::fmt;

use crate::types::{EspnAuth, FantasyError, LeagueSection, Player, RosterSnapshot};
use transaction::{TransactionKind, TransactionRequest};

// ---------------------------------------------------------------------------
// League identity and credentials
// ---------------------------------------------------------------------------

/// Identifies the managed team within a league season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeagueRef {
    pub league_id: i64,
    pub team_id: i64,
    pub season_year: i32,
}

impl LeagueRef {
    /// Validate the identifiers from the persisted context.
    pub fn from_section(section: &LeagueSection) -> Result<Self, FantasyError> {
        if section.league_id <= 0 {
            return Err(FantasyError::Configuration(format!(
                "league_id must be positive, got {}",
                section.league_id
            )));
        }
        if section.team_id <= 0 {
            return Err(FantasyError::Configuration(format!(
                "team_id must be positive, got {}",
                section.team_id
            )));
        }
        if section.season_year < 2000 {
            return Err(FantasyError::Configuration(format!(
                "season_year looks wrong: {}",
                section.season_year
            )));
        }
        Ok(Self {
            league_id: section.league_id,
            team_id: section.team_id,
            season_year: section.season_year,
        })
    }
}

/// ESPN session cookie pair (`SWID`, `espn_s2`).
pub struct Credentials {
    swid: String,
    espn_s2: SecretString,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("swid", &self.swid)
            .field("espn_s2", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    pub fn new(swid: impl Into<String>, espn_s2: impl Into<String>) -> Self {
        Self {
            swid: swid.into(),
            espn_s2: SecretString::new(espn_s2.into()),
        }
    }

    /// Resolve credentials: non-empty env vars win over the context file.
    /// Empty or placeholder values are a configuration error.
    pub fn resolve(auth: &EspnAuth, swid_env: &str, espn_s2_env: &str) -> Result<Self, FantasyError> {
        let swid = env_value(swid_env).unwrap_or_else(|| auth.swid.trim().to_string());
        let espn_s2 = env_value(espn_s2_env).unwrap_or_else(|| auth.espn_s2.trim().to_string());

        if is_placeholder(&swid) {
            return Err(FantasyError::Configuration(format!(
                "SWID is missing or a placeholder (set {swid_env} or league.espn_auth.swid)"
            )));
        }
        if is_placeholder(&espn_s2) {
            return Err(FantasyError::Configuration(format!(
                "espn_s2 is missing or a placeholder (set {espn_s2_env} or league.espn_auth.espn_s2)"
            )));
        }
        Ok(Self::new(swid, espn_s2))
    }

    /// SWID doubles as the owning member ID in lineup bodies.
    pub fn swid(&self) -> &str {
        &self.swid
    }

    /// `Cookie` header value.
    pub fn cookie_header(&self) -> String {
        format!("SWID={}; espn_s2={}", self.swid, self.espn_s2.expose_secret())
    }
}

fn env_value(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Values left over from an example context file.
pub fn is_placeholder(value: &str) -> bool {
    let v = value.trim();
    let upper = v.to_uppercase();
    v.is_empty()
        || v.starts_with('<')
        || upper.contains("YOUR_")
        || upper.contains("YOUR-")
        || upper == "CHANGEME"
        || upper == "TODO"
        || v == "..."
}

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Read access to the league: the managed team's roster and the free-agent pool.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeagueReader: Send + Sync {
    /// Fetch the current roster of `league.team_id`.
    /// Returns `FantasyError::Lookup` when the team is not in the league.
    async fn roster(
        &self,
        league: &LeagueRef,
        credentials: &Credentials,
    ) -> Result<RosterSnapshot, FantasyError>;

    /// Fetch up to `size` free agents, best first.
    async fn free_agents(
        &self,
        league: &LeagueRef,
        credentials: &Credentials,
        scoring_period_id: u32,
        size: usize,
    ) -> Result<Vec<Player>, FantasyError>;
}

/// Acknowledgement of an accepted write.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionReceipt {
    pub kind: TransactionKind,
    pub url: String,
    pub status: u16,
    pub response: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

/// Write access: submits one transaction and reports success or a typed failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionWriter: Send + Sync {
    async fn submit(
        &self,
        request: &TransactionRequest,
        credentials: &Credentials,
    ) -> Result<TransactionReceipt, FantasyError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
