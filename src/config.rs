//! Tournament and server configuration.
//!
//! [`TournamentConfig`] is deserialized from the create-tournament request body; every field
//! has a default so an empty object is valid. [`ServerConfig`] is read from the environment
//! by the web binary.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Which representative team to prefer when one has to be sampled for a participant whose
/// real team was never observed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingPreference {
    #[default]
    None,
    /// Prefer teams whose elements are furthest from their base stage.
    MoreEvolved,
    /// Prefer teams whose elements are furthest from their final stage.
    LessEvolved,
}

/// Per-round team change rules.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamRules {
    pub starting_team_size: usize,
    pub min_team_size: usize,
    pub max_team_size: usize,
    pub additions_per_round: u32,
    pub drops_per_round: u32,
    /// Signed: negative values transform elements back towards their base stage.
    pub evolutions_per_round: i32,
    pub required_addition: bool,
    pub required_drop: bool,
    pub required_evolution: bool,
    pub sampling_preference: SamplingPreference,
}

impl Default for TeamRules {
    fn default() -> Self {
        Self {
            starting_team_size: 3,
            min_team_size: 1,
            max_team_size: 6,
            additions_per_round: 0,
            drops_per_round: 0,
            evolutions_per_round: 0,
            required_addition: false,
            required_drop: false,
            required_evolution: false,
            sampling_preference: SamplingPreference::None,
        }
    }
}

impl TeamRules {
    /// Whether round winners get a team change at all.
    pub fn is_active(&self) -> bool {
        self.additions_per_round != 0 || self.drops_per_round != 0 || self.evolutions_per_round != 0
    }

    /// Lower size bound, never below one element.
    pub fn min_size(&self) -> usize {
        self.min_team_size.max(1)
    }

    pub fn max_size(&self) -> usize {
        self.max_team_size.max(self.min_size())
    }
}

/// Inactivity windows for open matches, in seconds.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Time after a match opens before both sides are warned.
    pub warn_after_secs: u64,
    /// Added once to the warning window of matches opened when the tournament starts.
    pub first_round_grace_secs: u64,
    /// Time after the warning before reachability is checked.
    pub disqualify_after_secs: u64,
    /// Time both sides get to prove they are actually playing.
    pub verify_timeout_secs: u64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            warn_after_secs: 180,
            first_round_grace_secs: 60,
            disqualify_after_secs: 120,
            verify_timeout_secs: 60,
        }
    }
}

impl ActivityConfig {
    pub fn warn_after(&self, first_round: bool) -> TimeDelta {
        let grace = if first_round { self.first_round_grace_secs } else { 0 };
        secs(self.warn_after_secs.saturating_add(grace))
    }

    pub fn disqualify_after(&self) -> TimeDelta {
        secs(self.disqualify_after_secs)
    }

    pub fn verify_timeout(&self) -> TimeDelta {
        secs(self.verify_timeout_secs)
    }
}

fn secs(s: u64) -> TimeDelta {
    let s = i64::try_from(s).unwrap_or(i64::MAX);
    TimeDelta::try_seconds(s).unwrap_or(TimeDelta::MAX)
}

/// Everything needed to run one tournament.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentConfig {
    pub team_rules: TeamRules,
    pub activity: ActivityConfig,
    /// Fixed RNG seed for reproducible seeding and sampling; entropy when unset.
    pub seed: Option<u64>,
}

/// Web binary settings, from the environment.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// CSV element catalog; the bundled catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
    /// How often every tournament's activity scheduler is ticked.
    pub tick_interval: Duration,
    /// A participant with no heartbeat for this long counts as unreachable.
    pub presence_timeout: TimeDelta,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            catalog_path: None,
            tick_interval: Duration::from_secs(5),
            presence_timeout: TimeDelta::seconds(90),
        }
    }
}

impl ServerConfig {
    /// Environment variables:
    /// - `HOST`, `PORT` - bind address (default `0.0.0.0:8080`)
    /// - `CATALOG_PATH` - element catalog CSV
    /// - `TICK_INTERVAL_SECS` - scheduler tick period (default 5)
    /// - `PRESENCE_TIMEOUT_SECS` - heartbeat expiry (default 90)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = std::env::var("HOST").unwrap_or(defaults.host);
        let port = env_parse("PORT").unwrap_or(defaults.port);
        let catalog_path = std::env::var("CATALOG_PATH").ok().map(PathBuf::from);
        let tick_interval = env_parse("TICK_INTERVAL_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.tick_interval);
        let presence_timeout = env_parse::<u64>("PRESENCE_TIMEOUT_SECS")
            .map(secs)
            .unwrap_or(defaults.presence_timeout);
        Self {
            host,
            port,
            catalog_path,
            tick_interval,
            presence_timeout,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
