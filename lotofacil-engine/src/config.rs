use serde::{Deserialize, Serialize};

use lotofacil_db::models::{PICK_COUNT, POOL_SIZE};

use crate::error::{EngineError, EngineResult};

/// How the numbers completing a bet are drawn from the remaining pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingPolicy {
    /// Every remaining number equally likely.
    #[default]
    Uniform,
    /// Weight `count + 1` from the anchor-window frequency table.
    FrequencyWeighted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Draws counted for the hot/cold rankings.
    pub hot_cold_window: usize,
    /// Draws scanned for overdue numbers.
    pub overdue_window: usize,
    /// Length of the hot and cold lists.
    pub ranking_size: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            hot_cold_window: 50,
            overdue_window: 20,
            ranking_size: 10,
        }
    }
}

impl StatsConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.hot_cold_window == 0 || self.overdue_window == 0 {
            return Err(EngineError::InvalidConfig("windows must be at least 1 draw".into()));
        }
        if self.ranking_size == 0 || self.ranking_size > POOL_SIZE as usize {
            return Err(EngineError::InvalidConfig(format!(
                "ranking size must be within 1..={}, got {}",
                POOL_SIZE, self.ranking_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BetConfig {
    /// Draws counted when ranking anchor candidates.
    pub anchor_window: usize,
    pub anchor_count: usize,
    pub total_bets: usize,
    /// Leading bets built on the anchor set; the rest are fully random.
    pub anchored_bets: usize,
    /// Only accept bets with 7 or 8 even numbers.
    pub enforce_parity: bool,
    /// Below this many draws generation is refused.
    pub min_history: usize,
    /// Candidate draws allowed per bet before giving up.
    pub max_attempts: usize,
    pub sampling: SamplingPolicy,
    pub seed: Option<u64>,
}

impl Default for BetConfig {
    fn default() -> Self {
        Self {
            anchor_window: 50,
            anchor_count: 4,
            total_bets: 7,
            anchored_bets: 5,
            enforce_parity: false,
            min_history: 10,
            max_attempts: 1000,
            sampling: SamplingPolicy::Uniform,
            seed: None,
        }
    }
}

impl BetConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.anchor_window == 0 {
            return Err(EngineError::InvalidConfig("anchor window must be at least 1 draw".into()));
        }
        if self.anchor_count > PICK_COUNT {
            return Err(EngineError::InvalidConfig(format!(
                "anchor count must be at most {}, got {}",
                PICK_COUNT, self.anchor_count
            )));
        }
        if self.anchored_bets > self.total_bets {
            return Err(EngineError::InvalidConfig(format!(
                "anchored bets ({}) exceed total bets ({})",
                self.anchored_bets, self.total_bets
            )));
        }
        if self.max_attempts == 0 {
            return Err(EngineError::InvalidConfig("max attempts must be at least 1".into()));
        }
        Ok(())
    }
}

/// Both halves of the engine configuration, as stored in a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub stats: StatsConfig,
    pub bets: BetConfig,
}
