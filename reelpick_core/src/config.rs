use serde::{Deserialize, Serialize};

use crate::easing::CubicBezier;
use crate::error::{ConfigError, ConfigResult};

pub const ITEM_HEIGHT: u32 = 140;
pub const BASE_DURATION_MS: u64 = 2000;
pub const SETTLE_DELAY_MS: u64 = 50;
pub const MIN_LOOPS: u32 = 5;
pub const EXTRA_LOOPS: u32 = 2;

/// Per-reel pacing. `stagger_ms` is added to the round's base duration,
/// `lag_ms` is the reel's own extra transition time on top of that.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReelConfig {
    pub start_index: usize,
    pub stagger_ms: u64,
    pub lag_ms: u64,
}

/// Startup constants for one machine. Immutable once the orchestrator is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineConfig {
    pub item_height: u32,
    pub base_duration_ms: u64,
    pub settle_delay_ms: u64,
    pub min_loops: u32,
    /// Extra whole loops drawn uniformly from `0..=extra_loops`.
    pub extra_loops: u32,
    pub reels: Vec<ReelConfig>,
    pub curve: CubicBezier,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            item_height: ITEM_HEIGHT,
            base_duration_ms: BASE_DURATION_MS,
            settle_delay_ms: SETTLE_DELAY_MS,
            min_loops: MIN_LOOPS,
            extra_loops: EXTRA_LOOPS,
            reels: vec![
                ReelConfig {
                    start_index: 0,
                    stagger_ms: 0,
                    lag_ms: 0,
                },
                ReelConfig {
                    start_index: 1,
                    stagger_ms: 200,
                    lag_ms: 100,
                },
                ReelConfig {
                    start_index: 2,
                    stagger_ms: 400,
                    lag_ms: 200,
                },
            ],
            curve: CubicBezier::EASE,
        }
    }
}

impl MachineConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.reels.is_empty() {
            return Err(ConfigError::NoReels);
        }
        if self.item_height == 0 {
            return Err(ConfigError::ZeroItemHeight);
        }
        if self.base_duration_ms == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        for (i, pair) in self.reels.windows(2).enumerate() {
            if pair[1].stagger_ms <= pair[0].stagger_ms {
                return Err(ConfigError::StaggerNotIncreasing {
                    reel: i + 1,
                    prev: pair[0].stagger_ms,
                    next: pair[1].stagger_ms,
                });
            }
        }
        Ok(())
    }

    /// Transition time reel `reel` will be asked for in a round.
    pub fn reel_duration_ms(&self, reel: usize) -> u64 {
        self.reels
            .get(reel)
            .map(|r| self.base_duration_ms + r.stagger_ms)
            .unwrap_or(self.base_duration_ms)
    }

    /// Upper bound on a round's length: settle delay plus the slowest reel.
    pub fn round_length_ms(&self) -> u64 {
        let slowest = self
            .reels
            .iter()
            .map(|r| self.base_duration_ms + r.stagger_ms + r.lag_ms)
            .max()
            .unwrap_or(self.base_duration_ms);
        self.settle_delay_ms + slowest
    }
}
