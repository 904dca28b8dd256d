use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    catalog::{Catalog, Prize},
    config::MachineConfig,
    confetti::{celebration, ConfettiBurst},
    error::{ConfigError, ConfigResult},
    rng::RandomSource,
    sequencer::{Reel, ReelCommand, ReelEvent, ReelSnapshot, SpinPlan},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RoundState {
    Idle,
    Spinning { round: u64, started_at_ms: u64 },
    Revealing { round: u64, revealed_at_ms: u64 },
}

impl RoundState {
    pub fn in_progress(&self) -> bool {
        matches!(self, RoundState::Spinning { .. })
    }

    /// Caption a host shows under the reels.
    pub fn caption(&self) -> &'static str {
        match self {
            RoundState::Idle => "点击按钮开启音乐之旅",
            RoundState::Spinning { .. } => "寻找灵感中...",
            RoundState::Revealing { .. } => "最佳选择",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoundEvent {
    ReelStopped {
        round: u64,
        reel: usize,
        resting_index: usize,
        at_ms: u64,
    },
    WinnerRevealed {
        round: u64,
        winner: usize,
        prize: Prize,
        at_ms: u64,
        celebration: Vec<ConfettiBurst>,
    },
}

/// Returned when a round is accepted. The winner stays hidden until reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundStart {
    pub round: u64,
    pub plans: Vec<SpinPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSnapshot {
    pub state: RoundState,
    pub caption: &'static str,
    pub reels: Vec<ReelSnapshot>,
    pub winner: Option<usize>,
}

/// A round driven to completion without a host clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundOutcome {
    pub round: u64,
    pub winner: usize,
    pub prize: Prize,
    pub resting: Vec<usize>,
    pub stopped_at_ms: Vec<u64>,
    pub revealed_at_ms: u64,
}

/// Owns the reels and the round state machine `Idle -> Spinning -> Revealing`.
///
/// The `Spinning` state is the only gate on new rounds. Reels are driven by
/// commands and report back through `tick`; nothing else writes their rest state.
pub struct SpinOrchestrator<R> {
    catalog: Arc<Catalog>,
    config: MachineConfig,
    reels: Vec<Reel>,
    rng: R,
    state: RoundState,
    round: u64,
    drawn: Option<usize>,
    revealed: Option<usize>,
    pending: Vec<bool>,
    stopped_at: Vec<u64>,
}

impl<R: RandomSource> SpinOrchestrator<R> {
    pub fn new(catalog: Arc<Catalog>, config: MachineConfig, rng: R) -> ConfigResult<Self> {
        if catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        config.validate()?;
        let reels = config
            .reels
            .iter()
            .enumerate()
            .map(|(i, rc)| Reel::new(i, catalog.len(), &config, rc))
            .collect::<ConfigResult<Vec<Reel>>>()?;
        let n = reels.len();
        Ok(Self {
            catalog,
            config,
            reels,
            rng,
            state: RoundState::Idle,
            round: 0,
            drawn: None,
            revealed: None,
            pending: vec![false; n],
            stopped_at: vec![0; n],
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn reels(&self) -> &[Reel] {
        &self.reels
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn in_progress(&self) -> bool {
        self.state.in_progress()
    }

    /// Winner of the last completed round, cleared when the next one starts.
    pub fn winner(&self) -> Option<&Prize> {
        self.revealed.map(|i| self.catalog.get(i))
    }

    pub fn winner_index(&self) -> Option<usize> {
        self.revealed
    }

    /// Winner drawn for the current or last round, revealed or not.
    pub fn drawn_winner(&self) -> Option<usize> {
        self.drawn
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Start a round. Ignored while one is already spinning.
    pub fn trigger_round(&mut self, now_ms: u64) -> Option<RoundStart> {
        if self.in_progress() {
            debug!(round = self.round, "trigger ignored, round in progress");
            return None;
        }

        let winner = self.rng.pick(self.catalog.len());
        self.round += 1;
        self.drawn = Some(winner);
        self.revealed = None;

        let mut plans = Vec::with_capacity(self.reels.len());
        for (i, reel) in self.reels.iter_mut().enumerate() {
            let cmd = ReelCommand::StartSpin {
                target_index: winner as i64,
                duration_ms: self.config.reel_duration_ms(i),
            };
            let plan = reel.handle(cmd, now_ms, &mut self.rng);
            self.pending[i] = plan.is_some();
            plans.extend(plan);
        }

        self.state = RoundState::Spinning {
            round: self.round,
            started_at_ms: now_ms,
        };
        debug!(round = self.round, reels = plans.len(), "round started");
        Some(RoundStart {
            round: self.round,
            plans,
        })
    }

    /// Advance every reel to `now_ms` and report what happened, in time order.
    pub fn tick(&mut self, now_ms: u64) -> Vec<RoundEvent> {
        let mut events = Vec::new();
        for r in &mut self.reels {
            if let Some(ReelEvent::SpinComplete {
                reel,
                resting_index,
                at_ms,
            }) = r.tick(now_ms)
            {
                self.pending[reel] = false;
                self.stopped_at[reel] = at_ms;
                events.push(RoundEvent::ReelStopped {
                    round: self.round,
                    reel,
                    resting_index,
                    at_ms,
                });
            }
        }
        events.sort_by_key(|e| match e {
            RoundEvent::ReelStopped { at_ms, .. } => *at_ms,
            RoundEvent::WinnerRevealed { at_ms, .. } => *at_ms,
        });

        if self.in_progress() && self.pending.iter().all(|p| !p) {
            if let Some(winner) = self.drawn {
                let at_ms = self.stopped_at.iter().copied().max().unwrap_or(now_ms);
                self.state = RoundState::Revealing {
                    round: self.round,
                    revealed_at_ms: at_ms,
                };
                self.revealed = Some(winner);
                let prize = self.catalog.get(winner).clone();
                info!(round = self.round, winner, prize = prize.name, "winner revealed");
                events.push(RoundEvent::WinnerRevealed {
                    round: self.round,
                    winner,
                    prize,
                    at_ms,
                    celebration: celebration(),
                });
            }
        }
        events
    }

    pub fn snapshot(&self, now_ms: u64) -> RoundSnapshot {
        RoundSnapshot {
            state: self.state,
            caption: self.state.caption(),
            reels: self.reels.iter().map(|r| r.snapshot(now_ms)).collect(),
            winner: self.revealed,
        }
    }

    /// Trigger a round at `start_ms` and tick straight to its reveal.
    pub fn play_to_completion(&mut self, start_ms: u64) -> Option<RoundOutcome> {
        let start = self.trigger_round(start_ms)?;
        let end = start
            .plans
            .iter()
            .map(|p| p.settles_at_ms)
            .max()
            .unwrap_or(start_ms);
        let events = self.tick(end);
        events.into_iter().find_map(|e| match e {
            RoundEvent::WinnerRevealed {
                round,
                winner,
                prize,
                at_ms,
                ..
            } => Some(RoundOutcome {
                round,
                winner,
                prize,
                resting: self.reels.iter().map(Reel::resting_index).collect(),
                stopped_at_ms: self.stopped_at.clone(),
                revealed_at_ms: at_ms,
            }),
            RoundEvent::ReelStopped { .. } => None,
        })
    }
}
