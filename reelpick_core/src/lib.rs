pub mod catalog;
pub mod config;
pub mod confetti;
pub mod easing;
pub mod error;
pub mod orchestrator;
pub mod rng;
pub mod sequencer;
pub mod stats;

pub use crate::catalog::{wrap_index, Catalog, Prize, PrizeId};
pub use crate::config::{MachineConfig, ReelConfig};
pub use crate::confetti::{celebration, ConfettiBurst, ConfettiField, Particle};
pub use crate::easing::CubicBezier;
pub use crate::error::{ConfigError, ConfigResult};
pub use crate::orchestrator::{
    RoundEvent, RoundOutcome, RoundSnapshot, RoundStart, RoundState, SpinOrchestrator,
};
pub use crate::rng::{derive_hash_hex, EntropySource, RandomSource, Scripted, SeededStream};
pub use crate::sequencer::{forward_steps, Reel, ReelCommand, ReelEvent, ReelSnapshot, SpinPlan};
pub use crate::stats::{chi_square_uniform, draw_histogram, fairness_report, FairnessReport};
