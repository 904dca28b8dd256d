//! Reel sequencer: one scrolling column that always moves forward and lands
//! exactly on the catalog index it was told to.
//!
//! A reel is driven by commands and a clock. `handle` accepts a
//! [`ReelCommand::StartSpin`], `tick` reports [`ReelEvent::SpinComplete`] once
//! the transition time has elapsed, and `snapshot` samples the visual offset
//! for painting. The reel never reads a clock itself.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::wrap_index;
use crate::config::{MachineConfig, ReelConfig};
use crate::easing::CubicBezier;
use crate::error::{ConfigError, ConfigResult};
use crate::rng::RandomSource;

/// Catalog copies kept past the landing item so the strip never runs dry.
const STRIP_MARGIN_COPIES: u64 = 2;
/// Catalog copies kept while at rest.
const REST_WINDOW_COPIES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReelCommand {
    /// `target_index` may be any integer; it is reduced modulo the catalog size.
    StartSpin { target_index: i64, duration_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReelEvent {
    SpinComplete {
        reel: usize,
        resting_index: usize,
        at_ms: u64,
    },
}

/// What a reel committed to when it accepted a spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinPlan {
    pub reel: usize,
    pub target_index: usize,
    pub loops: u32,
    pub delta_steps: u64,
    pub motion_starts_at_ms: u64,
    pub transition_ms: u64,
    pub settles_at_ms: u64,
}

#[derive(Debug, Clone, Copy)]
struct Motion {
    plan: SpinPlan,
    from_offset: i64,
    to_offset: i64,
}

/// Paintable state of one reel at a given instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelSnapshot {
    pub reel: usize,
    /// Vertical offset of the strip in pixels (negative scrolls it up).
    pub offset: f64,
    pub is_animating: bool,
    pub transition_ms: u64,
    /// Catalog indices, top to bottom.
    pub strip: Vec<usize>,
    /// Catalog index currently under the payline.
    pub centered_index: usize,
}

/// Forward distance, in items, from `current` to `target` after `loops`
/// full passes. Both indices must already be reduced into `[0, len)`;
/// an empty strip has no distance to cover.
pub fn forward_steps(current: usize, target: usize, loops: u32, len: usize) -> u64 {
    let n = len as u64;
    let (current, target) = (current as u64, target as u64);
    let offset = (target + n).wrapping_sub(current).checked_rem(n).unwrap_or(0);
    u64::from(loops) * n + offset
}

#[derive(Debug, Clone)]
pub struct Reel {
    id: usize,
    catalog_len: usize,
    item_height: u32,
    settle_delay_ms: u64,
    min_loops: u32,
    extra_loops: u32,
    lag_ms: u64,
    curve: CubicBezier,
    strip: Vec<usize>,
    // strip slot under the payline while at rest
    position: usize,
    resting_index: usize,
    motion: Option<Motion>,
}

impl Reel {
    pub fn new(
        id: usize,
        catalog_len: usize,
        machine: &MachineConfig,
        reel: &ReelConfig,
    ) -> ConfigResult<Self> {
        if catalog_len == 0 {
            return Err(ConfigError::EmptyCatalog);
        }
        let mut r = Self {
            id,
            catalog_len,
            item_height: machine.item_height,
            settle_delay_ms: machine.settle_delay_ms,
            min_loops: machine.min_loops,
            extra_loops: machine.extra_loops,
            lag_ms: reel.lag_ms,
            curve: machine.curve,
            strip: Vec::new(),
            position: 0,
            resting_index: 0,
            motion: None,
        };
        r.rest_on(reel.start_index % catalog_len);
        Ok(r)
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_animating(&self) -> bool {
        self.motion.is_some()
    }

    /// Last index the reel came to rest on.
    pub fn resting_index(&self) -> usize {
        self.resting_index
    }

    pub fn strip_len(&self) -> usize {
        self.strip.len()
    }

    pub fn item_height(&self) -> u32 {
        self.item_height
    }

    /// Offset while at rest: always a whole number of items.
    pub fn resting_offset(&self) -> i64 {
        -(self.position as i64 * i64::from(self.item_height))
    }

    pub fn plan(&self) -> Option<SpinPlan> {
        self.motion.map(|m| m.plan)
    }

    /// Accept a command. A spin arriving mid-animation is ignored so the
    /// running path keeps its forward-only landing.
    pub fn handle(
        &mut self,
        cmd: ReelCommand,
        now_ms: u64,
        rng: &mut dyn RandomSource,
    ) -> Option<SpinPlan> {
        match cmd {
            ReelCommand::StartSpin {
                target_index,
                duration_ms,
            } => self.spin(target_index, duration_ms, now_ms, rng),
        }
    }

    fn spin(
        &mut self,
        target_index: i64,
        duration_ms: u64,
        now_ms: u64,
        rng: &mut dyn RandomSource,
    ) -> Option<SpinPlan> {
        if let Some(m) = &self.motion {
            warn!(
                reel = self.id,
                target_index,
                busy_until = m.plan.settles_at_ms,
                "spin ignored, reel still animating"
            );
            return None;
        }

        let target = wrap_index(target_index, self.catalog_len);
        let loops = self.draw_loops(rng);
        let delta_steps = forward_steps(self.resting_index, target, loops, self.catalog_len);

        let copies = delta_steps.div_ceil(self.catalog_len as u64) + STRIP_MARGIN_COPIES;
        for _ in 0..copies {
            self.strip.extend(0..self.catalog_len);
        }

        let motion_starts_at_ms = now_ms + self.settle_delay_ms;
        let transition_ms = duration_ms + self.lag_ms;
        let plan = SpinPlan {
            reel: self.id,
            target_index: target,
            loops,
            delta_steps,
            motion_starts_at_ms,
            transition_ms,
            settles_at_ms: motion_starts_at_ms + transition_ms,
        };
        let from_offset = self.resting_offset();
        let to_offset = from_offset - delta_steps as i64 * i64::from(self.item_height);
        self.motion = Some(Motion {
            plan,
            from_offset,
            to_offset,
        });

        debug!(
            reel = self.id,
            from = self.resting_index,
            target,
            loops,
            delta_steps,
            strip_len = self.strip.len(),
            settles_at = plan.settles_at_ms,
            "reel spin started"
        );
        Some(plan)
    }

    fn draw_loops(&self, rng: &mut dyn RandomSource) -> u32 {
        let span = f64::from(self.extra_loops) + 1.0;
        let extra = ((rng.next_f64() * span) as u32).min(self.extra_loops);
        self.min_loops + extra
    }

    /// Advance to `now_ms`. Settles the reel and reports completion once its
    /// transition time has fully elapsed.
    pub fn tick(&mut self, now_ms: u64) -> Option<ReelEvent> {
        let plan = self.motion?.plan;
        if now_ms < plan.settles_at_ms {
            return None;
        }
        self.motion = None;
        self.rest_on(plan.target_index);
        debug!(reel = self.id, resting_index = plan.target_index, "reel settled");
        Some(ReelEvent::SpinComplete {
            reel: self.id,
            resting_index: plan.target_index,
            at_ms: plan.settles_at_ms,
        })
    }

    // Rebase onto the minimal window: the landing item sits at the same
    // catalog index in the first copy, so nothing visibly jumps.
    fn rest_on(&mut self, index: usize) {
        self.strip.clear();
        for _ in 0..REST_WINDOW_COPIES {
            self.strip.extend(0..self.catalog_len);
        }
        self.position = index;
        self.resting_index = index;
    }

    pub fn offset_at(&self, now_ms: u64) -> f64 {
        let Some(m) = &self.motion else {
            return self.resting_offset() as f64;
        };
        if now_ms <= m.plan.motion_starts_at_ms {
            return m.from_offset as f64;
        }
        let progress = if m.plan.transition_ms == 0 {
            1.0
        } else {
            (now_ms - m.plan.motion_starts_at_ms) as f64 / m.plan.transition_ms as f64
        };
        let eased = self.curve.ease(progress);
        m.from_offset as f64 + (m.to_offset - m.from_offset) as f64 * eased
    }

    pub fn snapshot(&self, now_ms: u64) -> ReelSnapshot {
        let offset = self.offset_at(now_ms);
        let slot = (-offset / f64::from(self.item_height)).round().max(0.0) as usize;
        let centered_index = self
            .strip
            .get(slot)
            .copied()
            .unwrap_or(self.resting_index);
        ReelSnapshot {
            reel: self.id,
            offset,
            is_animating: self.is_animating(),
            transition_ms: self.motion.map(|m| m.plan.transition_ms).unwrap_or(0),
            strip: self.strip.clone(),
            centered_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{EntropySource, SeededStream};

    fn reel(len: usize, start: usize) -> Reel {
        let machine = MachineConfig::default();
        let cfg = ReelConfig {
            start_index: start,
            stagger_ms: 0,
            lag_ms: 0,
        };
        Reel::new(0, len, &machine, &cfg).unwrap()
    }

    fn start(target_index: i64, duration_ms: u64) -> ReelCommand {
        ReelCommand::StartSpin {
            target_index,
            duration_ms,
        }
    }

    #[test]
    fn starts_at_rest_on_initial_index() {
        let r = reel(3, 2);
        assert!(!r.is_animating());
        assert_eq!(r.resting_index(), 2);
        assert_eq!(r.resting_offset(), -280);
        assert_eq!(r.strip_len(), 6);
        assert_eq!(r.snapshot(0).centered_index, 2);
    }

    #[test]
    fn forward_steps_wraps_backwards_targets() {
        assert_eq!(forward_steps(2, 0, 5, 3), 16);
        assert_eq!(forward_steps(0, 2, 5, 3), 17);
        assert_eq!(forward_steps(1, 1, 5, 3), 15);
        assert_eq!(forward_steps(0, 0, 0, 1), 0);
    }

    #[test]
    fn lands_on_target_after_duration() {
        let mut rng = SeededStream::new("reel", "test", 1);
        let mut r = reel(3, 0);
        let plan = r.handle(start(1, 2000), 0, &mut rng).unwrap();
        assert_eq!(plan.motion_starts_at_ms, 50);
        assert_eq!(plan.settles_at_ms, 2050);
        assert!(plan.loops >= 5 && plan.loops <= 7);

        assert_eq!(r.tick(2049), None);
        assert!(r.is_animating());
        assert_eq!(
            r.tick(2050),
            Some(ReelEvent::SpinComplete {
                reel: 0,
                resting_index: 1,
                at_ms: 2050
            })
        );
        assert!(!r.is_animating());
        assert_eq!(r.resting_index(), 1);
        assert_eq!(r.resting_offset(), -140);
    }

    #[test]
    fn offset_moves_forward_only() {
        let mut rng = EntropySource::from_seed(5);
        let mut r = reel(3, 1);
        let plan = r.handle(start(0, 1000), 100, &mut rng).unwrap();
        let mut prev = r.offset_at(100);
        assert_eq!(prev, -140.0);
        for t in (100..=plan.settles_at_ms).step_by(10) {
            let o = r.offset_at(t);
            assert!(o <= prev + 1e-6, "moved backwards at {t}");
            prev = o;
        }
        let end = -140.0 - plan.delta_steps as f64 * 140.0;
        assert!((r.offset_at(plan.settles_at_ms) - end).abs() < 1e-6);
    }

    #[test]
    fn strip_covers_path_then_rebases() {
        let mut rng = EntropySource::from_seed(9);
        let mut r = reel(3, 0);
        let plan = r.handle(start(2, 500), 0, &mut rng).unwrap();
        let landing_slot = plan.delta_steps as usize;
        assert!(r.strip_len() > landing_slot + 3);
        let snap = r.snapshot(plan.settles_at_ms);
        assert_eq!(snap.strip[landing_slot], 2);
        assert_eq!(snap.centered_index, 2);

        r.tick(plan.settles_at_ms);
        assert_eq!(r.strip_len(), 6);
        assert_eq!(r.snapshot(plan.settles_at_ms).centered_index, 2);
    }

    #[test]
    fn busy_reel_ignores_second_spin() {
        let mut rng = EntropySource::from_seed(2);
        let mut r = reel(3, 0);
        let first = r.handle(start(2, 1000), 0, &mut rng).unwrap();
        let len = r.strip_len();
        assert_eq!(r.handle(start(1, 10), 20, &mut rng), None);
        assert_eq!(r.plan(), Some(first));
        assert_eq!(r.strip_len(), len);
        r.tick(first.settles_at_ms);
        assert_eq!(r.resting_index(), 2);
    }

    #[test]
    fn out_of_range_targets_wrap() {
        let mut rng = EntropySource::from_seed(3);
        for (target, expected) in [(-1i64, 2usize), (-4, 2), (3, 0), (10, 1), (-300, 0)] {
            let mut r = reel(3, 1);
            let plan = r.handle(start(target, 100), 0, &mut rng).unwrap();
            r.tick(plan.settles_at_ms);
            assert_eq!(r.resting_index(), expected, "target {target}");
        }
    }

    #[test]
    fn zero_duration_settles_after_delay() {
        let mut rng = EntropySource::from_seed(4);
        let mut r = reel(3, 0);
        let plan = r.handle(start(1, 0), 0, &mut rng).unwrap();
        assert_eq!(plan.settles_at_ms, 50);
        assert!(r.tick(50).is_some());
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let machine = MachineConfig::default();
        let err = Reel::new(0, 0, &machine, &machine.reels[0]).err();
        assert_eq!(err, Some(ConfigError::EmptyCatalog));
        assert_eq!(forward_steps(0, 0, 5, 0), 0);
    }
}
