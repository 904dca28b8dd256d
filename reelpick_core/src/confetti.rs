//! Celebration effect fired when a winner is revealed.
//!
//! Four bursts share a budget of 200 particles. Particles launch upwards from
//! a point 70% down the field, fan out by the burst's spread, slow down by
//! `decay` each frame and fall under constant gravity until they expire.

use serde::Serialize;

use crate::rng::RandomSource;

pub const TOTAL_PARTICLES: u32 = 200;
pub const ORIGIN_X: f64 = 0.5;
pub const ORIGIN_Y: f64 = 0.7;
pub const LIFETIME_TICKS: u32 = 200;
const LAUNCH_ANGLE_DEG: f64 = 90.0;
const DEFAULT_START_VELOCITY: f64 = 45.0;
const DEFAULT_DECAY: f64 = 0.9;
const GRAVITY: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfettiBurst {
    pub particle_ratio: f64,
    /// Fan width in degrees.
    pub spread: f64,
    pub start_velocity: f64,
    pub decay: f64,
    /// Particle size multiplier.
    pub scalar: f64,
    pub colors: &'static [&'static str],
}

impl ConfettiBurst {
    const fn new(particle_ratio: f64, spread: f64, colors: &'static [&'static str]) -> Self {
        Self {
            particle_ratio,
            spread,
            start_velocity: DEFAULT_START_VELOCITY,
            decay: DEFAULT_DECAY,
            scalar: 1.0,
            colors,
        }
    }

    pub fn particle_count(&self, total: u32) -> usize {
        (f64::from(total) * self.particle_ratio).floor() as usize
    }
}

/// The bursts fired on every reveal.
pub fn celebration() -> Vec<ConfettiBurst> {
    vec![
        ConfettiBurst {
            start_velocity: 55.0,
            ..ConfettiBurst::new(0.25, 26.0, &["#a78bfa", "#f472b6"])
        },
        ConfettiBurst::new(0.2, 60.0, &["#2dd4bf", "#fbbf24"]),
        ConfettiBurst {
            decay: 0.91,
            scalar: 0.8,
            ..ConfettiBurst::new(0.35, 100.0, &["#ffffff"])
        },
        ConfettiBurst {
            start_velocity: 25.0,
            decay: 0.92,
            scalar: 1.2,
            ..ConfettiBurst::new(0.1, 120.0, &["#a78bfa"])
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    angle: f64,
    velocity: f64,
    decay: f64,
    pub scalar: f64,
    pub color: &'static str,
    tick: u32,
}

impl Particle {
    /// 1.0 at launch, fading to 0.0 at expiry.
    pub fn opacity(&self) -> f64 {
        1.0 - f64::from(self.tick) / f64::from(LIFETIME_TICKS)
    }

    fn step(&mut self) {
        // screen coordinates: y grows downwards, so upward launch is negative
        self.x += self.angle.cos() * self.velocity;
        self.y -= self.angle.sin() * self.velocity;
        self.y += GRAVITY;
        self.velocity *= self.decay;
        self.tick += 1;
    }

    fn expired(&self) -> bool {
        self.tick >= LIFETIME_TICKS
    }
}

/// Particle simulation in a `width` x `height` pixel field.
#[derive(Debug, Clone, Default)]
pub struct ConfettiField {
    width: f64,
    height: f64,
    particles: Vec<Particle>,
}

impl ConfettiField {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            particles: Vec::new(),
        }
    }

    pub fn fire(&mut self, bursts: &[ConfettiBurst], rng: &mut dyn RandomSource) {
        let (ox, oy) = (self.width * ORIGIN_X, self.height * ORIGIN_Y);
        for burst in bursts {
            if burst.colors.is_empty() {
                continue;
            }
            let spread = burst.spread.to_radians();
            for i in 0..burst.particle_count(TOTAL_PARTICLES) {
                let angle = LAUNCH_ANGLE_DEG.to_radians() + (0.5 * spread - rng.next_f64() * spread);
                let velocity = burst.start_velocity * 0.5 + rng.next_f64() * burst.start_velocity;
                self.particles.push(Particle {
                    x: ox,
                    y: oy,
                    angle,
                    velocity,
                    decay: burst.decay,
                    scalar: burst.scalar,
                    color: burst.colors[i % burst.colors.len()],
                    tick: 0,
                });
            }
        }
    }

    /// Advance one frame and drop expired particles.
    pub fn step(&mut self) {
        for p in &mut self.particles {
            p.step();
        }
        self.particles.retain(|p| !p.expired());
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn is_done(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::EntropySource;

    #[test]
    fn celebration_budget() {
        let bursts = celebration();
        let counts: Vec<usize> = bursts
            .iter()
            .map(|b| b.particle_count(TOTAL_PARTICLES))
            .collect();
        assert_eq!(counts, vec![50, 40, 70, 20]);
        assert!(counts.iter().sum::<usize>() <= TOTAL_PARTICLES as usize);
    }

    #[test]
    fn particles_launch_upwards_then_expire() {
        let mut rng = EntropySource::from_seed(11);
        let mut field = ConfettiField::new(400.0, 300.0);
        field.fire(&celebration(), &mut rng);
        assert_eq!(field.particles().len(), 180);
        assert!(field.particles().iter().all(|p| p.y == 210.0));

        field.step();
        let rose = field.particles().iter().filter(|p| p.y < 210.0).count();
        assert!(rose > 150, "only {rose} particles rose");

        for _ in 0..LIFETIME_TICKS {
            field.step();
        }
        assert!(field.is_done());
    }

    #[test]
    fn opacity_fades() {
        let mut rng = EntropySource::from_seed(12);
        let mut field = ConfettiField::new(100.0, 100.0);
        field.fire(&celebration()[..1], &mut rng);
        assert_eq!(field.particles()[0].opacity(), 1.0);
        for _ in 0..100 {
            field.step();
        }
        assert!((field.particles()[0].opacity() - 0.5).abs() < 1e-9);
    }
}
