//! Timing curves for reel motion.
//!
//! Reels decelerate along a CSS-style cubic bezier. The curve is cosmetic;
//! only its end points matter for landing, and those are pinned to 0 and 1.

use serde::{Deserialize, Serialize};

const NEWTON_ITERATIONS: usize = 8;
const EPSILON: f64 = 1e-7;

/// Cubic bezier through (0,0) and (1,1) with control points (x1,y1), (x2,y2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl CubicBezier {
    /// CSS `ease`: cubic-bezier(0.25, 0.1, 0.25, 1).
    pub const EASE: CubicBezier = CubicBezier::new(0.25, 0.1, 0.25, 1.0);

    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    fn coefficients(p1: f64, p2: f64) -> (f64, f64, f64) {
        let c = 3.0 * p1;
        let b = 3.0 * (p2 - p1) - c;
        let a = 1.0 - c - b;
        (a, b, c)
    }

    fn sample(p1: f64, p2: f64, t: f64) -> f64 {
        let (a, b, c) = Self::coefficients(p1, p2);
        ((a * t + b) * t + c) * t
    }

    fn slope(p1: f64, p2: f64, t: f64) -> f64 {
        let (a, b, c) = Self::coefficients(p1, p2);
        (3.0 * a * t + 2.0 * b) * t + c
    }

    /// Parametric t for a given x: Newton first, bisection if it stalls.
    fn solve_t(&self, x: f64) -> f64 {
        let mut t = x;
        for _ in 0..NEWTON_ITERATIONS {
            let err = Self::sample(self.x1, self.x2, t) - x;
            if err.abs() < EPSILON {
                return t;
            }
            let d = Self::slope(self.x1, self.x2, t);
            if d.abs() < 1e-6 {
                break;
            }
            t -= err / d;
        }

        let (mut lo, mut hi) = (0.0, 1.0);
        t = x;
        while lo < hi {
            let v = Self::sample(self.x1, self.x2, t);
            if (v - x).abs() < EPSILON {
                break;
            }
            if x > v {
                lo = t;
            } else {
                hi = t;
            }
            let next = (lo + hi) / 2.0;
            if (next - t).abs() < EPSILON {
                break;
            }
            t = next;
        }
        t
    }

    /// Progress in [0, 1] for elapsed fraction `x` (clamped).
    pub fn ease(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        Self::sample(self.y1, self.y2, self.solve_t(x))
    }
}

impl Default for CubicBezier {
    fn default() -> Self {
        Self::EASE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_points_pinned() {
        let curve = CubicBezier::EASE;
        assert_eq!(curve.ease(0.0), 0.0);
        assert_eq!(curve.ease(1.0), 1.0);
        assert_eq!(curve.ease(-3.0), 0.0);
        assert_eq!(curve.ease(7.0), 1.0);
    }

    #[test]
    fn ease_is_monotonic() {
        let curve = CubicBezier::EASE;
        let mut prev = 0.0;
        for i in 1..=200 {
            let v = curve.ease(i as f64 / 200.0);
            assert!(v + 1e-9 >= prev, "dropped at step {i}: {prev} -> {v}");
            prev = v;
        }
    }

    #[test]
    fn ease_front_loads_motion() {
        // CSS ease is well past half way at the midpoint (~0.80)
        let mid = CubicBezier::EASE.ease(0.5);
        assert!(mid > 0.75 && mid < 0.85, "{mid}");
    }

    #[test]
    fn linear_control_points_are_identity() {
        let linear = CubicBezier::new(0.0, 0.0, 1.0, 1.0);
        for i in 0..=10 {
            let x = i as f64 / 10.0;
            assert!((linear.ease(x) - x).abs() < 1e-5);
        }
    }
}
