//! Winner-draw fairness checks: histogram plus Pearson chi-square
//! goodness-of-fit against a uniform distribution.

use serde::Serialize;

use crate::rng::RandomSource;

// Critical values at alpha = 0.001 for 1..=10 degrees of freedom.
const CHI2_CRITICAL_999: [f64; 10] = [
    10.828, 13.816, 16.266, 18.467, 20.515, 22.458, 24.322, 26.124, 27.877, 29.588,
];
// Standard normal quantile for 0.999.
const Z_999: f64 = 3.090_232;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FairnessReport {
    pub draws: u64,
    pub counts: Vec<u64>,
    pub frequencies: Vec<f64>,
    pub chi_square: f64,
    pub degrees_of_freedom: usize,
    pub critical_value: f64,
    pub uniform: bool,
}

/// Draw `draws` winners from `[0, outcomes)` and count each index.
pub fn draw_histogram(rng: &mut dyn RandomSource, outcomes: usize, draws: u64) -> Vec<u64> {
    let mut counts = vec![0u64; outcomes];
    if outcomes == 0 {
        return counts;
    }
    for _ in 0..draws {
        counts[rng.pick(outcomes)] += 1;
    }
    counts
}

/// Pearson statistic against equal expected counts.
pub fn chi_square_uniform(counts: &[u64]) -> f64 {
    let total: u64 = counts.iter().sum();
    if counts.is_empty() || total == 0 {
        return 0.0;
    }
    let expected = total as f64 / counts.len() as f64;
    counts
        .iter()
        .map(|&c| {
            let d = c as f64 - expected;
            d * d / expected
        })
        .sum()
}

/// Chi-square critical value at alpha = 0.001. Table lookup for small
/// `dof`, Wilson-Hilferty approximation above it.
pub fn critical_value_999(dof: usize) -> f64 {
    match dof {
        0 => 0.0,
        1..=10 => CHI2_CRITICAL_999[dof - 1],
        _ => {
            let k = dof as f64;
            let h = 2.0 / (9.0 * k);
            k * (1.0 - h + Z_999 * h.sqrt()).powi(3)
        }
    }
}

pub fn fairness_report(rng: &mut dyn RandomSource, outcomes: usize, draws: u64) -> FairnessReport {
    let counts = draw_histogram(rng, outcomes, draws);
    let chi_square = chi_square_uniform(&counts);
    let degrees_of_freedom = outcomes.saturating_sub(1);
    let critical_value = critical_value_999(degrees_of_freedom);
    let frequencies = counts
        .iter()
        .map(|&c| if draws == 0 { 0.0 } else { c as f64 / draws as f64 })
        .collect();
    FairnessReport {
        draws,
        counts,
        frequencies,
        chi_square,
        degrees_of_freedom,
        critical_value,
        uniform: chi_square < critical_value || degrees_of_freedom == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeededStream;

    #[test]
    fn perfect_split_scores_zero() {
        assert_eq!(chi_square_uniform(&[100, 100, 100]), 0.0);
        assert_eq!(chi_square_uniform(&[]), 0.0);
    }

    #[test]
    fn skewed_split_scores_high() {
        // expected 100 each: (50^2 + 50^2 + 0) / 100
        assert!((chi_square_uniform(&[150, 50, 100]) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn approximation_tracks_table() {
        // Wilson-Hilferty is within ~1% of the tabulated value at 10 dof
        let approx = {
            let k = 10.0f64;
            let h = 2.0 / (9.0 * k);
            k * (1.0 - h + Z_999 * h.sqrt()).powi(3)
        };
        assert!((approx - critical_value_999(10)).abs() / critical_value_999(10) < 0.01);
        assert!(critical_value_999(20) > critical_value_999(10));
    }

    #[test]
    fn single_outcome_is_trivially_uniform() {
        let mut rng = SeededStream::new("one", "draws", 0);
        let report = fairness_report(&mut rng, 1, 50);
        assert_eq!(report.counts, vec![50]);
        assert!(report.uniform);
    }
}
