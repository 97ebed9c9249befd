// ABOUTME: Strength metric formulas used to derive record comparison values
// ABOUTME: Estimated one-rep max (Epley and Brzycki) and single-set volume
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Maverick Fitness

//! Strength metric formulas
//!
//! All formulas are monotonic in both weight and reps over their valid
//! domain, which is what makes "strictly greater derived value" a sound
//! record comparison.

/// Estimated one-rep max using the Epley formula: `weight * (1 + reps / 30)`.
///
/// Returns `None` for a non-positive or non-finite weight. Zero or negative
/// reps estimate as the raw weight, matching the platform's historical
/// behavior for degenerate inputs.
#[must_use]
pub fn epley_one_rep_max(weight_kg: f64, reps: i64) -> Option<f64> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return None;
    }
    if reps <= 0 {
        return Some(weight_kg);
    }
    Some(weight_kg * (1.0 + reps as f64 / 30.0))
}

/// Estimated one-rep max using the Brzycki formula: `weight * 36 / (37 - reps)`.
///
/// Kept alongside Epley for parity with the platform's metric suite; the
/// record pipeline itself uses Epley. Returns `None` for a non-positive or
/// non-finite weight, or for `reps >= 37` where the formula diverges.
#[must_use]
pub fn brzycki_one_rep_max(weight_kg: f64, reps: i64) -> Option<f64> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return None;
    }
    if reps <= 0 {
        return Some(weight_kg);
    }
    if reps >= 37 {
        return None;
    }
    Some(weight_kg * 36.0 / (37.0 - reps as f64))
}

/// Single-set volume: `weight * reps`.
///
/// Returns `None` unless both weight and reps are positive and finite.
#[must_use]
pub fn set_volume(weight_kg: f64, reps: i64) -> Option<f64> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 || reps <= 0 {
        return None;
    }
    Some(weight_kg * reps as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epley_matches_reference_values() {
        // 100kg x 5 reps -> 100 * (1 + 5/30) = 116.67kg
        let e1rm = epley_one_rep_max(100.0, 5).expect("valid input");
        assert!((e1rm - 116.666_666).abs() < 1e-3);
    }

    #[test]
    fn epley_single_rep_still_applies_formula() {
        let e1rm = epley_one_rep_max(120.0, 1).expect("valid input");
        assert!((e1rm - 124.0).abs() < 1e-9);
    }

    #[test]
    fn epley_is_monotonic_in_reps() {
        let lower = epley_one_rep_max(100.0, 3).expect("valid");
        let higher = epley_one_rep_max(100.0, 8).expect("valid");
        assert!(higher > lower);
    }

    #[test]
    fn epley_rejects_bad_weight() {
        assert_eq!(epley_one_rep_max(0.0, 5), None);
        assert_eq!(epley_one_rep_max(-10.0, 5), None);
        assert_eq!(epley_one_rep_max(f64::NAN, 5), None);
        assert_eq!(epley_one_rep_max(f64::INFINITY, 5), None);
    }

    #[test]
    fn epley_degenerate_reps_return_weight() {
        assert_eq!(epley_one_rep_max(80.0, 0), Some(80.0));
        assert_eq!(epley_one_rep_max(80.0, -3), Some(80.0));
    }

    #[test]
    fn brzycki_matches_reference_values() {
        // 100kg x 10 reps -> 100 * 36 / 27 = 133.33kg
        let e1rm = brzycki_one_rep_max(100.0, 10).expect("valid input");
        assert!((e1rm - 133.333_333).abs() < 1e-3);
    }

    #[test]
    fn brzycki_diverges_at_high_reps() {
        assert_eq!(brzycki_one_rep_max(100.0, 37), None);
        assert_eq!(brzycki_one_rep_max(100.0, 50), None);
    }

    #[test]
    fn volume_requires_positive_inputs() {
        assert_eq!(set_volume(100.0, 5), Some(500.0));
        assert_eq!(set_volume(100.0, 0), None);
        assert_eq!(set_volume(0.0, 5), None);
    }
}
