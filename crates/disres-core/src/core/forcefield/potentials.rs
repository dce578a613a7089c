use crate::core::models::restraint::Bounds;

const SIXTH: f64 = 1.0 / 6.0;
const SEVEN_THIRDS: f64 = 7.0 / 3.0;

/// Effective distance of an r⁻⁶ aggregate, `aggregate^(-1/6)`.
#[inline]
pub fn inv_sixth_root(aggregate: f64) -> f64 {
    aggregate.powf(-SIXTH)
}

/// `r⁻³` from a squared distance.
#[inline]
pub fn inverse_cube(dist_sq: f64) -> f64 {
    let inv = 1.0 / dist_sq.sqrt();
    inv * inv * inv
}

/// Derivative weight of one pair's running r⁻³ average inside an r⁻⁶ aggregate.
#[inline]
pub fn averaged_pair_weight(running_inv_cube: f64) -> f64 {
    running_inv_cube.powf(SEVEN_THIRDS)
}

/// Derivative weight of one pair's instantaneous distance inside an r⁻⁶ aggregate.
#[inline]
pub fn instantaneous_pair_weight(distance: f64) -> f64 {
    distance.powi(-7)
}

/// Coefficients of the exponential running average for one step.
///
/// `warmup_product` is `warmupFactor · decayFactor`; it starts at `decayFactor` and tends to
/// zero, at which point the recurrence becomes a plain exponential moving average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AveragingFactors {
    pub decay: f64,
    pub complement: f64,
    pub warmup_product: f64,
    pub normalization: f64,
}

impl AveragingFactors {
    pub fn new(decay: f64, complement: f64, warmup_factor: f64) -> Self {
        let warmup_product = warmup_factor * decay;
        Self {
            decay,
            complement,
            warmup_product,
            normalization: 1.0 / (1.0 - warmup_product),
        }
    }

    /// Folds this step's `r⁻³` into the previous running average.
    #[inline]
    pub fn advance(&self, previous: f64, inv_cube: f64) -> f64 {
        self.normalization
            * ((self.decay - self.warmup_product) * previous + self.complement * inv_cube)
    }
}

/// Signed excess of `distance` over the flat region of `bounds`.
///
/// Positive above `upper1`, negative below `lower`, `None` inside `[lower, upper1]`.
#[inline]
pub fn violation(distance: f64, bounds: &Bounds) -> Option<f64> {
    if distance > bounds.upper1 {
        Some(distance - bounds.upper1)
    } else if distance < bounds.lower {
        Some(distance - bounds.lower)
    } else {
        None
    }
}

#[inline]
pub fn harmonic_energy(force_constant: f64, excess: f64) -> f64 {
    0.5 * force_constant * excess * excess
}

/// Most negative scalar force the restraint may exert, `-k·(upper2 - upper1)`.
#[inline]
pub fn saturation_force(force_constant: f64, bounds: &Bounds) -> f64 {
    -force_constant * (bounds.upper2 - bounds.upper1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn bounds() -> Bounds {
        Bounds::new(0.2, 0.3, 0.4)
    }

    #[test]
    fn inverse_cube_of_exact_square_is_exact() {
        assert_eq!(inverse_cube(0.25), 8.0);
        assert_eq!(inverse_cube(1.0), 1.0);
    }

    #[test]
    fn inv_sixth_root_recovers_single_pair_distance() {
        let r3 = inverse_cube(0.35 * 0.35);
        assert!(f64_approx_equal(inv_sixth_root(r3 * r3), 0.35));
    }

    #[test]
    fn inv_sixth_root_of_two_equal_pairs_is_shorter_than_either() {
        let r3 = inverse_cube(0.5 * 0.5);
        let effective = inv_sixth_root(2.0 * r3 * r3);
        assert!(f64_approx_equal(effective, 0.5 * 2f64.powf(-1.0 / 6.0)));
    }

    #[test]
    fn first_step_with_full_warmup_ignores_previous_value() {
        let factors = AveragingFactors::new(0.9, 0.1, 1.0);
        let advanced = factors.advance(123.0, 8.0);
        assert!(f64_approx_equal(advanced, 8.0));
    }

    #[test]
    fn advance_without_warmup_is_plain_exponential_average() {
        let factors = AveragingFactors::new(0.9, 0.1, 0.0);
        assert_eq!(factors.normalization, 1.0);
        assert!(f64_approx_equal(factors.advance(10.0, 20.0), 0.9 * 10.0 + 0.1 * 20.0));
    }

    #[test]
    fn advance_of_constant_signal_stays_constant_during_warmup() {
        let decay = 0.8;
        let mut warmup = 1.0;
        let mut average = 0.0;
        for _ in 0..10 {
            let factors = AveragingFactors::new(decay, 1.0 - decay, warmup);
            average = factors.advance(average, 5.0);
            warmup = factors.warmup_product;
            assert!((average - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn violation_above_upper_bound_is_positive() {
        let excess = violation(0.35, &bounds()).unwrap();
        assert!(f64_approx_equal(excess, 0.05));
    }

    #[test]
    fn violation_below_lower_bound_is_negative() {
        let excess = violation(0.15, &bounds()).unwrap();
        assert!(f64_approx_equal(excess, -0.05));
    }

    #[test]
    fn violation_is_strict_at_both_bounds() {
        assert_eq!(violation(0.3, &bounds()), None);
        assert_eq!(violation(0.2, &bounds()), None);
        assert_eq!(violation(0.25, &bounds()), None);
    }

    #[test]
    fn harmonic_energy_matches_half_k_excess_squared() {
        assert!(f64_approx_equal(harmonic_energy(1000.0, 0.05), 1.25));
    }

    #[test]
    fn saturation_force_is_negative_linear_region_width_times_k() {
        assert!(f64_approx_equal(saturation_force(1000.0, &bounds()), -100.0));
    }

    #[test]
    fn pair_weights_match_inverse_seventh_power() {
        let r = 0.5;
        assert!((averaged_pair_weight(inverse_cube(r * r)) - r.powi(-7)).abs() < 1e-9);
        assert!(f64_approx_equal(instantaneous_pair_weight(r), 128.0));
    }
}
