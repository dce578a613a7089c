use std::ops::{Add, AddAssign};

/// Totals of one restraint evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RestraintTerm {
    pub energy: f64,
    /// Sum of `|excess|` (or the mixed excess) over restraints that exerted a force.
    pub violation: f64,
    /// Set when some restraint produced a non-finite energy contribution.
    pub non_finite: bool,
}

impl RestraintTerm {
    pub fn new(energy: f64, violation: f64) -> Self {
        Self {
            energy,
            violation,
            non_finite: false,
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        !self.non_finite && self.energy.is_finite()
    }
}

impl Add for RestraintTerm {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            energy: self.energy + rhs.energy,
            violation: self.violation + rhs.violation,
            non_finite: self.non_finite || rhs.non_finite,
        }
    }
}

impl AddAssign for RestraintTerm {
    fn add_assign(&mut self, rhs: Self) {
        self.energy += rhs.energy;
        self.violation += rhs.violation;
        self.non_finite |= rhs.non_finite;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_finite_term_with_specified_values() {
        let term = RestraintTerm::new(1.25, 0.05);
        assert_eq!(term.energy, 1.25);
        assert_eq!(term.violation, 0.05);
        assert!(term.is_finite());
    }

    #[test]
    fn default_initializes_to_zero_and_finite() {
        let term = RestraintTerm::default();
        assert_eq!(term, RestraintTerm::new(0.0, 0.0));
    }

    #[test]
    fn add_sums_fields_and_propagates_non_finite_flag() {
        let a = RestraintTerm::new(1.0, 0.5);
        let mut b = RestraintTerm::new(2.0, 0.25);
        b.non_finite = true;
        let result = a + b;
        assert_eq!(result.energy, 3.0);
        assert_eq!(result.violation, 0.75);
        assert!(result.non_finite);
        assert!(!result.is_finite());
    }

    #[test]
    fn add_assign_accumulates_each_field() {
        let mut a = RestraintTerm::new(1.0, 2.0);
        a += RestraintTerm::new(4.0, 5.0);
        assert_eq!(a, RestraintTerm::new(5.0, 7.0));
    }

    #[test]
    fn infinite_energy_is_not_finite_even_without_flag() {
        let term = RestraintTerm::new(f64::INFINITY, 0.0);
        assert!(!term.is_finite());
    }
}
