use serde::Deserialize;

/// Which aggregate drives the violation test of a restraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestraintKind {
    /// Time-averaged (and, in an ensemble run, replica-averaged) distance.
    #[default]
    Averaged,
    /// Replica-local instantaneous distance; time and ensemble averaging are ignored.
    Instantaneous,
}

/// Distance thresholds of a restraint.
///
/// The potential is flat between `lower` and `upper1`, harmonic below `lower` and between
/// `upper1` and `upper2`, and the restoring force saturates beyond `upper2`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Bounds {
    pub lower: f64,
    pub upper1: f64,
    pub upper2: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper1: f64, upper2: f64) -> Self {
        Self {
            lower,
            upper1,
            upper2,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lower.is_finite()
            && self.upper1.is_finite()
            && self.upper2.is_finite()
            && self.lower >= 0.0
            && self.lower <= self.upper1
            && self.upper1 <= self.upper2
    }
}

/// One restrained atom pair as supplied by the caller.
///
/// Consecutive records sharing a `label` form one (possibly ambiguous) restraint.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PairRecord {
    pub label: i64,
    #[serde(flatten)]
    pub bounds: Bounds,
    pub force_constant_factor: f64,
    #[serde(default)]
    pub kind: RestraintKind,
    pub atom_a: usize,
    pub atom_b: usize,
}

impl PairRecord {
    pub fn new(label: i64, bounds: Bounds, atom_a: usize, atom_b: usize) -> Self {
        Self {
            label,
            bounds,
            force_constant_factor: 1.0,
            kind: RestraintKind::Averaged,
            atom_a,
            atom_b,
        }
    }

    pub fn with_force_constant_factor(mut self, factor: f64) -> Self {
        self.force_constant_factor = factor;
        self
    }

    pub fn with_kind(mut self, kind: RestraintKind) -> Self {
        self.kind = kind;
        self
    }

    pub(crate) fn same_parameters(&self, other: &PairRecord) -> bool {
        self.bounds == other.bounds
            && self.force_constant_factor == other.force_constant_factor
            && self.kind == other.kind
    }
}
