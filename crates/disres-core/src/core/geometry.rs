use nalgebra::{Point3, Vector3};

/// Number of periodic image cells tracked by [`OrthorhombicBox`] (3 per dimension).
pub const SHIFT_CELLS: usize = 27;

/// Index of the central (unshifted) image cell.
pub const CENTRAL_SHIFT: usize = 13;

/// Minimum-image displacement between two particles.
///
/// Implementations return `a - b` folded into the nearest periodic image together with
/// the index of the shift cell that image lives in. The index is used for virial
/// bookkeeping by the force evaluator and must be below [`PeriodicBoundary::num_shifts`].
pub trait PeriodicBoundary {
    fn displacement(&self, a: &Point3<f64>, b: &Point3<f64>) -> (Vector3<f64>, usize);

    fn num_shifts(&self) -> usize;

    fn central_shift(&self) -> usize;
}

#[inline]
pub fn displacement(
    pbc: Option<&dyn PeriodicBoundary>,
    a: &Point3<f64>,
    b: &Point3<f64>,
) -> (Vector3<f64>, usize) {
    match pbc {
        Some(boundary) => boundary.displacement(a, b),
        None => (a - b, CENTRAL_SHIFT),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthorhombicBox {
    lengths: Vector3<f64>,
}

impl OrthorhombicBox {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            lengths: Vector3::new(x, y, z),
        }
    }

    pub fn lengths(&self) -> &Vector3<f64> {
        &self.lengths
    }

    #[inline]
    fn shift_index(shift: [i32; 3]) -> usize {
        let cell = |s: i32| (s.clamp(-1, 1) + 1) as usize;
        cell(shift[0]) + 3 * (cell(shift[1]) + 3 * cell(shift[2]))
    }
}

impl PeriodicBoundary for OrthorhombicBox {
    fn displacement(&self, a: &Point3<f64>, b: &Point3<f64>) -> (Vector3<f64>, usize) {
        let mut dx = a - b;
        let mut shift = [0i32; 3];
        for m in 0..3 {
            let length = self.lengths[m];
            if length <= 0.0 {
                continue;
            }
            let images = -(dx[m] / length).round();
            dx[m] += images * length;
            shift[m] = images as i32;
        }
        (dx, Self::shift_index(shift))
    }

    fn num_shifts(&self) -> usize {
        SHIFT_CELLS
    }

    fn central_shift(&self) -> usize {
        CENTRAL_SHIFT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn displacement_without_box_is_plain_difference_in_central_cell() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(0.5, 0.0, -1.0);
        let (dx, shift) = displacement(None, &a, &b);
        assert_eq!(dx, Vector3::new(0.5, 2.0, 4.0));
        assert_eq!(shift, CENTRAL_SHIFT);
    }

    #[test]
    fn orthorhombic_box_keeps_short_vectors_in_central_cell() {
        let pbc = OrthorhombicBox::new(3.0, 3.0, 3.0);
        let (dx, shift) =
            pbc.displacement(&Point3::new(1.2, 1.0, 1.0), &Point3::new(1.0, 1.0, 1.0));
        assert!(f64_approx_equal(dx.x, 0.2));
        assert_eq!(shift, CENTRAL_SHIFT);
    }

    #[test]
    fn orthorhombic_box_folds_into_nearest_image() {
        let pbc = OrthorhombicBox::new(3.0, 3.0, 3.0);
        let (dx, shift) =
            pbc.displacement(&Point3::new(2.9, 0.0, 0.0), &Point3::new(0.1, 0.0, 0.0));
        assert!(f64_approx_equal(dx.x, -0.2));
        assert!(f64_approx_equal(dx.y, 0.0));
        assert_ne!(shift, CENTRAL_SHIFT);
        assert!(shift < pbc.num_shifts());
    }

    #[test]
    fn orthorhombic_box_assigns_opposite_cells_to_opposite_images() {
        let pbc = OrthorhombicBox::new(3.0, 3.0, 3.0);
        let a = Point3::new(2.9, 0.0, 0.0);
        let b = Point3::new(0.1, 0.0, 0.0);
        let (_, forward) = pbc.displacement(&a, &b);
        let (_, backward) = pbc.displacement(&b, &a);
        assert_eq!(forward + backward, 2 * CENTRAL_SHIFT);
    }
}
