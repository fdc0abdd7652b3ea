//! Traits for the stochastic driving term.

use nalgebra::DMatrix;
use num_complex::Complex64;

/// Source of complex Gaussian noise for one Langevin step.
///
/// `fill` overwrites every entry of `out` (rows = sites, columns = time
/// slices). Entries are drawn column by column, so a seeded source yields the
/// same array for the same shape.
pub trait NoiseSource {
    fn fill(&mut self, out: &mut DMatrix<Complex64>);
}

impl<N: NoiseSource + ?Sized> NoiseSource for &mut N {
    fn fill(&mut self, out: &mut DMatrix<Complex64>) {
        (**self).fill(out)
    }
}

/// Noise that is identically zero. Leaves only the deterministic drift.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroNoise;

impl NoiseSource for ZeroNoise {
    fn fill(&mut self, out: &mut DMatrix<Complex64>) {
        out.fill(Complex64::new(0.0, 0.0));
    }
}
