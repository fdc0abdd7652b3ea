//! Simulation parameters and the complexified field state.

use nalgebra::DMatrix;
use num_complex::Complex64;
use crate::error::{LangevinError, Result};

/// Physical and step parameters, fixed for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Params {
    /// Chemical potential μ
    pub mu: f64,
    /// Interaction strength U
    pub u: f64,
    /// Imaginary-time spacing Δτ
    pub dtau: f64,
    /// Langevin step size
    pub ds: f64,
    /// Langevin horizon
    pub s_end: f64,
}

impl Params {
    /// Noise amplitude `sqrt(2 ds / dtau)`.
    pub fn sigma(&self) -> f64 {
        (2.0 * self.ds / self.dtau).sqrt()
    }

    /// Closed-form mean-field amplitude `sqrt((6 + mu) / U)`.
    pub fn mean_field(&self) -> f64 {
        ((6.0 + self.mu) / self.u).sqrt()
    }

    /// Reject parameter sets the integrator cannot start from.
    pub fn validate(&self) -> Result<()> {
        let positive = [("dtau", self.dtau), ("ds", self.ds), ("s_end", self.s_end)];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(LangevinError::InvalidConfig(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        if !(self.u.is_finite() && self.u > 0.0) {
            return Err(LangevinError::InvalidConfig(format!(
                "interaction strength U must be positive, got {}",
                self.u
            )));
        }
        if !self.mu.is_finite() || 6.0 + self.mu < 0.0 {
            return Err(LangevinError::InvalidConfig(format!(
                "chemical potential mu must satisfy 6 + mu >= 0, got {}",
                self.mu
            )));
        }
        Ok(())
    }
}

/// Field `a` and its independent partner `a_ast` on the (site, time-slice) grid.
///
/// Both matrices have one row per lattice site and one column per time slice,
/// so a single time slice is a contiguous column.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldState {
    pub field: DMatrix<Complex64>,
    pub partner: DMatrix<Complex64>,
}

impl FieldState {
    /// Constant configuration with both arrays equal to `value`.
    pub fn uniform(n_sites: usize, n_tau: usize, value: Complex64) -> Self {
        Self {
            field: DMatrix::from_element(n_sites, n_tau, value),
            partner: DMatrix::from_element(n_sites, n_tau, value),
        }
    }

    /// Mean-field seed every sample starts from: real, uniform in space and time.
    pub fn mean_field(n_sites: usize, n_tau: usize, params: &Params) -> Self {
        Self::uniform(n_sites, n_tau, Complex64::new(params.mean_field(), 0.0))
    }

    pub fn n_sites(&self) -> usize {
        self.field.nrows()
    }

    pub fn n_tau(&self) -> usize {
        self.field.ncols()
    }

    /// True when no entry of either array is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.field.iter().chain(self.partner.iter()).all(|z| z.is_finite())
    }

    /// Copy of time slice 0 for both arrays, the projection written per sample.
    pub fn slice0(&self) -> (Vec<Complex64>, Vec<Complex64>) {
        (
            self.field.column(0).iter().copied().collect(),
            self.partner.column(0).iter().copied().collect(),
        )
    }
}
