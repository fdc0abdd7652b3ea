//! Drift of the complex Langevin equations for the field and its partner.
//!
//! For the field `a` with partner `b`, at time slice `t` and site `x`:
//!
//! ```text
//! K_a = 2 [ (a(t+1,x) - a(t-1,x)) / (2Δτ) + Σ_nn a(t,y) - U b(t,x) a(t,x)² + μ a(t,x) ]
//! ```
//!
//! The partner equation swaps the roles of `a` and `b` and flips the sign of
//! the imaginary-time derivative. Time slices are periodic.

use num_complex::Complex64;

use crate::field::{FieldState, Params};
use crate::lattice::Lattice;

/// Which of the two coupled equations to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Field,
    Partner,
}

impl Role {
    /// Sign in front of the imaginary-time derivative.
    #[inline]
    pub fn time_sign(self) -> f64 {
        match self {
            Role::Field => 1.0,
            Role::Partner => -1.0,
        }
    }
}

/// Drift at `(t, site)` for the equation selected by `role`.
#[inline]
pub fn drift(
    lattice: &Lattice,
    params: &Params,
    state: &FieldState,
    t: usize,
    site: usize,
    role: Role,
) -> Complex64 {
    let (this, other) = match role {
        Role::Field => (&state.field, &state.partner),
        Role::Partner => (&state.partner, &state.field),
    };

    let n_tau = this.ncols();
    let next = (t + 1) % n_tau;
    let prev = (t + n_tau - 1) % n_tau;

    let time_derivative =
        (this[(site, next)] - this[(site, prev)]) * (role.time_sign() / (2.0 * params.dtau));

    let hopping: Complex64 = lattice
        .neighbors(site)
        .iter()
        .map(|&y| this[(y, t)])
        .sum();

    let value = this[(site, t)];
    let interaction = -params.u * other[(site, t)] * value * value;
    let chemical = params.mu * value;

    2.0 * (time_derivative + hopping + interaction + chemical)
}

/// Drift of both equations at `(t, site)`, `(field, partner)`.
#[inline]
pub fn drift_pair(
    lattice: &Lattice,
    params: &Params,
    state: &FieldState,
    t: usize,
    site: usize,
) -> (Complex64, Complex64) {
    (
        drift(lattice, params, state, t, site, Role::Field),
        drift(lattice, params, state, t, site, Role::Partner),
    )
}
