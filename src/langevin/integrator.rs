//! Stochastic Heun (predictor-corrector) integrator for one Langevin trajectory.
//!
//! Each step draws one noise array `η`, then
//!
//! ```text
//! mid  = cur + K(cur) ds + σ η
//! next = cur + ½ (K(cur) + K(mid)) ds + σ η
//! ```
//!
//! with `σ = sqrt(2 ds / Δτ)`. The partner receives `conj(η)`. Both passes run
//! over the whole grid before the next one starts, since `K(mid)` reads the
//! midpoint at neighbouring sites.

use nalgebra::DMatrix;
use num_complex::Complex64;
use rayon::prelude::*;

use super::drift::{drift, Role};
use super::traits::NoiseSource;
use crate::error::{LangevinError, Result};
use crate::field::{FieldState, Params};
use crate::lattice::Lattice;

/// Integration pass in which a non-finite value was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Predictor,
    Corrector,
}

/// Lifecycle of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initialized,
    Stepping,
    Converged,
    Diverged { step: usize, stage: Stage },
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Converged | Phase::Diverged { .. })
    }
}

/// Field state together with its Langevin clock.
#[derive(Debug, Clone)]
pub struct Trajectory {
    state: FieldState,
    s: f64,
    steps: usize,
    phase: Phase,
}

impl Trajectory {
    pub fn new(state: FieldState) -> Self {
        Self {
            state,
            s: 0.0,
            steps: 0,
            phase: Phase::Initialized,
        }
    }

    pub fn state(&self) -> &FieldState {
        &self.state
    }

    pub fn into_state(self) -> FieldState {
        self.state
    }

    /// Accumulated Langevin time.
    pub fn s(&self) -> f64 {
        self.s
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// Scratch arrays reused across steps.
struct Workspace {
    eta: DMatrix<Complex64>,
    drift_cur: FieldState,
    drift_mid: FieldState,
    mid: FieldState,
    next: FieldState,
}

impl Workspace {
    fn new(n_sites: usize, n_tau: usize) -> Self {
        let zero = Complex64::new(0.0, 0.0);
        Self {
            eta: DMatrix::from_element(n_sites, n_tau, zero),
            drift_cur: FieldState::uniform(n_sites, n_tau, zero),
            drift_mid: FieldState::uniform(n_sites, n_tau, zero),
            mid: FieldState::uniform(n_sites, n_tau, zero),
            next: FieldState::uniform(n_sites, n_tau, zero),
        }
    }
}

/// Heun integrator bound to one lattice, one parameter set and one noise stream.
pub struct Integrator<N: NoiseSource> {
    lattice: Lattice,
    params: Params,
    n_tau: usize,
    noise: N,
    work: Workspace,
}

impl<N: NoiseSource> Integrator<N> {
    pub fn new(lattice: Lattice, params: Params, n_tau: usize, noise: N) -> Result<Self> {
        params.validate()?;
        if n_tau == 0 {
            return Err(LangevinError::InvalidConfig(
                "number of time slices must be at least 1".to_string(),
            ));
        }
        let work = Workspace::new(lattice.n_sites(), n_tau);
        Ok(Self {
            lattice,
            params,
            n_tau,
            noise,
            work,
        })
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn n_tau(&self) -> usize {
        self.n_tau
    }

    /// Fresh trajectory at the mean-field seed.
    pub fn initial_trajectory(&self) -> Trajectory {
        Trajectory::new(FieldState::mean_field(
            self.lattice.n_sites(),
            self.n_tau,
            &self.params,
        ))
    }

    /// Advance `traj` by one Langevin step and return its new phase.
    ///
    /// Terminal trajectories are left untouched.
    pub fn step(&mut self, traj: &mut Trajectory) -> Phase {
        if traj.phase.is_terminal() {
            return traj.phase;
        }
        debug_assert_eq!(traj.state.n_sites(), self.lattice.n_sites());
        debug_assert_eq!(traj.state.n_tau(), self.n_tau);

        traj.phase = Phase::Stepping;
        traj.s += self.params.ds;
        traj.steps += 1;

        let ds = self.params.ds;
        let sigma = self.params.sigma();
        let work = &mut self.work;

        self.noise.fill(&mut work.eta);

        drift_pass(&self.lattice, &self.params, &traj.state, &mut work.drift_cur);
        euler_update(&traj.state, &work.drift_cur, &work.eta, ds, sigma, &mut work.mid);
        if !work.mid.is_finite() {
            traj.phase = Phase::Diverged {
                step: traj.steps,
                stage: Stage::Predictor,
            };
            return traj.phase;
        }

        drift_pass(&self.lattice, &self.params, &work.mid, &mut work.drift_mid);
        average_into(&work.drift_cur, &mut work.drift_mid);
        euler_update(&traj.state, &work.drift_mid, &work.eta, ds, sigma, &mut work.next);
        if !work.next.is_finite() {
            traj.phase = Phase::Diverged {
                step: traj.steps,
                stage: Stage::Corrector,
            };
            return traj.phase;
        }

        std::mem::swap(&mut traj.state, &mut work.next);
        if traj.s >= self.params.s_end {
            traj.phase = Phase::Converged;
        }
        traj.phase
    }

    /// Step until the horizon is reached or the trajectory diverges.
    pub fn integrate(&mut self, traj: &mut Trajectory) -> Phase {
        while !traj.phase.is_terminal() {
            self.step(traj);
        }
        traj.phase
    }
}

/// Drift of both equations on the whole grid, one time slice per task.
fn drift_pass(lattice: &Lattice, params: &Params, state: &FieldState, out: &mut FieldState) {
    let n_sites = state.n_sites();
    out.field
        .as_mut_slice()
        .par_chunks_mut(n_sites)
        .zip(out.partner.as_mut_slice().par_chunks_mut(n_sites))
        .enumerate()
        .for_each(|(t, (ka, kb))| {
            for site in 0..n_sites {
                ka[site] = drift(lattice, params, state, t, site, Role::Field);
                kb[site] = drift(lattice, params, state, t, site, Role::Partner);
            }
        });
}

/// `out = base + force ds + σ η`, with `conj(η)` for the partner.
fn euler_update(
    base: &FieldState,
    force: &FieldState,
    eta: &DMatrix<Complex64>,
    ds: f64,
    sigma: f64,
    out: &mut FieldState,
) {
    let eta = eta.as_slice();
    let (a0, b0) = (base.field.as_slice(), base.partner.as_slice());
    let (ka, kb) = (force.field.as_slice(), force.partner.as_slice());
    let a = out.field.as_mut_slice();
    for i in 0..a.len() {
        a[i] = a0[i] + ka[i] * ds + eta[i] * sigma;
    }
    let b = out.partner.as_mut_slice();
    for i in 0..b.len() {
        b[i] = b0[i] + kb[i] * ds + eta[i].conj() * sigma;
    }
}

/// `acc = ½ (first + acc)`, elementwise on both arrays.
fn average_into(first: &FieldState, acc: &mut FieldState) {
    for (k, k0) in acc.field.iter_mut().zip(first.field.iter()) {
        *k = 0.5 * (*k0 + *k);
    }
    for (k, k0) in acc.partner.iter_mut().zip(first.partner.iter()) {
        *k = 0.5 * (*k0 + *k);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::langevin::noise::BoxMuller;
    use crate::langevin::traits::ZeroNoise;
    use approx::assert_relative_eq;

    fn params(mu: f64, u: f64, ds: f64, s_end: f64) -> Params {
        Params { mu, u, dtau: 0.3, ds, s_end }
    }

    /// Constant `i` on every entry.
    struct ImaginaryUnitNoise;

    impl NoiseSource for ImaginaryUnitNoise {
        fn fill(&mut self, out: &mut DMatrix<Complex64>) {
            out.fill(Complex64::new(0.0, 1.0));
        }
    }

    #[test]
    fn test_rejects_invalid_setup() {
        let lattice = Lattice::new(2).unwrap();
        assert!(Integrator::new(lattice.clone(), params(0.0, 1.0, 0.1, 1.0), 0, ZeroNoise).is_err());
        assert!(Integrator::new(lattice, params(0.0, -1.0, 0.1, 1.0), 2, ZeroNoise).is_err());
    }

    #[test]
    fn test_step_count_and_convergence() {
        let lattice = Lattice::new(2).unwrap();
        let mut integrator =
            Integrator::new(lattice, params(1.0, 5.0, 0.25, 1.0), 3, ZeroNoise).unwrap();
        let mut traj = integrator.initial_trajectory();
        assert_eq!(traj.phase(), Phase::Initialized);

        assert_eq!(integrator.step(&mut traj), Phase::Stepping);
        assert_eq!(integrator.integrate(&mut traj), Phase::Converged);
        assert_eq!(traj.steps(), 4);
        assert_eq!(traj.s(), 1.0);

        // terminal trajectories are not advanced further
        assert_eq!(integrator.step(&mut traj), Phase::Converged);
        assert_eq!(traj.steps(), 4);
    }

    #[test]
    fn test_mean_field_seed_is_stationary_without_noise() {
        let lattice = Lattice::new(3).unwrap();
        let p = params(2.0, 4.0, 1.0e-3, 0.05);
        let y = p.mean_field();
        let mut integrator = Integrator::new(lattice, p, 4, ZeroNoise).unwrap();
        let mut traj = integrator.initial_trajectory();
        assert_eq!(integrator.integrate(&mut traj), Phase::Converged);
        for z in traj.state().field.iter().chain(traj.state().partner.iter()) {
            assert_relative_eq!(z.re, y, epsilon = 1e-10);
            assert_relative_eq!(z.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_single_heun_step_matches_closed_form() {
        // For a uniform real field the drift is uniform: K(v) = 2 (6 v - U v^3 + mu v).
        let lattice = Lattice::new(3).unwrap();
        let p = params(0.5, 2.0, 1.0e-2, 1.0);
        let v = 0.8;
        let k = |v: f64| 2.0 * (6.0 * v - p.u * v * v * v + p.mu * v);
        let mid = v + k(v) * p.ds;
        let next = v + 0.5 * (k(v) + k(mid)) * p.ds;

        let mut integrator = Integrator::new(lattice.clone(), p, 2, ZeroNoise).unwrap();
        let mut traj = Trajectory::new(FieldState::uniform(
            lattice.n_sites(),
            2,
            Complex64::new(v, 0.0),
        ));
        assert_eq!(integrator.step(&mut traj), Phase::Stepping);
        for z in traj.state().field.iter().chain(traj.state().partner.iter()) {
            assert_relative_eq!(z.re, next, epsilon = 1e-12);
            assert_relative_eq!(z.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_partner_receives_conjugate_noise() {
        let lattice = Lattice::new(3).unwrap();
        let p = params(1.0, 3.0, 1.0e-4, 1.0);
        let mut integrator = Integrator::new(lattice, p, 3, ImaginaryUnitNoise).unwrap();
        let mut traj = integrator.initial_trajectory();
        for _ in 0..5 {
            integrator.step(&mut traj);
        }
        let state = traj.state();
        assert!(state.field[(0, 0)].im > 0.0);
        assert!(state.partner[(0, 0)].im < 0.0);
        for (a, b) in state.field.iter().zip(state.partner.iter()) {
            assert_eq!(*a, b.conj());
        }
    }

    #[test]
    fn test_non_finite_input_diverges_in_one_step() {
        let lattice = Lattice::new(3).unwrap();
        let mut integrator = Integrator::new(
            lattice,
            params(0.0, 20.0, 3.0e-3, 1.0),
            4,
            BoxMuller::seeded(Some(5)),
        )
        .unwrap();
        let mut state = integrator.initial_trajectory().into_state();
        state.field[(7, 2)] = Complex64::new(f64::NAN, 0.0);
        let mut traj = Trajectory::new(state);

        let phase = integrator.integrate(&mut traj);
        assert_eq!(
            phase,
            Phase::Diverged { step: 1, stage: Stage::Predictor }
        );
        assert_eq!(traj.steps(), 1);
    }

    #[test]
    fn test_runaway_growth_is_caught() {
        // Huge step on a far-from-equilibrium start overflows within a few steps.
        let lattice = Lattice::new(2).unwrap();
        let p = Params { mu: 0.0, u: 1.0, dtau: 0.3, ds: 10.0, s_end: 1.0e6 };
        let mut integrator = Integrator::new(lattice.clone(), p, 2, ZeroNoise).unwrap();
        let mut traj = Trajectory::new(FieldState::uniform(
            lattice.n_sites(),
            2,
            Complex64::new(1.0e3, 0.0),
        ));
        match integrator.integrate(&mut traj) {
            Phase::Diverged { step, .. } => assert!(step < 50),
            other => panic!("expected divergence, got {:?}", other),
        }
    }

    #[test]
    fn test_fixed_seed_is_bit_reproducible() {
        let run = || {
            let lattice = Lattice::new(3).unwrap();
            let mut integrator = Integrator::new(
                lattice,
                params(1.0, 10.0, 1.0e-3, 0.02),
                4,
                BoxMuller::seeded(Some(314)),
            )
            .unwrap();
            let mut traj = integrator.initial_trajectory();
            assert_eq!(integrator.integrate(&mut traj), Phase::Converged);
            traj.into_state()
        };
        let first = run();
        let second = run();
        assert_eq!(first, second);
        assert!(first.field.iter().any(|z| z.im != 0.0));
    }
}
