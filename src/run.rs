//! Run-level sample loop.
//!
//! A run fixes one `(U, mu)` point, one random stream and one output stream.
//! Each sample restarts from the mean-field seed; converged samples are
//! written in generation order, diverged ones are counted and dropped.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, info, warn};

use crate::error::{LangevinError, Result};
use crate::field::{FieldState, Params};
use crate::io::{Header, SampleWriter, SimulationConfig};
use crate::langevin::{BoxMuller, Integrator, NoiseSource, Phase, Stage, Trajectory};
use crate::lattice::Lattice;

/// Result of integrating one sample to the horizon.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    Converged(FieldState),
    Diverged { step: usize, stage: Stage },
}

/// Accepted and failed sample counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub accepted: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &SampleOutcome) {
        match outcome {
            SampleOutcome::Converged(_) => self.accepted += 1,
            SampleOutcome::Diverged { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.accepted + self.failed
    }
}

pub struct Simulation<N: NoiseSource> {
    integrator: Integrator<N>,
}

impl<N: NoiseSource> Simulation<N> {
    pub fn new(lattice: Lattice, params: Params, n_tau: usize, noise: N) -> Result<Self> {
        Ok(Self {
            integrator: Integrator::new(lattice, params, n_tau, noise)?,
        })
    }

    pub fn params(&self) -> &Params {
        self.integrator.params()
    }

    pub fn header(&self) -> Header {
        let params = self.integrator.params();
        Header {
            site_count: self.integrator.lattice().n_sites(),
            u: params.u,
            mu: params.mu,
            n_tau: self.integrator.n_tau(),
        }
    }

    /// Integrate `state` from Langevin time zero to the horizon.
    ///
    /// The state must match the lattice and time-slice count of the run.
    pub fn evolve(&mut self, state: FieldState) -> Result<SampleOutcome> {
        let n_sites = self.integrator.lattice().n_sites();
        if state.n_sites() != n_sites {
            return Err(LangevinError::SiteCountMismatch {
                expected: n_sites,
                found: state.n_sites(),
            });
        }
        if state.n_tau() != self.integrator.n_tau() {
            return Err(LangevinError::TimeSliceMismatch {
                expected: self.integrator.n_tau(),
                found: state.n_tau(),
            });
        }

        let mut traj = Trajectory::new(state);
        Ok(match self.integrator.integrate(&mut traj) {
            Phase::Diverged { step, stage } => SampleOutcome::Diverged { step, stage },
            _ => SampleOutcome::Converged(traj.into_state()),
        })
    }

    /// One sample from the mean-field seed.
    pub fn run_sample(&mut self) -> Result<SampleOutcome> {
        let traj = self.integrator.initial_trajectory();
        self.evolve(traj.into_state())
    }

    /// Generate `n_samples` samples, writing the header first and one body per
    /// converged sample.
    pub fn run<W: Write>(&mut self, n_samples: usize, writer: &mut SampleWriter<W>) -> Result<RunSummary> {
        let header = self.header();
        info!(
            "run start: U={} mu={} sites={} n_tau={} dtau={} ds={} s_end={} samples={}",
            header.u,
            header.mu,
            header.site_count,
            header.n_tau,
            self.params().dtau,
            self.params().ds,
            self.params().s_end,
            n_samples
        );
        writer.write_header(&header)?;

        let mut summary = RunSummary::default();
        for index in 0..n_samples {
            let outcome = self.run_sample()?;
            summary.record(&outcome);
            match &outcome {
                SampleOutcome::Converged(state) => {
                    let (field, partner) = state.slice0();
                    writer.write_body(&field, &partner)?;
                    debug!("sample {} converged", index);
                }
                SampleOutcome::Diverged { step, stage } => {
                    warn!(
                        "sample {} diverged at Langevin step {} ({:?} pass), discarded",
                        index, step, stage
                    );
                }
            }
        }
        writer.flush()?;

        info!(
            "run done: U={} mu={} accepted={} failed={}",
            header.u, header.mu, summary.accepted, summary.failed
        );
        Ok(summary)
    }
}

/// Run one `(U, mu)` point with its own lattice, RNG and output file.
pub fn run_point(
    config: &SimulationConfig,
    u: f64,
    mu: f64,
    seed: Option<u64>,
    n_samples: usize,
    output: &Path,
) -> Result<RunSummary> {
    config.validate()?;
    let lattice = Lattice::new(config.side_length)?;
    let mut simulation = Simulation::new(
        lattice,
        config.params(u, mu),
        config.n_tau,
        BoxMuller::seeded(seed),
    )?;

    let open_err = |source| LangevinError::OutputOpen {
        path: output.to_path_buf(),
        source,
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(open_err)?;
    }
    let file = File::create(output).map_err(open_err)?;
    let mut writer = SampleWriter::new(BufWriter::new(file));
    simulation.run(n_samples, &mut writer)
}
