//! Parameter sweeps: one independent run per `(U, mu)` point.
//!
//! Points run concurrently on the rayon pool. Each owns its lattice, field,
//! random stream and output file; the run id used for hybrid seeding is the
//! point's position in the sweep.

use std::path::PathBuf;

use log::{error, info};
use rayon::prelude::*;

use crate::error::{LangevinError, Result};
use crate::io::Config;
use crate::run::{run_point, RunSummary};

#[derive(Debug, Clone, PartialEq)]
pub struct PointReport {
    pub u: f64,
    pub mu: f64,
    pub output: PathBuf,
    pub summary: RunSummary,
}

/// A point whose run stopped with an error.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedPoint {
    pub u: f64,
    pub mu: f64,
    pub message: String,
}

/// Finished and failed points of a sweep, each list in sweep order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    pub points: Vec<PointReport>,
    pub failed: Vec<FailedPoint>,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.points.len() + self.failed.len()
    }

    /// Fraction of points that finished, 0 for an empty sweep.
    pub fn success_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.points.len() as f64 / total as f64,
        }
    }
}

/// Run every point of `config.sweep`.
///
/// The configuration, including the parameters of every point, is validated
/// before any point starts. A point that fails at run time is recorded in
/// [`SweepReport::failed`] and does not stop the others.
pub fn run_sweep(config: &Config) -> Result<SweepReport> {
    config.validate()?;
    let sweep = config
        .sweep
        .as_ref()
        .ok_or_else(|| LangevinError::InvalidConfig("configuration has no sweep section".to_string()))?;
    let points = sweep.points()?;
    info!("sweep over {} points", points.len());

    let results: Vec<(f64, f64, Result<PointReport>)> = points
        .par_iter()
        .enumerate()
        .map(|(run_id, &(u, mu))| {
            let output = config.paths.output_file(u, mu);
            let seed = config.seed.seed_for(run_id as u64);
            let result = run_point(
                &config.simulation,
                u,
                mu,
                seed,
                config.simulation.n_sample,
                &output,
            )
            .map(|summary| PointReport { u, mu, output, summary });
            (u, mu, result)
        })
        .collect();

    let mut report = SweepReport::default();
    for (u, mu, result) in results {
        match result {
            Ok(point) => report.points.push(point),
            Err(e) => {
                error!("point U={} mu={} failed: {}", u, mu, e);
                report.failed.push(FailedPoint { u, mu, message: e.to_string() });
            }
        }
    }
    info!(
        "sweep done: {} of {} points finished",
        report.points.len(),
        report.total()
    );
    Ok(report)
}
