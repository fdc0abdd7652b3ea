//! Langevin Lattice - complex Langevin simulation of a bosonic lattice field
//!
//! This crate evolves a complexified bosonic field on a periodic cubic lattice
//! with imaginary-time slices, using a stochastic Heun integrator. Converged
//! samples are streamed to a framed binary file for correlation analysis.

pub mod error;
pub mod lattice;
pub mod field;
pub mod langevin;
pub mod run;
pub mod io;
pub mod analysis;
pub mod sweep;

// Re-export commonly used types at crate root
pub use error::{LangevinError, Result};
pub use lattice::{Direction, Lattice, N_NEIGHBORS};
pub use field::{FieldState, Params};
pub use langevin::{drift, drift_pair, BoxMuller, Integrator, NoiseSource, Phase, Role, Stage, Trajectory, ZeroNoise};
pub use run::{run_point, RunSummary, SampleOutcome, Simulation};
pub use io::{read_config, read_stream, Config, Header, RecordReader, Sample, SampleWriter};
pub use analysis::{correlation_estimates, jackknife, SiteEstimate};
pub use sweep::{run_sweep, FailedPoint, PointReport, SweepReport};
