//! Complex Langevin dynamics: noise, drift and the Heun integrator.

mod traits;
mod noise;
mod drift;
mod integrator;

pub use traits::{NoiseSource, ZeroNoise};
pub use noise::BoxMuller;
pub use drift::{drift, drift_pair, Role};
pub use integrator::{Integrator, Phase, Stage, Trajectory};
