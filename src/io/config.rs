// Run configuration, read from and written to YAML.
//
// simulation:
//   dtau: 0.3
//   ds: 3.0e-6
//   s_end: 1.0
//   n_sample: 200
//   n_tau: 6
//   side_length: 6
// paths:
//   output_dir: output
// seed:
//   mode: hybrid
//   base_seed: 42
// sweep:
//   u: 20.0
//   mu_start: 0.0
//   mu_end: 10.0
//   mu_step: 2.0

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LangevinError, Result};
use crate::field::Params;

/// Integration settings shared by every parameter point of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub dtau: f64,
    pub ds: f64,
    pub s_end: f64,
    pub n_sample: usize,
    pub n_tau: usize,
    pub side_length: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dtau: 0.3,
            ds: 3.0e-6,
            s_end: 1.0,
            n_sample: 200,
            n_tau: 6,
            side_length: 6,
        }
    }
}

impl SimulationConfig {
    pub fn params(&self, u: f64, mu: f64) -> Params {
        Params {
            mu,
            u,
            dtau: self.dtau,
            ds: self.ds,
            s_end: self.s_end,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("dtau", self.dtau), ("ds", self.ds), ("s_end", self.s_end)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(LangevinError::InvalidConfig(format!(
                    "simulation.{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.n_tau == 0 {
            return Err(LangevinError::InvalidConfig("simulation.n_tau must be at least 1".to_string()));
        }
        if self.side_length < 2 {
            return Err(LangevinError::InvalidSideLength(self.side_length));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub output_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
        }
    }
}

impl PathConfig {
    /// Stream file for one `(U, mu)` point, e.g. `output/U=20,mu=0.dat`.
    pub fn output_file(&self, u: f64, mu: f64) -> PathBuf {
        self.output_dir.join(format!("U={},mu={}.dat", u, mu))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SeedMode {
    /// OS entropy, different on every run
    #[default]
    System,
    /// `base_seed` for every run
    Fixed,
    /// `base_seed + run_id`
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SeedConfig {
    pub mode: SeedMode,
    pub base_seed: Option<u64>,
}

impl SeedConfig {
    pub fn validate(&self) -> Result<()> {
        match (self.mode, self.base_seed) {
            (SeedMode::Fixed | SeedMode::Hybrid, None) => Err(LangevinError::InvalidConfig(
                "seed.base_seed is required for fixed and hybrid seed modes".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Seed for the run with identifier `run_id`; `None` means OS entropy.
    pub fn seed_for(&self, run_id: u64) -> Option<u64> {
        match self.mode {
            SeedMode::System => None,
            SeedMode::Fixed => self.base_seed,
            SeedMode::Hybrid => self.base_seed.map(|seed| seed.wrapping_add(run_id)),
        }
    }
}

/// Which physical parameter a sweep varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepParam {
    Mu,
    U,
}

/// Sweep over `mu` at fixed `U`, or over `U` at fixed `mu`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SweepConfig {
    pub u: Option<f64>,
    pub mu: Option<f64>,
    pub mu_start: Option<f64>,
    pub mu_end: Option<f64>,
    pub mu_step: Option<f64>,
    pub u_start: Option<f64>,
    pub u_end: Option<f64>,
    pub u_step: Option<f64>,
}

impl SweepConfig {
    fn mu_range(&self) -> Option<(f64, f64, f64)> {
        Some((self.mu_start?, self.mu_end?, self.mu_step?))
    }

    fn u_range(&self) -> Option<(f64, f64, f64)> {
        Some((self.u_start?, self.u_end?, self.u_step?))
    }

    pub fn sweep_param(&self) -> Result<SweepParam> {
        match (self.mu_range(), self.u_range()) {
            (Some(_), Some(_)) => Err(LangevinError::InvalidConfig(
                "cannot sweep U and mu at the same time".to_string(),
            )),
            (Some(_), None) => Ok(SweepParam::Mu),
            (None, Some(_)) => Ok(SweepParam::U),
            (None, None) => Err(LangevinError::InvalidConfig(
                "sweep needs start, end and step for either mu or U".to_string(),
            )),
        }
    }

    /// Values `start, start + step, ...` strictly below `end`.
    pub fn values(&self) -> Result<Vec<f64>> {
        let (start, end, step) = match self.sweep_param()? {
            SweepParam::Mu => self.mu_range(),
            SweepParam::U => self.u_range(),
        }
        .ok_or_else(|| LangevinError::InvalidConfig("incomplete sweep range".to_string()))?;

        if !(step > 0.0) {
            return Err(LangevinError::InvalidConfig(format!(
                "sweep step must be positive, got {}",
                step
            )));
        }

        let mut values = Vec::new();
        let mut current = start;
        while current < end {
            values.push(current);
            // rounded to 10 decimals
            current = ((current + step) * 1e10).round() / 1e10;
        }
        Ok(values)
    }

    /// `(U, mu)` pairs in sweep order.
    pub fn points(&self) -> Result<Vec<(f64, f64)>> {
        let param = self.sweep_param()?;
        let values = self.values()?;
        match param {
            SweepParam::Mu => {
                let u = self.u.ok_or_else(|| {
                    LangevinError::InvalidConfig("a mu sweep needs a fixed U".to_string())
                })?;
                Ok(values.into_iter().map(|mu| (u, mu)).collect())
            }
            SweepParam::U => {
                let mu = self.mu.ok_or_else(|| {
                    LangevinError::InvalidConfig("a U sweep needs a fixed mu".to_string())
                })?;
                Ok(values.into_iter().map(|u| (u, mu)).collect())
            }
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub paths: PathConfig,
    pub seed: SeedConfig,
    pub sweep: Option<SweepConfig>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        self.seed.validate()?;
        if let Some(sweep) = &self.sweep {
            for (u, mu) in sweep.points()? {
                self.simulation.params(u, mu).validate()?;
            }
        }
        Ok(())
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let io_err = |source| LangevinError::ConfigIo {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.to_yaml_string()?).map_err(io_err)
    }
}

/// Load and validate a YAML configuration file.
pub fn read_config<P: AsRef<Path>>(filename: P) -> Result<Config> {
    let path = filename.as_ref();
    let file = std::fs::File::open(path).map_err(|source| LangevinError::ConfigIo {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = std::io::BufReader::new(file);
    let config: Config = serde_yaml::from_reader(reader)?;
    config.validate()?;
    Ok(config)
}
