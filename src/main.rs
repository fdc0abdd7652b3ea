use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;

use langevin_lattice::analysis::{correlation_estimates, midpoint_diagnostics};
use langevin_lattice::io::{read_config, read_stream, Config};
use langevin_lattice::{run_point, run_sweep, LangevinError, Result};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate samples for one (U, mu) point
    Run {
        /// YAML configuration; built-in defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long = "u")]
        u: f64,
        #[arg(long)]
        mu: f64,
        /// Overrides simulation.n_sample
        #[arg(long)]
        n_sample: Option<usize>,
        /// Overrides the default `<output_dir>/U=..,mu=...dat`
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Run identifier for hybrid seeding
        #[arg(long, default_value_t = 0)]
        run_id: u64,
    },
    /// Run every point of the configuration's sweep section
    Sweep {
        #[arg(short, long, default_value = "config.yml")]
        config: PathBuf,
    },
    /// Print site correlations <a_0 a*_x> of a sample stream
    Analyze {
        file: PathBuf,
    },
    /// Create or inspect configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write the default configuration
    Init {
        #[arg(short, long, default_value = "config.yml")]
        output: PathBuf,
    },
    /// Print a configuration file after validation and defaulting
    Show {
        #[arg(short, long, default_value = "config.yml")]
        config: PathBuf,
    },
}

fn load(config: Option<&PathBuf>) -> Result<Config> {
    match config {
        Some(path) => read_config(path),
        None => {
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Run { config, u, mu, n_sample, output, run_id } => {
            let config = load(config.as_ref())?;
            let output = output.unwrap_or_else(|| config.paths.output_file(u, mu));
            let n_sample = n_sample.unwrap_or(config.simulation.n_sample);
            let summary = run_point(
                &config.simulation,
                u,
                mu,
                config.seed.seed_for(run_id),
                n_sample,
                &output,
            )?;
            println!("U={} mu={}: {} accepted, {} failed", u, mu, summary.accepted, summary.failed);
            println!("Output: {}", output.display());
        }
        Command::Sweep { config } => {
            let config = read_config(&config)?;
            let report = run_sweep(&config)?;
            for point in &report.points {
                println!(
                    "U={:<8} mu={:<8} accepted={:<6} failed={:<6} {}",
                    point.u,
                    point.mu,
                    point.summary.accepted,
                    point.summary.failed,
                    point.output.display()
                );
            }
            println!(
                "{} of {} points finished ({:.1}%)",
                report.points.len(),
                report.total(),
                100.0 * report.success_rate()
            );
            if !report.failed.is_empty() {
                println!("Failed points:");
                for failed in &report.failed {
                    println!("  U={} mu={}: {}", failed.u, failed.mu, failed.message);
                }
                return Err(LangevinError::SweepFailed {
                    failed: report.failed.len(),
                    total: report.total(),
                });
            }
        }
        Command::Analyze { file } => {
            let (header, samples) = read_stream(&file)?;
            println!("Correlation <a_0 a*_x> for U={} mu={}", header.u, header.mu);
            println!("----------------------------------------");
            println!("sites: {}  time slices: {}  samples: {}", header.site_count, header.n_tau, samples.len());
            println!("{:>6} {:>14} {:>12} {:>8} {:>10}", "site", "mean", "jk error", "tau_int", "N_eff");
            for est in correlation_estimates(&samples) {
                println!(
                    "{:>6} {:>14.6} {:>12.6} {:>8.2} {:>10.1}",
                    est.site, est.mean, est.error, est.tau_int, est.n_eff
                );
            }
            if let Some(diag) = midpoint_diagnostics(&samples) {
                println!("----------------------------------------");
                println!("site {}: thermalization skip {} samples", diag.site, diag.skip);
                if let (Some((mean, error)), Some(n_eff)) = (diag.corrected, diag.n_eff) {
                    println!("  corrected {:.6} +/- {:.6}  N_eff {:.1}", mean, error, n_eff);
                }
            }
        }
        Command::Config { action } => match action {
            ConfigAction::Init { output } => {
                Config::default().to_yaml(&output)?;
                println!("Configuration file created: {}", output.display());
            }
            ConfigAction::Show { config } => {
                let config = read_config(&config)?;
                print!("{}", config.to_yaml_string()?);
            }
        },
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.yml");
        let args = Args::try_parse_from([
            "langevin-lattice",
            "config",
            "init",
            "--output",
            path.to_str().unwrap(),
        ])
        .unwrap();
        execute(args).unwrap();
        assert_eq!(read_config(&path).unwrap(), Config::default());

        let show = Args::try_parse_from(["langevin-lattice", "config", "show", "-c", path.to_str().unwrap()]).unwrap();
        execute(show).unwrap();
    }

    #[test]
    fn test_config_show_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yml");
        let args = Args::try_parse_from(["langevin-lattice", "config", "show", "-c", missing.to_str().unwrap()]).unwrap();
        assert!(matches!(execute(args), Err(LangevinError::ConfigIo { .. })));
    }

    #[test]
    fn test_sweep_with_failed_point_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir_all(out.join("U=10,mu=0.dat")).unwrap();
        let path = dir.path().join("config.yml");
        let text = format!(
            "simulation:\n  ds: 1.0e-3\n  s_end: 2.0e-3\n  n_sample: 1\n  n_tau: 1\n  side_length: 2\n\
             paths:\n  output_dir: {}\n\
             seed:\n  mode: fixed\n  base_seed: 3\n\
             sweep:\n  u: 10.0\n  mu_start: 0.0\n  mu_end: 2.0\n  mu_step: 1.0\n",
            out.display()
        );
        std::fs::write(&path, text).unwrap();
        let args = Args::try_parse_from(["langevin-lattice", "sweep", "-c", path.to_str().unwrap()]).unwrap();
        assert!(matches!(
            execute(args),
            Err(LangevinError::SweepFailed { failed: 1, total: 2 })
        ));
        assert!(out.join("U=10,mu=1.dat").is_file());
    }
}
