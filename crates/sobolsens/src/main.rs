use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{WrapErr, bail};
use sobolsens::{EstimateReport, Scenario, init_logging};
use sobolsens_core::EstimateOverrides;

#[derive(Parser, Debug)]
#[command(name = "sobolsens")]
#[command(about = "Quasi-Monte Carlo Sobol' sensitivity analysis")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate lower and total indices for one index set
    Estimate {
        /// Scenario file (YAML)
        scenario: PathBuf,

        /// Parameter indices to study instead of the configured set
        #[arg(short, long, value_delimiter = ',')]
        index_set: Vec<usize>,

        /// Replacement variances, one per parameter
        #[arg(long, value_delimiter = ',')]
        variances: Vec<f64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sweep the coefficient of variation of every parameter
    Sweep {
        /// Scenario file (YAML)
        scenario: PathBuf,

        /// CoV values, overriding the scenario's list
        #[arg(short, long, value_delimiter = ',')]
        cov: Vec<f64>,

        /// Output file, overriding the scenario's; stdout when neither is set
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write an example scenario file
    Init {
        /// Destination path
        path: PathBuf,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(&args.log_level, args.log_file.as_deref())?;

    match args.command {
        Command::Estimate {
            scenario,
            index_set,
            variances,
            json,
        } => {
            let scenario = Scenario::load(&scenario)?;

            let mut overrides = EstimateOverrides::none();
            if !index_set.is_empty() {
                overrides = overrides.with_index_set(index_set.into_iter().collect());
            }
            if !variances.is_empty() {
                overrides = overrides.with_variances(variances);
            }

            let result = scenario.estimate(&overrides)?;
            let studied = match &overrides.index_set {
                Some(set) if !set.is_empty() => set.clone(),
                _ => scenario.estimator.index_set.clone(),
            };
            let report = EstimateReport::new(studied, result);

            if json {
                println!("{}", report.to_json()?);
            } else {
                print!("{}", report.to_text());
            }
        }
        Command::Sweep {
            scenario,
            cov,
            output,
        } => {
            let scenario = Scenario::load(&scenario)?;
            // Neither list set: the sweep runs the estimator's own `cov`
            let covs = if cov.is_empty() {
                scenario.sweep.covs.clone()
            } else {
                cov
            };

            let results = scenario.sweep(&covs)?;
            match output.or_else(|| scenario.sweep.output.clone()) {
                Some(path) => results.write_to(&path)?,
                None => print!("{results}"),
            }
        }
        Command::Init { path, force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to replace it)", path.display());
            }
            Scenario::example()
                .save(&path)
                .wrap_err_with(|| format!("writing example scenario to {}", path.display()))?;
            tracing::info!("wrote example scenario to {}", path.display());
        }
    }

    Ok(())
}
