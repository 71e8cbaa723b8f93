//! Factor premia vs. the stance of monetary policy
//!
//! Command-line entry point for the batch analysis. All subcommands read
//! the same four source files and differ only in how far down the
//! pipeline they go.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use factor_stance::analysis::{select_best_lag, DEFAULT_MAX_LAG};
use factor_stance::data::loader;
use factor_stance::pipeline::{self, PipelineConfig, STANCE_COLUMN};
use factor_stance::stance::compute_stance;

#[derive(Parser)]
#[command(name = "factor_stance")]
#[command(about = "Relates factor premia to the stance of US monetary policy")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Source files shared by every subcommand.
#[derive(Args)]
struct Sources {
    /// Monthly federal funds rate CSV (FRED FEDFUNDS)
    #[arg(long, default_value = "data/FEDFUNDS.csv")]
    fed_funds: PathBuf,

    /// Quarterly Laubach-Williams neutral real rate CSV
    #[arg(long, default_value = "data/r_star.csv")]
    neutral_rate: PathBuf,

    /// Quarterly SPF 10-year CPI inflation expectations CSV
    #[arg(long, default_value = "data/inflation.csv")]
    inflation: PathBuf,

    /// Century-of-factor-premia monthly returns CSV
    #[arg(long, default_value = "data/factor_premia.csv")]
    premia: PathBuf,

    /// Preamble rows before the factor premia header
    #[arg(long, default_value = "18")]
    premia_skip_rows: usize,

    /// First premia column to exclude; all earlier columns are features
    #[arg(long, default_value = "All Stock Selection Value")]
    feature_cutoff: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the MPSTANCE series and write it to a CSV
    Stance {
        #[command(flatten)]
        sources: Sources,

        /// Output CSV path
        #[arg(short, long, default_value = "mpstance.csv")]
        output: PathBuf,
    },

    /// Select the best Granger lag for each factor premium
    Lags {
        #[command(flatten)]
        sources: Sources,

        /// Largest lag to search
        #[arg(long, default_value_t = DEFAULT_MAX_LAG)]
        max_lag: usize,
    },

    /// Run the full regression analysis and print the report
    Analyze {
        #[command(flatten)]
        sources: Sources,

        /// Largest lag to search
        #[arg(long, default_value_t = DEFAULT_MAX_LAG)]
        max_lag: usize,

        /// Folds for the cross-validated stepwise pass
        #[arg(long, default_value = "5")]
        cv_folds: usize,
    },
}

impl Sources {
    fn into_config(self) -> PipelineConfig {
        let mut config = PipelineConfig::new(
            self.fed_funds,
            self.neutral_rate,
            self.inflation,
            self.premia,
        );
        config.premia_skip_rows = self.premia_skip_rows;
        config.feature_cutoff = Some(self.feature_cutoff);
        config
    }
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Stance { sources, output } => {
            let config = sources.into_config();
            let (inputs, _) = pipeline::load_inputs(&config)?;
            let stance = compute_stance(&inputs)?;
            info!(rows = stance.len(), "computed stance series");
            loader::save_series_csv(&stance, &output)?;
            println!("wrote {} rows to {}", stance.len(), output.display());
        }

        Commands::Lags { sources, max_lag } => {
            let config = sources.into_config();
            let (inputs, premia) = pipeline::load_inputs(&config)?;
            let stance = compute_stance(&inputs)?;

            let features =
                factor_stance::pipeline::premia_feature_columns(&premia, config.feature_cutoff.as_deref())?;
            let monthly = factor_stance::Panel::from_series(&stance).inner_join(&premia)?;
            let target = monthly.column_dense(STANCE_COLUMN)?;

            println!("{:<40} {:>5} {:>12}", "column", "lag", "p-value");
            for name in &features {
                let x = monthly.column_dense(name)?;
                let best = select_best_lag(&x, &target, max_lag)?;
                println!("{:<40} {:>5} {:>12.6}", name, best.lag, best.p_value);
            }
        }

        Commands::Analyze {
            sources,
            max_lag,
            cv_folds,
        } => {
            let mut config = sources.into_config();
            config.max_lag = max_lag;
            config.cv_folds = cv_folds;

            let report = pipeline::run(&config)?;
            println!("{}", report.render());
        }
    }

    Ok(())
}
