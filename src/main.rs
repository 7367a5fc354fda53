// src/main.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clinical_synth::adjust::adjust_dataset;
use clinical_synth::convert::convert_dir;
use clinical_synth::subsample::{subsample, CohortRequest};
use clinical_synth::{rules, Dataset, EntityType, PrepConfig};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Prepare synthetic clinical datasets")]
enum Command {
    /// Convert generator JSON record files to CSV tables
    Convert {
        /// Folder with <Entity>.json files
        #[clap(short, long)]
        input: PathBuf,

        /// Folder to write <Entity>.csv files to
        #[clap(short, long)]
        output: PathBuf,

        /// JSON configuration; written with defaults if missing
        #[clap(short, long)]
        config: Option<PathBuf>,
    },

    /// Apply the conditional field rules to a CSV dataset in place
    Clean {
        /// Folder with <Entity>.csv files
        #[clap(short, long)]
        dataset: PathBuf,

        /// JSON configuration; written with defaults if missing
        #[clap(short, long)]
        config: Option<PathBuf>,
    },

    /// Field rules plus diagnosis and treatment date consistency, in place
    Adjust {
        /// Folder with <Entity>.csv files
        #[clap(short, long)]
        dataset: PathBuf,

        /// JSON configuration; written with defaults if missing
        #[clap(short, long)]
        config: Option<PathBuf>,
    },

    /// Keep a random donor cohort and every row referencing it
    Subsample {
        /// Folder with <Entity>.csv files
        #[clap(short, long)]
        input: PathBuf,

        /// Folder for the smaller dataset
        #[clap(short, long)]
        output: PathBuf,

        /// Number of donors to draw
        #[clap(short = 'n', long)]
        donors: usize,

        /// Random seed
        #[clap(short, long, default_value = "42")]
        seed: u64,

        /// Donors always kept (comma separated), e.g. edge case fixtures
        #[clap(short, long, value_delimiter = ',')]
        keep: Option<Vec<String>>,
    },
}

fn load_config(path: Option<&Path>) -> Result<PrepConfig> {
    match path {
        Some(path) => PrepConfig::load_or_init(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(PrepConfig::default()),
    }
}

fn run_convert(input: &Path, output: &Path, config: &PrepConfig) -> Result<()> {
    let dataset = convert_dir(input, config)
        .with_context(|| format!("converting records in {}", input.display()))?;
    dataset
        .save(output)
        .with_context(|| format!("writing tables to {}", output.display()))?;
    println!("Converted {} record files into {}", dataset.tables.len(), output.display());
    Ok(())
}

fn run_clean(dir: &Path, config: &PrepConfig) -> Result<()> {
    let mut dataset = Dataset::load(dir).with_context(|| format!("loading {}", dir.display()))?;
    let changed = rules::apply_all(&mut dataset, config);
    dataset.save(dir).with_context(|| format!("writing {}", dir.display()))?;
    println!("Field rules rewrote {} cells in {}", changed, dir.display());
    Ok(())
}

fn run_adjust(dir: &Path, config: &PrepConfig) -> Result<()> {
    let mut dataset = Dataset::load(dir).with_context(|| format!("loading {}", dir.display()))?;
    let changed = rules::apply_all(&mut dataset, config);
    info!("field rules rewrote {} cells", changed);

    let summary = adjust_dataset(&mut dataset, config)
        .with_context(|| format!("adjusting intervals in {}", dir.display()))?;
    dataset.save(dir).with_context(|| format!("writing {}", dir.display()))?;
    println!("{}", summary);
    Ok(())
}

fn run_subsample(input: &Path, output: &Path, request: &CohortRequest) -> Result<()> {
    let dataset = Dataset::load(input).with_context(|| format!("loading {}", input.display()))?;
    let small = subsample(&dataset, request)?;
    small
        .save(output)
        .with_context(|| format!("writing {}", output.display()))?;
    let kept = small.table(EntityType::Donor).map(|t| t.len()).unwrap_or(0);
    println!("Wrote a {} donor cohort to {}", kept, output.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinical_synth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cmd = Command::parse();

    match cmd {
        Command::Convert { input, output, config } => {
            let config = load_config(config.as_deref())?;
            run_convert(&input, &output, &config)?;
        }
        Command::Clean { dataset, config } => {
            let config = load_config(config.as_deref())?;
            run_clean(&dataset, &config)?;
        }
        Command::Adjust { dataset, config } => {
            let config = load_config(config.as_deref())?;
            run_adjust(&dataset, &config)?;
        }
        Command::Subsample { input, output, donors, seed, keep } => {
            let request = CohortRequest { donors, seed, keep: keep.unwrap_or_default() };
            run_subsample(&input, &output, &request)?;
        }
    }

    Ok(())
}
