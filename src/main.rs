use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use posegen::io::{read_use_counts, write_frames_csv, write_json, write_poses_csv};
use posegen::{GeneratorConfig, LabelSource, LabelTrace, PoseGenerator};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "posegen")]
#[command(about = "Generate seeded pose perturbations for labelled video frames")]
struct Cli {
    /// TOML file with seed, sensors, label schema and rules
    #[arg(long)]
    config: PathBuf,

    /// CSV label trace, one row per frame
    #[arg(long)]
    labels: PathBuf,

    /// Same number of poses for every frame
    #[arg(long, conflicts_with = "use_counts")]
    use_count: Option<u32>,

    /// CSV file with a `use_count` column, one row per frame
    #[arg(long)]
    use_counts: Option<PathBuf>,

    /// Override the configured seed
    #[arg(long)]
    seed: Option<u64>,

    /// Emit one shuffled sequence instead of per-frame lists
    #[arg(long, default_value_t = false)]
    shuffle: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Output file; stdout when omitted
    #[arg(long)]
    out: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("POSEGEN_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn open_output(out: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    match out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create output file: {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = GeneratorConfig::from_toml_file(&cli.config)
        .with_context(|| format!("failed to load config: {}", cli.config.display()))?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let trace = LabelTrace::from_path(&cli.labels)?;
    let use_counts = match (cli.use_count, &cli.use_counts) {
        (Some(n), _) => vec![n; trace.num_datapoints()],
        (None, Some(path)) => read_use_counts(path)?,
        (None, None) => bail!("either --use-count or --use-counts is required"),
    };

    let mut generator = PoseGenerator::from_config(&config)?;
    let sensors = generator.sensor_names().to_vec();
    let writer = open_output(cli.out.as_ref())?;

    if cli.shuffle {
        let poses = generator.plan_shuffled(&use_counts, &trace)?;
        match cli.format {
            OutputFormat::Csv => write_poses_csv(writer, &poses, &sensors)?,
            OutputFormat::Json => write_json(writer, &poses)?,
        }
    } else {
        let frames = generator.plan_all_frames(&use_counts, &trace)?;
        match cli.format {
            OutputFormat::Csv => write_frames_csv(writer, &frames, &sensors)?,
            OutputFormat::Json => write_json(writer, &frames)?,
        }
    }

    Ok(())
}
