// ========================================================================================
//
//                      THE CLASS-PRIOR BASELINE: SPHERE-BASELINE
//
// ========================================================================================
//
// Command-line front end for the library. It resolves the run configuration (defaults,
// then an optional TOML file, then flags), hands it to one of the two pipelines and
// prints a human-readable summary.
//
// - `evaluate`: estimate the class prior from the training recordings and report its
//   weighted Brier score on each of them.
// - `submit`: estimate the same prior and write it as the prediction for every window
//   of every test recording.

use clap::{Args, Parser, Subcommand};
use sphere_baseline::config::{BaselineConfig, RecordingRange};
use sphere_baseline::pipeline::{self, EvaluationSummary, SubmissionSummary};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

#[derive(Parser)]
#[command(
    name = "sphere-baseline",
    version,
    about = "Class-prior baseline and weighted Brier scoring for SPHERE activity recognition"
)]
struct Cli {
    #[command(flatten)]
    overrides: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigArgs {
    /// TOML file with data_dir, submission_file and [train] first/last
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding annotations.json, class_weights.json, train/ and test/
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// First training recording id (inclusive)
    #[arg(long, global = true, value_name = "ID")]
    train_first: Option<u32>,

    /// Last training recording id (inclusive)
    #[arg(long, global = true, value_name = "ID")]
    train_last: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score the class prior against the training targets
    Evaluate,
    /// Write the class prior as a submission for every test window
    Submit {
        /// Output path (defaults to <data_dir>/<submission_file>)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn resolve_config(args: ConfigArgs) -> Result<BaselineConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => BaselineConfig::load(path)?,
        None => BaselineConfig::default(),
    };

    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    config.train = RecordingRange::new(
        args.train_first.unwrap_or(config.train.first),
        args.train_last.unwrap_or(config.train.last),
    )?;
    Ok(config)
}

fn evaluate(config: &BaselineConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Evaluating class prior on training recordings {}..={} in '{}'",
        config.train.first,
        config.train.last,
        config.data_dir.display()
    );
    let summary = pipeline::run_evaluation(config)?;
    print_evaluation(&summary);
    Ok(())
}

fn print_prior(label_names: &[String], prior: &ndarray::Array1<f64>) {
    println!("Class prior:");
    for (name, p) in label_names.iter().zip(prior.iter()) {
        println!("  {name:<16} {p:.6}");
    }
}

fn print_evaluation(summary: &EvaluationSummary) {
    for recording in &summary.recordings {
        println!(
            "Recording {}: {} windows ({} annotated, {} located), {} of {} samples annotated",
            recording.id,
            recording.windows,
            recording.annotated_windows,
            recording.located_windows,
            recording.annotated_samples,
            recording.samples
        );
    }
    print_prior(&summary.label_names, &summary.prior);
    for (id, score) in &summary.report.per_recording {
        println!("{id} {score}");
    }
    println!("Total Score : {}", summary.report.mean);
}

fn submit(
    config: &BaselineConfig,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Estimating class prior from training recordings {}..={} in '{}'",
        config.train.first,
        config.train.last,
        config.data_dir.display()
    );
    let summary = pipeline::run_submission(config, output)?;
    print_submission(&summary);
    Ok(())
}

fn print_submission(summary: &SubmissionSummary) {
    print_prior(&summary.label_names, &summary.prior);
    println!(
        "Submission saved to: {} ({} rows across {} test recordings)",
        summary.path.display(),
        summary.rows,
        summary.recordings
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let start_time = Instant::now();

    let Cli { overrides, command } = Cli::parse();
    let result = resolve_config(overrides).and_then(|config| match command {
        Commands::Evaluate => evaluate(&config),
        Commands::Submit { output } => submit(&config, output),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }

    eprintln!("> Task completed in {:.2?}", start_time.elapsed());
}
