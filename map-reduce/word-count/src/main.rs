// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use anyhow::{Context, Result};
use clap::Parser;
use map_reduce_core::{AtomicShutdownSignal, JobConfig, JobReport};
use map_reduce_word_count::word_count_job;
use running_median::running_median_dir;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "word-count")]
#[command(about = "Count words and the running median of words per line", long_about = None)]
#[command(version)]
struct Cli {
    /// Number of lines in each split [default: 2000]
    lines_per_split: Option<usize>,

    /// Directory holding the input text files
    #[arg(long, default_value = "wc_input")]
    input_dir: PathBuf,

    /// Word count output file
    #[arg(short, long, default_value = "wc_output/wc_result.txt")]
    output: PathBuf,

    /// Number of map workers (and of paired spill workers)
    #[arg(short = 'n', long)]
    workers: Option<usize>,

    /// JSON job configuration; command-line flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Disable spill-time pre-aggregation
    #[arg(long)]
    no_combiner: bool,

    /// Keep splits and spill files after the job
    #[arg(long)]
    keep_intermediates: bool,

    /// Running median output file
    #[arg(long, default_value = "wc_output/med_result.txt")]
    median_output: PathBuf,

    /// Only run the word count
    #[arg(long)]
    skip_median: bool,

    /// Print the job report as JSON on stdout
    #[arg(long)]
    report: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn job_config(&self) -> Result<JobConfig> {
        let mut config = match &self.config {
            Some(path) => JobConfig::load(path)
                .with_context(|| format!("failed to load configuration {}", path.display()))?,
            None => JobConfig::default(),
        };

        config.output_path = self.output.clone();
        if let Some(lines) = self.lines_per_split {
            config.lines_per_split = lines;
        }
        if let Some(workers) = self.workers {
            config.num_workers = workers;
        }
        if self.keep_intermediates {
            config.keep_intermediates = true;
        }
        Ok(config)
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_thread_names(verbose >= 1)
        .init();
}

fn print_report(report: &JobReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize job report")?;
    println!("{json}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    fs::create_dir_all(&cli.input_dir)
        .with_context(|| format!("failed to create input directory {}", cli.input_dir.display()))?;

    let config = cli.job_config()?;

    let shutdown = AtomicShutdownSignal::new();
    let handler_signal = shutdown.clone();
    ctrlc::set_handler(move || {
        warn!("interrupt received, shutting down");
        handler_signal.shutdown();
    })
    .context("failed to install Ctrl+C handler")?;

    let report = word_count_job(config, !cli.no_combiner)
        .with_shutdown_signal(shutdown)
        .run(&cli.input_dir)
        .with_context(|| format!("word count over {} failed", cli.input_dir.display()))?;
    info!(
        words = report.merge.groups,
        output = %report.output_path.display(),
        "word count written"
    );

    if !cli.skip_median {
        let lines = running_median_dir(&cli.input_dir, &cli.median_output)
            .context("running median failed")?;
        info!(lines, output = %cli.median_output.display(), "running median written");
    }

    if cli.report {
        print_report(&report)?;
    }
    Ok(())
}
