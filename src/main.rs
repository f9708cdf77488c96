mod cli;

use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use order_bench::analysis::{RunSummary, summarize_sweep};
use order_bench::prelude::*;
use order_bench::{CellOutcome, HarnessConfig, HttpIssuer, RequestIssuer, ResultWriter, run_sweep};

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!(
        "{} v{}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION")
    );

    let cli = cli::Cli::parse();
    let mut config = HarnessConfig::load(cli.config.as_deref())?;
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(base_url) = cli.base_url {
        config.target.base_url = base_url;
    }
    config.validate()?;

    match cli.command {
        Some(cli::Commands::Summary) => print_summary(&config),
        None => {
            // One runtime thread per simulated client.
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(config.run.workers as usize)
                .enable_all()
                .build()?;
            runtime.block_on(run(config))
        }
    }
}

async fn run(config: HarnessConfig) -> Result<()> {
    let writer = ResultWriter::new(&config.output_dir);

    let total_cells = config.sweep.cells().len() as u64;
    let pb = ProgressBar::new(total_cells);
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}") {
        pb.set_style(style.progress_chars("=>-"));
    }
    let pb_clone = pb.clone();

    let report = run_sweep(
        &config,
        || {
            let issuer = HttpIssuer::new(&config.target, config.run.workers)?;
            Ok(Arc::new(issuer) as Arc<dyn RequestIssuer>)
        },
        &writer,
        Some(move |outcome: &CellOutcome| {
            pb_clone.inc(1);
            pb_clone.set_message(format!(
                "{} | GET: {} | POST: {} | failed: {}",
                outcome.cell, outcome.get_samples, outcome.post_samples, outcome.failures
            ));
        }),
    )
    .await?;
    pb.finish_with_message("Done!");

    let failures: u64 = report.cells.iter().map(|c| c.failures).sum();
    info!(
        "Sweep finished: {} cells, {} failed requests",
        report.cells.len(),
        failures
    );

    report.ensure_complete()
}

fn print_summary(config: &HarnessConfig) -> Result<()> {
    let fmt_ms = |mean: Option<f64>| -> String {
        match mean {
            Some(ms) => format!("{:.2}ms", ms),
            None => "-".to_string(),
        }
    };

    println!(
        "  {:<12} {:>10} {:>10} {:>8} {:>8}",
        "Cell", "GET avg", "POST avg", "GET n", "POST n"
    );
    for (cell, summary) in summarize_sweep(&config.output_dir, &config.sweep)? {
        match summary {
            Some(RunSummary {
                get_count,
                post_count,
                get_mean_ms,
                post_mean_ms,
            }) => println!(
                "  {:<12} {:>10} {:>10} {:>8} {:>8}",
                cell.to_string(),
                fmt_ms(get_mean_ms),
                fmt_ms(post_mean_ms),
                get_count,
                post_count
            ),
            None => println!("  {:<12} {:>10}", cell.to_string(), "no data"),
        }
    }
    Ok(())
}
