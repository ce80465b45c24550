//! Two-phase cache drill against the in-process heap store.
//!
//! Run with: cargo run --bin drill --release -- [duration-secs] [report-path]
//!
//! Loads the full key domain sequentially, then hammers it with Gaussian
//! reads for the requested duration. Latency percentiles per outcome category
//! go to stdout; pass a report path to also persist the JSON artifact.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use cachedrill::prelude::*;

fn parse_args() -> Result<RunConfig, String> {
    let mut config = RunConfig::default();
    let mut args = std::env::args().skip(1);

    if let Some(secs) = args.next() {
        let secs: u64 = secs
            .parse()
            .map_err(|_| format!("invalid duration-secs: {}", secs))?;
        config.test_duration = Duration::from_secs(secs);
    }
    if let Some(path) = args.next() {
        config.report_output_path = Some(path.into());
    }
    // Mirror a read-side benchmark report: only hits and misses.
    config.reported_categories = Some(
        [OutcomeCategory::GetHit, OutcomeCategory::GetMiss]
            .into_iter()
            .collect(),
    );
    Ok(config)
}

fn print_summary(summary: &RunSummary) {
    for phase in &summary.phases {
        println!(
            "phase {:<6} {:>10} ops in {:.2?} ({:.0} ops/s)",
            phase.phase,
            phase.total_operations,
            phase.elapsed,
            phase.ops_per_sec()
        );
        for stats in phase.categories().iter().filter(|s| s.count > 0) {
            println!(
                "  {:<10} count={:<10} p50={}us p95={}us p99={}us max={}us",
                stats.category.as_str(),
                stats.count,
                stats.latency.p50_us,
                stats.latency.p95_us,
                stats.latency.p99_us,
                stats.latency.max_us
            );
        }
    }
    println!(
        "sampler: {} snapshots, {} skipped cycles",
        summary.snapshots.len(),
        summary.skipped_sampling_cycles
    );
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        },
    };

    let cache = Arc::new(HeapStore::new(config.copy_policy));
    let runner = match Runner::new(config, cache) {
        Ok(runner) => runner,
        Err(err) => {
            eprintln!("invalid configuration: {}", err);
            return ExitCode::FAILURE;
        },
    };

    let summary = runner.run_to_completion();
    print_summary(&summary);

    if let Some(err) = &summary.error {
        eprintln!("run aborted: {}", err);
        return ExitCode::FAILURE;
    }
    if let Some(err) = &summary.report_error {
        eprintln!("report write failed: {}", err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
