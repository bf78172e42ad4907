pub mod clap_args;
pub mod cleanup;
pub mod config;
pub mod hypervisor;
pub mod iobench;
pub mod lifecycle;
pub mod precondition;
pub mod report;
pub mod scoring;

use anyhow::Context;
use cleanup::{Cleanup, CleanupGuard};
use colored::Colorize;
use config::RunConfig;
use hypervisor::Hypervisor;
use lifecycle::Timings;
use std::sync::Arc;
use tracing::info;

/// Drives a whole benchmark run: precondition check, stale-resource
/// sweep, the six timed lifecycle steps, the optional I/O phase and the
/// report. The cleanup guard is established up front so the reserved VMs
/// are torn down on every exit path out of this function.
pub fn run(
    config: &RunConfig,
    hypervisor: Arc<dyn Hypervisor + Send + Sync>,
    cleanup: Arc<Cleanup>,
) -> anyhow::Result<Timings> {
    let _guard = CleanupGuard::new(cleanup);

    let listing = hypervisor
        .storage_status()
        .context("Failed to query storage status")?;
    precondition::check_storage(&listing, &config.storage).map_err(anyhow::Error::new)?;
    println!(
        "{} {}",
        "benchmarking storage pool".green(),
        config.storage
    );
    info!(
        "pool {} active, test size {} ({} bytes)",
        config.storage, config.test_size, config.test_size_bytes
    );

    cleanup::clear_stale(hypervisor.as_ref(), config.clone_vmid, config.test_vmid)?;

    let mut timings = Timings::default();
    lifecycle::run_lifecycle_steps(hypervisor.as_ref(), config, &mut timings)?;

    if config.io_tests {
        iobench::run_io_benchmarks(hypervisor.as_ref(), config, &mut timings)?;
    }

    report::render_summary(&timings);

    if let Some(path) = &config.output {
        match report::write_report(config, &timings, path) {
            Ok(()) => println!("{} {}", "report written to".green(), path.display()),
            Err(err) => println!(
                "{}",
                format!("warning: failed to write report: {:#}", err).yellow()
            ),
        }
    }

    Ok(timings)
}
