use crate::{config::RunConfig, hypervisor::Hypervisor};
use anyhow::Context;
use colored::Colorize;
use std::time::Instant;
use tracing::info;

pub const SNAPSHOT_NAME: &str = "benchmark-snap";
pub const RESIZE_INCREMENT: &str = "+2G";

/// Measurements collected over a run, keyed by metric name. Insertion
/// order is preserved for rendering; an entry is never overwritten once
/// its measurement step has run.
#[derive(Debug, Default)]
pub struct Timings {
    entries: Vec<(String, f64)>,
}

impl Timings {
    pub fn record(&mut self, metric: &str, value: f64) {
        if self.get(metric).is_none() {
            self.entries.push((metric.to_string(), value));
        }
    }

    pub fn get(&self, metric: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name == metric)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runs the six storage lifecycle steps in fixed order, recording the
/// elapsed wall-clock seconds of each. Every step is fatal on failure;
/// the first failure aborts the run and leaves teardown to the cleanup
/// guard.
pub fn run_lifecycle_steps(
    hypervisor: &dyn Hypervisor,
    config: &RunConfig,
    timings: &mut Timings,
) -> anyhow::Result<()> {
    let size_mb = config.test_size_bytes / (1024 * 1024);

    time_step(timings, "vm_create", || {
        hypervisor.create_vm(config.test_vmid)
    })?;
    time_step(timings, "volume_create", || {
        hypervisor.alloc_volume(config.test_vmid, &config.storage, size_mb)
    })?;
    time_step(timings, "snapshot_create", || {
        hypervisor.create_snapshot(config.test_vmid, SNAPSHOT_NAME)
    })?;
    time_step(timings, "clone_operation", || {
        hypervisor.clone_vm(config.test_vmid, config.clone_vmid)
    })?;
    time_step(timings, "volume_resize", || {
        hypervisor.resize_volume(config.test_vmid, RESIZE_INCREMENT)
    })?;
    time_step(timings, "snapshot_delete", || {
        hypervisor.delete_snapshot(config.test_vmid, SNAPSHOT_NAME)
    })?;

    Ok(())
}

fn time_step<F>(timings: &mut Timings, metric: &str, op: F) -> anyhow::Result<()>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    println!("> running {}", metric.green());

    let start = Instant::now();
    op().context(format!("{} failed", metric))?;
    let elapsed = start.elapsed().as_secs_f64();

    info!("{} took {:.3}s", metric, elapsed);
    timings.record(metric, elapsed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timings_preserve_insertion_order() {
        let mut timings = Timings::default();
        timings.record("vm_create", 1.2);
        timings.record("volume_create", 4.0);
        timings.record("snapshot_create", 0.8);

        let names = timings.iter().map(|(name, _)| name).collect::<Vec<_>>();
        assert_eq!(names, vec!["vm_create", "volume_create", "snapshot_create"]);
    }

    #[test]
    fn timings_never_overwrite() {
        let mut timings = Timings::default();
        timings.record("vm_create", 1.2);
        timings.record("vm_create", 9.9);

        assert_eq!(timings.get("vm_create"), Some(1.2));
    }

    #[test]
    fn failing_step_records_nothing_and_propagates() {
        let mut timings = Timings::default();
        let res = time_step(&mut timings, "vm_create", || {
            Err(anyhow::anyhow!("qm create exited with 255"))
        });

        assert!(res.is_err());
        assert!(timings.is_empty());
    }
}
