use crate::{config::RunConfig, hypervisor::Hypervisor, lifecycle::Timings};
use colored::Colorize;
use serde_json::Value;
use std::{path::Path, thread, time::Duration};
use subprocess::{Exec, NullFile};
use tracing::{debug, warn};

/// Seconds to wait after starting or stopping the test VM before touching
/// its block device.
pub const SETTLE_SECS: u64 = 5;

const JOB_SIZE: &str = "1G";

#[derive(Debug, Clone, Copy)]
pub enum MetricKind {
    WriteBandwidth,
    ReadBandwidth,
    ReadIops,
    WriteIops,
}

struct FioJob {
    metric: &'static str,
    name: &'static str,
    rw: &'static str,
    bs: &'static str,
    kind: MetricKind,
}

const FIO_JOBS: &[FioJob] = &[
    FioJob {
        metric: "seq_write_mbps",
        name: "seq-write",
        rw: "write",
        bs: "1M",
        kind: MetricKind::WriteBandwidth,
    },
    FioJob {
        metric: "seq_read_mbps",
        name: "seq-read",
        rw: "read",
        bs: "1M",
        kind: MetricKind::ReadBandwidth,
    },
    FioJob {
        metric: "rand_read_iops",
        name: "rand-read",
        rw: "randread",
        bs: "4k",
        kind: MetricKind::ReadIops,
    },
    FioJob {
        metric: "rand_write_iops",
        name: "rand-write",
        rw: "randwrite",
        bs: "4k",
        kind: MetricKind::WriteIops,
    },
];

/// Runs the four fixed fio workloads against the test VM's raw volume
/// device. Nothing in here is fatal: a missing fio binary or an
/// unresolvable device skips the phase, and a failed workload records a
/// zero measurement and moves on.
pub fn run_io_benchmarks(
    hypervisor: &dyn Hypervisor,
    config: &RunConfig,
    timings: &mut Timings,
) -> anyhow::Result<()> {
    if !hypervisor.io_generator_available() {
        println!(
            "{}",
            "warning: fio not found, skipping I/O benchmarks".yellow()
        );
        return Ok(());
    }

    if let Err(err) = hypervisor.start_vm(config.test_vmid) {
        println!(
            "{}",
            "warning: could not start test VM, skipping I/O benchmarks".yellow()
        );
        warn!("start failed for VM {}\n{}", config.test_vmid, err);
        return Ok(());
    }
    thread::sleep(Duration::from_secs(SETTLE_SECS));

    let device = match hypervisor.volume_device(config.test_vmid) {
        Ok(path) if path.exists() => path,
        Ok(path) => {
            println!(
                "{}",
                format!(
                    "warning: device {} does not exist, skipping I/O benchmarks",
                    path.display()
                )
                .yellow()
            );
            stop_and_settle(hypervisor, config.test_vmid);
            return Ok(());
        }
        Err(err) => {
            println!(
                "{}",
                "warning: could not resolve volume device, skipping I/O benchmarks".yellow()
            );
            warn!("device resolution failed\n{}", err);
            stop_and_settle(hypervisor, config.test_vmid);
            return Ok(());
        }
    };

    for job in FIO_JOBS {
        println!("> running {}", job.name.green());
        let value = run_fio_job(&device, job);
        timings.record(job.metric, value);
    }

    stop_and_settle(hypervisor, config.test_vmid);
    Ok(())
}

fn stop_and_settle(hypervisor: &dyn Hypervisor, vmid: u32) {
    if let Err(err) = hypervisor.stop_vm(vmid) {
        warn!("stop failed for VM {}\n{}", vmid, err);
    }
    thread::sleep(Duration::from_secs(SETTLE_SECS));
}

/// A failed invocation degrades to a zero measurement rather than
/// aborting the remaining workloads.
fn run_fio_job(device: &Path, job: &FioJob) -> f64 {
    let args = vec![
        format!("--name={}", job.name),
        format!("--filename={}", device.display()),
        format!("--rw={}", job.rw),
        format!("--bs={}", job.bs),
        format!("--size={}", JOB_SIZE),
        "--direct=1".to_string(),
        "--numjobs=1".to_string(),
        "--ioengine=libaio".to_string(),
        "--group_reporting".to_string(),
        "--output-format=json".to_string(),
    ];
    let capture = Exec::cmd("fio").args(&args).stderr(NullFile).capture();

    match capture {
        Ok(data) if data.exit_status.success() => {
            parse_fio_metric(&data.stdout_str(), job.kind)
        }
        _ => {
            warn!("fio {} failed, recording 0", job.name);
            0.0
        }
    }
}

/// Pulls the requested metric out of fio's JSON output, defaulting to
/// zero when the output is malformed or the field is absent. Bandwidth
/// is reported by fio in KiB/s and normalized here to MB/s.
pub fn parse_fio_metric(output: &str, kind: MetricKind) -> f64 {
    serde_json::from_str::<Value>(output)
        .ok()
        .and_then(|json| extract_metric(&json, kind))
        .unwrap_or_else(|| {
            debug!("fio output missing expected field, recording 0");
            0.0
        })
}

fn extract_metric(json: &Value, kind: MetricKind) -> Option<f64> {
    let job = json.get("jobs")?.get(0)?;

    match kind {
        MetricKind::WriteBandwidth => {
            let kib = job.get("write")?.get("bw")?.as_f64()?;
            Some(kib / 1024.0)
        }
        MetricKind::ReadBandwidth => {
            let kib = job.get("read")?.get("bw")?.as_f64()?;
            Some(kib / 1024.0)
        }
        MetricKind::ReadIops => job.get("read")?.get("iops")?.as_f64(),
        MetricKind::WriteIops => job.get("write")?.get("iops")?.as_f64(),
    }
}
