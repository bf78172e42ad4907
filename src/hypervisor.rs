use anyhow::{anyhow, Context};
use std::path::PathBuf;
use subprocess::{Exec, NullFile};
use tracing::debug;

/// Seam over the Proxmox command line tools. Every call blocks until the
/// external command returns; there is no timeout wrapper.
pub trait Hypervisor {
    /// Raw `pvesm status` listing (one pool per line).
    fn storage_status(&self) -> anyhow::Result<String>;

    fn vm_exists(&self, vmid: u32) -> bool;
    fn create_vm(&self, vmid: u32) -> anyhow::Result<()>;
    fn alloc_volume(&self, vmid: u32, storage: &str, size_mb: u64) -> anyhow::Result<()>;
    fn create_snapshot(&self, vmid: u32, name: &str) -> anyhow::Result<()>;
    fn delete_snapshot(&self, vmid: u32, name: &str) -> anyhow::Result<()>;
    fn clone_vm(&self, src_vmid: u32, dst_vmid: u32) -> anyhow::Result<()>;
    fn resize_volume(&self, vmid: u32, increment: &str) -> anyhow::Result<()>;
    fn start_vm(&self, vmid: u32) -> anyhow::Result<()>;
    fn stop_vm(&self, vmid: u32) -> anyhow::Result<()>;

    /// Destroys the VM and purges its volumes.
    fn destroy_vm(&self, vmid: u32) -> anyhow::Result<()>;

    /// Resolves the stable block device path of the benchmark volume.
    fn volume_device(&self, vmid: u32) -> anyhow::Result<PathBuf>;

    /// Whether the external I/O generator is present on this host.
    fn io_generator_available(&self) -> bool;
}

/// Runs the given command synchronously with stdout and stderr suppressed.
fn run_quiet(program: &str, args: &[&str]) -> anyhow::Result<()> {
    debug!("running {} {}", program, args.join(" "));

    let status = Exec::cmd(program)
        .args(args)
        .stdout(NullFile)
        .stderr(NullFile)
        .join()
        .context(format!("Failed to run {}", program))?;

    if status.success() {
        Ok(())
    } else {
        Err(anyhow!(
            "{} {} exited with {:?}",
            program,
            args.join(" "),
            status
        ))
    }
}

/// Runs the given command synchronously and returns its stdout.
fn run_captured(program: &str, args: &[&str]) -> anyhow::Result<String> {
    debug!("running {} {}", program, args.join(" "));

    let capture = Exec::cmd(program)
        .args(args)
        .stderr(NullFile)
        .capture()
        .context(format!("Failed to run {}", program))?;

    if capture.exit_status.success() {
        Ok(capture.stdout_str())
    } else {
        Err(anyhow!(
            "{} {} exited with {:?}",
            program,
            args.join(" "),
            capture.exit_status
        ))
    }
}

/// Finds the volume attached as scsi1 in `qm config` output, e.g.
/// `scsi1: local-lvm:vm-9998-disk-1,size=10G` -> `local-lvm:vm-9998-disk-1`.
fn parse_attached_volume(config_output: &str) -> Option<String> {
    config_output
        .lines()
        .find_map(|line| line.strip_prefix("scsi1:"))
        .map(|rest| rest.trim().split(',').next().unwrap_or("").to_string())
        .filter(|volume| !volume.is_empty())
}

/// Drives the Proxmox `qm` and `pvesm` binaries.
pub struct PveCli;

impl PveCli {
    fn disk_name(vmid: u32) -> String {
        format!("vm-{}-disk-1", vmid)
    }
}

impl Hypervisor for PveCli {
    fn storage_status(&self) -> anyhow::Result<String> {
        run_captured("pvesm", &["status"])
    }

    fn vm_exists(&self, vmid: u32) -> bool {
        Exec::cmd("qm")
            .args(&["status", &vmid.to_string()])
            .stdout(NullFile)
            .stderr(NullFile)
            .join()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn create_vm(&self, vmid: u32) -> anyhow::Result<()> {
        run_quiet(
            "qm",
            &[
                "create",
                &vmid.to_string(),
                "--name",
                "storbench-test",
                "--memory",
                "512",
                "--cores",
                "1",
                "--net0",
                "virtio,bridge=vmbr0",
            ],
        )
    }

    fn alloc_volume(&self, vmid: u32, storage: &str, size_mb: u64) -> anyhow::Result<()> {
        let disk = Self::disk_name(vmid);
        run_quiet(
            "pvesm",
            &[
                "alloc",
                storage,
                &vmid.to_string(),
                &disk,
                &format!("{}M", size_mb),
            ],
        )?;
        run_quiet(
            "qm",
            &[
                "set",
                &vmid.to_string(),
                "--scsi1",
                &format!("{}:{}", storage, disk),
            ],
        )
    }

    fn create_snapshot(&self, vmid: u32, name: &str) -> anyhow::Result<()> {
        run_quiet("qm", &["snapshot", &vmid.to_string(), name])
    }

    fn delete_snapshot(&self, vmid: u32, name: &str) -> anyhow::Result<()> {
        run_quiet("qm", &["delsnapshot", &vmid.to_string(), name])
    }

    fn clone_vm(&self, src_vmid: u32, dst_vmid: u32) -> anyhow::Result<()> {
        run_quiet(
            "qm",
            &[
                "clone",
                &src_vmid.to_string(),
                &dst_vmid.to_string(),
                "--full",
            ],
        )
    }

    fn resize_volume(&self, vmid: u32, increment: &str) -> anyhow::Result<()> {
        run_quiet("qm", &["resize", &vmid.to_string(), "scsi1", increment])
    }

    fn start_vm(&self, vmid: u32) -> anyhow::Result<()> {
        run_quiet("qm", &["start", &vmid.to_string()])
    }

    fn stop_vm(&self, vmid: u32) -> anyhow::Result<()> {
        run_quiet("qm", &["stop", &vmid.to_string()])
    }

    fn destroy_vm(&self, vmid: u32) -> anyhow::Result<()> {
        run_quiet("qm", &["destroy", &vmid.to_string(), "--purge"])
    }

    fn volume_device(&self, vmid: u32) -> anyhow::Result<PathBuf> {
        let config = run_captured("qm", &["config", &vmid.to_string()])?;
        let volume = parse_attached_volume(&config)
            .context(format!("VM {} has no scsi1 volume attached", vmid))?;
        let path = run_captured("pvesm", &["path", &volume])?;
        Ok(PathBuf::from(path.trim()))
    }

    fn io_generator_available(&self) -> bool {
        Exec::cmd("fio")
            .arg("--version")
            .stdout(NullFile)
            .stderr(NullFile)
            .join()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_attached_volume_in_vm_config() {
        let config = "\
boot: c
cores: 1
memory: 512
name: storbench-test
net0: virtio,bridge=vmbr0
scsi1: local-lvm:vm-9998-disk-1,size=10G
smbios1: uuid=7b2c
";
        assert_eq!(
            parse_attached_volume(config),
            Some("local-lvm:vm-9998-disk-1".to_string())
        );
    }

    #[test]
    fn missing_volume_yields_none() {
        assert_eq!(parse_attached_volume("cores: 1\nmemory: 512\n"), None);
        assert_eq!(parse_attached_volume(""), None);
        assert_eq!(parse_attached_volume("scsi1:\n"), None);
    }
}
