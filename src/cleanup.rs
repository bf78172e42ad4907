use crate::hypervisor::Hypervisor;
use anyhow::Context;
use colored::Colorize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{info, warn};

/// Removes any stale benchmark VMs left behind by a previous run. Finding
/// one is a warning, not an error; the run continues once it is gone.
pub fn clear_stale(
    hypervisor: &dyn Hypervisor,
    clone_vmid: u32,
    test_vmid: u32,
) -> anyhow::Result<()> {
    for vmid in [clone_vmid, test_vmid] {
        if hypervisor.vm_exists(vmid) {
            println!(
                "{}",
                format!("warning: stale benchmark VM {} found, removing", vmid).yellow()
            );
            hypervisor
                .destroy_vm(vmid)
                .context(format!("Failed to remove stale benchmark VM {}", vmid))?;
        }
    }

    Ok(())
}

/// Exit-time teardown for the two reserved benchmark VMs. Shared between
/// the run's drop guard and the interrupt handler; runs at most once, and
/// never raises (a VM may legitimately be gone already).
pub struct Cleanup {
    hypervisor: Arc<dyn Hypervisor + Send + Sync>,
    // clone first, then the test VM it was cloned from
    vmids: [u32; 2],
    done: AtomicBool,
}

impl Cleanup {
    pub fn new(
        hypervisor: Arc<dyn Hypervisor + Send + Sync>,
        clone_vmid: u32,
        test_vmid: u32,
    ) -> Self {
        Self {
            hypervisor,
            vmids: [clone_vmid, test_vmid],
            done: AtomicBool::new(false),
        }
    }

    pub fn run(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }

        for vmid in self.vmids {
            if !self.hypervisor.vm_exists(vmid) {
                continue;
            }
            match self.hypervisor.destroy_vm(vmid) {
                Ok(()) => info!("removed benchmark VM {}", vmid),
                Err(err) => warn!("failed to remove benchmark VM {}\n{}", vmid, err),
            }
        }
    }
}

/// Guarantees teardown on every exit path out of the run.
pub struct CleanupGuard(Arc<Cleanup>);

impl CleanupGuard {
    pub fn new(cleanup: Arc<Cleanup>) -> Self {
        Self(cleanup)
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.0.run();
    }
}
