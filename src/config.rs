use crate::clap_args::Args;
use std::path::PathBuf;
use sysinfo::System;
use tracing::warn;

pub const DEFAULT_STORAGE: &str = "local-lvm";
pub const DEFAULT_SIZE_SPEC: &str = "10G";
pub const DEFAULT_SIZE_BYTES: u64 = 10 * 1024 * 1024 * 1024;

/// VM id reserved for the benchmark instance. The clone always takes the
/// next id up. Both must be free on the host; the cleanup guard checks and
/// clears them before the run starts.
pub const TEST_VMID: u32 = 9998;

// ******** ******** ********
// **    CONFIGURATION     **
// ******** ******** ********
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub storage: String,
    pub test_size: String,
    pub test_size_bytes: u64,
    pub io_tests: bool,
    pub output: Option<PathBuf>,
    pub node: String,
    pub test_vmid: u32,
    pub clone_vmid: u32,
}

impl RunConfig {
    pub fn from_args(args: &Args) -> Self {
        let storage = args
            .storage
            .clone()
            .unwrap_or_else(|| DEFAULT_STORAGE.to_string());

        let test_size = args
            .size
            .clone()
            .unwrap_or_else(|| DEFAULT_SIZE_SPEC.to_string());

        let test_size_bytes = match parse_size_spec(&test_size) {
            Some(bytes) => bytes,
            None => {
                warn!(
                    "unrecognised size spec '{}', falling back to {}",
                    test_size, DEFAULT_SIZE_SPEC
                );
                DEFAULT_SIZE_BYTES
            }
        };

        let test_vmid = args.vmid.unwrap_or(TEST_VMID);

        Self {
            storage,
            test_size,
            test_size_bytes,
            io_tests: args.with_io,
            output: args.output.clone(),
            node: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            test_vmid,
            clone_vmid: test_vmid + 1,
        }
    }
}

/// Converts a size spec of the form `<N>G` or `<N>M` into bytes. Returns
/// None for any other suffix, or when the byte count would not fit in a
/// u64, so the caller can keep its prior default.
pub fn parse_size_spec(spec: &str) -> Option<u64> {
    let spec = spec.trim();
    let suffix = spec.chars().next_back()?;
    let number = &spec[..spec.len() - suffix.len_utf8()];
    let n = number.parse::<u64>().ok()?;

    match suffix {
        'G' => n.checked_mul(1024 * 1024 * 1024),
        'M' => n.checked_mul(1024 * 1024),
        _ => None,
    }
}
