use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author = "Oliver Winks (@ohuu)", version, about = "Storage benchmark for Proxmox VE hosts", long_about = None)]
pub struct Args {
    /// Name of the storage pool to benchmark
    pub storage: Option<String>,

    /// Run fio I/O benchmarks against the test volume
    #[arg(long)]
    pub with_io: bool,

    /// Size of the test volume, e.g. 10G or 512M
    #[arg(long)]
    pub size: Option<String>,

    /// Write a JSON report to the given path
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// VM id reserved for the test instance (the clone uses vmid + 1)
    #[arg(long)]
    pub vmid: Option<u32>,

    /// Verbose mode (-v, --verbose)
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn parse() -> Args {
    Args::parse()
}
