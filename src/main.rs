use colored::Colorize;
use std::sync::Arc;
use storbench::{
    clap_args,
    cleanup::Cleanup,
    config::RunConfig,
    hypervisor::{Hypervisor, PveCli},
};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = clap_args::parse();

    let default_filter = if args.verbose {
        "storbench=debug"
    } else {
        "storbench=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = RunConfig::from_args(&args);
    let hypervisor: Arc<dyn Hypervisor + Send + Sync> = Arc::new(PveCli);
    let cleanup = Arc::new(Cleanup::new(
        hypervisor.clone(),
        config.clone_vmid,
        config.test_vmid,
    ));

    // an interrupt must still tear down the reserved VMs before exiting
    {
        let cleanup = cleanup.clone();
        if let Err(err) = ctrlc::set_handler(move || {
            cleanup.run();
            std::process::exit(130);
        }) {
            tracing::warn!("failed to register interrupt handler: {}", err);
        }
    }

    if let Err(err) = storbench::run(&config, hypervisor, cleanup) {
        eprintln!("{} {:#}", "error:".red(), err);
        std::process::exit(1);
    }
}
