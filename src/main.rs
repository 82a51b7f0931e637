//! mdns-reflector CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mdns_reflector::config::DEFAULT_CONFIG_PATH;
use mdns_reflector::diagnostics::{self, DEFAULT_DEBUG_PORT};
use mdns_reflector::net::capture;
use mdns_reflector::{InterfaceInfo, MdnsReflector, PoolResolver, ReflectorConfig, Result};

/// mDNS reflector - shares Bonjour services between VLANs in the same pool.
#[derive(Parser, Debug)]
#[command(name = mdns_reflector::PACKAGE)]
#[command(version)]
#[command(about = "Reflects mDNS between VLANs on a trunk port")]
#[command(
    long_about = "Captures mDNS on an 802.1Q trunk and re-injects queries and responses into the VLANs that share a pool, so Bonjour discovery works across VLAN boundaries."
)]
struct Args {
    /// Path to YAML configuration file.
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Serve statistics on localhost.
    #[arg(long)]
    debug: bool,

    /// Port for the statistics endpoint.
    #[arg(long, default_value_t = DEFAULT_DEBUG_PORT)]
    debug_port: u16,

    /// Don't actually inject frames, just log what would happen.
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Log every reflected frame.
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    let default = if verbose {
        "mdns_reflector=debug"
    } else {
        "mdns_reflector=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Resolve when the process is asked to stop.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn run(args: Args) -> Result<()> {
    let config = ReflectorConfig::from_yaml_file(&args.config)?;
    let resolver = Arc::new(PoolResolver::from_config(&config)?);
    info!(
        pools = resolver.pool_count(),
        devices = resolver.device_count(),
        "Pools built"
    );

    let (source, sink) = capture::open(&config.net_interface)?;
    let interface = InterfaceInfo::from_name(&config.net_interface)?;
    info!("{}", interface);

    let reflector = MdnsReflector::new(resolver, interface.mac).with_dry_run(args.dry_run);

    if args.debug {
        match diagnostics::bind(args.debug_port).await {
            Ok(listener) => {
                tokio::spawn(diagnostics::serve(listener, Arc::clone(reflector.stats())));
            }
            Err(err) => error!("Cannot start diagnostics endpoint: {}", err),
        }
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Received shutdown signal");
        flag.store(true, Ordering::SeqCst);
    });

    reflector.run(source, sink, shutdown).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
