use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use drip::config::{DripConfig, LimiterConfig, LogFormat};
use drip::grpc::GrpcServer;
use drip::ratelimit::SharedLimiter;

/// Per-identity leaky bucket admission control over gRPC.
#[derive(Debug, Parser)]
#[command(name = "drip", version, about)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, env = "DRIP_CONFIG")]
    config: Option<PathBuf>,

    /// Address for the gRPC server
    #[arg(long)]
    grpc_addr: Option<SocketAddr>,

    /// Bucket capacity of the limiter served at startup
    #[arg(long, requires = "leak_rate")]
    capacity: Option<f64>,

    /// Leak rate (units per second) of the limiter served at startup
    #[arg(long, requires = "capacity")]
    leak_rate: Option<f64>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    /// Apply command line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut DripConfig) {
        if let Some(addr) = self.grpc_addr {
            config.server.grpc_addr = addr;
        }
        if let (Some(capacity), Some(leak_rate)) = (self.capacity, self.leak_rate) {
            config.limiter = Some(LimiterConfig {
                capacity,
                leak_rate,
            });
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = DripConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    if cli.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    init_tracing(config.logging.format);

    info!("Starting Drip Leaky Bucket Service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(grpc_addr = %config.server.grpc_addr, "Configuration loaded");

    let limiter = match &config.limiter {
        Some(params) => {
            let state = params.build()?;
            info!(limiter = %state, "Limiter initialized");
            SharedLimiter::with_state(state)
        }
        None => {
            info!("No limiter configured, waiting for a Configure call");
            SharedLimiter::new()
        }
    };

    let grpc_server = GrpcServer::new(config.server.grpc_addr, Arc::new(limiter));

    info!("Starting gRPC server on {}", config.server.grpc_addr);

    // Run the server with graceful shutdown on Ctrl+C
    grpc_server.serve_with_shutdown(shutdown_signal()).await?;

    info!("Drip Leaky Bucket Service stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
