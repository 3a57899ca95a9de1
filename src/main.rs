use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use rdt_receiver::{constants::*, RdtReceiver, ReceiverConfig};
use tracing_subscriber::EnvFilter;

/// Receive a file over a lossy UDP link and write it out in order.
#[derive(Parser, Debug)]
#[command(name = "rdt-receiver", version, about)]
struct Cli {
    /// Host of the link emulator that forwards ACKs to the sender.
    #[arg(long, default_value = DEFAULT_REMOTE_HOST)]
    remote_host: String,

    /// Port the link emulator receives ACKs on.
    #[arg(long, default_value_t = DEFAULT_REMOTE_PORT)]
    remote_port: u16,

    /// Port this receiver listens on for data.
    #[arg(long, default_value_t = DEFAULT_LOCAL_PORT)]
    local_port: u16,

    /// File the received bytes are written to.
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    file: PathBuf,

    /// Per-packet arrival record.
    #[arg(long, default_value = DEFAULT_ARRIVAL_LOG)]
    arrival_log: PathBuf,
}

impl From<Cli> for ReceiverConfig {
    fn from(cli: Cli) -> Self {
        Self {
            remote_host: cli.remote_host,
            remote_port: cli.remote_port,
            local_port: cli.local_port,
            output_path: cli.file,
            arrival_log_path: cli.arrival_log,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ReceiverConfig::from(Cli::parse());
    let receiver = match RdtReceiver::bind(&config).await {
        Ok(receiver) => receiver,
        Err(e) => {
            tracing::error!(error = %e, "receiver setup failed");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = receiver.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.shutdown();
        }
    });

    match receiver.run().await {
        Ok(summary) => {
            tracing::info!(
                bytes = summary.stats.bytes_delivered,
                duplicates = summary.stats.duplicates,
                malformed = summary.stats.malformed,
                "transfer complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "receiver failed");
            ExitCode::FAILURE
        }
    }
}
