//! workgate worker daemon

use std::time::Duration;

use clap::Parser;
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use workgate_core::DeliveryPolicy;
use workgate_worker::{
    ConsoleSink, JsonSink, RandomWork, Supervisor, SupervisorConfig, WorkConfig, WorkerConfig,
};

/// Run a start-gated worker until Ctrl-C, then shut it down.
#[derive(Parser)]
#[command(name = "workgate-worker")]
#[command(about = "Start-gated background worker with graceful shutdown", long_about = None)]
#[command(version)]
struct Cli {
    /// Delivery policy: blocking (sends ignore cancellation) or cancel-aware
    #[arg(long, default_value = "blocking")]
    delivery: DeliveryPolicy,

    /// Results stream capacity (0 = rendezvous)
    #[arg(long, default_value = "1")]
    results_buffer: usize,

    /// Errors stream capacity (0 = rendezvous)
    #[arg(long, default_value = "0")]
    errors_buffer: usize,

    /// Simulated latency of each unit of work, in milliseconds
    #[arg(long, default_value = "250")]
    latency_ms: u64,

    /// Draws at or above this value are reported as errors
    #[arg(long, default_value = "50")]
    threshold: u32,

    /// RNG seed (defaults to OS entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Give up waiting for the worker after this many seconds
    #[arg(long)]
    shutdown_timeout_secs: Option<u64>,

    /// Emit JSON lines instead of plain text
    #[arg(long)]
    json: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            worker: WorkerConfig {
                delivery: self.delivery,
                results_buffer: self.results_buffer,
                errors_buffer: self.errors_buffer,
            },
            shutdown_timeout: self.shutdown_timeout_secs.map(Duration::from_secs),
        }
    }

    fn work_config(&self) -> WorkConfig {
        WorkConfig {
            latency: Duration::from_millis(self.latency_ms),
            threshold: self.threshold,
            seed: self.seed,
        }
    }
}

/// Install the interrupt handler now and resolve the receiver when it fires.
fn listen_for_interrupt() -> std::io::Result<oneshot::Receiver<()>> {
    let (tx, rx) = oneshot::channel();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            sigint.recv().await;
            let _ = tx.send(());
        });
    }

    #[cfg(not(unix))]
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C, shutting down");
        }
        let _ = tx.send(());
    });

    Ok(rx)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries work output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "workgate_worker={0},workgate_core={0}",
            cli.log_level
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let config = cli.supervisor_config();
    let work = RandomWork::from_config(&cli.work_config());

    info!(
        delivery = %config.worker.delivery,
        results_buffer = config.worker.results_buffer,
        errors_buffer = config.worker.errors_buffer,
        "Starting workgate worker"
    );

    let supervisor = Supervisor::with_config(work, config);

    // Armed before the gate opens so an early Ctrl-C reaches the supervisor
    let interrupted = listen_for_interrupt().map_err(|e| {
        error!(error = %e, "Failed to listen for Ctrl-C");
        e
    })?;
    let interrupt = async {
        let _ = interrupted.await;
    };

    let report = if cli.json {
        supervisor.run(interrupt, &mut JsonSink::stdout()).await?
    } else {
        supervisor.run(interrupt, &mut ConsoleSink::stdout()).await?
    };

    info!(
        results = report.results,
        errors = report.errors,
        reason = ?report.reason,
        "Worker shut down"
    );

    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_interrupt_before_supervisor_runs_is_seen() {
        let interrupted = listen_for_interrupt().unwrap();

        // Nothing polls the receiver yet; the signal must still be caught.
        let status = std::process::Command::new("sh")
            .arg("-c")
            .arg(format!("kill -INT {}", std::process::id()))
            .status()
            .unwrap();
        assert!(status.success());

        let fired = tokio::time::timeout(Duration::from_secs(5), interrupted).await;
        assert!(matches!(fired, Ok(Ok(()))));
    }
}
