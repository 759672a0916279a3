use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use reconciler::conf::model::Config;
use reconciler::docker::DockerClient;
use reconciler::metrics::ReloadCounter;
use reconciler::reconcile::Reconciler;
use reconciler::supervisor::Supervisor;
use reconciler::{control, cron, runtime};

const DEFAULT_CONFIG_PATH: &str = "/config/bosnd.yml";

/// Either CLI surface in spec §6 is acceptable: `run --config <path>` /
/// `version` as subcommands, or top-level `-c`/`-v`/`-b` flags.
#[derive(Parser)]
#[command(name = "reconciler", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the YAML config file (flag surface).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Print version and exit (flag surface).
    #[arg(short = 'v', long = "version-flag")]
    version_flag: bool,

    /// Print version and exit, alias of -v (flag surface).
    #[arg(short = 'b')]
    version_flag_b: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run the reconcile loop.
    Run {
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
    /// Print version and exit.
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let print_version = cli.version_flag || cli.version_flag_b || matches!(cli.command, Some(Command::Version));
    if print_version {
        println!("reconciler {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config_path = match cli.command {
        Some(Command::Run { config }) => config,
        _ => cli.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
        // Command::Version is handled above.
    };

    let initial_config = Config::load_from_file(&config_path)?;
    runtime::init_logging(initial_config.debug);

    info!(path = %config_path.display(), "loaded configuration");

    runtime::publish_startup_dns(&initial_config).await?;

    let docker = build_docker_client(&initial_config)?;
    let supervisor = Arc::new(Supervisor::new());
    let counter = ReloadCounter::new();
    let config = Arc::new(RwLock::new(initial_config.clone()));

    let mut scheduler_guard = None;
    if initial_config.cron_enabled() {
        match cron::start(&initial_config.cron.crontab, supervisor.clone(), initial_config.cmd.clone()).await {
            Ok(scheduler) => scheduler_guard = Some(scheduler),
            Err(e) => warn!(error = %e, "cron scheduler failed to start"),
        }
    }

    if initial_config.control_enabled() {
        let addr = bind_addr(&initial_config.control.port)?;
        let supervisor = supervisor.clone();
        let config = config.clone();
        tokio::spawn(async move {
            if let Err(e) = control::serve_control(addr, supervisor, config).await {
                error!(error = %e, "control endpoint stopped");
            }
        });
    }

    if initial_config.prometheus_enabled() {
        let addr = bind_addr(&initial_config.prometheus.port)?;
        let counter = counter.clone();
        tokio::spawn(async move {
            if let Err(e) = control::serve_metrics(addr, counter).await {
                error!(error = %e, "metrics endpoint stopped");
            }
        });
    }

    if initial_config.debug && !initial_config.debugport.is_empty() {
        let addr = bind_addr(&initial_config.debugport)?;
        tokio::spawn(async move {
            if let Err(e) = control::serve_debug(addr).await {
                error!(error = %e, "debug endpoint stopped");
            }
        });
    }

    let reconciler = Reconciler::new(config_path, config, supervisor, counter, docker);

    tokio::select! {
        _ = reconciler.run() => {}
        _ = shutdown_signal() => {
            info!("signal received, exiting (supervised worker is left running)");
        }
    }

    drop(scheduler_guard);
    Ok(())
}

/// Choose between the local Docker socket and a remote Swarm manager over
/// TLS, per `swarm.usesocket` (§6). The socket path defaults to Docker's
/// own default when left blank.
fn build_docker_client(config: &Config) -> Result<DockerClient, reconciler::docker::DockerError> {
    if config.swarm.usesocket || config.swarm.managerurl.is_empty() {
        DockerClient::new("")
    } else {
        DockerClient::new_with_tls(
            &config.swarm.managerurl,
            &config.swarm.cacertpem,
            &config.swarm.clientcertpem,
            &config.swarm.clientkeypem,
            config.swarm.insecureskipverify,
        )
    }
}

fn bind_addr(port: &str) -> anyhow::Result<SocketAddr> {
    let port: u16 = port.parse()?;
    Ok(SocketAddr::from(([0, 0, 0, 0], port)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
