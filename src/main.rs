use std::path::PathBuf;
use clap::Parser;

use shell_gateway::config::loader::read_config;
use shell_gateway::config::validation::validate_config;
use shell_gateway::config::{ExecMode, GatewayConfig};
use shell_gateway::lifecycle::{signals, startup, Shutdown};
use shell_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "shell-gateway")]
#[command(about = "Run host commands from a browser form (loopback clients only)", long_about = None)]
struct Args {
    /// Port to listen on, on all interfaces
    port: Option<u16>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preset menu file (`caption|command` per line)
    #[arg(short, long)]
    menu: Option<String>,

    /// Full bind address, overriding the configured one
    #[arg(short, long)]
    bind: Option<String>,

    /// Spawn commands directly instead of through the shell
    #[arg(long)]
    argv: bool,

    /// Kill commands after this many seconds (0 disables)
    #[arg(long)]
    timeout: Option<u64>,

    /// Serve this many connections at once
    #[arg(long)]
    workers: Option<usize>,
}

impl Args {
    fn apply(&self, config: &mut GatewayConfig) {
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(port) = self.port {
            config.listener.set_port(port);
        }
        if let Some(menu) = &self.menu {
            config.menu.path = menu.clone();
        }
        if self.argv {
            config.exec.mode = ExecMode::Argv;
        }
        if let Some(timeout) = self.timeout {
            config.exec.timeout_secs = timeout;
        }
        if let Some(workers) = self.workers {
            config.listener.max_connections = workers;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => GatewayConfig::default(),
    };
    args.apply(&mut config);
    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            eprintln!("invalid configuration: {}", error);
        }
        std::process::exit(2);
    }

    logging::init_logging(&config.observability.log_level);

    tracing::info!("shell-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        max_request_bytes = config.listener.max_request_bytes,
        exec_mode = ?config.exec.mode,
        exec_timeout_secs = config.exec.timeout_secs,
        "Configuration loaded"
    );

    let (server, listener) = startup::start(&config).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("Serving on http://127.0.0.1:{}/", local_addr.port());

    let shutdown = Shutdown::new();
    signals::install(shutdown.clone());

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
