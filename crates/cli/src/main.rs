use clap::Parser;
use json_dns_domain::config::CliOverrides;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "json-dns")]
#[command(version)]
#[command(about = "json-dns - authoritative DNS front end for a JSON HTTP backend")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS server port
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Backend URL queried as <URL>?name=<qname>&type=<qtype>
    #[arg(short = 'u', long, value_name = "URL")]
    backend_url: Option<String>,

    /// Pass DNSSEC queries and the DO/AD bits through to clients
    #[arg(long)]
    dnssec: bool,

    /// UDP worker sockets (0 = one per core)
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        dns_port: cli.dns_port,
        bind_address: cli.bind.clone(),
        workers: cli.workers,
        backend_url: cli.backend_url.clone(),
        dnssec: cli.dnssec,
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config.logging);

    info!("Starting json-dns v{}", env!("CARGO_PKG_VERSION"));

    let dns_services = di::DnsServices::new(&config)?;

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
        }
        shutdown_signal.cancel();
    });

    server::start_dns_server(
        config.server.listen_address(),
        dns_services.handler,
        server::ListenerOptions {
            num_workers: config.server.effective_workers(),
            tcp_idle_timeout: std::time::Duration::from_secs(config.server.tcp_idle_timeout),
        },
        shutdown,
    )
    .await?;

    info!("Server shutdown complete");
    Ok(())
}
