use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use tracing::{error, info};
use vmpulse::config::{self, load_config, load_config_from_path};
use vmpulse::logging::init_tracing;
use vmpulse::server;
use vmpulse::system::sampler::Sampler;
use vmpulse::system::sampling::spawn_sampling_loop;
use vmpulse::system::store::SnapshotStore;

#[derive(Parser)]
#[command(
    name = "vmpulse",
    about = "Samples host resource usage and serves the latest snapshot over HTTP"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sampling period in milliseconds
    #[arg(long)]
    refresh_rate: Option<u64>,

    /// Address to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Directory of static files served at `/`
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// Log level or filter directive, e.g. `debug` or `vmpulse=trace`
    #[arg(long)]
    log_level: Option<String>,

    /// Log output: pretty, json
    #[arg(long)]
    log_format: Option<String>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);
    init_tracing(&config.logging)?;

    if config.general.refresh_rate_ms == 0 {
        return Err(eyre!("refresh rate must be greater than 0"));
    }

    let store = Arc::new(SnapshotStore::new());
    let sampler = Sampler::new().with_process_limit(config.general.process_limit);
    let sampling = spawn_sampling_loop(
        sampler,
        Arc::clone(&store),
        Duration::from_millis(config.general.refresh_rate_ms),
    );

    let address = config.server.address();
    let server = server::bind(&address, store, &config.server.assets_dir)
        .wrap_err_with(|| format!("failed to bind {address}"))?;
    let server_handle = server.handle();
    let mut server_task = actix_web::rt::spawn(server);

    // A sampler that dies mid-run would leave a stale snapshot behind; exit
    // instead so a supervisor can restart the service.
    let served = tokio::select! {
        joined = &mut server_task => match joined {
            Ok(served) => served.wrap_err_with(|| format!("server failed on {address}")),
            Err(err) => Err(eyre!("server task failed: {err}")),
        },
        _ = sampling.stopped() => {
            error!("Sampling stopped unexpectedly, shutting down the server");
            server_handle.stop(true).await;
            let _ = server_task.await;
            Err(eyre!("sampling stopped unexpectedly"))
        }
    };

    info!("Shutting down");
    sampling.shutdown().await;
    served
}

fn load_config_for_cli(cli: &Cli) -> config::Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(rate) = cli.refresh_rate {
        config.general.refresh_rate_ms = rate;
    }
    if let Some(ref host) = cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref dir) = cli.assets_dir {
        config.server.assets_dir = dir.clone();
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.logging.format = format.clone();
    }

    config
}
