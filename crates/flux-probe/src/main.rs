use anyhow::Context;
use clap::Parser;
use flux_config::{load_dotenv, ConfigLoader};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Prometheus exporter and alerting probe for SmartCitizen devices",
    long_about = None
)]
struct Args {
    /// Config file path (TOML or JSON)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// .env file path, overrides `dotenv_path` from the config file
    #[arg(long)]
    dotenv: Option<PathBuf>,

    /// HTTP port, overrides `server.port`
    #[arg(short, long)]
    port: Option<u16>,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ConfigLoader::new(&args.config)
        .load_validated()
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;

    if let Some(path) = args.dotenv {
        config.dotenv_path = Some(path);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    load_dotenv(config.dotenv_path.as_deref())?;
    flux_logging::init_logging(&config.logging)?;

    tracing::info!(
        config = %args.config.display(),
        namespace = %config.namespace,
        "Starting SmartCitizen probe"
    );

    flux_probe::run(config, args.once).await
}
