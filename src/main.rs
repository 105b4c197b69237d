use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use mailroom::web::WebServer;
use mailroom::{AttachmentStorage, Config, Database};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

fn load_config(path: &str) -> Config {
    match Config::load_with_env(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    }
}

async fn run(config: Config) -> mailroom::Result<()> {
    info!("Mailroom starting");

    let db = Database::open(&config.database.path, config.database.max_connections).await?;
    info!(path = %config.database.path, "database ready");

    let storage = AttachmentStorage::new(&config.files.storage_path)?;
    info!(path = %config.files.storage_path, "attachment storage ready");

    WebServer::new(&config, Arc::new(db), storage)?.run().await
}

#[tokio::main]
async fn main() -> ExitCode {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&path);

    if let Err(e) = mailroom::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        mailroom::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
