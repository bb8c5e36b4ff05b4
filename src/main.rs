use std::path::Path;

use clap::Parser;
use eyre::Result;
use log::{LevelFilter, debug, info};

mod cli;

use cli::Cli;
use tubescript::config::{Config, config_path};

fn setup_logging(log_file: Option<&Path>, verbose: bool) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(if verbose { LevelFilter::Debug } else { LevelFilter::Info });
    // RUST_LOG still wins when set
    builder.parse_default_env();

    if let Some(path) = log_file {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(path)?);
        builder.target(env_logger::Target::Pipe(target));
    }

    builder.init();

    if let Some(path) = log_file {
        info!("Logging initialized: {}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli.config.clone().unwrap_or_else(config_path);
    let mut config = Config::load(&path)?;
    cli.apply(&mut config);

    setup_logging(config.log_file.as_deref(), cli.verbose)?;
    if path.exists() {
        info!("Loaded config from {}", path.display());
    } else {
        debug!("No config file found at {}, using defaults", path.display());
    }

    tubescript::server::serve(&config).await
}
