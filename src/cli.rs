use clap::Parser;
use std::path::PathBuf;

use tubescript::config::Config;

#[derive(Parser)]
#[command(
    name = "tubescript",
    about = "YouTube transcript download service",
    version
)]
pub struct Cli {
    /// Config file (default: ~/.config/tubescript/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Max transcript requests per client per window
    #[arg(long)]
    pub call_limit: Option<u32>,

    /// Rate limit window in seconds
    #[arg(long)]
    pub window_seconds: Option<u64>,

    /// Caption language used when a request doesn't name one
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Overlay flags on top of the loaded config (flags win)
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref host) = self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(call_limit) = self.call_limit {
            config.rate_limit.call_limit = call_limit;
        }
        if let Some(window_seconds) = self.window_seconds {
            config.rate_limit.window_seconds = window_seconds;
        }
        if let Some(ref lang) = self.lang {
            config.default_lang = lang.clone();
        }
        if let Some(ref log_file) = self.log_file {
            config.log_file = Some(log_file.clone());
        }
    }
}
