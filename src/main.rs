use clap::Parser;
use tracing_subscriber::EnvFilter;

use storymate::app::{self, AppConfig};
use storymate::utils::RUNTIME;

#[derive(Parser)]
#[command(name = "storymate")]
#[command(about = "Console client for StoryMate conversations")]
struct Cli {
    /// Server root, e.g. http://localhost:3001
    #[arg(long)]
    base_url: Option<String>,
    /// User id sent with every request
    #[arg(long)]
    user_id: Option<String>,
    /// Write the effective settings back to the config file
    #[arg(long)]
    save_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load()
        .unwrap_or_else(|e| {
            log::warn!("{}; falling back to defaults", e);
            AppConfig::default()
        })
        .with_env_overrides(|key| std::env::var(key).ok());
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    if let Some(uid) = cli.user_id {
        config.user_id = uid;
    }
    if cli.save_config {
        let path = config.save()?;
        log::info!("saved settings to {}", path.display());
    }

    RUNTIME.block_on(app::run(config))
}
