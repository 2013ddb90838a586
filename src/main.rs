//! dbchat - chat with a SQLite or MySQL database through an LLM-driven SQL agent.

use dbchat::app::{ChatSession, SessionSettings, SharedResources};
use dbchat::cli::Cli;
use dbchat::config::Config;
use dbchat::db::{create_sample, SAMPLE_SEED};
use dbchat::error::Result;
use dbchat::llm::LlmProvider;
use dbchat::{logging, tui};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    // The TUI owns the terminal, so it logs to a file
    if cli.headless {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_to(&mut config)?;
    config.remote.apply_env_defaults();

    let provider: LlmProvider = config.llm.provider.parse()?;

    if cli.init_sample {
        let path = config.database.resolve_embedded_path();
        if create_sample(&path, SAMPLE_SEED).await? {
            info!(path = %path.display(), "Created sample database");
        }
    }

    let session = ChatSession::new(
        SharedResources::from_config(&config, provider),
        initial_settings(&config),
    );

    if cli.headless {
        return tui::headless::run_headless(&cli, session).await;
    }

    tui::run(session).await?;
    Ok(0)
}

/// Pre-fills the settings form from config and the environment.
fn initial_settings(config: &Config) -> SessionSettings {
    let remote = &config.remote;
    SessionSettings {
        mode: config.database.mode,
        host: remote.host.clone().unwrap_or_default(),
        user: remote.user.clone().unwrap_or_default(),
        password: remote.password.clone().unwrap_or_default(),
        database: remote.database.clone().unwrap_or_default(),
        api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
    }
}
