//! Command-line argument parsing for dbchat.

use crate::config::{Config, DatabaseMode, RemoteConfig};
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// Output format for headless mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output of the final screen.
    #[default]
    Text,
    /// JSON output with screen, state, and metadata.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid output format: {s}. Expected: text or json"
            )),
        }
    }
}

/// Chat with a SQLite or MySQL database through an LLM-driven SQL agent.
#[derive(Parser, Debug)]
#[command(name = "dbchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Database mode selected at startup: embedded or remote
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Path to the embedded SQLite database
    #[arg(long, value_name = "PATH")]
    pub db_file: Option<PathBuf>,

    /// MySQL host (optionally with :port)
    #[arg(short = 'H', long, value_name = "HOST")]
    pub host: Option<String>,

    /// MySQL user
    #[arg(short = 'U', long, value_name = "USER")]
    pub user: Option<String>,

    /// MySQL database name
    #[arg(short = 'd', long, value_name = "DATABASE")]
    pub database: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// LLM provider to use: openai or mock
    #[arg(long, value_name = "PROVIDER")]
    pub llm: Option<String>,

    /// Chat model name
    #[arg(long, value_name = "NAME", env = "OPENAI_MODEL")]
    pub model: Option<String>,

    /// Create the sample student database if it does not exist
    #[arg(long)]
    pub init_sample: bool,

    // === Headless mode options ===
    /// Run in headless mode (no terminal UI, for testing/automation)
    #[arg(long)]
    pub headless: bool,

    /// Comma-separated events to execute in headless mode (e.g., "type:hello,key:enter")
    #[arg(long, value_name = "EVENTS")]
    pub events: Option<String>,

    /// Path to script file with events (use "-" for stdin)
    #[arg(long, value_name = "PATH")]
    pub script: Option<String>,

    /// Screen size for headless mode (WIDTHxHEIGHT, e.g., "100x30")
    #[arg(long, value_name = "SIZE", default_value = "100x30")]
    pub size: String,

    /// Output format for headless mode
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Write output to file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Stop on first assertion failure
    #[arg(long)]
    pub fail_fast: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Applies command-line overrides on top of the file configuration.
    pub fn apply_to(&self, config: &mut Config) -> Result<()> {
        if let Some(mode) = &self.mode {
            config.database.mode = mode.parse::<DatabaseMode>()?;
        }
        if let Some(path) = &self.db_file {
            config.database.embedded_path = Some(path.clone());
        }
        if let Some(provider) = &self.llm {
            config.llm.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }

        let RemoteConfig {
            host,
            user,
            database,
            ..
        } = &mut config.remote;
        if self.host.is_some() {
            host.clone_from(&self.host);
        }
        if self.user.is_some() {
            user.clone_from(&self.user);
        }
        if self.database.is_some() {
            database.clone_from(&self.database);
        }

        Ok(())
    }

    /// Parses the screen size from the --size argument.
    /// Returns (width, height) or an error.
    pub fn parse_screen_size(&self) -> std::result::Result<(u16, u16), String> {
        let (width, height) = self.size.split_once('x').ok_or_else(|| {
            format!(
                "Invalid size format: '{}'. Expected WIDTHxHEIGHT (e.g., 100x30)",
                self.size
            )
        })?;
        let width = width
            .parse::<u16>()
            .map_err(|_| format!("Invalid width: '{width}'"))?;
        let height = height
            .parse::<u16>()
            .map_err(|_| format!("Invalid height: '{height}'"))?;
        Ok((width, height))
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Validates headless mode arguments.
    /// Returns an error message if validation fails.
    pub fn validate_headless(&self) -> std::result::Result<(), String> {
        if !self.headless {
            return Ok(());
        }

        // Headless mode requires either --events or --script
        if self.events.is_none() && self.script.is_none() {
            return Err("--headless requires --events or --script".to_string());
        }

        self.parse_screen_size()?;
        self.parse_output_format()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_args(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn test_parse_short_args() {
        let cli = parse_args(&["dbchat", "-H", "localhost", "-d", "school", "-U", "reader"]);

        assert_eq!(cli.host, Some("localhost".to_string()));
        assert_eq!(cli.database, Some("school".to_string()));
        assert_eq!(cli.user, Some("reader".to_string()));
    }

    #[test]
    fn test_parse_config_path() {
        let cli = parse_args(&["dbchat", "--config", "/path/to/config.toml"]);
        assert_eq!(cli.config_path(), PathBuf::from("/path/to/config.toml"));
    }

    #[test]
    fn test_apply_overrides() {
        let cli = parse_args(&[
            "dbchat",
            "--mode",
            "remote",
            "--db-file",
            "/tmp/student.db",
            "--llm",
            "mock",
            "--model",
            "gpt-4o",
            "-H",
            "db.internal:3306",
        ]);
        let mut config = Config::default();
        config.remote.user = Some("from-file".to_string());
        cli.apply_to(&mut config).unwrap();

        assert_eq!(config.database.mode, DatabaseMode::Remote);
        assert_eq!(
            config.database.embedded_path,
            Some(PathBuf::from("/tmp/student.db"))
        );
        assert_eq!(config.llm.provider, "mock");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.remote.host.as_deref(), Some("db.internal:3306"));
        // Unset flags leave the file values alone
        assert_eq!(config.remote.user.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let cli = parse_args(&["dbchat", "--mode", "postgres"]);
        let mut config = Config::default();
        let err = cli.apply_to(&mut config).unwrap_err();
        assert_eq!(err.category(), "Configuration Error");
    }

    #[test]
    fn test_init_sample_flag() {
        let cli = parse_args(&["dbchat", "--init-sample"]);
        assert!(cli.init_sample);
        assert!(!parse_args(&["dbchat"]).init_sample);
    }

    // === Headless mode tests ===

    #[test]
    fn test_parse_headless_flag() {
        let cli = parse_args(&["dbchat", "--headless", "--events", "key:ctrl+c"]);
        assert!(cli.headless);
        assert_eq!(cli.events, Some("key:ctrl+c".to_string()));
    }

    #[test]
    fn test_parse_screen_size() {
        let cli = parse_args(&["dbchat", "--size", "120x40"]);
        assert_eq!(cli.parse_screen_size().unwrap(), (120, 40));

        let cli = parse_args(&["dbchat", "--size", "invalid"]);
        assert!(cli.parse_screen_size().is_err());
    }

    #[test]
    fn test_parse_output_format() {
        let cli = parse_args(&["dbchat", "--output", "json"]);
        assert_eq!(cli.parse_output_format().unwrap(), OutputFormat::Json);

        let cli = parse_args(&["dbchat", "--output", "frames"]);
        assert!(cli.parse_output_format().is_err());
    }

    #[test]
    fn test_validate_headless_requires_events_or_script() {
        let cli = parse_args(&["dbchat", "--headless"]);
        let result = cli.validate_headless();
        assert!(result
            .unwrap_err()
            .contains("requires --events or --script"));
    }

    #[test]
    fn test_validate_headless_with_script() {
        let cli = parse_args(&["dbchat", "--headless", "--script", "-"]);
        assert!(cli.validate_headless().is_ok());
    }

    #[test]
    fn test_headless_output_file() {
        let cli = parse_args(&[
            "dbchat",
            "--headless",
            "--events",
            "key:ctrl+c",
            "--output-file",
            "result.json",
        ]);
        assert_eq!(cli.output_file, Some(PathBuf::from("result.json")));
    }
}
