//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// Studio - terminal client for the photo-to-video editing agent
#[derive(Parser)]
#[command(
    name = "studio",
    about = "Plan and execute video edits from photos and a prompt",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Backend base URL, overriding the config file
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the dashboard (default)
    Tui {
        /// Images to preload into the gallery
        #[arg(short, long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,

        /// Prompt to prefill
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// Run one edit headless, printing progress to the console
    Run {
        /// Images to edit, in order
        #[arg(short, long = "image", value_name = "PATH", required = true)]
        images: Vec<PathBuf>,

        /// How the edit should feel
        #[arg(short, long)]
        prompt: String,
    },

    /// Show backend health, device connection and active sessions
    Status {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = log_dir().join("studio.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Directory the log file lives in
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studio")
        .join("logs")
}

/// Generate the after_help text with config and log locations
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();

    help.push_str("Config files (first found wins):\n");
    help.push_str("  ./.studio.yml\n");
    if let Some(config_dir) = dirs::config_dir() {
        help.push_str(&format!("  {}\n", config_dir.join("studio").join("studio.yml").display()));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));

    debug!("generate_after_help: returning help text");
    help
}

/// Output format for the status command
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
