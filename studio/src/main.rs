//! Studio - command-line client for the video-editing agent
//!
//! Uploads images and a prompt to the agent backend, follows the planning and
//! execution streams, and reports progress in a dashboard or on the console.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use studio::api::{AgentApi, ApiError, HttpAgentApi};
use studio::channel::WsConnector;
use studio::cli::{Cli, Command, OutputFormat, generate_after_help, log_dir};
use studio::config::Config;
use studio::notify::{ConsoleSink, RecordingSink};
use studio::runtime::{CLOSE_GRACE, Studio};
use studio::tui;
use studio::workflow::{Phase, Workflow};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = log_dir();
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("studio.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(backend) = cli.backend {
        debug!(%backend, "main: backend overridden on the command line");
        config.backend.base_url = backend;
    }
    info!(base_url = %config.backend.base_url, "Studio loaded config");

    let api: Arc<dyn AgentApi> = Arc::new(
        HttpAgentApi::new(&config.backend.base_url, config.backend.timeout()).context("Invalid backend URL")?,
    );

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Tui { images, prompt }) => cmd_tui(&config, api, images, prompt).await,
        Some(Command::Run { images, prompt }) => cmd_run(&config, api, images, prompt).await,
        Some(Command::Status { format }) => cmd_status(api, format).await,
        None => cmd_tui(&config, api, Vec::new(), None).await,
    }
}

/// Open the dashboard, optionally with a prefilled gallery and prompt
async fn cmd_tui(config: &Config, api: Arc<dyn AgentApi>, images: Vec<PathBuf>, prompt: Option<String>) -> Result<()> {
    debug!(images = images.len(), has_prompt = prompt.is_some(), "cmd_tui: called");
    let sink = Arc::new(RecordingSink::new());
    let mut studio = Studio::new(
        Workflow::new(config.workflow_settings()),
        api,
        Arc::new(WsConnector::new()),
        sink.clone(),
    );
    for image in images {
        studio
            .add_image(&image)
            .with_context(|| format!("Cannot add {}", image.display()))?;
    }
    if let Some(prompt) = prompt {
        studio.set_prompt(prompt);
    }

    tui::run(studio, sink, Duration::from_millis(config.tui.tick_rate_ms)).await
}

/// Run one edit headless and print the outcome
async fn cmd_run(config: &Config, api: Arc<dyn AgentApi>, images: Vec<PathBuf>, prompt: String) -> Result<()> {
    debug!(images = images.len(), %prompt, "cmd_run: called");
    let mut studio = Studio::new(
        Workflow::new(config.workflow_settings()),
        api,
        Arc::new(WsConnector::new()),
        Arc::new(ConsoleSink),
    );
    for image in &images {
        studio
            .add_image(image)
            .with_context(|| format!("Cannot add {}", image.display()))?;
    }
    studio.set_prompt(prompt);

    if !studio.start() {
        eyre::bail!("Agent did not start");
    }

    let interrupted = tokio::select! {
        _ = studio.run_until_settled() => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        warn!("cmd_run: interrupted");
        studio.shutdown(CLOSE_GRACE).await;
        eyre::bail!("Interrupted");
    }

    let workflow = studio.workflow();
    if workflow.phase() != Phase::Done {
        eyre::bail!("Agent stopped during {}", workflow.phase());
    }

    if let Some(summary) = &workflow.state().done.summary {
        println!();
        println!("{}", "Edit complete".green().bold());
        println!("  Duration:    {:.1}s", summary.total_duration);
        println!("  Effects:     {}", summary.effects_count);
        println!("  Transitions: {}", summary.transitions_count);
        println!("  Track:       {}", summary.track_used);
    }
    if let Some(usage) = workflow.usage() {
        println!(
            "  Tokens:      {} ({})",
            studio::domain::format_tokens(usage.pricing.total_tokens),
            studio::domain::format_cost(usage.pricing.total_cost_usd)
        );
    }
    Ok(())
}

/// Report backend health, device connection and active sessions
async fn cmd_status(api: Arc<dyn AgentApi>, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_status: called");
    let (health, device, sessions) = tokio::join!(api.health(), api.device_status(), api.sessions());

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "health": json_result(&health),
                "device": json_result(&device),
                "sessions": json_result(&sessions),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("Studio Status");
            println!("-------------");
            match &health {
                Ok(h) => println!("Backend: {} {}", h.status.green(), h.service.as_deref().unwrap_or_default()),
                Err(e) => println!("Backend: {} ({})", "unreachable".red(), e.user_message()),
            }
            match &device {
                Ok(d) if d.connected => println!("Device:  {}", "connected".green()),
                Ok(d) => println!(
                    "Device:  {} {}",
                    "disconnected".yellow(),
                    d.message.as_deref().unwrap_or_default()
                ),
                Err(e) => println!("Device:  {} ({})", "unknown".red(), e.user_message()),
            }
            match &sessions {
                Ok(s) if s.active_sessions.is_empty() => println!("Sessions: none"),
                Ok(s) => {
                    println!("Sessions: {}", s.active_sessions.len());
                    for id in &s.active_sessions {
                        println!("  {}", id);
                    }
                }
                Err(e) => println!("Sessions: {} ({})", "unknown".red(), e.user_message()),
            }
        }
    }

    if let Err(e) = health {
        return Err(e).context("Backend health check failed");
    }
    Ok(())
}

/// Either the value or `{"error": ..}`
fn json_result<T: serde::Serialize>(result: &Result<T, ApiError>) -> serde_json::Value {
    match result {
        Ok(value) => serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        Err(e) => serde_json::json!({ "error": e.user_message() }),
    }
}
