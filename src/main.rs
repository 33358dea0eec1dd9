use std::io::Read;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use slack_paste_formatter::{Formatter, FormatterSettings};

#[derive(Parser)]
#[command(name = "slack-paste-formatter", about = "Convert a Slack paste into Markdown conversation notes")]
struct Cli {
    /// Path to a settings file layered under defaults and SLACK_FMT_* env vars.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full ingest + render pipeline, emitting Markdown callouts.
    Format { file: Option<String> },
    /// Same as `format`, wrapped in YAML frontmatter.
    Note { file: Option<String> },
    /// Run only the `isLikelySlack` heuristic gate.
    Check { file: Option<String> },
}

fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse();
    let settings = FormatterSettings::load(cli.config.as_deref())
        .context("failed to load formatter settings")?;
    let formatter = Formatter::new(settings);

    match cli.command {
        Command::Format { file } => {
            let text = read_input(file.as_deref())?;
            println!("{}", formatter.format_slack_content(&text));
        }
        Command::Note { file } => {
            let text = read_input(file.as_deref())?;
            println!("{}", formatter.build_note_with_frontmatter(&text));
        }
        Command::Check { file } => {
            let text = read_input(file.as_deref())?;
            println!("{}", formatter.is_likely_slack(&text));
        }
    }

    Ok(())
}

fn read_input(file: Option<&str>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path)),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn init_logging() -> Result<()> {
    let filter = if let Ok(rust_log) = std::env::var("RUST_LOG") {
        tracing_subscriber::EnvFilter::try_new(rust_log)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    } else if let Ok(log_level) = std::env::var("LOG_LEVEL") {
        let level_str = match log_level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" | "warning" => "warn",
            "error" => "error",
            _ => "warn",
        };
        tracing_subscriber::EnvFilter::new(level_str)
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .with_target(false)
        .init();

    Ok(())
}
