//! remove.bg CLI tool
//!
//! Command-line interface for removing image backgrounds through the
//! remove.bg API.

use super::config::CliConfigBuilder;
use crate::{
    client::Client,
    error::{ApiErrorBody, RemoveBgError},
    response::{RateLimit, RemoveBgResult},
    tracing_config::{init_cli_tracing, TracingFormat},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Remove image backgrounds with the remove.bg API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "removebg")]
pub struct Cli {
    /// Image URL, file path, or base64 file (use "-" with --input-kind base64 for stdin)
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// How to interpret INPUT
    #[arg(long, value_enum, default_value_t = InputKind::Auto)]
    pub input_kind: InputKind,

    /// remove.bg API key
    #[arg(long, env = "REMOVE_BG_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Read the API key from the first line of a file (takes precedence over --api-key)
    #[arg(long, value_name = "PATH")]
    pub api_key_file: Option<PathBuf>,

    /// Output file [default: <input>-no-bg.<ext> for files, no-bg.<ext> otherwise]
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Output resolution (preview, small, regular, medium, hd, full, 4k, auto) [default: preview]
    #[arg(long)]
    pub size: Option<String>,

    /// Foreground type (auto, person, product, car) [default: auto]
    #[arg(long = "type", value_name = "TYPE")]
    pub foreground_type: Option<String>,

    /// Result image format
    #[arg(short, long, value_enum)]
    pub format: Option<CliOutputFormat>,

    /// Scale the subject relative to the image ("10%".."100%" or "original")
    #[arg(long)]
    pub scale: Option<String>,

    /// Subject position ("original", "center", or percentages)
    #[arg(long)]
    pub position: Option<String>,

    /// Region of interest "<x1> <y1> <x2> <y2>"
    #[arg(long)]
    pub roi: Option<String>,

    /// Crop off all empty regions
    #[arg(long)]
    pub crop: bool,

    /// Margin around the cropped subject (e.g. "30px", "10%")
    #[arg(long)]
    pub crop_margin: Option<String>,

    /// Solid background color (hex code or color name)
    #[arg(long, conflicts_with = "bg_image_url")]
    pub bg_color: Option<String>,

    /// Background image URL
    #[arg(long)]
    pub bg_image_url: Option<String>,

    /// Extra API parameter as NAME=VALUE (repeatable)
    #[arg(long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// API endpoint override
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print result metadata as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console)]
    pub log_format: CliLogFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum InputKind {
    /// URL if INPUT starts with http:// or https://, file otherwise
    Auto,
    Url,
    File,
    Base64,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Auto,
    Png,
    Jpg,
    Zip,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLogFormat {
    /// Colored human-readable output
    Console,
    /// Plain output without colors, for CI
    Compact,
    /// JSON lines (requires the `tracing-json` feature)
    #[cfg(feature = "tracing-json")]
    Json,
}

impl From<CliLogFormat> for TracingFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Console => TracingFormat::Console,
            CliLogFormat::Compact => TracingFormat::Compact,
            #[cfg(feature = "tracing-json")]
            CliLogFormat::Json => TracingFormat::Json,
        }
    }
}

/// Result summary printed with `--json`
#[derive(Serialize)]
struct ResultSummary<'a> {
    output: &'a Path,
    #[serde(flatten)]
    result: ResultMetadata<'a>,
}

#[derive(Serialize)]
struct ResultMetadata<'a> {
    credits_charged: f64,
    detected_type: Option<&'a str>,
    width: u32,
    height: u32,
    rate_limit: &'a RateLimit,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_cli_tracing(cli.verbose, cli.log_format.into())
        .context("Failed to initialize tracing")?;

    let invocation = CliConfigBuilder::from_cli(&cli).context("Invalid CLI arguments")?;
    info!(
        modality = invocation.source.modality(),
        endpoint = %invocation.config.endpoint,
        "Starting background removal"
    );

    let client = Client::new(invocation.config).context("Failed to create remove.bg client")?;

    let start_time = Instant::now();
    let outcome = client
        .remove_background(&invocation.source, &invocation.options)
        .await;
    debug!(elapsed_ms = start_time.elapsed().as_millis() as u64, "Request finished");

    match outcome {
        Ok(result) => {
            print_result(&result, &invocation.output, cli.json)?;
            Ok(())
        },
        Err(err) => {
            // Details were printed above; keep the exit error to one line
            report_error(&err);
            Err(anyhow!("Background removal failed"))
        },
    }
}

fn print_result(result: &RemoveBgResult, output: &Path, json: bool) -> Result<()> {
    let metadata = ResultMetadata {
        credits_charged: result.credits_charged,
        detected_type: result.detected_type.as_ref().map(|kind| kind.as_str()),
        width: result.result_width,
        height: result.result_height,
        rate_limit: &result.rate_limit,
    };

    if json {
        let summary = ResultSummary {
            output,
            result: metadata,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialize result")?
        );
        return Ok(());
    }

    println!(
        "✅ Saved {} ({}x{})",
        output.display(),
        metadata.width,
        metadata.height
    );
    println!("   Credits charged: {}", metadata.credits_charged);
    if let Some(kind) = metadata.detected_type {
        println!("   Detected type:   {}", kind);
    }
    for line in rate_limit_lines(&result.rate_limit) {
        println!("   {}", line);
    }
    Ok(())
}

/// Human-readable rate-limit state, shared by success and error output
fn rate_limit_lines(rate_limit: &RateLimit) -> Vec<String> {
    let mut lines = Vec::new();
    if let (Some(remaining), Some(limit)) = (rate_limit.remaining, rate_limit.limit) {
        lines.push(match rate_limit.reset {
            Some(reset) => format!(
                "Rate limit:      {}/{} remaining (resets at {})",
                remaining, limit, reset
            ),
            None => format!("Rate limit:      {}/{} remaining", remaining, limit),
        });
    }
    if let Some(seconds) = rate_limit.retry_after {
        lines.push(format!("Retry after:     {} second(s)", seconds));
    }
    lines
}

fn report_error(err: &RemoveBgError) {
    match err {
        RemoveBgError::Api { status, body, rate_limit } => {
            eprintln!("❌ remove.bg rejected the request (HTTP {})", status);
            match body {
                ApiErrorBody::Errors(errors) => {
                    for error in errors {
                        eprintln!("   • {}", error);
                    }
                },
                ApiErrorBody::Raw(raw) if raw.is_empty() => eprintln!("   (empty response body)"),
                ApiErrorBody::Raw(raw) => eprintln!("   {}", raw),
            }
            for line in rate_limit_lines(rate_limit) {
                eprintln!("   {}", line);
            }
        },
        other if other.is_local() => eprintln!("❌ {}", other),
        other => eprintln!("❌ Request failed: {}", other),
    }
}
