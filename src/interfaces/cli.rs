//! # CLI Interface
//!
//! `clap` derive definitions for the `qris-relay` binary. Every store and
//! policy flag also reads from the environment.

use super::logging::LogFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Dynamic QRIS generation and webhook event inspection.
#[derive(Parser, Debug)]
#[command(name = "qris-relay", author, version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Log output format (logs go to stderr).
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Turn a static QRIS payload into a dynamic one with an amount.
    Dynamic(DynamicArgs),
    /// Record one webhook call and print the stored event.
    Ingest(IngestArgs),
    /// Print the recent events of a token.
    Events(EventsArgs),
}

/// Event store selection and bounds.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Redis URL; requires the `storage-redis` feature.
    #[arg(long, env = "REDIS_URL", global = true)]
    pub redis_url: Option<String>,

    /// Path to a persistent RocksDB store; requires the `storage-rocksdb` feature.
    #[arg(long, env = "EVENTS_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Events kept per token.
    #[arg(long, env = "EVENTS_MAX_KEEP", default_value_t = 50, global = true)]
    pub max_keep: usize,

    /// Seconds a token's events live after its last webhook.
    #[arg(long, env = "EVENTS_TTL_SECS", default_value_t = 86_400, global = true)]
    pub ttl_secs: u32,

    /// Prefix of store keys.
    #[arg(long, env = "EVENTS_KEY_PREFIX", default_value = "qris:events:", global = true)]
    pub key_prefix: String,

    /// JSON-lines file receiving events the store could not take.
    #[arg(long, env = "EVENTS_FALLBACK_LOG", global = true)]
    pub fallback_log: Option<PathBuf>,

    /// Comma-separated addresses allowed to deliver webhooks. Empty allows all.
    #[arg(long, env = "ALLOWED_IPS", default_value = "", global = true)]
    pub allowed_ips: String,
}

#[derive(Args, Debug)]
pub struct DynamicArgs {
    /// Static QRIS payload.
    #[arg(long, env = "QRIS_STATIC")]
    pub payload: Option<String>,

    /// Total amount, in whole units.
    #[arg(long, allow_negative_numbers = true)]
    pub amount: Option<i64>,

    /// Base amount; the unique code is added to it.
    #[arg(long, allow_negative_numbers = true)]
    pub base_amount: Option<i64>,

    /// Unique code between 0 and 999.
    #[arg(long, allow_negative_numbers = true)]
    pub unique_code: Option<i64>,

    /// Also render the payload as a PNG `data:` URL.
    #[arg(long)]
    pub qr: bool,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Token the event is filed under.
    #[arg(long)]
    pub token: String,

    /// File holding the request body; stdin when omitted.
    pub file: Option<PathBuf>,

    #[arg(long, default_value = "POST")]
    pub method: String,

    #[arg(long)]
    pub content_type: Option<String>,

    /// Address of the delivering peer.
    #[arg(long)]
    pub ip: Option<String>,

    /// Extra request header, `Name: value`. Repeatable.
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Query parameter, `name=value`. Repeatable.
    #[arg(long = "query", value_parser = parse_query)]
    pub query: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub struct EventsArgs {
    #[arg(long)]
    pub token: String,

    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Print summaries instead of full events.
    #[arg(long)]
    pub summary: bool,
}

fn parse_header(value: &str) -> Result<(String, String), String> {
    let (name, value) = value
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got `{}`", value))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("header name is empty".to_string());
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_query(value: &str) -> Result<(String, String), String> {
    let (name, value) = value
        .split_once('=')
        .ok_or_else(|| format!("expected `name=value`, got `{}`", value))?;
    Ok((name.to_string(), value.to_string()))
}
