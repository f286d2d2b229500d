use chrono::TimeDelta;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use qris_relay::application::event_store::{EventStore, StoreConfig};
use qris_relay::application::service::QrisService;
use qris_relay::domain::money::AmountInput;
use qris_relay::domain::ports::EventBackendBox;
use qris_relay::domain::request::{IpAllowList, WebhookRequest};
use qris_relay::infrastructure::clock::SystemClock;
use qris_relay::infrastructure::fallback_log::JsonLinesLog;
use qris_relay::infrastructure::in_memory::InMemoryEventBackend;
use qris_relay::interfaces::cli::{Cli, Commands, StoreArgs};
use qris_relay::interfaces::logging::init_logging;
use serde::Serialize;
use std::io::{self, Read, Write};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging("info", cli.log_format);

    let service = build_service(&cli.store).await?;

    match cli.command {
        Commands::Dynamic(args) => {
            let input = AmountInput::from_parts(args.base_amount, args.unique_code, args.amount)
                .into_diagnostic()?;
            let mut result = service
                .generate_dynamic(args.payload.as_deref(), input)
                .into_diagnostic()?;
            if args.qr {
                result = result.with_qr_png().into_diagnostic()?;
            }
            print_json(&result)?;
        }
        Commands::Ingest(args) => {
            let body = match &args.file {
                Some(path) => std::fs::read(path).into_diagnostic()?,
                None => {
                    let mut buf = Vec::new();
                    io::stdin().read_to_end(&mut buf).into_diagnostic()?;
                    buf
                }
            };

            let mut request = WebhookRequest::new(args.token, args.method, body);
            for (name, value) in args.headers {
                request = request.with_header(&name, value);
            }
            if let Some(content_type) = args.content_type {
                request = request.with_header("content-type", content_type);
            }
            if let Some(ip) = args.ip {
                request = request.with_peer_addr(ip);
            }
            request.query.extend(args.query);

            let event = service.ingest_webhook(request).await.into_diagnostic()?;
            print_json(&event)?;
        }
        Commands::Events(args) => {
            if args.summary {
                print_json(&service.query_summary(&args.token, args.limit).await)?;
            } else {
                print_json(&service.query_events(&args.token, args.limit).await)?;
            }
        }
    }

    Ok(())
}

async fn build_service(args: &StoreArgs) -> Result<QrisService> {
    let config = StoreConfig {
        max_keep: args.max_keep,
        ttl: TimeDelta::seconds(i64::from(args.ttl_secs)),
        key_prefix: args.key_prefix.clone(),
    };

    let backend = select_backend(args).await?;
    let mut store = EventStore::new(backend, Arc::new(SystemClock::new()), config);
    if let Some(path) = &args.fallback_log {
        store = store.with_fallback(Box::new(JsonLinesLog::new(path)));
    }

    Ok(QrisService::new(store).with_allow_list(IpAllowList::parse(&args.allowed_ips)))
}

async fn select_backend(args: &StoreArgs) -> Result<EventBackendBox> {
    if let Some(url) = &args.redis_url {
        #[cfg(feature = "storage-redis")]
        {
            use qris_relay::infrastructure::redis_store::RedisEventBackend;
            use qris_relay::infrastructure::unavailable::UnavailableBackend;
            let backend: EventBackendBox = match RedisEventBackend::connect(url).await {
                Ok(backend) => Box::new(backend),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Could not connect to Redis; events will go to the fallback log if one is configured"
                    );
                    Box::new(UnavailableBackend::new(e.to_string()))
                }
            };
            return Ok(backend);
        }
        #[cfg(not(feature = "storage-redis"))]
        {
            let _ = url;
            tracing::warn!(
                "Redis storage requested via --redis-url, but 'storage-redis' feature is not enabled. Falling back to in-memory storage."
            );
        }
    }

    if let Some(db_path) = &args.db_path {
        #[cfg(feature = "storage-rocksdb")]
        {
            use qris_relay::infrastructure::rocksdb::RocksDBEventBackend;
            let backend = RocksDBEventBackend::open(db_path).into_diagnostic()?;
            return Ok(Box::new(backend));
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        {
            let _ = db_path;
            tracing::warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
        }
    }

    Ok(Box::new(InMemoryEventBackend::new()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).into_diagnostic()?;
    writeln!(out).into_diagnostic()?;
    Ok(())
}
