//! CLI entry point for the cookie broker host.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cookie_broker_core::{
    CookieBroker, CookieStore, FilePolicyStore, MemoryCookieStore, MessageHost, PolicyStore,
    StaticPolicyStore, import_cookie_file,
};
use tracing::{debug, info, warn};

mod app_config;
mod cli;

use app_config::{Settings, load_config, resolve_settings};
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let loaded = load_config(args.config.as_deref())?;
    let settings = resolve_settings(&args, loaded.config.as_ref());

    // Priority: RUST_LOG env var > -q/-v flags > config file verbosity > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(settings.log_level));

    // stdout carries response envelopes, so logs must stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    if args.print_config {
        print_settings(&settings, loaded.path.as_deref(), loaded.config.is_some());
        return Ok(());
    }

    let policy_store: Arc<dyn PolicyStore> = match &settings.policy_file {
        Some(path) => {
            info!(path = %path.display(), "Using managed policy file");
            Arc::new(FilePolicyStore::new(path))
        }
        None => {
            warn!("No policy file configured; every caller will receive no cookies");
            Arc::new(StaticPolicyStore::unconfigured())
        }
    };

    let cookie_store: Arc<dyn CookieStore> = match &settings.cookie_file {
        Some(path) => {
            let imported = import_cookie_file(path)
                .await
                .with_context(|| format!("Cannot load cookie file '{}'", path.display()))?;
            for warning in &imported.warnings {
                warn!(reason = %warning, "Skipping cookie during import");
            }
            Arc::new(MemoryCookieStore::from_records(imported.cookies))
        }
        None => {
            info!("No cookie file configured; serving an empty cookie store");
            Arc::new(MemoryCookieStore::new())
        }
    };

    let broker = CookieBroker::new(policy_store, cookie_store);
    let host = MessageHost::new(broker, settings.framing);

    info!(framing = %settings.framing, "Cookie broker listening on stdin");
    let summary = host
        .run(tokio::io::stdin(), tokio::io::stdout())
        .await
        .context("Message host stopped")?;

    debug!(?summary, "Cookie broker exiting");
    Ok(())
}

fn print_settings(settings: &Settings, config_path: Option<&std::path::Path>, loaded: bool) {
    let resolved_path =
        config_path.map_or_else(|| "<unresolved>".to_string(), |path| path.display().to_string());
    println!("config_path = {resolved_path}");
    println!(
        "config_file = {}",
        if loaded {
            "loaded"
        } else {
            "not found (using defaults)"
        }
    );
    println!(
        "policy_file = {}",
        settings
            .policy_file
            .as_ref()
            .map_or_else(|| "<none>".to_string(), |path| path.display().to_string())
    );
    println!(
        "cookie_file = {}",
        settings
            .cookie_file
            .as_ref()
            .map_or_else(|| "<none>".to_string(), |path| path.display().to_string())
    );
    println!("framing = {}", settings.framing);
    println!("log_level = {}", settings.log_level);
}
