use std::path::Path;

use anyhow::Context;
use bookshelf::cli::{self, Cli};
use bookshelf::{AppContext, Config};
use clap::Parser;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder, prelude::*};

type BookshelfResult<T> = anyhow::Result<T>;

#[tokio::main]
async fn main() -> BookshelfResult<()> {
    let args = Cli::parse();

    // Respect RUST_LOG if set; stdout is reserved for command output.
    let default_filter = format!("{}=info,reqwest=warn,h2=warn", env!("CARGO_PKG_NAME"));
    let env_filter = std::env::var("RUST_LOG").unwrap_or(default_filter);
    SubscriberBuilder::default()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .pretty()
        .finish()
        .with(ErrorLayer::default())
        .init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting bookshelf");

    if Path::new(".env.local").exists() {
        dotenvy::from_filename(".env.local")?;
    } else if Path::new(".env").exists() {
        dotenvy::from_filename(".env")?;
    };
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(api_url) = args.api_url {
        config.api_url = api_url;
    }
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let ctx = AppContext::from_config(&config)
        .with_context(|| format!("Failed to set up client for {}", config.api_url))?;
    let state = ctx.start().await;
    tracing::info!(
        api_url = %config.api_url,
        authenticated = state.is_authenticated(),
        "client ready"
    );

    cli::run(&ctx, args.command).await
}
