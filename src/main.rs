// src/main.rs
use anyhow::{Context, Result};
use chromiumoxide::{Browser, BrowserConfig, browser::HeadlessMode, handler::viewport::Viewport};
use clap::Parser;
use futures::StreamExt;
use std::path::Path;
use tokio::{signal, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use ytreact_overview::{Args, ChromiumHost, Settings, Watcher, YoutubeDataApi};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let settings = args.settings()?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        start_url = %settings.start_url,
        batch_size = settings.watcher.batch_size,
        "Starting ytreact-overview"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(handle_signals(shutdown.clone()));

    let profile = tempfile::tempdir().context("failed to create browser profile dir")?;
    let (mut browser, mut handler) =
        Browser::launch(config_browser(&settings, profile.path())?).await?;
    tokio::spawn(async move { while handler.next().await.is_some() {} });

    let page = browser.new_page(settings.start_url.as_str()).await?;
    page.wait_for_navigation_response().await?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let host = ChromiumHost::connect(page.clone(), events_tx).await?;
    let api = YoutubeDataApi::new(&settings.api_endpoint, &settings.api_key);

    let watcher = Watcher::new(host, api, settings.watcher.clone(), shutdown.clone());
    let summary = watcher.run(events_rx).await;

    page.close().await.ok();
    browser.close().await.ok();
    if let Some(Err(err)) = browser.kill().await {
        warn!(error = %err, "Browser did not exit cleanly");
    }

    let summary = summary?;
    info!(
        started_at = %summary.started_at.to_rfc3339(),
        batches = summary.counters.batches,
        annotated = summary.counters.annotated,
        cached = summary.counters.cached,
        failed = summary.counters.failed_batches,
        "Session finished"
    );
    Ok(())
}

async fn handle_signals(shutdown: CancellationToken) {
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for Ctrl+C");
        return;
    }
    info!("Graceful shutdown triggered");
    shutdown.cancel();
}

fn config_browser(settings: &Settings, profile: &Path) -> Result<BrowserConfig> {
    let mode = if settings.headless {
        HeadlessMode::True
    } else {
        HeadlessMode::False
    };

    BrowserConfig::builder()
        .headless_mode(mode)
        .user_data_dir(profile)
        .args([
            "--disable-popup-blocking",
            "--disable-crash-reporter",
            "--disable-sync-preferences",
            "--disable-background-timer-throttling",
            "--disable-renderer-backgrounding",
            "--disable-extensions",
            "--disable-dev-shm-usage",
            "--disable-default-apps",
            "--disable-sync",
            "--disable-translate",
            "--no-first-run",
            "--disable-backgrounding-occluded-windows",
            "--disable-blink-features=AutomationControlled", // Hides automation
        ])
        .viewport(Some(Viewport {
            width: 1280,
            height: 720,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        }))
        .build()
        .map_err(anyhow::Error::msg)
}
