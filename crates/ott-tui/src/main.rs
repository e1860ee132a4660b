mod action;
mod app;
mod app_state;
mod component;
mod components;
mod focus;
mod http;
mod layout_grid;
mod theme;
mod widgets;

use std::sync::Arc;

use ott_proto::clock::{Clock, SystemClock};
use ott_proto::config::Config;
use ott_proto::live_channels::{LiveChannels, LiveOptions};
use ott_proto::models::PlaylistItem;
use ott_proto::schedule::SourceScheduleService;
use ott_proto::screen::classify;

/// Keep the entries that have a program guide; everything else belongs to
/// screens this binary does not have.
fn live_playlist(items: &[PlaylistItem]) -> Vec<PlaylistItem> {
    items
        .iter()
        .filter(|item| {
            let kind = classify(item);
            if !kind.has_schedule() {
                tracing::info!("skipping {} ({}): no program guide", item.id, kind.label());
            }
            kind.has_schedule()
        })
        .cloned()
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = ott_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("ott-epg.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // RUST_LOG overrides; HTTP client internals are noisy at debug.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("ott-epg log: {}", log_path.display());

    tracing::info!("ott-epg starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("config unreadable, using defaults: {:#}", e);
        Config::default()
    });
    let playlist = live_playlist(&config.channels);
    if playlist.is_empty() {
        eprintln!(
            "no live channels configured; add [[channels]] entries to {}",
            Config::config_path().display()
        );
    }

    // ── Tracker ──────────────────────────────────────────────────────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let service = SourceScheduleService::new(config.schedule.request_timeout())?;
    let live = LiveChannels::spawn(
        Arc::new(service),
        playlist,
        LiveOptions {
            initial_channel_id: config.ui.initial_channel.clone(),
            auto_update: config.ui.auto_update,
            fallback_interval: config.schedule.fallback_interval(),
        },
        Arc::clone(&clock),
    );

    // ── HTTP server ──────────────────────────────────────────────────────────
    let http_addr = if config.http.enabled {
        http::start_server(
            config.http.bind_address.clone(),
            config.http.port,
            live.clone(),
            Arc::clone(&clock),
        );
        Some(format!("{}:{}", config.http.bind_address, config.http.port))
    } else {
        None
    };

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(live, clock, config.ui.grid_card_width, http_addr);
    app.run().await?;

    Ok(())
}
