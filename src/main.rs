//! Terminal entry point for the `cityscope` dashboard client.
//!
//! This binary wires one live dashboard and the alert feed against a running
//! monitoring backend and mirrors what a browser shell would bind to:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Building the app context (session store + shared HTTP client)
//! - Spawning the selected dashboard's refresh loop and the alert monitor
//! - Logging every snapshot and visible-alert change until Ctrl-C
//!
//! # Environment Variables
//! - `SENSOR_API_URL` (**required**) – monitoring backend base URL
//! - `DASHBOARD` (optional) – `traffic`, `street-light` or `air-pollution`
//!   (default: `traffic`)
//! - `SESSION_TOKEN` (optional) – bearer token for authenticated backends
//! - `DASH_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `DASH_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! Plus the knobs documented in `config.rs` (page size, refresh and alert
//! timing, theme).

use std::{env, io::IsTerminal};

use anyhow::{bail, Result};
use dotenvy::dotenv;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use cityscope::{
    load_from_env, AirQualityRecord, AlertMonitor, AlertTimings, AppContext, DashboardController,
    DashboardProfile, DashboardSnapshot, LiveDashboard, SensorRecord, StreetLightRecord,
    TrafficRecord, AIR_QUALITY, STREET_LIGHT, TOKEN_KEY, TRAFFIC,
};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = load_from_env()?;
    cfg.log_config();

    let ctx = AppContext::new(cfg);
    if let Ok(token) = env::var("SESSION_TOKEN") {
        ctx.session.put(TOKEN_KEY, token);
    }

    let dashboard = env::var("DASHBOARD").unwrap_or_else(|_| "traffic".to_string());
    tracing::info!(
        "Starting {} dashboard ({} theme)",
        dashboard,
        ctx.config.theme.as_str()
    );

    match dashboard.as_str() {
        "traffic" => run_dashboard::<TrafficRecord>(&TRAFFIC, &ctx).await,
        "street-light" => run_dashboard::<StreetLightRecord>(&STREET_LIGHT, &ctx).await,
        "air-pollution" => run_dashboard::<AirQualityRecord>(&AIR_QUALITY, &ctx).await,
        other => bail!("unknown DASHBOARD '{other}' (expected traffic, street-light or air-pollution)"),
    }
}

// ---

/// Drive one dashboard plus the alert feed until Ctrl-C.
async fn run_dashboard<R>(profile: &'static DashboardProfile, ctx: &AppContext) -> Result<()>
where
    R: SensorRecord + DeserializeOwned + Serialize,
{
    // ---
    let mut controller: DashboardController<R, _> = DashboardController::new(profile, ctx.client.clone());
    controller.set_page_size(ctx.config.page_size);

    let dashboard = LiveDashboard::spawn(controller, ctx.config.refresh_interval());
    let monitor = AlertMonitor::start(ctx.client.clone(), AlertTimings::from_config(&ctx.config));

    let mut snapshots = dashboard.snapshots();
    let mut visible = monitor.visible();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = snapshots.borrow_and_update().clone();
                log_snapshot(profile, &snap);
            }

            changed = visible.changed() => {
                if changed.is_err() {
                    break;
                }
                let alerts = visible.borrow_and_update().clone();
                match alerts.first() {
                    Some(alert) => tracing::warn!(
                        "ALERT {} {:?} threshold {} (measured {}) triggered at {}",
                        alert.metric,
                        alert.alert_type,
                        alert.threshold_value,
                        alert.value,
                        alert.triggered_at
                    ),
                    None => tracing::info!("alert display cleared"),
                }
            }
        }
    }

    tracing::info!("Shutting down");
    dashboard.stop().await;
    monitor.stop().await;

    Ok(())
}

fn log_snapshot<R>(profile: &'static DashboardProfile, snap: &DashboardSnapshot<R>)
where
    R: SensorRecord + Serialize,
{
    // ---
    tracing::info!(
        "{}: page {}/{} ({} records of {})",
        profile.name,
        snap.page,
        snap.total_pages,
        snap.data.len(),
        snap.total_elements
    );

    if let Some(kind) = snap.last_error {
        tracing::warn!("last fetch failed: {:?}", kind);
    }

    // Newest reading, if this page carries any with a valid timestamp
    let latest = snap
        .data
        .iter()
        .filter_map(|r| r.timestamp().map(|ts| (ts, r)))
        .max_by_key(|(ts, _)| *ts)
        .map(|(_, r)| r);
    if let Some(record) = latest {
        if let Ok(json) = serde_json::to_string(record) {
            tracing::info!("latest reading: {}", json);
        }
    }

    for chart in snap.charts.iter().filter(|c| snap.visibility.is_visible(c.key)) {
        tracing::debug!("chart '{}' ready ({})", chart.title, chart.key);
    }
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `DASH_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `DASH_LOG_LEVEL` env var
///
/// This should be called once at application startup before any logging
/// or tracing macros are invoked. It installs the subscriber globally
/// for the lifetime of the process.
fn init_tracing() {
    // ---
    let span_events = match env::var("DASH_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to DASH_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("DASH_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},hyper_util=warn,reqwest::connect=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
