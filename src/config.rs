//! Configuration loader for the `cityscope` dashboard client.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.

use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::context::Theme;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Monitoring backend base URL (scheme + host, no trailing slash needed).
    pub api_base_url: String,

    /// Records per dashboard page.
    pub page_size: u32,

    /// Seconds between dashboard auto-refresh loads.
    pub refresh_interval_secs: u32,

    /// Seconds between alert feed polls.
    pub alert_poll_secs: u32,

    /// Milliseconds one alert stays on screen.
    pub alert_display_ms: u32,

    /// Milliseconds between clearing one alert and showing the next.
    pub alert_advance_ms: u32,

    /// Preferred display theme.
    pub theme: Theme,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `SENSOR_API_URL` – monitoring backend base URL
///
/// Optional:
/// - `DASHBOARD_PAGE_SIZE` – records per page (default: 10)
/// - `REFRESH_INTERVAL_SECS` – auto-refresh period (default: 60)
/// - `ALERT_POLL_SECS` – alert poll period (default: 60)
/// - `ALERT_DISPLAY_MS` – alert on-screen time (default: 5000)
/// - `ALERT_ADVANCE_MS` – gap between alerts (default: 100)
/// - `PREFERRED_THEME` – `light` or `dark` (default: dark)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let api_base_url = require_env!("SENSOR_API_URL");
    let page_size = parse_env_u32!("DASHBOARD_PAGE_SIZE", 10);
    let refresh_interval_secs = parse_env_u32!("REFRESH_INTERVAL_SECS", 60);
    let alert_poll_secs = parse_env_u32!("ALERT_POLL_SECS", 60);
    let alert_display_ms = parse_env_u32!("ALERT_DISPLAY_MS", 5_000);
    let alert_advance_ms = parse_env_u32!("ALERT_ADVANCE_MS", 100);
    let theme = Theme::from_preference(&env::var("PREFERRED_THEME").unwrap_or_default());

    if page_size == 0 {
        return Err(anyhow!("DASHBOARD_PAGE_SIZE must be at least 1"));
    }

    Ok(Config {
        api_base_url,
        page_size,
        refresh_interval_secs,
        alert_poll_secs,
        alert_display_ms,
        alert_advance_ms,
        theme,
    })
}

impl Config {
    // ---
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.refresh_interval_secs))
    }

    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  SENSOR_API_URL        : {}", self.api_base_url);
        tracing::info!("  DASHBOARD_PAGE_SIZE   : {}", self.page_size);
        tracing::info!("  REFRESH_INTERVAL_SECS : {}", self.refresh_interval_secs);
        tracing::info!("  ALERT_POLL_SECS       : {}", self.alert_poll_secs);
        tracing::info!("  ALERT_DISPLAY_MS      : {}", self.alert_display_ms);
        tracing::info!("  ALERT_ADVANCE_MS      : {}", self.alert_advance_ms);
        tracing::info!("  PREFERRED_THEME       : {}", self.theme.as_str());
    }
}
