//! Client-side data layer for the CityScope monitoring dashboards.
//!
//! The backend exposes paginated sensor readings (traffic, street lighting,
//! air pollution) and a recent-alerts feed; this crate owns everything
//! between that API and a presentation layer:
//! - a generic [`DashboardController`] that fetches one page at a time,
//!   tracks totals, and derives chart-ready projections, parameterized by a
//!   per-sensor [`DashboardProfile`];
//! - [`LiveDashboard`], the auto-refreshing wrapper that runs a controller
//!   in its own task and publishes [`DashboardSnapshot`]s to views;
//! - [`AlertMonitor`], which polls the alert feed and rotates the display of
//!   one alert at a time.
//!
//! This module is the crate gateway (EMBP): submodules stay private and
//! everything embedders need is re-exported here, so the internal layout can
//! shift without breaking callers.

mod alerts;
mod charts;
mod client;
mod config;
mod context;
mod dashboard;
mod error;
mod models;

// ---

pub use alerts::{AlertMonitor, AlertTimings};
pub use charts::{
    average_of, build_chart, location_averages, status_distribution, time_series, Chart, ChartData,
    ChartDef, SeriesSource,
};
pub use client::{AlertSource, HttpSensorClient, RecordSource};
pub use config::{load_from_env, Config};
pub use context::{AppContext, SessionStore, Theme, TOKEN_KEY};
pub use dashboard::{
    ChartVisibility, DashboardCommand, DashboardController, DashboardProfile, DashboardSnapshot,
    LiveDashboard, QueryState, SortDirection, AIR_QUALITY, STREET_LIGHT, TRAFFIC,
};
pub use error::{FetchError, FetchErrorKind};
pub use models::{
    parse_timestamp, AirQualityRecord, Alert, AlertBatch, AlertDirection, CongestionLevel,
    LightStatus, PageResult, PollutionLevel, SensorFamily, SensorRecord, StreetLightRecord,
    ThresholdRequest, ThresholdSetting, TrafficRecord,
};
