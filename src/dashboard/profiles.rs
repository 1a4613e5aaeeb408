//! Static per-sensor dashboard profiles.
//!
//! One generic controller plus one of these profiles replaces what would
//! otherwise be three near-identical dashboard implementations: the profile
//! carries everything that actually differs between sensor types.

use crate::charts::{ChartDef, SeriesSource};
use crate::models::{CongestionLevel, LightStatus, PollutionLevel};

// ---

/// Everything sensor-type-specific the generic controller needs.
#[derive(Debug, Clone, Copy)]
pub struct DashboardProfile {
    /// Short name used in logs.
    pub name: &'static str,
    /// Path segment under `/api/sensors/`.
    pub endpoint: &'static str,
    /// Wire query parameter carrying the status filter.
    pub status_param: &'static str,
    /// Full status/level enumeration, in display order.
    pub status_levels: &'static [&'static str],
    /// Charts this dashboard renders.
    pub charts: &'static [ChartDef],
}

// ---

pub static TRAFFIC: DashboardProfile = DashboardProfile {
    name: "traffic",
    endpoint: "traffic",
    status_param: "congestionLevel",
    status_levels: CongestionLevel::LABELS,
    charts: &[
        ChartDef {
            key: "trafficDensity",
            title: "Traffic Density Over Time",
            y_axis: "Vehicles per Hour",
            series_name: "Traffic Density",
            color: "#7b1fa2",
            source: SeriesSource::Metric("trafficDensity"),
        },
        ChartDef {
            key: "avgSpeed",
            title: "Average Speed Over Time",
            y_axis: "Speed (km/h)",
            series_name: "Average Speed",
            color: "#6a1b9a",
            source: SeriesSource::Metric("avgSpeed"),
        },
        ChartDef {
            key: "densityByLocation",
            title: "Traffic Density by Location",
            y_axis: "Vehicles per Hour",
            series_name: "Traffic Density",
            color: "#9c27b0",
            source: SeriesSource::LocationAverage("trafficDensity"),
        },
        ChartDef {
            key: "congestionLevels",
            title: "Congestion Level Distribution",
            y_axis: "Frequency",
            series_name: "Occurrences",
            color: "#8e24aa",
            source: SeriesSource::StatusDistribution,
        },
    ],
};

pub static STREET_LIGHT: DashboardProfile = DashboardProfile {
    name: "street-light",
    endpoint: "street-light",
    status_param: "status",
    status_levels: LightStatus::LABELS,
    charts: &[
        ChartDef {
            key: "brightnessLevel",
            title: "Brightness Level Over Time",
            y_axis: "Brightness (%)",
            series_name: "Brightness Level",
            color: "#7b1fa2",
            source: SeriesSource::Metric("brightnessLevel"),
        },
        ChartDef {
            key: "powerConsumption",
            title: "Power Consumption Over Time",
            y_axis: "Power (W)",
            series_name: "Power Consumption",
            color: "#6a1b9a",
            source: SeriesSource::Metric("powerConsumption"),
        },
        ChartDef {
            key: "lightStatus",
            title: "Light Status Distribution",
            y_axis: "Frequency",
            series_name: "Occurrences",
            color: "#8e24aa",
            source: SeriesSource::StatusDistribution,
        },
    ],
};

pub static AIR_QUALITY: DashboardProfile = DashboardProfile {
    name: "air-pollution",
    endpoint: "air-pollution",
    status_param: "pollutionLevel",
    status_levels: PollutionLevel::LABELS,
    charts: &[
        ChartDef {
            key: "pm2_5",
            title: "PM2.5 Levels Over Time",
            y_axis: "PM2.5 (\u{3bc}g/m\u{b3})",
            series_name: "PM2.5",
            color: "#e91e63",
            source: SeriesSource::Metric("pm2_5"),
        },
        ChartDef {
            key: "ozone",
            title: "Ozone Levels Over Time",
            y_axis: "Ozone (ppb)",
            series_name: "Ozone",
            color: "#00bcd4",
            source: SeriesSource::Metric("ozone"),
        },
        ChartDef {
            key: "pollutionLevels",
            title: "Pollution Level Distribution",
            y_axis: "Frequency",
            series_name: "Occurrences",
            color: "#ff5722",
            source: SeriesSource::StatusDistribution,
        },
    ],
};
