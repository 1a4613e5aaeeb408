//! Data models for the sensor dashboards and the alert feed.
//!
//! Field names and enum spellings follow the backend's JSON wire format
//! (camelCase properties, `Very_Unhealthy`-style enum constants), so these
//! types deserialize straight off `/api/sensors/*` and `/api/alerts/recent`
//! responses.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---

/// Parse a wire timestamp leniently.
///
/// The backend serializes `LocalDateTime` without a zone designator, while
/// other producers emit full RFC 3339. Zone-less values are taken as UTC.
/// Anything unparseable yields `None`; callers drop such records from
/// time-series and "latest" computations instead of failing.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    // ---
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Common surface of one sensor reading, whatever the sensor type.
///
/// The dashboard controller and chart projections only ever go through this
/// trait; concrete record types stay plain serde structs.
pub trait SensorRecord: Clone + Send + Sync + 'static {
    // ---
    fn id(&self) -> Uuid;
    fn location(&self) -> &str;

    /// The raw wire timestamp, unvalidated.
    fn timestamp_raw(&self) -> &str;

    /// Parsed instant, or `None` when the wire value is garbage.
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.timestamp_raw())
    }

    /// Look up a numeric metric by its wire field name.
    fn metric(&self, field: &str) -> Option<f64>;

    /// The categorical status/level label used for distribution charts.
    fn status_label(&self) -> &'static str;
}

// ---

/// Congestion bands reported by traffic sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CongestionLevel {
    Low,
    Moderate,
    High,
    Severe,
}

impl CongestionLevel {
    pub const LABELS: &'static [&'static str] = &["Low", "Moderate", "High", "Severe"];

    pub fn as_str(&self) -> &'static str {
        match self {
            CongestionLevel::Low => "Low",
            CongestionLevel::Moderate => "Moderate",
            CongestionLevel::High => "High",
            CongestionLevel::Severe => "Severe",
        }
    }
}

/// Operational state of a street light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LightStatus {
    On,
    Off,
    Maintenance,
}

impl LightStatus {
    pub const LABELS: &'static [&'static str] = &["ON", "OFF", "MAINTENANCE"];

    pub fn as_str(&self) -> &'static str {
        match self {
            LightStatus::On => "ON",
            LightStatus::Off => "OFF",
            LightStatus::Maintenance => "MAINTENANCE",
        }
    }
}

/// AQI-style bands reported by air pollution sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollutionLevel {
    Good,
    Moderate,
    Unhealthy,
    #[serde(rename = "Very_Unhealthy")]
    VeryUnhealthy,
    Hazardous,
}

impl PollutionLevel {
    pub const LABELS: &'static [&'static str] =
        &["Good", "Moderate", "Unhealthy", "Very_Unhealthy", "Hazardous"];

    pub fn as_str(&self) -> &'static str {
        match self {
            PollutionLevel::Good => "Good",
            PollutionLevel::Moderate => "Moderate",
            PollutionLevel::Unhealthy => "Unhealthy",
            PollutionLevel::VeryUnhealthy => "Very_Unhealthy",
            PollutionLevel::Hazardous => "Hazardous",
        }
    }
}

// ---

/// One traffic sensor reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficRecord {
    // ---
    pub id: Uuid,
    pub location: String,
    pub timestamp: String,
    pub traffic_density: u32,
    pub avg_speed: f32,
    pub congestion_level: CongestionLevel,
}

impl SensorRecord for TrafficRecord {
    // ---
    fn id(&self) -> Uuid {
        self.id
    }
    fn location(&self) -> &str {
        &self.location
    }
    fn timestamp_raw(&self) -> &str {
        &self.timestamp
    }
    fn metric(&self, field: &str) -> Option<f64> {
        match field {
            "trafficDensity" => Some(f64::from(self.traffic_density)),
            "avgSpeed" => Some(f64::from(self.avg_speed)),
            _ => None,
        }
    }
    fn status_label(&self) -> &'static str {
        self.congestion_level.as_str()
    }
}

/// One street light sensor reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreetLightRecord {
    // ---
    pub id: Uuid,
    pub location: String,
    pub timestamp: String,
    pub brightness_level: u32,
    pub power_consumption: f32,
    pub status: LightStatus,
}

impl SensorRecord for StreetLightRecord {
    // ---
    fn id(&self) -> Uuid {
        self.id
    }
    fn location(&self) -> &str {
        &self.location
    }
    fn timestamp_raw(&self) -> &str {
        &self.timestamp
    }
    fn metric(&self, field: &str) -> Option<f64> {
        match field {
            "brightnessLevel" => Some(f64::from(self.brightness_level)),
            "powerConsumption" => Some(f64::from(self.power_consumption)),
            _ => None,
        }
    }
    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }
}

/// One air pollution sensor reading.
///
/// No `rename_all` here: `pm2_5` and `pm10` are snake_case on the wire too,
/// only `pollutionLevel` is camelCase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirQualityRecord {
    // ---
    pub id: Uuid,
    pub location: String,
    pub timestamp: String,
    pub pm2_5: f32,
    pub pm10: f32,
    pub co: f32,
    pub no2: f32,
    pub so2: f32,
    pub ozone: f32,
    #[serde(rename = "pollutionLevel")]
    pub pollution_level: PollutionLevel,
}

impl SensorRecord for AirQualityRecord {
    // ---
    fn id(&self) -> Uuid {
        self.id
    }
    fn location(&self) -> &str {
        &self.location
    }
    fn timestamp_raw(&self) -> &str {
        &self.timestamp
    }
    fn metric(&self, field: &str) -> Option<f64> {
        match field {
            "pm2_5" => Some(f64::from(self.pm2_5)),
            "pm10" => Some(f64::from(self.pm10)),
            "co" => Some(f64::from(self.co)),
            "no2" => Some(f64::from(self.no2)),
            "so2" => Some(f64::from(self.so2)),
            "ozone" => Some(f64::from(self.ozone)),
            _ => None,
        }
    }
    fn status_label(&self) -> &'static str {
        self.pollution_level.as_str()
    }
}

// ---

/// One page of records as returned by `/api/sensors/{endpoint}`.
///
/// Consumed exactly once per request: `content` replaces the controller's
/// current data wholesale, never merges into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<R> {
    pub content: Vec<R>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub size: u32,
    pub number: u32,
}

// ---

/// Direction of a threshold breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertDirection {
    Above,
    Below,
}

/// Which sensor family a setting or alert refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorFamily {
    Traffic,
    #[serde(rename = "Air_Pollution")]
    AirPollution,
    #[serde(rename = "Street_Light")]
    StreetLight,
}

/// A server-detected threshold breach, shown transiently to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    // ---
    pub id: Uuid,
    pub metric: String,
    pub value: f32,
    pub threshold_value: f32,
    pub alert_type: AlertDirection,
    #[serde(rename = "type")]
    pub sensor: SensorFamily,
    pub triggered_at: String,
}

/// Envelope returned by `/api/alerts/recent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertBatch {
    pub message: String,
    pub count: u32,
    pub data: Vec<Alert>,
}

// ---

/// Request body for `POST /api/settings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdRequest {
    #[serde(rename = "type")]
    pub sensor: SensorFamily,
    pub metric: String,
    pub threshold_value: f32,
    pub alert_type: AlertDirection,
}

/// A stored alert threshold as echoed back by the settings endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdSetting {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub sensor: SensorFamily,
    pub metric: String,
    pub threshold_value: f32,
    pub alert_type: AlertDirection,
    pub created_at: String,
}
