//! Chart-ready projections over a page of sensor records.
//!
//! These are pure functions: the controller feeds them its current page and
//! binds the resulting [`Chart`] values straight to the presentation layer.
//! Records with unparseable timestamps are silently dropped from time-series
//! output; aggregations never divide by zero.

use serde::Serialize;

use crate::models::SensorRecord;

// ---

/// How one chart derives its series from the record page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesSource {
    /// Time series over one numeric metric, sorted by timestamp ascending.
    Metric(&'static str),
    /// Frequency of each status/level value, zero-filled over the full set.
    StatusDistribution,
    /// Per-location average of one numeric metric.
    LocationAverage(&'static str),
}

/// Static description of one chart a dashboard renders.
#[derive(Debug, Clone, Copy)]
pub struct ChartDef {
    /// Stable key used by the chart-visibility toggles.
    pub key: &'static str,
    pub title: &'static str,
    pub y_axis: &'static str,
    pub series_name: &'static str,
    pub color: &'static str,
    pub source: SeriesSource,
}

/// A chart definition materialized against the current page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub key: &'static str,
    pub title: &'static str,
    pub y_axis: &'static str,
    pub series_name: &'static str,
    pub color: &'static str,
    pub data: ChartData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChartData {
    /// `(epoch milliseconds, value)` pairs, ascending by time.
    TimeSeries(Vec<(i64, f64)>),
    Distribution {
        categories: Vec<&'static str>,
        counts: Vec<u64>,
    },
    LocationAverages {
        locations: Vec<String>,
        values: Vec<f64>,
    },
}

// ---

/// Time-series points for one metric, valid timestamps only, time-ascending.
pub fn time_series<R: SensorRecord>(data: &[R], field: &str) -> Vec<(i64, f64)> {
    // ---
    let mut points: Vec<(i64, f64)> = data
        .iter()
        .filter_map(|r| Some((r.timestamp()?.timestamp_millis(), r.metric(field)?)))
        .collect();
    points.sort_by_key(|&(t, _)| t);
    points
}

/// Occurrence counts per status category.
///
/// Every category is present in the output, zero when unseen; labels outside
/// the category set are ignored rather than counted into a catch-all.
pub fn status_distribution<R: SensorRecord>(
    data: &[R],
    categories: &'static [&'static str],
) -> (Vec<&'static str>, Vec<u64>) {
    // ---
    let mut counts = vec![0u64; categories.len()];
    for record in data {
        if let Some(slot) = categories.iter().position(|c| *c == record.status_label()) {
            counts[slot] += 1;
        }
    }
    (categories.to_vec(), counts)
}

/// Average of one metric per location, first-seen location order.
pub fn location_averages<R: SensorRecord>(data: &[R], field: &str) -> (Vec<String>, Vec<f64>) {
    // ---
    let mut entries: Vec<(String, f64, u32)> = Vec::new();
    for record in data {
        let Some(value) = record.metric(field) else { continue };
        match entries.iter_mut().find(|(loc, _, _)| loc == record.location()) {
            Some((_, sum, count)) => {
                *sum += value;
                *count += 1;
            }
            None => entries.push((record.location().to_string(), value, 1)),
        }
    }

    let mut locations = Vec::with_capacity(entries.len());
    let mut values = Vec::with_capacity(entries.len());
    for (location, sum, count) in entries {
        locations.push(location);
        values.push(sum / f64::from(count));
    }
    (locations, values)
}

/// Average of one metric over the records that carry it. Empty input is 0,
/// never NaN.
pub fn average_of<R: SensorRecord>(data: &[R], field: &str) -> f64 {
    // ---
    let values: Vec<f64> = data.iter().filter_map(|r| r.metric(field)).collect();
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Materialize one chart definition against the current page.
pub fn build_chart<R: SensorRecord>(
    def: &ChartDef,
    data: &[R],
    status_levels: &'static [&'static str],
) -> Chart {
    // ---
    let chart_data = match def.source {
        SeriesSource::Metric(field) => ChartData::TimeSeries(time_series(data, field)),
        SeriesSource::StatusDistribution => {
            let (categories, counts) = status_distribution(data, status_levels);
            ChartData::Distribution { categories, counts }
        }
        SeriesSource::LocationAverage(field) => {
            let (locations, values) = location_averages(data, field);
            ChartData::LocationAverages { locations, values }
        }
    };

    Chart {
        key: def.key,
        title: def.title,
        y_axis: def.y_axis,
        series_name: def.series_name,
        color: def.color,
        data: chart_data,
    }
}
