//! Query state driving the next page fetch.

use chrono::{DateTime, SecondsFormat, Utc};

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    // ---
    pub fn as_wire(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    pub fn flipped(&self) -> SortDirection {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Current page/sort/filter parameters, owned exclusively by the controller.
///
/// `page` is 1-based here and converted to the backend's 0-based index on the
/// wire. Blank or whitespace-only filters are omitted from the wire entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    // ---
    pub page: u32,
    pub page_size: u32,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    pub location_filter: String,
    pub status_filter: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Default for QueryState {
    fn default() -> Self {
        // Fresh dashboards show the newest readings first
        Self {
            page: 1,
            page_size: 10,
            sort_field: "timestamp".to_string(),
            sort_direction: SortDirection::Descending,
            location_filter: String::new(),
            status_filter: String::new(),
            start_time: None,
            end_time: None,
        }
    }
}

impl QueryState {
    // ---
    /// Apply a sort selection: same field flips direction, a new field starts
    /// ascending. Either way the page resets to 1.
    pub fn toggle_sort(&mut self, field: &str) {
        // ---
        if self.sort_field == field {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_field = field.to_string();
            self.sort_direction = SortDirection::Ascending;
        }
        self.page = 1;
    }

    /// Build the wire query parameters for `/api/sensors/{endpoint}`.
    ///
    /// `status_key` names the status-filter parameter for the concrete
    /// sensor type (`congestionLevel`, `status`, `pollutionLevel`).
    pub fn wire_params(&self, status_key: &str) -> Vec<(String, String)> {
        // ---
        let mut params = vec![
            ("page".to_string(), self.page.saturating_sub(1).to_string()),
            ("size".to_string(), self.page_size.to_string()),
            ("sortBy".to_string(), self.sort_field.clone()),
            ("order".to_string(), self.sort_direction.as_wire().to_string()),
        ];

        if !self.location_filter.trim().is_empty() {
            params.push(("location".to_string(), self.location_filter.clone()));
        }
        if let Some(start) = self.start_time {
            params.push(("start".to_string(), iso_instant(start)));
        }
        if let Some(end) = self.end_time {
            params.push(("end".to_string(), iso_instant(end)));
        }
        if !self.status_filter.trim().is_empty() {
            params.push((status_key.to_string(), self.status_filter.clone()));
        }

        params
    }
}

/// ISO-8601 instant with millisecond precision and a `Z` designator, the
/// format the backend's date-range filter expects.
fn iso_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}
