//! Generic paginated dashboard controller.
//!
//! One controller type serves every sensor dashboard; a static
//! [`DashboardProfile`] supplies the endpoint, status-filter key, status
//! enumeration and chart definitions that differ between sensor types. The
//! controller owns its [`QueryState`] outright: views mutate it only through
//! the operations here, never directly.

use tracing::{debug, error, info};

use crate::charts::{self, Chart};
use crate::client::RecordSource;
use crate::dashboard::profiles::DashboardProfile;
use crate::dashboard::query::QueryState;
use crate::error::{FetchError, FetchErrorKind};
use crate::models::SensorRecord;

// ---

/// Which charts a dashboard is currently showing.
///
/// Either everything (`show_all`) or exactly one selected chart. Selecting
/// the already-selected chart restores "show all" (toggle semantics).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartVisibility {
    pub show_all: bool,
    pub selected: Option<String>,
}

impl Default for ChartVisibility {
    fn default() -> Self {
        Self {
            show_all: true,
            selected: None,
        }
    }
}

impl ChartVisibility {
    // ---
    pub fn toggle_all(&mut self) {
        self.show_all = !self.show_all;
        if self.show_all {
            self.selected = None;
        }
    }

    pub fn toggle(&mut self, key: &str) {
        if self.selected.as_deref() == Some(key) {
            self.show_all = true;
            self.selected = None;
        } else {
            self.show_all = false;
            self.selected = Some(key.to_string());
        }
    }

    pub fn is_visible(&self, key: &str) -> bool {
        self.show_all || self.selected.as_deref() == Some(key)
    }
}

// ---

/// Fetches one page of sensor records at a time and derives chart-ready
/// views from it.
///
/// `S` is the data source (the HTTP client in production, a scripted fake in
/// tests). Failed loads clear the data so stale results are never rendered;
/// nothing is retried automatically; the next user action or refresh tick
/// is the only retry path.
pub struct DashboardController<R, S> {
    // ---
    profile: &'static DashboardProfile,
    source: S,
    query: QueryState,
    data: Vec<R>,
    total_elements: u64,
    charts: Vec<Chart>,
    visibility: ChartVisibility,
    last_error: Option<FetchErrorKind>,
}

impl<R, S> DashboardController<R, S>
where
    R: SensorRecord,
    S: RecordSource<R>,
{
    pub fn new(profile: &'static DashboardProfile, source: S) -> Self {
        // ---
        Self {
            profile,
            source,
            query: QueryState::default(),
            data: Vec::new(),
            total_elements: 0,
            charts: Vec::new(),
            visibility: ChartVisibility::default(),
            last_error: None,
        }
    }

    /// Fetch the page described by the current query state.
    ///
    /// On success the page content replaces `data` wholesale, the page index
    /// is clamped to the reported range, and the charts are rebuilt. On
    /// failure `data` is cleared, the failure class is recorded, and the
    /// classified error is returned for the embedding view (a 401 means
    /// "redirect to login", which is the view's job, not ours).
    pub async fn load(&mut self) -> Result<(), FetchError> {
        // ---
        debug!(
            dashboard = self.profile.name,
            page = self.query.page,
            "loading sensor data page"
        );

        let fetched = self
            .source
            .fetch_page(self.profile.endpoint, self.profile.status_param, &self.query)
            .await;

        match fetched {
            Ok(page) => {
                self.data = page.content;
                self.total_elements = page.total_elements;
                self.last_error = None;
                self.clamp_page();
                self.rebuild_charts();
                info!(
                    dashboard = self.profile.name,
                    records = self.data.len(),
                    total = self.total_elements,
                    "dashboard page loaded"
                );
                Ok(())
            }
            Err(err) => {
                // Stale data must never be rendered after a failed load
                self.data.clear();
                self.last_error = Some(err.kind());
                match err.kind() {
                    FetchErrorKind::Unauthorized => {
                        error!(dashboard = self.profile.name, "session rejected (401), login required");
                    }
                    FetchErrorKind::Forbidden => {
                        error!(dashboard = self.profile.name, "access denied (403) for this resource");
                    }
                    FetchErrorKind::Unreachable => {
                        error!(dashboard = self.profile.name, error = %err, "backend unreachable");
                    }
                    FetchErrorKind::Other => {
                        error!(dashboard = self.profile.name, error = %err, "sensor data fetch failed");
                    }
                }
                Err(err)
            }
        }
    }

    /// Apply a sort selection and reload. Repeating the current field flips
    /// the direction; a new field restarts ascending. Page resets to 1.
    pub async fn sort(&mut self, field: &str) -> Result<(), FetchError> {
        // ---
        self.query.toggle_sort(field);
        self.load().await
    }

    /// Reload after any filter edit, starting back at page 1.
    pub async fn on_filter_change(&mut self) -> Result<(), FetchError> {
        // ---
        self.query.page = 1;
        self.load().await
    }

    /// Jump to `page` and reload; out-of-range targets are ignored without
    /// touching the query or issuing a fetch.
    pub async fn go_to_page(&mut self, page: u32) -> Result<(), FetchError> {
        // ---
        if page < 1 || page > self.total_pages() {
            return Ok(());
        }
        self.query.page = page;
        self.load().await
    }

    // --- filter setters; views call one of these then `on_filter_change` ---

    pub fn set_location_filter(&mut self, value: impl Into<String>) {
        self.query.location_filter = value.into();
    }

    pub fn set_status_filter(&mut self, value: impl Into<String>) {
        self.query.status_filter = value.into();
    }

    pub fn set_date_range(
        &mut self,
        start: Option<chrono::DateTime<chrono::Utc>>,
        end: Option<chrono::DateTime<chrono::Utc>>,
    ) {
        self.query.start_time = start;
        self.query.end_time = end;
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        // ---
        if page_size > 0 {
            self.query.page_size = page_size;
            self.query.page = 1;
        }
    }

    // --- chart visibility ---

    pub fn toggle_all_charts(&mut self) {
        self.visibility.toggle_all();
    }

    pub fn toggle_chart(&mut self, key: &str) {
        self.visibility.toggle(key);
    }

    pub fn visibility(&self) -> &ChartVisibility {
        &self.visibility
    }

    // --- derived getters bound by views ---

    pub fn profile(&self) -> &'static DashboardProfile {
        self.profile
    }

    pub fn data(&self) -> &[R] {
        &self.data
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn page(&self) -> u32 {
        self.query.page
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub fn total_pages(&self) -> u32 {
        self.total_elements.div_ceil(u64::from(self.query.page_size)) as u32
    }

    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    pub fn last_error(&self) -> Option<FetchErrorKind> {
        self.last_error
    }

    /// Average of a numeric field over the current page (0 when empty).
    pub fn average(&self, field: &str) -> f64 {
        charts::average_of(&self.data, field)
    }

    /// The record with the newest valid timestamp, if any.
    pub fn latest(&self) -> Option<&R> {
        // ---
        self.data
            .iter()
            .filter_map(|r| r.timestamp().map(|ts| (ts, r)))
            .max_by_key(|(ts, _)| *ts)
            .map(|(_, r)| r)
    }

    // ---

    /// Keep the 1-based page inside the freshly reported range. Runs only
    /// after successful fetches; an empty result set leaves the page alone.
    fn clamp_page(&mut self) {
        // ---
        let pages = self.total_pages();
        if pages > 0 && self.query.page > pages {
            self.query.page = pages;
        }
        if self.query.page == 0 {
            self.query.page = 1;
        }
    }

    fn rebuild_charts(&mut self) {
        // ---
        self.charts = self
            .profile
            .charts
            .iter()
            .map(|def| charts::build_chart(def, &self.data, self.profile.status_levels))
            .collect();
    }
}
