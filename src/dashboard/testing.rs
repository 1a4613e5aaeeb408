//! Scripted record sources for controller and live-loop tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use uuid::Uuid;

use crate::client::RecordSource;
use crate::dashboard::query::QueryState;
use crate::error::FetchError;
use crate::models::{CongestionLevel, PageResult, TrafficRecord};

// ---

/// A `RecordSource` that replays scripted responses and records every call.
///
/// When the script runs out it keeps answering with empty pages, which is
/// what refresh-loop tests want.
pub(crate) struct FakePages<R> {
    responses: Mutex<VecDeque<Result<PageResult<R>, FetchError>>>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    fetches: AtomicUsize,
}

impl<R> FakePages<R> {
    // ---
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn push_page(&self, content: Vec<R>, total_elements: u64) {
        // ---
        let total_pages = total_elements.div_ceil(10) as u32;
        self.responses.lock().unwrap().push_back(Ok(PageResult {
            content,
            total_elements,
            total_pages,
            size: 10,
            number: 0,
        }));
    }

    pub fn push_error(&self, err: FetchError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    /// Total number of fetches issued so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Every `(endpoint, wire params)` pair seen, in order.
    pub fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl<R: Clone + Send + Sync + 'static> RecordSource<R> for FakePages<R> {
    async fn fetch_page(
        &self,
        endpoint: &str,
        status_key: &str,
        query: &QueryState,
    ) -> Result<PageResult<R>, FetchError> {
        // ---
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), query.wire_params(status_key)));

        self.responses.lock().unwrap().pop_front().unwrap_or(Ok(PageResult {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            size: query.page_size,
            number: query.page.saturating_sub(1),
        }))
    }
}

// ---

pub(crate) fn traffic_record(location: &str, density: u32, timestamp: &str) -> TrafficRecord {
    // ---
    TrafficRecord {
        id: Uuid::new_v4(),
        location: location.to_string(),
        timestamp: timestamp.to_string(),
        traffic_density: density,
        avg_speed: 38.0,
        congestion_level: CongestionLevel::Moderate,
    }
}
