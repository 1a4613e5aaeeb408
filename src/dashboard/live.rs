//! Live (auto-refreshing) dashboard loop.
//!
//! The Angular original parked an RxJS `interval` subscription on the
//! component and unsubscribed in `ngOnDestroy`. Here the controller moves
//! into a task that performs one immediate load, then one per refresh
//! interval, until the handle shuts it down. Views observe the dashboard
//! through a `watch` channel of [`DashboardSnapshot`]s; UI events arrive as
//! [`DashboardCommand`]s on an mpsc channel. Because the task owns its
//! interval, stopping the task is also what cancels the timer, so no refresh
//! can fire after `stop()` returns.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use crate::charts::Chart;
use crate::client::RecordSource;
use crate::dashboard::controller::{ChartVisibility, DashboardController};
use crate::dashboard::query::SortDirection;
use crate::error::FetchErrorKind;
use crate::models::SensorRecord;

// ---

/// UI events a live dashboard reacts to.
#[derive(Debug, Clone)]
pub enum DashboardCommand {
    /// Reload the current page immediately.
    Refresh,
    Sort(String),
    GoToPage(u32),
    /// Set the location filter and perform the filter-change reload.
    LocationFilter(String),
    /// Set the status filter and perform the filter-change reload.
    StatusFilter(String),
    /// Set the date range and perform the filter-change reload.
    DateRange {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
    ToggleAllCharts,
    ToggleChart(String),
    Shutdown,
}

/// Everything a view binds to, captured after each state change.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot<R> {
    pub data: Vec<R>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub page: u32,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    pub charts: Vec<Chart>,
    pub visibility: ChartVisibility,
    pub last_error: Option<FetchErrorKind>,
}

impl<R> DashboardSnapshot<R> {
    /// The pre-first-load snapshot.
    fn empty() -> Self {
        // ---
        Self {
            data: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            page: 1,
            sort_field: "timestamp".to_string(),
            sort_direction: SortDirection::Descending,
            charts: Vec::new(),
            visibility: ChartVisibility::default(),
            last_error: None,
        }
    }
}

// ---

/// Handle to a dashboard running in its own task.
///
/// Dropping the handle closes the command channel, which also ends the task;
/// [`LiveDashboard::stop`] does the same but waits for the task to finish,
/// guaranteeing no refresh fires afterwards.
pub struct LiveDashboard<R> {
    commands: mpsc::Sender<DashboardCommand>,
    snapshots: watch::Receiver<DashboardSnapshot<R>>,
    task: JoinHandle<()>,
}

impl<R: SensorRecord> LiveDashboard<R> {
    /// Move `controller` into a refresh loop: one load now, another every
    /// `refresh` until shutdown.
    pub fn spawn<S>(controller: DashboardController<R, S>, refresh: Duration) -> Self
    where
        S: RecordSource<R> + Send + Sync + 'static,
    {
        // ---
        // interval_at panics on a zero period
        let refresh = refresh.max(Duration::from_secs(1));
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (snap_tx, snap_rx) = watch::channel(DashboardSnapshot::empty());
        let task = tokio::spawn(run(controller, refresh, cmd_rx, snap_tx));

        Self {
            commands: cmd_tx,
            snapshots: snap_rx,
            task,
        }
    }

    /// A fresh subscription to the snapshot stream.
    pub fn snapshots(&self) -> watch::Receiver<DashboardSnapshot<R>> {
        self.snapshots.clone()
    }

    pub async fn command(&self, cmd: DashboardCommand) {
        // A closed channel just means the loop is already gone
        let _ = self.commands.send(cmd).await;
    }

    pub async fn refresh(&self) {
        self.command(DashboardCommand::Refresh).await;
    }

    pub async fn sort(&self, field: impl Into<String>) {
        self.command(DashboardCommand::Sort(field.into())).await;
    }

    pub async fn go_to_page(&self, page: u32) {
        self.command(DashboardCommand::GoToPage(page)).await;
    }

    pub async fn filter_location(&self, value: impl Into<String>) {
        self.command(DashboardCommand::LocationFilter(value.into())).await;
    }

    pub async fn filter_status(&self, value: impl Into<String>) {
        self.command(DashboardCommand::StatusFilter(value.into())).await;
    }

    pub async fn filter_date_range(&self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) {
        self.command(DashboardCommand::DateRange { start, end }).await;
    }

    pub async fn toggle_chart(&self, key: impl Into<String>) {
        self.command(DashboardCommand::ToggleChart(key.into())).await;
    }

    /// Stop refreshing and wait for the loop to wind down.
    pub async fn stop(self) {
        // ---
        let _ = self.commands.send(DashboardCommand::Shutdown).await;
        let _ = self.task.await;
    }
}

// ---

async fn run<R, S>(
    mut controller: DashboardController<R, S>,
    refresh: Duration,
    mut commands: mpsc::Receiver<DashboardCommand>,
    snapshots: watch::Sender<DashboardSnapshot<R>>,
) where
    R: SensorRecord,
    S: RecordSource<R>,
{
    // ---
    // Immediate load first; the interval only covers subsequent refreshes.
    // Fetch failures are already classified and logged by the controller.
    let _ = controller.load().await;
    snapshots.send_replace(snapshot_of(&controller));

    let mut ticker = time::interval_at(Instant::now() + refresh, refresh);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            cmd = commands.recv() => {
                match cmd {
                    None | Some(DashboardCommand::Shutdown) => break,
                    Some(cmd) => apply(&mut controller, cmd).await,
                }
            }

            _ = ticker.tick() => {
                let _ = controller.load().await;
            }
        }

        snapshots.send_replace(snapshot_of(&controller));
    }

    debug!(dashboard = controller.profile().name, "live dashboard stopped");
}

async fn apply<R, S>(controller: &mut DashboardController<R, S>, cmd: DashboardCommand)
where
    R: SensorRecord,
    S: RecordSource<R>,
{
    // ---
    match cmd {
        DashboardCommand::Refresh => {
            let _ = controller.load().await;
        }
        DashboardCommand::Sort(field) => {
            let _ = controller.sort(&field).await;
        }
        DashboardCommand::GoToPage(page) => {
            let _ = controller.go_to_page(page).await;
        }
        DashboardCommand::LocationFilter(value) => {
            controller.set_location_filter(value);
            let _ = controller.on_filter_change().await;
        }
        DashboardCommand::StatusFilter(value) => {
            controller.set_status_filter(value);
            let _ = controller.on_filter_change().await;
        }
        DashboardCommand::DateRange { start, end } => {
            controller.set_date_range(start, end);
            let _ = controller.on_filter_change().await;
        }
        DashboardCommand::ToggleAllCharts => controller.toggle_all_charts(),
        DashboardCommand::ToggleChart(key) => controller.toggle_chart(&key),
        DashboardCommand::Shutdown => unreachable!("handled by the loop"),
    }
}

fn snapshot_of<R, S>(controller: &DashboardController<R, S>) -> DashboardSnapshot<R>
where
    R: SensorRecord,
    S: RecordSource<R>,
{
    // ---
    DashboardSnapshot {
        data: controller.data().to_vec(),
        total_elements: controller.total_elements(),
        total_pages: controller.total_pages(),
        page: controller.page(),
        sort_field: controller.query().sort_field.clone(),
        sort_direction: controller.query().sort_direction,
        charts: controller.charts().to_vec(),
        visibility: controller.visibility().clone(),
        last_error: controller.last_error(),
    }
}
