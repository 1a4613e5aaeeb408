//! Rotating alert feed.
//!
//! Polls `/api/alerts/recent` on a fixed interval and shows the backlog one
//! alert at a time: each alert stays on screen for a fixed duration, then a
//! short gap avoids flicker before the next one appears. Subscribers see the
//! currently visible alerts (an empty or one-element list) on a `watch`
//! channel.
//!
//! One task owns the queue, the display phase and every deadline, so
//! stopping the task is also what cancels its timers: a stale display
//! countdown cannot fire after a removal or shutdown has superseded it.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::AlertSource;
use crate::config::Config;
use crate::models::{Alert, AlertBatch};

// ---

/// Timing knobs for the alert feed.
#[derive(Debug, Clone, Copy)]
pub struct AlertTimings {
    /// Time between backlog polls.
    pub poll_interval: Duration,
    /// How long one alert stays visible.
    pub display_duration: Duration,
    /// Pause between clearing one alert and showing the next.
    pub advance_gap: Duration,
}

impl Default for AlertTimings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            display_duration: Duration::from_secs(5),
            advance_gap: Duration::from_millis(100),
        }
    }
}

impl AlertTimings {
    // ---
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: Duration::from_secs(u64::from(config.alert_poll_secs)).max(Duration::from_secs(1)),
            display_duration: Duration::from_millis(u64::from(config.alert_display_ms)),
            advance_gap: Duration::from_millis(u64::from(config.alert_advance_ms)),
        }
    }
}

// ---

enum AlertCommand {
    Remove(Uuid),
    Stop,
}

/// Handle to the alert feed task.
///
/// Dropping the handle ends the task; [`AlertMonitor::stop`] ends it and
/// waits, guaranteeing no poll or display change happens afterwards.
pub struct AlertMonitor {
    commands: mpsc::Sender<AlertCommand>,
    visible: watch::Receiver<Vec<Alert>>,
    task: JoinHandle<()>,
}

impl AlertMonitor {
    /// Start polling: one fetch immediately, then one per poll interval.
    pub fn start<S>(source: S, timings: AlertTimings) -> Self
    where
        S: AlertSource + Send + Sync + 'static,
    {
        // ---
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (vis_tx, vis_rx) = watch::channel(Vec::new());
        let task = tokio::spawn(run(source, timings, cmd_rx, vis_tx));

        Self {
            commands: cmd_tx,
            visible: vis_rx,
            task,
        }
    }

    /// A fresh subscription to the currently visible alerts (0 or 1
    /// elements).
    pub fn visible(&self) -> watch::Receiver<Vec<Alert>> {
        self.visible.clone()
    }

    /// Dismiss an alert wherever it is. If it is the one on screen, the
    /// display clears at once and the next alert (if any) follows without
    /// waiting out the remaining display time.
    pub async fn remove_alert(&self, id: Uuid) {
        let _ = self.commands.send(AlertCommand::Remove(id)).await;
    }

    /// Stop polling, clear the queue, publish an empty display, and wait for
    /// the task to finish.
    pub async fn stop(self) {
        // ---
        let _ = self.commands.send(AlertCommand::Stop).await;
        let _ = self.task.await;
    }
}

// ---

enum DisplayPhase {
    /// Nothing queued.
    Idle,
    /// Head of the queue is on screen until the deadline.
    Showing { until: Instant },
    /// Between alerts; the next one appears at the deadline.
    AdvanceGap { until: Instant },
}

impl DisplayPhase {
    fn deadline(&self) -> Option<Instant> {
        match self {
            DisplayPhase::Idle => None,
            DisplayPhase::Showing { until } | DisplayPhase::AdvanceGap { until } => Some(*until),
        }
    }
}

/// Queue + display state, owned by the feed task.
struct AlertRotation {
    queue: VecDeque<Alert>,
    phase: DisplayPhase,
    visible: watch::Sender<Vec<Alert>>,
    timings: AlertTimings,
}

impl AlertRotation {
    // ---
    /// Merge a fetched batch: only alerts whose id is not already queued are
    /// appended (the one on screen is still the queue head, so it counts).
    fn absorb(&mut self, batch: AlertBatch) {
        // ---
        let fresh: Vec<Alert> = batch
            .data
            .into_iter()
            .filter(|alert| !self.queue.iter().any(|queued| queued.id == alert.id))
            .collect();

        if !fresh.is_empty() {
            debug!(count = fresh.len(), "queued new alerts");
            self.queue.extend(fresh);
        }
        if matches!(self.phase, DisplayPhase::Idle) {
            self.show_head();
        }
    }

    /// Put the queue head on screen, or go idle if there is none.
    fn show_head(&mut self) {
        // ---
        match self.queue.front() {
            Some(head) => {
                self.visible.send_replace(vec![head.clone()]);
                self.phase = DisplayPhase::Showing {
                    until: Instant::now() + self.timings.display_duration,
                };
            }
            None => {
                self.phase = DisplayPhase::Idle;
            }
        }
    }

    /// A display deadline fired.
    fn on_deadline(&mut self) {
        // ---
        match self.phase {
            DisplayPhase::Showing { .. } => {
                // The displayed alert is done; discard it and clear the screen
                self.queue.pop_front();
                self.visible.send_replace(Vec::new());
                self.phase = if self.queue.is_empty() {
                    DisplayPhase::Idle
                } else {
                    DisplayPhase::AdvanceGap {
                        until: Instant::now() + self.timings.advance_gap,
                    }
                };
            }
            DisplayPhase::AdvanceGap { .. } => self.show_head(),
            DisplayPhase::Idle => {}
        }
    }

    /// Dismiss by id, advancing the display immediately when the dismissed
    /// alert is the one on screen.
    fn remove(&mut self, id: Uuid) {
        // ---
        let on_screen = matches!(self.phase, DisplayPhase::Showing { .. })
            && self.queue.front().is_some_and(|a| a.id == id);

        self.queue.retain(|alert| alert.id != id);

        if on_screen {
            self.visible.send_replace(Vec::new());
            self.show_head();
        }
    }

    fn shutdown(&mut self) {
        // ---
        self.queue.clear();
        self.visible.send_replace(Vec::new());
    }
}

async fn run<S: AlertSource>(
    source: S,
    timings: AlertTimings,
    mut commands: mpsc::Receiver<AlertCommand>,
    visible: watch::Sender<Vec<Alert>>,
) {
    // ---
    let mut rotation = AlertRotation {
        queue: VecDeque::new(),
        phase: DisplayPhase::Idle,
        visible,
        timings,
    };

    // The first tick completes immediately: that is the startup fetch
    let mut poll = time::interval(timings.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("alert polling started");

    loop {
        let deadline = rotation.phase.deadline();

        tokio::select! {
            biased;

            cmd = commands.recv() => {
                match cmd {
                    Some(AlertCommand::Remove(id)) => rotation.remove(id),
                    Some(AlertCommand::Stop) | None => break,
                }
            }

            _ = poll.tick() => {
                match source.recent_alerts().await {
                    Ok(batch) => rotation.absorb(batch),
                    // Queue and display stay untouched; the next scheduled
                    // fetch proceeds normally
                    Err(err) => warn!(error = %err, "alert fetch failed"),
                }
            }

            _ = time::sleep_until(deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600))),
                if deadline.is_some() =>
            {
                rotation.on_deadline();
            }
        }
    }

    rotation.shutdown();
    info!("alert polling stopped");
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::error::FetchError;
    use std::collections::VecDeque as Script;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct FakeAlerts {
        batches: Mutex<Script<Result<AlertBatch, FetchError>>>,
        fetches: AtomicUsize,
    }

    impl FakeAlerts {
        // ---
        fn scripted(batches: Vec<Result<AlertBatch, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                batches: Mutex::new(batches.into()),
                fetches: AtomicUsize::new(0),
            })
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl AlertSource for FakeAlerts {
        async fn recent_alerts(&self) -> Result<AlertBatch, FetchError> {
            // ---
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.batches.lock().unwrap().pop_front().unwrap_or(Ok(AlertBatch {
                message: "no alerts".to_string(),
                count: 0,
                data: Vec::new(),
            }))
        }
    }

    fn test_alert(metric: &str) -> Alert {
        // ---
        Alert {
            id: Uuid::new_v4(),
            metric: metric.to_string(),
            value: 180.0,
            threshold_value: 150.0,
            alert_type: crate::models::AlertDirection::Above,
            sensor: crate::models::SensorFamily::AirPollution,
            triggered_at: "2025-03-26T18:45:00".to_string(),
        }
    }

    fn batch(alerts: Vec<Alert>) -> Result<AlertBatch, FetchError> {
        // ---
        Ok(AlertBatch {
            message: "recent alerts".to_string(),
            count: alerts.len() as u32,
            data: alerts,
        })
    }

    async fn settle() {
        // ---
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_alert_displays_then_clears() {
        // ---
        let alert = test_alert("pm2_5");
        let source = FakeAlerts::scripted(vec![batch(vec![alert.clone()])]);
        let monitor = AlertMonitor::start(source.clone(), AlertTimings::default());
        let visible = monitor.visible();

        settle().await;
        assert_eq!(*visible.borrow(), vec![alert]);

        // After the 5 s display window the alert is gone for good
        time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert!(visible.borrow().is_empty());

        time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert!(visible.borrow().is_empty());

        monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetched_alert_is_not_requeued() {
        // ---
        let first = test_alert("pm2_5");
        let second = test_alert("ozone");
        let timings = AlertTimings {
            poll_interval: Duration::from_secs(1),
            display_duration: Duration::from_secs(10),
            advance_gap: Duration::from_millis(100),
        };
        // Second poll repeats the still-displayed alert and adds one more
        let source = FakeAlerts::scripted(vec![
            batch(vec![first.clone()]),
            batch(vec![first.clone(), second.clone()]),
        ]);

        let monitor = AlertMonitor::start(source.clone(), timings);
        let visible = monitor.visible();

        settle().await;
        assert_eq!(*visible.borrow(), vec![first.clone()]);

        time::advance(Duration::from_secs(1)).await;
        settle().await;
        // Still the first alert; the duplicate was dropped, only `second` queued
        assert_eq!(*visible.borrow(), vec![first.clone()]);

        // First display window ends at t=10
        time::advance(Duration::from_secs(9)).await;
        settle().await;
        assert!(visible.borrow().is_empty());

        time::advance(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(*visible.borrow(), vec![second.clone()]);

        // Had the duplicate been requeued it would reappear here
        time::advance(Duration::from_secs(10)).await;
        settle().await;
        time::advance(Duration::from_millis(100)).await;
        settle().await;
        assert!(visible.borrow().is_empty());

        monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_displayed_alert_advances_immediately() {
        // ---
        let first = test_alert("pm2_5");
        let second = test_alert("ozone");
        let source = FakeAlerts::scripted(vec![batch(vec![first.clone(), second.clone()])]);

        let monitor = AlertMonitor::start(source, AlertTimings::default());
        let visible = monitor.visible();

        settle().await;
        assert_eq!(*visible.borrow(), vec![first.clone()]);

        // No time passes: dismissal alone brings up the next alert
        monitor.remove_alert(first.id).await;
        settle().await;
        assert_eq!(*visible.borrow(), vec![second.clone()]);

        monitor.remove_alert(second.id).await;
        settle().await;
        assert!(visible.borrow().is_empty());

        monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_queued_alert_leaves_display_alone() {
        // ---
        let first = test_alert("pm2_5");
        let second = test_alert("ozone");
        let third = test_alert("co");
        let source =
            FakeAlerts::scripted(vec![batch(vec![first.clone(), second.clone(), third.clone()])]);

        let monitor = AlertMonitor::start(source, AlertTimings::default());
        let visible = monitor.visible();

        settle().await;
        assert_eq!(*visible.borrow(), vec![first.clone()]);

        monitor.remove_alert(second.id).await;
        settle().await;
        assert_eq!(*visible.borrow(), vec![first.clone()]);

        // Rotation skips straight from first to third
        time::advance(Duration::from_secs(5)).await;
        settle().await;
        time::advance(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(*visible.borrow(), vec![third.clone()]);

        monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_leaves_state_untouched() {
        // ---
        let alert = test_alert("pm2_5");
        let timings = AlertTimings {
            poll_interval: Duration::from_secs(1),
            ..AlertTimings::default()
        };
        let source = FakeAlerts::scripted(vec![
            Err(FetchError::Unreachable("connection refused".into())),
            batch(vec![alert.clone()]),
        ]);

        let monitor = AlertMonitor::start(source.clone(), timings);
        let visible = monitor.visible();

        settle().await;
        assert!(visible.borrow().is_empty());
        assert_eq!(source.fetches(), 1);

        // The next scheduled fetch proceeds normally
        time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(source.fetches(), 2);
        assert_eq!(*visible.borrow(), vec![alert]);

        monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_polling_and_clears_display() {
        // ---
        let alert = test_alert("pm2_5");
        let source = FakeAlerts::scripted(vec![batch(vec![alert.clone()])]);

        let monitor = AlertMonitor::start(source.clone(), AlertTimings::default());
        let visible = monitor.visible();

        settle().await;
        assert_eq!(*visible.borrow(), vec![alert]);
        assert_eq!(source.fetches(), 1);

        monitor.stop().await;
        assert!(visible.borrow().is_empty());

        // No poll fires after shutdown, no matter how far time advances
        time::advance(Duration::from_secs(600)).await;
        settle().await;
        assert_eq!(source.fetches(), 1);
    }
}
