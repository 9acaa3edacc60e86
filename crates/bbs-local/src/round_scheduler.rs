//! Round scheduler (§4.L): a timer-driven refresh of every registered board
//! and thread. Reconfiguring or disabling cancels only the *timer* — a round
//! already underway keeps running and its cache writes still land, per the
//! non-cancellation policy in §5.

use crate::util::masked_log::{LogLevel, MaskedLogger};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

/// One registered item: either a board (subject refresh) or a thread (DAT
/// refresh), matching `RoundBoard.2ch` / `RoundItem.2ch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundTarget {
    Board { board_url: String },
    Thread { board_url: String, thread_id: String },
}

/// Per-item outcome of one round. Errors are swallowed into this report and
/// logged, never propagated — one bad board/thread must not abort the rest.
#[derive(Debug, Clone, Default)]
pub struct RoundReport {
    pub updated_boards: Vec<String>,
    pub updated_threads: Vec<(String, String)>,
    pub failures: Vec<(RoundTarget, String)>,
}

/// The side effects a round performs, abstracted so the timer/cancellation
/// logic below can be exercised without a real HTTP stack.
#[async_trait::async_trait]
pub trait RoundExecutor: Send + Sync {
    async fn refresh_board(&self, board_url: &str) -> bbs_core::Result<()>;
    async fn refresh_thread(&self, board_url: &str, thread_id: &str) -> bbs_core::Result<()>;
}

/// Runs one round: every registered board's subject, then every registered
/// thread's DAT, sequentially, swallowing per-item errors into the report.
pub async fn execute_round(executor: &dyn RoundExecutor, targets: &[RoundTarget], logger: &MaskedLogger, now: chrono::DateTime<chrono::Utc>) -> RoundReport {
    let mut report = RoundReport::default();
    for target in targets {
        match target {
            RoundTarget::Board { board_url } => match executor.refresh_board(board_url).await {
                Ok(()) => report.updated_boards.push(board_url.clone()),
                Err(e) => {
                    logger.log(now, LogLevel::Warn, "round", format!("board refresh failed for {board_url}: {e}"));
                    report.failures.push((target.clone(), e.to_string()));
                }
            },
            RoundTarget::Thread { board_url, thread_id } => match executor.refresh_thread(board_url, thread_id).await {
                Ok(()) => report.updated_threads.push((board_url.clone(), thread_id.clone())),
                Err(e) => {
                    logger.log(now, LogLevel::Warn, "round", format!("thread refresh failed for {board_url}#{thread_id}: {e}"));
                    report.failures.push((target.clone(), e.to_string()));
                }
            },
        }
    }
    report
}

/// Current `{enabled, intervalMinutes}` configuration, readable by callers
/// that want to display scheduler state without touching the timer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoundConfig {
    pub enabled: bool,
    pub interval_minutes: u32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self { enabled: false, interval_minutes: 15 }
    }
}

/// Owns the timer task. `configure`/`stop` only ever touch the timer
/// `JoinHandle`; each firing's round execution is spawned as its own
/// detached task, so a reconfiguration that aborts the timer never aborts
/// a round already in flight.
pub struct RoundScheduler<E: RoundExecutor + 'static> {
    executor: Arc<E>,
    logger: Arc<MaskedLogger>,
    targets: Arc<AsyncMutex<Vec<RoundTarget>>>,
    config: AsyncMutex<RoundConfig>,
    timer: AsyncMutex<Option<JoinHandle<()>>>,
    on_report: Arc<dyn Fn(RoundReport) + Send + Sync>,
}

impl<E: RoundExecutor + 'static> RoundScheduler<E> {
    pub fn new(executor: Arc<E>, logger: Arc<MaskedLogger>, on_report: impl Fn(RoundReport) + Send + Sync + 'static) -> Self {
        Self {
            executor,
            logger,
            targets: Arc::new(AsyncMutex::new(Vec::new())),
            config: AsyncMutex::new(RoundConfig::default()),
            timer: AsyncMutex::new(None),
            on_report: Arc::new(on_report),
        }
    }

    pub async fn set_targets(&self, targets: Vec<RoundTarget>) {
        *self.targets.lock().await = targets;
    }

    pub async fn config(&self) -> RoundConfig {
        *self.config.lock().await
    }

    /// Cancels the existing timer (if any) and, when `enabled`, starts a new
    /// one at `interval_minutes`. Does not touch any round already running.
    pub async fn configure(&self, enabled: bool, interval_minutes: u32) {
        self.cancel_timer().await;
        *self.config.lock().await = RoundConfig { enabled, interval_minutes };
        if !enabled {
            return;
        }

        let executor = self.executor.clone();
        let logger = self.logger.clone();
        let targets = self.targets.clone();
        let on_report = self.on_report.clone();
        let period = std::time::Duration::from_secs(interval_minutes.max(1) as u64 * 60);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await; // first tick fires immediately; skip it, timer measures from here
            loop {
                ticker.tick().await;
                spawn_round(executor.clone(), logger.clone(), targets.clone(), on_report.clone());
            }
        });
        *self.timer.lock().await = Some(handle);
    }

    /// Disables the scheduler: equivalent to `configure(false, _)`.
    pub async fn stop(&self) {
        self.cancel_timer().await;
        self.config.lock().await.enabled = false;
    }

    async fn cancel_timer(&self) {
        if let Some(handle) = self.timer.lock().await.take() {
            handle.abort();
        }
    }

    /// One immediate firing, equivalent to a manual timer tick. Spawned the
    /// same way scheduled rounds are, so it is likewise immune to a
    /// subsequent `configure`/`stop` cancelling it mid-flight.
    pub fn execute_now(&self) {
        spawn_round(self.executor.clone(), self.logger.clone(), self.targets.clone(), self.on_report.clone());
    }
}

fn spawn_round<E: RoundExecutor + 'static>(
    executor: Arc<E>,
    logger: Arc<MaskedLogger>,
    targets: Arc<AsyncMutex<Vec<RoundTarget>>>,
    on_report: Arc<dyn Fn(RoundReport) + Send + Sync>,
) {
    tokio::spawn(async move {
        let snapshot = targets.lock().await.clone();
        let now = chrono::Utc::now();
        let report = execute_round(executor.as_ref(), &snapshot, &logger, now).await;
        on_report(report);
    });
}
