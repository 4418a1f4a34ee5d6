//! Cooldown timer between quiz rounds.
//!
//! The timer stores an absolute deadline, never a countdown, so the
//! remaining time is correct after a restart or a suspended process.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::error::DexError;
use crate::traits::{Clock, KeyValueStore};

/// Storage key of the deadline, as epoch milliseconds in decimal.
pub const DEADLINE_KEY: &str = "quiz.deadline";

/// What a tick observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownStatus {
    Running { remaining_secs: u64 },
    /// The deadline passed. Reported once; the timer has already re-armed.
    Expired,
}

/// A persisted countdown that re-arms itself on expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownTimer {
    deadline_ms: i64,
    duration_ms: i64,
}

impl CooldownTimer {
    /// Arm a fresh timer at `now + duration` and persist it.
    pub fn start(
        store: &dyn KeyValueStore,
        now_ms: i64,
        duration: Duration,
    ) -> Result<Self, DexError> {
        let duration_ms = duration_to_ms(duration);
        let timer = Self {
            deadline_ms: now_ms.saturating_add(duration_ms),
            duration_ms,
        };
        timer.persist(store)?;
        Ok(timer)
    }

    /// Rebuild the timer from the persisted deadline, or start a new one if
    /// nothing usable is stored. A deadline further out than one full
    /// `duration` is pulled in to `now + duration`.
    pub fn restore(
        store: &dyn KeyValueStore,
        now_ms: i64,
        duration: Duration,
    ) -> Result<Self, DexError> {
        let stored = store
            .get(DEADLINE_KEY)?
            .and_then(|raw| raw.trim().parse::<i64>().ok());

        match stored {
            Some(stored_ms) => {
                let duration_ms = duration_to_ms(duration);
                let deadline_ms = stored_ms.min(now_ms.saturating_add(duration_ms));
                debug!(deadline_ms, stored_ms, "restored cooldown deadline");
                Ok(Self {
                    deadline_ms,
                    duration_ms,
                })
            }
            None => Self::start(store, now_ms, duration),
        }
    }

    pub fn deadline_ms(&self) -> i64 {
        self.deadline_ms
    }

    /// Whole seconds until the deadline, never negative.
    pub fn remaining_secs(&self, now_ms: i64) -> u64 {
        (self.deadline_ms.saturating_sub(now_ms).max(0) / 1000) as u64
    }

    /// Advance the timer. At zero it reports [`CooldownStatus::Expired`] and
    /// re-arms to `now + duration`.
    pub fn tick(
        &mut self,
        now_ms: i64,
        store: &dyn KeyValueStore,
    ) -> Result<CooldownStatus, DexError> {
        if self.remaining_secs(now_ms) == 0 {
            self.rearm(now_ms, store)?;
            return Ok(CooldownStatus::Expired);
        }
        self.persist(store)?;
        Ok(CooldownStatus::Running {
            remaining_secs: self.remaining_secs(now_ms),
        })
    }

    /// Restart the full duration from `now`.
    pub fn rearm(&mut self, now_ms: i64, store: &dyn KeyValueStore) -> Result<(), DexError> {
        self.deadline_ms = now_ms.saturating_add(self.duration_ms);
        debug!(deadline_ms = self.deadline_ms, "cooldown re-armed");
        self.persist(store)
    }

    fn persist(&self, store: &dyn KeyValueStore) -> Result<(), DexError> {
        store.set(DEADLINE_KEY, &self.deadline_ms.to_string())
    }
}

fn duration_to_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX / 2)
}

/// Format seconds as `MM:SS`; minutes are not wrapped into hours.
pub fn format_mm_ss(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Background task that ticks a [`CooldownTimer`] at a fixed period.
///
/// Statuses arrive through [`CooldownTicker::next`]. Dropping the ticker or
/// calling [`CooldownTicker::cancel`] stops the task.
pub struct CooldownTicker {
    handle: JoinHandle<()>,
    updates: mpsc::Receiver<CooldownStatus>,
}

impl CooldownTicker {
    pub fn spawn(
        mut timer: CooldownTimer,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        period: Duration,
    ) -> Self {
        let (tx, updates) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let status = match timer.tick(clock.now_ms(), store.as_ref()) {
                    Ok(status) => status,
                    Err(e) => {
                        warn!(error = %e, "cooldown tick failed, stopping ticker");
                        break;
                    }
                };
                if tx.send(status).await.is_err() {
                    break;
                }
            }
        });

        Self { handle, updates }
    }

    /// Wait for the next status. `None` once the ticker has stopped.
    pub async fn next(&mut self) -> Option<CooldownStatus> {
        self.updates.recv().await
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for CooldownTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const HOUR: Duration = Duration::from_secs(3600);
    const T0: i64 = 1_700_000_000_000;

    /// Wall clock that follows tokio's (pausable) time.
    struct TokioClock {
        base_ms: i64,
        start: tokio::time::Instant,
    }

    impl Clock for TokioClock {
        fn now_ms(&self) -> i64 {
            self.base_ms + self.start.elapsed().as_millis() as i64
        }
    }

    #[test]
    fn first_use_arms_full_duration() {
        let store = MemoryStore::new();
        let timer = CooldownTimer::restore(&store, T0, HOUR).unwrap();

        assert_eq!(timer.remaining_secs(T0), 3600);
        assert_eq!(
            store.get(DEADLINE_KEY).unwrap().as_deref(),
            Some((T0 + 3_600_000).to_string().as_str())
        );
    }

    #[test]
    fn restore_uses_persisted_deadline() {
        let store = MemoryStore::new();
        store.set(DEADLINE_KEY, &(T0 + 10_000).to_string()).unwrap();

        let timer = CooldownTimer::restore(&store, T0, HOUR).unwrap();
        assert_eq!(timer.remaining_secs(T0), 10);
    }

    #[test]
    fn unparseable_deadline_starts_over() {
        let store = MemoryStore::new();
        store.set(DEADLINE_KEY, "soon").unwrap();

        let timer = CooldownTimer::restore(&store, T0, HOUR).unwrap();
        assert_eq!(timer.remaining_secs(T0), 3600);
    }

    #[test]
    fn extreme_stored_deadlines_do_not_overflow() {
        let store = MemoryStore::new();
        store.set(DEADLINE_KEY, &i64::MIN.to_string()).unwrap();
        let mut timer = CooldownTimer::restore(&store, T0, HOUR).unwrap();
        assert_eq!(timer.remaining_secs(i64::MAX), 0);
        assert_eq!(timer.tick(T0, &store).unwrap(), CooldownStatus::Expired);
        assert_eq!(timer.remaining_secs(T0), 3600);

        let timer = CooldownTimer::start(&store, i64::MAX - 10, HOUR).unwrap();
        assert_eq!(timer.deadline_ms(), i64::MAX);
    }

    #[test]
    fn shortened_cooldown_caps_stored_deadline() {
        let store = MemoryStore::new();
        store.set(DEADLINE_KEY, &(T0 + 10 * 3_600_000).to_string()).unwrap();

        let timer = CooldownTimer::restore(&store, T0, Duration::from_secs(60)).unwrap();
        assert_eq!(timer.remaining_secs(T0), 60);
    }

    #[test]
    fn remaining_is_clamped_at_zero() {
        let store = MemoryStore::new();
        let timer = CooldownTimer::start(&store, T0, Duration::from_secs(5)).unwrap();
        assert_eq!(timer.remaining_secs(T0 + 60_000), 0);
    }

    #[test]
    fn expiry_reports_once_then_rearms() {
        let store = MemoryStore::new();
        store.set(DEADLINE_KEY, &(T0 + 2_000).to_string()).unwrap();
        let mut timer = CooldownTimer::restore(&store, T0, HOUR).unwrap();

        assert_eq!(
            timer.tick(T0 + 1_000, &store).unwrap(),
            CooldownStatus::Running { remaining_secs: 1 }
        );
        assert_eq!(timer.tick(T0 + 2_000, &store).unwrap(), CooldownStatus::Expired);
        assert_eq!(
            timer.tick(T0 + 2_000, &store).unwrap(),
            CooldownStatus::Running {
                remaining_secs: 3600
            }
        );
        assert_eq!(
            store.get(DEADLINE_KEY).unwrap().as_deref(),
            Some((T0 + 2_000 + 3_600_000).to_string().as_str())
        );
    }

    #[test]
    fn mm_ss_formatting() {
        assert_eq!(format_mm_ss(3600), "60:00");
        assert_eq!(format_mm_ss(61), "01:01");
        assert_eq!(format_mm_ss(0), "00:00");
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_counts_down_and_rearms() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let clock = Arc::new(TokioClock {
            base_ms: T0,
            start: tokio::time::Instant::now(),
        });
        store.set(DEADLINE_KEY, &(T0 + 2_000).to_string()).unwrap();
        let timer = CooldownTimer::restore(store.as_ref(), T0, HOUR).unwrap();

        let mut ticker =
            CooldownTicker::spawn(timer, Arc::clone(&store), clock, Duration::from_secs(1));

        assert_eq!(
            ticker.next().await,
            Some(CooldownStatus::Running { remaining_secs: 2 })
        );
        assert_eq!(
            ticker.next().await,
            Some(CooldownStatus::Running { remaining_secs: 1 })
        );
        assert_eq!(ticker.next().await, Some(CooldownStatus::Expired));
        assert_eq!(
            ticker.next().await,
            Some(CooldownStatus::Running {
                remaining_secs: 3599
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_the_ticker() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let clock = Arc::new(TokioClock {
            base_ms: T0,
            start: tokio::time::Instant::now(),
        });
        let timer = CooldownTimer::restore(store.as_ref(), T0, HOUR).unwrap();
        let mut ticker = CooldownTicker::spawn(timer, store, clock, Duration::from_secs(1));

        assert!(ticker.next().await.is_some());
        ticker.cancel();

        let mut drained = 0;
        while ticker.next().await.is_some() {
            drained += 1;
        }
        assert!(drained <= 1);
        assert!(ticker.is_finished());
    }
}
