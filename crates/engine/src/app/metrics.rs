use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

use super::timing::GAME_LOGIC_TICKS_PER_SECOND;

static POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_poisoned_once(operation: &'static str) {
    if !POISON_WARNED.swap(true, Ordering::Relaxed) {
        warn!(operation, "loop_metrics_lock_poisoned");
    }
}

/// Loop health over the last interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    /// Logic ticks per second; the game runs at 15.
    pub tps: f32,
    pub frame_time_ms: f32,
    /// Slowest frame of the interval.
    pub max_frame_time_ms: f32,
    pub batch_submits_per_frame: f32,
    /// Mode that was current when the interval closed.
    pub mode: &'static str,
}

impl Default for LoopMetricsSnapshot {
    fn default() -> Self {
        Self {
            fps: 0.0,
            tps: 0.0,
            frame_time_ms: 0.0,
            max_frame_time_ms: 0.0,
            batch_submits_per_frame: 0.0,
            mode: "",
        }
    }
}

impl LoopMetricsSnapshot {
    /// True when fewer logic ticks ran than the fixed rate asks for, e.g.
    /// because frames were clamped.
    pub fn is_logic_falling_behind(&self) -> bool {
        self.tps + 0.5 < GAME_LOGIC_TICKS_PER_SECOND as f32
    }
}

/// Shared, read-mostly view of the latest snapshot.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        match self.latest.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_poisoned_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        let mut guard = self.latest.write().unwrap_or_else(|poisoned| {
            warn_poisoned_once("write");
            poisoned.into_inner()
        });
        *guard = snapshot;
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval: Duration,
    interval_start: Instant,
    frames: u32,
    ticks: u32,
    frame_time_sum: Duration,
    max_frame_time: Duration,
    batch_submits: u64,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    fn starting_at(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            interval_start: start,
            frames: 0,
            ticks: 0,
            frame_time_sum: Duration::ZERO,
            max_frame_time: Duration::ZERO,
            batch_submits: 0,
        }
    }

    /// Records one presented frame with the logic ticks and renderer
    /// batches it produced.
    pub(crate) fn record_frame(
        &mut self,
        frame_dt: Duration,
        logic_ticks: u32,
        batch_submits: u64,
    ) {
        self.frames = self.frames.saturating_add(1);
        self.ticks = self.ticks.saturating_add(logic_ticks);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
        self.max_frame_time = self.max_frame_time.max(frame_dt);
        self.batch_submits = self.batch_submits.saturating_add(batch_submits);
    }

    /// Closes the interval once it has elapsed and starts the next one.
    pub(crate) fn maybe_snapshot(
        &mut self,
        now: Instant,
        mode: &'static str,
    ) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let per_frame = |total: f32| {
            if self.frames == 0 {
                0.0
            } else {
                total / self.frames as f32
            }
        };
        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
            frame_time_ms: per_frame(self.frame_time_sum.as_secs_f32() * 1000.0),
            max_frame_time_ms: self.max_frame_time.as_secs_f32() * 1000.0,
            batch_submits_per_frame: per_frame(self.batch_submits as f32),
            mode,
        };

        *self = Self::starting_at(self.interval, now);
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn snapshot_averages_the_interval() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::starting_at(Duration::from_secs(1), base);
        accumulator.record_frame(Duration::from_millis(16), 1, 4);
        accumulator.record_frame(Duration::from_millis(40), 2, 2);

        let snapshot = accumulator
            .maybe_snapshot(base + Duration::from_secs(1), "ingame")
            .expect("interval elapsed");

        assert!((snapshot.fps - 2.0).abs() < 0.05);
        assert!((snapshot.tps - 3.0).abs() < 0.05);
        assert!((snapshot.frame_time_ms - 28.0).abs() < 0.01);
        assert!((snapshot.max_frame_time_ms - 40.0).abs() < 0.01);
        assert!((snapshot.batch_submits_per_frame - 3.0).abs() < 0.01);
        assert_eq!(snapshot.mode, "ingame");
        assert!(snapshot.is_logic_falling_behind());
    }

    #[test]
    fn interval_restarts_after_snapshot() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::starting_at(Duration::from_secs(1), base);
        accumulator.record_frame(Duration::from_millis(16), 1, 0);

        assert!(accumulator
            .maybe_snapshot(base + Duration::from_millis(500), "menu")
            .is_none());
        assert!(accumulator
            .maybe_snapshot(base + Duration::from_secs(1), "menu")
            .is_some());

        let empty = accumulator
            .maybe_snapshot(base + Duration::from_secs(2), "menu")
            .expect("second interval");
        assert_eq!(empty.fps, 0.0);
        assert_eq!(empty.frame_time_ms, 0.0);
    }

    #[test]
    fn full_tick_rate_is_not_behind() {
        let snapshot = LoopMetricsSnapshot {
            tps: 15.0,
            ..LoopMetricsSnapshot::default()
        };
        assert!(!snapshot.is_logic_falling_behind());
    }

    #[test]
    fn poisoned_handle_still_publishes() {
        let handle = MetricsHandle::default();
        let latest = Arc::clone(&handle.latest);
        let _ = thread::spawn(move || {
            let _guard = latest.write().expect("write guard");
            panic!("poison loop metrics");
        })
        .join();

        assert_eq!(handle.snapshot(), LoopMetricsSnapshot::default());
        let expected = LoopMetricsSnapshot {
            fps: 60.0,
            tps: 15.0,
            mode: "menu",
            ..LoopMetricsSnapshot::default()
        };
        handle.publish(expected);
        assert_eq!(handle.snapshot(), expected);
    }
}
