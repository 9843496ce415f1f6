use std::env;
use std::time::Duration;

use tracing::warn;

pub const SLOW_FRAME_ENV_VAR: &str = "DN2_SLOW_FRAME_MS";

/// Rate of the in-game logic update.
pub const GAME_LOGIC_TICKS_PER_SECOND: u32 = 15;

/// Rate of the timer driving fades and other real-time ramps.
pub const FAST_TICKS_PER_SECOND: f64 = 280.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub ticks_to_run: u32,
    pub remaining_accumulator: Duration,
    pub dropped_backlog: Duration,
}

pub fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

/// Accumulates frame time and hands out whole fixed-length ticks.
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
}

impl FixedStepClock {
    pub fn new(ticks_per_second: u32, max_ticks_per_frame: u32) -> Self {
        Self {
            fixed_dt: Duration::from_secs_f64(1.0 / ticks_per_second.max(1) as f64),
            max_ticks_per_frame: max_ticks_per_frame.max(1),
            accumulator: Duration::ZERO,
        }
    }

    pub fn game_logic() -> Self {
        Self::new(GAME_LOGIC_TICKS_PER_SECOND, 4)
    }

    pub fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    pub fn advance(&mut self, frame_dt: Duration) -> StepPlan {
        let plan = plan_sim_steps(
            self.accumulator.saturating_add(frame_dt),
            self.fixed_dt,
            self.max_ticks_per_frame,
        );
        self.accumulator = plan.remaining_accumulator;
        if plan.dropped_backlog > Duration::ZERO {
            warn!(
                dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame = self.max_ticks_per_frame,
                "sim_clamp_triggered"
            );
        }
        plan
    }

    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }
}

/// Elapsed fast timer ticks in `elapsed`, rounded down.
pub fn fast_ticks(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * FAST_TICKS_PER_SECOND).floor()
}

const DEFAULT_MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// Wall-clock pacing of presented frames, independent of the logic rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FramePacing {
    max_frame_delta: Duration,
    render_fps_cap: Option<u32>,
    slow_frame_delay: Duration,
}

impl FramePacing {
    /// A zero frame delta falls back to 250ms; a zero fps cap means no cap.
    pub(crate) fn new(
        max_frame_delta: Duration,
        render_fps_cap: Option<u32>,
        slow_frame_delay: Duration,
    ) -> Self {
        Self {
            max_frame_delta: if max_frame_delta.is_zero() {
                DEFAULT_MAX_FRAME_DELTA
            } else {
                max_frame_delta
            },
            render_fps_cap: render_fps_cap.filter(|fps| *fps > 0),
            slow_frame_delay,
        }
    }

    pub(crate) fn max_frame_delta(&self) -> Duration {
        self.max_frame_delta
    }

    /// Artificial delay added before every frame, for testing catch-up.
    pub(crate) fn slow_frame_delay(&self) -> Duration {
        self.slow_frame_delay
    }

    pub(crate) fn clamp(&self, frame_dt: Duration) -> Duration {
        frame_dt.min(self.max_frame_delta)
    }

    fn target_frame(&self) -> Option<Duration> {
        self.render_fps_cap
            .map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
    }

    /// Time left to wait before presenting, given the time since the
    /// previous present.
    pub(crate) fn sleep_before_present(&self, since_last_present: Duration) -> Duration {
        self.target_frame()
            .map_or(Duration::ZERO, |target| target.saturating_sub(since_last_present))
    }

    pub(crate) fn describe_cap(&self) -> String {
        self.render_fps_cap
            .map_or_else(|| "off".to_string(), |fps| fps.to_string())
    }
}

/// `DN2_SLOW_FRAME_MS` overrides the configured delay when it parses.
pub(crate) fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    let configured = Duration::from_millis(config_slow_frame_ms);
    let value = match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => value,
        Err(env::VarError::NotPresent) => return configured,
        Err(err) => {
            warn!(env_var = SLOW_FRAME_ENV_VAR, error = %err, "slow_frame_env_unreadable");
            return configured;
        }
    };
    match value.trim().parse::<u64>() {
        Ok(ms) => Duration::from_millis(ms),
        Err(_) => {
            warn!(env_var = SLOW_FRAME_ENV_VAR, value = %value, "slow_frame_env_invalid");
            configured
        }
    }
}
