mod fade;
mod input;
mod loop_runner;
mod metrics;
mod mode;
pub mod rendering;
mod services;
mod timing;

pub use fade::{FadeDirection, FadeState};
pub use input::{ActionStates, InputAccumulator, InputAction, InputEvent, InputSnapshot};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, AppServices, LoopConfig};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use mode::{FrameOrchestrator, FrameOutcome, GameMode, ModeContext};
pub use rendering::Renderer;
pub use services::{AudioLog, AudioRequest, AudioService, LoggingAudio, RecordingAudio, SoundId};
pub use timing::{
    fast_ticks, plan_sim_steps, FixedStepClock, StepPlan, FAST_TICKS_PER_SECOND,
    GAME_LOGIC_TICKS_PER_SECOND, SLOW_FRAME_ENV_VAR,
};
