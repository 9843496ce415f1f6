use std::time::Duration;

use tracing::info;

use crate::assets::AssetProvider;
use crate::base::Color;

use super::fade::{FadeDirection, FadeState};
use super::input::InputEvent;
use super::rendering::{
    game_screen_upscale, RenderTargetBinder, RenderTargetTexture, Renderer, LOGICAL_DISPLAY_HEIGHT,
    LOGICAL_DISPLAY_WIDTH,
};
use super::services::AudioService;

/// A top-level state of the application, e.g. the menu or a running level.
pub trait GameMode {
    fn name(&self) -> &'static str;

    fn handle_event(&mut self, event: &InputEvent, context: &mut ModeContext<'_>);

    /// Advances the mode by `dt` and draws it into the currently bound
    /// target. Called with a zero `dt` once right after the mode became
    /// current.
    fn update_and_render(&mut self, dt: Duration, context: &mut ModeContext<'_>);
}

#[derive(Default)]
struct ModeRequests {
    next_mode: Option<Box<dyn GameMode>>,
    quit: bool,
    logic_ticks: u32,
}

/// Services handed to a mode for one call.
pub struct ModeContext<'a> {
    pub renderer: &'a mut Renderer,
    pub audio: &'a mut dyn AudioService,
    pub assets: &'a dyn AssetProvider,
    requests: &'a mut ModeRequests,
}

impl ModeContext<'_> {
    /// Switches to `mode` after fading out. Replaces an earlier request
    /// from the same frame.
    pub fn schedule_mode_switch(&mut self, mode: Box<dyn GameMode>) {
        self.requests.next_mode = Some(mode);
    }

    pub fn request_quit(&mut self) {
        self.requests.quit = true;
    }

    /// Reports fixed logic ticks run during this call, for loop metrics.
    pub fn record_logic_ticks(&mut self, ticks: u32) {
        self.requests.logic_ticks = self.requests.logic_ticks.saturating_add(ticks);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    pub quit_requested: bool,
    pub logic_ticks: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransitionPhase {
    Idle,
    FadingOut,
    FadingIn,
}

/// Runs the current mode once per frame and handles fades between modes.
///
/// Modes draw into a logical-display sized target with the game screen
/// upscale applied; the target is then drawn onto the window with the fade
/// alpha as color modulation.
pub struct FrameOrchestrator {
    current: Box<dyn GameMode>,
    pending: Option<Box<dyn GameMode>>,
    phase: TransitionPhase,
    fade: FadeState,
    mode_target: RenderTargetTexture,
    initial_render_done: bool,
    quit_requested: bool,
}

impl FrameOrchestrator {
    /// The first mode fades in from black.
    pub fn new(renderer: &mut Renderer, initial_mode: Box<dyn GameMode>) -> Self {
        let mode_target =
            renderer.create_render_target_texture(LOGICAL_DISPLAY_WIDTH, LOGICAL_DISPLAY_HEIGHT);
        Self {
            current: initial_mode,
            pending: None,
            phase: TransitionPhase::FadingIn,
            fade: FadeState::faded_out(),
            mode_target,
            initial_render_done: false,
            quit_requested: false,
        }
    }

    pub fn current_mode_name(&self) -> &'static str {
        self.current.name()
    }

    pub fn fade_alpha(&self) -> u8 {
        self.fade.alpha()
    }

    pub fn is_transitioning(&self) -> bool {
        self.phase != TransitionPhase::Idle
    }

    /// Runs one frame and composites it onto the window target. The caller
    /// presents afterwards.
    pub fn run_frame(
        &mut self,
        dt: Duration,
        events: &[InputEvent],
        renderer: &mut Renderer,
        audio: &mut dyn AudioService,
        assets: &dyn AssetProvider,
    ) -> FrameOutcome {
        let mut requests = ModeRequests::default();

        if !self.initial_render_done {
            self.initial_render_done = true;
            info!(mode = self.current.name(), "mode_started");
            self.render_current_initial(renderer, audio, assets, &mut requests);
        }

        match self.phase {
            TransitionPhase::Idle => {
                let mut bound = RenderTargetBinder::new(renderer, self.mode_target);
                bound.set_global_scale(game_screen_upscale());
                let mut context = ModeContext {
                    renderer: &mut bound,
                    audio: &mut *audio,
                    assets,
                    requests: &mut requests,
                };
                for event in events {
                    self.current.handle_event(event, &mut context);
                }
                self.current.update_and_render(dt, &mut context);
            }
            TransitionPhase::FadingOut => {
                if self.fade.advance(dt) == Some(FadeDirection::Out) {
                    self.swap_to_pending(renderer, audio, assets, &mut requests);
                }
            }
            TransitionPhase::FadingIn => {
                if self.fade.is_fading() || self.fade.start(FadeDirection::In) {
                    if self.fade.advance(dt) == Some(FadeDirection::In) {
                        self.phase = TransitionPhase::Idle;
                    }
                } else {
                    self.phase = TransitionPhase::Idle;
                }
            }
        }

        if let Some(next) = requests.next_mode.take() {
            self.begin_transition(next, renderer, audio, assets, &mut requests);
        }
        if requests.quit && !self.quit_requested {
            self.quit_requested = true;
            info!(mode = self.current.name(), "quit_requested");
        }

        self.composite(renderer);

        FrameOutcome {
            quit_requested: self.quit_requested,
            logic_ticks: requests.logic_ticks,
        }
    }

    fn begin_transition(
        &mut self,
        next: Box<dyn GameMode>,
        renderer: &mut Renderer,
        audio: &mut dyn AudioService,
        assets: &dyn AssetProvider,
        requests: &mut ModeRequests,
    ) {
        info!(from = self.current.name(), to = next.name(), "mode_switch_scheduled");
        self.pending = Some(next);
        if self.fade.start(FadeDirection::Out) {
            self.phase = TransitionPhase::FadingOut;
        } else {
            self.swap_to_pending(renderer, audio, assets, requests);
        }
    }

    fn swap_to_pending(
        &mut self,
        renderer: &mut Renderer,
        audio: &mut dyn AudioService,
        assets: &dyn AssetProvider,
        requests: &mut ModeRequests,
    ) {
        let Some(next) = self.pending.take() else {
            self.phase = TransitionPhase::FadingIn;
            return;
        };
        self.current = next;
        info!(mode = self.current.name(), "mode_switched");
        self.render_current_initial(renderer, audio, assets, requests);
        self.phase = TransitionPhase::FadingIn;
    }

    fn render_current_initial(
        &mut self,
        renderer: &mut Renderer,
        audio: &mut dyn AudioService,
        assets: &dyn AssetProvider,
        requests: &mut ModeRequests,
    ) {
        let mut bound = RenderTargetBinder::new(renderer, self.mode_target);
        bound.set_global_scale(game_screen_upscale());
        bound.clear(Color::BLACK);
        let mut context = ModeContext {
            renderer: &mut bound,
            audio,
            assets,
            requests,
        };
        self.current.update_and_render(Duration::ZERO, &mut context);
    }

    fn composite(&self, renderer: &mut Renderer) {
        let mut window = RenderTargetBinder::default_target(renderer);
        window.clear(Color::BLACK);
        let alpha = self.fade.alpha();
        if alpha == 0 {
            return;
        }
        window.set_color_modulation(Color::rgba(255, 255, 255, alpha));
        self.mode_target.render(&mut window, 0, 0);
        window.set_color_modulation(Color::WHITE);
    }
}
