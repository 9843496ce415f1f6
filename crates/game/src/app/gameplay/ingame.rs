const LEVELS_PER_EPISODE: u32 = 8;
const HIGH_SCORE_NAME: &str = "Duke";
const AUTOSAVE_NAME: &str = "autosave";
const AUTOSAVE_SLOT: usize = 0;
const MESSAGE_DISPLAY_TICKS: u32 = 45;

const HUD_TOP: i32 = INGAME_VIEWPORT_OFFSET.y + INGAME_VIEWPORT_SIZE_PX.height + 8;
const HUD_HEALTH_LEFT: i32 = INGAME_VIEWPORT_OFFSET.x;
const HUD_HEALTH_CELL_WIDTH: i32 = 8;
const HUD_HEALTH_CELL_SIZE: Extents = Extents::new(6, 8);
const HUD_HEALTH_COLOR: Color = Color::rgb(85, 255, 85);
const HUD_MISSING_HEALTH_COLOR: Color = Color::rgb(60, 60, 60);
const HUD_MESSAGE_RECT: Rect = Rect::new(
    INGAME_VIEWPORT_OFFSET.x,
    INGAME_VIEWPORT_OFFSET.y,
    INGAME_VIEWPORT_SIZE_PX.width,
    8,
);
const HUD_MESSAGE_COLOR: Color = Color::rgb(255, 255, 85);

/// Where and how a level run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LevelStart {
    pub(crate) level: String,
    pub(crate) score: i32,
    pub(crate) weapon: SavedWeapon,
}

impl LevelStart {
    pub(crate) fn new_game(level: &str) -> Self {
        Self {
            level: level.to_string(),
            score: 0,
            weapon: SavedWeapon::Regular,
        }
    }

    pub(crate) fn from_saved_game(saved: &SavedGame) -> Self {
        Self {
            level: saved.level.clone(),
            score: saved.score,
            weapon: saved.weapon,
        }
    }

    fn player_model(&self) -> PlayerModel {
        let mut model = PlayerModel::with_score(self.score);
        if self.weapon == SavedWeapon::Laser {
            model.switch_to_weapon(WeaponType::Laser);
        }
        model
    }

    fn after_completing(&self, model: &PlayerModel) -> Option<Self> {
        let level = next_level_name(&self.level)?;
        Some(Self {
            level,
            score: model.score,
            weapon: match model.weapon {
                WeaponType::Regular => SavedWeapon::Regular,
                WeaponType::Laser => SavedWeapon::Laser,
            },
        })
    }
}

/// `l1` continues with `l2`; the eighth level of an episode has no
/// successor.
fn next_level_name(level: &str) -> Option<String> {
    let mut chars = level.chars();
    let prefix = chars.next()?;
    let number: u32 = chars.as_str().parse().ok()?;
    (number < LEVELS_PER_EPISODE).then(|| format!("{prefix}{}", number + 1))
}

pub(crate) fn ingame_mode(settings: GameSettings, start: LevelStart) -> Box<dyn GameMode> {
    Box::new(IngameMode::new(settings, start))
}

struct LoadedLevel {
    session: LevelSession,
    rendering: RenderingSystem,
}

/// Runs one level at the fixed logic rate. The level is loaded on the
/// first update, once renderer and assets are at hand.
struct IngameMode {
    settings: GameSettings,
    start: LevelStart,
    clock: FixedStepClock,
    input: InputAccumulator,
    host: GameplaySystemsHost,
    level: Option<LoadedLevel>,
    show_debug_overlay: bool,
    message_ticks_left: u32,
    finished: bool,
}

impl IngameMode {
    fn new(settings: GameSettings, start: LevelStart) -> Self {
        Self {
            settings,
            start,
            clock: FixedStepClock::game_logic(),
            input: InputAccumulator::default(),
            host: GameplaySystemsHost::default(),
            level: None,
            show_debug_overlay: false,
            message_ticks_left: 0,
            finished: false,
        }
    }

    fn load(&self, context: &mut ModeContext<'_>) -> Result<LoadedLevel, LevelLoadError> {
        let level = context.assets.load_level(&self.start.level)?;
        let catalog = ActorCatalog::load(context.renderer, context.assets)?;
        let map_renderer = MapRenderer::new(context.renderer, &level.render_data);
        let rendering = RenderingSystem::new(context.renderer, map_renderer);
        match &level.music {
            Some(music) => context.audio.play_music(music),
            None => context.audio.stop_music(),
        }
        let session = LevelSession::new(
            level,
            catalog,
            self.start.player_model(),
            self.settings.seed,
        )?;
        Ok(LoadedLevel { session, rendering })
    }

    fn finish(&mut self, context: &mut ModeContext<'_>, next: Box<dyn GameMode>) {
        self.finished = true;
        context.audio.stop_music();
        context.schedule_mode_switch(next);
    }

    fn return_to_menu(&mut self, context: &mut ModeContext<'_>) {
        let menu = Box::new(MenuMode::new(self.settings.clone()));
        self.finish(context, menu);
    }

    fn record_high_score(&self, score: i32) {
        let episode = episode_for_level(&self.start.level);
        let inserted = self.settings.profile.borrow_mut().insert_high_score(
            episode,
            HighScoreEntry {
                name: HIGH_SCORE_NAME.to_string(),
                score,
            },
        );
        if inserted {
            info!(episode, score, "high_score_recorded");
        }
    }

    fn handle_outcome(&mut self, outcome: LevelOutcome, model: &PlayerModel, context: &mut ModeContext<'_>) {
        match outcome {
            LevelOutcome::Completed => match self.start.after_completing(model) {
                Some(next) => {
                    self.settings.profile.borrow_mut().store_save_slot(
                        AUTOSAVE_SLOT,
                        SavedGame {
                            name: AUTOSAVE_NAME.to_string(),
                            level: next.level.clone(),
                            score: next.score,
                            weapon: next.weapon,
                        },
                    );
                    info!(level = %next.level, "autosave_stored");
                    let mode = ingame_mode(self.settings.clone(), next);
                    self.finish(context, mode);
                }
                None => {
                    info!(level = %self.start.level, score = model.score, "episode_completed");
                    self.record_high_score(model.score);
                    self.return_to_menu(context);
                }
            },
            LevelOutcome::PlayerDied => {
                info!(level = %self.start.level, "level_restarting");
                let mode = ingame_mode(self.settings.clone(), self.start.clone());
                self.finish(context, mode);
            }
        }
    }

    fn render(&mut self, renderer: &mut Renderer) {
        renderer.clear(Color::BLACK);
        let show_debug_overlay = self.show_debug_overlay;
        let message_ticks_left = self.message_ticks_left;
        let Some(level) = self.level.as_mut() else {
            return;
        };
        let session = &level.session;
        let camera_position = session.camera.position();

        let saved_state = renderer.save_state();
        let shake = Vector::new(0, session.effects.shake_offset_px());
        renderer.set_global_translation(INGAME_VIEWPORT_OFFSET + shake);
        renderer.set_clip_rect(Some(viewport_clip_rect()));

        level.rendering.update(
            renderer,
            &session.world,
            &session.map,
            camera_position,
            session.effects.backdrop_flash_color(),
        );
        session.particles.render(renderer, camera_position);
        if show_debug_overlay {
            render_debug_overlay(renderer, session);
        }
        renderer.restore_state(saved_state);

        render_hud(renderer, &session.model, message_ticks_left);
    }
}

fn render_hud(renderer: &mut Renderer, model: &PlayerModel, message_ticks_left: u32) {
    for slot in 0..PLAYER_MAX_HEALTH {
        let color = if slot < model.health {
            HUD_HEALTH_COLOR
        } else {
            HUD_MISSING_HEALTH_COLOR
        };
        let cell = Rect::new(
            HUD_HEALTH_LEFT + slot * HUD_HEALTH_CELL_WIDTH,
            HUD_TOP,
            HUD_HEALTH_CELL_SIZE.width,
            HUD_HEALTH_CELL_SIZE.height,
        );
        renderer.draw_rectangle(cell, color);
    }
    if message_ticks_left > 0 {
        renderer.draw_rectangle(HUD_MESSAGE_RECT, HUD_MESSAGE_COLOR);
    }
}

/// The in-game viewport in mode target pixels.
fn viewport_clip_rect() -> Rect {
    let scale = game_screen_upscale();
    Rect::new(
        (INGAME_VIEWPORT_OFFSET.x as f32 * scale.x) as i32,
        (INGAME_VIEWPORT_OFFSET.y as f32 * scale.y) as i32,
        (INGAME_VIEWPORT_SIZE_PX.width as f32 * scale.x).round() as i32,
        (INGAME_VIEWPORT_SIZE_PX.height as f32 * scale.y).round() as i32,
    )
}

impl GameMode for IngameMode {
    fn name(&self) -> &'static str {
        "ingame"
    }

    fn handle_event(&mut self, event: &InputEvent, context: &mut ModeContext<'_>) {
        if self.finished {
            return;
        }
        self.input.handle_event(event);
        if !event.pressed {
            return;
        }
        match event.action {
            InputAction::Back => {
                let score = self
                    .level
                    .as_ref()
                    .map_or(self.start.score, |level| level.session.model.score);
                info!(level = %self.start.level, score, "level_aborted");
                self.record_high_score(score);
                self.return_to_menu(context);
            }
            InputAction::ToggleDebug => {
                self.show_debug_overlay = !self.show_debug_overlay;
                debug!(enabled = self.show_debug_overlay, "debug_overlay_toggled");
            }
            _ => {}
        }
    }

    fn update_and_render(&mut self, dt: Duration, context: &mut ModeContext<'_>) {
        if self.level.is_none() && !self.finished {
            match self.load(context) {
                Ok(level) => self.level = Some(level),
                Err(err) => {
                    error!(level = %self.start.level, error = %err, "level_load_failed");
                    self.return_to_menu(context);
                }
            }
        }

        if !self.finished {
            if let Some(level) = self.level.as_mut() {
                let plan = self.clock.advance(dt);
                let mut ticks_run = 0;
                for _ in 0..plan.ticks_to_run {
                    let input = self.input.snapshot_for_tick();
                    self.host
                        .run_once_per_tick(&mut level.session, input, Some(&mut level.rendering));
                    ticks_run += 1;
                    self.message_ticks_left = self.message_ticks_left.saturating_sub(1);

                    if std::mem::take(&mut level.session.backdrop_switch_pending) {
                        level.rendering.map_renderer_mut().switch_backdrops();
                    }
                    if level.session.outcome.is_some() {
                        break;
                    }
                }
                context.record_logic_ticks(ticks_run);

                for sound in level.session.take_sounds() {
                    context.audio.play_sound(sound);
                }
                if !std::mem::take(&mut level.session.messages).is_empty() {
                    self.message_ticks_left = MESSAGE_DISPLAY_TICKS;
                }

                if let Some(outcome) = level.session.outcome {
                    let model = level.session.model.clone();
                    self.handle_outcome(outcome, &model, context);
                }
            }
        }

        self.render(context.renderer);
    }
}
