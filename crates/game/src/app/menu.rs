use std::time::Duration;

use dn2_engine::base::{Color, Rect};
use dn2_engine::{GameMode, InputAction, InputEvent, ModeContext};
use tracing::info;

use super::bootstrap::GameSettings;
use super::gameplay::{ingame_mode, LevelStart};

const MENU_MUSIC: &str = "menu";
const CONTINUE_SLOT: usize = 0;

const ENTRY_LEFT: i32 = 100;
const ENTRY_TOP: i32 = 70;
const ENTRY_WIDTH: i32 = 120;
const ENTRY_HEIGHT: i32 = 14;
const ENTRY_SPACING: i32 = 22;

const BACKGROUND_COLOR: Color = Color::rgb(0, 0, 80);
const ENTRY_COLOR: Color = Color::rgb(120, 120, 170);
const SELECTED_ENTRY_COLOR: Color = Color::rgb(255, 255, 85);
const DISABLED_ENTRY_COLOR: Color = Color::rgb(60, 60, 90);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuEntry {
    NewGame,
    Continue,
    Quit,
}

const MENU_ENTRIES: [MenuEntry; 3] = [MenuEntry::NewGame, MenuEntry::Continue, MenuEntry::Quit];

/// Stand-in for the scripted main menu: new game, continue from the
/// autosave slot, quit.
pub(crate) struct MenuMode {
    settings: GameSettings,
    selected: usize,
    music_started: bool,
}

impl MenuMode {
    pub(crate) fn new(settings: GameSettings) -> Self {
        Self {
            settings,
            selected: 0,
            music_started: false,
        }
    }

    fn can_continue(&self) -> bool {
        self.settings
            .profile
            .borrow()
            .save_slot(CONTINUE_SLOT)
            .is_some()
    }

    fn is_enabled(&self, entry: MenuEntry) -> bool {
        entry != MenuEntry::Continue || self.can_continue()
    }

    /// Moves the selection, skipping disabled entries. Returns the entry
    /// to activate, if any.
    fn navigate(&mut self, action: InputAction) -> Option<MenuEntry> {
        match action {
            InputAction::MoveUp | InputAction::MoveDown => {
                let step = if action == InputAction::MoveUp {
                    MENU_ENTRIES.len() - 1
                } else {
                    1
                };
                let mut next = self.selected;
                for _ in 0..MENU_ENTRIES.len() {
                    next = (next + step) % MENU_ENTRIES.len();
                    if self.is_enabled(MENU_ENTRIES[next]) {
                        break;
                    }
                }
                self.selected = next;
                None
            }
            InputAction::Confirm | InputAction::Fire => {
                let entry = MENU_ENTRIES[self.selected];
                self.is_enabled(entry).then_some(entry)
            }
            InputAction::Back => Some(MenuEntry::Quit),
            _ => None,
        }
    }

    fn level_start(&self, entry: MenuEntry) -> Option<LevelStart> {
        match entry {
            MenuEntry::NewGame => Some(LevelStart::new_game(&self.settings.start_level)),
            MenuEntry::Continue => self
                .settings
                .profile
                .borrow()
                .save_slot(CONTINUE_SLOT)
                .map(LevelStart::from_saved_game),
            MenuEntry::Quit => None,
        }
    }
}

impl GameMode for MenuMode {
    fn name(&self) -> &'static str {
        "menu"
    }

    fn handle_event(&mut self, event: &InputEvent, context: &mut ModeContext<'_>) {
        if !event.pressed {
            return;
        }
        let Some(entry) = self.navigate(event.action) else {
            return;
        };

        if entry == MenuEntry::Quit {
            context.request_quit();
            return;
        }
        if let Some(start) = self.level_start(entry) {
            info!(level = %start.level, score = start.score, "menu_start_level");
            context.audio.stop_music();
            self.music_started = false;
            context.schedule_mode_switch(ingame_mode(self.settings.clone(), start));
        }
    }

    fn update_and_render(&mut self, _dt: Duration, context: &mut ModeContext<'_>) {
        if !self.music_started {
            self.music_started = true;
            context.audio.play_music(MENU_MUSIC);
        }

        let renderer = &mut *context.renderer;
        renderer.clear(BACKGROUND_COLOR);
        for (index, entry) in MENU_ENTRIES.iter().enumerate() {
            let color = if !self.is_enabled(*entry) {
                DISABLED_ENTRY_COLOR
            } else if index == self.selected {
                SELECTED_ENTRY_COLOR
            } else {
                ENTRY_COLOR
            };
            let top = ENTRY_TOP + index as i32 * ENTRY_SPACING;
            renderer.draw_rectangle(Rect::new(ENTRY_LEFT, top, ENTRY_WIDTH, ENTRY_HEIGHT), color);
        }
    }
}
