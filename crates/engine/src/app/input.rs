use winit::event::ElementState;
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Jump,
    Fire,
    Confirm,
    Back,
    ToggleDebug,
}

const ACTION_COUNT: usize = 9;

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Jump,
        InputAction::Fire,
        InputAction::Confirm,
        InputAction::Back,
        InputAction::ToggleDebug,
    ];

    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Jump => 4,
            InputAction::Fire => 5,
            InputAction::Confirm => 6,
            InputAction::Back => 7,
            InputAction::ToggleDebug => 8,
        }
    }
}

/// A change of one action's state, delivered to the current game mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub action: InputAction,
    pub pressed: bool,
}

impl InputEvent {
    pub const fn pressed(action: InputAction) -> Self {
        Self {
            action,
            pressed: true,
        }
    }

    pub const fn released(action: InputAction) -> Self {
        Self {
            action,
            pressed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

/// Held actions plus the actions pressed since the previous logic tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    held: ActionStates,
    pressed: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.held.is_down(action)
    }

    /// True once per press, on the first tick after the key went down.
    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }
}

/// Latches press edges between logic ticks, so a press and release within
/// one tick is still seen.
#[derive(Debug, Clone, Default)]
pub struct InputAccumulator {
    held: ActionStates,
    pressed_edges: ActionStates,
}

impl InputAccumulator {
    pub fn handle_event(&mut self, event: &InputEvent) {
        if event.pressed && !self.held.is_down(event.action) {
            self.pressed_edges.set(event.action, true);
        }
        self.held.set(event.action, event.pressed);
    }

    pub fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot {
            held: self.held,
            pressed: self.pressed_edges,
        };
        self.pressed_edges = ActionStates::default();
        snapshot
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Translates winit key events into [`InputEvent`]s. Key repeats and keys
/// without a mapping produce nothing.
#[derive(Debug, Default)]
pub(crate) struct InputCollector {
    action_states: ActionStates,
}

impl InputCollector {
    pub(crate) fn handle_key(&mut self, key: PhysicalKey, state: ElementState) -> Option<InputEvent> {
        let action = action_for_physical_key(key)?;
        let is_pressed = state == ElementState::Pressed;
        if self.action_states.is_down(action) == is_pressed {
            return None;
        }
        self.action_states.set(action, is_pressed);
        Some(InputEvent {
            action,
            pressed: is_pressed,
        })
    }

    #[cfg(test)]
    pub(crate) fn action_states(&self) -> ActionStates {
        self.action_states
    }
}

fn action_for_physical_key(key: PhysicalKey) -> Option<InputAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let action = match code {
        KeyCode::KeyW | KeyCode::ArrowUp => InputAction::MoveUp,
        KeyCode::KeyS | KeyCode::ArrowDown => InputAction::MoveDown,
        KeyCode::KeyA | KeyCode::ArrowLeft => InputAction::MoveLeft,
        KeyCode::KeyD | KeyCode::ArrowRight => InputAction::MoveRight,
        KeyCode::ControlLeft | KeyCode::ControlRight | KeyCode::Space => InputAction::Jump,
        KeyCode::AltLeft | KeyCode::AltRight | KeyCode::KeyX => InputAction::Fire,
        KeyCode::Enter | KeyCode::NumpadEnter => InputAction::Confirm,
        KeyCode::Escape => InputAction::Back,
        KeyCode::F3 => InputAction::ToggleDebug,
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> PhysicalKey {
        PhysicalKey::Code(code)
    }

    #[test]
    fn wasd_and_arrow_keys_map_to_actions() {
        let mut collector = InputCollector::default();
        assert_eq!(
            collector.handle_key(key(KeyCode::KeyW), ElementState::Pressed),
            Some(InputEvent::pressed(InputAction::MoveUp))
        );
        assert_eq!(
            collector.handle_key(key(KeyCode::ArrowLeft), ElementState::Pressed),
            Some(InputEvent::pressed(InputAction::MoveLeft))
        );
        assert!(collector.action_states().is_down(InputAction::MoveUp));
        assert!(collector.action_states().is_down(InputAction::MoveLeft));
        assert!(!collector.action_states().is_down(InputAction::MoveRight));
    }

    #[test]
    fn key_repeat_does_not_produce_events() {
        let mut collector = InputCollector::default();
        assert!(collector
            .handle_key(key(KeyCode::Space), ElementState::Pressed)
            .is_some());
        assert!(collector
            .handle_key(key(KeyCode::Space), ElementState::Pressed)
            .is_none());
        assert_eq!(
            collector.handle_key(key(KeyCode::Space), ElementState::Released),
            Some(InputEvent::released(InputAction::Jump))
        );
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        let mut collector = InputCollector::default();
        assert!(collector
            .handle_key(key(KeyCode::KeyQ), ElementState::Pressed)
            .is_none());
    }

    #[test]
    fn press_edge_is_seen_for_single_tick() {
        let mut accumulator = InputAccumulator::default();
        accumulator.handle_event(&InputEvent::pressed(InputAction::Fire));

        let first = accumulator.snapshot_for_tick();
        assert!(first.was_pressed(InputAction::Fire));
        assert!(first.is_down(InputAction::Fire));

        let second = accumulator.snapshot_for_tick();
        assert!(!second.was_pressed(InputAction::Fire));
        assert!(second.is_down(InputAction::Fire));
    }

    #[test]
    fn press_and_release_between_ticks_still_triggers() {
        let mut accumulator = InputAccumulator::default();
        accumulator.handle_event(&InputEvent::pressed(InputAction::Jump));
        accumulator.handle_event(&InputEvent::released(InputAction::Jump));

        let snapshot = accumulator.snapshot_for_tick();
        assert!(snapshot.was_pressed(InputAction::Jump));
        assert!(!snapshot.is_down(InputAction::Jump));
    }
}
