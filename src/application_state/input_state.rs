//! # Input State
//!
//! Per-step input signals and their transitions.
//!
//! A frontend (a window, a replay file, a test script) reports which actions
//! are held and how far the view was dragged. [`InputTracker`] turns those
//! raw booleans into [`RawInputState`] transitions once per step, so the
//! engine can tell a fresh press from a held button.

use std::collections::HashMap;

use crate::engine_state::voxels::block::block_type::BlockType;

/// Represents the state of a key or button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawInputState {
    /// Not pressed
    #[default]
    NotPressed,
    /// Pressed this step
    Pressed,
    /// Held down for multiple steps
    Held,
    /// Released this step
    Released,
}

impl RawInputState {
    /// Determines if the input is actively down (either pressed or held)
    pub fn is_active(&self) -> bool {
        matches!(self, RawInputState::Pressed | RawInputState::Held)
    }

    /// Determines if the input was just pressed this step
    pub fn is_just_pressed(&self) -> bool {
        matches!(self, RawInputState::Pressed)
    }

    /// Determines if the input was just released this step
    pub fn is_just_released(&self) -> bool {
        matches!(self, RawInputState::Released)
    }

    /// Derives the transition from the previous and current raw states
    pub fn from_raw_states(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (false, true) => RawInputState::Pressed,
            (true, true) => RawInputState::Held,
            (true, false) => RawInputState::Released,
            (false, false) => RawInputState::NotPressed,
        }
    }
}

/// Abstract actions a frontend can bind keys or buttons to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    /// Walk forward
    MoveForward,
    /// Walk backward
    MoveBackward,
    /// Strafe left
    MoveLeft,
    /// Strafe right
    MoveRight,
    /// Jump
    Jump,
    /// Sprint while held
    Sprint,
    /// Break the targeted block while held
    BreakBlock,
    /// Place a block on press
    PlaceBlock,
}

impl InputAction {
    /// Every action.
    pub fn all() -> [InputAction; 8] {
        [
            InputAction::MoveForward,
            InputAction::MoveBackward,
            InputAction::MoveLeft,
            InputAction::MoveRight,
            InputAction::Jump,
            InputAction::Sprint,
            InputAction::BreakBlock,
            InputAction::PlaceBlock,
        ]
    }
}

/// A snapshot of the input for one step, with transitions resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedInputState {
    /// State of every tracked action
    pub action_states: HashMap<InputAction, RawInputState>,
    /// View drag since the last step (x, y)
    pub look_delta: Option<(f64, f64)>,
    /// Block type chosen this step, if any
    pub selected_block: Option<BlockType>,
}

impl ProcessedInputState {
    /// Gets the state of an action
    pub fn get_action_state(&self, action: InputAction) -> RawInputState {
        self.action_states.get(&action).copied().unwrap_or_default()
    }

    /// Gets the view drag since the last step
    pub fn get_look_delta(&self) -> Option<(f64, f64)> {
        self.look_delta
    }
}

/// Accumulates raw input between steps.
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    held_old: HashMap<InputAction, bool>,
    held_new: HashMap<InputAction, bool>,
    look_delta: Option<(f64, f64)>,
    selected_block: Option<BlockType>,
}

impl InputTracker {
    /// Creates a tracker with nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records whether an action is currently held.
    pub fn set_held(&mut self, action: InputAction, held: bool) {
        self.held_new.insert(action, held);
    }

    /// Adds to the view drag for this step.
    pub fn add_look_delta(&mut self, dx: f64, dy: f64) {
        let (x, y) = self.look_delta.unwrap_or((0.0, 0.0));
        self.look_delta = Some((x + dx, y + dy));
    }

    /// Chooses the block type used for placement.
    pub fn select_block(&mut self, block_type: BlockType) {
        self.selected_block = Some(block_type);
    }

    /// Resolves this step's transitions and starts the next step.
    pub fn process(&mut self) -> ProcessedInputState {
        let action_states = InputAction::all()
            .into_iter()
            .map(|action| {
                let previous = self.held_old.get(&action).copied().unwrap_or(false);
                let current = self.held_new.get(&action).copied().unwrap_or(previous);
                (action, RawInputState::from_raw_states(previous, current))
            })
            .collect();

        for (action, held) in self.held_new.drain() {
            self.held_old.insert(action, held);
        }

        ProcessedInputState {
            action_states,
            look_delta: self.look_delta.take(),
            selected_block: self.selected_block.take(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_hold_release_sequence() {
        let mut tracker = InputTracker::new();
        tracker.set_held(InputAction::PlaceBlock, true);
        assert!(tracker.process().get_action_state(InputAction::PlaceBlock).is_just_pressed());
        // Not reported again: still held.
        assert_eq!(
            tracker.process().get_action_state(InputAction::PlaceBlock),
            RawInputState::Held
        );
        tracker.set_held(InputAction::PlaceBlock, false);
        assert!(tracker.process().get_action_state(InputAction::PlaceBlock).is_just_released());
        assert_eq!(
            tracker.process().get_action_state(InputAction::PlaceBlock),
            RawInputState::NotPressed
        );
    }

    #[test]
    fn look_delta_accumulates_and_resets() {
        let mut tracker = InputTracker::new();
        tracker.add_look_delta(1.0, 2.0);
        tracker.add_look_delta(0.5, -1.0);
        assert_eq!(tracker.process().get_look_delta(), Some((1.5, 1.0)));
        assert_eq!(tracker.process().get_look_delta(), None);
    }
}
