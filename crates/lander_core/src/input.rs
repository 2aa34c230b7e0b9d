//! Keyboard state fed by window events and read once per frame.
//!
//! - **Held** keys form the keyboard-state snapshot that drives movement; the
//!   player's movement vector is rebuilt from it every frame.
//! - **Just pressed** keys are discrete key-down events (quit, overlay toggle).
//!   They survive until `end_frame()`, which the main loop calls once the frame
//!   has been fully processed, so a press landing on a frame with zero
//!   simulation steps is still seen.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Q,
    Escape,
    F3,
}

#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.held.remove(&key);
    }

    /// Forget every held key, e.g. when the window loses focus and key-up
    /// events would never arrive.
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn quit_requested(&self) -> bool {
        self.is_just_pressed(Key::Q) || self.is_just_pressed(Key::Escape)
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
    }
}
