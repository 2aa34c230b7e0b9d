use glam::Vec3;
use lander_core::input::{InputState, Key};

use crate::entity::Entity;

/// Horizontal intent read from the keyboard once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementIntent {
    pub move_x: f32,
}

/// Left wins over Right when both are held.
pub fn movement_intent(input: &InputState) -> MovementIntent {
    let move_x = if input.is_held(Key::Left) {
        -1.0
    } else if input.is_held(Key::Right) {
        1.0
    } else {
        0.0
    };
    MovementIntent { move_x }
}

impl MovementIntent {
    /// Rebuild the player's movement vector from scratch. Facing only changes
    /// on a key press, so an idle player keeps looking the way they last moved.
    pub fn apply(self, player: &mut Entity) {
        player.movement = Vec3::ZERO;
        if self.move_x < 0.0 {
            player.move_left();
        } else if self.move_x > 0.0 {
            player.move_right();
        }
        player.movement.x *= self.move_x.abs().min(1.0);
        if player.movement.length() > 1.0 {
            player.movement = player.movement.normalize();
        }
    }
}
