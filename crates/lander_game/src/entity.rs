//! Sprite entity with fixed-step physics and block collision.
//!
//! One `update` call is one simulation step:
//!
//!   1. tick the walk animation (only while `movement` is non-zero)
//!   2. horizontal velocity from `movement * speed`, then `velocity += acceleration * dt`
//!   3. move along Y, snap out of any overlapping block, zero Y velocity
//!   4. move along X, snap out of any overlapping block, zero X velocity
//!   5. report the last block hit, or `FellOffMap` below the playable floor
//!
//! Resolution is discrete: a fall fast enough to cross a block within one
//! step passes through it.

use glam::{Mat4, Vec3};
use lander_core::animation::{seconds_to_us, Direction, SpriteAnimation};
use lander_render::{SpriteInstance, TextureId};

use crate::collision::{Aabb, CollisionResult};

/// Anything whose centre drops below this line has left the playable area.
pub const PLAYABLE_FLOOR_Y: f32 = -5.0;

const FULL_TEXTURE_UV: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

#[derive(Debug, Clone)]
pub struct Entity {
    pub position: Vec3,
    /// Input direction for this frame; cleared before input is read again.
    pub movement: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub speed: f32,
    /// Collision box and rendered quad size, in world units.
    pub width: f32,
    pub height: f32,
    pub texture: TextureId,
    pub animation: Option<SpriteAnimation>,
    /// World blocks only: landing here wins instead of loses.
    pub win_block: bool,
    model_matrix: Mat4,
}

impl Entity {
    pub fn new(texture: TextureId) -> Self {
        let mut entity = Self {
            position: Vec3::ZERO,
            movement: Vec3::ZERO,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            speed: 0.0,
            width: 1.0,
            height: 1.0,
            texture,
            animation: None,
            win_block: false,
            model_matrix: Mat4::IDENTITY,
        };
        entity.refresh_model_matrix();
        entity
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self.refresh_model_matrix();
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self.refresh_model_matrix();
        self
    }

    pub fn with_animation(mut self, animation: SpriteAnimation) -> Self {
        self.animation = Some(animation);
        self
    }

    pub fn move_left(&mut self) {
        self.movement.x = -1.0;
        self.face(Direction::Left);
    }

    pub fn move_right(&mut self) {
        self.movement.x = 1.0;
        self.face(Direction::Right);
    }

    pub fn face(&mut self, direction: Direction) {
        if let Some(animation) = &mut self.animation {
            animation.face(direction);
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.position.x, self.position.y, self.width, self.height)
    }

    #[allow(dead_code)]
    pub fn model_matrix(&self) -> Mat4 {
        self.model_matrix
    }

    /// Advance one step against `world`. Static entities pass an empty slice
    /// (and usually `delta_time = 0.0`) just to settle their model matrix.
    pub fn update(&mut self, delta_time: f32, world: &[Entity]) -> CollisionResult {
        let moving = self.movement != Vec3::ZERO;
        if let Some(animation) = &mut self.animation {
            animation.tick(seconds_to_us(delta_time), moving);
        }

        let movement = if self.movement.length() > 1.0 {
            self.movement.normalize()
        } else {
            self.movement
        };
        self.velocity.x = movement.x * self.speed;
        self.velocity += self.acceleration * delta_time;

        let mut result = CollisionResult::NoCollision;

        self.position.y += self.velocity.y * delta_time;
        if let Some(index) = self.resolve_vertical(world) {
            result = CollisionResult::HitBlock(index);
        }

        self.position.x += self.velocity.x * delta_time;
        if let Some(index) = self.resolve_horizontal(world) {
            result = CollisionResult::HitBlock(index);
        }

        if self.position.y < PLAYABLE_FLOOR_Y {
            result = CollisionResult::FellOffMap;
        }

        self.refresh_model_matrix();
        result
    }

    fn resolve_vertical(&mut self, world: &[Entity]) -> Option<usize> {
        let mut hit = None;
        for (index, block) in world.iter().enumerate() {
            let own = self.aabb();
            let other = block.aabb();
            if !own.overlaps(&other) {
                continue;
            }
            let (_, gap_y) = own.gaps(&other);
            if self.velocity.y > 0.0 {
                self.position.y += gap_y;
            } else if self.velocity.y < 0.0 {
                self.position.y -= gap_y;
            }
            self.velocity.y = 0.0;
            hit = Some(index);
        }
        hit
    }

    fn resolve_horizontal(&mut self, world: &[Entity]) -> Option<usize> {
        let mut hit = None;
        for (index, block) in world.iter().enumerate() {
            let own = self.aabb();
            let other = block.aabb();
            if !own.overlaps(&other) {
                continue;
            }
            let (gap_x, _) = own.gaps(&other);
            if self.velocity.x > 0.0 {
                self.position.x += gap_x;
            } else if self.velocity.x < 0.0 {
                self.position.x -= gap_x;
            }
            self.velocity.x = 0.0;
            hit = Some(index);
        }
        hit
    }

    fn refresh_model_matrix(&mut self) {
        self.model_matrix = Mat4::from_translation(self.position)
            * Mat4::from_scale(Vec3::new(self.width, self.height, 1.0));
    }

    pub fn sprite_instance(&self) -> SpriteInstance {
        SpriteInstance {
            model: self.model_matrix.to_cols_array_2d(),
            uv_rect: self
                .animation
                .as_ref()
                .map_or(FULL_TEXTURE_UV, SpriteAnimation::uv_rect),
        }
    }
}
