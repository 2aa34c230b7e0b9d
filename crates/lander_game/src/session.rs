//! Everything one play-through owns: the player, the block arena, the two
//! result banners and the outcome.
//!
//! Block indices in `world` are the identifiers `CollisionResult::HitBlock`
//! reports. The outcome is decided by the first collision that matters and
//! never changes afterwards; the simulation itself keeps running.

use glam::Vec3;
use lander_core::animation::{Direction, SpriteAnimation};
use lander_render::TextureId;

use crate::collision::CollisionResult;
use crate::config::{BlockKind, GameConfig};
use crate::controller::MovementIntent;
use crate::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Playing,
    Won,
    Lost,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Self::Playing => "Playing",
            Self::Won => "Won",
            Self::Lost => "Lost",
        }
    }
}

/// Texture handles resolved by the renderer before the session is built.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionTextures {
    pub player: TextureId,
    pub lose_block: TextureId,
    pub win_block: TextureId,
    pub win_screen: TextureId,
    pub lose_screen: TextureId,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    pub player: Entity,
    pub world: Vec<Entity>,
    pub win_screen: Entity,
    pub lose_screen: Entity,
    outcome: Outcome,
    last_collision: CollisionResult,
}

impl GameSession {
    pub fn new(config: &GameConfig, textures: &SessionTextures) -> Self {
        let animation =
            SpriteAnimation::new(config.player_sheet, config.walk_cycle, Direction::Right)
                .with_frame_duration_us(config.frame_duration_ms.saturating_mul(1000));
        let mut player = Entity::new(textures.player)
            .with_position(Vec3::new(config.player_start[0], config.player_start[1], 0.0))
            .with_animation(animation);
        player.acceleration = Vec3::new(0.0, config.player_gravity(), 0.0);
        player.speed = config.player_speed;

        let world = config
            .blocks
            .iter()
            .map(|spec| {
                let texture = match spec.kind {
                    BlockKind::Lose => textures.lose_block,
                    BlockKind::Win => textures.win_block,
                };
                let mut block =
                    Entity::new(texture).with_position(Vec3::new(spec.x, spec.y, 0.0));
                block.win_block = spec.kind == BlockKind::Win;
                block.update(0.0, &[]);
                block
            })
            .collect();

        let [banner_w, banner_h] = config.banner_size;
        let mut win_screen = Entity::new(textures.win_screen).with_size(banner_w, banner_h);
        win_screen.update(0.0, &[]);
        let mut lose_screen = Entity::new(textures.lose_screen).with_size(banner_w, banner_h);
        lose_screen.update(0.0, &[]);

        Self {
            player,
            world,
            win_screen,
            lose_screen,
            outcome: Outcome::Playing,
            last_collision: CollisionResult::NoCollision,
        }
    }

    pub fn apply_intent(&mut self, intent: MovementIntent) {
        intent.apply(&mut self.player);
    }

    /// One fixed simulation step.
    pub fn step(&mut self, dt: f32) -> CollisionResult {
        let result = self.player.update(dt, &self.world);
        if result != CollisionResult::NoCollision {
            log::trace!("step collision: {:?}", result);
        }
        self.apply_collision(result);
        result
    }

    /// Fold one step's collision report into the outcome. Has no effect once
    /// the outcome is decided.
    pub fn apply_collision(&mut self, result: CollisionResult) {
        self.last_collision = result;
        if self.outcome != Outcome::Playing {
            return;
        }
        let next = match result {
            CollisionResult::NoCollision => return,
            CollisionResult::HitBlock(index) => match self.world.get(index) {
                Some(block) if block.win_block => Outcome::Won,
                Some(_) => Outcome::Lost,
                None => {
                    log::warn!("Collision reported unknown block index {index}");
                    return;
                }
            },
            CollisionResult::FellOffMap => Outcome::Lost,
        };
        self.outcome = next;
        log::info!(
            "Outcome decided: {} ({:?}, step position ({:.3}, {:.3}))",
            next.label(),
            result,
            self.player.position.x,
            self.player.position.y
        );
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    #[allow(dead_code)]
    pub fn win_game(&self) -> bool {
        self.outcome == Outcome::Won
    }

    #[allow(dead_code)]
    pub fn lose_game(&self) -> bool {
        self.outcome == Outcome::Lost
    }

    pub fn last_collision(&self) -> CollisionResult {
        self.last_collision
    }

    /// Entities in draw order: player, blocks, then the result banner once
    /// the outcome is known.
    pub fn draw_order(&self) -> impl Iterator<Item = &Entity> {
        let banner = match self.outcome {
            Outcome::Playing => None,
            Outcome::Won => Some(&self.win_screen),
            Outcome::Lost => Some(&self.lose_screen),
        };
        std::iter::once(&self.player)
            .chain(self.world.iter())
            .chain(banner)
    }
}
