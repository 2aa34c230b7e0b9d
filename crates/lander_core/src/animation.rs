//! Sprite-sheet walk animation.
//!
//! A sheet is a grid of equally sized cells numbered row-major from the top-left.
//! A `WalkCycle` lists, per facing direction, which four cells make up one walk
//! loop. `SpriteAnimation` tracks the facing, the offset into the active loop
//! and the time spent on the current frame.
//!
//! Timing is kept in integer microseconds so repeated fixed steps advance the
//! animation identically on every platform.

use serde::Deserialize;

/// Frames in one walk loop.
pub const WALK_FRAMES: usize = 4;

/// Time each frame stays on screen while moving.
pub const DEFAULT_FRAME_DURATION_US: u64 = 250_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];
}

/// Sheet cells shown for each facing direction, in playback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WalkCycle {
    pub left: [usize; WALK_FRAMES],
    pub right: [usize; WALK_FRAMES],
    pub up: [usize; WALK_FRAMES],
    pub down: [usize; WALK_FRAMES],
}

impl WalkCycle {
    pub fn frames(&self, direction: Direction) -> &[usize; WALK_FRAMES] {
        match direction {
            Direction::Left => &self.left,
            Direction::Right => &self.right,
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }

    /// Largest cell index referenced by any direction.
    pub fn max_cell(&self) -> usize {
        Direction::ALL
            .iter()
            .flat_map(|&d| self.frames(d).iter().copied())
            .max()
            .unwrap_or(0)
    }
}

impl Default for WalkCycle {
    /// Layout of a 4x4 character sheet whose columns are facing down, left,
    /// up and right.
    fn default() -> Self {
        Self {
            left: [1, 5, 9, 13],
            right: [3, 7, 11, 15],
            up: [2, 6, 10, 14],
            down: [0, 4, 8, 12],
        }
    }
}

/// Grid geometry of a texture split into animation cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SpriteSheet {
    pub cols: u32,
    pub rows: u32,
}

impl SpriteSheet {
    /// A texture used whole.
    pub const SINGLE: SpriteSheet = SpriteSheet { cols: 1, rows: 1 };

    pub fn cell_count(&self) -> usize {
        (self.cols * self.rows) as usize
    }

    /// UV sub-rectangle `[u, v, width, height]` of `index`. Row 0 is the top
    /// row of the image.
    pub fn uv_rect(&self, index: usize) -> [f32; 4] {
        let cols = self.cols.max(1) as usize;
        let rows = self.rows.max(1) as usize;
        let u = (index % cols) as f32 / cols as f32;
        let v = (index / cols) as f32 / rows as f32;
        [u, v, 1.0 / cols as f32, 1.0 / rows as f32]
    }
}

impl Default for SpriteSheet {
    fn default() -> Self {
        Self::SINGLE
    }
}

/// Runtime state for one animated sprite.
#[derive(Debug, Clone)]
pub struct SpriteAnimation {
    pub sheet: SpriteSheet,
    pub cycle: WalkCycle,
    pub direction: Direction,
    pub frame_index: usize,
    pub elapsed_us: u64,
    pub frame_duration_us: u64,
}

impl SpriteAnimation {
    pub fn new(sheet: SpriteSheet, cycle: WalkCycle, direction: Direction) -> Self {
        Self {
            sheet,
            cycle,
            direction,
            frame_index: 0,
            elapsed_us: 0,
            frame_duration_us: DEFAULT_FRAME_DURATION_US,
        }
    }

    pub fn with_frame_duration_us(mut self, frame_duration_us: u64) -> Self {
        self.frame_duration_us = frame_duration_us;
        self
    }

    /// Switch to another direction's loop. Offset and timer carry over, so
    /// turning around mid-stride keeps the stride phase.
    pub fn face(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Advance by `dt_us` while the owner is moving. A stationary owner keeps
    /// its current frame.
    pub fn tick(&mut self, dt_us: u64, moving: bool) {
        if !moving {
            return;
        }
        self.elapsed_us += dt_us;
        if self.elapsed_us >= self.frame_duration_us {
            self.elapsed_us = 0;
            self.frame_index = (self.frame_index + 1) % WALK_FRAMES;
        }
    }

    /// Sheet cell currently shown.
    pub fn sprite_index(&self) -> usize {
        self.cycle.frames(self.direction)[self.frame_index]
    }

    pub fn uv_rect(&self) -> [f32; 4] {
        self.sheet.uv_rect(self.sprite_index())
    }
}

/// Convert a step length in seconds to whole microseconds.
pub fn seconds_to_us(seconds: f32) -> u64 {
    if seconds <= 0.0 {
        return 0;
    }
    (f64::from(seconds) * 1_000_000.0).round() as u64
}
