//! Fixed-timestep clock.
//!
//! Real frames feed wall-clock time into an accumulator; the simulation drains
//! it in constant `fixed_dt` slices:
//!
//! ```text
//! time.begin_frame();
//! while time.should_step() {
//!     session.step(time.fixed_dt as f32);
//! }
//! time.end_frame();
//! ```
//!
//! A frame that contributes less than one step runs no simulation at all and
//! renders the previous state. Leftover time is carried into the next frame,
//! so over any run `steps * fixed_dt + accumulator` equals the time fed in
//! (minus `dropped_time` when a frame cap is configured).

use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

/// Simulation step used by the game: one sixtieth of a second.
pub const DEFAULT_FIXED_DT: f64 = 1.0 / 60.0;

pub struct TimeState {
    pub fixed_dt: f64,
    /// Largest wall-clock delta a single frame may contribute. `None` means
    /// uncapped catch-up: a long stall is replayed step by step.
    pub max_frame_dt: Option<f64>,
    accumulator: f64,
    pub dropped_time: f64,
    pub total_time: f64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: f64,
    last_instant: Instant,
    pub interpolation_alpha: f64,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TimeState {
    pub fn new(fixed_dt: f64) -> Self {
        Self {
            fixed_dt,
            max_frame_dt: None,
            accumulator: 0.0,
            dropped_time: 0.0,
            total_time: 0.0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: 0.0,
            last_instant: Instant::now(),
            interpolation_alpha: 0.0,
            fps_samples: [fixed_dt; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 1.0 / fixed_dt,
            smoothed_frame_time_ms: fixed_dt * 1000.0,
        }
    }

    pub fn with_frame_cap(mut self, max_frame_dt: f64) -> Self {
        self.max_frame_dt = Some(max_frame_dt);
        self
    }

    /// Measure the wall-clock delta since the previous frame and feed it in.
    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let real_dt = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.advance(real_dt);
    }

    /// Feed an explicit wall-clock delta. `begin_frame` goes through here; tests
    /// and replays call it directly.
    pub fn advance(&mut self, real_dt: f64) {
        self.real_dt = real_dt.max(0.0);

        // Spiral-of-death cap
        if let Some(max_dt) = self.max_frame_dt {
            if self.real_dt > max_dt {
                log::warn!(
                    "Frame took {:.1}ms, capping to {:.1}ms",
                    self.real_dt * 1000.0,
                    max_dt * 1000.0
                );
                self.dropped_time += self.real_dt - max_dt;
                self.real_dt = max_dt;
            }
        }

        self.accumulator += self.real_dt;
        self.steps_this_frame = 0;
        self.frame_count += 1;

        // FPS smoothing
        self.fps_samples[self.fps_sample_index] = self.real_dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    pub fn should_step(&mut self) -> bool {
        if self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            self.force_step();
            true
        } else {
            false
        }
    }

    /// Count one step that runs without draining the accumulator, such as a
    /// single step taken while paused.
    pub fn force_step(&mut self) {
        self.total_time += self.fixed_dt;
        self.fixed_step_count += 1;
        self.steps_this_frame += 1;
    }

    pub fn end_frame(&mut self) {
        self.interpolation_alpha = self.accumulator / self.fixed_dt;
    }

    /// Time fed in but not yet consumed by a full step.
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Throw away pending time without stepping (paused simulation).
    /// Returns how much was discarded.
    pub fn clear_accumulator(&mut self) -> f64 {
        std::mem::take(&mut self.accumulator)
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new(DEFAULT_FIXED_DT)
    }
}
