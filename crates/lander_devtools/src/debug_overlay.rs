//! egui debug window drawn over the game, toggled with F3.
//!
//! `egui_wgpu::Renderer::render()` wants a `RenderPass<'static>` while
//! `begin_render_pass` borrows the encoder, so a frame goes through four calls:
//!
//!   1. `prepare()` -- run the UI, tessellate
//!   2. `upload()`  -- textures and buffers (borrows the encoder mutably)
//!   3. `paint()`   -- draw into a pass created with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui dropped
//!
//! Window events always reach egui, even while hidden.

use lander_core::time::TimeState;
use winit::window::Window;

/// Per-frame numbers the game hands to the overlay.
#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub draw_calls: u32,
    pub texture_binds: u32,
    pub sprite_count: u32,
    pub texture_memory_mb: f32,
    pub player_position: [f32; 2],
    pub player_velocity: [f32; 2],
    pub last_collision: String,
    pub outcome: String,
    pub paused: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayActions {
    pub toggle_pause: bool,
    /// Run exactly one fixed step while paused.
    pub single_step: bool,
}

pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

/// Timing lines shown at the top of the window.
pub fn timing_lines(time: &TimeState) -> Vec<String> {
    vec![
        format!("FPS: {:.1}", time.smoothed_fps),
        format!("Frame time: {:.2} ms", time.smoothed_frame_time_ms),
        format!("Steps this frame: {}", time.steps_this_frame),
        format!("Total steps: {}", time.fixed_step_count),
        format!("Accumulator: {:.2} ms", time.accumulator() * 1000.0),
        format!("Dropped time: {:.3} s", time.dropped_time),
    ]
}

pub fn player_lines(stats: &OverlayStats) -> Vec<String> {
    vec![
        format!(
            "Player: ({:.3}, {:.3})",
            stats.player_position[0], stats.player_position[1]
        ),
        format!(
            "Velocity: ({:.3}, {:.3})",
            stats.player_velocity[0], stats.player_velocity[1]
        ),
        format!("Last collision: {}", stats.last_collision),
        format!("Outcome: {}", stats.outcome),
    ]
}

impl DebugOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: false,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        self.egui_winit_state.on_window_event(window, event).consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        time: &TimeState,
        stats: &OverlayStats,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if !self.visible {
                return;
            }
            egui::Window::new("Debug")
                .default_pos([10.0, 10.0])
                .show(ctx, |ui| {
                    for line in timing_lines(time) {
                        ui.label(line);
                    }
                    ui.separator();
                    ui.label(format!("Draw calls: {}", stats.draw_calls));
                    ui.label(format!("Texture binds: {}", stats.texture_binds));
                    ui.label(format!("Sprites: {}", stats.sprite_count));
                    ui.label(format!("Textures: {:.2} MB", stats.texture_memory_mb));
                    ui.separator();
                    for line in player_lines(stats) {
                        ui.label(line);
                    }
                    ui.separator();
                    ui.horizontal(|ui| {
                        let pause_label = if stats.paused { "Resume" } else { "Pause" };
                        if ui.button(pause_label).clicked() {
                            actions.toggle_pause = true;
                        }
                        if stats.paused && ui.button("Step").clicked() {
                            actions.single_step = true;
                        }
                    });
                });
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }
        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_lines_report_accumulator_and_dropped_time() {
        let mut time = TimeState::new(0.25).with_frame_cap(0.5);
        time.advance(0.8);
        while time.should_step() {}
        time.end_frame();

        let lines = timing_lines(&time);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[2], "Steps this frame: 2");
        assert_eq!(lines[3], "Total steps: 2");
        assert_eq!(lines[4], "Accumulator: 0.00 ms");
        assert_eq!(lines[5], "Dropped time: 0.300 s");
    }

    #[test]
    fn player_lines_format_state() {
        let stats = OverlayStats {
            player_position: [-4.0, -2.0],
            player_velocity: [0.0, -0.5],
            last_collision: "HitBlock(11)".to_string(),
            outcome: "Won".to_string(),
            ..OverlayStats::default()
        };
        let lines = player_lines(&stats);
        assert_eq!(lines[0], "Player: (-4.000, -2.000)");
        assert_eq!(lines[1], "Velocity: (0.000, -0.500)");
        assert_eq!(lines[2], "Last collision: HitBlock(11)");
        assert_eq!(lines[3], "Outcome: Won");
    }
}
