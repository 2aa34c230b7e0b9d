//! George Lands in Minecraft -- main loop and application entry point.
//!
//! winit drives the event loop via `ApplicationHandler`. Each `RedrawRequested`
//! runs one frame:
//!
//!   1. read the keyboard snapshot into the player's movement
//!   2. `begin_frame()`, then `while should_step()` -- zero or more fixed steps
//!   3. rebuild the per-sprite instance list from the session
//!   4. upload the camera uniform, draw, composite the egui overlay, present
//!
//! Quit keys are checked once per frame and take effect after it finishes.

mod collision;
mod config;
mod controller;
mod entity;
#[cfg(test)]
mod replay;
mod session;

use std::path::Path;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use config::{load_config_or_default, GameConfig};
use controller::{movement_intent, MovementIntent};
use lander_core::input::{InputState, Key};
use lander_core::time::TimeState;
use lander_devtools::{DebugOverlay, OverlayStats};
use lander_platform::window::PlatformConfig;
use lander_render::{
    Camera2D, GpuContext, QuadVertex, SpriteInstance, SpritePipeline, TextureId, TextureRegistry,
};
use session::{GameSession, SessionTextures};

const CONFIG_PATH: &str = "assets/config/game.json";

/// A run of consecutive instances that share one texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DrawCall {
    texture: TextureId,
    instance_start: u32,
    instance_count: u32,
}

/// All mutable engine state. Built in `ApplicationHandler::resumed` once the
/// window exists.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    camera: Camera2D,
    sprite_pipeline: SpritePipeline,
    textures: TextureRegistry,
    debug_overlay: DebugOverlay,
    config: GameConfig,
    session: GameSession,
    paused: bool,
    single_step_requested: bool,

    // --- GPU buffers ---------------------------------------------------------
    // One shared quad; instances are rebuilt on the CPU each frame and
    // streamed in. The instance buffer grows (power-of-two) but never shrinks.
    quad_vertex_buffer: wgpu::Buffer,
    quad_index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    instances: Vec<SpriteInstance>,
    draw_calls: Vec<DrawCall>,
}

impl EngineState {
    fn new(window: Arc<Window>, config: GameConfig) -> Self {
        let gpu = GpuContext::new(window.clone()).unwrap_or_else(|err| {
            log::error!("{err}");
            panic!("GPU initialisation failed: {err}");
        });

        let mut time = TimeState::new(config.fixed_dt);
        if let Some(max_frame_dt) = config.max_frame_dt {
            time = time.with_frame_cap(max_frame_dt);
        }
        let input = InputState::new();
        let camera = Camera2D::for_viewport(config.camera_half_width, gpu.size.0, gpu.size.1);

        let sprite_pipeline = SpritePipeline::from_paths(
            &gpu.device,
            gpu.surface_format,
            Path::new(&config.assets.vertex_shader),
            Path::new(&config.assets.fragment_shader),
        )
        .unwrap_or_else(|err| {
            log::error!("{err}");
            panic!("Shader setup failed: {err}");
        });

        let mut textures = TextureRegistry::new();
        let mut load =
            |path: &str| load_texture_strict(&mut textures, &gpu, &sprite_pipeline, path);
        let session_textures = SessionTextures {
            player: load(&config.assets.player_sheet),
            lose_block: load(&config.assets.lose_block),
            win_block: load(&config.assets.win_block),
            win_screen: load(&config.assets.win_screen),
            lose_screen: load(&config.assets.lose_screen),
        };
        log::info!(
            "{} textures resident (~{:.2} MB)",
            textures.len(),
            textures.estimate_memory_bytes() as f32 / (1024.0 * 1024.0)
        );

        let session = GameSession::new(&config, &session_textures);
        log::info!(
            "Session ready: {} blocks, player at ({}, {})",
            session.world.len(),
            session.player.position.x,
            session.player.position.y
        );

        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);

        let quad_vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Unit Quad Vertex Buffer"),
                contents: bytemuck::cast_slice(&QuadVertex::UNIT_QUAD),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let quad_index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Unit Quad Index Buffer"),
                contents: bytemuck::cast_slice(&QuadVertex::UNIT_QUAD_INDICES),
                usage: wgpu::BufferUsages::INDEX,
            });

        let instance_capacity = (session.world.len() + 2).next_power_of_two();
        let instance_buffer = create_instance_buffer(&gpu.device, instance_capacity);

        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);

        Self {
            window,
            gpu,
            time,
            input,
            camera,
            sprite_pipeline,
            textures,
            debug_overlay,
            config,
            session,
            paused: false,
            single_step_requested: false,
            quad_vertex_buffer,
            quad_index_buffer,
            instance_buffer,
            instance_capacity,
            camera_buffer,
            camera_bind_group,
            instances: Vec::new(),
            draw_calls: Vec::new(),
        }
    }

    /// Input snapshot, then as many fixed steps as the accumulator allows.
    fn simulate(&mut self) {
        self.time.begin_frame();
        let intent = movement_intent(&self.input);
        let single_step = std::mem::take(&mut self.single_step_requested);
        run_fixed_steps(
            &mut self.time,
            &mut self.session,
            intent,
            self.paused,
            single_step,
        );
        self.time.end_frame();
    }

    fn rebuild_instances(&mut self) {
        self.instances.clear();
        self.draw_calls.clear();
        for entity in self.session.draw_order() {
            let start = self.instances.len() as u32;
            self.instances.push(entity.sprite_instance());
            push_draw_call(&mut self.draw_calls, entity.texture, start, 1);
        }

        if self.instances.len() > self.instance_capacity {
            self.instance_capacity = self.instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(&self.gpu.device, self.instance_capacity);
        }
        if !self.instances.is_empty() {
            self.gpu.queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&self.instances),
            );
        }
    }

    fn overlay_stats(&self) -> OverlayStats {
        let player = &self.session.player;
        OverlayStats {
            draw_calls: self.draw_calls.len() as u32,
            texture_binds: count_texture_binds(&self.draw_calls) as u32,
            sprite_count: self.instances.len() as u32,
            texture_memory_mb: self.textures.estimate_memory_bytes() as f32 / (1024.0 * 1024.0),
            player_position: [player.position.x, player.position.y],
            player_velocity: [player.velocity.x, player.velocity.y],
            last_collision: format!("{:?}", self.session.last_collision()),
            outcome: self.session.outcome().label().to_string(),
            paused: self.paused,
        }
    }

    fn render(&mut self) {
        self.rebuild_instances();

        let camera_uniform = self.camera.build_uniform();
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera_uniform]),
        );

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        let stats = self.overlay_stats();
        let (egui_primitives, egui_textures_delta, overlay_actions) =
            self.debug_overlay.prepare(&self.window, &self.time, &stats);
        if overlay_actions.toggle_pause {
            self.paused = !self.paused;
            log::info!(
                "Simulation {}",
                if self.paused { "PAUSED" } else { "RESUMED" }
            );
        }
        if overlay_actions.single_step {
            self.single_step_requested = true;
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let [r, g, b] = self.config.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            render_pass
                .set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);

            let index_count = QuadVertex::UNIT_QUAD_INDICES.len() as u32;
            let mut last_bound: Option<TextureId> = None;
            for draw in &self.draw_calls {
                let Some(texture) = self.textures.get(draw.texture) else {
                    log::warn!("Draw call references unknown texture {:?}", draw.texture);
                    continue;
                };
                if last_bound != Some(draw.texture) {
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    last_bound = Some(draw.texture);
                }
                render_pass.draw_indexed(
                    0..index_count,
                    0,
                    draw.instance_start..(draw.instance_start + draw.instance_count),
                );
            }
        }

        self.debug_overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.debug_overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.debug_overlay.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

struct App {
    platform: PlatformConfig,
    game: GameConfig,
    state: Option<EngineState>,
}

impl App {
    fn new(game: GameConfig) -> Self {
        Self {
            platform: PlatformConfig::default(),
            game,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = lander_platform::window::create_window(event_loop, &self.platform);
        log::info!(
            "Window created: {}x{}",
            self.platform.width,
            self.platform.height
        );
        self.state = Some(EngineState::new(window, self.game.clone()));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.camera =
                        Camera2D::for_viewport(state.config.camera_half_width, w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::Focused(false) => {
                state.input.release_all();
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(game_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(game_key),
                            ElementState::Released => state.input.key_up(game_key),
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                let quit = state.input.quit_requested();
                if state.input.is_just_pressed(Key::F3) {
                    state.debug_overlay.toggle();
                }

                state.simulate();
                state.render();

                state.input.end_frame();
                if quit {
                    log::info!(
                        "Quit requested after {} steps (outcome: {}), exiting.",
                        state.time.fixed_step_count,
                        state.session.outcome().label()
                    );
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}

/// Drain the accumulator into fixed steps. While paused, pending time is
/// discarded and input is ignored unless a single step was requested.
fn run_fixed_steps(
    time: &mut TimeState,
    session: &mut GameSession,
    intent: MovementIntent,
    paused: bool,
    single_step: bool,
) {
    let dt = time.fixed_dt as f32;
    if paused {
        time.clear_accumulator();
        if single_step {
            time.force_step();
            session.apply_intent(intent);
            session.step(dt);
        }
        return;
    }
    session.apply_intent(intent);
    while time.should_step() {
        session.step(dt);
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    let byte_len = (capacity * std::mem::size_of::<SpriteInstance>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Instance Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn load_texture_strict(
    registry: &mut TextureRegistry,
    gpu: &GpuContext,
    pipeline: &SpritePipeline,
    path: &str,
) -> TextureId {
    registry
        .load(&gpu.device, &gpu.queue, pipeline, path)
        .unwrap_or_else(|err| {
            log::error!("{err}");
            panic!("Required texture '{path}' could not be loaded: {err}");
        })
}

/// Append a draw call, merging with the previous one when the texture matches
/// and the instances are contiguous.
fn push_draw_call(
    draw_calls: &mut Vec<DrawCall>,
    texture: TextureId,
    instance_start: u32,
    instance_count: u32,
) {
    if let Some(last) = draw_calls.last_mut() {
        let contiguous = last.instance_start + last.instance_count == instance_start;
        if last.texture == texture && contiguous {
            last.instance_count += instance_count;
            return;
        }
    }
    draw_calls.push(DrawCall {
        texture,
        instance_start,
        instance_count,
    });
}

fn count_texture_binds(draw_calls: &[DrawCall]) -> usize {
    let mut binds = 0usize;
    let mut current: Option<TextureId> = None;
    for draw in draw_calls {
        if current != Some(draw.texture) {
            current = Some(draw.texture);
            binds += 1;
        }
    }
    binds
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::KeyQ => Some(Key::Q),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::F3 => Some(Key::F3),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("George Lands in Minecraft starting...");

    let config = load_config_or_default(Path::new(CONFIG_PATH)).unwrap_or_else(|err| {
        log::error!("{err}");
        panic!("Invalid game config: {err}");
    });

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app).expect("Event loop error");
}

#[cfg(test)]
mod tests {
    use super::*;
    use lander_core::animation::Direction;

    #[test]
    fn consecutive_same_texture_instances_share_a_draw_call() {
        let mut draws = Vec::new();
        push_draw_call(&mut draws, TextureId(0), 0, 1);
        for i in 1..12 {
            push_draw_call(&mut draws, TextureId(1), i, 1);
        }
        push_draw_call(&mut draws, TextureId(2), 12, 1);
        push_draw_call(&mut draws, TextureId(2), 13, 1);

        assert_eq!(draws.len(), 3);
        assert_eq!(
            draws[1],
            DrawCall {
                texture: TextureId(1),
                instance_start: 1,
                instance_count: 11,
            }
        );
        assert_eq!(draws[2].instance_count, 2);
        assert_eq!(count_texture_binds(&draws), 3);
    }

    #[test]
    fn gaps_in_instances_split_draw_calls() {
        let mut draws = Vec::new();
        push_draw_call(&mut draws, TextureId(1), 0, 1);
        push_draw_call(&mut draws, TextureId(1), 5, 1);
        assert_eq!(draws.len(), 2);
        assert_eq!(count_texture_binds(&draws), 1);
    }

    #[test]
    fn playing_session_batches_into_three_draw_calls() {
        let textures = SessionTextures {
            player: TextureId(0),
            lose_block: TextureId(1),
            win_block: TextureId(2),
            win_screen: TextureId(3),
            lose_screen: TextureId(4),
        };
        let session = GameSession::new(&GameConfig::default(), &textures);
        let mut draws = Vec::new();
        for (i, entity) in session.draw_order().enumerate() {
            push_draw_call(&mut draws, entity.texture, i as u32, 1);
        }
        let textures: Vec<TextureId> = draws.iter().map(|d| d.texture).collect();
        assert_eq!(textures, vec![TextureId(0), TextureId(1), TextureId(2)]);
    }

    #[test]
    fn only_game_keys_are_mapped() {
        assert_eq!(map_key(KeyCode::ArrowLeft), Some(Key::Left));
        assert_eq!(map_key(KeyCode::KeyQ), Some(Key::Q));
        assert_eq!(map_key(KeyCode::Escape), Some(Key::Escape));
        assert_eq!(map_key(KeyCode::KeyW), None);
    }

    fn playing_session() -> GameSession {
        GameSession::new(&GameConfig::default(), &SessionTextures::default())
    }

    #[test]
    fn paused_frame_ignores_input_and_pending_time() {
        let mut time = TimeState::new(0.25);
        let mut session = playing_session();
        let start = session.player.clone();

        time.advance(1.0);
        run_fixed_steps(&mut time, &mut session, MovementIntent { move_x: -1.0 }, true, false);

        assert_eq!(time.fixed_step_count, 0);
        assert_eq!(time.accumulator(), 0.0);
        assert_eq!(session.player.position, start.position);
        assert_eq!(session.player.movement, start.movement);
        let facing = session.player.animation.as_ref().map(|a| a.direction);
        assert_eq!(facing, Some(Direction::Right));
    }

    #[test]
    fn paused_single_step_is_counted_by_the_clock() {
        let mut time = TimeState::new(0.25);
        let mut session = playing_session();
        let start_y = session.player.position.y;

        time.advance(0.1);
        run_fixed_steps(&mut time, &mut session, MovementIntent { move_x: -1.0 }, true, true);

        assert_eq!(time.fixed_step_count, 1);
        assert_eq!(time.steps_this_frame, 1);
        assert_eq!(time.total_time, 0.25);
        assert_eq!(time.accumulator(), 0.0);
        assert!(session.player.position.y < start_y);
        let facing = session.player.animation.as_ref().map(|a| a.direction);
        assert_eq!(facing, Some(Direction::Left));
    }

    #[test]
    fn running_frame_drains_the_accumulator() {
        let mut time = TimeState::new(0.25);
        let mut session = playing_session();

        time.advance(0.6);
        run_fixed_steps(&mut time, &mut session, MovementIntent::default(), false, true);

        assert_eq!(time.steps_this_frame, 2);
        assert!((time.accumulator() - 0.1).abs() < 1e-12);
    }
}
