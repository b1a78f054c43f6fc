//! Sorcery -- main loop and application entry point.
//!
//! Every asset is loaded and validated before the event loop starts, so a
//! missing or broken file ends the process before a window ever opens.
//!
//! winit drives the loop via `ApplicationHandler`. All simulation runs inside
//! `RedrawRequested` on a **fixed timestep** (see `TimeState`):
//!
//!   1. `begin_frame()` -- measure wall-clock delta, feed accumulator
//!   2. read frame commands (quit, F3 debug window, F4 hitboxes)
//!   3. `while should_step()` -- advance `GameState` one step per slice
//!   4. rebuild the sprite batch, draw it, then composite the egui layer
//!      (panel text and debug window) on top

mod animation;
mod collision;
mod compositor;
mod game;
mod level;
mod player;
#[cfg(test)]
mod replay;
mod settings;
mod spritesheet;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use image::RgbaImage;
use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use compositor::{FrameInputs, Palette, SCREEN_HEIGHT, SCREEN_WIDTH, SHEET_TEXTURE, WHITE_TEXTURE};
use game::GameState;
use level::Level;
use player::PlayerInput;
use settings::{Settings, DEFAULT_SETTINGS_PATH};
use sorcery_core::input::{InputState, Key};
use sorcery_core::time::TimeState;
use sorcery_platform::window::PlatformConfig;
use sorcery_render::{DrawCall, GpuContext, ScreenCamera, SpritePipeline, SpriteVertex, Texture};
use sorcery_ui::{DebugStats, OverlayFrame, PanelLayout, PanelStyle, UiOverlay};
use spritesheet::SpriteSheet;

/// Everything read from disk before the window exists.
struct Startup {
    settings: Settings,
    game: GameState,
    sheet_image: RgbaImage,
    panel_font: Option<Vec<u8>>,
}

impl Startup {
    fn load(settings_path: &Path) -> Result<Self> {
        Self::from_settings(Settings::load(settings_path)?)
    }

    fn from_settings(settings: Settings) -> Result<Self> {
        let level = match &settings.assets.level {
            Some(path) => Level::load(path)
                .with_context(|| format!("failed to load level {}", path.display()))?,
            None => Level::builtin().context("built-in level is invalid")?,
        };

        let sheet = SpriteSheet::load(&settings.assets.spritesheet).with_context(|| {
            format!(
                "failed to load spritesheet {}",
                settings.assets.spritesheet.display()
            )
        })?;

        let panel_font = match &settings.assets.font {
            Some(path) => {
                let bytes = fs::read(path)
                    .with_context(|| format!("failed to read font {}", path.display()))?;
                log::info!("Panel font read from {}", path.display());
                Some(bytes)
            }
            None => None,
        };

        let game = GameState::new(
            level,
            sheet.animations,
            settings.hitbox(),
            settings.movement(),
        )
        .context("player cannot spawn in this level")?;

        Ok(Self {
            settings,
            game,
            sheet_image: sheet.image,
            panel_font,
        })
    }
}

/// Debug-window pause control for the fixed-step loop.
#[derive(Debug, Default)]
struct PauseState {
    paused: bool,
    single_step_requested: bool,
}

impl PauseState {
    /// Whether the next slice is simulated. Consumes a pending single step.
    fn admit_step(&mut self) -> bool {
        if !self.paused {
            return true;
        }
        std::mem::take(&mut self.single_step_requested)
    }
}

/// Drain the accumulator. While paused, slices are discarded so unpausing
/// does not release a burst of queued steps. Returns how many steps ran.
fn drain_fixed_steps(
    time: &mut TimeState,
    pause: &mut PauseState,
    game: &mut GameState,
    input: PlayerInput,
) -> u32 {
    let mut simulated = 0;
    while time.should_step() {
        if pause.admit_step() {
            game.step(input);
            simulated += 1;
        }
    }
    simulated
}

enum FrameCommands {
    Quit,
    Continue { mesh_dirty: bool },
}

struct GpuSpriteTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

/// All mutable runtime state. Constructed in `ApplicationHandler::resumed`
/// once the window and GPU surface are available.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    sprite_pipeline: SpritePipeline,
    overlay: UiOverlay,

    game: GameState,
    frame_inputs: FrameInputs,
    panel_layout: PanelLayout,
    panel_style: PanelStyle,
    pause: PauseState,
    textures: HashMap<Arc<str>, GpuSpriteTexture>,

    // The sprite batch is rebuilt on the CPU, then streamed into these GPU
    // buffers. Buffers grow (power-of-two) but never shrink.
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
    draw_calls: Vec<DrawCall>,
    sprite_count: usize,
    texture_binds: usize,
}

impl EngineState {
    fn new(window: Arc<Window>, startup: Startup) -> Result<Self> {
        let Startup {
            settings,
            game,
            sheet_image,
            panel_font,
        } = startup;

        let gpu = GpuContext::new(window.clone()).map_err(anyhow::Error::msg)?;
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let overlay = UiOverlay::new(&gpu.device, gpu.surface_format, &window, panel_font);

        let camera = ScreenCamera::new(SCREEN_WIDTH, SCREEN_HEIGHT);
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);

        let mut textures: HashMap<Arc<str>, GpuSpriteTexture> = HashMap::new();
        let white = Texture::from_rgba8(
            &gpu.device,
            &gpu.queue,
            &[255, 255, 255, 255],
            1,
            1,
            WHITE_TEXTURE,
        );
        let sheet = Texture::from_image(&gpu.device, &gpu.queue, &sheet_image, SHEET_TEXTURE);
        let sheet_size = sheet.size;
        for (key, texture) in [(WHITE_TEXTURE, white), (SHEET_TEXTURE, sheet)] {
            let bind_group = sprite_pipeline.create_texture_bind_group(&gpu.device, &texture);
            textures.insert(
                Arc::from(key),
                GpuSpriteTexture {
                    texture,
                    bind_group,
                },
            );
        }

        let frame_inputs = FrameInputs {
            palette: Palette::from_settings(&settings.colors),
            sheet_size,
            sprite_size: settings.sprite_size(),
            show_hitboxes: false,
        };

        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        let mut state = Self {
            window,
            gpu,
            time: TimeState::with_rate(settings.simulation.steps_per_second),
            input: InputState::new(),
            sprite_pipeline,
            overlay,
            game,
            frame_inputs,
            panel_layout: compositor::panel_layout(settings.window.scale_factor),
            panel_style: settings.panel_style(),
            pause: PauseState::default(),
            textures,
            vertex_buffer,
            index_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
            draw_calls: Vec::new(),
            sprite_count: 0,
            texture_binds: 0,
        };

        state.ensure_mesh_capacity(4, 6);
        state.rebuild_mesh();
        Ok(state)
    }

    fn estimate_memory_mb(&self) -> f32 {
        let mut bytes: usize = self
            .textures
            .values()
            .map(|t| t.texture.byte_size())
            .sum();
        bytes += self.mesh_vertex_capacity * std::mem::size_of::<SpriteVertex>();
        bytes += self.mesh_index_capacity * std::mem::size_of::<u32>();
        bytes as f32 / (1024.0 * 1024.0)
    }

    fn rebuild_mesh(&mut self) {
        let batch = compositor::build_frame(&self.game, &self.frame_inputs);
        self.ensure_mesh_capacity(batch.vertices.len(), batch.indices.len());
        self.sprite_count = batch.quad_count();
        self.texture_binds = batch.texture_binds();

        if !batch.vertices.is_empty() {
            self.gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&batch.vertices),
            );
        }
        if !batch.indices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&batch.indices));
        }
        self.draw_calls = batch.draw_calls;
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    fn debug_stats(&self) -> DebugStats {
        let position = self.game.player.position();
        let velocity = self.game.player.velocity;
        DebugStats {
            draw_calls: self.draw_calls.len() as u32,
            texture_binds: self.texture_binds as u32,
            sprite_count: self.sprite_count as u32,
            simulated_steps: self.game.step_count,
            memory_estimate_mb: self.estimate_memory_mb(),
            player_position: (position.x, position.y),
            player_velocity: (velocity.x, velocity.y),
            grounded: self.game.player.grounded,
            animation_label: format!(
                "{} #{}",
                self.game.anim_state().label(),
                self.game.animator.frame_index()
            ),
            hitboxes_visible: self.frame_inputs.show_hitboxes,
            paused: self.pause.paused,
        }
    }

    fn handle_frame_commands(&mut self) -> FrameCommands {
        if self.input.is_just_pressed(Key::Escape) {
            return FrameCommands::Quit;
        }
        if self.input.is_just_pressed(Key::F3) {
            self.overlay.toggle_debug();
        }
        if self.input.is_just_pressed(Key::F4) {
            self.frame_inputs.show_hitboxes = !self.frame_inputs.show_hitboxes;
            log::info!(
                "Hitboxes: {}",
                if self.frame_inputs.show_hitboxes {
                    "ON"
                } else {
                    "OFF"
                }
            );
            return FrameCommands::Continue { mesh_dirty: true };
        }
        FrameCommands::Continue { mesh_dirty: false }
    }

    fn run_fixed_steps(&mut self) -> u32 {
        let input = PlayerInput::from_input_state(&self.input);
        drain_fixed_steps(&mut self.time, &mut self.pause, &mut self.game, input)
    }

    fn render(&mut self) {
        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        let stats = self.overlay.debug_visible.then(|| self.debug_stats());
        let (egui_primitives, egui_textures_delta, overlay_actions) = self.overlay.prepare(
            &self.window,
            &self.time,
            OverlayFrame {
                panel_layout: &self.panel_layout,
                panel_style: &self.panel_style,
                panel_status: &self.game.status,
                stats,
            },
        );

        if overlay_actions.toggle_pause {
            self.pause.paused = !self.pause.paused;
            log::info!(
                "Simulation {}",
                if self.pause.paused { "PAUSED" } else { "RESUMED" }
            );
        }
        if overlay_actions.single_step {
            self.pause.single_step_requested = true;
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
            let mut last_bound_texture_key: Option<&Arc<str>> = None;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            for draw in &self.draw_calls {
                let Some(texture) = self.textures.get(&draw.texture_key) else {
                    log::warn!("Draw call references unknown texture '{}'", draw.texture_key);
                    continue;
                };
                let need_rebind = match last_bound_texture_key {
                    Some(last) => **last != *draw.texture_key,
                    None => true,
                };
                if need_rebind {
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    last_bound_texture_key = Some(&draw.texture_key);
                }
                render_pass.draw_indexed(
                    draw.index_start..(draw.index_start + draw.index_count),
                    0,
                    0..1,
                );
            }
        }

        self.overlay.upload(
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

            self.overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.overlay.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

struct App {
    config: PlatformConfig,
    startup: Option<Startup>,
    state: Option<EngineState>,
    /// Set when GPU setup fails inside `resumed`; reported after the loop exits.
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: PlatformConfig, startup: Startup) -> Self {
        Self {
            config,
            startup: Some(startup),
            state: None,
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("Fatal: {err:#}");
        self.fatal = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let Some(startup) = self.startup.take() else {
            return;
        };
        let window = match sorcery_platform::window::create_window(event_loop, &self.config) {
            Ok(window) => window,
            Err(err) => return self.fail(event_loop, anyhow::Error::msg(err)),
        };
        log::info!(
            "Window created: {}x{}",
            self.config.width,
            self.config.height
        );
        match EngineState::new(window, startup) {
            Ok(state) => self.state = Some(state),
            Err(err) => self.fail(event_loop, err.context("failed to initialise renderer")),
        }
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

        let egui_consumed = state.overlay.handle_window_event(&state.window, &event);

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
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::Focused(false) => {
                // Key-up events are not delivered while unfocused.
                state.input.release_all();
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(key),
                            ElementState::Released => state.input.key_up(key),
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                state.time.begin_frame();
                let mesh_dirty = match state.handle_frame_commands() {
                    FrameCommands::Quit => {
                        log::info!("Escape pressed, exiting.");
                        event_loop.exit();
                        return;
                    }
                    FrameCommands::Continue { mesh_dirty } => mesh_dirty,
                };
                // Movement reads held keys only, so edges can be cleared as
                // soon as the frame's commands have been read.
                state.input.end_frame();

                let simulated = state.run_fixed_steps();
                if mesh_dirty || simulated > 0 {
                    state.rebuild_mesh();
                }

                state.render();
            }

            _ => {}
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::F4 => Some(Key::F4),
        _ => None,
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Sorcery starting...");

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));
    let startup = Startup::load(&settings_path).inspect_err(|err| {
        log::error!("Startup failed: {err:#}");
    })?;

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let config = startup
        .settings
        .platform_config(SCREEN_WIDTH, SCREEN_HEIGHT)
        .context("invalid window configuration")?;
    let mut app = App::new(config, startup);
    event_loop.run_app(&mut app).context("event loop error")?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_slices_are_dropped_and_not_counted() {
        let mut game = game::tests::test_game();
        // 1/64 s slices; every advance below is exact in binary.
        let mut time = TimeState::with_rate(64);
        let mut pause = PauseState {
            paused: true,
            single_step_requested: false,
        };

        time.advance(0.125);
        assert_eq!(
            drain_fixed_steps(&mut time, &mut pause, &mut game, PlayerInput::default()),
            0
        );
        assert_eq!(game.step_count, 0);

        pause.single_step_requested = true;
        time.advance(0.125);
        assert_eq!(
            drain_fixed_steps(&mut time, &mut pause, &mut game, PlayerInput::default()),
            1
        );
        assert!(!pause.single_step_requested);

        pause.paused = false;
        time.advance(0.03125);
        assert_eq!(
            drain_fixed_steps(&mut time, &mut pause, &mut game, PlayerInput::default()),
            2
        );
        assert_eq!(game.step_count, 3);
    }

    #[test]
    fn arrows_and_commands_are_mapped() {
        assert_eq!(map_key(KeyCode::ArrowLeft), Some(Key::Left));
        assert_eq!(map_key(KeyCode::ArrowDown), Some(Key::Down));
        assert_eq!(map_key(KeyCode::Escape), Some(Key::Escape));
        assert_eq!(map_key(KeyCode::F4), Some(Key::F4));
        assert_eq!(map_key(KeyCode::KeyW), None);
    }

    fn repo_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
    }

    #[test]
    fn default_settings_load_shipped_assets() {
        let mut settings = Settings::default();
        settings.assets.spritesheet = repo_root().join(&settings.assets.spritesheet);

        let startup = Startup::from_settings(settings).expect("shipped assets should load");
        assert_eq!(startup.sheet_image.dimensions(), (300, 100));
        assert!(startup.panel_font.is_none());
        assert_eq!(startup.game.status.location, "in the woods");
    }

    #[test]
    fn missing_font_is_fatal() {
        let mut settings = Settings::default();
        settings.assets.spritesheet = repo_root().join(&settings.assets.spritesheet);
        settings.assets.font = Some(repo_root().join("assets/fonts/missing.ttf"));

        let err = Startup::from_settings(settings)
            .err()
            .expect("configured font must exist");
        assert!(format!("{err}").contains("failed to read font"));
    }

    #[test]
    fn missing_spritesheet_is_fatal() {
        let mut settings = Settings::default();
        settings.assets.spritesheet = repo_root().join("assets/images/missing.json");
        assert!(Startup::from_settings(settings).is_err());
    }
}
