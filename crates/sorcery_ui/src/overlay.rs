//! egui layer drawn on top of the sprite pass.
//!
//! It carries two things: the information panel text, painted every frame,
//! and a developer debug window toggled with F3. egui needs a split render
//! because `egui_wgpu::Renderer::render()` wants a `RenderPass<'static>` while
//! `begin_render_pass` borrows the encoder:
//!
//!   1. `prepare()` -- run UI logic, produce tessellated primitives
//!   2. `upload()`  -- upload textures and update GPU buffers
//!   3. `paint()`   -- render into a pass opened with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui no longer references

use sorcery_core::time::TimeState;
use winit::window::Window;

use crate::info_panel::{self, PanelLayout, PanelStatus, PanelStyle};

const PANEL_FONT_NAME: &str = "panel_font";

#[derive(Debug, Clone, Default)]
pub struct DebugStats {
    pub draw_calls: u32,
    pub texture_binds: u32,
    pub sprite_count: u32,
    /// Game steps actually run; slices dropped while paused are not counted.
    pub simulated_steps: u64,
    /// Estimated GPU memory usage in megabytes
    pub memory_estimate_mb: f32,
    pub player_position: (f32, f32),
    pub player_velocity: (f32, f32),
    pub grounded: bool,
    pub animation_label: String,
    pub hitboxes_visible: bool,
    pub paused: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayActions {
    pub toggle_pause: bool,
    /// Advance one fixed step while paused
    pub single_step: bool,
}

/// Everything the overlay reads for one frame.
pub struct OverlayFrame<'a> {
    pub panel_layout: &'a PanelLayout,
    pub panel_style: &'a PanelStyle,
    pub panel_status: &'a PanelStatus,
    pub stats: Option<DebugStats>,
}

pub struct UiOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub debug_visible: bool,
}

impl UiOverlay {
    /// `panel_font` replaces the default proportional font when given.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
        panel_font: Option<Vec<u8>>,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        if let Some(bytes) = panel_font {
            install_panel_font(&egui_ctx, bytes);
        }
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
            debug_visible: false,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn toggle_debug(&mut self) {
        self.debug_visible = !self.debug_visible;
        log::info!(
            "Debug window: {}",
            if self.debug_visible { "ON" } else { "OFF" }
        );
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        time: &TimeState,
        frame: OverlayFrame<'_>,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let debug_visible = self.debug_visible;
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            info_panel::paint(
                ctx,
                frame.panel_layout,
                frame.panel_style,
                frame.panel_status,
            );

            if debug_visible {
                show_debug_window(ctx, time, frame.stats.as_ref(), &mut actions);
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
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

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures that egui no longer needs. Call after rendering.
    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn show_debug_window(
    ctx: &egui::Context,
    time: &TimeState,
    stats: Option<&DebugStats>,
    actions: &mut OverlayActions,
) {
    egui::Window::new("Debug")
        .default_pos([10.0, 10.0])
        .show(ctx, |ui| {
            ui.label(format!("FPS: {:.1}", time.smoothed_fps));
            ui.label(format!("Frame time: {:.2} ms", time.smoothed_frame_time_ms));
            ui.label(format!("Slices this frame: {}", time.steps_this_frame));
            ui.label(format!("Frame: {}", time.frame_count));

            let Some(stats) = stats else {
                return;
            };
            ui.label(format!("Steps simulated: {}", stats.simulated_steps));
            ui.separator();
            ui.label(format!("Draw calls: {}", stats.draw_calls));
            ui.label(format!("Texture binds: {}", stats.texture_binds));
            ui.label(format!("Sprites: {}", stats.sprite_count));
            ui.label(format!("Memory: {:.2} MB", stats.memory_estimate_mb));

            ui.separator();
            ui.label(format!(
                "Player: ({:.2}, {:.2})",
                stats.player_position.0, stats.player_position.1
            ));
            ui.label(format!(
                "Velocity: ({:.2}, {:.2})",
                stats.player_velocity.0, stats.player_velocity.1
            ));
            ui.label(format!("Grounded: {}", stats.grounded));
            ui.label(format!("Animation: {}", stats.animation_label));
            ui.label(format!(
                "Hitboxes (F4): {}",
                if stats.hitboxes_visible { "ON" } else { "OFF" }
            ));

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
            if stats.paused {
                ui.label("\u{23f8} PAUSED");
            }
        });
}

fn install_panel_font(ctx: &egui::Context, bytes: Vec<u8>) {
    let mut fonts = egui::FontDefinitions::default();
    fonts.font_data.insert(
        PANEL_FONT_NAME.to_owned(),
        egui::FontData::from_owned(bytes).into(),
    );
    fonts
        .families
        .entry(egui::FontFamily::Proportional)
        .or_default()
        .insert(0, PANEL_FONT_NAME.to_owned());
    ctx.set_fonts(fonts);
    log::info!("Panel font installed");
}
