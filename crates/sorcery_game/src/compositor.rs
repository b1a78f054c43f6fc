//! Builds the per-frame sprite batch for the whole 320x200 base screen:
//! the game viewport on top, the information panel strip underneath.
//!
//! Everything is emitted in base pixels; the window's integer scale factor
//! is applied by the surface size, not here. Panel text is painted later by
//! the UI layer on top of the panel quad.

use glam::Vec2;
use sorcery_render::{srgb_color, QuadSpec, SpriteBatch};
use sorcery_ui::PanelLayout;

use crate::game::GameState;
use crate::level::{GAME_AREA_HEIGHT, GAME_AREA_WIDTH, TILE_SIZE};
use crate::settings::ColorSettings;

pub const SCREEN_WIDTH: u32 = 320;
pub const SCREEN_HEIGHT: u32 = 200;
pub const PANEL_TOP: f32 = GAME_AREA_HEIGHT;
pub const PANEL_HEIGHT: f32 = SCREEN_HEIGHT as f32 - GAME_AREA_HEIGHT;

/// 1x1 white texture used for flat-coloured quads.
pub const WHITE_TEXTURE: &str = "white";
pub const SHEET_TEXTURE: &str = "sheet";

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const PLAYER_HITBOX_TINT: [f32; 4] = [1.0, 0.0, 0.0, 0.4];
const SOLID_TILE_TINT: [f32; 4] = [0.0, 1.0, 1.0, 0.25];

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: [f32; 4],
    pub panel_background: [f32; 4],
}

impl Palette {
    pub fn from_settings(colors: &ColorSettings) -> Self {
        Self {
            background: srgb_color(colors.background, 1.0),
            panel_background: srgb_color(colors.panel_background, 1.0),
        }
    }
}

/// What the compositor needs besides game state.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs {
    pub palette: Palette,
    pub sheet_size: (u32, u32),
    pub sprite_size: Vec2,
    pub show_hitboxes: bool,
}

pub fn panel_layout(scale: u32) -> PanelLayout {
    PanelLayout {
        top: PANEL_TOP,
        width: SCREEN_WIDTH as f32,
        height: PANEL_HEIGHT,
        scale: scale as f32,
    }
}

/// Paint order: backgrounds, platforms, player, debug overlay.
pub fn build_frame(game: &GameState, inputs: &FrameInputs) -> SpriteBatch {
    let mut batch = SpriteBatch::with_capacity(game.level.platforms.len() + 8);

    batch.push_quad(QuadSpec::solid(
        WHITE_TEXTURE,
        [0.0, 0.0, GAME_AREA_WIDTH, GAME_AREA_HEIGHT],
        inputs.palette.background,
    ));
    batch.push_quad(QuadSpec::solid(
        WHITE_TEXTURE,
        [0.0, PANEL_TOP, SCREEN_WIDTH as f32, PANEL_HEIGHT],
        inputs.palette.panel_background,
    ));

    for platform in &game.level.platforms {
        batch.push_quad(QuadSpec::solid(
            WHITE_TEXTURE,
            platform.rect.to_quad(),
            srgb_color(platform.color, 1.0),
        ));
    }

    if let Some(frame) = game.current_frame() {
        let feet = game.player.position();
        let size = inputs.sprite_size;
        let (sheet_w, sheet_h) = inputs.sheet_size;
        batch.push_quad(QuadSpec {
            texture_key: SHEET_TEXTURE,
            left: feet.x - size.x * 0.5,
            top: feet.y - size.y,
            width: size.x,
            height: size.y,
            uv: frame.uv(sheet_w, sheet_h),
            color: WHITE,
        });
    }

    if inputs.show_hitboxes {
        let tile = TILE_SIZE as f32;
        for (col, row) in game.level.grid.solid_cells() {
            batch.push_quad(QuadSpec::solid(
                WHITE_TEXTURE,
                [col as f32 * tile, row as f32 * tile, tile, tile],
                SOLID_TILE_TINT,
            ));
        }
        batch.push_quad(QuadSpec::solid(
            WHITE_TEXTURE,
            game.player.aabb.to_rect().to_quad(),
            PLAYER_HITBOX_TINT,
        ));
    }

    batch
}
