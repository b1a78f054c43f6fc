//! Runtime settings read from `assets/settings.json`.
//!
//! Every field has a default, so a missing file runs the game as shipped.
//! A file that exists but cannot be parsed or fails validation is fatal.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, ensure, Context, Result};
use glam::Vec2;
use serde::Deserialize;
use sorcery_platform::window::PlatformConfig;
use sorcery_ui::PanelStyle;

use crate::player::MovementConfig;

pub const DEFAULT_SETTINGS_PATH: &str = "assets/settings.json";

/// 2560x1600 at the 320x200 base screen, well inside common surface limits.
pub const MAX_SCALE_FACTOR: u32 = 8;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub window: WindowSettings,
    pub simulation: SimulationSettings,
    pub physics: PhysicsSettings,
    pub player: PlayerSettings,
    pub assets: AssetSettings,
    pub panel: PanelSettings,
    pub colors: ColorSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSettings {
    pub title: String,
    /// Integer upscale from the 320x200 base screen.
    pub scale_factor: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Sorcery".to_string(),
            scale_factor: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSettings {
    pub steps_per_second: u32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            steps_per_second: 60,
        }
    }
}

/// Base pixels per fixed step.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsSettings {
    pub walk_speed: f32,
    pub flight_speed: f32,
    pub gravity: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        let movement = MovementConfig::default();
        Self {
            walk_speed: movement.walk_speed,
            flight_speed: movement.flight_speed,
            gravity: movement.gravity,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerSettings {
    pub hitbox_width: f32,
    pub hitbox_height: f32,
    pub sprite_width: f32,
    pub sprite_height: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            hitbox_width: 16.0,
            hitbox_height: 24.0,
            sprite_width: 24.0,
            sprite_height: 24.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetSettings {
    pub spritesheet: PathBuf,
    pub font: Option<PathBuf>,
    /// Level JSON; the built-in screen is used when absent.
    pub level: Option<PathBuf>,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            spritesheet: PathBuf::from("assets/images/sorcery_characters.json"),
            font: None,
            level: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelSettings {
    pub font_size: f32,
    pub margin_x: f32,
    pub margin_y: f32,
    pub line_spacing: f32,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            margin_x: 5.0,
            margin_y: 5.0,
            line_spacing: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorSettings {
    pub background: [u8; 3],
    pub panel_background: [u8; 3],
    pub panel_text: [u8; 3],
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            background: [0, 0, 0],
            panel_background: [0, 0, 139],
            panel_text: [255, 255, 0],
        }
    }
}

impl Settings {
    /// Read settings from `path`, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        let settings = Self::from_json(&raw)
            .with_context(|| format!("invalid settings {}", path.display()))?;
        log::info!("Settings loaded from {}", path.display());
        Ok(settings)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(raw).context("failed to parse settings JSON")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (1..=MAX_SCALE_FACTOR).contains(&self.window.scale_factor),
            "window.scale_factor must be between 1 and {MAX_SCALE_FACTOR}"
        );
        ensure!(
            self.simulation.steps_per_second > 0,
            "simulation.steps_per_second must be > 0"
        );
        let physics = &self.physics;
        ensure!(physics.gravity > 0.0, "physics.gravity must be > 0");
        // The flight speed doubles as the fall cap, so zero would disable gravity.
        ensure!(physics.flight_speed > 0.0, "physics.flight_speed must be > 0");
        ensure!(physics.walk_speed >= 0.0, "physics.walk_speed must not be negative");
        let player = &self.player;
        ensure!(
            player.hitbox_width > 0.0 && player.hitbox_height > 0.0,
            "player hitbox must have a positive size"
        );
        ensure!(
            player.sprite_width > 0.0 && player.sprite_height > 0.0,
            "player sprite must have a positive size"
        );
        ensure!(self.panel.font_size > 0.0, "panel.font_size must be > 0");
        Ok(())
    }

    pub fn movement(&self) -> MovementConfig {
        MovementConfig {
            walk_speed: self.physics.walk_speed,
            flight_speed: self.physics.flight_speed,
            gravity: self.physics.gravity,
        }
    }

    pub fn hitbox(&self) -> Vec2 {
        Vec2::new(self.player.hitbox_width, self.player.hitbox_height)
    }

    pub fn sprite_size(&self) -> Vec2 {
        Vec2::new(self.player.sprite_width, self.player.sprite_height)
    }

    pub fn panel_style(&self) -> PanelStyle {
        PanelStyle {
            font_size: self.panel.font_size,
            margin_x: self.panel.margin_x,
            margin_y: self.panel.margin_y,
            line_spacing: self.panel.line_spacing,
            text_color: self.colors.panel_text,
        }
    }

    pub fn platform_config(&self, base_width: u32, base_height: u32) -> Result<PlatformConfig> {
        PlatformConfig::scaled(
            &self.window.title,
            base_width,
            base_height,
            self.window.scale_factor,
        )
        .map_err(|e| anyhow!(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "sorcery_settings_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings = Settings::load(&temp_file_path("missing")).expect("defaults");
        assert_eq!(settings.window.scale_factor, 3);
        assert_eq!(settings.simulation.steps_per_second, 60);
        assert_eq!(settings.movement(), MovementConfig::default());
        assert_eq!(settings.colors.panel_background, [0, 0, 139]);
        assert!(settings.assets.font.is_none());
    }

    #[test]
    fn partial_file_keeps_unset_defaults() {
        let settings = Settings::from_json(
            r#"{ "physics": { "gravity": 0.5 }, "assets": { "font": "assets/fonts/amstrad.ttf" } }"#,
        )
        .expect("partial settings parse");
        assert_eq!(settings.physics.gravity, 0.5);
        assert_eq!(settings.physics.walk_speed, 2.5);
        assert_eq!(
            settings.assets.font.as_deref(),
            Some(Path::new("assets/fonts/amstrad.ttf"))
        );
        assert_eq!(
            settings.assets.spritesheet,
            PathBuf::from("assets/images/sorcery_characters.json")
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = temp_file_path("malformed");
        fs::write(&path, "{ not json").expect("write temp file");
        let err = Settings::load(&path).expect_err("malformed settings should fail");
        assert!(format!("{err:#}").contains("failed to parse settings JSON"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Settings::from_json(r#"{ "physics": { "gravty": 0.5 } }"#).is_err());
    }

    #[test]
    fn validation_rejects_non_positive_values() {
        assert!(Settings::from_json(r#"{ "window": { "scale_factor": 0 } }"#).is_err());
        assert!(Settings::from_json(r#"{ "physics": { "gravity": 0.0 } }"#).is_err());
        assert!(Settings::from_json(r#"{ "physics": { "walk_speed": -1.0 } }"#).is_err());
        assert!(Settings::from_json(r#"{ "simulation": { "steps_per_second": 0 } }"#).is_err());
    }

    #[test]
    fn oversized_scale_factor_is_rejected() {
        let err = Settings::from_json(r#"{ "window": { "scale_factor": 20000000 } }"#)
            .expect_err("huge scale must fail validation");
        assert!(format!("{err:#}").contains("scale_factor"));
        assert!(Settings::from_json(r#"{ "window": { "scale_factor": 9 } }"#).is_err());

        let largest = Settings::from_json(r#"{ "window": { "scale_factor": 8 } }"#)
            .expect("largest allowed scale");
        let config = largest.platform_config(320, 200).expect("window fits");
        assert_eq!((config.width, config.height), (2560, 1600));
    }

    #[test]
    fn zero_flight_speed_is_rejected() {
        let err = Settings::from_json(r#"{ "physics": { "flight_speed": 0.0 } }"#)
            .expect_err("zero fall cap must fail validation");
        assert!(format!("{err:#}").contains("flight_speed"));
        assert!(Settings::from_json(r#"{ "physics": { "flight_speed": -2.5 } }"#).is_err());
    }

    #[test]
    fn shipped_settings_file_is_valid() {
        let raw = include_str!("../../../assets/settings.json");
        let settings = Settings::from_json(raw).expect("shipped settings should validate");
        assert_eq!(settings.panel_style().text_color, [255, 255, 0]);
        assert_eq!(settings.hitbox(), Vec2::new(16.0, 24.0));
    }

    #[test]
    fn platform_config_scales_base_screen() {
        let config = Settings::default()
            .platform_config(320, 200)
            .expect("default scale fits");
        assert_eq!((config.width, config.height), (960, 600));
        assert!(!config.resizable);
    }
}
