//! Frame-based sprite animation types and deterministic tick logic.
//!
//! A clip is an ordered run of image regions cut from a single spritesheet,
//! shown for a fixed number of simulation ticks each and looped forever.
//! Timing is counted in whole fixed steps, so two runs fed the same inputs
//! land on the same frame.
//!
//! The sheet JSON describes each clip as a horizontal strip (`x`, `y`, `w`,
//! `h`, `count`, `spacing`); on load the strip is expanded into explicit
//! frame regions.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Pixel rectangle of one frame on the spritesheet image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRegion {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl FrameRegion {
    /// Normalised `[u0, v0, u1, v1]` for a sheet of the given pixel size.
    pub fn uv(&self, sheet_w: u32, sheet_h: u32) -> [f32; 4] {
        let sw = sheet_w.max(1) as f32;
        let sh = sheet_h.max(1) as f32;
        [
            self.x as f32 / sw,
            self.y as f32 / sh,
            (self.x + self.w) as f32 / sw,
            (self.y + self.h) as f32 / sh,
        ]
    }

    pub fn fits_within(&self, sheet_w: u32, sheet_h: u32) -> bool {
        let right = self.x.checked_add(self.w);
        let bottom = self.y.checked_add(self.h);
        matches!((right, bottom), (Some(r), Some(b)) if r <= sheet_w && b <= sheet_h)
    }
}

/// A looping sequence of frames sharing one per-frame duration.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub frames: Vec<FrameRegion>,
    pub ticks_per_frame: u32,
}

/// Playback position inside a clip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationCursor {
    pub frame_index: usize,
    pub elapsed_ticks: u32,
}

impl AnimationCursor {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance by `ticks` simulation steps and return the frame now showing.
    pub fn tick<'a>(&mut self, ticks: u32, clip: &'a AnimationClip) -> Option<&'a FrameRegion> {
        if clip.frames.is_empty() {
            return None;
        }
        if clip.ticks_per_frame == 0 {
            return clip.frames.get(self.frame_index);
        }

        self.elapsed_ticks += ticks;
        while self.elapsed_ticks >= clip.ticks_per_frame {
            self.elapsed_ticks -= clip.ticks_per_frame;
            self.frame_index = (self.frame_index + 1) % clip.frames.len();
        }
        clip.frames.get(self.frame_index)
    }

    pub fn current<'a>(&self, clip: &'a AnimationClip) -> Option<&'a FrameRegion> {
        clip.frames.get(self.frame_index)
    }
}

/// Spritesheet description loaded from JSON.
#[derive(Debug, Clone)]
pub struct SpriteSheetFile {
    pub version: String,
    pub sheet_id: String,
    pub image: String,
    pub clips: HashMap<String, AnimationClip>,
}

// --- JSON deserialization types (private) ---

#[derive(Debug, Deserialize)]
struct SpriteSheetJson {
    version: String,
    sheet_id: String,
    image: String,
    clips: HashMap<String, SpriteStripJson>,
}

#[derive(Debug, Deserialize)]
struct SpriteStripJson {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    count: u32,
    #[serde(default)]
    spacing: u32,
    #[serde(default = "default_ticks_per_frame")]
    ticks_per_frame: u32,
}

impl SpriteStripJson {
    fn frames(&self) -> Vec<FrameRegion> {
        (0..self.count)
            .map(|i| FrameRegion {
                x: self.x + i * (self.w + self.spacing),
                y: self.y,
                w: self.w,
                h: self.h,
            })
            .collect()
    }
}

const fn default_ticks_per_frame() -> u32 {
    7
}

/// Load a spritesheet description from disk.
pub fn load_sprite_sheet_file(path: &Path) -> Result<SpriteSheetFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read spritesheet file {}: {e}", path.display()))?;
    let json: SpriteSheetJson = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse spritesheet file {}: {e}", path.display()))?;
    validate_sprite_sheet_json(&json)?;

    let clips = json
        .clips
        .iter()
        .map(|(name, strip)| {
            (
                name.clone(),
                AnimationClip {
                    frames: strip.frames(),
                    ticks_per_frame: strip.ticks_per_frame,
                },
            )
        })
        .collect();

    Ok(SpriteSheetFile {
        version: json.version,
        sheet_id: json.sheet_id,
        image: json.image,
        clips,
    })
}

fn validate_sprite_sheet_json(json: &SpriteSheetJson) -> Result<(), String> {
    if json.version != "0.1" {
        return Err(format!(
            "Spritesheet validation failed: unsupported version '{}'",
            json.version
        ));
    }
    if json.sheet_id.is_empty() {
        return Err("Spritesheet validation failed: sheet_id is empty".to_string());
    }
    if json.image.is_empty() {
        return Err("Spritesheet validation failed: image path is empty".to_string());
    }
    for (name, strip) in &json.clips {
        if strip.count == 0 {
            return Err(format!(
                "Spritesheet validation failed: clip '{}' has no frames",
                name
            ));
        }
        if strip.w == 0 || strip.h == 0 {
            return Err(format!(
                "Spritesheet validation failed: clip '{}' has zero-sized frames",
                name
            ));
        }
        if strip.ticks_per_frame == 0 {
            return Err(format!(
                "Spritesheet validation failed: clip '{}' has zero ticks_per_frame",
                name
            ));
        }
        let strip_width = u64::from(strip.count) * u64::from(strip.w)
            + u64::from(strip.count - 1) * u64::from(strip.spacing);
        if u64::from(strip.x) + strip_width > u64::from(u32::MAX) {
            return Err(format!(
                "Spritesheet validation failed: clip '{}' overflows the sheet coordinate range",
                name
            ));
        }
    }
    Ok(())
}
