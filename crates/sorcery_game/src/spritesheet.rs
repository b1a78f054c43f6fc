//! Loads the character spritesheet: JSON strip description plus the decoded
//! image it points at. The image path is relative to the JSON file.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use image::RgbaImage;
use sorcery_core::animation::load_sprite_sheet_file;

use crate::animation::AnimationSet;

pub struct SpriteSheet {
    pub image: RgbaImage,
    pub animations: AnimationSet,
}

impl SpriteSheet {
    pub fn load(path: &Path) -> Result<Self> {
        let file = load_sprite_sheet_file(path).map_err(|e| anyhow!(e))?;
        let animations = AnimationSet::from_named(&file.clips).map_err(|e| anyhow!(e))?;

        let image_path = path
            .parent()
            .map(|dir| dir.join(&file.image))
            .unwrap_or_else(|| PathBuf::from(&file.image));
        let image = image::open(&image_path)
            .with_context(|| format!("failed to decode spritesheet image {}", image_path.display()))?
            .to_rgba8();

        validate_regions(&animations, image.width(), image.height())?;

        log::info!(
            "Spritesheet '{}' loaded: {}x{} from {}",
            file.sheet_id,
            image.width(),
            image.height(),
            image_path.display()
        );

        Ok(Self {
            image,
            animations,
        })
    }
}

/// Every frame of every clip must lie inside the decoded image.
pub fn validate_regions(animations: &AnimationSet, width: u32, height: u32) -> Result<()> {
    for (state, clip) in animations.iter() {
        for (i, frame) in clip.frames.iter().enumerate() {
            if !frame.fits_within(width, height) {
                bail!(
                    "clip '{}' frame {} ({}x{} at {},{}) lies outside the {}x{} sheet",
                    state.clip_name(),
                    i,
                    frame.w,
                    frame.h,
                    frame.x,
                    frame.y,
                    width,
                    height
                );
            }
        }
    }
    Ok(())
}
