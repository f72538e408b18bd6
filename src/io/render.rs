//! Paste stage: turns a layout into pixels

use crate::analysis::candidate::Pool;
use crate::io::error::{Result, invalid_parameter};
use crate::io::image::{Scaler, crop, load_rgb, orient};
use crate::io::progress::ProgressReporter;
use crate::spatial::placement::MosaicLayout;
use image::{RgbImage, imageops};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::debug;

/// Output controls of the paste stage
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    /// Output size relative to the target
    pub scale: f64,
    /// Weight of the target in a linear blend, 0 for pure tiles
    pub blend: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            blend: 0.0,
        }
    }
}

impl RenderOptions {
    /// Check the scale and blend ranges
    ///
    /// # Errors
    ///
    /// Returns an error if the scale is not positive or the blend is outside
    /// `0.0..=1.0`
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(invalid_parameter("scale", &self.scale, &"must be positive"));
        }
        if !(0.0..=1.0).contains(&self.blend) {
            return Err(invalid_parameter(
                "blend",
                &self.blend,
                &"must lie in 0.0..=1.0",
            ));
        }
        Ok(())
    }
}

/// Paste every placement of a layout into a new image
///
/// `target` is only read when blending and must match the layout size.
///
/// # Errors
///
/// Returns an error if:
/// - The options are invalid or the scaled output is empty
/// - Blending is requested without a target of the layout size
/// - A tile image cannot be loaded or resampled
pub fn render<S: Scaler>(
    layout: &MosaicLayout,
    pool: &Pool,
    scaler: &S,
    options: RenderOptions,
    target: Option<&RgbImage>,
    progress: &ProgressReporter,
) -> Result<RgbImage> {
    options.validate()?;
    let width = (f64::from(layout.width) * options.scale).floor() as u32;
    let height = (f64::from(layout.height) * options.scale).floor() as u32;
    if width == 0 || height == 0 {
        return Err(invalid_parameter(
            "scale",
            &options.scale,
            &"output would be empty",
        ));
    }

    let blend_target = if options.blend > 0.0 {
        match target {
            Some(image) if image.dimensions() == (layout.width, layout.height) => Some(image),
            _ => {
                return Err(invalid_parameter(
                    "blend",
                    &options.blend,
                    &format!("needs a {}x{} target", layout.width, layout.height),
                ));
            }
        }
    } else {
        None
    };

    progress.reset("rendering", layout.placements.len() as u64);
    let mut canvas = RgbImage::new(width, height);
    let mut tiles: HashMap<usize, RgbImage> = HashMap::new();

    for placement in &layout.placements {
        progress.advance(1);
        let rect = placement.rect.scaled(options.scale);
        if rect.width == 0 || rect.height == 0 {
            continue;
        }

        let index = placement.matched.candidate;
        let source = match tiles.entry(index) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(load_tile(pool, index)?),
        };
        let mut tile = scaler.scale(
            &orient(source, placement.matched.orientation),
            rect.width,
            rect.height,
        )?;

        if let Some(target) = blend_target {
            let region = scaler.scale(&crop(target, placement.rect), rect.width, rect.height)?;
            blend(&mut tile, &region, options.blend);
        }

        imageops::replace(&mut canvas, &tile, i64::from(rect.x), i64::from(rect.y));
    }

    progress.finish();
    debug!(width, height, tiles = tiles.len(), "rendered");
    Ok(canvas)
}

/// Pixels of a candidate, from its anti-image or its library file
fn load_tile(pool: &Pool, index: usize) -> Result<RgbImage> {
    if let Some(image) = pool.anti_tile_image(index) {
        return Ok(image);
    }
    match (pool.get(index), pool.library_path(index)) {
        (Some(candidate), Some(library)) => load_rgb(&library.join(candidate.filename())),
        _ => Err(invalid_parameter(
            "candidate",
            &index,
            &format!("pool holds {} candidates", pool.len()),
        )),
    }
}

/// Linear alpha composite in place: `tile * (1 - weight) + target * weight`
pub fn blend(tile: &mut RgbImage, target: &RgbImage, weight: f32) {
    for (out, back) in tile.pixels_mut().zip(target.pixels()) {
        for (channel, &under) in out.0.iter_mut().zip(back.0.iter()) {
            let mixed = f32::from(*channel).mul_add(1.0 - weight, f32::from(under) * weight);
            *channel = mixed.round().clamp(0.0, 255.0) as u8;
        }
    }
}
