use crate::{Effect, Error, Result};
use derivative::Derivative;
use derive_setters::Setters;
use image::{Rgb, Rgba, RgbaImage};
use rayon::prelude::*;

/// Upper bound for the per-channel tolerance
pub const MAX_TOLERANCE: u8 = 100;

/// Color key configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct ChromaKeyConfig {
    #[derivative(Default(value = "Rgb([255, 255, 255])"))]
    target: Rgb<u8>,

    #[derivative(Default(value = "10"))]
    tolerance: u8,
}

impl ChromaKeyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Rgb<u8> {
        self.target
    }

    pub fn tolerance(&self) -> u8 {
        self.tolerance
    }

    fn validate(&self) -> Result<()> {
        if self.tolerance > MAX_TOLERANCE {
            return Err(Error::InvalidParameter(format!(
                "tolerance {} is out of range 0..={MAX_TOLERANCE}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

impl Effect for ChromaKeyConfig {
    fn apply(&self, image: &mut RgbaImage) -> Result<()> {
        self.validate()?;

        let row_len = image.width() as usize * 4;
        if row_len == 0 || image.height() == 0 {
            return Ok(());
        }

        let (target, tolerance) = (self.target, self.tolerance);

        image.par_chunks_exact_mut(row_len).for_each(|row| {
            for px in row.chunks_exact_mut(4) {
                if is_keyed(&Rgba([px[0], px[1], px[2], px[3]]), target, tolerance) {
                    px[3] = 0;
                }
            }
        });

        Ok(())
    }
}

/// Inclusive per-channel match: every one of R, G and B must be within `tolerance`
pub fn is_keyed(pixel: &Rgba<u8>, target: Rgb<u8>, tolerance: u8) -> bool {
    pixel[0].abs_diff(target[0]) <= tolerance
        && pixel[1].abs_diff(target[1]) <= tolerance
        && pixel[2].abs_diff(target[2]) <= tolerance
}

/// Key `source` into a new buffer of the same dimensions
pub fn render(source: &RgbaImage, target: Rgb<u8>, tolerance: u8) -> Result<RgbaImage> {
    let mut output = source.clone();
    ChromaKeyConfig::new()
        .with_target(target)
        .with_tolerance(tolerance)
        .apply(&mut output)?;
    Ok(output)
}

/// Key a flat RGBA byte buffer of `width * height` pixels
pub fn render_raw(
    pixels: &[u8],
    width: u32,
    height: u32,
    target: Rgb<u8>,
    tolerance: u8,
) -> Result<Vec<u8>> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4));

    if expected != Some(pixels.len()) {
        return Err(Error::InvalidParameter(format!(
            "buffer of {} bytes does not match {width}x{height} RGBA",
            pixels.len()
        )));
    }

    let source = RgbaImage::from_raw(width, height, pixels.to_vec())
        .ok_or_else(|| Error::InvalidParameter("failed to wrap pixel buffer".to_string()))?;

    Ok(render(&source, target, tolerance)?.into_raw())
}
