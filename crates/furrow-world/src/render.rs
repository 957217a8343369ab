//! Grayscale rendering of grid layers.
//!
//! Layers are mapped to 8-bit intensities and encoded as single-channel
//! (L8) PNG, which browsers and canvas frontends load directly.

use furrow_types::{LayerGrid, Normalization};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::WorldError;

/// Smallest value range stretched by [`Normalization::MinMax`].
const MIN_RANGE: f64 = 1e-9;

/// An 8-bit grayscale image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Raster {
    /// Render a layer grid.
    pub fn from_grid(grid: &LayerGrid, normalization: Normalization) -> Self {
        let flat: Vec<f64> = grid.values.iter().flatten().copied().collect();
        let (low, high) = match normalization {
            Normalization::Clip => (0.0, 1.0),
            Normalization::MinMax => value_range(&flat),
        };
        let span = (high - low).max(MIN_RANGE);

        let pixels = flat
            .iter()
            .map(|v| intensity((v - low) / span))
            .collect();

        Self {
            width: grid.size,
            height: grid.values.len(),
            pixels,
        }
    }

    /// Image width in pixels.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Raw pixel intensities.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Encode as grayscale PNG.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::RasterShape`] if the pixel buffer does not fill
    /// the image, or [`WorldError::ImageEncode`] if the encoder fails.
    pub fn to_png(&self) -> Result<Vec<u8>, WorldError> {
        let shape_error = || WorldError::RasterShape {
            width: self.width,
            height: self.height,
            pixels: self.pixels.len(),
        };
        if self.width.checked_mul(self.height) != Some(self.pixels.len()) {
            return Err(shape_error());
        }
        let (Ok(width), Ok(height)) = (u32::try_from(self.width), u32::try_from(self.height))
        else {
            return Err(shape_error());
        };

        let mut out = Vec::new();
        PngEncoder::new(&mut out).write_image(&self.pixels, width, height, ExtendedColorType::L8)?;
        Ok(out)
    }
}

fn value_range(values: &[f64]) -> (f64, f64) {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (low, high) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if low > high { (0.0, 1.0) } else { (low, high) }
}

/// Map `[0, 1]` to `0..=255`, clipping outside values and NaN.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn intensity(unit: f64) -> u8 {
    let unit = if unit.is_nan() { 0.0 } else { unit.clamp(0.0, 1.0) };
    // In [0.0, 255.0] after the clamp, so the cast is exact.
    (unit * 255.0).round() as u8
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use furrow_types::Layer;

    fn grid(values: Vec<Vec<f64>>) -> LayerGrid {
        LayerGrid {
            layer: Layer::Ndvi,
            size: values.first().map_or(0, Vec::len),
            values,
        }
    }

    #[test]
    fn clip_maps_unit_interval() {
        let raster = Raster::from_grid(&grid(vec![vec![0.0, 0.5], vec![1.0, 2.0]]), Normalization::Clip);
        assert_eq!(raster.pixels(), &[0, 128, 255, 255]);
        assert_eq!((raster.width(), raster.height()), (2, 2));
    }

    #[test]
    fn min_max_stretches_range() {
        let raster = Raster::from_grid(
            &grid(vec![vec![1.0, 1.25], vec![1.5, 1.25]]),
            Normalization::MinMax,
        );
        assert_eq!(raster.pixels(), &[0, 128, 255, 128]);
    }

    #[test]
    fn flat_layer_does_not_divide_by_zero() {
        let raster = Raster::from_grid(&grid(vec![vec![0.7, 0.7]]), Normalization::MinMax);
        assert_eq!(raster.pixels(), &[0, 0]);
    }

    #[test]
    fn png_decodes_to_same_pixels() {
        let raster = Raster::from_grid(
            &grid(vec![vec![1.0, 0.0, 0.5], vec![0.25, 0.75, 1.0]]),
            Normalization::Clip,
        );
        let png = raster.to_png().unwrap();
        assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
        let gray = decoded.to_luma8();
        assert_eq!(gray.dimensions(), (3, 2));
        assert_eq!(gray.as_raw().as_slice(), raster.pixels());
    }

    #[test]
    fn ragged_raster_is_rejected() {
        let raster = Raster {
            width: 3,
            height: 2,
            pixels: vec![0; 5],
        };
        assert!(matches!(
            raster.to_png(),
            Err(WorldError::RasterShape { pixels: 5, .. })
        ));
    }
}
