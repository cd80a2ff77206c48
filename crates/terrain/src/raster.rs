use std::path::Path;

use crate::TerrainError;

/// A decoded height raster: row-major samples in [0, 1].
///
/// Each sample is the average of the source pixel's color channels, so
/// grayscale and colored heightmaps read the same way.
#[derive(Debug, Clone)]
pub struct HeightRaster {
    width: usize,
    height: usize,
    samples: Vec<f32>,
}

impl HeightRaster {
    /// Decode an image file into height samples.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TerrainError> {
        let path = path.as_ref();
        let decoded = image::open(path).map_err(|source| TerrainError::Raster {
            path: path.display().to_string(),
            source,
        })?;
        let rgb = decoded.to_rgb32f();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        let samples = rgb
            .pixels()
            .map(|p| (p.0[0] + p.0[1] + p.0[2]) / 3.0)
            .collect();
        tracing::debug!(path = %path.display(), width, height, "decoded height raster");
        Self::from_samples(width, height, samples)
    }

    /// Wrap precomputed samples. The count must match `width * height` and
    /// the raster must not be empty.
    pub fn from_samples(
        width: usize,
        height: usize,
        samples: Vec<f32>,
    ) -> Result<Self, TerrainError> {
        if width == 0 || height == 0 {
            return Err(TerrainError::RasterEmpty);
        }
        if samples.len() != width * height {
            return Err(TerrainError::SampleCount {
                width,
                height,
                samples: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample at raster coordinates (x right, y down).
    pub fn sample(&self, x: usize, y: usize) -> f32 {
        self.samples[y * self.width + x]
    }
}
