//! Heightmap terrain: raster decoding and level-of-detail mesh derivation.
//!
//! # Invariants
//! - Height samples are channel-averaged and normalized to [0, 1].
//! - Derived meshes are plain vertex/index data; GPU residency is the
//!   renderer's business.
//! - Changing the skip interval replaces the reduced mesh wholesale.

pub mod mesh;
pub mod raster;

pub use mesh::{HeightmapTerrain, TerrainMesh};
pub use raster::HeightRaster;

/// Errors from raster loading and level-of-detail selection.
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    #[error("failed to load height raster {path}: {source}")]
    Raster {
        path: String,
        source: image::ImageError,
    },
    #[error("raster must not be empty")]
    RasterEmpty,
    #[error("raster is {width}x{height} but carries {samples} samples")]
    SampleCount {
        width: usize,
        height: usize,
        samples: usize,
    },
    #[error("level-of-detail step {0} is outside the range 1-4")]
    StepOutOfRange(u8),
    #[error("level-of-detail steps above 1 need a skip interval first")]
    SkipIntervalUnset,
    #[error("level-of-detail step {0} is not implemented")]
    StepUnimplemented(u8),
    #[error("skip interval must be at least 1")]
    SkipIntervalInvalid,
}
