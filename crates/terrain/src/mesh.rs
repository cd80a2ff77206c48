use std::path::Path;

use glam::{Mat4, Vec3};

use crate::{HeightRaster, TerrainError};

/// Triangle mesh derived from a height raster.
///
/// `columns`/`rows` are the vertex-grid dimensions the index buffer was
/// built for.
#[derive(Debug, Clone, Default)]
pub struct TerrainMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub columns: usize,
    pub rows: usize,
}

/// Heightmap terrain with selectable level of detail.
///
/// Step 1 is the full-resolution mesh, one vertex per raster sample. Step 2
/// resamples every skip-th column and row, always keeping the far edges.
/// Steps 3 and 4 are reserved for smoothed variants and refuse selection.
#[derive(Debug)]
pub struct HeightmapTerrain {
    raster: HeightRaster,
    full: TerrainMesh,
    reduced: Option<TerrainMesh>,
    skip: Option<usize>,
    selected: u8,
}

impl HeightmapTerrain {
    /// Derive the full-resolution mesh for a raster. Step 1 is selected.
    pub fn new(raster: HeightRaster) -> Self {
        let full = derive_full(&raster);
        Self {
            raster,
            full,
            reduced: None,
            skip: None,
            selected: 1,
        }
    }

    /// Load the raster at `path` and derive the full-resolution mesh.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TerrainError> {
        Ok(Self::new(HeightRaster::load(path)?))
    }

    pub fn raster(&self) -> &HeightRaster {
        &self.raster
    }

    /// Set the skip interval and (re)derive the reduced mesh, replacing any
    /// previous one.
    pub fn set_skip_interval(&mut self, skip: usize) -> Result<(), TerrainError> {
        if skip == 0 {
            return Err(TerrainError::SkipIntervalInvalid);
        }
        let _span = tracing::info_span!("derive_reduced", skip).entered();
        self.reduced = Some(derive_reduced(&self.raster, skip));
        self.skip = Some(skip);
        tracing::debug!(skip, "reduced terrain mesh rebuilt");
        Ok(())
    }

    pub fn skip_interval(&self) -> Option<usize> {
        self.skip
    }

    /// Select the active level-of-detail step (1-4). Step 2 needs a skip
    /// interval first; steps 3 and 4 are not implemented.
    pub fn select_step(&mut self, step: u8) -> Result<(), TerrainError> {
        match step {
            1 => {
                self.selected = 1;
                Ok(())
            }
            2 => {
                if self.reduced.is_none() {
                    return Err(TerrainError::SkipIntervalUnset);
                }
                self.selected = 2;
                Ok(())
            }
            3 | 4 => Err(TerrainError::StepUnimplemented(step)),
            _ => Err(TerrainError::StepOutOfRange(step)),
        }
    }

    pub fn selected_step(&self) -> u8 {
        self.selected
    }

    pub fn selected_mesh(&self) -> &TerrainMesh {
        match self.selected {
            2 => self
                .reduced
                .as_ref()
                .expect("step 2 selected without a reduced mesh"),
            _ => &self.full,
        }
    }

    pub fn full_mesh(&self) -> &TerrainMesh {
        &self.full
    }

    pub fn reduced_mesh(&self) -> Option<&TerrainMesh> {
        self.reduced.as_ref()
    }

    /// Base model transform: y scaled by (width + height) / 8 so relief
    /// keeps proportion with the raster footprint.
    pub fn base_scale(&self) -> Mat4 {
        let y = (self.raster.width() + self.raster.height()) as f32 / 8.0;
        Mat4::from_scale(Vec3::new(1.0, y, 1.0))
    }
}

/// One vertex per sample, grid centered on the origin, height as y.
fn derive_full(raster: &HeightRaster) -> TerrainMesh {
    let w = raster.width();
    let h = raster.height();
    let mut vertices = Vec::with_capacity(w * h);
    for (i, sample) in raster.samples().iter().enumerate() {
        vertices.push(Vec3::new(
            (i % w) as f32 - w as f32 / 2.0,
            *sample,
            (i / w) as f32 - h as f32 / 2.0,
        ));
    }
    TerrainMesh {
        vertices,
        indices: grid_indices(w, h),
        columns: w,
        rows: h,
    }
}

/// Resample every skip-th column and row. A far edge that the stride would
/// step over is kept when more than one sample remains past the last stride
/// hit, so the terrain never loses its outer rim.
fn derive_reduced(raster: &HeightRaster, skip: usize) -> TerrainMesh {
    let w = raster.width();
    let h = raster.height();
    let cols = sampled_positions(w, skip);
    let row_positions = sampled_positions(h, skip);

    let mut vertices = Vec::with_capacity(cols.len() * row_positions.len());
    for &y in &row_positions {
        for &x in &cols {
            vertices.push(Vec3::new(
                x as f32 - w as f32 / 2.0,
                raster.sample(x, y),
                y as f32 - h as f32 / 2.0,
            ));
        }
    }

    let columns = reduced_dim(w, skip);
    let rows = reduced_dim(h, skip);
    TerrainMesh {
        vertices,
        indices: grid_indices(columns, rows),
        columns,
        rows,
    }
}

/// Stride positions along one axis, force-including the last sample when
/// the stride would leave a gap of more than one behind it.
fn sampled_positions(dim: usize, skip: usize) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut i = 0;
    while i < dim {
        positions.push(i);
        let remaining = dim - i;
        if remaining > 1 && remaining <= skip {
            positions.push(dim - 1);
        }
        i += skip;
    }
    positions
}

/// Vertex-grid dimension assumed for the reduced index buffer.
fn reduced_dim(dim: usize, skip: usize) -> usize {
    dim / skip + if dim % skip == 0 { 1 } else { 2 }
}

/// Two triangles per 2x2 block of a columns x rows vertex grid, wound
/// counter-clockwise seen from +y.
fn grid_indices(columns: usize, rows: usize) -> Vec<u32> {
    if columns < 2 || rows < 2 {
        return Vec::new();
    }
    let mut indices = Vec::with_capacity((columns - 1) * (rows - 1) * 6);
    for row in 0..rows - 1 {
        let offset = row * columns;
        for col in 0..columns - 1 {
            let top_left = (offset + col) as u32;
            let top_right = top_left + 1;
            let bottom_left = (offset + columns + col) as u32;
            let bottom_right = bottom_left + 1;
            indices.extend_from_slice(&[
                top_left,
                bottom_left,
                top_right,
                bottom_left,
                bottom_right,
                top_right,
            ]);
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(width: usize, height: usize) -> HeightRaster {
        let samples = (0..width * height).map(|i| i as f32 / 1000.0).collect();
        HeightRaster::from_samples(width, height, samples).unwrap()
    }

    fn unique_sorted(values: impl Iterator<Item = f32>) -> Vec<f32> {
        let mut out: Vec<f32> = Vec::new();
        for v in values {
            if !out.iter().any(|u| (u - v).abs() < 1e-6) {
                out.push(v);
            }
        }
        out.sort_by(|a, b| a.partial_cmp(b).unwrap());
        out
    }

    #[test]
    fn full_mesh_centers_the_grid() {
        let terrain = HeightmapTerrain::new(raster(3, 3));
        let mesh = terrain.full_mesh();
        assert_eq!(mesh.vertices.len(), 9);
        assert_eq!(mesh.columns, 3);
        assert_eq!(mesh.rows, 3);

        assert!(mesh.vertices[0].abs_diff_eq(Vec3::new(-1.5, 0.0, -1.5), 1e-6));
        // Middle sample sits half a cell before center on both axes.
        assert!((mesh.vertices[4].x - -0.5).abs() < 1e-6);
        assert!((mesh.vertices[4].z - -0.5).abs() < 1e-6);
    }

    #[test]
    fn full_mesh_heights_come_from_samples() {
        let r = HeightRaster::from_samples(2, 2, vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let terrain = HeightmapTerrain::new(r);
        let heights: Vec<f32> = terrain.full_mesh().vertices.iter().map(|v| v.y).collect();
        assert_eq!(heights, vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn first_block_emits_two_triangles() {
        let indices = grid_indices(3, 3);
        assert_eq!(indices.len(), 2 * 2 * 6);
        assert_eq!(&indices[..6], &[0, 3, 1, 3, 4, 1]);
    }

    #[test]
    fn degenerate_grids_have_no_triangles() {
        assert!(grid_indices(1, 5).is_empty());
        assert!(grid_indices(5, 1).is_empty());
    }

    #[test]
    fn reduced_keeps_the_far_edges() {
        for skip in [2usize, 3, 5, 20] {
            let mut terrain = HeightmapTerrain::new(raster(8, 8));
            terrain.set_skip_interval(skip).unwrap();
            let mesh = terrain.reduced_mesh().unwrap();

            let xs = unique_sorted(mesh.vertices.iter().map(|v| v.x));
            let zs = unique_sorted(mesh.vertices.iter().map(|v| v.z));
            // Column/row 0 maps to -4, column/row 7 to +3.
            assert!((xs[0] - -4.0).abs() < 1e-6, "skip {skip} lost column 0");
            assert!(
                (xs[xs.len() - 1] - 3.0).abs() < 1e-6,
                "skip {skip} lost the last column"
            );
            assert!((zs[0] - -4.0).abs() < 1e-6, "skip {skip} lost row 0");
            assert!(
                (zs[zs.len() - 1] - 3.0).abs() < 1e-6,
                "skip {skip} lost the last row"
            );
        }
    }

    #[test]
    fn ten_by_ten_skip_three_samples_columns_0_3_6_9() {
        let mut terrain = HeightmapTerrain::new(raster(10, 10));
        terrain.set_skip_interval(3).unwrap();
        let mesh = terrain.reduced_mesh().unwrap();

        let xs = unique_sorted(mesh.vertices.iter().map(|v| v.x));
        let zs = unique_sorted(mesh.vertices.iter().map(|v| v.z));
        // Raster columns {0, 3, 6, 9} centered by width/2 = 5.
        assert_eq!(xs, vec![-5.0, -2.0, 1.0, 4.0]);
        assert_eq!(zs, vec![-5.0, -2.0, 1.0, 4.0]);
        assert_eq!(mesh.vertices.len(), 16);
    }

    #[test]
    fn changing_skip_replaces_the_reduced_mesh() {
        let mut terrain = HeightmapTerrain::new(raster(10, 10));
        terrain.set_skip_interval(2).unwrap();
        let coarse = terrain.reduced_mesh().unwrap().vertices.len();
        terrain.set_skip_interval(5).unwrap();
        let coarser = terrain.reduced_mesh().unwrap().vertices.len();
        assert!(coarser < coarse);
        assert_eq!(terrain.skip_interval(), Some(5));
    }

    #[test]
    fn skip_zero_is_invalid() {
        let mut terrain = HeightmapTerrain::new(raster(4, 4));
        assert!(matches!(
            terrain.set_skip_interval(0).unwrap_err(),
            TerrainError::SkipIntervalInvalid
        ));
    }

    #[test]
    fn step_selection_rules() {
        let mut terrain = HeightmapTerrain::new(raster(6, 6));
        assert_eq!(terrain.selected_step(), 1);

        assert!(matches!(
            terrain.select_step(0).unwrap_err(),
            TerrainError::StepOutOfRange(0)
        ));
        assert!(matches!(
            terrain.select_step(5).unwrap_err(),
            TerrainError::StepOutOfRange(5)
        ));
        assert!(matches!(
            terrain.select_step(2).unwrap_err(),
            TerrainError::SkipIntervalUnset
        ));
        assert!(matches!(
            terrain.select_step(3).unwrap_err(),
            TerrainError::StepUnimplemented(3)
        ));
        assert!(matches!(
            terrain.select_step(4).unwrap_err(),
            TerrainError::StepUnimplemented(4)
        ));
        // A failed selection leaves the previous step active.
        assert_eq!(terrain.selected_step(), 1);

        terrain.set_skip_interval(2).unwrap();
        terrain.select_step(2).unwrap();
        assert_eq!(terrain.selected_step(), 2);
        let reduced_len = terrain.selected_mesh().vertices.len();
        assert!(reduced_len < terrain.full_mesh().vertices.len());

        terrain.select_step(1).unwrap();
        assert_eq!(
            terrain.selected_mesh().vertices.len(),
            terrain.full_mesh().vertices.len()
        );
    }

    #[test]
    fn base_scale_follows_raster_size() {
        let terrain = HeightmapTerrain::new(raster(16, 16));
        let scaled = terrain.base_scale().transform_point3(Vec3::ONE);
        assert!((scaled.y - 4.0).abs() < 1e-6);
        assert!((scaled.x - 1.0).abs() < 1e-6);
        assert!((scaled.z - 1.0).abs() < 1e-6);
    }
}
