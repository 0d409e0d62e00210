//! Synthetic test volumes

use clap::ValueEnum;
use voxkit_core::{ImageGeometry, Result, VoxelGrid};

/// Built-in phantom shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Phantom {
    /// Binary ball centered in the grid, radius one third of the size
    Sphere,
    /// Binary box covering the middle half of every axis
    Box,
    /// Sum of voxel indices
    Ramp,
    /// Uniform noise in [0, 1)
    Noise,
}

/// Build a phantom with `dims` axes of `size` voxels at isotropic `spacing`
pub fn build(kind: Phantom, dims: usize, size: usize, spacing: f64, seed: u64) -> Result<VoxelGrid> {
    let geometry = ImageGeometry::with_spacing_origin(vec![spacing; dims], vec![0.0; dims])?;
    let extents = vec![size; dims];
    let mut grid = VoxelGrid::new(&extents, geometry, 0.0)?;
    let indexer = grid.indexer();

    let center = (size as f64 - 1.0) / 2.0;
    let radius = size as f64 / 3.0;
    let (lo, hi) = (size / 4, size - size / 4);
    let mut state = seed;

    let values: Vec<f64> = (0..indexer.len())
        .map(|i| {
            let coords = &indexer.unravel(i)[..dims];
            match kind {
                Phantom::Sphere => {
                    let d2: f64 = coords.iter().map(|&c| (c as f64 - center).powi(2)).sum();
                    if d2 <= radius * radius { 1.0 } else { 0.0 }
                }
                Phantom::Box => {
                    if coords.iter().all(|&c| c >= lo && c < hi) { 1.0 } else { 0.0 }
                }
                Phantom::Ramp => coords.iter().sum::<usize>() as f64,
                Phantom::Noise => {
                    state = state
                        .wrapping_mul(6364136223846793005)
                        .wrapping_add(1442695040888963407);
                    (state >> 11) as f64 / (1u64 << 53) as f64
                }
            }
        })
        .collect();

    grid.overwrite(values)?;
    Ok(grid)
}
