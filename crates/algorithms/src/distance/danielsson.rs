//! Danielsson vector distance map
//!
//! Every voxel carries the offset to its nearest known background voxel.
//! A forward raster sweep pulls offsets from already-visited neighbors, a
//! backward sweep from the remaining ones. The result is an approximation
//! that never underestimates the exact Euclidean distance.
//!
//! Reference:
//! Danielsson, P.-E. (1980). Euclidean distance mapping.
//!   Computer Graphics and Image Processing 14(3), 227-248.

use voxkit_core::grid::{Coords, Offset, MAX_DIMS};
use voxkit_core::{Connectivity, Result, VoxelGrid};

use super::{check_classes, EmptyPolicy, Occupancy};

/// Unsigned distance from every voxel to the nearest background (`== 0`)
/// voxel. Background voxels map to 0.
///
/// Under `EmptyPolicy::Infinity` a mask with only one class is filled
/// with `+∞`.
pub fn danielsson_distance(grid: &VoxelGrid, use_spacing: bool, empty: EmptyPolicy) -> Result<VoxelGrid> {
    match check_classes(grid, empty)? {
        Occupancy::NoForeground | Occupancy::NoBackground => return Ok(grid.like(f64::INFINITY)),
        Occupancy::Mixed => {}
    }

    let ndim = grid.ndim();
    let spacing: Vec<f64> = if use_spacing {
        grid.spacing().to_vec()
    } else {
        vec![1.0; ndim]
    };
    let indexer = grid.indexer();
    let src = grid.to_vec();

    // offsets sorted by the sign of their linear displacement
    let (before, after): (Vec<Offset>, Vec<Offset>) = Connectivity::Full
        .offsets(ndim)
        .into_iter()
        .partition(|o| precedes(o, ndim));

    let mut vectors: Vec<Option<Offset>> = src
        .iter()
        .map(|&v| if v == 0.0 { Some([0; MAX_DIMS]) } else { None })
        .collect();
    let mut dist2: Vec<f64> = vectors
        .iter()
        .map(|v| if v.is_some() { 0.0 } else { f64::INFINITY })
        .collect();

    let mut relax = |i: usize, coords: &Coords, neighbors: &[Offset], vectors: &mut [Option<Offset>]| {
        for o in neighbors {
            let Some(j) = indexer.neighbor(coords, o) else {
                continue;
            };
            let Some(v) = vectors[j] else {
                continue;
            };
            let mut candidate = [0isize; MAX_DIMS];
            let mut d2 = 0.0;
            for axis in 0..ndim {
                candidate[axis] = o[axis] + v[axis];
                let d = candidate[axis] as f64 * spacing[axis];
                d2 += d * d;
            }
            if d2 < dist2[i] {
                dist2[i] = d2;
                vectors[i] = Some(candidate);
            }
        }
    };

    for i in 0..indexer.len() {
        let coords = indexer.unravel(i);
        relax(i, &coords, &before, &mut vectors);
    }
    for i in (0..indexer.len()).rev() {
        let coords = indexer.unravel(i);
        relax(i, &coords, &after, &mut vectors);
    }

    grid.with_values(dist2.into_iter().map(f64::sqrt).collect())
}

/// Whether the neighbor at `offset` comes earlier in raster order
fn precedes(offset: &Offset, ndim: usize) -> bool {
    offset[..ndim]
        .iter()
        .find(|&&d| d != 0)
        .is_some_and(|&d| d < 0)
}
