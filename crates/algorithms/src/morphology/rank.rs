//! Neighborhood max/min kernel shared by dilation and erosion

use crate::maybe_rayon::*;
use voxkit_core::{Error, Result, VoxelGrid};

use super::element::StructuringElement;

/// Which order statistic to take over the neighborhood
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rank {
    Max,
    Min,
}

impl Rank {
    /// Identity element: out-of-bounds neighbors behave as this value
    fn identity(self) -> f64 {
        match self {
            Rank::Max => f64::NEG_INFINITY,
            Rank::Min => f64::INFINITY,
        }
    }

    fn pick(self, acc: f64, value: f64) -> f64 {
        match self {
            Rank::Max => acc.max(value),
            Rank::Min => acc.min(value),
        }
    }
}

/// Compute the neighborhood extremum of every voxel into a new buffer.
///
/// Out-of-bounds neighbors are skipped, never clamped or wrapped.
pub(crate) fn rank_values(
    grid: &VoxelGrid,
    element: &StructuringElement,
    rank: Rank,
) -> Result<Vec<f64>> {
    if element.ndim() != grid.ndim() {
        return Err(Error::InvalidParameter {
            name: "element",
            value: format!("{} axes", element.ndim()),
            reason: format!("grid has {} axes", grid.ndim()),
        });
    }

    let src = grid.to_vec();
    if element.is_identity() {
        return Ok(src);
    }

    let indexer = grid.indexer();
    let offsets = element.offsets();

    let values: Vec<f64> = (0..indexer.len())
        .into_par_iter()
        .map(|i| {
            let coords = indexer.unravel(i);
            offsets
                .iter()
                .filter_map(|o| indexer.neighbor(&coords, o))
                .fold(rank.identity(), |acc, j| rank.pick(acc, src[j]))
        })
        .collect();

    Ok(values)
}

/// Neighborhood extremum as a new grid
pub(crate) fn rank_filter(
    grid: &VoxelGrid,
    element: &StructuringElement,
    rank: Rank,
) -> Result<VoxelGrid> {
    let values = rank_values(grid, element, rank)?;
    grid.with_values(values)
}
