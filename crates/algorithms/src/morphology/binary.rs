//! Binary dilation and erosion (MD / ME)
//!
//! Inputs are binarized first: a voxel is foreground iff its value is
//! non-zero. Outputs contain only 0.0 and 1.0, except that a zero-radius
//! element returns the input unchanged.

use voxkit_core::{Result, VoxelGrid};

use super::element::StructuringElement;
use super::rank::{rank_filter, Rank};

/// Map every non-zero voxel to 1.0 and every zero voxel to 0.0
pub fn binarize(grid: &VoxelGrid) -> VoxelGrid {
    grid.map(|v| if v != 0.0 { 1.0 } else { 0.0 })
}

/// Binary dilation: a voxel becomes foreground if any neighbor is foreground
pub fn binary_dilate(grid: &VoxelGrid, element: &StructuringElement) -> Result<VoxelGrid> {
    if element.is_identity() {
        return Ok(grid.clone());
    }
    rank_filter(&binarize(grid), element, Rank::Max)
}

/// Binary erosion: a voxel stays foreground only if every in-bounds
/// neighbor is foreground
pub fn binary_erode(grid: &VoxelGrid, element: &StructuringElement) -> Result<VoxelGrid> {
    if element.is_identity() {
        return Ok(grid.clone());
    }
    rank_filter(&binarize(grid), element, Rank::Min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_voxel() -> VoxelGrid {
        let mut grid = VoxelGrid::filled(&[4, 4], 0.0).unwrap();
        grid.set(&[1, 1], 1.0).unwrap();
        grid
    }

    fn foreground(grid: &VoxelGrid) -> Vec<[usize; 2]> {
        let mut out = Vec::new();
        for r in 0..grid.extents()[0] {
            for c in 0..grid.extents()[1] {
                if grid.get(&[r, c]).unwrap() != 0.0 {
                    out.push([r, c]);
                }
            }
        }
        out
    }

    #[test]
    fn test_dilate_then_erode_cross() {
        let se = StructuringElement::ball(2, 1).unwrap();
        let dilated = binary_dilate(&single_voxel(), &se).unwrap();
        assert_eq!(
            foreground(&dilated),
            vec![[0, 1], [1, 0], [1, 1], [1, 2], [2, 1]]
        );

        let eroded = binary_erode(&dilated, &se).unwrap();
        assert_eq!(foreground(&eroded), vec![[1, 1]]);
    }

    #[test]
    fn test_output_is_binary() {
        let grid = VoxelGrid::from_vec(&[2, 3], vec![0.0, 3.5, -2.0, 0.0, 0.0, 7.0]).unwrap();
        let dilated = binary_dilate(&grid, &StructuringElement::ball(2, 1).unwrap()).unwrap();
        assert_eq!(dilated.to_vec(), vec![1.0, 1.0, 1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_zero_radius_keeps_values() {
        let grid = VoxelGrid::from_vec(&[2, 2], vec![0.0, 0.5, 3.0, -2.0]).unwrap();
        let se = StructuringElement::ball(2, 0).unwrap();
        assert_eq!(binary_dilate(&grid, &se).unwrap(), grid);
        assert_eq!(binary_erode(&grid, &se).unwrap(), grid);
    }
}
