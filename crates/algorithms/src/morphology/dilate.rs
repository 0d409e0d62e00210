//! Grayscale dilation (maximum filter)
//!
//! Replaces each voxel with the maximum value in its structuring element
//! neighborhood. Enlarges bright regions and shrinks dark regions.

use voxkit_core::{Result, VoxelGrid};

use super::element::StructuringElement;
use super::rank::{rank_filter, rank_values, Rank};

/// Perform grayscale dilation (GD)
///
/// Each output voxel is the maximum value within the structuring element
/// neighborhood. Neighbors outside the grid are excluded from the maximum,
/// so border voxels only see the part of the element inside the grid.
///
/// # Arguments
/// * `grid` - Input grid
/// * `element` - Structuring element with the grid's dimensionality
pub fn dilate(grid: &VoxelGrid, element: &StructuringElement) -> Result<VoxelGrid> {
    rank_filter(grid, element, Rank::Max)
}

/// Grayscale dilation that overwrites `grid`.
///
/// Side effect: the values of `grid` are replaced; extents and geometry are
/// untouched. The result is computed from a snapshot, so it equals
/// [`dilate`].
pub fn dilate_in_place(grid: &mut VoxelGrid, element: &StructuringElement) -> Result<()> {
    let values = rank_values(grid, element, Rank::Max)?;
    grid.overwrite(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morphology::ElementShape;

    fn make_grid(extents: &[usize], value: f64) -> VoxelGrid {
        VoxelGrid::filled(extents, value).unwrap()
    }

    #[test]
    fn test_dilate_uniform() {
        let grid = make_grid(&[7, 7], 5.0);
        let result = dilate(&grid, &StructuringElement::cube(2, 1).unwrap()).unwrap();
        assert!(result.to_vec().iter().all(|&v| (v - 5.0).abs() < 1e-10));
    }

    #[test]
    fn test_dilate_picks_maximum() {
        let mut grid = make_grid(&[7, 7], 5.0);
        grid.set(&[3, 4], 20.0).unwrap();

        let result = dilate(&grid, &StructuringElement::cube(2, 1).unwrap()).unwrap();
        assert_eq!(result.get(&[3, 3]).unwrap(), 20.0);
        assert_eq!(result.get(&[2, 5]).unwrap(), 20.0);
        assert_eq!(result.get(&[3, 1]).unwrap(), 5.0);
    }

    #[test]
    fn test_dilate_border_excludes_outside() {
        // Negative interior: clamping or zero padding would leak other values
        let mut grid = make_grid(&[5, 5], -3.0);
        grid.set(&[0, 0], -1.0).unwrap();
        let result = dilate(&grid, &StructuringElement::cube(2, 1).unwrap()).unwrap();
        assert_eq!(result.get(&[0, 0]).unwrap(), -1.0);
        assert_eq!(result.get(&[4, 4]).unwrap(), -3.0);
    }

    #[test]
    fn test_dilate_ball_skips_diagonal() {
        let mut grid = make_grid(&[7, 7, 7], 5.0);
        grid.set(&[2, 2, 3], 99.0).unwrap();

        let result = dilate(&grid, &StructuringElement::ball(3, 1).unwrap()).unwrap();
        assert_eq!(result.get(&[3, 3, 3]).unwrap(), 5.0);
        assert_eq!(result.get(&[2, 3, 3]).unwrap(), 99.0);
    }

    #[test]
    fn test_dilate_in_place_matches() {
        let mut grid = make_grid(&[6, 6], 0.0);
        grid.set(&[2, 2], 7.0).unwrap();
        let se = StructuringElement::generate(ElementShape::Box, &[1, 2]).unwrap();

        let expected = dilate(&grid, &se).unwrap();
        dilate_in_place(&mut grid, &se).unwrap();
        assert_eq!(grid, expected);
    }

    #[test]
    fn test_dimension_mismatch() {
        let grid = make_grid(&[4, 4], 0.0);
        assert!(dilate(&grid, &StructuringElement::ball(3, 1).unwrap()).is_err());
    }
}
