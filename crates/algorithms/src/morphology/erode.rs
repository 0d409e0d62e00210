//! Grayscale erosion (minimum filter)
//!
//! Replaces each voxel with the minimum value in its structuring element
//! neighborhood. Shrinks bright regions and enlarges dark regions.

use voxkit_core::{Result, VoxelGrid};

use super::element::StructuringElement;
use super::rank::{rank_filter, rank_values, Rank};

/// Perform grayscale erosion (GE)
///
/// Each output voxel is the minimum value within the structuring element
/// neighborhood; neighbors outside the grid are excluded.
///
/// # Arguments
/// * `grid` - Input grid
/// * `element` - Structuring element with the grid's dimensionality
pub fn erode(grid: &VoxelGrid, element: &StructuringElement) -> Result<VoxelGrid> {
    rank_filter(grid, element, Rank::Min)
}

/// Grayscale erosion that overwrites `grid`.
///
/// Side effect: the values of `grid` are replaced; extents and geometry are
/// untouched.
pub fn erode_in_place(grid: &mut VoxelGrid, element: &StructuringElement) -> Result<()> {
    let values = rank_values(grid, element, Rank::Min)?;
    grid.overwrite(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morphology::dilate;

    #[test]
    fn test_erode_picks_minimum() {
        let mut grid = VoxelGrid::filled(&[7, 7], 5.0).unwrap();
        grid.set(&[3, 4], 1.0).unwrap();

        let result = erode(&grid, &StructuringElement::cube(2, 1).unwrap()).unwrap();
        assert_eq!(result.get(&[3, 3]).unwrap(), 1.0);
        assert_eq!(result.get(&[3, 2]).unwrap(), 5.0);
    }

    #[test]
    fn test_erode_border_excludes_outside() {
        let grid = VoxelGrid::filled(&[4, 4, 4], 8.0).unwrap();
        let result = erode(&grid, &StructuringElement::ball(3, 2).unwrap()).unwrap();
        assert!(result.to_vec().iter().all(|&v| v == 8.0));
    }

    #[test]
    fn test_duality_with_dilation() {
        let values: Vec<f64> = (0..48).map(|i| ((i * 37) % 11) as f64 - 4.0).collect();
        let grid = VoxelGrid::from_vec(&[6, 8], values).unwrap();
        let se = StructuringElement::ball(2, 2).unwrap();

        let eroded = erode(&grid, &se).unwrap();
        let dual = dilate(&grid.map(|v| -v), &se).unwrap().map(|v| -v);
        assert_eq!(eroded, dual);
    }

    #[test]
    fn test_erode_in_place() {
        let mut grid = VoxelGrid::from_vec(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        erode_in_place(&mut grid, &StructuringElement::cube(2, 1).unwrap()).unwrap();
        assert_eq!(grid.to_vec(), vec![1.0, 1.0, 2.0, 1.0, 1.0, 2.0]);
    }
}
