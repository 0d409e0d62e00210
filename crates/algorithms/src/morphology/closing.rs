//! Morphological closing (dilation followed by erosion)
//!
//! Fills small holes and gaps while preserving the overall shape of larger
//! background structures.

use voxkit_core::{Result, VoxelGrid};

use super::binary::{binary_dilate, binary_erode};
use super::dilate::dilate;
use super::element::StructuringElement;
use super::erode::erode;

/// Binary closing (MC): binary dilation then binary erosion.
///
/// The result is always a superset of the binarized input; a zero-radius
/// element returns the input unchanged.
pub fn binary_closing(grid: &VoxelGrid, element: &StructuringElement) -> Result<VoxelGrid> {
    if element.is_identity() {
        return Ok(grid.clone());
    }
    let dilated = binary_dilate(grid, element)?;
    binary_erode(&dilated, element)
}

/// Grayscale closing: dilation then erosion with the same element
pub fn closing(grid: &VoxelGrid, element: &StructuringElement) -> Result<VoxelGrid> {
    let dilated = dilate(grid, element)?;
    erode(&dilated, element)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closing_fills_dark_spot() {
        let mut grid = VoxelGrid::filled(&[9, 9, 9], 50.0).unwrap();
        grid.set(&[4, 4, 4], 1.0).unwrap();

        let result = closing(&grid, &StructuringElement::ball(3, 1).unwrap()).unwrap();
        assert_eq!(result.get(&[4, 4, 4]).unwrap(), 50.0);
    }

    #[test]
    fn test_binary_closing_fills_gap() {
        // Two bars separated by a one-voxel gap
        let mut grid = VoxelGrid::filled(&[5, 7], 0.0).unwrap();
        for c in 0..7 {
            if c != 3 {
                grid.set(&[2, c], 1.0).unwrap();
            }
        }

        let result = binary_closing(&grid, &StructuringElement::cube(2, 1).unwrap()).unwrap();
        assert_eq!(result.get(&[2, 3]).unwrap(), 1.0);
        assert_eq!(result.get(&[0, 3]).unwrap(), 0.0);
    }
}
