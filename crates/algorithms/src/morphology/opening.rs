//! Morphological opening (erosion followed by dilation)
//!
//! Removes small foreground structures while preserving the overall shape
//! and size of larger regions.

use voxkit_core::{Result, VoxelGrid};

use super::binary::{binary_dilate, binary_erode};
use super::dilate::dilate;
use super::element::StructuringElement;
use super::erode::erode;

/// Binary opening (MO): binary erosion then binary dilation.
///
/// The result is always a subset of the binarized input; a zero-radius
/// element returns the input unchanged.
pub fn binary_opening(grid: &VoxelGrid, element: &StructuringElement) -> Result<VoxelGrid> {
    if element.is_identity() {
        return Ok(grid.clone());
    }
    let eroded = binary_erode(grid, element)?;
    binary_dilate(&eroded, element)
}

/// Grayscale opening: erosion then dilation with the same element
pub fn opening(grid: &VoxelGrid, element: &StructuringElement) -> Result<VoxelGrid> {
    let eroded = erode(grid, element)?;
    dilate(&eroded, element)
}
