//! Morphology operation selector and `Algorithm` entry point

use serde::{Deserialize, Serialize};
use voxkit_core::{Algorithm, Error, Result, VoxelGrid};

use super::binary::{binary_dilate, binary_erode};
use super::closing::{binary_closing, closing};
use super::dilate::dilate;
use super::element::{ElementShape, StructuringElement};
use super::erode::erode;
use super::opening::{binary_opening, opening};

/// Morphological operation family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MorphOp {
    /// Grayscale dilation (GD)
    #[default]
    GrayscaleDilate,
    /// Grayscale erosion (GE)
    GrayscaleErode,
    /// Grayscale erosion then dilation
    GrayscaleOpen,
    /// Grayscale dilation then erosion
    GrayscaleClose,
    /// Binary dilation (MD)
    BinaryDilate,
    /// Binary erosion (ME)
    BinaryErode,
    /// Binary opening (MO)
    BinaryOpen,
    /// Binary closing (MC)
    BinaryClose,
}

/// Apply `op` with an explicit structuring element
pub fn morphology(grid: &VoxelGrid, op: MorphOp, element: &StructuringElement) -> Result<VoxelGrid> {
    match op {
        MorphOp::GrayscaleDilate => dilate(grid, element),
        MorphOp::GrayscaleErode => erode(grid, element),
        MorphOp::GrayscaleOpen => opening(grid, element),
        MorphOp::GrayscaleClose => closing(grid, element),
        MorphOp::BinaryDilate => binary_dilate(grid, element),
        MorphOp::BinaryErode => binary_erode(grid, element),
        MorphOp::BinaryOpen => binary_opening(grid, element),
        MorphOp::BinaryClose => binary_closing(grid, element),
    }
}

/// Parameters for a morphology stage
#[derive(Debug, Clone)]
pub struct MorphologyParams {
    /// Which operation to run
    pub op: MorphOp,
    /// Element shape
    pub shape: ElementShape,
    /// Radius applied to every axis; must be non-negative
    pub radius: i64,
}

impl Default for MorphologyParams {
    fn default() -> Self {
        Self {
            op: MorphOp::default(),
            shape: ElementShape::Ball,
            radius: 1,
        }
    }
}

/// Morphology algorithm
#[derive(Debug, Clone, Default)]
pub struct Morphology;

impl Algorithm for Morphology {
    type Input = VoxelGrid;
    type Output = VoxelGrid;
    type Params = MorphologyParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Morphology"
    }

    fn description(&self) -> &'static str {
        "Grayscale or binary dilation, erosion, opening and closing"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let radius = vec![params.radius; input.ndim()];
        let element = StructuringElement::for_extents(params.shape, &radius, input.extents())?;
        morphology(&input, params.op, &element)
    }
}
