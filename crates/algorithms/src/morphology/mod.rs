//! Mathematical morphology on voxel grids
//!
//! - **Dilation** (GD): maximum filter
//! - **Erosion** (GE): minimum filter
//! - **Binary dilation / erosion** (MD / ME): the same filters on a 0/1 grid
//! - **Opening** (MO): erosion then dilation, removes small foreground
//! - **Closing** (MC): dilation then erosion, fills small holes
//!
//! Neighbors outside the grid are excluded from the max/min.

mod binary;
mod closing;
mod dilate;
mod element;
mod erode;
mod opening;
mod operation;
mod rank;

pub use binary::{binarize, binary_dilate, binary_erode};
pub use closing::{binary_closing, closing};
pub use dilate::{dilate, dilate_in_place};
pub use element::{ElementShape, StructuringElement};
pub use erode::{erode, erode_in_place};
pub use opening::{binary_opening, opening};
pub use operation::{morphology, MorphOp, Morphology, MorphologyParams};
