//! # voxkit algorithms
//!
//! Filters over 2-D and 3-D voxel grids and the pipeline that chains them.
//!
//! ## Available Filter Families
//!
//! - **morphology**: Grayscale and binary dilation, erosion, opening, closing
//! - **distance**: Maurer signed distance, Danielsson distance map
//! - **diffusion**: Perona-Malik anisotropic smoothing
//! - **derivative**: Gradient magnitude and Laplacian of Gaussian
//! - **pad**: Constant padding and symmetric cropping
//! - **components**: Connected components, largest component, hole filling
//! - **intensity**: Normalization, quantile truncation, sharpening
//! - **pipeline**: Ordered stage lists, built by name, script or JSON

pub(crate) mod maybe_rayon;

pub mod components;
pub mod derivative;
pub mod diffusion;
pub mod distance;
pub mod intensity;
pub mod morphology;
pub mod pad;
pub mod pipeline;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::components::{
        fill_holes, label_components, largest_component, FillHoles, LargestComponent,
    };
    pub use crate::derivative::{
        gradient_magnitude, laplacian, DerivativeParams, GradientMagnitude, Laplacian,
    };
    pub use crate::diffusion::{
        perona_malik, perona_malik_in_place, PeronaMalik, PeronaMalikParams, StopToken,
    };
    pub use crate::distance::{
        danielsson_distance, maurer_distance, DistanceMethod, DistanceParams,
        DistanceTransform, EmptyPolicy,
    };
    pub use crate::intensity::{
        normalize, sharpen, truncate_intensity, Normalize, Sharpen, TruncateIntensity,
    };
    pub use crate::morphology::{
        binary_closing, binary_dilate, binary_erode, binary_opening, closing, dilate,
        dilate_in_place, erode, erode_in_place, morphology, opening, ElementShape, MorphOp,
        Morphology, MorphologyParams, StructuringElement,
    };
    pub use crate::pad::{pad_image, PadImage, PadParams};
    pub use crate::pipeline::{FilterStage, Pipeline, OPERATIONS};
    pub use voxkit_core::prelude::*;
}
