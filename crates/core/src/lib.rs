//! # voxkit core
//!
//! Core types and traits for the voxkit filter library.
//!
//! This crate provides:
//! - `VoxelGrid<T>`: dense 2-D/3-D sample grid with physical metadata
//! - `ImageGeometry`: spacing, origin and direction cosines
//! - `Indexer` and `Connectivity`: neighbor arithmetic shared by filters
//! - The `Algorithm` trait every filter family implements

pub mod error;
pub mod grid;

pub use error::{Error, Result};
pub use grid::{Connectivity, ImageGeometry, Indexer, VoxelElement, VoxelGrid};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::grid::{Connectivity, ImageGeometry, VoxelElement, VoxelGrid};
    pub use crate::Algorithm;
}

/// Core trait for all filter algorithms in voxkit.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
