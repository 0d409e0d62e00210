//! Voxel grid data structures and index arithmetic

mod element;
mod geometry;
mod neighborhood;
mod voxel;

pub use element::VoxelElement;
pub use geometry::ImageGeometry;
pub use neighborhood::{Connectivity, Coords, Indexer, Offset, MAX_DIMS};
pub use voxel::{GridStatistics, VoxelGrid};
