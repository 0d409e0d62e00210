//! Index arithmetic and neighbor enumeration over dense voxel grids

use serde::{Deserialize, Serialize};

/// Largest dimensionality a voxel grid may have
pub const MAX_DIMS: usize = 3;

/// Fixed-size coordinate buffer; only the first `ndim` entries are used
pub type Coords = [usize; MAX_DIMS];

/// Fixed-size offset buffer; only the first `ndim` entries are used
pub type Offset = [isize; MAX_DIMS];

/// Neighbor connectivity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Connectivity {
    /// Neighbors share a face (4 in 2-D, 6 in 3-D)
    #[default]
    Face,
    /// Neighbors share at least a corner (8 in 2-D, 26 in 3-D)
    Full,
}

impl Connectivity {
    /// Neighbor offsets, excluding the center, in raster order
    pub fn offsets(&self, ndim: usize) -> Vec<Offset> {
        let mut offsets = Vec::new();
        let mut current = [0isize; MAX_DIMS];
        collect_unit_offsets(ndim, 0, &mut current, &mut |o| {
            let nonzero = o[..ndim].iter().filter(|&&d| d != 0).count();
            let keep = match self {
                Connectivity::Face => nonzero == 1,
                Connectivity::Full => nonzero > 0,
            };
            if keep {
                offsets.push(*o);
            }
        });
        offsets
    }
}

fn collect_unit_offsets(
    ndim: usize,
    axis: usize,
    current: &mut Offset,
    visit: &mut dyn FnMut(&Offset),
) {
    if axis == ndim {
        visit(current);
        return;
    }
    for d in -1..=1 {
        current[axis] = d;
        collect_unit_offsets(ndim, axis + 1, current, visit);
    }
    current[axis] = 0;
}

/// Row-major (C order) index arithmetic for a grid of given extents.
///
/// The last axis varies fastest, matching ndarray's standard layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indexer {
    ndim: usize,
    extents: Coords,
    strides: Coords,
    len: usize,
}

impl Indexer {
    /// Build an indexer; `extents` must have between 1 and `MAX_DIMS` entries
    pub fn new(extents: &[usize]) -> Self {
        let ndim = extents.len().min(MAX_DIMS);
        let mut ext = [1usize; MAX_DIMS];
        ext[..ndim].copy_from_slice(&extents[..ndim]);

        let mut strides = [0usize; MAX_DIMS];
        let mut stride = 1;
        for axis in (0..ndim).rev() {
            strides[axis] = stride;
            stride *= ext[axis];
        }

        Self {
            ndim,
            extents: ext,
            strides,
            len: stride,
        }
    }

    /// Number of axes
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Total number of voxels
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the grid has no voxels
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Extent along `axis`
    pub fn extent(&self, axis: usize) -> usize {
        self.extents[axis]
    }

    /// Linear stride of `axis`
    pub fn stride(&self, axis: usize) -> usize {
        self.strides[axis]
    }

    /// Linear index of in-bounds coordinates
    pub fn linear(&self, coords: &[usize]) -> usize {
        coords[..self.ndim]
            .iter()
            .zip(&self.strides)
            .map(|(c, s)| c * s)
            .sum()
    }

    /// Coordinates of a linear index
    pub fn unravel(&self, mut linear: usize) -> Coords {
        let mut coords = [0usize; MAX_DIMS];
        for axis in 0..self.ndim {
            coords[axis] = linear / self.strides[axis];
            linear %= self.strides[axis];
        }
        coords
    }

    /// Linear index of `coords + offset`, or `None` if that falls outside the grid
    pub fn neighbor(&self, coords: &Coords, offset: &Offset) -> Option<usize> {
        let mut linear = 0usize;
        for axis in 0..self.ndim {
            let c = coords[axis] as isize + offset[axis];
            if c < 0 || c >= self.extents[axis] as isize {
                return None;
            }
            linear += c as usize * self.strides[axis];
        }
        Some(linear)
    }

    /// Linear index of `coords + offset` with coordinates clamped to the grid
    pub fn neighbor_clamped(&self, coords: &Coords, offset: &Offset) -> usize {
        let mut linear = 0usize;
        for axis in 0..self.ndim {
            let max = self.extents[axis] as isize - 1;
            let c = (coords[axis] as isize + offset[axis]).clamp(0, max);
            linear += c as usize * self.strides[axis];
        }
        linear
    }

    /// Whether the voxel lies on the outer face of the grid
    pub fn on_border(&self, coords: &Coords) -> bool {
        (0..self.ndim).any(|axis| coords[axis] == 0 || coords[axis] + 1 == self.extents[axis])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_offsets() {
        assert_eq!(Connectivity::Face.offsets(2).len(), 4);
        assert_eq!(Connectivity::Full.offsets(2).len(), 8);
        assert_eq!(Connectivity::Face.offsets(3).len(), 6);
        assert_eq!(Connectivity::Full.offsets(3).len(), 26);
    }

    #[test]
    fn test_linear_unravel_roundtrip() {
        let indexer = Indexer::new(&[3, 4, 5]);
        assert_eq!(indexer.len(), 60);
        assert_eq!(indexer.stride(0), 20);
        assert_eq!(indexer.stride(2), 1);
        for linear in 0..indexer.len() {
            let coords = indexer.unravel(linear);
            assert_eq!(indexer.linear(&coords), linear);
        }
    }

    #[test]
    fn test_neighbor_bounds() {
        let indexer = Indexer::new(&[4, 4]);
        let corner = [0, 0, 0];
        assert_eq!(indexer.neighbor(&corner, &[-1, 0, 0]), None);
        assert_eq!(indexer.neighbor(&corner, &[1, 1, 0]), Some(5));
        assert_eq!(indexer.neighbor_clamped(&corner, &[-1, -1, 0]), 0);
        assert!(indexer.on_border(&corner));
        assert!(!indexer.on_border(&[1, 2, 0]));
    }
}
