//! Physical-space geometry of a voxel grid

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tolerance used when checking that direction cosines are orthonormal
const ORTHONORMAL_TOLERANCE: f64 = 1e-6;

/// Mapping between voxel indices and physical coordinates.
///
/// ```text
/// point = origin + direction · (index ⊙ spacing)
/// ```
///
/// `direction` is stored row-major; column `j` is the physical direction of
/// index axis `j`. It must be orthonormal, so its inverse is its transpose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGeometry {
    spacing: Vec<f64>,
    origin: Vec<f64>,
    direction: Vec<f64>,
}

impl ImageGeometry {
    /// Create a validated geometry.
    ///
    /// Fails with `InvalidParameter` when lengths disagree, any spacing is not
    /// a positive finite number, or the direction matrix is not orthonormal.
    pub fn new(spacing: Vec<f64>, origin: Vec<f64>, direction: Vec<f64>) -> Result<Self> {
        let ndim = spacing.len();
        if origin.len() != ndim {
            return Err(Error::InvalidParameter {
                name: "origin",
                value: format!("{:?}", origin),
                reason: format!("expected {} coordinates", ndim),
            });
        }
        if direction.len() != ndim * ndim {
            return Err(Error::InvalidParameter {
                name: "direction",
                value: format!("{} entries", direction.len()),
                reason: format!("expected a {}x{} matrix", ndim, ndim),
            });
        }
        if let Some(&s) = spacing.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            return Err(Error::InvalidParameter {
                name: "spacing",
                value: s.to_string(),
                reason: "spacing must be positive and finite".to_string(),
            });
        }
        if origin.iter().any(|o| !o.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "origin",
                value: format!("{:?}", origin),
                reason: "origin must be finite".to_string(),
            });
        }

        let geometry = Self {
            spacing,
            origin,
            direction,
        };
        if !geometry.is_orthonormal() {
            return Err(Error::InvalidParameter {
                name: "direction",
                value: format!("{:?}", geometry.direction),
                reason: "direction cosines must be orthonormal".to_string(),
            });
        }
        Ok(geometry)
    }

    /// Unit spacing, zero origin, identity direction
    pub fn identity(ndim: usize) -> Self {
        let mut direction = vec![0.0; ndim * ndim];
        for i in 0..ndim {
            direction[i * ndim + i] = 1.0;
        }
        Self {
            spacing: vec![1.0; ndim],
            origin: vec![0.0; ndim],
            direction,
        }
    }

    /// Identity direction with the given spacing and origin
    pub fn with_spacing_origin(spacing: Vec<f64>, origin: Vec<f64>) -> Result<Self> {
        let identity = Self::identity(spacing.len());
        Self::new(spacing, origin, identity.direction)
    }

    /// Number of axes
    pub fn ndim(&self) -> usize {
        self.spacing.len()
    }

    /// Physical distance between neighboring voxels along each axis
    pub fn spacing(&self) -> &[f64] {
        &self.spacing
    }

    /// Physical position of index zero
    pub fn origin(&self) -> &[f64] {
        &self.origin
    }

    /// Row-major direction cosine matrix
    pub fn direction(&self) -> &[f64] {
        &self.direction
    }

    /// Direction matrix entry at (row, col)
    pub fn direction_at(&self, row: usize, col: usize) -> f64 {
        self.direction[row * self.ndim() + col]
    }

    /// Smallest spacing over all axes
    pub fn min_spacing(&self) -> f64 {
        self.spacing.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Convert a (possibly fractional or negative) index to a physical point
    pub fn index_to_physical(&self, index: &[f64]) -> Vec<f64> {
        let n = self.ndim();
        (0..n)
            .map(|row| {
                self.origin[row]
                    + (0..n)
                        .map(|col| self.direction_at(row, col) * index[col] * self.spacing[col])
                        .sum::<f64>()
            })
            .collect()
    }

    /// Convert a physical point to a continuous index
    pub fn physical_to_index(&self, point: &[f64]) -> Vec<f64> {
        let n = self.ndim();
        (0..n)
            .map(|col| {
                let projected: f64 = (0..n)
                    .map(|row| self.direction_at(row, col) * (point[row] - self.origin[row]))
                    .sum();
                projected / self.spacing[col]
            })
            .collect()
    }

    /// Same spacing and direction, with the origin moved to the physical
    /// position of `index` in the current geometry.
    pub fn reanchored(&self, index: &[f64]) -> Self {
        Self {
            spacing: self.spacing.clone(),
            origin: self.index_to_physical(index),
            direction: self.direction.clone(),
        }
    }

    fn is_orthonormal(&self) -> bool {
        let n = self.ndim();
        (0..n).all(|i| {
            (0..n).all(|j| {
                let dot: f64 = (0..n)
                    .map(|k| self.direction_at(k, i) * self.direction_at(k, j))
                    .sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                (dot - expected).abs() < ORTHONORMAL_TOLERANCE
            })
        })
    }
}
