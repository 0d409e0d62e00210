//! Distance transforms of binary masks
//!
//! - **Maurer**: exact signed Euclidean distance, separable lower-envelope passes
//! - **Danielsson**: unsigned vector-propagation approximation
//!
//! Both treat every non-zero voxel as foreground.

mod danielsson;
mod maurer;

pub use danielsson::danielsson_distance;
pub use maurer::{euclidean_distance, maurer_distance};

use serde::{Deserialize, Serialize};
use voxkit_core::{Algorithm, Error, Result, VoxelGrid};

/// What to do when the mask has no foreground (or no background) voxel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmptyPolicy {
    /// Fail with `InvalidInput`
    #[default]
    Fail,
    /// Fill the undefined distances with infinity
    Infinity,
}

/// Distance transform method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMethod {
    #[default]
    Maurer,
    Danielsson,
}

/// Parameters for the distance transform
#[derive(Debug, Clone)]
pub struct DistanceParams {
    pub method: DistanceMethod,
    /// Measure in physical units instead of voxels
    pub use_spacing: bool,
    pub empty: EmptyPolicy,
}

impl Default for DistanceParams {
    fn default() -> Self {
        Self {
            method: DistanceMethod::Maurer,
            use_spacing: true,
            empty: EmptyPolicy::Fail,
        }
    }
}

/// Distance transform algorithm
#[derive(Debug, Clone, Default)]
pub struct DistanceTransform;

impl Algorithm for DistanceTransform {
    type Input = VoxelGrid;
    type Output = VoxelGrid;
    type Params = DistanceParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "DistanceTransform"
    }

    fn description(&self) -> &'static str {
        "Euclidean distance of every voxel to the foreground/background boundary"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        match params.method {
            DistanceMethod::Maurer => maurer_distance(&input, params.use_spacing, params.empty),
            DistanceMethod::Danielsson => danielsson_distance(&input, params.use_spacing, params.empty),
        }
    }
}

pub(crate) enum Occupancy {
    Mixed,
    NoForeground,
    NoBackground,
}

/// Classify the mask; degenerate masks fail under `EmptyPolicy::Fail`
pub(crate) fn check_classes(grid: &VoxelGrid, policy: EmptyPolicy) -> Result<Occupancy> {
    let foreground = grid.foreground_count();
    let occupancy = if foreground == 0 {
        Occupancy::NoForeground
    } else if foreground == grid.len() {
        Occupancy::NoBackground
    } else {
        Occupancy::Mixed
    };

    match (&occupancy, policy) {
        (Occupancy::NoForeground, EmptyPolicy::Fail) => Err(Error::InvalidInput(
            "distance transform needs at least one foreground voxel".to_string(),
        )),
        (Occupancy::NoBackground, EmptyPolicy::Fail) => Err(Error::InvalidInput(
            "distance transform needs at least one background voxel".to_string(),
        )),
        _ => Ok(occupancy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn brute_force(grid: &VoxelGrid) -> Vec<f64> {
        let indexer = grid.indexer();
        let values = grid.to_vec();
        (0..values.len())
            .map(|i| {
                let p = indexer.unravel(i);
                let inside = values[i] != 0.0;
                let nearest = (0..values.len())
                    .filter(|&j| (values[j] != 0.0) != inside)
                    .map(|j| {
                        let q = indexer.unravel(j);
                        let dr = p[0] as f64 - q[0] as f64;
                        let dc = p[1] as f64 - q[1] as f64;
                        (dr * dr + dc * dc).sqrt()
                    })
                    .fold(f64::INFINITY, f64::min);
                if inside { -nearest } else { nearest }
            })
            .collect()
    }

    fn blob() -> VoxelGrid {
        let pattern = [
            "........",
            "..##....",
            ".####...",
            ".#####..",
            "..###.#.",
            "......##",
            "........",
            "#.......",
        ];
        let values = pattern
            .iter()
            .flat_map(|row| row.chars().map(|c| if c == '#' { 1.0 } else { 0.0 }))
            .collect();
        VoxelGrid::from_vec(&[8, 8], values).unwrap()
    }

    #[test]
    fn test_maurer_matches_brute_force() {
        let grid = blob();
        let d = DistanceTransform.execute_default(grid.clone()).unwrap();
        for (got, want) in d.to_vec().iter().zip(brute_force(&grid)) {
            assert_relative_eq!(*got, want, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_danielsson_bounds_exact() {
        let grid = blob();
        let params = DistanceParams {
            method: DistanceMethod::Danielsson,
            ..Default::default()
        };
        let d = DistanceTransform.execute(grid.clone(), params).unwrap();
        for (got, want) in d.to_vec().iter().zip(brute_force(&grid)) {
            if want <= 0.0 {
                assert!(*got >= -want - 1e-9);
            } else {
                assert_eq!(*got, 0.0);
            }
        }
    }

    #[test]
    fn test_no_background_policy() {
        let grid = VoxelGrid::filled(&[3, 3, 3], 2.0).unwrap();
        assert!(DistanceTransform.execute_default(grid.clone()).is_err());

        let params = DistanceParams {
            method: DistanceMethod::Danielsson,
            empty: EmptyPolicy::Infinity,
            ..Default::default()
        };
        let d = DistanceTransform.execute(grid, params).unwrap();
        assert!(d.to_vec().iter().all(|v| v.is_infinite() && *v > 0.0));
    }
}
