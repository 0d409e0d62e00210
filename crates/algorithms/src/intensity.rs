//! Intensity transforms: normalization, quantile truncation, sharpening

use crate::maybe_rayon::*;
use voxkit_core::grid::Offset;
use voxkit_core::{Algorithm, Connectivity, Error, Result, VoxelGrid};

/// Affine map of `values` onto [0, 1].
///
/// Fails with `DegenerateRange` when every value is equal.
pub fn rescale_unit(values: &[f64]) -> Result<Vec<f64>> {
    let (min, max) = value_range(values);
    if max == min {
        return Err(Error::DegenerateRange { value: min });
    }
    let span = max - min;
    Ok(values.iter().map(|v| (v - min) / span).collect())
}

fn value_range(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Rescale the grid to [0, 1]
pub fn normalize(grid: &VoxelGrid) -> Result<VoxelGrid> {
    grid.with_values(rescale_unit(&grid.to_vec())?)
}

/// Linearly interpolated quantile of already sorted, NaN-free values
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let frac = pos - lower as f64;
    let (a, b) = (sorted[lower], sorted[upper]);
    if frac == 0.0 || a == b {
        return a;
    }
    let v = a + frac * (b - a);
    // -inf next to +inf
    if v.is_nan() {
        a
    } else {
        v
    }
}

/// Clamp every value to the `[lower, upper]` quantiles of the grid.
///
/// Requires `0 ≤ lower < upper ≤ 1`. NaN voxels are left out of the
/// quantiles and pass through unchanged; a grid with no other values fails
/// with `InvalidInput`.
pub fn truncate_intensity(grid: &VoxelGrid, lower: f64, upper: f64) -> Result<VoxelGrid> {
    if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) || lower >= upper {
        return Err(Error::InvalidParameter {
            name: "quantiles",
            value: format!("({}, {})", lower, upper),
            reason: "expected 0 <= lower < upper <= 1".to_string(),
        });
    }

    let mut sorted: Vec<f64> = grid.data().iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Err(Error::InvalidInput(
            "quantile truncation needs at least one non-NaN voxel".to_string(),
        ));
    }
    sorted.sort_by(f64::total_cmp);
    let lo = quantile(&sorted, lower);
    let hi = quantile(&sorted, upper);

    Ok(grid.map(|v| v.clamp(lo, hi)))
}

/// Laplacian sharpening `f - ∇²f`, rescaled to the input range.
///
/// The Laplacian is the face-neighbor stencil with spacing-scaled weights and
/// mirrored (zero-flux) borders. A constant grid is returned unchanged.
pub fn sharpen(grid: &VoxelGrid) -> Result<VoxelGrid> {
    let src = grid.to_vec();
    let (min, max) = value_range(&src);
    if max == min {
        return Ok(grid.clone());
    }

    let ndim = grid.ndim();
    let indexer = grid.indexer();
    let weights: Vec<(Offset, f64)> = Connectivity::Face
        .offsets(ndim)
        .into_iter()
        .map(|o| {
            let axis = o[..ndim].iter().position(|&d| d != 0).unwrap_or(0);
            let h = grid.spacing()[axis];
            (o, 1.0 / (h * h))
        })
        .collect();

    let sharpened: Vec<f64> = (0..indexer.len())
        .into_par_iter()
        .map(|i| {
            let coords = indexer.unravel(i);
            let u = src[i];
            let lap: f64 = weights
                .iter()
                .map(|(o, w)| w * (src[indexer.neighbor_clamped(&coords, o)] - u))
                .sum();
            u - lap
        })
        .collect();

    let (s_min, s_max) = value_range(&sharpened);
    if s_max == s_min {
        return Ok(grid.clone());
    }
    let scale = (max - min) / (s_max - s_min);
    grid.with_values(sharpened.iter().map(|v| min + (v - s_min) * scale).collect())
}

/// Rescale to [0, 1]; fails on a constant grid
#[derive(Debug, Clone, Default)]
pub struct Normalize;

impl Algorithm for Normalize {
    type Input = VoxelGrid;
    type Output = VoxelGrid;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Normalize"
    }

    fn description(&self) -> &'static str {
        "Affine rescale of intensities to [0, 1]"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        normalize(&input)
    }
}

/// Laplacian sharpening
#[derive(Debug, Clone, Default)]
pub struct Sharpen;

impl Algorithm for Sharpen {
    type Input = VoxelGrid;
    type Output = VoxelGrid;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Sharpen"
    }

    fn description(&self) -> &'static str {
        "Subtract the Laplacian and rescale to the input range"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        sharpen(&input)
    }
}

/// Parameters for quantile truncation
#[derive(Debug, Clone)]
pub struct TruncateParams {
    pub lower_quantile: f64,
    pub upper_quantile: f64,
}

impl Default for TruncateParams {
    fn default() -> Self {
        Self {
            lower_quantile: 0.01,
            upper_quantile: 0.99,
        }
    }
}

/// Quantile truncation algorithm
#[derive(Debug, Clone, Default)]
pub struct TruncateIntensity;

impl Algorithm for TruncateIntensity {
    type Input = VoxelGrid;
    type Output = VoxelGrid;
    type Params = TruncateParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "TruncateImageIntensity"
    }

    fn description(&self) -> &'static str {
        "Clamp intensities to a quantile window"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        truncate_intensity(&input, params.lower_quantile, params.upper_quantile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(n: usize) -> VoxelGrid {
        VoxelGrid::from_vec(&[1, n], (0..n).map(|i| i as f64).collect()).unwrap()
    }

    #[test]
    fn test_normalize() {
        let grid = VoxelGrid::from_vec(&[2, 2], vec![-2.0, 0.0, 2.0, 6.0]).unwrap();
        let n = normalize(&grid).unwrap();
        assert_eq!(n.to_vec(), vec![0.0, 0.25, 0.5, 1.0]);
    }

    #[test]
    fn test_normalize_constant_fails() {
        let grid = VoxelGrid::filled(&[3, 3], 7.0).unwrap();
        assert!(matches!(
            normalize(&grid),
            Err(Error::DegenerateRange { value }) if value == 7.0
        ));
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [0.0, 10.0, 20.0, 30.0];
        assert_relative_eq!(quantile(&sorted, 0.5), 15.0);
        assert_relative_eq!(quantile(&sorted, 1.0), 30.0);
        assert_relative_eq!(quantile(&sorted, 0.0), 0.0);
    }

    #[test]
    fn test_truncate() {
        let t = truncate_intensity(&ramp(11), 0.1, 0.8).unwrap();
        let values = t.to_vec();
        assert_relative_eq!(values[0], 1.0);
        assert_relative_eq!(values[5], 5.0);
        assert_relative_eq!(values[10], 8.0);
    }

    #[test]
    fn test_truncate_skips_nan() {
        let grid = VoxelGrid::from_vec(&[2, 2], vec![1.0, f64::NAN, 3.0, 4.0]).unwrap();
        let values = truncate_intensity(&grid, 0.1, 0.9).unwrap().to_vec();
        assert_relative_eq!(values[0], 1.4);
        assert!(values[1].is_nan());
        assert_relative_eq!(values[2], 3.0);
        assert_relative_eq!(values[3], 3.8);

        let all_nan = VoxelGrid::filled(&[2, 2], f64::NAN).unwrap();
        assert!(matches!(
            truncate_intensity(&all_nan, 0.1, 0.9),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_quantile_with_infinities() {
        assert_eq!(quantile(&[1.0, f64::INFINITY, f64::INFINITY], 0.75), f64::INFINITY);
        assert_eq!(quantile(&[f64::NEG_INFINITY, f64::INFINITY], 0.5), f64::NEG_INFINITY);
    }

    #[test]
    fn test_truncate_rejects_bad_window() {
        assert!(truncate_intensity(&ramp(4), 0.5, 0.5).is_err());
        assert!(truncate_intensity(&ramp(4), -0.1, 0.5).is_err());
        assert!(TruncateIntensity.execute_default(ramp(4)).is_ok());
    }

    #[test]
    fn test_sharpen_keeps_range_and_steepens_edge() {
        let values = (0..20).map(|i| if i % 10 < 5 { 0.0 } else { 1.0 }).collect();
        let grid = VoxelGrid::from_vec(&[2, 10], values).unwrap();
        let s = sharpen(&grid).unwrap();
        let stats = s.statistics();
        assert_relative_eq!(stats.min.unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(stats.max.unwrap(), 1.0, epsilon = 1e-12);
        // overshoot at the edge is folded into the range, so flat regions move inward
        assert!(s.get(&[0, 0]).unwrap() > 0.0);
        assert!(s.get(&[0, 4]).unwrap() < s.get(&[0, 0]).unwrap());
    }

    #[test]
    fn test_sharpen_constant_unchanged() {
        let grid = VoxelGrid::filled(&[3, 3, 3], 2.0).unwrap();
        assert_eq!(sharpen(&grid).unwrap(), grid);
        assert_eq!(Sharpen.execute_default(grid.clone()).unwrap(), grid);
    }

    #[test]
    fn test_normalize_algorithm() {
        let grid = ramp(5);
        assert_eq!(Normalize.execute_default(grid.clone()).unwrap(), normalize(&grid).unwrap());
        assert_eq!(Normalize.name(), "Normalize");
    }
}
