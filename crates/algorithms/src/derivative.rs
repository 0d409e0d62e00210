//! Gaussian derivative filters: gradient magnitude and Laplacian
//!
//! Separable sampled-Gaussian kernels truncated at 4σ or at the grid extent,
//! whichever is shorter, with coordinates clamped at the grid border. The derivative kernels are moment-corrected
//! so that a linear ramp gives its exact slope and a quadratic its exact
//! curvature away from the border.

use tracing::warn;

use crate::intensity::rescale_unit;
use crate::maybe_rayon::*;
use voxkit_core::grid::MAX_DIMS;
use voxkit_core::{Algorithm, Error, Indexer, Result, VoxelGrid};

/// Kernels are truncated at this many standard deviations
const TRUNCATE: f64 = 4.0;

/// Parameters for the Gaussian derivative filters
#[derive(Debug, Clone)]
pub struct DerivativeParams {
    /// Gaussian scale in physical units (default 1.0)
    pub sigma: f64,
    /// Rescale the response to [0, 1]
    pub normalize: bool,
}

impl Default for DerivativeParams {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            normalize: false,
        }
    }
}

/// Gradient magnitude of Gaussian
#[derive(Debug, Clone, Default)]
pub struct GradientMagnitude;

impl Algorithm for GradientMagnitude {
    type Input = VoxelGrid;
    type Output = VoxelGrid;
    type Params = DerivativeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Grad"
    }

    fn description(&self) -> &'static str {
        "Gradient magnitude of the Gaussian-smoothed image"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        gradient_magnitude(&input, params.sigma, params.normalize)
    }
}

/// Laplacian of Gaussian
#[derive(Debug, Clone, Default)]
pub struct Laplacian;

impl Algorithm for Laplacian {
    type Input = VoxelGrid;
    type Output = VoxelGrid;
    type Params = DerivativeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Laplacian"
    }

    fn description(&self) -> &'static str {
        "Sum of second derivatives of the Gaussian-smoothed image"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        laplacian(&input, params.sigma, params.normalize)
    }
}

/// `‖∇(G_σ * f)‖`
pub fn gradient_magnitude(grid: &VoxelGrid, sigma: f64, normalize: bool) -> Result<VoxelGrid> {
    let kernels = axis_kernels(grid, sigma)?;
    let indexer = grid.indexer();
    let src = grid.to_vec();

    let mut sum_sq = vec![0.0; src.len()];
    for axis in 0..grid.ndim() {
        let response = separable(&src, &indexer, &kernels, axis, |k| &k.first);
        for (acc, v) in sum_sq.iter_mut().zip(response) {
            *acc += v * v;
        }
    }
    let values: Vec<f64> = sum_sq.into_iter().map(f64::sqrt).collect();

    finish(grid, values, normalize, "Grad")
}

/// `Σ ∂²(G_σ * f)/∂x_a²`
pub fn laplacian(grid: &VoxelGrid, sigma: f64, normalize: bool) -> Result<VoxelGrid> {
    let kernels = axis_kernels(grid, sigma)?;
    let indexer = grid.indexer();
    let src = grid.to_vec();

    let mut values = vec![0.0; src.len()];
    for axis in 0..grid.ndim() {
        let response = separable(&src, &indexer, &kernels, axis, |k| &k.second);
        for (acc, v) in values.iter_mut().zip(response) {
            *acc += v;
        }
    }

    finish(grid, values, normalize, "Laplacian")
}

/// Optional [0, 1] rescale; a flat response becomes the zero field.
fn finish(grid: &VoxelGrid, values: Vec<f64>, normalize: bool, operation: &str) -> Result<VoxelGrid> {
    if !normalize {
        return grid.with_values(values);
    }
    match rescale_unit(&values) {
        Ok(scaled) => grid.with_values(scaled),
        Err(Error::DegenerateRange { value }) => {
            warn!(operation, value, "flat response cannot be normalized, returning zero field");
            Ok(grid.like(0.0))
        }
        Err(e) => Err(e),
    }
}

/// Sampled kernels for one axis
#[derive(Debug, Clone)]
struct AxisKernels {
    smooth: Vec<f64>,
    first: Vec<f64>,
    second: Vec<f64>,
}

impl AxisKernels {
    fn new(sigma: f64, h: f64, extent: usize) -> Self {
        let radius = (TRUNCATE * sigma / h).ceil().min(extent as f64).max(1.0) as isize;
        let taps: Vec<f64> = (-radius..=radius).map(|j| j as f64).collect();
        let gauss: Vec<f64> = taps
            .iter()
            .map(|&j| {
                let x = j * h / sigma;
                (-0.5 * x * x).exp()
            })
            .collect();

        let g_sum: f64 = gauss.iter().sum();
        let smooth = gauss.iter().map(|g| g / g_sum).collect();

        let j2g: f64 = taps.iter().zip(&gauss).map(|(j, g)| j * j * g).sum();
        let first = taps
            .iter()
            .zip(&gauss)
            .map(|(j, g)| j * g / j2g / h)
            .collect();

        let mean_j2 = j2g / g_sum;
        let raw: Vec<f64> = taps
            .iter()
            .zip(&gauss)
            .map(|(j, g)| (j * j - mean_j2) * g)
            .collect();
        let moment: f64 = taps.iter().zip(&raw).map(|(j, w)| w * j * j).sum();
        let second = raw.iter().map(|w| 2.0 * w / moment / (h * h)).collect();

        Self {
            smooth,
            first,
            second,
        }
    }

    fn radius(&self) -> isize {
        (self.smooth.len() / 2) as isize
    }
}

fn axis_kernels(grid: &VoxelGrid, sigma: f64) -> Result<Vec<AxisKernels>> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(Error::InvalidParameter {
            name: "sigma",
            value: sigma.to_string(),
            reason: "must be a positive finite number".to_string(),
        });
    }
    Ok(grid
        .spacing()
        .iter()
        .zip(grid.extents())
        .map(|(&h, &extent)| AxisKernels::new(sigma, h, extent))
        .collect())
}

/// Apply `pick(kernel)` along `deriv_axis` and the smoothing kernel along
/// every other axis.
fn separable<'a>(
    src: &[f64],
    indexer: &Indexer,
    kernels: &'a [AxisKernels],
    deriv_axis: usize,
    pick: impl Fn(&'a AxisKernels) -> &'a Vec<f64>,
) -> Vec<f64> {
    let mut current = src.to_vec();
    for (axis, k) in kernels.iter().enumerate() {
        let taps = if axis == deriv_axis { pick(k) } else { &k.smooth };
        current = correlate_axis(&current, indexer, axis, taps, k.radius());
    }
    current
}

/// 1-D correlation along `axis` with clamped coordinates
fn correlate_axis(src: &[f64], indexer: &Indexer, axis: usize, taps: &[f64], radius: isize) -> Vec<f64> {
    (0..indexer.len())
        .into_par_iter()
        .map(|i| {
            let coords = indexer.unravel(i);
            let mut offset = [0isize; MAX_DIMS];
            taps.iter()
                .enumerate()
                .map(|(t, w)| {
                    offset[axis] = t as isize - radius;
                    w * src[indexer.neighbor_clamped(&coords, &offset)]
                })
                .sum()
        })
        .collect()
}
