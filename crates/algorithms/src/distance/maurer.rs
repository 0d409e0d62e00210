//! Exact Euclidean signed distance transform
//!
//! Separable squared-distance transform: one 1-D lower-envelope pass per
//! axis (Maurer et al. 2003; Felzenszwalb & Huttenlocher 2012). Each pass is
//! linear in the lane length, so the whole transform is O(N·D).
//!
//! Reference:
//! Maurer, C.R., Qi, R., Raghavan, V. (2003). A linear time algorithm for
//!   computing exact Euclidean distance transforms of binary images in
//!   arbitrary dimensions. IEEE TPAMI 25(2).

use ndarray::{ArrayD, Axis};

use crate::maybe_rayon::*;
use voxkit_core::{Result, VoxelGrid};

use super::{check_classes, EmptyPolicy, Occupancy};

/// Signed Euclidean distance (MaurerDistance).
///
/// Foreground (`!= 0`) voxels get minus the distance to the nearest
/// background voxel; background voxels get plus the distance to the nearest
/// foreground voxel. Distances are physical when `use_spacing` is set,
/// otherwise in voxel units.
pub fn maurer_distance(grid: &VoxelGrid, use_spacing: bool, empty: EmptyPolicy) -> Result<VoxelGrid> {
    let spacing = axis_spacing(grid, use_spacing);

    match check_classes(grid, empty)? {
        Occupancy::NoForeground => return Ok(grid.like(f64::INFINITY)),
        Occupancy::NoBackground => return Ok(grid.like(f64::NEG_INFINITY)),
        Occupancy::Mixed => {}
    }

    let to_foreground = squared_edt(grid, &spacing, |v| v != 0.0);
    let to_background = squared_edt(grid, &spacing, |v| v == 0.0);

    let values: Vec<f64> = grid
        .data()
        .iter()
        .zip(to_foreground.iter().zip(to_background.iter()))
        .map(|(&v, (&d_fg, &d_bg))| if v != 0.0 { -d_bg.sqrt() } else { d_fg.sqrt() })
        .collect();

    grid.with_values(values)
}

/// Unsigned exact Euclidean distance to the nearest voxel for which `is_site`
/// holds; sites themselves are 0.
pub fn euclidean_distance<F>(grid: &VoxelGrid, use_spacing: bool, is_site: F) -> Result<VoxelGrid>
where
    F: Fn(f64) -> bool,
{
    let spacing = axis_spacing(grid, use_spacing);
    let field = squared_edt(grid, &spacing, is_site);
    grid.with_values(field.iter().map(|d| d.sqrt()).collect())
}

fn axis_spacing(grid: &VoxelGrid, use_spacing: bool) -> Vec<f64> {
    if use_spacing {
        grid.spacing().to_vec()
    } else {
        vec![1.0; grid.ndim()]
    }
}

/// Squared distance field to the nearest site; `+∞` where there is no site
fn squared_edt<F>(grid: &VoxelGrid, spacing: &[f64], is_site: F) -> ArrayD<f64>
where
    F: Fn(f64) -> bool,
{
    let mut field = grid
        .data()
        .mapv(|v| if is_site(v) { 0.0 } else { f64::INFINITY });

    for (axis, &h) in spacing.iter().enumerate() {
        let lanes: Vec<_> = field.lanes_mut(Axis(axis)).into_iter().collect();
        lanes.into_par_iter().for_each(|mut lane| {
            let f: Vec<f64> = lane.iter().copied().collect();
            let out = lower_envelope(&f, h);
            for (dst, v) in lane.iter_mut().zip(out) {
                *dst = v;
            }
        });
    }

    field
}

/// 1-D squared distance transform of sampled function `f` with sample spacing `h`.
///
/// `d(q) = min_p ((q - p)·h)² + f(p)`, computed as the lower envelope of
/// parabolas rooted at the finite samples.
fn lower_envelope(f: &[f64], h: f64) -> Vec<f64> {
    let n = f.len();
    // roots of the envelope parabolas and their left boundaries
    let mut roots: Vec<usize> = Vec::with_capacity(n);
    let mut bounds: Vec<f64> = Vec::with_capacity(n);

    for q in 0..n {
        if !f[q].is_finite() {
            continue;
        }
        let xq = q as f64 * h;
        while let Some(&p) = roots.last() {
            let xp = p as f64 * h;
            let s = ((f[q] + xq * xq) - (f[p] + xp * xp)) / (2.0 * (xq - xp));
            let left = bounds.last().copied().unwrap_or(f64::NEG_INFINITY);
            if s <= left {
                roots.pop();
                bounds.pop();
            } else {
                roots.push(q);
                bounds.push(s);
                break;
            }
        }
        if roots.is_empty() {
            roots.push(q);
            bounds.push(f64::NEG_INFINITY);
        }
    }

    if roots.is_empty() {
        return vec![f64::INFINITY; n];
    }

    let mut out = Vec::with_capacity(n);
    let mut k = 0;
    for q in 0..n {
        let xq = q as f64 * h;
        while k + 1 < roots.len() && bounds[k + 1] < xq {
            k += 1;
        }
        let xp = roots[k] as f64 * h;
        out.push((xq - xp) * (xq - xp) + f[roots[k]]);
    }
    out
}
