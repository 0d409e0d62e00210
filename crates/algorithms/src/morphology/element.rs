//! Structuring element definitions for morphological operations
//!
//! A structuring element defines the neighborhood shape used in
//! erosion, dilation, and derived transforms.

use serde::{Deserialize, Serialize};
use voxkit_core::grid::{Offset, MAX_DIMS};
use voxkit_core::{Error, Result};

/// Shape of a structuring element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ElementShape {
    /// Offsets inside the ellipsoid `Σ (o_i / r_i)² ≤ 1`
    #[default]
    Ball,
    /// Offsets with `|o_i| ≤ r_i` on every axis
    Box,
}

/// Neighborhood offsets for a shape and per-axis radius.
///
/// The offset set is symmetric about the origin and always contains it;
/// a zero radius on every axis yields the singleton `{origin}`.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuringElement {
    shape: ElementShape,
    radius: Vec<usize>,
    offsets: Vec<Offset>,
}

impl StructuringElement {
    /// Generate the element for `shape` with one radius per axis.
    ///
    /// Fails with `InvalidRadius` when any radius is negative and with
    /// `InvalidParameter` when the number of axes is not between 1 and 3.
    pub fn generate(shape: ElementShape, radius: &[i64]) -> Result<Self> {
        Self::build(shape, radius, None)
    }

    /// Generate the element for a grid with the given extents.
    ///
    /// Offsets reaching `extent` or further along an axis can never land
    /// inside the grid, so they are left out; the shape test still uses the
    /// requested radius.
    pub fn for_extents(shape: ElementShape, radius: &[i64], extents: &[usize]) -> Result<Self> {
        Self::build(shape, radius, Some(extents))
    }

    fn build(shape: ElementShape, radius: &[i64], extents: Option<&[usize]>) -> Result<Self> {
        if radius.iter().any(|&r| r < 0) {
            return Err(Error::InvalidRadius {
                radius: radius.to_vec(),
            });
        }
        if radius.is_empty() || radius.len() > MAX_DIMS {
            return Err(Error::InvalidParameter {
                name: "radius",
                value: format!("{:?}", radius),
                reason: format!("expected between 1 and {} radii", MAX_DIMS),
            });
        }

        if let Some(extents) = extents.filter(|e| e.len() != radius.len()) {
            return Err(Error::InvalidParameter {
                name: "radius",
                value: format!("{:?}", radius),
                reason: format!("expected {} radii for extents {:?}", extents.len(), extents),
            });
        }

        let radius: Vec<usize> = radius.iter().map(|&r| r as usize).collect();
        let reach: Vec<usize> = match extents {
            Some(extents) => radius
                .iter()
                .zip(extents)
                .map(|(&r, &e)| r.min(e.saturating_sub(1)))
                .collect(),
            None => radius.clone(),
        };
        let mut offsets = Vec::new();
        let mut current = [0isize; MAX_DIMS];
        enumerate_box(&reach, 0, &mut current, &mut |o| {
            if shape_contains(shape, &radius, o) {
                offsets.push(*o);
            }
        });

        Ok(Self {
            shape,
            radius,
            offsets,
        })
    }

    /// Same radius on each of `ndim` axes
    pub fn uniform(shape: ElementShape, ndim: usize, radius: i64) -> Result<Self> {
        Self::generate(shape, &vec![radius; ndim])
    }

    /// Ball of the given radius
    pub fn ball(ndim: usize, radius: i64) -> Result<Self> {
        Self::uniform(ElementShape::Ball, ndim, radius)
    }

    /// Box of the given radius
    pub fn cube(ndim: usize, radius: i64) -> Result<Self> {
        Self::uniform(ElementShape::Box, ndim, radius)
    }

    /// Shape of this element
    pub fn shape(&self) -> ElementShape {
        self.shape
    }

    /// Radius per axis
    pub fn radius(&self) -> &[usize] {
        &self.radius
    }

    /// Number of axes
    pub fn ndim(&self) -> usize {
        self.radius.len()
    }

    /// Offsets relative to the center, in raster order
    pub fn offsets(&self) -> &[Offset] {
        &self.offsets
    }

    /// Whether the element is the singleton `{origin}`
    pub fn is_identity(&self) -> bool {
        self.radius.iter().all(|&r| r == 0)
    }

    /// Whether `offset` is part of the element
    pub fn contains(&self, offset: &Offset) -> bool {
        self.offsets.contains(offset)
    }
}

fn shape_contains(shape: ElementShape, radius: &[usize], offset: &Offset) -> bool {
    match shape {
        // enumerate_box already bounds every component
        ElementShape::Box => true,
        ElementShape::Ball => {
            let mut norm = 0.0;
            for (axis, &r) in radius.iter().enumerate() {
                let o = offset[axis];
                if r == 0 {
                    if o != 0 {
                        return false;
                    }
                    continue;
                }
                let scaled = o as f64 / r as f64;
                norm += scaled * scaled;
            }
            norm <= 1.0 + 1e-9
        }
    }
}

fn enumerate_box(
    radius: &[usize],
    axis: usize,
    current: &mut Offset,
    visit: &mut dyn FnMut(&Offset),
) {
    if axis == radius.len() {
        visit(current);
        return;
    }
    let r = radius[axis] as isize;
    for d in -r..=r {
        current[axis] = d;
        enumerate_box(radius, axis + 1, current, visit);
    }
    current[axis] = 0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_offsets() {
        let se = StructuringElement::cube(2, 1).unwrap();
        // 3x3 = 9 offsets
        assert_eq!(se.offsets().len(), 9);
        assert!(se.contains(&[0, 0, 0]));
        assert!(se.contains(&[-1, -1, 0]));
        assert!(se.contains(&[1, 1, 0]));
    }

    #[test]
    fn test_ball_offsets() {
        let se = StructuringElement::ball(2, 1).unwrap();
        // Center + 4 face neighbors; diagonals have norm sqrt(2)
        assert_eq!(se.offsets().len(), 5);
        assert!(!se.contains(&[1, 1, 0]));

        let se3 = StructuringElement::ball(3, 1).unwrap();
        assert_eq!(se3.offsets().len(), 7);

        let se2 = StructuringElement::ball(2, 2).unwrap();
        // 5x5 minus the four corners of each quadrant beyond radius 2
        assert_eq!(se2.offsets().len(), 13);
    }

    #[test]
    fn test_anisotropic_ball() {
        let se = StructuringElement::generate(ElementShape::Ball, &[2, 0]).unwrap();
        assert_eq!(se.offsets().len(), 5);
        assert!(se.offsets().iter().all(|o| o[1] == 0));
    }

    #[test]
    fn test_symmetric_about_origin() {
        for shape in [ElementShape::Ball, ElementShape::Box] {
            let se = StructuringElement::generate(shape, &[2, 1, 3]).unwrap();
            for o in se.offsets() {
                assert!(se.contains(&[-o[0], -o[1], -o[2]]));
            }
        }
    }

    #[test]
    fn test_zero_radius_is_singleton() {
        let se = StructuringElement::ball(3, 0).unwrap();
        assert!(se.is_identity());
        assert_eq!(se.offsets(), &[[0, 0, 0]]);
    }

    #[test]
    fn test_clipped_to_extents() {
        let se =
            StructuringElement::for_extents(ElementShape::Box, &[3000, 3000], &[4, 4]).unwrap();
        assert_eq!(se.offsets().len(), 49);
        assert_eq!(se.radius(), &[3000, 3000]);

        // the ball test still uses the requested radius
        let ball =
            StructuringElement::for_extents(ElementShape::Ball, &[3000, 3000], &[4, 4]).unwrap();
        assert_eq!(ball.offsets().len(), 49);
        let small =
            StructuringElement::for_extents(ElementShape::Ball, &[2, 2], &[10, 10]).unwrap();
        assert_eq!(small, StructuringElement::ball(2, 2).unwrap());
    }

    #[test]
    fn test_negative_radius() {
        assert!(matches!(
            StructuringElement::generate(ElementShape::Box, &[1, -1]),
            Err(Error::InvalidRadius { .. })
        ));
    }
}
