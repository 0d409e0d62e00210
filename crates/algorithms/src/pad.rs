//! Constant padding and symmetric cropping

use voxkit_core::grid::MAX_DIMS;
use voxkit_core::{Algorithm, Error, Indexer, Result, VoxelGrid};

/// Parameters for PadImage
#[derive(Debug, Clone)]
pub struct PadParams {
    /// Voxels added (positive) or removed (negative) on both sides; a single
    /// value applies to every axis
    pub amount: Vec<i64>,
    /// Value of the added voxels
    pub fill: f64,
}

impl Default for PadParams {
    fn default() -> Self {
        Self {
            amount: vec![1],
            fill: 0.0,
        }
    }
}

/// Padding / cropping algorithm
#[derive(Debug, Clone, Default)]
pub struct PadImage;

impl Algorithm for PadImage {
    type Input = VoxelGrid;
    type Output = VoxelGrid;
    type Params = PadParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "PadImage"
    }

    fn description(&self) -> &'static str {
        "Pad with a constant or crop symmetrically, keeping physical positions"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        pad_image(&input, &params.amount, params.fill)
    }
}

/// Pad (positive `amount`) or crop (negative `amount`) every axis on both sides.
///
/// The output origin is the physical position of input index `-amount`, so
/// retained voxels keep their physical location.
pub fn pad_image(grid: &VoxelGrid, amount: &[i64], fill: f64) -> Result<VoxelGrid> {
    let ndim = grid.ndim();
    let amount: Vec<i64> = match amount.len() {
        1 => vec![amount[0]; ndim],
        n if n == ndim => amount.to_vec(),
        n => {
            return Err(Error::InvalidParameter {
                name: "amount",
                value: format!("{:?}", amount),
                reason: format!("expected 1 or {} values, got {}", ndim, n),
            })
        }
    };

    let mut extents = Vec::with_capacity(ndim);
    let mut shift = [0isize; MAX_DIMS];
    for (axis, (&e, &a)) in grid.extents().iter().zip(&amount).enumerate() {
        let new_extent = a
            .checked_mul(2)
            .and_then(|d| d.checked_add(e as i64))
            .ok_or_else(|| amount_too_large(a))?;
        if new_extent <= 0 {
            return Err(Error::InvalidCrop {
                axis,
                amount: a,
                extent: e,
            });
        }
        extents.push(usize::try_from(new_extent).map_err(|_| amount_too_large(a))?);
        shift[axis] = a
            .checked_neg()
            .and_then(|s| isize::try_from(s).ok())
            .ok_or_else(|| amount_too_large(a))?;
    }
    if extents.iter().try_fold(1usize, |n, &e| n.checked_mul(e)).is_none() {
        return Err(Error::InvalidParameter {
            name: "amount",
            value: format!("{:?}", amount),
            reason: format!("padded extents {:?} overflow the voxel count", extents),
        });
    }

    let src = grid.to_vec();
    let src_indexer = grid.indexer();
    let dst_indexer = Indexer::new(&extents);

    let values: Vec<f64> = (0..dst_indexer.len())
        .map(|i| {
            let coords = dst_indexer.unravel(i);
            src_indexer
                .neighbor(&coords, &shift)
                .map_or(fill, |j| src[j])
        })
        .collect();

    let anchor: Vec<f64> = amount.iter().map(|&a| -a as f64).collect();
    let geometry = grid.geometry().reanchored(&anchor);
    VoxelGrid::from_vec_with_geometry(&extents, values, geometry)
}

fn amount_too_large(amount: i64) -> Error {
    Error::InvalidParameter {
        name: "amount",
        value: amount.to_string(),
        reason: "padded extent overflows".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use voxkit_core::ImageGeometry;

    fn sample() -> VoxelGrid {
        let geometry = ImageGeometry::with_spacing_origin(vec![2.0, 0.5], vec![10.0, 20.0]).unwrap();
        let values = (0..12).map(|v| v as f64 + 1.0).collect();
        VoxelGrid::from_vec_with_geometry(&[3, 4], values, geometry).unwrap()
    }

    #[test]
    fn test_pad_places_values() {
        let padded = pad_image(&sample(), &[1], -1.0).unwrap();
        assert_eq!(padded.extents(), &[5, 6]);
        assert_eq!(padded.get(&[0, 0]).unwrap(), -1.0);
        assert_eq!(padded.get(&[1, 1]).unwrap(), 1.0);
        assert_eq!(padded.get(&[3, 4]).unwrap(), 12.0);
        assert_eq!(padded.get(&[4, 5]).unwrap(), -1.0);
        assert_relative_eq!(padded.origin()[0], 8.0);
        assert_relative_eq!(padded.origin()[1], 19.5);
    }

    #[test]
    fn test_pad_then_crop_roundtrip() {
        let grid = sample();
        let padded = pad_image(&grid, &[2, 1], 0.0).unwrap();
        assert_eq!(padded.extents(), &[7, 6]);
        let back = pad_image(&padded, &[-2, -1], 0.0).unwrap();
        assert_eq!(back.extents(), grid.extents());
        assert_eq!(back.to_vec(), grid.to_vec());
        for (a, b) in back.origin().iter().zip(grid.origin()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
        assert_eq!(back.spacing(), grid.spacing());
    }

    #[test]
    fn test_crop_too_large() {
        assert!(matches!(
            pad_image(&sample(), &[-2], 0.0),
            Err(Error::InvalidCrop { axis: 0, amount: -2, extent: 3 })
        ));
        assert!(pad_image(&sample(), &[-1, -1], 0.0).is_ok());
    }

    #[test]
    fn test_overflowing_amount() {
        for amount in [i64::MAX / 2 + 1, i64::MIN, i64::MAX] {
            assert!(matches!(
                pad_image(&sample(), &[amount], 0.0),
                Err(Error::InvalidParameter { name: "amount", .. })
            ));
        }
        // each extent fits but their product does not
        assert!(matches!(
            pad_image(&sample(), &[i64::MAX / 4], 0.0),
            Err(Error::InvalidParameter { name: "amount", .. })
        ));
    }

    #[test]
    fn test_wrong_amount_count() {
        assert!(PadImage
            .execute(sample(), PadParams { amount: vec![1, 1, 1], fill: 0.0 })
            .is_err());
    }
}
