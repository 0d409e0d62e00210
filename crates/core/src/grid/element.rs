//! Voxel element trait for generic sample values

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a voxel.
///
/// Filters operate on `f64` grids; other element types exist so that label
/// maps and masks can be carried around without widening every sample.
pub trait VoxelElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }

    /// Convert from f64, saturating at the bounds of integer types.
    ///
    /// NaN maps to zero for integer types.
    fn from_f64_saturating(value: f64) -> Self;
}

macro_rules! impl_voxel_element_int {
    ($t:ty) => {
        impl VoxelElement for $t {
            fn from_f64_saturating(value: f64) -> Self {
                if value.is_nan() {
                    return 0;
                }
                // `as` saturates float -> int conversions
                value.round() as $t
            }
        }
    };
}

macro_rules! impl_voxel_element_float {
    ($t:ty) => {
        impl VoxelElement for $t {
            fn from_f64_saturating(value: f64) -> Self {
                value as $t
            }
        }
    };
}

impl_voxel_element_int!(i16);
impl_voxel_element_int!(i32);
impl_voxel_element_int!(i64);
impl_voxel_element_int!(u8);
impl_voxel_element_int!(u16);
impl_voxel_element_int!(u32);
impl_voxel_element_float!(f32);
impl_voxel_element_float!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_conversion() {
        assert_eq!(u8::from_f64_saturating(300.0), 255);
        assert_eq!(u8::from_f64_saturating(-4.0), 0);
        assert_eq!(i16::from_f64_saturating(2.6), 3);
        assert_eq!(u32::from_f64_saturating(f64::NAN), 0);
        assert_eq!(f32::from_f64_saturating(1.5), 1.5f32);
    }
}
