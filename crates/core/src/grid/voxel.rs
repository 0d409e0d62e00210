//! Main VoxelGrid type

use ndarray::{ArrayD, IxDyn, Zip};

use crate::error::{Error, Result};
use crate::grid::{ImageGeometry, Indexer, VoxelElement, MAX_DIMS};

/// A 2-D or 3-D grid of samples with physical-space metadata.
///
/// `VoxelGrid<T>` stores values of type `T` in a dense, row-major
/// `ndarray` array together with spacing, origin and direction cosines.
/// The geometry never changes after construction; operations that change
/// extents (padding, cropping) build a new grid.
///
/// # Example
///
/// ```
/// use voxkit_core::VoxelGrid;
///
/// let mut grid: VoxelGrid = VoxelGrid::filled(&[4, 4], 0.0)?;
/// grid.set(&[1, 1], 1.0)?;
/// assert_eq!(grid.get(&[1, 1])?, 1.0);
/// # Ok::<(), voxkit_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid<T: VoxelElement = f64> {
    data: ArrayD<T>,
    geometry: ImageGeometry,
}

impl<T: VoxelElement> VoxelGrid<T> {
    /// Create a grid filled with `fill`.
    ///
    /// Fails with `InvalidDimensions` unless there are 2 or 3 positive
    /// extents matching the geometry's dimensionality.
    pub fn new(extents: &[usize], geometry: ImageGeometry, fill: T) -> Result<Self> {
        validate_extents(extents, &geometry)?;
        Ok(Self {
            data: ArrayD::from_elem(IxDyn(extents), fill),
            geometry,
        })
    }

    /// Create a grid from explicit spacing, origin and row-major direction
    pub fn construct(
        extents: &[usize],
        spacing: Vec<f64>,
        origin: Vec<f64>,
        direction: Vec<f64>,
        fill: T,
    ) -> Result<Self> {
        let geometry = ImageGeometry::new(spacing, origin, direction)?;
        Self::new(extents, geometry, fill)
    }

    /// Create a grid with identity geometry filled with `fill`
    pub fn filled(extents: &[usize], fill: T) -> Result<Self> {
        Self::new(extents, ImageGeometry::identity(extents.len()), fill)
    }

    /// Create a grid with identity geometry from row-major values
    pub fn from_vec(extents: &[usize], values: Vec<T>) -> Result<Self> {
        Self::from_vec_with_geometry(extents, values, ImageGeometry::identity(extents.len()))
    }

    /// Create a grid from row-major values and a geometry
    pub fn from_vec_with_geometry(
        extents: &[usize],
        values: Vec<T>,
        geometry: ImageGeometry,
    ) -> Result<Self> {
        validate_extents(extents, &geometry)?;
        let expected: usize = extents.iter().product();
        if values.len() != expected {
            return Err(Error::InvalidDimensions(format!(
                "{} values supplied for extents {:?} ({} voxels)",
                values.len(),
                extents,
                expected
            )));
        }
        let data = ArrayD::from_shape_vec(IxDyn(extents), values)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self { data, geometry })
    }

    /// Same extents and geometry, filled with `fill`
    pub fn like<U: VoxelElement>(&self, fill: U) -> VoxelGrid<U> {
        VoxelGrid {
            data: ArrayD::from_elem(self.data.raw_dim(), fill),
            geometry: self.geometry.clone(),
        }
    }

    /// Same extents and geometry with new row-major values
    pub fn with_values<U: VoxelElement>(&self, values: Vec<U>) -> Result<VoxelGrid<U>> {
        VoxelGrid::from_vec_with_geometry(self.extents(), values, self.geometry.clone())
    }

    // Dimensions

    /// Number of axes (2 or 3)
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Extent of every axis
    pub fn extents(&self) -> &[usize] {
        self.data.shape()
    }

    /// Total number of voxels
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the grid has no voxels (never true for a validated grid)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major index arithmetic for this grid's extents
    pub fn indexer(&self) -> Indexer {
        Indexer::new(self.extents())
    }

    // Data access

    /// Value at `index`
    pub fn get(&self, index: &[usize]) -> Result<T> {
        self.check_index(index)?;
        Ok(self.data[IxDyn(index)])
    }

    /// Set the value at `index`
    pub fn set(&mut self, index: &[usize], value: T) -> Result<()> {
        self.check_index(index)?;
        self.data[IxDyn(index)] = value;
        Ok(())
    }

    fn check_index(&self, index: &[usize]) -> Result<()> {
        let extents = self.extents();
        if index.len() != extents.len() || index.iter().zip(extents).any(|(i, e)| i >= e) {
            return Err(Error::OutOfBounds {
                index: index.to_vec(),
                extents: extents.to_vec(),
            });
        }
        Ok(())
    }

    /// Copy of all values in row-major order.
    ///
    /// Stages read from this snapshot while writing a separate buffer.
    pub fn to_vec(&self) -> Vec<T> {
        self.data.iter().copied().collect()
    }

    /// Reference to the underlying array
    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    /// Replace every value in place with row-major `values`.
    ///
    /// Used by the documented in-place filter variants.
    pub fn overwrite(&mut self, values: Vec<T>) -> Result<()> {
        if values.len() != self.len() {
            return Err(Error::InvalidDimensions(format!(
                "{} values supplied for a grid of {} voxels",
                values.len(),
                self.len()
            )));
        }
        self.data = ArrayD::from_shape_vec(self.data.raw_dim(), values)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(())
    }

    // Metadata

    /// Physical-space geometry
    pub fn geometry(&self) -> &ImageGeometry {
        &self.geometry
    }

    /// Spacing per axis
    pub fn spacing(&self) -> &[f64] {
        self.geometry.spacing()
    }

    /// Physical position of index zero
    pub fn origin(&self) -> &[f64] {
        self.geometry.origin()
    }

    /// Row-major direction cosines
    pub fn direction(&self) -> &[f64] {
        self.geometry.direction()
    }

    // Element-wise operations

    /// Apply `f` to every voxel, producing a new grid
    pub fn map<F>(&self, f: F) -> VoxelGrid<T>
    where
        F: Fn(T) -> T,
    {
        VoxelGrid {
            data: self.data.mapv(f),
            geometry: self.geometry.clone(),
        }
    }

    /// Combine two grids voxel by voxel, producing a new grid.
    ///
    /// Fails with `ShapeMismatch` when extents differ. The geometry of
    /// `self` is kept.
    pub fn combine<F>(&self, other: &VoxelGrid<T>, f: F) -> Result<VoxelGrid<T>>
    where
        F: Fn(T, T) -> T,
    {
        if self.extents() != other.extents() {
            return Err(Error::ShapeMismatch {
                expected: self.extents().to_vec(),
                actual: other.extents().to_vec(),
            });
        }
        let data = Zip::from(&self.data)
            .and(&other.data)
            .map_collect(|&a, &b| f(a, b));
        Ok(VoxelGrid {
            data,
            geometry: self.geometry.clone(),
        })
    }

    /// Convert every sample to another element type (saturating)
    pub fn cast<U: VoxelElement>(&self) -> VoxelGrid<U> {
        VoxelGrid {
            data: self
                .data
                .mapv(|v| U::from_f64_saturating(v.to_f64().unwrap_or(f64::NAN))),
            geometry: self.geometry.clone(),
        }
    }

    /// Number of voxels whose value is non-zero
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_zero()).count()
    }

    // Statistics

    /// Minimum, maximum and mean over all samples; NaN samples are skipped
    pub fn statistics(&self) -> GridStatistics<T> {
        let mut min: Option<T> = None;
        let mut max: Option<T> = None;
        let mut sum: f64 = 0.0;
        let mut count: usize = 0;

        for &value in self.data.iter() {
            let Some(v) = value.to_f64() else { continue };
            if v.is_nan() {
                continue;
            }
            if min.map_or(true, |m| value < m) {
                min = Some(value);
            }
            if max.map_or(true, |m| value > m) {
                max = Some(value);
            }
            sum += v;
            count += 1;
        }

        GridStatistics {
            min,
            max,
            mean: (count > 0).then(|| sum / count as f64),
            count,
        }
    }
}

/// Basic statistics for a grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub mean: Option<f64>,
    pub count: usize,
}

fn validate_extents(extents: &[usize], geometry: &ImageGeometry) -> Result<()> {
    if !(2..=MAX_DIMS).contains(&extents.len()) {
        return Err(Error::InvalidDimensions(format!(
            "grids must have 2 or 3 axes, got {}",
            extents.len()
        )));
    }
    if extents.iter().any(|&e| e == 0) {
        return Err(Error::InvalidDimensions(format!(
            "every extent must be positive, got {:?}",
            extents
        )));
    }
    if geometry.ndim() != extents.len() {
        return Err(Error::InvalidDimensions(format!(
            "geometry has {} axes but extents {:?} have {}",
            geometry.ndim(),
            extents,
            extents.len()
        )));
    }
    Ok(())
}
