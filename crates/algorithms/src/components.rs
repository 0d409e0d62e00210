//! Connected-component labelling and the mask cleanups built on it

use voxkit_core::{Algorithm, Connectivity, Error, Indexer, Result, VoxelGrid};

/// Label foreground (`!= 0`) voxels by connected component.
///
/// Labels run from 1 in raster order of each component's first voxel;
/// background is 0.
pub fn label_components(grid: &VoxelGrid, connectivity: Connectivity) -> Result<VoxelGrid<u32>> {
    let src = grid.to_vec();
    let labels = label_where(&src, &grid.indexer(), connectivity, |v| v != 0.0);
    grid.with_values(labels)
}

/// Stack flood fill over voxels satisfying `member`; returns one label per voxel
fn label_where<F>(src: &[f64], indexer: &Indexer, connectivity: Connectivity, member: F) -> Vec<u32>
where
    F: Fn(f64) -> bool,
{
    let offsets = connectivity.offsets(indexer.ndim());
    let mut labels = vec![0u32; src.len()];
    let mut next = 0u32;
    let mut stack = Vec::new();

    for seed in 0..src.len() {
        if labels[seed] != 0 || !member(src[seed]) {
            continue;
        }
        next += 1;
        labels[seed] = next;
        stack.push(seed);

        while let Some(i) = stack.pop() {
            let coords = indexer.unravel(i);
            for o in &offsets {
                if let Some(j) = indexer.neighbor(&coords, o) {
                    if labels[j] == 0 && member(src[j]) {
                        labels[j] = next;
                        stack.push(j);
                    }
                }
            }
        }
    }

    labels
}

/// Binary mask of the largest face-connected foreground component.
///
/// Ties go to the lowest label; a grid without foreground gives all zeros.
pub fn largest_component(grid: &VoxelGrid) -> Result<VoxelGrid> {
    let src = grid.to_vec();
    let labels = label_where(&src, &grid.indexer(), Connectivity::Face, |v| v != 0.0);

    let count = labels.iter().copied().max().unwrap_or(0) as usize;
    let mut sizes = vec![0usize; count + 1];
    for &l in &labels {
        sizes[l as usize] += 1;
    }

    let mut best = 0u32;
    let mut best_size = 0usize;
    for (label, &size) in sizes.iter().enumerate().skip(1) {
        if size > best_size {
            best = label as u32;
            best_size = size;
        }
    }

    let values = labels
        .iter()
        .map(|&l| if best != 0 && l == best { 1.0 } else { 0.0 })
        .collect();
    grid.with_values(values)
}

/// Binary mask with enclosed background cavities set to foreground.
///
/// A background region is a hole when none of its voxels touches the grid
/// border under face connectivity.
pub fn fill_holes(grid: &VoxelGrid) -> Result<VoxelGrid> {
    let src = grid.to_vec();
    let indexer = grid.indexer();
    let labels = label_where(&src, &indexer, Connectivity::Face, |v| v == 0.0);

    let count = labels.iter().copied().max().unwrap_or(0) as usize;
    let mut open = vec![false; count + 1];
    for (i, &l) in labels.iter().enumerate() {
        if l != 0 && indexer.on_border(&indexer.unravel(i)) {
            open[l as usize] = true;
        }
    }

    let values = labels
        .iter()
        .map(|&l| if l == 0 || !open[l as usize] { 1.0 } else { 0.0 })
        .collect();
    grid.with_values(values)
}

/// Keep the largest face-connected component
#[derive(Debug, Clone, Default)]
pub struct LargestComponent;

impl Algorithm for LargestComponent {
    type Input = VoxelGrid;
    type Output = VoxelGrid;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "GetLargestComponent"
    }

    fn description(&self) -> &'static str {
        "Keep only the largest face-connected foreground component"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        largest_component(&input)
    }
}

/// Fill background cavities that do not reach the border
#[derive(Debug, Clone, Default)]
pub struct FillHoles;

impl Algorithm for FillHoles {
    type Input = VoxelGrid;
    type Output = VoxelGrid;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "FillHoles"
    }

    fn description(&self) -> &'static str {
        "Fill enclosed background regions of a binary mask"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        fill_holes(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(rows: &[&str]) -> VoxelGrid {
        let cols = rows[0].len();
        let values = rows
            .iter()
            .flat_map(|r| r.chars().map(|c| if c == '#' { 1.0 } else { 0.0 }))
            .collect();
        VoxelGrid::from_vec(&[rows.len(), cols], values).unwrap()
    }

    #[test]
    fn test_labels_in_raster_order() {
        let grid = mask(&["#..#", "#...", "..#.", "...#"]);
        let face = label_components(&grid, Connectivity::Face).unwrap();
        assert_eq!(face.get(&[0, 0]).unwrap(), 1);
        assert_eq!(face.get(&[1, 0]).unwrap(), 1);
        assert_eq!(face.get(&[0, 3]).unwrap(), 2);
        assert_eq!(face.get(&[2, 2]).unwrap(), 3);
        assert_eq!(face.get(&[3, 3]).unwrap(), 4);
        assert_eq!(face.get(&[1, 1]).unwrap(), 0);

        let full = label_components(&grid, Connectivity::Full).unwrap();
        assert_eq!(full.get(&[3, 3]).unwrap(), full.get(&[2, 2]).unwrap());
        assert_eq!(full.to_vec().iter().max(), Some(&3));
    }

    #[test]
    fn test_largest_component() {
        let grid = mask(&["##..", "##..", "...#", "..##"]);
        let largest = largest_component(&grid).unwrap();
        assert_eq!(largest.foreground_count(), 4);
        assert_eq!(largest.get(&[0, 0]).unwrap(), 1.0);
        assert_eq!(largest.get(&[3, 3]).unwrap(), 0.0);
        assert_eq!(LargestComponent.execute_default(grid).unwrap(), largest);
    }

    #[test]
    fn test_largest_component_tie_and_empty() {
        let grid = mask(&["#..#", "....", "....", "...."]);
        let largest = largest_component(&grid).unwrap();
        assert_eq!(largest.get(&[0, 0]).unwrap(), 1.0);
        assert_eq!(largest.get(&[0, 3]).unwrap(), 0.0);

        let empty = VoxelGrid::filled(&[3, 3, 3], 0.0).unwrap();
        assert_eq!(largest_component(&empty).unwrap().foreground_count(), 0);
    }

    #[test]
    fn test_fill_holes() {
        let grid = mask(&[".....", ".###.", ".#.#.", ".###.", "....."]);
        let filled = fill_holes(&grid).unwrap();
        assert_eq!(filled.get(&[2, 2]).unwrap(), 1.0);
        assert_eq!(filled.get(&[0, 0]).unwrap(), 0.0);
        assert_eq!(filled.foreground_count(), 9);
    }

    #[test]
    fn test_fill_holes_ignores_open_pocket() {
        let grid = mask(&[".###.", ".#.#.", ".#.#.", "....."]);
        let filled = fill_holes(&grid).unwrap();
        assert_eq!(filled, grid);
    }
}
