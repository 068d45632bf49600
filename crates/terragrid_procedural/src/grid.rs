//! # World Grid
//!
//! Dense 3D array of tile classifications.
//!
//! ## Layout
//!
//! Cells are stored x-major, then y, then z, so linear iteration order is
//! exactly the placement order: x outermost, z innermost.
//!
//! ## Initialization
//!
//! A grid only comes into existence through [`WorldGrid::from_fn`] or
//! [`WorldGrid::try_from_fn`], which visit every cell once. There is no
//! half-filled state for a reader to observe.

use serde::Deserialize;

use crate::error::{GenerationError, GenerationResult};

/// Grid extents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    /// Cells along X.
    pub width: usize,
    /// Cells along Y (vertical).
    pub height: usize,
    /// Cells along Z.
    pub depth: usize,
}

impl Dimensions {
    /// Largest width/depth the source ranges recommend.
    pub const RECOMMENDED_MAX_SPAN: usize = 100;
    /// Largest height the source ranges recommend.
    pub const RECOMMENDED_MAX_HEIGHT: usize = 25;

    /// Creates new dimensions.
    #[must_use]
    pub const fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Total number of cells.
    #[inline]
    #[must_use]
    pub const fn cell_count(self) -> usize {
        self.width * self.height * self.depth
    }

    /// Number of (x, y) rows, each spanning the full depth.
    #[inline]
    #[must_use]
    pub const fn row_count(self) -> usize {
        self.width * self.height
    }

    /// Returns true if `coord` lies inside the grid.
    #[inline]
    #[must_use]
    pub const fn contains(self, coord: GridCoord) -> bool {
        coord.x < self.width && coord.y < self.height && coord.z < self.depth
    }

    /// Rejects zero-sized grids.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidDimensions`] if any extent is zero.
    pub fn validate(self) -> GenerationResult<()> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(GenerationError::InvalidDimensions {
                width: self.width,
                height: self.height,
                depth: self.depth,
            });
        }
        Ok(())
    }

    /// Returns true if the extents exceed the recommended ranges.
    #[must_use]
    pub const fn exceeds_recommended(self) -> bool {
        self.width > Self::RECOMMENDED_MAX_SPAN
            || self.depth > Self::RECOMMENDED_MAX_SPAN
            || self.height > Self::RECOMMENDED_MAX_HEIGHT
    }

    /// Iterates every coordinate in placement order.
    pub fn coords(self) -> impl Iterator<Item = GridCoord> {
        (0..self.width).flat_map(move |x| {
            (0..self.height)
                .flat_map(move |y| (0..self.depth).map(move |z| GridCoord::new(x, y, z)))
        })
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::new(50, 10, 50)
    }
}

/// A cell position. Ordering is lexicographic on (x, y, z).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridCoord {
    /// X coordinate.
    pub x: usize,
    /// Y coordinate (vertical).
    pub y: usize,
    /// Z coordinate.
    pub z: usize,
}

impl GridCoord {
    /// Creates a new coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }
}

/// A cell's tile classification.
///
/// Non-negative codes index the tile catalog; negative codes are sentinels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Classification(i32);

impl Classification {
    /// Nothing is placed here.
    pub const EMPTY: Self = Self(-1);
    /// Snow cover above the snow line.
    pub const SNOW: Self = Self(-2);
    /// The fallback catalog entry.
    pub const DEFAULT_TILE: Self = Self(0);

    /// Classification for catalog entry `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not fit the code space.
    #[inline]
    #[must_use]
    pub fn tile(index: usize) -> Self {
        Self(i32::try_from(index).expect("catalog index exceeds i32"))
    }

    /// Wraps a raw classification code.
    #[inline]
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        Self(code)
    }

    /// The raw code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> i32 {
        self.0
    }

    /// The catalog index, if this is not a sentinel.
    #[inline]
    #[must_use]
    pub fn tile_index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    /// Returns true for the empty sentinel.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == Self::EMPTY.0
    }
}

/// Dense tile grid for one generation pass.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldGrid {
    dims: Dimensions,
    cells: Vec<Classification>,
}

impl WorldGrid {
    /// Builds a grid by classifying every cell in placement order.
    #[must_use]
    pub fn from_fn<F>(dims: Dimensions, mut classify: F) -> Self
    where
        F: FnMut(GridCoord) -> Classification,
    {
        let cells = dims.coords().map(&mut classify).collect();
        Self { dims, cells }
    }

    /// Builds a grid with a fallible classifier, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `classify`.
    pub fn try_from_fn<F>(dims: Dimensions, mut classify: F) -> GenerationResult<Self>
    where
        F: FnMut(GridCoord) -> GenerationResult<Classification>,
    {
        let cells = dims
            .coords()
            .map(&mut classify)
            .collect::<GenerationResult<Vec<_>>>()?;
        Ok(Self { dims, cells })
    }

    /// Grid extents.
    #[inline]
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dims
    }

    #[inline]
    fn index(&self, coord: GridCoord) -> Option<usize> {
        self.dims
            .contains(coord)
            .then(|| (coord.x * self.dims.height + coord.y) * self.dims.depth + coord.z)
    }

    /// Gets the classification at `coord`, or `None` outside the grid.
    #[inline]
    #[must_use]
    pub fn get(&self, coord: GridCoord) -> Option<Classification> {
        self.index(coord).map(|i| self.cells[i])
    }

    /// Overwrites the classification at `coord`.
    ///
    /// Returns false (and writes nothing) outside the grid.
    #[inline]
    pub fn set(&mut self, coord: GridCoord, value: Classification) -> bool {
        match self.index(coord) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    /// The z-run of cells at `(x, y)`.
    #[must_use]
    pub fn row(&self, x: usize, y: usize) -> Option<&[Classification]> {
        let start = self.index(GridCoord::new(x, y, 0))?;
        Some(&self.cells[start..start + self.dims.depth])
    }

    /// Iterates every cell in placement order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, Classification)> + '_ {
        self.dims.coords().zip(self.cells.iter().copied())
    }

    /// Counts cells holding `value`.
    #[must_use]
    pub fn count(&self, value: Classification) -> usize {
        self.cells.iter().filter(|&&c| c == value).count()
    }
}
