//! Grid coordinates and the static battle map.
//!
//! Every tie in the simulation is broken by *reading order*: top to bottom,
//! then left to right. [`GridPos`] orders itself that way, so sorting or
//! taking the minimum of positions is always the correct tie-break.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkirmishError};

/// A square on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    /// Column, growing to the right.
    pub x: u32,
    /// Row, growing downwards.
    pub y: u32,
}

impl GridPos {
    /// Create a position from column and row.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Orthogonal neighbours in reading order (up, left, right, down).
    ///
    /// Squares that would fall off the top or left edge are omitted; the
    /// caller is responsible for the right and bottom bounds.
    pub fn neighbors(self) -> impl Iterator<Item = GridPos> {
        let up = self.y.checked_sub(1).map(|y| GridPos::new(self.x, y));
        let left = self.x.checked_sub(1).map(|x| GridPos::new(x, self.y));
        let right = self.x.checked_add(1).map(|x| GridPos::new(x, self.y));
        let down = self.y.checked_add(1).map(|y| GridPos::new(self.x, y));

        [up, left, right, down].into_iter().flatten()
    }

    /// Whether `other` shares an edge with this square.
    #[must_use]
    pub fn is_adjacent(self, other: GridPos) -> bool {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) == 1
    }
}

impl Ord for GridPos {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reading order: row first, then column.
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for GridPos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Terrain of a single map square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Floor that units may stand on.
    #[default]
    Open,
    /// Impassable wall.
    Wall,
}

impl Cell {
    /// Returns true if units can stand on this cell.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Immutable battle map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Map {
    /// Map width in cells.
    width: u32,
    /// Map height in cells.
    height: u32,
    /// Cell data stored in row-major order.
    cells: Vec<Cell>,
}

impl Map {
    /// Build a map from rows of cells.
    ///
    /// # Errors
    ///
    /// Returns [`SkirmishError::EmptyMap`] if there are no cells and
    /// [`SkirmishError::JaggedRow`] if rows differ in length.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self> {
        let expected = rows.first().map_or(0, Vec::len);
        if expected == 0 {
            return Err(SkirmishError::EmptyMap);
        }

        let mut cells = Vec::with_capacity(expected * rows.len());
        for (row, line) in rows.iter().enumerate() {
            if line.len() != expected {
                return Err(SkirmishError::JaggedRow {
                    row,
                    expected,
                    found: line.len(),
                });
            }
            cells.extend_from_slice(line);
        }

        let width = u32::try_from(expected)
            .map_err(|_| SkirmishError::InvalidState("map too wide".into()))?;
        let height = u32::try_from(rows.len())
            .map_err(|_| SkirmishError::InvalidState("map too tall".into()))?;

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if the map has no cells (never the case for a constructed map).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check if coordinates are within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Row-major index of a position, if it lies on the map.
    #[must_use]
    pub fn index_of(&self, pos: GridPos) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let x = usize::try_from(pos.x).ok()?;
        let y = usize::try_from(pos.y).ok()?;
        y.checked_mul(width)?.checked_add(x)
    }

    /// Get the cell at a position. Returns `None` if out of bounds.
    #[must_use]
    pub fn cell(&self, pos: GridPos) -> Option<Cell> {
        self.index_of(pos).map(|index| self.cells[index])
    }

    /// True iff `(x, y)` is on the map and not a wall.
    #[must_use]
    pub fn is_open(&self, x: u32, y: u32) -> bool {
        self.is_open_at(GridPos::new(x, y))
    }

    /// Position-based form of [`Map::is_open`].
    #[must_use]
    pub fn is_open_at(&self, pos: GridPos) -> bool {
        self.cell(pos).is_some_and(Cell::is_open)
    }
}
