//! Square-coordinate math for the 10x10 board.
//!
//! Squares are identified by a flat id in `0..=99`, derived bijectively
//! from `(row, col)` via `id = row * 10 + col`.

use serde::{Deserialize, Serialize};

/// Number of rows (and columns) on the board.
pub const GRID_SIZE: i32 = 10;

/// Total number of squares on the board.
pub const SQUARE_COUNT: i32 = GRID_SIZE * GRID_SIZE;

/// A validated square identifier in `0..=99`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SquareId(i32);

impl SquareId {
    /// Creates a square id, returning `None` if `id` is outside `0..=99`.
    pub fn new(id: i32) -> Option<Self> {
        (0..SQUARE_COUNT).contains(&id).then_some(Self(id))
    }

    /// Creates a square id from row and column indices in `0..=9`.
    pub fn from_row_col(row: i32, col: i32) -> Option<Self> {
        ((0..GRID_SIZE).contains(&row) && (0..GRID_SIZE).contains(&col))
            .then(|| Self(row * GRID_SIZE + col))
    }

    /// Returns the flat id.
    pub fn index(self) -> i32 {
        self.0
    }

    /// Returns the row index in `0..=9`.
    pub fn row(self) -> i32 {
        self.0 / GRID_SIZE
    }

    /// Returns the column index in `0..=9`.
    pub fn col(self) -> i32 {
        self.0 % GRID_SIZE
    }
}

impl std::fmt::Display for SquareId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{} C{} (#{})", self.row(), self.col(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_squares() {
        for id in 0..SQUARE_COUNT {
            let sq = SquareId::new(id).expect("valid id");
            let back = SquareId::from_row_col(sq.row(), sq.col()).expect("valid coords");
            assert_eq!(back.index(), id);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(SquareId::new(-1).is_none());
        assert!(SquareId::new(100).is_none());
        assert!(SquareId::from_row_col(10, 0).is_none());
        assert!(SquareId::from_row_col(0, -1).is_none());
    }

    #[test]
    fn test_row_col_decomposition() {
        let sq = SquareId::new(73).expect("valid id");
        assert_eq!(sq.row(), 7);
        assert_eq!(sq.col(), 3);
        assert_eq!(sq.to_string(), "R7 C3 (#73)");
    }
}
