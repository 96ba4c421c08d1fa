//! Append-only sparse matrix.
//!
//! Entries live in two parallel arenas (column indices and scalars); each
//! row is a contiguous `(start, end)` slice of both. Rows are built by
//! appending entries and sealing them with [`SparseMatrix::row_done`].

use num_traits::Zero;
use thiserror::Error;

use quartus_rings::Scalar;

/// Column indices are 32-bit; more columns than that is a fatal error.
pub type ColIndex = u32;

/// Errors from matrix construction.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MatrixError {
    /// The column count left the 32-bit index range.
    #[error("more than 2^32 columns in a sparse matrix")]
    TooManyColumns,
}

#[derive(Clone, Copy, Debug, Default)]
struct RowRange {
    start: usize,
    end: usize,
}

/// A sparse matrix of `(column, scalar)` entries.
///
/// There is no special treatment of zero scalars: an appended zero still
/// counts as an entry. Rows are stored in insertion order.
#[derive(Clone, Debug, Default)]
pub struct SparseMatrix<S = Scalar> {
    values: Vec<S>,
    col_indices: Vec<ColIndex>,
    rows: Vec<RowRange>,
    col_count: ColIndex,
}

impl<S: Copy + Zero + PartialEq> SparseMatrix<S> {
    /// Creates a matrix with no rows and the given column count.
    #[must_use]
    pub fn new(col_count: ColIndex) -> Self {
        Self {
            values: Vec::new(),
            col_indices: Vec::new(),
            rows: Vec::new(),
            col_count,
        }
    }

    /// The number of sealed rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The number of columns.
    #[must_use]
    pub fn col_count(&self) -> ColIndex {
        self.col_count
    }

    /// The number of entries over the whole matrix.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.values.len()
    }

    /// The number of entries in a row.
    #[must_use]
    pub fn entry_count_in_row(&self, row: usize) -> usize {
        let r = self.rows[row];
        r.end - r.start
    }

    /// True if the row has no entries.
    #[must_use]
    pub fn row_is_empty(&self, row: usize) -> bool {
        self.entry_count_in_row(row) == 0
    }

    /// Grows the column count to at least `count`.
    pub fn ensure_at_least_this_many_columns(&mut self, count: ColIndex) {
        if count > self.col_count {
            self.col_count = count;
        }
    }

    /// Adds one column, returning its index.
    pub fn append_column(&mut self) -> Result<ColIndex, MatrixError> {
        if self.col_count == ColIndex::MAX {
            return Err(MatrixError::TooManyColumns);
        }
        self.col_count += 1;
        Ok(self.col_count - 1)
    }

    /// Appends an entry to the row under construction.
    ///
    /// The entry is not visible until [`Self::row_done`] seals the row.
    pub fn append_entry(&mut self, col: ColIndex, scalar: S) {
        debug_assert!(col < self.col_count, "column out of range");
        self.col_indices.push(col);
        self.values.push(scalar);
    }

    /// Seals the row under construction: all entries appended since the
    /// last seal (or creation) become one row.
    pub fn row_done(&mut self) {
        let start = self.rows.last().map_or(0, |r| r.end);
        self.rows.push(RowRange {
            start,
            end: self.values.len(),
        });
    }

    /// Copies a row from another matrix as the next row of this one.
    pub fn append_row(&mut self, other: &Self, row: usize) {
        for (col, scalar) in other.row_iter(row) {
            self.append_entry(col, scalar);
        }
        self.row_done();
    }

    /// Appends a row gathered from a dense slice, skipping zero scalars.
    ///
    /// Returns true if the row was nonzero and therefore appended.
    pub fn append_row_skipping_zeros(&mut self, dense: &[S]) -> bool {
        debug_assert!(dense.len() <= self.col_count as usize);
        let before = self.values.len();
        for (col, scalar) in dense.iter().enumerate() {
            if !scalar.is_zero() {
                self.append_entry(col as ColIndex, *scalar);
            }
        }
        if self.values.len() == before {
            return false;
        }
        self.row_done();
        true
    }

    /// Iterates over the entries of a row in insertion order.
    pub fn row_iter(&self, row: usize) -> impl Iterator<Item = (ColIndex, S)> + '_ {
        let r = self.rows[row];
        self.col_indices[r.start..r.end]
            .iter()
            .zip(&self.values[r.start..r.end])
            .map(|(&c, &v)| (c, v))
    }

    /// The column of the first entry appended to the row.
    ///
    /// This is the entry the builders append first, not necessarily the
    /// minimal column of the row.
    #[must_use]
    pub fn lead_col(&self, row: usize) -> Option<ColIndex> {
        let r = self.rows[row];
        (r.start < r.end).then(|| self.col_indices[r.start])
    }

    /// The minimal column index present in the row.
    #[must_use]
    pub fn min_col(&self, row: usize) -> Option<ColIndex> {
        let r = self.rows[row];
        self.col_indices[r.start..r.end].iter().copied().min()
    }

    /// Replaces every column index `c` with `map[c]`.
    pub fn apply_column_map(&mut self, map: &[ColIndex]) {
        debug_assert!(map.len() >= self.col_count as usize);
        for col in &mut self.col_indices {
            *col = map[*col as usize];
        }
    }

    /// Reorders rows so the minimal column per row weakly increases.
    ///
    /// Rewrites the matrix by copying into a fresh one; the sort is
    /// stable, so ties keep insertion order.
    pub fn sort_rows_by_increasing_pivots(&mut self) {
        let mut order: Vec<usize> = (0..self.row_count()).collect();
        order.sort_by_key(|&r| self.min_col(r).map_or(ColIndex::MAX, |c| c));
        let mut sorted = Self::new(self.col_count);
        for row in order {
            sorted.append_row(self, row);
        }
        *self = sorted;
    }

    /// Drops all rows and entries, keeping the column count.
    pub fn clear(&mut self) {
        self.values.clear();
        self.col_indices.clear();
        self.rows.clear();
    }
}
