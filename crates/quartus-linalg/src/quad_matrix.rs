//! The four-way split matrix of the F4 reducer.
//!
//! Left columns correspond to pivot (reducer lead) monomials, right
//! columns to the remaining monomials; top rows are the known pivots,
//! bottom rows are the rows to reduce. All four blocks share the two
//! column monomial lists, both sorted in descending monomial order.

use quartus_monoid::{Mono, MonoMonoid};

use crate::sparse_matrix::SparseMatrix;

/// The assembled F4 system.
#[derive(Debug, Default)]
pub struct QuadMatrix {
    /// Pivot rows restricted to the left (pivot) columns.
    pub top_left: SparseMatrix,
    /// Pivot rows restricted to the right columns.
    pub top_right: SparseMatrix,
    /// Rows to reduce, left columns.
    pub bottom_left: SparseMatrix,
    /// Rows to reduce, right columns.
    pub bottom_right: SparseMatrix,
    /// One monomial per left column, descending.
    pub left_monos: Vec<Mono>,
    /// One monomial per right column, descending.
    pub right_monos: Vec<Mono>,
}

impl QuadMatrix {
    /// The number of rows to reduce.
    #[must_use]
    pub fn bottom_row_count(&self) -> usize {
        self.bottom_left.row_count()
    }

    /// The total entry count over the four blocks.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.top_left.entry_count()
            + self.top_right.entry_count()
            + self.bottom_left.entry_count()
            + self.bottom_right.entry_count()
    }

    /// Checks the structural invariants; debug builds only.
    ///
    /// Top row `i` must have its pivot entry on left column `i` (the rows
    /// are sorted by increasing pivot), the column lists must be strictly
    /// descending, and the paired blocks must agree on row counts.
    pub fn debug_check(&self, monoid: &MonoMonoid) {
        if cfg!(debug_assertions) {
            assert_eq!(self.top_left.row_count(), self.top_right.row_count());
            assert_eq!(self.bottom_left.row_count(), self.bottom_right.row_count());
            assert_eq!(self.top_left.row_count(), self.left_monos.len());
            for row in 0..self.top_left.row_count() {
                assert_eq!(self.top_left.min_col(row), Some(row as u32));
            }
            for pair in self.left_monos.windows(2) {
                assert_eq!(
                    monoid.compare(&pair[0], &pair[1]),
                    std::cmp::Ordering::Greater
                );
            }
            for pair in self.right_monos.windows(2) {
                assert_eq!(
                    monoid.compare(&pair[0], &pair[1]),
                    std::cmp::Ordering::Greater
                );
            }
        }
    }
}
