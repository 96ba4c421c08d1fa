//! F4 row reduction.
//!
//! Every bottom row is scattered into a dense 64-bit scratch vector and
//! eliminated against the top pivot rows with deferred modular reduction;
//! the surviving right-column parts are then echelonized among themselves
//! so the output is canonical.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::debug;

use quartus_rings::{PrimeField, Scalar};

use crate::quad_matrix::QuadMatrix;
use crate::sparse_matrix::{ColIndex, SparseMatrix};

/// Reduces the bottom rows of `quad` against its top rows.
///
/// Returns a sparse matrix over the right columns whose rows are the
/// nonzero reduced remainders: fully inter-reduced, monic, ordered by
/// ascending lead monomial (descending lead column index) with ties
/// broken by original bottom-row index.
#[must_use]
pub fn reduce_quad(quad: &QuadMatrix, field: &PrimeField) -> SparseMatrix {
    let left_count = quad.left_monos.len();
    let right_count = quad.right_monos.len();
    let bottom_rows = quad.bottom_row_count();
    debug!(
        left = left_count,
        right = right_count,
        bottom = bottom_rows,
        entries = quad.entry_count(),
        "reducing quad matrix"
    );

    // Multipliers that make each top row monic, indexed by pivot column.
    let scale: Vec<Scalar> = (0..left_count)
        .map(|row| {
            let pivot = quad
                .top_left
                .row_iter(row)
                .find(|&(col, _)| col as usize == row)
                .map_or(1, |(_, s)| s);
            field.inverse(pivot).unwrap_or(1)
        })
        .collect();

    // Independent bottom-row eliminations, each with its own scratch.
    let reduced: Vec<(usize, Vec<(ColIndex, Scalar)>)> = (0..bottom_rows)
        .into_par_iter()
        .filter_map(|row| {
            let right = reduce_bottom_row(quad, field, &scale, row);
            (!right.is_empty()).then_some((row, right))
        })
        .collect();

    // Deterministic order: ascending lead monomial, then original index.
    let mut ordered = reduced;
    ordered.sort_by(|(ia, ra), (ib, rb)| {
        let lead_a = ra[0].0;
        let lead_b = rb[0].0;
        lead_b.cmp(&lead_a).then(ia.cmp(ib))
    });

    echelonize(ordered, right_count, field)
}

// Eliminates the left portion of one bottom row, returning the sparse
// right-column remainder sorted by column.
fn reduce_bottom_row(
    quad: &QuadMatrix,
    field: &PrimeField,
    scale: &[Scalar],
    row: usize,
) -> Vec<(ColIndex, Scalar)> {
    let left_count = quad.left_monos.len();
    let right_count = quad.right_monos.len();
    let mut dense = vec![0u64; left_count + right_count];
    for (col, s) in quad.bottom_left.row_iter(row) {
        dense[col as usize] += s as u64;
    }
    for (col, s) in quad.bottom_right.row_iter(row) {
        dense[left_count + col as usize] += s as u64;
    }

    // Ascending column index is descending monomial order, so each pivot
    // elimination only feeds columns to its right.
    for c in 0..left_count {
        let residue = field.reduce_accumulated(dense[c]);
        if residue == 0 {
            continue;
        }
        let mult = field.mul(residue, scale[c]);
        let neg = field.negate(mult) as u64;
        for (col, s) in quad.top_left.row_iter(c) {
            if col as usize != c {
                dense[col as usize] += neg * s as u64;
            }
        }
        for (col, s) in quad.top_right.row_iter(c) {
            dense[left_count + col as usize] += neg * s as u64;
        }
    }

    let mut right: Vec<(ColIndex, Scalar)> = Vec::new();
    for col in 0..right_count {
        let v = field.reduce_accumulated(dense[left_count + col]);
        if v != 0 {
            right.push((col as ColIndex, v));
        }
    }
    right
}

// Mutual elimination of the reduced rows, in the order given; the result
// is a reduced echelon set, each row monic.
fn echelonize(
    rows: Vec<(usize, Vec<(ColIndex, Scalar)>)>,
    right_count: usize,
    field: &PrimeField,
) -> SparseMatrix {
    // Pivot column -> position in `pivots`.
    let mut pivot_of_col: FxHashMap<ColIndex, usize> = FxHashMap::default();
    let mut pivots: Vec<Vec<(ColIndex, Scalar)>> = Vec::new();

    for (_, row) in rows {
        let mut dense = vec![0u64; right_count];
        for &(col, s) in &row {
            dense[col as usize] = s as u64;
        }
        // Eliminate every known pivot occurring in this row.
        for col in 0..right_count {
            let residue = field.reduce_accumulated(dense[col]);
            dense[col] = residue as u64;
            if residue == 0 {
                continue;
            }
            let Some(&pivot_pos) = pivot_of_col.get(&(col as ColIndex)) else {
                continue;
            };
            let neg = field.negate(residue) as u64;
            for &(pcol, ps) in &pivots[pivot_pos] {
                dense[pcol as usize] += neg * ps as u64;
            }
            dense[col] = 0;
        }

        let mut reduced: Vec<(ColIndex, Scalar)> = Vec::new();
        for col in 0..right_count {
            let v = field.reduce_accumulated(dense[col]);
            if v != 0 {
                reduced.push((col as ColIndex, v));
            }
        }
        if reduced.is_empty() {
            continue;
        }

        // Make monic on the lead (minimal column = greatest monomial).
        let inv = field.inverse(reduced[0].1).unwrap_or(1);
        for (_, s) in &mut reduced {
            *s = field.mul(*s, inv);
        }

        // Back-substitute into the existing pivot rows.
        let lead = reduced[0].0;
        for pivot in &mut pivots {
            let Some(pos) = pivot.iter().position(|&(c, _)| c == lead) else {
                continue;
            };
            let coef = pivot[pos].1;
            let neg = field.negate(coef);
            let mut merged: Vec<(ColIndex, Scalar)> = Vec::with_capacity(pivot.len());
            let mut i = 0;
            let mut j = 0;
            while i < pivot.len() || j < reduced.len() {
                let next_old = pivot.get(i).map(|&(c, _)| c);
                let next_new = reduced.get(j).map(|&(c, _)| c);
                match (next_old, next_new) {
                    (Some(a), Some(b)) if a == b => {
                        let v = field.add(pivot[i].1, field.mul(neg, reduced[j].1));
                        if v != 0 {
                            merged.push((a, v));
                        }
                        i += 1;
                        j += 1;
                    }
                    (Some(a), Some(b)) if a < b => {
                        merged.push(pivot[i]);
                        i += 1;
                    }
                    (Some(_), Some(_)) | (None, Some(_)) => {
                        let v = field.mul(neg, reduced[j].1);
                        if v != 0 {
                            merged.push((reduced[j].0, v));
                        }
                        j += 1;
                    }
                    (Some(_), None) => {
                        merged.push(pivot[i]);
                        i += 1;
                    }
                    (None, None) => unreachable!(),
                }
            }
            *pivot = merged;
        }

        pivot_of_col.insert(lead, pivots.len());
        pivots.push(reduced);
    }

    // Canonical order: ascending lead monomial = descending lead column.
    pivots.sort_by(|a, b| b[0].0.cmp(&a[0].0));

    let mut out = SparseMatrix::new(right_count as ColIndex);
    for row in pivots {
        for (col, s) in row {
            out.append_entry(col, s);
        }
        out.row_done();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartus_monoid::{MonoMonoid, MonoOrder};

    // A tiny hand-built system:
    //   left columns:  [x^2, xy]   right columns: [y^2, y, 1]
    //   top rows: x^2 + y^2 (pivot x^2), xy + y (pivot xy)
    //   bottom row: x^2 + 2*xy + 1
    // Eliminating gives  -y^2 - 2y + 1, monic  y^2 + 2y - 1 ... times -1.
    fn tiny_quad() -> (QuadMatrix, PrimeField, MonoMonoid) {
        let field = PrimeField::new(101).unwrap();
        let monoid = MonoMonoid::new(2, MonoOrder::Grevlex);
        let mut quad = QuadMatrix::default();
        quad.left_monos = vec![
            monoid.set_exponents(&[2, 0]).unwrap(),
            monoid.set_exponents(&[1, 1]).unwrap(),
        ];
        quad.right_monos = vec![
            monoid.set_exponents(&[0, 2]).unwrap(),
            monoid.set_exponents(&[0, 1]).unwrap(),
            monoid.set_exponents(&[0, 0]).unwrap(),
        ];
        quad.top_left = SparseMatrix::new(2);
        quad.top_right = SparseMatrix::new(3);
        quad.bottom_left = SparseMatrix::new(2);
        quad.bottom_right = SparseMatrix::new(3);

        quad.top_left.append_entry(0, 1);
        quad.top_left.row_done();
        quad.top_right.append_entry(0, 1);
        quad.top_right.row_done();

        quad.top_left.append_entry(1, 1);
        quad.top_left.row_done();
        quad.top_right.append_entry(1, 1);
        quad.top_right.row_done();

        quad.bottom_left.append_entry(0, 1);
        quad.bottom_left.append_entry(1, 2);
        quad.bottom_left.row_done();
        quad.bottom_right.append_entry(2, 1);
        quad.bottom_right.row_done();

        (quad, field, monoid)
    }

    #[test]
    fn eliminates_left_columns() {
        let (quad, field, monoid) = tiny_quad();
        quad.debug_check(&monoid);
        let reduced = reduce_quad(&quad, &field);
        assert_eq!(reduced.row_count(), 1);
        // x^2 + 2xy + 1 - (x^2 + y^2) - 2(xy + y) = -y^2 - 2y + 1,
        // monic: y^2 + 2y - 1 = y^2 + 2y + 100.
        let row: Vec<_> = reduced.row_iter(0).collect();
        assert_eq!(row, vec![(0, 1), (1, 2), (2, 100)]);
    }

    #[test]
    fn zero_rows_are_dropped() {
        let (mut quad, field, _) = tiny_quad();
        // A bottom row equal to the first top row reduces to zero.
        quad.bottom_left.append_entry(0, 1);
        quad.bottom_left.row_done();
        quad.bottom_right.append_entry(0, 1);
        quad.bottom_right.row_done();
        let reduced = reduce_quad(&quad, &field);
        assert_eq!(reduced.row_count(), 1);
    }

    #[test]
    fn duplicate_bottom_rows_collapse() {
        let (mut quad, field, _) = tiny_quad();
        // Repeat the existing bottom row; echelonization leaves one copy.
        quad.bottom_left.append_entry(0, 1);
        quad.bottom_left.append_entry(1, 2);
        quad.bottom_left.row_done();
        quad.bottom_right.append_entry(2, 1);
        quad.bottom_right.row_done();
        let reduced = reduce_quad(&quad, &field);
        assert_eq!(reduced.row_count(), 1);
    }
}
