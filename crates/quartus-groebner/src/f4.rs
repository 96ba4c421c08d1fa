//! The F4 matrix builder and reducer.
//!
//! A group of S-pairs becomes a quad matrix: two bottom rows per pair,
//! one top (reducer) row per reducible monomial found during symbolic
//! closure. Left columns are the monomials owned by some reducer row's
//! lead, right columns the rest; both lists sort in parallel before the
//! matrix rows are laid down.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use tracing::debug;

use quartus_linalg::{reduce_quad, MatrixError, QuadMatrix, SparseMatrix};
use quartus_monoid::Mono;
use quartus_poly::{Poly, PolyBasis};

use crate::error::Error;

// One scheduled row: a generator multiplied by a monomial.
#[derive(Debug, Clone)]
struct RowSpec {
    gen: usize,
    mult: Mono,
}

/// Reduces a group of S-pairs through the quad-matrix path.
///
/// The returned candidates are monic, mutually reduced, and ordered by
/// ascending lead monomial; zero rows are dropped (counted by the caller
/// as syzygies via the difference from `2 * pairs.len()` bottom rows).
pub fn reduce_spairs_f4(
    basis: &PolyBasis,
    pairs: &[(usize, usize)],
) -> Result<Vec<Poly>, Error> {
    if pairs.is_empty() {
        return Ok(Vec::new());
    }
    let quad = build_quad(basis, pairs)?;
    quad.debug_check(basis.monoid());
    let reduced = reduce_quad(&quad, basis.field());

    let mut out = Vec::with_capacity(reduced.row_count());
    for row in 0..reduced.row_count() {
        let mut poly = Poly::zero();
        for (col, scalar) in reduced.row_iter(row) {
            poly.append_term(scalar, quad.right_monos[col as usize].clone());
        }
        poly.finalize(basis.monoid());
        out.push(poly);
    }
    Ok(out)
}

// Assembles the quad matrix for the given pairs.
fn build_quad(basis: &PolyBasis, pairs: &[(usize, usize)]) -> Result<QuadMatrix, Error> {
    let monoid = basis.monoid();

    // Interned columns; is_left marks monomials owned by a reducer row.
    let mut col_of: FxHashMap<Mono, u32> = FxHashMap::default();
    let mut col_monos: Vec<Mono> = Vec::new();
    let mut is_left: Vec<bool> = Vec::new();
    let mut top_specs: Vec<(RowSpec, u32)> = Vec::new();
    let mut work: VecDeque<RowSpec> = VecDeque::new();

    let mut intern = |mono: Mono,
                      top_specs: &mut Vec<(RowSpec, u32)>,
                      work: &mut VecDeque<RowSpec>|
     -> Result<u32, Error> {
        if let Some(&col) = col_of.get(&mono) {
            return Ok(col);
        }
        if col_monos.len() >= u32::MAX as usize {
            return Err(MatrixError::TooManyColumns.into());
        }
        let col = col_monos.len() as u32;
        col_of.insert(mono.clone(), col);
        // The deterministic reducer choice keeps the matrix identical
        // across divisor-lookup implementations.
        let reducer = basis.classic_reducer(&mono);
        if let Some(gen) = reducer {
            let mult = monoid
                .divide(basis.lead_mono(gen), &mono)
                .map_err(|e| Error::overflow(gen, e))?;
            let spec = RowSpec { gen, mult };
            top_specs.push((spec.clone(), col));
            work.push_back(spec);
            is_left.push(true);
        } else {
            is_left.push(false);
        }
        col_monos.push(mono);
        Ok(col)
    };

    // Phase 1: two bottom rows per S-pair.
    let mut bottom_specs: Vec<RowSpec> = Vec::with_capacity(2 * pairs.len());
    for &(i, j) in pairs {
        let (colon_i, colon_j) = monoid.colons(basis.lead_mono(i), basis.lead_mono(j));
        // lcm / lead_i is the colon of the other lead.
        bottom_specs.push(RowSpec { gen: i, mult: colon_j });
        bottom_specs.push(RowSpec { gen: j, mult: colon_i });
    }
    for spec in &bottom_specs {
        work.push_back(spec.clone());
    }

    // Phase 2: symbolic closure over every scheduled row's monomials.
    while let Some(spec) = work.pop_front() {
        for term in basis.poly(spec.gen).terms() {
            let product = monoid
                .multiply(&spec.mult, &term.mono)
                .map_err(|e| Error::overflow(spec.gen, e))?;
            intern(product, &mut top_specs, &mut work)?;
        }
    }

    // Phase 3: split columns and sort each side descending, in parallel.
    let mut left_cols: Vec<u32> = (0..col_monos.len() as u32)
        .filter(|&c| is_left[c as usize])
        .collect();
    let mut right_cols: Vec<u32> = (0..col_monos.len() as u32)
        .filter(|&c| !is_left[c as usize])
        .collect();
    rayon::join(
        || left_cols.sort_by(|&a, &b| monoid.compare(&col_monos[b as usize], &col_monos[a as usize])),
        || right_cols.sort_by(|&a, &b| monoid.compare(&col_monos[b as usize], &col_monos[a as usize])),
    );

    // Phase 4: the induced permutation, applied as the rows are laid down.
    let mut side_index: Vec<u32> = vec![0; col_monos.len()];
    for (new, &old) in left_cols.iter().enumerate() {
        side_index[old as usize] = new as u32;
    }
    for (new, &old) in right_cols.iter().enumerate() {
        side_index[old as usize] = new as u32;
    }

    let left_monos: Vec<Mono> = left_cols
        .iter()
        .map(|&c| col_monos[c as usize].clone())
        .collect();
    let right_monos: Vec<Mono> = right_cols
        .iter()
        .map(|&c| col_monos[c as usize].clone())
        .collect();
    let mut quad = QuadMatrix {
        top_left: SparseMatrix::new(left_monos.len() as u32),
        top_right: SparseMatrix::new(right_monos.len() as u32),
        bottom_left: SparseMatrix::new(left_monos.len() as u32),
        bottom_right: SparseMatrix::new(right_monos.len() as u32),
        left_monos,
        right_monos,
    };

    // Top rows in ascending pivot order: one per left column.
    let mut tops = top_specs;
    tops.sort_by_key(|(_, lead_col)| side_index[*lead_col as usize]);
    for (spec, _) in &tops {
        append_row(
            basis,
            spec,
            &col_of,
            &is_left,
            &side_index,
            &mut quad.top_left,
            &mut quad.top_right,
        )?;
    }
    for spec in &bottom_specs {
        append_row(
            basis,
            spec,
            &col_of,
            &is_left,
            &side_index,
            &mut quad.bottom_left,
            &mut quad.bottom_right,
        )?;
    }

    debug!(
        pairs = pairs.len(),
        left = quad.left_monos.len(),
        right = quad.right_monos.len(),
        entries = quad.entry_count(),
        "built quad matrix"
    );
    Ok(quad)
}

// Lays one polynomial multiple down across the left/right pair of
// matrices. Terms are visited in descending monomial order, which lands
// entries in ascending column order on both sides.
fn append_row(
    basis: &PolyBasis,
    spec: &RowSpec,
    col_of: &FxHashMap<Mono, u32>,
    is_left: &[bool],
    side_index: &[u32],
    left: &mut SparseMatrix,
    right: &mut SparseMatrix,
) -> Result<(), Error> {
    let monoid = basis.monoid();
    for term in basis.poly(spec.gen).terms() {
        let product = monoid
            .multiply(&spec.mult, &term.mono)
            .map_err(|e| Error::overflow(spec.gen, e))?;
        let col = col_of[&product];
        if is_left[col as usize] {
            left.append_entry(side_index[col as usize], term.coef);
        } else {
            right.append_entry(side_index[col as usize], term.coef);
        }
    }
    left.row_done();
    right.row_done();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueKind;
    use crate::reducer::classic_reduce_spair;
    use quartus_monoid::{MonoMonoid, MonoOrder};
    use quartus_poly::LookupKind;
    use quartus_rings::PrimeField;
    use std::sync::Arc;

    fn basis() -> PolyBasis {
        let monoid = Arc::new(MonoMonoid::new(3, MonoOrder::Grevlex));
        let field = PrimeField::new(101).unwrap();
        let mut basis = PolyBasis::new(monoid.clone(), field.clone(), LookupKind::DivList, true);
        let poly = |terms: &[(i64, &[u16])]| {
            Poly::from_terms(
                &monoid,
                &field,
                terms
                    .iter()
                    .map(|(c, e)| (field.from_i64(*c), monoid.set_exponents(e).unwrap()))
                    .collect(),
            )
        };
        // x^2 - y and xy - z.
        basis.insert(poly(&[(1, &[2, 0, 0]), (-1, &[0, 1, 0])]));
        basis.insert(poly(&[(1, &[1, 1, 0]), (-1, &[0, 0, 1])]));
        basis
    }

    #[test]
    fn f4_matches_the_classic_reducer_on_one_pair() {
        let basis = basis();
        let classic = classic_reduce_spair(&basis, QueueKind::Heap, 0, 1)
            .unwrap()
            .poly;
        let mut f4 = reduce_spairs_f4(&basis, &[(0, 1)]).unwrap();
        assert_eq!(f4.len(), 1);
        let mut from_matrix = f4.pop().unwrap();
        // The classic remainder is not monic; normalize both.
        let field = basis.field();
        let mut classic = classic;
        classic.make_monic(field);
        from_matrix.make_monic(field);
        assert_eq!(from_matrix, classic);
    }

    #[test]
    fn quad_matrix_shape_is_valid() {
        let basis = basis();
        let quad = build_quad(&basis, &[(0, 1)]).unwrap();
        quad.debug_check(basis.monoid());
        assert_eq!(quad.bottom_row_count(), 2);
        // Every left column is the lead of exactly one top row.
        assert_eq!(quad.top_left.row_count(), quad.left_monos.len());
    }
}
