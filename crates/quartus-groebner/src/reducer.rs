//! The classical polynomial reducer.
//!
//! A reduction is a sum of polynomial multiples streamed through a
//! priority queue of hash-table nodes: `lead_term` peels nodes whose
//! coefficients cancelled to zero, `remove_lead_term` advances every
//! record that contributed the popped monomial. The queue backend is a
//! configuration choice; all backends satisfy the same contract.

use std::cmp::Ordering;

use quartus_monoid::{Mono, MonoError, MonoMonoid};
use quartus_poly::{Poly, PolyBasis, SigPolyBasis};
use quartus_rings::{PrimeField, Scalar};

use crate::config::QueueKind;
use crate::error::Error;
use crate::hash_table::{Inserted, PolyHashTable, Record};
use crate::queue::MonoQueue;

/// Streams the sorted, coefficient-combined terms of Σ mᵢ·fᵢ.
#[derive(Debug)]
pub struct ClassicReducer<'a> {
    monoid: &'a MonoMonoid,
    field: &'a PrimeField,
    table: PolyHashTable<'a>,
    queue: MonoQueue<usize>,
}

impl<'a> ClassicReducer<'a> {
    /// Creates an empty reducer.
    #[must_use]
    pub fn new(monoid: &'a MonoMonoid, field: &'a PrimeField, kind: QueueKind) -> Self {
        Self {
            monoid,
            field,
            table: PolyHashTable::new(),
            queue: MonoQueue::new(kind),
        }
    }

    /// Queues the multiple `(mult_coef * mult_mono) * poly`.
    pub fn insert(
        &mut self,
        mult_coef: Scalar,
        mult_mono: Mono,
        poly: &'a Poly,
    ) -> Result<(), MonoError> {
        self.push_record(Record {
            poly,
            mult_coef,
            mult_mono,
            cursor: 0,
        })
    }

    /// As [`Self::insert`], starting after the lead term.
    ///
    /// Used when the multiple's lead is known to cancel against a term
    /// that was just removed.
    pub fn insert_tail(
        &mut self,
        mult_coef: Scalar,
        mult_mono: Mono,
        poly: &'a Poly,
    ) -> Result<(), MonoError> {
        self.push_record(Record {
            poly,
            mult_coef,
            mult_mono,
            cursor: 1,
        })
    }

    /// The greatest monomial with a nonzero accumulated coefficient.
    ///
    /// Nodes whose coefficients summed to zero are peeled off and their
    /// records advanced until a nonzero lead is found or the queue
    /// empties.
    pub fn lead_term(&mut self) -> Result<Option<(Mono, Scalar)>, MonoError> {
        loop {
            let Some(&top) = self.peek_top() else {
                return Ok(None);
            };
            if self.table.coef(top) != 0 {
                return Ok(Some((self.table.mono(top).clone(), self.table.coef(top))));
            }
            self.pop_and_advance()?;
        }
    }

    /// Drops the current lead term, advancing every record behind it.
    pub fn remove_lead_term(&mut self) -> Result<(), MonoError> {
        self.pop_and_advance()
    }

    /// Drains the reducer into a polynomial.
    pub fn extract(&mut self) -> Result<Poly, MonoError> {
        let mut out = Poly::zero();
        while let Some((mono, coef)) = self.lead_term()? {
            out.append_term(coef, mono);
            self.remove_lead_term()?;
        }
        Ok(out)
    }

    fn peek_top(&self) -> Option<&usize> {
        let table = &self.table;
        let monoid = self.monoid;
        let cmp =
            move |a: &usize, b: &usize| monoid.compare(table.mono(*a), table.mono(*b));
        self.queue.peek(&cmp)
    }

    fn pop_and_advance(&mut self) -> Result<(), MonoError> {
        let table = &self.table;
        let monoid = self.monoid;
        let cmp =
            move |a: &usize, b: &usize| monoid.compare(table.mono(*a), table.mono(*b));
        let Some(top) = self.queue.pop(&cmp) else {
            return Ok(());
        };
        let (_, _, records) = self.table.take(top);
        for mut record in records {
            record.cursor += 1;
            self.push_record(record)?;
        }
        Ok(())
    }

    fn push_record(&mut self, record: Record<'a>) -> Result<(), MonoError> {
        let Some(term) = record.poly.terms().get(record.cursor) else {
            return Ok(());
        };
        let current = self.monoid.multiply(&record.mult_mono, &term.mono)?;
        let contribution = self.field.mul(record.mult_coef, term.coef);
        if let Inserted::New(id) = self.table.insert(self.field, current, contribution, record)
        {
            let table = &self.table;
            let monoid = self.monoid;
            let cmp =
                move |a: &usize, b: &usize| monoid.compare(table.mono(*a), table.mono(*b));
            self.queue.push(id, &cmp);
        }
        Ok(())
    }
}

/// What a classical reduction produced.
#[derive(Debug)]
pub struct Reduced {
    /// The remainder; zero means a syzygy.
    pub poly: Poly,
    /// The generators that served as reducers, for the basis flags.
    pub reducers_used: Vec<usize>,
}

/// Computes the normal form of the S-polynomial of generators `i` and `j`.
pub fn classic_reduce_spair(
    basis: &PolyBasis,
    kind: QueueKind,
    i: usize,
    j: usize,
) -> Result<Reduced, Error> {
    let monoid = basis.monoid();
    let field = basis.field();
    let (u, v) = monoid.colons(basis.lead_mono(i), basis.lead_mono(j));
    let mut reducer = ClassicReducer::new(monoid, field, kind);
    // Generators are monic, so coefficients 1 and -1 cancel the lcm.
    reducer
        .insert(1, v, basis.poly(i))
        .map_err(|e| Error::overflow(i, e))?;
    reducer
        .insert(field.negate(1), u, basis.poly(j))
        .map_err(|e| Error::overflow(j, e))?;
    run_reduction(&mut reducer, basis, Poly::zero(), i)
}

/// Computes the normal form of `poly` against the basis.
pub fn classic_reduce(
    poly: &Poly,
    basis: &PolyBasis,
    kind: QueueKind,
) -> Result<Reduced, Error> {
    let monoid = basis.monoid();
    let mut reducer = ClassicReducer::new(monoid, basis.field(), kind);
    reducer
        .insert(1, monoid.identity(), poly)
        .map_err(|e| Error::overflow(basis.len(), e))?;
    run_reduction(&mut reducer, basis, Poly::zero(), basis.len())
}

/// Reduces every non-lead term of `poly`, keeping the lead untouched.
pub fn classic_tail_reduce(
    poly: &Poly,
    basis: &PolyBasis,
    kind: QueueKind,
) -> Result<Reduced, Error> {
    let Some(lead) = poly.lead_term() else {
        return Ok(Reduced {
            poly: Poly::zero(),
            reducers_used: Vec::new(),
        });
    };
    let monoid = basis.monoid();
    let mut reducer = ClassicReducer::new(monoid, basis.field(), kind);
    reducer
        .insert_tail(1, monoid.identity(), poly)
        .map_err(|e| Error::overflow(basis.len(), e))?;
    let mut seeded = Poly::zero();
    seeded.append_term(lead.coef, lead.mono.clone());
    run_reduction(&mut reducer, basis, seeded, basis.len())
}

// The shared reduction loop: pop the lead; if a basis element's lead
// divides it, cancel it with the tail of that multiple, otherwise move it
// to the output.
fn run_reduction<'a>(
    reducer: &mut ClassicReducer<'a>,
    basis: &'a PolyBasis,
    mut out: Poly,
    error_gen: usize,
) -> Result<Reduced, Error> {
    let monoid = basis.monoid();
    let field = basis.field();
    let mut reducers_used = Vec::new();
    loop {
        let Some((mono, coef)) = reducer
            .lead_term()
            .map_err(|e| Error::overflow(error_gen, e))?
        else {
            break;
        };
        reducer
            .remove_lead_term()
            .map_err(|e| Error::overflow(error_gen, e))?;
        match basis.classic_reducer(&mono) {
            Some(k) => {
                let mult = monoid
                    .divide(basis.lead_mono(k), &mono)
                    .map_err(|e| Error::overflow(k, e))?;
                reducer
                    .insert_tail(field.negate(coef), mult, basis.poly(k))
                    .map_err(|e| Error::overflow(k, e))?;
                reducers_used.push(k);
            }
            None => out.append_term(coef, mono),
        }
    }
    Ok(Reduced {
        poly: out,
        reducers_used,
    })
}

/// What a regular (signature-safe) reduction produced.
#[derive(Debug)]
pub struct SigReduced {
    /// The remainder; zero records a syzygy at the reduction's signature.
    pub poly: Poly,
    /// Generators used as regular reducers.
    pub reducers_used: Vec<usize>,
    /// Generators rejected only by the signature comparison.
    pub sig_blocked: Vec<usize>,
}

/// Regular-reduces `mult * g_gen` under signature `sig`.
///
/// A basis element may cancel a term only while its scaled signature
/// stays strictly below `sig`; the remainder is in regular normal form.
pub fn regular_reduce(
    sig_basis: &SigPolyBasis,
    kind: QueueKind,
    sig: &Mono,
    mult: &Mono,
    gen: usize,
) -> Result<SigReduced, Error> {
    let base = sig_basis.base();
    let monoid = base.monoid();
    let field = base.field();
    let mut reducer = ClassicReducer::new(monoid, field, kind);
    reducer
        .insert(1, mult.clone(), base.poly(gen))
        .map_err(|e| Error::overflow(gen, e))?;

    let mut out = Poly::zero();
    let mut reducers_used = Vec::new();
    let mut sig_blocked = Vec::new();
    loop {
        let Some((mono, coef)) = reducer
            .lead_term()
            .map_err(|e| Error::overflow(gen, e))?
        else {
            break;
        };
        reducer
            .remove_lead_term()
            .map_err(|e| Error::overflow(gen, e))?;
        let (found, blocked) = sig_basis.regular_reducer(sig, &mono);
        sig_blocked.extend(blocked);
        match found {
            Some(k) => {
                let step = monoid
                    .divide(base.lead_mono(k), &mono)
                    .map_err(|e| Error::overflow(k, e))?;
                reducer
                    .insert_tail(field.negate(coef), step, base.poly(k))
                    .map_err(|e| Error::overflow(k, e))?;
                reducers_used.push(k);
            }
            None => out.append_term(coef, mono),
        }
    }
    Ok(SigReduced {
        poly: out,
        reducers_used,
        sig_blocked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartus_monoid::MonoOrder;
    use quartus_poly::LookupKind;
    use std::sync::Arc;

    fn setup() -> (Arc<MonoMonoid>, PrimeField) {
        (
            Arc::new(MonoMonoid::new(3, MonoOrder::Grevlex)),
            PrimeField::new(101).unwrap(),
        )
    }

    fn poly(
        monoid: &MonoMonoid,
        field: &PrimeField,
        terms: &[(i64, &[u16])],
    ) -> Poly {
        Poly::from_terms(
            monoid,
            field,
            terms
                .iter()
                .map(|(c, e)| (field.from_i64(*c), monoid.set_exponents(e).unwrap()))
                .collect(),
        )
    }

    fn queue_kinds() -> [QueueKind; 4] {
        [
            QueueKind::Heap,
            QueueKind::Tournament,
            QueueKind::Geobucket,
            QueueKind::Pairing,
        ]
    }

    #[test]
    fn streams_sorted_combined_terms() {
        let (monoid, field) = setup();
        // f = x + y, g = y + z; f + 100*g = x + 0*y - ... wait: x + y + 100y + 100z
        // = x + 101y + 100z = x + 100z over GF(101): y cancels inside the queue.
        let f = poly(&monoid, &field, &[(1, &[1, 0, 0]), (1, &[0, 1, 0])]);
        let g = poly(&monoid, &field, &[(1, &[0, 1, 0]), (1, &[0, 0, 1])]);
        for kind in queue_kinds() {
            let mut reducer = ClassicReducer::new(&monoid, &field, kind);
            reducer.insert(1, monoid.identity(), &f).unwrap();
            reducer.insert(100, monoid.identity(), &g).unwrap();
            let sum = reducer.extract().unwrap();
            assert_eq!(sum.term_count(), 2, "kind {kind:?}");
            assert_eq!(sum.terms()[0].mono.exponents(), &[1, 0, 0]);
            assert_eq!(sum.terms()[1].mono.exponents(), &[0, 0, 1]);
            assert_eq!(sum.terms()[1].coef, 100);
        }
    }

    #[test]
    fn multiplier_monomials_shift_terms() {
        let (monoid, field) = setup();
        let f = poly(&monoid, &field, &[(1, &[1, 0, 0]), (2, &[0, 0, 0])]);
        let x1 = monoid.var(1);
        for kind in queue_kinds() {
            let mut reducer = ClassicReducer::new(&monoid, &field, kind);
            reducer.insert(3, x1.clone(), &f).unwrap();
            let sum = reducer.extract().unwrap();
            // 3y * (x + 2) = 3xy + 6y.
            assert_eq!(sum.term_count(), 2);
            assert_eq!(sum.terms()[0].mono.exponents(), &[1, 1, 0]);
            assert_eq!(sum.terms()[0].coef, 3);
            assert_eq!(sum.terms()[1].mono.exponents(), &[0, 1, 0]);
            assert_eq!(sum.terms()[1].coef, 6);
        }
    }

    #[test]
    fn spair_reduction_in_a_small_basis() {
        let (monoid, field) = setup();
        let mut basis = PolyBasis::new(
            Arc::clone(&monoid),
            field.clone(),
            LookupKind::DivList,
            true,
        );
        // g0 = x^2 - y, g1 = xy - z (variables x > y > z).
        basis.insert(poly(&monoid, &field, &[(1, &[2, 0, 0]), (-1, &[0, 1, 0])]));
        basis.insert(poly(&monoid, &field, &[(1, &[1, 1, 0]), (-1, &[0, 0, 1])]));

        for kind in queue_kinds() {
            let reduced = classic_reduce_spair(&basis, kind, 0, 1).unwrap();
            // S = y*g0 - x*g1 = xz - y^2; irreducible by the basis.
            let p = &reduced.poly;
            assert_eq!(p.term_count(), 2);
            assert_eq!(p.terms()[0].mono.exponents(), &[0, 2, 0]);
            assert_eq!(p.terms()[1].mono.exponents(), &[1, 0, 1]);
        }
    }

    #[test]
    fn tail_reduce_keeps_the_lead() {
        let (monoid, field) = setup();
        let mut basis = PolyBasis::new(
            Arc::clone(&monoid),
            field.clone(),
            LookupKind::DivList,
            true,
        );
        // g0 = y - z.
        basis.insert(poly(&monoid, &field, &[(1, &[0, 1, 0]), (-1, &[0, 0, 1])]));
        // p = x + y; tail y reduces to z.
        let p = poly(&monoid, &field, &[(1, &[1, 0, 0]), (1, &[0, 1, 0])]);
        let reduced = classic_tail_reduce(&p, &basis, QueueKind::Heap).unwrap();
        assert_eq!(reduced.poly.terms()[0].mono.exponents(), &[1, 0, 0]);
        assert_eq!(reduced.poly.terms()[1].mono.exponents(), &[0, 0, 1]);
        assert_eq!(reduced.reducers_used, vec![0]);
    }

    #[test]
    fn full_reduction_to_zero_is_a_syzygy() {
        let (monoid, field) = setup();
        let mut basis = PolyBasis::new(
            Arc::clone(&monoid),
            field.clone(),
            LookupKind::DivList,
            true,
        );
        basis.insert(poly(&monoid, &field, &[(1, &[1, 0, 0])])); // x
        let p = poly(&monoid, &field, &[(1, &[2, 0, 0]), (1, &[1, 0, 1])]); // x^2 + xz
        let reduced = classic_reduce(&p, &basis, QueueKind::Heap).unwrap();
        assert!(reduced.poly.is_zero());
    }
}
