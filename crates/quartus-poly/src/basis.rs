//! The plain polynomial basis.
//!
//! Generators are stored by index; everything else in the engine refers
//! to them by `usize`. A divisor lookup over the live lead monomials
//! answers reducer queries.

use std::sync::Arc;

use quartus_monoid::{Mono, MonoMonoid};
use quartus_rings::PrimeField;
use tracing::debug;

use crate::divisor::{DivisorLookup, LookupKind};
use crate::poly::Poly;

#[derive(Debug)]
struct GenEntry {
    poly: Poly,
    retired: bool,
    was_reducer: bool,
    was_non_signature_reducer: bool,
}

/// An indexed sequence of monic generators with a lead-monomial lookup.
#[derive(Debug)]
pub struct PolyBasis {
    monoid: Arc<MonoMonoid>,
    field: PrimeField,
    entries: Vec<GenEntry>,
    lookup: DivisorLookup,
    prefer_sparse: bool,
}

impl PolyBasis {
    /// Creates an empty basis.
    #[must_use]
    pub fn new(
        monoid: Arc<MonoMonoid>,
        field: PrimeField,
        lookup_kind: LookupKind,
        prefer_sparse: bool,
    ) -> Self {
        let lookup = DivisorLookup::new(lookup_kind, monoid.var_count());
        Self {
            monoid,
            field,
            entries: Vec::new(),
            lookup,
            prefer_sparse,
        }
    }

    /// The monoid shared by every monomial in the basis.
    #[must_use]
    pub fn monoid(&self) -> &Arc<MonoMonoid> {
        &self.monoid
    }

    /// The coefficient field.
    #[must_use]
    pub fn field(&self) -> &PrimeField {
        &self.field
    }

    /// The number of generators ever inserted, retired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no generator was ever inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of non-retired generators.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.retired).count()
    }

    /// The generator at `index`.
    #[must_use]
    pub fn poly(&self, index: usize) -> &Poly {
        &self.entries[index].poly
    }

    /// The lead monomial of generator `index`.
    ///
    /// # Panics
    ///
    /// Panics if the generator is the zero polynomial, which the basis
    /// never stores.
    #[must_use]
    pub fn lead_mono(&self, index: usize) -> &Mono {
        self.entries[index]
            .poly
            .lead_mono()
            .expect("basis stores no zero polynomial")
    }

    /// True if the generator was retired.
    #[must_use]
    pub fn is_retired(&self, index: usize) -> bool {
        self.entries[index].retired
    }

    /// Iterates over the indices of live generators.
    pub fn live_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.retired)
            .map(|(i, _)| i)
    }

    /// Inserts a monic generator and returns its index.
    pub fn insert(&mut self, poly: Poly) -> usize {
        debug_assert_eq!(poly.lead_coef(), Some(1), "generators must be monic");
        poly.finalize(&self.monoid);
        let index = self.entries.len();
        let lead = poly
            .lead_mono()
            .expect("cannot insert the zero polynomial")
            .clone();
        debug!(index, lead = %lead, terms = poly.term_count(), "basis insert");
        self.lookup.insert(lead, index);
        self.entries.push(GenEntry {
            poly,
            retired: false,
            was_reducer: false,
            was_non_signature_reducer: false,
        });
        index
    }

    /// Retires a generator, removing it from reducer queries.
    ///
    /// Returns the retired polynomial for possible re-reduction.
    pub fn retire(&mut self, index: usize) -> Poly {
        debug_assert!(!self.entries[index].retired);
        let lead = self.lead_mono(index).clone();
        self.lookup.remove(&lead);
        self.entries[index].retired = true;
        std::mem::take(&mut self.entries[index].poly)
    }

    /// Chooses the reducer for `mono` among live generators whose lead
    /// divides it.
    ///
    /// With `prefer_sparse`, the fewest-term divisor wins, ties broken by
    /// smallest index; otherwise the smallest index wins outright.
    #[must_use]
    pub fn classic_reducer(&self, mono: &Mono) -> Option<usize> {
        let mut best: Option<usize> = None;
        self.lookup.for_each_divisor(&self.monoid, mono, |e| {
            match best {
                None => best = Some(e.index),
                Some(current) => {
                    if self.prefer_sparse {
                        let new_terms = self.entries[e.index].poly.term_count();
                        let old_terms = self.entries[current].poly.term_count();
                        if new_terms < old_terms
                            || (new_terms == old_terms && e.index < current)
                        {
                            best = Some(e.index);
                        }
                    } else if e.index < current {
                        best = Some(e.index);
                    }
                }
            }
            true
        });
        best
    }

    /// Returns any live generator whose lead divides `mono`.
    #[must_use]
    pub fn find_any_lead_divisor(&self, mono: &Mono) -> Option<usize> {
        self.lookup
            .find_any_divisor(&self.monoid, mono)
            .map(|e| e.index)
    }

    /// Visits every live generator whose lead divides `mono`.
    pub fn for_each_lead_divisor<F>(&self, mono: &Mono, mut sink: F)
    where
        F: FnMut(usize) -> bool,
    {
        self.lookup
            .for_each_divisor(&self.monoid, mono, |e| sink(e.index));
    }

    /// Collects the live generators whose lead is a multiple of `mono`,
    /// excluding `exclude`.
    #[must_use]
    pub fn lead_multiples(&self, mono: &Mono, exclude: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.lookup.for_each_multiple(&self.monoid, mono, |e| {
            if e.index != exclude {
                out.push(e.index);
            }
            true
        });
        out.sort_unstable();
        out
    }

    /// Records that a generator was chosen as a reducer.
    pub fn note_was_reducer(&mut self, index: usize) {
        self.entries[index].was_reducer = true;
    }

    /// Records that a generator was rejected as a reducer only by the
    /// signature criterion.
    pub fn note_was_non_signature_reducer(&mut self, index: usize) {
        self.entries[index].was_non_signature_reducer = true;
    }

    /// True if the generator ever served as a reducer.
    #[must_use]
    pub fn was_reducer(&self, index: usize) -> bool {
        self.entries[index].was_reducer
    }

    /// True if the generator was ever a candidate reducer blocked only by
    /// its signature.
    #[must_use]
    pub fn was_non_signature_reducer(&self, index: usize) -> bool {
        self.entries[index].was_non_signature_reducer
    }

    /// Replaces a generator's polynomial in place, keeping its lead.
    ///
    /// Used by auto tail reduction, which never changes the lead term.
    pub fn replace_tail(&mut self, index: usize, poly: Poly) {
        debug_assert_eq!(poly.lead_mono(), self.entries[index].poly.lead_mono());
        self.entries[index].poly = poly;
    }
}
