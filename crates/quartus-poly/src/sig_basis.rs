//! The signature-augmented basis.
//!
//! Every generator carries an owned module-monomial signature; no two
//! generators share one. The signature/lead ratios are kept ranked in an
//! auxiliary sorted structure so `ratio_compare` is two array reads.

use std::cmp::Ordering;

use quartus_monoid::{Mono, MonoMonoid};

use crate::basis::PolyBasis;
use crate::divisor::{DivisorLookup, LookupKind};
use crate::poly::Poly;

/// [`PolyBasis`] plus signatures, ratio ranks and a signature lookup.
#[derive(Debug)]
pub struct SigPolyBasis {
    base: PolyBasis,
    signatures: Vec<Mono>,
    // Generator indices ordered by ascending sig/lead ratio.
    sorted_by_ratio: Vec<usize>,
    // ratio_rank[i] is the rank of generator i's ratio; equal ratios share
    // a rank.
    ratio_rank: Vec<usize>,
    sig_lookup: DivisorLookup,
}

impl SigPolyBasis {
    /// Wraps an empty plain basis.
    #[must_use]
    pub fn new(base: PolyBasis, lookup_kind: LookupKind) -> Self {
        debug_assert!(base.is_empty());
        let var_count = base.monoid().var_count();
        Self {
            base,
            signatures: Vec::new(),
            sorted_by_ratio: Vec::new(),
            ratio_rank: Vec::new(),
            sig_lookup: DivisorLookup::new(lookup_kind, var_count),
        }
    }

    /// The underlying plain basis.
    #[must_use]
    pub fn base(&self) -> &PolyBasis {
        &self.base
    }

    /// Mutable access to the underlying plain basis.
    pub fn base_mut(&mut self) -> &mut PolyBasis {
        &mut self.base
    }

    /// The signature of generator `index`.
    #[must_use]
    pub fn signature(&self, index: usize) -> &Mono {
        &self.signatures[index]
    }

    /// True if some generator carries exactly this signature.
    #[must_use]
    pub fn has_signature(&self, sig: &Mono) -> bool {
        self.signatures.contains(sig)
    }

    /// The number of generators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// True if no generator was inserted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Inserts a monic generator with its signature.
    ///
    /// No two generators may share a signature; this is the invariant the
    /// singular criterion relies on.
    pub fn insert(&mut self, poly: Poly, signature: Mono) -> usize {
        debug_assert!(
            !self.signatures.contains(&signature),
            "duplicate signature inserted"
        );
        let index = self.base.insert(poly);
        self.sig_lookup.insert(signature.clone(), index);
        self.signatures.push(signature);
        self.insert_ratio(index);
        index
    }

    /// Compares the sig/lead ratios of two generators.
    #[must_use]
    pub fn ratio_compare(&self, i: usize, j: usize) -> Ordering {
        self.ratio_rank[i].cmp(&self.ratio_rank[j])
    }

    /// Compares `sig` against `mono * (sig_e / lead_e)` for generator `e`.
    ///
    /// `Greater` means generator `e` is a regular reducer candidate for a
    /// term `mono` under signature `sig`.
    #[must_use]
    pub fn sig_compare_scaled(&self, sig: &Mono, mono: &Mono, e: usize) -> Ordering {
        // sig vs (mono / lead_e) * sig_e, cross-multiplied by lead_e.
        let monoid = self.monoid();
        monoid.compare_products(sig, self.base.lead_mono(e), &self.signatures[e], mono)
    }

    /// Finds the regular reducer for `mono` under signature `sig`.
    ///
    /// Accepts generators whose lead divides `mono` and whose scaled
    /// signature stays strictly below `sig`; picks the sparsest accepted
    /// generator, ties broken by smallest index. Rejected candidates that
    /// failed only the signature test are reported through the returned
    /// vector so the caller can update the observability flags.
    #[must_use]
    pub fn regular_reducer(&self, sig: &Mono, mono: &Mono) -> (Option<usize>, Vec<usize>) {
        let mut best: Option<usize> = None;
        let mut sig_blocked = Vec::new();
        self.base.for_each_lead_divisor(mono, |e| {
            if self.sig_compare_scaled(sig, mono, e) != Ordering::Greater {
                sig_blocked.push(e);
                return true;
            }
            match best {
                None => best = Some(e),
                Some(current) => {
                    let new_terms = self.base.poly(e).term_count();
                    let old_terms = self.base.poly(current).term_count();
                    if new_terms < old_terms || (new_terms == old_terms && e < current) {
                        best = Some(e);
                    }
                }
            }
            true
        });
        (best, sig_blocked)
    }

    /// The generator with minimal `lead * (sig / sig_gen)` among those
    /// whose signature divides `sig`.
    ///
    /// Maximizing the sig/lead ratio is equivalent and uses the rank
    /// cache. Ties pick the sparser generator, then the one with the
    /// larger signature; signatures are unique so no tie survives.
    #[must_use]
    pub fn min_lead_in_sig(&self, sig: &Mono) -> Option<usize> {
        let monoid = self.monoid();
        let mut best: Option<usize> = None;
        self.sig_lookup.for_each_divisor(monoid, sig, |entry| {
            let e = entry.index;
            match best {
                None => best = Some(e),
                Some(current) => match self.ratio_compare(e, current) {
                    Ordering::Less => {}
                    Ordering::Greater => best = Some(e),
                    Ordering::Equal => {
                        let terms = self.base.poly(e).term_count();
                        let best_terms = self.base.poly(current).term_count();
                        if terms < best_terms {
                            best = Some(e);
                        } else if terms == best_terms
                            && monoid.compare(&self.signatures[e], &self.signatures[current])
                                == Ordering::Greater
                        {
                            best = Some(e);
                        }
                    }
                },
            }
            true
        });
        best
    }

    /// The up-to-`max_divisors` generators below `new_gen` with signature
    /// dividing `new_gen`'s, keeping the largest ratios.
    ///
    /// Ties prefer the smallest index, keeping the result deterministic.
    #[must_use]
    pub fn low_base_divisors(&self, new_gen: usize, max_divisors: usize) -> Vec<usize> {
        let monoid = self.monoid();
        let mut divisors: Vec<usize> = Vec::with_capacity(max_divisors + 1);
        self.sig_lookup
            .for_each_divisor(monoid, &self.signatures[new_gen], |entry| {
                let e = entry.index;
                if e >= new_gen {
                    return true;
                }
                let pos = divisors
                    .iter()
                    .position(|&d| {
                        let mut cmp = self.ratio_compare(e, d);
                        if cmp == Ordering::Equal && e < d {
                            cmp = Ordering::Greater;
                        }
                        cmp == Ordering::Greater
                    })
                    .unwrap_or(divisors.len());
                divisors.insert(pos, e);
                if divisors.len() > max_divisors {
                    divisors.pop();
                }
                true
            });
        divisors
    }

    /// The generator below `new_gen` with maximal ratio among those whose
    /// lead divides `new_gen`'s lead, ties broken by smallest index.
    #[must_use]
    pub fn high_base_divisor(&self, new_gen: usize) -> Option<usize> {
        let mut best: Option<usize> = None;
        self.base
            .for_each_lead_divisor(self.base.lead_mono(new_gen), |e| {
                if e >= new_gen {
                    return true;
                }
                match best {
                    None => best = Some(e),
                    Some(current) => match self.ratio_compare(current, e) {
                        Ordering::Less => best = Some(e),
                        Ordering::Equal if e < current => best = Some(e),
                        _ => {}
                    },
                }
                true
            });
        best
    }

    fn monoid(&self) -> &MonoMonoid {
        self.base.monoid()
    }

    // Inserts generator `index` into the ratio order and recomputes ranks.
    fn insert_ratio(&mut self, index: usize) {
        let pos = self
            .sorted_by_ratio
            .partition_point(|&other| self.cross_ratio_compare(other, index) == Ordering::Less);
        self.sorted_by_ratio.insert(pos, index);

        self.ratio_rank.resize(self.signatures.len(), 0);
        let mut rank = 0usize;
        for k in 0..self.sorted_by_ratio.len() {
            if k > 0 {
                let prev = self.sorted_by_ratio[k - 1];
                let here = self.sorted_by_ratio[k];
                if self.cross_ratio_compare(prev, here) != Ordering::Equal {
                    rank += 1;
                }
            }
            self.ratio_rank[self.sorted_by_ratio[k]] = rank;
        }
    }

    // sig_i/lead_i vs sig_j/lead_j by cross multiplication.
    fn cross_ratio_compare(&self, i: usize, j: usize) -> Ordering {
        self.monoid().compare_products(
            &self.signatures[i],
            self.base.lead_mono(j),
            &self.signatures[j],
            self.base.lead_mono(i),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartus_monoid::{MonoOrder, MonoMonoid};
    use quartus_rings::PrimeField;
    use std::sync::Arc;

    fn setup() -> SigPolyBasis {
        let monoid = Arc::new(MonoMonoid::new(2, MonoOrder::GrevlexDescComponent));
        let field = PrimeField::new(101).unwrap();
        let base = PolyBasis::new(monoid, field, LookupKind::DivList, false);
        SigPolyBasis::new(base, LookupKind::DivList)
    }

    fn gen(basis: &mut SigPolyBasis, lead: &[u16], sig_exps: &[u16], sig_comp: u32) -> usize {
        let monoid = Arc::clone(basis.base().monoid());
        let field = basis.base().field().clone();
        let mono = monoid.set_exponents(lead).unwrap();
        let mut poly = Poly::zero();
        poly.append_term(field.from_i64(1), mono);
        let sig = monoid.module_mono(sig_exps, sig_comp).unwrap();
        basis.insert(poly, sig)
    }

    #[test]
    fn ratio_ranks_follow_cross_multiplication() {
        let mut b = setup();
        // ratio x/x = 1, ratio x^2/x = x, ratio 1/x = x^-1.
        let i = gen(&mut b, &[1, 0], &[1, 0], 1); // sig x<1>, lead x
        let j = gen(&mut b, &[1, 0], &[2, 0], 2); // sig x^2<2>, lead x
        let k = gen(&mut b, &[1, 0], &[0, 0], 3); // sig 1<3>, lead x
        assert_eq!(b.ratio_compare(i, j), Ordering::Less);
        assert_eq!(b.ratio_compare(k, i), Ordering::Less);
        assert_eq!(b.ratio_compare(j, k), Ordering::Greater);
        assert_eq!(b.ratio_compare(i, i), Ordering::Equal);
    }

    #[test]
    fn regular_reducer_respects_signature_bound() {
        let mut b = setup();
        // Generator with lead x, signature x<1>.
        let g = gen(&mut b, &[1, 0], &[1, 0], 1);
        let monoid = Arc::clone(b.base().monoid());

        let target = monoid.set_exponents(&[2, 0]).unwrap(); // x^2
        // Reducing x^2 by g scales its signature by x, giving x^2<1>.
        let big_sig = monoid.module_mono(&[3, 0], 1).unwrap();
        let (found, blocked) = b.regular_reducer(&big_sig, &target);
        assert_eq!(found, Some(g));
        assert!(blocked.is_empty());

        // A signature at exactly x^2<1> is singular, not regular.
        let equal_sig = monoid.module_mono(&[2, 0], 1).unwrap();
        let (found, blocked) = b.regular_reducer(&equal_sig, &target);
        assert_eq!(found, None);
        assert_eq!(blocked, vec![g]);
    }

    #[test]
    fn base_divisor_queries_see_only_older_generators() {
        let mut b = setup();
        let a = gen(&mut b, &[1, 0], &[1, 0], 1); // sig x<1>
        let c = gen(&mut b, &[2, 0], &[2, 0], 1); // sig x^2<1>, divisible by x<1>
        let lows = b.low_base_divisors(c, 2);
        assert_eq!(lows, vec![a]);
        assert!(b.low_base_divisors(a, 2).is_empty());
        // lead x divides lead x^2.
        assert_eq!(b.high_base_divisor(c), Some(a));
    }
}
