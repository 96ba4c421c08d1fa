//! The S-pair triangle and the classical pair criteria.
//!
//! Pairs `(i, j)` with `i > j` are stored one column at a time, each
//! labeled by a sort-key monomial owned by the triangle and allocated
//! from the monoid pool; the key is recycled when the pair is popped.

use std::cmp::Ordering;

use rustc_hash::FxHashSet;
use tracing::debug;

use quartus_monoid::{Mono, MonoMonoid};
use quartus_poly::PolyBasis;

use crate::config::QueueKind;
use crate::error::Error;
use crate::queue::MonoQueue;

/// One queued pair with its sort key.
#[derive(Debug)]
pub struct PairEntry {
    /// The column (greater generator index).
    pub col: u32,
    /// The row (smaller generator index).
    pub row: u32,
    /// The sort-key monomial, pool-allocated.
    pub key: Mono,
}

/// The upper-triangular pair queue.
#[derive(Debug)]
pub struct PairTriangle {
    queue: MonoQueue<PairEntry>,
    column_count: usize,
    open: Option<(usize, Vec<(u32, Mono)>)>,
    retired: FxHashSet<(u32, u32)>,
    pair_count: usize,
}

// Min-key semantics on a max-queue: reverse the key comparison, with the
// pair indices breaking ties so the pop order is fully deterministic.
fn pair_cmp<'m>(monoid: &'m MonoMonoid) -> impl Fn(&PairEntry, &PairEntry) -> Ordering + 'm {
    move |a: &PairEntry, b: &PairEntry| {
        monoid
            .compare(&b.key, &a.key)
            .then_with(|| b.col.cmp(&a.col))
            .then_with(|| b.row.cmp(&a.row))
    }
}

impl PairTriangle {
    /// Creates an empty triangle over the chosen queue backend.
    #[must_use]
    pub fn new(kind: QueueKind) -> Self {
        Self {
            queue: MonoQueue::new(kind),
            column_count: 0,
            open: None,
            retired: FxHashSet::default(),
            pair_count: 0,
        }
    }

    /// The number of opened columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// The number of queued pairs.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.pair_count
    }

    /// True if no pair is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pair_count == 0
    }

    /// Opens the next column for pair addition.
    ///
    /// The new column's index is the previous [`Self::column_count`].
    pub fn begin_column(&mut self) {
        debug_assert!(self.open.is_none(), "column already open");
        self.open = Some((self.column_count, Vec::new()));
    }

    /// Adds `(column, row)` with its sort key to the open column.
    ///
    /// The key must come from the monoid pool; the triangle owns it from
    /// here on.
    pub fn add_pair(&mut self, row: usize, key: Mono) {
        let (col, pending) = self.open.as_mut().expect("no open column");
        debug_assert!(row < *col, "pair row must be below its column");
        pending.push((row as u32, key));
    }

    /// Closes the open column, sorting its pairs into the queue.
    pub fn end_column(&mut self, monoid: &MonoMonoid) {
        let (col, mut pending) = self.open.take().expect("no open column");
        pending.sort_by(|a, b| monoid.compare(&a.1, &b.1).then_with(|| a.0.cmp(&b.0)));
        let cmp = pair_cmp(monoid);
        for (row, key) in pending {
            self.queue.push(
                PairEntry {
                    col: col as u32,
                    row,
                    key,
                },
                &cmp,
            );
            self.pair_count += 1;
        }
        self.column_count = col + 1;
    }

    /// Marks a queued pair as dead; it will be skipped and recycled.
    pub fn retire_pair(&mut self, col: usize, row: usize) {
        self.retired.insert((col as u32, row as u32));
    }

    /// Visits the live queued pairs in unspecified order.
    pub fn for_each_pair(&self, mut f: impl FnMut(usize, usize)) {
        for entry in self.queue.iter() {
            if !self.retired.contains(&(entry.col, entry.row)) {
                f(entry.col as usize, entry.row as usize);
            }
        }
    }

    /// The minimum-key pair without removing it.
    pub fn top_pair(&mut self, monoid: &MonoMonoid) -> Option<(usize, usize)> {
        self.skim(monoid);
        let cmp = pair_cmp(monoid);
        self.queue
            .peek(&cmp)
            .map(|e| (e.col as usize, e.row as usize))
    }

    /// The minimum sort key over all pairs.
    pub fn top_order_by(&mut self, monoid: &MonoMonoid) -> Option<&Mono> {
        self.skim(monoid);
        let cmp = pair_cmp(monoid);
        self.queue.peek(&cmp).map(|e| &e.key)
    }

    /// Removes and returns the minimum-key pair, recycling its key.
    pub fn pop(&mut self, monoid: &MonoMonoid) -> Option<(usize, usize)> {
        self.skim(monoid);
        let cmp = pair_cmp(monoid);
        let entry = self.queue.pop(&cmp)?;
        self.pair_count -= 1;
        monoid.recycle(entry.key);
        Some((entry.col as usize, entry.row as usize))
    }

    /// Drains the triangle, recycling every key.
    pub fn clear(&mut self, monoid: &MonoMonoid) {
        let cmp = pair_cmp(monoid);
        while let Some(entry) = self.queue.pop(&cmp) {
            monoid.recycle(entry.key);
        }
        self.retired.clear();
        self.pair_count = 0;
    }

    // Pops dead pairs off the top.
    fn skim(&mut self, monoid: &MonoMonoid) {
        let cmp = pair_cmp(monoid);
        while let Some(top) = self.queue.peek(&cmp) {
            let id = (top.col, top.row);
            if !self.retired.contains(&id) {
                break;
            }
            let entry = self.queue.pop(&cmp).expect("peeked entry pops");
            self.retired.remove(&id);
            self.pair_count -= 1;
            monoid.recycle(entry.key);
        }
    }
}

/// Pair-elimination counters.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClassicPairStats {
    /// Pairs considered during column construction.
    pub constructed: u64,
    /// Pairs actually queued.
    pub queued: u64,
    /// Pairs discarded by the relatively-prime criterion.
    pub relatively_prime: u64,
    /// New pairs discarded by the chain criterion.
    pub chain: u64,
    /// Queued pairs retired retroactively by the chain criterion.
    pub chain_retired: u64,
}

/// The classical S-pair queue: keys are lcms, with the relatively-prime
/// and Gebauer–Möller chain criteria applied as columns are built.
#[derive(Debug)]
pub struct ClassicSPairs {
    triangle: PairTriangle,
    stats: ClassicPairStats,
}

impl ClassicSPairs {
    /// Creates an empty pair queue.
    #[must_use]
    pub fn new(kind: QueueKind) -> Self {
        Self {
            triangle: PairTriangle::new(kind),
            stats: ClassicPairStats::default(),
        }
    }

    /// True if no pair is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangle.is_empty()
    }

    /// The number of queued pairs.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.triangle.pair_count()
    }

    /// The elimination counters.
    #[must_use]
    pub fn stats(&self) -> ClassicPairStats {
        self.stats
    }

    /// The total degree of the minimum sort key, if any pair is queued.
    pub fn top_degree(&mut self, basis: &PolyBasis) -> Option<u32> {
        self.triangle.top_order_by(basis.monoid()).map(Mono::degree)
    }

    /// Pops the minimum-lcm pair.
    pub fn pop(&mut self, basis: &PolyBasis) -> Option<(usize, usize)> {
        self.triangle.pop(basis.monoid())
    }

    /// Recycles all queued keys.
    pub fn clear(&mut self, basis: &PolyBasis) {
        self.triangle.clear(basis.monoid());
    }

    /// Opens column `t` and queues the surviving pairs `(t, j)`.
    pub fn new_pairs(&mut self, basis: &PolyBasis, t: usize) -> Result<(), Error> {
        let monoid = basis.monoid();
        let lead_t = basis.lead_mono(t).clone();

        // Candidate lcms with every live earlier generator.
        let mut candidates: Vec<(usize, Mono)> = Vec::new();
        for j in basis.live_indices().filter(|&j| j < t) {
            let lcm = monoid
                .lcm(&lead_t, basis.lead_mono(j))
                .map_err(|e| Error::overflow(j, e))?;
            candidates.push((j, lcm));
        }
        self.stats.constructed += candidates.len() as u64;

        // Retroactive chain rule: a queued pair (j, k) dies once lead_t
        // divides lcm(j, k) strictly finer than both new lcms.
        let mut to_retire: Vec<(usize, usize)> = Vec::new();
        self.triangle.for_each_pair(|col, row| {
            if basis.is_retired(col) || basis.is_retired(row) {
                return;
            }
            let Ok(lcm_jk) = monoid.lcm(basis.lead_mono(col), basis.lead_mono(row)) else {
                return;
            };
            if !monoid.divides(&lead_t, &lcm_jk) {
                return;
            }
            let new_col = candidates.iter().find(|(j, _)| *j == col).map(|(_, m)| m);
            let new_row = candidates.iter().find(|(j, _)| *j == row).map(|(_, m)| m);
            let strict_col = new_col.is_some_and(|m| m != &lcm_jk);
            let strict_row = new_row.is_some_and(|m| m != &lcm_jk);
            if strict_col && strict_row {
                to_retire.push((col, row));
            }
        });
        for (col, row) in to_retire {
            self.triangle.retire_pair(col, row);
            self.stats.chain_retired += 1;
        }

        // Chain rule within the column: drop (t, j) when another new lcm
        // strictly divides its lcm.
        let mut keep = vec![true; candidates.len()];
        for (a, (_, lcm_a)) in candidates.iter().enumerate() {
            if !keep[a] {
                continue;
            }
            for (b, (_, lcm_b)) in candidates.iter().enumerate() {
                if a == b {
                    continue;
                }
                if monoid.divides(lcm_b, lcm_a) && lcm_b != lcm_a {
                    keep[a] = false;
                    self.stats.chain += 1;
                    break;
                }
            }
        }

        // Equal-lcm groups collapse to their smallest surviving row; a
        // relatively-prime member kills the whole group.
        for a in 0..candidates.len() {
            if !keep[a] {
                continue;
            }
            let (ja, lcm_a) = &candidates[a];
            let group_has_coprime = candidates.iter().enumerate().any(|(b, (jb, lcm_b))| {
                keep[b] && lcm_b == lcm_a && monoid.relatively_prime(&lead_t, basis.lead_mono(*jb))
            });
            if group_has_coprime {
                for (b, (_, lcm_b)) in candidates.iter().enumerate() {
                    if keep[b] && lcm_b == lcm_a {
                        keep[b] = false;
                        self.stats.relatively_prime += 1;
                    }
                }
                continue;
            }
            let smallest = candidates
                .iter()
                .enumerate()
                .filter(|(b, (_, lcm_b))| keep[*b] && lcm_b == lcm_a)
                .map(|(_, (j, _))| *j)
                .min()
                .unwrap_or(*ja);
            for (b, (jb, lcm_b)) in candidates.iter().enumerate() {
                if keep[b] && lcm_b == lcm_a && *jb != smallest {
                    keep[b] = false;
                    self.stats.chain += 1;
                }
            }
        }

        self.triangle.begin_column();
        for (a, (j, lcm)) in candidates.iter().enumerate() {
            if keep[a] {
                self.triangle.add_pair(*j, monoid.pooled_copy(lcm));
                self.stats.queued += 1;
            }
        }
        self.triangle.end_column(monoid);
        debug!(
            column = t,
            queued = self.triangle.pair_count(),
            "opened s-pair column"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartus_poly::{LookupKind, Poly};
    use quartus_monoid::MonoOrder;
    use quartus_rings::PrimeField;
    use std::sync::Arc;

    fn basis_with(leads: &[&[u16]]) -> PolyBasis {
        let monoid = Arc::new(MonoMonoid::new(3, MonoOrder::Grevlex));
        let field = PrimeField::new(101).unwrap();
        let mut basis = PolyBasis::new(monoid.clone(), field, LookupKind::DivList, false);
        for lead in leads {
            let mut poly = Poly::zero();
            poly.append_term(1, monoid.set_exponents(lead).unwrap());
            basis.insert(poly);
        }
        basis
    }

    #[test]
    fn triangle_pops_in_key_order() {
        let monoid = MonoMonoid::new(2, MonoOrder::Grevlex);
        let mut tri = PairTriangle::new(QueueKind::Heap);
        tri.begin_column();
        tri.end_column(&monoid);
        tri.begin_column();
        let big = monoid.set_exponents(&[3, 0]).unwrap();
        tri.add_pair(0, monoid.pooled_copy(&big));
        tri.end_column(&monoid);
        tri.begin_column();
        let small = monoid.set_exponents(&[1, 0]).unwrap();
        tri.add_pair(0, monoid.pooled_copy(&small));
        tri.add_pair(1, monoid.pooled_copy(&big));
        tri.end_column(&monoid);

        assert_eq!(tri.pair_count(), 3);
        assert_eq!(tri.top_pair(&monoid), Some((2, 0)));
        assert_eq!(tri.pop(&monoid), Some((2, 0)));
        // Equal keys pop in (col, row) order.
        assert_eq!(tri.pop(&monoid), Some((1, 0)));
        assert_eq!(tri.pop(&monoid), Some((2, 1)));
        assert_eq!(tri.pop(&monoid), None);
        assert_eq!(monoid.pool().live_count(), 0);
    }

    #[test]
    fn retired_pairs_are_skipped_and_recycled() {
        let monoid = MonoMonoid::new(2, MonoOrder::Grevlex);
        let mut tri = PairTriangle::new(QueueKind::Heap);
        tri.begin_column();
        tri.end_column(&monoid);
        tri.begin_column();
        let key = monoid.set_exponents(&[1, 1]).unwrap();
        tri.add_pair(0, monoid.pooled_copy(&key));
        tri.end_column(&monoid);
        tri.retire_pair(1, 0);
        assert_eq!(tri.pop(&monoid), None);
        assert!(tri.is_empty());
        assert_eq!(monoid.pool().live_count(), 0);
    }

    #[test]
    fn relatively_prime_pairs_are_dropped() {
        // Leads x^2 and y^3 are coprime; no pair survives.
        let basis = basis_with(&[&[2, 0, 0], &[0, 3, 0]]);
        let mut pairs = ClassicSPairs::new(QueueKind::Heap);
        pairs.new_pairs(&basis, 0).unwrap();
        pairs.new_pairs(&basis, 1).unwrap();
        assert!(pairs.is_empty());
        assert_eq!(pairs.stats().relatively_prime, 1);
    }

    #[test]
    fn chain_criterion_retires_queued_pairs() {
        // The queued pair (xy, x^2) carries lcm x^2y. Once x arrives, x
        // divides x^2y while the new lcms x^2 and xy are both strictly
        // smaller, so the old pair dies retroactively.
        let basis = basis_with(&[&[2, 0, 0], &[1, 1, 0], &[1, 0, 0]]);
        let mut pairs = ClassicSPairs::new(QueueKind::Heap);
        pairs.new_pairs(&basis, 0).unwrap();
        pairs.new_pairs(&basis, 1).unwrap();
        let mut before = Vec::new();
        pairs.triangle.for_each_pair(|c, r| before.push((c, r)));
        assert_eq!(before, vec![(1, 0)]);

        pairs.new_pairs(&basis, 2).unwrap();
        assert_eq!(pairs.stats().chain_retired, 1);
        let mut live = Vec::new();
        pairs.triangle.for_each_pair(|c, r| live.push((c, r)));
        live.sort_unstable();
        assert_eq!(live, vec![(2, 0), (2, 1)]);

        // The tombstoned pair never pops, and its key recycles.
        assert_eq!(pairs.pop(&basis), Some((2, 1)));
        assert_eq!(pairs.pop(&basis), Some((2, 0)));
        assert_eq!(pairs.pop(&basis), None);
        assert_eq!(basis.monoid().pool().live_count(), 0);
    }

    #[test]
    fn chain_criterion_thins_a_column() {
        // Leads: xy, yz, xz... adding xyz-lead generator last: its lcm
        // with each is xyz; the equal-lcm group keeps a single pair.
        let basis = basis_with(&[&[1, 1, 0], &[0, 1, 1], &[1, 0, 1], &[1, 1, 1]]);
        let mut pairs = ClassicSPairs::new(QueueKind::Heap);
        for t in 0..4 {
            pairs.new_pairs(&basis, t).unwrap();
        }
        // Column 3 contributes exactly one pair (3, 0).
        let mut seen = Vec::new();
        pairs.triangle.for_each_pair(|c, r| seen.push((c, r)));
        let col3: Vec<_> = seen.iter().filter(|(c, _)| *c == 3).collect();
        assert_eq!(col3.len(), 1);
        assert_eq!(*col3[0], (3, 0));
    }
}
