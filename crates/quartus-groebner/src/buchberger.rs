//! The classical Buchberger loop.
//!
//! Pairs pop in order of their lcm sort key; each is reduced by the
//! configured reducer (classical queue or F4 matrix), and nonzero
//! remainders are normalized, inserted, and used to open a new S-pair
//! column. Auto top reduction retires displaced generators and feeds
//! them back through the reducer; auto tail reduction keeps the tails of
//! the standing basis reduced.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use quartus_monoid::MonoMonoid;
use quartus_poly::{Poly, PolyBasis};
use quartus_rings::PrimeField;

use crate::config::{GbConfig, QueueKind, ReducerKind};
use crate::error::Error;
use crate::f4::reduce_spairs_f4;
use crate::reducer::{classic_reduce, classic_reduce_spair, classic_tail_reduce};
use crate::spair::ClassicSPairs;

/// Progress counters of a computation.
#[derive(Clone, Copy, Debug, Default)]
pub struct GbStats {
    /// S-pairs reduced.
    pub pairs_reduced: u64,
    /// Reductions to zero.
    pub syzygies: u64,
    /// Signatures skipped by the singular criterion (signature loop only).
    pub singular: u64,
    /// Generators inserted into the basis.
    pub basis_inserts: u64,
    /// True if the wall-clock deadline stopped the loop early.
    pub deadline_hit: bool,
}

/// The classical Buchberger algorithm.
#[derive(Debug)]
pub struct ClassicalGb {
    basis: PolyBasis,
    spairs: ClassicSPairs,
    config: GbConfig,
    stats: GbStats,
}

impl ClassicalGb {
    /// Creates an empty computation.
    #[must_use]
    pub fn new(monoid: Arc<MonoMonoid>, field: PrimeField, config: GbConfig) -> Self {
        let basis = PolyBasis::new(
            monoid,
            field,
            config.divisor_lookup,
            config.prefer_sparse_reducers,
        );
        let spairs = ClassicSPairs::new(config.spair_queue);
        Self {
            basis,
            spairs,
            config,
            stats: GbStats::default(),
        }
    }

    /// The basis under construction.
    #[must_use]
    pub fn basis(&self) -> &PolyBasis {
        &self.basis
    }

    /// The progress counters.
    #[must_use]
    pub fn stats(&self) -> GbStats {
        self.stats
    }

    /// Reduces and inserts one input generator.
    pub fn add_generator(&mut self, poly: Poly) -> Result<(), Error> {
        self.insert_reduced(poly)
    }

    /// Runs the pair loop to completion (or to the deadline).
    pub fn compute(&mut self) -> Result<(), Error> {
        let deadline = (!self.config.break_after.is_zero())
            .then(|| Instant::now() + self.config.break_after);
        loop {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    self.stats.deadline_hit = true;
                    info!(pairs_left = self.spairs.pair_count(), "deadline reached");
                    break;
                }
            }
            let group = self.pop_group();
            if group.is_empty() {
                break;
            }
            self.stats.pairs_reduced += group.len() as u64;

            let candidates = match self.config.reducer {
                ReducerKind::F4 => {
                    let results = reduce_spairs_f4(&self.basis, &group)?;
                    self.stats.syzygies +=
                        (2 * group.len()).saturating_sub(results.len()) as u64;
                    results
                }
                _ => {
                    let mut results = Vec::with_capacity(group.len());
                    for &(i, j) in &group {
                        let reduced =
                            classic_reduce_spair(&self.basis, self.queue_kind(), i, j)?;
                        for k in reduced.reducers_used {
                            self.basis.note_was_reducer(k);
                        }
                        if reduced.poly.is_zero() {
                            self.stats.syzygies += 1;
                        } else {
                            results.push(reduced.poly);
                        }
                    }
                    results
                }
            };
            for poly in candidates {
                self.insert_reduced(poly)?;
            }

            if self.config.print_interval != 0
                && self.stats.pairs_reduced % self.config.print_interval == 0
            {
                info!(
                    pairs_reduced = self.stats.pairs_reduced,
                    pairs_left = self.spairs.pair_count(),
                    basis = self.basis.live_count(),
                    syzygies = self.stats.syzygies,
                    "progress"
                );
            }
        }
        Ok(())
    }

    /// Finishes the computation and returns the canonical reduced basis.
    pub fn into_reduced_basis(mut self) -> Result<Vec<Poly>, Error> {
        self.spairs.clear(&self.basis);
        let polys: Vec<Poly> = self
            .basis
            .live_indices()
            .map(|i| self.basis.poly(i).clone())
            .collect();
        reduce_to_canonical(self.basis.monoid(), self.basis.field(), polys, &self.config)
    }

    fn queue_kind(&self) -> QueueKind {
        match self.config.reducer {
            ReducerKind::Heap | ReducerKind::F4 => QueueKind::Heap,
            ReducerKind::Tournament => QueueKind::Tournament,
            ReducerKind::Geobucket => QueueKind::Geobucket,
            ReducerKind::Pairing => QueueKind::Pairing,
        }
    }

    // Pops the next batch of live pairs: one for the classical reducers,
    // a same-degree group (bounded by the configured size) for F4.
    fn pop_group(&mut self) -> Vec<(usize, usize)> {
        let f4 = self.config.reducer == ReducerKind::F4;
        let limit = match (f4, self.config.s_pair_group_size) {
            (false, 0) => 1,
            (_, n) => n,
        };
        let mut group = Vec::new();
        let mut group_degree = None;
        loop {
            if limit != 0 && group.len() >= limit {
                break;
            }
            if f4 {
                match (group_degree, self.spairs.top_degree(&self.basis)) {
                    (_, None) => break,
                    (Some(d), Some(top)) if top != d => break,
                    (None, Some(top)) => group_degree = Some(top),
                    _ => {}
                }
            }
            let Some((i, j)) = self.spairs.pop(&self.basis) else {
                break;
            };
            if self.basis.is_retired(i) || self.basis.is_retired(j) {
                continue;
            }
            group.push((i, j));
            if !f4 && limit == 1 {
                break;
            }
        }
        group
    }

    // Fully reduces a candidate, inserts it if nonzero, and services the
    // auto top/tail reductions. Displaced generators are re-reduced
    // through the same worklist.
    fn insert_reduced(&mut self, poly: Poly) -> Result<(), Error> {
        let mut pending = vec![poly];
        while let Some(candidate) = pending.pop() {
            let reduced = classic_reduce(&candidate, &self.basis, self.queue_kind())?;
            for k in reduced.reducers_used {
                self.basis.note_was_reducer(k);
            }
            let mut poly = reduced.poly;
            if poly.is_zero() {
                continue;
            }
            poly.make_monic(self.basis.field());

            if self.config.auto_top_reduce {
                let lead = poly.lead_mono().expect("nonzero poly has a lead").clone();
                for displaced in self.basis.lead_multiples(&lead, usize::MAX) {
                    let old = self.basis.retire(displaced);
                    pending.push(old);
                }
            }

            let t = self.basis.insert(poly);
            self.stats.basis_inserts += 1;
            self.spairs.new_pairs(&self.basis, t)?;

            if self.config.auto_tail_reduce {
                self.auto_tail_reduce(t)?;
            }
        }
        Ok(())
    }

    fn auto_tail_reduce(&mut self, new_gen: usize) -> Result<(), Error> {
        let lead_new = self.basis.lead_mono(new_gen).clone();
        let monoid = Arc::clone(self.basis.monoid());
        let targets: Vec<usize> = self
            .basis
            .live_indices()
            .filter(|&j| j != new_gen)
            .filter(|&j| {
                self.basis.poly(j).terms()[1..]
                    .iter()
                    .any(|term| monoid.divides(&lead_new, &term.mono))
            })
            .collect();
        for j in targets {
            let reduced =
                classic_tail_reduce(self.basis.poly(j), &self.basis, self.queue_kind())?;
            for k in reduced.reducers_used {
                self.basis.note_was_reducer(k);
            }
            self.basis.replace_tail(j, reduced.poly);
        }
        Ok(())
    }
}

/// Normalizes a Gröbner basis into its canonical reduced form.
///
/// Redundant generators (lead divisible by another's lead) are dropped,
/// every tail is brought to normal form against the surviving leads, and
/// the result is monic, sorted by descending lead monomial.
pub fn reduce_to_canonical(
    monoid: &Arc<MonoMonoid>,
    field: &PrimeField,
    polys: Vec<Poly>,
    config: &GbConfig,
) -> Result<Vec<Poly>, Error> {
    let mut polys = polys;
    polys.retain(|p| !p.is_zero());
    // Ascending leads: when a lead divides another, the divisor comes
    // first and survives.
    polys.sort_by(|a, b| {
        monoid
            .compare(
                a.lead_mono().expect("nonzero"),
                b.lead_mono().expect("nonzero"),
            )
            .then_with(|| a.term_count().cmp(&b.term_count()))
    });

    let mut minimal = PolyBasis::new(
        Arc::clone(monoid),
        field.clone(),
        config.divisor_lookup,
        config.prefer_sparse_reducers,
    );
    for mut poly in polys {
        let lead = poly.lead_mono().expect("nonzero poly has a lead");
        if minimal.find_any_lead_divisor(lead).is_some() {
            continue;
        }
        poly.make_monic(field);
        minimal.insert(poly);
    }

    let queue = match config.reducer {
        ReducerKind::Tournament => QueueKind::Tournament,
        ReducerKind::Geobucket => QueueKind::Geobucket,
        ReducerKind::Pairing => QueueKind::Pairing,
        _ => QueueKind::Heap,
    };
    let mut out = Vec::with_capacity(minimal.live_count());
    for i in minimal.live_indices() {
        let reduced = classic_tail_reduce(minimal.poly(i), &minimal, queue)?;
        out.push(reduced.poly);
    }
    out.sort_by(|a, b| {
        monoid.compare(
            b.lead_mono().expect("nonzero"),
            a.lead_mono().expect("nonzero"),
        )
    });
    Ok(out)
}
