//! The signature-based loop.
//!
//! Signatures pop in ascending order. Each is either recognized as a
//! syzygy (Koszul front or syzygy-module hit) or regular-reduced; a zero
//! remainder contributes its signature to the syzygy module, a nonzero
//! one joins the basis under that signature and opens a new column.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use quartus_monoid::{MonoMonoid, MonoOrder};
use quartus_poly::{Poly, PolyBasis, SigPolyBasis};
use quartus_rings::PrimeField;

use crate::buchberger::{reduce_to_canonical, GbStats};
use crate::config::{GbConfig, QueueKind, ReducerKind};
use crate::error::Error;
use crate::reducer::regular_reduce;
use crate::sig_spair::SigSPairs;

/// The signature-based Gröbner basis algorithm.
#[derive(Debug)]
pub struct SignatureGb {
    basis: SigPolyBasis,
    pairs: SigSPairs,
    config: GbConfig,
    stats: GbStats,
}

impl SignatureGb {
    /// Creates an empty computation.
    ///
    /// The monoid must order module monomials (a component-aware
    /// ordering); plain lex/grevlex cannot compare signatures.
    pub fn new(
        monoid: Arc<MonoMonoid>,
        field: PrimeField,
        config: GbConfig,
    ) -> Result<Self, Error> {
        if !monoid.order().uses_component() {
            return Err(Error::Config(
                "signature computation needs a module ordering".into(),
            ));
        }
        if config.reducer == ReducerKind::F4 {
            return Err(Error::Config(
                "the F4 reducer does not drive signature computation".into(),
            ));
        }
        let var_count = monoid.var_count();
        let basis = PolyBasis::new(
            monoid,
            field,
            config.divisor_lookup,
            config.prefer_sparse_reducers,
        );
        Ok(Self {
            basis: SigPolyBasis::new(basis, config.divisor_lookup),
            pairs: SigSPairs::new(
                config.spair_queue,
                config.divisor_lookup,
                var_count,
                true,
                true,
                true,
            ),
            config,
            stats: GbStats::default(),
        })
    }

    /// The signature basis under construction.
    #[must_use]
    pub fn basis(&self) -> &SigPolyBasis {
        &self.basis
    }

    /// The progress counters.
    #[must_use]
    pub fn stats(&self) -> GbStats {
        self.stats
    }

    /// Installs the input generators with their unit signatures e_i.
    pub fn add_generators(&mut self, polys: Vec<Poly>) -> Result<(), Error> {
        let monoid = Arc::clone(self.basis.base().monoid());
        let field = self.basis.base().field().clone();
        for poly in polys {
            if poly.is_zero() {
                continue;
            }
            let mut poly = poly;
            poly.make_monic(&field);
            // Components are one-based so plain monomials stay distinct.
            let component = self.basis.len() as u32 + 1;
            let sig = monoid
                .module_mono(&[], component)
                .map_err(|e| Error::overflow(self.basis.len(), e))?;
            let index = self.basis.insert(poly, sig);
            self.pairs.new_pairs(&self.basis, index)?;
        }
        Ok(())
    }

    /// Runs the signature loop to completion (or to the deadline).
    pub fn compute(&mut self) -> Result<(), Error> {
        let deadline = (!self.config.break_after.is_zero())
            .then(|| Instant::now() + self.config.break_after);
        let monoid = Arc::clone(self.basis.base().monoid());
        loop {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    self.stats.deadline_hit = true;
                    break;
                }
            }
            let Some((sig, _group)) = self.pairs.pop_signature(&self.basis) else {
                break;
            };
            self.stats.pairs_reduced += 1;

            // Koszul front and syzygy module both certify a zero
            // reduction without doing it.
            if self.pairs.check_koszul(&monoid, &sig) {
                self.stats.syzygies += 1;
                continue;
            }
            if self.pairs.is_known_syzygy(&monoid, &sig) {
                self.stats.syzygies += 1;
                continue;
            }
            // A signature already carried by a generator is singular:
            // that generator stands in for anything reduced under it.
            if self.basis.has_signature(&sig) {
                self.stats.singular += 1;
                continue;
            }

            let Some(gen) = self.basis.min_lead_in_sig(&sig) else {
                // Every pair signature is a multiple of some generator
                // signature, so this marks the signature fully handled.
                self.pairs.new_syzygy(&monoid, sig);
                self.stats.syzygies += 1;
                continue;
            };
            let mult = monoid
                .divide(self.basis.signature(gen), &sig)
                .map_err(|e| Error::overflow(gen, e))?;

            let reduced = regular_reduce(
                &self.basis,
                self.queue_kind(),
                &sig,
                &mult,
                gen,
            )?;
            for k in reduced.reducers_used {
                self.basis.base_mut().note_was_reducer(k);
            }
            for k in reduced.sig_blocked {
                self.basis.base_mut().note_was_non_signature_reducer(k);
            }

            let mut poly = reduced.poly;
            if poly.is_zero() {
                self.pairs.new_syzygy(&monoid, sig);
                self.stats.syzygies += 1;
                continue;
            }
            poly.make_monic(self.basis.base().field());
            let index = self.basis.insert(poly, sig);
            self.stats.basis_inserts += 1;
            self.pairs.new_pairs(&self.basis, index)?;

            if self.config.print_interval != 0
                && self.stats.pairs_reduced % self.config.print_interval == 0
            {
                info!(
                    signatures = self.stats.pairs_reduced,
                    basis = self.basis.len(),
                    syzygies = self.stats.syzygies,
                    "progress"
                );
            }
        }
        Ok(())
    }

    /// Finishes the computation and returns the canonical reduced basis.
    pub fn into_reduced_basis(mut self) -> Result<Vec<Poly>, Error> {
        let monoid = Arc::clone(self.basis.base().monoid());
        self.pairs.clear(&monoid);
        let polys: Vec<Poly> = self
            .basis
            .base()
            .live_indices()
            .map(|i| self.basis.base().poly(i).clone())
            .collect();
        reduce_to_canonical(
            self.basis.base().monoid(),
            self.basis.base().field(),
            polys,
            &self.config,
        )
    }

    fn queue_kind(&self) -> QueueKind {
        match self.config.reducer {
            ReducerKind::Tournament => QueueKind::Tournament,
            ReducerKind::Geobucket => QueueKind::Geobucket,
            ReducerKind::Pairing => QueueKind::Pairing,
            _ => QueueKind::Heap,
        }
    }
}

/// Picks the component-aware variant of an ordering for module use.
#[must_use]
pub fn module_order(order: MonoOrder) -> MonoOrder {
    match order {
        MonoOrder::Lex => MonoOrder::LexDescComponent,
        MonoOrder::Grevlex => MonoOrder::GrevlexDescComponent,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buchberger::ClassicalGb;
    use crate::io::{format_basis, parse_ideal};

    fn run_signature(text: &str, config: GbConfig) -> String {
        let parsed = parse_ideal(text).unwrap();
        let mut gb = SignatureGb::new(
            Arc::clone(&parsed.monoid),
            parsed.field.clone(),
            config,
        )
        .unwrap();
        gb.add_generators(parsed.generators).unwrap();
        gb.compute().unwrap();
        let basis = gb.into_reduced_basis().unwrap();
        format_basis(&parsed.field, &parsed.monoid, &basis)
    }

    fn run_classic(text: &str) -> String {
        let parsed = parse_ideal(text).unwrap();
        let mut gb = ClassicalGb::new(
            Arc::clone(&parsed.monoid),
            parsed.field.clone(),
            GbConfig::default(),
        );
        for g in parsed.generators {
            gb.add_generator(g).unwrap();
        }
        gb.compute().unwrap();
        let basis = gb.into_reduced_basis().unwrap();
        format_basis(&parsed.field, &parsed.monoid, &basis)
    }

    #[test]
    fn rejects_component_free_orderings() {
        let monoid = Arc::new(MonoMonoid::new(2, MonoOrder::Grevlex));
        let field = PrimeField::new(101).unwrap();
        let result = SignatureGb::new(monoid, field, GbConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn koszul_criterion_handles_coprime_leads() {
        // {a - b, b - c}: the single pair signature equals its Koszul
        // signature, so no reduction runs at all.
        let text = "101 3 4\n2\nx0 - x1\nx1 - x2\n";
        let parsed = parse_ideal(text).unwrap();
        let mut gb = SignatureGb::new(
            Arc::clone(&parsed.monoid),
            parsed.field.clone(),
            GbConfig::default(),
        )
        .unwrap();
        gb.add_generators(parsed.generators).unwrap();
        gb.compute().unwrap();
        assert_eq!(gb.stats().basis_inserts, 0);
        assert_eq!(gb.stats().syzygies, 1);
        let basis = gb.into_reduced_basis().unwrap();
        let out = format_basis(&parsed.field, &parsed.monoid, &basis);
        assert_eq!(out, "101 3 4\n2\nx0 + 100 * x2\nx1 + 100 * x2\n");
    }

    #[test]
    fn matches_the_classic_loop() {
        let scenarios = [
            "101 3 4\n2\nx0*x1 - x2\nx0 - x1\n",
            "101 3 4\n3\nx0^2 - x1\nx0*x1 - x2\nx1*x2 - x0\n",
            "32003 3 4\n2\nx0^2 + x1^2 + x2^2 + 32002\nx0 + x1 + x2 + 32002\n",
            "101 4 4\n4\nx0^2 - x0\nx1^2 - x1\nx2^2 - x2\nx3^2 - x3\n",
        ];
        for text in scenarios {
            assert_eq!(
                run_signature(text, GbConfig::default()),
                run_classic(text),
                "ideal {text:?}"
            );
        }
    }

    #[test]
    fn module_order_upgrades_plain_orderings() {
        assert_eq!(module_order(MonoOrder::Grevlex), MonoOrder::GrevlexDescComponent);
        assert_eq!(module_order(MonoOrder::Lex), MonoOrder::LexDescComponent);
        assert_eq!(
            module_order(MonoOrder::GrevlexAscComponent),
            MonoOrder::GrevlexAscComponent
        );
    }
}
