//! Hashed term accumulation for the reducers.
//!
//! The table maps each distinct current monomial to a node holding the
//! accumulated coefficient and the queue records contributing it. A new
//! record landing on a queued monomial merges into the node instead of
//! entering the queue, so cancellation is detected before the term is
//! ever yielded.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use quartus_monoid::Mono;
use quartus_poly::Poly;
use quartus_rings::{PrimeField, Scalar};

/// A polynomial multiple being streamed term by term.
#[derive(Debug)]
pub struct Record<'a> {
    /// The polynomial being multiplied.
    pub poly: &'a Poly,
    /// Coefficient of the multiplier term.
    pub mult_coef: Scalar,
    /// Monomial of the multiplier term.
    pub mult_mono: Mono,
    /// Index of the current term of `poly`.
    pub cursor: usize,
}

#[derive(Debug)]
struct Node<'a> {
    mono: Mono,
    coef: Scalar,
    records: SmallVec<[Record<'a>; 1]>,
}

/// Outcome of inserting a term into the table.
#[derive(Debug, PartialEq, Eq)]
pub enum Inserted {
    /// The monomial was already queued; the record merged into its node.
    Merged,
    /// A fresh node was created and must be queued.
    New(usize),
}

/// The monomial-keyed accumulation table.
///
/// Nodes live in a slab; the back-link from a monomial to its queue node
/// is the slab index.
#[derive(Debug, Default)]
pub struct PolyHashTable<'a> {
    map: FxHashMap<Mono, usize>,
    nodes: Vec<Option<Node<'a>>>,
    free: Vec<usize>,
}

impl<'a> PolyHashTable<'a> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if no node is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Accumulates `contribution * mono` from `record`.
    pub fn insert(
        &mut self,
        field: &PrimeField,
        mono: Mono,
        contribution: Scalar,
        record: Record<'a>,
    ) -> Inserted {
        if let Some(&id) = self.map.get(&mono) {
            let node = self.nodes[id].as_mut().expect("mapped node is live");
            node.coef = field.add(node.coef, contribution);
            node.records.push(record);
            return Inserted::Merged;
        }
        let node = Node {
            mono: mono.clone(),
            coef: contribution,
            records: SmallVec::from_iter([record]),
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.map.insert(mono, id);
        Inserted::New(id)
    }

    /// The monomial of a live node.
    #[must_use]
    pub fn mono(&self, id: usize) -> &Mono {
        &self.nodes[id].as_ref().expect("node is live").mono
    }

    /// The accumulated coefficient of a live node.
    #[must_use]
    pub fn coef(&self, id: usize) -> Scalar {
        self.nodes[id].as_ref().expect("node is live").coef
    }

    /// Removes a node, returning its monomial, coefficient and records.
    pub fn take(&mut self, id: usize) -> (Mono, Scalar, SmallVec<[Record<'a>; 1]>) {
        let node = self.nodes[id].take().expect("node is live");
        self.map.remove(&node.mono);
        self.free.push(id);
        (node.mono, node.coef, node.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartus_monoid::{MonoMonoid, MonoOrder};

    #[test]
    fn merging_cancels_before_yield() {
        let monoid = MonoMonoid::new(2, MonoOrder::Grevlex);
        let field = PrimeField::new(101).unwrap();
        let poly = Poly::zero();
        let mut table = PolyHashTable::new();

        let xy = monoid.set_exponents(&[1, 1]).unwrap();
        let record = |c: Scalar| Record {
            poly: &poly,
            mult_coef: c,
            mult_mono: monoid.identity(),
            cursor: 0,
        };

        let first = table.insert(&field, xy.clone(), 3, record(3));
        let Inserted::New(id) = first else {
            panic!("first insert must create a node");
        };
        assert_eq!(table.insert(&field, xy.clone(), 98, record(98)), Inserted::Merged);
        assert_eq!(table.coef(id), 0);

        let (mono, coef, records) = table.take(id);
        assert_eq!(mono, xy);
        assert_eq!(coef, 0);
        assert_eq!(records.len(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn slots_are_recycled() {
        let monoid = MonoMonoid::new(1, MonoOrder::Lex);
        let field = PrimeField::new(101).unwrap();
        let poly = Poly::zero();
        let mut table = PolyHashTable::new();

        let record = || Record {
            poly: &poly,
            mult_coef: 1,
            mult_mono: monoid.identity(),
            cursor: 0,
        };
        let a = monoid.set_exponents(&[1]).unwrap();
        let b = monoid.set_exponents(&[2]).unwrap();

        let Inserted::New(id_a) = table.insert(&field, a, 1, record()) else {
            panic!("expected new node");
        };
        table.take(id_a);
        let Inserted::New(id_b) = table.insert(&field, b, 1, record()) else {
            panic!("expected new node");
        };
        assert_eq!(id_a, id_b);
    }
}
