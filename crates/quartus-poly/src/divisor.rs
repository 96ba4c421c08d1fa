//! Divisor lookup over the lead monomials of a basis.
//!
//! Two interchangeable implementations sit behind one contract: a flat
//! list with divisor masks and a k-d tree over exponent vectors. Queries
//! take a sink that may stop the traversal early by returning false.

use quartus_monoid::{DivMask, Mono, MonoMonoid};

/// One lookup entry: a monomial and the generator index it came from.
#[derive(Clone, Debug)]
pub struct Entry {
    /// The indexed monomial (a lead monomial or a signature).
    pub mono: Mono,
    /// The owning generator index.
    pub index: usize,
}

/// Which lookup implementation to construct.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LookupKind {
    /// Flat list with divisor masks.
    #[default]
    DivList,
    /// Static-layout k-d tree.
    KdTree,
}

/// A divisor lookup, dispatching to the configured implementation.
#[derive(Debug)]
pub enum DivisorLookup {
    /// Flat list with divisor masks.
    List(DivList),
    /// k-d tree with mask-annotated subtrees.
    Tree(KdTree),
}

impl DivisorLookup {
    /// Creates an empty lookup of the requested kind.
    #[must_use]
    pub fn new(kind: LookupKind, var_count: usize) -> Self {
        match kind {
            LookupKind::DivList => Self::List(DivList::new(var_count)),
            LookupKind::KdTree => Self::Tree(KdTree::new(var_count)),
        }
    }

    /// The number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::List(l) => l.len(),
            Self::Tree(t) => t.len(),
        }
    }

    /// True if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts an entry.
    pub fn insert(&mut self, mono: Mono, index: usize) {
        match self {
            Self::List(l) => l.insert(mono, index),
            Self::Tree(t) => t.insert(mono, index),
        }
    }

    /// Removes the entry with exactly this monomial, if present.
    pub fn remove(&mut self, mono: &Mono) {
        match self {
            Self::List(l) => l.remove(mono),
            Self::Tree(t) => t.remove(mono),
        }
    }

    /// Removes every entry whose monomial is a multiple of `mono`.
    pub fn remove_multiples(&mut self, monoid: &MonoMonoid, mono: &Mono) {
        match self {
            Self::List(l) => l.remove_multiples(monoid, mono),
            Self::Tree(t) => t.remove_multiples(monoid, mono),
        }
    }

    /// Returns some entry whose monomial divides `mono`, if one exists.
    #[must_use]
    pub fn find_any_divisor(&self, monoid: &MonoMonoid, mono: &Mono) -> Option<&Entry> {
        match self {
            Self::List(l) => l.find_any_divisor(monoid, mono),
            Self::Tree(t) => t.find_any_divisor(monoid, mono),
        }
    }

    /// Visits every entry whose monomial divides `mono` until the sink
    /// returns false. Returns false if the sink stopped the traversal.
    pub fn for_each_divisor<F>(&self, monoid: &MonoMonoid, mono: &Mono, sink: F) -> bool
    where
        F: FnMut(&Entry) -> bool,
    {
        match self {
            Self::List(l) => l.for_each_divisor(monoid, mono, sink),
            Self::Tree(t) => t.for_each_divisor(monoid, mono, sink),
        }
    }

    /// Visits every entry whose monomial is a multiple of `mono` until the
    /// sink returns false.
    pub fn for_each_multiple<F>(&self, monoid: &MonoMonoid, mono: &Mono, sink: F) -> bool
    where
        F: FnMut(&Entry) -> bool,
    {
        match self {
            Self::List(l) => l.for_each_multiple(monoid, mono, sink),
            Self::Tree(t) => t.for_each_multiple(monoid, mono, sink),
        }
    }
}

/// Flat vector of entries with precomputed divisor masks.
///
/// `for_each_divisor` visits survivors in insertion order, which the
/// reducer tie-breaking rules rely on being deterministic.
#[derive(Debug)]
pub struct DivList {
    var_count: usize,
    entries: Vec<(DivMask, Entry)>,
}

impl DivList {
    fn new(var_count: usize) -> Self {
        Self {
            var_count,
            entries: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn insert(&mut self, mono: Mono, index: usize) {
        let mask = DivMask::compute(&mono, self.var_count);
        self.entries.push((mask, Entry { mono, index }));
    }

    fn remove(&mut self, mono: &Mono) {
        if let Some(pos) = self.entries.iter().position(|(_, e)| &e.mono == mono) {
            self.entries.remove(pos);
        }
    }

    fn remove_multiples(&mut self, monoid: &MonoMonoid, mono: &Mono) {
        let mask = DivMask::compute(mono, self.var_count);
        self.entries
            .retain(|(m, e)| !(mask.can_divide(*m) && monoid.divides(mono, &e.mono)));
    }

    fn find_any_divisor(&self, monoid: &MonoMonoid, mono: &Mono) -> Option<&Entry> {
        let mask = DivMask::compute(mono, self.var_count);
        self.entries
            .iter()
            .find(|(m, e)| m.can_divide(mask) && monoid.divides(&e.mono, mono))
            .map(|(_, e)| e)
    }

    fn for_each_divisor<F>(&self, monoid: &MonoMonoid, mono: &Mono, mut sink: F) -> bool
    where
        F: FnMut(&Entry) -> bool,
    {
        let mask = DivMask::compute(mono, self.var_count);
        for (m, e) in &self.entries {
            if m.can_divide(mask) && monoid.divides(&e.mono, mono) && !sink(e) {
                return false;
            }
        }
        true
    }

    fn for_each_multiple<F>(&self, monoid: &MonoMonoid, mono: &Mono, mut sink: F) -> bool
    where
        F: FnMut(&Entry) -> bool,
    {
        let mask = DivMask::compute(mono, self.var_count);
        for (m, e) in &self.entries {
            if mask.can_divide(*m) && monoid.divides(mono, &e.mono) && !sink(e) {
                return false;
            }
        }
        true
    }
}

const LEAF_SIZE: usize = 8;
const REBUILD_RATIO: f64 = 0.5;
const MIN_REBUILD: usize = 32;

/// A static-layout k-d tree over exponent vectors.
///
/// Internal nodes store the split variable and value plus two mask
/// summaries of their subtree: the intersection of entry masks prunes
/// divisor queries, the union prunes multiple queries. Removals mark and
/// count; the tree rebuilds itself once removals exceed
/// `REBUILD_RATIO * len + MIN_REBUILD`.
#[derive(Debug)]
pub struct KdTree {
    var_count: usize,
    nodes: Vec<Node>,
    root: usize,
    len: usize,
    removed: usize,
}

#[derive(Debug)]
enum Node {
    Inner {
        var: usize,
        value: u32,
        // Intersection of subtree entry masks: a divisor of m can exist
        // below only if inter ⊆ mask(m).
        inter: DivMask,
        // Union of subtree entry masks: a multiple of m can exist below
        // only if mask(m) ⊆ union.
        union: DivMask,
        low: usize,
        high: usize,
    },
    Leaf {
        entries: Vec<(DivMask, Entry)>,
    },
}

impl KdTree {
    fn new(var_count: usize) -> Self {
        Self {
            var_count,
            nodes: vec![Node::Leaf { entries: Vec::new() }],
            root: 0,
            len: 0,
            removed: 0,
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn insert(&mut self, mono: Mono, index: usize) {
        let mask = DivMask::compute(&mono, self.var_count);
        let entry = Entry { mono, index };
        let mut node = self.root;
        loop {
            match &mut self.nodes[node] {
                Node::Inner {
                    var,
                    value,
                    inter,
                    union,
                    low,
                    high,
                } => {
                    *inter = inter.intersection(mask);
                    *union = union.union(mask);
                    node = if (entry.mono.exponent(*var) as u32) < *value {
                        *low
                    } else {
                        *high
                    };
                }
                Node::Leaf { entries } => {
                    entries.push((mask, entry));
                    self.len += 1;
                    if entries.len() > LEAF_SIZE {
                        self.split_leaf(node);
                    }
                    return;
                }
            }
        }
    }

    fn split_leaf(&mut self, node: usize) {
        let Node::Leaf { entries } = std::mem::replace(
            &mut self.nodes[node],
            Node::Leaf { entries: Vec::new() },
        ) else {
            return;
        };
        // Split on the variable with the widest exponent spread.
        let mut best_var = 0;
        let mut best_spread = 0i64;
        let mut best_mid = 0u32;
        for var in 0..self.var_count {
            let mut min = u32::MAX;
            let mut max = 0u32;
            for (_, e) in &entries {
                let exp = e.mono.exponent(var) as u32;
                min = min.min(exp);
                max = max.max(exp);
            }
            let spread = max as i64 - min as i64;
            if spread > best_spread {
                best_spread = spread;
                best_var = var;
                best_mid = min + (max - min + 1) / 2;
            }
        }
        if best_spread == 0 {
            // All entries identical in every variable; keep an oversized leaf.
            self.nodes[node] = Node::Leaf { entries };
            return;
        }

        let (mut low_entries, mut high_entries) = (Vec::new(), Vec::new());
        let mut inter = DivMask::NONE;
        let mut union = DivMask::NONE;
        for (i, (mask, entry)) in entries.into_iter().enumerate() {
            inter = if i == 0 { mask } else { inter.intersection(mask) };
            union = union.union(mask);
            if (entry.mono.exponent(best_var) as u32) < best_mid {
                low_entries.push((mask, entry));
            } else {
                high_entries.push((mask, entry));
            }
        }
        let low = self.nodes.len();
        self.nodes.push(Node::Leaf { entries: low_entries });
        let high = self.nodes.len();
        self.nodes.push(Node::Leaf { entries: high_entries });
        self.nodes[node] = Node::Inner {
            var: best_var,
            value: best_mid,
            inter,
            union,
            low,
            high,
        };
    }

    fn remove(&mut self, mono: &Mono) {
        let mut removed = false;
        self.visit_leaves_mut(self.root, &mut |entries| {
            if removed {
                return;
            }
            if let Some(pos) = entries.iter().position(|(_, e)| &e.mono == mono) {
                entries.remove(pos);
                removed = true;
            }
        });
        if removed {
            self.len -= 1;
            self.removed += 1;
            self.maybe_rebuild();
        }
    }

    fn remove_multiples(&mut self, monoid: &MonoMonoid, mono: &Mono) {
        let mask = DivMask::compute(mono, self.var_count);
        let mut removed = 0usize;
        self.visit_leaves_mut(self.root, &mut |entries| {
            let before = entries.len();
            entries.retain(|(m, e)| !(mask.can_divide(*m) && monoid.divides(mono, &e.mono)));
            removed += before - entries.len();
        });
        self.len -= removed;
        self.removed += removed;
        if removed > 0 {
            self.maybe_rebuild();
        }
    }

    fn visit_leaves_mut(&mut self, node: usize, f: &mut impl FnMut(&mut Vec<(DivMask, Entry)>)) {
        match &mut self.nodes[node] {
            Node::Inner { low, high, .. } => {
                let (low, high) = (*low, *high);
                self.visit_leaves_mut(low, f);
                self.visit_leaves_mut(high, f);
            }
            Node::Leaf { entries } => f(entries),
        }
    }

    fn maybe_rebuild(&mut self) {
        if self.removed as f64 > REBUILD_RATIO * self.len as f64 + MIN_REBUILD as f64 {
            self.rebuild();
        }
    }

    fn rebuild(&mut self) {
        let mut all: Vec<(DivMask, Entry)> = Vec::with_capacity(self.len);
        self.visit_leaves_mut(self.root, &mut |entries| all.append(entries));
        // Deterministic layout: rebuild by re-inserting in index order.
        all.sort_by_key(|(_, e)| e.index);
        self.nodes.clear();
        self.nodes.push(Node::Leaf { entries: Vec::new() });
        self.root = 0;
        self.len = 0;
        self.removed = 0;
        for (_, entry) in all {
            self.insert(entry.mono, entry.index);
        }
    }

    fn find_any_divisor(&self, monoid: &MonoMonoid, mono: &Mono) -> Option<&Entry> {
        let mask = DivMask::compute(mono, self.var_count);
        self.find_divisor_in(self.root, monoid, mono, mask)
    }

    fn find_divisor_in(
        &self,
        node: usize,
        monoid: &MonoMonoid,
        mono: &Mono,
        mask: DivMask,
    ) -> Option<&Entry> {
        match &self.nodes[node] {
            Node::Inner {
                var,
                value,
                inter,
                low,
                high,
                ..
            } => {
                if !inter.can_divide(mask) {
                    return None;
                }
                if let Some(found) = self.find_divisor_in(*low, monoid, mono, mask) {
                    return Some(found);
                }
                if (mono.exponent(*var) as u32) >= *value {
                    return self.find_divisor_in(*high, monoid, mono, mask);
                }
                None
            }
            Node::Leaf { entries } => entries
                .iter()
                .find(|(m, e)| m.can_divide(mask) && monoid.divides(&e.mono, mono))
                .map(|(_, e)| e),
        }
    }

    fn for_each_divisor<F>(&self, monoid: &MonoMonoid, mono: &Mono, mut sink: F) -> bool
    where
        F: FnMut(&Entry) -> bool,
    {
        let mask = DivMask::compute(mono, self.var_count);
        self.divisor_walk(self.root, monoid, mono, mask, &mut sink)
    }

    fn divisor_walk(
        &self,
        node: usize,
        monoid: &MonoMonoid,
        mono: &Mono,
        mask: DivMask,
        sink: &mut impl FnMut(&Entry) -> bool,
    ) -> bool {
        match &self.nodes[node] {
            Node::Inner {
                var,
                value,
                inter,
                low,
                high,
                ..
            } => {
                if !inter.can_divide(mask) {
                    return true;
                }
                // Divisors have exponent <= mono's, so the low side is
                // always possible; the high side only if mono clears the
                // split value.
                if !self.divisor_walk(*low, monoid, mono, mask, sink) {
                    return false;
                }
                if (mono.exponent(*var) as u32) >= *value {
                    return self.divisor_walk(*high, monoid, mono, mask, sink);
                }
                true
            }
            Node::Leaf { entries } => {
                for (m, e) in entries {
                    if m.can_divide(mask) && monoid.divides(&e.mono, mono) && !sink(e) {
                        return false;
                    }
                }
                true
            }
        }
    }

    fn for_each_multiple<F>(&self, monoid: &MonoMonoid, mono: &Mono, mut sink: F) -> bool
    where
        F: FnMut(&Entry) -> bool,
    {
        let mask = DivMask::compute(mono, self.var_count);
        self.multiple_walk(self.root, monoid, mono, mask, &mut sink)
    }

    fn multiple_walk(
        &self,
        node: usize,
        monoid: &MonoMonoid,
        mono: &Mono,
        mask: DivMask,
        sink: &mut impl FnMut(&Entry) -> bool,
    ) -> bool {
        match &self.nodes[node] {
            Node::Inner {
                var,
                value,
                union,
                low,
                high,
                ..
            } => {
                if !mask.can_divide(*union) {
                    return true;
                }
                // Multiples have exponent >= mono's, so the high side is
                // always possible; the low side only if mono sits below
                // the split value.
                if (mono.exponent(*var) as u32) < *value
                    && !self.multiple_walk(*low, monoid, mono, mask, sink)
                {
                    return false;
                }
                self.multiple_walk(*high, monoid, mono, mask, sink)
            }
            Node::Leaf { entries } => {
                for (m, e) in entries {
                    if mask.can_divide(*m) && monoid.divides(mono, &e.mono) && !sink(e) {
                        return false;
                    }
                }
                true
            }
        }
    }
}
