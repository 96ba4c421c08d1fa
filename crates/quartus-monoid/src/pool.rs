//! Recycling pool for monomial allocations.
//!
//! Hot paths such as the S-pair queue create and destroy many short-lived
//! monomials; the pool retains their allocations instead of returning them
//! to the system. A live counter catches checkout leaks.

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::{Component, Mono};

/// A free list of recycled monomials.
///
/// The mutex keeps the owning monoid `Sync`, so it can be shared across
/// the parallel matrix-construction and row-reduction regions.
#[derive(Debug, Default)]
pub struct MonoPool {
    inner: Mutex<PoolInner>,
}

#[derive(Debug, Default)]
struct PoolInner {
    free: Vec<Mono>,
    live: usize,
}

impl MonoPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks out a monomial, reusing a recycled allocation if possible.
    ///
    /// The returned monomial is always the identity: exponents zero-filled
    /// to `var_count`, component zero, caches zeroed.
    #[must_use]
    pub fn alloc(&self, var_count: usize) -> Mono {
        let mut inner = self.inner.lock();
        inner.live += 1;
        let mut mono = inner.free.pop().unwrap_or_else(|| {
            Mono::from_parts(SmallVec::new(), 0 as Component, 0, 0)
        });
        mono.exps.clear();
        mono.exps.resize(var_count, 0);
        mono.component = 0;
        mono.degree = 0;
        mono.hash = 0;
        mono
    }

    /// Returns a monomial to the pool.
    ///
    /// The allocation is retained; the free list never shrinks.
    pub fn recycle(&self, mono: Mono) {
        let mut inner = self.inner.lock();
        debug_assert!(inner.live > 0, "recycle without matching alloc");
        inner.live = inner.live.saturating_sub(1);
        inner.free.push(mono);
    }

    /// The number of checked-out monomials not yet recycled.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.inner.lock().live
    }

    /// The number of allocations waiting on the free list.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.inner.lock().free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MonoMonoid, MonoOrder};

    #[test]
    fn alloc_after_recycle_is_identity() {
        let pool = MonoPool::new();
        let monoid = MonoMonoid::new(3, MonoOrder::Grevlex);

        let mut m = pool.alloc(3);
        assert!(m.is_identity());

        // Dirty it through the monoid, give it back, take it out again.
        monoid.copy_into_pooled(&monoid.set_exponents(&[4, 5, 6]).unwrap(), &mut m);
        assert!(!m.is_identity());
        pool.recycle(m);
        let again = pool.alloc(3);
        assert!(again.is_identity());
        assert_eq!(again.exponents(), &[0, 0, 0]);
        pool.recycle(again);
    }

    #[test]
    fn live_counting_catches_leaks() {
        let pool = MonoPool::new();
        let a = pool.alloc(2);
        let b = pool.alloc(2);
        assert_eq!(pool.live_count(), 2);
        pool.recycle(a);
        assert_eq!(pool.live_count(), 1);
        pool.recycle(b);
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.free_count(), 2);
    }
}
