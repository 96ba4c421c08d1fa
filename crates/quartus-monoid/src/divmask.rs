//! Divisor masks.
//!
//! A mask projects an exponent vector onto a single machine word so that
//! most non-divisors are rejected with one AND. The word's bits are dealt
//! round-robin to the variables; a variable's k-th bit is set when its
//! exponent reaches the k-th doubling threshold.

use crate::Mono;

/// A one-word summary of which exponents clear which thresholds.
///
/// If `a` divides `b` then every bit of `mask(a)` is set in `mask(b)`, so
/// `mask(a) & !mask(b) != 0` proves non-divisibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DivMask(u64);

impl DivMask {
    /// The mask with no bits set; a subset of every mask.
    pub const NONE: DivMask = DivMask(0);

    /// Computes the mask of a monomial in a `var_count`-variable monoid.
    #[must_use]
    pub fn compute(mono: &Mono, var_count: usize) -> Self {
        if var_count == 0 {
            return Self::NONE;
        }
        let bits_per_var = (64 / var_count).clamp(1, 8) as u32;
        let mut mask = 0u64;
        for var in 0..var_count.min(64) {
            let exp = mono.exponent(var) as u64;
            for k in 0..bits_per_var {
                // Thresholds 1, 2, 4, 8, ... per variable.
                if exp >= 1 << k {
                    mask |= 1 << (var as u32 * bits_per_var + k);
                }
            }
        }
        Self(mask)
    }

    /// True unless the mask proves `self`'s monomial cannot divide
    /// `other`'s monomial.
    #[must_use]
    pub fn can_divide(self, other: DivMask) -> bool {
        self.0 & !other.0 == 0
    }

    /// The union of two masks; used for k-d tree subtree summaries.
    #[must_use]
    pub fn union(self, other: DivMask) -> Self {
        Self(self.0 | other.0)
    }

    /// The intersection of two masks.
    ///
    /// A set of monomials can contain a divisor of `m` only if the
    /// intersection of their masks is contained in `mask(m)`.
    #[must_use]
    pub fn intersection(self, other: DivMask) -> Self {
        Self(self.0 & other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MonoMonoid, MonoOrder};

    #[test]
    fn mask_never_rejects_a_true_divisor() {
        let monoid = MonoMonoid::new(4, MonoOrder::Grevlex);
        let vecs: Vec<Vec<crate::Exponent>> = vec![
            vec![0, 0, 0, 0],
            vec![1, 0, 2, 0],
            vec![3, 1, 2, 5],
            vec![0, 7, 0, 1],
            vec![9, 9, 9, 9],
        ];
        let monos: Vec<Mono> = vecs
            .iter()
            .map(|v| monoid.set_exponents(v).unwrap())
            .collect();
        for a in &monos {
            for b in &monos {
                let ma = DivMask::compute(a, 4);
                let mb = DivMask::compute(b, 4);
                if monoid.divides(a, b) {
                    assert!(ma.can_divide(mb));
                }
            }
        }
    }

    #[test]
    fn mask_rejects_obvious_non_divisors() {
        let monoid = MonoMonoid::new(2, MonoOrder::Grevlex);
        let a = monoid.set_exponents(&[4, 0]).unwrap();
        let b = monoid.set_exponents(&[0, 4]).unwrap();
        let ma = DivMask::compute(&a, 2);
        let mb = DivMask::compute(&b, 2);
        assert!(!ma.can_divide(mb));
    }

    #[test]
    fn union_covers_both() {
        let monoid = MonoMonoid::new(2, MonoOrder::Grevlex);
        let a = monoid.set_exponents(&[4, 0]).unwrap();
        let b = monoid.set_exponents(&[0, 4]).unwrap();
        let ma = DivMask::compute(&a, 2);
        let mb = DivMask::compute(&b, 2);
        let u = ma.union(mb);
        assert!(ma.can_divide(u));
        assert!(mb.can_divide(u));
    }
}
