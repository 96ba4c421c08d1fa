//! Sparse polynomials over a prime field.
//!
//! Terms are kept strictly decreasing in the ambient monomial ordering
//! with nonzero coefficients; the empty term list is the zero polynomial.

use std::cmp::Ordering;
use std::fmt;

use quartus_monoid::{Component, Mono, MonoError, MonoMonoid};
use quartus_rings::{PrimeField, Scalar};

/// One (coefficient, monomial) term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Term {
    /// The coefficient, a nonzero field representative.
    pub coef: Scalar,
    /// The monomial.
    pub mono: Mono,
}

/// A polynomial as an ordered term list.
///
/// The polynomial exclusively owns its monomials; cloning deep-copies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Poly {
    terms: Vec<Term>,
}

impl Poly {
    /// Creates the zero polynomial.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Builds a polynomial from unsorted terms, combining duplicates and
    /// dropping zero coefficients.
    #[must_use]
    pub fn from_terms(
        monoid: &MonoMonoid,
        field: &PrimeField,
        terms: Vec<(Scalar, Mono)>,
    ) -> Self {
        let mut terms = terms;
        terms.sort_by(|a, b| monoid.compare(&b.1, &a.1));
        let mut poly = Self::zero();
        for (coef, mono) in terms {
            match poly.terms.last_mut() {
                Some(last) if last.mono == mono => {
                    last.coef = field.add(last.coef, coef);
                }
                _ => poly.terms.push(Term { coef, mono }),
            }
        }
        poly.terms.retain(|t| t.coef != 0);
        poly
    }

    /// Appends a term; must be strictly below the current last term.
    pub fn append_term(&mut self, coef: Scalar, mono: Mono) {
        debug_assert!(coef != 0, "appending a zero term");
        self.terms.push(Term { coef, mono });
    }

    /// Checks the term-list invariants; called after manual construction.
    ///
    /// Asserts strictly decreasing monomials, nonzero coefficients, and a
    /// uniform component tag.
    pub fn finalize(&self, monoid: &MonoMonoid) {
        debug_assert!(self.terms.iter().all(|t| t.coef != 0));
        debug_assert!(self
            .terms
            .windows(2)
            .all(|w| monoid.compare(&w[0].mono, &w[1].mono) == Ordering::Greater));
        if let Some(first) = self.terms.first() {
            debug_assert!(self
                .terms
                .iter()
                .all(|t| t.mono.component() == first.mono.component()));
        }
    }

    /// True for the zero polynomial.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// The number of terms.
    #[must_use]
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// The terms, greatest first.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// The lead term, if any.
    #[must_use]
    pub fn lead_term(&self) -> Option<&Term> {
        self.terms.first()
    }

    /// The lead monomial, if any.
    #[must_use]
    pub fn lead_mono(&self) -> Option<&Mono> {
        self.terms.first().map(|t| &t.mono)
    }

    /// The lead coefficient, if any.
    #[must_use]
    pub fn lead_coef(&self) -> Option<Scalar> {
        self.terms.first().map(|t| t.coef)
    }

    /// The total degree of the lead monomial (zero for the zero polynomial).
    #[must_use]
    pub fn degree(&self) -> u32 {
        self.terms.first().map_or(0, |t| t.mono.degree())
    }

    /// The shared component tag of the terms.
    #[must_use]
    pub fn component(&self) -> Option<Component> {
        self.terms.first().map(|t| t.mono.component())
    }

    /// Divides every coefficient by the lead, making the lead 1.
    pub fn make_monic(&mut self, field: &PrimeField) {
        let Some(lead) = self.lead_coef() else {
            return;
        };
        if lead == 1 {
            return;
        }
        // Lead coefficients are nonzero by invariant.
        let Some(inv) = field.inverse(lead) else {
            return;
        };
        for term in &mut self.terms {
            term.coef = field.mul(term.coef, inv);
        }
    }

    /// Multiplies every coefficient by a nonzero scalar.
    pub fn scalar_mul(&mut self, field: &PrimeField, c: Scalar) {
        debug_assert!(c != 0, "scaling by zero");
        for term in &mut self.terms {
            term.coef = field.mul(term.coef, c);
        }
    }

    /// Returns `mult * self` as a new polynomial.
    pub fn mono_multiple(&self, monoid: &MonoMonoid, mult: &Mono) -> Result<Self, MonoError> {
        let mut terms = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            terms.push(Term {
                coef: term.coef,
                mono: monoid.multiply(mult, &term.mono)?,
            });
        }
        Ok(Self { terms })
    }

    /// Adds `other` into `self`, merging sorted term lists.
    pub fn add_assign(&mut self, monoid: &MonoMonoid, field: &PrimeField, other: &Poly) {
        let mut merged = Vec::with_capacity(self.terms.len() + other.terms.len());
        let mut left = self.terms.drain(..).peekable();
        let mut right = other.terms.iter().cloned().peekable();
        loop {
            match (left.peek(), right.peek()) {
                (Some(a), Some(b)) => match monoid.compare(&a.mono, &b.mono) {
                    Ordering::Greater => merged.push(left.next().expect("peeked")),
                    Ordering::Less => merged.push(right.next().expect("peeked")),
                    Ordering::Equal => {
                        let a = left.next().expect("peeked");
                        let b = right.next().expect("peeked");
                        let coef = field.add(a.coef, b.coef);
                        if coef != 0 {
                            merged.push(Term { coef, mono: a.mono });
                        }
                    }
                },
                (Some(_), None) => merged.push(left.next().expect("peeked")),
                (None, Some(_)) => merged.push(right.next().expect("peeked")),
                (None, None) => break,
            }
        }
        drop(left);
        self.terms = merged;
    }
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            if term.mono.degree() == 0 && term.mono.component() == 0 {
                write!(f, "{}", term.coef)?;
            } else if term.coef == 1 {
                write!(f, "{}", term.mono)?;
            } else {
                write!(f, "{} * {}", term.coef, term.mono)?;
            }
        }
        Ok(())
    }
}
