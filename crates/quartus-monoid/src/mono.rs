//! The monomial record.
//!
//! Monomials are created and combined through [`crate::MonoMonoid`], which
//! maintains the degree and hash caches; this module only defines the data
//! and the cache-free observations on it.

use std::fmt;
use std::hash::{Hash, Hasher};

use smallvec::SmallVec;
use thiserror::Error;

use crate::Exponent;

/// A module position tag. Zero means a plain polynomial monomial.
pub type Component = u32;

/// A cached total degree.
pub type Degree = u32;

/// Errors from monomial arithmetic.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MonoError {
    /// An exponent or the total degree left the representable range.
    #[error("exponent overflow in variable {var}")]
    ExponentOverflow {
        /// The variable whose exponent overflowed.
        var: usize,
    },
    /// Division was requested for a non-divisible pair.
    #[error("monomial is not divisible")]
    NotDivisible,
    /// Both multiplication operands carried a module component.
    #[error("both operands carry a module component")]
    ComponentClash,
    /// A textual monomial could not be parsed.
    #[error("{0}")]
    Parse(String),
}

/// A monomial: exponent vector, component tag, cached degree and hash.
///
/// Equality looks at exponents and component only; degree and hash are
/// derived caches maintained by the monoid.
#[derive(Clone)]
pub struct Mono {
    pub(crate) exps: SmallVec<[Exponent; 8]>,
    pub(crate) component: Component,
    pub(crate) degree: Degree,
    pub(crate) hash: u32,
}

impl Mono {
    pub(crate) fn from_parts(
        exps: SmallVec<[Exponent; 8]>,
        component: Component,
        degree: Degree,
        hash: u32,
    ) -> Self {
        Self {
            exps,
            component,
            degree,
            hash,
        }
    }

    /// Returns the exponent vector.
    #[must_use]
    pub fn exponents(&self) -> &[Exponent] {
        &self.exps
    }

    /// Returns the exponent of variable `var`.
    #[must_use]
    pub fn exponent(&self, var: usize) -> Exponent {
        self.exps.get(var).copied().unwrap_or(0)
    }

    /// Returns the module component tag (0 for plain monomials).
    #[must_use]
    pub fn component(&self) -> Component {
        self.component
    }

    /// Returns the cached total degree (component excluded).
    #[must_use]
    pub fn degree(&self) -> Degree {
        self.degree
    }

    /// Returns the cached linear hash.
    #[must_use]
    pub fn hash_value(&self) -> u32 {
        self.hash
    }

    /// True for the identity monomial of a plain (component 0) monoid slot.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.degree == 0 && self.component == 0
    }
}

impl PartialEq for Mono {
    fn eq(&self, other: &Self) -> bool {
        self.component == other.component
            && self.degree == other.degree
            && self.exps == other.exps
    }
}

impl Eq for Mono {}

impl Hash for Mono {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash);
        state.write_u32(self.component);
    }
}

impl Mono {
    // x0^2*x1 style with an optional trailing <component>; shared by
    // Debug, Display and the text printer.
    fn fmt_terms(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (i, &e) in self.exps.iter().enumerate() {
            if e == 0 {
                continue;
            }
            if !first {
                write!(f, "*")?;
            }
            first = false;
            if e == 1 {
                write!(f, "x{i}")?;
            } else {
                write!(f, "x{i}^{e}")?;
            }
        }
        if first {
            write!(f, "1")?;
        }
        if self.component != 0 {
            write!(f, "<{}>", self.component)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Mono {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_terms(f)
    }
}

impl fmt::Display for Mono {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_terms(f)
    }
}
