//! Polynomials and basis containers for Gröbner basis computation.
//!
//! A polynomial is a sparse ordered list of terms over a prime field; a
//! basis is an indexed sequence of monic generators with a divisor lookup
//! over their lead monomials. The signature-augmented basis additionally
//! tracks one module-monomial signature per generator.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod basis;
pub mod divisor;
pub mod poly;
pub mod sig_basis;

pub use basis::PolyBasis;
pub use divisor::{DivList, DivisorLookup, Entry, KdTree, LookupKind};
pub use poly::{Poly, Term};
pub use sig_basis::SigPolyBasis;
