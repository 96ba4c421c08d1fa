//! # Quartus
//!
//! A Gröbner basis engine over small prime fields, built around the
//! classical Buchberger algorithm, a matrix-based F4 reducer and a
//! signature-based (F5-style) loop.
//!
//! ## Quick start
//!
//! ```rust
//! use quartus::prelude::*;
//!
//! let parsed = parse_ideal("101 3 4\n2\nx0 - x1\nx1 - x2\n").unwrap();
//! let mut gb = ClassicalGb::new(parsed.monoid, parsed.field, GbConfig::default());
//! for g in parsed.generators {
//!     gb.add_generator(g).unwrap();
//! }
//! gb.compute().unwrap();
//! let basis = gb.into_reduced_basis().unwrap();
//! assert_eq!(basis.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use quartus_groebner as groebner;
pub use quartus_linalg as linalg;
pub use quartus_monoid as monoid;
pub use quartus_poly as poly;
pub use quartus_rings as rings;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use quartus_groebner::io::{format_basis, parse_ideal};
    pub use quartus_groebner::{ClassicalGb, Error, GbConfig, SignatureGb};
    pub use quartus_monoid::{Mono, MonoMonoid, MonoOrder};
    pub use quartus_poly::{Poly, PolyBasis};
    pub use quartus_rings::PrimeField;
}
