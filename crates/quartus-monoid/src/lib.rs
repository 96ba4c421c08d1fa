//! Monomials for Gröbner basis computation.
//!
//! A monomial is a fixed-width exponent vector with an optional module
//! component tag, a cached total degree and a cached linear hash. The
//! [`MonoMonoid`] context owns the ordering, the hash weights and a pool
//! of recycled allocations.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod divmask;
pub mod mono;
pub mod monoid;
pub mod order;
pub mod pool;

mod proptests;

pub use divmask::DivMask;
pub use mono::{Component, Degree, Mono, MonoError};
pub use monoid::MonoMonoid;
pub use order::MonoOrder;
pub use pool::MonoPool;

/// The width of a single exponent, chosen at build time.
#[cfg(feature = "exp8")]
pub type Exponent = u8;
/// The width of a single exponent, chosen at build time.
#[cfg(all(feature = "exp32", not(feature = "exp8")))]
pub type Exponent = u32;
/// The width of a single exponent, chosen at build time.
#[cfg(not(any(feature = "exp8", feature = "exp32")))]
pub type Exponent = u16;
