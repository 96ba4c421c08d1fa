//! Prime field arithmetic for Gröbner basis computation.
//!
//! Coefficients live in Z/p for a small odd prime p chosen at runtime,
//! so the field is a context object rather than a type parameter.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod prime_field;

pub use prime_field::{FieldError, PrimeField, Scalar};
