//! Engine errors.

use thiserror::Error;

use quartus_linalg::MatrixError;
use quartus_monoid::MonoError;
use quartus_rings::FieldError;

/// Errors surfaced by the computation engine.
///
/// Reduction to zero is never an error; it is a recorded syzygy.
#[derive(Debug, Error)]
pub enum Error {
    /// A malformed ideal file.
    #[error("input error at line {line}: {msg}")]
    Input {
        /// One-based line number.
        line: usize,
        /// What went wrong.
        msg: String,
    },
    /// An unknown option name or incompatible combination.
    #[error("configuration error: {0}")]
    Config(String),
    /// A monomial operation overflowed while processing a generator.
    #[error("exponent overflow while reducing against generator {generator}")]
    Overflow {
        /// The generator being combined when the overflow happened.
        generator: usize,
        /// The underlying monomial error.
        #[source]
        source: MonoError,
    },
    /// The F4 matrix needed more than 2^32 columns.
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    /// The ring descriptor asked for an unusable characteristic.
    #[error(transparent)]
    Field(#[from] FieldError),
}

impl Error {
    /// Wraps a monomial error with the generator being processed.
    #[must_use]
    pub fn overflow(generator: usize, source: MonoError) -> Self {
        Self::Overflow { generator, source }
    }
}
