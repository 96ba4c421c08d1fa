//! Arithmetic modulo a small odd prime.
//!
//! The modulus is read from the input file at runtime, so elements are
//! plain machine words interpreted through a `PrimeField` context.

use thiserror::Error;

/// A field element representative in `[0, p)`.
///
/// The width matches the scalars stored in the F4 sparse matrices.
pub type Scalar = u16;

/// Errors raised when constructing a field.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    /// The requested characteristic is not an odd prime below 2^16.
    #[error("characteristic {0} is not a small odd prime")]
    BadCharacteristic(u32),
}

/// The field Z/p for an odd prime p < 2^16.
///
/// All operations reduce eagerly; inverses come from a table built once
/// at construction, which is affordable since p fits in 16 bits.
#[derive(Clone, Debug)]
pub struct PrimeField {
    modulus: u32,
    inverses: Vec<Scalar>,
}

impl PrimeField {
    /// Creates the field Z/p.
    ///
    /// Fails unless p is an odd prime that fits in a `Scalar`.
    pub fn new(p: u32) -> Result<Self, FieldError> {
        if p < 3 || p > Scalar::MAX as u32 || !is_odd_prime(p) {
            return Err(FieldError::BadCharacteristic(p));
        }
        let mut field = Self {
            modulus: p,
            inverses: Vec::new(),
        };
        field.inverses = field.build_inverse_table();
        Ok(field)
    }

    /// Returns the characteristic p.
    #[must_use]
    pub fn characteristic(&self) -> u32 {
        self.modulus
    }

    /// Reduces an arbitrary unsigned value into the field.
    #[must_use]
    pub fn from_u64(&self, value: u64) -> Scalar {
        (value % self.modulus as u64) as Scalar
    }

    /// Reduces a signed value into the field.
    #[must_use]
    pub fn from_i64(&self, value: i64) -> Scalar {
        let p = self.modulus as i64;
        let r = value.rem_euclid(p);
        r as Scalar
    }

    /// Adds two elements.
    #[must_use]
    pub fn add(&self, a: Scalar, b: Scalar) -> Scalar {
        let sum = a as u32 + b as u32;
        if sum >= self.modulus {
            (sum - self.modulus) as Scalar
        } else {
            sum as Scalar
        }
    }

    /// Subtracts b from a.
    #[must_use]
    pub fn sub(&self, a: Scalar, b: Scalar) -> Scalar {
        if a >= b {
            a - b
        } else {
            (a as u32 + self.modulus - b as u32) as Scalar
        }
    }

    /// Multiplies two elements.
    #[must_use]
    pub fn mul(&self, a: Scalar, b: Scalar) -> Scalar {
        ((a as u32 * b as u32) % self.modulus) as Scalar
    }

    /// Returns the additive inverse.
    #[must_use]
    pub fn negate(&self, a: Scalar) -> Scalar {
        if a == 0 {
            0
        } else {
            (self.modulus - a as u32) as Scalar
        }
    }

    /// Returns the multiplicative inverse, or `None` for zero.
    #[must_use]
    pub fn inverse(&self, a: Scalar) -> Option<Scalar> {
        if a == 0 {
            None
        } else {
            Some(self.inverses[a as usize])
        }
    }

    /// Divides a by b.
    ///
    /// Returns `None` when b is zero; inverting zero indicates a logic bug
    /// in the caller, which asserts in debug builds.
    #[must_use]
    pub fn divide(&self, a: Scalar, b: Scalar) -> Option<Scalar> {
        debug_assert!(b != 0, "division by zero in prime field");
        self.inverse(b).map(|inv| self.mul(a, inv))
    }

    /// Computes a^exp by binary exponentiation.
    #[must_use]
    pub fn pow(&self, a: Scalar, mut exp: u32) -> Scalar {
        let mut base = a;
        let mut result: Scalar = 1;
        while exp > 0 {
            if exp & 1 == 1 {
                result = self.mul(result, base);
            }
            base = self.mul(base, base);
            exp >>= 1;
        }
        result
    }

    /// Reduces a 64-bit accumulator into the field.
    ///
    /// The F4 scratch vector defers modular reduction: since p < 2^16,
    /// sums of products stay below 2^64 across any realistic row count.
    #[must_use]
    pub fn reduce_accumulated(&self, acc: u64) -> Scalar {
        (acc % self.modulus as u64) as Scalar
    }

    /// Inverse by the extended Euclidean algorithm.
    ///
    /// Used to seed the table; also the reference against which the table
    /// is checked in tests.
    #[must_use]
    pub fn inverse_euclid(&self, a: Scalar) -> Option<Scalar> {
        if a == 0 {
            return None;
        }
        let mut t = 0i64;
        let mut new_t = 1i64;
        let mut r = self.modulus as i64;
        let mut new_r = a as i64;
        while new_r != 0 {
            let quotient = r / new_r;
            (t, new_t) = (new_t, t - quotient * new_t);
            (r, new_r) = (new_r, r - quotient * new_r);
        }
        debug_assert_eq!(r, 1, "modulus must be prime");
        Some(self.from_i64(t))
    }

    fn build_inverse_table(&self) -> Vec<Scalar> {
        let p = self.modulus as usize;
        let mut table = vec![0 as Scalar; p];
        if p > 1 {
            table[1] = 1;
        }
        // inv(i) = -(p / i) * inv(p mod i), the standard linear-time scan.
        for i in 2..p {
            let q = (p / i) as u64;
            let r = (p % i) as usize;
            let v = (q * table[r] as u64 % p as u64) as u32;
            table[i] = (self.modulus - v) as Scalar;
        }
        table
    }
}

fn is_odd_prime(p: u32) -> bool {
    if p < 3 || p % 2 == 0 {
        return false;
    }
    let mut d = 3;
    while d * d <= p {
        if p % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}
