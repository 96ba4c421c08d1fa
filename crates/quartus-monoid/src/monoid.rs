//! The monoid of monomials.
//!
//! [`MonoMonoid`] is the context every monomial operation goes through: it
//! owns the variable count, the ordering, the linear hash weights and the
//! recycling pool. The hash is linear in the exponents so that
//! `hash(a*b) = hash(a) + hash(b)` modulo 2^32, which the reducers exploit
//! for cheap product lookups.

use std::cmp::Ordering;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use smallvec::SmallVec;

use crate::{Component, Degree, Exponent, Mono, MonoError, MonoOrder, MonoPool};

// Fixed seed: the weights must be identical across runs for deterministic
// output, but random enough to spread the hash table load.
const HASH_WEIGHT_SEED: u64 = 0x9a7c_41d6_03b5_e28f;

/// The monoid context for a fixed variable count and ordering.
#[derive(Debug)]
pub struct MonoMonoid {
    var_count: usize,
    order: MonoOrder,
    // One weight per variable plus one for the component tag.
    weights: Vec<u32>,
    pool: MonoPool,
}

impl MonoMonoid {
    /// Creates a monoid over `var_count` variables.
    #[must_use]
    pub fn new(var_count: usize, order: MonoOrder) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(HASH_WEIGHT_SEED);
        let weights = (0..=var_count).map(|_| rng.gen::<u32>()).collect();
        Self {
            var_count,
            order,
            weights,
            pool: MonoPool::new(),
        }
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// Returns the monomial ordering.
    #[must_use]
    pub fn order(&self) -> MonoOrder {
        self.order
    }

    /// Returns the recycling pool.
    #[must_use]
    pub fn pool(&self) -> &MonoPool {
        &self.pool
    }

    /// Returns the identity monomial.
    #[must_use]
    pub fn identity(&self) -> Mono {
        let exps = SmallVec::from_elem(0, self.var_count);
        Mono::from_parts(exps, 0, 0, 0)
    }

    /// Returns the monomial x_i.
    ///
    /// # Panics
    ///
    /// Panics if `var` is out of range.
    #[must_use]
    pub fn var(&self, var: usize) -> Mono {
        assert!(var < self.var_count, "variable index out of range");
        let mut exps = SmallVec::from_elem(0, self.var_count);
        exps[var] = 1;
        let hash = self.weights[var];
        Mono::from_parts(exps, 0, 1, hash)
    }

    /// Builds a monomial from an exponent vector.
    pub fn set_exponents(&self, exps: &[Exponent]) -> Result<Mono, MonoError> {
        self.module_mono(exps, 0)
    }

    /// Builds a module monomial from an exponent vector and a component.
    pub fn module_mono(
        &self,
        exps: &[Exponent],
        component: Component,
    ) -> Result<Mono, MonoError> {
        let mut vec: SmallVec<[Exponent; 8]> = SmallVec::from_elem(0, self.var_count);
        let n = exps.len().min(self.var_count);
        vec[..n].copy_from_slice(&exps[..n]);
        let degree = self.checked_degree(&vec)?;
        let hash = self.hash_of(&vec, component);
        Ok(Mono::from_parts(vec, component, degree, hash))
    }

    /// Replaces the component tag, recomputing the hash cache.
    #[must_use]
    pub fn with_component(&self, mono: &Mono, component: Component) -> Mono {
        let hash = self.hash_of(&mono.exps, component);
        Mono::from_parts(mono.exps.clone(), component, mono.degree, hash)
    }

    /// Multiplies two monomials.
    ///
    /// At most one operand may carry a module component; the product
    /// inherits it. Exponent overflow is a fatal computational error.
    pub fn multiply(&self, a: &Mono, b: &Mono) -> Result<Mono, MonoError> {
        let component = match (a.component, b.component) {
            (0, c) | (c, 0) => c,
            _ => {
                debug_assert!(false, "multiplying two module monomials");
                return Err(MonoError::ComponentClash);
            }
        };
        let mut exps: SmallVec<[Exponent; 8]> = SmallVec::with_capacity(self.var_count);
        for var in 0..self.var_count {
            let e = a
                .exponent(var)
                .checked_add(b.exponent(var))
                .ok_or(MonoError::ExponentOverflow { var })?;
            exps.push(e);
        }
        let degree = a
            .degree
            .checked_add(b.degree)
            .ok_or(MonoError::ExponentOverflow { var: 0 })?;
        let hash = a.hash.wrapping_add(b.hash);
        Ok(Mono::from_parts(exps, component, degree, hash))
    }

    /// Divides `b` by `a`, requiring `a` to divide `b`.
    ///
    /// Callers on hot paths pre-check with [`Self::divides`]; the error
    /// return backs the release-build contract of spec'd arithmetic.
    pub fn divide(&self, a: &Mono, b: &Mono) -> Result<Mono, MonoError> {
        let component = match (a.component, b.component) {
            (0, c) => c,
            (ca, cb) if ca == cb => 0,
            _ => return Err(MonoError::NotDivisible),
        };
        let mut exps: SmallVec<[Exponent; 8]> = SmallVec::with_capacity(self.var_count);
        for var in 0..self.var_count {
            let (ea, eb) = (a.exponent(var), b.exponent(var));
            if ea > eb {
                return Err(MonoError::NotDivisible);
            }
            exps.push(eb - ea);
        }
        let degree = b.degree - a.degree;
        let hash = b.hash.wrapping_sub(a.hash);
        Ok(Mono::from_parts(exps, component, degree, hash))
    }

    /// True if `a` divides `b`.
    #[must_use]
    pub fn divides(&self, a: &Mono, b: &Mono) -> bool {
        if a.component != 0 && a.component != b.component {
            return false;
        }
        if a.degree > b.degree {
            return false;
        }
        (0..self.var_count).all(|var| a.exponent(var) <= b.exponent(var))
    }

    /// Compares two monomials in the monoid's ordering.
    #[must_use]
    pub fn compare(&self, a: &Mono, b: &Mono) -> Ordering {
        self.order.compare(a, b)
    }

    /// The pointwise maximum of two monomials.
    ///
    /// Both operands must carry the same component, which the lcm keeps.
    pub fn lcm(&self, a: &Mono, b: &Mono) -> Result<Mono, MonoError> {
        debug_assert_eq!(a.component, b.component, "lcm across components");
        let mut exps: SmallVec<[Exponent; 8]> = SmallVec::with_capacity(self.var_count);
        for var in 0..self.var_count {
            exps.push(a.exponent(var).max(b.exponent(var)));
        }
        let degree = self.checked_degree(&exps)?;
        let hash = self.hash_of(&exps, a.component);
        Ok(Mono::from_parts(exps, a.component, degree, hash))
    }

    /// The pointwise minimum of two monomials.
    #[must_use]
    pub fn gcd(&self, a: &Mono, b: &Mono) -> Mono {
        let mut exps: SmallVec<[Exponent; 8]> = SmallVec::with_capacity(self.var_count);
        let mut degree: Degree = 0;
        for var in 0..self.var_count {
            let e = a.exponent(var).min(b.exponent(var));
            degree += e as Degree;
            exps.push(e);
        }
        let hash = self.hash_of(&exps, 0);
        Mono::from_parts(exps, 0, degree, hash)
    }

    /// Returns `(a : b, b : a)`, the colon pair `(a/gcd, b/gcd)`.
    ///
    /// These are the S-pair multipliers: `b * (a:b) = a * (b:a) = lcm(a,b)`.
    #[must_use]
    pub fn colons(&self, a: &Mono, b: &Mono) -> (Mono, Mono) {
        let mut ua: SmallVec<[Exponent; 8]> = SmallVec::with_capacity(self.var_count);
        let mut ub: SmallVec<[Exponent; 8]> = SmallVec::with_capacity(self.var_count);
        let mut da: Degree = 0;
        let mut db: Degree = 0;
        for var in 0..self.var_count {
            let (ea, eb) = (a.exponent(var), b.exponent(var));
            let g = ea.min(eb);
            da += (ea - g) as Degree;
            db += (eb - g) as Degree;
            ua.push(ea - g);
            ub.push(eb - g);
        }
        let ha = self.hash_of(&ua, 0);
        let hb = self.hash_of(&ub, 0);
        (
            Mono::from_parts(ua, 0, da, ha),
            Mono::from_parts(ub, 0, db, hb),
        )
    }

    /// True if no variable appears in both monomials.
    #[must_use]
    pub fn relatively_prime(&self, a: &Mono, b: &Mono) -> bool {
        (0..self.var_count).all(|var| a.exponent(var) == 0 || b.exponent(var) == 0)
    }

    /// True if `m` is the least common multiple of `a` and `b`.
    #[must_use]
    pub fn is_lcm(&self, a: &Mono, b: &Mono, m: &Mono) -> bool {
        (0..self.var_count).all(|var| m.exponent(var) == a.exponent(var).max(b.exponent(var)))
    }

    /// True if `c == a * b`, checked without allocating the product.
    #[must_use]
    pub fn is_product_of(&self, a: &Mono, b: &Mono, c: &Mono) -> bool {
        if c.component != a.component.max(b.component)
            || a.degree as u64 + b.degree as u64 != c.degree as u64
        {
            return false;
        }
        (0..self.var_count).all(|var| {
            a.exponent(var) as u64 + b.exponent(var) as u64 == c.exponent(var) as u64
        })
    }

    /// As [`Self::is_product_of`], rejecting on a hash mismatch first.
    ///
    /// Linearity of the hash makes the sum comparison a valid fast reject.
    #[must_use]
    pub fn is_product_of_hinted(&self, a: &Mono, b: &Mono, c: &Mono) -> bool {
        if a.hash.wrapping_add(b.hash) != c.hash {
            return false;
        }
        self.is_product_of(a, b, c)
    }

    /// Compares `a1 * a2` against `b1 * b2` without forming the products.
    ///
    /// Exponent sums are taken in 64 bits, so this cannot overflow even
    /// when the products themselves would. The signature/lead ratio
    /// comparisons are phrased through this: comparing s1/l1 with s2/l2
    /// cross-multiplies to comparing s1*l2 with s2*l1.
    #[must_use]
    pub fn compare_products(&self, a1: &Mono, a2: &Mono, b1: &Mono, b2: &Mono) -> Ordering {
        let comp_a = a1.component().max(a2.component());
        let comp_b = b1.component().max(b2.component());
        let sum_a = |var: usize| a1.exponent(var) as u64 + a2.exponent(var) as u64;
        let sum_b = |var: usize| b1.exponent(var) as u64 + b2.exponent(var) as u64;

        let base = match self.order {
            MonoOrder::Lex | MonoOrder::LexAscComponent | MonoOrder::LexDescComponent => {
                let mut ord = Ordering::Equal;
                for var in 0..self.var_count {
                    ord = sum_a(var).cmp(&sum_b(var));
                    if ord != Ordering::Equal {
                        break;
                    }
                }
                ord
            }
            MonoOrder::Grevlex
            | MonoOrder::GrevlexAscComponent
            | MonoOrder::GrevlexDescComponent => {
                let deg_a = a1.degree() as u64 + a2.degree() as u64;
                let deg_b = b1.degree() as u64 + b2.degree() as u64;
                let mut ord = deg_a.cmp(&deg_b);
                if ord == Ordering::Equal {
                    for var in (0..self.var_count).rev() {
                        ord = sum_b(var).cmp(&sum_a(var));
                        if ord != Ordering::Equal {
                            break;
                        }
                    }
                }
                ord
            }
        };
        base.then_with(|| match self.order {
            MonoOrder::Lex | MonoOrder::Grevlex => Ordering::Equal,
            MonoOrder::LexAscComponent | MonoOrder::GrevlexAscComponent => {
                comp_a.cmp(&comp_b)
            }
            MonoOrder::LexDescComponent | MonoOrder::GrevlexDescComponent => {
                comp_a.cmp(&comp_b).reverse()
            }
        })
    }

    /// Copies `src` into a pooled monomial slot.
    pub fn copy_into_pooled(&self, src: &Mono, dst: &mut Mono) {
        dst.exps.clear();
        dst.exps.extend_from_slice(&src.exps);
        dst.component = src.component;
        dst.degree = src.degree;
        dst.hash = src.hash;
    }

    /// Checks out a pooled copy of `src`; pair with [`Self::recycle`].
    #[must_use]
    pub fn pooled_copy(&self, src: &Mono) -> Mono {
        let mut mono = self.pool.alloc(self.var_count);
        self.copy_into_pooled(src, &mut mono);
        mono
    }

    /// Returns a pooled monomial to the free list.
    pub fn recycle(&self, mono: Mono) {
        self.pool.recycle(mono);
    }

    /// Parses the textual form produced by the monomial `Display` impl.
    ///
    /// Accepts `x0^2*x1`, `x2`, `1`, each with an optional trailing
    /// component tag `<k>`; `*` separators are optional.
    pub fn parse_mono(&self, text: &str) -> Result<Mono, MonoError> {
        let text = text.trim();
        let bad = |msg: &str| MonoError::Parse(format!("{msg} in monomial '{text}'"));

        let (body, component) = match text.find('<') {
            Some(open) => {
                let close = text
                    .rfind('>')
                    .ok_or_else(|| bad("unterminated component tag"))?;
                let comp: Component = text[open + 1..close]
                    .parse()
                    .map_err(|_| bad("bad component tag"))?;
                (&text[..open], comp)
            }
            None => (text, 0),
        };

        let mut exps: SmallVec<[Exponent; 8]> = SmallVec::from_elem(0, self.var_count);
        for factor in body.split('*').map(str::trim).filter(|s| !s.is_empty()) {
            if factor == "1" {
                continue;
            }
            let rest = factor
                .strip_prefix('x')
                .ok_or_else(|| bad("expected a variable"))?;
            let (var_text, exp_text) = match rest.find('^') {
                Some(caret) => (&rest[..caret], Some(&rest[caret + 1..])),
                None => (rest, None),
            };
            let var: usize = var_text.parse().map_err(|_| bad("bad variable index"))?;
            if var >= self.var_count {
                return Err(bad("variable index out of range"));
            }
            let exp: Exponent = match exp_text {
                Some(t) => t.parse().map_err(|_| bad("bad exponent"))?,
                None => 1,
            };
            exps[var] = exps[var]
                .checked_add(exp)
                .ok_or(MonoError::ExponentOverflow { var })?;
        }
        self.module_mono(&exps, component)
    }

    fn hash_of(&self, exps: &[Exponent], component: Component) -> u32 {
        let mut hash = self.weights[self.var_count].wrapping_mul(component);
        for (var, &e) in exps.iter().enumerate() {
            hash = hash.wrapping_add(self.weights[var].wrapping_mul(e as u32));
        }
        hash
    }

    fn checked_degree(&self, exps: &[Exponent]) -> Result<Degree, MonoError> {
        let mut degree: Degree = 0;
        for (var, &e) in exps.iter().enumerate() {
            degree = degree
                .checked_add(e as Degree)
                .ok_or(MonoError::ExponentOverflow { var })?;
        }
        Ok(degree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monoid() -> MonoMonoid {
        MonoMonoid::new(3, MonoOrder::Grevlex)
    }

    #[test]
    fn multiply_divide_roundtrip() {
        let m = monoid();
        let a = m.set_exponents(&[1, 2, 0]).unwrap();
        let b = m.set_exponents(&[2, 0, 1]).unwrap();
        let c = m.multiply(&a, &b).unwrap();
        assert_eq!(c.exponents(), &[3, 2, 1]);
        assert_eq!(c.degree(), 6);
        assert_eq!(m.divide(&a, &c).unwrap(), b);
        assert_eq!(m.divide(&b, &c).unwrap(), a);
    }

    #[test]
    fn divide_rejects_non_divisor() {
        let m = monoid();
        let a = m.set_exponents(&[2, 0, 0]).unwrap();
        let b = m.set_exponents(&[1, 5, 0]).unwrap();
        assert_eq!(m.divide(&a, &b), Err(MonoError::NotDivisible));
    }

    #[test]
    fn multiply_overflow_is_reported() {
        let m = monoid();
        let a = m.set_exponents(&[Exponent::MAX, 0, 0]).unwrap();
        let b = m.set_exponents(&[1, 0, 0]).unwrap();
        assert_eq!(
            m.multiply(&a, &b),
            Err(MonoError::ExponentOverflow { var: 0 })
        );
    }

    #[test]
    fn hash_is_linear() {
        let m = monoid();
        let a = m.set_exponents(&[1, 4, 2]).unwrap();
        let b = m.set_exponents(&[3, 0, 7]).unwrap();
        let c = m.multiply(&a, &b).unwrap();
        assert_eq!(c.hash_value(), a.hash_value().wrapping_add(b.hash_value()));
    }

    #[test]
    fn component_carry() {
        let m = monoid();
        let sig = m.module_mono(&[1, 0, 0], 2).unwrap();
        let plain = m.set_exponents(&[0, 1, 0]).unwrap();
        let prod = m.multiply(&sig, &plain).unwrap();
        assert_eq!(prod.component(), 2);
        assert_eq!(prod.exponents(), &[1, 1, 0]);
        // Dividing the plain factor back out keeps the component.
        assert_eq!(m.divide(&plain, &prod).unwrap(), sig);
        // Dividing by the module monomial strips it.
        assert_eq!(m.divide(&sig, &prod).unwrap().component(), 0);
    }

    #[test]
    fn lcm_colons_identities() {
        let m = monoid();
        let a = m.set_exponents(&[2, 1, 0]).unwrap();
        let b = m.set_exponents(&[1, 3, 0]).unwrap();
        let lcm = m.lcm(&a, &b).unwrap();
        assert_eq!(lcm.exponents(), &[2, 3, 0]);
        assert!(m.is_lcm(&a, &b, &lcm));
        let (u, v) = m.colons(&a, &b);
        assert_eq!(m.multiply(&b, &u).unwrap(), lcm);
        assert_eq!(m.multiply(&a, &v).unwrap(), lcm);
    }

    #[test]
    fn relatively_prime_iff_lcm_is_product() {
        let m = monoid();
        let a = m.set_exponents(&[2, 0, 0]).unwrap();
        let b = m.set_exponents(&[0, 0, 3]).unwrap();
        assert!(m.relatively_prime(&a, &b));
        assert_eq!(m.lcm(&a, &b).unwrap(), m.multiply(&a, &b).unwrap());
        let c = m.set_exponents(&[1, 0, 1]).unwrap();
        assert!(!m.relatively_prime(&a, &c));
        assert_ne!(m.lcm(&a, &c).unwrap(), m.multiply(&a, &c).unwrap());
    }

    #[test]
    fn product_hint() {
        let m = monoid();
        let a = m.set_exponents(&[1, 1, 0]).unwrap();
        let b = m.set_exponents(&[0, 1, 1]).unwrap();
        let c = m.multiply(&a, &b).unwrap();
        assert!(m.is_product_of(&a, &b, &c));
        assert!(m.is_product_of_hinted(&a, &b, &c));
        let not_c = m.set_exponents(&[1, 2, 2]).unwrap();
        assert!(!m.is_product_of_hinted(&a, &b, &not_c));
    }

    #[test]
    fn parse_roundtrip() {
        let m = monoid();
        for text in ["1", "x0", "x0^2*x2", "x1^3"] {
            let mono = m.parse_mono(text).unwrap();
            assert_eq!(mono.to_string(), text);
        }
        let sig = m.parse_mono("x0*x1<2>").unwrap();
        assert_eq!(sig.component(), 2);
        assert!(m.parse_mono("y0").is_err());
        assert!(m.parse_mono("x9").is_err());
        assert!(m.parse_mono("x0^").is_err());
    }
}
