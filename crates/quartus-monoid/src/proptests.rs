//! Property-based tests for the monoid laws.

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use proptest::prelude::*;

    use crate::{Exponent, Mono, MonoMonoid, MonoOrder};

    const VARS: usize = 4;

    fn monoid(order: MonoOrder) -> MonoMonoid {
        MonoMonoid::new(VARS, order)
    }

    // Strategy for small exponent vectors; small enough that products and
    // lcms never overflow.
    fn exps() -> impl Strategy<Value = Vec<Exponent>> {
        proptest::collection::vec(0 as Exponent..30, VARS)
    }

    fn orders() -> impl Strategy<Value = MonoOrder> {
        prop_oneof![Just(MonoOrder::Lex), Just(MonoOrder::Grevlex)]
    }

    fn mk(m: &MonoMonoid, e: &[Exponent]) -> Mono {
        m.set_exponents(e).unwrap()
    }

    proptest! {
        #[test]
        fn product_divides_back(ea in exps(), eb in exps()) {
            let m = monoid(MonoOrder::Grevlex);
            let a = mk(&m, &ea);
            let b = mk(&m, &eb);
            let c = m.multiply(&a, &b).unwrap();
            prop_assert_eq!(m.divide(&a, &c).unwrap(), b.clone());
            prop_assert_eq!(m.divide(&b, &c).unwrap(), a.clone());
            prop_assert!(m.divides(&a, &c));
            prop_assert!(m.divides(&b, &c));
            prop_assert!(m.is_product_of(&a, &b, &c));
            prop_assert!(m.is_product_of_hinted(&a, &b, &c));
        }

        #[test]
        fn hash_additivity(ea in exps(), eb in exps()) {
            let m = monoid(MonoOrder::Grevlex);
            let a = mk(&m, &ea);
            let b = mk(&m, &eb);
            let c = m.multiply(&a, &b).unwrap();
            prop_assert_eq!(
                c.hash_value(),
                a.hash_value().wrapping_add(b.hash_value())
            );
        }

        #[test]
        fn compare_is_total_and_multiplicative(
            ea in exps(), eb in exps(), ec in exps(), order in orders()
        ) {
            let m = monoid(order);
            let a = mk(&m, &ea);
            let b = mk(&m, &eb);
            let c = mk(&m, &ec);

            // Antisymmetry and identity minimality.
            prop_assert_eq!(m.compare(&a, &b), m.compare(&b, &a).reverse());
            if !a.is_identity() {
                prop_assert_eq!(m.compare(&a, &m.identity()), Ordering::Greater);
                // a*b > b whenever a is not the identity.
                let ab = m.multiply(&a, &b).unwrap();
                prop_assert_eq!(m.compare(&ab, &b), Ordering::Greater);
            }

            // Multiplying both sides by c preserves the comparison.
            let ac = m.multiply(&a, &c).unwrap();
            let bc = m.multiply(&b, &c).unwrap();
            prop_assert_eq!(m.compare(&ac, &bc), m.compare(&a, &b));
        }

        #[test]
        fn divides_iff_witness(ea in exps(), eb in exps()) {
            let m = monoid(MonoOrder::Grevlex);
            let a = mk(&m, &ea);
            let b = mk(&m, &eb);
            match m.divide(&a, &b) {
                Ok(c) => {
                    prop_assert!(m.divides(&a, &b));
                    prop_assert_eq!(m.multiply(&a, &c).unwrap(), b.clone());
                }
                Err(_) => prop_assert!(!m.divides(&a, &b)),
            }
        }

        #[test]
        fn lcm_laws(ea in exps(), eb in exps()) {
            let m = monoid(MonoOrder::Grevlex);
            let a = mk(&m, &ea);
            let b = mk(&m, &eb);
            let lcm = m.lcm(&a, &b).unwrap();

            prop_assert_eq!(m.lcm(&b, &a).unwrap(), lcm.clone());
            prop_assert!(m.divides(&a, &lcm));
            prop_assert!(m.divides(&b, &lcm));
            prop_assert!(m.compare(&lcm, &a) != Ordering::Less);
            prop_assert!(m.is_lcm(&a, &b, &lcm));

            // Any proper multiple of the lcm is not the lcm.
            let x0 = m.var(0);
            let bigger = m.multiply(&lcm, &x0).unwrap();
            prop_assert!(!m.is_lcm(&a, &b, &bigger));

            let (u, v) = m.colons(&a, &b);
            prop_assert_eq!(m.multiply(&b, &u).unwrap(), lcm.clone());
            prop_assert_eq!(m.multiply(&a, &v).unwrap(), lcm.clone());

            let product = m.multiply(&a, &b).unwrap();
            prop_assert_eq!(m.relatively_prime(&a, &b), lcm == product);
        }
    }
}
