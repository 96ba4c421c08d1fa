//! Monomial orderings.
//!
//! Every ordering is a well-ordering compatible with multiplication, with
//! the identity as the minimum. Module monomials break ties on the
//! component tag, ascending or descending per variant.

use std::cmp::Ordering;

use crate::Mono;

/// The supported monomial orderings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonoOrder {
    /// Pure lexicographic, x0 largest.
    Lex,
    /// Graded reverse lexicographic.
    Grevlex,
    /// Lex with ascending component tiebreak.
    LexAscComponent,
    /// Lex with descending component tiebreak.
    LexDescComponent,
    /// Grevlex with ascending component tiebreak.
    GrevlexAscComponent,
    /// Grevlex with descending component tiebreak.
    GrevlexDescComponent,
}

impl MonoOrder {
    /// Compares two monomials.
    #[must_use]
    pub fn compare(self, a: &Mono, b: &Mono) -> Ordering {
        match self {
            MonoOrder::Lex => cmp_lex(a, b),
            MonoOrder::Grevlex => cmp_grevlex(a, b),
            MonoOrder::LexAscComponent => cmp_lex(a, b).then_with(|| cmp_component(a, b, false)),
            MonoOrder::LexDescComponent => cmp_lex(a, b).then_with(|| cmp_component(a, b, true)),
            MonoOrder::GrevlexAscComponent => {
                cmp_grevlex(a, b).then_with(|| cmp_component(a, b, false))
            }
            MonoOrder::GrevlexDescComponent => {
                cmp_grevlex(a, b).then_with(|| cmp_component(a, b, true))
            }
        }
    }

    /// True if the ordering consults the component tag.
    #[must_use]
    pub fn uses_component(self) -> bool {
        !matches!(self, MonoOrder::Lex | MonoOrder::Grevlex)
    }
}

fn cmp_lex(a: &Mono, b: &Mono) -> Ordering {
    let n = a.exps.len().max(b.exps.len());
    for i in 0..n {
        match a.exponent(i).cmp(&b.exponent(i)) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }
    Ordering::Equal
}

// Total degree first; on a tie the reversed exponents compare with flipped
// sign, so the monomial with the smaller trailing exponent is the larger.
fn cmp_grevlex(a: &Mono, b: &Mono) -> Ordering {
    match a.degree().cmp(&b.degree()) {
        Ordering::Equal => {}
        ord => return ord,
    }
    let n = a.exps.len().max(b.exps.len());
    for i in (0..n).rev() {
        match b.exponent(i).cmp(&a.exponent(i)) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }
    Ordering::Equal
}

fn cmp_component(a: &Mono, b: &Mono, descending: bool) -> Ordering {
    let ord = a.component().cmp(&b.component());
    if descending {
        ord.reverse()
    } else {
        ord
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MonoMonoid;

    fn mono(monoid: &MonoMonoid, exps: &[crate::Exponent]) -> Mono {
        monoid.set_exponents(exps).unwrap()
    }

    #[test]
    fn grevlex_degree_two() {
        // x^2 > xy > y^2 > xz > yz > z^2 in grevlex with x > y > z.
        let monoid = MonoMonoid::new(3, MonoOrder::Grevlex);
        let ladder = [
            mono(&monoid, &[2, 0, 0]),
            mono(&monoid, &[1, 1, 0]),
            mono(&monoid, &[0, 2, 0]),
            mono(&monoid, &[1, 0, 1]),
            mono(&monoid, &[0, 1, 1]),
            mono(&monoid, &[0, 0, 2]),
        ];
        for pair in ladder.windows(2) {
            assert_eq!(MonoOrder::Grevlex.compare(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn lex_ignores_degree() {
        let monoid = MonoMonoid::new(2, MonoOrder::Lex);
        let x = mono(&monoid, &[1, 0]);
        let y5 = mono(&monoid, &[0, 5]);
        assert_eq!(MonoOrder::Lex.compare(&x, &y5), Ordering::Greater);
    }

    #[test]
    fn component_tiebreaks() {
        let monoid = MonoMonoid::new(2, MonoOrder::GrevlexDescComponent);
        let a = monoid.module_mono(&[1, 0], 1).unwrap();
        let b = monoid.module_mono(&[1, 0], 2).unwrap();
        assert_eq!(MonoOrder::GrevlexDescComponent.compare(&a, &b), Ordering::Greater);
        assert_eq!(MonoOrder::GrevlexAscComponent.compare(&a, &b), Ordering::Less);
        // Exponents dominate the component.
        let c = monoid.module_mono(&[2, 0], 2).unwrap();
        assert_eq!(MonoOrder::GrevlexDescComponent.compare(&c, &a), Ordering::Greater);
    }
}
