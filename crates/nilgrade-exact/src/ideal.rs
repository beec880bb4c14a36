//! Polynomial ideals and their reduced Groebner bases.
//!
//! Only two questions are ever asked of an ideal: does it contain 1, and
//! what is the normal form of a polynomial modulo it. Both are answered in
//! feanor-math's multivariate ring over the rationals, with graded reverse
//! lexicographic order; [`Poly`] values cross over and back at the edges.

use std::str::FromStr;

use feanor_math::algorithms::buchberger::buchberger;
use feanor_math::computation::DontObserve;
use feanor_math::divisibility::DivisibilityRingStore;
use feanor_math::homomorphism::Homomorphism;
use feanor_math::integer::BigIntRing;
use feanor_math::ring::*;
use feanor_math::rings::multivariate::multivariate_impl::MultivariatePolyRingImpl;
use feanor_math::rings::multivariate::*;
use feanor_math::rings::rational::RationalField;
use num_bigint::{BigInt, Sign};
use num_rational::BigRational;
use tracing::debug;

use crate::error::{ExactError, Result};
use crate::field::ExactField;
use crate::poly::{Monomial, Poly, PolyRing};

type Coefficients = RationalField<BigIntRing>;
type Backend = RingValue<MultivariatePolyRingImpl<Coefficients>>;
type BackendPoly = El<Backend>;

#[derive(Debug, Clone)]
pub struct Ideal<F> {
    ring: PolyRing,
    generators: Vec<Poly<F>>,
    basis: Vec<Poly<F>>,
}

impl<F: ExactField> Ideal<F> {
    /// The ideal generated by `generators`, with its reduced Groebner basis
    /// computed immediately. Buchberger is abandoned with
    /// [`ExactError::Budget`] once it has grown the basis `max_pairs` times.
    ///
    /// Coefficients must be rational.
    pub fn new(ring: PolyRing, generators: Vec<Poly<F>>, max_pairs: usize) -> Result<Self> {
        let nonzero: Vec<&Poly<F>> = generators.iter().filter(|g| !g.is_zero()).collect();
        let mut basis = if nonzero.is_empty() {
            Vec::new()
        } else if nonzero.iter().any(|g| g.constant_value().is_some()) {
            vec![ring.constant(F::one())]
        } else {
            let backend = backend(ring.nvars());
            let input = nonzero
                .iter()
                .map(|g| lift(&backend, g))
                .collect::<Result<Vec<_>>>()?;
            groebner_basis(&backend, input, max_pairs)?
                .iter()
                .map(|g| lower(&backend, g, ring.nvars()))
                .collect::<Result<Vec<_>>>()?
        };
        basis.sort_by(|a, b| {
            let la = a.leading().map(|(m, _)| m.clone());
            let lb = b.leading().map(|(m, _)| m.clone());
            la.cmp(&lb)
        });
        debug!(
            generators = generators.len(),
            basis = basis.len(),
            "groebner basis computed"
        );
        Ok(Self {
            ring,
            generators,
            basis,
        })
    }

    /// The unit ideal in `ring`.
    pub fn unit(ring: PolyRing) -> Self {
        let one = ring.constant(F::one());
        Self {
            ring,
            generators: vec![one.clone()],
            basis: vec![one],
        }
    }

    pub fn ring(&self) -> &PolyRing {
        &self.ring
    }

    pub fn generators(&self) -> &[Poly<F>] {
        &self.generators
    }

    pub fn groebner_basis(&self) -> &[Poly<F>] {
        &self.basis
    }

    pub fn contains_unit(&self) -> bool {
        self.basis
            .iter()
            .any(|g| g.constant_value().is_some_and(|c| !c.is_zero()))
    }

    pub fn is_zero(&self) -> bool {
        self.basis.is_empty()
    }

    /// Normal form of `p` modulo the ideal.
    pub fn reduce(&self, p: &Poly<F>) -> Result<Poly<F>> {
        if self.contains_unit() {
            return Ok(Poly::zero(p.nvars()));
        }
        if self.basis.is_empty() || p.is_zero() {
            return Ok(p.clone());
        }
        let backend = backend(self.ring.nvars());
        let divisors = self
            .basis
            .iter()
            .map(|g| lift(&backend, g))
            .collect::<Result<Vec<_>>>()?;
        let reduced = normal_form(&backend, lift(&backend, p)?, &divisors);
        lower(&backend, &reduced, p.nvars())
    }

    pub fn contains(&self, p: &Poly<F>) -> Result<bool> {
        Ok(self.reduce(p)?.is_zero())
    }
}

fn backend(nvars: usize) -> Backend {
    MultivariatePolyRingImpl::new(RationalField::new(BigIntRing::RING), nvars)
}

/// Reduced Groebner basis: Buchberger in the backend, then a minimal,
/// monic, inter-reduced basis.
fn groebner_basis(ring: &Backend, input: Vec<BackendPoly>, max_pairs: usize) -> Result<Vec<BackendPoly>> {
    let mut rounds = 0usize;
    let mut exhausted = false;
    let result = buchberger(
        ring,
        input,
        DegRevLex,
        |_, _| {},
        |_| {
            rounds += 1;
            exhausted = rounds > max_pairs;
            exhausted
        },
        DontObserve,
    );
    let basis = match result {
        Ok(basis) if !exhausted => basis,
        _ => {
            return Err(ExactError::Budget {
                description: format!("groebner basis needs more than {max_pairs} S-pair rounds"),
            });
        }
    };

    let monic: Vec<BackendPoly> = basis.into_iter().filter_map(|g| make_monic(ring, g)).collect();
    if monic
        .iter()
        .any(|g| ring.terms(g).all(|(_, m)| ring.monomial_deg(m) == 0))
    {
        return Ok(vec![ring.one()]);
    }

    // drop elements whose leading monomial another leading monomial divides
    let mut minimal: Vec<BackendPoly> = Vec::new();
    for (i, g) in monic.iter().enumerate() {
        let Some((_, lm)) = ring.LT(g, DegRevLex) else {
            continue;
        };
        let redundant = monic.iter().enumerate().any(|(j, h)| {
            j != i
                && ring.LT(h, DegRevLex).is_some_and(|(_, hm)| {
                    ring.monomial_div(ring.clone_monomial(lm), hm).is_ok()
                        && (j < i || ring.monomial_div(ring.clone_monomial(hm), lm).is_err())
                })
        });
        if !redundant {
            minimal.push(ring.clone_el(g));
        }
    }

    Ok((0..minimal.len())
        .map(|i| {
            let others: Vec<BackendPoly> = minimal
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, h)| ring.clone_el(h))
                .collect();
            normal_form(ring, ring.clone_el(&minimal[i]), &others)
        })
        .collect())
}

fn make_monic(ring: &Backend, mut g: BackendPoly) -> Option<BackendPoly> {
    let base = ring.base_ring();
    let (lc, _) = ring.LT(&g, DegRevLex)?;
    let inverse = base.checked_div(&base.one(), lc)?;
    ring.inclusion().mul_assign_ref_map(&mut g, &inverse);
    Some(g)
}

/// Full reduction of `rest` by `divisors`.
fn normal_form(ring: &Backend, mut rest: BackendPoly, divisors: &[BackendPoly]) -> BackendPoly {
    let base = ring.base_ring();
    let mut remainder = ring.zero();
    while let Some((c, m)) = ring
        .LT(&rest, DegRevLex)
        .map(|(c, m)| (base.clone_el(c), ring.clone_monomial(m)))
    {
        let step = divisors.iter().find_map(|g| {
            let (gc, gm) = ring.LT(g, DegRevLex)?;
            let shift = ring.monomial_div(ring.clone_monomial(&m), gm).ok()?;
            let factor = base.checked_div(&c, gc)?;
            Some((g, shift, factor))
        });
        match step {
            Some((g, shift, factor)) => {
                let mut scaled = ring.clone_el(g);
                ring.mul_assign_monomial(&mut scaled, shift);
                ring.inclusion().mul_assign_ref_map(&mut scaled, &factor);
                ring.sub_assign(&mut rest, scaled);
            }
            None => {
                let term = ring.from_terms([(c, m)].into_iter());
                ring.sub_assign(&mut rest, ring.clone_el(&term));
                ring.add_assign(&mut remainder, term);
            }
        }
    }
    remainder
}

fn lift<F: ExactField>(ring: &Backend, p: &Poly<F>) -> Result<BackendPoly> {
    let base = ring.base_ring();
    let mut terms = Vec::with_capacity(p.len());
    for (m, c) in p.terms() {
        let value = c
            .as_rational()
            .ok_or_else(|| ExactError::NotRational(c.to_string()))?;
        let numerator = integer_into(base, value.numer());
        let denominator = integer_into(base, value.denom());
        let coefficient = base
            .checked_div(&numerator, &denominator)
            .ok_or_else(|| ExactError::Singular {
                description: format!("denominator of {value}"),
            })?;
        let monomial = ring.create_monomial(m.exponents().iter().map(|&e| e as usize));
        terms.push((coefficient, monomial));
    }
    Ok(ring.from_terms(terms.into_iter()))
}

fn lower<F: ExactField>(ring: &Backend, p: &BackendPoly, nvars: usize) -> Result<Poly<F>> {
    let base = ring.base_ring();
    let mut out = Poly::zero(nvars);
    for (c, m) in ring.terms(p) {
        // printed as `n` or `n/d`
        let text: String = base
            .format(c)
            .to_string()
            .chars()
            .filter(|ch| !ch.is_whitespace() && *ch != '(' && *ch != ')')
            .collect();
        let value = BigRational::from_str(&text)
            .map_err(|e| ExactError::Parse(format!("{text:?}: {e}")))?;
        let exponents = ring
            .expand_monomial(m)
            .into_iter()
            .map(|e| u32::try_from(e).map_err(|_| ExactError::Overflow("monomial exponent".to_string())))
            .collect::<Result<Vec<u32>>>()?;
        let coefficient = F::from_bigint(value.numer()) / F::from_bigint(value.denom());
        out = out.add(&Poly::term(Monomial::from_exponents(exponents), coefficient));
    }
    Ok(out)
}

/// `n` in the backend rationals, built from 16-bit digits.
fn integer_into(base: &Coefficients, n: &BigInt) -> El<Coefficients> {
    let hom = base.int_hom();
    let (sign, digits) = n.to_u32_digits();
    let mut value = base.zero();
    for digit in digits.iter().rev() {
        for half in [digit >> 16, digit & 0xffff] {
            value = base.add(base.mul(value, hom.map(1 << 16)), hom.map(half as i32));
        }
    }
    if sign == Sign::Minus {
        base.negate(value)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Rational, rational};

    fn ring(names: &[&str]) -> PolyRing {
        PolyRing::new(names.iter().map(|s| s.to_string()).collect())
    }

    fn q(n: i64) -> Rational {
        Rational::from_int(n)
    }

    #[test]
    fn inconsistent_system_contains_unit() {
        let r = ring(&["x", "y"]);
        let x: Poly<Rational> = r.var(0);
        let y: Poly<Rational> = r.var(1);
        // x*y - 1, x
        let ideal = Ideal::new(r.clone(), vec![x.mul(&y).sub(&r.constant(q(1))), x], 100).unwrap();
        assert!(ideal.contains_unit());
        assert_eq!(ideal.groebner_basis(), &[r.constant(q(1))]);
    }

    #[test]
    fn reduction_modulo_a_consistent_ideal() {
        let r = ring(&["x", "y"]);
        let x: Poly<Rational> = r.var(0);
        let y: Poly<Rational> = r.var(1);
        // x^2 - 2, y - x
        let ideal = Ideal::new(
            r.clone(),
            vec![x.mul(&x).sub(&r.constant(q(2))), y.sub(&x)],
            100,
        )
        .unwrap();
        assert!(!ideal.contains_unit());
        assert_eq!(ideal.groebner_basis().len(), 2);
        assert_eq!(ideal.reduce(&y.mul(&y)).unwrap(), r.constant(q(2)));
        assert!(ideal.contains(&x.mul(&y).sub(&r.constant(q(2)))).unwrap());
        assert!(!ideal.contains(&x).unwrap());
    }

    #[test]
    fn fractions_and_large_coefficients_survive_the_backend() {
        let r = ring(&["x"]);
        let x: Poly<Rational> = r.var(0);
        let big = Rational::from_bigint(&(BigInt::from(1u64 << 40) * BigInt::from(-3)));
        // 2x - 1/3 leaves x = 1/6
        let ideal = Ideal::new(r.clone(), vec![x.scale(&q(2)).sub(&r.constant(rational(1, 3)))], 10).unwrap();
        assert_eq!(ideal.reduce(&x).unwrap(), r.constant(rational(1, 6)));
        assert_eq!(
            ideal.reduce(&x.scale(&big)).unwrap(),
            r.constant(big / q(6))
        );
    }

    #[test]
    fn zero_and_constant_generators() {
        let r = ring(&["x"]);
        let zero: Ideal<Rational> = Ideal::new(r.clone(), vec![r.zero()], 0).unwrap();
        assert!(zero.is_zero());
        assert_eq!(zero.reduce(&r.var(0)).unwrap(), r.var(0));
        let unit: Ideal<Rational> = Ideal::new(r.clone(), vec![r.constant(q(5))], 0).unwrap();
        assert!(unit.contains_unit());
    }

    #[test]
    fn pair_budget_is_enforced() {
        let r = ring(&["x", "y", "z"]);
        let x: Poly<Rational> = r.var(0);
        let y: Poly<Rational> = r.var(1);
        let z: Poly<Rational> = r.var(2);
        let gens = vec![
            x.mul(&y).sub(&z.mul(&z)),
            y.mul(&z).sub(&x.mul(&x)),
            x.mul(&z).sub(&y.mul(&y)),
        ];
        assert!(matches!(
            Ideal::new(r, gens, 0),
            Err(ExactError::Budget { .. })
        ));
    }
}
