//! Quadratic number fields `Q(sqrt(d))` and the splitting of rational
//! polynomials into linear and quadratic factors.
//!
//! Finest gradings need the eigenvalues of rational derivations. When those
//! are not rational, the smallest field holding them is very often a single
//! quadratic extension (rotations have eigenvalues `a +- b*i`), and that is
//! the case handled here.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::error::{ExactError, Result};
use crate::field::{ExactField, Rational, divisors, rational_roots};
use crate::upoly::UPoly;

/// Largest integer, in bits, the factor and square searches accept.
const MAX_SEARCH_BITS: u64 = 40;

/// The field `Q(θ)` with `θ^2 = d` for a squarefree integer `d != 1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuadraticField {
    radicand: BigInt,
}

impl QuadraticField {
    /// The field generated by the roots of a quadratic with discriminant
    /// `disc`; `None` when `disc` is a rational square.
    pub fn from_discriminant(disc: &Rational) -> Result<Option<Self>> {
        if disc.is_zero() {
            return Ok(None);
        }
        // sqrt(n / m) = sqrt(n * m) / m
        let mut radicand = disc.numer() * disc.denom();
        if radicand.bits() > 2 * MAX_SEARCH_BITS {
            return Err(ExactError::Budget {
                description: format!("squarefree part of {disc} is too large to search"),
            });
        }
        let mut p = BigInt::from(2);
        while &p * &p <= radicand.abs() {
            let square = &p * &p;
            while (&radicand % &square).is_zero() {
                radicand /= &square;
            }
            p += 1;
        }
        Ok((!radicand.is_one()).then_some(Self { radicand }))
    }

    /// `Q(i)`.
    pub fn gaussian() -> Self {
        Self {
            radicand: BigInt::from(-1),
        }
    }

    pub fn radicand(&self) -> &BigInt {
        &self.radicand
    }

    /// Printed name of the generator: `i` or `sqrt(d)`.
    pub fn generator_name(&self) -> String {
        if self.radicand == BigInt::from(-1) {
            "i".to_string()
        } else {
            format!("sqrt({})", self.radicand)
        }
    }

    pub fn generator(&self) -> Quadratic {
        Quadratic::new(Some(self.clone()), Rational::zero(), Rational::one())
    }

    /// A square root of the rational `x` inside the field, if there is one.
    pub fn sqrt_of(&self, x: &Rational) -> Option<Quadratic> {
        if let Some(r) = rational_sqrt(x) {
            return Some(Quadratic::from(r));
        }
        let d = Rational::from_integer(self.radicand.clone());
        rational_sqrt(&(x / d)).map(|r| Quadratic::new(Some(self.clone()), Rational::zero(), r))
    }

    /// Both roots of the rational quadratic `q`, ascending, when they lie in
    /// the field.
    pub fn quadratic_roots(&self, q: &UPoly<Rational>) -> Option<[Quadratic; 2]> {
        let [c0, c1, c2] = q.coeffs() else {
            return None;
        };
        let disc = c1 * c1 - Rational::from_int(4) * c0 * c2;
        let s = self.sqrt_of(&disc)?;
        let minus_b = Quadratic::from(-c1.clone());
        let denom = Quadratic::from(Rational::from_int(2) * c2);
        let mut roots = [
            (minus_b.clone() - s.clone()) / denom.clone(),
            (minus_b + s) / denom,
        ];
        roots.sort();
        Some(roots)
    }
}

impl fmt::Display for QuadraticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q({})", self.generator_name())
    }
}

/// An element `a + b*θ` of a quadratic field. Rational elements carry no
/// field, so they compare equal across fields and embed everywhere.
///
/// Ordered by `a`, then `b`: on rationals this is the usual order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quadratic {
    a: Rational,
    b: Rational,
    field: Option<QuadraticField>,
}

impl Quadratic {
    fn new(field: Option<QuadraticField>, a: Rational, b: Rational) -> Self {
        if b.is_zero() {
            Self { a, b, field: None }
        } else {
            Self { a, b, field }
        }
    }

    pub fn field(&self) -> Option<&QuadraticField> {
        self.field.as_ref()
    }

    pub fn rational_part(&self) -> &Rational {
        &self.a
    }

    /// The coefficient of the generator.
    pub fn irrational_part(&self) -> &Rational {
        &self.b
    }

    fn radicand(&self) -> Rational {
        self.field
            .as_ref()
            .map(|k| Rational::from_integer(k.radicand.clone()))
            .unwrap_or_else(Rational::zero)
    }

    fn join(lhs: &Option<QuadraticField>, rhs: &Option<QuadraticField>) -> Option<QuadraticField> {
        debug_assert!(
            lhs.is_none() || rhs.is_none() || lhs == rhs,
            "mixing elements of different quadratic fields"
        );
        lhs.clone().or_else(|| rhs.clone())
    }

    /// `a^2 - d*b^2`.
    pub fn norm(&self) -> Rational {
        &self.a * &self.a - self.radicand() * &self.b * &self.b
    }

    /// `s` with `s^2 = self`, if the field holds one.
    pub fn sqrt(&self) -> Option<Self> {
        let Some(field) = &self.field else {
            return rational_sqrt(&self.a).map(Self::from);
        };
        let d = self.radicand();
        // (u + vθ)^2 = u^2 + d v^2 + 2uv θ
        let r = rational_sqrt(&self.norm())?;
        let two = Rational::from_int(2);
        for w in [(&self.a + &r) / &two, (&self.a - &r) / &two] {
            let Some(u) = rational_sqrt(&w) else { continue };
            if u.is_zero() {
                continue;
            }
            let v = &self.b / (&two * &u);
            if &u * &u + &d * &v * &v == self.a {
                return Some(Self::new(Some(field.clone()), u, v));
            }
        }
        None
    }
}

impl From<Rational> for Quadratic {
    fn from(a: Rational) -> Self {
        Self::new(None, a, Rational::zero())
    }
}

impl Add for Quadratic {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let field = Self::join(&self.field, &rhs.field);
        Self::new(field, self.a + rhs.a, self.b + rhs.b)
    }
}

impl Sub for Quadratic {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        let field = Self::join(&self.field, &rhs.field);
        Self::new(field, self.a - rhs.a, self.b - rhs.b)
    }
}

impl Mul for Quadratic {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let field = Self::join(&self.field, &rhs.field);
        let d = field
            .as_ref()
            .map(|k| Rational::from_integer(k.radicand.clone()))
            .unwrap_or_else(Rational::zero);
        let a = &self.a * &rhs.a + d * &self.b * &rhs.b;
        let b = &self.a * &rhs.b + &self.b * &rhs.a;
        Self::new(field, a, b)
    }
}

impl Div for Quadratic {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        match rhs.checked_inv() {
            Some(inv) => self * inv,
            None => panic!("attempt to divide by zero"),
        }
    }
}

impl Neg for Quadratic {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(self.field, -self.a, -self.b)
    }
}

impl Zero for Quadratic {
    fn zero() -> Self {
        Self::from(Rational::zero())
    }

    fn is_zero(&self) -> bool {
        self.a.is_zero() && self.b.is_zero()
    }
}

impl One for Quadratic {
    fn one() -> Self {
        Self::from(Rational::one())
    }
}

impl fmt::Display for Quadratic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(field) = &self.field else {
            return write!(f, "{}", self.a);
        };
        let name = field.generator_name();
        let magnitude = self.b.abs();
        let term = if magnitude.is_one() {
            name
        } else {
            format!("{magnitude}*{name}")
        };
        let negative = self.b.is_negative();
        match (self.a.is_zero(), negative) {
            (true, false) => write!(f, "{term}"),
            (true, true) => write!(f, "-{term}"),
            (false, false) => write!(f, "({} + {term})", self.a),
            (false, true) => write!(f, "({} - {term})", self.a),
        }
    }
}

impl ExactField for Quadratic {
    fn from_int(n: i64) -> Self {
        Self::from(Rational::from_int(n))
    }

    fn from_bigint(n: &BigInt) -> Self {
        Self::from(Rational::from_integer(n.clone()))
    }

    fn as_integer(&self) -> Option<BigInt> {
        self.as_rational().and_then(|r| r.as_integer())
    }

    fn as_rational(&self) -> Option<BigRational> {
        self.b.is_zero().then(|| self.a.clone())
    }

    fn checked_inv(&self) -> Option<Self> {
        let norm = self.norm();
        if norm.is_zero() {
            return None;
        }
        Some(Self::new(self.field.clone(), &self.a / &norm, -(&self.b / &norm)))
    }

    /// Only rational literals parse; the field of a bare literal is unknown.
    fn parse_exact(text: &str) -> Result<Self> {
        Rational::parse_exact(text).map(Self::from)
    }

    /// Rational roots when every coefficient is rational. Otherwise the
    /// roots of linear and quadratic polynomials over the coefficients'
    /// field.
    fn roots(coeffs: &[Self]) -> Vec<Self> {
        let mut end = coeffs.len();
        while end > 0 && coeffs[end - 1].is_zero() {
            end -= 1;
        }
        let coeffs = &coeffs[..end];
        if let Some(rational) = coeffs
            .iter()
            .map(|c| c.as_rational())
            .collect::<Option<Vec<_>>>()
        {
            return rational_roots(&rational).into_iter().map(Self::from).collect();
        }
        match coeffs {
            [c0, c1] => vec![-(c0.clone() / c1.clone())],
            [c0, c1, c2] => {
                let four = Self::from_int(4);
                let disc = c1.clone() * c1.clone() - four * c0.clone() * c2.clone();
                let field = coeffs.iter().find_map(|c| c.field().cloned());
                let root = match (disc.as_rational(), field) {
                    (Some(r), Some(k)) => k.sqrt_of(&r),
                    _ => disc.sqrt(),
                };
                let Some(s) = root else {
                    return Vec::new();
                };
                let two_a = Self::from_int(2) * c2.clone();
                let mut roots = vec![
                    (-c1.clone() - s.clone()) / two_a.clone(),
                    (-c1.clone() + s) / two_a,
                ];
                roots.sort();
                roots.dedup();
                roots
            }
            _ => Vec::new(),
        }
    }
}

/// `sqrt(x)` when it is rational.
fn rational_sqrt(x: &Rational) -> Option<Rational> {
    if x.is_negative() {
        return None;
    }
    let n = x.numer().sqrt();
    let d = x.denom().sqrt();
    (&n * &n == *x.numer() && &d * &d == *x.denom()).then(|| BigRational::new(n, d))
}

/// A rational polynomial split as far as rational linear and quadratic
/// factors go. Repeated factors are dropped.
#[derive(Debug, Clone)]
pub struct RationalFactors {
    /// Distinct rational roots, ascending.
    pub roots: Vec<Rational>,
    /// Monic irreducible quadratic factors.
    pub quadratics: Vec<UPoly<Rational>>,
    /// The monic part with no linear or quadratic factor; `1` when the
    /// polynomial splits this far.
    pub rest: UPoly<Rational>,
}

impl RationalFactors {
    pub fn is_complete(&self) -> bool {
        self.rest.degree() == Some(0)
    }
}

/// Split the square-free part of `p` into rational linear factors and
/// irreducible rational quadratics, the latter by Kronecker's divisor
/// search.
pub fn rational_factors(p: &UPoly<Rational>) -> Result<RationalFactors> {
    if p.is_zero() {
        return Err(ExactError::Dimension {
            description: "factoring the zero polynomial".to_string(),
        });
    }
    let mut rest = p.square_free_part()?;
    let roots = rest.roots();
    for r in &roots {
        let linear = UPoly::new(vec![-r.clone(), Rational::one()]);
        rest = rest.div_rem(&linear)?.0;
    }
    let mut quadratics = Vec::new();
    while rest.degree().is_some_and(|d| d >= 2) {
        let Some(q) = quadratic_factor(&rest)? else {
            break;
        };
        rest = rest.div_rem(&q)?.0.monic();
        quadratics.push(q);
    }
    Ok(RationalFactors {
        roots,
        quadratics,
        rest,
    })
}

/// A monic quadratic factor of `p`, which must have no rational roots.
fn quadratic_factor(p: &UPoly<Rational>) -> Result<Option<UPoly<Rational>>> {
    let integral = primitive_integral(p.coeffs());
    let (Some(a0), Some(an)) = (integral.first(), integral.last()) else {
        return Ok(None);
    };
    let at_one: BigInt = integral.iter().sum();
    let at_minus_one: BigInt = integral
        .iter()
        .enumerate()
        .map(|(k, c)| if k % 2 == 0 { c.clone() } else { -c.clone() })
        .sum();
    if [a0, an, &at_one, &at_minus_one]
        .iter()
        .any(|n| n.bits() > MAX_SEARCH_BITS)
    {
        return Err(ExactError::Budget {
            description: format!("coefficients of {p} are too large for a factor search"),
        });
    }
    // a root at 0, 1 or -1 would be rational
    if a0.is_zero() || at_one.is_zero() || at_minus_one.is_zero() {
        return Ok(None);
    }

    let constants = divisors(a0);
    let values = divisors(&at_one);
    for lead in divisors(an) {
        for c in constants.iter().flat_map(|c| [c.clone(), -c.clone()]) {
            for s in values.iter().flat_map(|s| [s.clone(), -s.clone()]) {
                // A + B + C = s divides p(1); A - B + C divides p(-1)
                let b = &s - &lead - &c;
                let at_minus_one_factor = &lead - &b + &c;
                if at_minus_one_factor.is_zero() || !(&at_minus_one % &at_minus_one_factor).is_zero() {
                    continue;
                }
                let candidate = UPoly::new(vec![
                    Rational::from_integer(c.clone()),
                    Rational::from_integer(b),
                    Rational::from_integer(lead.clone()),
                ]);
                if p.div_rem(&candidate)?.1.is_zero() {
                    return Ok(Some(candidate.monic()));
                }
            }
        }
    }
    Ok(None)
}

/// The primitive integer multiple of a rational coefficient list.
fn primitive_integral(coeffs: &[Rational]) -> Vec<BigInt> {
    let lcm = coeffs.iter().fold(BigInt::one(), |acc, c| acc.lcm(c.denom()));
    let integral: Vec<BigInt> = coeffs
        .iter()
        .map(|c| (c * Rational::from_integer(lcm.clone())).to_integer())
        .collect();
    let content = integral.iter().fold(BigInt::zero(), |acc, c| acc.gcd(c));
    if content.is_zero() || content.is_one() {
        return integral;
    }
    integral.into_iter().map(|c| c / &content).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::rational;

    fn q(n: i64) -> Rational {
        Rational::from_int(n)
    }

    fn poly(coeffs: &[i64]) -> UPoly<Rational> {
        UPoly::new(coeffs.iter().map(|&c| q(c)).collect())
    }

    #[test]
    fn gaussian_arithmetic() {
        let i = QuadraticField::gaussian().generator();
        assert_eq!(i.clone() * i.clone(), Quadratic::from_int(-1));
        let z = Quadratic::one() + i.clone();
        let inv = z.checked_inv().unwrap();
        assert_eq!(z * inv.clone(), Quadratic::one());
        assert_eq!(inv.to_string(), "(1/2 - 1/2*i)");
        assert!(-i.clone() < Quadratic::zero());
        assert!(Quadratic::zero() < i);
        assert!(Quadratic::zero().checked_inv().is_none());
    }

    #[test]
    fn rational_values_forget_their_field() {
        let i = QuadraticField::gaussian().generator();
        let real = i.clone() * i.clone() + Quadratic::from_int(3);
        assert_eq!(real, Quadratic::from_int(2));
        assert!(real.field().is_none());
        assert_eq!(real.as_integer(), Some(BigInt::from(2)));
        assert_eq!((i.clone() - i).as_rational(), Some(q(0)));
    }

    #[test]
    fn fields_from_discriminants_are_squarefree() {
        let k = QuadraticField::from_discriminant(&q(-4)).unwrap().unwrap();
        assert_eq!(k, QuadraticField::gaussian());
        let k = QuadraticField::from_discriminant(&rational(8, 9)).unwrap().unwrap();
        assert_eq!(k.radicand(), &BigInt::from(2));
        assert_eq!(k.to_string(), "Q(sqrt(2))");
        assert!(QuadraticField::from_discriminant(&rational(9, 4)).unwrap().is_none());
    }

    #[test]
    fn quadratic_roots_in_the_field() {
        let k = QuadraticField::gaussian();
        let i = k.generator();
        // x^2 - 2x + 5 = (x - 1 - 2i)(x - 1 + 2i)
        let [low, high] = k.quadratic_roots(&poly(&[5, -2, 1])).unwrap();
        assert_eq!(low, Quadratic::one() - Quadratic::from_int(2) * i.clone());
        assert_eq!(high, Quadratic::one() + Quadratic::from_int(2) * i);
        assert!(k.quadratic_roots(&poly(&[-2, 0, 1])).is_none());
    }

    #[test]
    fn roots_of_polynomials_with_irrational_coefficients() {
        let i = QuadraticField::gaussian().generator();
        // (x - i)(x - 2i) = x^2 - 3i x - 2
        let coeffs = vec![
            Quadratic::from_int(-2),
            -(Quadratic::from_int(3) * i.clone()),
            Quadratic::one(),
        ];
        let roots = Quadratic::roots(&coeffs);
        assert_eq!(roots, vec![i.clone(), Quadratic::from_int(2) * i]);
    }

    #[test]
    fn square_roots_inside_a_quadratic_field() {
        let i = QuadraticField::gaussian().generator();
        // (1 + i)^2 = 2i
        let two_i = Quadratic::from_int(2) * i.clone();
        let s = two_i.sqrt().unwrap();
        assert_eq!(s.clone() * s, two_i);
        assert!(i.sqrt().is_none());
    }

    #[test]
    fn rational_polynomials_split_into_linear_and_quadratic_factors() {
        // (x - 2)(x^2 + 1)(x^2 - 3)
        let p = poly(&[-2, 1]).mul(&poly(&[1, 0, 1])).mul(&poly(&[-3, 0, 1]));
        let factors = rational_factors(&p).unwrap();
        assert_eq!(factors.roots, vec![q(2)]);
        assert_eq!(factors.quadratics.len(), 2);
        assert!(factors.is_complete());
        assert!(factors.quadratics.contains(&poly(&[1, 0, 1])));
        assert!(factors.quadratics.contains(&poly(&[-3, 0, 1])));
    }

    #[test]
    fn irreducible_cubics_are_left_over() {
        let factors = rational_factors(&poly(&[-2, 0, 0, 1])).unwrap();
        assert!(factors.roots.is_empty());
        assert!(factors.quadratics.is_empty());
        assert!(!factors.is_complete());
        assert_eq!(factors.rest.degree(), Some(3));
    }
}
