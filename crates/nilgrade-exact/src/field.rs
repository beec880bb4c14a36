//! The exact field capability.
//!
//! Everything in nilgrade is generic over a field of characteristic zero
//! with exact arithmetic. The only provided implementation is the field of
//! rationals; other fields plug in by implementing [`ExactField`].

use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::error::{ExactError, Result};

/// Rational numbers, the default working field.
pub type Rational = BigRational;

/// An exact field of characteristic zero.
///
/// The total order is only required to be canonical (stable across runs);
/// it does not have to be compatible with the field operations.
pub trait ExactField:
    Clone
    + Eq
    + Ord
    + Hash
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + 'static
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// Embed a machine integer.
    fn from_int(n: i64) -> Self;

    /// Embed an arbitrary precision integer.
    fn from_bigint(n: &BigInt) -> Self;

    /// The integer this element equals, if any.
    fn as_integer(&self) -> Option<BigInt>;

    /// The rational number this element equals, if any.
    fn as_rational(&self) -> Option<BigRational>;

    /// Multiplicative inverse; `None` for zero.
    fn checked_inv(&self) -> Option<Self>;

    /// Parse an element from its textual form.
    fn parse_exact(text: &str) -> Result<Self>;

    /// The distinct roots lying in this field of the polynomial with the
    /// given coefficients (constant term first), in ascending order.
    fn roots(coeffs: &[Self]) -> Vec<Self>;
}

impl ExactField for BigRational {
    fn from_int(n: i64) -> Self {
        BigRational::from_integer(BigInt::from(n))
    }

    fn from_bigint(n: &BigInt) -> Self {
        BigRational::from_integer(n.clone())
    }

    fn as_integer(&self) -> Option<BigInt> {
        self.is_integer().then(|| self.to_integer())
    }

    fn as_rational(&self) -> Option<BigRational> {
        Some(self.clone())
    }

    fn checked_inv(&self) -> Option<Self> {
        if self.is_zero() {
            None
        } else {
            Some(self.recip())
        }
    }

    fn parse_exact(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        trimmed
            .parse::<BigRational>()
            .map_err(|e| ExactError::Parse(format!("{trimmed:?}: {e}")))
    }

    fn roots(coeffs: &[Self]) -> Vec<Self> {
        rational_roots(coeffs)
    }
}

/// Rational roots by the rational root test on the primitive integer
/// multiple of the polynomial.
pub(crate) fn rational_roots(coeffs: &[BigRational]) -> Vec<BigRational> {
    let mut end = coeffs.len();
    while end > 0 && coeffs[end - 1].is_zero() {
        end -= 1;
    }
    let coeffs = &coeffs[..end];
    if coeffs.len() < 2 {
        return Vec::new();
    }

    let denominator_lcm = coeffs
        .iter()
        .fold(BigInt::one(), |acc, c| acc.lcm(c.denom()));
    let integral: Vec<BigInt> = coeffs
        .iter()
        .map(|c| (c * BigRational::from_integer(denominator_lcm.clone())).to_integer())
        .collect();

    let mut found = BTreeSet::new();
    let start = integral.iter().take_while(|c| c.is_zero()).count();
    if start > 0 {
        found.insert(BigRational::zero());
    }
    let reduced = &integral[start..];
    if reduced.len() >= 2 {
        let constant = &reduced[0];
        let leading = &reduced[reduced.len() - 1];
        for p in divisors(constant) {
            for q in divisors(leading) {
                for candidate in [
                    BigRational::new(p.clone(), q.clone()),
                    BigRational::new(-p.clone(), q.clone()),
                ] {
                    if !found.contains(&candidate) && evaluates_to_zero(reduced, &candidate) {
                        found.insert(candidate);
                    }
                }
            }
        }
    }
    found.into_iter().collect()
}

fn evaluates_to_zero(coeffs: &[BigInt], x: &BigRational) -> bool {
    let value = coeffs.iter().rev().fold(BigRational::zero(), |acc, c| {
        acc * x + BigRational::from_integer(c.clone())
    });
    value.is_zero()
}

/// Positive divisors of `|n|`, ascending. Empty for zero.
pub(crate) fn divisors(n: &BigInt) -> Vec<BigInt> {
    let n = n.abs();
    if n.is_zero() {
        return Vec::new();
    }
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut d = BigInt::one();
    while &d * &d <= n {
        if (&n % &d).is_zero() {
            let q = &n / &d;
            if q != d {
                large.push(q);
            }
            small.push(d.clone());
        }
        d += 1;
    }
    small.extend(large.into_iter().rev());
    small
}

/// Shorthand for a rational from a numerator and a denominator.
pub fn rational(numer: i64, denom: i64) -> Rational {
    BigRational::new(BigInt::from(numer), BigInt::from(denom))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i64) -> Rational {
        Rational::from_int(n)
    }

    #[test]
    fn parse_accepts_integers_and_fractions() {
        assert_eq!(Rational::parse_exact("3").unwrap(), q(3));
        assert_eq!(Rational::parse_exact(" -1/2 ").unwrap(), rational(-1, 2));
        assert_eq!(Rational::parse_exact("4/6").unwrap(), rational(2, 3));
        assert!(Rational::parse_exact("x").is_err());
    }

    #[test]
    fn roots_of_split_cubic() {
        // (x - 1)(x + 2)(2x - 1) = 2x^3 + x^2 - 5x + 2
        let roots = Rational::roots(&[q(2), q(-5), q(1), q(2)]);
        assert_eq!(roots, vec![q(-2), rational(1, 2), q(1)]);
    }

    #[test]
    fn roots_skip_irreducible_factors() {
        // x^3 - 2x = x (x^2 - 2)
        let roots = Rational::roots(&[q(0), q(-2), q(0), q(1)]);
        assert_eq!(roots, vec![q(0)]);
        assert!(Rational::roots(&[q(1), q(0), q(1)]).is_empty());
    }

    #[test]
    fn repeated_roots_are_reported_once() {
        // x^2 (x - 3)^2
        let roots = Rational::roots(&[q(0), q(0), q(9), q(-6), q(1)]);
        assert_eq!(roots, vec![q(0), q(3)]);
    }

    #[test]
    fn integer_detection() {
        assert_eq!(q(-4).as_integer(), Some(BigInt::from(-4)));
        assert_eq!(rational(1, 3).as_integer(), None);
        assert!(q(0).checked_inv().is_none());
        assert_eq!(q(4).checked_inv(), Some(rational(1, 4)));
    }
}
