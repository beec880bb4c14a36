//! Univariate polynomials, minimal polynomials of matrices and the
//! additive Jordan decomposition.

use std::fmt;

use crate::error::{ExactError, Result};
use crate::field::ExactField;
use crate::matrix::Matrix;

/// A polynomial with coefficients listed constant term first. The leading
/// coefficient is never zero; the zero polynomial has no coefficients.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UPoly<F> {
    coeffs: Vec<F>,
}

impl<F: ExactField> UPoly<F> {
    pub fn new(mut coeffs: Vec<F>) -> Self {
        while coeffs.last().is_some_and(|c| c.is_zero()) {
            coeffs.pop();
        }
        Self { coeffs }
    }

    pub fn zero() -> Self {
        Self { coeffs: Vec::new() }
    }

    pub fn constant(c: F) -> Self {
        Self::new(vec![c])
    }

    /// The monomial `x`.
    pub fn x() -> Self {
        Self::new(vec![F::zero(), F::one()])
    }

    pub fn coeffs(&self) -> &[F] {
        &self.coeffs
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn degree(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    pub fn leading(&self) -> Option<&F> {
        self.coeffs.last()
    }

    fn coeff(&self, i: usize) -> F {
        self.coeffs.get(i).cloned().unwrap_or_else(F::zero)
    }

    pub fn add(&self, other: &Self) -> Self {
        let n = self.coeffs.len().max(other.coeffs.len());
        Self::new((0..n).map(|i| self.coeff(i) + other.coeff(i)).collect())
    }

    pub fn sub(&self, other: &Self) -> Self {
        let n = self.coeffs.len().max(other.coeffs.len());
        Self::new((0..n).map(|i| self.coeff(i) - other.coeff(i)).collect())
    }

    pub fn mul(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }
        let mut out = vec![F::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                out[i + j] = out[i + j].clone() + a.clone() * b.clone();
            }
        }
        Self::new(out)
    }

    pub fn scale(&self, c: &F) -> Self {
        Self::new(self.coeffs.iter().map(|a| a.clone() * c.clone()).collect())
    }

    /// The monic associate; zero stays zero.
    pub fn monic(&self) -> Self {
        match self.leading().and_then(|c| c.checked_inv()) {
            Some(inv) => self.scale(&inv),
            None => self.clone(),
        }
    }

    pub fn div_rem(&self, divisor: &Self) -> Result<(Self, Self)> {
        let Some(lead_inv) = divisor.leading().and_then(|c| c.checked_inv()) else {
            return Err(ExactError::Singular {
                description: "division by the zero polynomial".to_string(),
            });
        };
        let d = divisor.coeffs.len() - 1;
        let mut rem = self.coeffs.clone();
        if rem.len() <= d {
            return Ok((Self::zero(), self.clone()));
        }
        let mut quot = vec![F::zero(); rem.len() - d];
        for k in (0..quot.len()).rev() {
            let c = rem[k + d].clone() * lead_inv.clone();
            if c.is_zero() {
                continue;
            }
            for (i, b) in divisor.coeffs.iter().enumerate() {
                rem[k + i] = rem[k + i].clone() - c.clone() * b.clone();
            }
            quot[k] = c;
        }
        rem.truncate(d);
        Ok((Self::new(quot), Self::new(rem)))
    }

    /// Monic greatest common divisor.
    pub fn gcd(&self, other: &Self) -> Result<Self> {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            let (_, r) = a.div_rem(&b)?;
            a = b;
            b = r;
        }
        Ok(a.monic())
    }

    /// `(g, s, t)` with `s * self + t * other = g` and `g` the monic gcd.
    pub fn xgcd(&self, other: &Self) -> Result<(Self, Self, Self)> {
        let (mut r0, mut r1) = (self.clone(), other.clone());
        let (mut s0, mut s1) = (Self::constant(F::one()), Self::zero());
        let (mut t0, mut t1) = (Self::zero(), Self::constant(F::one()));
        while !r1.is_zero() {
            let (q, r) = r0.div_rem(&r1)?;
            let s = s0.sub(&q.mul(&s1));
            let t = t0.sub(&q.mul(&t1));
            r0 = std::mem::replace(&mut r1, r);
            s0 = std::mem::replace(&mut s1, s);
            t0 = std::mem::replace(&mut t1, t);
        }
        match r0.leading().and_then(|c| c.checked_inv()) {
            Some(inv) => Ok((r0.scale(&inv), s0.scale(&inv), t0.scale(&inv))),
            None => Ok((r0, s0, t0)),
        }
    }

    pub fn derivative(&self) -> Self {
        Self::new(
            self.coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, c)| c.clone() * F::from_int(i as i64))
                .collect(),
        )
    }

    pub fn eval(&self, x: &F) -> F {
        self.coeffs
            .iter()
            .rev()
            .fold(F::zero(), |acc, c| acc * x.clone() + c.clone())
    }

    /// `p(A)` by Horner's scheme.
    pub fn eval_matrix(&self, a: &Matrix<F>) -> Result<Matrix<F>> {
        let n = a.rows();
        let mut acc = Matrix::zeros(n, n);
        let identity = Matrix::identity(n);
        for c in self.coeffs.iter().rev() {
            acc = acc.mul(a)?.add(&identity.scale(c))?;
        }
        Ok(acc)
    }

    /// `p / gcd(p, p')`: the product of the distinct irreducible factors.
    pub fn square_free_part(&self) -> Result<Self> {
        let g = self.gcd(&self.derivative())?;
        Ok(self.div_rem(&g)?.0.monic())
    }

    /// Distinct roots in the field.
    pub fn roots(&self) -> Vec<F> {
        F::roots(&self.coeffs)
    }
}

impl<F: ExactField> fmt::Display for UPoly<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut terms = Vec::new();
        for (i, c) in self.coeffs.iter().enumerate().rev() {
            if c.is_zero() {
                continue;
            }
            let monomial = match i {
                0 => String::new(),
                1 => "x".to_string(),
                _ => format!("x^{i}"),
            };
            let term = if monomial.is_empty() {
                c.to_string()
            } else if c.is_one() {
                monomial
            } else if (-c.clone()).is_one() {
                format!("-{monomial}")
            } else {
                format!("({c})*{monomial}")
            };
            terms.push(term);
        }
        write!(f, "{}", terms.join(" + "))
    }
}

/// The minimal polynomial of a square matrix, found as the first linear
/// dependency among `I, A, A^2, ...`.
pub fn minimal_polynomial<F: ExactField>(a: &Matrix<F>) -> Result<UPoly<F>> {
    if !a.is_square() {
        return Err(ExactError::Dimension {
            description: format!("minimal polynomial of a {}x{} matrix", a.rows(), a.cols()),
        });
    }
    let n = a.rows();
    let mut powers: Vec<Vec<F>> = vec![Matrix::identity(n).entries().to_vec()];
    let mut current = Matrix::identity(n);
    for k in 1..=n.max(1) {
        current = current.mul(a)?;
        let target = current.entries().to_vec();
        let system = Matrix::from_columns(n * n, &powers)?;
        if let Some(c) = system.solve(&target)? {
            let mut coeffs: Vec<F> = c.into_iter().map(|x| -x).collect();
            coeffs.push(F::one());
            debug_assert_eq!(coeffs.len(), k + 1);
            return Ok(UPoly::new(coeffs));
        }
        powers.push(target);
    }
    Err(ExactError::Dimension {
        description: format!("no dependency among the first {} powers", n + 1),
    })
}

/// Split `A = S + N` with `S` semisimple, `N` nilpotent and both
/// polynomials in `A`, by Newton iteration on the square-free part of the
/// minimal polynomial.
pub fn jordan_decomposition<F: ExactField>(a: &Matrix<F>) -> Result<(Matrix<F>, Matrix<F>)> {
    let n = a.rows();
    let h = minimal_polynomial(a)?.square_free_part()?;
    let dh = h.derivative();
    let mut s = a.clone();
    for _ in 0..=n.max(1) {
        let hs = h.eval_matrix(&s)?;
        if hs.is_zero() {
            let nil = a.sub(&s)?;
            return Ok((s, nil));
        }
        let step = dh.eval_matrix(&s)?.inverse()?;
        s = s.sub(&hs.mul(&step)?)?;
    }
    Err(ExactError::Budget {
        description: "Jordan decomposition did not converge".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Rational;

    fn p(xs: &[i64]) -> UPoly<Rational> {
        UPoly::new(xs.iter().map(|&x| Rational::from_int(x)).collect())
    }

    fn m(rows: &[&[i64]]) -> Matrix<Rational> {
        let cols = rows[0].len();
        Matrix::from_rows(
            cols,
            rows.iter()
                .map(|r| r.iter().map(|&x| Rational::from_int(x)).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn division_and_gcd() {
        // (x^2 - 1) = (x - 1)(x + 1)
        let (q, r) = p(&[-1, 0, 1]).div_rem(&p(&[-1, 1])).unwrap();
        assert_eq!(q, p(&[1, 1]));
        assert!(r.is_zero());
        let g = p(&[-1, 0, 1]).gcd(&p(&[1, 2, 1])).unwrap();
        assert_eq!(g, p(&[1, 1]));
    }

    #[test]
    fn xgcd_produces_bezout_coefficients() {
        let a = p(&[-1, 0, 1]);
        let b = p(&[2, 1]);
        let (g, s, t) = a.xgcd(&b).unwrap();
        assert_eq!(g, p(&[1]));
        assert_eq!(s.mul(&a).add(&t.mul(&b)), g);
    }

    #[test]
    fn minimal_polynomial_of_a_jordan_block() {
        let a = m(&[&[2, 1, 0], &[0, 2, 0], &[0, 0, 2]]);
        // (x - 2)^2
        assert_eq!(minimal_polynomial(&a).unwrap(), p(&[4, -4, 1]));
    }

    #[test]
    fn jordan_decomposition_splits_block() {
        let a = m(&[&[2, 1, 0], &[0, 2, 0], &[0, 0, 3]]);
        let (s, nil) = jordan_decomposition(&a).unwrap();
        assert_eq!(s, m(&[&[2, 0, 0], &[0, 2, 0], &[0, 0, 3]]));
        assert!(nil.mul(&nil).unwrap().is_zero());
        assert!(s.commutator(&nil).unwrap().is_zero());
    }

    #[test]
    fn square_free_part_drops_multiplicity() {
        // x^2 (x - 1)^3
        let f = p(&[0, 0, -1, 3, -3, 1]);
        assert_eq!(f.square_free_part().unwrap(), p(&[0, -1, 1]));
    }
}
