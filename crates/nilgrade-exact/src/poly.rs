//! Sparse multivariate polynomials in named variables.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ExactError, Result};
use crate::field::ExactField;
use crate::matrix::Matrix;

/// Exponent vector, compared in graded reverse lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Monomial(Vec<u32>);

impl Monomial {
    pub fn one(nvars: usize) -> Self {
        Self(vec![0; nvars])
    }

    pub fn variable(nvars: usize, i: usize) -> Self {
        let mut e = vec![0; nvars];
        e[i] = 1;
        Self(e)
    }

    pub fn from_exponents(exponents: Vec<u32>) -> Self {
        Self(exponents)
    }

    pub fn exponents(&self) -> &[u32] {
        &self.0
    }

    pub fn degree(&self) -> u32 {
        self.0.iter().sum()
    }

    pub fn is_one(&self) -> bool {
        self.0.iter().all(|&e| e == 0)
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self(self.0.iter().zip(&other.0).map(|(a, b)| a + b).collect())
    }
}

impl Ord for Monomial {
    fn cmp(&self, other: &Self) -> Ordering {
        self.degree().cmp(&other.degree()).then_with(|| {
            for (a, b) in self.0.iter().zip(&other.0).rev() {
                if a != b {
                    return b.cmp(a);
                }
            }
            Ordering::Equal
        })
    }
}

impl PartialOrd for Monomial {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A polynomial in a fixed number of variables. Terms are kept with
/// nonzero coefficients only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Poly<F> {
    nvars: usize,
    terms: BTreeMap<Monomial, F>,
}

impl<F: ExactField> Poly<F> {
    pub fn zero(nvars: usize) -> Self {
        Self {
            nvars,
            terms: BTreeMap::new(),
        }
    }

    pub fn constant(nvars: usize, c: F) -> Self {
        Self::term(Monomial::one(nvars), c)
    }

    pub fn variable(nvars: usize, i: usize) -> Self {
        Self::term(Monomial::variable(nvars, i), F::one())
    }

    pub fn term(m: Monomial, c: F) -> Self {
        let nvars = m.0.len();
        let mut terms = BTreeMap::new();
        if !c.is_zero() {
            terms.insert(m, c);
        }
        Self { nvars, terms }
    }

    pub fn nvars(&self) -> usize {
        self.nvars
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &F)> {
        self.terms.iter()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The value of a constant polynomial (zero included).
    pub fn constant_value(&self) -> Option<F> {
        match self.terms.len() {
            0 => Some(F::zero()),
            1 => self
                .terms
                .iter()
                .next()
                .filter(|(m, _)| m.is_one())
                .map(|(_, c)| c.clone()),
            _ => None,
        }
    }

    pub fn leading(&self) -> Option<(&Monomial, &F)> {
        self.terms.iter().next_back()
    }

    fn add_term(&mut self, m: Monomial, c: F) {
        if c.is_zero() {
            return;
        }
        match self.terms.remove(&m) {
            Some(existing) => {
                let sum = existing + c;
                if !sum.is_zero() {
                    self.terms.insert(m, sum);
                }
            }
            None => {
                self.terms.insert(m, c);
            }
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (m, c) in &other.terms {
            out.add_term(m.clone(), c.clone());
        }
        out
    }

    pub fn sub(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (m, c) in &other.terms {
            out.add_term(m.clone(), -c.clone());
        }
        out
    }

    pub fn neg(&self) -> Self {
        self.scale(&-F::one())
    }

    pub fn scale(&self, c: &F) -> Self {
        if c.is_zero() {
            return Self::zero(self.nvars);
        }
        Self {
            nvars: self.nvars,
            terms: self
                .terms
                .iter()
                .map(|(m, a)| (m.clone(), a.clone() * c.clone()))
                .collect(),
        }
    }

    pub fn mul_term(&self, m: &Monomial, c: &F) -> Self {
        if c.is_zero() {
            return Self::zero(self.nvars);
        }
        Self {
            nvars: self.nvars,
            terms: self
                .terms
                .iter()
                .map(|(k, a)| (k.mul(m), a.clone() * c.clone()))
                .collect(),
        }
    }

    pub fn mul(&self, other: &Self) -> Self {
        let mut out = Self::zero(self.nvars);
        for (m, c) in &other.terms {
            for (k, a) in &self.terms {
                out.add_term(k.mul(m), a.clone() * c.clone());
            }
        }
        out
    }

    /// The monic associate; zero stays zero.
    pub fn monic(&self) -> Self {
        match self.leading().and_then(|(_, c)| c.checked_inv()) {
            Some(inv) => self.scale(&inv),
            None => self.clone(),
        }
    }

    pub fn degree_in(&self, var: usize) -> u32 {
        self.terms.keys().map(|m| m.0[var]).max().unwrap_or(0)
    }

    pub fn mentions(&self, var: usize) -> bool {
        self.degree_in(var) > 0
    }

    /// Replace variable `var` by `value`.
    pub fn substitute(&self, var: usize, value: &Self) -> Self {
        let mut powers = vec![Self::constant(self.nvars, F::one())];
        let mut out = Self::zero(self.nvars);
        for (m, c) in &self.terms {
            let e = m.0[var] as usize;
            while powers.len() <= e {
                let next = powers[powers.len() - 1].mul(value);
                powers.push(next);
            }
            let mut rest = m.clone();
            rest.0[var] = 0;
            out = out.add(&powers[e].mul_term(&rest, c));
        }
        out
    }

    /// Move into a ring with `nvars` variables, sending variable `i` to
    /// `map[i]`.
    pub fn remap(&self, nvars: usize, map: &[usize]) -> Self {
        let mut out = Self::zero(nvars);
        for (m, c) in &self.terms {
            let mut e = vec![0; nvars];
            for (i, &k) in m.0.iter().enumerate() {
                e[map[i]] += k;
            }
            out.add_term(Monomial(e), c.clone());
        }
        out
    }
}

/// Variable names shared by a family of polynomials.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolyRing {
    names: Arc<Vec<String>>,
}

impl PolyRing {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names: Arc::new(names),
        }
    }

    pub fn nvars(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn var<F: ExactField>(&self, i: usize) -> Poly<F> {
        Poly::variable(self.nvars(), i)
    }

    pub fn constant<F: ExactField>(&self, c: F) -> Poly<F> {
        Poly::constant(self.nvars(), c)
    }

    pub fn zero<F: ExactField>(&self) -> Poly<F> {
        Poly::zero(self.nvars())
    }

    /// A ring holding this ring's variables followed by `other`'s, with the
    /// index maps of both into it.
    pub fn join(&self, other: &PolyRing) -> (PolyRing, Vec<usize>, Vec<usize>) {
        let mut names: Vec<String> = self.names.to_vec();
        names.extend(other.names.iter().cloned());
        let left = (0..self.nvars()).collect();
        let right = (self.nvars()..names.len()).collect();
        (PolyRing::new(names), left, right)
    }

    pub fn format<F: ExactField>(&self, p: &Poly<F>) -> String {
        if p.is_zero() {
            return "0".to_string();
        }
        let mut out = String::new();
        for (idx, (m, c)) in p.terms.iter().rev().enumerate() {
            let factors: Vec<String> = m
                .0
                .iter()
                .enumerate()
                .filter(|(_, e)| **e > 0)
                .map(|(i, e)| match e {
                    1 => self.names[i].clone(),
                    _ => format!("{}^{e}", self.names[i]),
                })
                .collect();
            let negative = c < &F::zero();
            let magnitude = if negative { -c.clone() } else { c.clone() };
            if idx == 0 {
                if negative {
                    out.push('-');
                }
            } else {
                out.push_str(if negative { " - " } else { " + " });
            }
            if factors.is_empty() {
                out.push_str(&magnitude.to_string());
            } else if magnitude.is_one() {
                out.push_str(&factors.join("*"));
            } else {
                out.push_str(&format!("{magnitude}*{}", factors.join("*")));
            }
        }
        out
    }
}

/// A matrix of polynomials over a common ring.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolyMatrix<F> {
    nvars: usize,
    rows: usize,
    cols: usize,
    entries: Vec<Poly<F>>,
}

impl<F: ExactField> PolyMatrix<F> {
    pub fn zeros(nvars: usize, rows: usize, cols: usize) -> Self {
        Self {
            nvars,
            rows,
            cols,
            entries: vec![Poly::zero(nvars); rows * cols],
        }
    }

    pub fn from_constant(nvars: usize, m: &Matrix<F>) -> Self {
        let mut out = Self::zeros(nvars, m.rows(), m.cols());
        for i in 0..m.rows() {
            for j in 0..m.cols() {
                out.set(i, j, Poly::constant(nvars, m.get(i, j).clone()));
            }
        }
        out
    }

    pub fn nvars(&self) -> usize {
        self.nvars
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, i: usize, j: usize) -> &Poly<F> {
        &self.entries[i * self.cols + j]
    }

    pub fn set(&mut self, i: usize, j: usize, p: Poly<F>) {
        self.entries[i * self.cols + j] = p;
    }

    pub fn entries(&self) -> &[Poly<F>] {
        &self.entries
    }

    pub fn map(&self, f: impl Fn(&Poly<F>) -> Poly<F>) -> Self {
        let entries: Vec<Poly<F>> = self.entries.iter().map(f).collect();
        let nvars = entries.first().map_or(self.nvars, |p| p.nvars());
        Self {
            nvars,
            rows: self.rows,
            cols: self.cols,
            entries,
        }
    }

    pub fn mul(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows || self.nvars != other.nvars {
            return Err(ExactError::Dimension {
                description: format!(
                    "cannot multiply {}x{} by {}x{} polynomial matrices",
                    self.rows, self.cols, other.rows, other.cols
                ),
            });
        }
        let mut out = Self::zeros(self.nvars, self.rows, other.cols);
        for i in 0..self.rows {
            for j in 0..other.cols {
                let mut acc = Poly::zero(self.nvars);
                for k in 0..self.cols {
                    acc = acc.add(&self.get(i, k).mul(other.get(k, j)));
                }
                out.set(i, j, acc);
            }
        }
        Ok(out)
    }

    /// Determinant by cofactor expansion.
    pub fn det(&self) -> Result<Poly<F>> {
        if self.rows != self.cols {
            return Err(ExactError::Dimension {
                description: format!("determinant of a {}x{} matrix", self.rows, self.cols),
            });
        }
        let rows: Vec<usize> = (0..self.rows).collect();
        let cols: Vec<usize> = (0..self.cols).collect();
        Ok(self.minor_det(&rows, &cols))
    }

    fn minor_det(&self, rows: &[usize], cols: &[usize]) -> Poly<F> {
        match rows.len() {
            0 => Poly::constant(self.nvars, F::one()),
            1 => self.get(rows[0], cols[0]).clone(),
            _ => {
                let mut acc = Poly::zero(self.nvars);
                for (k, &c) in cols.iter().enumerate() {
                    let entry = self.get(rows[0], c);
                    if entry.is_zero() {
                        continue;
                    }
                    let rest: Vec<usize> = cols.iter().copied().filter(|&x| x != c).collect();
                    let term = entry.mul(&self.minor_det(&rows[1..], &rest));
                    acc = if k % 2 == 0 { acc.add(&term) } else { acc.sub(&term) };
                }
                acc
            }
        }
    }

    /// Transposed cofactor matrix, so that `A adj(A) = det(A) I`.
    pub fn adjugate(&self) -> Result<Self> {
        if self.rows != self.cols {
            return Err(ExactError::Dimension {
                description: format!("adjugate of a {}x{} matrix", self.rows, self.cols),
            });
        }
        let n = self.rows;
        let mut out = Self::zeros(self.nvars, n, n);
        if n == 1 {
            out.set(0, 0, Poly::constant(self.nvars, F::one()));
            return Ok(out);
        }
        for i in 0..n {
            for j in 0..n {
                let rows: Vec<usize> = (0..n).filter(|&r| r != i).collect();
                let cols: Vec<usize> = (0..n).filter(|&c| c != j).collect();
                let minor = self.minor_det(&rows, &cols);
                let cofactor = if (i + j) % 2 == 0 { minor } else { minor.neg() };
                out.set(j, i, cofactor);
            }
        }
        Ok(out)
    }

    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|p| p.is_zero())
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
