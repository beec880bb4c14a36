//! Dense matrices over an exact field.
//!
//! Matrices act on column vectors: `(A v)_i = sum_j A[i][j] v_j`. Linear
//! maps of a Lie algebra are stored this way, so column `j` holds the image
//! of the `j`-th basis vector.

use std::fmt;

use crate::error::{ExactError, Result};
use crate::field::ExactField;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Matrix<F> {
    rows: usize,
    cols: usize,
    data: Vec<F>,
}

impl<F: ExactField> Matrix<F> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![F::zero(); rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, F::one());
        }
        m
    }

    /// Build a matrix from its rows. Every row must have `cols` entries.
    pub fn from_rows(cols: usize, rows: Vec<Vec<F>>) -> Result<Self> {
        let n_rows = rows.len();
        let mut data = Vec::with_capacity(n_rows * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(ExactError::Dimension {
                    description: format!("row {i} has {} entries, expected {cols}", row.len()),
                });
            }
            data.extend(row);
        }
        Ok(Self {
            rows: n_rows,
            cols,
            data,
        })
    }

    /// Build a matrix whose columns are the given vectors of length `rows`.
    pub fn from_columns(rows: usize, columns: &[Vec<F>]) -> Result<Self> {
        let mut m = Self::zeros(rows, columns.len());
        for (j, column) in columns.iter().enumerate() {
            if column.len() != rows {
                return Err(ExactError::Dimension {
                    description: format!(
                        "column {j} has {} entries, expected {rows}",
                        column.len()
                    ),
                });
            }
            for (i, value) in column.iter().enumerate() {
                m.set(i, j, value.clone());
            }
        }
        Ok(m)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn get(&self, i: usize, j: usize) -> &F {
        &self.data[i * self.cols + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: F) {
        self.data[i * self.cols + j] = value;
    }

    pub fn row(&self, i: usize) -> &[F] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn column(&self, j: usize) -> Vec<F> {
        (0..self.rows).map(|i| self.get(i, j).clone()).collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<F>> {
        (0..self.rows).map(|i| self.row(i).to_vec()).collect()
    }

    /// All entries in row-major order.
    pub fn entries(&self) -> &[F] {
        &self.data
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|x| x.is_zero())
    }

    pub fn transpose(&self) -> Self {
        let mut t = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t.set(j, i, self.get(i, j).clone());
            }
        }
        t
    }

    pub fn mul(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows {
            return Err(ExactError::Dimension {
                description: format!(
                    "cannot multiply {}x{} by {}x{}",
                    self.rows, self.cols, other.rows, other.cols
                ),
            });
        }
        let mut out = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.get(i, k);
                if a.is_zero() {
                    continue;
                }
                for j in 0..other.cols {
                    let b = other.get(k, j);
                    if b.is_zero() {
                        continue;
                    }
                    let value = out.get(i, j).clone() + a.clone() * b.clone();
                    out.set(i, j, value);
                }
            }
        }
        Ok(out)
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a - b)
    }

    fn zip_with(&self, other: &Self, op: impl Fn(F, F) -> F) -> Result<Self> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(ExactError::Dimension {
                description: format!(
                    "shapes {}x{} and {}x{} differ",
                    self.rows, self.cols, other.rows, other.cols
                ),
            });
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| op(a.clone(), b.clone()))
            .collect();
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    pub fn scale(&self, factor: &F) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .map(|x| x.clone() * factor.clone())
                .collect(),
        }
    }

    /// The same matrix with every entry sent through `f`, usually a field
    /// embedding.
    pub fn map_entries<G: ExactField>(&self, f: impl Fn(&F) -> G) -> Matrix<G> {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// `A v` for a column vector `v`.
    pub fn apply(&self, v: &[F]) -> Vec<F> {
        (0..self.rows)
            .map(|i| {
                self.row(i)
                    .iter()
                    .zip(v)
                    .fold(F::zero(), |acc, (a, x)| acc + a.clone() * x.clone())
            })
            .collect()
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for j in 0..self.cols {
            self.data.swap(a * self.cols + j, b * self.cols + j);
        }
    }

    /// Reduced row echelon form together with the pivot columns.
    pub fn rref(&self) -> (Self, Vec<usize>) {
        let mut m = self.clone();
        let mut pivots = Vec::new();
        let mut r = 0;
        for c in 0..m.cols {
            if r == m.rows {
                break;
            }
            let Some(p) = (r..m.rows).find(|&i| !m.get(i, c).is_zero()) else {
                continue;
            };
            m.swap_rows(r, p);
            let Some(inv) = m.get(r, c).checked_inv() else {
                continue;
            };
            for j in c..m.cols {
                let value = m.get(r, j).clone() * inv.clone();
                m.set(r, j, value);
            }
            for i in 0..m.rows {
                if i == r || m.get(i, c).is_zero() {
                    continue;
                }
                let factor = m.get(i, c).clone();
                for j in c..m.cols {
                    let value = m.get(i, j).clone() - factor.clone() * m.get(r, j).clone();
                    m.set(i, j, value);
                }
            }
            pivots.push(c);
            r += 1;
        }
        (m, pivots)
    }

    pub fn rank(&self) -> usize {
        self.rref().1.len()
    }

    /// A basis of `{x : A x = 0}`, one vector per free column.
    pub fn kernel(&self) -> Vec<Vec<F>> {
        let (r, pivots) = self.rref();
        let mut basis = Vec::new();
        for free in (0..self.cols).filter(|c| !pivots.contains(c)) {
            let mut x = vec![F::zero(); self.cols];
            x[free] = F::one();
            for (i, &p) in pivots.iter().enumerate() {
                x[p] = -r.get(i, free).clone();
            }
            basis.push(x);
        }
        basis
    }

    /// A basis of `{y : y A = 0}`.
    pub fn left_kernel(&self) -> Vec<Vec<F>> {
        self.transpose().kernel()
    }

    /// One solution of `A x = b`, or `None` when the system is inconsistent.
    pub fn solve(&self, b: &[F]) -> Result<Option<Vec<F>>> {
        if b.len() != self.rows {
            return Err(ExactError::Dimension {
                description: format!(
                    "right-hand side has {} entries, expected {}",
                    b.len(),
                    self.rows
                ),
            });
        }
        let mut augmented = Self::zeros(self.rows, self.cols + 1);
        for i in 0..self.rows {
            for j in 0..self.cols {
                augmented.set(i, j, self.get(i, j).clone());
            }
            augmented.set(i, self.cols, b[i].clone());
        }
        let (r, pivots) = augmented.rref();
        if pivots.last() == Some(&self.cols) {
            return Ok(None);
        }
        let mut x = vec![F::zero(); self.cols];
        for (i, &p) in pivots.iter().enumerate() {
            x[p] = r.get(i, self.cols).clone();
        }
        Ok(Some(x))
    }

    pub fn inverse(&self) -> Result<Self> {
        if !self.is_square() {
            return Err(ExactError::Dimension {
                description: format!("cannot invert a {}x{} matrix", self.rows, self.cols),
            });
        }
        let n = self.rows;
        let mut augmented = Self::zeros(n, 2 * n);
        for i in 0..n {
            for j in 0..n {
                augmented.set(i, j, self.get(i, j).clone());
            }
            augmented.set(i, n + i, F::one());
        }
        let (r, pivots) = augmented.rref();
        if pivots.len() < n || pivots[n - 1] >= n {
            return Err(ExactError::Singular {
                description: format!("rank {} below {n}", self.rank()),
            });
        }
        let mut inv = Self::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                inv.set(i, j, r.get(i, n + j).clone());
            }
        }
        Ok(inv)
    }

    pub fn det(&self) -> Result<F> {
        if !self.is_square() {
            return Err(ExactError::Dimension {
                description: format!(
                    "determinant of a {}x{} matrix",
                    self.rows, self.cols
                ),
            });
        }
        let n = self.rows;
        let mut m = self.clone();
        let mut det = F::one();
        for c in 0..n {
            let Some(p) = (c..n).find(|&i| !m.get(i, c).is_zero()) else {
                return Ok(F::zero());
            };
            if p != c {
                m.swap_rows(p, c);
                det = -det;
            }
            let pivot = m.get(c, c).clone();
            let Some(inv) = pivot.checked_inv() else {
                return Ok(F::zero());
            };
            det = det * pivot;
            for i in c + 1..n {
                if m.get(i, c).is_zero() {
                    continue;
                }
                let factor = m.get(i, c).clone() * inv.clone();
                for j in c..n {
                    let value = m.get(i, j).clone() - factor.clone() * m.get(c, j).clone();
                    m.set(i, j, value);
                }
            }
        }
        Ok(det)
    }

    pub fn is_invertible(&self) -> bool {
        self.is_square() && self.rank() == self.rows
    }

    /// Commutator `A B - B A`.
    pub fn commutator(&self, other: &Self) -> Result<Self> {
        self.mul(other)?.sub(&other.mul(self)?)
    }
}

impl<F: ExactField> fmt::Display for Matrix<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            let row: Vec<String> = self.row(i).iter().map(|x| x.to_string()).collect();
            writeln!(f, "[{}]", row.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Rational, rational};
    use num_traits::Zero;

    fn q(n: i64) -> Rational {
        Rational::from_int(n)
    }

    fn m(rows: &[&[i64]]) -> Matrix<Rational> {
        let cols = rows.first().map_or(0, |r| r.len());
        Matrix::from_rows(cols, rows.iter().map(|r| r.iter().map(|&x| q(x)).collect()).collect())
            .unwrap()
    }

    #[test]
    fn rref_and_rank() {
        let a = m(&[&[1, 2, 3], &[2, 4, 6], &[1, 0, 1]]);
        let (r, pivots) = a.rref();
        assert_eq!(pivots, vec![0, 1]);
        assert_eq!(r.row(0), &[q(1), q(0), q(1)]);
        assert_eq!(r.row(1), &[q(0), q(1), q(1)]);
        assert_eq!(a.rank(), 2);
    }

    #[test]
    fn kernel_vectors_are_annihilated() {
        let a = m(&[&[1, 2, 3], &[2, 4, 6]]);
        let kernel = a.kernel();
        assert_eq!(kernel.len(), 2);
        for v in &kernel {
            assert!(a.apply(v).iter().all(|x| x.is_zero()));
        }
    }

    #[test]
    fn solve_detects_inconsistency() {
        let a = m(&[&[1, 1], &[2, 2]]);
        assert!(a.solve(&[q(1), q(3)]).unwrap().is_none());
        let x = a.solve(&[q(1), q(2)]).unwrap().unwrap();
        assert_eq!(a.apply(&x), vec![q(1), q(2)]);
    }

    #[test]
    fn inverse_and_determinant() {
        let a = m(&[&[2, 1], &[1, 1]]);
        assert_eq!(a.det().unwrap(), q(1));
        let inv = a.inverse().unwrap();
        assert_eq!(a.mul(&inv).unwrap(), Matrix::identity(2));

        let b = m(&[&[0, 2], &[3, 0]]);
        assert_eq!(b.det().unwrap(), q(-6));
        assert_eq!(b.inverse().unwrap().get(0, 1), &rational(1, 3));

        assert!(m(&[&[1, 2], &[2, 4]]).inverse().is_err());
    }

    #[test]
    fn shape_errors_are_reported() {
        let a = m(&[&[1, 2]]);
        assert!(a.mul(&a).is_err());
        assert!(Matrix::<Rational>::from_rows(2, vec![vec![q(1)]]).is_err());
    }
}
