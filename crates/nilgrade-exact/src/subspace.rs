//! Subspaces of `F^n` in canonical form, and coordinate frames.

use crate::error::{ExactError, Result};
use crate::field::ExactField;
use crate::matrix::Matrix;

/// A linear subspace of `F^n`, stored as the nonzero rows of its reduced
/// row echelon form. Two subspaces are equal exactly when their stored
/// bases are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subspace<F> {
    ambient: usize,
    basis: Vec<Vec<F>>,
    pivots: Vec<usize>,
}

impl<F: ExactField> Subspace<F> {
    pub fn zero(ambient: usize) -> Self {
        Self {
            ambient,
            basis: Vec::new(),
            pivots: Vec::new(),
        }
    }

    pub fn full(ambient: usize) -> Self {
        let basis = (0..ambient).map(|i| unit_vector(ambient, i)).collect();
        Self {
            ambient,
            basis,
            pivots: (0..ambient).collect(),
        }
    }

    /// The span of `vectors`, each of length `ambient`.
    pub fn span(ambient: usize, vectors: &[Vec<F>]) -> Result<Self> {
        let m = Matrix::from_rows(ambient, vectors.to_vec())?;
        let (r, pivots) = m.rref();
        let basis = (0..pivots.len()).map(|i| r.row(i).to_vec()).collect();
        Ok(Self {
            ambient,
            basis,
            pivots,
        })
    }

    pub fn ambient(&self) -> usize {
        self.ambient
    }

    pub fn dim(&self) -> usize {
        self.basis.len()
    }

    pub fn is_zero(&self) -> bool {
        self.basis.is_empty()
    }

    pub fn basis(&self) -> &[Vec<F>] {
        &self.basis
    }

    /// Pivot columns of the echelon basis.
    pub fn pivots(&self) -> &[usize] {
        &self.pivots
    }

    /// The residue of `v` after clearing every pivot coordinate.
    pub fn reduce(&self, v: &[F]) -> Vec<F> {
        let mut out = v.to_vec();
        for (row, &p) in self.basis.iter().zip(&self.pivots) {
            if out[p].is_zero() {
                continue;
            }
            let factor = out[p].clone();
            for (x, b) in out.iter_mut().zip(row) {
                *x = x.clone() - factor.clone() * b.clone();
            }
        }
        out
    }

    pub fn contains(&self, v: &[F]) -> bool {
        v.len() == self.ambient && self.reduce(v).iter().all(|x| x.is_zero())
    }

    pub fn is_subspace_of(&self, other: &Self) -> bool {
        self.ambient == other.ambient && self.basis.iter().all(|v| other.contains(v))
    }

    pub fn sum(&self, other: &Self) -> Result<Self> {
        let mut vectors = self.basis.clone();
        vectors.extend(other.basis.iter().cloned());
        Self::span(self.ambient, &vectors)
    }

    pub fn intersection(&self, other: &Self) -> Result<Self> {
        if self.ambient != other.ambient {
            return Err(ExactError::Dimension {
                description: format!(
                    "subspaces of F^{} and F^{} cannot be intersected",
                    self.ambient, other.ambient
                ),
            });
        }
        if self.is_zero() || other.is_zero() {
            return Ok(Self::zero(self.ambient));
        }
        // (a, b) with a U + b W = 0 gives a U in both.
        let mut rows = self.basis.clone();
        rows.extend(other.basis.iter().cloned());
        let stacked = Matrix::from_rows(self.ambient, rows)?;
        let relations = stacked.left_kernel();
        let vectors: Vec<Vec<F>> = relations
            .iter()
            .map(|rel| combine(&self.basis, &rel[..self.basis.len()], self.ambient))
            .collect();
        Self::span(self.ambient, &vectors)
    }
}

/// `sum_i coeffs[i] * vectors[i]`.
pub fn combine<F: ExactField>(vectors: &[Vec<F>], coeffs: &[F], ambient: usize) -> Vec<F> {
    let mut out = vec![F::zero(); ambient];
    for (v, c) in vectors.iter().zip(coeffs) {
        if c.is_zero() {
            continue;
        }
        for (x, y) in out.iter_mut().zip(v) {
            *x = x.clone() + c.clone() * y.clone();
        }
    }
    out
}

pub fn unit_vector<F: ExactField>(n: usize, i: usize) -> Vec<F> {
    let mut v = vec![F::zero(); n];
    v[i] = F::one();
    v
}

/// A linearly independent family of vectors with a left inverse, used to
/// read off coordinates of vectors in its span.
#[derive(Debug, Clone)]
pub struct Frame<F> {
    vectors: Vec<Vec<F>>,
    ambient: usize,
    coordinate_map: Matrix<F>,
}

impl<F: ExactField> Frame<F> {
    pub fn new(ambient: usize, vectors: Vec<Vec<F>>) -> Result<Self> {
        let m = vectors.len();
        let b = Matrix::from_columns(ambient, &vectors)?;
        // E [B | I] = [R | E] with R = [I_m; 0]; the first m rows of E are
        // a left inverse of B.
        let mut augmented = Matrix::zeros(ambient, m + ambient);
        for i in 0..ambient {
            for j in 0..m {
                augmented.set(i, j, b.get(i, j).clone());
            }
            augmented.set(i, m + i, F::one());
        }
        let (r, pivots) = augmented.rref();
        if pivots.iter().take_while(|&&p| p < m).count() < m {
            return Err(ExactError::Singular {
                description: format!("{m} frame vectors are linearly dependent"),
            });
        }
        let mut coordinate_map = Matrix::zeros(m, ambient);
        for i in 0..m {
            for j in 0..ambient {
                coordinate_map.set(i, j, r.get(i, m + j).clone());
            }
        }
        Ok(Self {
            vectors,
            ambient,
            coordinate_map,
        })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vectors(&self) -> &[Vec<F>] {
        &self.vectors
    }

    /// Left inverse `C` with `C B = I`; `C v` are the coordinates of any
    /// `v` in the span.
    pub fn coordinate_map(&self) -> &Matrix<F> {
        &self.coordinate_map
    }

    /// Coordinates of `v`, or `None` if `v` is outside the span.
    pub fn coordinates(&self, v: &[F]) -> Option<Vec<F>> {
        if v.len() != self.ambient {
            return None;
        }
        let coords = self.coordinate_map.apply(v);
        (combine(&self.vectors, &coords, self.ambient) == v).then_some(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Rational;

    fn v(xs: &[i64]) -> Vec<Rational> {
        xs.iter().map(|&x| Rational::from_int(x)).collect()
    }

    #[test]
    fn span_is_canonical() {
        let a = Subspace::span(3, &[v(&[1, 1, 0]), v(&[0, 1, 1])]).unwrap();
        let b = Subspace::span(3, &[v(&[1, 0, -1]), v(&[2, 3, 1]), v(&[1, 1, 0])]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dim(), 2);
        assert!(a.contains(&v(&[1, 2, 1])));
        assert!(!a.contains(&v(&[0, 0, 1])));
    }

    #[test]
    fn intersection_of_planes_is_a_line() {
        let a = Subspace::span(3, &[v(&[1, 0, 0]), v(&[0, 1, 0])]).unwrap();
        let b = Subspace::span(3, &[v(&[0, 1, 0]), v(&[0, 0, 1])]).unwrap();
        let line = a.intersection(&b).unwrap();
        assert_eq!(line, Subspace::span(3, &[v(&[0, 1, 0])]).unwrap());
        assert!(line.is_subspace_of(&a));
        assert!(a.sum(&b).unwrap() == Subspace::full(3));
    }

    #[test]
    fn frame_coordinates() {
        let frame = Frame::new(3, vec![v(&[1, 1, 0]), v(&[0, 1, 1])]).unwrap();
        assert_eq!(frame.coordinates(&v(&[2, 5, 3])), Some(v(&[2, 3])));
        assert_eq!(frame.coordinates(&v(&[0, 0, 1])), None);
        assert!(Frame::new(2, vec![v(&[1, 2]), v(&[2, 4])]).is_err());
    }
}
