//! Integer lattices: Smith normal form and finitely generated abelian
//! quotients of `Z^n`.
//!
//! Vectors are rows. For a relation matrix `R` (one relation per row) the
//! Smith form `D = P R Q` gives coordinates `y = x Q` in which the
//! relation lattice is spanned by `d_i e_i`.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use tracing::{trace, warn};

use crate::error::{ExactError, Result};
use crate::matrix::Matrix;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Vec<BigInt>>,
}

impl IntMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![vec![BigInt::zero(); cols]; rows],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i][i] = BigInt::one();
        }
        m
    }

    pub fn from_rows(cols: usize, rows: Vec<Vec<BigInt>>) -> Result<Self> {
        if let Some(bad) = rows.iter().position(|r| r.len() != cols) {
            return Err(ExactError::Dimension {
                description: format!("row {bad} has {} entries, expected {cols}", rows[bad].len()),
            });
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data: rows,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, i: usize, j: usize) -> &BigInt {
        &self.data[i][j]
    }

    pub fn row(&self, i: usize) -> &[BigInt] {
        &self.data[i]
    }

    /// Row vector times matrix.
    pub fn row_times(&self, x: &[BigInt]) -> Vec<BigInt> {
        (0..self.cols)
            .map(|j| {
                x.iter()
                    .zip(&self.data)
                    .fold(BigInt::zero(), |acc, (a, row)| acc + a * &row[j])
            })
            .collect()
    }

    fn swap_cols(&mut self, a: usize, b: usize) {
        for row in &mut self.data {
            row.swap(a, b);
        }
    }

    /// `col[target] -= k * col[source]`
    fn col_axpy(&mut self, target: usize, source: usize, k: &BigInt) {
        for row in &mut self.data {
            let delta = k * &row[source];
            row[target] -= delta;
        }
    }

    /// `row[target] -= k * row[source]`
    fn row_axpy(&mut self, target: usize, source: usize, k: &BigInt) {
        let src = self.data[source].clone();
        for (x, s) in self.data[target].iter_mut().zip(&src) {
            *x -= k * s;
        }
    }

    fn to_rational(&self) -> Matrix<BigRational> {
        let mut m = Matrix::zeros(self.rows, self.cols);
        for i in 0..self.rows {
            for j in 0..self.cols {
                m.set(i, j, BigRational::from_integer(self.data[i][j].clone()));
            }
        }
        m
    }
}

/// Smith normal form of a relation matrix.
#[derive(Debug, Clone)]
pub struct SmithForm {
    /// Diagonal entries `d_0 | d_1 | ...`, nonnegative; zeros trail.
    pub diagonal: Vec<BigInt>,
    /// Column transform `Q`.
    pub q: IntMatrix,
    /// Its inverse.
    pub q_inv: IntMatrix,
}

pub fn smith_normal_form(m: &IntMatrix) -> SmithForm {
    let rows = m.rows;
    let cols = m.cols;
    let mut a = m.clone();
    let mut q = IntMatrix::identity(cols);
    let mut q_inv = IntMatrix::identity(cols);
    let mut diagonal = Vec::new();

    for t in 0..rows.min(cols) {
        let Some((pi, pj)) = min_nonzero(&a, t) else {
            break;
        };
        a.data.swap(t, pi);
        a.swap_cols(t, pj);
        q.swap_cols(t, pj);
        q_inv.data.swap(t, pj);

        loop {
            let mut clean = true;
            for i in t + 1..rows {
                if a.data[i][t].is_zero() {
                    continue;
                }
                let k = a.data[i][t].div_floor(&a.data[t][t]);
                a.row_axpy(i, t, &k);
                clean &= a.data[i][t].is_zero();
            }
            for j in t + 1..cols {
                if a.data[t][j].is_zero() {
                    continue;
                }
                let k = a.data[t][j].div_floor(&a.data[t][t]);
                a.col_axpy(j, t, &k);
                q.col_axpy(j, t, &k);
                // Q <- Q E with E = I - k e_t e_j^T, so Q^-1 <- (I + k e_t e_j^T) Q^-1.
                let neg = -k;
                q_inv.row_axpy(t, j, &neg);
                clean &= a.data[t][j].is_zero();
            }
            if !clean {
                if let Some((pi, pj)) = min_nonzero_in_cross(&a, t) {
                    a.data.swap(t, pi);
                    a.swap_cols(t, pj);
                    q.swap_cols(t, pj);
                    q_inv.data.swap(t, pj);
                }
                continue;
            }
            let pivot = a.data[t][t].clone();
            let offender = (t + 1..rows).find(|&i| {
                (t + 1..cols).any(|j| !(&a.data[i][j] % &pivot).is_zero())
            });
            match offender {
                Some(i) => {
                    let minus_one = -BigInt::one();
                    a.row_axpy(t, i, &minus_one);
                }
                None => break,
            }
        }
        if a.data[t][t].is_negative() {
            for x in &mut a.data[t] {
                *x = -x.clone();
            }
        }
        diagonal.push(a.data[t][t].clone());
    }
    diagonal.resize(rows.min(cols), BigInt::zero());
    trace!(?diagonal, "smith normal form");
    SmithForm { diagonal, q, q_inv }
}

fn min_nonzero(a: &IntMatrix, t: usize) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for i in t..a.rows {
        for j in t..a.cols {
            let x = &a.data[i][j];
            if x.is_zero() {
                continue;
            }
            if best.is_none_or(|(bi, bj)| x.abs() < a.data[bi][bj].abs()) {
                best = Some((i, j));
            }
        }
    }
    best
}

/// Smallest nonzero entry in row `t` or column `t` at or beyond `(t, t)`.
fn min_nonzero_in_cross(a: &IntMatrix, t: usize) -> Option<(usize, usize)> {
    let column = (t..a.rows).map(|i| (i, t));
    let row = (t + 1..a.cols).map(|j| (t, j));
    column
        .chain(row)
        .filter(|&(i, j)| !a.data[i][j].is_zero())
        .min_by(|&(i1, j1), &(i2, j2)| a.data[i1][j1].abs().cmp(&a.data[i2][j2].abs()))
}

/// The abelian group `Z^n / L` for a sublattice `L`, with a canonical
/// projection from `Z^n`.
///
/// Invariants list torsion orders (each at least 2, each dividing the next)
/// followed by a zero for every free coordinate.
#[derive(Debug, Clone)]
pub struct AbelianQuotient {
    ambient: usize,
    q: IntMatrix,
    /// `(index into x Q, modulus)`; modulus zero marks a free coordinate.
    kept: Vec<(usize, BigInt)>,
    /// Applied to the free coordinates after projection.
    free_basis_change: Option<IntMatrix>,
}

impl AbelianQuotient {
    /// `Z^ambient` modulo the lattice spanned by `relations`.
    pub fn new(ambient: usize, relations: &[Vec<BigInt>]) -> Result<Self> {
        let snf = smith_normal_form(&IntMatrix::from_rows(ambient, relations.to_vec())?);
        let mut torsion = Vec::new();
        let mut free = Vec::new();
        for i in 0..ambient {
            match snf.diagonal.get(i) {
                Some(d) if d.is_one() => {}
                Some(d) if !d.is_zero() => torsion.push((i, d.clone())),
                _ => free.push((i, BigInt::zero())),
            }
        }
        torsion.extend(free);
        Ok(Self {
            ambient,
            q: snf.q,
            kept: torsion,
            free_basis_change: None,
        })
    }

    /// `Z^ambient` modulo the integer points of the rational span of
    /// `generators`. The result is always free.
    pub fn torsion_free(ambient: usize, generators: &[Vec<BigInt>]) -> Result<Self> {
        let snf = smith_normal_form(&IntMatrix::from_rows(ambient, generators.to_vec())?);
        let kept = (0..ambient)
            .filter(|&i| snf.diagonal.get(i).is_none_or(|d| d.is_zero()))
            .map(|i| (i, BigInt::zero()))
            .collect();
        Ok(Self {
            ambient,
            q: snf.q,
            kept,
            free_basis_change: None,
        })
    }

    pub fn ambient(&self) -> usize {
        self.ambient
    }

    pub fn invariants(&self) -> Vec<BigInt> {
        self.kept.iter().map(|(_, d)| d.clone()).collect()
    }

    pub fn free_rank(&self) -> usize {
        self.kept.iter().filter(|(_, d)| d.is_zero()).count()
    }

    pub fn torsion_rank(&self) -> usize {
        self.kept.len() - self.free_rank()
    }

    /// Image of an integer vector in canonical coordinates.
    pub fn project(&self, x: &[BigInt]) -> Vec<BigInt> {
        let y = self.q.row_times(x);
        let mut out: Vec<BigInt> = self
            .kept
            .iter()
            .map(|(i, d)| {
                if d.is_zero() {
                    y[*i].clone()
                } else {
                    y[*i].mod_floor(d)
                }
            })
            .collect();
        if let Some(change) = &self.free_basis_change {
            let start = self.torsion_rank();
            let rotated = change.row_times(&out[start..]);
            out.splice(start.., rotated);
        }
        out
    }

    /// Image of the `i`-th standard basis vector.
    pub fn project_unit(&self, i: usize) -> Vec<BigInt> {
        let mut x = vec![BigInt::zero(); self.ambient];
        x[i] = BigInt::one();
        self.project(&x)
    }

    /// Change the basis of the free part so that, scanning `preferred` in
    /// order, every vector whose free part extends the vectors chosen so
    /// far to a saturated independent family becomes the next standard
    /// basis vector.
    pub fn unimodular_relabel(&mut self, preferred: &[Vec<BigInt>]) -> Result<()> {
        self.free_basis_change = None;
        let start = self.torsion_rank();
        let rank = self.free_rank();
        if rank == 0 {
            return Ok(());
        }
        let mut chosen: Vec<Vec<BigInt>> = Vec::new();
        for x in preferred {
            if chosen.len() == rank {
                break;
            }
            let free = self.project(x)[start..].to_vec();
            if free.iter().all(|c| c.is_zero()) {
                continue;
            }
            let mut candidate = chosen.clone();
            candidate.push(free);
            if is_saturated_independent(rank, &candidate)? {
                chosen = candidate;
            }
        }
        if chosen.is_empty() {
            return Ok(());
        }
        let basis = complete_to_basis(rank, chosen)?;
        let inverse = basis.to_rational().inverse()?;
        let mut rows = Vec::with_capacity(rank);
        for i in 0..rank {
            let mut row = Vec::with_capacity(rank);
            for j in 0..rank {
                let value = inverse.get(i, j);
                if !value.is_integer() {
                    warn!("free basis change is not unimodular; keeping Smith coordinates");
                    return Ok(());
                }
                row.push(value.to_integer());
            }
            rows.push(row);
        }
        self.free_basis_change = Some(IntMatrix::from_rows(rank, rows)?);
        Ok(())
    }
}

/// Rows are linearly independent and span a saturated sublattice.
fn is_saturated_independent(cols: usize, rows: &[Vec<BigInt>]) -> Result<bool> {
    let snf = smith_normal_form(&IntMatrix::from_rows(cols, rows.to_vec())?);
    Ok(snf.diagonal.len() >= rows.len() && snf.diagonal[..rows.len()].iter().all(|d| d.is_one()))
}

/// Extend a saturated independent family to a basis of `Z^n`: with
/// `D = P C Q = [I 0]`, the trailing rows of `Q^-1` complete `C`.
fn complete_to_basis(n: usize, chosen: Vec<Vec<BigInt>>) -> Result<IntMatrix> {
    let r = chosen.len();
    let snf = smith_normal_form(&IntMatrix::from_rows(n, chosen.clone())?);
    let mut rows = chosen;
    for i in r..n {
        rows.push(snf.q_inv.row(i).to_vec());
    }
    IntMatrix::from_rows(n, rows)
}

/// Convert to a machine integer, failing loudly on overflow.
pub fn to_i64(x: &BigInt) -> Result<i64> {
    x.to_i64()
        .ok_or_else(|| ExactError::Overflow(format!("{x} does not fit in 64 bits")))
}

pub fn from_i64s(xs: &[i64]) -> Vec<BigInt> {
    xs.iter().map(|&x| BigInt::from(x)).collect()
}
