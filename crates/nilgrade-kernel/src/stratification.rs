//! Stratifications: gradings over `Z` generated by the degree one layer.

use nilgrade_exact::{ExactField, Frame, Matrix, Subspace};
use tracing::debug;

use crate::algebra::LieAlgebra;
use crate::error::{GradingError, Result};
use crate::grading::{Grading, GradingOptions};
use crate::magma::{Magma, Weight};

/// A stratification of `algebra`, if one exists.
///
/// Works in a basis `Y_1 .. Y_n` adapted to the lower central series,
/// where `Y_i` has weight `w_i` when it represents `g^{w_i} / g^{w_i + 1}`.
/// A stratification exists exactly when some derivation `D` with
/// `D Y_k = w_k Y_k + sum_{w_h > w_k} x_kh Y_h` exists; the Leibniz rule on
/// every pair `[Y_i, Y_j]` is linear in the unknowns `x_kh`. The layers are
/// the eigenspaces of `D`.
pub fn stratification<F: ExactField>(algebra: &LieAlgebra<F>) -> Result<Grading<F>> {
    if !algebra.is_nilpotent()? {
        return Err(GradingError::NotNilpotent {
            algebra: algebra.name().to_string(),
        });
    }
    let n = algebra.dimension();
    let series = algebra.lower_central_series()?;
    let step = series.len() - 1;

    let mut basis: Vec<Vec<F>> = Vec::with_capacity(n);
    let mut weights: Vec<usize> = Vec::with_capacity(n);
    for (k, pair) in series.windows(2).enumerate() {
        let (upper, lower) = (&pair[0], &pair[1]);
        let mut covered = lower.clone();
        for v in upper.basis() {
            if covered.contains(v) {
                continue;
            }
            covered = covered.sum(&Subspace::span(n, std::slice::from_ref(v))?)?;
            basis.push(v.clone());
            weights.push(k + 1);
        }
    }
    let frame = Frame::new(n, basis.clone())?;

    // unknowns x_kh for w_h > w_k
    let params: Vec<(usize, usize)> = (0..n)
        .flat_map(|k| (0..n).map(move |h| (k, h)))
        .filter(|&(k, h)| weights[h] > weights[k])
        .collect();

    let mut rows: Vec<Vec<F>> = Vec::new();
    let mut rhs: Vec<F> = Vec::new();
    for i in 0..n {
        for j in i + 1..n {
            let bracket = algebra.bracket(&basis[i], &basis[j]);
            let coords = frame.coordinate_map().apply(&bracket);

            let mut target = vec![F::zero(); n];
            for (k, c) in coords.iter().enumerate() {
                if c.is_zero() {
                    continue;
                }
                let shift = F::from_int(weights[k] as i64 - weights[i] as i64 - weights[j] as i64);
                for (t, y) in target.iter_mut().zip(&basis[k]) {
                    *t = t.clone() + shift.clone() * c.clone() * y.clone();
                }
            }

            let mut columns: Vec<Vec<F>> = Vec::with_capacity(params.len());
            for &(k, h) in &params {
                let mut column = vec![F::zero(); n];
                if k == i {
                    column = add(&column, &algebra.bracket(&basis[h], &basis[j]));
                }
                if k == j {
                    column = add(&column, &algebra.bracket(&basis[i], &basis[h]));
                }
                if !coords[k].is_zero() {
                    for (t, y) in column.iter_mut().zip(&basis[h]) {
                        *t = t.clone() - coords[k].clone() * y.clone();
                    }
                }
                columns.push(column);
            }
            for r in 0..n {
                rows.push(columns.iter().map(|col| col[r].clone()).collect());
                rhs.push(target[r].clone());
            }
        }
    }

    let system = Matrix::from_rows(params.len(), rows)?;
    let Some(solution) = system.solve(&rhs)? else {
        return Err(GradingError::NotStratifiable {
            algebra: algebra.name().to_string(),
        });
    };

    // D in the adapted basis: column k is the image of Y_k
    let mut derivation = Matrix::zeros(n, n);
    for k in 0..n {
        derivation.set(k, k, F::from_int(weights[k] as i64));
    }
    for (&(k, h), x) in params.iter().zip(solution) {
        derivation.set(h, k, x);
    }

    let mut layers = Vec::with_capacity(step);
    for degree in 1..=step {
        let shifted = derivation.sub(&Matrix::identity(n).scale(&F::from_int(degree as i64)))?;
        let images: Vec<Vec<F>> = shifted
            .kernel()
            .iter()
            .map(|coords| nilgrade_exact::subspace::combine(&basis, coords, n))
            .collect();
        let layer = Subspace::span(n, &images)?;
        layers.push((Weight::lattice([degree as i64]), layer.basis().to_vec()));
    }
    debug!(algebra = %algebra.name(), step, "stratification");
    Grading::with_options(
        algebra,
        layers,
        GradingOptions {
            magma: Some(Magma::integers()),
            projections: true,
            check: true,
        },
    )
}

fn add<F: ExactField>(a: &[F], b: &[F]) -> Vec<F> {
    a.iter().zip(b).map(|(x, y)| x.clone() + y.clone()).collect()
}
