//! Finest gradings from maximal tori of semisimple derivations.

use nilgrade_exact::{
    ExactField, Matrix, Quadratic, QuadraticField, Rational, Subspace, UPoly, jordan_decomposition,
    minimal_polynomial, rational_factors,
};
use num_traits::Zero;
use tracing::{debug, trace};

use crate::algebra::LieAlgebra;
use crate::error::{GradingError, Result};
use crate::grading::{Grading, GradingOptions};
use crate::magma::{Magma, Weight};

/// The finest grading of `algebra` over a torsion-free abelian group.
///
/// A torus of commuting semisimple derivations is grown one semisimple
/// part at a time from the centralizer of the current torus; the joint
/// eigenspaces of a maximal torus are the layers. Eigenvalues must lie in
/// the working field.
pub fn maximal_grading<F: ExactField>(algebra: &LieAlgebra<F>) -> Result<Grading<F>> {
    let torus = maximal_torus(algebra)?;
    let mut eigenvalues = Vec::with_capacity(torus.len());
    for t in &torus {
        eigenvalues.push(split_eigenvalues(t)?);
    }
    joint_eigen_grading(algebra, &torus, &eigenvalues)
}

/// The finest grading of a rational algebra over the quadratic field that
/// splits its maximal torus, or over the rationals when the torus already
/// splits there.
///
/// Fails with [`GradingError::NotSplit`] when some eigenvalue has degree
/// three or more, or when two different quadratic fields would be needed.
pub fn maximal_grading_split(algebra: &LieAlgebra<Rational>) -> Result<Grading<Quadratic>> {
    let torus = maximal_torus(algebra)?;
    let mut factored = Vec::with_capacity(torus.len());
    for t in &torus {
        let factors = rational_factors(&minimal_polynomial(t)?)?;
        if !factors.is_complete() {
            return Err(GradingError::NotSplit {
                polynomial: factors.rest.to_string(),
            });
        }
        factored.push(factors);
    }

    let mut field: Option<QuadraticField> = None;
    for q in factored.iter().flat_map(|f| &f.quadratics) {
        let disc = discriminant(q);
        match &field {
            None => field = QuadraticField::from_discriminant(&disc)?,
            Some(k) if k.sqrt_of(&disc).is_none() => {
                return Err(GradingError::NotSplit {
                    polynomial: q.to_string(),
                });
            }
            Some(_) => {}
        }
    }

    let mut eigenvalues = Vec::with_capacity(factored.len());
    for factors in &factored {
        let mut values: Vec<Quadratic> = factors.roots.iter().cloned().map(Quadratic::from).collect();
        for q in &factors.quadratics {
            let roots = field
                .as_ref()
                .and_then(|k| k.quadratic_roots(q))
                .ok_or_else(|| GradingError::NotSplit {
                    polynomial: q.to_string(),
                })?;
            values.extend(roots);
        }
        values.sort();
        eigenvalues.push(values);
    }
    debug!(
        algebra = %algebra.name(),
        field = %field.as_ref().map_or_else(|| "Q".to_string(), |k| k.to_string()),
        "splitting field of the maximal torus"
    );

    let embed = |c: &Rational| Quadratic::from(c.clone());
    let extended = algebra.map_scalars(embed)?;
    let torus: Vec<Matrix<Quadratic>> = torus.iter().map(|t| t.map_entries(embed)).collect();
    joint_eigen_grading(&extended, &torus, &eigenvalues)
}

/// The universal realization of the joint eigenspace decomposition, given
/// the eigenvalues of each torus element.
fn joint_eigen_grading<F: ExactField>(
    algebra: &LieAlgebra<F>,
    torus: &[Matrix<F>],
    eigenvalues: &[Vec<F>],
) -> Result<Grading<F>> {
    let n = algebra.dimension();
    if torus.is_empty() {
        debug!(algebra = %algebra.name(), "trivial maximal torus");
        let basis = (0..n).map(|i| algebra.unit(i)).collect();
        return Grading::with_options(
            algebra,
            [(Magma::trivial().zero(), basis)],
            GradingOptions {
                magma: Some(Magma::trivial()),
                ..GradingOptions::default()
            },
        );
    }

    let mut spaces: Vec<(Vec<F>, Subspace<F>)> = vec![(Vec::new(), Subspace::full(n))];
    for (t, values) in torus.iter().zip(eigenvalues) {
        let eigenspaces = eigenspaces(t, values)?;
        let mut refined = Vec::new();
        for (values, v) in &spaces {
            for (lambda, w) in &eigenspaces {
                let joint = v.intersection(w)?;
                if joint.is_zero() {
                    continue;
                }
                let mut values = values.clone();
                values.push(lambda.clone());
                refined.push((values, joint));
            }
        }
        spaces = refined;
    }

    let rank = torus.len();
    let layers = spaces
        .into_iter()
        .map(|(values, space)| (Weight::Field(values), space.basis().to_vec()));
    let eigen_grading = Grading::with_options(
        algebra,
        layers,
        GradingOptions {
            magma: Some(Magma::FieldVectors { rank }),
            ..GradingOptions::default()
        },
    )?;
    eigen_grading.universal_realization()
}

/// A maximal family of linearly independent, commuting semisimple
/// derivations.
pub fn maximal_torus<F: ExactField>(algebra: &LieAlgebra<F>) -> Result<Vec<Matrix<F>>> {
    let n = algebra.dimension();
    let derivations = algebra.derivations_basis()?;
    let mut torus: Vec<Matrix<F>> = Vec::new();
    // each extension is independent of the last, so rank n bounds the loop
    for _ in 0..=n {
        let span = Subspace::span(
            n * n,
            &torus.iter().map(|t| t.entries().to_vec()).collect::<Vec<_>>(),
        )?;
        let mut extension = None;
        for d in centralizer(derivations, &torus)? {
            let (semisimple, _) = jordan_decomposition(&d)?;
            if !span.contains(semisimple.entries()) {
                extension = Some(semisimple);
                break;
            }
        }
        let Some(s) = extension else { break };
        trace!(rank = torus.len() + 1, "torus extended");
        torus.push(s);
    }
    debug!(algebra = %algebra.name(), rank = torus.len(), "maximal torus");
    Ok(torus)
}

/// A basis of the derivations commuting with every element of `torus`.
fn centralizer<F: ExactField>(derivations: &[Matrix<F>], torus: &[Matrix<F>]) -> Result<Vec<Matrix<F>>> {
    if torus.is_empty() {
        return Ok(derivations.to_vec());
    }
    let mut columns = Vec::with_capacity(derivations.len());
    for d in derivations {
        let mut column = Vec::new();
        for t in torus {
            column.extend(d.commutator(t)?.entries().iter().cloned());
        }
        columns.push(column);
    }
    let rows = columns.first().map_or(0, |c| c.len());
    let system = Matrix::from_columns(rows, &columns)?;
    let n = torus[0].rows();
    let mut basis = Vec::new();
    for coeffs in system.kernel() {
        let mut sum = Matrix::zeros(n, n);
        for (d, c) in derivations.iter().zip(&coeffs) {
            if !c.is_zero() {
                sum = sum.add(&d.scale(c))?;
            }
        }
        basis.push(sum);
    }
    Ok(basis)
}

/// The distinct eigenvalues of a semisimple matrix that splits over the
/// field.
fn split_eigenvalues<F: ExactField>(t: &Matrix<F>) -> Result<Vec<F>> {
    let minimal = minimal_polynomial(t)?;
    let roots = minimal.roots();
    if Some(roots.len()) != minimal.degree() {
        return Err(GradingError::NotSplit {
            polynomial: minimal.to_string(),
        });
    }
    Ok(roots)
}

fn discriminant(q: &UPoly<Rational>) -> Rational {
    match q.coeffs() {
        [c0, c1, c2] => c1 * c1 - Rational::from_int(4) * c0 * c2,
        _ => Rational::zero(),
    }
}

fn eigenspaces<F: ExactField>(t: &Matrix<F>, values: &[F]) -> Result<Vec<(F, Subspace<F>)>> {
    let n = t.rows();
    let mut out = Vec::with_capacity(values.len());
    for lambda in values {
        let shifted = t.sub(&Matrix::identity(n).scale(lambda))?;
        out.push((lambda.clone(), Subspace::span(n, &shifted.kernel())?));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nilgrade_exact::Rational;

    fn q(n: i64) -> Rational {
        Rational::from_int(n)
    }

    fn w(coords: &[i64]) -> Weight<Rational> {
        Weight::lattice(coords.to_vec())
    }

    #[test]
    fn heisenberg_has_a_rank_two_torus() {
        let h = LieAlgebra::<Rational>::builder("heis", &["X", "Y", "Z"])
            .bracket("X", "Y", [("Z", q(1))])
            .build()
            .unwrap();
        assert_eq!(maximal_torus(&h).unwrap().len(), 2);
        let g = maximal_grading(&h).unwrap();
        assert_eq!(g.magma(), &Magma::free(2));
        assert_eq!(g.layer(&w(&[1, 0])).unwrap(), &[h.unit(0)]);
        assert_eq!(g.layer(&w(&[0, 1])).unwrap(), &[h.unit(1)]);
        assert_eq!(g.layer(&w(&[1, 1])).unwrap(), &[h.unit(2)]);
    }

    #[test]
    fn abelian_algebras_split_into_lines() {
        let a = LieAlgebra::<Rational>::abelian("a2", 2).unwrap();
        let g = maximal_grading(&a).unwrap();
        assert_eq!(g.len(), 2);
        assert_eq!(g.magma(), &Magma::free(2));
    }

    #[test]
    fn rotation_derivations_do_not_split_over_the_rationals() {
        // ad(Z) rotates span(X, Y); every torus of rank two contains a
        // derivation with eigenvalues a +- bi, b != 0
        let a = LieAlgebra::<Rational>::builder("rot", &["X", "Y", "Z"])
            .bracket("Z", "X", [("Y", q(1))])
            .bracket("Z", "Y", [("X", q(-1))])
            .build()
            .unwrap();
        let err = maximal_grading(&a).unwrap_err();
        assert!(matches!(err, GradingError::NotSplit { .. }));

        // over Q(i) the lines Z, X + iY and X - iY separate
        let g = maximal_grading_split(&a).unwrap();
        assert_eq!(g.len(), 3);
    }

    fn complex_heisenberg() -> LieAlgebra<Rational> {
        // h3(C) as a six dimensional rational algebra: X = X1 + i X2, ...
        LieAlgebra::<Rational>::builder("h3C", &["X1", "X2", "Y1", "Y2", "Z1", "Z2"])
            .bracket("X1", "Y1", [("Z1", q(1))])
            .bracket("X1", "Y2", [("Z2", q(1))])
            .bracket("X2", "Y1", [("Z2", q(1))])
            .bracket("X2", "Y2", [("Z1", q(-1))])
            .build()
            .unwrap()
    }

    #[test]
    fn complex_heisenberg_splits_over_the_gaussian_field() {
        let h = complex_heisenberg();
        assert!(matches!(
            maximal_grading(&h),
            Err(GradingError::NotSplit { .. })
        ));

        let g = maximal_grading_split(&h).unwrap();
        assert_eq!(g.magma(), &Magma::free(4));
        assert_eq!(g.len(), 6);
        let gaussian = QuadraticField::gaussian();
        let irrational = g
            .layers()
            .values()
            .flatten()
            .flatten()
            .any(|c| c.field() == Some(&gaussian));
        assert!(irrational);
    }

    #[test]
    fn rational_tori_split_without_an_extension() {
        let h = LieAlgebra::<Rational>::builder("heis", &["X", "Y", "Z"])
            .bracket("X", "Y", [("Z", q(1))])
            .build()
            .unwrap();
        let g = maximal_grading_split(&h).unwrap();
        assert_eq!(g.magma(), &Magma::free(2));
        assert!(g.layers().values().flatten().flatten().all(|c| c.field().is_none()));
    }
}
