//! All gradings over torsion-free groups, as quotients of the maximal one.

use std::collections::{BTreeSet, VecDeque};

use nilgrade_exact::lattice::{from_i64s, to_i64};
use nilgrade_exact::lp::primitive_integer_vector;
use nilgrade_exact::{AbelianQuotient, BigInt, ExactError, ExactField, Rational, Subspace};
use tracing::{debug, warn};

use crate::algebra::LieAlgebra;
use crate::config::Limits;
use crate::error::{GradingError, Result};
use crate::grading::{Grading, GradingOptions};
use crate::magma::{Magma, Weight};
use crate::maximal::maximal_grading;

/// Every grading of `algebra` over a torsion-free abelian group, up to an
/// automorphism and a group homomorphism.
///
/// The maximal grading over `Z^k` is pushed forward to `Z^k / (S ∩ Z^k)`
/// for every rational subspace `S` spanned by differences of its weights.
/// The list is not reduced up to automorphism.
pub fn torsion_free_gradings<F: ExactField>(
    algebra: &LieAlgebra<F>,
    limits: &Limits,
) -> Result<Vec<Grading<F>>> {
    let mut maximal = maximal_grading(algebra)?;
    if maximal.magma().as_abelian().is_some_and(|g| g.has_torsion()) {
        warn!(algebra = %algebra.name(), "maximal grading has torsion; using its torsion-free coarsening");
        maximal = maximal.torsion_free_coarsening()?;
    }
    let k = maximal.magma().rank();
    let weights = maximal.weights().to_vec();
    let points = weights
        .iter()
        .map(|w| {
            w.as_lattice()
                .map(<[i64]>::to_vec)
                .ok_or_else(|| GradingError::NotInMagma {
                    weight: w.to_string(),
                    magma: maximal.magma().to_string(),
                })
        })
        .collect::<Result<Vec<Vec<i64>>>>()?;

    let mut differences: BTreeSet<Vec<Rational>> = BTreeSet::new();
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            differences.insert(b.iter().zip(a).map(|(x, y)| Rational::from_int(x - y)).collect());
        }
    }

    let subspaces = difference_subspaces(k, &differences, limits.max_quotient_subspaces)?;
    debug!(
        algebra = %algebra.name(),
        rank = k,
        subspaces = subspaces.len(),
        "torsion-free quotients"
    );

    let mut priority: Vec<usize> = (0..weights.len()).collect();
    priority.sort_by_key(|&i| {
        maximal
            .layer_space(&weights[i])
            .and_then(|s| s.pivots().first().copied())
            .unwrap_or(usize::MAX)
    });
    let preferred: Vec<Vec<BigInt>> = priority.iter().map(|&i| from_i64s(&points[i])).collect();

    let mut gradings = Vec::with_capacity(subspaces.len());
    for subspace in subspaces {
        let generators: Vec<Vec<BigInt>> = subspace
            .basis()
            .iter()
            .map(|v| primitive_integer_vector(v))
            .collect();
        let mut quotient = AbelianQuotient::torsion_free(k, &generators)?;
        quotient.unimodular_relabel(&preferred)?;

        let mut layers = Vec::with_capacity(weights.len());
        for (w, p) in weights.iter().zip(&points) {
            let label = quotient
                .project(&from_i64s(p))
                .iter()
                .map(to_i64)
                .collect::<std::result::Result<Vec<i64>, ExactError>>()?;
            layers.push((Weight::Lattice(label), maximal.layers()[w].clone()));
        }
        gradings.push(Grading::with_options(
            algebra,
            layers,
            GradingOptions {
                magma: Some(Magma::free(quotient.free_rank())),
                projections: true,
                check: cfg!(debug_assertions),
            },
        )?);
    }
    Ok(gradings)
}

/// Spans of subsets of `differences`, breadth first from the zero
/// subspace, each listed once.
fn difference_subspaces(
    k: usize,
    differences: &BTreeSet<Vec<Rational>>,
    budget: usize,
) -> Result<Vec<Subspace<Rational>>> {
    let zero = Subspace::zero(k);
    let mut seen: BTreeSet<Subspace<Rational>> = BTreeSet::from([zero.clone()]);
    let mut order = vec![zero.clone()];
    let mut queue = VecDeque::from([zero]);
    while let Some(current) = queue.pop_front() {
        for d in differences {
            if current.contains(d) {
                continue;
            }
            let next = current.sum(&Subspace::span(k, std::slice::from_ref(d))?)?;
            if seen.insert(next.clone()) {
                if seen.len() > budget {
                    return Err(ExactError::Budget {
                        description: format!("more than {budget} difference subspaces"),
                    }
                    .into());
                }
                order.push(next.clone());
                queue.push_back(next);
            }
        }
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i64) -> Rational {
        Rational::from_int(n)
    }

    #[test]
    fn heisenberg_has_five_torsion_free_gradings() {
        let h = LieAlgebra::<Rational>::builder("heis", &["X", "Y", "Z"])
            .bracket("X", "Y", [("Z", q(1))])
            .build()
            .unwrap();
        let gradings = torsion_free_gradings(&h, &Limits::default()).unwrap();
        let shapes: Vec<(usize, usize)> = gradings
            .iter()
            .map(|g| (g.magma().rank(), g.len()))
            .collect();
        assert_eq!(shapes, vec![(2, 3), (1, 2), (1, 2), (1, 2), (0, 1)]);
        assert!(gradings.iter().all(|g| g.projections()));

        let stratification = gradings
            .iter()
            .find(|g| {
                g.layer_dimension(&Weight::lattice([1])) == 2
                    && g.layer_dimension(&Weight::lattice([2])) == 1
            })
            .unwrap();
        assert_eq!(
            stratification.layer(&Weight::lattice([2])).unwrap(),
            &[h.unit(2)]
        );
    }

    #[test]
    fn subspace_budget_is_enforced() {
        let differences: BTreeSet<Vec<Rational>> =
            [vec![q(1), q(0)], vec![q(0), q(1)], vec![q(1), q(1)]].into();
        assert_eq!(difference_subspaces(2, &differences, 100).unwrap().len(), 5);
        assert!(difference_subspaces(2, &differences, 2).is_err());
    }
}
