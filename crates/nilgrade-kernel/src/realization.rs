//! Realizations: the same layers indexed over a different magma.
//!
//! Everything here starts from the universal realization, the grading
//! over `Z^m / <relations>` where `m` counts the nonzero layers and the
//! relations are exactly the sums `w_i + w_j = w_k` between layer weights.

use std::collections::{BTreeMap, BTreeSet};

use nilgrade_exact::lattice::{from_i64s, to_i64};
use nilgrade_exact::lp::{convex_hull_contains_origin, positive_functional, primitive_integer_vector};
use nilgrade_exact::{AbelianQuotient, BigInt, ExactField, IntegerProgram, LinearProgram, Rational, Relation};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use tracing::debug;

use crate::error::{GradingError, Result};
use crate::grading::{Grading, GradingOptions};
use crate::magma::{AbelianGroup, Magma, Weight};

impl<F: ExactField> Grading<F> {
    /// The grading over the group presented by one generator per layer and
    /// the relations `w_i + w_j = w_k` that hold between layer weights.
    ///
    /// Free coordinates are chosen so that weights of layers appearing
    /// earliest in the algebra's basis become standard basis vectors where
    /// possible. The result is cached on the grading.
    pub fn universal_realization(&self) -> Result<Grading<F>> {
        if let Some(cached) = self.inner.universal.get() {
            return Ok(cached.clone());
        }
        let magma = self.magma();
        if !magma.is_group() {
            return Err(GradingError::NotAGroup {
                magma: magma.to_string(),
            });
        }

        let weights = self.weights();
        let m = weights.len();
        let index: BTreeMap<&Weight<F>, usize> =
            weights.iter().enumerate().map(|(i, w)| (w, i)).collect();
        let mut relations = Vec::new();
        for i in 0..m {
            for j in i..m {
                let sum = magma.add(&weights[i], &weights[j])?;
                if let Some(&k) = index.get(&sum) {
                    let mut relation = vec![0i64; m];
                    relation[i] += 1;
                    relation[j] += 1;
                    relation[k] -= 1;
                    relations.push(from_i64s(&relation));
                }
            }
        }

        let mut quotient = AbelianQuotient::new(m, &relations)?;
        let mut priority: Vec<usize> = (0..m).collect();
        priority.sort_by_key(|&i| {
            self.layer_space(&weights[i])
                .and_then(|s| s.pivots().first().copied())
                .unwrap_or(usize::MAX)
        });
        let preferred: Vec<Vec<BigInt>> = priority
            .iter()
            .map(|&i| {
                let mut e = vec![BigInt::zero(); m];
                e[i] = BigInt::one();
                e
            })
            .collect();
        quotient.unimodular_relabel(&preferred)?;

        let invariants = quotient
            .invariants()
            .iter()
            .map(|d| to_i64(d).map(|d| d.unsigned_abs()))
            .collect::<nilgrade_exact::Result<Vec<u64>>>()?;
        let group = AbelianGroup::new(invariants);
        debug!(
            layers = m,
            relations = relations.len(),
            group = %group,
            "universal realization"
        );

        let mut layers = Vec::with_capacity(m);
        for (i, w) in weights.iter().enumerate() {
            let label = quotient
                .project_unit(i)
                .iter()
                .map(to_i64)
                .collect::<nilgrade_exact::Result<Vec<i64>>>()?;
            layers.push((Weight::Lattice(label), self.layers()[w].clone()));
        }
        let realized = Grading::with_options(
            self.algebra(),
            layers,
            GradingOptions {
                magma: Some(Magma::Abelian(group)),
                projections: true,
                check: cfg!(debug_assertions),
            },
        )?;
        Ok(self.inner.universal.get_or_init(|| realized).clone())
    }

    /// The universal realization with its torsion coordinates dropped;
    /// layers whose weights differ only by torsion merge.
    pub fn torsion_free_coarsening(&self) -> Result<Grading<F>> {
        if let Some(cached) = self.inner.coarsening.get() {
            return Ok(cached.clone());
        }
        let universal = self.universal_realization()?;
        let group = abelian_group(&universal)?;
        let free: Vec<usize> = group
            .invariants()
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut layers = Vec::with_capacity(universal.len());
        for (w, vectors) in universal.layers() {
            let coords = lattice_coordinates(&universal, w)?;
            let kept: Vec<i64> = free.iter().map(|&i| coords[i]).collect();
            layers.push((Weight::Lattice(kept), vectors.clone()));
        }
        let coarsened = Grading::with_options(
            self.algebra(),
            layers,
            GradingOptions {
                magma: Some(Magma::free(free.len())),
                projections: false,
                check: cfg!(debug_assertions),
            },
        )?;
        debug!(
            rank = free.len(),
            layers = coarsened.len(),
            "torsion-free coarsening"
        );
        Ok(self.inner.coarsening.get_or_init(|| coarsened).clone())
    }

    /// Whether the layers can be indexed by positive integers: the
    /// universal group is torsion free and the convex hull of its weights
    /// avoids the origin.
    pub fn has_positive_realization(&self) -> Result<bool> {
        let source = if self.projections() && self.magma().as_abelian().is_some() {
            self.clone()
        } else {
            self.universal_realization()?
        };
        if abelian_group(&source)?.has_torsion() {
            return Ok(false);
        }
        let points = rational_points(&source)?;
        Ok(!convex_hull_contains_origin(&points))
    }

    /// The same layers over `Z` with strictly positive weights.
    ///
    /// Without `optimize_weights` a feasible functional is scaled and
    /// perturbed until it separates all layers. With it, the largest
    /// weight is minimized by branch and bound.
    pub fn to_positive_grading(&self, optimize_weights: bool, max_branch_nodes: usize) -> Result<Grading<F>> {
        let universal = self.universal_realization()?;
        if !universal.has_positive_realization()? {
            return Err(GradingError::NoRealization {
                description: "the grading has no realization over the positive integers"
                    .to_string(),
            });
        }
        let points = integer_points(&universal)?;
        let k = universal.magma().rank();

        let mut bound = BigInt::zero();
        for (i, p) in points.iter().enumerate() {
            bound = p.iter().fold(bound, |acc, x| acc.max(x.abs()));
            for q in &points[i + 1..] {
                bound = p.iter().zip(q).fold(bound, |acc, (x, y)| acc.max((x - y).abs()));
            }
        }
        let base = bound + BigInt::one();

        let rational = rational_points(&universal)?;
        let feasible = positive_functional(&rational).ok_or_else(|| GradingError::NoRealization {
            description: "no functional is positive on every weight".to_string(),
        })?;
        let feasible = primitive_integer_vector(&feasible);
        let functional = if separates(&feasible, &points) {
            feasible
        } else {
            let scale = num_traits::pow(base.clone(), k);
            let mut power = BigInt::one();
            let mut out = Vec::with_capacity(k);
            for a in &feasible {
                out.push(a * &scale + &power);
                power *= &base;
            }
            out
        };

        let functional = if optimize_weights {
            minimize_largest_weight(&points, &functional, max_branch_nodes)?
        } else {
            functional
        };
        debug!(
            functional = ?functional,
            optimized = optimize_weights,
            "positive realization"
        );
        project_to_integers(&universal, &functional)
    }

    /// The same layers over `Z`.
    ///
    /// A grading with torsion fails when `require_identical` is set and is
    /// otherwise replaced by its torsion-free coarsening. The projection
    /// direction is the first positive primitive integer vector, by
    /// increasing 1-norm, that keeps every pair of weights apart.
    pub fn to_integer_grading(&self, require_identical: bool) -> Result<Grading<F>> {
        if self.magma() == &Magma::integers() {
            return Ok(self.clone());
        }
        let mut lattice = self.universal_realization()?;
        if abelian_group(&lattice)?.has_torsion() {
            if require_identical {
                return Err(GradingError::NoRealization {
                    description: "the grading has torsion and no realization over the integers"
                        .to_string(),
                });
            }
            lattice = self.torsion_free_coarsening()?;
        }
        let points = integer_points(&lattice)?;
        let k = lattice.magma().rank();
        if k == 0 {
            return project_to_integers(&lattice, &[]);
        }
        let mut differences = BTreeSet::new();
        for (i, p) in points.iter().enumerate() {
            for q in &points[i + 1..] {
                differences.insert(p.iter().zip(q).map(|(x, y)| x - y).collect::<Vec<BigInt>>());
            }
        }

        let mut norm = k;
        loop {
            for direction in compositions(norm, k) {
                let g = direction.iter().fold(0i64, |acc, &x| acc.gcd(&x));
                if g > 1 {
                    continue;
                }
                let direction = from_i64s(&direction);
                let collides = differences.iter().any(|d| dot(&direction, d).is_zero());
                if !collides {
                    debug!(direction = ?direction, "integer realization");
                    return project_to_integers(&lattice, &direction);
                }
            }
            norm += 1;
        }
    }
}

fn abelian_group<F: ExactField>(grading: &Grading<F>) -> Result<&AbelianGroup> {
    grading
        .magma()
        .as_abelian()
        .ok_or_else(|| GradingError::NotAGroup {
            magma: grading.magma().to_string(),
        })
}

fn lattice_coordinates<'a, F: ExactField>(grading: &Grading<F>, w: &'a Weight<F>) -> Result<&'a [i64]> {
    w.as_lattice().ok_or_else(|| GradingError::NotInMagma {
        weight: w.to_string(),
        magma: grading.magma().to_string(),
    })
}

fn integer_points<F: ExactField>(grading: &Grading<F>) -> Result<Vec<Vec<BigInt>>> {
    grading
        .weights()
        .iter()
        .map(|w| lattice_coordinates(grading, w).map(from_i64s))
        .collect()
}

fn rational_points<F: ExactField>(grading: &Grading<F>) -> Result<Vec<Vec<Rational>>> {
    Ok(integer_points(grading)?
        .into_iter()
        .map(|p| p.into_iter().map(Rational::from_integer).collect())
        .collect())
}

fn dot(a: &[BigInt], b: &[BigInt]) -> BigInt {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Whether `functional` takes pairwise distinct values on `points`.
fn separates(functional: &[BigInt], points: &[Vec<BigInt>]) -> bool {
    let values: BTreeSet<BigInt> = points.iter().map(|p| dot(functional, p)).collect();
    values.len() == points.len()
}

/// Minimize `t` over integer functionals `a` with `1 <= a.p <= t` for every
/// point and `a.(p - q) != 0` for every pair, below the largest weight of
/// `fallback`.
fn minimize_largest_weight(
    points: &[Vec<BigInt>],
    fallback: &[BigInt],
    max_nodes: usize,
) -> Result<Vec<BigInt>> {
    let k = fallback.len();
    let q = |x: &BigInt| Rational::from_integer(x.clone());
    let ceiling = points
        .iter()
        .map(|p| dot(fallback, p))
        .max()
        .unwrap_or_else(BigInt::one);

    let mut lp = LinearProgram::new(k + 1);
    for p in points {
        let mut row: Vec<Rational> = p.iter().map(q).collect();
        row.push(Rational::zero());
        lp.constrain(row, Relation::AtLeast, Rational::one());
        let mut row: Vec<Rational> = p.iter().map(|x| -q(x)).collect();
        row.push(Rational::one());
        lp.constrain(row, Relation::AtLeast, Rational::zero());
    }
    let mut cap = vec![Rational::zero(); k + 1];
    cap[k] = Rational::one();
    lp.constrain(cap.clone(), Relation::AtMost, q(&ceiling));
    lp.minimize(cap);

    let mut program = IntegerProgram::new(lp, max_nodes);
    for (i, p) in points.iter().enumerate() {
        for other in &points[i + 1..] {
            let mut form: Vec<Rational> = p.iter().zip(other).map(|(x, y)| q(&(x - y))).collect();
            form.push(Rational::zero());
            program.require_nonzero(form);
        }
    }
    match program.solve()? {
        Some((point, value)) => {
            debug!(largest = %value, "optimized positive weights");
            Ok(point[..k].iter().map(|x| x.to_integer()).collect())
        }
        None => Ok(fallback.to_vec()),
    }
}

/// Push the layers of a lattice grading forward along `functional` to `Z`.
fn project_to_integers<F: ExactField>(grading: &Grading<F>, functional: &[BigInt]) -> Result<Grading<F>> {
    let mut layers = Vec::with_capacity(grading.len());
    for (w, vectors) in grading.layers() {
        let coords = from_i64s(lattice_coordinates(grading, w)?);
        let value = to_i64(&dot(functional, &coords))?;
        layers.push((Weight::lattice([value]), vectors.clone()));
    }
    Grading::with_options(
        grading.algebra(),
        layers,
        GradingOptions {
            magma: Some(Magma::integers()),
            projections: false,
            check: cfg!(debug_assertions),
        },
    )
}

/// Vectors of `k` positive integers summing to `n`, lexicographically
/// descending.
fn compositions(n: usize, k: usize) -> Vec<Vec<i64>> {
    if k == 0 {
        return if n == 0 { vec![Vec::new()] } else { Vec::new() };
    }
    if k == 1 {
        return if n >= 1 { vec![vec![n as i64]] } else { Vec::new() };
    }
    let mut out = Vec::new();
    for first in (1..=n.saturating_sub(k - 1)).rev() {
        for mut rest in compositions(n - first, k - 1) {
            rest.insert(0, first as i64);
            out.push(rest);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::LieAlgebra;

    fn q(n: i64) -> Rational {
        Rational::from_int(n)
    }

    fn w(coords: &[i64]) -> Weight<Rational> {
        Weight::lattice(coords.to_vec())
    }

    fn heisenberg() -> LieAlgebra<Rational> {
        LieAlgebra::builder("heis", &["X", "Y", "Z"])
            .bracket("X", "Y", [("Z", q(1))])
            .build()
            .unwrap()
    }

    fn fine_heisenberg(h: &LieAlgebra<Rational>) -> Grading<Rational> {
        Grading::new(
            h,
            [
                (w(&[1, 0]), vec![h.unit(0)]),
                (w(&[0, 2]), vec![h.unit(1)]),
                (w(&[1, 2]), vec![h.unit(2)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn universal_realization_of_heisenberg_is_the_standard_lattice() {
        let h = heisenberg();
        let u = fine_heisenberg(&h).universal_realization().unwrap();
        assert_eq!(u.magma(), &Magma::free(2));
        assert!(u.projections());
        assert_eq!(u.layer(&w(&[1, 0])).unwrap(), &[h.unit(0)]);
        assert_eq!(u.layer(&w(&[0, 1])).unwrap(), &[h.unit(1)]);
        assert_eq!(u.layer(&w(&[1, 1])).unwrap(), &[h.unit(2)]);
    }

    #[test]
    fn universal_realization_is_idempotent() {
        let h = heisenberg();
        let once = fine_heisenberg(&h).universal_realization().unwrap();
        let twice = once.universal_realization().unwrap();
        assert!(once.has_equal_layers(&twice).unwrap());
    }

    #[test]
    fn universal_realization_keeps_unwitnessed_weights_independent() {
        // X, Y, X + Y and the unrelated weight 3 + Y for W
        let a = LieAlgebra::<Rational>::builder("h_plus_1", &["X", "Y", "Z", "W"])
            .bracket("X", "Y", [("Z", q(1))])
            .build()
            .unwrap();
        let g = Grading::new(
            &a,
            [
                (Weight::Field(vec![q(1), q(0)]), vec![a.unit(0)]),
                (Weight::Field(vec![q(0), q(1)]), vec![a.unit(1)]),
                (Weight::Field(vec![q(1), q(1)]), vec![a.unit(2)]),
                (Weight::Field(vec![q(3), q(1)]), vec![a.unit(3)]),
            ],
        )
        .unwrap();
        let u = g.universal_realization().unwrap();
        assert_eq!(u.magma(), &Magma::free(3));
        assert_eq!(u.len(), 4);
    }

    fn torsion_grading() -> Grading<Rational> {
        let a = LieAlgebra::<Rational>::builder("L4_2", &["X", "Y", "Z", "W"])
            .bracket("X", "Y", [("Z", q(1))])
            .bracket("X", "Z", [("W", q(1))])
            .build()
            .unwrap();
        Grading::with_options(
            &a,
            [
                (w(&[1, 0]), vec![a.unit(0)]),
                (w(&[0, 1]), vec![a.unit(1), a.unit(3)]),
                (w(&[1, 1]), vec![a.unit(2)]),
            ],
            GradingOptions {
                magma: Some(Magma::Abelian(AbelianGroup::new(vec![2, 0]))),
                ..GradingOptions::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn torsion_survives_universal_realization() {
        let u = torsion_grading().universal_realization().unwrap();
        assert_eq!(u.magma().to_string(), "Z/2 + Z");
        assert!(!torsion_grading().has_positive_realization().unwrap());
    }

    #[test]
    fn coarsening_merges_layers_differing_by_torsion() {
        let g = torsion_grading();
        let c = g.torsion_free_coarsening().unwrap();
        assert_eq!(c.magma(), &Magma::integers());
        assert_eq!(c.len(), 2);
        let a = g.algebra();
        assert_eq!(c.layer(&w(&[0])).unwrap(), &[a.unit(0)]);
        assert_eq!(c.layer_dimension(&w(&[1])), 3);
    }

    #[test]
    fn positive_realization_of_heisenberg() {
        let h = heisenberg();
        let g = fine_heisenberg(&h);
        assert!(g.has_positive_realization().unwrap());
        for optimize in [false, true] {
            let p = g.to_positive_grading(optimize, 10_000).unwrap();
            assert_eq!(p.magma(), &Magma::integers());
            assert!(p.has_equal_layers(&g).unwrap());
            for weight in p.weights() {
                assert!(weight.as_lattice().unwrap()[0] > 0);
            }
        }
        let best = g.to_positive_grading(true, 10_000).unwrap();
        let top = best.weights().iter().map(|x| x.as_lattice().unwrap()[0]).max();
        assert_eq!(top, Some(3));
    }

    #[test]
    fn opposite_weights_block_positive_realizations() {
        let a = LieAlgebra::<Rational>::builder("h_times_h", &["A", "B", "C", "X", "Y", "Z"])
            .bracket("A", "B", [("C", q(1))])
            .bracket("X", "Y", [("Z", q(1))])
            .build()
            .unwrap();
        let g = Grading::new(
            &a,
            [
                (w(&[1, 0]), vec![a.unit(3)]),
                (w(&[-1, 0]), vec![a.unit(0)]),
                (w(&[0, 1]), vec![a.unit(4), a.unit(2)]),
                (w(&[1, 1]), vec![a.unit(5), a.unit(1)]),
            ],
        )
        .unwrap();
        assert!(!g.has_positive_realization().unwrap());
        assert!(matches!(
            g.to_positive_grading(false, 10_000),
            Err(GradingError::NoRealization { .. })
        ));
    }

    #[test]
    fn integer_realization_separates_layers() {
        let h = heisenberg();
        let g = fine_heisenberg(&h);
        let z = g.to_integer_grading(true).unwrap();
        assert_eq!(z.magma(), &Magma::integers());
        assert!(z.has_equal_layers(&g).unwrap());
        assert_eq!(z.to_integer_grading(true).unwrap(), z);
    }

    #[test]
    fn integer_realization_of_torsion_needs_permission_to_coarsen() {
        let g = torsion_grading();
        assert!(matches!(
            g.to_integer_grading(true),
            Err(GradingError::NoRealization { .. })
        ));
        let z = g.to_integer_grading(false).unwrap();
        assert_eq!(z.len(), 2);
    }

    #[test]
    fn monoid_gradings_have_no_universal_realization() {
        let h = heisenberg();
        let g = Grading::with_options(
            &h,
            [
                (w(&[1, 0]), vec![h.unit(0)]),
                (w(&[0, 1]), vec![h.unit(1)]),
                (w(&[1, 1]), vec![h.unit(2)]),
            ],
            GradingOptions {
                magma: Some(Magma::FreeMonoid { rank: 2 }),
                ..GradingOptions::default()
            },
        )
        .unwrap();
        assert!(matches!(
            g.universal_realization(),
            Err(GradingError::NotAGroup { .. })
        ));
    }

    #[test]
    fn compositions_are_listed_descending() {
        assert_eq!(compositions(3, 2), vec![vec![2, 1], vec![1, 2]]);
        assert_eq!(compositions(2, 3), Vec::<Vec<i64>>::new());
        assert_eq!(compositions(3, 3), vec![vec![1, 1, 1]]);
    }
}
