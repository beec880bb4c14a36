//! Exact linear and integer programming over the rationals.
//!
//! A dense two-phase simplex with Bland's rule; small problems only. The
//! integer layer is a depth-first branch and bound on top of it.

use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use tracing::trace;

use crate::error::{ExactError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    AtLeast,
    AtMost,
    Equal,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    pub coeffs: Vec<BigRational>,
    pub relation: Relation,
    pub rhs: BigRational,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LpOutcome {
    Optimal {
        point: Vec<BigRational>,
        value: BigRational,
    },
    Infeasible,
    Unbounded,
}

/// Free (sign-unrestricted) variables, linear constraints and an optional
/// objective to minimize.
#[derive(Debug, Clone)]
pub struct LinearProgram {
    vars: usize,
    constraints: Vec<Constraint>,
    objective: Option<Vec<BigRational>>,
}

impl LinearProgram {
    pub fn new(vars: usize) -> Self {
        Self {
            vars,
            constraints: Vec::new(),
            objective: None,
        }
    }

    pub fn vars(&self) -> usize {
        self.vars
    }

    pub fn constrain(&mut self, coeffs: Vec<BigRational>, relation: Relation, rhs: BigRational) {
        debug_assert_eq!(coeffs.len(), self.vars);
        self.constraints.push(Constraint {
            coeffs,
            relation,
            rhs,
        });
    }

    pub fn minimize(&mut self, coeffs: Vec<BigRational>) {
        debug_assert_eq!(coeffs.len(), self.vars);
        self.objective = Some(coeffs);
    }

    pub fn solve(&self) -> LpOutcome {
        let n = self.vars;
        let m = self.constraints.len();
        let slacks = self
            .constraints
            .iter()
            .filter(|c| c.relation != Relation::Equal)
            .count();
        let structural = 2 * n + slacks;
        let width = structural + m + 1;
        let rhs_col = width - 1;

        let mut tab = vec![vec![BigRational::zero(); width]; m];
        let mut slack = 2 * n;
        for (i, c) in self.constraints.iter().enumerate() {
            let row = &mut tab[i];
            for (j, a) in c.coeffs.iter().enumerate() {
                row[2 * j] = a.clone();
                row[2 * j + 1] = -a.clone();
            }
            match c.relation {
                Relation::AtLeast => {
                    row[slack] = -BigRational::one();
                    slack += 1;
                }
                Relation::AtMost => {
                    row[slack] = BigRational::one();
                    slack += 1;
                }
                Relation::Equal => {}
            }
            row[rhs_col] = c.rhs.clone();
            if c.rhs.is_negative() {
                for x in row.iter_mut() {
                    *x = -x.clone();
                }
            }
            row[structural + i] = BigRational::one();
        }
        let mut basis: Vec<usize> = (structural..structural + m).collect();

        // Phase I: drive the artificial variables to zero.
        let mut phase_one = vec![BigRational::zero(); width - 1];
        for x in &mut phase_one[structural..] {
            *x = BigRational::one();
        }
        run_simplex(&mut tab, &mut basis, &phase_one, structural + m);
        let infeasibility = basis
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b >= structural)
            .fold(BigRational::zero(), |acc, (i, _)| acc + tab[i][rhs_col].clone());
        if infeasibility.is_positive() {
            return LpOutcome::Infeasible;
        }
        for i in 0..m {
            if basis[i] < structural {
                continue;
            }
            if let Some(j) = (0..structural).find(|&j| !tab[i][j].is_zero()) {
                pivot(&mut tab, i, j);
                basis[i] = j;
            }
        }

        // Phase II over the structural columns only.
        let mut cost = vec![BigRational::zero(); width - 1];
        if let Some(objective) = &self.objective {
            for (j, c) in objective.iter().enumerate() {
                cost[2 * j] = c.clone();
                cost[2 * j + 1] = -c.clone();
            }
            if !run_simplex(&mut tab, &mut basis, &cost, structural) {
                return LpOutcome::Unbounded;
            }
        }

        let mut z = vec![BigRational::zero(); width - 1];
        for (i, &b) in basis.iter().enumerate() {
            z[b] = tab[i][rhs_col].clone();
        }
        let point: Vec<BigRational> = (0..n)
            .map(|j| z[2 * j].clone() - z[2 * j + 1].clone())
            .collect();
        let value = self.objective.as_ref().map_or_else(BigRational::zero, |c| {
            c.iter()
                .zip(&point)
                .fold(BigRational::zero(), |acc, (a, x)| acc + a * x)
        });
        LpOutcome::Optimal { point, value }
    }
}

/// Minimize `cost` over the tableau, letting only columns below `allowed`
/// enter. Returns `false` when the objective is unbounded below.
fn run_simplex(
    tab: &mut [Vec<BigRational>],
    basis: &mut [usize],
    cost: &[BigRational],
    allowed: usize,
) -> bool {
    let m = tab.len();
    let Some(rhs_col) = tab.first().map(|row| row.len() - 1) else {
        return true;
    };
    loop {
        let entering = (0..allowed).find(|&j| {
            if basis.contains(&j) {
                return false;
            }
            let reduced = (0..m).fold(cost[j].clone(), |acc, i| {
                acc - cost[basis[i]].clone() * tab[i][j].clone()
            });
            reduced.is_negative()
        });
        let Some(j) = entering else {
            return true;
        };
        let mut leaving: Option<(usize, BigRational)> = None;
        for i in 0..m {
            if !tab[i][j].is_positive() {
                continue;
            }
            let ratio = tab[i][rhs_col].clone() / tab[i][j].clone();
            let better = match &leaving {
                None => true,
                Some((k, best)) => ratio < *best || (ratio == *best && basis[i] < basis[*k]),
            };
            if better {
                leaving = Some((i, ratio));
            }
        }
        let Some((i, _)) = leaving else {
            return false;
        };
        pivot(tab, i, j);
        basis[i] = j;
    }
}

fn pivot(tab: &mut [Vec<BigRational>], r: usize, c: usize) {
    let p = tab[r][c].clone();
    for x in tab[r].iter_mut() {
        *x = x.clone() / p.clone();
    }
    let pivot_row = tab[r].clone();
    for (i, row) in tab.iter_mut().enumerate() {
        if i == r || row[c].is_zero() {
            continue;
        }
        let factor = row[c].clone();
        for (x, y) in row.iter_mut().zip(&pivot_row) {
            *x = x.clone() - factor.clone() * y.clone();
        }
    }
}

/// Integer program: a linear program whose variables must all be integral,
/// with optional linear forms that must not vanish at the solution.
///
/// A vanishing form is branched as `form <= -1` or `form >= 1`, so forms
/// must have integer coefficients.
#[derive(Debug, Clone)]
pub struct IntegerProgram {
    base: LinearProgram,
    nonzero: Vec<Vec<BigRational>>,
    max_nodes: usize,
}

impl IntegerProgram {
    pub fn new(base: LinearProgram, max_nodes: usize) -> Self {
        Self {
            base,
            nonzero: Vec::new(),
            max_nodes,
        }
    }

    pub fn require_nonzero(&mut self, form: Vec<BigRational>) {
        self.nonzero.push(form);
    }

    /// Best integral point and its objective value, `None` if no integral
    /// point is feasible.
    pub fn solve(&self) -> Result<Option<(Vec<BigRational>, BigRational)>> {
        let mut incumbent: Option<(Vec<BigRational>, BigRational)> = None;
        let mut stack: Vec<Vec<Constraint>> = vec![Vec::new()];
        let mut nodes = 0usize;
        while let Some(extra) = stack.pop() {
            nodes += 1;
            if nodes > self.max_nodes {
                return Err(ExactError::Budget {
                    description: format!("branch and bound exceeded {} nodes", self.max_nodes),
                });
            }
            let mut lp = self.base.clone();
            lp.constraints.extend(extra.iter().cloned());
            let (point, value) = match lp.solve() {
                LpOutcome::Infeasible => continue,
                LpOutcome::Unbounded => {
                    return Err(ExactError::Unbounded {
                        description: "integer program relaxation has no finite optimum"
                            .to_string(),
                    });
                }
                LpOutcome::Optimal { point, value } => (point, value),
            };
            if incumbent.as_ref().is_some_and(|(_, best)| value >= *best) {
                continue;
            }
            let n = self.base.vars;
            if let Some(j) = point.iter().position(|x| !x.is_integer()) {
                let floor = point[j].floor();
                let ceil = point[j].ceil();
                trace!(var = j, value = %point[j], "branching on fractional variable");
                stack.push(with_bound(&extra, unit_form(n, j), Relation::AtMost, floor));
                stack.push(with_bound(&extra, unit_form(n, j), Relation::AtLeast, ceil));
                continue;
            }
            let vanishing = self.nonzero.iter().find(|form| {
                form.iter()
                    .zip(&point)
                    .fold(BigRational::zero(), |acc, (a, x)| acc + a * x)
                    .is_zero()
            });
            if let Some(form) = vanishing {
                stack.push(with_bound(
                    &extra,
                    form.clone(),
                    Relation::AtMost,
                    -BigRational::one(),
                ));
                stack.push(with_bound(
                    &extra,
                    form.clone(),
                    Relation::AtLeast,
                    BigRational::one(),
                ));
                continue;
            }
            incumbent = Some((point, value));
        }
        trace!(nodes, "branch and bound finished");
        Ok(incumbent)
    }
}

fn unit_form(n: usize, j: usize) -> Vec<BigRational> {
    let mut form = vec![BigRational::zero(); n];
    form[j] = BigRational::one();
    form
}

fn with_bound(
    extra: &[Constraint],
    coeffs: Vec<BigRational>,
    relation: Relation,
    rhs: BigRational,
) -> Vec<Constraint> {
    let mut out = extra.to_vec();
    out.push(Constraint {
        coeffs,
        relation,
        rhs,
    });
    out
}

/// Whether the origin lies in the convex hull of `points`.
pub fn convex_hull_contains_origin(points: &[Vec<BigRational>]) -> bool {
    let Some(dim) = points.first().map(|p| p.len()) else {
        return false;
    };
    let k = points.len();
    let mut lp = LinearProgram::new(k);
    for i in 0..k {
        lp.constrain(unit_form(k, i), Relation::AtLeast, BigRational::zero());
    }
    lp.constrain(vec![BigRational::one(); k], Relation::Equal, BigRational::one());
    for d in 0..dim {
        let row = points.iter().map(|p| p[d].clone()).collect();
        lp.constrain(row, Relation::Equal, BigRational::zero());
    }
    matches!(lp.solve(), LpOutcome::Optimal { .. })
}

/// A functional `a` with `a . p >= 1` for every point, if one exists.
pub fn positive_functional(points: &[Vec<BigRational>]) -> Option<Vec<BigRational>> {
    let dim = points.first().map_or(0, |p| p.len());
    let mut lp = LinearProgram::new(dim);
    for p in points {
        lp.constrain(p.clone(), Relation::AtLeast, BigRational::one());
    }
    match lp.solve() {
        LpOutcome::Optimal { point, .. } => Some(point),
        _ => None,
    }
}

/// Scale a rational vector to the primitive integer vector on its ray.
pub fn primitive_integer_vector(v: &[BigRational]) -> Vec<num_bigint::BigInt> {
    let denominators = v
        .iter()
        .fold(num_bigint::BigInt::one(), |acc, x| acc.lcm(x.denom()));
    let scaled: Vec<num_bigint::BigInt> = v
        .iter()
        .map(|x| (x * BigRational::from_integer(denominators.clone())).to_integer())
        .collect();
    let g = scaled
        .iter()
        .fold(num_bigint::BigInt::zero(), |acc, x| acc.gcd(x));
    if g.is_zero() {
        return scaled;
    }
    scaled.into_iter().map(|x| x / &g).collect()
}
