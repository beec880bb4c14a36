//! Finite-dimensional Lie algebras given by structure constants.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

use nilgrade_exact::{ExactField, Frame, Matrix, Subspace};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canonical::{ContentHash, intern};
use crate::error::{GradingError, Result};

/// A Lie algebra with a named basis `X_0 .. X_{n-1}` and structure
/// constants `[X_i, X_j] = sum_k c[i][j][k] X_k`.
///
/// Cheap to clone; equal structure constants share one allocation.
pub struct LieAlgebra<F: ExactField> {
    inner: Arc<AlgebraInner<F>>,
}

struct AlgebraInner<F: ExactField> {
    name: String,
    basis: Vec<String>,
    /// Index `(i * n + j) * n + k`.
    constants: Vec<F>,
    key: ContentHash,
    derivations: OnceLock<Vec<Matrix<F>>>,
    lower_central_series: OnceLock<Vec<Subspace<F>>>,
}

impl<F: ExactField> Clone for LieAlgebra<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ExactField> PartialEq for LieAlgebra<F> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.key == other.inner.key
    }
}

impl<F: ExactField> Eq for LieAlgebra<F> {}

impl<F: ExactField> fmt::Debug for LieAlgebra<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LieAlgebra")
            .field("name", &self.inner.name)
            .field("basis", &self.inner.basis)
            .field("key", &self.inner.key.short())
            .finish()
    }
}

impl<F: ExactField> fmt::Display for LieAlgebra<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lie algebra {} on {} generators ({})",
            self.inner.name,
            self.dimension(),
            self.inner.basis.join(", ")
        )
    }
}

impl<F: ExactField> LieAlgebra<F> {
    pub fn builder(name: impl Into<String>, basis: &[&str]) -> AlgebraBuilder<F> {
        AlgebraBuilder {
            name: name.into(),
            basis: basis.iter().map(|s| s.to_string()).collect(),
            brackets: Vec::new(),
        }
    }

    /// The abelian algebra with basis `X1 .. Xn`.
    pub fn abelian(name: impl Into<String>, n: usize) -> Result<Self> {
        let basis = (1..=n).map(|i| format!("X{i}")).collect();
        Self::from_structure_constants(name, basis, vec![F::zero(); n * n * n])
    }

    /// Build from a dense constant tensor, checking antisymmetry and the
    /// Jacobi identity.
    pub fn from_structure_constants(
        name: impl Into<String>,
        basis: Vec<String>,
        constants: Vec<F>,
    ) -> Result<Self> {
        let name = name.into();
        let n = basis.len();
        if constants.len() != n * n * n {
            return Err(GradingError::InvalidAlgebra {
                description: format!(
                    "{} structure constants for dimension {n}",
                    constants.len()
                ),
            });
        }
        let distinct: BTreeSet<&String> = basis.iter().collect();
        if distinct.len() != n || basis.iter().any(|b| b.is_empty()) {
            return Err(GradingError::InvalidAlgebra {
                description: format!("basis names must be distinct and nonempty: {basis:?}"),
            });
        }
        let c = |i: usize, j: usize, k: usize| &constants[(i * n + j) * n + k];
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    if c(i, j, k).clone() != -c(j, i, k).clone() {
                        return Err(GradingError::InvalidAlgebra {
                            description: format!(
                                "[{}, {}] is not antisymmetric",
                                basis[i], basis[j]
                            ),
                        });
                    }
                }
            }
        }
        for i in 0..n {
            for j in i + 1..n {
                for l in j + 1..n {
                    for m in 0..n {
                        let mut total = F::zero();
                        for p in 0..n {
                            total = total
                                + c(i, j, p).clone() * c(p, l, m).clone()
                                + c(j, l, p).clone() * c(p, i, m).clone()
                                + c(l, i, p).clone() * c(p, j, m).clone();
                        }
                        if !total.is_zero() {
                            return Err(GradingError::InvalidAlgebra {
                                description: format!(
                                    "Jacobi identity fails for {}, {}, {}",
                                    basis[i], basis[j], basis[l]
                                ),
                            });
                        }
                    }
                }
            }
        }

        let mut builder = ContentHash::builder()
            .field("name", &name)
            .field_list("basis", &basis);
        for (idx, value) in constants.iter().enumerate() {
            if !value.is_zero() {
                builder = builder.field(&format!("c{idx}"), &value.to_string());
            }
        }
        let key = builder.finish();
        let inner = intern(
            &key,
            AlgebraInner {
                name,
                basis,
                constants,
                key: key.clone(),
                derivations: OnceLock::new(),
                lower_central_series: OnceLock::new(),
            },
        );
        Ok(Self { inner })
    }

    pub fn from_spec(spec: &AlgebraSpec) -> Result<Self> {
        let names: Vec<&str> = spec.basis.iter().map(|s| s.as_str()).collect();
        let mut builder = Self::builder(spec.name.clone(), &names);
        for bracket in &spec.brackets {
            let mut terms = Vec::with_capacity(bracket.terms.len());
            for (target, coefficient) in &bracket.terms {
                terms.push((target.clone(), F::parse_exact(coefficient)?));
            }
            builder = builder.bracket_owned(bracket.left.clone(), bracket.right.clone(), terms);
        }
        builder.build()
    }

    pub fn to_spec(&self) -> AlgebraSpec {
        let n = self.dimension();
        let mut brackets = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                let terms: BTreeMap<String, String> = self
                    .basis_bracket(i, j)
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| !c.is_zero())
                    .map(|(k, c)| (self.inner.basis[k].clone(), c.to_string()))
                    .collect();
                if !terms.is_empty() {
                    brackets.push(BracketSpec {
                        left: self.inner.basis[i].clone(),
                        right: self.inner.basis[j].clone(),
                        terms,
                    });
                }
            }
        }
        AlgebraSpec {
            name: self.inner.name.clone(),
            basis: self.inner.basis.clone(),
            brackets,
        }
    }

    /// The same algebra over another field, through an embedding of the
    /// structure constants.
    pub fn map_scalars<G: ExactField>(&self, embed: impl Fn(&F) -> G) -> Result<LieAlgebra<G>> {
        LieAlgebra::from_structure_constants(
            self.inner.name.clone(),
            self.inner.basis.clone(),
            self.inner.constants.iter().map(embed).collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn dimension(&self) -> usize {
        self.inner.basis.len()
    }

    pub fn basis_names(&self) -> &[String] {
        &self.inner.basis
    }

    pub fn key(&self) -> &ContentHash {
        &self.inner.key
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.inner.basis.iter().position(|b| b == name)
    }

    /// The basis vector `X_i` as a coordinate vector.
    pub fn unit(&self, i: usize) -> Vec<F> {
        nilgrade_exact::subspace::unit_vector(self.dimension(), i)
    }

    /// The coordinate vector of a named basis element.
    pub fn element(&self, name: &str) -> Option<Vec<F>> {
        self.index_of(name).map(|i| self.unit(i))
    }

    pub fn structure_coefficient(&self, i: usize, j: usize, k: usize) -> &F {
        let n = self.dimension();
        &self.inner.constants[(i * n + j) * n + k]
    }

    /// `[X_i, X_j]` in coordinates.
    pub fn basis_bracket(&self, i: usize, j: usize) -> &[F] {
        let n = self.dimension();
        let start = (i * n + j) * n;
        &self.inner.constants[start..start + n]
    }

    pub fn is_abelian(&self) -> bool {
        self.inner.constants.iter().all(|c| c.is_zero())
    }

    pub fn bracket(&self, x: &[F], y: &[F]) -> Vec<F> {
        let n = self.dimension();
        let mut out = vec![F::zero(); n];
        for (i, xi) in x.iter().enumerate() {
            if xi.is_zero() {
                continue;
            }
            for (j, yj) in y.iter().enumerate() {
                if yj.is_zero() {
                    continue;
                }
                let scale = xi.clone() * yj.clone();
                for (k, c) in self.basis_bracket(i, j).iter().enumerate() {
                    if !c.is_zero() {
                        out[k] = out[k].clone() + scale.clone() * c.clone();
                    }
                }
            }
        }
        out
    }

    /// Matrix of `ad_x = [x, -]`.
    pub fn ad(&self, x: &[F]) -> Matrix<F> {
        let n = self.dimension();
        let mut m = Matrix::zeros(n, n);
        for j in 0..n {
            let image = self.bracket(x, &self.unit(j));
            for (i, value) in image.into_iter().enumerate() {
                m.set(i, j, value);
            }
        }
        m
    }

    /// `X1 + 2*X3`, `-X2`, `1/2*X1 - X2`, or `0`.
    pub fn format_element(&self, v: &[F]) -> String {
        let mut out = String::new();
        for (i, c) in v.iter().enumerate() {
            if c.is_zero() {
                continue;
            }
            let negative = c < &F::zero();
            let magnitude = if negative { -c.clone() } else { c.clone() };
            if out.is_empty() {
                if negative {
                    out.push('-');
                }
            } else {
                out.push_str(if negative { " - " } else { " + " });
            }
            if magnitude.is_one() {
                out.push_str(&self.inner.basis[i]);
            } else {
                out.push_str(&format!("{magnitude}*{}", self.inner.basis[i]));
            }
        }
        if out.is_empty() {
            out.push('0');
        }
        out
    }

    /// `(X1, X2 + X3)`.
    pub fn format_vectors(&self, vectors: &[Vec<F>]) -> String {
        let parts: Vec<String> = vectors.iter().map(|v| self.format_element(v)).collect();
        format!("({})", parts.join(", "))
    }

    /// A basis of the derivation algebra: matrices `D` (columns are images
    /// of basis vectors) with `D[x, y] = [Dx, y] + [x, Dy]`.
    pub fn derivations_basis(&self) -> Result<&[Matrix<F>]> {
        if let Some(cached) = self.inner.derivations.get() {
            return Ok(cached);
        }
        let computed = self.compute_derivations()?;
        Ok(self.inner.derivations.get_or_init(|| computed))
    }

    fn compute_derivations(&self) -> Result<Vec<Matrix<F>>> {
        let n = self.dimension();
        let var = |a: usize, b: usize| a * n + b;
        let mut rows = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                for k in 0..n {
                    let mut row = vec![F::zero(); n * n];
                    for l in 0..n {
                        let c = self.structure_coefficient(i, j, l);
                        if !c.is_zero() {
                            row[var(k, l)] = row[var(k, l)].clone() + c.clone();
                        }
                    }
                    for m in 0..n {
                        let c = self.structure_coefficient(m, j, k);
                        if !c.is_zero() {
                            row[var(m, i)] = row[var(m, i)].clone() - c.clone();
                        }
                        let c = self.structure_coefficient(i, m, k);
                        if !c.is_zero() {
                            row[var(m, j)] = row[var(m, j)].clone() - c.clone();
                        }
                    }
                    if row.iter().any(|x| !x.is_zero()) {
                        rows.push(row);
                    }
                }
            }
        }
        let system = Matrix::from_rows(n * n, rows)?;
        let mut basis = Vec::new();
        for v in system.kernel() {
            let rows = v.chunks(n.max(1)).map(|r| r.to_vec()).collect();
            basis.push(Matrix::from_rows(n, rows)?);
        }
        debug!(algebra = %self.name(), dimension = basis.len(), "derivation algebra");
        Ok(basis)
    }

    /// `g = g^1 ⊇ g^2 = [g, g] ⊇ g^3 = [g, g^2] ⊇ ...`, ending at the first
    /// repeated term.
    pub fn lower_central_series(&self) -> Result<&[Subspace<F>]> {
        if let Some(cached) = self.inner.lower_central_series.get() {
            return Ok(cached);
        }
        let n = self.dimension();
        let mut series = vec![Subspace::full(n)];
        loop {
            let Some(last) = series.last() else { break };
            let mut images = Vec::new();
            for i in 0..n {
                for v in last.basis() {
                    let w = self.bracket(&self.unit(i), v);
                    if w.iter().any(|x| !x.is_zero()) {
                        images.push(w);
                    }
                }
            }
            let next = Subspace::span(n, &images)?;
            if &next == last {
                break;
            }
            let done = next.is_zero();
            series.push(next);
            if done {
                break;
            }
        }
        Ok(self.inner.lower_central_series.get_or_init(|| series))
    }

    pub fn is_nilpotent(&self) -> Result<bool> {
        Ok(self
            .lower_central_series()?
            .last()
            .is_some_and(|s| s.is_zero()))
    }

    /// The same algebra written in another basis, with new names.
    pub fn in_new_basis(
        &self,
        name: impl Into<String>,
        basis: &[Vec<F>],
        names: Vec<String>,
    ) -> Result<Self> {
        let n = self.dimension();
        if basis.len() != n || names.len() != n {
            return Err(GradingError::RankMismatch {
                description: format!(
                    "{} vectors and {} names for an algebra of dimension {n}",
                    basis.len(),
                    names.len()
                ),
            });
        }
        let frame = Frame::new(n, basis.to_vec()).map_err(|_| GradingError::InvalidAlgebra {
            description: format!("{} is not a basis", self.format_vectors(basis)),
        })?;
        let mut constants = vec![F::zero(); n * n * n];
        for i in 0..n {
            for j in 0..n {
                let image = self.bracket(&basis[i], &basis[j]);
                let coords = frame.coordinate_map().apply(&image);
                for (k, c) in coords.into_iter().enumerate() {
                    constants[(i * n + j) * n + k] = c;
                }
            }
        }
        Self::from_structure_constants(name, names, constants)
    }
}

/// Incremental construction by brackets of named basis elements.
/// Unspecified brackets vanish; `[X_j, X_i]` follows by antisymmetry.
pub struct AlgebraBuilder<F> {
    name: String,
    basis: Vec<String>,
    brackets: Vec<(String, String, Vec<(String, F)>)>,
}

impl<F: ExactField> AlgebraBuilder<F> {
    pub fn bracket<'a>(
        self,
        left: &str,
        right: &str,
        terms: impl IntoIterator<Item = (&'a str, F)>,
    ) -> Self {
        let terms = terms.into_iter().map(|(k, c)| (k.to_string(), c)).collect();
        self.bracket_owned(left.to_string(), right.to_string(), terms)
    }

    pub fn bracket_owned(mut self, left: String, right: String, terms: Vec<(String, F)>) -> Self {
        self.brackets.push((left, right, terms));
        self
    }

    pub fn build(self) -> Result<LieAlgebra<F>> {
        let n = self.basis.len();
        let index = |name: &str| {
            self.basis
                .iter()
                .position(|b| b == name)
                .ok_or_else(|| GradingError::InvalidAlgebra {
                    description: format!("unknown basis element {name}"),
                })
        };
        let mut constants = vec![F::zero(); n * n * n];
        let mut seen = BTreeSet::new();
        for (left, right, terms) in &self.brackets {
            let i = index(left.as_str())?;
            let j = index(right.as_str())?;
            let pair = (i.min(j), i.max(j));
            if i == j || !seen.insert(pair) {
                return Err(GradingError::InvalidAlgebra {
                    description: format!("bracket [{left}, {right}] given twice or on a diagonal"),
                });
            }
            for (target, c) in terms {
                let k = index(target.as_str())?;
                let forward = (i * n + j) * n + k;
                let backward = (j * n + i) * n + k;
                constants[forward] = constants[forward].clone() + c.clone();
                constants[backward] = constants[backward].clone() - c.clone();
            }
        }
        LieAlgebra::from_structure_constants(self.name, self.basis, constants)
    }
}

/// Serialized form of an algebra: `{ "name", "basis", "brackets" }` with
/// coefficients as exact strings such as `"-1/2"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgebraSpec {
    pub name: String,
    pub basis: Vec<String>,
    #[serde(default)]
    pub brackets: Vec<BracketSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSpec {
    pub left: String,
    pub right: String,
    pub terms: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use nilgrade_exact::Rational;

    fn q(n: i64) -> Rational {
        Rational::from_int(n)
    }

    fn heisenberg() -> LieAlgebra<Rational> {
        LieAlgebra::builder("heis", &["X", "Y", "Z"])
            .bracket("X", "Y", [("Z", q(1))])
            .build()
            .unwrap()
    }

    #[test]
    fn brackets_are_antisymmetric() {
        let h = heisenberg();
        let x = h.element("X").unwrap();
        let y = h.element("Y").unwrap();
        assert_eq!(h.format_element(&h.bracket(&x, &y)), "Z");
        assert_eq!(h.format_element(&h.bracket(&y, &x)), "-Z");
        assert_eq!(h.format_element(&h.bracket(&x, &x)), "0");
    }

    #[test]
    fn jacobi_violations_are_rejected() {
        let err = LieAlgebra::<Rational>::builder("bad", &["A", "B", "C"])
            .bracket("A", "B", [("C", q(1))])
            .bracket("B", "C", [("A", q(1))])
            .bracket("A", "C", [("C", q(1))])
            .build()
            .unwrap_err();
        assert!(matches!(err, GradingError::InvalidAlgebra { .. }));
    }

    #[test]
    fn heisenberg_derivations_have_dimension_six() {
        // gl_2 acting on span(X, Y) plus the three maps into the center
        assert_eq!(heisenberg().derivations_basis().unwrap().len(), 6);
    }

    #[test]
    fn lower_central_series_of_heisenberg() {
        let h = heisenberg();
        let series = h.lower_central_series().unwrap();
        let dims: Vec<usize> = series.iter().map(|s| s.dim()).collect();
        assert_eq!(dims, vec![3, 1, 0]);
        assert!(h.is_nilpotent().unwrap());
    }

    #[test]
    fn non_nilpotent_algebra_is_detected() {
        let a = LieAlgebra::<Rational>::builder("aff", &["X", "Y"])
            .bracket("X", "Y", [("Y", q(1))])
            .build()
            .unwrap();
        assert!(!a.is_nilpotent().unwrap());
    }

    #[test]
    fn equal_constants_share_identity() {
        assert_eq!(heisenberg(), heisenberg());
        assert_eq!(heisenberg().key(), heisenberg().key());
    }

    #[test]
    fn change_of_basis_rescales_constants() {
        let h = heisenberg();
        let basis = vec![h.unit(0), h.unit(1), vec![q(0), q(0), q(2)]];
        let k = h
            .in_new_basis("heis2", &basis, vec!["A".into(), "B".into(), "C".into()])
            .unwrap();
        let a = k.element("A").unwrap();
        let b = k.element("B").unwrap();
        assert_eq!(k.format_element(&k.bracket(&a, &b)), "1/2*C");
    }

    #[test]
    fn spec_round_trip_preserves_structure() {
        let h = heisenberg();
        let spec = h.to_spec();
        let json = serde_json::to_string(&spec).unwrap();
        let parsed: AlgebraSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(LieAlgebra::<Rational>::from_spec(&parsed).unwrap(), h);
    }
}
