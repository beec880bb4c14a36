//! Gradings: direct sum decompositions compatible with the bracket.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use nilgrade_exact::{ExactField, Matrix, Subspace};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::algebra::LieAlgebra;
use crate::canonical::{ContentHash, intern};
use crate::error::{GradingError, Result};
use crate::magma::{Magma, Weight};
use crate::poset::WeightPoset;

/// Construction options. The default infers the magma, marks the grading
/// as not derived from a parent, and checks both grading invariants.
#[derive(Debug, Clone)]
pub struct GradingOptions {
    pub magma: Option<Magma>,
    pub projections: bool,
    pub check: bool,
}

impl Default for GradingOptions {
    fn default() -> Self {
        Self {
            magma: None,
            projections: false,
            check: true,
        }
    }
}

/// A grading `g = ⊕ g_a` of a Lie algebra by a magma: layers span
/// independent subspaces, sum to the whole algebra, and
/// `[g_a, g_b] ⊆ g_{a+b}`.
///
/// Immutable and shared; gradings with equal canonical data are the same
/// allocation, so derived gradings computed once are reused.
pub struct Grading<F: ExactField> {
    pub(crate) inner: Arc<GradingInner<F>>,
}

pub(crate) struct GradingInner<F: ExactField> {
    algebra: LieAlgebra<F>,
    magma: Magma,
    layers: BTreeMap<Weight<F>, Vec<Vec<F>>>,
    spaces: BTreeMap<Weight<F>, Subspace<F>>,
    projections: bool,
    key: ContentHash,
    poset: Option<WeightPoset<F>>,
    order: Vec<Weight<F>>,
    pub(crate) universal: OnceLock<Grading<F>>,
    pub(crate) coarsening: OnceLock<Grading<F>>,
}

impl<F: ExactField> Clone for Grading<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ExactField> PartialEq for Grading<F> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.key == other.inner.key
    }
}

impl<F: ExactField> Eq for Grading<F> {}

impl<F: ExactField> std::hash::Hash for Grading<F> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.key.hash(state);
    }
}

impl<F: ExactField> fmt::Debug for Grading<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grading")
            .field("algebra", &self.inner.algebra.name())
            .field("magma", &self.inner.magma)
            .field("weights", &self.inner.order)
            .field("key", &self.inner.key.short())
            .finish()
    }
}

impl<F: ExactField> Grading<F> {
    /// A grading with an inferred magma, checked.
    pub fn new(
        algebra: &LieAlgebra<F>,
        layers: impl IntoIterator<Item = (Weight<F>, Vec<Vec<F>>)>,
    ) -> Result<Self> {
        Self::with_options(algebra, layers, GradingOptions::default())
    }

    pub fn with_options(
        algebra: &LieAlgebra<F>,
        layers: impl IntoIterator<Item = (Weight<F>, Vec<Vec<F>>)>,
        options: GradingOptions,
    ) -> Result<Self> {
        let raw: Vec<(Weight<F>, Vec<Vec<F>>)> = layers.into_iter().collect();
        if raw.is_empty() {
            return Err(GradingError::MalformedGrading {
                description: "a grading needs at least one layer".to_string(),
            });
        }
        let magma = match options.magma {
            Some(m) => m,
            None => Magma::infer(raw.iter().map(|(w, _)| w))?,
        };

        let n = algebra.dimension();
        let mut merged: BTreeMap<Weight<F>, Vec<Vec<F>>> = BTreeMap::new();
        for (weight, vectors) in raw {
            if let Some(bad) = vectors.iter().find(|v| v.len() != n) {
                return Err(GradingError::MalformedGrading {
                    description: format!(
                        "layer {weight} holds a vector of length {} in dimension {n}",
                        bad.len()
                    ),
                });
            }
            let weight = magma.coerce(&weight)?;
            merged.entry(weight).or_default().extend(vectors);
        }
        merged.retain(|_, vectors| !vectors.is_empty());
        for vectors in merged.values_mut() {
            vectors.sort_by(|a, b| b.cmp(a));
        }

        let mut spaces = BTreeMap::new();
        for (weight, vectors) in &merged {
            spaces.insert(weight.clone(), Subspace::span(n, vectors)?);
        }

        if options.check {
            check_direct_sum(algebra, &merged)?;
            check_bracket_closure(algebra, &magma, &merged, &spaces)?;
        }

        let key = canonical_key(algebra, &magma, options.projections, &merged);
        let weights: Vec<Weight<F>> = merged.keys().cloned().collect();
        let poset = WeightPoset::build(&weights, &magma);
        let order = match &poset {
            Some(p) => p.order().to_vec(),
            None => weights,
        };
        trace!(key = %key.short(), layers = order.len(), "grading constructed");

        let inner = intern(
            &key,
            GradingInner {
                algebra: algebra.clone(),
                magma,
                layers: merged,
                spaces,
                projections: options.projections,
                key: key.clone(),
                poset,
                order,
                universal: OnceLock::new(),
                coarsening: OnceLock::new(),
            },
        );
        Ok(Self { inner })
    }

    pub fn algebra(&self) -> &LieAlgebra<F> {
        &self.inner.algebra
    }

    pub fn magma(&self) -> &Magma {
        &self.inner.magma
    }

    /// Whether this grading was produced as a quotient or pushforward of
    /// another grading.
    pub fn projections(&self) -> bool {
        self.inner.projections
    }

    pub fn key(&self) -> &ContentHash {
        &self.inner.key
    }

    /// Weights in iteration order: a linear extension of the weight poset
    /// when there is one, otherwise sorted.
    pub fn weights(&self) -> &[Weight<F>] {
        &self.inner.order
    }

    pub fn layers(&self) -> &BTreeMap<Weight<F>, Vec<Vec<F>>> {
        &self.inner.layers
    }

    pub fn poset(&self) -> Option<&WeightPoset<F>> {
        self.inner.poset.as_ref()
    }

    pub fn len(&self) -> usize {
        self.inner.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.layers.is_empty()
    }

    /// The ordered basis of the layer at `weight`; empty when the layer is
    /// zero.
    pub fn layer(&self, weight: &Weight<F>) -> Result<&[Vec<F>]> {
        let weight = self.inner.magma.coerce(weight)?;
        Ok(self
            .inner
            .layers
            .get(&weight)
            .map(|v| v.as_slice())
            .unwrap_or(&[]))
    }

    pub fn layer_space(&self, weight: &Weight<F>) -> Option<&Subspace<F>> {
        let weight = self.inner.magma.coerce(weight).ok()?;
        self.inner.spaces.get(&weight)
    }

    /// Whether `weight` carries a nonzero layer.
    pub fn contains(&self, weight: &Weight<F>) -> bool {
        self.inner
            .magma
            .coerce(weight)
            .is_ok_and(|w| self.inner.layers.contains_key(&w))
    }

    pub fn layer_dimension(&self, weight: &Weight<F>) -> usize {
        self.layer_space(weight).map_or(0, |s| s.dim())
    }

    /// The weight of the unique layer containing `v`.
    pub fn get_layer(&self, v: &[F]) -> Result<Weight<F>> {
        let not_homogeneous = || GradingError::NotHomogeneous {
            element: self.inner.algebra.format_element(v),
        };
        if v.iter().all(|x| x.is_zero()) {
            return Err(not_homogeneous());
        }
        self.inner
            .order
            .iter()
            .find(|w| self.inner.spaces[*w].contains(v))
            .cloned()
            .ok_or_else(not_homogeneous)
    }

    /// A subset of weights generating all others under sums of nonzero
    /// layers: the minimal elements of the weight poset, or every weight
    /// when there is no poset.
    pub fn generating_weights(&self) -> Vec<Weight<F>> {
        match &self.inner.poset {
            Some(poset) => {
                let mut minimal = poset.minimal_elements();
                minimal.sort();
                minimal
            }
            None => self.inner.layers.keys().cloned().collect(),
        }
    }

    /// Whether every layer of `self` lies inside some layer of `other`.
    pub fn is_refinement(&self, other: &Grading<F>) -> Result<bool> {
        if self.inner.algebra != other.inner.algebra {
            return Err(GradingError::CrossAlgebra);
        }
        Ok(self.inner.spaces.values().all(|s| {
            other
                .inner
                .spaces
                .values()
                .any(|t| s.is_subspace_of(t))
        }))
    }

    /// Whether both gradings have the same layers as subspaces, whatever
    /// their weights and layer bases.
    pub fn has_equal_layers(&self, other: &Grading<F>) -> Result<bool> {
        Ok(self.is_refinement(other)? && other.is_refinement(self)?)
    }

    /// The concatenated layer bases in iteration order.
    pub fn adapted_basis(&self) -> Vec<Vec<F>> {
        self.inner
            .order
            .iter()
            .flat_map(|w| self.inner.layers[w].iter().cloned())
            .collect()
    }

    /// The algebra rewritten in the adapted basis. Without `names`, the
    /// basis keeps the original element names.
    pub fn lie_algebra_in_adapted_basis(&self, names: Option<Vec<String>>) -> Result<LieAlgebra<F>> {
        let algebra = &self.inner.algebra;
        let names = names.unwrap_or_else(|| algebra.basis_names().to_vec());
        algebra.in_new_basis(
            format!("{} (adapted)", algebra.name()),
            &self.adapted_basis(),
            names,
        )
    }

    /// The linear map that projects onto the layer at `weight` along the
    /// other layers.
    pub fn projection(&self, weight: &Weight<F>) -> Result<Matrix<F>> {
        let n = self.inner.algebra.dimension();
        let basis = self.adapted_basis();
        let b = Matrix::from_columns(n, &basis)?;
        let b_inv = b.inverse()?;
        let mut keep = Matrix::zeros(n, n);
        let mut offset = 0;
        let weight = self.inner.magma.coerce(weight)?;
        for w in &self.inner.order {
            let len = self.inner.layers[w].len();
            if *w == weight {
                for i in offset..offset + len {
                    keep.set(i, i, F::one());
                }
            }
            offset += len;
        }
        Ok(b.mul(&keep)?.mul(&b_inv)?)
    }

    pub fn summary(&self) -> GradingSummary {
        let algebra = &self.inner.algebra;
        GradingSummary {
            algebra: algebra.name().to_string(),
            magma: self.inner.magma.to_string(),
            projections: self.inner.projections,
            key: self.inner.key.clone(),
            layers: self
                .inner
                .order
                .iter()
                .map(|w| LayerSummary {
                    weight: w.to_string(),
                    basis: self.inner.layers[w]
                        .iter()
                        .map(|v| algebra.format_element(v))
                        .collect(),
                })
                .collect(),
        }
    }
}

impl<F: ExactField> fmt::Display for Grading<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let algebra = &self.inner.algebra;
        write!(
            f,
            "Grading over {} of {} with nonzero layers",
            self.inner.magma, algebra
        )?;
        for w in &self.inner.order {
            write!(
                f,
                "\n  {} : {}",
                w,
                algebra.format_vectors(&self.inner.layers[w])
            )?;
        }
        Ok(())
    }
}

/// Serializable rendering of a grading for the presentation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingSummary {
    pub algebra: String,
    pub magma: String,
    pub projections: bool,
    pub key: ContentHash,
    pub layers: Vec<LayerSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSummary {
    pub weight: String,
    pub basis: Vec<String>,
}

fn check_direct_sum<F: ExactField>(
    algebra: &LieAlgebra<F>,
    layers: &BTreeMap<Weight<F>, Vec<Vec<F>>>,
) -> Result<()> {
    let n = algebra.dimension();
    let all: Vec<Vec<F>> = layers.values().flatten().cloned().collect();
    if all.len() != n {
        return Err(GradingError::DirectSum {
            description: format!(
                "{} layer vectors {} in dimension {n}",
                all.len(),
                algebra.format_vectors(&all)
            ),
        });
    }
    let rank = Matrix::from_rows(n, all.clone())?.rank();
    if rank != n {
        return Err(GradingError::DirectSum {
            description: format!(
                "the vectors {} span a subspace of dimension {rank}, not {n}",
                algebra.format_vectors(&all)
            ),
        });
    }
    Ok(())
}

fn check_bracket_closure<F: ExactField>(
    algebra: &LieAlgebra<F>,
    magma: &Magma,
    layers: &BTreeMap<Weight<F>, Vec<Vec<F>>>,
    spaces: &BTreeMap<Weight<F>, Subspace<F>>,
) -> Result<()> {
    for (a, la) in layers {
        for (b, lb) in layers {
            if b < a {
                continue;
            }
            let sum = magma.add(a, b)?;
            let target = spaces.get(&sum);
            for x in la {
                for y in lb {
                    let z = algebra.bracket(x, y);
                    if z.iter().all(|c| c.is_zero()) {
                        continue;
                    }
                    if !target.is_some_and(|t| t.contains(&z)) {
                        return Err(GradingError::BracketClosure {
                            description: format!(
                                "[{}, {}] = {} is not in the layer {sum} (layers {a} and {b})",
                                algebra.format_element(x),
                                algebra.format_element(y),
                                algebra.format_element(&z)
                            ),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

fn canonical_key<F: ExactField>(
    algebra: &LieAlgebra<F>,
    magma: &Magma,
    projections: bool,
    layers: &BTreeMap<Weight<F>, Vec<Vec<F>>>,
) -> ContentHash {
    let mut builder = ContentHash::builder()
        .field("algebra", &algebra.key().0)
        .field("magma", &format!("{magma:?}"))
        .field_bool("projections", projections);
    for (weight, vectors) in layers {
        builder = builder.field("weight", &format!("{weight:?}"));
        for v in vectors {
            builder = builder.field_list("vector", v);
        }
    }
    builder.finish()
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

    fn w(coords: &[i64]) -> Weight<Rational> {
        Weight::lattice(coords.to_vec())
    }

    fn v(coords: &[i64]) -> Vec<Rational> {
        coords.iter().map(|&c| q(c)).collect()
    }

    fn stratification_of(h: &LieAlgebra<Rational>) -> Grading<Rational> {
        Grading::new(
            h,
            [
                (w(&[1]), vec![v(&[1, 0, 0]), v(&[0, 1, 0])]),
                (w(&[2]), vec![v(&[0, 0, 1])]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn construction_infers_integers() {
        let g = stratification_of(&heisenberg());
        assert_eq!(g.magma(), &Magma::integers());
        assert_eq!(g.weights(), &[w(&[1]), w(&[2])]);
        assert_eq!(g.layer(&w(&[1])).unwrap().len(), 2);
        assert!(g.layer(&w(&[5])).unwrap().is_empty());
        assert!(g.contains(&w(&[2])));
        assert!(!g.contains(&w(&[3])));
    }

    #[test]
    fn equal_data_is_interned() {
        let h = heisenberg();
        let a = stratification_of(&h);
        let b = Grading::new(
            &h,
            [
                (w(&[2]), vec![v(&[0, 0, 1])]),
                (w(&[1]), vec![v(&[0, 1, 0]), v(&[1, 0, 0])]),
            ],
        )
        .unwrap();
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a.inner, &b.inner));
    }

    #[test]
    fn missing_vectors_break_the_direct_sum() {
        let h = heisenberg();
        let err = Grading::new(&h, [(w(&[1]), vec![v(&[1, 0, 0]), v(&[0, 1, 0])])]).unwrap_err();
        assert!(matches!(err, GradingError::DirectSum { .. }));
        let err = Grading::new(
            &h,
            [
                (w(&[1]), vec![v(&[1, 0, 0]), v(&[1, 0, 0])]),
                (w(&[2]), vec![v(&[0, 0, 1])]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, GradingError::DirectSum { .. }));
    }

    #[test]
    fn misplaced_brackets_are_reported() {
        let h = heisenberg();
        let err = Grading::new(
            &h,
            [
                (w(&[1]), vec![v(&[1, 0, 0]), v(&[0, 1, 0])]),
                (w(&[3]), vec![v(&[0, 0, 1])]),
            ],
        )
        .unwrap_err();
        let GradingError::BracketClosure { description } = err else {
            panic!("expected a bracket closure error");
        };
        assert!(description.contains("[X, Y] = Z"));
    }

    #[test]
    fn empty_input_is_malformed() {
        let h = heisenberg();
        let none: Vec<(Weight<Rational>, Vec<Vec<Rational>>)> = Vec::new();
        assert!(matches!(
            Grading::new(&h, none),
            Err(GradingError::MalformedGrading { .. })
        ));
    }

    #[test]
    fn layer_lookup_for_vectors() {
        let g = stratification_of(&heisenberg());
        assert_eq!(g.get_layer(&v(&[2, 3, 0])).unwrap(), w(&[1]));
        assert_eq!(g.get_layer(&v(&[0, 0, 5])).unwrap(), w(&[2]));
        assert!(matches!(
            g.get_layer(&v(&[1, 0, 1])),
            Err(GradingError::NotHomogeneous { .. })
        ));
    }

    #[test]
    fn refinement_is_reflexive_and_directional() {
        let h = heisenberg();
        let fine = Grading::new(
            &h,
            [
                (w(&[1, 0]), vec![v(&[1, 0, 0])]),
                (w(&[0, 1]), vec![v(&[0, 1, 0])]),
                (w(&[1, 1]), vec![v(&[0, 0, 1])]),
            ],
        )
        .unwrap();
        let coarse = stratification_of(&h);
        assert!(fine.is_refinement(&coarse).unwrap());
        assert!(!coarse.is_refinement(&fine).unwrap());
        assert!(coarse.is_refinement(&coarse).unwrap());
        assert!(!fine.has_equal_layers(&coarse).unwrap());

        let other = LieAlgebra::<Rational>::abelian("a3", 3).unwrap();
        let trivial = Grading::new(&other, [(w(&[0]), vec![v(&[1, 0, 0]), v(&[0, 1, 0]), v(&[0, 0, 1])])])
            .unwrap();
        assert!(matches!(
            fine.is_refinement(&trivial),
            Err(GradingError::CrossAlgebra)
        ));
    }

    #[test]
    fn generating_weights_are_poset_minima() {
        let g = stratification_of(&heisenberg());
        assert_eq!(g.generating_weights(), vec![w(&[1])]);
    }

    #[test]
    fn adapted_basis_algebra_keeps_brackets() {
        let h = heisenberg();
        let g = Grading::new(
            &h,
            [
                (w(&[1]), vec![v(&[1, 0, 0]), v(&[1, 1, 0])]),
                (w(&[2]), vec![v(&[0, 0, 1])]),
            ],
        )
        .unwrap();
        let k = g
            .lie_algebra_in_adapted_basis(Some(vec!["A".into(), "B".into(), "C".into()]))
            .unwrap();
        let a = k.element("A").unwrap();
        let b = k.element("B").unwrap();
        // layer vectors are stored in descending order: X + Y, then X
        assert_eq!(k.format_element(&k.bracket(&a, &b)), "-C");
    }

    #[test]
    fn display_lists_layers_in_order() {
        let g = stratification_of(&heisenberg());
        insta::assert_snapshot!(g.to_string(), @r"
        Grading over Z of Lie algebra heis on 3 generators (X, Y, Z) with nonzero layers
          1 : (X, Y)
          2 : (Z)
        ");
    }

    #[test]
    fn projections_fix_their_layer() {
        let g = stratification_of(&heisenberg());
        let p = g.projection(&w(&[1])).unwrap();
        assert_eq!(p.apply(&v(&[2, 3, 4])), v(&[2, 3, 0]));
    }
}
