//! Isomorphism certificates between graded Lie algebras.
//!
//! A certificate describes a family of linear maps, one per layer, whose
//! entries are polynomials in indeterminates constrained by an ideal. Any
//! point of the ideal's variety gives a graded isomorphism; a certificate
//! whose ideal contains 1 certifies nothing.

use std::fmt;

use nilgrade_exact::{ExactField, Ideal, Matrix, Poly, PolyMatrix, PolyRing};
use nilgrade_kernel::{ContentHash, Grading, Weight};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClassifyError, Result};
use crate::maps::WeightMap;

/// The map from one source layer to its target layer. Column `i` of
/// `matrix` is the image of the `i`-th source layer vector in target layer
/// coordinates, and `witness * det(matrix) = 1` modulo the ideal.
#[derive(Debug, Clone)]
pub struct LayerMap<F> {
    pub source: Weight<F>,
    pub target: Weight<F>,
    pub matrix: PolyMatrix<F>,
    pub witness: Poly<F>,
}

#[derive(Debug, Clone)]
pub struct IsomorphismCertificate<F> {
    source: ContentHash,
    target: ContentHash,
    weight_map: WeightMap<F>,
    layers: Vec<LayerMap<F>>,
    ideal: Ideal<F>,
}

impl<F: ExactField> IsomorphismCertificate<F> {
    pub(crate) fn new(
        source: &Grading<F>,
        target: &Grading<F>,
        weight_map: WeightMap<F>,
        layers: Vec<LayerMap<F>>,
        ideal: Ideal<F>,
    ) -> Self {
        Self {
            source: source.key().clone(),
            target: target.key().clone(),
            weight_map,
            layers,
            ideal,
        }
    }

    /// The identity of `grading`, with no indeterminates.
    pub fn identity(grading: &Grading<F>) -> Result<Self> {
        let ring = PolyRing::new(Vec::new());
        let layers = grading
            .weights()
            .iter()
            .map(|w| LayerMap {
                source: w.clone(),
                target: w.clone(),
                matrix: PolyMatrix::from_constant(0, &Matrix::identity(grading.layer_dimension(w))),
                witness: ring.constant(F::one()),
            })
            .collect();
        let weight_map = grading.weights().iter().map(|w| (w.clone(), w.clone())).collect();
        let ideal = Ideal::new(ring, Vec::new(), 0)?;
        Ok(Self::new(grading, grading, weight_map, layers, ideal))
    }

    pub fn source(&self) -> &ContentHash {
        &self.source
    }

    pub fn target(&self) -> &ContentHash {
        &self.target
    }

    pub fn weight_map(&self) -> &WeightMap<F> {
        &self.weight_map
    }

    /// Layer maps in the iteration order of the source grading.
    pub fn layers(&self) -> &[LayerMap<F>] {
        &self.layers
    }

    pub fn layer(&self, source: &Weight<F>) -> Option<&LayerMap<F>> {
        self.layers.iter().find(|l| &l.source == source)
    }

    pub fn ring(&self) -> &PolyRing {
        self.ideal.ring()
    }

    pub fn ideal(&self) -> &Ideal<F> {
        &self.ideal
    }

    /// Whether the constraints are satisfiable over the algebraic closure.
    pub fn is_consistent(&self) -> bool {
        !self.ideal.contains_unit()
    }

    /// The inverse certificate, from target to source.
    ///
    /// Each layer map `A` with witness `s` becomes `s * adj(A)` with witness
    /// `det(A)`; the ideal is unchanged.
    pub fn invert(&self) -> Result<Self> {
        let mut layers = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let adjugate = layer.matrix.adjugate()?;
            layers.push(LayerMap {
                source: layer.target.clone(),
                target: layer.source.clone(),
                matrix: adjugate.map(|p| p.mul(&layer.witness)),
                witness: layer.matrix.det()?,
            });
        }
        Ok(Self {
            source: self.target.clone(),
            target: self.source.clone(),
            weight_map: self.weight_map.iter().map(|(a, b)| (b.clone(), a.clone())).collect(),
            layers,
            ideal: self.ideal.clone(),
        })
    }

    /// `next ∘ self`, from the source of `self` to the target of `next`.
    ///
    /// Both variable sets are joined into one ring, the variables of `next`
    /// primed; layer maps multiply and witnesses multiply.
    pub fn compose(&self, next: &Self, max_groebner_pairs: usize) -> Result<Self> {
        if self.target != next.source {
            return Err(ClassifyError::CertificateMismatch {
                description: format!(
                    "target {} is not the source {}",
                    self.target.short(),
                    next.source.short()
                ),
            });
        }
        let left = self.ring();
        let right = next.ring();
        let mut names = left.names().to_vec();
        names.extend(right.names().iter().map(|n| format!("{n}'")));
        let ring = PolyRing::new(names);
        let nvars = ring.nvars();
        let left_map: Vec<usize> = (0..left.nvars()).collect();
        let right_map: Vec<usize> = (left.nvars()..nvars).collect();

        let mut layers = Vec::with_capacity(self.layers.len());
        let mut weight_map = WeightMap::new();
        for first in &self.layers {
            let second = next.layer(&first.target).ok_or_else(|| ClassifyError::CertificateMismatch {
                description: format!("no layer map from weight {}", first.target),
            })?;
            let a = first.matrix.map(|p| p.remap(nvars, &left_map));
            let b = second.matrix.map(|p| p.remap(nvars, &right_map));
            let matrix = b.mul(&a)?;
            let witness = first
                .witness
                .remap(nvars, &left_map)
                .mul(&second.witness.remap(nvars, &right_map));
            weight_map.insert(first.source.clone(), second.target.clone());
            layers.push(LayerMap {
                source: first.source.clone(),
                target: second.target.clone(),
                matrix,
                witness,
            });
        }

        let mut generators: Vec<Poly<F>> = self
            .ideal
            .generators()
            .iter()
            .map(|p| p.remap(nvars, &left_map))
            .collect();
        generators.extend(next.ideal.generators().iter().map(|p| p.remap(nvars, &right_map)));
        let ideal = Ideal::new(ring, generators, max_groebner_pairs)?;
        debug!(variables = nvars, "certificates composed");
        Ok(Self {
            source: self.source.clone(),
            target: next.target.clone(),
            weight_map,
            layers,
            ideal,
        })
    }

    /// Substitute values for every indeterminate; `None` if the point does
    /// not satisfy the ideal.
    pub fn evaluate(&self, point: &[F]) -> Option<Vec<(Weight<F>, Matrix<F>)>> {
        let ring = self.ring();
        if point.len() != ring.nvars() {
            return None;
        }
        let value = |p: &Poly<F>| -> Option<F> {
            let mut p = p.clone();
            for (i, x) in point.iter().enumerate() {
                p = p.substitute(i, &ring.constant(x.clone()));
            }
            p.constant_value()
        };
        for g in self.ideal.generators() {
            if !value(g)?.is_zero() {
                return None;
            }
        }
        let mut out = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let mut m = Matrix::zeros(layer.matrix.rows(), layer.matrix.cols());
            for r in 0..m.rows() {
                for c in 0..m.cols() {
                    m.set(r, c, value(layer.matrix.get(r, c))?);
                }
            }
            out.push((layer.source.clone(), m));
        }
        Some(out)
    }

    pub fn summary(&self) -> CertificateSummary {
        let ring = self.ring();
        CertificateSummary {
            source: self.source.clone(),
            target: self.target.clone(),
            variables: ring.names().to_vec(),
            consistent: self.is_consistent(),
            layers: self
                .layers
                .iter()
                .map(|layer| LayerMapSummary {
                    source: layer.source.to_string(),
                    target: layer.target.to_string(),
                    matrix: (0..layer.matrix.rows())
                        .map(|r| {
                            (0..layer.matrix.cols())
                                .map(|c| ring.format(layer.matrix.get(r, c)))
                                .collect()
                        })
                        .collect(),
                    witness: ring.format(&layer.witness),
                })
                .collect(),
            ideal: self.ideal.generators().iter().map(|p| ring.format(p)).collect(),
        }
    }
}

/// Serializable rendering of a certificate for the presentation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateSummary {
    pub source: ContentHash,
    pub target: ContentHash,
    pub variables: Vec<String>,
    pub consistent: bool,
    pub layers: Vec<LayerMapSummary>,
    pub ideal: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMapSummary {
    pub source: String,
    pub target: String,
    pub matrix: Vec<Vec<String>>,
    pub witness: String,
}

impl<F: ExactField> fmt::Display for IsomorphismCertificate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ring = self.ring();
        write!(
            f,
            "Isomorphism {} -> {}",
            self.source.short(),
            self.target.short()
        )?;
        for layer in &self.layers {
            let rows: Vec<String> = (0..layer.matrix.rows())
                .map(|r| {
                    (0..layer.matrix.cols())
                        .map(|c| ring.format(layer.matrix.get(r, c)))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .collect();
            write!(f, "\n  {} -> {} : [{}]", layer.source, layer.target, rows.join("; "))?;
        }
        let generators: Vec<String> = self.ideal.generators().iter().map(|p| ring.format(p)).collect();
        write!(f, "\n  subject to ({})", generators.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nilgrade_kernel::{LieAlgebra, Rational};

    fn stratified_heisenberg() -> Grading<Rational> {
        let h = LieAlgebra::<Rational>::builder("heis", &["X", "Y", "Z"])
            .bracket("X", "Y", [("Z", Rational::from_int(1))])
            .build()
            .unwrap();
        Grading::new(
            &h,
            [
                (Weight::lattice([1]), vec![h.unit(0), h.unit(1)]),
                (Weight::lattice([2]), vec![h.unit(2)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn identity_has_unit_layer_maps() {
        let g = stratified_heisenberg();
        let id = IsomorphismCertificate::identity(&g).unwrap();
        assert!(id.is_consistent());
        assert_eq!(id.source(), id.target());
        insta::assert_json_snapshot!(id.summary().layers, @r#"
        [
          {
            "source": "1",
            "target": "1",
            "matrix": [
              [
                "1",
                "0"
              ],
              [
                "0",
                "1"
              ]
            ],
            "witness": "1"
          },
          {
            "source": "2",
            "target": "2",
            "matrix": [
              [
                "1"
              ]
            ],
            "witness": "1"
          }
        ]
        "#);
    }

    #[test]
    fn composing_requires_matching_ends() {
        let g = stratified_heisenberg();
        let h = LieAlgebra::<Rational>::builder("ab", &["X", "Y", "Z"]).build().unwrap();
        let flat = Grading::new(&h, [(Weight::lattice([0]), vec![h.unit(0), h.unit(1), h.unit(2)])]).unwrap();
        let a = IsomorphismCertificate::identity(&g).unwrap();
        let b = IsomorphismCertificate::identity(&flat).unwrap();
        assert!(matches!(
            a.compose(&b, 100),
            Err(ClassifyError::CertificateMismatch { .. })
        ));
        let twice = a.compose(&a, 100).unwrap();
        assert_eq!(twice.ring().nvars(), 0);
        assert_eq!(twice.evaluate(&[]).unwrap().len(), 2);
    }
}
