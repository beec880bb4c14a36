//! Isomorphism classes of gradings, grown one membership test at a time.

use std::collections::BTreeMap;

use nilgrade_exact::ExactField;
use nilgrade_kernel::{Grading, GradingSummary, Limits};
use petgraph::algo::astar;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::certificate::IsomorphismCertificate;
use crate::equations::isomorphism_equations;
use crate::error::{ClassifyError, Result};
use crate::maps::weight_maps;

/// Representatives of one isomorphism class of gradings, with the
/// certificates that joined them. Certificate `(i, j)` maps representative
/// `i` to representative `j`.
#[derive(Debug, Clone)]
pub struct GradingIsomorphismClass<F: ExactField> {
    representatives: Vec<Grading<F>>,
    certificates: BTreeMap<(usize, usize), IsomorphismCertificate<F>>,
    limits: Limits,
    reduced: bool,
}

impl<F: ExactField> GradingIsomorphismClass<F> {
    pub fn new(seed: Grading<F>, limits: Limits) -> Self {
        Self {
            representatives: vec![seed],
            certificates: BTreeMap::new(),
            limits,
            reduced: false,
        }
    }

    /// Build certificates with reduced isomorphism equations.
    pub fn with_reduced_equations(mut self, reduced: bool) -> Self {
        self.reduced = reduced;
        self
    }

    pub fn seed(&self) -> &Grading<F> {
        &self.representatives[0]
    }

    pub fn representatives(&self) -> &[Grading<F>] {
        &self.representatives
    }

    pub fn certificates(&self) -> &BTreeMap<(usize, usize), IsomorphismCertificate<F>> {
        &self.certificates
    }

    pub fn index_of(&self, grading: &Grading<F>) -> Option<usize> {
        self.representatives.iter().position(|r| r == grading)
    }

    /// Whether `candidate` is isomorphic to the seed. A new member is
    /// appended as a representative together with its certificate.
    ///
    /// Gradings whose layer dimensions differ are not members; budget and
    /// grading errors propagate.
    pub fn contains(&mut self, candidate: &Grading<F>) -> Result<bool> {
        if self.index_of(candidate).is_some() {
            return Ok(true);
        }
        let seed = self.seed().clone();
        let maps = match weight_maps(&seed, candidate, &self.limits) {
            Ok(maps) => maps,
            Err(ClassifyError::LayerDimensionMismatch { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        for map in &maps {
            let certificate = isomorphism_equations(&seed, candidate, map, self.reduced, &self.limits)?;
            if certificate.is_consistent() {
                let index = self.representatives.len();
                self.representatives.push(candidate.clone());
                self.certificates.insert((0, index), certificate);
                debug!(
                    seed = %seed.key().short(),
                    candidate = %candidate.key().short(),
                    index,
                    "grading joins class"
                );
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// A certificate from `from` to `to`, both representatives.
    ///
    /// Uses a stored certificate or its inverse when one exists, otherwise
    /// composes along a shortest path of the certificate graph.
    pub fn get_isomorphism(
        &self,
        from: &Grading<F>,
        to: &Grading<F>,
    ) -> Result<IsomorphismCertificate<F>> {
        let i = self.representative_index(from)?;
        let j = self.representative_index(to)?;
        if i == j {
            return IsomorphismCertificate::identity(from);
        }
        let path = self.path(i, j).ok_or(ClassifyError::NoIsomorphismPath { from: i, to: j })?;
        let mut composed: Option<IsomorphismCertificate<F>> = None;
        for step in path.windows(2) {
            let edge = self.edge(step[0], step[1])?;
            composed = Some(match composed {
                None => edge,
                Some(acc) => acc.compose(&edge, self.limits.max_groebner_pairs)?,
            });
        }
        composed.ok_or(ClassifyError::NoIsomorphismPath { from: i, to: j })
    }

    pub fn summary(&self) -> ClassSummary {
        ClassSummary {
            representatives: self.representatives.iter().map(|g| g.summary()).collect(),
            certified: self.certificates.keys().map(|&(i, j)| [i, j]).collect(),
        }
    }

    fn representative_index(&self, grading: &Grading<F>) -> Result<usize> {
        self.index_of(grading).ok_or_else(|| ClassifyError::NotInClass {
            key: grading.key().short().to_string(),
        })
    }

    fn edge(&self, u: usize, v: usize) -> Result<IsomorphismCertificate<F>> {
        if let Some(c) = self.certificates.get(&(u, v)) {
            return Ok(c.clone());
        }
        match self.certificates.get(&(v, u)) {
            Some(c) => c.invert(),
            None => Err(ClassifyError::NoIsomorphismPath { from: u, to: v }),
        }
    }

    /// Shortest chain of certificates, taken as undirected edges.
    fn path(&self, from: usize, to: usize) -> Option<Vec<usize>> {
        let mut graph: UnGraph<(), ()> = UnGraph::default();
        let nodes: Vec<NodeIndex> = self
            .representatives
            .iter()
            .map(|_| graph.add_node(()))
            .collect();
        for &(u, v) in self.certificates.keys() {
            graph.add_edge(nodes[u], nodes[v], ());
        }
        let (_, path) = astar(
            &graph,
            *nodes.get(from)?,
            |n| n.index() == to,
            |_| 1usize,
            |_| 0,
        )?;
        Some(path.into_iter().map(|n| n.index()).collect())
    }
}

/// Serializable rendering of a class: its representatives, seed first, and
/// the index pairs holding a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub representatives: Vec<GradingSummary>,
    pub certified: Vec<[usize; 2]>,
}

/// Partition `gradings` into isomorphism classes, in order of first
/// appearance.
pub fn classify_gradings<F: ExactField>(
    gradings: &[Grading<F>],
    limits: &Limits,
    reduced: bool,
) -> Result<Vec<GradingIsomorphismClass<F>>> {
    let mut classes: Vec<GradingIsomorphismClass<F>> = Vec::new();
    'gradings: for g in gradings {
        for class in &mut classes {
            if class.contains(g)? {
                continue 'gradings;
            }
        }
        classes.push(GradingIsomorphismClass::new(g.clone(), limits.clone()).with_reduced_equations(reduced));
    }
    debug!(gradings = gradings.len(), classes = classes.len(), "gradings classified");
    Ok(classes)
}
