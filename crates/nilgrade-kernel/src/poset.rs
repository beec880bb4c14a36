//! The weight relation `a < c` whenever `a + b = c` for nonzero layer
//! weights `a`, `b`.

use std::collections::{BTreeMap, BTreeSet};

use nilgrade_exact::ExactField;
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::magma::{Magma, Weight};

/// The weight relation as an explicit DAG, when it is acyclic.
#[derive(Debug, Clone)]
pub struct WeightPoset<F> {
    /// Edges `a -> c` for the generating relations `a + b = c` only.
    graph: DiGraph<Weight<F>, ()>,
    /// A linear extension: deterministic topological order.
    order: Vec<Weight<F>>,
}

impl<F: ExactField> WeightPoset<F> {
    /// `None` if the relation has a cycle (so is not a partial order).
    pub fn build(weights: &[Weight<F>], magma: &Magma) -> Option<Self> {
        let support: BTreeSet<&Weight<F>> = weights.iter().collect();
        let mut graph = DiGraph::new();
        let mut nodes: BTreeMap<Weight<F>, NodeIndex> = BTreeMap::new();
        for w in support.iter() {
            nodes.insert((*w).clone(), graph.add_node((*w).clone()));
        }
        let mut edges = BTreeSet::new();
        for a in weights.iter().filter(|w| !w.is_zero()) {
            for b in weights.iter().filter(|w| !w.is_zero()) {
                let Ok(c) = magma.add(a, b) else { continue };
                if let (Some(&from), Some(&to)) = (nodes.get(a), nodes.get(&c)) {
                    if edges.insert((from, to)) {
                        graph.add_edge(from, to, ());
                    }
                }
            }
        }

        let sorted = toposort(&graph, None).ok()?;
        let order = sorted.into_iter().map(|n| graph[n].clone()).collect();
        Some(Self { graph, order })
    }

    pub fn order(&self) -> &[Weight<F>] {
        &self.order
    }

    /// Weights with no strictly smaller weight.
    pub fn minimal_elements(&self) -> Vec<Weight<F>> {
        let mut minimal: Vec<(usize, Weight<F>)> = self
            .graph
            .node_indices()
            .filter(|&n| {
                self.graph
                    .neighbors_directed(n, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .filter_map(|n| {
                let w = &self.graph[n];
                self.order.iter().position(|o| o == w).map(|at| (at, w.clone()))
            })
            .collect();
        minimal.sort_by_key(|(at, _)| *at);
        minimal.into_iter().map(|(_, w)| w).collect()
    }
}
