//! Short labels for gradings and their isomorphism classes.

use std::collections::BTreeMap;

use nilgrade_exact::ExactField;
use nilgrade_kernel::Grading;

use crate::class::GradingIsomorphismClass;

/// `k.n_1n_2...`: the rank of the grading group, then the layer
/// dimensions in iteration order. Dimensions above nine are separated by
/// commas.
pub fn grading_label<F: ExactField>(grading: &Grading<F>) -> String {
    let dims: Vec<usize> = grading
        .weights()
        .iter()
        .map(|w| grading.layer_dimension(w))
        .collect();
    format!("{}.{}", grading.magma().rank(), join_dimensions(&dims))
}

/// `k.` followed by the layer dimensions in decreasing order; equal for
/// isomorphic gradings whatever their weights.
pub fn grading_label_alt<F: ExactField>(grading: &Grading<F>) -> String {
    let mut dims: Vec<usize> = grading
        .weights()
        .iter()
        .map(|w| grading.layer_dimension(w))
        .collect();
    dims.sort_unstable_by(|a, b| b.cmp(a));
    format!("{}.{}", grading.magma().rank(), join_dimensions(&dims))
}

fn join_dimensions(dims: &[usize]) -> String {
    let separator = if dims.iter().any(|&d| d > 9) { "," } else { "" };
    dims.iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Bijective base 26: `0 -> a`, `25 -> z`, `26 -> aa`, `27 -> ab`.
pub fn int_to_az(n: usize) -> String {
    let mut n = n + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'a' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// One label per class: the seed's `grading_label` with a letter suffix
/// counting classes that share it.
pub fn class_labels<F: ExactField>(classes: &[GradingIsomorphismClass<F>]) -> Vec<String> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    classes
        .iter()
        .map(|class| {
            let base = grading_label(class.seed());
            let count = seen.entry(base.clone()).or_insert(0);
            let label = format!("{base}{}", int_to_az(*count));
            *count += 1;
            label
        })
        .collect()
}
