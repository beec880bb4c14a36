//! Candidate weight maps between two gradings.

use std::collections::BTreeMap;

use nilgrade_exact::ExactField;
use nilgrade_kernel::{Grading, Limits, Weight};
use tracing::{debug, trace};

use crate::error::{ClassifyError, Result};

/// Source weight to target weight.
pub type WeightMap<F> = BTreeMap<Weight<F>, Weight<F>>;

/// Whether `map` sends every defined weight sum of `src` to the sum of the
/// images: `map(a + b) = map(a) + map(b)` whenever `a + b` is a weight of
/// `src`. Fails if some weight of `src` has no image.
pub fn is_homomorphism<F: ExactField>(
    src: &Grading<F>,
    dst: &Grading<F>,
    map: &WeightMap<F>,
) -> Result<bool> {
    let weights = src.weights();
    let image = |w: &Weight<F>| {
        map.get(w).ok_or_else(|| ClassifyError::NotHomomorphism {
            description: format!("weight {w} has no image"),
        })
    };
    for (i, a) in weights.iter().enumerate() {
        for b in &weights[i..] {
            let sum = src.magma().add(a, b)?;
            if !src.contains(&sum) {
                continue;
            }
            if dst.magma().add(image(a)?, image(b)?)? != *image(&sum)? {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Every layer-dimension preserving bijection from the weights of `src` to
/// the weights of `dst` that is a homomorphism where defined.
///
/// Weights are only permuted within classes of equal layer dimension.
/// Classes of unequal sizes fail with `LayerDimensionMismatch` before any
/// enumeration; more than `limits.max_weight_maps` candidates fail with
/// `SearchBudget`.
pub fn weight_maps<F: ExactField>(
    src: &Grading<F>,
    dst: &Grading<F>,
    limits: &Limits,
) -> Result<Vec<WeightMap<F>>> {
    let src_classes = dimension_classes(src);
    let dst_classes = dimension_classes(dst);
    let sizes = |classes: &BTreeMap<usize, Vec<Weight<F>>>| -> Vec<(usize, usize)> {
        classes.iter().map(|(d, ws)| (*d, ws.len())).collect()
    };
    if sizes(&src_classes) != sizes(&dst_classes) {
        return Err(ClassifyError::LayerDimensionMismatch {
            description: format!(
                "(dimension, count) {:?} against {:?}",
                sizes(&src_classes),
                sizes(&dst_classes)
            ),
        });
    }

    let mut candidates: u64 = 1;
    for ws in src_classes.values() {
        for k in 2..=ws.len() as u64 {
            candidates = candidates.saturating_mul(k);
        }
    }
    if candidates > limits.max_weight_maps {
        return Err(ClassifyError::SearchBudget {
            description: format!(
                "{candidates} weight permutations exceed the limit of {}",
                limits.max_weight_maps
            ),
        });
    }

    let classes: Vec<(&Vec<Weight<F>>, &Vec<Weight<F>>)> = src_classes
        .values()
        .zip(dst_classes.values())
        .collect();
    let mut perms: Vec<Vec<usize>> = classes.iter().map(|(s, _)| (0..s.len()).collect()).collect();
    let mut maps = Vec::new();
    let mut tried = 0u64;
    loop {
        let mut map = WeightMap::new();
        for ((s, d), perm) in classes.iter().zip(&perms) {
            for (a, &j) in s.iter().zip(perm) {
                map.insert(a.clone(), d[j].clone());
            }
        }
        tried += 1;
        if is_homomorphism(src, dst, &map)? {
            trace!(tried, "homomorphic weight map");
            maps.push(map);
        }

        // odometer over the per-class permutations
        let mut advanced = false;
        for perm in perms.iter_mut().rev() {
            if next_permutation(perm) {
                advanced = true;
                break;
            }
        }
        if !advanced {
            break;
        }
    }
    debug!(tried, kept = maps.len(), "weight maps");
    Ok(maps)
}

fn dimension_classes<F: ExactField>(g: &Grading<F>) -> BTreeMap<usize, Vec<Weight<F>>> {
    let mut classes: BTreeMap<usize, Vec<Weight<F>>> = BTreeMap::new();
    for w in g.weights() {
        classes.entry(g.layer_dimension(w)).or_default().push(w.clone());
    }
    classes
}

/// Advance to the next permutation in lexicographic order; on the last one,
/// reset to the first and return `false`.
fn next_permutation(p: &mut [usize]) -> bool {
    let Some(i) = (1..p.len()).rev().find(|&i| p[i - 1] < p[i]) else {
        p.sort_unstable();
        return false;
    };
    let pivot = i - 1;
    let Some(j) = (i..p.len()).rev().find(|&j| p[j] > p[pivot]) else {
        return false;
    };
    p.swap(pivot, j);
    p[i..].reverse();
    true
}
