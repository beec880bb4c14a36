//! Polynomial systems whose solutions are graded isomorphisms.

use std::collections::BTreeMap;

use nilgrade_exact::{ExactField, Frame, Ideal, Poly, PolyMatrix, PolyRing};
use nilgrade_kernel::{Grading, GradingError, Limits, Weight};
use tracing::debug;

use crate::certificate::{IsomorphismCertificate, LayerMap};
use crate::error::{ClassifyError, Result};
use crate::maps::WeightMap;

/// The isomorphism equations from `src` to `dst` along `weight_map`.
///
/// The `i`-th layer of `src` (in iteration order) gets an indeterminate
/// matrix with entries `a{i}_{rc}` and an invertibility witness `s_i`
/// constrained by `s_i * det - 1`. For every pair of adapted basis vectors
/// `X`, `Y` the image of `[X, Y]` must equal the bracket of the images,
/// compared in target layer coordinates. Brackets that vanish in the
/// source by degree but land in a nonzero target layer must vanish there.
///
/// With `reduced`, the ideal is replaced by its reduced Groebner basis and
/// every matrix entry and witness by its normal form modulo it; a system
/// whose ideal contains 1 comes back as zero matrices over the unit ideal.
pub fn isomorphism_equations<F: ExactField>(
    src: &Grading<F>,
    dst: &Grading<F>,
    weight_map: &WeightMap<F>,
    reduced: bool,
    limits: &Limits,
) -> Result<IsomorphismCertificate<F>> {
    let weights = src.weights();
    let mut targets: Vec<Weight<F>> = Vec::with_capacity(weights.len());
    for a in weights {
        let b = weight_map.get(a).ok_or_else(|| ClassifyError::NotHomomorphism {
            description: format!("weight {a} has no image"),
        })?;
        let (m, n) = (src.layer_dimension(a), dst.layer_dimension(b));
        if m != n {
            return Err(ClassifyError::LayerDimensionMismatch {
                description: format!("layer {a} has dimension {m} but layer {b} has dimension {n}"),
            });
        }
        targets.push(b.clone());
    }

    let count = weights.len();
    let dims: Vec<usize> = weights.iter().map(|a| src.layer_dimension(a)).collect();
    let mut names: Vec<String> = (1..=count).map(|i| format!("s_{i}")).collect();
    let mut offsets = Vec::with_capacity(count);
    for (i, &d) in dims.iter().enumerate() {
        offsets.push(names.len());
        for r in 1..=d {
            for c in 1..=d {
                names.push(format!("a{}_{r}{c}", i + 1));
            }
        }
    }
    let ring = PolyRing::new(names);
    let nvars = ring.nvars();

    let mut matrices: Vec<PolyMatrix<F>> = Vec::with_capacity(count);
    for (&d, &offset) in dims.iter().zip(&offsets) {
        let mut m = PolyMatrix::zeros(nvars, d, d);
        for r in 0..d {
            for c in 0..d {
                m.set(r, c, ring.var(offset + r * d + c));
            }
        }
        matrices.push(m);
    }

    let mut generators: Vec<Poly<F>> = Vec::new();
    for (i, m) in matrices.iter().enumerate() {
        let det = m.det()?;
        generators.push(ring.var::<F>(i).mul(&det).sub(&ring.constant(F::one())));
    }

    let src_dim = src.algebra().dimension();
    let dst_dim = dst.algebra().dimension();
    let src_frames = weights
        .iter()
        .map(|a| -> Result<Frame<F>> { Ok(Frame::new(src_dim, src.layer(a)?.to_vec())?) })
        .collect::<Result<Vec<Frame<F>>>>()?;
    let mut dst_frames: BTreeMap<Weight<F>, Frame<F>> = BTreeMap::new();
    for b in dst.weights() {
        dst_frames.insert(b.clone(), Frame::new(dst_dim, dst.layer(b)?.to_vec())?);
    }
    let index: BTreeMap<&Weight<F>, usize> = weights.iter().enumerate().map(|(i, w)| (w, i)).collect();

    let adapted: Vec<(usize, usize, &Vec<F>)> = weights
        .iter()
        .enumerate()
        .flat_map(|(i, a)| src.layers()[a].iter().enumerate().map(move |(p, x)| (i, p, x)))
        .collect();

    for (position, &(i, p, x)) in adapted.iter().enumerate() {
        for &(j, q, y) in &adapted[position + 1..] {
            let source_sum = src.magma().add(&weights[i], &weights[j])?;
            let target_sum = dst.magma().add(&targets[i], &targets[j])?;

            // image of [X, Y]
            let (layer, image) = match index.get(&source_sum) {
                Some(&k) => {
                    let z = src.algebra().bracket(x, y);
                    let coords = src_frames[k].coordinates(&z).ok_or_else(|| GradingError::BracketClosure {
                        description: format!(
                            "[{}, {}] is not in layer {source_sum}",
                            src.algebra().format_element(x),
                            src.algebra().format_element(y)
                        ),
                    })?;
                    let d = dims[k];
                    let image: Vec<Poly<F>> = (0..d)
                        .map(|r| {
                            coords.iter().enumerate().fold(ring.zero(), |acc, (c, z)| {
                                acc.add(&matrices[k].get(r, c).scale(z))
                            })
                        })
                        .collect();
                    (targets[k].clone(), image)
                }
                None if dst.contains(&target_sum) => {
                    let d = dst.layer_dimension(&target_sum);
                    (target_sum, vec![ring.zero(); d])
                }
                None => continue,
            };

            // bracket of the images, in coordinates of the same target layer
            let frame = dst_frames.get(&layer).ok_or_else(|| ClassifyError::NotHomomorphism {
                description: format!("weight {layer} has no layer in the target"),
            })?;
            let mut bracket: Vec<Poly<F>> = vec![ring.zero(); frame.len()];
            for (k, u) in dst.layer(&targets[i])?.iter().enumerate() {
                let cu = matrices[i].get(k, p);
                if cu.is_zero() {
                    continue;
                }
                for (h, v) in dst.layer(&targets[j])?.iter().enumerate() {
                    let cv = matrices[j].get(h, q);
                    let w = dst.algebra().bracket(u, v);
                    if cv.is_zero() || w.iter().all(|c| c.is_zero()) {
                        continue;
                    }
                    let coords = frame.coordinates(&w).ok_or_else(|| ClassifyError::NotHomomorphism {
                        description: format!(
                            "[{}, {}] does not lie in layer {layer}",
                            dst.algebra().format_element(u),
                            dst.algebra().format_element(v)
                        ),
                    })?;
                    let product = cu.mul(cv);
                    for (t, c) in bracket.iter_mut().zip(&coords) {
                        if !c.is_zero() {
                            *t = t.add(&product.scale(c));
                        }
                    }
                }
            }

            for (lhs, rhs) in image.iter().zip(&bracket) {
                let eq = lhs.sub(rhs);
                if !eq.is_zero() && !generators.contains(&eq) {
                    generators.push(eq);
                }
            }
        }
    }

    let ideal = Ideal::new(ring.clone(), generators.clone(), limits.max_groebner_pairs)?;
    debug!(
        variables = nvars,
        generators = generators.len(),
        consistent = !ideal.contains_unit(),
        "isomorphism equations"
    );
    let witnesses: Vec<Poly<F>> = (0..count).map(|i| ring.var(i)).collect();

    if !reduced {
        let layers = layer_maps(weights, &targets, matrices, witnesses);
        return Ok(IsomorphismCertificate::new(src, dst, weight_map.clone(), layers, ideal));
    }
    if ideal.contains_unit() {
        let zeros = dims.iter().map(|&d| PolyMatrix::zeros(nvars, d, d)).collect();
        let layers = layer_maps(weights, &targets, zeros, witnesses);
        return Ok(IsomorphismCertificate::new(
            src,
            dst,
            weight_map.clone(),
            layers,
            Ideal::unit(ring),
        ));
    }

    let mut matrices = matrices;
    let mut witnesses = witnesses;
    normal_forms(&ideal, &mut matrices, &mut witnesses)?;
    let ideal = Ideal::new(ring, ideal.groebner_basis().to_vec(), limits.max_groebner_pairs)?;
    let layers = layer_maps(weights, &targets, matrices, witnesses);
    Ok(IsomorphismCertificate::new(src, dst, weight_map.clone(), layers, ideal))
}

fn layer_maps<F: ExactField>(
    weights: &[Weight<F>],
    targets: &[Weight<F>],
    matrices: Vec<PolyMatrix<F>>,
    witnesses: Vec<Poly<F>>,
) -> Vec<LayerMap<F>> {
    weights
        .iter()
        .zip(targets)
        .zip(matrices.into_iter().zip(witnesses))
        .map(|((a, b), (matrix, witness))| LayerMap {
            source: a.clone(),
            target: b.clone(),
            matrix,
            witness,
        })
        .collect()
}

/// Replace every matrix entry and witness by its normal form modulo `ideal`.
fn normal_forms<F: ExactField>(
    ideal: &Ideal<F>,
    matrices: &mut [PolyMatrix<F>],
    witnesses: &mut [Poly<F>],
) -> Result<()> {
    let mut rewritten = 0usize;
    for m in matrices.iter_mut() {
        for r in 0..m.rows() {
            for c in 0..m.cols() {
                let reduced = ideal.reduce(m.get(r, c))?;
                if reduced != *m.get(r, c) {
                    rewritten += 1;
                    m.set(r, c, reduced);
                }
            }
        }
    }
    for w in witnesses.iter_mut() {
        let reduced = ideal.reduce(w)?;
        if reduced != *w {
            rewritten += 1;
            *w = reduced;
        }
    }
    debug!(
        basis = ideal.groebner_basis().len(),
        rewritten, "isomorphism equations reduced"
    );
    Ok(())
}
