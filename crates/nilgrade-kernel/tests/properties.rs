//! Structural properties every grading produced by the solvers must have,
//! checked on the catalog algebras.

use nilgrade_exact::Subspace;
use nilgrade_kernel::{
    ExactField, Grading, GradingError, Limits, Rational, Weight, catalog, maximal_grading,
    stratification, torsion_free_gradings,
};

fn gradings_of(name: &str) -> Vec<Grading<Rational>> {
    let algebra = catalog::algebra(name).unwrap();
    torsion_free_gradings(&algebra, &Limits::default()).unwrap()
}

fn assert_bracket_closed(g: &Grading<Rational>) {
    let algebra = g.algebra();
    for a in g.weights() {
        for b in g.weights() {
            let sum = g.magma().add(a, b).unwrap();
            for x in g.layer(a).unwrap() {
                for y in g.layer(b).unwrap() {
                    let z = algebra.bracket(x, y);
                    let closed = match g.layer_space(&sum) {
                        Some(space) => space.contains(&z),
                        None => z.iter().all(|c| *c == Rational::from_int(0)),
                    };
                    assert!(closed, "[{a}, {b}] leaves layer {sum} in\n{g}");
                }
            }
        }
    }
}

#[test]
fn corrupted_layer_sets_are_rejected() {
    let h = catalog::algebra("L3_2").unwrap();
    let missing = Grading::new(
        &h,
        [
            (Weight::lattice([1]), vec![h.unit(0)]),
            (Weight::lattice([2]), vec![h.unit(1)]),
        ],
    );
    assert!(matches!(missing, Err(GradingError::DirectSum { .. })));

    let duplicated = Grading::new(
        &h,
        [
            (Weight::lattice([1]), vec![h.unit(0), h.unit(1)]),
            (Weight::lattice([2]), vec![h.unit(0)]),
        ],
    );
    assert!(matches!(duplicated, Err(GradingError::DirectSum { .. })));
}

#[test]
fn heisenberg_has_five_torsion_free_gradings() {
    let gradings = gradings_of("L3_2");
    assert_eq!(gradings.len(), 5);
    let ranks: Vec<usize> = gradings.iter().map(|g| g.magma().rank()).collect();
    assert_eq!(ranks, vec![2, 1, 1, 1, 0]);
}

#[test]
fn torsion_free_gradings_are_bracket_closed() {
    for name in ["L3_2", "L4_3", "L5_8"] {
        for g in gradings_of(name) {
            assert_bracket_closed(&g);
        }
    }
}

#[test]
fn universal_realization_is_idempotent() {
    for name in ["L3_2", "L4_2", "L4_3"] {
        for g in gradings_of(name) {
            let once = g.universal_realization().unwrap();
            let twice = once.universal_realization().unwrap();
            assert!(once.has_equal_layers(&twice).unwrap(), "{g}");
            assert_eq!(once.magma(), twice.magma());
        }
    }
}

#[test]
fn mutual_refinements_have_equal_layers() {
    let gradings = gradings_of("L4_3");
    for a in &gradings {
        for b in &gradings {
            if a.is_refinement(b).unwrap() && b.is_refinement(a).unwrap() {
                assert!(a.has_equal_layers(b).unwrap());
            }
        }
        let finest = &gradings[0];
        assert!(finest.is_refinement(a).unwrap());
    }
}

#[test]
fn stratification_layers_are_one_to_step() {
    let algebra = catalog::algebra("L5_9").unwrap();
    let g = stratification(&algebra).unwrap();
    let weights: Vec<Weight<Rational>> = (1..=3).map(|k| Weight::lattice([k])).collect();
    assert_eq!(g.weights(), weights.as_slice());

    // the degree one layer generates the algebra
    let n = algebra.dimension();
    let first = g.layer(&weights[0]).unwrap().to_vec();
    let mut span = Subspace::span(n, &first).unwrap();
    let mut frontier = first.clone();
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for x in &first {
            for y in &frontier {
                let z = algebra.bracket(x, y);
                if !span.contains(&z) {
                    span = span.sum(&Subspace::span(n, std::slice::from_ref(&z)).unwrap()).unwrap();
                    next.push(z);
                }
            }
        }
        frontier = next;
    }
    assert_eq!(span.dim(), n);
}

#[test]
fn positive_realizations_are_sound() {
    for name in ["L3_2", "L4_3", "L5_8"] {
        for g in gradings_of(name) {
            match g.to_positive_grading(true, Limits::default().max_branch_nodes) {
                Ok(positive) => {
                    for w in positive.weights() {
                        let coords = w.as_lattice().unwrap();
                        assert_eq!(coords.len(), 1);
                        assert!(coords[0] > 0, "{positive}");
                    }
                    assert!(g.is_refinement(&positive).unwrap());
                }
                Err(GradingError::NoRealization { .. }) => {
                    assert!(!g.has_positive_realization().unwrap());
                }
                Err(e) => panic!("unexpected error for {name}: {e}"),
            }
        }
    }
}

#[test]
fn maximal_gradings_refine_every_torsion_free_grading() {
    let algebra = catalog::algebra("L5_8").unwrap();
    let finest = maximal_grading(&algebra).unwrap();
    for g in torsion_free_gradings(&algebra, &Limits::default()).unwrap() {
        assert!(finest.is_refinement(&g).unwrap());
    }
}
