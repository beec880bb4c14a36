//! End-to-end classification of catalog gradings.

use nilgrade_classify::{
    GradingIsomorphismClass, WeightMap, class_labels, classify_gradings, grading_label_alt,
    isomorphism_equations, weight_maps,
};
use nilgrade_kernel::{
    ExactField, Grading, Limits, Rational, Weight, catalog, stratification, torsion_free_gradings,
};

fn w(k: i64) -> Weight<Rational> {
    Weight::lattice([k])
}

#[test]
fn swapped_generators_are_certified_isomorphic() {
    let h = catalog::algebra("L3_2").unwrap();
    let gr1 = Grading::new(
        &h,
        [(w(1), vec![h.unit(0)]), (w(2), vec![h.unit(1)]), (w(3), vec![h.unit(2)])],
    )
    .unwrap();
    let gr2 = Grading::new(
        &h,
        [(w(1), vec![h.unit(1)]), (w(2), vec![h.unit(0)]), (w(3), vec![h.unit(2)])],
    )
    .unwrap();

    let map: WeightMap<Rational> = (1..=3).map(|k| (w(k), w(k))).collect();
    let certificate = isomorphism_equations(&gr1, &gr2, &map, false, &Limits::default()).unwrap();
    assert!(!certificate.ideal().contains_unit());

    let mut class = GradingIsomorphismClass::new(gr1.clone(), Limits::default());
    assert!(class.contains(&gr2).unwrap());
    assert_eq!(class.representatives(), &[gr1, gr2]);
}

#[test]
fn inconsistent_permutations_are_never_tried() {
    let h = catalog::algebra("L3_2").unwrap();
    let g = Grading::new(
        &h,
        [(w(1), vec![h.unit(0)]), (w(2), vec![h.unit(1)]), (w(3), vec![h.unit(2)])],
    )
    .unwrap();
    let maps = weight_maps(&g, &g, &Limits::default()).unwrap();
    // 1 + 1 = 2 and 1 + 2 = 3 pin every weight
    assert_eq!(maps.len(), 1);
    assert!(maps[0].iter().all(|(a, b)| a == b));
}

#[test]
fn heisenberg_gradings_fall_into_four_classes() {
    // the two gradings merging a generator with the centre are isomorphic
    let h = catalog::algebra("L3_2").unwrap();
    let gradings = torsion_free_gradings(&h, &Limits::default()).unwrap();
    let classes = classify_gradings(&gradings, &Limits::default(), true).unwrap();
    assert_eq!(classes.len(), 4);
    let sizes: Vec<usize> = classes.iter().map(|c| c.representatives().len()).collect();
    assert_eq!(sizes.iter().sum::<usize>(), 5);
    assert_eq!(class_labels(&classes).len(), 4);
}

#[test]
fn isomorphic_gradings_share_the_alternative_label() {
    let a = catalog::algebra("L4_3").unwrap();
    let strat = stratification(&a).unwrap();
    let scaled_basis: Vec<Vec<Rational>> = (0..4)
        .map(|i| {
            let mut v = a.unit(i);
            v[i] = Rational::from_int(i as i64 + 1);
            v
        })
        .collect();
    let scaled = Grading::new(
        &a,
        strat.weights().iter().map(|wt| {
            let vectors = strat
                .layer(wt)
                .unwrap()
                .iter()
                .map(|v| {
                    let mut out = vec![Rational::from_int(0); 4];
                    for (i, c) in v.iter().enumerate() {
                        for (o, s) in out.iter_mut().zip(&scaled_basis[i]) {
                            *o = o.clone() + c.clone() * s.clone();
                        }
                    }
                    out
                })
                .collect();
            (wt.clone(), vectors)
        }),
    )
    .unwrap();
    let mut class = GradingIsomorphismClass::new(strat.clone(), Limits::default());
    assert!(class.contains(&scaled).unwrap());
    assert_eq!(grading_label_alt(&strat), grading_label_alt(&scaled));
}
