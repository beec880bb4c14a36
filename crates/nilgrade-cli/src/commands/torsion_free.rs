use crate::cli::AlgebraInput;
use crate::support::{
    OUTPUT_SCHEMA, indent, load_algebra_or_exit, load_limits_or_exit, or_exit, print_json_or_exit,
};
use nilgrade_classify::grading_label;
use nilgrade_kernel::torsion_free_gradings;
use serde_json::json;

pub fn run(input: AlgebraInput) {
    let algebra = load_algebra_or_exit(&input);
    let limits = load_limits_or_exit(&input);
    let gradings = or_exit(torsion_free_gradings(&algebra, &limits));

    if input.json {
        let rows: Vec<_> = gradings
            .iter()
            .map(|g| {
                json!({
                    "label": grading_label(g),
                    "grading": g.summary(),
                })
            })
            .collect();
        let payload = json!({
            "schema": OUTPUT_SCHEMA,
            "algebra": algebra.name(),
            "count": gradings.len(),
            "gradings": rows,
        });
        print_json_or_exit("torsion-free", &payload);
        return;
    }

    println!("nilgrade torsion-free");
    println!("  Algebra: {}", algebra.name());
    println!("  Gradings: {}", gradings.len());
    for (idx, g) in gradings.iter().enumerate() {
        println!("  [{}] {}", idx + 1, grading_label(g));
        println!("{}", indent(&g.to_string(), "      "));
    }
}
