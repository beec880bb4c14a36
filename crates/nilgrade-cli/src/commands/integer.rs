use crate::cli::AlgebraInput;
use crate::support::{OUTPUT_SCHEMA, load_algebra_or_exit, or_exit, print_grading, print_json_or_exit};
use nilgrade_kernel::maximal_grading;
use serde_json::json;

pub fn run(input: AlgebraInput, coarsen: bool) {
    let algebra = load_algebra_or_exit(&input);
    let maximal = or_exit(maximal_grading(&algebra));
    let grading = or_exit(maximal.to_integer_grading(!coarsen));
    let same_layers = or_exit(grading.has_equal_layers(&maximal));

    if input.json {
        let payload = json!({
            "schema": OUTPUT_SCHEMA,
            "algebra": algebra.name(),
            "same_layers": same_layers,
            "grading": grading.summary(),
        });
        print_json_or_exit("integer", &payload);
        return;
    }
    print_grading("integer", &algebra, &grading);
    if !same_layers {
        println!("  Coarsened: torsion removed from the maximal grading");
    }
}
