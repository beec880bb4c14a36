use crate::cli::AlgebraInput;
use crate::support::{OUTPUT_SCHEMA, load_algebra_or_exit, or_exit, print_grading, print_json_or_exit};
use nilgrade_kernel::stratification;
use serde_json::json;

pub fn run(input: AlgebraInput) {
    let algebra = load_algebra_or_exit(&input);
    let grading = or_exit(stratification(&algebra));

    if input.json {
        let payload = json!({
            "schema": OUTPUT_SCHEMA,
            "algebra": algebra.name(),
            "step": grading.weights().len(),
            "grading": grading.summary(),
        });
        print_json_or_exit("stratify", &payload);
        return;
    }
    print_grading("stratify", &algebra, &grading);
}
