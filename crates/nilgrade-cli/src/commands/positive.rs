use crate::cli::AlgebraInput;
use crate::support::{
    OUTPUT_SCHEMA, load_algebra_or_exit, load_limits_or_exit, or_exit, print_grading,
    print_json_or_exit,
};
use nilgrade_kernel::maximal_grading;
use serde_json::json;

pub fn run(input: AlgebraInput, fast: bool) {
    let algebra = load_algebra_or_exit(&input);
    let limits = load_limits_or_exit(&input);
    let maximal = or_exit(maximal_grading(&algebra));
    let grading = or_exit(maximal.to_positive_grading(!fast, limits.max_branch_nodes));

    if input.json {
        let payload = json!({
            "schema": OUTPUT_SCHEMA,
            "algebra": algebra.name(),
            "optimized": !fast,
            "grading": grading.summary(),
        });
        print_json_or_exit("positive", &payload);
        return;
    }
    print_grading("positive", &algebra, &grading);
}
