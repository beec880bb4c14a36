use crate::cli::AlgebraInput;
use crate::support::{OUTPUT_SCHEMA, load_algebra_or_exit, or_exit, print_grading, print_json_or_exit};
use nilgrade_kernel::{
    ExactField, Grading, GradingError, Quadratic, maximal_grading, maximal_grading_split,
};
use serde_json::json;
use tracing::info;

pub fn run(input: AlgebraInput) {
    let algebra = load_algebra_or_exit(&input);
    match maximal_grading(&algebra) {
        Ok(grading) => report(&input, &grading, "Q".to_string()),
        Err(GradingError::NotSplit { polynomial }) => {
            info!(%polynomial, "retrying over a quadratic splitting field");
            let grading = or_exit(maximal_grading_split(&algebra));
            let field = splitting_field(&grading);
            report(&input, &grading, field);
        }
        Err(e) => or_exit::<(), _>(Err(e)),
    }
}

fn splitting_field(grading: &Grading<Quadratic>) -> String {
    grading
        .layers()
        .values()
        .flatten()
        .flatten()
        .find_map(|c| c.field())
        .map_or_else(|| "Q".to_string(), |k| k.to_string())
}

fn report<F: ExactField>(input: &AlgebraInput, grading: &Grading<F>, field: String) {
    let algebra = grading.algebra();
    if input.json {
        let payload = json!({
            "schema": OUTPUT_SCHEMA,
            "algebra": algebra.name(),
            "field": field,
            "grading": grading.summary(),
        });
        print_json_or_exit("maximal", &payload);
        return;
    }
    print_grading("maximal", algebra, grading);
    println!("  Field: {field}");
}
