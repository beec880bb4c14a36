use crate::support::{OUTPUT_SCHEMA, or_exit, print_json_or_exit};
use nilgrade_kernel::catalog;
use serde_json::json;

pub fn run(json_output: bool) {
    let mut rows = Vec::new();
    for name in catalog::names() {
        let algebra = or_exit(catalog::algebra(name));
        let step = or_exit(algebra.lower_central_series()).len().saturating_sub(1);
        rows.push((algebra, step));
    }

    if json_output {
        let algebras: Vec<_> = rows
            .iter()
            .map(|(algebra, step)| {
                json!({
                    "name": algebra.name(),
                    "dimension": algebra.dimension(),
                    "step": step,
                    "spec": algebra.to_spec(),
                })
            })
            .collect();
        let payload = json!({
            "schema": OUTPUT_SCHEMA,
            "algebras": algebras,
        });
        print_json_or_exit("catalog", &payload);
        return;
    }

    println!("nilgrade catalog");
    println!("  Algebras: {}", rows.len());
    for (algebra, step) in &rows {
        println!("    {algebra} (dimension {}, step {step})", algebra.dimension());
    }
}
