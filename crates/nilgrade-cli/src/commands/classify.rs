use crate::cli::AlgebraInput;
use crate::support::{
    OUTPUT_SCHEMA, indent, load_algebra_or_exit, load_limits_or_exit, or_exit, print_json_or_exit,
};
use nilgrade_classify::{class_labels, classify_gradings, grading_label_alt};
use nilgrade_kernel::torsion_free_gradings;
use serde_json::json;

pub fn run(input: AlgebraInput, reduced: bool, certificates: bool) {
    let algebra = load_algebra_or_exit(&input);
    let limits = load_limits_or_exit(&input);
    let gradings = or_exit(torsion_free_gradings(&algebra, &limits));
    let classes = or_exit(classify_gradings(&gradings, &limits, reduced));
    let labels = class_labels(&classes);

    if input.json {
        let rows: Vec<_> = classes
            .iter()
            .zip(&labels)
            .map(|(class, label)| {
                let mut row = json!({
                    "label": label,
                    "label_alt": grading_label_alt(class.seed()),
                    "class": class.summary(),
                });
                if certificates {
                    row["certificates"] = json!(
                        class
                            .certificates()
                            .values()
                            .map(|c| c.summary())
                            .collect::<Vec<_>>()
                    );
                }
                row
            })
            .collect();
        let payload = json!({
            "schema": OUTPUT_SCHEMA,
            "algebra": algebra.name(),
            "gradings": gradings.len(),
            "reduced": reduced,
            "classes": rows,
        });
        print_json_or_exit("classify", &payload);
        return;
    }

    println!("nilgrade classify");
    println!("  Algebra: {}", algebra.name());
    println!("  Gradings: {}", gradings.len());
    println!("  Classes: {}", classes.len());
    for (class, label) in classes.iter().zip(&labels) {
        println!(
            "  {label} ({}): {} representative(s)",
            grading_label_alt(class.seed()),
            class.representatives().len()
        );
        println!("{}", indent(&class.seed().to_string(), "      "));
        if certificates {
            for certificate in class.certificates().values() {
                println!("{}", indent(&certificate.to_string(), "      "));
            }
        }
    }
}
