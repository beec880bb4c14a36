use crate::cli::AlgebraInput;
use nilgrade_kernel::{AlgebraSpec, ExactField, Grading, LieAlgebra, Limits, Rational, catalog};
use serde_json::Value;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub const OUTPUT_SCHEMA: u64 = 1;
const LOG_ENV: &str = "NILGRADE_LOG";

/// Diagnostics go to stderr so JSON on stdout stays parseable.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn or_exit<T, E: Display>(result: Result<T, E>) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

pub fn load_algebra_or_exit(input: &AlgebraInput) -> LieAlgebra<Rational> {
    let algebra = match (&input.algebra, &input.file) {
        (Some(name), _) => or_exit(catalog::algebra(name)),
        (None, Some(path)) => {
            let spec: AlgebraSpec = read_json_file_or_exit(path, "algebra");
            or_exit(LieAlgebra::from_spec(&spec))
        }
        (None, None) => {
            eprintln!("error: one of --algebra or --file is required");
            std::process::exit(1);
        }
    };
    debug!(algebra = %algebra.name(), dimension = algebra.dimension(), "algebra loaded");
    algebra
}

pub fn load_limits_or_exit(input: &AlgebraInput) -> Limits {
    match &input.config {
        Some(path) => or_exit(Limits::load(Path::new(path))),
        None => Limits::default(),
    }
}

pub fn read_json_file_or_exit<T>(path: &str, label: &str) -> T
where
    T: serde::de::DeserializeOwned,
{
    let bytes = fs::read(path).unwrap_or_else(|e| {
        eprintln!("error: failed to read {label} at {path}: {e}");
        std::process::exit(1);
    });
    serde_json::from_slice::<T>(&bytes).unwrap_or_else(|e| {
        eprintln!("error: failed to parse {label} JSON at {path}: {e}");
        std::process::exit(1);
    })
}

pub fn print_json_or_exit(command: &str, payload: &Value) {
    let rendered = serde_json::to_string_pretty(payload).unwrap_or_else(|err| {
        eprintln!("error: failed to render {command} json: {err}");
        std::process::exit(2);
    });
    println!("{rendered}");
}

/// Text report shared by the single-grading commands.
pub fn print_grading<F: ExactField>(command: &str, algebra: &LieAlgebra<F>, grading: &Grading<F>) {
    println!("nilgrade {command}");
    println!("  Algebra: {}", algebra.name());
    println!("  Group: {}", grading.magma());
    println!("  Layers: {}", grading.weights().len());
    println!("  Key: {}", grading.key().short());
    for w in grading.weights() {
        let basis: Vec<String> = grading
            .layers()
            .get(w)
            .map(|vs| vs.iter().map(|v| algebra.format_element(v)).collect())
            .unwrap_or_default();
        println!("    {w} : ({})", basis.join(", "));
    }
}

pub fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
