use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "nilgrade-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn run_nilgrade<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_nilgrade");
    Command::new(bin)
        .args(args)
        .env_remove("NILGRADE_LOG")
        .output()
        .expect("nilgrade command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn layer_bases(grading: &Value) -> Vec<Vec<String>> {
    let mut bases: Vec<Vec<String>> = grading["layers"]
        .as_array()
        .expect("layers should be an array")
        .iter()
        .map(|layer| {
            layer["basis"]
                .as_array()
                .expect("basis should be an array")
                .iter()
                .map(|b| b.as_str().unwrap_or_default().to_string())
                .collect()
        })
        .collect();
    bases.sort();
    bases
}

#[test]
fn catalog_json_smoke() {
    let output = run_nilgrade(["catalog", "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["schema"], 1);
    let algebras = payload["algebras"].as_array().expect("algebras array");
    assert_eq!(algebras.len(), 16);
    let heisenberg = algebras
        .iter()
        .find(|a| a["name"] == "L3_2")
        .expect("L3_2 should be listed");
    assert_eq!(heisenberg["dimension"], 3);
    assert_eq!(heisenberg["step"], 2);
}

#[test]
fn catalog_text_smoke() {
    let output = run_nilgrade(["catalog"]);
    assert_success(&output);
    let text = stdout_text(&output);
    assert!(text.starts_with("nilgrade catalog"));
    assert!(text.contains("Algebras: 16"));
}

#[test]
fn maximal_grading_of_a_file_algebra() {
    let output = run_nilgrade(["maximal", "--file", &fixture("heis.json"), "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["schema"], 1);
    assert_eq!(payload["algebra"], "heis");
    assert_eq!(payload["grading"]["magma"], "Z^2");
    assert_eq!(
        layer_bases(&payload["grading"]),
        vec![vec!["X".to_string()], vec!["Y".to_string()], vec!["Z".to_string()]]
    );
}

#[test]
fn stratify_catalog_algebra() {
    let output = run_nilgrade(["stratify", "--algebra", "L4_3", "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["step"], 3);
    assert_eq!(payload["grading"]["magma"], "Z");
    let weights: Vec<&str> = payload["grading"]["layers"]
        .as_array()
        .expect("layers array")
        .iter()
        .map(|l| l["weight"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(weights, vec!["1", "2", "3"]);
}

#[test]
fn stratify_text_lists_layers() {
    let output = run_nilgrade(["stratify", "--algebra", "L3_2"]);
    assert_success(&output);
    let text = stdout_text(&output);
    assert!(text.starts_with("nilgrade stratify"));
    assert!(text.contains("Algebra: L3_2"));
    assert!(text.contains("Layers: 2"));
}

#[test]
fn non_stratifiable_algebra_fails_with_domain_error() {
    let output = run_nilgrade(["stratify", "--file", &fixture("ns5.json"), "--json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(stderr_text(&output).contains("error: the Lie algebra ns5 is not stratifiable"));
}

#[test]
fn maximal_grading_retries_over_a_quadratic_field() {
    let output = run_nilgrade(["maximal", "--file", &fixture("h3c.json"), "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["algebra"], "h3C");
    assert_eq!(payload["field"], "Q(i)");
    assert_eq!(payload["grading"]["magma"], "Z^4");
    assert_eq!(layer_bases(&payload["grading"]).len(), 6);

    let output = run_nilgrade(["maximal", "--file", &fixture("heis.json")]);
    assert_success(&output);
    assert!(stdout_text(&output).contains("Field: Q"));
}

#[test]
fn unknown_catalog_name_fails() {
    let output = run_nilgrade(["maximal", "--algebra", "L6_1"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_text(&output).contains("unknown algebra: L6_1"));
}

#[test]
fn positive_grading_has_positive_weights() {
    let output = run_nilgrade(["positive", "--algebra", "L3_2", "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["optimized"], true);
    assert_eq!(payload["grading"]["magma"], "Z");
    for layer in payload["grading"]["layers"].as_array().expect("layers array") {
        let weight: i64 = layer["weight"]
            .as_str()
            .and_then(|w| w.parse().ok())
            .expect("integer weight");
        assert!(weight > 0);
    }
}

#[test]
fn integer_grading_keeps_torsion_free_layers() {
    let output = run_nilgrade(["integer", "--algebra", "L4_3", "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["same_layers"], true);
    assert_eq!(payload["grading"]["magma"], "Z");
}

#[test]
fn torsion_free_gradings_of_heisenberg() {
    let output = run_nilgrade(["torsion-free", "--algebra", "L3_2", "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["count"], 5);
    assert_eq!(payload["gradings"][0]["label"], "2.111");
}

#[test]
fn classify_groups_isomorphic_gradings() {
    let output = run_nilgrade(["classify", "--algebra", "L3_2", "--reduced", "--certificates", "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["gradings"], 5);
    assert_eq!(payload["reduced"], true);
    let classes = payload["classes"].as_array().expect("classes array");
    assert_eq!(classes.len(), 4);
    let members: usize = classes
        .iter()
        .map(|c| c["class"]["representatives"].as_array().map_or(0, |r| r.len()))
        .sum();
    assert_eq!(members, 5);
    for class in classes {
        let certified = class["class"]["certified"].as_array().map_or(0, |c| c.len());
        let certificates = class["certificates"].as_array().map_or(0, |c| c.len());
        assert_eq!(certified, certificates);
    }
}

#[test]
fn config_file_limits_are_applied() {
    let tmp = TempDirGuard::new("config");
    let config = tmp.path().join("limits.toml");
    fs::write(&config, "max_quotient_subspaces = 1\n").expect("config should be written");

    let output = run_nilgrade([
        "torsion-free",
        "--algebra",
        "L3_2",
        "--config",
        config.to_str().expect("utf-8 temp path"),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_text(&output).starts_with("error:"));
}

#[test]
fn malformed_algebra_file_fails() {
    let tmp = TempDirGuard::new("malformed");
    let path = tmp.path().join("broken.json");
    fs::write(&path, "{ \"name\": \"broken\" ").expect("fixture should be written");

    let output = run_nilgrade(["maximal", "--file", path.to_str().expect("utf-8 temp path")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_text(&output).contains("failed to parse algebra JSON"));
}

#[test]
fn algebra_and_file_conflict() {
    let output = run_nilgrade(["maximal", "--algebra", "L3_2", "--file", &fixture("heis.json")]);
    assert!(!output.status.success());
}
