//! Console presentation of build summaries, validation reports, and model
//! details. All output goes to stdout; logs go to stderr.

use std::io::{self, Write};

use tonegraph_artifact::{
    ArtifactError, BuildSummary, LoadedModel, ValidationReport, ValidationWarning,
};
use tonegraph_core::TensorSpec;

const RULE_WIDTH: usize = 60;

pub fn print_build_summary(summary: &BuildSummary) {
    println!("[OK] Model created successfully: {}", summary.path.display());
    println!(
        "     File size: {} bytes ({:.2} KB)",
        summary.size_bytes,
        summary.size_bytes as f64 / 1024.0
    );
    for spec in &summary.inputs {
        println!("     Input:  {:?} {}", spec.shape, spec.dtype);
    }
    for spec in &summary.outputs {
        println!("     Output: {:?} {}", spec.shape, spec.dtype);
    }
    println!("     Effect: {}", summary.variant.effect());
    if summary.quantized {
        println!("     Weights: int8");
    }
}

/// Render the outcome of `verify`. Read failures are reported, not returned.
pub fn write_verify(
    out: &mut impl Write,
    outcome: &Result<ValidationReport, ArtifactError>,
    json: bool,
) -> io::Result<()> {
    let report = match outcome {
        Ok(report) => report,
        Err(e) => return writeln!(out, "[X] Could not read model file: {e}"),
    };
    if !json {
        return write_validation(out, report);
    }
    match serde_json::to_string_pretty(report) {
        Ok(s) => writeln!(out, "{s}"),
        Err(e) => writeln!(out, "[X] Could not serialize report: {e}"),
    }
}

fn write_validation(out: &mut impl Write, report: &ValidationReport) -> io::Result<()> {
    if !report.found {
        return writeln!(out, "[X] Model file not found: {}", report.path.display());
    }

    writeln!(out, "[OK] Model file found: {}", report.path.display())?;
    writeln!(
        out,
        "[OK] File size: {} bytes ({:.2} MB)",
        report.size_bytes,
        report.size_bytes as f64 / 1024.0 / 1024.0
    )?;
    if report.magic_ok {
        writeln!(out, "[OK] Valid model container (TFL3 format)")?;
    }
    for w in &report.warnings {
        writeln!(out, "[WARN] {w}")?;
    }

    writeln!(out, "\n{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "Expected specifications:")?;
    for entry in &report.expected_specs {
        writeln!(out, "  {entry}")?;
    }
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "If the model has different specifications, the application's")?;
    writeln!(out, "tensor constants must be updated to match.")
}

pub fn print_model_details(model: &LoadedModel) {
    println!("=== INPUT DETAILS ===");
    print_specs("Input", model.inputs());
    println!("\n=== OUTPUT DETAILS ===");
    print_specs("Output", model.outputs());
    println!(
        "\nFile: {}\nOps: {}  Weights: {}  Size: {} bytes",
        model.path().display(),
        model.op_names().join(" -> "),
        if model.is_quantized() { "int8" } else { "float32" },
        model.byte_len()
    );
}

pub fn print_warnings(warnings: &[ValidationWarning]) {
    for w in warnings {
        println!("[WARN] {w}");
    }
}

fn print_specs(label: &str, specs: &[TensorSpec]) {
    for (i, spec) in specs.iter().enumerate() {
        println!("\n{label} {i}:");
        println!("  Name: {}", spec.name);
        println!("  Shape: {:?}", spec.shape);
        println!("  Type: {}", spec.dtype);
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use tonegraph_artifact::{BuildOptions, build_artifact, validate};

    fn render(outcome: &Result<ValidationReport, ArtifactError>, json: bool) -> String {
        let mut out = Vec::new();
        write_verify(&mut out, outcome, json).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_verify_missing_file_reports_not_found() {
        let outcome = validate(Path::new("/definitely/missing/model.tflite"));
        let text = render(&outcome, false);
        assert!(text.starts_with("[X] Model file not found:"), "{text}");
        assert!(!text.contains("Expected specifications"));
    }

    #[test]
    fn test_verify_read_failure_is_rendered() {
        let outcome = Err(ArtifactError::Io {
            path: PathBuf::from("model.tflite"),
            source: io::Error::other("device unplugged"),
        });
        let text = render(&outcome, true);
        assert!(text.starts_with("[X] Could not read model file:"), "{text}");
        assert!(text.contains("device unplugged"), "{text}");
    }

    #[test]
    fn test_verify_valid_artifact_lists_contract() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.tflite");
        build_artifact(
            tonegraph_core::StyleVariant::SepiaMatrix,
            &path,
            &BuildOptions::default(),
        )
        .unwrap();
        let text = render(&validate(&path), false);
        assert!(text.contains("[OK] Valid model container (TFL3 format)"), "{text}");
        assert!(text.contains("[1, 384, 384, 3]"), "{text}");
        assert!(!text.contains("[WARN]"), "{text}");
    }

    #[test]
    fn test_verify_json_has_report_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.bin");
        std::fs::write(&path, b"NOPE1234").unwrap();
        let text = render(&validate(&path), true);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["found"], true);
        assert_eq!(value["magic_ok"], false);
        assert_eq!(value["size_bytes"], 8);
        assert!(!value["warnings"].as_array().unwrap().is_empty());
    }
}
