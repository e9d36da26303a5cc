use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::tempdir;

use cartograph_cli::{Args, run};

/// Demo sources live at the workspace root, not inside the crate
fn demos_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("demos")
}

/// Collects all .cg files from a directory
fn collect_cg_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| {
                    path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("cg")
                })
                .collect()
        })
        .unwrap_or_default();

    // Sort for consistent test output
    files.sort();
    files
}

fn args_for(input: &Path, output: &Path) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        config: None,
        log_level: "off".to_string(),
        validate_only: false,
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demos = collect_cg_files(&demos_path());
    assert!(!demos.is_empty(), "No demos found in demos/");

    let mut failed = Vec::new();
    for demo in &demos {
        let output = temp_dir.path().join(format!(
            "{}.json",
            demo.file_stem().unwrap().to_string_lossy()
        ));

        match run(&args_for(demo, &output)) {
            Ok(()) => {
                let json = fs::read_to_string(&output).expect("Output should be written");
                let value: serde_json::Value =
                    serde_json::from_str(&json).expect("Output should be valid JSON");
                let diagrams = value["diagrams"].as_array().expect("diagrams array");
                assert!(!diagrams.is_empty(), "{} produced no diagrams", demo.display());
            }
            Err(e) => failed.push((demo.clone(), e)),
        }
    }

    if !failed.is_empty() {
        eprintln!("\nDemos that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} demo(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demos = collect_cg_files(&demos_path().join("errors"));
    assert!(!demos.is_empty(), "No error demos found in demos/errors/");

    let mut unexpectedly_succeeded = Vec::new();
    for demo in &demos {
        let output = temp_dir.path().join(format!(
            "error_{}.json",
            demo.file_stem().unwrap().to_string_lossy()
        ));

        if run(&args_for(demo, &output)).is_ok() {
            unexpectedly_succeeded.push(demo.clone());
        }
        assert!(!output.exists(), "{} wrote output despite failing", demo.display());
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_validate_only_writes_nothing() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("input.cg");
    let output = temp_dir.path().join("out.json");
    fs::write(&input, "diagram {\n  container g { shape a }\n  a -> b\n}").expect("write input");

    let mut args = args_for(&input, &output);
    args.validate_only = true;
    run(&args).expect("Valid diagram should pass validation");
    assert!(!output.exists());

    fs::write(&input, "diagram {\n  container g children: [ghost]\n}").expect("write input");
    assert!(run(&args).is_err());
}

#[test]
fn e2e_explicit_config_is_applied() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("input.cg");
    let output = temp_dir.path().join("out.json");
    let config = temp_dir.path().join("config.toml");
    fs::write(&input, "diagram { a -> b }").expect("write input");
    fs::write(&config, "[metrics]\nenabled = true\nall_nodes = true\n").expect("write config");

    let mut args = args_for(&input, &output);
    args.config = Some(config.to_string_lossy().to_string());
    run(&args).expect("Diagram should compile");

    let json = fs::read_to_string(&output).expect("Output should be written");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    let metrics = value["diagrams"][0]["metrics"]["metrics"]
        .as_object()
        .expect("metrics enabled by config");
    assert_eq!(metrics.len(), 2);
    assert!(metrics["a"]["degree"].is_number());
}

#[test]
fn e2e_missing_input_fails() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let args = args_for(
        &temp_dir.path().join("absent.cg"),
        &temp_dir.path().join("out.json"),
    );
    assert!(run(&args).is_err());
}
