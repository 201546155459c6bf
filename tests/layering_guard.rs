//! Layering guardrails to keep the configuration crate free of IO machinery.
//!
//! `suiterun_config` parses suite text and nothing else. This test scans its `Cargo.toml` and
//! fails if the process runtime, diagnostic tracing or temp-dir helpers appear in `[dependencies]`.

const FORBIDDEN: &[&str] = &["tokio", "tracing", "tracing-subscriber", "tempfile", "serde_json"];

fn dependency_names(manifest: &str) -> Vec<String> {
    let mut in_dependencies = false;
    let mut names = Vec::new();

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        // Track when we enter/exit the `[dependencies]` table.
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }

        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Strip inline comments for robustness.
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        if let Some((name, _)) = line_no_comment.split_once('=') {
            names.push(name.trim().to_string());
        }
    }
    names
}

#[test]
fn config_crate_has_no_io_dependencies() {
    let manifest = include_str!("../crates/suiterun_config/Cargo.toml");
    let names = dependency_names(manifest);
    assert!(names.iter().any(|n| n == "toml"), "expected toml in [dependencies]: {names:?}");

    for name in &names {
        if FORBIDDEN.contains(&name.as_str()) {
            panic!("`{name}` must not appear in suiterun_config's [dependencies]");
        }
    }
}

#[test]
fn harness_depends_on_config_crate() {
    let manifest = include_str!("../Cargo.toml");
    assert!(dependency_names(manifest).iter().any(|n| n == "suiterun_config"));
}
