//! End-to-end tests against the real toolchain.
//!
//! These run doxygen, plantuml, pandoc, wkhtmltopdf, pdftohtml and pdftoppm
//! for real, so they are gated behind the `E2E_ENABLED` environment variable
//! and additionally skip when any tool is missing from PATH.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture

use docbundle::{check_tools, run, DocBundleError, PipelineConfig, ToolSet};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set and every tool resolves.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let probe = PipelineConfig::builder().build().unwrap();
        let missing: Vec<_> = check_tools(&probe)
            .into_iter()
            .filter(|(_, path)| path.is_none())
            .map(|(tool, _)| tool)
            .collect();
        if !missing.is_empty() {
            println!("SKIP — tools not on PATH: {}", missing.join(", "));
            return;
        }
    }};
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A small project with one diagram, one real reference PDF built with
/// pandoc, and one file that only pretends to be a PDF.
fn sample_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "src/meter.h", "/** A meter register. */\nstruct Register { int value; };\n");
    write(root, "Doxyfile", "PROJECT_NAME = sample\nGENERATE_LATEX = NO\nQUIET = YES\n");
    write(root, "README.md", "# Sample\n\nNarrative text.\n");
    write(
        root,
        "docs/diagrams/server_flow.puml",
        "@startuml\nClient -> Server: GET\nServer --> Client: data\n@enduml\n",
    );
    write(root, "docs/references/source.md", "# Blue Book\n\nInterface classes.\n");
    write(root, "docs/references/Corrupt Spec.pdf", "this is not a pdf");

    let status = Command::new("pandoc")
        .arg(root.join("docs/references/source.md"))
        .args(["-f", "markdown", "-t", "html", "--pdf-engine=wkhtmltopdf", "-o"])
        .arg(root.join("docs/references/Blue Book.pdf"))
        .status()
        .expect("pandoc runs");
    assert!(status.success(), "could not build the sample reference PDF");
    tmp
}

/// Assert the markdown passes basic quality checks.
fn assert_markdown_quality(md: &str, context: &str) {
    assert!(!md.trim().is_empty(), "[{context}] Markdown is empty");
    assert!(md.ends_with('\n'), "[{context}] Markdown must end with a newline");
    assert!(
        !md.ends_with("\n\n"),
        "[{context}] Markdown must end with exactly one newline"
    );
    assert!(
        !md.contains("\n\n\n\n"),
        "[{context}] Output has more than 3 consecutive blank lines"
    );
    assert!(!md.contains('\u{00A0}'), "[{context}] Output contains a no-break space");
    for line in md.lines() {
        assert_eq!(line, line.trim_end(), "[{context}] trailing whitespace: {line:?}");
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_bundle() {
    e2e_skip_unless_ready!();
    let project = sample_project();
    let config = PipelineConfig::builder()
        .project_root(project.path())
        .build()
        .unwrap();

    let report = run(&config).await.expect("bundle builds");
    let out = project.path().join("docs/output");

    assert!(out.join("api").is_dir());
    assert!(out.join("diagrams/server_flow.svg").is_file());
    assert!(out.join("diagrams/server_flow.pdf").is_file());
    assert!(out.join("documents/README.html").is_file());
    assert!(out.join("documents/README.pdf").is_file());

    let md = std::fs::read_to_string(out.join("documents/pdf/Blue_Book.md")).unwrap();
    println!("── Blue_Book.md ──\n{md}");
    assert_markdown_quality(&md, "Blue Book");
    assert!(md.contains("Interface classes"));
    assert!(md.contains("![Blue Book page 1](Blue_Book_figures/page_1.png)"));
    assert!(out.join("documents/pdf/Blue_Book_figures/page_1.png").is_file());

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].display_name, "Corrupt Spec");
    assert!(!out.join("documents/pdf/Corrupt_Spec.md").exists());

    let index = std::fs::read_to_string(&report.index_path).unwrap();
    println!("── index.md ──\n{index}");
    assert!(index.contains("- [Blue Book](pdf/Blue_Book.md)"));
    assert!(index.contains("![server_flow](../diagrams/server_flow.svg)"));
    assert!(!index.contains("Corrupt"));
}

#[tokio::test]
async fn test_rerun_replaces_previous_output() {
    e2e_skip_unless_ready!();
    let project = sample_project();
    let config = PipelineConfig::builder()
        .project_root(project.path())
        .build()
        .unwrap();

    run(&config).await.unwrap();
    let stale = project.path().join("docs/output/diagrams/removed.svg");
    std::fs::write(&stale, "<svg/>").unwrap();
    let report = run(&config).await.unwrap();

    assert!(!stale.exists());
    assert_eq!(report.diagrams.len(), 1);
    assert_eq!(report.documents.len(), 1);
}

#[tokio::test]
async fn test_missing_tool_reported_by_name() {
    e2e_skip_unless_ready!();
    let project = TempDir::new().unwrap();
    write(project.path(), "README.md", "# Sample\n");
    let config = PipelineConfig::builder()
        .project_root(project.path())
        .tools(ToolSet {
            plantuml: "plantuml-not-installed".to_string(),
            ..ToolSet::default()
        })
        .build()
        .unwrap();

    let err = run(&config).await.unwrap_err();
    assert!(
        matches!(err, DocBundleError::MissingTool { ref tool } if tool == "plantuml-not-installed"),
        "unexpected error: {err}"
    );
    assert!(!project.path().join("docs/output").exists());
}
