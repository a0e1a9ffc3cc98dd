//! Index page: one Markdown file linking every produced artefact.
//!
//! Links are relative to `documents/index.md`. Only recorded artefacts are
//! linked, so the page never points at something a stage failed to produce.

use crate::error::DocBundleError;
use crate::output::{ConvertedDocument, NarrativeOutputs, RenderedDiagram};
use crate::pipeline::references::{link_target, link_text};
use std::path::Path;
use tracing::info;

pub const TITLE: &str = "# Documentation Index";
pub const NO_DOCUMENTS: &str = "_No reference PDFs were found._";
pub const NO_DIAGRAMS: &str = "_No diagrams were rendered._";

/// Render the index page.
pub fn render_index(
    narrative: &NarrativeOutputs,
    documents: &[ConvertedDocument],
    diagrams: &[RenderedDiagram],
) -> String {
    let mut out = String::new();
    out.push_str(TITLE);
    out.push_str("\n\n");

    out.push_str("## Project Overview\n\n");
    out.push_str(&format!(
        "- [Overview (HTML)]({})\n",
        link_target(&narrative.html)
    ));
    out.push_str(&format!(
        "- [Overview (PDF)]({})\n",
        link_target(&narrative.pdf)
    ));

    out.push_str("\n## Converted Reference Documents\n\n");
    if documents.is_empty() {
        out.push_str(NO_DOCUMENTS);
        out.push('\n');
    } else {
        for doc in documents {
            out.push_str(&format!(
                "- [{}]({})\n",
                link_text(&doc.display_name),
                link_target(&format!("pdf/{}", doc.markdown_file()))
            ));
        }
    }

    out.push_str("\n## Diagrams\n\n");
    if diagrams.is_empty() {
        out.push_str(NO_DIAGRAMS);
        out.push('\n');
    } else {
        for (i, diagram) in diagrams.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("### {}\n\n", diagram.name));
            out.push_str(&format!(
                "![{}]({})\n\n",
                link_text(&diagram.name),
                link_target(&format!("../diagrams/{}", diagram.svg_file()))
            ));
            out.push_str(&format!(
                "[PDF version]({})\n",
                link_target(&format!("../diagrams/{}", diagram.pdf_file()))
            ));
        }
    }

    out
}

/// Render and write the index page to `path`.
pub async fn write_index(
    path: &Path,
    narrative: &NarrativeOutputs,
    documents: &[ConvertedDocument],
    diagrams: &[RenderedDiagram],
) -> Result<(), DocBundleError> {
    let text = render_index(narrative, documents, diagrams);
    tokio::fs::write(path, text)
        .await
        .map_err(|e| DocBundleError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    info!(
        "Index written to {} ({} document(s), {} diagram(s))",
        path.display(),
        documents.len(),
        diagrams.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(display: &str) -> ConvertedDocument {
        ConvertedDocument {
            display_name: display.to_string(),
            safe_name: display.replace(' ', "_"),
            pages: 1,
        }
    }

    #[test]
    fn empty_sections_say_so() {
        let md = render_index(&NarrativeOutputs::for_stem("README"), &[], &[]);
        assert_eq!(
            md,
            "# Documentation Index\n\n\
             ## Project Overview\n\n\
             - [Overview (HTML)](README.html)\n\
             - [Overview (PDF)](README.pdf)\n\n\
             ## Converted Reference Documents\n\n\
             _No reference PDFs were found._\n\n\
             ## Diagrams\n\n\
             _No diagrams were rendered._\n"
        );
    }

    #[test]
    fn documents_listed_in_recording_order() {
        let md = render_index(
            &NarrativeOutputs::for_stem("README"),
            &[doc("Green Book"), doc("Blue Book")],
            &[],
        );
        let green = md.find("- [Green Book](pdf/Green_Book.md)").unwrap();
        let blue = md.find("- [Blue Book](pdf/Blue_Book.md)").unwrap();
        assert!(green < blue);
        assert!(!md.contains(NO_DOCUMENTS));
    }

    #[test]
    fn bracketed_names_do_not_break_links() {
        let md = render_index(
            &NarrativeOutputs::for_stem("README"),
            &[doc("Spec ]v2")],
            &[RenderedDiagram::new("flow[1]")],
        );
        assert!(md.contains("- [Spec \\]v2](pdf/Spec_]v2.md)\n"), "got: {md}");
        assert!(md.contains("![flow\\[1\\]](../diagrams/flow[1].svg)"), "got: {md}");
    }

    #[test]
    fn diagrams_are_embedded() {
        let md = render_index(
            &NarrativeOutputs::for_stem("README"),
            &[],
            &[RenderedDiagram::new("server_flow"), RenderedDiagram::new("client_flow")],
        );
        assert!(md.contains("### server_flow\n\n![server_flow](../diagrams/server_flow.svg)\n"));
        assert!(md.contains("[PDF version](../diagrams/client_flow.pdf)"));
        assert!(md.find("### server_flow").unwrap() < md.find("### client_flow").unwrap());
        assert!(!md.contains(NO_DIAGRAMS));
    }
}
