//! Pipeline stages for assembling the documentation bundle.
//!
//! Each submodule implements exactly one stage. Stages only share data
//! through the files they write and the bookkeeping records they return;
//! [`crate::run()`] threads those records into the index builder.
//!
//! ## Data Flow
//!
//! ```text
//! verify ──▶ workspace ──▶ api_docs ──▶ diagrams ──▶ narrative ──▶ references ──▶ index
//! (PATH)     (mkdir)       (doxygen)    (plantuml)   (pandoc)      (pdftohtml,    (Markdown)
//!                                                                   pandoc,
//!                                                                   pdftoppm)
//! ```
//!
//! 1. [`verify`]     — every tool must resolve on PATH before anything is written
//! 2. [`workspace`]  — clear and create the output tree
//! 3. [`api_docs`]   — one extractor run over the source tree
//! 4. [`diagrams`]   — render each description to SVG and PDF
//! 5. [`narrative`]  — README to HTML and PDF
//! 6. [`references`] — each PDF to Markdown plus page images; the only stage
//!    that skips an item instead of failing
//! 7. [`index`]      — link everything that was recorded
//!
//! [`postprocess`] holds the Markdown cleanup rules used by `references`.

pub mod api_docs;
pub mod diagrams;
pub mod index;
pub mod narrative;
pub mod postprocess;
pub mod references;
pub mod verify;
pub mod workspace;
