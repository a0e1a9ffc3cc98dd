//! Output workspace: clear (optionally) and create the directory tree.

use crate::config::Workspace;
use crate::error::DocBundleError;
use std::io::ErrorKind;
use tracing::{debug, info};

/// Ensure the workspace tree exists.
///
/// With `clean` set the output root is removed first, so nothing from a
/// previous run survives. Any filesystem failure is fatal.
pub async fn prepare_workspace(workspace: &Workspace, clean: bool) -> Result<(), DocBundleError> {
    let root = workspace.root();

    if clean {
        match tokio::fs::remove_dir_all(root).await {
            Ok(()) => info!("Cleared previous output at {}", root.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DocBundleError::Workspace {
                    path: root.to_path_buf(),
                    source: e,
                })
            }
        }
    }

    // documents/pdf implies documents.
    for dir in [workspace.diagrams_dir(), workspace.pdf_documents_dir()] {
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DocBundleError::Workspace {
                path: dir.clone(),
                source: e,
            })?;
        debug!("ensured {}", dir.display());
    }

    Ok(())
}
