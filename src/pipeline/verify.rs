//! Dependency check: every required tool must resolve before any work begins.
//!
//! The check runs before the workspace is touched, so a missing tool aborts
//! the run with nothing written under the output root.

use crate::error::DocBundleError;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Resolve every tool in order, failing on the first one that is missing.
///
/// `search_path` overrides `$PATH` when given.
pub fn verify_tools(
    tools: &[&str],
    search_path: Option<&OsStr>,
) -> Result<Vec<PathBuf>, DocBundleError> {
    let path_var = search_path.map(OsStr::to_os_string).or_else(|| std::env::var_os("PATH"));

    let mut resolved = Vec::with_capacity(tools.len());
    for &tool in tools {
        match resolve_in(tool, path_var.as_deref()) {
            Some(path) => {
                debug!("{} → {}", tool, path.display());
                resolved.push(path);
            }
            None => {
                error!("required tool '{}' not found", tool);
                return Err(DocBundleError::MissingTool {
                    tool: tool.to_string(),
                });
            }
        }
    }
    Ok(resolved)
}

/// Locate a single executable.
///
/// Names containing a path separator are checked as given; bare names are
/// looked up in each directory of the search path.
pub fn resolve_tool(name: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let path_var: Option<OsString> =
        search_path.map(OsStr::to_os_string).or_else(|| std::env::var_os("PATH"));
    resolve_in(name, path_var.as_deref())
}

fn resolve_in(name: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path_var = path_var?;
    std::env::split_paths(path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| executable_names(name).into_iter().map(move |n| dir.join(n)))
        .find(|p| is_executable(p))
}

#[cfg(windows)]
fn executable_names(name: &str) -> Vec<String> {
    if Path::new(name).extension().is_some() {
        vec![name.to_string()]
    } else {
        vec![format!("{name}.exe"), format!("{name}.bat"), name.to_string()]
    }
}

#[cfg(not(windows))]
fn executable_names(name: &str) -> Vec<String> {
    vec![name.to_string()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
