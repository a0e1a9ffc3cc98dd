//! External tool invocation.
//!
//! Every stage that needs an external program describes the call as an
//! [`Invocation`] and hands it to a [`ToolRunner`]. The default
//! [`SystemRunner`] spawns the process with `tokio::process` and awaits it to
//! completion before returning, so the pipeline never has two tools running at
//! once. Tests substitute their own runner that writes the files a real tool
//! would have produced.

use crate::error::DocBundleError;
use crate::progress::Stage;
use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// A single external-program call: program name, arguments, optional stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
    pub stdin: Option<Vec<u8>>,
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Bytes written to the child's stdin before waiting on it.
    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Arguments as lossy UTF-8, for matching in tests and logs.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        if self.stdin.is_some() {
            f.write_str(" <stdin>")?;
        }
        Ok(())
    }
}

/// What a finished tool reported back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub success: bool,
    pub stderr: String,
}

impl ToolOutput {
    pub fn ok() -> Self {
        Self {
            status: Some(0),
            success: true,
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            success: false,
            stderr: stderr.into(),
        }
    }
}

/// Runs external programs on behalf of the pipeline.
///
/// Implementations must not return before the program has exited.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<ToolOutput>;
}

/// Spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl ToolRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<ToolOutput> {
        let mut command = tokio::process::Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        if let Some(ref dir) = invocation.current_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn()?;
        if let Some(ref input) = invocation.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                // A child may exit without draining its input; its exit
                // status decides the outcome, not the broken pipe.
                match stdin.write_all(input).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                        debug!("'{}' closed stdin early", invocation.program);
                    }
                    Err(e) => return Err(e),
                }
                // Dropping closes the pipe so the child sees EOF.
                drop(stdin);
            }
        }

        let output = child.wait_with_output().await?;
        Ok(ToolOutput {
            status: output.status.code(),
            success: output.status.success(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run a tool whose failure is fatal to the run.
pub async fn run_checked(
    runner: &dyn ToolRunner,
    stage: Stage,
    invocation: &Invocation,
) -> Result<ToolOutput, DocBundleError> {
    debug!(stage = %stage, "exec: {}", invocation);
    let output = runner
        .run(invocation)
        .await
        .map_err(|e| DocBundleError::ToolLaunch {
            tool: invocation.program.clone(),
            source: e,
        })?;

    if !output.success {
        return Err(DocBundleError::ToolFailed {
            tool: invocation.program.clone(),
            stage,
            status: output.status,
            stderr: output.stderr,
        });
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(ToolOutput);

    #[async_trait]
    impl ToolRunner for Fixed {
        async fn run(&self, _invocation: &Invocation) -> std::io::Result<ToolOutput> {
            Ok(self.0.clone())
        }
    }

    struct CannotSpawn;

    #[async_trait]
    impl ToolRunner for CannotSpawn {
        async fn run(&self, _invocation: &Invocation) -> std::io::Result<ToolOutput> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
        }
    }

    #[test]
    fn display_quotes_args_with_spaces() {
        let inv = Invocation::new("pdftohtml")
            .args(["-s", "-noframes"])
            .arg("docs/references/Blue Book.pdf")
            .arg("/tmp/x/extract");
        assert_eq!(
            inv.to_string(),
            "pdftohtml -s -noframes 'docs/references/Blue Book.pdf' /tmp/x/extract"
        );
    }

    #[test]
    fn display_marks_stdin() {
        let inv = Invocation::new("doxygen").arg("-").stdin("PROJECT_NAME = x\n");
        assert_eq!(inv.to_string(), "doxygen - <stdin>");
    }

    #[test]
    fn run_checked_passes_success_through() {
        let runner = Fixed(ToolOutput::ok());
        let inv = Invocation::new("plantuml");
        let out = tokio_test::block_on(run_checked(&runner, Stage::Diagrams, &inv)).unwrap();
        assert!(out.success);
    }

    #[test]
    fn run_checked_maps_failure_status() {
        let runner = Fixed(ToolOutput::failed(2, "syntax error"));
        let inv = Invocation::new("plantuml");
        let err = tokio_test::block_on(run_checked(&runner, Stage::Diagrams, &inv)).unwrap_err();
        match err {
            DocBundleError::ToolFailed {
                tool,
                stage,
                status,
                stderr,
            } => {
                assert_eq!(tool, "plantuml");
                assert_eq!(stage, Stage::Diagrams);
                assert_eq!(status, Some(2));
                assert_eq!(stderr, "syntax error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn run_checked_maps_launch_error() {
        let inv = Invocation::new("pandoc");
        let err =
            tokio_test::block_on(run_checked(&CannotSpawn, Stage::Narrative, &inv)).unwrap_err();
        assert!(matches!(err, DocBundleError::ToolLaunch { ref tool, .. } if tool == "pandoc"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_runner_reports_exit_status_and_stdin() {
        let ok = SystemRunner
            .run(&Invocation::new("sh").args(["-c", "read line; test \"$line\" = hello"]).stdin("hello\n"))
            .await
            .unwrap();
        assert!(ok.success);

        let failed = SystemRunner
            .run(&Invocation::new("sh").args(["-c", "echo boom >&2; exit 3"]))
            .await
            .unwrap();
        assert!(!failed.success);
        assert_eq!(failed.status, Some(3));
        assert_eq!(failed.stderr.trim(), "boom");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unread_stdin_does_not_hide_exit_status() {
        let input = vec![b'x'; 1 << 20];
        let ok = SystemRunner
            .run(&Invocation::new("sh").args(["-c", "exit 0"]).stdin(input.clone()))
            .await
            .unwrap();
        assert!(ok.success);

        let failed = SystemRunner
            .run(&Invocation::new("sh").args(["-c", "exit 4"]).stdin(input))
            .await
            .unwrap();
        assert_eq!(failed.status, Some(4));
    }
}
