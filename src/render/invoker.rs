//! Renderer process management
//!
//! Runs one renderer child per request, collects its stdout in memory and
//! enforces the configured wall-clock limit.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};

use super::RenderError;

/// A fully prepared renderer invocation
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl RenderJob {
    /// Command line for logging, e.g. `/bin/wkhtmltopdf --dpi 300`
    pub fn display(&self, input: &Path) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line.push(' ');
        line.push_str(&input.display().to_string());
        line.push_str(" -");
        line
    }

    /// Run the renderer on `input`, returning everything it wrote to stdout.
    ///
    /// The input path is passed as the last-but-one argument and `-` last,
    /// which tells wkhtmltopdf to write the artifact to stdout. A non-zero
    /// exit or an expired `limit` yields an error and no output.
    pub async fn run(&self, input: &Path, limit: Option<Duration>) -> Result<Vec<u8>, RenderError> {
        tracing::debug!("Running: {}", self.display(input));

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(input)
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RenderError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RenderError::Io(std::io::Error::other("renderer stdout not captured")))?;

        let (status, output) = match limit {
            None => collect(&mut child, stdout).await?,
            Some(limit) => {
                let outcome = tokio::time::timeout(limit, collect(&mut child, stdout)).await;
                match outcome {
                    Ok(result) => result?,
                    Err(_) => {
                        if let Err(e) = child.kill().await {
                            tracing::warn!("Failed to kill renderer after timeout: {}", e);
                        }
                        return Err(RenderError::Timeout(limit));
                    }
                }
            }
        };

        if !status.success() {
            return Err(RenderError::Failed(status));
        }

        Ok(output)
    }
}

/// Drain stdout while waiting for exit so a full pipe cannot stall the child.
async fn collect(
    child: &mut Child,
    mut stdout: ChildStdout,
) -> Result<(ExitStatus, Vec<u8>), RenderError> {
    let mut output = Vec::new();
    let (read, status) = tokio::join!(stdout.read_to_end(&mut output), child.wait());
    read?;
    Ok((status?, output))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;
    use tempfile::TempDir;

    fn script(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("input.html");
        std::fs::write(&path, body).unwrap();
        path
    }

    fn shell() -> RenderJob {
        RenderJob {
            program: PathBuf::from("/bin/sh"),
            args: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let dir = TempDir::new().unwrap();
        let input = script(&dir, "printf 'rendered:%s' \"$1\"\n");

        let output = shell().run(&input, Some(Duration::from_secs(10))).await.unwrap();
        assert_eq!(output, b"rendered:-");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_error() {
        let dir = TempDir::new().unwrap();
        let input = script(&dir, "echo partial; exit 3\n");

        let err = shell().run(&input, None).await.unwrap_err();
        match err {
            RenderError::Failed(status) => assert_eq!(status.code(), Some(3)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let dir = TempDir::new().unwrap();
        let input = script(&dir, "sleep 30\n");

        let started = Instant::now();
        let err = shell()
            .run(&input, Some(Duration::from_millis(200)))
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let dir = TempDir::new().unwrap();
        let input = script(&dir, "");
        let job = RenderJob {
            program: PathBuf::from("/nonexistent/wkhtmltopdf"),
            args: Vec::new(),
        };

        let err = job.run(&input, None).await.unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
    }

    #[test]
    fn test_display() {
        let job = RenderJob {
            program: PathBuf::from("/bin/wkhtmltoimage"),
            args: vec!["--format".into(), "png".into(), "-q".into()],
        };
        assert_eq!(
            job.display(Path::new("/tmp/a.html")),
            "/bin/wkhtmltoimage --format png -q /tmp/a.html -"
        );
    }
}
