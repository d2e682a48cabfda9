//! One running ranged read against the store.
//!
//! A [`CatSession`] owns the stdout stream of a `cat` invocation, the capture
//! of its stderr, and (for subprocess backends) the child handle. Releasing a
//! session hands stdout and the child to a detached task that drains the
//! remaining output and reaps the process, so a slow-exiting process never
//! blocks the caller.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;

/// Boxed stdout of a `cat` invocation.
pub type CatReader = Box<dyn AsyncRead + Send + Unpin>;

/// Captured stderr text of a `cat` invocation.
pub struct Diagnostics {
    capture: Capture,
}

enum Capture {
    Fixed(Vec<u8>),
    Task(JoinHandle<Vec<u8>>),
    Taken,
}

impl Diagnostics {
    /// Diagnostics with no text.
    pub fn empty() -> Self {
        Self::fixed(Vec::new())
    }

    /// Diagnostics known up front.
    pub fn fixed(text: impl Into<Vec<u8>>) -> Self {
        Self {
            capture: Capture::Fixed(text.into()),
        }
    }

    /// Read `stderr` to EOF on a background task.
    pub fn capture<R>(mut stderr: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Err(e) = stderr.read_to_end(&mut buf).await {
                tracing::trace!(error = %e, "stderr capture ended early");
            }
            buf
        });
        Self {
            capture: Capture::Task(task),
        }
    }

    /// The captured text, lossily decoded.
    ///
    /// A running capture is awaited for at most `grace`; past that the text
    /// is reported as empty and the capture keeps draining in the background.
    /// The text can be collected once; later calls return an empty string.
    pub async fn collect(&mut self, grace: Duration) -> String {
        let bytes = match std::mem::replace(&mut self.capture, Capture::Taken) {
            Capture::Fixed(bytes) => bytes,
            Capture::Task(mut task) => match tokio::time::timeout(grace, &mut task).await {
                Ok(Ok(bytes)) => bytes,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "stderr capture task failed");
                    Vec::new()
                }
                Err(_) => {
                    tracing::warn!(?grace, "timed out waiting for stderr capture");
                    Vec::new()
                }
            },
            Capture::Taken => Vec::new(),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// A started ranged read.
pub struct CatSession {
    stdout: CatReader,
    diagnostics: Diagnostics,
    child: Option<(Child, String)>,
}

impl CatSession {
    /// Session over an arbitrary stdout stream.
    pub fn new<R>(stdout: R, diagnostics: Diagnostics) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            stdout: Box::new(stdout),
            diagnostics,
            child: None,
        }
    }

    /// Attach the child process producing stdout, reaped on release.
    pub fn with_child(mut self, child: Child, command: impl Into<String>) -> Self {
        self.child = Some((child, command.into()));
        self
    }

    /// The stream of bytes produced by the read.
    pub fn stdout(&mut self) -> &mut CatReader {
        &mut self.stdout
    }

    /// Release the session.
    ///
    /// Spawns a detached task that reads stdout to EOF and then waits on the
    /// child. Returns the stderr capture for the caller to inspect.
    pub fn release(self) -> Diagnostics {
        let Self {
            mut stdout,
            diagnostics,
            child,
        } = self;

        tokio::spawn(async move {
            let drained = tokio::io::copy(&mut stdout, &mut tokio::io::sink()).await;
            if let Err(e) = &drained {
                tracing::trace!(error = %e, "drain ended with error");
            }
            drop(stdout);

            if let Some((mut child, command)) = child {
                match child.wait().await {
                    Ok(status) => tracing::trace!(
                        %command,
                        %status,
                        drained = drained.unwrap_or(0),
                        "reaped store command"
                    ),
                    Err(e) => tracing::warn!(%command, error = %e, "failed to reap store command"),
                }
            }
        });

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_diagnostics_collect_once() {
        let mut diag = Diagnostics::fixed("Error: lock held");
        assert_eq!(diag.collect(Duration::ZERO).await, "Error: lock held");
        assert_eq!(diag.collect(Duration::ZERO).await, "");
    }

    #[tokio::test]
    async fn test_captured_diagnostics() {
        let stderr = std::io::Cursor::new(b"someone else has the lock\n".to_vec());
        let mut diag = Diagnostics::capture(stderr);
        let text = diag.collect(Duration::from_secs(5)).await;
        assert_eq!(text, "someone else has the lock\n");
    }

    #[tokio::test]
    async fn test_capture_times_out_on_open_stderr() {
        let (_writer, reader) = tokio::io::duplex(16);
        let mut diag = Diagnostics::capture(reader);
        assert_eq!(diag.collect(Duration::from_millis(10)).await, "");
    }

    #[tokio::test]
    async fn test_release_returns_diagnostics() {
        let mut session = CatSession::new(
            std::io::Cursor::new(vec![7u8; 1024]),
            Diagnostics::fixed("warning"),
        );
        let mut first = [0u8; 8];
        session.stdout().read_exact(&mut first).await.unwrap();
        assert_eq!(first, [7u8; 8]);

        let mut diag = session.release();
        assert_eq!(diag.collect(Duration::ZERO).await, "warning");
    }
}
