//! Subprocess implementation of the ContentStore trait.
//!
//! Every query is one invocation of the store CLI (`ipfs` by default):
//!
//! | query       | command                                        |
//! |-------------|------------------------------------------------|
//! | `stat_size` | `files stat --format=<size> /ipfs/<cid>`       |
//! | `stat`      | `files stat /ipfs/<cid>`                       |
//! | `cat`       | `cat --offset=<offset> --length=<length> <cid>` |

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use blobcat_core::ContentId;
use tokio::process::Command;

use crate::error::{Result, StoreError};
use crate::session::{CatSession, Diagnostics};
use crate::traits::ContentStore;

/// Environment variable naming the store repository.
pub const REPO_PATH_ENV: &str = "IPFS_PATH";

/// Configuration for [`CommandStore`].
#[derive(Debug, Clone)]
pub struct CommandStoreConfig {
    /// The store executable.
    pub program: OsString,
    /// Arguments placed before every subcommand.
    pub base_args: Vec<OsString>,
    /// Repository location, exported as `IPFS_PATH` when set.
    pub repo_path: Option<PathBuf>,
    /// Extra environment for every invocation.
    pub envs: Vec<(OsString, OsString)>,
}

impl Default for CommandStoreConfig {
    fn default() -> Self {
        Self {
            program: OsString::from("ipfs"),
            base_args: Vec::new(),
            repo_path: None,
            envs: Vec::new(),
        }
    }
}

/// Content store reached by running its CLI.
#[derive(Debug, Clone, Default)]
pub struct CommandStore {
    config: CommandStoreConfig,
}

impl CommandStore {
    /// Create a store with the given configuration.
    pub fn new(config: CommandStoreConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &CommandStoreConfig {
        &self.config
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.base_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(repo) = &self.config.repo_path {
            cmd.env(REPO_PATH_ENV, repo);
        }
        cmd.envs(self.config.envs.iter().map(|(k, v)| (k, v)));
        cmd
    }

    /// Human-readable command line, for errors and logs.
    fn describe(&self, args: &[String]) -> String {
        std::iter::once(self.config.program.to_string_lossy())
            .chain(self.config.base_args.iter().map(|a| a.to_string_lossy()))
            .chain(args.iter().map(|a| a.as_str().into()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn spawn_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Spawn {
            program: self.config.program.to_string_lossy().into_owned(),
            source,
        }
    }

    /// Run to completion, returning stdout on success.
    async fn output(&self, args: Vec<String>) -> Result<Vec<u8>> {
        let command = self.describe(&args);
        tracing::trace!(%command, "running store command");

        let output = self
            .command(&args)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(StoreError::CommandFailed {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

/// Parse the output of a size query: a decimal integer and one trailing
/// newline.
pub(crate) fn parse_size(command: String, stdout: &[u8]) -> Result<u64> {
    let text = String::from_utf8_lossy(stdout);
    let trimmed = text.strip_suffix('\n').unwrap_or(&text);
    trimmed.parse::<u64>().map_err(|_| StoreError::InvalidOutput {
        command,
        output: trimmed.to_string(),
    })
}

#[async_trait]
impl ContentStore for CommandStore {
    async fn stat_size(&self, cid: &ContentId) -> Result<u64> {
        let args = vec![
            "files".to_string(),
            "stat".to_string(),
            "--format=<size>".to_string(),
            cid.ipfs_path(),
        ];
        let command = self.describe(&args);
        let stdout = self.output(args).await?;
        parse_size(command, &stdout)
    }

    async fn stat(&self, cid: &ContentId) -> Result<()> {
        let args = vec!["files".to_string(), "stat".to_string(), cid.ipfs_path()];
        self.output(args).await.map(|_| ())
    }

    async fn cat(&self, cid: &ContentId, offset: u64, length: u64) -> Result<CatSession> {
        let args = vec![
            "cat".to_string(),
            format!("--offset={offset}"),
            format!("--length={length}"),
            cid.as_str().to_string(),
        ];
        let command = self.describe(&args);
        tracing::trace!(%command, "spawning store read");

        let mut child = self.command(&args).spawn().map_err(|e| self.spawn_error(e))?;
        let stdout = child.stdout.take().ok_or(StoreError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(StoreError::MissingPipe("stderr"))?;

        Ok(CatSession::new(stdout, Diagnostics::capture(stderr)).with_child(child, command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid() -> ContentId {
        ContentId::parse("bafy123").unwrap()
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("q".into(), b"1000\n").unwrap(), 1000);
        assert_eq!(parse_size("q".into(), b"0").unwrap(), 0);

        for bad in [&b"abc\n"[..], b"", b"12 \n", b"-1\n", b"1000\n\n"] {
            let err = parse_size("q".into(), bad).unwrap_err();
            assert!(matches!(err, StoreError::InvalidOutput { .. }), "{bad:?}");
        }
    }

    #[test]
    fn test_describe_includes_base_args() {
        let store = CommandStore::new(CommandStoreConfig {
            base_args: vec!["--api".into(), "/ip4/127.0.0.1/tcp/5001".into()],
            ..CommandStoreConfig::default()
        });
        let args = vec!["files".to_string(), "stat".to_string(), cid().ipfs_path()];
        assert_eq!(
            store.describe(&args),
            "ipfs --api /ip4/127.0.0.1/tcp/5001 files stat /ipfs/bafy123"
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let store = CommandStore::new(CommandStoreConfig {
            program: "blobcat-test-no-such-program".into(),
            ..CommandStoreConfig::default()
        });

        let err = store.stat(&cid()).await.unwrap_err();
        assert!(matches!(err, StoreError::Spawn { .. }));

        let err = store.cat(&cid(), 0, 10).await.err().unwrap();
        assert!(matches!(err, StoreError::Spawn { .. }));
    }
}
