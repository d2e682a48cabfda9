//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur while talking to the content store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store command could not be started.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The store command ran and exited unsuccessfully.
    #[error("`{command}` exited with {}: {stderr}", exit_code(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The store command succeeded but printed something unexpected.
    #[error("`{command}` returned unexpected output {output:?}")]
    InvalidOutput { command: String, output: String },

    /// A piped stdio handle was not available after spawn.
    #[error("{0} pipe unavailable")]
    MissingPipe(&'static str),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "signal".to_string(),
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
