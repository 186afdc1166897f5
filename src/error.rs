//! Diagnostics raised while running a collection cycle.

use std::path::PathBuf;
use std::process::ExitStatus;

/// Everything that can go wrong during one `nfsstat` invocation.
///
/// None of these abort a collection cycle: they are logged and recorded in
/// the [`GatherReport`](crate::nfsstat::GatherReport).
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("path to nfsstat binary required, skipping")]
    MissingBinaryPath,

    #[error("{} is missing, skipping", .0.display())]
    BinaryNotFound(PathBuf),

    #[error("failed to start {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stdout of {} could not be opened", .0.display())]
    StdoutUnavailable(PathBuf),

    #[error("failed reading nfsstat output: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed waiting for nfsstat: {0}")]
    Wait(#[source] std::io::Error),

    #[error("nfsstat exited with {status}: {stderr}")]
    ExitStatus { status: ExitStatus, stderr: String },
}

impl CollectError {
    /// True when the cycle was skipped before any process was started.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            CollectError::MissingBinaryPath | CollectError::BinaryNotFound(_)
        )
    }
}
