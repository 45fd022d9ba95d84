// ABOUTME: Top-level error for a load-test run, one variant per phase
// ABOUTME: Startup failures (config, connect) are told apart from failures during sending

use crate::client::SmppError;
use crate::config::ConfigError;
use crate::scheduler::RunError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadTestError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot open SMPP session: {0}")]
    Connect(#[source] SmppError),

    #[error("run aborted: {0}")]
    Run(#[from] RunError),
}

impl LoadTestError {
    /// True when nothing was sent
    pub fn is_startup(&self) -> bool {
        matches!(self, LoadTestError::Config(_) | LoadTestError::Connect(_))
    }
}
