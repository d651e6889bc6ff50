//! The `Flatpak` handle: one shared process-runner seam that every
//! operation goes through.

use std::sync::Arc;

use crate::error::FlatpakError;
use crate::subprocess::{
    ProcessCommand, ProcessCommandBuilder, ProcessError, ProcessOutput, ProcessRunner,
    TokioProcessRunner,
};

pub(crate) const FLATPAK_BIN: &str = "flatpak";

/// Client for the flatpak command-line tool.
///
/// All operations spawn the `flatpak` binary through an injected
/// [`ProcessRunner`], so tests can drive the full surface against a
/// [`MockProcessRunner`](crate::subprocess::MockProcessRunner).
#[derive(Clone)]
pub struct Flatpak {
    runner: Arc<dyn ProcessRunner>,
}

impl Flatpak {
    /// Client backed by the production tokio runner.
    pub fn new() -> Self {
        Self::with_runner(Arc::new(TokioProcessRunner))
    }

    pub fn with_runner(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    pub(crate) fn runner(&self) -> &Arc<dyn ProcessRunner> {
        &self.runner
    }

    /// Run a flatpak command to completion and route any non-zero exit
    /// through the shared error-normalization path.
    pub(crate) async fn run_checked(
        &self,
        command: ProcessCommand,
    ) -> Result<ProcessOutput, FlatpakError> {
        let output = self.runner.run(command).await?;
        if !output.status.success() {
            return Err(FlatpakError::tool_failure(&output.status, &output.stderr));
        }
        Ok(output)
    }

    /// Whether the flatpak binary can be invoked at all.
    pub async fn check_availability(&self) -> Result<bool, FlatpakError> {
        let result = self
            .runner
            .run(
                ProcessCommandBuilder::new(FLATPAK_BIN)
                    .arg("--version")
                    .build(),
            )
            .await;

        match result {
            Ok(output) => Ok(output.status.success()),
            Err(ProcessError::CommandNotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Installed flatpak version, without the leading `Flatpak ` token.
    pub async fn version(&self) -> Result<String, FlatpakError> {
        let output = self
            .run_checked(
                ProcessCommandBuilder::new(FLATPAK_BIN)
                    .arg("--version")
                    .build(),
            )
            .await?;

        let trimmed = output.stdout.trim();
        Ok(trimmed.strip_prefix("Flatpak ").unwrap_or(trimmed).to_string())
    }

    /// Architectures this flatpak installation can install for.
    pub async fn supported_arches(&self) -> Result<Vec<String>, FlatpakError> {
        let output = self
            .run_checked(
                ProcessCommandBuilder::new(FLATPAK_BIN)
                    .arg("--supported-arches")
                    .build(),
            )
            .await?;
        Ok(non_empty_lines(&output.stdout))
    }

    /// GL driver variants flatpak would select from.
    pub async fn gl_drivers(&self) -> Result<Vec<String>, FlatpakError> {
        let output = self
            .run_checked(
                ProcessCommandBuilder::new(FLATPAK_BIN)
                    .arg("--gl-drivers")
                    .build(),
            )
            .await?;
        Ok(non_empty_lines(&output.stdout))
    }
}

impl Default for Flatpak {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn non_empty_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
