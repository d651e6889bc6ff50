use serde::{Deserialize, Serialize};

use crate::client::{Flatpak, FLATPAK_BIN};
use crate::error::FlatpakError;
use crate::subprocess::ProcessCommandBuilder;
use crate::types::{parse_remote_line, Remote};

/// Flags for `flatpak remotes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteListOptions {
    pub user: bool,
    pub system: bool,
}

impl RemoteListOptions {
    pub(crate) fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.user {
            args.push("--user".to_string());
        }
        if self.system {
            args.push("--system".to_string());
        }
        args
    }
}

/// Flags for `flatpak remote-add`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteAddOptions {
    pub user: bool,
    pub system: bool,
    pub if_not_exists: bool,
    pub no_gpg_verify: bool,
}

impl RemoteAddOptions {
    pub(crate) fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.user {
            args.push("--user".to_string());
        }
        if self.system {
            args.push("--system".to_string());
        }
        if self.if_not_exists {
            args.push("--if-not-exists".to_string());
        }
        if self.no_gpg_verify {
            args.push("--no-gpg-verify".to_string());
        }
        args
    }
}

/// Flags for `flatpak remote-delete`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteDeleteOptions {
    pub user: bool,
    pub system: bool,
    /// Remove the remote even when packages installed from it remain.
    pub force: bool,
}

impl RemoteDeleteOptions {
    pub(crate) fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.user {
            args.push("--user".to_string());
        }
        if self.system {
            args.push("--system".to_string());
        }
        if self.force {
            args.push("--force".to_string());
        }
        args
    }
}

impl Flatpak {
    /// Configured remotes, from `flatpak remotes`.
    pub async fn remotes(&self, opts: &RemoteListOptions) -> Result<Vec<Remote>, FlatpakError> {
        let output = self
            .run_checked(
                ProcessCommandBuilder::new(FLATPAK_BIN)
                    .arg("remotes")
                    .args(opts.args())
                    .build(),
            )
            .await?;

        Ok(output.stdout.lines().filter_map(parse_remote_line).collect())
    }

    /// Add a remote by name and URL.
    pub async fn remote_add(
        &self,
        name: &str,
        url: &str,
        opts: &RemoteAddOptions,
    ) -> Result<(), FlatpakError> {
        self.run_checked(
            ProcessCommandBuilder::new(FLATPAK_BIN)
                .arg("remote-add")
                .args(opts.args())
                .arg(name)
                .arg(url)
                .build(),
        )
        .await?;
        Ok(())
    }

    /// Remove a remote by name.
    pub async fn remote_delete(
        &self,
        name: &str,
        opts: &RemoteDeleteOptions,
    ) -> Result<(), FlatpakError> {
        self.run_checked(
            ProcessCommandBuilder::new(FLATPAK_BIN)
                .arg("remote-delete")
                .args(opts.args())
                .arg(name)
                .build(),
        )
        .await?;
        Ok(())
    }
}
