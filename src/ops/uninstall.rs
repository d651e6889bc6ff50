use serde::{Deserialize, Serialize};

use crate::client::{Flatpak, FLATPAK_BIN};
use crate::error::FlatpakError;
use crate::subprocess::ProcessCommandBuilder;

/// Flags for `flatpak uninstall`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UninstallOptions {
    pub arch: Option<String>,
    pub user: bool,
    pub system: bool,
    pub runtime: bool,
    pub app: bool,

    pub keep_ref: bool,
    pub no_related: bool,
    pub force_remove: bool,
}

impl UninstallOptions {
    pub(crate) fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(arch) = &self.arch {
            args.push(format!("--arch={arch}"));
        }
        if self.user {
            args.push("--user".to_string());
        }
        if self.system {
            args.push("--system".to_string());
        }
        if self.runtime {
            args.push("--runtime".to_string());
        }
        if self.app {
            args.push("--app".to_string());
        }
        if self.keep_ref {
            args.push("--keep-ref".to_string());
        }
        if self.no_related {
            args.push("--no-related".to_string());
        }
        if self.force_remove {
            args.push("--force-remove".to_string());
        }
        args
    }
}

impl Flatpak {
    /// Uninstall one or more refs.
    pub async fn uninstall(
        &self,
        refs: &[&str],
        opts: &UninstallOptions,
    ) -> Result<(), FlatpakError> {
        self.run_checked(
            ProcessCommandBuilder::new(FLATPAK_BIN)
                .arg("uninstall")
                .args(refs.iter().copied())
                .args(opts.args())
                .build(),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::MockProcessRunner;
    use std::sync::Arc;

    #[test]
    fn test_uninstall_options_args() {
        let opts = UninstallOptions {
            arch: Some("aarch64".to_string()),
            user: true,
            keep_ref: true,
            force_remove: true,
            ..Default::default()
        };
        assert_eq!(
            opts.args(),
            vec!["--arch=aarch64", "--user", "--keep-ref", "--force-remove"]
        );
    }

    #[tokio::test]
    async fn test_uninstall_passes_refs() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("flatpak")
            .with_args(|args| args == ["uninstall", "org.example.App/x86_64/stable", "--user"])
            .returns_success()
            .finish();

        let flatpak = Flatpak::with_runner(Arc::new(mock.clone()));
        flatpak
            .uninstall(
                &["org.example.App/x86_64/stable"],
                &UninstallOptions {
                    user: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(mock.verify_called("flatpak", 1));
    }

    #[tokio::test]
    async fn test_uninstall_failure_is_normalized() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("flatpak")
            .returns_stderr("error: org.example.App/x86_64/stable is not installed\n")
            .returns_exit_code(1)
            .finish();

        let flatpak = Flatpak::with_runner(Arc::new(mock));
        let err = flatpak
            .uninstall(
                &["org.example.App/x86_64/stable"],
                &UninstallOptions::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "flatpak: org.example.App/x86_64/stable is not installed"
        );
    }
}
