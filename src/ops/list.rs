use serde::{Deserialize, Serialize};

use crate::client::{Flatpak, FLATPAK_BIN};
use crate::error::FlatpakError;
use crate::subprocess::ProcessCommandBuilder;
use crate::types::{parse_list_line, ListEntry};

/// Flags for `flatpak list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListOptions {
    pub user: bool,
    pub system: bool,
    pub runtime: bool,
    pub app: bool,
    pub arch: Option<String>,
    pub all: bool,
}

impl ListOptions {
    pub(crate) fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
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
        if let Some(arch) = &self.arch {
            args.push(format!("--arch={arch}"));
        }
        if self.all {
            args.push("--all".to_string());
        }
        args
    }
}

impl Flatpak {
    /// Installed packages, from `flatpak list -d`. A malformed row is a
    /// [`FlatpakError::Parse`].
    pub async fn list(&self, opts: &ListOptions) -> Result<Vec<ListEntry>, FlatpakError> {
        let output = self
            .run_checked(
                ProcessCommandBuilder::new(FLATPAK_BIN)
                    .args(["list", "-d"])
                    .args(opts.args())
                    .build(),
            )
            .await?;

        output
            .stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(parse_list_line)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::MockProcessRunner;
    use std::sync::Arc;

    #[test]
    fn test_list_options_args() {
        let opts = ListOptions {
            user: true,
            runtime: true,
            arch: Some("x86_64".to_string()),
            all: true,
            ..Default::default()
        };
        assert_eq!(
            opts.args(),
            vec!["--user", "--runtime", "--arch=x86_64", "--all"]
        );
        assert!(ListOptions::default().args().is_empty());
    }

    #[tokio::test]
    async fn test_list_parses_rows() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("flatpak")
            .with_args(|args| args == ["list", "-d", "--user"])
            .returns_stdout(
                "org.gnome.Calculator/x86_64/stable flathub 8afc7bc2c87e 8afc7bc2c87e 9.2 MB current\n\
                 org.gnome.Platform/x86_64/45 flathub 11bc2c87e8af 11bc2c87e8af 852.2 MB system,runtime\n",
            )
            .finish();

        let flatpak = Flatpak::with_runner(Arc::new(mock));
        let entries = flatpak
            .list(&ListOptions {
                user: true,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].reference.name, "org.gnome.Calculator");
        assert_eq!(entries[1].installed_size, "852.2 MB");
        assert_eq!(entries[1].options, vec!["system", "runtime"]);
    }

    #[tokio::test]
    async fn test_list_propagates_parse_failure() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("flatpak")
            .returns_stdout("truncated row\n")
            .finish();

        let flatpak = Flatpak::with_runner(Arc::new(mock));
        let err = flatpak.list(&ListOptions::default()).await.unwrap_err();
        assert!(matches!(err, FlatpakError::Parse(_)));
    }
}
