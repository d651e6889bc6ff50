use std::path::PathBuf;

use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::client::{Flatpak, FLATPAK_BIN};
use crate::error::FlatpakError;
use crate::progress::{InstallMonitor, ProgressCallback};
use crate::subprocess::{ProcessCommandBuilder, ProcessError, ProcessStream};

/// Flags for `flatpak install`, translated 1:1 to argv.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallOptions {
    pub user: bool,
    pub system: bool,
    pub runtime: bool,
    pub app: bool,

    pub no_pull: bool,
    pub no_deploy: bool,
    pub no_related: bool,
    pub no_deps: bool,
    pub no_static_deltas: bool,

    /// Treat the location argument as a bundle file.
    pub bundle: bool,
    /// Treat the location argument as a flatpakref file.
    pub from: bool,

    pub gpg_file: Option<PathBuf>,
    pub assume_yes: bool,
}

impl InstallOptions {
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
        if self.no_pull {
            args.push("--no-pull".to_string());
        }
        if self.no_deploy {
            args.push("--no-deploy".to_string());
        }
        if self.no_related {
            args.push("--no-related".to_string());
        }
        if self.no_deps {
            args.push("--no-deps".to_string());
        }
        if self.no_static_deltas {
            args.push("--no-static-deltas".to_string());
        }
        if self.bundle {
            args.push("--bundle".to_string());
        }
        if self.from {
            args.push("--from".to_string());
        }
        if let Some(gpg_file) = &self.gpg_file {
            args.push(format!("--gpg-file={}", gpg_file.display()));
        }
        if self.assume_yes {
            args.push("-y".to_string());
        }
        args
    }
}

impl Flatpak {
    /// Install refs from a remote or file location, feeding each stdout line
    /// to the progress monitor when a callback is supplied.
    ///
    /// Stderr is accumulated while the process runs so a non-zero exit can be
    /// normalized into [`FlatpakError::Tool`].
    pub async fn install(
        &self,
        location: &str,
        refs: &[&str],
        opts: &InstallOptions,
        on_progress: Option<ProgressCallback>,
    ) -> Result<(), FlatpakError> {
        let mut args: Vec<String> = vec!["install".to_string(), location.to_string()];
        args.extend(refs.iter().map(|r| r.to_string()));
        args.extend(opts.args());

        tracing::debug!("flatpak install args: {:?}", args);

        let command = ProcessCommandBuilder::new(FLATPAK_BIN).args(&args).build();
        let ProcessStream {
            mut stdout,
            mut stderr,
            status,
        } = self.runner().run_streaming(command).await?;

        let monitor = on_progress.map(InstallMonitor::new);

        // The runner yields whole lines, so the monitor never sees a
        // progress line split across feed calls.
        let feed_stdout = async {
            while let Some(line) = stdout.next().await {
                let line = line?;
                if let Some(monitor) = &monitor {
                    monitor.feed(line.as_bytes());
                }
            }
            Ok::<(), ProcessError>(())
        };

        let collect_stderr = async {
            let mut lines = Vec::new();
            while let Some(line) = stderr.next().await {
                lines.push(line?);
            }
            Ok::<Vec<String>, ProcessError>(lines)
        };

        let (fed, collected) = tokio::join!(feed_stdout, collect_stderr);
        let status = status.await?;
        fed?;
        let stderr_lines = collected?;

        if !status.success() {
            return Err(FlatpakError::tool_failure(&status, &stderr_lines.join("\n")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressEvent;
    use crate::subprocess::MockProcessRunner;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_install_options_args() {
        let opts = InstallOptions {
            user: true,
            no_deps: true,
            no_related: true,
            gpg_file: Some(PathBuf::from("/tmp/key.gpg")),
            assume_yes: true,
            ..Default::default()
        };
        assert_eq!(
            opts.args(),
            vec![
                "--user",
                "--no-related",
                "--no-deps",
                "--gpg-file=/tmp/key.gpg",
                "-y"
            ]
        );
    }

    #[test]
    fn test_install_options_gpg_file_from_tempfile() {
        let key = tempfile::NamedTempFile::new().unwrap();
        let opts = InstallOptions {
            gpg_file: Some(key.path().to_path_buf()),
            ..Default::default()
        };
        let args = opts.args();
        assert_eq!(args.len(), 1);
        assert!(args[0].starts_with("--gpg-file=/"));
    }

    #[tokio::test]
    async fn test_install_emits_progress_events() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("flatpak")
            .with_args(|args| {
                args.first().map(String::as_str) == Some("install")
                    && args.contains(&"flathub".to_string())
                    && args.contains(&"-y".to_string())
            })
            .returns_stdout(
                "Installing: org.example.App/x86_64/stable from flathub\n\
                 [====        ] Downloading... 33% (1.5 MB/s)\n\
                 [############] Installing... 100%\n",
            )
            .finish();

        let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let flatpak = Flatpak::with_runner(Arc::new(mock));
        flatpak
            .install(
                "flathub",
                &["org.example.App/x86_64/stable"],
                &InstallOptions {
                    assume_yes: true,
                    ..Default::default()
                },
                Some(Box::new(move |event| sink.lock().unwrap().push(event))),
            )
            .await
            .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].fraction, 8.0 / 36.0);
        assert_eq!(events[0].bytes_per_second, 1_500_000);
        assert_eq!(events[1].fraction, 1.0);
        assert_eq!(events[1].bytes_per_second, 0);
    }

    #[tokio::test]
    async fn test_install_without_callback() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("flatpak")
            .returns_stdout("[####] 100%\n")
            .finish();

        let flatpak = Flatpak::with_runner(Arc::new(mock));
        flatpak
            .install(
                "flathub",
                &["org.example.App/x86_64/stable"],
                &InstallOptions::default(),
                None,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_install_failure_normalizes_stderr() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("flatpak")
            .returns_stderr("Usage: flatpak install ...\nerror: something went wrong\n")
            .returns_exit_code(1)
            .finish();

        let flatpak = Flatpak::with_runner(Arc::new(mock));
        let err = flatpak
            .install("flathub", &["bad//ref"], &InstallOptions::default(), None)
            .await
            .unwrap_err();

        assert!(err.is_usage_error());
        assert_eq!(
            err.to_string(),
            "flatpak argument error: something went wrong"
        );
    }
}
