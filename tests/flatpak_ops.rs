//! End-to-end tests of the public API against a scripted process runner.

use std::sync::{Arc, Mutex};

use flatpak_cmd::subprocess::MockProcessRunner;
use flatpak_cmd::{
    Flatpak, FlatpakError, InfoOptions, InstallOptions, ListOptions, ProgressEvent, Ref,
    UninstallOptions,
};

fn client(mock: &MockProcessRunner) -> Flatpak {
    Flatpak::with_runner(Arc::new(mock.clone()))
}

#[tokio::test]
async fn install_then_list_then_uninstall() {
    let mut mock = MockProcessRunner::new();

    mock.expect_command("flatpak")
        .with_args(|args| args.first().map(String::as_str) == Some("install"))
        .returns_stdout(
            "Installing: org.gnome.Calculator/x86_64/stable from flathub\n\
             [======      ] Downloading files 50% (2.0 GB/s)\n\
             [############] Installing 100%\n",
        )
        .finish();

    mock.expect_command("flatpak")
        .with_args(|args| args.first().map(String::as_str) == Some("list"))
        .returns_stdout(
            "org.gnome.Calculator/x86_64/stable flathub 8afc7bc2c87e 8afc7bc2c87e 9.2 MB current\n",
        )
        .finish();

    mock.expect_command("flatpak")
        .with_args(|args| args.first().map(String::as_str) == Some("uninstall"))
        .returns_success()
        .finish();

    let flatpak = client(&mock);

    let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    flatpak
        .install(
            "flathub",
            &["org.gnome.Calculator/x86_64/stable"],
            &InstallOptions {
                user: true,
                assume_yes: true,
                ..Default::default()
            },
            Some(Box::new(move |event| sink.lock().unwrap().push(event))),
        )
        .await
        .unwrap();

    {
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        // 6 * 2 over 12 * 3
        assert_eq!(events[0].fraction, 12.0 / 36.0);
        assert_eq!(events[0].bytes_per_second, 2_000_000_000);
        assert_eq!(events[0].status, "Downloading files 50% (2.0 GB/s)");
        assert_eq!(events[1].fraction, 1.0);
        assert_eq!(events[1].bytes_per_second, 0);
    }

    let installed = flatpak.list(&ListOptions::default()).await.unwrap();
    assert_eq!(installed.len(), 1);
    assert_eq!(installed[0].reference.to_string(), "org.gnome.Calculator/x86_64/stable");

    flatpak
        .uninstall(
            &["org.gnome.Calculator/x86_64/stable"],
            &UninstallOptions::default(),
        )
        .await
        .unwrap();

    assert!(mock.verify_called("flatpak", 3));
}

#[tokio::test]
async fn every_operation_shares_the_error_normalization_path() {
    let stderr = "Usage: flatpak info [OPTION...] NAME [BRANCH]\nerror: something went wrong\n";

    let mut mock = MockProcessRunner::new();
    mock.expect_command("flatpak")
        .returns_stderr(stderr)
        .returns_exit_code(1)
        .times(2)
        .finish();

    let flatpak = client(&mock);

    let err = flatpak
        .info(
            &Ref::new("org.example.App", "x86_64", "stable"),
            &InfoOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(err.is_usage_error());
    assert_eq!(
        err.to_string(),
        "flatpak argument error: something went wrong"
    );

    let err = flatpak
        .install("flathub", &["x"], &InstallOptions::default(), None)
        .await
        .unwrap_err();
    match err {
        FlatpakError::Tool {
            message,
            usage_shown,
            exit_code,
        } => {
            assert_eq!(message, "something went wrong");
            assert!(usage_shown);
            assert_eq!(exit_code, Some(1));
        }
        other => panic!("expected tool failure, got {other:?}"),
    }
}

#[tokio::test]
async fn garbage_progress_output_never_fails_the_install() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command("flatpak")
        .returns_stdout(
            "random chatter\n\
             [##?!##] corrupted bar 10%\n\
             [===         ] still fine 25%\n",
        )
        .finish();

    let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);

    let flatpak = client(&mock);
    flatpak
        .install(
            "flathub",
            &["org.example.App/x86_64/stable"],
            &InstallOptions::default(),
            Some(Box::new(move |event| sink.lock().unwrap().push(event))),
        )
        .await
        .unwrap();

    // Only the well-formed bar produced an event; the rest was swallowed.
    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].fraction, 6.0 / 36.0);
}
