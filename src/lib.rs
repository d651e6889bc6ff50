//! # flatpak-cmd
//!
//! Bindings for the `flatpak` command-line tool. Operations spawn the
//! `flatpak` binary and parse its human-readable console output into
//! structured records; `install` additionally decodes the textual progress
//! stream into callback events.
//!
//! ```no_run
//! use flatpak_cmd::{Flatpak, InstallOptions};
//!
//! # async fn run() -> Result<(), flatpak_cmd::FlatpakError> {
//! let flatpak = Flatpak::new();
//! let opts = InstallOptions { user: true, assume_yes: true, ..Default::default() };
//! flatpak
//!     .install(
//!         "flathub",
//!         &["org.gnome.Calculator/x86_64/stable"],
//!         &opts,
//!         Some(Box::new(|event| {
//!             println!("{:.0}% {}", event.fraction * 100.0, event.status);
//!         })),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - `client` - the `Flatpak` handle and tool-level queries
//! - `error` - boundary error type and diagnostic-output normalization
//! - `ops` - option structs and wrappers for each subcommand family
//! - `progress` - decoder for the install progress stream
//! - `subprocess` - process abstraction layer with a mockable runner seam
//! - `types` - parsed record types and their pure line parsers

pub mod client;
pub mod error;
pub mod ops;
pub mod progress;
pub mod subprocess;
pub mod types;

pub use client::Flatpak;
pub use error::FlatpakError;
pub use ops::{
    InfoOptions, InstallOptions, ListOptions, RemoteAddOptions, RemoteDeleteOptions,
    RemoteListOptions, UninstallOptions,
};
pub use progress::{InstallMonitor, ProgressCallback, ProgressEvent};
pub use types::{ListEntry, PackageInfo, Ref, Remote};
