//! One module per flatpak subcommand family: option structs with their 1:1
//! flag translation, and the `Flatpak` methods that run them.

pub mod info;
pub mod install;
pub mod list;
pub mod remote;
pub mod uninstall;

pub use info::InfoOptions;
pub use install::InstallOptions;
pub use list::ListOptions;
pub use remote::{RemoteAddOptions, RemoteDeleteOptions, RemoteListOptions};
pub use uninstall::UninstallOptions;
