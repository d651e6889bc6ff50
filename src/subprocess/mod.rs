//! Unified subprocess abstraction layer: a trait seam over process spawning
//! so every flatpak operation is testable against a scripted runner.

pub mod builder;
pub mod error;
pub mod mock;
pub mod runner;


pub use builder::ProcessCommandBuilder;
pub use error::ProcessError;
pub use mock::{MockCommandConfig, MockProcessRunner};
pub use runner::{
    ExitStatus, LineStream, ProcessCommand, ProcessOutput, ProcessRunner, ProcessStream,
    StatusFuture, TokioProcessRunner,
};
