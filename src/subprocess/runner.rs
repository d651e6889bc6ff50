use async_trait::async_trait;
use futures::stream::Stream;
use std::collections::HashMap;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use super::error::ProcessError;

/// A fully specified invocation of an external program.
#[derive(Debug, Clone)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl ProcessCommand {
    pub(crate) fn display(&self) -> String {
        format!("{} {}", self.program, self.args.join(" "))
    }
}

/// Captured result of a batch run.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Timeout,
    Signal(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Success => Some(0),
            ExitStatus::Error(code) => Some(*code),
            _ => None,
        }
    }
}

pub type LineResult = Result<String, ProcessError>;
pub type LineStream = Pin<Box<dyn Stream<Item = LineResult> + Send>>;
pub type StatusFuture =
    Pin<Box<dyn futures::Future<Output = Result<ExitStatus, ProcessError>> + Send>>;

/// Live handles onto a running child process: line-oriented output streams
/// plus a future resolving to the exit status.
pub struct ProcessStream {
    pub stdout: LineStream,
    pub stderr: LineStream,
    pub status: StatusFuture,
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError>;
    async fn run_streaming(&self, command: ProcessCommand) -> Result<ProcessStream, ProcessError>;
}

pub struct TokioProcessRunner;

impl TokioProcessRunner {
    /// Normalize a line by removing trailing newlines
    fn normalize_line(mut line: String) -> String {
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        line
    }

    /// Create a line stream from a buffered reader
    fn create_line_stream<R>(reader: tokio::io::BufReader<R>) -> LineStream
    where
        R: tokio::io::AsyncRead + Send + Unpin + 'static,
    {
        use tokio::io::AsyncBufReadExt;

        Box::pin(futures::stream::unfold(reader, |mut reader| async move {
            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) => None, // EOF
                Ok(_) => Some((Ok(Self::normalize_line(line)), reader)),
                Err(source) => Some((Err(ProcessError::Io(source)), reader)),
            }
        })) as LineStream
    }

    fn configure_command(command: &ProcessCommand) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&command.program);

        // Keep child processes in their own group so signals hit them together
        #[cfg(unix)]
        {
            cmd.process_group(0);
        }

        cmd.args(&command.args);

        for (key, value) in &command.env {
            cmd.env(key, value);
        }

        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        // flatpak runs non-interactively here; a null stdin keeps a missing -y
        // from hanging the call instead of failing it
        cmd.stdin(std::process::Stdio::null());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());

        cmd
    }

    fn parse_exit_status(status: std::process::ExitStatus) -> ExitStatus {
        if status.success() {
            ExitStatus::Success
        } else if let Some(code) = status.code() {
            ExitStatus::Error(code)
        } else {
            Self::parse_signal_status(status)
        }
    }

    #[cfg(unix)]
    fn parse_signal_status(status: std::process::ExitStatus) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            ExitStatus::Signal(signal)
        } else {
            ExitStatus::Error(1)
        }
    }

    #[cfg(not(unix))]
    fn parse_signal_status(_status: std::process::ExitStatus) -> ExitStatus {
        ExitStatus::Error(1)
    }

    fn map_spawn_error(error: std::io::Error, command: &ProcessCommand) -> ProcessError {
        if error.kind() == std::io::ErrorKind::NotFound {
            ProcessError::CommandNotFound(command.program.clone())
        } else {
            ProcessError::SpawnFailed {
                command: command.display(),
                source: error,
            }
        }
    }

    async fn wait_with_timeout(
        child: tokio::process::Child,
        timeout: Option<Duration>,
    ) -> Result<std::process::Output, ProcessError> {
        match timeout {
            Some(duration) => match tokio::time::timeout(duration, child.wait_with_output()).await {
                Ok(result) => result.map_err(ProcessError::Io),
                Err(_) => Err(ProcessError::Timeout(duration)),
            },
            None => child.wait_with_output().await.map_err(ProcessError::Io),
        }
    }

    fn create_status_future(
        mut child: tokio::process::Child,
        timeout: Option<Duration>,
    ) -> StatusFuture {
        Box::pin(async move {
            let status = if let Some(limit) = timeout {
                match tokio::time::timeout(limit, child.wait()).await {
                    Ok(Ok(status)) => Self::parse_exit_status(status),
                    Ok(Err(source)) => return Err(ProcessError::Io(source)),
                    Err(_) => ExitStatus::Timeout,
                }
            } else {
                match child.wait().await {
                    Ok(status) => Self::parse_exit_status(status),
                    Err(source) => return Err(ProcessError::Io(source)),
                }
            };
            Ok(status)
        })
    }

    /// Extract a stream from a child process, converting None to error
    fn take_stream<T>(stream: Option<T>, name: &'static str) -> Result<T, ProcessError> {
        stream.ok_or(ProcessError::StreamCapture(name))
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        let start = std::time::Instant::now();
        tracing::debug!("Executing subprocess: {}", command.display());

        let child = Self::configure_command(&command)
            .spawn()
            .map_err(|e| Self::map_spawn_error(e, &command))?;

        let output = Self::wait_with_timeout(child, command.timeout).await?;
        let duration = start.elapsed();
        let status = Self::parse_exit_status(output.status);

        match &status {
            ExitStatus::Success => {
                tracing::debug!("Subprocess completed in {:?}: {}", duration, command.display());
            }
            ExitStatus::Error(code) => {
                tracing::debug!(
                    "Subprocess failed with exit code {} in {:?}: {}",
                    code,
                    duration,
                    command.display()
                );
            }
            ExitStatus::Signal(signal) => {
                tracing::warn!(
                    "Subprocess terminated by signal {}: {}",
                    signal,
                    command.display()
                );
            }
            ExitStatus::Timeout => {
                tracing::warn!("Subprocess timed out: {}", command.display());
            }
        }

        Ok(ProcessOutput {
            status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration,
        })
    }

    async fn run_streaming(&self, command: ProcessCommand) -> Result<ProcessStream, ProcessError> {
        use tokio::io::BufReader;

        tracing::debug!("Executing subprocess (streaming): {}", command.display());

        let mut child = Self::configure_command(&command)
            .spawn()
            .map_err(|e| Self::map_spawn_error(e, &command))?;

        let stdout = Self::take_stream(child.stdout.take(), "stdout")?;
        let stderr = Self::take_stream(child.stderr.take(), "stderr")?;

        Ok(ProcessStream {
            stdout: Self::create_line_stream(BufReader::new(stdout)),
            stderr: Self::create_line_stream(BufReader::new(stderr)),
            status: Self::create_status_future(child, command.timeout),
        })
    }
}
