use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::error::ProcessError;
use super::runner::{
    ExitStatus, LineStream, ProcessCommand, ProcessOutput, ProcessRunner, ProcessStream,
};

/// Scripted [`ProcessRunner`] for tests. Expectations are matched by program
/// name plus an optional argument predicate; both batch and streaming runs
/// replay the canned output.
#[derive(Clone)]
pub struct MockProcessRunner {
    expectations: Arc<Mutex<Vec<MockExpectation>>>,
    call_history: Arc<Mutex<Vec<ProcessCommand>>>,
}

struct MockExpectation {
    program: String,
    #[allow(clippy::type_complexity)]
    args_matcher: Option<Box<dyn Fn(&[String]) -> bool + Send + Sync>>,
    response: ProcessOutput,
    times_called: usize,
    expected_times: Option<usize>,
}

impl MockExpectation {
    fn matches(&self, command: &ProcessCommand) -> bool {
        self.program == command.program
            && self
                .args_matcher
                .as_ref()
                .is_none_or(|matcher| matcher(&command.args))
    }
}

pub struct MockCommandConfig {
    runner: MockProcessRunner,
    expectation: MockExpectation,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self {
            expectations: Arc::new(Mutex::new(Vec::new())),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn expect_command(&mut self, program: &str) -> MockCommandConfig {
        MockCommandConfig {
            runner: self.clone(),
            expectation: MockExpectation {
                program: program.to_string(),
                args_matcher: None,
                response: ProcessOutput {
                    status: ExitStatus::Success,
                    stdout: String::new(),
                    stderr: String::new(),
                    duration: Duration::from_millis(10),
                },
                times_called: 0,
                expected_times: None,
            },
        }
    }

    pub fn verify_called(&self, program: &str, times: usize) -> bool {
        let history = self.call_history.lock().unwrap();
        history.iter().filter(|cmd| cmd.program == program).count() == times
    }

    pub fn call_history(&self) -> Vec<ProcessCommand> {
        self.call_history.lock().unwrap().clone()
    }

    fn next_response(&self, command: &ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        self.call_history.lock().unwrap().push(command.clone());

        let mut expectations = self.expectations.lock().unwrap();

        let Some(expectation) = expectations
            .iter_mut()
            .find(|expectation| expectation.matches(command))
        else {
            return Err(ProcessError::MockExpectationNotMet(format!(
                "No expectation found for command: {} {:?}",
                command.program, command.args
            )));
        };

        expectation.times_called += 1;

        match expectation.expected_times {
            Some(expected) if expectation.times_called > expected => {
                Err(ProcessError::MockExpectationNotMet(format!(
                    "Command '{}' called {} times, expected {}",
                    command.program, expectation.times_called, expected
                )))
            }
            _ => Ok(expectation.response.clone()),
        }
    }

    fn line_stream(text: &str) -> LineStream {
        let lines: Vec<Result<String, ProcessError>> =
            text.lines().map(|l| Ok(l.to_string())).collect();
        Box::pin(futures::stream::iter(lines))
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        self.next_response(&command)
    }

    async fn run_streaming(&self, command: ProcessCommand) -> Result<ProcessStream, ProcessError> {
        let response = self.next_response(&command)?;
        let status = response.status.clone();

        Ok(ProcessStream {
            stdout: Self::line_stream(&response.stdout),
            stderr: Self::line_stream(&response.stderr),
            status: Box::pin(async move { Ok::<_, ProcessError>(status) }),
        })
    }
}

impl MockCommandConfig {
    pub fn with_args<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.expectation.args_matcher = Some(Box::new(matcher));
        self
    }

    pub fn returns_stdout(mut self, stdout: &str) -> Self {
        self.expectation.response.stdout = stdout.to_string();
        self
    }

    pub fn returns_stderr(mut self, stderr: &str) -> Self {
        self.expectation.response.stderr = stderr.to_string();
        self
    }

    pub fn returns_exit_code(mut self, code: i32) -> Self {
        self.expectation.response.status = if code == 0 {
            ExitStatus::Success
        } else {
            ExitStatus::Error(code)
        };
        self
    }

    pub fn returns_success(mut self) -> Self {
        self.expectation.response.status = ExitStatus::Success;
        self
    }

    pub fn times(mut self, n: usize) -> Self {
        self.expectation.expected_times = Some(n);
        self
    }

    pub fn finish(self) {
        self.runner
            .expectations
            .lock()
            .unwrap()
            .push(self.expectation);
    }
}

impl Default for MockProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}
