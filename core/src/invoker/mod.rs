//! External model invocation.
//!
//! The runner CLI has shipped with different ways of taking a prompt, so
//! each convention in [`InvocationMethod::ATTEMPT_ORDER`] is tried in turn.
//! Only a usage error ("unknown flag" / "unrecognized option" on stderr)
//! moves on to the next convention; a missing binary, a timeout or any other
//! failure ends the call with a diagnostic [`InvocationResult`].

mod runner;
mod types;

use std::sync::Arc;
use std::time::Duration;

pub use runner::CapturedOutput;
pub use runner::CommandLine;
pub use runner::CommandRunner;
pub use runner::ProcessRunner;
pub use runner::RunError;
pub use types::*;

use crate::config::ModelConfig;

/// Lowercase stderr fragments that mean "this CLI does not accept that usage".
const USAGE_ERROR_MARKERS: &[&str] = &["unknown flag", "unrecognized option"];

/// Invokes the local model runner with fallback across conventions.
#[derive(Clone)]
pub struct ModelInvoker {
    config: ModelConfig,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for ModelInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelInvoker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ModelInvoker {
    pub fn new(config: ModelConfig) -> Self {
        Self::with_runner(config, Arc::new(ProcessRunner))
    }

    pub fn with_runner(config: ModelConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Command line for `method`. The prompt only appears in the arguments
    /// for [`InvocationMethod::PromptArg`].
    pub fn command_for(&self, method: InvocationMethod, prompt: &str) -> CommandLine {
        let mut args = vec!["run".to_string(), self.config.model.clone()];
        match method {
            InvocationMethod::StdinWithFlag => args.push("--stdin".to_string()),
            InvocationMethod::PromptArg => args.push(prompt.to_string()),
            InvocationMethod::StdinNoFlag
            | InvocationMethod::Disabled
            | InvocationMethod::NoneWorked => {}
        }
        CommandLine::new(self.config.binary.clone(), args)
    }

    /// Run the model on `prompt`, each attempt bounded by `timeout`.
    ///
    /// Never fails: problems are reported through the result's stderr and
    /// exit code.
    pub async fn invoke(&self, prompt: &str, timeout: Duration) -> InvocationResult {
        if !self.config.enabled {
            tracing::debug!("model invocation disabled by configuration");
            return InvocationResult::disabled();
        }

        for method in InvocationMethod::ATTEMPT_ORDER {
            match self.attempt(method, prompt, timeout).await {
                AttemptOutcome::Success(result) => {
                    tracing::debug!(
                        method = %result.method,
                        exit_code = result.exit_code,
                        stdout_len = result.stdout.len(),
                        "model invocation finished"
                    );
                    return result;
                }
                AttemptOutcome::Terminal(result) => {
                    tracing::warn!(
                        method = %result.method,
                        exit_code = result.exit_code,
                        stderr = %result.stderr,
                        "model invocation failed"
                    );
                    return result;
                }
                AttemptOutcome::Retryable(reason) => {
                    tracing::debug!(%method, %reason, "convention rejected, trying next");
                }
            }
        }

        InvocationResult::no_method_worked()
    }

    async fn attempt(
        &self,
        method: InvocationMethod,
        prompt: &str,
        timeout: Duration,
    ) -> AttemptOutcome {
        let command = self.command_for(method, prompt);
        let stdin = method.uses_stdin().then_some(prompt);

        match self.runner.run(&command, stdin, timeout).await {
            Ok(output) => {
                if is_usage_error(&output.stderr) {
                    return AttemptOutcome::Retryable(output.stderr.trim().to_string());
                }
                AttemptOutcome::Success(InvocationResult {
                    stdout: output.stdout,
                    stderr: output.stderr,
                    exit_code: output.exit_code,
                    method,
                })
            }
            Err(RunError::NotFound(_)) => {
                AttemptOutcome::Terminal(InvocationResult::not_found(method))
            }
            Err(RunError::TimedOut(_)) => {
                AttemptOutcome::Terminal(InvocationResult::timed_out(method))
            }
            Err(RunError::Io(e)) => AttemptOutcome::Terminal(InvocationResult::exception(method, e)),
        }
    }
}

fn is_usage_error(stderr: &str) -> bool {
    if stderr.is_empty() {
        return false;
    }
    let lowered = stderr.to_lowercase();
    USAGE_ERROR_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}
