use serde::Serialize;

/// Exit code reported when the runner binary is missing.
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit code reported when an attempt exceeds its timeout.
pub const EXIT_TIMEOUT: i32 = 124;

pub const ERR_NOT_FOUND: &str = "ollama_not_found";
pub const ERR_TIMEOUT: &str = "timeout";
pub const ERR_DISABLED: &str = "disabled";
pub const ERR_NO_METHOD: &str = "no_method_worked";

/// Which invocation convention produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationMethod {
    /// `<binary> run <model> --stdin`, prompt on stdin
    StdinWithFlag,
    /// `<binary> run <model>`, prompt on stdin
    StdinNoFlag,
    /// `<binary> run <model> <prompt>`, stdin closed
    PromptArg,
    /// Model use switched off in configuration
    Disabled,
    /// Every convention was rejected as a usage error
    #[serde(rename = "none")]
    NoneWorked,
}

impl InvocationMethod {
    /// Conventions in the order they are attempted.
    pub const ATTEMPT_ORDER: [InvocationMethod; 3] =
        [Self::StdinWithFlag, Self::StdinNoFlag, Self::PromptArg];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StdinWithFlag => "stdin_with_flag",
            Self::StdinNoFlag => "stdin_no_flag",
            Self::PromptArg => "prompt_arg",
            Self::Disabled => "disabled",
            Self::NoneWorked => "none",
        }
    }

    /// Whether the prompt is written to the child's standard input.
    pub fn uses_stdin(&self) -> bool {
        matches!(self, Self::StdinWithFlag | Self::StdinNoFlag)
    }
}

impl std::fmt::Display for InvocationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Captured result of one model invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub method: InvocationMethod,
}

impl InvocationResult {
    pub fn disabled() -> Self {
        Self::failure(InvocationMethod::Disabled, ERR_DISABLED, 0)
    }

    pub fn no_method_worked() -> Self {
        Self::failure(InvocationMethod::NoneWorked, ERR_NO_METHOD, 1)
    }

    pub fn not_found(method: InvocationMethod) -> Self {
        Self::failure(method, ERR_NOT_FOUND, EXIT_NOT_FOUND)
    }

    pub fn timed_out(method: InvocationMethod) -> Self {
        Self::failure(method, ERR_TIMEOUT, EXIT_TIMEOUT)
    }

    pub fn exception(method: InvocationMethod, detail: impl std::fmt::Display) -> Self {
        Self::failure(method, format!("exception: {detail}"), 1)
    }

    fn failure(method: InvocationMethod, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
            method,
        }
    }
}

/// What one attempt means for the attempt loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The process ran; its output goes downstream whatever the exit code
    Success(InvocationResult),
    /// The runner rejected this convention's usage; try the next one
    Retryable(String),
    /// Stop here and report this result
    Terminal(InvocationResult),
}
