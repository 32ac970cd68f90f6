//! End-to-end processing of one email.
//!
//! prompt → model invocation → output parsing → validation gate. The gate
//! replaces anything that is not exactly "Mina" or "Improdutivo" with the
//! keyword classifier's answer and a canned reply, so [`MessageProcessor::process`]
//! always yields a valid label and a non-empty response.

use std::time::Duration;

use serde::Serialize;
use triage_utils_string::sample;

use crate::classification::Classification;
use crate::config::ModelConfig;
use crate::invoker::InvocationMethod;
use crate::invoker::InvocationResult;
use crate::invoker::ModelInvoker;
use crate::keyword::classify_by_keyword;
use crate::parser::ParseResult;
use crate::parser::parse;
use crate::prompt::build_prompt;

/// Characters of raw output kept in [`DebugInfo::raw_output_sample`].
pub const RAW_SAMPLE_CHARS: usize = 2000;
/// Characters of raw output written to the debug log.
const LOG_SAMPLE_CHARS: usize = 1000;

/// Diagnostics for operators; not meant for end users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugInfo {
    pub method: InvocationMethod,
    pub exit_code: i32,
    pub stderr: String,
    pub raw_output_sample: String,
    pub cleaned_output: String,
    /// The label came from the keyword classifier
    pub fallback_used: bool,
    /// The model's label was kept but its reply was missing, so the canned
    /// reply for that label was used
    pub response_defaulted: bool,
}

/// Result of processing one email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingOutcome {
    pub classification: Classification,
    pub response: String,
    pub debug: DebugInfo,
}

/// Classifies emails and suggests replies.
#[derive(Debug, Clone)]
pub struct MessageProcessor {
    invoker: ModelInvoker,
    timeout: Duration,
}

impl MessageProcessor {
    pub fn new(config: ModelConfig) -> Self {
        let timeout = config.timeout();
        Self::with_invoker(ModelInvoker::new(config), timeout)
    }

    pub fn with_invoker(invoker: ModelInvoker, timeout: Duration) -> Self {
        Self { invoker, timeout }
    }

    pub fn model_enabled(&self) -> bool {
        self.invoker.config().enabled
    }

    /// Classify `message` and suggest a reply. Never fails.
    pub async fn process(&self, message: &str) -> ProcessingOutcome {
        let prompt = build_prompt(message);
        let invocation = self.invoker.invoke(&prompt, self.timeout).await;

        tracing::debug!(
            method = %invocation.method,
            exit_code = invocation.exit_code,
            stderr = %invocation.stderr,
            raw_output = %sample(&invocation.stdout, LOG_SAMPLE_CHARS),
            "model output"
        );

        let parsed = parse(&invocation.stdout);
        resolve(message, invocation, parsed)
    }
}

/// Apply the validation gate to a parsed model answer.
fn resolve(message: &str, invocation: InvocationResult, parsed: ParseResult) -> ProcessingOutcome {
    let model_label = parsed
        .classification
        .as_deref()
        .and_then(Classification::from_label);

    let (classification, response, fallback_used, response_defaulted) = match model_label {
        Some(label) => match parsed.response.filter(|r| !r.trim().is_empty()) {
            Some(response) => (label, response, false, false),
            None => (label, label.canned_response().to_string(), false, true),
        },
        None => {
            let label = classify_by_keyword(message);
            tracing::warn!(
                model_label = ?parsed.classification,
                fallback = %label,
                "model gave no valid classification, using keyword fallback"
            );
            (label, label.canned_response().to_string(), true, false)
        }
    };

    ProcessingOutcome {
        classification,
        response,
        debug: DebugInfo {
            method: invocation.method,
            exit_code: invocation.exit_code,
            raw_output_sample: sample(&invocation.stdout, RAW_SAMPLE_CHARS).into_owned(),
            stderr: invocation.stderr,
            cleaned_output: parsed.cleaned,
            fallback_used,
            response_defaulted,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::invoker::CapturedOutput;
    use crate::invoker::CommandLine;
    use crate::invoker::CommandRunner;
    use crate::invoker::RunError;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    /// Runner that answers every call with the same stdout.
    struct FixedOutput(&'static str);

    #[async_trait::async_trait]
    impl CommandRunner for FixedOutput {
        async fn run(
            &self,
            _command: &CommandLine,
            _stdin: Option<&str>,
            _timeout: Duration,
        ) -> Result<CapturedOutput, RunError> {
            Ok(CapturedOutput {
                stdout: self.0.to_string(),
                stderr: String::new(),
                exit_code: 0,
            })
        }
    }

    fn processor_with_output(stdout: &'static str) -> MessageProcessor {
        let invoker = ModelInvoker::with_runner(ModelConfig::default(), Arc::new(FixedOutput(stdout)));
        MessageProcessor::with_invoker(invoker, Duration::from_secs(90))
    }

    fn disabled_processor() -> MessageProcessor {
        MessageProcessor::new(ModelConfig {
            enabled: false,
            ..ModelConfig::default()
        })
    }

    #[tokio::test]
    async fn disabled_model_uses_keyword_fallback() {
        let outcome = disabled_processor()
            .process("Preciso de ajuda urgente com o servidor")
            .await;

        assert_eq!(outcome.classification, Classification::Mina);
        assert_eq!(
            outcome.response,
            "Recebemos seu e-mail e iremos verificar o assunto. Retornaremos assim que possível."
        );
        assert!(outcome.debug.fallback_used);
        assert_eq!(outcome.debug.method, InvocationMethod::Disabled);
        assert_eq!(outcome.debug.stderr, "disabled");
        assert_eq!(outcome.debug.exit_code, 0);
    }

    #[tokio::test]
    async fn disabled_model_matches_keyword_classifier() {
        let processor = disabled_processor();
        for message in ["Bom dia, tudo bem?", "Falha no login", "", "TICKET #42"] {
            let outcome = processor.process(message).await;
            assert!(outcome.debug.fallback_used);
            assert_eq!(outcome.classification, classify_by_keyword(message));
            assert!(!outcome.response.is_empty());
        }
    }

    #[tokio::test]
    async fn valid_json_answer_is_kept() {
        let outcome = processor_with_output(
            r#"{"classification": "Improdutivo", "response": "Obrigado pelo carinho!"}"#,
        )
        .process("Preciso de ajuda urgente")
        .await;

        assert_eq!(outcome.classification, Classification::Improdutivo);
        assert_eq!(outcome.response, "Obrigado pelo carinho!");
        assert!(!outcome.debug.fallback_used);
        assert!(!outcome.debug.response_defaulted);
        assert_eq!(outcome.debug.method, InvocationMethod::StdinWithFlag);
    }

    #[tokio::test]
    async fn out_of_domain_label_triggers_fallback() {
        let outcome = processor_with_output(r#"{"classification": "Produtivo", "response": "Ok"}"#)
            .process("Relatório em anexo")
            .await;

        assert_eq!(outcome.classification, Classification::Mina);
        assert_eq!(outcome.response, Classification::Mina.canned_response());
        assert!(outcome.debug.fallback_used);
    }

    #[tokio::test]
    async fn lowercase_label_is_out_of_domain() {
        let outcome = processor_with_output(r#"{"classification": "mina", "response": "Ok"}"#)
            .process("Parabéns pelo aniversário")
            .await;

        assert_eq!(outcome.classification, Classification::Improdutivo);
        assert_eq!(outcome.response, Classification::Improdutivo.canned_response());
        assert!(outcome.debug.fallback_used);
    }

    #[tokio::test]
    async fn valid_label_without_reply_gets_canned_reply() {
        let outcome = processor_with_output(r#"{"classification": "Mina"}"#)
            .process("qualquer coisa")
            .await;

        assert_eq!(outcome.classification, Classification::Mina);
        assert_eq!(outcome.response, Classification::Mina.canned_response());
        assert!(!outcome.debug.fallback_used);
        assert!(outcome.debug.response_defaulted);
    }

    #[tokio::test]
    async fn unparseable_output_falls_back() {
        let outcome = processor_with_output("⠋ ⠙ ⠹").process("Oi").await;
        assert_eq!(outcome.classification, Classification::Improdutivo);
        assert!(outcome.debug.fallback_used);
        assert_eq!(outcome.debug.cleaned_output, "⠋ ⠙ ⠹");
    }

    #[test]
    fn raw_output_sample_is_bounded() {
        let long = "x".repeat(RAW_SAMPLE_CHARS + 500);
        let invocation = InvocationResult {
            stdout: long,
            stderr: String::new(),
            exit_code: 0,
            method: InvocationMethod::StdinNoFlag,
        };
        let outcome = resolve("msg", invocation, ParseResult::default());
        assert_eq!(outcome.debug.raw_output_sample.chars().count(), RAW_SAMPLE_CHARS + 3);
        assert!(outcome.debug.raw_output_sample.ends_with("..."));
    }

    #[test]
    fn outcome_serializes_labels_as_strings() {
        let outcome = resolve(
            "urgente",
            InvocationResult::timed_out(InvocationMethod::StdinWithFlag),
            ParseResult::default(),
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["classification"], "Mina");
        assert_eq!(json["debug"]["method"], "stdin_with_flag");
        assert_eq!(json["debug"]["exit_code"], 124);
        assert_eq!(json["debug"]["stderr"], "timeout");
        assert_eq!(json["debug"]["fallback_used"], true);
    }
}
