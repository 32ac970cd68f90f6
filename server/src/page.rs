//! Server-rendered page.

use askama::Template;
use triage_core::ProcessingOutcome;

use crate::error::Result;

/// Shown when the upload form is submitted without a file.
pub const NO_FILE_NOTICE: &str = "Nenhum arquivo selecionado";

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub notice: Option<String>,
    pub result: Option<ResultView>,
}

/// What the page shows for one processed upload.
pub struct ResultView {
    pub classification: String,
    pub message: String,
    pub response: String,
    pub debug_json: Option<String>,
}

impl ResultView {
    pub fn new(message: String, outcome: &ProcessingOutcome, show_debug: bool) -> Result<Self> {
        let debug_json = if show_debug {
            Some(serde_json::to_string_pretty(&outcome.debug)?)
        } else {
            None
        };
        Ok(Self {
            classification: outcome.classification.to_string(),
            message,
            response: outcome.response.clone(),
            debug_json,
        })
    }
}

impl IndexPage {
    pub fn empty() -> Self {
        Self {
            notice: None,
            result: None,
        }
    }

    pub fn notice(text: &str) -> Self {
        Self {
            notice: Some(text.to_string()),
            result: None,
        }
    }

    pub fn with_result(result: ResultView) -> Self {
        Self {
            notice: None,
            result: Some(result),
        }
    }
}
