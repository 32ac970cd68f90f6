//! Deterministic keyword fallback classifier.

use crate::classification::Classification;

/// Lowercase substrings that mark an email as actionable.
pub const TRIGGER_KEYWORDS: &[&str] = &[
    "urgente",
    "erro",
    "relatório",
    "importante",
    "atualização",
    "servidor",
    "falha",
    "incidente",
    "ajuda",
    "ticket",
    "suporte",
];

/// First trigger keyword found in `text`, if any.
pub fn matched_keyword(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    TRIGGER_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| lowered.contains(keyword))
}

/// `Mina` if any trigger keyword occurs in `text` (case-insensitive),
/// `Improdutivo` otherwise.
pub fn classify_by_keyword(text: &str) -> Classification {
    match matched_keyword(text) {
        Some(keyword) => {
            tracing::debug!(keyword, "keyword classifier matched");
            Classification::Mina
        }
        None => Classification::Improdutivo,
    }
}
