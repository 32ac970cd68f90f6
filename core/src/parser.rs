//! Recovery of a label and a suggested reply from free-form model output.
//!
//! Models are asked for a JSON object but frequently answer with prose,
//! `Classificação: ...` style lines, or a mix. Extraction runs as an
//! ordered pipeline:
//!
//! 1. strip terminal escapes and trim
//! 2. JSON object (terminal when the text is a JSON object at all)
//! 3. `Classificação:` / `Resposta:` line markers
//! 4. label search over the whole text
//! 5. first two sentences that do not talk about the classification
//!
//! Stages 3-5 each yield a partial [`Extraction`]; partials merge left to
//! right and the first stage to fill a field wins.

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use triage_ansi_escape::strip_ansi;

use crate::classification::Classification;

const LABEL_KEYS: &[&str] = &["classification", "classificacao"];
const RESPONSE_KEYS: &[&str] = &["response", "resposta"];
const RESPONSE_PREFIXES: &[&str] = &["resposta", "response", "reply"];

/// What could be recovered from one model output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    /// Raw label; may be out of domain when it came from JSON
    pub classification: Option<String>,
    pub response: Option<String>,
    /// Output with escapes removed and whitespace trimmed, or the raw
    /// output when nothing was left after cleaning
    pub cleaned: String,
}

/// Partial result of one extraction stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub classification: Option<String>,
    pub response: Option<String>,
}

impl Extraction {
    /// Fill fields still empty in `self` from `later`.
    pub fn merge(self, later: Extraction) -> Extraction {
        Extraction {
            classification: self.classification.or(later.classification),
            response: self.response.or(later.response),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.classification.is_some() && self.response.is_some()
    }
}

type Stage = fn(&str) -> Extraction;

/// Heuristic stages run when the output is not a JSON object.
const HEURISTIC_STAGES: &[(&str, Stage)] = &[
    ("line_markers", extract_line_markers),
    ("label_search", search_label),
    ("leading_sentences", leading_sentences),
];

/// Parse raw runner output.
pub fn parse(raw: &str) -> ParseResult {
    let stripped = strip_ansi(raw);
    let cleaned = stripped.trim();
    if cleaned.is_empty() {
        return ParseResult {
            classification: None,
            response: None,
            cleaned: raw.to_string(),
        };
    }

    let extraction = match extract_json(cleaned) {
        Some(structured) => structured,
        None => run_heuristics(cleaned),
    };

    ParseResult {
        classification: extraction.classification,
        response: extraction.response,
        cleaned: cleaned.to_string(),
    }
}

fn run_heuristics(cleaned: &str) -> Extraction {
    let mut merged = Extraction::default();
    for (name, stage) in HEURISTIC_STAGES {
        if merged.is_complete() {
            break;
        }
        let partial = stage(cleaned);
        tracing::trace!(stage = *name, ?partial, "extraction stage");
        merged = merged.merge(partial);
    }
    merged
}

/// `Some` when `cleaned` is a JSON object, even one without the expected
/// keys. A label that is present but not a string sends the output on to
/// the heuristics; a non-string response counts as absent.
fn extract_json(cleaned: &str) -> Option<Extraction> {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(cleaned) else {
        return None;
    };

    let classification = match first_present(&map, LABEL_KEYS) {
        None => None,
        Some(Value::String(label)) => Some(label.trim())
            .filter(|label| !label.is_empty())
            .map(str::to_string),
        Some(other) => {
            tracing::debug!(label = %other, "non-string label in JSON answer");
            return None;
        }
    };
    let response = first_present(&map, RESPONSE_KEYS)
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(Extraction {
        classification,
        response,
    })
}

/// First value under `keys` that is not null, false, zero or empty.
fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| is_present(value))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Label named in an already lowercased fragment. `mina` wins over
/// `improdutivo` when both appear.
fn label_in(lowered: &str) -> Option<Classification> {
    if lowered.contains("mina") {
        Some(Classification::Mina)
    } else if lowered.contains("improdutivo") {
        Some(Classification::Improdutivo)
    } else {
        None
    }
}

fn after_colon(line: &str) -> Option<&str> {
    line.split_once(':').map(|(_, rest)| rest.trim())
}

fn extract_line_markers(cleaned: &str) -> Extraction {
    let mut classification: Option<Classification> = None;
    let mut response_lines: Vec<&str> = Vec::new();

    for line in cleaned.split(['\n', '\r']) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lowered = line.to_lowercase();

        if lowered.contains("classifica") || lowered.starts_with("classification") {
            let label = label_in(&lowered)
                .or_else(|| after_colon(line).and_then(|value| label_in(&value.to_lowercase())));
            if label.is_some() {
                classification = label;
            }
        } else if RESPONSE_PREFIXES
            .iter()
            .any(|prefix| lowered.starts_with(prefix))
        {
            if let Some(rest) = after_colon(line)
                && !rest.is_empty()
            {
                response_lines.push(rest);
            }
        } else if classification.is_some() {
            // Trailing lines after the label are taken as the reply body.
            response_lines.push(line);
        }
    }

    let response = response_lines.join(" ");
    let response = response.trim();
    Extraction {
        classification: classification.map(|c| c.as_str().to_string()),
        response: (!response.is_empty()).then(|| response.to_string()),
    }
}

fn search_label(cleaned: &str) -> Extraction {
    Extraction {
        classification: label_in(&cleaned.to_lowercase()).map(|c| c.as_str().to_string()),
        response: None,
    }
}

fn leading_sentences(cleaned: &str) -> Extraction {
    let kept: Vec<&str> = split_sentences(cleaned)
        .into_iter()
        .filter(|sentence| {
            !sentence.trim().is_empty() && !sentence.to_lowercase().contains("classific")
        })
        .take(2)
        .collect();

    let joined = kept.join(" ");
    let joined = joined.trim();
    Extraction {
        classification: None,
        response: (!joined.is_empty()).then(|| joined.to_string()),
    }
}

/// Split after `.`, `?` or `!` wherever whitespace follows; the whitespace
/// run itself is dropped.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch.is_whitespace() && matches!(prev, Some('.' | '?' | '!')) {
            sentences.push(&text[start..idx]);
            let mut end = idx + ch.len_utf8();
            while let Some(&(next_idx, next)) = chars.peek() {
                if !next.is_whitespace() {
                    break;
                }
                end = next_idx + next.len_utf8();
                chars.next();
            }
            start = end;
            prev = None;
            continue;
        }
        prev = Some(ch);
    }
    sentences.push(&text[start..]);
    sentences
}
