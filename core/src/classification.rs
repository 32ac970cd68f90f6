//! The two-valued email label.

use std::fmt;

use serde::Serialize;

/// Final label attached to an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Classification {
    /// Productive: actionable, needs a reply
    Mina,
    /// Unproductive: no action needed
    Improdutivo,
}

impl Classification {
    pub const ALL: [Classification; 2] = [Self::Mina, Self::Improdutivo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mina => "Mina",
            Self::Improdutivo => "Improdutivo",
        }
    }

    /// Exact, case-sensitive match against a label produced by the model.
    ///
    /// Anything other than `"Mina"` or `"Improdutivo"` (including
    /// differently cased or padded variants) is out of domain.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == label)
    }

    /// Reply used when the model gave no usable answer.
    pub fn canned_response(&self) -> &'static str {
        match self {
            Self::Mina => {
                "Recebemos seu e-mail e iremos verificar o assunto. Retornaremos assim que possível."
            }
            Self::Improdutivo => {
                "Obrigado pela mensagem! Caso precise de algo relacionado ao suporte, nos avise."
            }
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
