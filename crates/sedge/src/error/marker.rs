use crate::text::TextRange;
use compact_str::CompactString;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Severity of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// What a marker reports.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum MarkerKind {
    /// A token matched no terminal.
    UnknownToken { text: CompactString },
    /// A missing terminal was synthesized during recovery.
    InsertedToken { terminal: CompactString },
    /// An extra token was skipped during recovery.
    MissingToken { text: CompactString },
    /// A token was consumed as a different terminal during recovery.
    TokenMutation {
        text: CompactString,
        expected: CompactString,
    },
    /// Several derivations existed for a tagged construct.
    Ambiguous { branches: u32 },
    /// Free-form marker added by a reduction action or post-processor.
    Custom { message: CompactString },
}

/// A diagnostic attached to a text range.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Marker {
    pub range: TextRange,
    pub severity: Severity,
    pub kind: MarkerKind,
}

impl Marker {
    #[must_use]
    pub fn unknown_token(range: TextRange, text: impl Into<CompactString>) -> Self {
        Self {
            range,
            severity: Severity::Error,
            kind: MarkerKind::UnknownToken { text: text.into() },
        }
    }

    #[must_use]
    pub fn inserted_token(range: TextRange, terminal: impl Into<CompactString>) -> Self {
        Self {
            range,
            severity: Severity::Error,
            kind: MarkerKind::InsertedToken {
                terminal: terminal.into(),
            },
        }
    }

    #[must_use]
    pub fn missing_token(range: TextRange, text: impl Into<CompactString>) -> Self {
        Self {
            range,
            severity: Severity::Error,
            kind: MarkerKind::MissingToken { text: text.into() },
        }
    }

    #[must_use]
    pub fn token_mutation(
        range: TextRange,
        text: impl Into<CompactString>,
        expected: impl Into<CompactString>,
    ) -> Self {
        Self {
            range,
            severity: Severity::Error,
            kind: MarkerKind::TokenMutation {
                text: text.into(),
                expected: expected.into(),
            },
        }
    }

    #[must_use]
    pub fn ambiguous(range: TextRange, branches: u32) -> Self {
        Self {
            range,
            severity: Severity::Warning,
            kind: MarkerKind::Ambiguous { branches },
        }
    }

    #[must_use]
    pub fn custom(range: TextRange, severity: Severity, message: impl Into<CompactString>) -> Self {
        Self {
            range,
            severity,
            kind: MarkerKind::Custom {
                message: message.into(),
            },
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    /// Human-readable message for a BCP-47-style locale. Only the primary
    /// subtag is considered; unknown locales fall back to English.
    #[must_use]
    pub fn message(&self, locale: &str) -> String {
        let lang = locale.split(['-', '_']).next().unwrap_or("en");
        match (&self.kind, lang) {
            (MarkerKind::UnknownToken { text }, "fr") => format!("symbole inconnu `{text}`"),
            (MarkerKind::UnknownToken { text }, _) => format!("unknown token `{text}`"),
            (MarkerKind::InsertedToken { terminal }, "fr") => {
                format!("`{terminal}` manquant, inséré")
            }
            (MarkerKind::InsertedToken { terminal }, _) => format!("missing `{terminal}`, inserted"),
            (MarkerKind::MissingToken { text }, "fr") => format!("`{text}` inattendu, ignoré"),
            (MarkerKind::MissingToken { text }, _) => format!("unexpected `{text}`, skipped"),
            (MarkerKind::TokenMutation { text, expected }, "fr") => {
                format!("`{text}` lu comme `{expected}`")
            }
            (MarkerKind::TokenMutation { text, expected }, _) => {
                format!("`{text}` read as `{expected}`")
            }
            (MarkerKind::Ambiguous { branches }, "fr") => {
                format!("construction ambiguë ({branches} lectures)")
            }
            (MarkerKind::Ambiguous { branches }, _) => {
                format!("ambiguous construct ({branches} readings)")
            }
            (MarkerKind::Custom { message }, _) => message.to_string(),
        }
    }
}

/// A named style over a text range.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Style {
    pub range: TextRange,
    pub name: CompactString,
}

impl Style {
    #[must_use]
    pub fn new(range: TextRange, name: impl Into<CompactString>) -> Self {
        Self {
            range,
            name: name.into(),
        }
    }
}
