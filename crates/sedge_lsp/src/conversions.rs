//! Conversion traits from sedge types to LSP types.

use crate::line_index::LineIndex;
use lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, Diagnostic, DiagnosticSeverity,
    Position, Range, TextEdit,
};
use sedge::api::Proposal;
use sedge::error::{Marker, Severity};
use sedge::text::{TextRange, TextSize};

/// Convert a [`Marker`] to an LSP `Diagnostic`.
pub trait ToDiagnostic {
    /// Convert to an LSP diagnostic, resolving the message for the given
    /// locale against the given source text.
    fn to_diagnostic(&self, source_text: &str, locale: &str) -> Diagnostic;
}

impl ToDiagnostic for Marker {
    fn to_diagnostic(&self, source_text: &str, locale: &str) -> Diagnostic {
        Diagnostic {
            range: self.range.to_range_with_source(source_text),
            severity: Some(severity_to_lsp(self.severity)),
            code: None,
            code_description: None,
            source: Some("sedge".to_string()),
            message: self.message(locale),
            related_information: None,
            tags: None,
            data: None,
        }
    }
}

/// Convert a [`TextRange`] to an LSP `Range`.
///
/// **Note**: this simplified conversion uses byte offsets as character
/// positions on line 0. For accurate line/column positions use
/// [`ToRangeWithSource`].
pub trait ToRange {
    fn to_range(&self) -> Range;
}

impl ToRange for TextRange {
    fn to_range(&self) -> Range {
        Range {
            start: Position::new(0, self.start().into()),
            end: Position::new(0, self.end().into()),
        }
    }
}

/// Convert a [`TextRange`] to an LSP `Range` with accurate line/column
/// positions computed from the source text.
pub trait ToRangeWithSource {
    fn to_range_with_source(&self, source_text: &str) -> Range;
}

impl ToRangeWithSource for TextRange {
    fn to_range_with_source(&self, source_text: &str) -> Range {
        let index = LineIndex::new(source_text);
        Range {
            start: position_with_index(&index, self.start()),
            end: position_with_index(&index, self.end()),
        }
    }
}

/// Convert a completion [`Proposal`] to an LSP `CompletionItem`.
pub trait ToCompletionItem {
    fn to_completion_item(&self, source_text: &str) -> CompletionItem;
}

impl ToCompletionItem for Proposal {
    fn to_completion_item(&self, source_text: &str) -> CompletionItem {
        let text_edit = self.replace.map(|range| {
            CompletionTextEdit::Edit(TextEdit {
                range: range.to_range_with_source(source_text),
                new_text: self.text.to_string(),
            })
        });
        CompletionItem {
            label: self.text.to_string(),
            kind: Some(CompletionItemKind::TEXT),
            text_edit,
            ..Default::default()
        }
    }
}

fn severity_to_lsp(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Info => DiagnosticSeverity::INFORMATION,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Error => DiagnosticSeverity::ERROR,
    }
}

fn position_with_index(index: &LineIndex, offset: TextSize) -> Position {
    let (line, character) = index.line_col(offset);
    Position { line, character }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_to_diagnostic() {
        let marker = Marker::unknown_token(
            TextRange::at(TextSize::from(2), TextSize::from(1)),
            "@",
        );
        let diagnostic = marker.to_diagnostic("1 @ 2", "en");

        assert_eq!(diagnostic.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diagnostic.message, "unknown token `@`");
        assert_eq!(diagnostic.range.start, Position::new(0, 2));
        assert_eq!(diagnostic.range.end, Position::new(0, 3));
        assert_eq!(diagnostic.source.as_deref(), Some("sedge"));
    }

    #[test]
    fn test_marker_to_diagnostic_multiline() {
        let marker = Marker::missing_token(
            TextRange::at(TextSize::from(4), TextSize::from(1)),
            ")",
        );
        let diagnostic = marker.to_diagnostic("1 +\n2)", "en");

        assert_eq!(diagnostic.range.start, Position::new(1, 0));
        assert_eq!(diagnostic.range.end, Position::new(1, 1));
    }

    #[test]
    fn test_marker_locale_passthrough() {
        let marker = Marker::inserted_token(TextRange::empty(TextSize::from(3)), "int");
        let diagnostic = marker.to_diagnostic("1 +", "fr");
        assert_eq!(diagnostic.message, "`int` manquant, inséré");
    }

    #[test]
    fn test_proposal_to_completion_item() {
        let proposal = Proposal {
            text: "pi".into(),
            replace: Some(TextRange::at(TextSize::from(4), TextSize::from(1))),
        };
        let item = proposal.to_completion_item("1 + p");

        assert_eq!(item.label, "pi");
        match item.text_edit {
            Some(CompletionTextEdit::Edit(edit)) => {
                assert_eq!(edit.new_text, "pi");
                assert_eq!(edit.range.start, Position::new(0, 4));
            }
            _ => panic!("expected a plain text edit"),
        }
    }

    #[test]
    fn test_proposal_without_replace() {
        let proposal = Proposal {
            text: "0".into(),
            replace: None,
        };
        let item = proposal.to_completion_item("1 + ");
        assert!(item.text_edit.is_none());
    }
}
