use crate::grammar::TerminalId;
use crate::text::{TextRange, TextSize};
use compact_str::CompactString;

/// A lexed token.
///
/// `terminal` is `None` when no pattern matched: the token is a lexical
/// error and is reported as such by the recognizer. The end-of-stream token
/// closes every stream and carries empty text.
#[derive(Debug, Clone)]
pub struct Token {
    pub terminal: Option<TerminalId>,
    pub offset: TextSize,
    pub text: CompactString,
    pub style: Option<CompactString>,
    pub eos: bool,
}

impl Token {
    #[must_use]
    pub fn new(terminal: TerminalId, offset: TextSize, text: impl Into<CompactString>) -> Self {
        Self {
            terminal: Some(terminal),
            offset,
            text: text.into(),
            style: None,
            eos: false,
        }
    }

    pub(crate) fn unknown(offset: TextSize, text: impl Into<CompactString>) -> Self {
        Self {
            terminal: None,
            offset,
            text: text.into(),
            style: None,
            eos: false,
        }
    }

    pub(crate) fn end_of_stream(terminal: TerminalId, offset: TextSize) -> Self {
        Self {
            terminal: Some(terminal),
            offset,
            text: CompactString::default(),
            style: None,
            eos: true,
        }
    }

    #[must_use]
    pub fn len(&self) -> TextSize {
        TextSize::of(&self.text)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[must_use]
    pub fn range(&self) -> TextRange {
        TextRange::at(self.offset, self.len())
    }

    #[must_use]
    pub fn end_offset(&self) -> TextSize {
        self.range().end()
    }

    /// Whether this token belongs to the given lexical class.
    #[must_use]
    pub fn matches(&self, terminal: TerminalId) -> bool {
        self.terminal == Some(terminal)
    }
}
