//! # Lexer Module
//!
//! Tokenization driven by the grammar's terminal patterns.
//!
//! ## Overview
//!
//! The lexer is compiled from a [`Grammar`](crate::grammar::Grammar): every
//! terminal contributes its pattern, and scanning picks the longest match at
//! each position (declaration order breaks ties). Whitespace is skipped,
//! characters that match no pattern become tokens with no terminal id, and
//! every stream ends with an end-of-stream token the recognizer never steps
//! past.

pub mod pattern;
pub mod token;

pub use pattern::{CharSet, TokenPattern};
pub use token::Token;

use crate::grammar::{Grammar, TerminalId};
use crate::text::TextSize;
use compact_str::CompactString;

/// A scanner compiled from a grammar's terminal patterns.
pub struct Lexer {
    entries: Vec<LexEntry>,
    skip: CharSet,
    eos: TerminalId,
}

struct LexEntry {
    terminal: TerminalId,
    pattern: TokenPattern,
    style: Option<CompactString>,
}

impl Lexer {
    /// Compile a lexer from a grammar.
    #[must_use]
    pub fn for_grammar(grammar: &Grammar) -> Self {
        let entries = grammar
            .lexable_terminals()
            .map(|(terminal, def, pattern)| LexEntry {
                terminal,
                pattern: pattern.clone(),
                style: def.style.clone(),
            })
            .collect();
        Self {
            entries,
            skip: CharSet::whitespace(),
            eos: grammar.eos_terminal(),
        }
    }

    /// Replace the skipped character set (defaults to whitespace).
    #[must_use]
    pub fn with_skip(mut self, skip: CharSet) -> Self {
        self.skip = skip;
        self
    }

    /// Tokenize the whole input. The result always ends with the
    /// end-of-stream token.
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut pos = 0;

        while pos < text.len() {
            let rest = &text[pos..];
            let c = rest.chars().next().unwrap_or('\0');

            if self.skip.contains(c) {
                pos += c.len_utf8();
                continue;
            }

            match self.longest_match(rest) {
                Some((entry, len)) => {
                    let mut token = Token::new(
                        entry.terminal,
                        TextSize::from(pos as u32),
                        &rest[..len],
                    );
                    token.style = entry.style.clone();
                    tokens.push(token);
                    pos += len;
                }
                None => {
                    // Group consecutive unmatched characters into one error
                    // token; it doubles as the word being typed for
                    // completion.
                    let start = pos;
                    let mut end = pos + c.len_utf8();
                    while end < text.len() {
                        let rest = &text[end..];
                        let next = rest.chars().next().unwrap_or('\0');
                        if self.skip.contains(next) || self.longest_match(rest).is_some() {
                            break;
                        }
                        end += next.len_utf8();
                    }
                    tokens.push(Token::unknown(
                        TextSize::from(start as u32),
                        &text[start..end],
                    ));
                    pos = end;
                }
            }
        }

        tokens.push(Token::end_of_stream(self.eos, TextSize::from(pos as u32)));
        tokens
    }

    fn longest_match(&self, input: &str) -> Option<(&LexEntry, usize)> {
        let mut best: Option<(&LexEntry, usize)> = None;
        for entry in &self.entries {
            if let Some(len) = entry.pattern.match_len(input) {
                if len > 0 && best.map_or(true, |(_, b)| len > b) {
                    best = Some((entry, len));
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarBuilder, ProductionDef, Symbol, TerminalDef};

    fn calculator() -> (Grammar, TerminalId, TerminalId, TerminalId) {
        let mut builder = GrammarBuilder::new();
        let int = builder.terminal(
            TerminalDef::new("int")
                .pattern(TokenPattern::repeat(CharSet::digits(), 1, None))
                .style("string"),
        );
        let plus = builder.terminal(TerminalDef::literal("plus", "+"));
        let pi = builder.terminal(TerminalDef::literal("pi", "pi").style("constant"));
        let expr = builder.rule("expr");
        builder.production(ProductionDef::new(expr, [Symbol::Terminal(int)]));
        builder.production(ProductionDef::new(expr, [Symbol::Terminal(pi)]));
        builder.production(ProductionDef::new(
            expr,
            [Symbol::Rule(expr), Symbol::Terminal(plus), Symbol::Rule(expr)],
        ));
        builder.axiom("root", expr);
        (builder.build().unwrap(), int, plus, pi)
    }

    #[test]
    fn test_tokenize_simple_expression() {
        let (grammar, int, plus, pi) = calculator();
        let lexer = Lexer::for_grammar(&grammar);
        let tokens = lexer.tokenize("1 + pi");

        assert_eq!(tokens.len(), 4); // 1, +, pi, eos
        assert!(tokens[0].matches(int));
        assert_eq!(tokens[0].offset, TextSize::from(0));
        assert!(tokens[1].matches(plus));
        assert_eq!(tokens[1].offset, TextSize::from(2));
        assert!(tokens[2].matches(pi));
        assert_eq!(tokens[2].offset, TextSize::from(4));
        assert_eq!(tokens[2].text, "pi");
        assert!(tokens[3].eos);
        assert_eq!(tokens[3].offset, TextSize::from(6));
    }

    #[test]
    fn test_tokenize_styles() {
        let (grammar, ..) = calculator();
        let lexer = Lexer::for_grammar(&grammar);
        let tokens = lexer.tokenize("1 pi");

        assert_eq!(tokens[0].style.as_deref(), Some("string"));
        assert_eq!(tokens[1].style.as_deref(), Some("constant"));
    }

    #[test]
    fn test_tokenize_unknown_character() {
        let (grammar, ..) = calculator();
        let lexer = Lexer::for_grammar(&grammar);
        let tokens = lexer.tokenize("1 @ 2");

        assert_eq!(tokens.len(), 4);
        assert!(tokens[1].terminal.is_none());
        assert_eq!(tokens[1].text, "@");
        assert_eq!(tokens[1].offset, TextSize::from(2));
    }

    #[test]
    fn test_tokenize_groups_unknown_characters() {
        let (grammar, int, ..) = calculator();
        let lexer = Lexer::for_grammar(&grammar);
        let tokens = lexer.tokenize("1 @# 2");

        assert_eq!(tokens.len(), 4);
        assert!(tokens[1].terminal.is_none());
        assert_eq!(tokens[1].text, "@#");
        assert!(tokens[2].matches(int));
    }

    #[test]
    fn test_tokenize_longest_match_wins() {
        let (grammar, int, ..) = calculator();
        let lexer = Lexer::for_grammar(&grammar);
        let tokens = lexer.tokenize("1234");

        assert_eq!(tokens.len(), 2);
        assert!(tokens[0].matches(int));
        assert_eq!(tokens[0].text, "1234");
    }

    #[test]
    fn test_tokenize_empty_input() {
        let (grammar, ..) = calculator();
        let lexer = Lexer::for_grammar(&grammar);
        let tokens = lexer.tokenize("");

        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].eos);
        assert_eq!(tokens[0].offset, TextSize::zero());
    }
}
