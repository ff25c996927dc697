//! Facade surface: text in, wire-shaped reports out.
//!
//! [`Engine`] owns a grammar and its compiled lexer and exposes the two
//! calls language tooling needs: `parse` (markers and styles) and `predict`
//! (completion proposals). Syntactic problems never fail these calls;
//! configuration problems (unknown axiom, out-of-range offset, no
//! derivation tree) do.

use crate::completion::CompletionProcessor;
use crate::earley::{EarleyConfig, ParseOutcome, Recognizer};
use crate::error::{EngineError, Marker, Style};
use crate::forest::{collect_styles, ForestError, Navigator, Reducer};
use crate::grammar::{Axiom, Grammar};
use crate::lexer::Lexer;
use crate::text::{TextRange, TextSize};
use compact_str::CompactString;

/// Result of [`Engine::parse`].
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub success: bool,
    pub markers: Vec<Marker>,
    pub styles: Vec<Style>,
}

/// One completion proposal on the wire: its text and the span it replaces
/// (absent when there is no prefix to replace).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub text: CompactString,
    pub replace: Option<TextRange>,
}

/// Result of [`Engine::predict`].
#[derive(Debug, Clone)]
pub struct PredictReport {
    pub success: bool,
    pub proposals: Vec<Proposal>,
}

/// A grammar plus its compiled lexer, ready to parse and predict.
pub struct Engine {
    grammar: Grammar,
    lexer: Lexer,
    config: EarleyConfig,
    reducers: Vec<Reducer>,
}

impl Engine {
    #[must_use]
    pub fn new(grammar: Grammar) -> Self {
        let lexer = Lexer::for_grammar(&grammar);
        Self {
            grammar,
            lexer,
            config: EarleyConfig::default(),
            reducers: vec![Reducer::PreferUnaborted, Reducer::SelectOne],
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: EarleyConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the reducer stack `parse` collapses ambiguity with. A stack
    /// that leaves several trees standing turns `parse` into a
    /// [`ForestError::AmbiguousForest`] diagnostic.
    #[must_use]
    pub fn with_reducers(mut self, reducers: Vec<Reducer>) -> Self {
        self.reducers = reducers;
        self
    }

    #[must_use]
    pub const fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Parse and reduce to a single tree, reporting markers and styles.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingAxiom`] for an unknown axiom name, and
    /// [`EngineError::Forest`] when a successful parse yields no tree
    /// ([`ForestError::Empty`]) or several trees survive the configured
    /// reducer stack ([`ForestError::AmbiguousForest`]).
    pub fn parse(&self, text: &str, axiom: Option<&str>) -> Result<ParseReport, EngineError> {
        let outcome = self.parse_outcome(text, axiom)?;
        match Navigator::new(&self.grammar, &outcome)
            .with_reducers(self.reducers.clone())
            .single_tree()
        {
            Ok(tree) => {
                let mut markers = outcome.markers().to_vec();
                markers.extend(tree.markers().iter().cloned());
                Ok(ParseReport {
                    success: outcome.success(),
                    markers,
                    styles: collect_styles(&tree),
                })
            }
            Err(ForestError::Empty) if !outcome.success() => Ok(ParseReport {
                success: false,
                markers: outcome.markers().to_vec(),
                styles: Vec::new(),
            }),
            Err(err) => Err(EngineError::Forest(err)),
        }
    }

    /// Completion proposals at a byte offset.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidOffset`] past the end of the input,
    /// [`EngineError::MissingAxiom`] for an unknown axiom name.
    pub fn predict(
        &self,
        text: &str,
        offset: u32,
        axiom: Option<&str>,
    ) -> Result<PredictReport, EngineError> {
        if offset as usize > text.len() {
            return Err(EngineError::InvalidOffset {
                offset,
                len: text.len() as u32,
            });
        }
        let outcome = self.parse_outcome(text, axiom)?;
        let proposals = CompletionProcessor::new(&self.grammar, &outcome)
            .complete(TextSize::from(offset))
            .into_iter()
            .map(|p| Proposal {
                text: p.text,
                replace: p.replace.filter(|r| !r.is_empty()),
            })
            .collect();
        Ok(PredictReport {
            success: outcome.success(),
            proposals,
        })
    }

    /// The raw parse record, for callers that walk trees or charts
    /// themselves.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingAxiom`] for an unknown axiom name.
    pub fn parse_outcome(
        &self,
        text: &str,
        axiom: Option<&str>,
    ) -> Result<ParseOutcome, EngineError> {
        let axiom = self.axiom(axiom)?;
        let tokens = self.lexer.tokenize(text);
        Ok(Recognizer::new(&self.grammar, self.config.clone()).parse(text, tokens, axiom))
    }

    fn axiom(&self, name: Option<&str>) -> Result<&Axiom, EngineError> {
        match name {
            None => Ok(self.grammar.default_axiom()),
            Some(prefix) => self
                .grammar
                .axiom_named(prefix)
                .ok_or_else(|| EngineError::MissingAxiom(prefix.to_string())),
        }
    }
}
