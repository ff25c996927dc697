use crate::grammar::analysis::compute_nullable;
use crate::grammar::feature::{neutral, Feature};
use crate::grammar::{ElementId, ProdId, ReduceAction, RuleId, Symbol, TerminalId, Value};
use crate::lexer::TokenPattern;
use compact_str::CompactString;
use hashbrown::HashSet;
use lasso::{Rodeo, RodeoReader, Spur};
use smallvec::SmallVec;
use std::sync::Arc;

/// A lexical class.
pub struct Terminal {
    pub(crate) name: Spur,
    /// Text materialized for completion proposals and insertion repairs.
    pub(crate) default_text: Option<CompactString>,
    /// Style name stamped onto scanned tokens of this class.
    pub(crate) style: Option<CompactString>,
    pub(crate) pattern: Option<TokenPattern>,
    pub(crate) eos: bool,
}

/// A named non-terminal with one or more productions.
pub struct Rule {
    pub(crate) name: Spur,
    pub(crate) productions: SmallVec<[ProdId; 4]>,
    /// Synthetic wrapper rules back axioms and never appear in user bodies.
    pub(crate) synthetic: bool,
}

/// An ordered symbol sequence owned by a rule.
pub struct Production {
    pub(crate) rule: RuleId,
    pub(crate) symbols: SmallVec<[Symbol; 4]>,
    pub(crate) element: Option<ElementId>,
    pub(crate) feature: Arc<dyn Feature>,
    pub(crate) action: Option<ReduceAction>,
}

impl Production {
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    #[must_use]
    pub const fn element(&self) -> Option<ElementId> {
        self.element
    }

    #[must_use]
    pub const fn rule(&self) -> RuleId {
        self.rule
    }

    #[must_use]
    pub fn feature(&self) -> &Arc<dyn Feature> {
        &self.feature
    }

    pub(crate) fn action(&self) -> Option<&ReduceAction> {
        self.action.as_ref()
    }
}

/// A parse entry point: a named synthetic production `axiom → target`.
pub struct Axiom {
    pub(crate) name: Spur,
    pub(crate) target: RuleId,
    pub(crate) rule: RuleId,
    pub(crate) prod: ProdId,
}

impl Axiom {
    #[must_use]
    pub const fn target(&self) -> RuleId {
        self.target
    }

    pub(crate) const fn production(&self) -> ProdId {
        self.prod
    }

    pub(crate) const fn wrapper_rule(&self) -> RuleId {
        self.rule
    }
}

/// An immutable grammar: terminals, rules, productions, axioms and the
/// nullable set, all addressed by arena indices.
pub struct Grammar {
    names: RodeoReader,
    terminals: Vec<Terminal>,
    rules: Vec<Rule>,
    productions: Vec<Production>,
    axioms: Vec<Axiom>,
    elements: Vec<Spur>,
    nullable: HashSet<RuleId, ahash::RandomState>,
    eos: TerminalId,
}

impl Grammar {
    #[must_use]
    pub fn terminal(&self, id: TerminalId) -> &Terminal {
        &self.terminals[id.index()]
    }

    #[must_use]
    pub fn terminal_name(&self, id: TerminalId) -> &str {
        self.names.resolve(&self.terminals[id.index()].name)
    }

    #[must_use]
    pub fn terminal_default_text(&self, id: TerminalId) -> Option<&CompactString> {
        self.terminals[id.index()].default_text.as_ref()
    }

    #[must_use]
    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    #[must_use]
    pub fn rule_name(&self, id: RuleId) -> &str {
        self.names.resolve(&self.rules[id.index()].name)
    }

    #[must_use]
    pub fn production(&self, id: ProdId) -> &Production {
        &self.productions[id.index()]
    }

    /// Productions of a rule, in declaration order.
    #[must_use]
    pub fn productions_of(&self, rule: RuleId) -> &[ProdId] {
        &self.rules[rule.index()].productions
    }

    #[must_use]
    pub fn element_name(&self, id: ElementId) -> &str {
        self.names.resolve(&self.elements[id.index()])
    }

    /// Whether a rule derives the empty string.
    #[must_use]
    pub fn is_nullable(&self, rule: RuleId) -> bool {
        self.nullable.contains(&rule)
    }

    #[must_use]
    pub fn axioms(&self) -> &[Axiom] {
        &self.axioms
    }

    /// First declared axiom. A built grammar always has one.
    #[must_use]
    pub fn default_axiom(&self) -> &Axiom {
        &self.axioms[0]
    }

    /// Find the axiom whose name starts with the given prefix.
    #[must_use]
    pub fn axiom_named(&self, prefix: &str) -> Option<&Axiom> {
        self.axioms
            .iter()
            .find(|axiom| self.names.resolve(&axiom.name).starts_with(prefix))
    }

    #[must_use]
    pub fn axiom_name(&self, axiom: &Axiom) -> &str {
        self.names.resolve(&axiom.name)
    }

    pub(crate) const fn eos_terminal(&self) -> TerminalId {
        self.eos
    }

    /// Terminals paired with their compiled patterns, in declaration order.
    pub(crate) fn lexable_terminals(
        &self,
    ) -> impl Iterator<Item = (TerminalId, &Terminal, &TokenPattern)> {
        self.terminals
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.eos)
            .filter_map(|(i, t)| t.pattern.as_ref().map(|p| (TerminalId(i as u32), t, p)))
    }
}

/// Declaration of a terminal, consumed by [`GrammarBuilder::terminal`].
pub struct TerminalDef {
    name: CompactString,
    default_text: Option<CompactString>,
    style: Option<CompactString>,
    pattern: Option<TokenPattern>,
}

impl TerminalDef {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            default_text: None,
            style: None,
            pattern: None,
        }
    }

    /// A fixed-text terminal: the literal is both the pattern and the
    /// default completion text.
    #[must_use]
    pub fn literal(name: &str, text: &str) -> Self {
        Self::new(name)
            .pattern(TokenPattern::literal(text))
            .default_text(text)
    }

    #[must_use]
    pub fn pattern(mut self, pattern: TokenPattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    #[must_use]
    pub fn default_text(mut self, text: &str) -> Self {
        self.default_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn style(mut self, name: &str) -> Self {
        self.style = Some(name.into());
        self
    }
}

/// Declaration of a production, consumed by [`GrammarBuilder::production`].
pub struct ProductionDef {
    rule: RuleId,
    symbols: SmallVec<[Symbol; 4]>,
    element: Option<ElementId>,
    feature: Arc<dyn Feature>,
    action: Option<ReduceAction>,
}

impl ProductionDef {
    #[must_use]
    pub fn new(rule: RuleId, symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            rule,
            symbols: symbols.into_iter().collect(),
            element: None,
            feature: neutral(),
            action: None,
        }
    }

    #[must_use]
    pub fn element(mut self, element: ElementId) -> Self {
        self.element = Some(element);
        self
    }

    #[must_use]
    pub fn feature(mut self, feature: Arc<dyn Feature>) -> Self {
        self.feature = feature;
        self
    }

    #[must_use]
    pub fn action(
        mut self,
        action: impl Fn(&mut crate::forest::ReduceContext<'_>, Vec<Value>) -> Value
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.action = Some(Arc::new(action));
        self
    }
}

/// Builder for [`Grammar`].
pub struct GrammarBuilder {
    names: Rodeo,
    terminals: Vec<Terminal>,
    rules: Vec<Rule>,
    productions: Vec<Production>,
    axioms: Vec<(Spur, RuleId)>,
    elements: Vec<Spur>,
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: Rodeo::new(),
            terminals: Vec::new(),
            rules: Vec::new(),
            productions: Vec::new(),
            axioms: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// Declare a terminal. Declaration order is the lexer's tie-break order,
    /// so keywords go before the identifier classes that would swallow them.
    pub fn terminal(&mut self, def: TerminalDef) -> TerminalId {
        let id = TerminalId(self.terminals.len() as u32);
        let name = self.names.get_or_intern(def.name.as_str());
        self.terminals.push(Terminal {
            name,
            default_text: def.default_text,
            style: def.style,
            pattern: def.pattern,
            eos: false,
        });
        id
    }

    /// Declare (or look up) a rule by name.
    pub fn rule(&mut self, name: &str) -> RuleId {
        let key = self.names.get_or_intern(name);
        if let Some(existing) = self
            .rules
            .iter()
            .position(|r| r.name == key && !r.synthetic)
        {
            return RuleId(existing as u32);
        }
        let id = RuleId(self.rules.len() as u32);
        self.rules.push(Rule {
            name: key,
            productions: SmallVec::new(),
            synthetic: false,
        });
        id
    }

    /// Register a user-level element tag.
    pub fn element(&mut self, name: &str) -> ElementId {
        let id = ElementId(self.elements.len() as u32);
        let key = self.names.get_or_intern(name);
        self.elements.push(key);
        id
    }

    /// Add a production to its rule.
    pub fn production(&mut self, def: ProductionDef) -> ProdId {
        let id = ProdId(self.productions.len() as u32);
        self.rules[def.rule.index()].productions.push(id);
        self.productions.push(Production {
            rule: def.rule,
            symbols: def.symbols,
            element: def.element,
            feature: def.feature,
            action: def.action,
        });
        id
    }

    /// Declare an axiom pointing at a rule. The first declared axiom is the
    /// default entry point.
    pub fn axiom(&mut self, name: &str, target: RuleId) {
        let key = self.names.get_or_intern(name);
        self.axioms.push((key, target));
    }

    /// Build the grammar from the declared rules.
    ///
    /// # Errors
    ///
    /// Returns an error when no axiom was declared, a rule has no
    /// production, a production or axiom references a rule or terminal
    /// this builder never declared, a terminal cannot be lexed, or two
    /// axioms share a name.
    pub fn build(mut self) -> Result<Grammar, GrammarError> {
        if self.axioms.is_empty() {
            return Err(GrammarError::NoAxiom);
        }
        for (i, (name, _)) in self.axioms.iter().enumerate() {
            if self.axioms[..i].iter().any(|(other, _)| other == name) {
                return Err(GrammarError::DuplicateAxiom(
                    self.names.resolve(name).to_string(),
                ));
            }
        }
        for rule in &self.rules {
            if rule.productions.is_empty() && !rule.synthetic {
                return Err(GrammarError::EmptyRule(
                    self.names.resolve(&rule.name).to_string(),
                ));
            }
        }
        // Dangling references: ids minted by another builder don't resolve
        // here.
        for production in &self.productions {
            for symbol in &production.symbols {
                match *symbol {
                    Symbol::Rule(rule) => {
                        if rule.index() >= self.rules.len() {
                            return Err(GrammarError::UndefinedRule(rule.0));
                        }
                    }
                    Symbol::Terminal(terminal) => {
                        if terminal.index() >= self.terminals.len() {
                            return Err(GrammarError::UndefinedTerminal(terminal.0));
                        }
                    }
                }
            }
        }
        for (_, target) in &self.axioms {
            if target.index() >= self.rules.len() {
                return Err(GrammarError::UndefinedRule(target.0));
            }
        }
        for terminal in &mut self.terminals {
            if terminal.pattern.is_none() {
                match &terminal.default_text {
                    Some(text) => terminal.pattern = Some(TokenPattern::literal(text.as_str())),
                    None => {
                        return Err(GrammarError::UnlexableTerminal(
                            self.names.resolve(&terminal.name).to_string(),
                        ))
                    }
                }
            }
        }

        // End-of-stream terminal; never produced by a pattern.
        let eos = TerminalId(self.terminals.len() as u32);
        let eos_name = self.names.get_or_intern("<eos>");
        self.terminals.push(Terminal {
            name: eos_name,
            default_text: None,
            style: None,
            pattern: None,
            eos: true,
        });

        // Wrapper rule and production per axiom.
        let axioms = self
            .axioms
            .drain(..)
            .collect::<Vec<_>>()
            .into_iter()
            .map(|(name, target)| {
                let rule = RuleId(self.rules.len() as u32);
                let prod = ProdId(self.productions.len() as u32);
                self.rules.push(Rule {
                    name,
                    productions: SmallVec::from_slice(&[prod]),
                    synthetic: true,
                });
                self.productions.push(Production {
                    rule,
                    symbols: SmallVec::from_slice(&[Symbol::Rule(target)]),
                    element: None,
                    feature: neutral(),
                    action: None,
                });
                Axiom {
                    name,
                    target,
                    rule,
                    prod,
                }
            })
            .collect();

        let nullable = compute_nullable(&self.rules, &self.productions);

        Ok(Grammar {
            names: self.names.into_reader(),
            terminals: self.terminals,
            rules: self.rules,
            productions: self.productions,
            axioms,
            elements: self.elements,
            nullable,
            eos,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("grammar declares no axiom")]
    NoAxiom,

    #[error("rule `{0}` has no production")]
    EmptyRule(String),

    #[error("terminal `{0}` has neither a pattern nor a default text")]
    UnlexableTerminal(String),

    #[error("duplicate axiom name `{0}`")]
    DuplicateAxiom(String),

    #[error("reference to undefined rule #{0}")]
    UndefinedRule(u32),

    #[error("reference to undefined terminal #{0}")]
    UndefinedTerminal(u32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::CharSet;

    fn int_def() -> TerminalDef {
        TerminalDef::new("int").pattern(TokenPattern::repeat(CharSet::digits(), 1, None))
    }

    #[test]
    fn test_build_minimal_grammar() {
        let mut builder = GrammarBuilder::new();
        let int = builder.terminal(int_def());
        let expr = builder.rule("expr");
        builder.production(ProductionDef::new(expr, [Symbol::Terminal(int)]));
        builder.axiom("root", expr);

        let grammar = builder.build().unwrap();
        assert_eq!(grammar.axioms().len(), 1);
        assert_eq!(grammar.rule_name(expr), "expr");
        assert_eq!(grammar.productions_of(expr).len(), 1);
        assert!(!grammar.is_nullable(expr));
    }

    #[test]
    fn test_build_without_axiom_fails() {
        let mut builder = GrammarBuilder::new();
        let int = builder.terminal(int_def());
        let expr = builder.rule("expr");
        builder.production(ProductionDef::new(expr, [Symbol::Terminal(int)]));

        assert!(matches!(builder.build(), Err(GrammarError::NoAxiom)));
    }

    #[test]
    fn test_build_empty_rule_fails() {
        let mut builder = GrammarBuilder::new();
        let expr = builder.rule("expr");
        builder.axiom("root", expr);

        assert!(matches!(
            builder.build(),
            Err(GrammarError::EmptyRule(name)) if name == "expr"
        ));
    }

    #[test]
    fn test_unlexable_terminal_fails() {
        let mut builder = GrammarBuilder::new();
        let t = builder.terminal(TerminalDef::new("mystery"));
        let expr = builder.rule("expr");
        builder.production(ProductionDef::new(expr, [Symbol::Terminal(t)]));
        builder.axiom("root", expr);

        assert!(matches!(
            builder.build(),
            Err(GrammarError::UnlexableTerminal(name)) if name == "mystery"
        ));
    }

    #[test]
    fn test_undefined_rule_reference_fails() {
        let mut other = GrammarBuilder::new();
        other.rule("a");
        other.rule("b");
        let foreign = other.rule("c");

        let mut builder = GrammarBuilder::new();
        let expr = builder.rule("expr");
        builder.production(ProductionDef::new(expr, [Symbol::Rule(foreign)]));
        builder.axiom("root", expr);

        assert!(matches!(
            builder.build(),
            Err(GrammarError::UndefinedRule(2))
        ));
    }

    #[test]
    fn test_undefined_terminal_reference_fails() {
        let mut other = GrammarBuilder::new();
        let _ = other.terminal(int_def());
        let foreign = other.terminal(TerminalDef::literal("plus", "+"));

        let mut builder = GrammarBuilder::new();
        let expr = builder.rule("expr");
        builder.production(ProductionDef::new(expr, [Symbol::Terminal(foreign)]));
        builder.axiom("root", expr);

        assert!(matches!(
            builder.build(),
            Err(GrammarError::UndefinedTerminal(1))
        ));
    }

    #[test]
    fn test_undefined_axiom_target_fails() {
        let mut other = GrammarBuilder::new();
        other.rule("a");
        let foreign = other.rule("b");

        let mut builder = GrammarBuilder::new();
        let int = builder.terminal(int_def());
        let expr = builder.rule("expr");
        builder.production(ProductionDef::new(expr, [Symbol::Terminal(int)]));
        builder.axiom("root", foreign);

        assert!(matches!(
            builder.build(),
            Err(GrammarError::UndefinedRule(1))
        ));
    }

    #[test]
    fn test_default_text_becomes_pattern() {
        let mut builder = GrammarBuilder::new();
        let kw = builder.terminal(TerminalDef::new("pi").default_text("pi"));
        let expr = builder.rule("expr");
        builder.production(ProductionDef::new(expr, [Symbol::Terminal(kw)]));
        builder.axiom("root", expr);

        let grammar = builder.build().unwrap();
        assert!(grammar.terminal(kw).pattern.is_some());
    }

    #[test]
    fn test_rule_lookup_is_idempotent() {
        let mut builder = GrammarBuilder::new();
        let a = builder.rule("expr");
        let b = builder.rule("expr");
        assert_eq!(a, b);
    }

    #[test]
    fn test_axiom_prefix_lookup() {
        let mut builder = GrammarBuilder::new();
        let int = builder.terminal(int_def());
        let expr = builder.rule("expr");
        let stmt = builder.rule("stmt");
        builder.production(ProductionDef::new(expr, [Symbol::Terminal(int)]));
        builder.production(ProductionDef::new(stmt, [Symbol::Rule(expr)]));
        builder.axiom("expression", expr);
        builder.axiom("statement", stmt);

        let grammar = builder.build().unwrap();
        let axiom = grammar.axiom_named("stat").unwrap();
        assert_eq!(axiom.target(), stmt);
        assert_eq!(grammar.default_axiom().target(), expr);
        assert!(grammar.axiom_named("nope").is_none());
    }

    #[test]
    fn test_duplicate_axiom_fails() {
        let mut builder = GrammarBuilder::new();
        let int = builder.terminal(int_def());
        let expr = builder.rule("expr");
        builder.production(ProductionDef::new(expr, [Symbol::Terminal(int)]));
        builder.axiom("root", expr);
        builder.axiom("root", expr);

        assert!(matches!(
            builder.build(),
            Err(GrammarError::DuplicateAxiom(name)) if name == "root"
        ));
    }
}
