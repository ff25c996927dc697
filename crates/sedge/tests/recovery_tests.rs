//! Error-recovery behavior: insertion, deletion, mutation, lexical errors.

use sedge::api::Engine;
use sedge::earley::EarleyConfig;
use sedge::error::MarkerKind;
use sedge::grammar::{GrammarBuilder, ProductionDef, Symbol, TerminalDef, Value};
use sedge::lexer::{CharSet, TokenPattern};
use sedge::text::TextSize;
use sedge::Navigator;

/// expr → expr '+' term | term ; term → int | 'pi'
fn calculator() -> Engine {
    let mut builder = GrammarBuilder::new();
    let int = builder.terminal(
        TerminalDef::new("int")
            .pattern(TokenPattern::repeat(CharSet::digits(), 1, None))
            .default_text("0"),
    );
    let plus = builder.terminal(TerminalDef::literal("plus", "+"));
    let pi = builder.terminal(TerminalDef::literal("pi", "pi"));

    let expr = builder.rule("expr");
    let term = builder.rule("term");
    let add = builder.element("add");

    builder.production(
        ProductionDef::new(
            expr,
            [Symbol::Rule(expr), Symbol::Terminal(plus), Symbol::Rule(term)],
        )
        .element(add)
        .action(|_, mut args| {
            // Keep whatever operands survived recovery.
            args.retain(|v| matches!(v, Value::Int(_) | Value::Float(_)));
            match args.len() {
                2 => match (&args[0], &args[1]) {
                    (Value::Int(a), Value::Int(b)) => Value::Int(a + b),
                    _ => Value::None,
                },
                1 => args.pop().unwrap_or(Value::None),
                _ => Value::None,
            }
        }),
    );
    builder.production(
        ProductionDef::new(expr, [Symbol::Rule(term)])
            .action(|_, mut args| args.pop().unwrap_or(Value::None)),
    );
    builder.production(
        ProductionDef::new(term, [Symbol::Terminal(int)]).action(|_, args| {
            match args.first() {
                Some(Value::Token(token)) => Value::Int(token.text.parse().unwrap_or(0)),
                _ => Value::None,
            }
        }),
    );
    builder.production(ProductionDef::new(term, [Symbol::Terminal(pi)]).action(|_, _| {
        Value::Float(std::f64::consts::PI)
    }));
    builder.axiom("root", expr);

    Engine::new(builder.build().expect("calculator grammar builds"))
}

#[test]
fn test_missing_operand_is_inserted() {
    let engine = calculator();
    let report = engine.parse("1 +", None).unwrap();

    assert!(!report.success);
    assert_eq!(report.markers.len(), 1);
    let marker = &report.markers[0];
    assert!(matches!(&marker.kind, MarkerKind::InsertedToken { terminal } if terminal == "int"));
    assert_eq!(marker.range.start(), TextSize::from(3));
    assert!(marker.range.is_empty());
}

#[test]
fn test_missing_operand_still_yields_a_tree() {
    let engine = calculator();
    let outcome = engine.parse_outcome("1 +", None).unwrap();
    assert!(!outcome.success());

    let tree = Navigator::new(engine.grammar(), &outcome)
        .single_tree()
        .unwrap();
    // The synthesized operand is not an action argument.
    assert!(matches!(tree.value(), Value::Int(1)));
    assert_eq!(tree.markers().len(), 1);
}

#[test]
fn test_extra_token_is_repaired() {
    let engine = calculator();
    let report = engine.parse("1 2", None).unwrap();

    assert!(!report.success);
    assert_eq!(report.markers.len(), 1);
    assert!(report.markers[0].is_error());
}

#[test]
fn test_unknown_token_is_reported_once() {
    let engine = calculator();
    let report = engine.parse("1 @ 2", None).unwrap();

    assert!(!report.success);
    let unknown: Vec<_> = report
        .markers
        .iter()
        .filter(|m| matches!(m.kind, MarkerKind::UnknownToken { .. }))
        .collect();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].range.start(), TextSize::from(2));
    assert_eq!(unknown[0].range.len(), TextSize::from(1));
    assert_eq!(unknown[0].message("en"), "unknown token `@`");
}

#[test]
fn test_unknown_token_still_yields_best_effort_tree() {
    let engine = calculator();
    let outcome = engine.parse_outcome("1 @ 2", None).unwrap();
    assert_eq!(outcome.error_tokens().len(), 1);
    assert_eq!(outcome.error_tokens()[0].text, "@");

    let tree = Navigator::new(engine.grammar(), &outcome)
        .single_tree()
        .unwrap();
    // Both operands survive: the unknown token was dropped, an operator
    // synthesized between them.
    assert!(matches!(tree.value(), Value::Int(3)));
}

#[test]
fn test_mutation_repair() {
    // pair → '(' int ')', with ']' lexable but never valid.
    let mut builder = GrammarBuilder::new();
    let lparen = builder.terminal(TerminalDef::literal("lparen", "("));
    let rparen = builder.terminal(TerminalDef::literal("rparen", ")"));
    let _rbracket = builder.terminal(TerminalDef::literal("rbracket", "]"));
    let int = builder.terminal(
        TerminalDef::new("int").pattern(TokenPattern::repeat(CharSet::digits(), 1, None)),
    );
    let pair = builder.rule("pair");
    builder.production(ProductionDef::new(
        pair,
        [
            Symbol::Terminal(lparen),
            Symbol::Terminal(int),
            Symbol::Terminal(rparen),
        ],
    ));
    builder.axiom("root", pair);
    let engine = Engine::new(builder.build().unwrap());

    let report = engine.parse("(1]", None).unwrap();
    assert!(!report.success);
    assert_eq!(report.markers.len(), 1);
    let marker = &report.markers[0];
    assert!(matches!(
        &marker.kind,
        MarkerKind::TokenMutation { text, expected } if text == "]" && expected == "rparen"
    ));
    assert_eq!(marker.message("en"), "`]` read as `rparen`");
    assert_eq!(marker.range.start(), TextSize::from(2));
}

#[test]
fn test_recovery_can_be_disabled() {
    let engine = calculator().with_config(EarleyConfig::default().with_error_recovery(false));
    let outcome = engine.parse_outcome("1 +", None).unwrap();

    assert!(!outcome.success());
    let trees = Navigator::new(engine.grammar(), &outcome).trees();
    assert!(trees.is_empty());
}

#[test]
fn test_failed_parse_reports_without_styles() {
    let engine = calculator().with_config(EarleyConfig::default().with_error_recovery(false));
    let report = engine.parse("1 +", None).unwrap();

    assert!(!report.success);
    assert!(report.styles.is_empty());
}

#[test]
fn test_empty_input_recovers_to_defaults() {
    let engine = calculator();
    let outcome = engine.parse_outcome("", None).unwrap();
    assert!(!outcome.success());

    let tree = Navigator::new(engine.grammar(), &outcome)
        .single_tree()
        .unwrap();
    // A whole operand was synthesized; it carries its insertion marker.
    assert_eq!(tree.markers().len(), 1);
    assert!(matches!(
        tree.markers()[0].kind,
        MarkerKind::InsertedToken { .. }
    ));
}

#[test]
fn test_recovered_outcome_metrics() {
    let engine = calculator();
    let outcome = engine.parse_outcome("1 + + 2", None).unwrap();
    assert!(!outcome.success());
    assert!(outcome.metrics().recovery_rounds > 0);
    assert!(outcome.metrics().states > 0);
}
