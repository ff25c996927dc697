//! End-to-end tests over a small calculator grammar.

use sedge::api::Engine;
use sedge::error::{MarkerKind, Style};
use sedge::grammar::{GrammarBuilder, ProductionDef, Symbol, TerminalDef, Value};
use sedge::lexer::{CharSet, TokenPattern};
use sedge::text::{TextRange, TextSize};

/// expr → expr '+' term | term ; term → int | 'pi'
fn calculator() -> Engine {
    let mut builder = GrammarBuilder::new();
    let int = builder.terminal(
        TerminalDef::new("int")
            .pattern(TokenPattern::repeat(CharSet::digits(), 1, None))
            .default_text("0")
            .style("string"),
    );
    let plus = builder.terminal(TerminalDef::literal("plus", "+"));
    let pi = builder.terminal(TerminalDef::literal("pi", "pi").style("constant"));

    let expr = builder.rule("expr");
    let term = builder.rule("term");
    let add = builder.element("add");

    builder.production(
        ProductionDef::new(
            expr,
            [Symbol::Rule(expr), Symbol::Terminal(plus), Symbol::Rule(term)],
        )
        .element(add)
        .action(|ctx, args| {
            ctx.set_token_style(1, "keyword");
            match (args.first(), args.get(2)) {
                (Some(Value::Int(a)), Some(Value::Int(b))) => Value::Int(a + b),
                (Some(Value::Int(a)), Some(Value::Float(b))) => Value::Float(*a as f64 + b),
                (Some(Value::Float(a)), Some(Value::Int(b))) => Value::Float(a + *b as f64),
                (Some(Value::Float(a)), Some(Value::Float(b))) => Value::Float(a + b),
                (Some(lhs), _) => lhs.clone(),
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
    builder.production(
        ProductionDef::new(term, [Symbol::Terminal(pi)])
            .action(|_, _| Value::Float(std::f64::consts::PI)),
    );
    builder.axiom("root", expr);

    Engine::new(builder.build().expect("calculator grammar builds"))
}

fn style(offset: u32, len: u32, name: &str) -> Style {
    Style::new(
        TextRange::at(TextSize::from(offset), TextSize::from(len)),
        name,
    )
}

#[test]
fn test_parse_simple_sum() {
    let engine = calculator();
    let report = engine.parse("1 + pi", None).unwrap();

    assert!(report.success);
    assert!(report.markers.is_empty());
    assert_eq!(
        report.styles,
        vec![
            style(2, 1, "keyword"),
            style(0, 1, "string"),
            style(4, 2, "constant"),
        ]
    );
}

#[test]
fn test_parse_value_flows_through_actions() {
    let engine = calculator();
    let outcome = engine.parse_outcome("1 + 2 + 3", None).unwrap();
    assert!(outcome.success());

    let tree = sedge::Navigator::new(engine.grammar(), &outcome)
        .single_tree()
        .unwrap();
    assert!(matches!(tree.value(), Value::Int(6)));
}

#[test]
fn test_hierarchical_ast_values() {
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    enum Ast {
        Int(i64),
        Float(f64),
        Add(Arc<Ast>, Arc<Ast>),
    }

    fn to_ast(value: &Value) -> Option<Arc<Ast>> {
        match value {
            Value::Int(v) => Some(Arc::new(Ast::Int(*v))),
            Value::Float(v) => Some(Arc::new(Ast::Float(*v))),
            _ => value.downcast::<Ast>().map(|a| Arc::new(a.clone())),
        }
    }

    // sum → num '+' num ; num → int | float
    let mut builder = GrammarBuilder::new();
    let float = builder.terminal(TerminalDef::new("float").pattern(TokenPattern::seq([
        TokenPattern::repeat(CharSet::digits(), 1, None),
        TokenPattern::literal("."),
        TokenPattern::repeat(CharSet::digits(), 1, None),
    ])));
    let int = builder.terminal(
        TerminalDef::new("int").pattern(TokenPattern::repeat(CharSet::digits(), 1, None)),
    );
    let plus = builder.terminal(TerminalDef::literal("plus", "+"));
    let sum = builder.rule("sum");
    let num = builder.rule("num");

    builder.production(
        ProductionDef::new(
            sum,
            [Symbol::Rule(num), Symbol::Terminal(plus), Symbol::Rule(num)],
        )
        .action(|_, args| {
            match (args.first().and_then(to_ast), args.get(2).and_then(to_ast)) {
                (Some(lhs), Some(rhs)) => Value::user(Ast::Add(lhs, rhs)),
                _ => Value::None,
            }
        }),
    );
    builder.production(
        ProductionDef::new(num, [Symbol::Terminal(int)]).action(|_, args| {
            match args.first() {
                Some(Value::Token(t)) => Value::Int(t.text.parse().unwrap_or(0)),
                _ => Value::None,
            }
        }),
    );
    builder.production(
        ProductionDef::new(num, [Symbol::Terminal(float)]).action(|_, args| {
            match args.first() {
                Some(Value::Token(t)) => Value::Float(t.text.parse().unwrap_or(0.0)),
                _ => Value::None,
            }
        }),
    );
    builder.axiom("root", sum);
    let engine = Engine::new(builder.build().unwrap());

    let outcome = engine.parse_outcome("12 + 12.34", None).unwrap();
    assert!(outcome.success());

    let trees = sedge::Navigator::new(engine.grammar(), &outcome).trees();
    assert_eq!(trees.len(), 1);
    let ast = trees[0].value().downcast::<Ast>().expect("user value");
    match ast {
        Ast::Add(lhs, rhs) => {
            assert_eq!(**lhs, Ast::Int(12));
            match &**rhs {
                Ast::Float(v) => assert!((v - 12.34).abs() < 1e-9),
                other => panic!("expected a float operand, got {other:?}"),
            }
        }
        other => panic!("expected an addition at the root, got {other:?}"),
    }
}

#[test]
fn test_parse_left_recursion_is_unambiguous() {
    let engine = calculator();
    let outcome = engine.parse_outcome("1 + 2 + 3 + 4", None).unwrap();
    assert!(outcome.success());

    let tree = sedge::Navigator::new(engine.grammar(), &outcome)
        .single_tree()
        .unwrap();
    assert!(!tree.root().was_ambiguous());
    assert!(tree.markers().is_empty());
}

#[test]
fn test_parse_single_operand() {
    let engine = calculator();
    let report = engine.parse("42", None).unwrap();
    assert!(report.success);
    assert!(report.markers.is_empty());
    assert_eq!(report.styles, vec![style(0, 2, "string")]);
}

#[test]
fn test_node_offsets_cover_tokens() {
    let engine = calculator();
    let outcome = engine.parse_outcome("1 + pi", None).unwrap();
    let tree = sedge::Navigator::new(engine.grammar(), &outcome)
        .single_tree()
        .unwrap();

    let root = tree.root();
    assert_eq!(root.offset(), TextSize::from(0));
    assert_eq!(root.length(), TextSize::from(6));

    let children: Vec<_> = root.children().collect();
    assert_eq!(children.len(), 3);
    assert_eq!(children[0].range(), TextRange::at(TextSize::from(0), TextSize::from(1)));
    assert_eq!(children[1].range(), TextRange::at(TextSize::from(2), TextSize::from(1)));
    assert_eq!(children[2].range(), TextRange::at(TextSize::from(4), TextSize::from(2)));
    assert!(children[1].is_token());
    assert_eq!(children[2].parent().unwrap().id(), root.id());
}

#[test]
fn test_find_node_at_index() {
    let engine = calculator();
    let outcome = engine.parse_outcome("1 + pi", None).unwrap();
    let tree = sedge::Navigator::new(engine.grammar(), &outcome)
        .single_tree()
        .unwrap();

    let node = tree.find_node_at_index(0).unwrap();
    assert_eq!(node.offset(), TextSize::from(0));
    assert!(tree.find_node_at_index(99).is_none());
}

#[test]
fn test_predict_after_operator() {
    let engine = calculator();
    let prediction = engine.predict("1 + ", 3, None).unwrap();

    let texts: Vec<&str> = prediction.proposals.iter().map(|p| p.text.as_str()).collect();
    assert!(texts.contains(&"0"), "got {texts:?}");
    assert!(texts.contains(&"pi"), "got {texts:?}");
    // Offset 3 lies on whitespace: nothing to replace.
    assert!(prediction.proposals.iter().all(|p| p.replace.is_none()));
}

#[test]
fn test_predict_at_start() {
    let engine = calculator();
    let prediction = engine.predict("", 0, None).unwrap();

    let texts: Vec<&str> = prediction.proposals.iter().map(|p| p.text.as_str()).collect();
    assert!(texts.contains(&"0"));
    assert!(texts.contains(&"pi"));
}

#[test]
fn test_predict_rejects_out_of_range_offset() {
    let engine = calculator();
    let err = engine.predict("1", 5, None).unwrap_err();
    assert!(matches!(err, sedge::EngineError::InvalidOffset { offset: 5, .. }));
}

#[test]
fn test_unknown_axiom_fails() {
    let engine = calculator();
    let err = engine.parse("1", Some("nope")).unwrap_err();
    assert!(matches!(err, sedge::EngineError::MissingAxiom(name) if name == "nope"));
}

#[test]
fn test_axiom_prefix_lookup() {
    let engine = calculator();
    // "ro" matches the axiom named "root".
    let report = engine.parse("1 + 2", Some("ro")).unwrap();
    assert!(report.success);
}

#[test]
fn test_reparse_is_structurally_equal() {
    let engine = calculator();
    let first = engine.parse("1 + pi + 2", None).unwrap();
    let second = engine.parse("1 + pi + 2", None).unwrap();

    assert_eq!(first.success, second.success);
    assert_eq!(first.markers, second.markers);
    assert_eq!(first.styles, second.styles);

    let o1 = engine.parse_outcome("1 + pi + 2", None).unwrap();
    let o2 = engine.parse_outcome("1 + pi + 2", None).unwrap();
    assert_eq!(o1.chart_count(), o2.chart_count());
    assert_eq!(o1.state_count(), o2.state_count());
}

#[test]
fn test_chart_count_is_token_count_plus_one() {
    let engine = calculator();
    // 5 tokens: 1 + 2 + pi
    let outcome = engine.parse_outcome("1 + 2 + pi", None).unwrap();
    assert_eq!(outcome.chart_count(), 6);
}

#[test]
fn test_grammatical_input_has_no_error_markers() {
    let engine = calculator();
    for text in ["1", "pi", "1 + 1", "pi + pi + pi", "10 + 20 + 30"] {
        let report = engine.parse(text, None).unwrap();
        assert!(report.success, "{text} should parse");
        assert!(
            !report.markers.iter().any(|m| m.is_error()),
            "{text} should have no error markers, got {:?}",
            report.markers
        );
        assert!(!report
            .markers
            .iter()
            .any(|m| matches!(m.kind, MarkerKind::Ambiguous { .. })));
    }
}
