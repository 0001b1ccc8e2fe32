//! Quantified invariants I1–I5 from `spec.md` §8.

use algolang::analyzer::Analyzer;
use algolang::ast::{CustomType, Expr, ExprKind, Program, Stmt};
use algolang::config::CompilerConfig;
use algolang::lexer::Lexer;
use algolang::parser::Parser;

fn parse_and_analyze(src: &str) -> (Program, usize) {
    let tokens = Lexer::new(src).tokenize().expect("no illegal characters");
    let out = Parser::new(tokens).parse();
    assert!(out.diagnostics.is_empty(), "parse errors: {:?}", out.diagnostics);
    let mut program = out.program.expect("program must parse");
    let (_vars, diags) = Analyzer::analyze(&mut program);
    (program, diags.len())
}

fn all_exprs_typed(stmts: &[Stmt]) -> bool {
    fn expr_ok(e: &Expr) -> bool {
        if e.expr_type.is_none() {
            return false;
        }
        match &e.kind {
            ExprKind::Paren(inner) | ExprKind::Unary { expr: inner, .. } => expr_ok(inner),
            ExprKind::Binary { lhs, rhs, .. } => expr_ok(lhs) && expr_ok(rhs),
            ExprKind::Index { base, indices } => {
                expr_ok(base) && indices.iter().all(expr_ok)
            }
            ExprKind::Attribute { base, .. } => expr_ok(base),
            ExprKind::Call { args, .. } => args.iter().all(expr_ok),
            _ => true,
        }
    }
    fn stmt_ok(s: &Stmt) -> bool {
        match s {
            Stmt::Assign { lhs, rhs, .. } => expr_ok(lhs) && expr_ok(rhs),
            Stmt::Call { inputs, outputs, .. } => {
                inputs.iter().all(expr_ok) && outputs.iter().all(expr_ok)
            }
            Stmt::Pour { start, end, body, .. } => {
                expr_ok(start) && expr_ok(end) && body.iter().all(stmt_ok)
            }
            Stmt::TantQue { cond, body, .. } => expr_ok(cond) && body.iter().all(stmt_ok),
            Stmt::Si {
                branches,
                else_branch,
                ..
            } => {
                branches
                    .iter()
                    .all(|(c, b)| expr_ok(c) && b.iter().all(stmt_ok))
                    && else_branch
                        .as_ref()
                        .map(|b| b.iter().all(stmt_ok))
                        .unwrap_or(true)
            }
        }
    }
    stmts.iter().all(stmt_ok)
}

#[test]
fn i1_every_expression_is_typed_after_a_clean_analysis() {
    let (program, diag_count) = parse_and_analyze(concat!(
        "Algorithme A\n",
        "Variables:\n",
        "  x: entier\n",
        "  y: réel\n",
        "Instructions:\n",
        "  x <-- 1 + 2 * 3\n",
        "  y <-- x + 1.5\n",
        "  Pour i allant de 1 a 10 Faire\n",
        "    x <-- x + i\n",
        "  FinPour\n",
        "FinAlgo\n",
    ));
    assert_eq!(diag_count, 0);
    assert!(all_exprs_typed(&program.main.statements));
}

#[test]
fn i2_residual_block_stack_iff_missing_footer_diagnostic() {
    let tokens = Lexer::new("Algorithme A\nInstructions:\n  Si VRAI\n    x <-- 1\nFinAlgo\n")
        .tokenize()
        .unwrap();
    let out = Parser::new(tokens).parse();
    // The unclosed Si means FinAlgo was consumed as Si's own (missing)
    // footer; exactly one "expected Fin..." diagnostic is synthesized.
    assert_eq!(out.diagnostics.len(), 1);

    let tokens_clean = Lexer::new("Algorithme A\nInstructions:\nFinAlgo\n")
        .tokenize()
        .unwrap();
    let out_clean = Parser::new(tokens_clean).parse();
    assert!(out_clean.diagnostics.is_empty());
}

#[test]
fn i3_identifier_belongs_to_exactly_one_scope_map() {
    let (program, _) = parse_and_analyze(concat!(
        "Algorithme A\n",
        "Instructions:\n",
        "FinAlgo\n",
        "SA F(PE a: entier, PS b: entier)\n",
        "Variables:\n",
        "  c: entier\n",
        "Instructions:\n",
        "  b <-- a + c\n",
        "  c <-- 0\n",
        "FinSa\n",
    ));
    let (_vars, diags) = {
        let mut p = program.clone();
        Analyzer::analyze(&mut p)
    };
    assert!(diags.is_empty(), "{:?}", diags);
}

#[test]
fn i4_recursive_custom_type_without_pointer_is_rejected() {
    let tokens = Lexer::new(concat!(
        "Algorithme A\n",
        "Types:\n",
        "  Article Noeud\n",
        "    suivant: Noeud\n",
        "Variables:\n",
        "Instructions:\n",
        "FinAlgo\n",
    ))
    .tokenize()
    .unwrap();
    let out = Parser::new(tokens).parse();
    let mut program = out.program.unwrap();
    let (_vars, diags) = Analyzer::analyze(&mut program);
    assert!(diags.len() >= 1);
    let ct: &CustomType = &program.main.type_defs[0];
    assert_eq!(ct.name, "Noeud");
}

#[test]
fn i5_emitter_produces_one_definition_per_sub_and_type_in_source_order() {
    let out = algolang::compile(
        concat!(
            "Algorithme A\n",
            "Types:\n",
            "  Article P\n",
            "    x: entier\n",
            "  Article Q\n",
            "    y: entier\n",
            "Variables:\n",
            "Instructions:\n",
            "FinAlgo\n",
            "SA F(PE a: entier, PS b: entier)\n",
            "Instructions:\n",
            "  b <-- a\n",
            "FinSa\n",
            "SA G(PE a: entier, PS b: entier)\n",
            "Instructions:\n",
            "  b <-- a\n",
            "FinSa\n",
        ),
        &CompilerConfig::default(),
    );
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    let emitted = out.emitted.unwrap();
    let p_pos = emitted.find("} P;").unwrap();
    let q_pos = emitted.find("} Q;").unwrap();
    let f_pos = emitted.find("F(").unwrap();
    let g_pos = emitted.find("G(").unwrap();
    assert!(p_pos < q_pos);
    assert!(q_pos < f_pos);
    assert!(f_pos < g_pos);
    assert_eq!(emitted.matches("} P;").count(), 1);
    assert_eq!(emitted.matches("} Q;").count(), 1);
}
