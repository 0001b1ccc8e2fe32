//! Tree-walking emitter: consumes the analyzed AST plus the
//! `ProgramVariables` table and renders the C-like target surface
//! language described in `spec.md` §6. No diagnostics originate here —
//! the driver only calls this once the sink is empty.

use std::collections::HashMap;

use crate::analyzer::ProgramVariables;
use crate::ast::*;
use crate::config::CompilerConfig;

/// `_<var>_<i>`, 1-indexed per dimension: the run-time length parameter
/// synthesized for an unsized `Table` dimension (`spec.md` §6, §9).
fn length_param_name(var: &str, dim: usize) -> String {
    format!("_{var}_{dim}")
}

fn escape_char(c: char) -> String {
    match c {
        '\n' => "\\n".to_string(),
        '\0' => "\\0".to_string(),
        '\'' => "\\'".to_string(),
        '\\' => "\\\\".to_string(),
        other => other.to_string(),
    }
}

pub fn emit(program: &Program, vars: &ProgramVariables, config: &CompilerConfig) -> String {
    let mut emitter = Emitter::new(program, vars, config);
    let mut body = String::new();

    for ct in &program.main.type_defs {
        body.push_str(&emitter.emit_type(ct));
        body.push('\n');
    }

    for sub in &program.subs {
        body.push_str(&emitter.emit_sub(sub));
        body.push('\n');
    }

    body.push_str(&emitter.emit_main(&program.main));

    let mut out = String::new();
    out.push_str("#include <stdio.h>\n");
    if emitter.needs_bool_header {
        out.push_str("#include <stdbool.h>\n");
    }
    out.push('\n');
    out.push_str(&body);
    out
}

struct Emitter<'a> {
    config: &'a CompilerConfig,
    vars: &'a ProgramVariables,
    subs_by_name: HashMap<&'a str, &'a SubAlgorithm>,
    needs_bool_header: bool,
}

impl<'a> Emitter<'a> {
    fn new(program: &'a Program, vars: &'a ProgramVariables, config: &'a CompilerConfig) -> Self {
        Emitter {
            config,
            vars,
            subs_by_name: program.subs.iter().map(|s| (s.name.as_str(), s)).collect(),
            needs_bool_header: false,
        }
    }

    fn emit_type(&mut self, ct: &CustomType) -> String {
        let mut out = "typedef struct {\n".to_string();
        for attr in &ct.attributes {
            out.push_str("    ");
            out.push_str(&self.declare(&attr.name, &attr.ty));
            out.push_str(";\n");
        }
        out.push_str(&format!("}} {};\n", ct.name));
        out
    }

    /// One non-`Table` output and nothing else returns by value; every
    /// other shape (zero outputs, multiple outputs, or a `Table` output)
    /// returns `void` and binds outputs through pointer parameters.
    fn emit_sub(&mut self, sub: &SubAlgorithm) -> String {
        let single_output = sub.outputs.len() == 1 && !sub.outputs[0].ty.is_table();
        let return_type = if single_output {
            self.type_name(&sub.outputs[0].ty)
        } else {
            "void".to_string()
        };

        let mut params = Vec::new();
        for input in &sub.inputs {
            self.push_param(&mut params, input, false);
        }
        if !single_output {
            for output in &sub.outputs {
                self.push_param(&mut params, output, true);
            }
        }

        let locals = &self.vars.subs[&sub.name].locals;
        let mut out = format!("{} {}({}) {{\n", return_type, sub.name, params.join(", "));
        out.push_str(&self.emit_body(locals, &sub.statements, 1));
        out.push_str("}\n");
        out
    }

    fn emit_main(&mut self, main: &MainAlgorithm) -> String {
        let locals = &self.vars.main.locals;
        let mut out = "int main(void) {\n".to_string();
        out.push_str(&self.emit_body(locals, &main.statements, 1));
        out.push_str("    return 0;\n}\n");
        out
    }

    fn push_param(&mut self, params: &mut Vec<String>, decl: &VarDecl, by_ref: bool) {
        match &decl.ty {
            Type::Table(ranges, inner) => {
                let elem = self.type_name(inner);
                params.push(format!("{}* {}", elem, decl.name));
                for (i, range) in ranges.iter().enumerate() {
                    if range.end.is_none() {
                        params.push(format!("int {}", length_param_name(&decl.name, i + 1)));
                    }
                }
            }
            ty if by_ref => {
                let tn = self.type_name(ty);
                params.push(format!("{}* {}", tn, decl.name));
            }
            ty => {
                let tn = self.type_name(ty);
                params.push(format!("{} {}", tn, decl.name));
            }
        }
    }

    fn emit_body(&mut self, locals: &[(String, Type)], stmts: &[Stmt], indent: usize) -> String {
        let pad = "    ".repeat(indent);
        let mut out = String::new();
        for (name, ty) in locals {
            out.push_str(&pad);
            out.push_str(&self.declare(name, ty));
            out.push_str(";\n");
        }
        if !locals.is_empty() && !stmts.is_empty() {
            out.push('\n');
        }
        for stmt in stmts {
            out.push_str(&self.emit_stmt(stmt, indent));
        }
        out
    }

    fn emit_stmts(&mut self, stmts: &[Stmt], indent: usize) -> String {
        stmts.iter().map(|s| self.emit_stmt(s, indent)).collect()
    }

    fn emit_stmt(&mut self, stmt: &Stmt, indent: usize) -> String {
        let pad = "    ".repeat(indent);
        match stmt {
            Stmt::Assign { lhs, rhs, .. } => {
                format!("{}{} = {};\n", pad, self.emit_expr(lhs), self.emit_expr(rhs))
            }
            Stmt::Call { name, inputs, outputs, .. } => {
                format!("{}{};\n", pad, self.emit_call(name, inputs, outputs))
            }
            Stmt::Pour { var, start, end, step, body, .. } => {
                let cmp = if *step >= 0 { "<=" } else { ">=" };
                let delta = step.unsigned_abs();
                let update = if *step >= 0 {
                    format!("{var} += {delta}")
                } else {
                    format!("{var} -= {delta}")
                };
                let start_s = self.emit_expr(start);
                let end_s = self.emit_expr(end);
                let mut out = format!(
                    "{pad}for ({var} = {start_s}; {var} {cmp} {end_s}; {update}) {{\n"
                );
                out.push_str(&self.emit_stmts(body, indent + 1));
                out.push_str(&pad);
                out.push_str("}\n");
                out
            }
            Stmt::TantQue { cond, body, .. } => {
                let cond_s = self.emit_expr(cond);
                let mut out = format!("{pad}while ({cond_s}) {{\n");
                out.push_str(&self.emit_stmts(body, indent + 1));
                out.push_str(&pad);
                out.push_str("}\n");
                out
            }
            Stmt::Si { branches, else_branch, .. } => {
                let mut out = String::new();
                for (i, (cond, body)) in branches.iter().enumerate() {
                    let kw = if i == 0 { "if" } else { "else if" };
                    let cond_s = self.emit_expr(cond);
                    out.push_str(&pad);
                    out.push_str(&format!("{kw} ({cond_s}) {{\n"));
                    out.push_str(&self.emit_stmts(body, indent + 1));
                    out.push_str(&pad);
                    out.push_str("}\n");
                }
                if let Some(body) = else_branch {
                    out.push_str(&pad);
                    out.push_str("else {\n");
                    out.push_str(&self.emit_stmts(body, indent + 1));
                    out.push_str(&pad);
                    out.push_str("}\n");
                }
                out
            }
        }
    }

    /// A call whose callee has a single non-`Table` output becomes a
    /// value-returning call assigned to that output; otherwise every
    /// output is passed by address (by identity, for `Table`s).
    fn emit_call(&mut self, name: &str, inputs: &[Expr], outputs: &[Expr]) -> String {
        let sub = self.subs_by_name.get(name).copied();
        let mut args: Vec<String> = Vec::new();

        if let Some(sub) = sub {
            for (arg, decl) in inputs.iter().zip(&sub.inputs) {
                args.push(self.emit_expr(arg));
                self.push_length_args(&mut args, arg, decl);
            }
        } else {
            for arg in inputs {
                args.push(self.emit_expr(arg));
            }
        }

        let single_output = sub
            .map(|s| s.outputs.len() == 1 && !s.outputs[0].ty.is_table())
            .unwrap_or(false);

        if single_output {
            let ret = self.emit_expr(&outputs[0]);
            return format!("{} = {}({})", ret, name, args.join(", "));
        }

        if let Some(sub) = sub {
            for (arg, decl) in outputs.iter().zip(&sub.outputs) {
                if decl.ty.is_table() {
                    args.push(self.emit_expr(arg));
                } else {
                    args.push(format!("&{}", self.emit_expr(arg)));
                }
                self.push_length_args(&mut args, arg, decl);
            }
        } else {
            for arg in outputs {
                args.push(format!("&{}", self.emit_expr(arg)));
            }
        }

        format!("{}({})", name, args.join(", "))
    }

    fn push_length_args(&mut self, args: &mut Vec<String>, arg: &Expr, decl: &VarDecl) {
        let Type::Table(ranges, _) = &decl.ty else {
            return;
        };
        for (i, range) in ranges.iter().enumerate() {
            if range.end.is_none() {
                args.push(self.length_arg_expr(arg, i));
            }
        }
    }

    /// The callee's dimension is unsized, so its concrete length is
    /// whatever the caller's own argument has for that dimension — read
    /// off the argument's analyzed type, or forwarded through the
    /// caller's own length parameter if the argument is itself still
    /// unsized (a sub-algorithm passing its own table parameter along).
    fn length_arg_expr(&self, arg: &Expr, dim: usize) -> String {
        if let Some(Type::Table(ranges, _)) = &arg.expr_type {
            if let Some(range) = ranges.get(dim) {
                if let Some(end) = range.end {
                    return (end - range.start + 1).to_string();
                }
                if let ExprKind::Id(name) = &arg.kind {
                    return length_param_name(name, dim + 1);
                }
            }
        }
        "0".to_string()
    }

    fn emit_expr(&mut self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::LitInt(v) => v.to_string(),
            ExprKind::LitFloat(v) => format!("{v:?}"),
            ExprKind::LitChar(c) => format!("'{}'", escape_char(*c)),
            ExprKind::LitBool(b) => {
                self.needs_bool_header = true;
                if *b { "true".to_string() } else { "false".to_string() }
            }
            ExprKind::Id(name) => name.clone(),
            ExprKind::Paren(inner) => format!("({})", self.emit_expr(inner)),
            ExprKind::Unary { op, expr: inner } => self.emit_unary(*op, inner),
            ExprKind::Binary { op, lhs, rhs } => self.emit_binary(*op, lhs, rhs),
            ExprKind::Index { base, indices } => self.emit_index(base, indices),
            ExprKind::Attribute { base, field } => format!("{}.{}", self.emit_expr(base), field),
            ExprKind::Call { name, args } => {
                let rendered: Vec<String> = args.iter().map(|a| self.emit_expr(a)).collect();
                format!("{}({})", name, rendered.join(", "))
            }
        }
    }

    fn emit_unary(&mut self, op: UnOp, inner: &Expr) -> String {
        let e = self.emit_expr(inner);
        match op {
            UnOp::Plus => format!("+{e}"),
            UnOp::Minus => format!("-{e}"),
            UnOp::PtrOf => format!("&{e}"),
            UnOp::Deref => format!("*{e}"),
            UnOp::Not => format!("!{e}"),
        }
    }

    fn emit_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> String {
        let l = self.emit_expr(lhs);
        let r = self.emit_expr(rhs);
        let op_str = match op {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        };
        format!("({l} {op_str} {r})")
    }

    /// Flattens `e[i1, …, ik]` left-to-right: each index is offset by
    /// its range's `start`, then folded with the running total scaled by
    /// the next dimension's size (`spec.md` §6). An unsized dimension's
    /// size comes from its synthesized length parameter.
    fn emit_index(&mut self, base: &Expr, indices: &[Expr]) -> String {
        let base_name = self.emit_expr(base);
        let ranges = match &base.expr_type {
            Some(Type::Table(ranges, _)) => ranges.clone(),
            _ => {
                let idx = indices
                    .iter()
                    .map(|i| self.emit_expr(i))
                    .collect::<Vec<_>>()
                    .join(", ");
                return format!("{base_name}[{idx}]");
            }
        };
        let base_id = match &base.kind {
            ExprKind::Id(name) => Some(name.clone()),
            _ => None,
        };

        let mut flat: Option<String> = None;
        for (dim, (range, idx)) in ranges.iter().zip(indices).enumerate() {
            let idx_s = self.emit_expr(idx);
            let term = if range.start == 0 {
                idx_s
            } else {
                format!("({idx_s} - {})", range.start)
            };
            flat = Some(match flat {
                None => term,
                Some(prev) => {
                    let size = match range.end {
                        Some(end) => (end - range.start + 1).to_string(),
                        None => base_id
                            .as_deref()
                            .map(|n| length_param_name(n, dim + 1))
                            .unwrap_or_else(|| "1".to_string()),
                    };
                    format!("(({prev}) * {size} + {term})")
                }
            });
        }

        format!("{}[{}]", base_name, flat.unwrap_or_default())
    }

    fn type_name(&mut self, ty: &Type) -> String {
        match ty {
            Type::Base(name) => match name.as_str() {
                ENTIER => self.config.base_type_names.entier.clone(),
                REEL => self.config.base_type_names.reel.clone(),
                BOOLEEN => {
                    self.needs_bool_header = true;
                    self.config.base_type_names.booleen.clone()
                }
                CARACTERE => self.config.base_type_names.caractere.clone(),
                other => other.to_string(),
            },
            Type::Ptr(inner) => format!("{}*", self.type_name(inner)),
            Type::Table(_, inner) => format!("{}*", self.type_name(inner)),
        }
    }

    fn declare(&mut self, name: &str, ty: &Type) -> String {
        match ty {
            Type::Table(ranges, inner) => {
                let base = self.type_name(inner);
                let dims: String = ranges
                    .iter()
                    .map(|r| match r.end {
                        Some(end) => format!("[{}]", end - r.start + 1),
                        None => "[]".to_string(),
                    })
                    .collect();
                format!("{base} {name}{dims}")
            }
            _ => format!("{} {}", self.type_name(ty), name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Analyzer;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn compile(src: &str) -> String {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut out = Parser::new(tokens).parse();
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let mut program = out.program.take().unwrap();
        let (vars, diags) = Analyzer::analyze(&mut program);
        assert!(diags.is_empty(), "{:?}", diags);
        emit(&program, &vars, &CompilerConfig::default())
    }

    #[test]
    fn minimal_algorithm_emits_main_with_declaration_and_assignment() {
        let out = compile(
            "Algorithme A\nVariables:\n  x: entier\nInstructions:\n  x <-- 1\nFinAlgo\n",
        );
        assert!(out.contains("int main(void)"));
        assert!(out.contains("int x;"));
        assert!(out.contains("x = 1;"));
    }

    #[test]
    fn implicit_promotion_keeps_entier_literals_in_reel_assignment() {
        let out = compile(
            "Algorithme A\nVariables:\n  x: réel\nInstructions:\n  x <-- 2 + 3\nFinAlgo\n",
        );
        assert!(out.contains("float x;"));
        assert!(out.contains("x = (2 + 3);"));
    }

    #[test]
    fn sub_algorithm_with_single_output_returns_by_value() {
        let out = compile(concat!(
            "Algorithme A\n",
            "Variables:\n",
            "  r: entier\n",
            "Instructions:\n",
            "  Carre(5 ! r)\n",
            "FinAlgo\n",
            "SA Carre(PE x: entier, PS y: entier)\n",
            "Instructions:\n",
            "  y <-- x * x\n",
            "FinSa\n",
        ));
        assert!(out.contains("int Carre(int x)"));
        assert!(out.contains("r = Carre(5);"));
    }

    #[test]
    fn multi_output_sub_algorithm_binds_by_pointer() {
        let out = compile(concat!(
            "Algorithme A\n",
            "Variables:\n",
            "  q: entier\n",
            "  r: entier\n",
            "Instructions:\n",
            "  DivMod(7, 2 ! q, r)\n",
            "FinAlgo\n",
            "SA DivMod(PE a: entier, PE b: entier, PS q: entier, PS r: entier)\n",
            "Instructions:\n",
            "  q <-- a / b\n",
            "  r <-- a % b\n",
            "FinSa\n",
        ));
        assert!(out.contains("void DivMod(int a, int b, int* q, int* r)"));
        assert!(out.contains("DivMod(7, 2, &q, &r);"));
    }

    #[test]
    fn table_index_is_flattened_and_offset_by_range_start() {
        let out = compile(concat!(
            "Algorithme A\n",
            "Variables:\n",
            "  t: tableau[1..5] de entier\n",
            "  x: entier\n",
            "Instructions:\n",
            "  x <-- t[2]\n",
            "FinAlgo\n",
        ));
        assert!(out.contains("x = t[(2 - 1)];"));
    }

    #[test]
    fn boolean_usage_pulls_in_stdbool_header() {
        let out = compile(
            "Algorithme A\nVariables:\n  b: booléen\nInstructions:\n  b <-- VRAI\nFinAlgo\n",
        );
        assert!(out.contains("#include <stdbool.h>"));
        assert!(out.contains("bool b;"));
        assert!(out.contains("b = true;"));
    }
}
