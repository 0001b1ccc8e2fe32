//! Single top-down semantic pass: resolves identifiers, checks types,
//! annotates every expression with its inferred type, and produces the
//! `ProgramVariables` table. See `spec.md` §4.4 for the ordered phases
//! this file implements verbatim: type definitions, sub-algorithm
//! registration, then one walk per algorithm.

use std::collections::HashMap;

use crate::ast::*;
use crate::diagnostics::{Diagnostic, DiagnosticSink, ErrorKind};

/// Identifiers the target C-like surface language reserves; colliding
/// with one of these is `ReservedNameCollision` regardless of which
/// kind of Algolang name it is (`spec.md` §3 invariants, §7).
const TARGET_RESERVED: &[&str] = &[
    "int", "float", "char", "bool", "void", "return", "if", "else", "while", "for", "do",
    "switch", "case", "default", "break", "continue", "struct", "union", "enum", "typedef",
    "const", "static", "extern", "sizeof", "goto", "main", "include", "define", "true", "false",
    "NULL",
];

fn is_reserved(name: &str) -> bool {
    TARGET_RESERVED.contains(&name)
}

/// Internal sentinel returned whenever a sub-expression could not be
/// resolved to a real type. Comparing two `error_type()`s is never a
/// secondary diagnostic: every check below skips its own diagnostic
/// when either operand already carries this marker, localizing failures
/// the way `spec.md` §7's propagation policy requires.
fn error_type() -> Type {
    Type::Base("<erreur>".to_string())
}

fn is_error_type(ty: &Type) -> bool {
    matches!(ty, Type::Base(n) if n == "<erreur>")
}

/// Per-algorithm maps of name → type for locals, inputs, and outputs
/// (`spec.md` §2 item 5). Kept as insertion-ordered vectors rather than
/// a `HashMap` so the emitter can reproduce source declaration order.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmVariables {
    pub locals: Vec<(String, Type)>,
    pub inputs: Vec<(String, Type)>,
    pub outputs: Vec<(String, Type)>,
}

impl AlgorithmVariables {
    /// Lookup order mirrors `spec.md` §4.4(a): a single namespace formed
    /// by the union of all three maps (collisions between them are
    /// already rejected at declaration time, so in a program with no
    /// diagnostics this search never has more than one candidate).
    pub fn lookup(&self, name: &str) -> Option<Type> {
        self.locals
            .iter()
            .chain(self.inputs.iter())
            .chain(self.outputs.iter())
            .find(|(n, _)| n == name)
            .map(|(_, ty)| ty.clone())
    }
}

/// The table the analyzer hands the emitter: the main algorithm's
/// variables plus every sub-algorithm's, indexed by name.
#[derive(Debug, Clone, Default)]
pub struct ProgramVariables {
    pub main: AlgorithmVariables,
    pub subs: HashMap<String, AlgorithmVariables>,
}

#[derive(Debug, Clone, Default)]
struct SubSignature {
    input_types: Vec<Type>,
    output_types: Vec<Type>,
}

pub struct Analyzer {
    sink: DiagnosticSink,
    types: HashMap<String, CustomType>,
    /// First-registered source position of each custom type name, used
    /// to render `TypeRedefinition` with both locations.
    type_first_seen: HashMap<String, usize>,
    subs: HashMap<String, SubSignature>,
    sub_first_seen: HashMap<String, usize>,
}

impl Analyzer {
    fn new() -> Self {
        Analyzer {
            sink: DiagnosticSink::new(),
            types: HashMap::new(),
            type_first_seen: HashMap::new(),
            subs: HashMap::new(),
            sub_first_seen: HashMap::new(),
        }
    }

    pub fn analyze(program: &mut Program) -> (ProgramVariables, DiagnosticSink) {
        let mut an = Analyzer::new();

        an.phase_type_definitions(&program.main.type_defs);
        an.phase_sub_registration(&program.subs);

        let main_vars = an.build_scope(&[], &[], &program.main.var_decls);
        for stmt in &mut program.main.statements {
            an.check_stmt(stmt, &main_vars);
        }

        let mut sub_vars = HashMap::new();
        for sub in &mut program.subs {
            let vars = an.build_scope(&sub.inputs, &sub.outputs, &sub.var_decls);
            for stmt in &mut sub.statements {
                an.check_stmt(stmt, &vars);
            }
            sub_vars.insert(sub.name.clone(), vars);
        }

        (
            ProgramVariables {
                main: main_vars,
                subs: sub_vars,
            },
            an.sink,
        )
    }

    // -- phase 1: type definitions --------------------------------------

    fn phase_type_definitions(&mut self, type_defs: &[CustomType]) {
        for ct in type_defs {
            if is_reserved(&ct.name) {
                self.sink.push(Diagnostic::semantic(
                    ErrorKind::ReservedNameCollision {
                        name: ct.name.clone(),
                    },
                    ct.lexpos,
                ));
            } else if let Some(&first) = self.type_first_seen.get(&ct.name) {
                self.sink.push(Diagnostic::semantic_multi(
                    ErrorKind::TypeRedefinition {
                        name: ct.name.clone(),
                    },
                    vec![first, ct.lexpos],
                ));
            } else {
                self.type_first_seen.insert(ct.name.clone(), ct.lexpos);
            }

            self.types.entry(ct.name.clone()).or_insert_with(|| ct.clone());
        }

        for ct in type_defs {
            let mut attr_seen: HashMap<String, ()> = HashMap::new();
            for attr in &ct.attributes {
                if is_reserved(&attr.name) {
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::ReservedNameCollision {
                            name: attr.name.clone(),
                        },
                        attr.lexpos,
                    ));
                } else if attr_seen.contains_key(&attr.name) {
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::AttributeRedeclaration {
                            name: attr.name.clone(),
                        },
                        attr.lexpos,
                    ));
                } else {
                    attr_seen.insert(attr.name.clone(), ());
                }
                self.validate_type(&attr.ty, false, attr.lexpos);
            }
        }

        for ct in type_defs {
            let recurses = ct
                .attributes
                .iter()
                .any(|attr| self.type_contains_name(&ct.name, &attr.ty, &mut HashMap::new()));
            if recurses {
                self.sink.push(Diagnostic::semantic(
                    ErrorKind::TypeDefinitionRecursion {
                        name: ct.name.clone(),
                    },
                    ct.lexpos,
                ));
            }
        }
    }

    /// Descends through `Table` inner types (pointers break the chain),
    /// following named base types into their own custom definitions;
    /// true if `name` is re-encountered (`spec.md` §4.4.1(d)).
    fn type_contains_name(&self, name: &str, ty: &Type, visiting: &mut HashMap<String, ()>) -> bool {
        match ty {
            Type::Ptr(_) => false,
            Type::Table(_, inner) => self.type_contains_name(name, inner, visiting),
            Type::Base(n) => {
                if n == name {
                    return true;
                }
                let Some(ct) = self.types.get(n) else {
                    return false;
                };
                if visiting.contains_key(n) {
                    return false;
                }
                visiting.insert(n.clone(), ());
                let found = ct
                    .attributes
                    .iter()
                    .any(|attr| self.type_contains_name(name, &attr.ty, visiting));
                visiting.remove(n);
                found
            }
        }
    }

    /// `all base names exist; table ranges have both endpoints with
    /// `end > start`; unsized dimensions are forbidden` outside
    /// parameter declarations (`spec.md` §4.4.1(c), §4.4.3(b)).
    fn validate_type(&mut self, ty: &Type, allow_unsized: bool, lexpos: usize) {
        match ty {
            Type::Base(name) => {
                if !matches!(name.as_str(), ENTIER | REEL | BOOLEEN | CARACTERE)
                    && !self.types.contains_key(name)
                {
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::UnknownBaseType { name: name.clone() },
                        lexpos,
                    ));
                }
            }
            Type::Ptr(inner) => self.validate_type(inner, allow_unsized, lexpos),
            Type::Table(ranges, inner) => {
                for range in ranges {
                    match range.end {
                        None if !allow_unsized => {
                            self.sink.push(Diagnostic::semantic(
                                ErrorKind::TableEndNotDefinedForVariable,
                                lexpos,
                            ));
                        }
                        Some(end) if end <= range.start => {
                            self.sink.push(Diagnostic::semantic(
                                ErrorKind::TableRangeInvalidEnd,
                                lexpos,
                            ));
                        }
                        _ => {}
                    }
                }
                self.validate_type(inner, allow_unsized, lexpos);
            }
        }
    }

    // -- phase 2: sub-algorithm registration -----------------------------

    fn phase_sub_registration(&mut self, subs: &[SubAlgorithm]) {
        for sub in subs {
            if is_reserved(&sub.name) {
                self.sink.push(Diagnostic::semantic(
                    ErrorKind::ReservedNameCollision {
                        name: sub.name.clone(),
                    },
                    sub.name_lexpos,
                ));
            } else if self.types.contains_key(&sub.name) {
                self.sink.push(Diagnostic::semantic(
                    ErrorKind::IdentifierCollision {
                        name: sub.name.clone(),
                    },
                    sub.name_lexpos,
                ));
            } else if let Some(&first) = self.sub_first_seen.get(&sub.name) {
                self.sink.push(Diagnostic::semantic_multi(
                    ErrorKind::SubAlgoRedefinition {
                        name: sub.name.clone(),
                    },
                    vec![first, sub.name_lexpos],
                ));
            } else {
                self.sub_first_seen.insert(sub.name.clone(), sub.name_lexpos);
            }

            self.subs.entry(sub.name.clone()).or_insert_with(|| SubSignature {
                input_types: sub.inputs.iter().map(|d| d.ty.clone()).collect(),
                output_types: sub.outputs.iter().map(|d| d.ty.clone()).collect(),
            });
        }
    }

    // -- phase 3: per-algorithm scope + statement walk -------------------

    fn build_scope(
        &mut self,
        inputs: &[VarDecl],
        outputs: &[VarDecl],
        locals: &[VarDecl],
    ) -> AlgorithmVariables {
        let mut seen: HashMap<String, ()> = HashMap::new();

        for decl in inputs {
            self.check_name_clash(&decl.name, decl.lexpos, &mut seen);
            self.validate_type(&decl.ty, true, decl.lexpos);
        }
        for decl in outputs {
            self.check_name_clash(&decl.name, decl.lexpos, &mut seen);
            self.validate_type(&decl.ty, true, decl.lexpos);
        }
        for decl in locals {
            self.check_name_clash(&decl.name, decl.lexpos, &mut seen);
            self.validate_type(&decl.ty, false, decl.lexpos);
        }

        AlgorithmVariables {
            locals: locals.iter().map(|d| (d.name.clone(), d.ty.clone())).collect(),
            inputs: inputs.iter().map(|d| (d.name.clone(), d.ty.clone())).collect(),
            outputs: outputs.iter().map(|d| (d.name.clone(), d.ty.clone())).collect(),
        }
    }

    /// One namespace per algorithm spanning locals ∪ inputs ∪ outputs
    /// (`spec.md` §4.4.3(a)): a name seen twice in `seen`, regardless of
    /// which of the three maps either occurrence came from, is a
    /// `VariableRedeclaration`.
    fn check_name_clash(&mut self, name: &str, lexpos: usize, seen: &mut HashMap<String, ()>) {
        if is_reserved(name) {
            self.sink.push(Diagnostic::semantic(
                ErrorKind::ReservedNameCollision {
                    name: name.to_string(),
                },
                lexpos,
            ));
        } else if self.types.contains_key(name) || self.subs.contains_key(name) {
            self.sink.push(Diagnostic::semantic(
                ErrorKind::IdentifierCollision {
                    name: name.to_string(),
                },
                lexpos,
            ));
        } else if seen.contains_key(name) {
            self.sink.push(Diagnostic::semantic(
                ErrorKind::VariableRedeclaration {
                    name: name.to_string(),
                },
                lexpos,
            ));
        } else {
            seen.insert(name.to_string(), ());
        }
    }

    // -- statements -------------------------------------------------------

    fn check_stmt(&mut self, stmt: &mut Stmt, scope: &AlgorithmVariables) {
        match stmt {
            Stmt::Assign { lhs, rhs, .. } => self.check_assign(lhs, rhs, scope),
            Stmt::Call {
                name,
                inputs,
                outputs,
                lexpos,
                ..
            } => self.check_call_stmt(name, inputs, outputs, *lexpos, scope),
            Stmt::Pour {
                var,
                var_lexpos,
                start,
                end,
                body,
                ..
            } => {
                match scope.lookup(var) {
                    None => self.sink.push(Diagnostic::semantic(
                        ErrorKind::UndeclaredVariable { name: var.clone() },
                        *var_lexpos,
                    )),
                    Some(ty) if !ty.is_entier() => self.sink.push(Diagnostic::semantic(
                        ErrorKind::NonIntegerIterationVariable,
                        *var_lexpos,
                    )),
                    Some(_) => {}
                }
                let start_ty = self.type_expr(start, scope);
                if !start_ty.is_entier() && !is_error_type(&start_ty) {
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::NonIntegerStart,
                        start.lexpos,
                    ));
                }
                let end_ty = self.type_expr(end, scope);
                if !end_ty.is_entier() && !is_error_type(&end_ty) {
                    self.sink
                        .push(Diagnostic::semantic(ErrorKind::NonIntegerEnd, end.lexpos));
                }
                for s in body {
                    self.check_stmt(s, scope);
                }
            }
            Stmt::TantQue { cond, body, .. } => {
                let cond_ty = self.type_expr(cond, scope);
                if !cond_ty.is_booleen() && !is_error_type(&cond_ty) {
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::NonBooleanWhileCondition,
                        cond.lexpos,
                    ));
                }
                for s in body {
                    self.check_stmt(s, scope);
                }
            }
            Stmt::Si {
                branches,
                else_branch,
                ..
            } => {
                for (cond, body) in branches {
                    let cond_ty = self.type_expr(cond, scope);
                    if !cond_ty.is_booleen() && !is_error_type(&cond_ty) {
                        self.sink.push(Diagnostic::semantic(
                            ErrorKind::NonBooleanIfCondition,
                            cond.lexpos,
                        ));
                    }
                    for s in body {
                        self.check_stmt(s, scope);
                    }
                }
                if let Some(body) = else_branch {
                    for s in body {
                        self.check_stmt(s, scope);
                    }
                }
            }
        }
    }

    fn check_assign(&mut self, lhs: &mut Expr, rhs: &mut Expr, scope: &AlgorithmVariables) {
        let lhs_ty = self.type_expr(lhs, scope);
        let rhs_ty = self.type_expr(rhs, scope);

        if !lhs.is_assignable {
            self.sink.push(Diagnostic::semantic(
                ErrorKind::NonAssignableExpression,
                lhs.lexpos,
            ));
            return;
        }
        if lhs_ty.is_table() {
            self.sink
                .push(Diagnostic::semantic(ErrorKind::TableAssignment, lhs.lexpos));
            return;
        }
        if is_error_type(&lhs_ty) || is_error_type(&rhs_ty) {
            return;
        }
        if !rhs_ty.promotable_to(&lhs_ty) {
            self.sink.push(Diagnostic::semantic(
                ErrorKind::IncompatibleAssignmentTypes {
                    lhs: lhs_ty.to_string(),
                    rhs: rhs_ty.to_string(),
                },
                rhs.lexpos,
            ));
        }
    }

    fn check_call_stmt(
        &mut self,
        name: &str,
        inputs: &mut [Expr],
        outputs: &mut [Expr],
        lexpos: usize,
        scope: &AlgorithmVariables,
    ) {
        let Some(sig) = self.subs.get(name).cloned() else {
            self.sink.push(Diagnostic::semantic(
                ErrorKind::UndefinedFunction {
                    name: name.to_string(),
                },
                lexpos,
            ));
            for e in inputs.iter_mut() {
                self.type_expr(e, scope);
            }
            for e in outputs.iter_mut() {
                self.type_expr(e, scope);
            }
            return;
        };

        if inputs.len() != sig.input_types.len() {
            self.sink.push(Diagnostic::semantic(
                ErrorKind::UnmatchedNumberOfInputs {
                    expected: sig.input_types.len(),
                    got: inputs.len(),
                },
                lexpos,
            ));
        }
        for (i, arg) in inputs.iter_mut().enumerate() {
            let arg_ty = self.type_expr(arg, scope);
            if let Some(expected) = sig.input_types.get(i) {
                if !is_error_type(&arg_ty) && !arg_ty.promotable_to(expected) {
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::IncompatibleInputType {
                            expected: expected.to_string(),
                            got: arg_ty.to_string(),
                        },
                        arg.lexpos,
                    ));
                }
            }
        }

        if outputs.len() != sig.output_types.len() {
            self.sink.push(Diagnostic::semantic(
                ErrorKind::UnmatchedNumberOfOutputs {
                    expected: sig.output_types.len(),
                    got: outputs.len(),
                },
                lexpos,
            ));
        }
        for (i, arg) in outputs.iter_mut().enumerate() {
            let arg_ty = self.type_expr(arg, scope);
            if !arg.is_assignable {
                self.sink.push(Diagnostic::semantic(
                    ErrorKind::NonAssignableExpression,
                    arg.lexpos,
                ));
                continue;
            }
            if let Some(expected) = sig.output_types.get(i) {
                if !is_error_type(&arg_ty) && !crate::ast::structurally_equal(&arg_ty, expected) {
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::IncompatibleOutputType {
                            expected: expected.to_string(),
                            got: arg_ty.to_string(),
                        },
                        arg.lexpos,
                    ));
                }
            }
        }
    }

    // -- expressions ------------------------------------------------------

    /// Syntax-directed typing (`spec.md` §4.4's table). Always leaves
    /// `expr.expr_type` populated, even on failure, so invariant (I1)
    /// holds after any run that reaches this point and every enclosing
    /// expression can still be typed.
    fn type_expr(&mut self, expr: &mut Expr, scope: &AlgorithmVariables) -> Type {
        let ty = self.infer(&mut expr.kind, expr.lexpos, scope);
        expr.expr_type = Some(ty.clone());
        ty
    }

    fn infer(&mut self, kind: &mut ExprKind, lexpos: usize, scope: &AlgorithmVariables) -> Type {
        match kind {
            ExprKind::LitInt(_) => Type::base(ENTIER),
            ExprKind::LitFloat(_) => Type::base(REEL),
            ExprKind::LitChar(_) => Type::base(CARACTERE),
            ExprKind::LitBool(_) => Type::base(BOOLEEN),
            ExprKind::Id(name) => match scope.lookup(name) {
                Some(ty) => ty,
                None => {
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::UndeclaredVariable { name: name.clone() },
                        lexpos,
                    ));
                    error_type()
                }
            },
            ExprKind::Paren(inner) => self.type_expr(inner, scope),
            ExprKind::Unary { op, expr } => self.infer_unary(*op, expr, lexpos, scope),
            ExprKind::Binary { op, lhs, rhs } => self.infer_binary(*op, lhs, rhs, scope),
            ExprKind::Index { base, indices } => self.infer_index(base, indices, lexpos, scope),
            ExprKind::Attribute { base, field } => self.infer_attribute(base, field, scope),
            ExprKind::Call { name, args } => self.infer_call(name, args, lexpos, scope),
        }
    }

    fn infer_unary(&mut self, op: UnOp, expr: &mut Expr, lexpos: usize, scope: &AlgorithmVariables) -> Type {
        let inner = self.type_expr(expr, scope);
        match op {
            UnOp::PtrOf => Type::Ptr(Box::new(inner)),
            UnOp::Deref => match inner {
                Type::Ptr(inner) => *inner,
                _ if is_error_type(&inner) => error_type(),
                _ => {
                    self.sink
                        .push(Diagnostic::semantic(ErrorKind::NonPointerDereference, lexpos));
                    error_type()
                }
            },
            UnOp::Plus | UnOp::Minus => {
                if is_error_type(&inner) {
                    error_type()
                } else if inner.is_numeric() {
                    inner
                } else {
                    let op_str = if op == UnOp::Plus { "+" } else { "-" };
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::InvalidUnaryOperationExpressionType {
                            op: op_str.to_string(),
                        },
                        lexpos,
                    ));
                    error_type()
                }
            }
            UnOp::Not => {
                if !inner.is_booleen() && !is_error_type(&inner) {
                    self.sink
                        .push(Diagnostic::semantic(ErrorKind::NonBooleanUnaryNot, lexpos));
                }
                Type::base(BOOLEEN)
            }
        }
    }

    fn infer_binary(
        &mut self,
        op: BinOp,
        lhs: &mut Expr,
        rhs: &mut Expr,
        scope: &AlgorithmVariables,
    ) -> Type {
        let left = self.type_expr(lhs, scope);
        let right = self.type_expr(rhs, scope);
        let either_error = is_error_type(&left) || is_error_type(&right);

        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                if either_error {
                    return error_type();
                }
                if !left.is_numeric() || !right.is_numeric() {
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::InvalidBinaryOperationTermType {
                            op: binop_str(op).to_string(),
                        },
                        lhs.lexpos,
                    ));
                    return error_type();
                }
                if left.is_entier() && right.is_entier() {
                    Type::base(ENTIER)
                } else {
                    Type::base(REEL)
                }
            }
            BinOp::Mod => {
                if either_error {
                    return error_type();
                }
                if !left.is_entier() || !right.is_entier() {
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::InvalidBinaryOperationTermType {
                            op: "%".to_string(),
                        },
                        lhs.lexpos,
                    ));
                    return error_type();
                }
                Type::base(ENTIER)
            }
            BinOp::Eq => {
                if !either_error
                    && (left.is_table() || right.is_table() || !crate::ast::structurally_equal(&left, &right))
                {
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::DifferentTypesComparison {
                            left: left.to_string(),
                            right: right.to_string(),
                        },
                        lhs.lexpos,
                    ));
                }
                Type::base(BOOLEEN)
            }
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                if !either_error && (!left.is_numeric() || !right.is_numeric()) {
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::InvalidBinaryOperationTermType {
                            op: binop_str(op).to_string(),
                        },
                        lhs.lexpos,
                    ));
                }
                Type::base(BOOLEEN)
            }
            BinOp::And | BinOp::Or => {
                if !either_error && (!left.is_booleen() || !right.is_booleen()) {
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::InvalidBinaryOperationTermType {
                            op: binop_str(op).to_string(),
                        },
                        lhs.lexpos,
                    ));
                }
                Type::base(BOOLEEN)
            }
        }
    }

    fn infer_index(
        &mut self,
        base: &mut Expr,
        indices: &mut [Expr],
        lexpos: usize,
        scope: &AlgorithmVariables,
    ) -> Type {
        let base_ty = self.type_expr(base, scope);
        for idx in indices.iter_mut() {
            let idx_ty = self.type_expr(idx, scope);
            if !idx_ty.is_entier() && !is_error_type(&idx_ty) {
                self.sink
                    .push(Diagnostic::semantic(ErrorKind::NonIntegerIndex, idx.lexpos));
            }
        }
        match base_ty {
            Type::Table(ranges, inner) => {
                if ranges.len() != indices.len() {
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::UnmatchedTableIndexes {
                            expected: ranges.len(),
                            got: indices.len(),
                        },
                        lexpos,
                    ));
                }
                *inner
            }
            _ if is_error_type(&base_ty) => error_type(),
            _ => {
                self.sink
                    .push(Diagnostic::semantic(ErrorKind::NonTableElementAccess, lexpos));
                error_type()
            }
        }
    }

    fn infer_attribute(&mut self, base: &mut Expr, field: &str, scope: &AlgorithmVariables) -> Type {
        let base_ty = self.type_expr(base, scope);
        match base_ty {
            Type::Base(name) => match self.types.get(&name) {
                Some(ct) => match ct.attributes.iter().find(|a| a.name == field) {
                    Some(attr) => attr.ty.clone(),
                    None => {
                        self.sink.push(Diagnostic::semantic(
                            ErrorKind::InvalidAttribute {
                                type_name: name.clone(),
                                field: field.to_string(),
                            },
                            base.lexpos,
                        ));
                        error_type()
                    }
                },
                None if is_error_type(&Type::Base(name.clone())) => error_type(),
                None => {
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::NonCustomTypeAttributeAccess,
                        base.lexpos,
                    ));
                    error_type()
                }
            },
            _ => {
                self.sink.push(Diagnostic::semantic(
                    ErrorKind::NonCustomTypeAttributeAccess,
                    base.lexpos,
                ));
                error_type()
            }
        }
    }

    fn infer_call(
        &mut self,
        name: &str,
        args: &mut [Expr],
        lexpos: usize,
        scope: &AlgorithmVariables,
    ) -> Type {
        let Some(sig) = self.subs.get(name).cloned() else {
            self.sink.push(Diagnostic::semantic(
                ErrorKind::UndefinedFunction {
                    name: name.to_string(),
                },
                lexpos,
            ));
            for a in args.iter_mut() {
                self.type_expr(a, scope);
            }
            return error_type();
        };

        if sig.output_types.len() != 1 {
            self.sink.push(Diagnostic::semantic(
                ErrorKind::NonUniqueOutputFunctionExpression,
                lexpos,
            ));
        }

        if args.len() != sig.input_types.len() {
            self.sink.push(Diagnostic::semantic(
                ErrorKind::UnmatchedNumberOfInputs {
                    expected: sig.input_types.len(),
                    got: args.len(),
                },
                lexpos,
            ));
        }
        for (i, arg) in args.iter_mut().enumerate() {
            let arg_ty = self.type_expr(arg, scope);
            if let Some(expected) = sig.input_types.get(i) {
                if !is_error_type(&arg_ty) && !arg_ty.promotable_to(expected) {
                    self.sink.push(Diagnostic::semantic(
                        ErrorKind::IncompatibleInputType {
                            expected: expected.to_string(),
                            got: arg_ty.to_string(),
                        },
                        arg.lexpos,
                    ));
                }
            }
        }

        if sig.output_types.len() == 1 {
            sig.output_types[0].clone()
        } else {
            error_type()
        }
    }
}

fn binop_str(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Eq => "=",
        BinOp::Lt => "<",
        BinOp::Gt => ">",
        BinOp::Le => "<=",
        BinOp::Ge => ">=",
        BinOp::And => "et",
        BinOp::Or => "ou",
    }
}
