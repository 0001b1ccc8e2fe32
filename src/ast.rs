//! The shared data model: types, expressions, statements, declarations,
//! and program units. Every node carries the source offset of its first
//! token (`lexpos`) and the 1-based line it starts on (`lineno`); see
//! [`spec.md`]'s "first token" rule and `SPEC_FULL.md` §3.

pub const ENTIER: &str = "entier";
pub const REEL: &str = "réel";
pub const BOOLEEN: &str = "booléen";
pub const CARACTERE: &str = "caractère";

/// One dimension of a `Tableau`. `end` absent signals an unsized
/// dimension, legal only on sub-algorithm parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRange {
    pub start: i64,
    pub end: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Base(String),
    Ptr(Box<Type>),
    Table(Vec<TableRange>, Box<Type>),
}

impl Type {
    pub fn base(name: impl Into<String>) -> Type {
        Type::Base(name.into())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Base(n) if n == ENTIER || n == REEL)
    }

    pub fn is_entier(&self) -> bool {
        matches!(self, Type::Base(n) if n == ENTIER)
    }

    pub fn is_booleen(&self) -> bool {
        matches!(self, Type::Base(n) if n == BOOLEEN)
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Type::Table(..))
    }

    /// `entier` is promotable to `réel` in value contexts.
    pub fn promotable_to(&self, target: &Type) -> bool {
        if structurally_equal(self, target) {
            return true;
        }
        self.is_entier() && matches!(target, Type::Base(n) if n == REEL)
    }
}

/// Two types are structurally equivalent per `spec.md` §3: `Base` names
/// match; `Ptr` inners match; `Table` requires the same number of
/// ranges, matching `start`, matching `end` (both absent counts as
/// matching), and matching inner.
pub fn structurally_equal(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::Base(x), Type::Base(y)) => x == y,
        (Type::Ptr(x), Type::Ptr(y)) => structurally_equal(x, y),
        (Type::Table(ra, ia), Type::Table(rb, ib)) => {
            ra.len() == rb.len()
                && ra.iter().zip(rb).all(|(x, y)| x.start == y.start && x.end == y.end)
                && structurally_equal(ia, ib)
        }
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Plus,
    Minus,
    /// `^e`: constructs a pointer to the type of `e`.
    PtrOf,
    /// `&e`: dereferences a pointer-typed `e`.
    Deref,
    Not,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    LitInt(i64),
    LitFloat(f64),
    LitChar(char),
    LitBool(bool),
    Id(String),
    Paren(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnOp,
        expr: Box<Expr>,
    },
    Index {
        base: Box<Expr>,
        indices: Vec<Expr>,
    },
    Attribute {
        base: Box<Expr>,
        field: String,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub lexpos: usize,
    pub lineno: usize,
    pub is_assignable: bool,
    /// Filled in exactly once by the semantic analyzer. `None` until
    /// then; after a successful analysis every node's slot is `Some`
    /// (invariant I1 of `spec.md` §8).
    pub expr_type: Option<Type>,
}

fn assignable_for(kind: &ExprKind) -> bool {
    matches!(
        kind,
        ExprKind::Id(_)
            | ExprKind::Index { .. }
            | ExprKind::Attribute { .. }
            | ExprKind::Unary { op: UnOp::Deref, .. }
    )
}

impl Expr {
    /// Centralizes the "first token" position rule: every production
    /// that builds an expression calls this with the offset/line of its
    /// own leftmost token (never a copy of an inner subnode's, to avoid
    /// accidental drift once that subnode is itself wrapped).
    pub fn new(kind: ExprKind, lexpos: usize, lineno: usize) -> Expr {
        let is_assignable = assignable_for(&kind);
        Expr {
            kind,
            lexpos,
            lineno,
            is_assignable,
            expr_type: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Assign {
        lhs: Expr,
        rhs: Expr,
        lexpos: usize,
        lineno: usize,
    },
    Call {
        name: String,
        inputs: Vec<Expr>,
        outputs: Vec<Expr>,
        lexpos: usize,
        lineno: usize,
    },
    Pour {
        var: String,
        var_lexpos: usize,
        start: Expr,
        end: Expr,
        /// Step literal; `spec.md` §4.4 and §9(c): syntactically forced
        /// to be a `LIT_INT`, never a general expression.
        step: i64,
        body: Vec<Stmt>,
        lexpos: usize,
        lineno: usize,
    },
    TantQue {
        cond: Expr,
        body: Vec<Stmt>,
        lexpos: usize,
        lineno: usize,
    },
    Si {
        /// `(condition, body)` pairs: the `Si` branch first, then each
        /// `SinonSi` in source order.
        branches: Vec<(Expr, Vec<Stmt>)>,
        else_branch: Option<Vec<Stmt>>,
        lexpos: usize,
        lineno: usize,
    },
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
    pub lexpos: usize,
    pub lineno: usize,
}

#[derive(Debug, Clone)]
pub struct CustomType {
    pub name: String,
    pub attributes: Vec<VarDecl>,
    pub lexpos: usize,
    pub lineno: usize,
}

#[derive(Debug, Clone)]
pub struct MainAlgorithm {
    pub name: String,
    pub name_lexpos: usize,
    pub type_defs: Vec<CustomType>,
    pub var_decls: Vec<VarDecl>,
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct SubAlgorithm {
    pub name: String,
    pub name_lexpos: usize,
    pub inputs: Vec<VarDecl>,
    pub outputs: Vec<VarDecl>,
    pub var_decls: Vec<VarDecl>,
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Program {
    pub main: MainAlgorithm,
    pub subs: Vec<SubAlgorithm>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_structural_equality_treats_absent_ends_as_matching() {
        let a = Type::Table(
            vec![TableRange { start: 0, end: None }],
            Box::new(Type::base(ENTIER)),
        );
        let b = Type::Table(
            vec![TableRange { start: 0, end: None }],
            Box::new(Type::base(ENTIER)),
        );
        assert!(structurally_equal(&a, &b));
    }

    #[test]
    fn entier_promotes_to_reel_but_not_the_reverse() {
        let entier = Type::base(ENTIER);
        let reel = Type::base(REEL);
        assert!(entier.promotable_to(&reel));
        assert!(!reel.promotable_to(&entier));
    }

    #[test]
    fn is_assignable_matches_spec_set() {
        let id = Expr::new(ExprKind::Id("x".into()), 0, 1);
        assert!(id.is_assignable);

        let call = Expr::new(
            ExprKind::Call {
                name: "f".into(),
                args: vec![],
            },
            0,
            1,
        );
        assert!(!call.is_assignable);

        let deref = Expr::new(
            ExprKind::Unary {
                op: UnOp::Deref,
                expr: Box::new(id.clone()),
            },
            0,
            1,
        );
        assert!(deref.is_assignable);
    }
}
