//! Bottom-up-shaped recursive-descent parser with precedence climbing,
//! block-stack discipline, and per-rule error productions. See
//! `spec.md` §4.3 and `SPEC_FULL.md` §4.3 for the idiom: one `Parser`
//! struct over a flat token vector (no separate lexer coupling), the
//! expression ladder as one method per precedence level, and a stack of
//! open block kinds used to keep one bad `Fin…` from cascading into two
//! diagnostics.

use crate::ast::*;
use crate::diagnostics::{Diagnostic, DiagnosticSink, ErrorKind};
use crate::lexer::{Token, TokenKind};

/// The five compound constructs that push/pop the block stack (`spec.md`
/// §4.3, §4.4's state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    MainAlgo,
    SubAlgo,
    Si,
    Pour,
    TantQue,
}

impl BlockKind {
    fn footer_kind(self) -> TokenKind {
        match self {
            BlockKind::MainAlgo => TokenKind::FinAlgo,
            BlockKind::SubAlgo => TokenKind::FinSa,
            BlockKind::Si => TokenKind::FinSi,
            BlockKind::Pour => TokenKind::FinPour,
            BlockKind::TantQue => TokenKind::FinTq,
        }
    }

    fn missing_footer_error(self) -> ErrorKind {
        match self {
            BlockKind::MainAlgo => ErrorKind::ExpectedFinAlgo,
            BlockKind::SubAlgo => ErrorKind::ExpectedFinSa,
            BlockKind::Si => ErrorKind::ExpectedFinSi,
            BlockKind::Pour => ErrorKind::ExpectedFinPour,
            BlockKind::TantQue => ErrorKind::ExpectedFinTq,
        }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    sink: DiagnosticSink,
    /// Stack of currently open block kinds; pushed on header reduction,
    /// popped on footer reduction (including error footers).
    block_stack: Vec<BlockKind>,
}

/// Result of a full parse: whatever AST could be built, plus every
/// diagnostic collected along the way. A non-empty sink does not imply
/// `program` is `None` — the parser keeps going past most errors.
pub struct ParseOutput {
    pub program: Option<Program>,
    pub diagnostics: DiagnosticSink,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            sink: DiagnosticSink::new(),
            block_stack: Vec::new(),
        }
    }

    pub fn parse(mut self) -> ParseOutput {
        let program = self.parse_program();
        self.close_residual_blocks();
        ParseOutput {
            program,
            diagnostics: self.sink,
        }
    }

    // -- token stream primitives --------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn offset(&self) -> usize {
        self.current().offset
    }

    fn lineno(&self) -> usize {
        self.current().lineno
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes zero or more `NEWLINE` tokens (blank-line runs already
    /// collapsed by the lexer into one token each).
    fn skip_newlines(&mut self) {
        while self.at(TokenKind::Newline) {
            self.advance();
        }
    }

    /// Error production: the grammar wanted `kind` here but found
    /// something else. Reports `Expected{name}` and does *not* consume
    /// the offending token, so the caller's own recovery (usually a
    /// synchronizing advance) decides what happens next.
    fn expect(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        if self.at(kind) {
            Some(self.advance())
        } else {
            self.error_expected(what);
            None
        }
    }

    fn error_expected(&mut self, what: &str) {
        self.sink.push(Diagnostic::syntax(
            ErrorKind::Expected {
                expected: what.to_string(),
            },
            self.offset(),
        ));
    }

    /// Advances past the current token to avoid an infinite loop when no
    /// recovery rule matches it, stopping short of `EOF`.
    fn bump_for_recovery(&mut self) {
        if !self.at(TokenKind::Eof) {
            self.advance();
        }
    }

    // -- block stack ----------------------------------------------------

    fn push_block(&mut self, kind: BlockKind) {
        self.block_stack.push(kind);
    }

    /// Pops the block stack, asserting the top matches `kind` — the
    /// "implementation integrity check" of `spec.md` §4.4, not a
    /// user-facing diagnostic: by construction every footer rule for
    /// `kind` only ever fires while the matching header is innermost.
    fn pop_block(&mut self, kind: BlockKind) {
        let top = self.block_stack.pop();
        debug_assert_eq!(top, Some(kind));
    }

    /// Expects the footer keyword for `kind`. On success, pops the
    /// stack. On failure, emits the block's dedicated missing-footer
    /// diagnostic ("error footer") and *still* pops the stack, keeping
    /// it balanced so later errors are not misattributed.
    fn expect_footer(&mut self, kind: BlockKind) {
        if self.at(kind.footer_kind()) {
            self.advance();
        } else {
            self.sink
                .push(Diagnostic::syntax(kind.missing_footer_error(), self.offset()));
        }
        self.pop_block(kind);
    }

    /// At EOF, synthesizes one diagnostic per still-open block — the
    /// only place a missing footer is reported when the file simply ran
    /// out before any closing keyword appeared.
    fn close_residual_blocks(&mut self) {
        let eof_offset = self.offset();
        while let Some(kind) = self.block_stack.pop() {
            self.sink
                .push(Diagnostic::syntax(kind.missing_footer_error(), eof_offset));
        }
    }

    // -- program structure ----------------------------------------------

    fn parse_program(&mut self) -> Option<Program> {
        self.skip_newlines();
        let main = self.parse_main_algorithm()?;
        self.skip_newlines();

        let mut subs = Vec::new();
        while self.at_sub_algo_header() {
            if let Some(sub) = self.parse_sub_algorithm() {
                subs.push(sub);
            }
            self.skip_newlines();
        }

        Some(Program { main, subs })
    }

    fn at_sub_algo_header(&self) -> bool {
        self.at(TokenKind::Sa) || self.at(TokenKind::Sous)
    }

    fn parse_main_algorithm(&mut self) -> Option<MainAlgorithm> {
        self.expect(TokenKind::Algorithme, "Algorithme")?;
        let name_tok = self.expect(TokenKind::Id, "le nom de l'algorithme");
        let (name, name_lexpos) = match name_tok {
            Some(t) => (t.lexeme, t.offset),
            None => (String::new(), self.offset()),
        };
        self.skip_newlines();

        self.push_block(BlockKind::MainAlgo);

        let type_defs = self.parse_optional_types_section();
        let var_decls = self.parse_variables_section();
        let statements = self.parse_instructions_section();

        self.expect_footer(BlockKind::MainAlgo);

        Some(MainAlgorithm {
            name,
            name_lexpos,
            type_defs,
            var_decls,
            statements,
        })
    }

    fn parse_sub_algorithm(&mut self) -> Option<SubAlgorithm> {
        if self.at(TokenKind::Sous) {
            self.advance();
            self.skip_newlines();
            self.expect(TokenKind::Algorithme, "Algorithme");
        } else {
            self.expect(TokenKind::Sa, "SA")?;
        }
        let name_tok = self.expect(TokenKind::Id, "le nom du sous-algorithme");
        let (name, name_lexpos) = match name_tok {
            Some(t) => (t.lexeme, t.offset),
            None => (String::new(), self.offset()),
        };

        let (inputs, outputs) = self.parse_sub_param_list();
        self.skip_newlines();

        self.push_block(BlockKind::SubAlgo);

        let var_decls = self.parse_variables_section();
        let statements = self.parse_instructions_section();

        self.expect_footer(BlockKind::SubAlgo);

        Some(SubAlgorithm {
            name,
            name_lexpos,
            inputs,
            outputs,
            var_decls,
            statements,
        })
    }

    /// `( PE x: entier, PE y: entier, PS z: réel )`: each parameter is
    /// individually tagged input (`PE`) or output (`PS`); no other
    /// separator is needed between the two groups.
    fn parse_sub_param_list(&mut self) -> (Vec<VarDecl>, Vec<VarDecl>) {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();

        if self.expect(TokenKind::LParen, "(").is_none() {
            return (inputs, outputs);
        }

        if !self.at(TokenKind::RParen) {
            loop {
                if self.at(TokenKind::Pe) {
                    self.advance();
                    if let Some(decl) = self.parse_var_decl_line() {
                        inputs.push(decl);
                    }
                } else if self.at(TokenKind::Ps) {
                    self.advance();
                    if let Some(decl) = self.parse_var_decl_line() {
                        outputs.push(decl);
                    }
                } else {
                    self.error_expected("PE ou PS");
                    self.bump_for_recovery();
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::RParen, ")");
        (inputs, outputs)
    }

    fn parse_optional_types_section(&mut self) -> Vec<CustomType> {
        if !self.at(TokenKind::Types) {
            return Vec::new();
        }
        self.advance();
        self.expect(TokenKind::Colon, ":");
        self.skip_newlines();

        let mut types = Vec::new();
        while self.at(TokenKind::Article) {
            if let Some(ct) = self.parse_article_def() {
                types.push(ct);
            }
            self.skip_newlines();
        }
        types
    }

    /// An `Article` has no dedicated footer keyword (it is not one of
    /// the five stack-tracked block kinds); its attribute list runs
    /// until the next `Article`, the `Variables` section, or `EOF`.
    fn parse_article_def(&mut self) -> Option<CustomType> {
        let lexpos = self.offset();
        let lineno = self.lineno();
        self.advance(); // 'Article'
        let name_tok = self.expect(TokenKind::Id, "le nom de l'article")?;
        self.skip_newlines();

        let mut attributes = Vec::new();
        while self.at(TokenKind::Id) {
            if let Some(decl) = self.parse_var_decl_line() {
                attributes.push(decl);
            }
            self.skip_newlines();
        }

        Some(CustomType {
            name: name_tok.lexeme,
            attributes,
            lexpos,
            lineno,
        })
    }

    fn parse_variables_section(&mut self) -> Vec<VarDecl> {
        if !self.at(TokenKind::Variables) {
            return Vec::new();
        }
        self.advance();
        self.expect(TokenKind::Colon, ":");
        self.skip_newlines();

        let mut decls = Vec::new();
        while self.at(TokenKind::Id) {
            if let Some(decl) = self.parse_var_decl_line() {
                decls.push(decl);
            }
            self.skip_newlines();
        }
        decls
    }

    fn parse_var_decl_line(&mut self) -> Option<VarDecl> {
        let name_tok = self.expect(TokenKind::Id, "un nom de variable")?;
        self.expect(TokenKind::Colon, ":");
        let ty = self.parse_type();
        Some(VarDecl {
            name: name_tok.lexeme,
            ty,
            lexpos: name_tok.offset,
            lineno: name_tok.lineno,
        })
    }

    /// `Type := BaseName | POINTEUR SUR Type | TABLEAU [ Range (, Range)* ] DE Type`.
    /// Base names are plain identifiers (`entier`, `réel`, or a custom
    /// article name) — the grammar accepts any `ID` here; which names
    /// are actually valid base types is a semantic question (`spec.md`
    /// §7's `UnknownBaseType`), not a syntactic one. Likewise, whether an
    /// absent table-range end is legal depends on where the type lives
    /// (variable vs. parameter) — the analyzer decides that, not this
    /// function.
    fn parse_type(&mut self) -> Type {
        if self.at(TokenKind::Pointeur) {
            self.advance();
            self.expect(TokenKind::Sur, "SUR");
            return Type::Ptr(Box::new(self.parse_type()));
        }

        if self.at(TokenKind::Tableau) {
            self.advance();
            self.expect(TokenKind::LBracket, "[");
            let mut ranges = Vec::new();
            if !self.at(TokenKind::RBracket) {
                loop {
                    ranges.push(self.parse_table_range());
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RBracket, "]");
            self.expect(TokenKind::De, "DE");
            let inner = self.parse_type();
            return Type::Table(ranges, Box::new(inner));
        }

        match self.expect(TokenKind::Id, "un type") {
            Some(tok) => Type::Base(tok.lexeme),
            None => Type::Base(String::new()),
        }
    }

    fn parse_table_range(&mut self) -> TableRange {
        let start = self.parse_int_literal();
        self.expect(TokenKind::Points, "..");
        let end = if self.at(TokenKind::LitInt) {
            Some(self.parse_int_literal())
        } else {
            None
        };
        TableRange { start, end }
    }

    fn parse_int_literal(&mut self) -> i64 {
        if self.at(TokenKind::LitInt) {
            let tok = self.advance();
            tok.lexeme.parse().unwrap_or(0)
        } else {
            self.error_expected("un entier littéral");
            0
        }
    }

    // -- statements -------------------------------------------------------

    fn parse_instructions_section(&mut self) -> Vec<Stmt> {
        if !self.at(TokenKind::Instructions) {
            return Vec::new();
        }
        self.advance();
        self.expect(TokenKind::Colon, ":");
        self.skip_newlines();
        self.parse_stmt_list()
    }

    /// Parses statements until a token is seen that cannot start one:
    /// any footer keyword, `SinonSi`/`Sinon`, or `EOF`.
    fn parse_stmt_list(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            if self.at_block_terminator() {
                break;
            }
            match self.parse_stmt() {
                Some(stmt) => stmts.push(stmt),
                None => {
                    if self.at_block_terminator() {
                        break;
                    }
                    self.bump_for_recovery();
                }
            }
            self.skip_newlines();
        }
        stmts
    }

    fn at_block_terminator(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::FinAlgo
                | TokenKind::FinSa
                | TokenKind::FinSi
                | TokenKind::FinPour
                | TokenKind::FinTq
                | TokenKind::SinonSi
                | TokenKind::Sinon
                | TokenKind::Eof
        )
    }

    fn parse_stmt(&mut self) -> Option<Stmt> {
        match self.kind() {
            TokenKind::Pour => self.parse_pour(),
            TokenKind::Tant => self.parse_tant_que(),
            TokenKind::Si => self.parse_si(),
            TokenKind::Id => self.parse_assign_or_call(),
            _ => {
                self.error_expected("une instruction");
                None
            }
        }
    }

    /// `ID '(' args [ '!' args ] ')'` is a call statement; any other
    /// expression starting with an identifier must be the left side of
    /// an assignment.
    fn parse_assign_or_call(&mut self) -> Option<Stmt> {
        let start_offset = self.offset();
        let start_line = self.lineno();

        if self.at(TokenKind::Id) && self.peek_is(1, TokenKind::LParen) {
            let name_tok = self.advance();
            self.advance(); // '('
            let inputs = self.parse_call_args();
            let outputs = if self.eat(TokenKind::Bang) {
                self.parse_call_args()
            } else {
                Vec::new()
            };
            self.expect(TokenKind::RParen, ")");
            return Some(Stmt::Call {
                name: name_tok.lexeme,
                inputs,
                outputs,
                lexpos: start_offset,
                lineno: start_line,
            });
        }

        let lhs = self.parse_expression();
        if self.expect(TokenKind::LArrow, "<--").is_none() {
            return None;
        }
        let rhs = self.parse_expression();
        Some(Stmt::Assign {
            lhs,
            rhs,
            lexpos: start_offset,
            lineno: start_line,
        })
    }

    fn parse_call_args(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();
        if matches!(self.kind(), TokenKind::RParen | TokenKind::Bang) {
            return args;
        }
        loop {
            args.push(self.parse_expression());
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        args
    }

    fn peek_is(&self, offset: usize, kind: TokenKind) -> bool {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind == kind)
            .unwrap_or(false)
    }

    fn parse_pour(&mut self) -> Option<Stmt> {
        let lexpos = self.offset();
        let lineno = self.lineno();
        self.advance(); // 'Pour'
        let var_tok = self.expect(TokenKind::Id, "une variable de boucle")?;
        self.expect(TokenKind::Allant, "ALLANT");
        self.expect(TokenKind::De, "DE");
        let start = self.parse_expression();
        self.expect(TokenKind::A, "A");
        let end = self.parse_expression();

        let step = if self.eat(TokenKind::Par) {
            self.expect(TokenKind::Pas, "PAS");
            self.expect(TokenKind::De, "DE");
            if self.at(TokenKind::LitInt) {
                let tok = self.advance();
                tok.lexeme.parse().unwrap_or(1)
            } else {
                self.error_expected("un pas entier littéral");
                1
            }
        } else {
            1
        };

        self.expect(TokenKind::Faire, "FAIRE");
        self.skip_newlines();

        self.push_block(BlockKind::Pour);
        let body = self.parse_stmt_list();
        self.expect_footer(BlockKind::Pour);

        Some(Stmt::Pour {
            var: var_tok.lexeme,
            var_lexpos: var_tok.offset,
            start,
            end,
            step,
            body,
            lexpos,
            lineno,
        })
    }

    fn parse_tant_que(&mut self) -> Option<Stmt> {
        let lexpos = self.offset();
        let lineno = self.lineno();
        self.advance(); // 'Tant'
        self.expect(TokenKind::Que, "QUE");
        let cond = self.parse_expression();
        self.expect(TokenKind::Faire, "FAIRE");
        self.skip_newlines();

        self.push_block(BlockKind::TantQue);
        let body = self.parse_stmt_list();
        self.expect_footer(BlockKind::TantQue);

        Some(Stmt::TantQue {
            cond,
            body,
            lexpos,
            lineno,
        })
    }

    fn parse_si(&mut self) -> Option<Stmt> {
        let lexpos = self.offset();
        let lineno = self.lineno();
        self.advance(); // 'Si'
        let mut branches = Vec::new();

        let cond = self.parse_expression();
        self.skip_newlines();
        self.push_block(BlockKind::Si);
        let body = self.parse_stmt_list();
        branches.push((cond, body));

        while self.at(TokenKind::SinonSi) {
            self.advance();
            let cond = self.parse_expression();
            self.skip_newlines();
            let body = self.parse_stmt_list();
            branches.push((cond, body));
        }

        let else_branch = if self.eat(TokenKind::Sinon) {
            self.skip_newlines();
            Some(self.parse_stmt_list())
        } else {
            None
        };

        self.expect_footer(BlockKind::Si);

        Some(Stmt::Si {
            branches,
            else_branch,
            lexpos,
            lineno,
        })
    }

    // -- expressions: primary -> postfix -> unary -> multiplicative ->
    //    additive -> relational -> equality -> logical-and -> logical-or,
    //    exactly the ladder in `spec.md` §4.3.

    fn parse_expression(&mut self) -> Expr {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> Expr {
        let mut lhs = self.parse_logical_and();
        while self.at(TokenKind::Ou) {
            let (lexpos, lineno) = (lhs.lexpos, lhs.lineno);
            self.advance();
            let rhs = self.parse_logical_and();
            lhs = Expr::new(
                ExprKind::Binary {
                    op: BinOp::Or,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                lexpos,
                lineno,
            );
        }
        lhs
    }

    fn parse_logical_and(&mut self) -> Expr {
        let mut lhs = self.parse_equality();
        while self.at(TokenKind::Et) {
            let (lexpos, lineno) = (lhs.lexpos, lhs.lineno);
            self.advance();
            let rhs = self.parse_equality();
            lhs = Expr::new(
                ExprKind::Binary {
                    op: BinOp::And,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                lexpos,
                lineno,
            );
        }
        lhs
    }

    fn parse_equality(&mut self) -> Expr {
        let mut lhs = self.parse_relational();
        while self.at(TokenKind::Equal) {
            let (lexpos, lineno) = (lhs.lexpos, lhs.lineno);
            self.advance();
            let rhs = self.parse_relational();
            lhs = Expr::new(
                ExprKind::Binary {
                    op: BinOp::Eq,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                lexpos,
                lineno,
            );
        }
        lhs
    }

    fn parse_relational(&mut self) -> Expr {
        let mut lhs = self.parse_additive();
        loop {
            let op = match self.kind() {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Lte => BinOp::Le,
                TokenKind::Gte => BinOp::Ge,
                _ => break,
            };
            let (lexpos, lineno) = (lhs.lexpos, lhs.lineno);
            self.advance();
            let rhs = self.parse_additive();
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                lexpos,
                lineno,
            );
        }
        lhs
    }

    fn parse_additive(&mut self) -> Expr {
        let mut lhs = self.parse_multiplicative();
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let (lexpos, lineno) = (lhs.lexpos, lhs.lineno);
            self.advance();
            let rhs = self.parse_multiplicative();
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                lexpos,
                lineno,
            );
        }
        lhs
    }

    fn parse_multiplicative(&mut self) -> Expr {
        let mut lhs = self.parse_unary();
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let (lexpos, lineno) = (lhs.lexpos, lhs.lineno);
            self.advance();
            let rhs = self.parse_unary();
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                lexpos,
                lineno,
            );
        }
        lhs
    }

    fn parse_unary(&mut self) -> Expr {
        let lexpos = self.offset();
        let lineno = self.lineno();
        let op = match self.kind() {
            TokenKind::Plus => Some(UnOp::Plus),
            TokenKind::Minus => Some(UnOp::Minus),
            TokenKind::Caret => Some(UnOp::PtrOf),
            TokenKind::Ampersand => Some(UnOp::Deref),
            TokenKind::Non => Some(UnOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let expr = self.parse_unary();
            return Expr::new(
                ExprKind::Unary {
                    op,
                    expr: Box::new(expr),
                },
                lexpos,
                lineno,
            );
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            if self.at(TokenKind::LBracket) {
                let (lexpos, lineno) = (expr.lexpos, expr.lineno);
                self.advance();
                let mut indices = Vec::new();
                if !self.at(TokenKind::RBracket) {
                    loop {
                        indices.push(self.parse_expression());
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket, "]");
                expr = Expr::new(
                    ExprKind::Index {
                        base: Box::new(expr),
                        indices,
                    },
                    lexpos,
                    lineno,
                );
            } else if self.at(TokenKind::Dot) {
                let (lexpos, lineno) = (expr.lexpos, expr.lineno);
                self.advance();
                let field = self
                    .expect(TokenKind::Id, "un nom d'attribut")
                    .map(|t| t.lexeme)
                    .unwrap_or_default();
                expr = Expr::new(
                    ExprKind::Attribute {
                        base: Box::new(expr),
                        field,
                    },
                    lexpos,
                    lineno,
                );
            } else {
                break;
            }
        }
        expr
    }

    fn parse_primary(&mut self) -> Expr {
        let lexpos = self.offset();
        let lineno = self.lineno();

        match self.kind() {
            TokenKind::LitInt => {
                let tok = self.advance();
                let v: i64 = tok.lexeme.parse().unwrap_or(0);
                Expr::new(ExprKind::LitInt(v), lexpos, lineno)
            }
            TokenKind::LitFloat => {
                let tok = self.advance();
                let v: f64 = tok.lexeme.parse().unwrap_or(0.0);
                Expr::new(ExprKind::LitFloat(v), lexpos, lineno)
            }
            TokenKind::LitChar => {
                let tok = self.advance();
                if tok.lexeme == "bad" {
                    self.sink
                        .push(Diagnostic::syntax(ErrorKind::MalformedCharLiteral, lexpos));
                    Expr::new(ExprKind::LitChar('\0'), lexpos, lineno)
                } else {
                    let ch = unescape_char(&tok.lexeme);
                    Expr::new(ExprKind::LitChar(ch), lexpos, lineno)
                }
            }
            TokenKind::LitBool => {
                let tok = self.advance();
                Expr::new(ExprKind::LitBool(tok.lexeme == "VRAI"), lexpos, lineno)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression();
                self.expect(TokenKind::RParen, ")");
                Expr::new(ExprKind::Paren(Box::new(inner)), lexpos, lineno)
            }
            TokenKind::Id if self.peek_is(1, TokenKind::LParen) => self.parse_function_expression(),
            TokenKind::Id => {
                let tok = self.advance();
                Expr::new(ExprKind::Id(tok.lexeme), lexpos, lineno)
            }
            _ => {
                self.error_expected("une expression");
                self.bump_for_recovery();
                Expr::new(ExprKind::LitInt(0), lexpos, lineno)
            }
        }
    }

    /// `expression` admits `function_expression` directly wherever an
    /// expression is expected (`spec.md` §4.3). If the call carries a
    /// `!` output separator, that shape is statement-only: the error
    /// production fires here and reports the dedicated diagnostic,
    /// discarding the output arguments so the rest of the expression
    /// still type-checks.
    fn parse_function_expression(&mut self) -> Expr {
        let lexpos = self.offset();
        let lineno = self.lineno();
        let name_tok = self.advance();
        self.advance(); // '('
        let args = self.parse_call_args();
        if self.at(TokenKind::Bang) {
            self.sink.push(Diagnostic::syntax(
                ErrorKind::CallWithBangNotAnExpression,
                self.offset(),
            ));
            self.advance();
            let _ = self.parse_call_args();
        }
        self.expect(TokenKind::RParen, ")");
        Expr::new(
            ExprKind::Call {
                name: name_tok.lexeme,
                args,
            },
            lexpos,
            lineno,
        )
    }
}

fn unescape_char(lexeme: &str) -> char {
    let mut chars = lexeme.chars();
    match chars.next() {
        Some('\\') => match chars.next() {
            Some('n') => '\n',
            Some('0') => '\0',
            Some('\'') => '\'',
            Some('\\') => '\\',
            Some(other) => other,
            None => '\0',
        },
        Some(c) => c,
        None => '\0',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> ParseOutput {
        let tokens = Lexer::new(src).tokenize().expect("no illegal characters");
        Parser::new(tokens).parse()
    }

    #[test]
    fn minimal_algorithm_parses_with_no_diagnostics() {
        let out = parse("Algorithme A\nVariables:\n  x: entier\nInstructions:\n  x <-- 1\nFinAlgo\n");
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let program = out.program.unwrap();
        assert_eq!(program.main.name, "A");
        assert_eq!(program.main.var_decls.len(), 1);
        assert_eq!(program.main.statements.len(), 1);
    }

    #[test]
    fn unclosed_pour_yields_exactly_one_diagnostic_at_eof() {
        let out = parse(
            "Algorithme A\nInstructions:\n  Pour i allant de 1 a 10 Faire\n    i <-- i\nFinAlgo\n",
        );
        let messages: Vec<_> = out.diagnostics.iter().map(|d| d.message.clone()).collect();
        assert_eq!(messages, vec![ErrorKind::ExpectedFinPour.to_string()]);
    }

    #[test]
    fn call_statement_with_bang_parses() {
        let out = parse("Algorithme A\nInstructions:\n  Carre(5 ! resultat)\nFinAlgo\n");
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let stmt = &out.program.unwrap().main.statements[0];
        match stmt {
            Stmt::Call {
                name,
                inputs,
                outputs,
                ..
            } => {
                assert_eq!(name, "Carre");
                assert_eq!(inputs.len(), 1);
                assert_eq!(outputs.len(), 1);
            }
            _ => panic!("expected a call statement"),
        }
    }

    #[test]
    fn call_with_bang_in_expression_position_is_rejected() {
        let out = parse(
            "Algorithme A\nVariables:\n  x: entier\nInstructions:\n  x <-- Carre(5 ! x)\nFinAlgo\n",
        );
        assert!(out
            .diagnostics
            .iter()
            .any(|d| d.message == ErrorKind::CallWithBangNotAnExpression.to_string()));
    }

    #[test]
    fn sub_algorithm_with_typed_params_parses() {
        let out = parse(concat!(
            "Algorithme A\n",
            "Instructions:\n",
            "FinAlgo\n",
            "SA Carre(PE x: entier, PS y: entier)\n",
            "Instructions:\n",
            "  y <-- x\n",
            "FinSa\n",
        ));
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let program = out.program.unwrap();
        assert_eq!(program.subs.len(), 1);
        assert_eq!(program.subs[0].inputs.len(), 1);
        assert_eq!(program.subs[0].outputs.len(), 1);
    }

    #[test]
    fn expression_precedence_matches_ladder() {
        let out = parse(
            "Algorithme A\nVariables:\n  x: entier\nInstructions:\n  x <-- 1 + 2 * 3\nFinAlgo\n",
        );
        let stmt = &out.program.unwrap().main.statements[0];
        if let Stmt::Assign { rhs, .. } = stmt {
            match &rhs.kind {
                ExprKind::Binary {
                    op: BinOp::Add,
                    rhs: mul,
                    ..
                } => {
                    assert!(matches!(mul.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
                }
                other => panic!("expected top-level addition, got {other:?}"),
            }
        } else {
            panic!("expected assignment");
        }
    }

    #[test]
    fn si_sinonsi_sinon_cascade_parses() {
        let out = parse(concat!(
            "Algorithme A\n",
            "Variables:\n",
            "  x: entier\n",
            "Instructions:\n",
            "  Si x = 1\n",
            "    x <-- 1\n",
            "  SinonSi x = 2\n",
            "    x <-- 2\n",
            "  Sinon\n",
            "    x <-- 3\n",
            "  FinSi\n",
            "FinAlgo\n",
        ));
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let stmt = &out.program.unwrap().main.statements[0];
        match stmt {
            Stmt::Si {
                branches,
                else_branch,
                ..
            } => {
                assert_eq!(branches.len(), 2);
                assert!(else_branch.is_some());
            }
            _ => panic!("expected Si"),
        }
    }

    #[test]
    fn unsized_table_dimension_parses_without_complaint_here() {
        // Whether an absent end is legal is a semantic question; the
        // parser accepts the shape anywhere and leaves `end: None`.
        let out = parse(
            "Algorithme A\nVariables:\n  t: tableau[1..] de entier\nInstructions:\nFinAlgo\n",
        );
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let ty = &out.program.unwrap().main.var_decls[0].ty;
        match ty {
            Type::Table(ranges, _) => assert_eq!(ranges[0].end, None),
            other => panic!("expected table type, got {other:?}"),
        }
    }

    #[test]
    fn unsized_table_dimension_allowed_in_sub_param() {
        let out = parse(concat!(
            "Algorithme A\n",
            "Instructions:\n",
            "FinAlgo\n",
            "SA Somme(PE t: tableau[1..] de entier, PS s: entier)\n",
            "Instructions:\n",
            "FinSa\n",
        ));
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    }
}
