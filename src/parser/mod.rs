pub mod ast;
mod expr;

use crate::errors::{Loc, Span, SyntaxError};
use crate::lexer::{Token, TokenKind};
use self::ast::*;

/// Nesting bound so pathological input fails with a syntax error instead of
/// overflowing the call stack.
const MAX_DEPTH: usize = 256;

/// Parse a full program. The top level of a Rill source file consists of
/// declarations only (`let`/`var`/`@fn`).
pub fn parse(tokens: Vec<Token>) -> Result<Vec<Stmt>, SyntaxError> {
    Parser::new(tokens).parse_program()
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.is_empty() {
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                loc: Loc::new(1, 1),
            });
        }
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    // ----- token cursor -------------------------------------------------

    fn current(&self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub(crate) fn kind(&self) -> TokenKind {
        self.current().kind
    }

    pub(crate) fn loc(&self) -> Loc {
        self.current().loc
    }

    pub(crate) fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    pub(crate) fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// Advance asserting the token kind, the workhorse of the grammar.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token, SyntaxError> {
        self.check(kind)?;
        Ok(self.advance())
    }

    /// Kind assertion without consuming, for branching before commit.
    pub(crate) fn check(&self, kind: TokenKind) -> Result<(), SyntaxError> {
        if self.kind() == kind {
            Ok(())
        } else {
            Err(self.err(format!(
                "expected {}, found {}",
                kind.describe(),
                self.kind().describe()
            )))
        }
    }

    pub(crate) fn err(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.loc())
    }

    fn skip_newlines(&mut self) {
        while self.kind() == TokenKind::NewLine {
            self.advance();
        }
    }

    pub(crate) fn enter(&mut self) -> Result<(), SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            Err(self.err("program is nested too deeply"))
        } else {
            Ok(())
        }
    }

    pub(crate) fn leave(&mut self) {
        self.depth -= 1;
    }

    // ----- entry points -------------------------------------------------

    pub fn parse_program(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            if self.kind() == TokenKind::Eof {
                break;
            }
            stmts.push(self.parse_def_statement()?);
            match self.kind() {
                TokenKind::NewLine | TokenKind::Eof => {}
                other => {
                    return Err(self.err(format!(
                        "expected newline after definition, found {}",
                        other.describe()
                    )));
                }
            }
        }
        Ok(stmts)
    }

    /// Statement dispatcher. Expects the stream at the first token of a
    /// statement and leaves it just past the statement.
    pub fn parse_statement(&mut self) -> Result<Stmt, SyntaxError> {
        self.enter()?;
        let result = self.parse_statement_inner();
        self.leave();
        result
    }

    fn parse_statement_inner(&mut self) -> Result<Stmt, SyntaxError> {
        match self.kind() {
            TokenKind::AttrOpen => self.parse_statement_with_attrs(),
            // `@name` opens a function definition; a bare `@` is a lambda
            // and falls through to the expression grammar. One token of
            // lookahead keeps this predictive, no backtracking.
            TokenKind::At if self.peek_kind(1) == TokenKind::Ident => self.parse_fn_def(),
            TokenKind::Let | TokenKind::Var => self.parse_var_def(),
            TokenKind::Out => self.parse_out(),
            TokenKind::Each => self.parse_each(),
            TokenKind::For => self.parse_for(),
            TokenKind::Loop => self.parse_loop(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => {
                let start = self.loc();
                self.advance();
                Ok(Stmt::new(StmtKind::Break, Span::new(start, self.loc())))
            }
            TokenKind::Continue => {
                let start = self.loc();
                self.advance();
                Ok(Stmt::new(StmtKind::Continue, Span::new(start, self.loc())))
            }
            _ => {
                let expr = self.parse_expr(false)?;
                self.try_parse_assign(expr)
            }
        }
    }

    /// Restricted entry for positions where only declarations are valid,
    /// such as the top level of a file.
    pub fn parse_def_statement(&mut self) -> Result<Stmt, SyntaxError> {
        match self.kind() {
            TokenKind::Let | TokenKind::Var => self.parse_var_def(),
            TokenKind::At => self.parse_fn_def(),
            other => Err(self.err(format!("unexpected token {}", other.describe()))),
        }
    }

    /// Control-construct bodies accept either a brace block or a single
    /// statement.
    fn parse_block_or_statement(&mut self) -> Result<Stmt, SyntaxError> {
        if self.kind() == TokenKind::LBrace {
            let start = self.loc();
            let stmts = self.parse_block()?;
            Ok(Stmt::new(StmtKind::Block(stmts), Span::new(start, self.loc())))
        } else {
            self.parse_statement()
        }
    }

    /// Brace-delimited statement sequence, consuming both delimiters.
    /// Statements are separated by newlines.
    pub(crate) fn parse_block(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        self.enter()?;
        let result = self.parse_block_inner();
        self.leave();
        result
    }

    fn parse_block_inner(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            if self.kind() == TokenKind::RBrace {
                break;
            }
            if self.kind() == TokenKind::Eof {
                return Err(self.err("unexpected end of input, expected '}'"));
            }
            stmts.push(self.parse_statement()?);
            match self.kind() {
                TokenKind::NewLine | TokenKind::RBrace => {}
                other => {
                    return Err(self.err(format!(
                        "expected newline, found {}",
                        other.describe()
                    )));
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(stmts)
    }

    // ----- definitions --------------------------------------------------

    fn parse_var_def(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.loc();
        let mutable = match self.kind() {
            TokenKind::Var => true,
            TokenKind::Let => false,
            // Unreachable via the dispatchers; defend against caller misuse.
            other => {
                return Err(self.err(format!("unexpected token {}", other.describe())));
            }
        };
        self.advance();
        let name = self.expect(TokenKind::Ident)?.text;
        let ty = if self.kind() == TokenKind::Colon {
            self.advance();
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(TokenKind::Assign)?;
        // The initializer may sit on the next line.
        if self.kind() == TokenKind::NewLine {
            self.advance();
        }
        let init = self.parse_expr(false)?;
        Ok(Stmt::new(
            StmtKind::Def {
                name,
                ty,
                init,
                mutable,
                attrs: Vec::new(),
            },
            Span::new(start, self.loc()),
        ))
    }

    /// `@name(params) [: type] { ... }` is sugar for an immutable definition
    /// bound to a function value.
    fn parse_fn_def(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.loc();
        self.expect(TokenKind::At)?;
        let name = self.expect(TokenKind::Ident)?.text;
        let params = self.parse_params()?;
        let ret = if self.kind() == TokenKind::Colon {
            self.advance();
            Some(self.parse_type()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        let span = Span::new(start, self.loc());
        let init = Expr::new(ExprKind::Fn { params, ret, body }, span);
        Ok(Stmt::new(
            StmtKind::Def {
                name,
                ty: None,
                init,
                mutable: false,
                attrs: Vec::new(),
            },
            span,
        ))
    }

    // ----- attributes ---------------------------------------------------

    /// Collect one or more `#[...]` blocks, then parse the statement they
    /// decorate. Only definitions may carry attributes; the definition node
    /// is rebuilt with the collected list so nodes stay immutable once
    /// constructed.
    fn parse_statement_with_attrs(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.loc();
        let mut attrs = Vec::new();
        while self.kind() == TokenKind::AttrOpen {
            attrs.push(self.parse_attr()?);
            self.expect(TokenKind::NewLine)?;
            self.skip_newlines();
        }
        let stmt = self.parse_statement()?;
        match stmt.kind {
            StmtKind::Def {
                name,
                ty,
                init,
                mutable,
                attrs: existing,
            } => {
                attrs.extend(existing);
                Ok(Stmt::new(
                    StmtKind::Def {
                        name,
                        ty,
                        init,
                        mutable,
                        attrs,
                    },
                    stmt.span,
                ))
            }
            _ => Err(SyntaxError::new("invalid attribute", start)),
        }
    }

    /// `#[name]` or `#[name static-expr]`; a missing value defaults to
    /// `true` at the closing bracket's position.
    fn parse_attr(&mut self) -> Result<Attr, SyntaxError> {
        let start = self.loc();
        self.expect(TokenKind::AttrOpen)?;
        let name = self.expect(TokenKind::Ident)?.text;
        let value = if self.kind() == TokenKind::RBracket {
            Expr::new(ExprKind::Bool(true), Span::at(self.loc()))
        } else {
            self.parse_expr(true)?
        };
        self.expect(TokenKind::RBracket)?;
        Ok(Attr {
            name,
            value,
            span: Span::new(start, self.loc()),
        })
    }

    // ----- simple statements --------------------------------------------

    /// `<: expr` desugars to a call of the builtin `print`.
    fn parse_out(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.loc();
        self.expect(TokenKind::Out)?;
        let callee_span = Span::new(start, self.loc());
        let arg = self.parse_expr(false)?;
        let span = Span::new(start, self.loc());
        let callee = Expr::new(ExprKind::Ident("print".to_string()), callee_span);
        let call = Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args: vec![arg],
            },
            span,
        );
        Ok(Stmt::new(StmtKind::Expr(call), span))
    }

    fn parse_return(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.loc();
        self.expect(TokenKind::Return)?;
        let value = self.parse_expr(false)?;
        Ok(Stmt::new(
            StmtKind::Return(value),
            Span::new(start, self.loc()),
        ))
    }

    // ----- loops --------------------------------------------------------

    /// `each (let x, xs) body` — the parentheses are cosmetic.
    fn parse_each(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.loc();
        self.expect(TokenKind::Each)?;
        let parens = self.kind() == TokenKind::LParen;
        if parens {
            self.advance();
        }
        self.expect(TokenKind::Let)?;
        let var = self.expect(TokenKind::Ident)?.text;
        if self.kind() != TokenKind::Comma {
            return Err(self.err("separator expected"));
        }
        self.advance();
        let source = self.parse_expr(false)?;
        if parens {
            self.expect(TokenKind::RParen)?;
        }
        let body = self.parse_block_or_statement()?;
        Ok(Stmt::new(
            StmtKind::Each {
                var,
                source,
                body: Box::new(body),
            },
            Span::new(start, self.loc()),
        ))
    }

    /// Two grammars behind one keyword, split on `let`:
    /// `for (let i [= from], to) body` and `for (times) body`.
    fn parse_for(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.loc();
        self.expect(TokenKind::For)?;
        let parens = self.kind() == TokenKind::LParen;
        if parens {
            self.advance();
        }
        let target = if self.kind() == TokenKind::Let {
            self.advance();
            let var_loc = self.loc();
            let var = self.expect(TokenKind::Ident)?.text;
            let from = if self.kind() == TokenKind::Assign {
                self.advance();
                self.parse_expr(false)?
            } else {
                // Missing lower bound counts from zero, pinned to the
                // bound variable's own position.
                Expr::new(ExprKind::Num(0.0), Span::at(var_loc))
            };
            if self.kind() != TokenKind::Comma {
                return Err(self.err("separator expected"));
            }
            self.advance();
            let to = self.parse_expr(false)?;
            ForTarget::Range { var, from, to }
        } else {
            ForTarget::Times(self.parse_expr(false)?)
        };
        if parens {
            self.expect(TokenKind::RParen)?;
        }
        let body = self.parse_block_or_statement()?;
        Ok(Stmt::new(
            StmtKind::For {
                target,
                body: Box::new(body),
            },
            Span::new(start, self.loc()),
        ))
    }

    fn parse_loop(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.loc();
        self.expect(TokenKind::Loop)?;
        let body = self.parse_block()?;
        Ok(Stmt::new(
            StmtKind::Loop { body },
            Span::new(start, self.loc()),
        ))
    }

    /// `while cond body` lowers to:
    /// `loop { if !cond { break }; body }`
    /// keeping the guard's span on the condition tokens so diagnostics
    /// survive the rewrite.
    fn parse_while(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.loc();
        self.expect(TokenKind::While)?;
        let cond = self.parse_expr(false)?;
        let guard_span = cond.span;
        let body = self.parse_block_or_statement()?;
        let span = Span::new(start, self.loc());
        Ok(Stmt::new(
            StmtKind::Loop {
                body: vec![Self::break_guard(cond, guard_span), body],
            },
            span,
        ))
    }

    /// `do body while cond` lowers to `loop { body; if !cond { break } }`;
    /// the guard spans from the `while` keyword through the condition.
    fn parse_do_while(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.loc();
        self.expect(TokenKind::Do)?;
        let body = self.parse_block_or_statement()?;
        let while_loc = self.loc();
        self.expect(TokenKind::While)?;
        let cond = self.parse_expr(false)?;
        let guard_span = Span::new(while_loc, self.loc());
        let span = Span::new(start, self.loc());
        Ok(Stmt::new(
            StmtKind::Loop {
                body: vec![body, Self::break_guard(cond, guard_span)],
            },
            span,
        ))
    }

    fn break_guard(cond: Expr, span: Span) -> Stmt {
        let negated = Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand: Box::new(cond),
            },
            span,
        );
        let brk = Stmt::new(StmtKind::Break, span);
        Stmt::new(
            StmtKind::If {
                cond: negated,
                then: Box::new(brk),
                else_ifs: Vec::new(),
            },
            span,
        )
    }

    // ----- assignment ---------------------------------------------------

    /// After an expression in statement position, an assignment operator
    /// turns it into an assignment; any other token leaves it standing as
    /// an expression statement.
    fn try_parse_assign(&mut self, expr: Expr) -> Result<Stmt, SyntaxError> {
        let op = match self.kind() {
            TokenKind::Assign => Some(AssignOp::Set),
            TokenKind::PlusAssign => Some(AssignOp::Add),
            TokenKind::MinusAssign => Some(AssignOp::Sub),
            _ => None,
        };
        match op {
            Some(op) => {
                let start = expr.span.start;
                self.advance();
                let src = self.parse_expr(false)?;
                Ok(Stmt::new(
                    StmtKind::Assign {
                        op,
                        dest: expr,
                        src,
                    },
                    Span::new(start, self.loc()),
                ))
            }
            None => {
                let span = expr.span;
                Ok(Stmt::new(StmtKind::Expr(expr), span))
            }
        }
    }
}
