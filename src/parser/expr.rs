//! Expression, type-annotation and parameter-list grammar. Statement parsing
//! lives in the parent module; everything here is reached from it through
//! `parse_expr`, `parse_type` and `parse_params`.

use super::ast::*;
use super::Parser;
use crate::errors::{Span, SyntaxError};
use crate::lexer::TokenKind;

impl Parser {
    /// Parse a full expression. `static_only` restricts the grammar to the
    /// forms allowed inside attribute values: literals, identifiers and a
    /// negated numeric literal.
    pub(crate) fn parse_expr(&mut self, static_only: bool) -> Result<Expr, SyntaxError> {
        self.enter()?;
        let result = if static_only {
            self.parse_static_value()
        } else {
            self.parse_or()
        };
        self.leave();
        result
    }

    fn parse_static_value(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.loc();
        match self.kind() {
            TokenKind::Number => {
                let tok = self.advance();
                let value: f64 = tok
                    .text
                    .parse()
                    .map_err(|_| SyntaxError::new("invalid numeric literal", tok.loc))?;
                Ok(Expr::new(ExprKind::Num(value), Span::new(start, self.loc())))
            }
            TokenKind::Minus => {
                self.advance();
                let tok = self.expect(TokenKind::Number)?;
                let value: f64 = tok
                    .text
                    .parse()
                    .map_err(|_| SyntaxError::new("invalid numeric literal", tok.loc))?;
                Ok(Expr::new(
                    ExprKind::Num(-value),
                    Span::new(start, self.loc()),
                ))
            }
            TokenKind::Str => {
                let tok = self.advance();
                Ok(Expr::new(
                    ExprKind::Str(tok.text),
                    Span::new(start, self.loc()),
                ))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::Bool(true),
                    Span::new(start, self.loc()),
                ))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::Bool(false),
                    Span::new(start, self.loc()),
                ))
            }
            TokenKind::Ident => {
                let tok = self.advance();
                Ok(Expr::new(
                    ExprKind::Ident(tok.text),
                    Span::new(start, self.loc()),
                ))
            }
            other => Err(self.err(format!(
                "expected literal attribute value, found {}",
                other.describe()
            ))),
        }
    }

    // Precedence chain, loosest binding first. Binary operators never
    // continue across a newline; lines are statement boundaries.

    fn parse_or(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_and()?;
        while self.kind() == TokenKind::OrOr {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Self::binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_equality()?;
        while self.kind() == TokenKind::AndAnd {
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = Self::binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.kind() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_comparison()?;
            lhs = Self::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = Self::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Self::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Self::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        let span = Span::new(lhs.span.start, rhs.span.end);
        Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        )
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.loc();
        let op = match self.kind() {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            _ => None,
        };
        match op {
            Some(op) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    Span::new(start, self.loc()),
                ))
            }
            None => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.loc();
        let mut expr = self.parse_primary()?;
        loop {
            match self.kind() {
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if self.kind() != TokenKind::RParen {
                        loop {
                            args.push(self.parse_expr(false)?);
                            if self.kind() == TokenKind::Comma {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        Span::new(start, self.loc()),
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr(false)?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::new(
                        ExprKind::Index {
                            target: Box::new(expr),
                            index: Box::new(index),
                        },
                        Span::new(start, self.loc()),
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect(TokenKind::Ident)?.text;
                    expr = Expr::new(
                        ExprKind::Member {
                            target: Box::new(expr),
                            name,
                        },
                        Span::new(start, self.loc()),
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.loc();
        match self.kind() {
            TokenKind::Number => {
                let tok = self.advance();
                let value: f64 = tok
                    .text
                    .parse()
                    .map_err(|_| SyntaxError::new("invalid numeric literal", tok.loc))?;
                Ok(Expr::new(ExprKind::Num(value), Span::new(start, self.loc())))
            }
            TokenKind::Str => {
                let tok = self.advance();
                Ok(Expr::new(
                    ExprKind::Str(tok.text),
                    Span::new(start, self.loc()),
                ))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::Bool(true),
                    Span::new(start, self.loc()),
                ))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::Bool(false),
                    Span::new(start, self.loc()),
                ))
            }
            TokenKind::Ident => {
                let tok = self.advance();
                Ok(Expr::new(
                    ExprKind::Ident(tok.text),
                    Span::new(start, self.loc()),
                ))
            }
            TokenKind::LParen => {
                self.advance();
                let mut expr = self.parse_expr(false)?;
                self.expect(TokenKind::RParen)?;
                expr.span = Span::new(start, self.loc());
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if self.kind() != TokenKind::RBracket {
                    loop {
                        elements.push(self.parse_expr(false)?);
                        if self.kind() == TokenKind::Comma {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket)?;
                Ok(Expr::new(
                    ExprKind::List(elements),
                    Span::new(start, self.loc()),
                ))
            }
            // A bare `@` in expression position opens a lambda:
            // `@(params) [: type] { ... }`.
            TokenKind::At => {
                self.advance();
                let params = self.parse_params()?;
                let ret = if self.kind() == TokenKind::Colon {
                    self.advance();
                    Some(self.parse_type()?)
                } else {
                    None
                };
                let body = self.parse_block()?;
                Ok(Expr::new(
                    ExprKind::Fn { params, ret, body },
                    Span::new(start, self.loc()),
                ))
            }
            other => Err(self.err(format!(
                "expected expression, found {}",
                other.describe()
            ))),
        }
    }

    // ----- type annotations and parameter lists -------------------------

    /// Type := IDENT ( `[]` )*
    pub(crate) fn parse_type(&mut self) -> Result<TypeAnn, SyntaxError> {
        let start = self.loc();
        let name = self.expect(TokenKind::Ident)?.text;
        let mut ty = TypeAnn {
            kind: TypeKind::Named(name),
            span: Span::new(start, self.loc()),
        };
        while self.kind() == TokenKind::LBracket && self.peek_kind(1) == TokenKind::RBracket {
            self.advance();
            self.advance();
            ty = TypeAnn {
                kind: TypeKind::Array(Box::new(ty)),
                span: Span::new(start, self.loc()),
            };
        }
        Ok(ty)
    }

    /// Params := `(` [ IDENT [`:` Type] ( `,` IDENT [`:` Type] )* ] `)`
    pub(crate) fn parse_params(&mut self) -> Result<Vec<Param>, SyntaxError> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if self.kind() != TokenKind::RParen {
            loop {
                let start = self.loc();
                let name = self.expect(TokenKind::Ident)?.text;
                let ty = if self.kind() == TokenKind::Colon {
                    self.advance();
                    Some(self.parse_type()?)
                } else {
                    None
                };
                params.push(Param {
                    name,
                    ty,
                    span: Span::new(start, self.loc()),
                });
                if self.kind() == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse_expression(input: &str) -> Expr {
        let tokens = Lexer::new(input).tokenize().expect("lex failed");
        let mut parser = Parser::new(tokens);
        parser.parse_expr(false).expect("parse failed")
    }

    #[test]
    fn test_precedence_mul_over_add() {
        let expr = parse_expression("1 + 2 * 3");
        match expr.kind {
            ExprKind::Binary { op, rhs, .. } => {
                assert_eq!(op, BinaryOp::Add);
                assert!(matches!(
                    rhs.kind,
                    ExprKind::Binary {
                        op: BinaryOp::Mul,
                        ..
                    }
                ));
            }
            other => panic!("expected binary add, got {:?}", other),
        }
    }

    #[test]
    fn test_parens_override_precedence() {
        let expr = parse_expression("(1 + 2) * 3");
        match expr.kind {
            ExprKind::Binary { op, lhs, .. } => {
                assert_eq!(op, BinaryOp::Mul);
                assert!(matches!(
                    lhs.kind,
                    ExprKind::Binary {
                        op: BinaryOp::Add,
                        ..
                    }
                ));
            }
            other => panic!("expected binary mul, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison_binds_looser_than_additive() {
        let expr = parse_expression("i < n + 1");
        assert!(matches!(
            expr.kind,
            ExprKind::Binary {
                op: BinaryOp::Lt,
                ..
            }
        ));
    }

    #[test]
    fn test_call_and_index_postfix() {
        let expr = parse_expression("items[0].name(1, 2)");
        match expr.kind {
            ExprKind::Call { callee, args } => {
                assert_eq!(args.len(), 2);
                assert!(matches!(callee.kind, ExprKind::Member { .. }));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_not_chains() {
        let expr = parse_expression("!!ok");
        match expr.kind {
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => {
                assert!(matches!(
                    operand.kind,
                    ExprKind::Unary {
                        op: UnaryOp::Not,
                        ..
                    }
                ));
            }
            other => panic!("expected unary not, got {:?}", other),
        }
    }

    #[test]
    fn test_lambda_expression() {
        let expr = parse_expression("@(a, b: num): num { return a + b }");
        match expr.kind {
            ExprKind::Fn { params, ret, body } => {
                assert_eq!(params.len(), 2);
                assert_eq!(params[0].name, "a");
                assert!(params[0].ty.is_none());
                assert!(matches!(
                    params[1].ty.as_ref().unwrap().kind,
                    TypeKind::Named(ref n) if n == "num"
                ));
                assert!(ret.is_some());
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected fn expr, got {:?}", other),
        }
    }

    #[test]
    fn test_list_literal() {
        let expr = parse_expression("[1, 2, 3]");
        match expr.kind {
            ExprKind::List(elements) => assert_eq!(elements.len(), 3),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_static_mode_accepts_literals() {
        let tokens = Lexer::new("-3").tokenize().unwrap();
        let expr = Parser::new(tokens).parse_expr(true).unwrap();
        assert!(matches!(expr.kind, ExprKind::Num(v) if v == -3.0));
    }

    #[test]
    fn test_static_mode_rejects_calls() {
        let tokens = Lexer::new("f(1)").tokenize().unwrap();
        let mut parser = Parser::new(tokens);
        // The identifier itself is a valid static value; the call syntax
        // around it is not, so the stream must stop before the paren.
        let expr = parser.parse_expr(true).unwrap();
        assert!(matches!(expr.kind, ExprKind::Ident(ref n) if n == "f"));
        assert_eq!(parser.kind(), TokenKind::LParen);
    }

    #[test]
    fn test_static_mode_rejects_operators() {
        let tokens = Lexer::new("(1 + 2)").tokenize().unwrap();
        let err = Parser::new(tokens).parse_expr(true).unwrap_err();
        assert!(err.message.contains("literal attribute value"));
    }

    #[test]
    fn test_array_type_annotation() {
        let tokens = Lexer::new("num[][]").tokenize().unwrap();
        let ty = Parser::new(tokens).parse_type().unwrap();
        match ty.kind {
            TypeKind::Array(inner) => {
                assert!(matches!(inner.kind, TypeKind::Array(_)));
            }
            other => panic!("expected array type, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_param_list() {
        let tokens = Lexer::new("()").tokenize().unwrap();
        let params = Parser::new(tokens).parse_params().unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_expression_stops_at_newline() {
        let tokens = Lexer::new("1\n+ 2").tokenize().unwrap();
        let mut parser = Parser::new(tokens);
        let expr = parser.parse_expr(false).unwrap();
        assert!(matches!(expr.kind, ExprKind::Num(_)));
        assert_eq!(parser.kind(), TokenKind::NewLine);
    }
}
