// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pratt-style expression parser
//!
//! Precedence, loosest first: ternary, pipe, `||`, `&&`, equality,
//! comparison, additive, multiplicative, unary, postfix (call, member,
//! index). The pipe form `x | f(args)` desugars to `f(x, args)` here, so
//! the evaluator never sees it.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::token::{excerpt, tokenize, Token};
use weft_core::ExpressionError;

/// Parse one expression, enforcing the tree-depth limit.
pub fn parse(src: &str, max_depth: usize) -> Result<Expr, ExpressionError> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(ExpressionError::parse("empty expression"));
    }
    let mut p = Parser { src, tokens, pos: 0, depth: 0, max_depth };
    let expr = p.ternary()?;
    if p.pos != p.tokens.len() {
        return Err(ExpressionError::parse(format!(
            "unexpected trailing input in '{}'",
            excerpt(src, 0)
        )));
    }
    Ok(expr)
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, t: &Token) -> bool {
        if self.peek() == Some(t) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, t: Token) -> Result<(), ExpressionError> {
        if self.eat(&t) {
            Ok(())
        } else {
            Err(self.err(format!("expected {t:?}")))
        }
    }

    fn err(&self, msg: String) -> ExpressionError {
        ExpressionError::parse(format!("{msg} in '{}'", excerpt(self.src, 0)))
    }

    fn enter(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ExpressionError::limit(format!(
                "expression deeper than {} levels",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn ternary(&mut self) -> Result<Expr, ExpressionError> {
        self.enter()?;
        let cond = self.pipe()?;
        let out = if self.eat(&Token::Question) {
            let then = self.ternary()?;
            self.expect(Token::Colon)?;
            let otherwise = self.ternary()?;
            Expr::Ternary(Box::new(cond), Box::new(then), Box::new(otherwise))
        } else {
            cond
        };
        self.leave();
        Ok(out)
    }

    fn pipe(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.or()?;
        while self.eat(&Token::Pipe) {
            // RHS must be a function name, optionally with extra args
            let name = match self.bump() {
                Some(Token::Ident(name)) => name,
                _ => return Err(self.err("pipe target must be a function".into())),
            };
            let mut args = vec![lhs];
            if self.eat(&Token::LParen) {
                args.extend(self.call_args()?);
            }
            lhs = Expr::Call(name, args);
        }
        Ok(lhs)
    }

    fn or(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.and()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.and()?;
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.equality()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.equality()?;
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.comparison()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.comparison()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ExpressionError> {
        self.enter()?;
        let out = if self.eat(&Token::Bang) {
            Expr::Unary(UnaryOp::Not, Box::new(self.unary()?))
        } else if self.eat(&Token::Minus) {
            Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?))
        } else {
            self.postfix()?
        };
        self.leave();
        Ok(out)
    }

    fn postfix(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Token::Dot) {
                match self.bump() {
                    Some(Token::Ident(name)) => expr = Expr::Member(Box::new(expr), name),
                    _ => return Err(self.err("expected property name after '.'".into())),
                }
            } else if self.eat(&Token::LBracket) {
                let index = self.ternary()?;
                self.expect(Token::RBracket)?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ExpressionError> {
        self.enter()?;
        let out = match self.bump() {
            Some(Token::Number(n)) => Expr::Number(n),
            Some(Token::Str(s)) => Expr::Str(s),
            Some(Token::True) => Expr::Bool(true),
            Some(Token::False) => Expr::Bool(false),
            Some(Token::Null) => Expr::Null,
            Some(Token::Ident(name)) => {
                if self.eat(&Token::LParen) {
                    Expr::Call(name, self.call_args()?)
                } else {
                    Expr::Ident(name)
                }
            }
            Some(Token::LParen) => {
                let inner = self.ternary()?;
                self.expect(Token::RParen)?;
                inner
            }
            Some(Token::LBracket) => {
                let mut items = Vec::new();
                if !self.eat(&Token::RBracket) {
                    loop {
                        items.push(self.ternary()?);
                        if self.eat(&Token::RBracket) {
                            break;
                        }
                        self.expect(Token::Comma)?;
                    }
                }
                Expr::Array(items)
            }
            Some(Token::LBrace) => {
                let mut entries = Vec::new();
                if !self.eat(&Token::RBrace) {
                    loop {
                        let key = match self.bump() {
                            Some(Token::Ident(k)) => k,
                            Some(Token::Str(k)) => k,
                            _ => return Err(self.err("expected object key".into())),
                        };
                        self.expect(Token::Colon)?;
                        entries.push((key, self.ternary()?));
                        if self.eat(&Token::RBrace) {
                            break;
                        }
                        self.expect(Token::Comma)?;
                    }
                }
                Expr::Object(entries)
            }
            other => return Err(self.err(format!("unexpected token {other:?}"))),
        };
        self.leave();
        Ok(out)
    }

    fn call_args(&mut self) -> Result<Vec<Expr>, ExpressionError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.ternary()?);
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            self.expect(Token::Comma)?;
        }
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
