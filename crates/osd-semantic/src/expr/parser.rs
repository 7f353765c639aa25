//! Recursive-descent parser for rule expressions
//!
//! Precedence, lowest to highest: `or`, `and`, `not`, comparison chains,
//! additive, multiplicative, unary minus, postfix indexing, primaries.
//! Comparison operators deliberately chain (`0 < len(x) <= n`), matching
//! how ruleset documents are written.

use super::ast::{BinaryOp, BoolOp, CmpOp, Expr, UnaryOp};
use super::token::{tokenize, Token};
use super::ExprError;

/// Parse an expression source string into an AST.
pub fn parse(source: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.or_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(ExprError::Syntax(format!(
            "unexpected input after expression: {:?}",
            parser.tokens[parser.pos]
        )));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExprError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(ExprError::Syntax(format!(
                "expected {:?}, found {:?}",
                expected,
                self.peek()
            )))
        }
    }

    fn or_expr(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.and_expr()?;
        while self.eat(&Token::Or) {
            let right = self.and_expr()?;
            left = Expr::Logic {
                op: BoolOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.not_expr()?;
        while self.eat(&Token::And) {
            let right = self.not_expr()?;
            left = Expr::Logic {
                op: BoolOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&Token::Not) {
            let operand = self.not_expr()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, ExprError> {
        let first = self.arith()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CmpOp::Eq,
                Some(Token::Ne) => CmpOp::Ne,
                Some(Token::Lt) => CmpOp::Lt,
                Some(Token::Le) => CmpOp::Le,
                Some(Token::Gt) => CmpOp::Gt,
                Some(Token::Ge) => CmpOp::Ge,
                Some(Token::In) => CmpOp::In,
                Some(Token::Not) => {
                    // `not` mid-comparison only forms `not in`
                    if self.tokens.get(self.pos + 1) == Some(&Token::In) {
                        self.pos += 1;
                        CmpOp::NotIn
                    } else {
                        break;
                    }
                }
                _ => break,
            };
            self.pos += 1;
            let right = self.arith()?;
            rest.push((op, right));
        }

        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn arith(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&Token::Minus) {
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ExprError> {
        let mut value = self.primary()?;
        while self.eat(&Token::LBracket) {
            let index = self.or_expr()?;
            self.expect(Token::RBracket)?;
            value = Expr::Index {
                value: Box::new(value),
                index: Box::new(index),
            };
        }
        Ok(value)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        match self.advance() {
            Some(Token::Int(i)) => Ok(Expr::Int(i)),
            Some(Token::Float(f)) => Ok(Expr::Float(f)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::True) => Ok(Expr::Bool(true)),
            Some(Token::False) => Ok(Expr::Bool(false)),
            Some(Token::None) => Ok(Expr::None),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.call_args()?;
                    Ok(Expr::Call {
                        function: name,
                        args,
                    })
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            Some(Token::LParen) => self.paren_or_tuple(),
            Some(Token::LBracket) => {
                let items = self.expr_list(Token::RBracket)?;
                Ok(Expr::List(items))
            }
            Some(Token::LBrace) => self.set_or_dict(),
            other => Err(ExprError::Syntax(format!(
                "unexpected token {:?}",
                other
            ))),
        }
    }

    fn call_args(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.or_expr()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(Token::RParen)?;
            return Ok(args);
        }
    }

    fn paren_or_tuple(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&Token::RParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }
        let first = self.or_expr()?;
        if self.eat(&Token::RParen) {
            return Ok(first);
        }
        self.expect(Token::Comma)?;
        let mut items = vec![first];
        if self.eat(&Token::RParen) {
            return Ok(Expr::Tuple(items));
        }
        loop {
            items.push(self.or_expr()?);
            if self.eat(&Token::Comma) {
                if self.eat(&Token::RParen) {
                    return Ok(Expr::Tuple(items));
                }
                continue;
            }
            self.expect(Token::RParen)?;
            return Ok(Expr::Tuple(items));
        }
    }

    fn set_or_dict(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&Token::RBrace) {
            // {} is an empty dict, as rule authors expect
            return Ok(Expr::Dict(Vec::new()));
        }
        let first = self.or_expr()?;
        if self.eat(&Token::Colon) {
            let first_value = self.or_expr()?;
            let mut pairs = vec![(first, first_value)];
            while self.eat(&Token::Comma) {
                if self.peek() == Some(&Token::RBrace) {
                    break;
                }
                let key = self.or_expr()?;
                self.expect(Token::Colon)?;
                let value = self.or_expr()?;
                pairs.push((key, value));
            }
            self.expect(Token::RBrace)?;
            return Ok(Expr::Dict(pairs));
        }
        let mut items = vec![first];
        while self.eat(&Token::Comma) {
            if self.peek() == Some(&Token::RBrace) {
                break;
            }
            items.push(self.or_expr()?);
        }
        self.expect(Token::RBrace)?;
        Ok(Expr::Set(items))
    }

    fn expr_list(&mut self, close: Token) -> Result<Vec<Expr>, ExprError> {
        let mut items = Vec::new();
        if self.eat(&close) {
            return Ok(items);
        }
        loop {
            items.push(self.or_expr()?);
            if self.eat(&Token::Comma) {
                if self.eat(&close) {
                    return Ok(items);
                }
                continue;
            }
            self.expect(close)?;
            return Ok(items);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chained_comparison_shape() {
        let expr = parse("0 < x <= 4").unwrap();
        match expr {
            Expr::Compare { rest, .. } => assert_eq!(rest.len(), 2),
            other => panic!("expected comparison chain, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_and_over_or() {
        let expr = parse("a or b and c").unwrap();
        match expr {
            Expr::Logic { op: BoolOp::Or, right, .. } => {
                assert!(matches!(*right, Expr::Logic { op: BoolOp::And, .. }));
            }
            other => panic!("expected or at root, got {:?}", other),
        }
    }

    #[test]
    fn test_not_in() {
        let expr = parse("'Band_6' not in available_bands").unwrap();
        match expr {
            Expr::Compare { rest, .. } => assert_eq!(rest[0].0, CmpOp::NotIn),
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_compound_literals() {
        assert!(matches!(parse("[1, 2, 3]").unwrap(), Expr::List(_)));
        assert!(matches!(parse("(1, 2)").unwrap(), Expr::Tuple(_)));
        assert!(matches!(parse("{1, 2}").unwrap(), Expr::Set(_)));
        assert!(matches!(parse("{'a': 1}").unwrap(), Expr::Dict(_)));
        assert!(matches!(parse("{}").unwrap(), Expr::Dict(_)));
    }

    #[test]
    fn test_grouping_is_not_tuple() {
        assert!(matches!(parse("(1 + 2)").unwrap(), Expr::Binary { .. }));
        assert!(matches!(parse("(1,)").unwrap(), Expr::Tuple(_)));
    }

    #[test]
    fn test_call_and_index() {
        let expr = parse("len(x[0])").unwrap();
        match expr {
            Expr::Call { function, args } => {
                assert_eq!(function, "len");
                assert!(matches!(args[0], Expr::Index { .. }));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_input_rejected() {
        assert!(matches!(parse("1 2"), Err(ExprError::Syntax(_))));
    }
}
