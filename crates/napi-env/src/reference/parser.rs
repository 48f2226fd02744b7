//! Recursive descent parser with precedence climbing for binary operators.

use std::rc::Rc;

use super::ast::{
    AssignOp, BinaryOp, Expr, FunctionDef, LogicalOp, MemberKey, Program, Stmt, UnaryOp, VarKind,
};
use super::lexer::{Lexer, SyntaxError, Token, TokenKind};

const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "default", "delete", "do", "else",
    "false", "finally", "for", "function", "if", "in", "instanceof", "let", "new", "null",
    "return", "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while",
];

/// Parse a complete script.
pub(crate) fn parse_program(source: &str) -> Result<Program, SyntaxError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser { tokens, pos: 0 };
    let mut body = Vec::new();
    while !parser.is_at_end() {
        body.push(parser.parse_statement()?);
    }
    Ok(Program { body })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

enum BinaryKind {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

impl Parser {
    // ============ STATEMENTS ============

    fn parse_statement(&mut self) -> Result<Stmt, SyntaxError> {
        if self.check_punct("{") {
            return Ok(Stmt::Block(self.parse_block()?));
        }
        if self.match_punct(";") {
            return Ok(Stmt::Empty);
        }
        let keyword = match &self.current().kind {
            TokenKind::Ident(name) => name.clone(),
            _ => return self.parse_expression_statement(),
        };
        match keyword.as_str() {
            "var" | "let" | "const" => {
                let stmt = self.parse_variable_declaration()?;
                self.consume_semicolon()?;
                Ok(stmt)
            }
            "function" => {
                self.advance();
                let def = self.parse_function_rest(true)?;
                Ok(Stmt::Function(def))
            }
            "return" => {
                self.advance();
                let argument = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume_semicolon()?;
                Ok(Stmt::Return(argument))
            }
            "if" => self.parse_if_statement(),
            "while" => {
                self.advance();
                self.expect_punct("(")?;
                let test = self.parse_expression()?;
                self.expect_punct(")")?;
                let body = Box::new(self.parse_statement()?);
                Ok(Stmt::While { test, body })
            }
            "break" => {
                self.advance();
                self.consume_semicolon()?;
                Ok(Stmt::Break)
            }
            "continue" => {
                self.advance();
                self.consume_semicolon()?;
                Ok(Stmt::Continue)
            }
            "throw" => {
                self.advance();
                if self.current().newline_before {
                    return Err(self.error("Illegal newline after throw"));
                }
                let argument = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Stmt::Throw(argument))
            }
            "try" => self.parse_try_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let expr = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Stmt::Expr(expr))
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        self.expect_punct("{")?;
        let mut body = Vec::new();
        while !self.check_punct("}") {
            if self.is_at_end() {
                return Err(self.error("Unexpected end of input"));
            }
            body.push(self.parse_statement()?);
        }
        self.advance();
        Ok(body)
    }

    fn parse_variable_declaration(&mut self) -> Result<Stmt, SyntaxError> {
        let kind = match self.advance().kind {
            TokenKind::Ident(name) if name == "let" => VarKind::Let,
            TokenKind::Ident(name) if name == "const" => VarKind::Const,
            _ => VarKind::Var,
        };
        let mut decls = Vec::new();
        loop {
            let name = self.expect_binding_name()?;
            let init = if self.match_punct("=") {
                Some(self.parse_assignment()?)
            } else if kind == VarKind::Const {
                return Err(self.error("Missing initializer in const declaration"));
            } else {
                None
            };
            decls.push((name, init));
            if !self.match_punct(",") {
                break;
            }
        }
        Ok(Stmt::Var { kind, decls })
    }

    fn parse_if_statement(&mut self) -> Result<Stmt, SyntaxError> {
        self.advance();
        self.expect_punct("(")?;
        let test = self.parse_expression()?;
        self.expect_punct(")")?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.match_keyword("else") {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            test,
            consequent,
            alternate,
        })
    }

    fn parse_try_statement(&mut self) -> Result<Stmt, SyntaxError> {
        self.advance();
        let block = self.parse_block()?;
        let mut param = None;
        let mut handler = None;
        if self.match_keyword("catch") {
            if self.match_punct("(") {
                param = Some(self.expect_binding_name()?);
                self.expect_punct(")")?;
            }
            handler = Some(self.parse_block()?);
        }
        let finalizer = if self.match_keyword("finally") {
            Some(self.parse_block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }
        Ok(Stmt::Try {
            block,
            param,
            handler,
            finalizer,
        })
    }

    /// Parses `name? (params) { body }` after the `function` keyword.
    fn parse_function_rest(&mut self, require_name: bool) -> Result<Rc<FunctionDef>, SyntaxError> {
        let name = if matches!(self.current().kind, TokenKind::Ident(_)) {
            Some(self.expect_binding_name()?)
        } else if require_name {
            return Err(self.error("Function statements require a function name"));
        } else {
            None
        };
        self.parse_function_tail(name)
    }

    fn parse_function_tail(&mut self, name: Option<String>) -> Result<Rc<FunctionDef>, SyntaxError> {
        self.expect_punct("(")?;
        let mut params = Vec::new();
        while !self.check_punct(")") {
            params.push(self.expect_binding_name()?);
            if !self.match_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        let body = self.parse_block()?;
        Ok(Rc::new(FunctionDef { name, params, body }))
    }

    // ============ EXPRESSIONS ============

    fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_assignment()?;
        if !self.check_punct(",") {
            return Ok(first);
        }
        let mut exprs = vec![first];
        while self.match_punct(",") {
            exprs.push(self.parse_assignment()?);
        }
        Ok(Expr::Sequence(exprs))
    }

    fn parse_assignment(&mut self) -> Result<Expr, SyntaxError> {
        let target = self.parse_conditional()?;
        let op = match self.current().kind {
            TokenKind::Punct("=") => AssignOp::Assign,
            TokenKind::Punct("+=") => AssignOp::AddAssign,
            TokenKind::Punct("-=") => AssignOp::SubAssign,
            _ => return Ok(target),
        };
        if !matches!(target, Expr::Ident(_) | Expr::Member(..)) {
            return Err(self.error("Invalid left-hand side in assignment"));
        }
        self.advance();
        let value = self.parse_assignment()?;
        Ok(Expr::Assign(op, Box::new(target), Box::new(value)))
    }

    fn parse_conditional(&mut self) -> Result<Expr, SyntaxError> {
        let test = self.parse_binary(0)?;
        if !self.match_punct("?") {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect_punct(":")?;
        let alternate = self.parse_assignment()?;
        Ok(Expr::Conditional(
            Box::new(test),
            Box::new(consequent),
            Box::new(alternate),
        ))
    }

    fn current_binary_op(&self) -> Option<(BinaryKind, u8)> {
        let op = match &self.current().kind {
            TokenKind::Punct(p) => match *p {
                "||" => (BinaryKind::Logical(LogicalOp::Or), 1),
                "&&" => (BinaryKind::Logical(LogicalOp::And), 2),
                "==" => (BinaryKind::Binary(BinaryOp::Eq), 3),
                "!=" => (BinaryKind::Binary(BinaryOp::NotEq), 3),
                "===" => (BinaryKind::Binary(BinaryOp::StrictEq), 3),
                "!==" => (BinaryKind::Binary(BinaryOp::StrictNotEq), 3),
                "<" => (BinaryKind::Binary(BinaryOp::Lt), 4),
                ">" => (BinaryKind::Binary(BinaryOp::Gt), 4),
                "<=" => (BinaryKind::Binary(BinaryOp::LtEq), 4),
                ">=" => (BinaryKind::Binary(BinaryOp::GtEq), 4),
                "+" => (BinaryKind::Binary(BinaryOp::Add), 5),
                "-" => (BinaryKind::Binary(BinaryOp::Sub), 5),
                "*" => (BinaryKind::Binary(BinaryOp::Mul), 6),
                "/" => (BinaryKind::Binary(BinaryOp::Div), 6),
                "%" => (BinaryKind::Binary(BinaryOp::Mod), 6),
                _ => return None,
            },
            TokenKind::Ident(name) if name == "instanceof" => {
                (BinaryKind::Binary(BinaryOp::Instanceof), 4)
            }
            TokenKind::Ident(name) if name == "in" => (BinaryKind::Binary(BinaryOp::In), 4),
            _ => return None,
        };
        Some(op)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary()?;
        while let Some((kind, prec)) = self.current_binary_op() {
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary(prec + 1)?;
            left = match kind {
                BinaryKind::Binary(op) => Expr::Binary(op, Box::new(left), Box::new(right)),
                BinaryKind::Logical(op) => Expr::Logical(op, Box::new(left), Box::new(right)),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = match &self.current().kind {
            TokenKind::Punct("!") => Some(UnaryOp::Not),
            TokenKind::Punct("-") => Some(UnaryOp::Neg),
            TokenKind::Punct("+") => Some(UnaryOp::Plus),
            TokenKind::Ident(name) if name == "typeof" => Some(UnaryOp::Typeof),
            TokenKind::Ident(name) if name == "void" => Some(UnaryOp::Void),
            _ => None,
        };
        match op {
            Some(op) => {
                self.advance();
                let argument = self.parse_unary()?;
                Ok(Expr::Unary(op, Box::new(argument)))
            }
            None => self.parse_left_hand_side(),
        }
    }

    fn parse_left_hand_side(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = if self.check_keyword("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            if self.check_punct("(") {
                let args = self.parse_arguments()?;
                expr = Expr::Call(Box::new(expr), args);
            } else if let Some(key) = self.parse_member_key()? {
                expr = Expr::Member(Box::new(expr), key);
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_new(&mut self) -> Result<Expr, SyntaxError> {
        self.advance();
        let mut callee = if self.check_keyword("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        while let Some(key) = self.parse_member_key()? {
            callee = Expr::Member(Box::new(callee), key);
        }
        let args = if self.check_punct("(") {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expr::New(Box::new(callee), args))
    }

    /// `.name` or `[expr]`.
    fn parse_member_key(&mut self) -> Result<Option<MemberKey>, SyntaxError> {
        if self.match_punct(".") {
            return match self.advance().kind {
                TokenKind::Ident(name) => Ok(Some(MemberKey::Named(name))),
                _ => Err(self.error("Unexpected token after '.'")),
            };
        }
        if self.match_punct("[") {
            let key = self.parse_expression()?;
            self.expect_punct("]")?;
            return Ok(Some(MemberKey::Computed(Box::new(key))));
        }
        Ok(None)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        self.expect_punct("(")?;
        let mut args = Vec::new();
        while !self.check_punct(")") {
            args.push(self.parse_assignment()?);
            if !self.match_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let Token {
            kind, line, column, ..
        } = self.advance();
        match kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::Str(s) => Ok(Expr::Str(s)),
            TokenKind::Punct("(") => {
                let expr = self.parse_expression()?;
                self.expect_punct(")")?;
                Ok(expr)
            }
            TokenKind::Punct("[") => self.parse_array_literal(),
            TokenKind::Punct("{") => self.parse_object_literal(),
            TokenKind::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "null" => Ok(Expr::Null),
                "this" => Ok(Expr::This),
                "function" => Ok(Expr::Function(self.parse_function_rest(false)?)),
                _ if RESERVED.contains(&name.as_str()) => Err(SyntaxError {
                    message: format!("Unexpected token '{name}'"),
                    line,
                    column,
                }),
                _ => Ok(Expr::Ident(name)),
            },
            TokenKind::Punct(p) => Err(SyntaxError {
                message: format!("Unexpected token '{p}'"),
                line,
                column,
            }),
            TokenKind::Eof => Err(SyntaxError {
                message: "Unexpected end of input".to_string(),
                line,
                column,
            }),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expr, SyntaxError> {
        let mut elements = Vec::new();
        while !self.check_punct("]") {
            elements.push(self.parse_assignment()?);
            if !self.match_punct(",") {
                break;
            }
        }
        self.expect_punct("]")?;
        Ok(Expr::Array(elements))
    }

    fn parse_object_literal(&mut self) -> Result<Expr, SyntaxError> {
        let mut props = Vec::new();
        while !self.check_punct("}") {
            let Token {
                kind, line, column, ..
            } = self.advance();
            let key = match kind {
                TokenKind::Ident(name) => MemberKey::Named(name),
                TokenKind::Str(s) => MemberKey::Named(s),
                TokenKind::Number(n) => MemberKey::Named(super::value::number_to_string(n)),
                TokenKind::Punct("[") => {
                    let key = self.parse_assignment()?;
                    self.expect_punct("]")?;
                    MemberKey::Computed(Box::new(key))
                }
                _ => {
                    return Err(SyntaxError {
                        message: "Unexpected token in object literal".to_string(),
                        line,
                        column,
                    });
                }
            };
            let value = if self.match_punct(":") {
                self.parse_assignment()?
            } else if self.check_punct("(") {
                let name = match &key {
                    MemberKey::Named(name) => Some(name.clone()),
                    MemberKey::Computed(_) => None,
                };
                Expr::Function(self.parse_function_tail(name)?)
            } else {
                match &key {
                    MemberKey::Named(name) => Expr::Ident(name.clone()),
                    MemberKey::Computed(_) => return Err(self.error("Expected ':'")),
                }
            };
            props.push((key, value));
            if !self.match_punct(",") {
                break;
            }
        }
        self.expect_punct("}")?;
        Ok(Expr::Object(props))
    }

    // ============ HELPERS ============

    fn current(&self) -> &Token {
        // `tokenize` always ends with Eof and we never advance past it.
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn check_punct(&self, punct: &str) -> bool {
        matches!(&self.current().kind, TokenKind::Punct(p) if *p == punct)
    }

    fn match_punct(&mut self, punct: &str) -> bool {
        if self.check_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: &str) -> Result<(), SyntaxError> {
        if self.match_punct(punct) {
            Ok(())
        } else {
            Err(self.error(format!("Expected '{punct}'")))
        }
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(&self.current().kind, TokenKind::Ident(name) if name == keyword)
    }

    fn match_keyword(&mut self, keyword: &str) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_binding_name(&mut self) -> Result<String, SyntaxError> {
        match &self.current().kind {
            TokenKind::Ident(name) if !RESERVED.contains(&name.as_str()) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error("Expected identifier")),
        }
    }

    fn at_statement_end(&self) -> bool {
        self.check_punct(";")
            || self.check_punct("}")
            || self.is_at_end()
            || self.current().newline_before
    }

    /// Automatic semicolon insertion: `;`, `}`, end of input or a line break.
    fn consume_semicolon(&mut self) -> Result<(), SyntaxError> {
        if self.match_punct(";") {
            return Ok(());
        }
        if self.check_punct("}") || self.is_at_end() || self.current().newline_before {
            return Ok(());
        }
        Err(self.error("Unexpected token, expected ';'"))
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        self.error_at(self.current(), message)
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            line: token.line,
            column: token.column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        let program = parse_program("1 + 2 * 3").unwrap();
        match &program.body[0] {
            Stmt::Expr(Expr::Binary(BinaryOp::Add, left, right)) => {
                assert!(matches!(**left, Expr::Number(n) if n == 1.0));
                assert!(matches!(**right, Expr::Binary(BinaryOp::Mul, _, _)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_statements() {
        let program = parse_program(
            "var a = 1, b; function f(x, y) { if (x) { return y } else return 0 }\n\
             try { throw new Error('x') } catch (e) { a = e } finally { b = 2 }\n\
             while (a < 3) a += 1",
        )
        .unwrap();
        assert_eq!(program.body.len(), 4);
        assert!(matches!(&program.body[1], Stmt::Function(def) if def.params.len() == 2));
        assert!(matches!(&program.body[2], Stmt::Try { param: Some(p), .. } if p == "e"));
    }

    #[test]
    fn test_member_call_and_new() {
        let program = parse_program("new Proxy(t, h).x['y'](1)").unwrap();
        match &program.body[0] {
            Stmt::Expr(Expr::Call(callee, args)) => {
                assert_eq!(args.len(), 1);
                assert!(matches!(**callee, Expr::Member(_, MemberKey::Computed(_))));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_object_literal_forms() {
        let program = parse_program("({a: 1, 'b': 2, 3: 4, [k]: 5, c, m() { return 1 }})").unwrap();
        match &program.body[0] {
            Stmt::Expr(Expr::Object(props)) => assert_eq!(props.len(), 6),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse_program("var = 1").is_err());
        assert!(parse_program("1 +").is_err());
        assert!(parse_program("a b").is_err());
        let err = parse_program("{").unwrap_err();
        assert_eq!(err.message, "Unexpected end of input");
    }
}
