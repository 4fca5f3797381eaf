use std::rc::Rc;

use super::errors::{ParserError, ParserErrorKind, ParserResult};
use super::grammar::{Block, Expr, ExprType, FunctionDecl, Literal, Stmt, StmtType};
use super::lexer::Lexer;
use super::operator::PrefixOperator;
use super::parser_utils::{ParserOperator, Precedence};
use super::token::{Token, TokenKind};

pub struct Parser<'src> {
    lexer: Lexer<'src>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, source_name: &str) -> Self {
        Parser {
            lexer: Lexer::new(source, source_name),
        }
    }

    /// Peeks the next token without consuming it.
    fn peek(&mut self) -> Token {
        let token = self.lexer.read_token();
        self.lexer.unread_token();
        token
    }

    /// Consumes the next token.
    fn bump(&mut self) -> Token {
        self.lexer.read_token()
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> ParserResult<Token> {
        let token = self.bump();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(ParserError::wrong_token(expected, token))
        }
    }

    /// Consumes the next token and returns true if it matches the kind.
    fn check_consume(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.bump();
            return true;
        }
        false
    }

    /// Parses the whole program as an implicit block of statements, each
    /// terminated with a semicolon.
    pub fn parse(&mut self) -> ParserResult<Block> {
        let token = Token::synthetic(TokenKind::Block, "BLOCK", self.lexer.source_name());

        let mut stmts = vec![];
        while self.peek().kind != TokenKind::EndOfFile {
            stmts.push(self.parse_terminated_statement()?);
        }

        Ok(Block {
            implicit: true,
            stmts,
            token,
        })
    }

    fn parse_terminated_statement(&mut self) -> ParserResult<Stmt> {
        let stmt = self.parse_statement()?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(stmt)
    }

    fn parse_statement(&mut self) -> ParserResult<Stmt> {
        let token = self.peek();

        match token.kind {
            TokenKind::Let => {
                self.bump();
                let expr = self.parse_expression(Precedence::Lowest)?;
                Self::check_let_binding(&expr)?;
                Ok(Stmt::new(StmtType::Let(expr), token))
            }
            TokenKind::Return => {
                self.bump();
                let expr = self.parse_expression(Precedence::Lowest)?;
                Ok(Stmt::new(StmtType::Return(expr), token))
            }
            TokenKind::Break => {
                self.bump();
                Ok(Stmt::new(StmtType::Break, token))
            }
            TokenKind::Continue => {
                self.bump();
                Ok(Stmt::new(StmtType::Continue, token))
            }
            _ => {
                let expr = self.parse_expression(Precedence::Lowest)?;
                let token = expr.token.clone();
                Ok(Stmt::new(StmtType::Expression(expr), token))
            }
        }
    }

    /// A let binding must wrap an assignment whose target is an identifier.
    fn check_let_binding(expr: &Expr) -> ParserResult<()> {
        if let ExprType::Assignment(lhs, _) = &expr.expr {
            if matches!(lhs.expr, ExprType::Variable(_)) {
                return Ok(());
            }
        }
        Err(ParserError::new(
            expr.token.clone(),
            ParserErrorKind::BadLetBinding,
        ))
    }

    /// Pratt parsing core: one prefix parse, then fold infix operators while
    /// their precedence beats the minimum.
    pub fn parse_expression(&mut self, min_precedence: Precedence) -> ParserResult<Expr> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let token = self.peek();
            if token.kind == TokenKind::Semicolon {
                break;
            }

            // Tokens with no operator role never outrank min_precedence, so
            // the loop stops here without consuming them; the construct
            // that opened a `)`, `]` or `}` consumes its own terminator.
            let op = match ParserOperator::from_token(&token) {
                Some(op) => op,
                None => break,
            };
            if !op.is_higher_precedence(min_precedence) {
                break;
            }

            lhs = self.parse_infix(op, lhs)?;
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> ParserResult<Expr> {
        let token = self.peek();

        match token.kind {
            TokenKind::Int => self.parse_int(),
            TokenKind::Str => {
                let token = self.bump();
                let literal = Literal::Str(token.literal.clone());
                Ok(Expr::new(ExprType::Literal(literal), token))
            }
            TokenKind::Rune => self.parse_rune(),
            TokenKind::Identifier => {
                let token = self.bump();
                let name = token.literal.clone();
                Ok(Expr::new(ExprType::Variable(name), token))
            }
            TokenKind::True | TokenKind::False => {
                let token = self.bump();
                let literal = Literal::Bool(token.kind == TokenKind::True);
                Ok(Expr::new(ExprType::Literal(literal), token))
            }
            TokenKind::Nil => {
                let token = self.bump();
                Ok(Expr::new(ExprType::Literal(Literal::Nil), token))
            }
            TokenKind::Bang => self.parse_prefix_operator(PrefixOperator::LogicalNot),
            TokenKind::Minus => self.parse_prefix_operator(PrefixOperator::Negate),
            TokenKind::LeftParen => {
                self.bump();
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.expect(TokenKind::RightParen, "')'")?;
                Ok(expr)
            }
            TokenKind::If => self.parse_conditional(),
            TokenKind::Function => self.parse_function_literal(),
            TokenKind::For => self.parse_loop(),
            TokenKind::LeftBrace => self.parse_array_literal(),
            _ => Err(ParserError::unexpected_token(self.bump())),
        }
    }

    fn parse_int(&mut self) -> ParserResult<Expr> {
        let token = self.bump();

        // Covers literals outside the 64-bit range.
        let value: i64 = token
            .literal
            .parse()
            .map_err(|_| ParserError::new(token.clone(), ParserErrorKind::BadIntegerLiteral))?;

        Ok(Expr::new(ExprType::Literal(Literal::Int(value)), token))
    }

    fn parse_rune(&mut self) -> ParserResult<Expr> {
        let token = self.bump();

        // The lexer only emits rune tokens for a single code point.
        let value = token
            .literal
            .chars()
            .next()
            .ok_or_else(|| ParserError::unexpected_token(token.clone()))?;

        Ok(Expr::new(ExprType::Literal(Literal::Rune(value)), token))
    }

    fn parse_prefix_operator(&mut self, op: PrefixOperator) -> ParserResult<Expr> {
        let token = self.bump();
        let operand = self.parse_expression(Precedence::Unary)?;
        Ok(Expr::new(ExprType::Prefix(op, Box::new(operand)), token))
    }

    fn parse_conditional(&mut self) -> ParserResult<Expr> {
        let token = self.bump();

        self.expect(TokenKind::LeftParen, "'('")?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::RightParen, "')'")?;

        let consequent = self.parse_braced_block(false)?;
        let alternative = if self.check_consume(TokenKind::Else) {
            Some(self.parse_braced_block(false)?)
        } else {
            None
        };

        Ok(Expr::new(
            ExprType::Conditional {
                condition: Box::new(condition),
                consequent,
                alternative,
            },
            token,
        ))
    }

    fn parse_function_literal(&mut self) -> ParserResult<Expr> {
        let token = self.bump();

        self.expect(TokenKind::LeftParen, "'('")?;
        let mut params = vec![];
        if !self.check_consume(TokenKind::RightParen) {
            loop {
                let param = self.expect(TokenKind::Identifier, "identifier")?;
                params.push(param.literal);
                if self.check_consume(TokenKind::RightParen) {
                    break;
                }
                self.expect(TokenKind::Comma, "','")?;
            }
        }

        let body = self.parse_braced_block(false)?;

        Ok(Expr::new(
            ExprType::FunctionLiteral(Rc::new(FunctionDecl { params, body })),
            token,
        ))
    }

    /// `for ( init? ; condition ; step? ) { ... }`. The body block is
    /// implicit; the loop provides its scope.
    fn parse_loop(&mut self) -> ParserResult<Expr> {
        let token = self.bump();

        self.expect(TokenKind::LeftParen, "'('")?;

        let init = if self.peek().kind == TokenKind::Semicolon {
            None
        } else {
            Some(Box::new(self.parse_statement()?))
        };
        self.expect(TokenKind::Semicolon, "';'")?;

        let condition = Box::new(self.parse_expression(Precedence::Lowest)?);
        self.expect(TokenKind::Semicolon, "';'")?;

        let step = if self.peek().kind == TokenKind::RightParen {
            None
        } else {
            Some(Box::new(self.parse_expression(Precedence::Lowest)?))
        };
        self.expect(TokenKind::RightParen, "')'")?;

        let body = self.parse_braced_block(true)?;

        Ok(Expr::new(
            ExprType::Loop {
                init,
                condition,
                step,
                body,
            },
            token,
        ))
    }

    fn parse_array_literal(&mut self) -> ParserResult<Expr> {
        let token = self.bump();

        let mut elements = vec![];
        if !self.check_consume(TokenKind::RightBrace) {
            loop {
                elements.push(self.parse_expression(Precedence::Lowest)?);
                if self.check_consume(TokenKind::RightBrace) {
                    break;
                }
                self.expect(TokenKind::Comma, "','")?;
            }
        }

        Ok(Expr::new(ExprType::ArrayLiteral(elements), token))
    }

    fn parse_braced_block(&mut self, implicit: bool) -> ParserResult<Block> {
        let token = self.expect(TokenKind::LeftBrace, "'{'")?;

        let mut stmts = vec![];
        loop {
            let next = self.peek();
            match next.kind {
                TokenKind::RightBrace => {
                    self.bump();
                    break;
                }
                TokenKind::EndOfFile => {
                    return Err(ParserError::wrong_token("'}'", next));
                }
                _ => stmts.push(self.parse_terminated_statement()?),
            }
        }

        Ok(Block {
            implicit,
            stmts,
            token,
        })
    }

    fn parse_infix(&mut self, op: ParserOperator, lhs: Expr) -> ParserResult<Expr> {
        match op {
            ParserOperator::Infix(infix_op) => {
                let token = self.bump();
                let rhs = self.parse_expression(op.precedence())?;
                Ok(Expr::new(
                    ExprType::Infix(infix_op, Box::new(lhs), Box::new(rhs)),
                    token,
                ))
            }
            ParserOperator::Assignment => {
                let token = self.bump();
                if !matches!(lhs.expr, ExprType::Variable(_) | ExprType::Index { .. }) {
                    return Err(ParserError::new(token, ParserErrorKind::ExpectedLValue));
                }
                let rhs = self.parse_expression(op.precedence())?;
                Ok(Expr::new(
                    ExprType::Assignment(Box::new(lhs), Box::new(rhs)),
                    token,
                ))
            }
            ParserOperator::Call => {
                let token = self.bump();
                let mut args = vec![];
                if !self.check_consume(TokenKind::RightParen) {
                    loop {
                        args.push(self.parse_expression(Precedence::Lowest)?);
                        if self.check_consume(TokenKind::RightParen) {
                            break;
                        }
                        self.expect(TokenKind::Comma, "','")?;
                    }
                }
                Ok(Expr::new(
                    ExprType::Call {
                        callee: Box::new(lhs),
                        args,
                    },
                    token,
                ))
            }
            ParserOperator::Index => {
                let token = self.bump();
                let start = Box::new(self.parse_expression(Precedence::Lowest)?);
                let end = if self.check_consume(TokenKind::Colon) {
                    Some(Box::new(self.parse_expression(Precedence::Lowest)?))
                } else {
                    None
                };
                self.expect(TokenKind::RightBracket, "']'")?;
                Ok(Expr::new(
                    ExprType::Index {
                        subject: Box::new(lhs),
                        start,
                        end,
                    },
                    token,
                ))
            }
        }
    }
}
