use std::rc::Rc;

use super::cursor::Cursor;
use super::token::{Token, TokenKind};

pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    source_name: Rc<str>,
    current: Token,
    pushed_back: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, source_name: &str) -> Self {
        let source_name: Rc<str> = Rc::from(source_name);
        let current = Token::synthetic(TokenKind::Invalid, "<before first read>", &source_name);

        Lexer {
            cursor: Cursor::new(source),
            source_name,
            current,
            pushed_back: false,
        }
    }

    pub fn source_name(&self) -> &Rc<str> {
        &self.source_name
    }

    /// Returns the next token in source order.
    pub fn read_token(&mut self) -> Token {
        if self.pushed_back {
            self.pushed_back = false;
        } else {
            self.current = self.next_token();
        }
        self.current.clone()
    }

    /// Pushes the most recently read token back. One level only.
    pub fn unread_token(&mut self) {
        self.pushed_back = true;
    }

    fn next_token(&mut self) -> Token {
        loop {
            let ch = match self.cursor.take() {
                Some(ch) => ch,
                None => {
                    return self.mk_token(
                        TokenKind::EndOfFile,
                        "",
                        self.cursor.line(),
                        self.cursor.column(),
                    )
                }
            };

            if ch.is_whitespace() {
                continue;
            }

            let line = self.cursor.line();
            let column = self.cursor.column();

            let token = match ch {
                '(' => self.mk_token(TokenKind::LeftParen, "(", line, column),
                ')' => self.mk_token(TokenKind::RightParen, ")", line, column),
                '{' => self.mk_token(TokenKind::LeftBrace, "{", line, column),
                '}' => self.mk_token(TokenKind::RightBrace, "}", line, column),
                '[' => self.mk_token(TokenKind::LeftBracket, "[", line, column),
                ']' => self.mk_token(TokenKind::RightBracket, "]", line, column),
                '+' => self.mk_token(TokenKind::Plus, "+", line, column),
                '-' => self.mk_token(TokenKind::Minus, "-", line, column),
                '*' => self.mk_token(TokenKind::Asterisk, "*", line, column),
                '/' => self.mk_token(TokenKind::Slash, "/", line, column),
                ',' => self.mk_token(TokenKind::Comma, ",", line, column),
                ';' => self.mk_token(TokenKind::Semicolon, ";", line, column),
                ':' => self.mk_token(TokenKind::Colon, ":", line, column),

                '=' => {
                    if self.cursor.take_if('=') {
                        self.mk_token(TokenKind::DoubleEq, "==", line, column)
                    } else {
                        self.mk_token(TokenKind::Equals, "=", line, column)
                    }
                }
                '!' => {
                    if self.cursor.take_if('=') {
                        self.mk_token(TokenKind::BangEq, "!=", line, column)
                    } else {
                        self.mk_token(TokenKind::Bang, "!", line, column)
                    }
                }
                '<' => {
                    if self.cursor.take_if('=') {
                        self.mk_token(TokenKind::LeftAngleEq, "<=", line, column)
                    } else {
                        self.mk_token(TokenKind::LeftAngle, "<", line, column)
                    }
                }
                '>' => {
                    if self.cursor.take_if('=') {
                        self.mk_token(TokenKind::RightAngleEq, ">=", line, column)
                    } else {
                        self.mk_token(TokenKind::RightAngle, ">", line, column)
                    }
                }

                // A lone '&' or '|' is not part of the language.
                '&' => {
                    if self.cursor.take_if('&') {
                        self.mk_token(TokenKind::DoubleAmp, "&&", line, column)
                    } else {
                        self.mk_token(TokenKind::Invalid, "&", line, column)
                    }
                }
                '|' => {
                    if self.cursor.take_if('|') {
                        self.mk_token(TokenKind::DoublePipe, "||", line, column)
                    } else {
                        self.mk_token(TokenKind::Invalid, "|", line, column)
                    }
                }

                '"' => self.lex_string(line, column),
                '\'' => self.lex_rune(line, column),

                _ if ch.is_alphabetic() => self.lex_identifier_or_kw(ch, line, column),
                _ if ch.is_ascii_digit() => self.lex_number(ch, line, column),

                _ => self.mk_token(TokenKind::Invalid, ch.to_string(), line, column),
            };

            return token;
        }
    }

    fn mk_token(
        &self,
        kind: TokenKind,
        literal: impl Into<String>,
        line: u32,
        column: u32,
    ) -> Token {
        Token::new(kind, literal, line, column, &self.source_name)
    }

    fn lex_identifier_or_kw(&mut self, first: char, line: u32, column: u32) -> Token {
        let mut ident = String::from(first);

        while let Some(ch) = self.cursor.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.cursor.take();
            } else {
                break;
            }
        }

        let kind = match ident.as_str() {
            "let" => TokenKind::Let,
            "fn" => TokenKind::Function,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "return" => TokenKind::Return,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "nil" => TokenKind::Nil,
            "for" => TokenKind::For,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            _ => TokenKind::Identifier,
        };

        self.mk_token(kind, ident, line, column)
    }

    fn lex_number(&mut self, first: char, line: u32, column: u32) -> Token {
        let mut number = String::from(first);

        while let Some(ch) = self.cursor.peek() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.cursor.take();
            } else {
                break;
            }
        }

        self.mk_token(TokenKind::Int, number, line, column)
    }

    fn lex_string(&mut self, line: u32, column: u32) -> Token {
        match self.scan_quoted('"') {
            Ok(text) => self.mk_token(TokenKind::Str, text, line, column),
            Err(partial) => self.mk_token(TokenKind::Invalid, partial, line, column),
        }
    }

    /// A rune literal must hold exactly one code point between the quotes.
    fn lex_rune(&mut self, line: u32, column: u32) -> Token {
        match self.scan_quoted('\'') {
            Ok(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(_), None) => self.mk_token(TokenKind::Rune, text, line, column),
                    _ => self.mk_token(TokenKind::Invalid, text, line, column),
                }
            }
            Err(partial) => self.mk_token(TokenKind::Invalid, partial, line, column),
        }
    }

    /// Scans up to the closing delimiter on the same line. An unterminated
    /// literal yields Err with the opening delimiter and everything read so
    /// far, preserved for diagnostics.
    fn scan_quoted(&mut self, delimiter: char) -> Result<String, String> {
        let mut text = String::new();

        loop {
            match self.cursor.peek() {
                None => return Err(format!("{}{}", delimiter, text)),
                // The newline stays in the stream.
                Some('\n') => return Err(format!("{}{}", delimiter, text)),
                Some(ch) if ch == delimiter => {
                    self.cursor.take();
                    return Ok(text);
                }
                Some(ch) => {
                    text.push(ch);
                    self.cursor.take();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_literals(input: &str) -> Vec<(TokenKind, String)> {
        let mut lexer = Lexer::new(input, "test");
        let mut tokens = vec![];
        loop {
            let token = lexer.read_token();
            let done = token.kind == TokenKind::EndOfFile;
            tokens.push((token.kind, token.literal));
            if done {
                break;
            }
        }
        tokens
    }

    #[test]
    fn test_read_token() {
        let input = r#"let five = 5;
let add = fn(x, y) {
  x + y;
};
!-/*5;
5 < 10 > 5;
12 <= 46;
43 >= 17;
10 == 10;
10 != 9;
true && false || true;
"#;

        let expected = vec![
            (TokenKind::Let, "let"),
            (TokenKind::Identifier, "five"),
            (TokenKind::Equals, "="),
            (TokenKind::Int, "5"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Let, "let"),
            (TokenKind::Identifier, "add"),
            (TokenKind::Equals, "="),
            (TokenKind::Function, "fn"),
            (TokenKind::LeftParen, "("),
            (TokenKind::Identifier, "x"),
            (TokenKind::Comma, ","),
            (TokenKind::Identifier, "y"),
            (TokenKind::RightParen, ")"),
            (TokenKind::LeftBrace, "{"),
            (TokenKind::Identifier, "x"),
            (TokenKind::Plus, "+"),
            (TokenKind::Identifier, "y"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::RightBrace, "}"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Bang, "!"),
            (TokenKind::Minus, "-"),
            (TokenKind::Slash, "/"),
            (TokenKind::Asterisk, "*"),
            (TokenKind::Int, "5"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Int, "5"),
            (TokenKind::LeftAngle, "<"),
            (TokenKind::Int, "10"),
            (TokenKind::RightAngle, ">"),
            (TokenKind::Int, "5"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Int, "12"),
            (TokenKind::LeftAngleEq, "<="),
            (TokenKind::Int, "46"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Int, "43"),
            (TokenKind::RightAngleEq, ">="),
            (TokenKind::Int, "17"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Int, "10"),
            (TokenKind::DoubleEq, "=="),
            (TokenKind::Int, "10"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Int, "10"),
            (TokenKind::BangEq, "!="),
            (TokenKind::Int, "9"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::True, "true"),
            (TokenKind::DoubleAmp, "&&"),
            (TokenKind::False, "false"),
            (TokenKind::DoublePipe, "||"),
            (TokenKind::True, "true"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::EndOfFile, ""),
        ];

        let got = kinds_and_literals(input);
        assert_eq!(got.len(), expected.len());
        for (got, (kind, literal)) in got.iter().zip(expected) {
            assert_eq!(got, &(kind, literal.to_owned()));
        }
    }

    #[test]
    fn test_unicode_identifiers_and_strings() {
        let got = kinds_and_literals("let żółwik = \"zażółć gęślą jaźń\";");

        assert_eq!(
            got,
            vec![
                (TokenKind::Let, "let".to_owned()),
                (TokenKind::Identifier, "żółwik".to_owned()),
                (TokenKind::Equals, "=".to_owned()),
                (TokenKind::Str, "zażółć gęślą jaźń".to_owned()),
                (TokenKind::Semicolon, ";".to_owned()),
                (TokenKind::EndOfFile, "".to_owned()),
            ]
        );
    }

    #[test]
    fn test_keywords() {
        let got = kinds_and_literals("nil for break continue if else return");
        let kinds: Vec<TokenKind> = got.into_iter().map(|(kind, _)| kind).collect();

        assert_eq!(
            kinds,
            vec![
                TokenKind::Nil,
                TokenKind::For,
                TokenKind::Break,
                TokenKind::Continue,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::Return,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_rune_literals() {
        assert_eq!(
            kinds_and_literals("'a'")[0],
            (TokenKind::Rune, "a".to_owned())
        );
        assert_eq!(
            kinds_and_literals("'ó'")[0],
            (TokenKind::Rune, "ó".to_owned())
        );
        // Zero or many code points between the quotes is not a rune.
        assert_eq!(
            kinds_and_literals("''")[0],
            (TokenKind::Invalid, "".to_owned())
        );
        assert_eq!(
            kinds_and_literals("'ab'")[0],
            (TokenKind::Invalid, "ab".to_owned())
        );
    }

    #[test]
    fn test_unterminated_string() {
        let got = kinds_and_literals("\"abc\nlet");

        assert_eq!(got[0], (TokenKind::Invalid, "\"abc".to_owned()));
        // Lexing resumes on the next line.
        assert_eq!(got[1], (TokenKind::Let, "let".to_owned()));
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(
            kinds_and_literals("@")[0],
            (TokenKind::Invalid, "@".to_owned())
        );
        assert_eq!(
            kinds_and_literals("& 1")[0],
            (TokenKind::Invalid, "&".to_owned())
        );
    }

    #[test]
    fn test_positions() {
        let mut lexer = Lexer::new("let x;\n  żółw == 1;", "test");

        let expected = vec![
            ("let", 1, 1),
            ("x", 1, 5),
            (";", 1, 6),
            ("żółw", 2, 3),
            ("==", 2, 8),
            ("1", 2, 11),
            (";", 2, 12),
        ];

        for (literal, line, column) in expected {
            let token = lexer.read_token();
            assert_eq!(
                (token.literal.as_str(), token.line, token.column),
                (literal, line, column)
            );
        }
    }

    #[test]
    fn test_unread_token() {
        let mut lexer = Lexer::new("!-/*5;", "test");

        let expected = ["!", "-", "/", "*", "5", ";"];

        for literal in expected {
            let token = lexer.read_token();
            assert_eq!(token.literal, literal);
            lexer.unread_token();
            let again = lexer.read_token();
            assert_eq!(again, token);
        }
    }
}
