//! Single-pass, state-machine lexer (spec.md §4.2).
//!
//! The state names from the spec map onto this implementation as follows:
//! `Default` is the top of [`Lexer::next_token`]'s match; `Identifier` and
//! `Number` are [`Lexer::scan_identifier`] and [`Lexer::scan_number`];
//! `String` is [`Lexer::scan_string`]; `LineComment`/`BlockComment` are
//! [`Lexer::skip_line_comment`]/[`Lexer::skip_block_comment`];
//! `SectionHeader` is [`Lexer::scan_section_header`]; `Reference` is the
//! `@`/`${` handling inline in `next_token` (a macro/cross/env reference is
//! never more than a two-character lookahead from `Default`, so it doesn't
//! need its own sub-scanner the way a multi-character literal does).

use std::sync::Arc;

use camino::Utf8PathBuf;

use crate::error::{Error, ErrorSite, Result};
use crate::position::{LineIndex, Position};
use crate::token::{Token, TokenKind};

pub struct Lexer<'t> {
    chars: Vec<char>,
    pos: usize,
    file: Arc<Utf8PathBuf>,
    line_index: &'t LineIndex,
}

impl<'t> Lexer<'t> {
    pub fn new(text: &str, file: Arc<Utf8PathBuf>, line_index: &'t LineIndex) -> Self {
        Lexer {
            chars: text.chars().collect(),
            pos: 0,
            file,
            line_index,
        }
    }

    /// Tokenizes the whole input, always ending with a single `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn position_at(&self, byte_offset: u32) -> Position {
        let (line, column) = self.line_index.line_column(byte_offset);
        Position::new(self.file.clone(), line, column, byte_offset)
    }

    /// Byte offset of the current read cursor, computed from the char
    /// position (the lexer scans `char`s, but positions are reported in
    /// bytes as spec.md §3 requires).
    fn byte_offset(&self) -> u32 {
        self.chars[..self.pos].iter().map(|c| c.len_utf8()).sum::<usize>() as u32
    }

    fn current_position(&self) -> Position {
        self.position_at(self.byte_offset())
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_insignificant_whitespace();

        let start = self.current_position();
        let Some(ch) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, "", start));
        };

        match ch {
            '\n' => {
                self.advance();
                Ok(Token::new(TokenKind::Newline, "\n", start))
            }
            '/' if self.peek_at(1) == Some('/') => {
                self.skip_line_comment();
                self.next_token()
            }
            '/' if self.peek_at(1) == Some('*') => {
                self.skip_block_comment(start)?;
                self.next_token()
            }
            '[' => {
                self.advance();
                Ok(Token::new(TokenKind::SectionOpen, "[", start))
            }
            ']' => {
                self.advance();
                Ok(Token::new(TokenKind::SectionClose, "]", start))
            }
            '(' => {
                self.advance();
                Ok(Token::new(TokenKind::LParen, "(", start))
            }
            ')' => {
                self.advance();
                Ok(Token::new(TokenKind::RParen, ")", start))
            }
            '{' => {
                self.advance();
                Ok(Token::new(TokenKind::LBrace, "{", start))
            }
            '}' => {
                self.advance();
                Ok(Token::new(TokenKind::RBrace, "}", start))
            }
            ',' => {
                self.advance();
                Ok(Token::new(TokenKind::Comma, ",", start))
            }
            ':' => {
                self.advance();
                Ok(Token::new(TokenKind::Colon, ":", start))
            }
            '.' if !self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.advance();
                Ok(Token::new(TokenKind::Dot, ".", start))
            }
            '+' if self.peek_at(1) == Some('=') => {
                self.advance();
                self.advance();
                Ok(Token::new(TokenKind::PlusEquals, "+=", start))
            }
            '+' => {
                self.advance();
                Ok(Token::new(TokenKind::Plus, "+", start))
            }
            '-' => {
                self.advance();
                Ok(Token::new(TokenKind::Minus, "-", start))
            }
            '*' => {
                self.advance();
                Ok(Token::new(TokenKind::Star, "*", start))
            }
            '/' => {
                self.advance();
                Ok(Token::new(TokenKind::Slash, "/", start))
            }
            '%' => {
                self.advance();
                Ok(Token::new(TokenKind::Percent, "%", start))
            }
            '=' => {
                self.advance();
                Ok(Token::new(TokenKind::Equals, "=", start))
            }
            '!' => {
                self.advance();
                Ok(Token::new(TokenKind::Bang, "!", start))
            }
            '~' => {
                self.advance();
                Ok(Token::new(TokenKind::Tilde, "~", start))
            }
            '@' if self.peek_at(1) == Some('{') => {
                self.advance();
                self.advance();
                Ok(Token::new(TokenKind::AtBrace, "@{", start))
            }
            '@' => {
                self.advance();
                Ok(Token::new(TokenKind::At, "@", start))
            }
            '$' if self.peek_at(1) == Some('{') => {
                self.advance();
                self.advance();
                Ok(Token::new(TokenKind::DollarBrace, "${", start))
            }
            '#' if self.peek_at(1).is_some_and(|c| c.is_ascii_hexdigit()) && self.looks_like_hex_color() => {
                self.scan_hex_color(start)
            }
            '#' => {
                self.advance();
                Ok(Token::new(TokenKind::Hash, "#", start))
            }
            '"' => self.scan_string(start),
            c if c == '_' || c.is_alphabetic() => Ok(self.scan_identifier(start)),
            c if c.is_ascii_digit() => self.scan_number(start),
            other => Err(Error::UnexpectedChar(ErrorSite::named(
                start,
                other.to_string(),
            ))),
        }
    }

    /// Spaces and tabs are insignificant; newlines are returned as tokens
    /// since they terminate statements (spec.md §4.3 grammar).
    fn skip_insignificant_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t') | Some('\r')) {
            self.advance();
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self, start: Position) -> Result<()> {
        self.advance(); // '/'
        self.advance(); // '*'
        loop {
            match self.peek() {
                None => return Err(Error::UnterminatedBlockComment(ErrorSite::at(start))),
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return Ok(());
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn scan_identifier(&mut self, start: Position) -> Token {
        let mut lexeme = String::new();
        while let Some(c) = self.peek() {
            if c == '_' || c.is_alphanumeric() {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }
        match lexeme.as_str() {
            "true" => Token::new(TokenKind::Boolean(true), lexeme, start),
            "false" => Token::new(TokenKind::Boolean(false), lexeme, start),
            _ => Token::new(TokenKind::Identifier, lexeme, start),
        }
    }

    fn scan_number(&mut self, start: Position) -> Result<Token> {
        let mut lexeme = String::new();
        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                lexeme.push(c);
                self.advance();
            } else if c == '.' && !is_float && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if is_float {
            let value: f64 = lexeme
                .parse()
                .map_err(|_| Error::UnexpectedChar(ErrorSite::named(start.clone(), lexeme.clone())))?;
            Ok(Token::new(TokenKind::Float(value), lexeme, start))
        } else {
            let value: i64 = lexeme
                .parse()
                .map_err(|_| Error::UnexpectedChar(ErrorSite::named(start.clone(), lexeme.clone())))?;
            Ok(Token::new(TokenKind::Integer(value), lexeme, start))
        }
    }

    fn scan_string(&mut self, start: Position) -> Result<Token> {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.advance() {
                None | Some('\n') => return Err(Error::UnterminatedString(ErrorSite::at(start))),
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(other) => {
                        return Err(Error::UnexpectedChar(ErrorSite::named(
                            start,
                            format!("\\{other}"),
                        )))
                    }
                    None => return Err(Error::UnterminatedString(ErrorSite::at(start))),
                },
                Some(c) => value.push(c),
            }
        }
        Ok(Token::new(TokenKind::String(value.clone()), value, start))
    }

    /// `#RRGGBB`, digits matched case-insensitively (`DESIGN.md` Open
    /// Question (a)).
    fn looks_like_hex_color(&self) -> bool {
        (1..=6).all(|i| self.peek_at(i).is_some_and(|c| c.is_ascii_hexdigit()))
            && !self.peek_at(7).is_some_and(|c| c.is_ascii_hexdigit())
    }

    fn scan_hex_color(&mut self, start: Position) -> Result<Token> {
        self.advance(); // '#'
        let mut digits = String::new();
        for _ in 0..6 {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    digits.push(c);
                    self.advance();
                }
                _ => {
                    return Err(Error::UnexpectedChar(ErrorSite::named(
                        start,
                        format!("#{digits}"),
                    )))
                }
            }
        }
        Ok(Token::new(
            TokenKind::HexColor(digits.clone()),
            format!("#{digits}"),
            start,
        ))
    }
}

/// Scans a `[...]` section/directive header, returning the inner name
/// (`#define`, `#include`, `#schema`, `#end_schema`, or a plain section
/// name) as a single token positioned at the opening `[`.
pub fn scan_section_name(tokens: &[Token], bracket_index: usize) -> Option<&str> {
    tokens.get(bracket_index).map(|t| t.lexeme.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(text: &str) -> Vec<TokenKind> {
        let line_index = LineIndex::new(text);
        let file = Arc::new(Utf8PathBuf::from("<test>"));
        let lexer = Lexer::new(text, file, &line_index);
        lexer
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_identifiers_and_keywords() {
        assert_eq!(
            lex("foo true false _bar1"),
            vec![
                TokenKind::Identifier,
                TokenKind::Boolean(true),
                TokenKind::Boolean(false),
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_numbers() {
        assert_eq!(
            lex("10 3.5"),
            vec![
                TokenKind::Integer(10),
                TokenKind::Float(3.5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_string_with_escapes() {
        assert_eq!(
            lex(r#""a\nb""#),
            vec![TokenKind::String("a\nb".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn rejects_unterminated_string() {
        let line_index = LineIndex::new("\"abc");
        let file = Arc::new(Utf8PathBuf::from("<test>"));
        let lexer = Lexer::new("\"abc", file, &line_index);
        assert!(matches!(
            lexer.tokenize(),
            Err(Error::UnterminatedString(_))
        ));
    }

    #[test]
    fn lexes_operators_and_brackets() {
        assert_eq!(
            lex("+= + - * / % ( ) [ ] { } , : . @ @{ ${"),
            vec![
                TokenKind::PlusEquals,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::SectionOpen,
                TokenKind::SectionClose,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Comma,
                TokenKind::Colon,
                TokenKind::Dot,
                TokenKind::At,
                TokenKind::AtBrace,
                TokenKind::DollarBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_hex_color_case_insensitively() {
        assert_eq!(
            lex("#1a2B3c"),
            vec![
                TokenKind::HexColor("1a2B3c".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lexes_comments_as_whitespace() {
        assert_eq!(
            lex("a // comment\nb /* block\ncomment */ c"),
            vec![
                TokenKind::Identifier,
                TokenKind::Newline,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }
}
