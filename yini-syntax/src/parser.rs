//! Recursive-descent parser, token stream → [`Document`] (spec.md §4.3).

use crate::ast::{
    BinaryOp, Define, Document, EmptyBehavior, Entry, Expr, ExprKind, Include, Section,
    SchemaRule, TypeExpr, UnaryOp,
};
use crate::error::{Error, ErrorSite, Result};
use crate::token::{Token, TokenKind};

pub fn parse(tokens: Vec<Token>) -> Result<Document> {
    Parser::new(tokens).parse_document()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.peek().clone();
            Err(Error::ExpectedToken {
                expected: kind.to_string(),
                found: found.kind.to_string(),
                site: ErrorSite::at(found.position),
            })
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        if matches!(self.peek_kind(), TokenKind::Identifier) {
            Ok(self.advance().lexeme)
        } else {
            let found = self.peek().clone();
            Err(Error::ExpectedToken {
                expected: "identifier".to_string(),
                found: found.kind.to_string(),
                site: ErrorSite::at(found.position),
            })
        }
    }

    /// Skips blank statement separators (one or more newlines).
    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn parse_document(&mut self) -> Result<Document> {
        let mut doc = Document::new();
        self.skip_newlines();
        while !self.check(&TokenKind::Eof) {
            self.parse_top_level_statement(&mut doc)?;
            self.skip_newlines();
        }
        Ok(doc)
    }

    fn parse_top_level_statement(&mut self, doc: &mut Document) -> Result<()> {
        self.expect(&TokenKind::SectionOpen)?;
        if self.check(&TokenKind::Hash) {
            self.advance();
            let directive = self.expect_identifier()?;
            self.expect(&TokenKind::SectionClose)?;
            self.expect(&TokenKind::Newline)?;
            match directive.as_str() {
                "define" => self.parse_define_block(doc),
                "include" => self.parse_include_block(doc),
                "schema" => self.parse_schema_block(doc),
                other => Err(Error::InvalidRule(ErrorSite::named(
                    self.peek().position.clone(),
                    other.to_string(),
                ))),
            }
        } else {
            self.parse_section(doc)
        }
    }

    fn parse_section(&mut self, doc: &mut Document) -> Result<()> {
        let start = self.peek().position.clone();
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::SectionClose)?;
        let mut parents = Vec::new();
        if self.check(&TokenKind::Colon) {
            self.advance();
            parents.push(self.expect_identifier()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                parents.push(self.expect_identifier()?);
            }
        }
        self.expect(&TokenKind::Newline)?;
        self.skip_newlines();

        let mut entries = Vec::new();
        let mut quick_index = 0u32;
        while !self.check(&TokenKind::SectionOpen) && !self.check(&TokenKind::Eof) {
            entries.push(self.parse_entry(&mut quick_index)?);
            self.skip_newlines();
        }
        doc.sections.push(Section {
            name,
            parents,
            entries,
            position: start,
        });
        Ok(())
    }

    fn parse_entry(&mut self, quick_index: &mut u32) -> Result<Entry> {
        let position = self.peek().position.clone();
        if self.check(&TokenKind::PlusEquals) {
            self.advance();
            let value = self.parse_expression()?;
            let index = *quick_index;
            *quick_index += 1;
            Ok(Entry::QuickRegister {
                index,
                value,
                position,
            })
        } else {
            let key = self.expect_identifier()?;
            self.expect(&TokenKind::Equals)?;
            let value = self.parse_expression()?;
            Ok(Entry::KeyValue {
                key,
                value,
                position,
            })
        }
    }

    fn parse_define_block(&mut self, doc: &mut Document) -> Result<()> {
        self.skip_newlines();
        while matches!(self.peek_kind(), TokenKind::Identifier) {
            let position = self.peek().position.clone();
            let name = self.expect_identifier()?;
            self.expect(&TokenKind::Equals)?;
            let value = self.parse_expression()?;
            doc.defines.push(Define {
                name,
                value,
                position,
            });
            self.skip_newlines();
        }
        Ok(())
    }

    fn parse_include_block(&mut self, doc: &mut Document) -> Result<()> {
        self.skip_newlines();
        while self.check(&TokenKind::PlusEquals) {
            let position = self.peek().position.clone();
            self.advance();
            let path = self.expect_string()?;
            doc.includes.push(Include { path, position });
            self.skip_newlines();
        }
        Ok(())
    }

    /// `expect(&TokenKind::String(...))` can't match by value since the
    /// payload varies; this pulls the string out if the next token is any
    /// `String` variant.
    fn expect_string(&mut self) -> Result<String> {
        if let TokenKind::String(value) = self.peek_kind().clone() {
            self.advance();
            Ok(value)
        } else {
            let found = self.peek().clone();
            Err(Error::ExpectedToken {
                expected: "string".to_string(),
                found: found.kind.to_string(),
                site: ErrorSite::at(found.position),
            })
        }
    }

    /// A `[#schema]` block is structured like a sequence of miniature
    /// sections: `[Target]` introduces rules for that section, each followed
    /// by `key = rule-descriptor` lines, until the next `[Target]` or
    /// `[#end_schema]`. Per Open Question (b), termination can also be
    /// implicit: re-using a target name already seen in this block means the
    /// block has ended and the upcoming `[Target]` is really the first
    /// ordinary section that follows the schema (exactly the shape of the
    /// worked example in spec.md §8 S6, where `[Cfg]` both opens the schema's
    /// rule for `Cfg` and then reappears as the real, empty `[Cfg]` section).
    fn parse_schema_block(&mut self, doc: &mut Document) -> Result<()> {
        self.skip_newlines();
        let mut seen_targets = std::collections::HashSet::new();
        let mut current_target: Option<String> = None;

        loop {
            if self.check(&TokenKind::Eof) {
                return Ok(());
            }
            if self.check(&TokenKind::SectionOpen) {
                if self.peek_at_is_end_schema() {
                    self.advance(); // [
                    self.advance(); // #
                    self.advance(); // end_schema
                    self.expect(&TokenKind::SectionClose)?;
                    self.expect(&TokenKind::Newline)?;
                    return Ok(());
                }
                let name = self
                    .tokens
                    .get(self.pos + 1)
                    .map(|t| t.lexeme.clone())
                    .unwrap_or_default();
                if seen_targets.contains(&name) {
                    // Implicit termination: leave the `[` unconsumed so the
                    // caller parses this as an ordinary section.
                    return Ok(());
                }
                self.advance(); // [
                self.advance(); // identifier
                self.expect(&TokenKind::SectionClose)?;
                self.expect(&TokenKind::Newline)?;
                self.skip_newlines();
                seen_targets.insert(name.clone());
                current_target = Some(name);
                continue;
            }

            let position = self.peek().position.clone();
            let Some(target) = current_target.clone() else {
                return Err(Error::InvalidRule(ErrorSite::at(position)));
            };
            let key = self.expect_identifier()?;
            self.expect(&TokenKind::Equals)?;
            let rule = self.parse_rule_descriptor(target, key, position)?;
            doc.schema_rules.push(rule);
            self.skip_newlines();
        }
    }

    fn peek_at_is_end_schema(&self) -> bool {
        matches!(self.tokens.get(self.pos + 1).map(|t| &t.kind), Some(TokenKind::Hash))
            && matches!(
                self.tokens.get(self.pos + 2).map(|t| t.lexeme.as_str()),
                Some("end_schema")
            )
    }

    fn parse_rule_descriptor(
        &mut self,
        section: String,
        key: String,
        position: crate::position::Position,
    ) -> Result<SchemaRule> {
        let type_expr = self.parse_type_expr()?;
        let mut required = false;
        let mut empty_behavior = None;
        let mut min = None;
        let mut max = None;

        while self.check(&TokenKind::Comma) {
            self.advance();
            match self.peek_kind().clone() {
                TokenKind::Bang => {
                    self.advance();
                    required = true;
                }
                TokenKind::Tilde => {
                    self.advance();
                    empty_behavior = Some(EmptyBehavior::Silent);
                }
                TokenKind::Equals => {
                    self.advance();
                    let default_expr = self.parse_expression()?;
                    empty_behavior = Some(EmptyBehavior::Default(default_expr));
                }
                TokenKind::Identifier => {
                    let word = self.advance().lexeme;
                    match word.as_str() {
                        "required" => required = true,
                        "optional" => required = false,
                        "error" | "e" => empty_behavior = Some(EmptyBehavior::Error),
                        "silent" => empty_behavior = Some(EmptyBehavior::Silent),
                        "min" => {
                            self.expect(&TokenKind::Equals)?;
                            min = Some(self.parse_number_literal()?);
                        }
                        "max" => {
                            self.expect(&TokenKind::Equals)?;
                            max = Some(self.parse_number_literal()?);
                        }
                        other => {
                            return Err(Error::InvalidRule(ErrorSite::named(
                                position,
                                other.to_string(),
                            )))
                        }
                    }
                }
                _ => {
                    return Err(Error::InvalidRule(ErrorSite::at(position)));
                }
            }
        }

        let empty_behavior = empty_behavior.unwrap_or(if required {
            EmptyBehavior::Error
        } else {
            EmptyBehavior::Silent
        });

        Ok(SchemaRule {
            section,
            key,
            type_expr,
            required,
            empty_behavior,
            min,
            max,
            position,
        })
    }

    fn parse_number_literal(&mut self) -> Result<f64> {
        match self.peek_kind().clone() {
            TokenKind::Integer(v) => {
                self.advance();
                Ok(v as f64)
            }
            TokenKind::Float(v) => {
                self.advance();
                Ok(v)
            }
            _ => {
                let found = self.peek().clone();
                Err(Error::ExpectedToken {
                    expected: "number".to_string(),
                    found: found.kind.to_string(),
                    site: ErrorSite::at(found.position),
                })
            }
        }
    }

    fn parse_type_expr(&mut self) -> Result<TypeExpr> {
        if self.check(&TokenKind::LBrace) {
            self.advance();
            let key_type = self.parse_type_expr()?;
            self.expect(&TokenKind::Colon)?;
            let value_type = self.parse_type_expr()?;
            self.expect(&TokenKind::RBrace)?;
            return Ok(TypeExpr::Map(Box::new(key_type), Box::new(value_type)));
        }
        let name = self.expect_identifier()?;
        let base = match name.to_ascii_lowercase().as_str() {
            "string" => TypeExpr::String,
            "int" => TypeExpr::Int,
            "float" => TypeExpr::Float,
            "bool" => TypeExpr::Bool,
            "map" => TypeExpr::Map(Box::new(TypeExpr::Any), Box::new(TypeExpr::Any)),
            "array" => {
                if self.check(&TokenKind::SectionOpen) {
                    self.advance();
                    let inner = self.parse_type_expr()?;
                    self.expect(&TokenKind::SectionClose)?;
                    TypeExpr::Array(Box::new(inner))
                } else {
                    TypeExpr::Array(Box::new(TypeExpr::Any))
                }
            }
            "set" => {
                if self.check(&TokenKind::SectionOpen) {
                    self.advance();
                    let inner = self.parse_type_expr()?;
                    self.expect(&TokenKind::SectionClose)?;
                    TypeExpr::Set(Box::new(inner))
                } else {
                    TypeExpr::Set(Box::new(TypeExpr::Any))
                }
            }
            other => {
                return Err(Error::InvalidRule(ErrorSite::named(
                    self.peek().position.clone(),
                    other.to_string(),
                )))
            }
        };
        Ok(base)
    }

    // --- Expressions (precedence climbing, spec.md §4.3) ---

    fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let position = self.advance().position;
            let right = self.parse_multiplicative()?;
            left = Expr::new(
                ExprKind::Binary(op, Box::new(left), Box::new(right)),
                position,
            );
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => break,
            };
            let position = self.advance().position;
            let right = self.parse_unary()?;
            left = Expr::new(
                ExprKind::Binary(op, Box::new(left), Box::new(right)),
                position,
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        match self.peek_kind() {
            TokenKind::Minus => {
                let position = self.advance().position;
                let operand = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Unary(UnaryOp::Neg, Box::new(operand)),
                    position,
                ))
            }
            TokenKind::Plus => {
                let position = self.advance().position;
                let operand = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Unary(UnaryOp::Pos, Box::new(operand)),
                    position,
                ))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let position = self.peek().position.clone();
        match self.peek_kind().clone() {
            TokenKind::Integer(value) => {
                self.advance();
                Ok(Expr::new(ExprKind::Integer(value), position))
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(Expr::new(ExprKind::Float(value), position))
            }
            TokenKind::String(value) => {
                self.advance();
                Ok(Expr::new(ExprKind::String(value), position))
            }
            TokenKind::Boolean(value) => {
                self.advance();
                Ok(Expr::new(ExprKind::Boolean(value), position))
            }
            TokenKind::HexColor(digits) => {
                self.advance();
                Ok(Expr::new(ExprKind::HexColor(digits), position))
            }
            TokenKind::At => {
                self.advance();
                let name = self.expect_identifier()?;
                Ok(Expr::new(ExprKind::MacroRef(name), position))
            }
            TokenKind::AtBrace => {
                self.advance();
                let section = self.expect_identifier()?;
                self.expect(&TokenKind::Dot)?;
                let key = self.expect_identifier()?;
                self.expect(&TokenKind::RBrace)?;
                Ok(Expr::new(ExprKind::CrossRef(section, key), position))
            }
            TokenKind::DollarBrace => {
                self.advance();
                let name = self.expect_identifier()?;
                let default = if self.check(&TokenKind::Colon) {
                    self.advance();
                    Some(Box::new(self.parse_expression()?))
                } else {
                    None
                };
                self.expect(&TokenKind::RBrace)?;
                Ok(Expr::new(ExprKind::EnvRef(name, default), position))
            }
            TokenKind::LParen => self.parse_paren_group(position),
            TokenKind::SectionOpen => self.parse_array_literal(position),
            TokenKind::LBrace => self.parse_map_literal(position),
            TokenKind::Identifier => self.parse_call(position),
            _ => Err(Error::ExpectedExpression(ErrorSite::at(position))),
        }
    }

    /// `(e)` is a grouped expression; `(x,)` is a singleton set; `(x, y, …)`
    /// is a set.
    fn parse_paren_group(&mut self, position: crate::position::Position) -> Result<Expr> {
        self.advance(); // (
        if self.check(&TokenKind::RParen) {
            self.advance();
            return Ok(Expr::new(ExprKind::Set(Vec::new()), position));
        }
        let first = self.parse_expression()?;
        if self.check(&TokenKind::Comma) {
            let mut members = vec![first];
            while self.check(&TokenKind::Comma) {
                self.advance();
                if self.check(&TokenKind::RParen) {
                    break;
                }
                members.push(self.parse_expression()?);
            }
            self.expect(&TokenKind::RParen)?;
            Ok(Expr::new(ExprKind::Set(members), position))
        } else {
            self.expect(&TokenKind::RParen)?;
            Ok(Expr::new(ExprKind::Group(Box::new(first)), position))
        }
    }

    fn parse_array_literal(&mut self, position: crate::position::Position) -> Result<Expr> {
        self.advance(); // [
        let mut items = Vec::new();
        if !self.check(&TokenKind::SectionClose) {
            items.push(self.parse_expression()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                if self.check(&TokenKind::SectionClose) {
                    break;
                }
                items.push(self.parse_expression()?);
            }
        }
        self.expect(&TokenKind::SectionClose)?;
        Ok(Expr::new(ExprKind::Array(items), position))
    }

    fn parse_map_literal(&mut self, position: crate::position::Position) -> Result<Expr> {
        self.advance(); // {
        let mut entries = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            entries.push(self.parse_map_entry()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                if self.check(&TokenKind::RBrace) {
                    break;
                }
                entries.push(self.parse_map_entry()?);
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Expr::new(ExprKind::Map(entries), position))
    }

    fn parse_map_entry(&mut self) -> Result<(String, Expr)> {
        let key = match self.peek_kind().clone() {
            TokenKind::Identifier => self.advance().lexeme,
            TokenKind::String(value) => {
                self.advance();
                value
            }
            _ => {
                let found = self.peek().clone();
                return Err(Error::ExpectedToken {
                    expected: "map key".to_string(),
                    found: found.kind.to_string(),
                    site: ErrorSite::at(found.position),
                });
            }
        };
        self.expect(&TokenKind::Colon)?;
        let value = self.parse_expression()?;
        Ok((key, value))
    }

    /// Constructor call: `Color(...)`, `Coord(...)`, `Path(...)`, `List(...)`
    /// / `Array(...)`, `Set(...)`, `Dyna(...)`. Recognized case-insensitively
    /// (Open Question (a)); any other bare identifier followed by `(` is
    /// still parsed as a `Call` so the evaluator can reject unknown names
    /// uniformly as `InvalidConstructor`.
    fn parse_call(&mut self, position: crate::position::Position) -> Result<Expr> {
        let name = self.advance().lexeme;
        if !self.check(&TokenKind::LParen) {
            return Err(Error::ExpectedExpression(ErrorSite::named(position, name)));
        }
        self.advance(); // (
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            args.push(self.parse_expression()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                if self.check(&TokenKind::RParen) {
                    break;
                }
                args.push(self.parse_expression()?);
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Expr::new(ExprKind::Call(name, args), position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::position::LineIndex;
    use camino::Utf8PathBuf;
    use std::sync::Arc;

    fn parse_source(text: &str) -> Document {
        let line_index = LineIndex::new(text);
        let file = Arc::new(Utf8PathBuf::from("<test>"));
        let tokens = Lexer::new(text, file, &line_index).tokenize().unwrap();
        parse(tokens).unwrap()
    }

    #[test]
    fn parses_simple_section() {
        let doc = parse_source("[Foo]\nbar = 1\n");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].name, "Foo");
        assert_eq!(doc.sections[0].entries.len(), 1);
    }

    #[test]
    fn parses_section_with_parents() {
        let doc = parse_source("[Child]: Left, Right\nv = 1\n");
        assert_eq!(doc.sections[0].parents, vec!["Left", "Right"]);
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let doc = parse_source("[A]\nv = 2 + 3 * 4\n");
        match &doc.sections[0].entries[0] {
            Entry::KeyValue { value, .. } => match &value.kind {
                ExprKind::Binary(BinaryOp::Add, _, rhs) => {
                    assert!(matches!(rhs.kind, ExprKind::Binary(BinaryOp::Mul, _, _)));
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_quick_register_entries() {
        let doc = parse_source("[Include]\n+= \"a.yini\"\n+= \"b.yini\"\n");
        assert_eq!(doc.sections[0].entries.len(), 2);
    }

    #[test]
    fn parses_set_with_trailing_comma_as_singleton() {
        let doc = parse_source("[A]\nv = (1,)\n");
        match &doc.sections[0].entries[0] {
            Entry::KeyValue { value, .. } => {
                assert!(matches!(&value.kind, ExprKind::Set(items) if items.len() == 1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_define_and_include_blocks() {
        let doc = parse_source("[#define]\nbase = 10\n\n[#include]\n+= \"other.yini\"\n");
        assert_eq!(doc.defines.len(), 1);
        assert_eq!(doc.defines[0].name, "base");
        assert_eq!(doc.includes.len(), 1);
        assert_eq!(doc.includes[0].path, "other.yini");
    }

    #[test]
    fn parses_schema_block_with_rule_modifiers() {
        let doc = parse_source(
            "[#schema]\n[Cfg]\nport = int, required, min=1, max=65535\n[#end_schema]\n",
        );
        assert_eq!(doc.schema_rules.len(), 1);
        let rule = &doc.schema_rules[0];
        assert_eq!(rule.section, "Cfg");
        assert_eq!(rule.key, "port");
        assert!(rule.required);
        assert_eq!(rule.min, Some(1.0));
        assert_eq!(rule.max, Some(65535.0));
    }

    #[test]
    fn parses_schema_block_with_implicit_termination() {
        // Re-using `[Cfg]` as a target a second time ends the schema block
        // implicitly; the second `[Cfg]` is the real, empty section.
        let doc = parse_source(
            "[#schema]\n[Cfg]\nport = int, required, =8080\n\n[Cfg]\n",
        );
        assert_eq!(doc.schema_rules.len(), 1);
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].name, "Cfg");
        assert!(doc.sections[0].entries.is_empty());
    }

    #[test]
    fn parses_schema_block_with_multiple_targets() {
        let doc = parse_source(
            "[#schema]\n[A]\nx = int, required\n[B]\ny = string, optional\n[#end_schema]\n",
        );
        assert_eq!(doc.schema_rules.len(), 2);
        assert_eq!(doc.schema_rules[0].section, "A");
        assert_eq!(doc.schema_rules[1].section, "B");
    }

    #[test]
    fn parses_constructor_calls() {
        let doc = parse_source("[A]\nv = Color(255, 0, 0)\n");
        match &doc.sections[0].entries[0] {
            Entry::KeyValue { value, .. } => {
                assert!(matches!(&value.kind, ExprKind::Call(name, args) if name == "Color" && args.len() == 3));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_cross_reference_and_env_reference() {
        let doc = parse_source("[A]\nv = @{B.x} + ${HOME:\"/tmp\"}\n");
        match &doc.sections[0].entries[0] {
            Entry::KeyValue { value, .. } => {
                assert!(matches!(value.kind, ExprKind::Binary(BinaryOp::Add, _, _)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
