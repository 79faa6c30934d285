//! Recursive-descent parser from tokens to [`StructLit`].

use super::ast::{Decl, Expr, FieldDecl, LabelKind, ScopeId, StructLit, UnaryOp};
use super::lexer::{Token, TokenKind, integer_out_of_range, tokenize};
use super::{Attribute, BoundOp, CompileError, Position};

static EOF: TokenKind = TokenKind::Eof;

pub(crate) fn parse(source: &str) -> Result<StructLit, CompileError> {
    let mut parser = Parser {
        tokens: tokenize(source)?,
        cursor: 0,
        next_scope: 1,
    };
    parser.file()
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    next_scope: ScopeId,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> &TokenKind {
        self.tokens
            .get(self.cursor + ahead)
            .map_or(&EOF, |token| &token.kind)
    }

    fn position(&self) -> Position {
        self.tokens
            .get(self.cursor)
            .or_else(|| self.tokens.last())
            .map(|token| token.position)
            .unwrap_or_default()
    }

    fn bump(&mut self) -> Token {
        let position = self.position();
        match self.tokens.get(self.cursor) {
            Some(token) => {
                let current = token.clone();
                if current.kind != TokenKind::Eof {
                    self.cursor += 1;
                }
                current
            }
            None => Token {
                kind: TokenKind::Eof,
                position,
            },
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), CompileError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", kind_symbol(kind))))
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        CompileError::Syntax {
            position: self.position(),
            message: format!("expected {expected}, found {}", self.peek().describe()),
        }
    }

    fn unsupported(&self, construct: &str) -> CompileError {
        CompileError::Unsupported {
            position: self.position(),
            construct: construct.to_owned(),
        }
    }

    const fn fresh_scope(&mut self) -> ScopeId {
        let id = self.next_scope;
        self.next_scope += 1;
        id
    }

    fn skip_newlines(&mut self) {
        while self.eat(&TokenKind::Newline) {}
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek(), TokenKind::Newline | TokenKind::Comma) {
            self.bump();
        }
    }

    fn file(&mut self) -> Result<StructLit, CompileError> {
        self.skip_newlines();
        if self.eat(&TokenKind::Package) {
            if !matches!(self.bump().kind, TokenKind::Ident(_)) {
                return Err(self.unexpected("package name"));
            }
            if !matches!(self.peek(), TokenKind::Newline | TokenKind::Eof) {
                return Err(self.unexpected("newline after package clause"));
            }
        }
        let (decls, ellipsis) = self.decls(&TokenKind::Eof)?;
        if *self.peek() != TokenKind::Eof {
            return Err(self.unexpected("declaration"));
        }
        Ok(StructLit {
            id: 0,
            decls,
            ellipsis,
        })
    }

    fn decls(&mut self, terminator: &TokenKind) -> Result<(Vec<Decl>, bool), CompileError> {
        let mut decls = Vec::new();
        let mut ellipsis = false;
        loop {
            self.skip_separators();
            if self.peek() == terminator || *self.peek() == TokenKind::Eof {
                break;
            }
            match self.peek() {
                TokenKind::Import => return Err(self.unsupported("import declaration")),
                TokenKind::Package => {
                    return Err(self.unexpected("declaration (package clause must come first)"));
                }
                TokenKind::Ellipsis => {
                    self.bump();
                    ellipsis = true;
                    if !self.at_decl_end(terminator) {
                        return Err(self.unsupported("typed ellipsis in struct"));
                    }
                }
                TokenKind::Attribute { .. } => {
                    self.bump();
                }
                _ => decls.push(self.decl()?),
            }
            if !self.at_decl_end(terminator) {
                return Err(self.unexpected("',' or newline"));
            }
        }
        Ok((decls, ellipsis))
    }

    fn at_decl_end(&self, terminator: &TokenKind) -> bool {
        let next = self.peek();
        matches!(next, TokenKind::Newline | TokenKind::Comma) || next == terminator
    }

    fn at_label(&self) -> bool {
        matches!(self.peek(), TokenKind::Ident(_) | TokenKind::String(_))
            && match self.peek_at(1) {
                TokenKind::Colon => true,
                TokenKind::Question => *self.peek_at(2) == TokenKind::Colon,
                _ => false,
            }
    }

    /// Whether the next tokens are `[...]:`, a pattern rather than a list.
    fn at_pattern(&self) -> bool {
        if *self.peek() != TokenKind::LBrack {
            return false;
        }
        let mut depth = 0_usize;
        for (offset, token) in self.tokens.iter().enumerate().skip(self.cursor) {
            match token.kind {
                TokenKind::LBrack => depth += 1,
                TokenKind::RBrack => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(offset + 1).map(|next| &next.kind),
                            Some(TokenKind::Colon)
                        );
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
        }
        false
    }

    fn decl(&mut self) -> Result<Decl, CompileError> {
        if *self.peek() == TokenKind::LBrack {
            self.bump();
            let key = self.expr()?;
            self.expect(&TokenKind::RBrack)?;
            self.expect(&TokenKind::Colon)?;
            let value = self.expr()?;
            self.attributes();
            return Ok(Decl::Pattern { key, value });
        }
        if self.at_label() {
            return Ok(Decl::Field(self.field()?));
        }
        Ok(Decl::Embed(self.expr()?))
    }

    fn field(&mut self) -> Result<FieldDecl, CompileError> {
        let token = self.bump();
        let (label, kind) = match token.kind {
            TokenKind::Ident(name) if name.starts_with('#') => (name, LabelKind::Definition),
            TokenKind::Ident(name) => (name, LabelKind::Ident),
            TokenKind::String(text) => (text, LabelKind::Quoted),
            other => {
                return Err(CompileError::Syntax {
                    position: token.position,
                    message: format!("expected label, found {}", other.describe()),
                });
            }
        };
        let optional = self.eat(&TokenKind::Question);
        self.expect(&TokenKind::Colon)?;
        if self.at_label() || self.at_pattern() {
            let inner = self.decl()?;
            let id = self.fresh_scope();
            return Ok(FieldDecl {
                label,
                kind,
                optional,
                value: Expr::Struct(StructLit {
                    id,
                    decls: vec![inner],
                    ellipsis: false,
                }),
                attributes: Vec::new(),
                position: token.position,
            });
        }
        let value = self.expr()?;
        let attributes = self.attributes();
        Ok(FieldDecl {
            label,
            kind,
            optional,
            value,
            attributes,
            position: token.position,
        })
    }

    fn attributes(&mut self) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        while let TokenKind::Attribute { name, body } = self.peek() {
            attributes.push(Attribute::new(name, body));
            self.bump();
        }
        attributes
    }

    fn expr(&mut self) -> Result<Expr, CompileError> {
        let first = self.conjunction()?;
        if *self.peek() != TokenKind::Pipe {
            return Ok(first);
        }
        let mut arms = vec![first];
        while self.eat(&TokenKind::Pipe) {
            arms.push(self.conjunction()?);
        }
        Ok(Expr::Disjunction(arms))
    }

    fn conjunction(&mut self) -> Result<Expr, CompileError> {
        let first = self.unary()?;
        if *self.peek() != TokenKind::Amp {
            return Ok(first);
        }
        let mut terms = vec![first];
        while self.eat(&TokenKind::Amp) {
            terms.push(self.unary()?);
        }
        Ok(Expr::Conjunction(terms))
    }

    fn unary(&mut self) -> Result<Expr, CompileError> {
        let position = self.position();
        let op = match self.peek() {
            TokenKind::Star => {
                self.bump();
                return Ok(Expr::Default(Box::new(self.unary()?)));
            }
            TokenKind::Minus => {
                if let TokenKind::Int(magnitude) = *self.peek_at(1) {
                    self.bump();
                    self.bump();
                    return 0_i64
                        .checked_sub_unsigned(magnitude)
                        .map(Expr::Int)
                        .ok_or_else(|| integer_out_of_range(position, &format!("-{magnitude}")));
                }
                UnaryOp::Negate
            }
            TokenKind::Greater => UnaryOp::Bound(BoundOp::Greater),
            TokenKind::GreaterEqual => UnaryOp::Bound(BoundOp::GreaterEqual),
            TokenKind::Less => UnaryOp::Bound(BoundOp::Less),
            TokenKind::LessEqual => UnaryOp::Bound(BoundOp::LessEqual),
            TokenKind::NotEqual => UnaryOp::Bound(BoundOp::NotEqual),
            TokenKind::Matches => UnaryOp::Bound(BoundOp::Matches),
            TokenKind::NotMatches => UnaryOp::Bound(BoundOp::NotMatches),
            _ => return self.postfix(),
        };
        self.bump();
        Ok(Expr::Unary {
            op,
            operand: Box::new(self.unary()?),
            position,
        })
    }

    fn postfix(&mut self) -> Result<Expr, CompileError> {
        let mut base = self.primary()?;
        while *self.peek() == TokenKind::Dot {
            let position = self.position();
            self.bump();
            match self.bump().kind {
                TokenKind::Ident(label) => {
                    base = Expr::Select {
                        base: Box::new(base),
                        label,
                        position,
                    };
                }
                TokenKind::String(_) => return Err(self.unsupported("quoted selector")),
                _ => return Err(self.unexpected("field name after '.'")),
            }
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, CompileError> {
        let position = self.position();
        let token = self.bump();
        match token.kind {
            TokenKind::Null => Ok(Expr::Null),
            TokenKind::True => Ok(Expr::Bool(true)),
            TokenKind::False => Ok(Expr::Bool(false)),
            TokenKind::Int(magnitude) => i64::try_from(magnitude)
                .map(Expr::Int)
                .map_err(|_| integer_out_of_range(position, &magnitude.to_string())),
            TokenKind::Float(value) => Ok(Expr::Float(value)),
            TokenKind::String(text) => Ok(Expr::String(text)),
            TokenKind::Bottom => Ok(Expr::Bottom),
            TokenKind::Ident(name)
                if matches!(name.as_str(), "for" | "if" | "let")
                    && matches!(self.peek(), TokenKind::Ident(_)) =>
            {
                Err(CompileError::Unsupported {
                    position,
                    construct: format!("'{name}' clause"),
                })
            }
            TokenKind::Ident(name) => Ok(Expr::Ident { name, position }),
            TokenKind::LParen => {
                self.skip_newlines();
                let inner = self.expr()?;
                self.skip_newlines();
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBrace => {
                let id = self.fresh_scope();
                let (decls, ellipsis) = self.decls(&TokenKind::RBrace)?;
                self.expect(&TokenKind::RBrace)?;
                Ok(Expr::Struct(StructLit {
                    id,
                    decls,
                    ellipsis,
                }))
            }
            TokenKind::LBrack => self.list(),
            other => Err(CompileError::Syntax {
                position,
                message: format!("expected expression, found {}", other.describe()),
            }),
        }
    }

    fn list(&mut self) -> Result<Expr, CompileError> {
        let mut items = Vec::new();
        let mut tail = None;
        loop {
            self.skip_newlines();
            if self.eat(&TokenKind::RBrack) {
                break;
            }
            if self.eat(&TokenKind::Ellipsis) {
                let position = self.position();
                let element = if matches!(
                    self.peek(),
                    TokenKind::RBrack | TokenKind::Comma | TokenKind::Newline
                ) {
                    Expr::Ident {
                        name: "_".to_owned(),
                        position,
                    }
                } else {
                    self.expr()?
                };
                tail = Some(Box::new(element));
                self.skip_separators();
                self.expect(&TokenKind::RBrack)?;
                break;
            }
            items.push(self.expr()?);
            self.skip_newlines();
            if !self.eat(&TokenKind::Comma) {
                self.skip_newlines();
                self.expect(&TokenKind::RBrack)?;
                break;
            }
        }
        Ok(Expr::List { items, tail })
    }
}

fn kind_symbol(kind: &TokenKind) -> String {
    match kind.describe().strip_prefix('\'') {
        Some(rest) => rest.trim_end_matches('\'').to_owned(),
        None => kind.describe(),
    }
}
