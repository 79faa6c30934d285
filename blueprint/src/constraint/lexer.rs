//! Tokeniser for constraint sources.
//!
//! Newlines are significant: a separator token is inserted after a line
//! ending in an identifier, literal, closing bracket, `...` or attribute.

use super::{CompileError, Position};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    String(String),
    /// Magnitude of an integer literal; the parser applies any sign.
    Int(u64),
    Float(f64),
    True,
    False,
    Null,
    Bottom,
    Package,
    Import,
    Attribute { name: String, body: String },
    LBrace,
    RBrace,
    LBrack,
    RBrack,
    LParen,
    RParen,
    Colon,
    Comma,
    Dot,
    Ellipsis,
    Question,
    Pipe,
    Amp,
    Star,
    Minus,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    NotEqual,
    Matches,
    NotMatches,
    Newline,
    Eof,
}

impl TokenKind {
    const fn ends_line(&self) -> bool {
        matches!(
            self,
            Self::Ident(_)
                | Self::String(_)
                | Self::Int(_)
                | Self::Float(_)
                | Self::True
                | Self::False
                | Self::Null
                | Self::Bottom
                | Self::Attribute { .. }
                | Self::RBrace
                | Self::RBrack
                | Self::RParen
                | Self::Ellipsis
        )
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("identifier {name}"),
            Self::String(text) => format!("string {text:?}"),
            Self::Int(value) => format!("number {value}"),
            Self::Float(value) => format!("number {value}"),
            Self::Attribute { name, .. } => format!("attribute @{name}"),
            Self::Newline => "newline".to_owned(),
            Self::Eof => "end of file".to_owned(),
            other => format!("'{}'", other.symbol()),
        }
    }

    const fn symbol(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::Bottom => "_|_",
            Self::Package => "package",
            Self::Import => "import",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LBrack => "[",
            Self::RBrack => "]",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Colon => ":",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Ellipsis => "...",
            Self::Question => "?",
            Self::Pipe => "|",
            Self::Amp => "&",
            Self::Star => "*",
            Self::Minus => "-",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::NotEqual => "!=",
            Self::Matches => "=~",
            Self::NotMatches => "!~",
            _ => "",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) position: Position,
}

struct Lexer {
    chars: Vec<char>,
    offset: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        offset: 0,
        line: 1,
        column: 1,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '_' | '$' | '#')
}

const fn is_ident_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$')
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.offset).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.offset + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    const fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn push(&mut self, kind: TokenKind, position: Position) {
        self.tokens.push(Token { kind, position });
    }

    fn last_ends_line(&self) -> bool {
        self.tokens.last().is_some_and(|token| token.kind.ends_line())
    }

    fn run(&mut self) -> Result<(), CompileError> {
        while let Some(c) = self.peek() {
            let position = self.position();
            match c {
                '\n' => {
                    self.bump();
                    if self.last_ends_line() {
                        self.push(TokenKind::Newline, position);
                    }
                }
                _ if c.is_whitespace() => {
                    self.bump();
                }
                '/' if self.peek_at(1) == Some('/') => {
                    while self.peek().is_some_and(|next| next != '\n') {
                        self.bump();
                    }
                }
                '"' => self.string(position)?,
                '\'' | '`' => {
                    return Err(unsupported(position, "byte or raw string literal"));
                }
                '@' => self.attribute(position)?,
                _ if c.is_ascii_digit() => self.number(position)?,
                '_' if self.peek_at(1) == Some('|') && self.peek_at(2) == Some('_') => {
                    self.bump();
                    self.bump();
                    self.bump();
                    self.push(TokenKind::Bottom, position);
                }
                _ if is_ident_start(c) => self.ident(position),
                _ => self.operator(c, position)?,
            }
        }
        if self.last_ends_line() {
            let position = self.position();
            self.push(TokenKind::Newline, position);
        }
        let position = self.position();
        self.push(TokenKind::Eof, position);
        Ok(())
    }

    fn operator(&mut self, c: char, position: Position) -> Result<(), CompileError> {
        let next = self.peek_at(1);
        let (kind, width) = match (c, next) {
            ('.', Some('.')) if self.peek_at(2) == Some('.') => (TokenKind::Ellipsis, 3),
            ('>', Some('=')) => (TokenKind::GreaterEqual, 2),
            ('<', Some('=')) => (TokenKind::LessEqual, 2),
            ('!', Some('=')) => (TokenKind::NotEqual, 2),
            ('=', Some('~')) => (TokenKind::Matches, 2),
            ('!', Some('~')) => (TokenKind::NotMatches, 2),
            ('&', Some('&')) | ('|', Some('|')) => {
                return Err(unsupported(position, "boolean operator"));
            }
            ('{', _) => (TokenKind::LBrace, 1),
            ('}', _) => (TokenKind::RBrace, 1),
            ('[', _) => (TokenKind::LBrack, 1),
            (']', _) => (TokenKind::RBrack, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            (':', _) => (TokenKind::Colon, 1),
            (',', _) => (TokenKind::Comma, 1),
            ('.', _) => (TokenKind::Dot, 1),
            ('?', _) => (TokenKind::Question, 1),
            ('|', _) => (TokenKind::Pipe, 1),
            ('&', _) => (TokenKind::Amp, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('>', _) => (TokenKind::Greater, 1),
            ('<', _) => (TokenKind::Less, 1),
            ('+' | '/', _) => return Err(unsupported(position, "arithmetic")),
            ('=', _) => return Err(unsupported(position, "alias or let binding")),
            ('!', _) => return Err(unsupported(position, "boolean negation")),
            _ => {
                return Err(CompileError::Syntax {
                    position,
                    message: format!("unexpected character '{c}'"),
                });
            }
        };
        for _ in 0..width {
            self.bump();
        }
        self.push(kind, position);
        Ok(())
    }

    fn ident(&mut self, position: Position) {
        let mut name = String::new();
        if let Some(first) = self.bump() {
            name.push(first);
        }
        while let Some(c) = self.peek().filter(|c| is_ident_part(*c)) {
            name.push(c);
            self.bump();
        }
        let kind = match name.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "package" => TokenKind::Package,
            "import" => TokenKind::Import,
            _ => TokenKind::Ident(name),
        };
        self.push(kind, position);
    }

    fn number(&mut self, position: Position) -> Result<(), CompileError> {
        let mut text = String::new();
        let mut is_float = false;
        self.digits(&mut text);
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            text.push('.');
            self.bump();
            self.digits(&mut text);
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            text.push('e');
            self.bump();
            if let Some(sign) = self.peek().filter(|c| matches!(c, '+' | '-')) {
                text.push(sign);
                self.bump();
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(CompileError::Syntax {
                    position,
                    message: "exponent has no digits".to_owned(),
                });
            }
            self.digits(&mut text);
        }
        if self.peek().is_some_and(is_ident_start) {
            return Err(unsupported(position, "number with unit or base prefix"));
        }
        let kind = if is_float {
            let value: f64 = text.parse().map_err(|_| CompileError::Syntax {
                position,
                message: format!("invalid number {text}"),
            })?;
            if !value.is_finite() {
                return Err(CompileError::Syntax {
                    position,
                    message: format!("number {text} is out of range"),
                });
            }
            TokenKind::Float(value)
        } else {
            TokenKind::Int(text.parse().map_err(|_| integer_out_of_range(position, &text))?)
        };
        self.push(kind, position);
        Ok(())
    }

    fn digits(&mut self, text: &mut String) {
        while let Some(c) = self.peek().filter(|c| c.is_ascii_digit() || *c == '_') {
            if c != '_' {
                text.push(c);
            }
            self.bump();
        }
    }

    fn string(&mut self, position: Position) -> Result<(), CompileError> {
        if self.peek_at(1) == Some('"') && self.peek_at(2) == Some('"') {
            return Err(unsupported(position, "multi-line string"));
        }
        self.bump();
        let mut text = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(unterminated(position));
            };
            match c {
                '"' => break,
                '\n' => return Err(unterminated(position)),
                '\\' => {
                    let escape_position = self.position();
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('u') => self.unicode_escape(escape_position)?,
                        Some('(') => {
                            return Err(unsupported(escape_position, "string interpolation"));
                        }
                        Some(other) => {
                            return Err(CompileError::Syntax {
                                position: escape_position,
                                message: format!("unknown escape sequence \\{other}"),
                            });
                        }
                        None => return Err(unterminated(position)),
                    };
                    text.push(escaped);
                }
                other => text.push(other),
            }
        }
        self.push(TokenKind::String(text), position);
        Ok(())
    }

    fn unicode_escape(&mut self, position: Position) -> Result<char, CompileError> {
        let mut code = 0_u32;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| CompileError::Syntax {
                    position,
                    message: "invalid unicode escape".to_owned(),
                })?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| CompileError::Syntax {
            position,
            message: "invalid unicode code point".to_owned(),
        })
    }

    fn attribute(&mut self, position: Position) -> Result<(), CompileError> {
        self.bump();
        let mut name = String::new();
        while let Some(c) = self.peek().filter(|c| is_ident_part(*c)) {
            name.push(c);
            self.bump();
        }
        if name.is_empty() || self.peek() != Some('(') {
            return Err(CompileError::Syntax {
                position,
                message: "expected attribute of the form @name(...)".to_owned(),
            });
        }
        self.bump();
        let mut body = String::new();
        let mut depth = 0_usize;
        let mut quoted = false;
        loop {
            let Some(c) = self.bump() else {
                return Err(CompileError::Syntax {
                    position,
                    message: format!("unterminated attribute @{name}"),
                });
            };
            match c {
                '"' => quoted = !quoted,
                '\\' if quoted => {
                    body.push(c);
                    if let Some(escaped) = self.bump() {
                        body.push(escaped);
                    }
                    continue;
                }
                '(' if !quoted => depth += 1,
                ')' if !quoted && depth == 0 => break,
                ')' if !quoted => depth -= 1,
                _ => {}
            }
            body.push(c);
        }
        self.push(TokenKind::Attribute { name, body }, position);
        Ok(())
    }
}

fn unsupported(position: Position, construct: &str) -> CompileError {
    CompileError::Unsupported {
        position,
        construct: construct.to_owned(),
    }
}

fn unterminated(position: Position) -> CompileError {
    CompileError::Syntax {
        position,
        message: "unterminated string literal".to_owned(),
    }
}

pub(crate) fn integer_out_of_range(position: Position, text: &str) -> CompileError {
    CompileError::Syntax {
        position,
        message: format!("integer {text} is out of range"),
    }
}

#[cfg(test)]
mod tests {
    use super::{TokenKind, tokenize};
    use anyhow::Result;
    use rstest::rstest;

    fn kinds(source: &str) -> Result<Vec<TokenKind>> {
        Ok(tokenize(source)?.into_iter().map(|token| token.kind).collect())
    }

    #[rstest]
    fn inserts_newline_after_line_ending_tokens() -> Result<()> {
        let tokens = kinds("a: 1\nb: {\n}\n")?;
        anyhow::ensure!(
            tokens
                == vec![
                    TokenKind::Ident("a".to_owned()),
                    TokenKind::Colon,
                    TokenKind::Int(1),
                    TokenKind::Newline,
                    TokenKind::Ident("b".to_owned()),
                    TokenKind::Colon,
                    TokenKind::LBrace,
                    TokenKind::RBrace,
                    TokenKind::Newline,
                    TokenKind::Eof,
                ],
            "unexpected tokens: {tokens:?}"
        );
        Ok(())
    }

    #[rstest]
    fn reads_attribute_body_verbatim() -> Result<()> {
        let tokens = kinds("x: int @env(name=\"A)B\",type=int)")?;
        anyhow::ensure!(
            tokens.contains(&TokenKind::Attribute {
                name: "env".to_owned(),
                body: "name=\"A)B\",type=int".to_owned(),
            }),
            "attribute not found in {tokens:?}"
        );
        Ok(())
    }

    #[rstest]
    #[case("1.5e3", TokenKind::Float(1500.0))]
    #[case("1_000", TokenKind::Int(1000))]
    #[case("9223372036854775808", TokenKind::Int(9_223_372_036_854_775_808))]
    #[case("\"a\\u0041\\n\"", TokenKind::String("aA\n".to_owned()))]
    #[case("_|_", TokenKind::Bottom)]
    #[case("#Target", TokenKind::Ident("#Target".to_owned()))]
    fn lexes_literals(#[case] source: &str, #[case] expected: TokenKind) -> Result<()> {
        let tokens = kinds(source)?;
        anyhow::ensure!(tokens.first() == Some(&expected), "got {tokens:?}");
        Ok(())
    }

    #[rstest]
    #[case("a: \"\\(b)\"")]
    #[case("a: 1 + 2")]
    #[case("a: '''")]
    #[case("X=a")]
    fn rejects_unsupported_syntax(#[case] source: &str) {
        assert!(tokenize(source).is_err());
    }
}
