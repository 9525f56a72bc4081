//! Lexical analysis of the grammar description.
//!
//! A single pass over the input splits the description into [Lexeme]s: section markers,
//! identifiers, regex and string literals, decorators, attribute blocks and punctuation.
//! Malformed input is reported to the [DiagnosticSink] and skipped so that one pass surfaces
//! every lexical error of the description.

use crate::{Code, DiagnosticSink, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexKind {
    /// `.token` at the start of a line.
    TokenSection,
    /// `.rules` at the start of a line.
    RulesSection,
    /// `.end` at the start of a line.
    SectionEnd,
    /// `[A-Z][A-Z0-9_]*` — token and group names.
    UpperIdent,
    /// Strict PascalCase (no consecutive uppercase) — rule names.
    PascalIdent,
    /// Any other identifier, including the ignore marker `_`.
    Ident,
    /// Backtick-delimited regex literal; contents verbatim.
    Regex,
    /// Single- or double-quoted literal; contents with the delimiter escape removed.
    Str,
    /// `@name` or `@N`.
    Decorator,
    /// `^NAME`.
    Exclusion,
    /// `@{`.
    AttrOpen,
    Colon,
    Semicolon,
    Equal,
    Pipe,
    Arrow,
    Comma,
    Dot,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Star,
    Plus,
    Question,
}

#[derive(Debug, Clone)]
pub struct Lexeme {
    pub kind: LexKind,
    pub text: String,
    pub position: Position,
}

impl Lexeme {
    fn new(kind: LexKind, text: String, position: Position) -> Self {
        Self {
            kind,
            text,
            position,
        }
    }
}

/// Whether a word is a valid token or group name.
pub fn is_upper_name(word: &str) -> bool {
    let mut bytes = word.bytes();
    match bytes.next() {
        Some(b'A'..=b'Z') => bytes.all(|b| matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b'_')),
        _ => false,
    }
}

/// Whether a word is a valid rule name: leading uppercase, alphanumeric only, and no two
/// consecutive uppercase letters ("RGBColor" is invalid, "RgbColor" and "N" are valid).
pub fn is_pascal_name(word: &str) -> bool {
    let bytes = word.as_bytes();
    if !matches!(bytes.first(), Some(b'A'..=b'Z')) {
        return false;
    }
    let mut previous_upper = false;
    for &b in bytes {
        match b {
            b'A'..=b'Z' => {
                if previous_upper {
                    return false;
                }
                previous_upper = true;
            }
            b'a'..=b'z' | b'0'..=b'9' => previous_upper = false,
            _ => return false,
        }
    }
    true
}

fn classify_word(word: &str) -> LexKind {
    if is_upper_name(word) {
        LexKind::UpperIdent
    } else if is_pascal_name(word) {
        LexKind::PascalIdent
    } else {
        LexKind::Ident
    }
}

pub struct GrammarLexer<'c> {
    code: &'c Code<'c>,
    pointer: usize,
    /// Nothing but whitespace or comments has been seen on the current line; section markers
    /// are only recognized in this state.
    fresh_line: bool,
}

impl<'c> GrammarLexer<'c> {
    pub fn new(code: &'c Code<'c>) -> Self {
        Self {
            code,
            pointer: 0,
            fresh_line: true,
        }
    }

    /// Tokenize the whole description. Lexical errors are reported to the sink and the
    /// offending bytes skipped, so the returned stream covers everything recognizable.
    pub fn tokenize(mut self, sink: &mut DiagnosticSink) -> Vec<Lexeme> {
        let mut stream = Vec::new();
        loop {
            self.consume_blank(sink);
            let position = self.position();
            let byte = match self.peek() {
                Some(b) => b,
                None => break,
            };
            match self.consume_lexeme(byte, position, sink) {
                Some(lexeme) => {
                    self.fresh_line = false;
                    stream.push(lexeme);
                }
                None => continue,
            }
        }
        stream
    }

    fn consume_lexeme(
        &mut self,
        byte: u8,
        position: Position,
        sink: &mut DiagnosticSink,
    ) -> Option<Lexeme> {
        match byte {
            b'.' => self.consume_dot(position),
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                let word = self.consume_word();
                Some(Lexeme::new(classify_word(&word), word, position))
            }
            b'`' => self.consume_regex(position, sink),
            b'\'' | b'"' => self.consume_string(byte, position, sink),
            b'@' => self.consume_decorator(position, sink),
            b'^' => self.consume_exclusion(position, sink),
            b'=' => {
                self.pointer += 1;
                if self.peek() == Some(b'>') {
                    self.pointer += 1;
                    Some(Lexeme::new(LexKind::Arrow, "=>".into(), position))
                } else {
                    Some(Lexeme::new(LexKind::Equal, "=".into(), position))
                }
            }
            _ => {
                let kind = match byte {
                    b':' => Some(LexKind::Colon),
                    b';' => Some(LexKind::Semicolon),
                    b'|' => Some(LexKind::Pipe),
                    b',' => Some(LexKind::Comma),
                    b'(' => Some(LexKind::OpenParen),
                    b')' => Some(LexKind::CloseParen),
                    b'[' => Some(LexKind::OpenBracket),
                    b']' => Some(LexKind::CloseBracket),
                    b'{' => Some(LexKind::OpenBrace),
                    b'}' => Some(LexKind::CloseBrace),
                    b'*' => Some(LexKind::Star),
                    b'+' => Some(LexKind::Plus),
                    b'?' => Some(LexKind::Question),
                    _ => None,
                };
                self.pointer += 1;
                match kind {
                    Some(kind) => {
                        let text = (byte as char).to_string();
                        Some(Lexeme::new(kind, text, position))
                    }
                    None => {
                        sink.error(
                            format!("Unexpected character '{}'.", byte.escape_ascii()),
                            Some(position),
                        );
                        None
                    }
                }
            }
        }
    }

    /// Skip whitespace, `;;` line comments and `;* … *;` block comments. A lone semicolon is
    /// left for [consume_lexeme](Self::consume_lexeme).
    fn consume_blank(&mut self, sink: &mut DiagnosticSink) {
        loop {
            match self.peek() {
                Some(b'\n') => {
                    self.fresh_line = true;
                    self.pointer += 1;
                }
                Some(b) if b.is_ascii_whitespace() => self.pointer += 1,
                Some(b';') => match self.peek_at(1) {
                    Some(b';') => {
                        while !matches!(self.peek(), None | Some(b'\n')) {
                            self.pointer += 1;
                        }
                    }
                    Some(b'*') => self.consume_block_comment(sink),
                    _ => break,
                },
                _ => break,
            }
        }
    }

    fn consume_block_comment(&mut self, sink: &mut DiagnosticSink) {
        let position = self.position();
        self.pointer += 2;
        loop {
            match self.peek() {
                None => {
                    sink.error("Unterminated block comment.".into(), Some(position));
                    return;
                }
                Some(b'*') if self.peek_at(1) == Some(b';') => {
                    self.pointer += 2;
                    return;
                }
                Some(b'\n') => {
                    self.fresh_line = true;
                    self.pointer += 1;
                }
                Some(_) => self.pointer += 1,
            }
        }
    }

    fn consume_dot(&mut self, position: Position) -> Option<Lexeme> {
        let at_line_start = self.fresh_line;
        self.pointer += 1;
        if at_line_start {
            let mark = self.pointer;
            let word = self.consume_word();
            let kind = match word.as_str() {
                "token" => Some(LexKind::TokenSection),
                "rules" => Some(LexKind::RulesSection),
                "end" => Some(LexKind::SectionEnd),
                _ => None,
            };
            if let Some(kind) = kind {
                return Some(Lexeme::new(kind, format!(".{}", word), position));
            }
            self.pointer = mark;
        }
        Some(Lexeme::new(LexKind::Dot, ".".into(), position))
    }

    fn consume_word(&mut self) -> String {
        let start = self.pointer;
        while matches!(
            self.peek(),
            Some(b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')
        ) {
            self.pointer += 1;
        }
        String::from_utf8_lossy(&self.code.value[start..self.pointer]).into_owned()
    }

    fn consume_regex(&mut self, position: Position, sink: &mut DiagnosticSink) -> Option<Lexeme> {
        self.pointer += 1;
        let start = self.pointer;
        loop {
            match self.peek() {
                None => {
                    sink.error("Unterminated regex literal.".into(), Some(position));
                    return None;
                }
                Some(b'`') => break,
                Some(b'\n') => {
                    self.fresh_line = true;
                    self.pointer += 1;
                }
                Some(_) => self.pointer += 1,
            }
        }
        let text = String::from_utf8_lossy(&self.code.value[start..self.pointer]).into_owned();
        self.pointer += 1;
        Some(Lexeme::new(LexKind::Regex, text, position))
    }

    fn consume_string(
        &mut self,
        delimiter: u8,
        position: Position,
        sink: &mut DiagnosticSink,
    ) -> Option<Lexeme> {
        self.pointer += 1;
        let mut text = Vec::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    sink.error("Unterminated string literal.".into(), Some(position));
                    return None;
                }
                Some(b'\\') if self.peek_at(1) == Some(delimiter) => {
                    text.push(delimiter);
                    self.pointer += 2;
                }
                Some(b) if b == delimiter => {
                    self.pointer += 1;
                    break;
                }
                Some(b) => {
                    text.push(b);
                    self.pointer += 1;
                }
            }
        }
        let text = String::from_utf8_lossy(&text).into_owned();
        Some(Lexeme::new(LexKind::Str, text, position))
    }

    fn consume_decorator(
        &mut self,
        position: Position,
        sink: &mut DiagnosticSink,
    ) -> Option<Lexeme> {
        self.pointer += 1;
        match self.peek() {
            Some(b'{') => {
                self.pointer += 1;
                Some(Lexeme::new(LexKind::AttrOpen, "@{".into(), position))
            }
            Some(digit @ b'0'..=b'9') => {
                self.pointer += 1;
                Some(Lexeme::new(
                    LexKind::Decorator,
                    (digit as char).to_string(),
                    position,
                ))
            }
            Some(b'A'..=b'Z' | b'a'..=b'z' | b'_') => {
                let word = self.consume_word();
                Some(Lexeme::new(LexKind::Decorator, word, position))
            }
            _ => {
                sink.error(
                    "'@' must begin a decorator or an '@{' block.".into(),
                    Some(position),
                );
                None
            }
        }
    }

    fn consume_exclusion(
        &mut self,
        position: Position,
        sink: &mut DiagnosticSink,
    ) -> Option<Lexeme> {
        self.pointer += 1;
        let word = self.consume_word();
        if is_upper_name(&word) {
            Some(Lexeme::new(LexKind::Exclusion, word, position))
        } else {
            sink.error(
                "'^' must be followed by an uppercase group name.".into(),
                Some(position),
            );
            None
        }
    }

    fn peek(&self) -> Option<u8> {
        self.code.value.get(self.pointer).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.code.value.get(self.pointer + offset).copied()
    }

    fn position(&self) -> Position {
        self.code.obtain_position(self.pointer)
    }
}
