// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Comment extraction for Rust source.
//!
//! A single forward pass that skips string, raw string, byte string, C string,
//! and character literals, and yields every comment with the position of its
//! opening delimiter. Lifetimes and labels are told apart from character
//! literals by looking for the closing quote.

use crate::position::Position;

/// Comment delimiter style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `// ...` up to the end of the line (includes `///` and `//!`).
    Line,
    /// `/* ... */`, possibly nested.
    Block,
}

/// A comment found in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment<'a> {
    /// Full comment text including delimiters, without the line terminator.
    pub text: &'a str,
    /// Position of the first `/`.
    pub position: Position,
    pub kind: CommentKind,
}

/// Extract every comment from `source`, in source order.
pub fn comments(source: &str) -> Vec<Comment<'_>> {
    let mut cursor = Cursor::new(source);
    let mut found = Vec::new();

    while let Some(byte) = cursor.peek(0) {
        match byte {
            b'/' if cursor.peek(1) == Some(b'/') => found.push(cursor.line_comment()),
            b'/' if cursor.peek(1) == Some(b'*') => found.push(cursor.block_comment()),
            b'"' => cursor.quoted_string(),
            b'\'' => cursor.char_or_lifetime(),
            b'0'..=b'9' => {
                cursor.word();
            }
            b if is_ident_start(b) => {
                let word = cursor.word();
                cursor.literal_after_prefix(word);
            }
            _ => cursor.bump(),
        }
    }

    found
}

fn is_ident_start(byte: u8) -> bool {
    byte == b'_' || byte.is_ascii_alphabetic() || byte >= 0x80
}

fn is_ident_continue(byte: u8) -> bool {
    byte == b'_' || byte.is_ascii_alphanumeric() || byte >= 0x80
}

struct Cursor<'a> {
    source: &'a str,
    bytes: &'a [u8],
    offset: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        // A byte order mark does not occupy a column.
        let offset = if source.starts_with('\u{feff}') { 3 } else { 0 };
        Self {
            source,
            bytes: source.as_bytes(),
            offset,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.offset + ahead).copied()
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Advance one byte, keeping the character column in sync.
    fn bump(&mut self) {
        let Some(byte) = self.peek(0) else {
            return;
        };
        self.offset += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else if byte & 0xC0 != 0x80 {
            // Only the leading byte of a UTF-8 sequence starts a new character.
            self.column += 1;
        }
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn line_comment(&mut self) -> Comment<'a> {
        let start = self.offset;
        let position = self.position();
        while let Some(byte) = self.peek(0) {
            if byte == b'\n' {
                break;
            }
            self.bump();
        }
        let text = self.source[start..self.offset].trim_end_matches('\r');
        Comment {
            text,
            position,
            kind: CommentKind::Line,
        }
    }

    fn block_comment(&mut self) -> Comment<'a> {
        let start = self.offset;
        let position = self.position();
        self.bump_n(2);
        let mut depth = 1usize;
        while let Some(byte) = self.peek(0) {
            match (byte, self.peek(1)) {
                (b'/', Some(b'*')) => {
                    depth += 1;
                    self.bump_n(2);
                }
                (b'*', Some(b'/')) => {
                    self.bump_n(2);
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => self.bump(),
            }
        }
        Comment {
            text: &self.source[start..self.offset],
            position,
            kind: CommentKind::Block,
        }
    }

    /// Skip a `"..."` literal with backslash escapes. Cursor is on the opening quote.
    fn quoted_string(&mut self) {
        self.bump();
        while let Some(byte) = self.peek(0) {
            match byte {
                b'\\' => self.bump_n(2),
                b'"' => {
                    self.bump();
                    return;
                }
                _ => self.bump(),
            }
        }
    }

    /// Skip `r"..."`, `r#"..."#` and friends. Cursor is on the first `#` or `"`.
    ///
    /// Returns false without moving when the hashes are not followed by a quote,
    /// which is a raw identifier such as `r#type`.
    fn raw_string(&mut self) -> bool {
        let mut hashes = 0usize;
        while self.peek(hashes) == Some(b'#') {
            hashes += 1;
        }
        if self.peek(hashes) != Some(b'"') {
            return false;
        }
        self.bump_n(hashes + 1);
        while let Some(byte) = self.peek(0) {
            if byte == b'"' && (1..=hashes).all(|i| self.peek(i) == Some(b'#')) {
                self.bump_n(hashes + 1);
                return true;
            }
            self.bump();
        }
        true
    }

    /// Cursor is on a `'`: either a character literal or a lifetime/label.
    fn char_or_lifetime(&mut self) {
        if self.peek(1) == Some(b'\\') {
            self.bump_n(3);
            while let Some(byte) = self.peek(0) {
                self.bump();
                if byte == b'\'' || byte == b'\n' {
                    return;
                }
            }
            return;
        }

        let width = self.source[self.offset + 1..]
            .chars()
            .next()
            .map_or(0, char::len_utf8);
        if width > 0 && self.peek(1 + width) == Some(b'\'') {
            self.bump_n(width + 2);
        } else {
            // Lifetime or label: the identifier is consumed by the main loop.
            self.bump();
        }
    }

    /// Consume an identifier or number and return it.
    fn word(&mut self) -> &'a str {
        let start = self.offset;
        while let Some(byte) = self.peek(0) {
            if !is_ident_continue(byte) {
                break;
            }
            self.bump();
        }
        &self.source[start..self.offset]
    }

    /// Handle literal prefixes such as `b"..."`, `br#"..."#`, `c"..."`, `b'x'`.
    fn literal_after_prefix(&mut self, word: &str) {
        match (word, self.peek(0)) {
            ("r" | "br" | "cr", Some(b'"' | b'#')) => {
                self.raw_string();
            }
            ("b" | "c", Some(b'"')) => self.quoted_string(),
            ("b", Some(b'\'')) => self.char_or_lifetime(),
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "lexer_tests.rs"]
mod tests;
