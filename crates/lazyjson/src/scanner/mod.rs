//! Scanner: a cursor over one input byte slice.
//!
//! What it does
//! - Tracks the current byte offset and the table state of the token being
//!   scanned.
//! - Provides the token primitives shared by the JSON decoder and the
//!   JSONPath/expression compilers: strings, numbers, case-insensitive
//!   literals, identifier words, balanced bracket groups and skipping to a
//!   delimiter.
//! - Builds errors that carry the current offset (and the offending byte).
//!
//! Invariants
//! - `index <= data.len()`. `index == data.len()` means the input is
//!   exhausted; every primitive that needs one more byte then fails with
//!   [`ErrorKind::UnexpectedEndOfInput`](crate::ErrorKind).
//! - Primitives leave `index` on the first byte that does not belong to the
//!   token they consumed.
//!
//! Example
//! ```ignore
//! let mut s = Scanner::new(b"  1.5e3,");
//! assert_eq!(s.first_non_space()?, b'1');
//! s.consume_numeric()?;
//! assert_eq!(s.current()?, b',');
//! ```

use crate::{
    Error,
    classes::{self, Class, INVALID, OK, ST, classify, is_number_end, json_next},
};

#[derive(Debug, Clone)]
pub(crate) struct Scanner<'a> {
    data: &'a [u8],
    index: usize,
    /// State of the token being scanned.
    state: i8,
}

type Result<T> = core::result::Result<T, Error>;

impl<'a> Scanner<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            index: 0,
            state: classes::GO,
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Moves the cursor back (or forward) to `index`.
    #[inline]
    pub fn seek(&mut self, index: usize) {
        debug_assert!(index <= self.data.len());
        self.index = index;
    }

    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Bytes between `start` and the current position.
    #[inline]
    pub fn since(&self, start: usize) -> &'a [u8] {
        &self.data[start..self.index]
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.index).copied()
    }

    /// The byte under the cursor.
    #[inline]
    pub fn current(&self) -> Result<u8> {
        self.peek().ok_or_else(|| self.error_eof())
    }

    #[inline]
    fn set_state(&mut self, state: i8) {
        self.state = state;
    }

    /// Advances one byte.
    ///
    /// Fails once the cursor would move past the last byte; the cursor is then
    /// left at the end of input.
    pub fn step(&mut self) -> Result<()> {
        if self.index + 1 < self.data.len() {
            self.index += 1;
            Ok(())
        } else {
            self.index = self.data.len();
            Err(self.error_eof())
        }
    }

    /// Moves past spaces, tabs, carriage returns and line feeds and returns
    /// the next significant byte without consuming it.
    pub fn first_non_space(&mut self) -> Result<u8> {
        while let Some(b) = self.peek() {
            if !matches!(classify(b), Class::Space | Class::Whitespace) {
                return Ok(b);
            }
            self.index += 1;
        }
        Err(self.error_eof())
    }

    /// Scans a JSON string starting at its opening quote, validating escapes
    /// through the state table. Leaves the cursor after the closing quote.
    pub fn consume_json_string(&mut self) -> Result<()> {
        debug_assert_eq!(self.peek(), Some(b'"'));
        self.set_state(ST);
        loop {
            self.step()?;
            let b = self.data[self.index];
            match json_next(self.state, classify(b)) {
                INVALID => return Err(self.error_symbol()),
                OK => {
                    self.set_state(OK);
                    self.index += 1;
                    return Ok(());
                }
                next => self.set_state(next),
            }
        }
    }

    /// Scans a string delimited by `quote`, starting at the opening quote.
    ///
    /// A candidate terminator preceded by an odd run of backslashes is
    /// escaped. Escapes are not validated here. Leaves the cursor after the
    /// closing quote.
    pub fn consume_string(&mut self, quote: u8) -> Result<()> {
        let mut backslashes = 0usize;
        loop {
            self.step()?;
            let b = self.data[self.index];
            if b == quote && backslashes % 2 == 0 {
                self.index += 1;
                return Ok(());
            }
            if b == b'\\' {
                backslashes += 1;
            } else {
                backslashes = 0;
            }
        }
    }

    /// Scans one number literal starting at the cursor.
    ///
    /// The literal ends at the first byte without a transition; it is an
    /// error if the number is incomplete at that point. Exponent digits may
    /// be followed by another fraction or exponent (`1.123e3.456`).
    pub fn consume_numeric(&mut self) -> Result<()> {
        let b = self.current()?;
        let start = json_next(classes::GO, classify(b));
        if !matches!(
            start,
            classes::MI | classes::ZE | classes::IN | classes::FR | classes::E1
        ) {
            return Err(self.error_symbol());
        }
        self.set_state(start);
        loop {
            self.index += 1;
            let Some(b) = self.peek() else {
                return if is_number_end(self.state) {
                    Ok(())
                } else {
                    Err(self.error_eof())
                };
            };
            match json_next(self.state, classify(b)) {
                next if next >= 0 => self.set_state(next),
                _ if is_number_end(self.state) => return Ok(()),
                _ => return Err(self.error_symbol()),
            }
        }
    }

    /// Matches `word` case-insensitively at the cursor and moves past it.
    pub fn consume_literal(&mut self, word: &[u8]) -> Result<()> {
        for &expected in word {
            let b = self.current()?;
            if !b.eq_ignore_ascii_case(&expected) {
                return Err(self.error_symbol());
            }
            self.index += 1;
        }
        self.set_state(OK);
        Ok(())
    }

    /// Consumes `[A-Za-z0-9_]*` and returns it.
    pub fn word(&mut self) -> &'a [u8] {
        let start = self.index;
        while self.peek().is_some_and(classes::is_word) {
            self.index += 1;
        }
        self.since(start)
    }

    /// Consumes a run of operator bytes and returns it.
    pub fn operator_run(&mut self) -> &'a [u8] {
        let start = self.index;
        while self.peek().is_some_and(classes::is_operator) {
            self.index += 1;
        }
        self.since(start)
    }

    /// Advances to the next unescaped occurrence of `target`, leaving the
    /// cursor on it.
    pub fn skip_to(&mut self, target: u8) -> Result<()> {
        self.skip_to_any(&[target]).map(|_| ())
    }

    /// Advances to the next unescaped byte contained in `set`, leaving the
    /// cursor on it, and returns that byte.
    pub fn skip_to_any(&mut self, set: &[u8]) -> Result<u8> {
        let mut backslashes = 0usize;
        while let Some(b) = self.peek() {
            if set.contains(&b) && backslashes % 2 == 0 {
                return Ok(b);
            }
            if b == b'\\' {
                backslashes += 1;
            } else {
                backslashes = 0;
            }
            self.index += 1;
        }
        Err(self.error_eof())
    }

    /// Consumes a bracketed group starting at the opening byte `open` up to
    /// and including its matching `close`. Quoted strings inside the group are
    /// skipped whole, so brackets inside them do not count.
    pub fn consume_balanced(&mut self, open: u8, close: u8) -> Result<()> {
        debug_assert_eq!(self.peek(), Some(open));
        let mut depth = 0usize;
        loop {
            let b = self.current()?;
            match b {
                b'"' | b'\'' => {
                    self.consume_string(b)?;
                    continue;
                }
                _ if b == open => depth += 1,
                _ if b == close => {
                    depth -= 1;
                    if depth == 0 {
                        self.index += 1;
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.index += 1;
        }
    }

    /// Error for the byte under the cursor, or end of input if there is none.
    pub fn error_symbol(&self) -> Error {
        match self.peek() {
            Some(b) => Error::wrong_symbol(self.index, b),
            None => self.error_eof(),
        }
    }

    pub fn error_eof(&self) -> Error {
        Error::unexpected_end(self.index)
    }
}
