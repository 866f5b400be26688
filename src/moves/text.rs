//! Operand-level helpers for the whitespace-tokenized move text.
//!
//! Opcodes print their operands through a [`MoveWriter`] and read them back
//! through a [`MoveReader`], so every game shares one tokenizer and one set
//! of error messages.

use std::fmt::Display;
use std::iter::Peekable;
use std::str::{FromStr, SplitWhitespace};

use crate::board::{CellId, ZoneId};
use crate::core::{EngineError, EngineResult, PlayerId};

use super::names::NameTable;

/// Accumulates operand tokens.
#[derive(Debug, Default)]
pub struct MoveWriter {
    out: String,
}

impl MoveWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn starting_with(out: String) -> Self {
        Self { out }
    }

    pub fn word(&mut self, word: &str) -> &mut Self {
        if !self.out.is_empty() {
            self.out.push(' ');
        }
        self.out.push_str(word);
        self
    }

    pub fn int(&mut self, value: impl Display) -> &mut Self {
        self.word(&value.to_string())
    }

    pub fn col(&mut self, col: char) -> &mut Self {
        let mut buf = [0u8; 4];
        self.word(col.encode_utf8(&mut buf))
    }

    pub fn player(&mut self, player: PlayerId) -> &mut Self {
        self.word(&player.to_string())
    }

    /// `<zone> <col> <row>`; zones missing from the table print as `#<id>`.
    pub fn cell(&mut self, zones: &NameTable, cell: CellId) -> &mut Self {
        match zones.name(cell.zone.0) {
            Some(name) => self.word(name),
            None => self.word(&format!("#{}", cell.zone.0)),
        };
        self.col(cell.col).int(cell.row)
    }

    #[must_use]
    pub fn finish(self) -> String {
        self.out
    }
}

/// Pulls operand tokens, reporting failures against the full move text.
#[derive(Debug)]
pub struct MoveReader<'a> {
    text: &'a str,
    tokens: Peekable<SplitWhitespace<'a>>,
}

impl<'a> MoveReader<'a> {
    pub(crate) fn new(text: &'a str, tokens: Peekable<SplitWhitespace<'a>>) -> Self {
        Self { text, tokens }
    }

    fn fail(&self, reason: impl Into<String>) -> EngineError {
        EngineError::malformed(self.text, reason)
    }

    pub fn word(&mut self, what: &str) -> EngineResult<&'a str> {
        match self.tokens.next() {
            Some(tok) => Ok(tok),
            None => Err(self.fail(format!("missing {what}"))),
        }
    }

    pub fn int<T: FromStr>(&mut self, what: &str) -> EngineResult<T> {
        let tok = self.word(what)?;
        tok.parse::<T>()
            .map_err(|_| self.fail(format!("{what} {tok:?} is not a number")))
    }

    /// A single-letter column, normalized to upper case.
    pub fn col(&mut self) -> EngineResult<char> {
        let tok = self.word("column")?;
        let mut chars = tok.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => Ok(c.to_ascii_uppercase()),
            _ => Err(self.fail(format!("column {tok:?} is not a letter"))),
        }
    }

    pub fn player(&mut self) -> EngineResult<PlayerId> {
        let tok = self.word("player")?;
        tok.parse::<PlayerId>().map_err(|reason| self.fail(reason))
    }

    pub fn cell(&mut self, zones: &NameTable) -> EngineResult<CellId> {
        let tok = self.word("zone")?;
        let zone = match tok.strip_prefix('#') {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| self.fail(format!("zone {tok:?} is not a number")))?,
            None => zones
                .code(tok)
                .ok_or_else(|| self.fail(format!("unknown zone {tok:?}")))?,
        };
        let col = self.col()?;
        let row = self.int::<i32>("row")?;
        Ok(CellId::new(ZoneId(zone), col, row))
    }

    /// Fails if operand tokens remain.
    pub fn finish(mut self) -> EngineResult<()> {
        match self.tokens.next() {
            None => Ok(()),
            Some(extra) => Err(self.fail(format!("unexpected operand {extra:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONES: NameTable = NameTable::new(&[("Board", 0), ("Rack", 1)]);

    fn reader(text: &str) -> MoveReader<'_> {
        MoveReader::new(text, text.split_whitespace().peekable())
    }

    #[test]
    fn test_writer_tokens() {
        let mut w = MoveWriter::new();
        w.word("Move")
            .cell(&ZONES, CellId::new(ZoneId(1), 'A', 0))
            .cell(&ZONES, CellId::new(ZoneId(0), 'C', 3));
        assert_eq!(w.finish(), "Move Rack A 0 Board C 3");
    }

    #[test]
    fn test_writer_unnamed_zone() {
        let mut w = MoveWriter::new();
        w.cell(&ZONES, CellId::new(ZoneId(7), 'B', -2));
        assert_eq!(w.finish(), "#7 B -2");
    }

    #[test]
    fn test_reader_cell_and_finish() {
        let mut r = reader("board c 3 #7 B -2");
        assert_eq!(r.cell(&ZONES).unwrap(), CellId::new(ZoneId(0), 'C', 3));
        assert_eq!(r.cell(&ZONES).unwrap(), CellId::new(ZoneId(7), 'B', -2));
        assert!(r.finish().is_ok());
    }

    #[test]
    fn test_reader_errors() {
        assert!(matches!(
            reader("Shelf A 1").cell(&ZONES),
            Err(EngineError::MalformedMove { .. })
        ));
        assert!(reader("Board AB 1").cell(&ZONES).is_err());
        assert!(reader("Board A x").cell(&ZONES).is_err());
        assert!(reader("").int::<u8>("card").is_err());
        assert!(reader("P1 extra").player().is_ok());

        let mut r = reader("P1 extra");
        r.player().unwrap();
        assert!(r.finish().is_err());
    }
}
