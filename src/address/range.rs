use super::resolver::LineLookup;
use super::tokenizer::{Address, find_separator};
use crate::error::{EdError, EdResult, ParseError};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Comma,
    Semicolon,
}

/// A resolved, inclusive pair of line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(line: usize) -> Self {
        Self::new(line, line)
    }

    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start, self.end)
    }
}

/// Two addresses and the separator between them, as typed. Defaults for the
/// missing sides are applied at resolution time because `;` makes the end
/// depend on the start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressRange {
    pub start: Address,
    pub end: Address,
    pub separator: Option<Separator>,
}

impl AddressRange {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let Some(pos) = find_separator(input) else {
            return Ok(Self {
                start: Address::parse(input)?,
                end: Address::Unspecified,
                separator: None,
            });
        };

        let separator = if input.as_bytes()[pos] == b',' {
            Separator::Comma
        } else {
            Separator::Semicolon
        };
        let rest = &input[pos + 1..];
        if find_separator(rest).is_some() {
            return Err(ParseError::UnrecognisedRange);
        }

        let end = Address::parse(rest).map_err(|err| err.shifted(pos + 1))?;
        Ok(Self {
            start: Address::parse(&input[..pos])?,
            end,
            separator: Some(separator),
        })
    }

    /// A range covering exactly the given lines.
    pub fn lines(start: usize, end: usize) -> Self {
        Self {
            start: Address::line(start),
            end: Address::line(end),
            separator: Some(Separator::Comma),
        }
    }

    pub fn is_specified(&self) -> bool {
        self.separator.is_some() || self.start.is_specified()
    }

    /// Resolves both sides, or returns `(current, current)` when nothing was typed.
    pub fn resolve<L: LineLookup + ?Sized>(
        &self,
        current: usize,
        lookup: &mut L,
    ) -> EdResult<LineRange> {
        if !self.is_specified() {
            return Ok(LineRange::single(current));
        }

        let last_line = lookup.line_count();
        let both_missing = !self.start.is_specified() && !self.end.is_specified();

        let start = match (self.start.is_specified(), self.separator) {
            (true, _) => self.start.resolve(current, lookup)?,
            (false, Some(Separator::Comma)) => 1,
            (false, _) => current,
        };

        let current_for_end = if self.separator == Some(Separator::Semicolon) {
            start
        } else {
            current
        };

        let end = if self.end.is_specified() {
            self.end.resolve(current_for_end, lookup)?
        } else if both_missing {
            last_line
        } else {
            start
        };

        if start > end {
            return Err(EdError::BadRange);
        }
        Ok(LineRange::new(start, end))
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = match self.separator {
            Some(Separator::Comma) => ",",
            Some(Separator::Semicolon) => ";",
            None => "",
        };
        write!(f, "{:?}{}{:?}", self.start.atoms(), sep, self.end.atoms())
    }
}
