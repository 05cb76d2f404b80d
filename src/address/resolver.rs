use super::tokenizer::{Address, Atom};
use crate::document_model::SearchDirection;
use crate::error::{EdError, EdResult};
use tracing::trace;

/// What address resolution needs to know about the editor.
pub trait LineLookup {
    fn line_count(&self) -> usize;

    fn mark(&self, name: char) -> Option<usize>;

    /// Finds the next line matching `pattern` strictly after (or before) `from`,
    /// wrapping around the buffer once. An empty pattern reuses the last one.
    fn search(
        &mut self,
        pattern: &str,
        from: usize,
        direction: SearchDirection,
    ) -> EdResult<usize>;
}

impl Address {
    /// Folds the atoms into a line number, starting from `current`.
    ///
    /// An unsigned number is absolute only while nothing before it has moved
    /// the running line; after any other atom, or with an explicit sign, it is
    /// a delta. The result must lie in `0..=line_count`; whether 0 is usable is
    /// up to the command.
    pub fn resolve<L: LineLookup + ?Sized>(&self, current: usize, lookup: &mut L) -> EdResult<usize> {
        let atoms = match self {
            Address::Unspecified => return Ok(current),
            Address::Atoms(atoms) => atoms,
        };

        let last_line = lookup.line_count() as i64;
        let mut line = current as i64;
        let mut offset_mode = false;

        for atom in atoms {
            match atom {
                Atom::Dot => {}
                Atom::Increment => line += 1,
                Atom::Decrement => line -= 1,
                Atom::EndOfFile => line = last_line,
                Atom::Mark(name) => {
                    line = lookup.mark(*name).ok_or(EdError::UnknownMark(*name))? as i64;
                }
                Atom::SearchForward(pattern) => {
                    let from = line.clamp(0, last_line) as usize;
                    line = lookup.search(pattern, from, SearchDirection::Forward)? as i64;
                }
                Atom::SearchBackward(pattern) => {
                    let from = line.clamp(0, last_line) as usize;
                    line = lookup.search(pattern, from, SearchDirection::Backward)? as i64;
                }
                Atom::Number { text, signed } => {
                    let value: i64 = text.parse().map_err(|_| EdError::InvalidLine)?;
                    if offset_mode || *signed {
                        line = line.checked_add(value).ok_or(EdError::InvalidLine)?;
                    } else {
                        line = value;
                    }
                }
            }
            offset_mode = true;
        }

        trace!(?atoms, current, line, "resolved address");
        if line < 0 || line > last_line {
            return Err(EdError::InvalidLine);
        }
        Ok(line as usize)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    /// Plain substring search over a fixed set of lines.
    pub(crate) struct FakeLookup {
        pub lines: Vec<String>,
        pub marks: HashMap<char, usize>,
    }

    impl FakeLookup {
        pub fn new(lines: &[&str]) -> Self {
            Self {
                lines: lines.iter().map(|l| l.to_string()).collect(),
                marks: HashMap::new(),
            }
        }
    }

    impl LineLookup for FakeLookup {
        fn line_count(&self) -> usize {
            self.lines.len()
        }

        fn mark(&self, name: char) -> Option<usize> {
            self.marks.get(&name).copied()
        }

        fn search(
            &mut self,
            pattern: &str,
            from: usize,
            direction: SearchDirection,
        ) -> EdResult<usize> {
            let n = self.lines.len();
            for step in 1..=n {
                let line = match direction {
                    SearchDirection::Forward => (from + step - 1) % n + 1,
                    SearchDirection::Backward => (from + n - step % n - 1) % n + 1,
                };
                if self.lines[line - 1].contains(pattern) {
                    return Ok(line);
                }
            }
            Err(EdError::NoMatch)
        }
    }

    fn resolve(input: &str, current: usize, lookup: &mut FakeLookup) -> EdResult<usize> {
        Address::parse(input).unwrap().resolve(current, lookup)
    }

    fn five_lines() -> FakeLookup {
        FakeLookup::new(&["1", "2", "3", "4", "5"])
    }

    #[test]
    fn test_unsigned_number_is_absolute() {
        let mut lookup = FakeLookup::new(&["a"; 10]);
        assert_eq!(resolve("3", 7, &mut lookup).unwrap(), 3);
        assert_eq!(resolve("3", 1, &mut lookup).unwrap(), 3);
    }

    #[test]
    fn test_signed_or_offset_number_is_relative() {
        let mut lookup = FakeLookup::new(&["a"; 12]);
        assert_eq!(resolve("+3", 7, &mut lookup).unwrap(), 10);
        assert_eq!(resolve(".+3", 7, &mut lookup).unwrap(), 10);
        assert_eq!(resolve("++-3", 7, &mut lookup).unwrap(), 6);
        assert_eq!(resolve("+ 2", 4, &mut lookup).unwrap(), 7);
        assert_eq!(resolve("3 4", 1, &mut lookup).unwrap(), 7);
    }

    #[test]
    fn test_end_of_file_offsets() {
        let mut lookup = five_lines();
        assert_eq!(resolve("$-1", 1, &mut lookup).unwrap(), 4);
        assert!(matches!(
            resolve("$1", 1, &mut lookup),
            Err(EdError::InvalidLine)
        ));
        assert_eq!(resolve("$", 2, &mut lookup).unwrap(), 5);
    }

    #[test]
    fn test_out_of_range_is_an_error() {
        let mut lookup = five_lines();
        assert!(matches!(resolve("-", 1, &mut lookup), Ok(0)));
        assert!(matches!(resolve("--", 1, &mut lookup), Err(EdError::InvalidLine)));
        assert!(matches!(resolve("6", 1, &mut lookup), Err(EdError::InvalidLine)));
        assert!(matches!(
            resolve("99999999999999999999999", 1, &mut lookup),
            Err(EdError::InvalidLine)
        ));
    }

    #[test]
    fn test_marks() {
        let mut lookup = five_lines();
        lookup.marks.insert('a', 2);
        assert_eq!(resolve("'a", 5, &mut lookup).unwrap(), 2);
        assert_eq!(resolve("'a+2", 5, &mut lookup).unwrap(), 4);
        assert!(matches!(
            resolve("'b", 5, &mut lookup),
            Err(EdError::UnknownMark('b'))
        ));
    }

    #[test]
    fn test_search_wraps_around() {
        let mut lookup = FakeLookup::new(&["1 first line", "2", "3", "4 123", "5", "6 456regex"]);
        assert_eq!(resolve("/123/", 2, &mut lookup).unwrap(), 4);
        assert_eq!(resolve("/first/", 4, &mut lookup).unwrap(), 1);
        assert_eq!(resolve("?regex?", 2, &mut lookup).unwrap(), 6);
        assert_eq!(resolve("/123/+1", 1, &mut lookup).unwrap(), 5);
        // the current line itself is checked last
        assert_eq!(resolve("/123/", 4, &mut lookup).unwrap(), 4);
        assert!(matches!(
            resolve("/nowhere/", 1, &mut lookup),
            Err(EdError::NoMatch)
        ));
    }

    #[test]
    fn test_unspecified_is_current() {
        let mut lookup = five_lines();
        assert_eq!(Address::Unspecified.resolve(3, &mut lookup).unwrap(), 3);
    }

    proptest! {
        #[test]
        fn prop_resolution_stays_in_bounds(
            input in "[0-9+\\-.$ ]{0,8}",
            len in 0usize..20,
            current_seed in 0usize..20,
        ) {
            let current = current_seed.min(len);
            let lines: Vec<&str> = vec!["x"; len];
            let mut lookup = FakeLookup::new(&lines);
            if let Ok(address) = Address::parse(&input) {
                if let Ok(line) = address.resolve(current, &mut lookup) {
                    prop_assert!(line <= len);
                }
            }
        }
    }
}
