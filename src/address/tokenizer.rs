use crate::error::ParseError;

/// One parsed token of an address expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    Dot,
    EndOfFile,
    Increment,
    Decrement,
    Mark(char),
    SearchForward(String),
    SearchBackward(String),
    /// A digit run, optionally with a leading sign. `signed` decides whether the
    /// number can ever be absolute.
    Number { text: String, signed: bool },
}

/// An unresolved address. `Unspecified` is what an empty (or blank) address
/// string produces; the caller decides what it defaults to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Address {
    #[default]
    Unspecified,
    Atoms(Vec<Atom>),
}

impl Address {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        tokenize(input)
    }

    /// An address that always resolves to `line`.
    pub fn line(line: usize) -> Self {
        Address::Atoms(vec![Atom::Number {
            text: line.to_string(),
            signed: false,
        }])
    }

    pub fn is_specified(&self) -> bool {
        !matches!(self, Address::Unspecified)
    }

    pub fn atoms(&self) -> &[Atom] {
        match self {
            Address::Unspecified => &[],
            Address::Atoms(atoms) => atoms,
        }
    }
}

/// Splits an address string into atoms, scanning left to right.
///
/// A signed number is tried before a bare `+`/`-` so that `+23` is one atom.
/// Anything between tokens that is not whitespace is an error.
pub fn tokenize(input: &str) -> Result<Address, ParseError> {
    let bytes = input.as_bytes();
    let mut atoms = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        match c {
            b' ' | b'\t' => {
                pos += 1;
            }
            b'+' | b'-' => {
                let digits = digit_run(bytes, pos + 1);
                if digits > 0 {
                    let end = pos + 1 + digits;
                    atoms.push(Atom::Number {
                        text: input[pos..end].to_string(),
                        signed: true,
                    });
                    pos = end;
                } else {
                    atoms.push(if c == b'+' {
                        Atom::Increment
                    } else {
                        Atom::Decrement
                    });
                    pos += 1;
                }
            }
            b'0'..=b'9' => {
                let end = pos + digit_run(bytes, pos);
                atoms.push(Atom::Number {
                    text: input[pos..end].to_string(),
                    signed: false,
                });
                pos = end;
            }
            b'.' => {
                atoms.push(Atom::Dot);
                pos += 1;
            }
            b'$' => {
                atoms.push(Atom::EndOfFile);
                pos += 1;
            }
            b'\'' => {
                let name = input[pos + 1..].chars().next();
                match name {
                    Some(name) if name.is_ascii_lowercase() => {
                        let after = pos + 2;
                        let run = alpha_run(bytes, after);
                        if run > 0 {
                            return Err(ParseError::BadMarkName {
                                span: pos..after + run,
                            });
                        }
                        atoms.push(Atom::Mark(name));
                        pos = after;
                    }
                    Some(other) => {
                        return Err(ParseError::BadMarkName {
                            span: pos..pos + 1 + other.len_utf8(),
                        });
                    }
                    None => {
                        return Err(ParseError::BadMarkName { span: pos..pos + 1 });
                    }
                }
            }
            b'/' | b'?' => {
                let close = find_closing_delimiter(bytes, pos + 1, c).ok_or(
                    ParseError::UnterminatedPattern {
                        span: pos..bytes.len(),
                    },
                )?;
                let pattern = unescape_delimiter(&input[pos + 1..close], c as char);
                atoms.push(if c == b'/' {
                    Atom::SearchForward(pattern)
                } else {
                    Atom::SearchBackward(pattern)
                });
                pos = close + 1;
            }
            _ => {
                let end = input[pos..]
                    .find(|ch: char| ch.is_whitespace())
                    .map_or(input.len(), |offset| pos + offset);
                return Err(ParseError::Unrecognised {
                    span: pos..end,
                    text: input[pos..end].to_string(),
                });
            }
        }
    }

    if atoms.is_empty() {
        Ok(Address::Unspecified)
    } else {
        Ok(Address::Atoms(atoms))
    }
}

/// Length of the prefix of `input` that can belong to an address range:
/// address characters, separators, marks and delimited patterns. The first
/// byte past it is where the command letter should be.
pub fn scan_range_prefix(input: &str) -> usize {
    let bytes = input.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b' ' | b'\t' | b'0'..=b'9' | b'.' | b'$' | b'+' | b'-' | b',' | b';' => pos += 1,
            b'\'' => {
                pos += 1;
                if let Some(ch) = input[pos..].chars().next() {
                    pos += ch.len_utf8();
                }
            }
            delim @ (b'/' | b'?') => match find_closing_delimiter(bytes, pos + 1, delim) {
                Some(close) => pos = close + 1,
                // leave the rest to the tokenizer so it can report the span
                None => return bytes.len(),
            },
            _ => break,
        }
    }
    pos
}

/// Position of the first `,` or `;` that is not inside a search pattern.
pub fn find_separator(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b',' | b';' => return Some(pos),
            b'\'' => pos += 2,
            delim @ (b'/' | b'?') => match find_closing_delimiter(bytes, pos + 1, delim) {
                Some(close) => pos = close + 1,
                None => return None,
            },
            _ => pos += 1,
        }
    }
    None
}

/// Index of the next unescaped `delim` at or after `from`.
pub fn find_closing_delimiter(bytes: &[u8], from: usize, delim: u8) -> Option<usize> {
    let mut pos = from;
    while pos < bytes.len() {
        if bytes[pos] == b'\\' {
            pos += 2;
            continue;
        }
        if bytes[pos] == delim {
            return Some(pos);
        }
        pos += 1;
    }
    None
}

/// Drops the backslash from escaped delimiters; all other escapes are kept for
/// the regex engine.
pub fn unescape_delimiter(text: &str, delim: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&delim) {
            continue;
        }
        out.push(c);
    }
    out
}

fn digit_run(bytes: &[u8], from: usize) -> usize {
    bytes[from.min(bytes.len())..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count()
}

fn alpha_run(bytes: &[u8], from: usize) -> usize {
    bytes[from.min(bytes.len())..]
        .iter()
        .take_while(|b| b.is_ascii_alphabetic())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atoms(input: &str) -> Vec<Atom> {
        tokenize(input).unwrap().atoms().to_vec()
    }

    fn number(text: &str, signed: bool) -> Atom {
        Atom::Number {
            text: text.to_string(),
            signed,
        }
    }

    #[test]
    fn test_empty_is_unspecified() {
        assert_eq!(tokenize("").unwrap(), Address::Unspecified);
        assert_eq!(tokenize("   ").unwrap(), Address::Unspecified);
    }

    #[test]
    fn test_signed_number_is_one_atom() {
        assert_eq!(atoms("+23"), vec![number("+23", true)]);
        assert_eq!(atoms("-4"), vec![number("-4", true)]);
        assert_eq!(atoms("17"), vec![number("17", false)]);
    }

    #[test]
    fn test_bare_increments() {
        assert_eq!(
            atoms("++-3"),
            vec![Atom::Increment, Atom::Increment, number("-3", true)]
        );
        assert_eq!(
            atoms("+ 2"),
            vec![Atom::Increment, number("2", false)]
        );
        assert_eq!(
            atoms("- --"),
            vec![Atom::Decrement, Atom::Decrement, Atom::Decrement]
        );
    }

    #[test]
    fn test_special_atoms() {
        assert_eq!(atoms("."), vec![Atom::Dot]);
        assert_eq!(atoms("$-1"), vec![Atom::EndOfFile, number("-1", true)]);
        assert_eq!(atoms("'a+3"), vec![Atom::Mark('a'), number("+3", true)]);
    }

    #[test]
    fn test_search_patterns() {
        assert_eq!(
            atoms("/abc/+1"),
            vec![Atom::SearchForward("abc".to_string()), number("+1", true)]
        );
        assert_eq!(
            atoms("?x y?"),
            vec![Atom::SearchBackward("x y".to_string())]
        );
        assert_eq!(
            atoms(r"/a\/b/"),
            vec![Atom::SearchForward("a/b".to_string())]
        );
        assert_eq!(
            atoms(r"/a\.b/"),
            vec![Atom::SearchForward(r"a\.b".to_string())]
        );
        assert_eq!(atoms("//"), vec![Atom::SearchForward(String::new())]);
    }

    #[test]
    fn test_unterminated_pattern() {
        assert_eq!(
            tokenize("3/abc"),
            Err(ParseError::UnterminatedPattern { span: 1..5 })
        );
    }

    #[test]
    fn test_bad_mark_names() {
        assert_eq!(tokenize("'ab"), Err(ParseError::BadMarkName { span: 0..3 }));
        assert_eq!(tokenize("'A"), Err(ParseError::BadMarkName { span: 0..2 }));
        assert_eq!(tokenize("'"), Err(ParseError::BadMarkName { span: 0..1 }));
    }

    #[test]
    fn test_unrecognised_input() {
        assert_eq!(
            tokenize("3 x7"),
            Err(ParseError::Unrecognised {
                span: 2..4,
                text: "x7".to_string()
            })
        );
    }

    #[test]
    fn test_scan_range_prefix() {
        assert_eq!(scan_range_prefix("2,3d"), 3);
        assert_eq!(scan_range_prefix("/a,d/,$p"), 7);
        assert_eq!(scan_range_prefix("'ap"), 2);
        assert_eq!(scan_range_prefix("s/x/y/"), 0);
        assert_eq!(scan_range_prefix("12"), 2);
    }

    #[test]
    fn test_find_separator_skips_patterns() {
        assert_eq!(find_separator("/a,b/;$"), Some(5));
        assert_eq!(find_separator("1,2"), Some(1));
        assert_eq!(find_separator("'a"), None);
        assert_eq!(find_separator("5"), None);
    }
}
