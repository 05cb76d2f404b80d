use crate::address::tokenizer::{find_closing_delimiter, scan_range_prefix, unescape_delimiter};
use crate::address::{Address, AddressRange, LineLookup, LineRange};
use crate::error::{EdResult, ParseError};

/// Which matches on a line `s` replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    Nth(usize),
    All,
}

impl Default for Occurrence {
    fn default() -> Self {
        Occurrence::Nth(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    Print,
    Number,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubstituteSuffix {
    pub occurrence: Occurrence,
    pub print: Option<PrintMode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// Already in `regex` replacement syntax.
    Template(String),
    /// `%`: whatever the last substitution used.
    Previous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstituteArgs {
    /// `None` repeats the last substitution.
    pub expression: Option<(String, Replacement)>,
    /// `None` keeps the suffixes of the repeated substitution.
    pub suffix: Option<SubstituteSuffix>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    pub pattern: String,
    pub commands: Vec<String>,
    pub invert: bool,
    pub interactive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Write,
    WriteQuit,
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Append,
    Insert,
    Change,
    Delete,
    Edit { path: Option<String>, force: bool },
    Filename(Option<String>),
    Global(GlobalArgs),
    Help(Option<String>),
    Join,
    Mark(char),
    List,
    Number,
    Print,
    Move(Address),
    Transfer(Address),
    TogglePrompt,
    Quit { force: bool },
    Read(Option<String>),
    Substitute(SubstituteArgs),
    Undo,
    Write { path: Option<String>, mode: WriteMode },
    Put,
    Yank,
    Scroll(Option<usize>),
    Comment,
    LineNumber,
}

impl CommandKind {
    pub fn letter(&self) -> char {
        match self {
            CommandKind::Append => 'a',
            CommandKind::Insert => 'i',
            CommandKind::Change => 'c',
            CommandKind::Delete => 'd',
            CommandKind::Edit { force: false, .. } => 'e',
            CommandKind::Edit { force: true, .. } => 'E',
            CommandKind::Filename(_) => 'f',
            CommandKind::Global(args) => match (args.invert, args.interactive) {
                (false, false) => 'g',
                (false, true) => 'G',
                (true, false) => 'v',
                (true, true) => 'V',
            },
            CommandKind::Help(_) => 'h',
            CommandKind::Join => 'j',
            CommandKind::Mark(_) => 'k',
            CommandKind::List => 'l',
            CommandKind::Number => 'n',
            CommandKind::Print => 'p',
            CommandKind::Move(_) => 'm',
            CommandKind::Transfer(_) => 't',
            CommandKind::TogglePrompt => 'P',
            CommandKind::Quit { force: false } => 'q',
            CommandKind::Quit { force: true } => 'Q',
            CommandKind::Read(_) => 'r',
            CommandKind::Substitute(_) => 's',
            CommandKind::Undo => 'u',
            CommandKind::Write {
                mode: WriteMode::Append,
                ..
            } => 'W',
            CommandKind::Write { .. } => 'w',
            CommandKind::Put => 'x',
            CommandKind::Yank => 'y',
            CommandKind::Scroll(_) => 'z',
            CommandKind::Comment => '#',
            CommandKind::LineNumber => '=',
        }
    }

    /// Commands that read input lines (`a`, `i`, `c`).
    pub fn takes_text(&self) -> bool {
        matches!(
            self,
            CommandKind::Append | CommandKind::Insert | CommandKind::Change
        )
    }

    /// Whether the command may appear in a `g`/`v` command list.
    pub fn allowed_in_global(&self) -> bool {
        !matches!(
            self,
            CommandKind::Edit { .. }
                | CommandKind::Filename(_)
                | CommandKind::Global(_)
                | CommandKind::Help(_)
                | CommandKind::Quit { .. }
                | CommandKind::Undo
                | CommandKind::Write { .. }
        )
    }
}

/// One parsed command line: the range as typed, what to do, and the range
/// once it has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub range: AddressRange,
    pub kind: CommandKind,
    resolved: Option<LineRange>,
}

impl Command {
    pub fn new(range: AddressRange, kind: CommandKind) -> Self {
        Self {
            range,
            kind,
            resolved: None,
        }
    }

    /// A command acting on exactly `start..=end`.
    pub fn on_lines(start: usize, end: usize, kind: CommandKind) -> Self {
        Self::new(AddressRange::lines(start, end), kind)
    }

    /// Splits a command line into range, letter and argument.
    ///
    /// A line holding only an address prints that line; an empty line prints
    /// the next one.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let prefix = scan_range_prefix(line);
        let (range_text, rest) = line.split_at(prefix);

        if rest.trim().is_empty() {
            let range = if range_text.trim().is_empty() {
                AddressRange::parse("+1")?
            } else {
                AddressRange::parse(range_text)?
            };
            return Ok(Self::new(range, CommandKind::Print));
        }

        let range = AddressRange::parse(range_text)?;
        let mut chars = rest.chars();
        let letter = chars.next().ok_or(ParseError::UnknownCommand)?;
        let arg = chars.as_str();
        let kind = parse_kind(letter, arg, prefix + letter.len_utf8())?;
        Ok(Self::new(range, kind))
    }

    pub fn letter(&self) -> char {
        self.kind.letter()
    }

    /// Resolves the range once; later calls return the cached pair.
    pub fn resolve<L: LineLookup + ?Sized>(
        &mut self,
        current: usize,
        lookup: &mut L,
    ) -> EdResult<LineRange> {
        if let Some(range) = self.resolved {
            return Ok(range);
        }
        let range = self.range.resolve(current, lookup)?;
        self.resolved = Some(range);
        Ok(range)
    }

    pub fn resolved(&self) -> Option<LineRange> {
        self.resolved
    }
}

fn parse_kind(letter: char, arg: &str, arg_offset: usize) -> Result<CommandKind, ParseError> {
    let kind = match letter {
        'a' => no_argument(arg, CommandKind::Append)?,
        'i' => no_argument(arg, CommandKind::Insert)?,
        'c' => no_argument(arg, CommandKind::Change)?,
        'd' => no_argument(arg, CommandKind::Delete)?,
        'j' => no_argument(arg, CommandKind::Join)?,
        'l' => no_argument(arg, CommandKind::List)?,
        'n' => no_argument(arg, CommandKind::Number)?,
        'p' => no_argument(arg, CommandKind::Print)?,
        'P' => no_argument(arg, CommandKind::TogglePrompt)?,
        'u' => no_argument(arg, CommandKind::Undo)?,
        'x' => no_argument(arg, CommandKind::Put)?,
        'y' => no_argument(arg, CommandKind::Yank)?,
        '=' => no_argument(arg, CommandKind::LineNumber)?,
        'q' => no_argument(arg, CommandKind::Quit { force: false })?,
        'Q' => no_argument(arg, CommandKind::Quit { force: true })?,
        '#' => CommandKind::Comment,
        'e' => CommandKind::Edit {
            path: filename(arg),
            force: false,
        },
        'E' => CommandKind::Edit {
            path: filename(arg),
            force: true,
        },
        'f' => CommandKind::Filename(filename(arg)),
        'r' => CommandKind::Read(filename(arg)),
        'h' => CommandKind::Help(filename(arg)),
        'w' => match arg.strip_prefix('q') {
            Some(rest) => CommandKind::Write {
                path: filename(rest),
                mode: WriteMode::WriteQuit,
            },
            None => CommandKind::Write {
                path: filename(arg),
                mode: WriteMode::Write,
            },
        },
        'W' => CommandKind::Write {
            path: filename(arg),
            mode: WriteMode::Append,
        },
        'k' => CommandKind::Mark(mark_name(arg, arg_offset)?),
        'm' => CommandKind::Move(destination(arg, arg_offset)?),
        't' => CommandKind::Transfer(destination(arg, arg_offset)?),
        'z' => CommandKind::Scroll(window_size(arg)?),
        's' => CommandKind::Substitute(parse_substitute(arg)?),
        'g' | 'v' | 'G' | 'V' => CommandKind::Global(parse_global(letter, arg)?),
        _ => return Err(ParseError::UnknownCommand),
    };
    Ok(kind)
}

fn no_argument(arg: &str, kind: CommandKind) -> Result<CommandKind, ParseError> {
    if arg.trim().is_empty() {
        Ok(kind)
    } else {
        Err(ParseError::InvalidSuffix(arg.trim().to_string()))
    }
}

fn filename(arg: &str) -> Option<String> {
    let arg = arg.trim();
    (!arg.is_empty()).then(|| arg.to_string())
}

fn mark_name(arg: &str, offset: usize) -> Result<char, ParseError> {
    let trimmed = arg.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(name), None) if name.is_ascii_lowercase() => Ok(name),
        _ => {
            let lead = arg.len() - arg.trim_start().len();
            let start = offset + lead;
            Err(ParseError::BadMarkName {
                span: start..start + trimmed.len(),
            })
        }
    }
}

fn destination(arg: &str, offset: usize) -> Result<Address, ParseError> {
    Address::parse(arg).map_err(|err| err.shifted(offset))
}

fn window_size(arg: &str) -> Result<Option<usize>, ParseError> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Ok(None);
    }
    match arg.parse::<usize>() {
        Ok(size) if size > 0 => Ok(Some(size)),
        _ => Err(ParseError::InvalidWindowSize),
    }
}

fn parse_substitute(arg: &str) -> Result<SubstituteArgs, ParseError> {
    let Some(delim) = arg.chars().next() else {
        return Ok(SubstituteArgs {
            expression: None,
            suffix: None,
        });
    };
    if delim.is_ascii_digit() || matches!(delim, 'g' | 'p' | 'n' | 'l') {
        return Ok(SubstituteArgs {
            expression: None,
            suffix: Some(parse_suffix(arg)?),
        });
    }
    if delim.is_whitespace() || !delim.is_ascii() {
        return Err(ParseError::MissingDelimiter);
    }

    let bytes = arg.as_bytes();
    let d = delim as u8;
    let pattern_end = find_closing_delimiter(bytes, 1, d).ok_or(ParseError::MissingDelimiter)?;
    let pattern = unescape_delimiter(&arg[1..pattern_end], delim);

    let (raw_replacement, suffix) = match find_closing_delimiter(bytes, pattern_end + 1, d) {
        Some(end) => (&arg[pattern_end + 1..end], parse_suffix(&arg[end + 1..])?),
        None => (
            &arg[pattern_end + 1..],
            SubstituteSuffix {
                print: Some(PrintMode::Print),
                ..SubstituteSuffix::default()
            },
        ),
    };

    let replacement = if raw_replacement == "%" {
        Replacement::Previous
    } else {
        Replacement::Template(replacement_template(&unescape_delimiter(
            raw_replacement,
            delim,
        )))
    };

    Ok(SubstituteArgs {
        expression: Some((pattern, replacement)),
        suffix: Some(suffix),
    })
}

fn parse_suffix(text: &str) -> Result<SubstituteSuffix, ParseError> {
    let invalid = || ParseError::InvalidSuffix(text.trim().to_string());
    let mut suffix = SubstituteSuffix::default();
    let mut global = false;
    let mut count: Option<usize> = None;
    let mut chars = text.trim().chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            'g' if !global => global = true,
            'p' => suffix.print = Some(PrintMode::Print),
            'n' => suffix.print = Some(PrintMode::Number),
            'l' => suffix.print = Some(PrintMode::List),
            '0'..='9' if count.is_none() => {
                let mut digits = c.to_string();
                while let Some(d) = chars.next_if(char::is_ascii_digit) {
                    digits.push(d);
                }
                match digits.parse::<usize>() {
                    Ok(n) if n > 0 => count = Some(n),
                    _ => return Err(invalid()),
                }
            }
            _ => return Err(invalid()),
        }
    }

    suffix.occurrence = match (global, count) {
        (true, Some(_)) => return Err(invalid()),
        (true, None) => Occurrence::All,
        (false, Some(n)) => Occurrence::Nth(n),
        (false, None) => Occurrence::Nth(1),
    };
    Ok(suffix)
}

/// Converts an ed replacement (`&`, `\1`..`\9`, `\&`) into `regex` syntax.
pub fn replacement_template(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '&' => out.push_str("${0}"),
            '$' => out.push_str("$$"),
            '\\' => match chars.next() {
                Some(d @ '1'..='9') => {
                    out.push_str("${");
                    out.push(d);
                    out.push('}');
                }
                Some('$') => out.push_str("$$"),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}

fn parse_global(letter: char, arg: &str) -> Result<GlobalArgs, ParseError> {
    let delim = arg.chars().next().ok_or(ParseError::MissingDelimiter)?;
    if delim.is_whitespace() || !delim.is_ascii() {
        return Err(ParseError::MissingDelimiter);
    }
    let close =
        find_closing_delimiter(arg.as_bytes(), 1, delim as u8).ok_or(ParseError::MissingDelimiter)?;
    let pattern = unescape_delimiter(&arg[1..close], delim);
    let list = &arg[close + 1..];
    let interactive = letter.is_ascii_uppercase();

    let commands = if interactive {
        if !list.trim().is_empty() {
            return Err(ParseError::InvalidSuffix(list.trim().to_string()));
        }
        Vec::new()
    } else if list.trim().is_empty() {
        vec!["p".to_string()]
    } else {
        list.split('\n').map(str::to_string).collect()
    };

    Ok(GlobalArgs {
        pattern,
        commands,
        invert: matches!(letter, 'v' | 'V'),
        interactive,
    })
}
