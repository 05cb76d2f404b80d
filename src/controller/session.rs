use crate::address::{Address, LineLookup, LineRange};
use crate::command::Command;
use crate::document_model::{Document, MarkTable, SearchDirection, SearchState, UndoStack};
use crate::error::{EdError, EdResult};
use std::path::PathBuf;

pub const DEFAULT_PROMPT: &str = "*";
pub const DEFAULT_WINDOW_SIZE: usize = 22;
pub const DEFAULT_TERMINAL_WIDTH: usize = 80;

/// Everything one editing session owns. Commands receive it by reference;
/// there is no other editor state.
#[derive(Debug)]
pub struct Session {
    pub document: Document,
    pub marks: MarkTable,
    pub undo: UndoStack,
    pub search: SearchState,
    pub filename: Option<PathBuf>,
    pub modified: bool,
    pub prompt: String,
    pub show_prompt: bool,
    pub window_size: usize,
    pub terminal_width: usize,
    /// Suppresses byte counts and diagnostics.
    pub silent: bool,
    /// Print the message after `?` when a command fails.
    pub verbose: bool,
    pub in_global: bool,
    /// Set after `e` or `q` refused to drop unsaved changes.
    pub(crate) warned: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            document: Document::new(),
            marks: MarkTable::new(),
            undo: UndoStack::new(),
            search: SearchState::new(),
            filename: None,
            modified: false,
            prompt: DEFAULT_PROMPT.to_string(),
            show_prompt: false,
            window_size: DEFAULT_WINDOW_SIZE,
            terminal_width: DEFAULT_TERMINAL_WIDTH,
            silent: false,
            verbose: true,
            in_global: false,
            warned: false,
        }
    }

    pub fn with_lines(lines: Vec<String>) -> Self {
        Self {
            document: Document::from_lines(lines),
            ..Self::new()
        }
    }

    pub fn dot(&self) -> usize {
        self.document.dot()
    }

    pub fn lookup(&mut self) -> Lookup<'_> {
        Lookup {
            document: &self.document,
            marks: &self.marks,
            search: &mut self.search,
        }
    }

    /// Resolves the command's range; an unspecified range is the current line.
    pub fn resolve(&mut self, command: &mut Command) -> EdResult<LineRange> {
        let current = self.dot();
        command.resolve(current, &mut self.lookup())
    }

    /// Resolves the command's range, or uses `default` when none was typed.
    pub fn resolve_or(&mut self, command: &mut Command, default: LineRange) -> EdResult<LineRange> {
        if command.range.is_specified() {
            self.resolve(command)
        } else {
            Ok(default)
        }
    }

    /// Like [`Session::resolve`], but line 0 is rejected.
    pub fn resolve_lines(&mut self, command: &mut Command) -> EdResult<LineRange> {
        let range = self.resolve(command)?;
        if range.start == 0 {
            return Err(EdError::InvalidLine);
        }
        Ok(range)
    }

    pub fn resolve_address(&mut self, address: &Address) -> EdResult<usize> {
        let current = self.dot();
        address.resolve(current, &mut self.lookup())
    }

    /// Removes `start..=end`, keeping marks in step. Returns the lines and the
    /// marks that were on them.
    pub fn delete_span(&mut self, start: usize, end: usize) -> (Vec<String>, Vec<(char, usize)>) {
        let lines = self.document.delete_lines(start, end);
        let removed = self.marks.lines_deleted(start, end);
        self.modified = true;
        (lines, removed)
    }

    /// Inserts after `after`, keeping marks in step. Returns the new dot.
    pub fn insert_span(&mut self, after: usize, lines: Vec<String>) -> usize {
        if !lines.is_empty() {
            self.marks.lines_inserted(after, lines.len());
            self.modified = true;
        }
        self.document.append_lines(after, lines)
    }

    /// Moves `start..=end` to follow `dest`. Returns the last moved line and
    /// the marks that were on the moved lines.
    pub fn move_span(&mut self, start: usize, end: usize, dest: usize) -> (usize, Vec<(char, usize)>) {
        let removed = self.marks.lines_moved(start, end, dest);
        let lines = self.document.delete_lines(start, end);
        let after = if dest >= end { dest - lines.len() } else { dest };
        let last = self.document.append_lines(after, lines);
        self.modified = true;
        (last, removed)
    }

    /// Marks currently on `line`.
    pub fn marks_on(&self, line: usize) -> Vec<(char, usize)> {
        self.marks.iter().filter(|(_, l)| *l == line).collect()
    }

    /// Puts dot on `line`, pulled into the document.
    pub fn set_dot_clamped(&mut self, line: usize) {
        let len = self.document.len();
        let line = if len == 0 { 0 } else { line.clamp(1, len) };
        self.document.set_dot(line);
    }

    /// Forgets everything tied to the previous file.
    pub fn reset_for_new_file(&mut self, lines: Vec<String>) {
        self.document.replace_all(lines);
        self.document.clear_cut_buffer();
        self.marks.clear();
        self.undo.clear();
        self.modified = false;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// The view of a session that address resolution works against.
pub struct Lookup<'a> {
    document: &'a Document,
    marks: &'a MarkTable,
    search: &'a mut SearchState,
}

impl LineLookup for Lookup<'_> {
    fn line_count(&self) -> usize {
        self.document.len()
    }

    fn mark(&self, name: char) -> Option<usize> {
        self.marks.get(name)
    }

    fn search(&mut self, pattern: &str, from: usize, direction: SearchDirection) -> EdResult<usize> {
        self.search.find_line(self.document, pattern, from, direction)
    }
}
