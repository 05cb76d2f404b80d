use crate::command::Command;
use tracing::{debug, trace};

/// How to reverse one mutating command.
#[derive(Debug, Clone)]
pub enum UndoAction {
    /// Run `inverse` through the executor with `lines` as its input text.
    Simple { inverse: Command, lines: Vec<String> },
    /// Put back a block that `start,end m dest` moved.
    MoveReinsert {
        start: usize,
        end: usize,
        dest: usize,
    },
    /// One `change` entry per line a substitution rewrote, replayed in order.
    Substitute(Vec<UndoEntry>),
    /// Everything a global command did, replayed newest first.
    Batch(Vec<UndoEntry>),
}

#[derive(Debug, Clone)]
pub struct UndoEntry {
    pub action: UndoAction,
    /// The command being undone.
    pub original: Command,
    /// Marks the original command dropped, with the lines they were on.
    pub removed_marks: Vec<(char, usize)>,
    /// Where dot lands after the undo.
    pub dot: usize,
}

impl UndoEntry {
    pub fn new(action: UndoAction, original: Command, dot: usize) -> Self {
        Self {
            action,
            original,
            removed_marks: Vec::new(),
            dot,
        }
    }

    pub fn with_removed_marks(mut self, marks: Vec<(char, usize)>) -> Self {
        self.removed_marks = marks;
        self
    }
}

/// LIFO log of inverse commands. Pushes are ignored while an undo is being
/// replayed, and collected into one batch while a group is open.
#[derive(Debug, Clone)]
pub struct UndoStack {
    entries: Vec<UndoEntry>,
    group: Option<Vec<UndoEntry>>,
    replaying: bool,
    max_levels: usize,
}

impl UndoStack {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            group: None,
            replaying: false,
            max_levels: 1000,
        }
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            max_levels: max_levels.max(1),
            ..Self::new()
        }
    }

    pub fn set_max_levels(&mut self, max_levels: usize) {
        self.max_levels = max_levels.max(1);
        self.trim();
    }

    pub fn push(&mut self, entry: UndoEntry) {
        if self.replaying {
            trace!(command = %entry.original.letter(), "undo push ignored while replaying");
            return;
        }
        if let Some(group) = self.group.as_mut() {
            group.push(entry);
            return;
        }
        debug!(command = %entry.original.letter(), depth = self.entries.len() + 1, "undo entry pushed");
        self.entries.push(entry);
        self.trim();
    }

    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.group = None;
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    pub fn set_replaying(&mut self, replaying: bool) {
        self.replaying = replaying;
    }

    /// Starts collecting pushes for a command made of other commands.
    pub fn start_group(&mut self) {
        self.group = Some(Vec::new());
    }

    /// Closes the group and pushes it as one batch, unless it is empty.
    pub fn end_group(&mut self, original: Command, dot: usize) {
        let Some(group) = self.group.take() else {
            return;
        };
        if !group.is_empty() {
            self.push(UndoEntry::new(UndoAction::Batch(group), original, dot));
        }
    }

    /// Closes the group without pushing and hands back what it collected, so
    /// the caller can roll it back.
    pub fn abort_group(&mut self) -> Vec<UndoEntry> {
        self.group.take().unwrap_or_default()
    }

    fn trim(&mut self) {
        if self.entries.len() > self.max_levels {
            let excess = self.entries.len() - self.max_levels;
            self.entries.drain(..excess);
        }
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
