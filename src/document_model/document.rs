/// Identity of a line while it sits in the document. Replacing a line's text
/// or re-inserting it gives it a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineId(u64);

#[derive(Debug, Clone)]
struct Line {
    id: LineId,
    text: String,
}

/// The ordered line sequence, the current line ("dot") and the cut buffer.
///
/// Lines are addressed 1..=len. Every line carries its terminator. Dot is 0
/// only when the document is empty.
#[derive(Debug, Clone, Default)]
pub struct Document {
    lines: Vec<Line>,
    dot: usize,
    cut_buffer: Vec<String>,
    next_id: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document with dot on the last line.
    pub fn from_lines(lines: Vec<String>) -> Self {
        let mut document = Self::new();
        document.replace_all(lines);
        document
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn dot(&self) -> usize {
        self.dot
    }

    pub fn set_dot(&mut self, line: usize) {
        assert!(
            line <= self.len(),
            "dot {line} outside document of {} lines",
            self.len()
        );
        self.dot = line;
    }

    /// Text of line `n`, terminator included.
    pub fn line(&self, n: usize) -> &str {
        &self.lines[self.index(n)].text
    }

    pub fn line_id(&self, n: usize) -> LineId {
        self.lines[self.index(n)].id
    }

    /// Current line number of the line with this id, if it is still present.
    pub fn find_id(&self, id: LineId) -> Option<usize> {
        self.lines.iter().position(|line| line.id == id).map(|i| i + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.text.as_str())
    }

    /// Lines `start..=end`.
    pub fn range(&self, start: usize, end: usize) -> impl Iterator<Item = &str> {
        self.check_span(start, end);
        self.lines[start - 1..end].iter().map(|line| line.text.as_str())
    }

    pub fn copy_lines(&self, start: usize, end: usize) -> Vec<String> {
        self.range(start, end).map(str::to_string).collect()
    }

    /// Inserts `new_lines` after line `after` (0 = before the first line) and
    /// moves dot to the last inserted line. Returns that line number.
    pub fn append_lines(&mut self, after: usize, new_lines: Vec<String>) -> usize {
        assert!(after <= self.len(), "append after {after} past end");
        let count = new_lines.len();
        let lines: Vec<Line> = new_lines
            .into_iter()
            .map(|text| {
                let id = self.allocate_id();
                Line { id, text }
            })
            .collect();
        self.lines.splice(after..after, lines);
        if count > 0 {
            self.dot = after + count;
        }
        self.dot
    }

    /// Removes lines `start..=end` and hands them back. Dot moves to the line
    /// after the deleted span, or the new last line, or 0 when nothing is left.
    pub fn delete_lines(&mut self, start: usize, end: usize) -> Vec<String> {
        self.check_span(start, end);
        let removed: Vec<String> = self
            .lines
            .drain(start - 1..end)
            .map(|line| line.text)
            .collect();
        self.dot = start.min(self.len());
        removed
    }

    /// Swaps in new text for line `n`, returning the old text.
    pub fn replace_line(&mut self, n: usize, text: String) -> String {
        let index = self.index(n);
        let id = self.allocate_id();
        let line = &mut self.lines[index];
        line.id = id;
        std::mem::replace(&mut line.text, text)
    }

    /// Replaces the whole content, as after loading a file. Dot goes to the last line.
    pub fn replace_all(&mut self, lines: Vec<String>) {
        self.lines.clear();
        self.dot = 0;
        self.append_lines(0, lines);
    }

    pub fn cut_buffer(&self) -> &[String] {
        &self.cut_buffer
    }

    pub fn set_cut_buffer(&mut self, lines: Vec<String>) {
        self.cut_buffer = lines;
    }

    pub fn clear_cut_buffer(&mut self) {
        self.cut_buffer.clear();
    }

    fn allocate_id(&mut self) -> LineId {
        self.next_id += 1;
        LineId(self.next_id)
    }

    // Addresses reaching here have been resolved and bounds checked already;
    // failing this is a bug, not bad input.
    fn index(&self, n: usize) -> usize {
        assert!(
            n >= 1 && n <= self.len(),
            "line {n} outside document of {} lines",
            self.len()
        );
        n - 1
    }

    fn check_span(&self, start: usize, end: usize) {
        assert!(
            start >= 1 && start <= end && end <= self.len(),
            "span {start},{end} outside document of {} lines",
            self.len()
        );
    }
}

/// Turns plain strings into terminated lines. Handy for tests and for text
/// that did not come from a file.
pub fn terminated<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .map(|line| {
            let line = line.as_ref();
            if line.ends_with('\n') {
                line.to_string()
            } else {
                format!("{line}\n")
            }
        })
        .collect()
}
