use crate::address::LineRange;
use crate::command::{Command, CommandKind, PrintMode};
use crate::controller::editor::{EditorController, Flow};
use crate::document_model::search_state::line_body;
use crate::error::{EdError, EdResult};
use std::io::{BufRead, Write};
use unicode_width::UnicodeWidthChar;

impl<R: BufRead, W: Write> EditorController<R, W> {
    /// `p`, `n` and `l`.
    pub(crate) fn print(&mut self, mut command: Command) -> EdResult<Flow> {
        let mode = match command.kind {
            CommandKind::Number => PrintMode::Number,
            CommandKind::List => PrintMode::List,
            _ => PrintMode::Print,
        };
        let range = self.session.resolve_lines(&mut command)?;
        self.print_range(range, mode)?;
        Ok(Flow::Continue)
    }

    /// `=` prints the addressed line number, `$` by default.
    pub(crate) fn line_number(&mut self, mut command: Command) -> EdResult<Flow> {
        let last = self.session.document.len();
        let range = self
            .session
            .resolve_or(&mut command, LineRange::single(last))?;
        writeln!(self.output, "{}", range.end)?;
        Ok(Flow::Continue)
    }

    /// `z` prints a window's worth of lines from the addressed line (`.+1` by
    /// default). A size argument becomes the new window size.
    pub(crate) fn scroll(&mut self, mut command: Command, size: Option<usize>) -> EdResult<Flow> {
        let len = self.session.document.len();
        let start = if command.range.is_specified() {
            self.session.resolve(&mut command)?.end
        } else {
            self.session.dot() + 1
        };
        if start == 0 || start > len {
            return Err(EdError::InvalidLine);
        }
        if let Some(size) = size {
            self.session.window_size = size;
        }
        let end = start
            .saturating_add(self.session.window_size.saturating_sub(1))
            .min(len);
        self.print_range(LineRange::new(start, end), PrintMode::Print)?;
        Ok(Flow::Continue)
    }

    /// Prints `range` and leaves dot on its last line.
    pub(crate) fn print_range(&mut self, range: LineRange, mode: PrintMode) -> EdResult<()> {
        for n in range.start..=range.end {
            self.print_line(n, mode)?;
        }
        self.session.document.set_dot(range.end);
        Ok(())
    }

    pub(crate) fn print_line(&mut self, n: usize, mode: PrintMode) -> EdResult<()> {
        let body = line_body(self.session.document.line(n));
        match mode {
            PrintMode::Print => writeln!(self.output, "{body}")?,
            PrintMode::Number => writeln!(self.output, "{n}\t{body}")?,
            PrintMode::List => {
                let listed = list_line(body, self.session.terminal_width);
                write!(self.output, "{listed}")?;
            }
        }
        Ok(())
    }
}

/// Renders a line the way `l` shows it: escapes for backslash and control
/// characters, `$` at the end, and a `\` wherever the line is folded to fit
/// `width` columns.
pub fn list_line(body: &str, width: usize) -> String {
    let limit = width.max(2) - 1;
    let mut out = String::new();
    let mut column = 0;

    for c in body.chars() {
        let piece = escape(c);
        let piece_width: usize = piece.chars().map(|ch| ch.width().unwrap_or(0)).sum();
        if column + piece_width > limit {
            out.push_str("\\\n");
            column = 0;
        }
        out.push_str(&piece);
        column += piece_width;
    }
    out.push_str("$\n");
    out
}

fn escape(c: char) -> String {
    match c {
        '\\' => "\\\\".to_string(),
        '\x07' => "\\a".to_string(),
        '\x08' => "\\b".to_string(),
        '\x0c' => "\\f".to_string(),
        '\r' => "\\r".to_string(),
        '\t' => "\\t".to_string(),
        '\x0b' => "\\v".to_string(),
        c if c.is_control() && (c as u32) < 0x100 => format!("\\{:03o}", c as u32),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::editor::tests::{editor, output, run};

    #[test]
    fn test_print_sets_dot() {
        let editor = run(&["a", "b", "c"], "1,2p\n");
        assert_eq!(editor.session().dot(), 2);
        assert_eq!(output(editor), "a\nb\n");
    }

    #[test]
    fn test_number() {
        let editor = run(&["a", "b", "c"], "2,3n\n");
        assert_eq!(output(editor), "2\tb\n3\tc\n");
    }

    #[test]
    fn test_list() {
        let editor = run(&["tab\there", "back\\slash"], ",l\n");
        assert_eq!(output(editor), "tab\\there$\nback\\\\slash$\n");
    }

    #[test]
    fn test_list_folds_long_lines() {
        assert_eq!(list_line("abcdef", 4), "abc\\\ndef$\n");
        assert_eq!(list_line("\x01", 80), "\\001$\n");
    }

    #[test]
    fn test_print_line_zero_fails() {
        let mut one = editor(&["a"], "");
        assert!(matches!(one.handle_line("0p"), Err(EdError::InvalidLine)));

        let mut empty = editor(&[], "");
        assert!(matches!(empty.handle_line("p"), Err(EdError::InvalidLine)));
    }

    #[test]
    fn test_dollar_one_is_out_of_range() {
        let mut editor = editor(&["1", "2", "3", "4", "5"], "");
        editor.handle_line("$-1p").unwrap();
        assert_eq!(editor.session().dot(), 4);
        assert!(matches!(editor.handle_line("$1p"), Err(EdError::InvalidLine)));
    }

    #[test]
    fn test_line_number() {
        let mut editor = editor(&["a", "b", "c"], "");
        editor.session_mut().document.set_dot(1);
        editor.handle_line("=").unwrap();
        editor.handle_line(".=").unwrap();
        editor.handle_line("/b/=").unwrap();
        assert_eq!(editor.session().dot(), 1);
        assert_eq!(output(editor), "3\n1\n2\n");
    }

    #[test]
    fn test_scroll() {
        let mut editor = editor(&["1", "2", "3", "4", "5", "6"], "");
        editor.session_mut().document.set_dot(1);
        editor.handle_line("z2").unwrap();
        assert_eq!(editor.session().dot(), 3);
        assert_eq!(editor.session().window_size, 2);
        editor.handle_line("z").unwrap();
        editor.handle_line("5z").unwrap();
        assert_eq!(editor.session().dot(), 6);
        assert!(editor.handle_line("z").is_err());
        assert_eq!(output(editor), "2\n3\n4\n5\n5\n6\n");
    }

    #[test]
    fn test_scroll_with_huge_window() {
        let mut editor = editor(&["1", "2", "3"], "");
        editor.session_mut().document.set_dot(0);
        editor.handle_line("z18446744073709551615").unwrap();
        assert_eq!(editor.session().dot(), 3);
        assert_eq!(editor.session().window_size, usize::MAX);
        assert_eq!(output(editor), "1\n2\n3\n");
    }
}
