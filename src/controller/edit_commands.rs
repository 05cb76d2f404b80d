use crate::address::{Address, LineRange};
use crate::command::{Command, CommandKind};
use crate::controller::editor::{EditorController, Flow};
use crate::document_model::search_state::line_body;
use crate::document_model::{UndoAction, UndoEntry};
use crate::error::{EdError, EdResult};
use std::io::{BufRead, Write};

impl<R: BufRead, W: Write> EditorController<R, W> {
    pub(crate) fn append(&mut self, mut command: Command, text: Option<Vec<String>>) -> EdResult<Flow> {
        let range = self.session.resolve(&mut command)?;
        self.insert_after(command, range.end, text)
    }

    pub(crate) fn insert(&mut self, mut command: Command, text: Option<Vec<String>>) -> EdResult<Flow> {
        let range = self.session.resolve(&mut command)?;
        self.insert_after(command, range.end.saturating_sub(1), text)
    }

    fn insert_after(&mut self, command: Command, after: usize, text: Option<Vec<String>>) -> EdResult<Flow> {
        let lines = self.input_text(text)?;
        if lines.is_empty() {
            if after > 0 {
                self.session.document.set_dot(after);
            }
            return Ok(Flow::Continue);
        }
        let last = self.session.insert_span(after, lines);
        self.push_delete_undo(command, after, last);
        Ok(Flow::Continue)
    }

    pub(crate) fn change(&mut self, mut command: Command, text: Option<Vec<String>>) -> EdResult<Flow> {
        let range = self.session.resolve_lines(&mut command)?;
        let new_lines = self.input_text(text)?;
        let count = new_lines.len();

        let (old_lines, removed_marks) = self.session.delete_span(range.start, range.end);
        self.fill_cut_buffer(&old_lines);
        if count > 0 {
            self.session.insert_span(range.start - 1, new_lines);
        }

        let inverse = if count > 0 {
            Command::on_lines(range.start, range.start + count - 1, CommandKind::Change)
        } else {
            Command::on_lines(range.start - 1, range.start - 1, CommandKind::Append)
        };
        self.session.undo.push(
            UndoEntry::new(
                UndoAction::Simple {
                    inverse,
                    lines: old_lines,
                },
                command,
                range.start,
            )
            .with_removed_marks(removed_marks),
        );
        Ok(Flow::Continue)
    }

    pub(crate) fn delete(&mut self, mut command: Command) -> EdResult<Flow> {
        let range = self.session.resolve_lines(&mut command)?;
        let (lines, removed_marks) = self.session.delete_span(range.start, range.end);
        self.fill_cut_buffer(&lines);
        self.session.undo.push(
            UndoEntry::new(
                UndoAction::Simple {
                    inverse: Command::on_lines(range.start - 1, range.start - 1, CommandKind::Append),
                    lines,
                },
                command,
                range.start,
            )
            .with_removed_marks(removed_marks),
        );
        Ok(Flow::Continue)
    }

    /// `j` joins the range (default `.,.+1`) into one line, contents separated
    /// by a single space.
    pub(crate) fn join(&mut self, mut command: Command) -> EdResult<Flow> {
        let dot = self.session.dot();
        let range = if command.range.is_specified() {
            self.session.resolve_lines(&mut command)?
        } else if dot >= 1 && dot < self.session.document.len() {
            LineRange::new(dot, dot + 1)
        } else {
            return Err(EdError::InvalidLine);
        };
        if range.start == range.end {
            self.session.document.set_dot(range.start);
            return Ok(Flow::Continue);
        }

        let joined = self
            .session
            .document
            .range(range.start, range.end)
            .map(line_body)
            .collect::<Vec<_>>()
            .join(" ");
        let (old_lines, removed_marks) = self.session.delete_span(range.start, range.end);
        self.fill_cut_buffer(&old_lines);
        self.session.insert_span(range.start - 1, vec![format!("{joined}\n")]);

        self.session.undo.push(
            UndoEntry::new(
                UndoAction::Simple {
                    inverse: Command::on_lines(range.start, range.start, CommandKind::Change),
                    lines: old_lines,
                },
                command,
                range.start,
            )
            .with_removed_marks(removed_marks),
        );
        Ok(Flow::Continue)
    }

    pub(crate) fn move_lines(&mut self, mut command: Command, dest: &Address) -> EdResult<Flow> {
        let range = self.session.resolve_lines(&mut command)?;
        let dest = self.destination(range, dest)?;
        let (_, removed_marks) = self.session.move_span(range.start, range.end, dest);
        self.session.undo.push(
            UndoEntry::new(
                UndoAction::MoveReinsert {
                    start: range.start,
                    end: range.end,
                    dest,
                },
                command,
                range.start,
            )
            .with_removed_marks(removed_marks),
        );
        Ok(Flow::Continue)
    }

    pub(crate) fn transfer(&mut self, mut command: Command, dest: &Address) -> EdResult<Flow> {
        let range = self.session.resolve_lines(&mut command)?;
        let dest = self.destination(range, dest)?;
        let lines = self.session.document.copy_lines(range.start, range.end);
        let last = self.session.insert_span(dest, lines);
        self.push_delete_undo(command, dest, last);
        Ok(Flow::Continue)
    }

    pub(crate) fn yank(&mut self, mut command: Command) -> EdResult<Flow> {
        let range = self.session.resolve_lines(&mut command)?;
        let lines = self.session.document.copy_lines(range.start, range.end);
        self.session.document.set_cut_buffer(lines);
        Ok(Flow::Continue)
    }

    /// `x` puts the cut buffer after the addressed line.
    pub(crate) fn put(&mut self, mut command: Command) -> EdResult<Flow> {
        let range = self.session.resolve(&mut command)?;
        if range.start != range.end {
            return Err(EdError::RangeNotAllowed);
        }
        let lines = self.session.document.cut_buffer().to_vec();
        if lines.is_empty() {
            return Err(EdError::EmptyCutBuffer);
        }
        let last = self.session.insert_span(range.end, lines);
        self.push_delete_undo(command, range.end, last);
        Ok(Flow::Continue)
    }

    pub(crate) fn mark(&mut self, mut command: Command, name: char) -> EdResult<Flow> {
        let range = self.session.resolve_lines(&mut command)?;
        if range.start != range.end {
            return Err(EdError::RangeNotAllowed);
        }
        self.session.marks.set(name, range.start);
        Ok(Flow::Continue)
    }

    /// Destination for `m`/`t`: must exist and must not split the source block.
    fn destination(&mut self, range: LineRange, dest: &Address) -> EdResult<usize> {
        let dest = self.session.resolve_address(dest)?;
        if dest >= range.start && dest < range.end {
            return Err(EdError::InvalidDestination);
        }
        Ok(dest)
    }

    /// The cut buffer is left alone while undo replays its inverse commands.
    fn fill_cut_buffer(&mut self, lines: &[String]) {
        if !self.session.undo.is_replaying() {
            self.session.document.set_cut_buffer(lines.to_vec());
        }
    }

    /// Undo for commands that inserted `after+1..=last`.
    pub(crate) fn push_delete_undo(&mut self, command: Command, after: usize, last: usize) {
        if last <= after {
            return;
        }
        self.session.undo.push(UndoEntry::new(
            UndoAction::Simple {
                inverse: Command::on_lines(after + 1, last, CommandKind::Delete),
                lines: Vec::new(),
            },
            command,
            after,
        ));
    }
}

#[cfg(test)]
mod tests {
    use crate::controller::editor::tests::{contents, editor, output, run};
    use crate::error::EdError;

    #[test]
    fn test_delete_range() {
        let editor = run(&["1", "2", "3", "4", "5"], "2,3d\n");
        assert_eq!(contents(&editor), ["1", "4", "5"]);
        assert_eq!(editor.session().dot(), 2);
        assert_eq!(editor.session().document.cut_buffer(), ["2\n", "3\n"]);
    }

    #[test]
    fn test_delete_last_lines_moves_dot_up() {
        let editor = run(&["1", "2", "3"], "2,3d\n");
        assert_eq!(editor.session().dot(), 1);
        let editor = run(&["1"], "d\n");
        assert_eq!(editor.session().dot(), 0);
    }

    #[test]
    fn test_delete_renumbers_marks() {
        let editor = run(&["1", "2", "3", "4", "5"], "2ka\n4kb\n1d\n");
        assert_eq!(editor.session().marks.get('a'), Some(1));
        assert_eq!(editor.session().marks.get('b'), Some(3));
    }

    #[test]
    fn test_append_and_insert() {
        let editor = run(&["1", "2"], "1a\nx\ny\n.\n0i\ntop\n.\n");
        assert_eq!(contents(&editor), ["top", "1", "x", "y", "2"]);
        assert_eq!(editor.session().dot(), 1);

        let editor = run(&["1", "2"], "2i\nmid\n.\n");
        assert_eq!(contents(&editor), ["1", "mid", "2"]);
        assert_eq!(editor.session().dot(), 2);
    }

    #[test]
    fn test_append_to_empty_document() {
        let editor = run(&[], "a\nfirst\n.\n");
        assert_eq!(contents(&editor), ["first"]);
        assert_eq!(editor.session().dot(), 1);
    }

    #[test]
    fn test_change() {
        let editor = run(&["1", "2", "3", "4"], "2,3c\nnew\n.\n");
        assert_eq!(contents(&editor), ["1", "new", "4"]);
        assert_eq!(editor.session().dot(), 2);
    }

    #[test]
    fn test_change_with_no_text_deletes() {
        let editor = run(&["1", "2", "3"], "2c\n.\n");
        assert_eq!(contents(&editor), ["1", "3"]);
    }

    #[test]
    fn test_join() {
        let editor = run(&["a", "b", "c", "d"], "1,3j\n");
        assert_eq!(contents(&editor), ["a b c", "d"]);
        assert_eq!(editor.session().dot(), 1);

        let editor = run(&["a", "b"], "1j\n");
        assert_eq!(contents(&editor), ["a", "b"]);
        assert!(editor.session().undo.is_empty());
    }

    #[test]
    fn test_join_defaults_to_next_line() {
        let mut editor = editor(&["a", "b", "c"], "j\n");
        editor.session_mut().document.set_dot(2);
        editor.run().unwrap();
        assert_eq!(contents(&editor), ["a", "b c"]);
    }

    #[test]
    fn test_move_up() {
        let editor = run(&["a", "b", "c", "d", "e", "f"], "4,6m2\n");
        assert_eq!(contents(&editor), ["a", "b", "d", "e", "f", "c"]);
        assert_eq!(editor.session().dot(), 5);
    }

    #[test]
    fn test_move_down_and_to_top() {
        let editor = run(&["a", "b", "c", "d"], "1,2m$\n");
        assert_eq!(contents(&editor), ["c", "d", "a", "b"]);
        assert_eq!(editor.session().dot(), 4);

        let editor = run(&["a", "b", "c", "d"], "3,4m0\n");
        assert_eq!(contents(&editor), ["c", "d", "a", "b"]);
        assert_eq!(editor.session().dot(), 2);
    }

    #[test]
    fn test_move_into_itself_is_rejected() {
        for script in ["4,6m4\n", "4,6m5\n"] {
            let editor = run(&["a", "b", "c", "d", "e", "f"], script);
            assert_eq!(contents(&editor), ["a", "b", "c", "d", "e", "f"]);
            assert_eq!(output(editor), "? invalid destination address\n");
        }
    }

    #[test]
    fn test_transfer_into_itself_is_rejected() {
        for script in ["2,4t2\n", "2,4t3\n"] {
            let editor = run(&["a", "b", "c", "d", "e"], script);
            assert_eq!(contents(&editor), ["a", "b", "c", "d", "e"]);
            assert!(editor.session().undo.is_empty());
            assert_eq!(output(editor), "? invalid destination address\n");
        }
    }

    #[test]
    fn test_transfer() {
        let editor = run(&["a", "b", "c"], "1,2t$\n");
        assert_eq!(contents(&editor), ["a", "b", "c", "a", "b"]);
        assert_eq!(editor.session().dot(), 5);

        let editor = run(&["a", "b", "c"], "3t0\n");
        assert_eq!(contents(&editor), ["c", "a", "b", "c"]);
    }

    #[test]
    fn test_yank_is_idempotent() {
        let mut editor = editor(&["a", "b", "c"], "1,2y\n");
        editor.session_mut().document.set_dot(3);
        editor.run().unwrap();
        let first = editor.session().document.cut_buffer().to_vec();
        editor.handle_line("1,2y").unwrap();
        assert_eq!(editor.session().document.cut_buffer(), first.as_slice());
        assert_eq!(contents(&editor), ["a", "b", "c"]);
        assert_eq!(editor.session().dot(), 3);
        assert!(editor.session().undo.is_empty());
    }

    #[test]
    fn test_put() {
        let editor = run(&["a", "b", "c"], "1y\n3x\n");
        assert_eq!(contents(&editor), ["a", "b", "c", "a"]);
        assert_eq!(editor.session().dot(), 4);
    }

    #[test]
    fn test_put_errors() {
        let mut editor = editor(&["a", "b"], "");
        assert!(matches!(
            editor.handle_line("x"),
            Err(EdError::EmptyCutBuffer)
        ));
        editor.handle_line("1y").unwrap();
        assert!(matches!(
            editor.handle_line("1,2x"),
            Err(EdError::RangeNotAllowed)
        ));
    }

    #[test]
    fn test_mark_rejects_ranges_and_line_zero() {
        let mut editor = editor(&["a", "b"], "");
        assert!(matches!(
            editor.handle_line("1,2ka"),
            Err(EdError::RangeNotAllowed)
        ));
        assert!(matches!(editor.handle_line("0ka"), Err(EdError::InvalidLine)));
        editor.handle_line("2ka").unwrap();
        assert_eq!(editor.session().marks.get('a'), Some(2));
    }

    #[test]
    fn test_failed_command_changes_nothing() {
        let mut editor = editor(&["a", "b", "c"], "");
        editor.session_mut().document.set_dot(2);
        assert!(editor.handle_line("2,9d").is_err());
        assert!(editor.handle_line("3,1d").is_err());
        assert_eq!(contents(&editor), ["a", "b", "c"]);
        assert_eq!(editor.session().dot(), 2);
        assert!(editor.session().undo.is_empty());
        assert!(!editor.session().modified);
    }
}
