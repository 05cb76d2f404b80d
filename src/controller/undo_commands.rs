use crate::command::Command;
use crate::controller::editor::{EditorController, Flow, no_range};
use crate::document_model::{UndoAction, UndoEntry};
use crate::error::{EdError, EdResult};
use std::io::{BufRead, Write};
use tracing::debug;

impl<R: BufRead, W: Write> EditorController<R, W> {
    /// `u` reverses the most recent mutating command.
    pub(crate) fn undo(&mut self, command: Command) -> EdResult<Flow> {
        no_range(&command)?;
        let entry = self.session.undo.pop().ok_or(EdError::NothingToUndo)?;
        debug!(
            command = %entry.original.letter(),
            remaining = self.session.undo.len(),
            "undoing"
        );
        self.rollback(entry)?;
        Ok(Flow::Continue)
    }

    /// Replays `entry` with undo logging switched off.
    pub(crate) fn rollback(&mut self, entry: UndoEntry) -> EdResult<()> {
        self.session.undo.set_replaying(true);
        let result = self.replay(entry);
        self.session.undo.set_replaying(false);
        result
    }

    fn replay(&mut self, entry: UndoEntry) -> EdResult<()> {
        match entry.action {
            UndoAction::Simple { inverse, lines } => {
                self.execute(inverse, Some(lines))?;
            }
            UndoAction::MoveReinsert { start, end, dest } => {
                let count = end + 1 - start;
                if dest < start {
                    self.session.move_span(dest + 1, dest + count, end);
                } else {
                    self.session.move_span(dest + 1 - count, dest, start - 1);
                }
            }
            UndoAction::Substitute(entries) => {
                for entry in entries {
                    self.replay(entry)?;
                }
            }
            UndoAction::Batch(entries) => {
                for entry in entries.into_iter().rev() {
                    self.replay(entry)?;
                }
            }
        }
        self.session.marks.restore(&entry.removed_marks);
        self.session.set_dot_clamped(entry.dot);
        self.session.modified = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::controller::editor::tests::{contents, editor, run};
    use crate::error::EdError;

    #[test]
    fn test_undo_with_nothing_to_undo() {
        let mut editor = editor(&["a"], "");
        assert!(matches!(editor.handle_line("u"), Err(EdError::NothingToUndo)));
        assert!(matches!(
            editor.handle_line("1u"),
            Err(EdError::RangeNotAllowed)
        ));
    }

    #[test]
    fn test_undo_change_restores_lines_and_dot() {
        let editor = run(&["1", "2", "3", "4"], "2,3c\nnew\n.\nu\n");
        assert_eq!(contents(&editor), ["1", "2", "3", "4"]);
        assert_eq!(editor.session().dot(), 2);
        assert!(editor.session().undo.is_empty());
    }

    #[test]
    fn test_undo_delete_restores_marks() {
        let editor = run(&["1", "2", "3", "4", "5"], "2ka\n3kb\n5kc\n2,3d\nu\n");
        assert_eq!(contents(&editor), ["1", "2", "3", "4", "5"]);
        let marks = &editor.session().marks;
        assert_eq!(marks.get('a'), Some(2));
        assert_eq!(marks.get('b'), Some(3));
        assert_eq!(marks.get('c'), Some(5));
    }

    #[test]
    fn test_undo_does_not_touch_cut_buffer() {
        let editor = run(&["1", "2", "3"], "1y\n3a\nx\n.\nu\n");
        assert_eq!(contents(&editor), ["1", "2", "3"]);
        assert_eq!(editor.session().document.cut_buffer(), ["1\n"]);
    }

    #[test]
    fn test_undo_is_not_undoable() {
        let mut editor = editor(&["1", "2"], "");
        editor.handle_line("1d").unwrap();
        editor.handle_line("u").unwrap();
        assert!(matches!(editor.handle_line("u"), Err(EdError::NothingToUndo)));
        assert_eq!(contents(&editor), ["1", "2"]);
    }

    #[test]
    fn test_undo_steps_back_in_order() {
        let editor = run(&["a", "b", "c"], "1d\n$a\nz\n.\n1,2j\nu\nu\nu\n");
        assert_eq!(contents(&editor), ["a", "b", "c"]);
    }

    #[test]
    fn test_undo_move() {
        for script in ["4,6m2\nu\n", "1,2m5\nu\n", "2m0\nu\n", "3m3\nu\n"] {
            let editor = run(&["a", "b", "c", "d", "e", "f"], script);
            assert_eq!(
                contents(&editor),
                ["a", "b", "c", "d", "e", "f"],
                "script {script:?}"
            );
        }
    }

    #[test]
    fn test_undo_move_restores_marks() {
        let editor = run(&["a", "b", "c", "d"], "1ka\n3kc\n1m4\nu\n");
        assert_eq!(editor.session().marks.get('a'), Some(1));
        assert_eq!(editor.session().marks.get('c'), Some(3));
    }

    #[test]
    fn test_undo_join_transfer_put_substitute() {
        for script in [
            "1,3j\nu\n",
            "1,2t3\nu\n",
            "2y\n0x\nu\n",
            ",s/./X/g\nu\n",
            "2c\n.\nu\n",
            "0a\nnew\n.\nu\n",
        ] {
            let editor = run(&["one", "two", "three"], script);
            assert_eq!(contents(&editor), ["one", "two", "three"], "script {script:?}");
        }
    }
}
