use crate::address::LineRange;
use crate::command::{Command, WriteMode};
use crate::controller::editor::{EditorController, Flow, no_range};
use crate::document_model::file_io;
use crate::error::{EdError, EdResult};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::info;

impl<R: BufRead, W: Write> EditorController<R, W> {
    /// `e`/`E`: replaces the buffer with a file. `e` refuses once if there are
    /// unsaved changes.
    pub(crate) fn edit(&mut self, command: Command, path: Option<String>, force: bool) -> EdResult<Flow> {
        no_range(&command)?;
        let path = self.target_path(path.as_deref())?;
        if !force && self.session.modified && !self.session.warned {
            self.session.warned = true;
            return Err(EdError::UnsavedChanges);
        }
        self.load_file(path)
    }

    /// Loads `path` as the new buffer and makes it the default filename.
    pub fn load_file(&mut self, path: PathBuf) -> EdResult<Flow> {
        let result = file_io::read_file(&path)?;
        info!(path = %path.display(), lines = result.lines.len(), "loaded file");
        self.session.filename = Some(path);
        self.session.reset_for_new_file(result.lines);
        self.report_bytes(result.bytes)?;
        Ok(Flow::Continue)
    }

    /// `f`: sets the default filename, or prints it.
    pub(crate) fn filename(&mut self, command: Command, path: Option<String>) -> EdResult<Flow> {
        no_range(&command)?;
        match path {
            Some(path) => self.session.filename = Some(PathBuf::from(path)),
            None => {
                let name = self
                    .session
                    .filename
                    .as_ref()
                    .ok_or(EdError::MissingFilename)?;
                writeln!(self.output, "{}", name.display())?;
            }
        }
        Ok(Flow::Continue)
    }

    /// `r`: appends a file after the addressed line (`$` by default).
    pub(crate) fn read(&mut self, mut command: Command, path: Option<String>) -> EdResult<Flow> {
        let last = self.session.document.len();
        let after = self
            .session
            .resolve_or(&mut command, LineRange::single(last))?
            .end;
        let path = self.target_path(path.as_deref())?;
        let result = file_io::read_file(&path)?;
        if self.session.filename.is_none() {
            self.session.filename = Some(path);
        }
        let end = self.session.insert_span(after, result.lines);
        self.push_delete_undo(command, after, end);
        self.report_bytes(result.bytes)?;
        Ok(Flow::Continue)
    }

    /// `w`, `wq` and `W` write the addressed lines (`1,$` by default).
    pub(crate) fn write(&mut self, mut command: Command, path: Option<String>, mode: WriteMode) -> EdResult<Flow> {
        let len = self.session.document.len();
        let range = if command.range.is_specified() {
            Some(self.session.resolve_lines(&mut command)?)
        } else if len > 0 {
            Some(LineRange::new(1, len))
        } else {
            None
        };
        let path = self.target_path(path.as_deref())?;

        let append = mode == WriteMode::Append;
        let bytes = match range {
            Some(range) => file_io::write_file(
                &path,
                self.session.document.range(range.start, range.end),
                append,
            )?,
            None => file_io::write_file(&path, std::iter::empty(), append)?,
        };
        if self.session.filename.is_none() {
            self.session.filename = Some(path);
        }
        let whole = range.is_none_or(|range| range.start == 1 && range.end == len);
        if whole {
            self.session.modified = false;
        }
        self.report_bytes(bytes)?;

        if mode == WriteMode::WriteQuit {
            return Ok(Flow::Quit);
        }
        Ok(Flow::Continue)
    }

    /// `q` refuses once if there are unsaved changes; `Q` never does.
    pub(crate) fn quit(&mut self, command: Command, force: bool) -> EdResult<Flow> {
        no_range(&command)?;
        if !force && self.session.modified && !self.session.warned {
            self.session.warned = true;
            return Err(EdError::UnsavedChanges);
        }
        Ok(Flow::Quit)
    }

    /// An explicit name, or the default filename.
    fn target_path(&self, path: Option<&str>) -> EdResult<PathBuf> {
        match path {
            Some(path) => Ok(PathBuf::from(path)),
            None => self.session.filename.clone().ok_or(EdError::MissingFilename),
        }
    }

    fn report_bytes(&mut self, bytes: usize) -> EdResult<()> {
        if !self.session.silent {
            writeln!(self.output, "{bytes}")?;
        }
        Ok(())
    }
}
