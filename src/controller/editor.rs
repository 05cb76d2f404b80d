use crate::command::{Command, CommandKind};
use crate::controller::session::Session;
use crate::error::{EdError, EdResult};
use std::io::{BufRead, Write};
use tracing::{debug, warn};

/// What the read-execute loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Drives a [`Session`] from a line-oriented input, writing everything the
/// commands print to `output`.
pub struct EditorController<R: BufRead, W: Write> {
    pub(crate) session: Session,
    pub(crate) input: R,
    pub(crate) output: W,
}

impl<R: BufRead, W: Write> EditorController<R, W> {
    pub fn new(session: Session, input: R, output: W) -> Self {
        Self {
            session,
            input,
            output,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Reads and executes command lines until `q` or end of input.
    pub fn run(&mut self) -> EdResult<()> {
        loop {
            if self.session.show_prompt {
                write!(self.output, "{}", self.session.prompt)?;
                self.output.flush()?;
            }
            let Some(line) = self.read_command_line()? else {
                debug!("end of input");
                return Ok(());
            };
            match self.handle_line(&line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => return Ok(()),
                Err(err) => self.report(&err)?,
            }
        }
    }

    /// Parses and executes one command line.
    pub fn handle_line(&mut self, line: &str) -> EdResult<Flow> {
        let command = Command::parse(line)?;
        let warns = matches!(
            command.kind,
            CommandKind::Edit { force: false, .. } | CommandKind::Quit { force: false }
        );
        let result = self.execute(command, None);
        if !warns {
            self.session.warned = false;
        }
        result
    }

    /// Runs one command. `text` supplies the input lines for `a`, `i` and `c`
    /// instead of reading them, as undo replay and command lists do.
    pub fn execute(&mut self, command: Command, text: Option<Vec<String>>) -> EdResult<Flow> {
        debug!(
            command = %command.letter(),
            range = %command.range,
            dot = self.session.dot(),
            replaying = self.session.undo.is_replaying(),
            "executing"
        );
        if self.session.in_global && !command.kind.allowed_in_global() {
            return Err(EdError::NotAllowedInGlobal);
        }

        match command.kind.clone() {
            CommandKind::Append => self.append(command, text),
            CommandKind::Insert => self.insert(command, text),
            CommandKind::Change => self.change(command, text),
            CommandKind::Delete => self.delete(command),
            CommandKind::Join => self.join(command),
            CommandKind::Move(dest) => self.move_lines(command, &dest),
            CommandKind::Transfer(dest) => self.transfer(command, &dest),
            CommandKind::Yank => self.yank(command),
            CommandKind::Put => self.put(command),
            CommandKind::Mark(name) => self.mark(command, name),
            CommandKind::Print | CommandKind::Number | CommandKind::List => self.print(command),
            CommandKind::LineNumber => self.line_number(command),
            CommandKind::Scroll(size) => self.scroll(command, size),
            CommandKind::Edit { path, force } => self.edit(command, path, force),
            CommandKind::Filename(path) => self.filename(command, path),
            CommandKind::Read(path) => self.read(command, path),
            CommandKind::Write { path, mode } => self.write(command, path, mode),
            CommandKind::Quit { force } => self.quit(command, force),
            CommandKind::Substitute(args) => self.substitute(command, args),
            CommandKind::Global(args) => self.global(command, args),
            CommandKind::Undo => self.undo(command),
            CommandKind::Help(topic) => self.help(command, topic.as_deref()),
            CommandKind::TogglePrompt => {
                no_range(&command)?;
                self.session.show_prompt = !self.session.show_prompt;
                Ok(Flow::Continue)
            }
            CommandKind::Comment => Ok(Flow::Continue),
        }
    }

    /// Reads one command line, joining lines that end in `\` with a newline.
    pub(crate) fn read_command_line(&mut self) -> EdResult<Option<String>> {
        let Some(mut line) = self.read_line()? else {
            return Ok(None);
        };
        while line.ends_with('\\') {
            line.pop();
            match self.read_line()? {
                Some(next) => {
                    line.push('\n');
                    line.push_str(&next);
                }
                None => break,
            }
        }
        Ok(Some(line))
    }

    /// Next input line without its terminator, or `None` at end of input.
    pub(crate) fn read_line(&mut self) -> EdResult<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    /// Text for `a`/`i`/`c`: the supplied lines, or input up to a lone `.`.
    pub(crate) fn input_text(&mut self, text: Option<Vec<String>>) -> EdResult<Vec<String>> {
        if let Some(text) = text {
            return Ok(text);
        }
        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            if line == "." {
                break;
            }
            lines.push(format!("{line}\n"));
        }
        Ok(lines)
    }

    pub(crate) fn report(&mut self, err: &EdError) -> EdResult<()> {
        warn!(category = ?err.category(), "{err}");
        if self.session.verbose && !self.session.silent {
            writeln!(self.output, "? {err}")?;
        } else {
            writeln!(self.output, "?")?;
        }
        Ok(())
    }
}

/// Rejects any typed range.
pub(crate) fn no_range(command: &Command) -> EdResult<()> {
    if command.range.is_specified() {
        Err(EdError::RangeNotAllowed)
    } else {
        Ok(())
    }
}
