use crate::address::LineRange;
use crate::command::{
    Command, CommandKind, GlobalArgs, Occurrence, PrintMode, Replacement, SubstituteArgs,
};
use crate::controller::editor::{EditorController, Flow};
use crate::document_model::search_state::{line_body, matches_line};
use crate::document_model::{LastSubstitution, LineId, UndoAction, UndoEntry};
use crate::error::{EdError, EdResult, ParseError};
use regex::Regex;
use std::io::{BufRead, Write};
use tracing::{debug, warn};

/// One command of a `g`/`v` list, with the text lines that followed it.
#[derive(Debug, Clone)]
struct ListStep {
    command: Command,
    text: Option<Vec<String>>,
}

impl<R: BufRead, W: Write> EditorController<R, W> {
    pub(crate) fn substitute(&mut self, mut command: Command, args: SubstituteArgs) -> EdResult<Flow> {
        let range = self.session.resolve_lines(&mut command)?;

        let substitution = match args.expression {
            Some((pattern, replacement)) => {
                let regex = self.session.search.compile(&pattern)?;
                let template = match replacement {
                    Replacement::Template(template) => template,
                    Replacement::Previous => self
                        .session
                        .search
                        .last_substitution()
                        .ok_or(EdError::NoPreviousSubstitution)?
                        .template
                        .clone(),
                };
                LastSubstitution {
                    regex,
                    template,
                    suffix: args.suffix.unwrap_or_default(),
                }
            }
            None => {
                let last = self
                    .session
                    .search
                    .last_substitution()
                    .ok_or(EdError::NoPreviousSubstitution)?;
                LastSubstitution {
                    suffix: args.suffix.unwrap_or(last.suffix),
                    ..last.clone()
                }
            }
        };
        self.session.search.set_last_substitution(substitution.clone());

        // Undo entries are replayed first to last, so each one is recorded
        // against the numbering before this command ran.
        let mut undo_entries = Vec::new();
        let mut added = 0;
        for n in range.start..=range.end {
            let at = n + added;
            let line = self.session.document.line(at);
            let Some(replaced) = replace_line(
                &substitution.regex,
                line_body(line),
                &substitution.template,
                substitution.suffix.occurrence,
            ) else {
                continue;
            };
            let marks = self
                .session
                .marks_on(at)
                .into_iter()
                .map(|(name, _)| (name, n))
                .collect();
            let mut pieces = replaced.split('\n').map(|piece| format!("{piece}\n"));
            let first = pieces.next().unwrap_or_else(|| "\n".to_string());
            let old = self.session.document.replace_line(at, first);
            let rest: Vec<String> = pieces.collect();
            let extra = rest.len();
            let last = if extra > 0 {
                self.session.insert_span(at, rest)
            } else {
                at
            };
            undo_entries.push(
                UndoEntry::new(
                    UndoAction::Simple {
                        inverse: Command::on_lines(n, n + extra, CommandKind::Change),
                        lines: vec![old],
                    },
                    command.clone(),
                    n,
                )
                .with_removed_marks(marks),
            );
            added += extra;
            self.session.document.set_dot(last);
        }

        if undo_entries.is_empty() {
            // a list line that does not match is not an error inside `g`
            if self.session.in_global {
                return Ok(Flow::Continue);
            }
            return Err(EdError::NoSubstitution);
        }
        debug!(lines = undo_entries.len(), "substituted");
        self.session.modified = true;
        self.session.undo.push(UndoEntry::new(
            UndoAction::Substitute(undo_entries),
            command,
            range.start,
        ));

        if let Some(mode) = substitution.suffix.print {
            let dot = self.session.dot();
            self.print_line(dot, mode)?;
        }
        Ok(Flow::Continue)
    }

    /// `g`, `v`, `G` and `V`. The whole command is one undo step, and a
    /// failure part way through puts back everything it had changed.
    pub(crate) fn global(&mut self, mut command: Command, args: GlobalArgs) -> EdResult<Flow> {
        if self.session.in_global {
            return Err(EdError::NotAllowedInGlobal);
        }
        let len = self.session.document.len();
        if len == 0 && !command.range.is_specified() {
            return Ok(Flow::Continue);
        }
        let range = self
            .session
            .resolve_or(&mut command, LineRange::new(1, len))?;
        if range.start == 0 {
            return Err(EdError::InvalidLine);
        }
        let regex = self.session.search.compile(&args.pattern)?;
        let steps = if args.interactive {
            Vec::new()
        } else {
            parse_command_list(&args.commands)?
        };

        let marked: Vec<LineId> = (range.start..=range.end)
            .filter(|&n| matches_line(&regex, self.session.document.line(n)) != args.invert)
            .map(|n| self.session.document.line_id(n))
            .collect();
        debug!(pattern = regex.as_str(), marked = marked.len(), invert = args.invert, "global first pass");

        let original_dot = self.session.dot();
        self.session.undo.start_group();
        self.session.in_global = true;
        let result = if args.interactive {
            self.run_interactive(&marked)
        } else {
            self.run_command_list(&marked, &steps)
        };
        self.session.in_global = false;

        match result {
            Ok(()) => {
                self.session.undo.end_group(command, range.start);
                Ok(Flow::Continue)
            }
            Err(err) => {
                let entries = self.session.undo.abort_group();
                debug!(entries = entries.len(), "rolling back global command");
                let batch = UndoEntry::new(UndoAction::Batch(entries), command, original_dot);
                if let Err(rollback_err) = self.rollback(batch) {
                    warn!(%rollback_err, "could not roll back global command");
                }
                self.session.set_dot_clamped(original_dot);
                Err(err)
            }
        }
    }

    fn run_command_list(&mut self, marked: &[LineId], steps: &[ListStep]) -> EdResult<()> {
        for id in marked {
            // gone or rewritten by an earlier iteration
            let Some(line) = self.session.document.find_id(*id) else {
                continue;
            };
            self.session.document.set_dot(line);
            for step in steps {
                self.execute(step.command.clone(), step.text.clone())?;
            }
        }
        Ok(())
    }

    /// `G`/`V`: shows each marked line and reads a command for it. An empty
    /// line skips it and `&` repeats the previous command.
    fn run_interactive(&mut self, marked: &[LineId]) -> EdResult<()> {
        let mut previous: Option<String> = None;
        for id in marked {
            let Some(line) = self.session.document.find_id(*id) else {
                continue;
            };
            self.session.document.set_dot(line);
            self.print_line(line, PrintMode::Print)?;
            self.output.flush()?;

            let Some(input) = self.read_line()? else {
                break;
            };
            let input = if input == "&" {
                previous.clone().ok_or(ParseError::UnknownCommand)?
            } else {
                input
            };
            if input.is_empty() {
                continue;
            }
            let command = Command::parse(&input)?;
            if !command.kind.allowed_in_global() {
                return Err(EdError::NotAllowedInGlobal);
            }
            self.execute(command, None)?;
            previous = Some(input);
        }
        Ok(())
    }
}

/// Parses a `g`/`v` command list, pulling the text for `a`, `i` and `c` from
/// the lines after them (up to a lone `.` or the end of the list).
fn parse_command_list(lines: &[String]) -> EdResult<Vec<ListStep>> {
    let mut steps = Vec::new();
    let mut lines = lines.iter();
    while let Some(line) = lines.next() {
        let command = Command::parse(line)?;
        if !command.kind.allowed_in_global() {
            return Err(EdError::NotAllowedInGlobal);
        }
        let text = if command.kind.takes_text() {
            let text = lines
                .by_ref()
                .take_while(|line| line.as_str() != ".")
                .map(|line| format!("{line}\n"))
                .collect();
            Some(text)
        } else {
            None
        };
        steps.push(ListStep { command, text });
    }
    Ok(steps)
}

/// Applies one substitution to a line body. `None` when nothing was replaced.
pub fn replace_line(regex: &Regex, body: &str, template: &str, occurrence: Occurrence) -> Option<String> {
    match occurrence {
        Occurrence::All => regex
            .is_match(body)
            .then(|| regex.replace_all(body, template).into_owned()),
        Occurrence::Nth(n) => {
            let captures = regex.captures_iter(body).nth(n.saturating_sub(1))?;
            let whole = captures.get(0)?;
            let mut out = String::with_capacity(body.len());
            out.push_str(&body[..whole.start()]);
            captures.expand(template, &mut out);
            out.push_str(&body[whole.end()..]);
            Some(out)
        }
    }
}
