use crate::command::Command;
use crate::controller::editor::{EditorController, Flow, no_range};
use crate::error::{EdResult, ParseError};
use std::io::{BufRead, Write};

const COMMANDS: &[(char, &str, &str)] = &[
    ('a', "(.)a", "Append text after the addressed line. Address 0 appends before the first line."),
    ('c', "(.,.)c", "Change the addressed lines to the text that follows."),
    ('d', "(.,.)d", "Delete the addressed lines into the cut buffer."),
    ('e', "e [file]", "Edit file, unless there are unsaved changes."),
    ('E', "E [file]", "Edit file, discarding any unsaved changes."),
    ('f', "f [file]", "Set the default filename, or print it."),
    ('g', "(1,$)g/re/cmds", "Run the command list on every line matching re."),
    ('G', "(1,$)G/re/", "Interactive g: prompt for a command for each matching line."),
    ('h', "h [topic]", "Show help. Topics: address, or any command letter."),
    ('i', "(.)i", "Insert text before the addressed line."),
    ('j', "(.,.+1)j", "Join the addressed lines into one."),
    ('k', "(.)kx", "Mark the addressed line as x, a lower case letter."),
    ('l', "(.,.)l", "Print the addressed lines unambiguously."),
    ('m', "(.,.)m(.)", "Move the addressed lines after the destination line."),
    ('n', "(.,.)n", "Print the addressed lines with their line numbers."),
    ('p', "(.,.)p", "Print the addressed lines."),
    ('P', "P", "Toggle the command prompt."),
    ('q', "q", "Quit, unless there are unsaved changes."),
    ('Q', "Q", "Quit, discarding any unsaved changes."),
    ('r', "($)r [file]", "Read file in after the addressed line."),
    ('s', "(.,.)s/re/new/[gpnl count]", "Replace text matching re. & is the match, \\1-\\9 are groups, % is the last replacement."),
    ('t', "(.,.)t(.)", "Copy the addressed lines after the destination line."),
    ('u', "u", "Undo the last change."),
    ('v', "(1,$)v/re/cmds", "Like g, for the lines NOT matching re."),
    ('V', "(1,$)V/re/", "Interactive v."),
    ('w', "(1,$)w [file]", "Write the addressed lines to file. wq writes and quits."),
    ('W', "(1,$)W [file]", "Append the addressed lines to file."),
    ('x', "(.)x", "Put the cut buffer after the addressed line."),
    ('y', "(.,.)y", "Copy the addressed lines into the cut buffer."),
    ('z', "(.+1)z[n]", "Scroll n lines (default: the window size) from the addressed line."),
    ('#', "#", "Comment; the rest of the line is ignored."),
    ('=', "($)=", "Print the addressed line number."),
];

const ADDRESS_HELP: &[&str] = &[
    "An address is made of these elements:",
    "  .     the current line",
    "  $     the last line",
    "  n     line n",
    "  +n -n n lines after or before; a bare + or - means 1",
    "  /re/  the next line matching re, wrapping around",
    "  ?re?  the previous line matching re, wrapping around",
    "  'x    the line marked x",
    "",
    "A number following another element is an offset: $-1, 'a+2, /re/3.",
    "",
    "A range is two addresses separated by , or ;. With ; the current line is",
    "set to the first address before the second is worked out.",
    "  ,      1,$",
    "  ;      .;$",
    "  ,addr  1,addr",
    "  ;addr  .;addr",
    "  addr   addr,addr",
];

impl<R: BufRead, W: Write> EditorController<R, W> {
    pub(crate) fn help(&mut self, command: Command, topic: Option<&str>) -> EdResult<Flow> {
        no_range(&command)?;
        match topic {
            None => {
                writeln!(self.output, "Commands (default addresses in brackets):")?;
                for (_, usage, _) in COMMANDS {
                    writeln!(self.output, "  {usage}")?;
                }
                writeln!(self.output, "Use 'h address' or 'h <command>' for more.")?;
            }
            Some("address") => {
                for line in ADDRESS_HELP {
                    writeln!(self.output, "{line}")?;
                }
            }
            Some(topic) => {
                let mut chars = topic.chars();
                let (Some(letter), None) = (chars.next(), chars.next()) else {
                    return Err(ParseError::UnknownCommand.into());
                };
                let (_, usage, text) = COMMANDS
                    .iter()
                    .find(|(l, _, _)| *l == letter)
                    .ok_or(ParseError::UnknownCommand)?;
                writeln!(self.output, "  {usage}")?;
                writeln!(self.output, "  {text}")?;
            }
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use crate::controller::editor::tests::{editor, output, run};
    use crate::error::{EdError, ParseError};

    #[test]
    fn test_help_lists_every_command() {
        let text = output(run(&[], "h\n"));
        for usage in ["(.)a", "(.,.)m(.)", "(1,$)w [file]", "($)="] {
            assert!(text.contains(usage), "missing {usage}");
        }
    }

    #[test]
    fn test_help_topics() {
        let text = output(run(&[], "h address\nh d\n"));
        assert!(text.contains("the line marked x"));
        assert!(text.contains("Delete the addressed lines"));
    }

    #[test]
    fn test_unknown_help_topic() {
        let mut editor = editor(&[], "");
        assert!(matches!(
            editor.handle_line("h nonsense"),
            Err(EdError::Parse(ParseError::UnknownCommand))
        ));
    }
}
