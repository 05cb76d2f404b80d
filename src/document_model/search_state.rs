use super::document::Document;
use crate::command::SubstituteSuffix;
use crate::error::{EdError, EdResult};
use regex::Regex;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

/// The pieces of the last `s` command needed to repeat it.
#[derive(Debug, Clone)]
pub struct LastSubstitution {
    pub regex: Regex,
    pub template: String,
    pub suffix: SubstituteSuffix,
}

/// Owns the last search pattern and the last substitution, which bare `//`,
/// `??`, `s` and `%` reuse.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    last_regex: Option<Regex>,
    last_substitution: Option<LastSubstitution>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `pattern` and remembers it. An empty pattern means the last one.
    pub fn compile(&mut self, pattern: &str) -> EdResult<Regex> {
        if pattern.is_empty() {
            return self.last_regex.clone().ok_or(EdError::NoPreviousPattern);
        }
        let regex = Regex::new(pattern)?;
        self.last_regex = Some(regex.clone());
        Ok(regex)
    }

    pub fn last_substitution(&self) -> Option<&LastSubstitution> {
        self.last_substitution.as_ref()
    }

    pub fn set_last_substitution(&mut self, substitution: LastSubstitution) {
        self.last_regex = Some(substitution.regex.clone());
        self.last_substitution = Some(substitution);
    }

    /// Next line matching `pattern` after (or before) `from`, wrapping around
    /// the document once. Line `from` itself is tried last.
    pub fn find_line(
        &mut self,
        document: &Document,
        pattern: &str,
        from: usize,
        direction: SearchDirection,
    ) -> EdResult<usize> {
        let regex = self.compile(pattern)?;
        let total = document.len();
        if total == 0 {
            return Err(EdError::NoMatch);
        }
        let from = from.min(total);

        for step in 1..=total {
            let line = match direction {
                SearchDirection::Forward => (from + step - 1) % total + 1,
                SearchDirection::Backward => (from + total - 1 - step % total) % total + 1,
            };
            if matches_line(&regex, document.line(line)) {
                trace!(pattern = regex.as_str(), from, line, "search matched");
                return Ok(line);
            }
        }
        Err(EdError::NoMatch)
    }
}

/// The text a pattern is matched against: the line minus its terminator.
pub fn line_body(line: &str) -> &str {
    line.strip_suffix('\n').unwrap_or(line)
}

pub fn matches_line(regex: &Regex, line: &str) -> bool {
    regex.is_match(line_body(line))
}
