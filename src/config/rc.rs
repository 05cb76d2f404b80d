use crate::controller::Session;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const RC_FILE: &str = ".redrc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcConfig {
    pub prompt: Option<String>,
    pub show_prompt: bool,
    pub window_size: Option<usize>,
    pub undo_levels: usize,
    pub verbose: bool,
}

impl Default for RcConfig {
    fn default() -> Self {
        Self {
            prompt: None,
            show_prompt: false,
            window_size: None,
            undo_levels: 1000,
            verbose: true,
        }
    }
}

pub struct RcLoader;

impl RcLoader {
    /// Get the path to the RC file
    /// Looks for .redrc in:
    /// 1. Current directory
    /// 2. Home directory (~/.redrc)
    pub fn get_rc_path() -> Option<PathBuf> {
        let current_rc = Path::new(RC_FILE);
        if current_rc.exists() {
            return Some(current_rc.to_path_buf());
        }

        if let Ok(home) = env::var("HOME") {
            let home_rc = Path::new(&home).join(RC_FILE);
            if home_rc.exists() {
                return Some(home_rc);
            }
        }

        None
    }

    /// Load and parse the RC file, if there is one
    pub fn load_config() -> RcConfig {
        let mut config = RcConfig::default();

        if let Some(rc_path) = Self::get_rc_path() {
            match fs::read_to_string(&rc_path) {
                Ok(content) => {
                    debug!(path = %rc_path.display(), "loading run-control file");
                    Self::parse_config_content(&content, &mut config);
                }
                Err(err) => {
                    warn!(path = %rc_path.display(), %err, "cannot read run-control file");
                }
            }
        }

        config
    }

    fn parse_config_content(content: &str, config: &mut RcConfig) {
        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with('"') {
                continue;
            }

            Self::parse_config_line(line, config);
        }
    }

    /// Parse a single `set` line
    fn parse_config_line(line: &str, config: &mut RcConfig) {
        let Some(setting) = line.strip_prefix("set ").map(str::trim) else {
            warn!(line, "ignoring run-control line");
            return;
        };

        match setting.split_once('=') {
            None => match setting {
                "prompt" => config.show_prompt = true,
                "noprompt" => config.show_prompt = false,
                "verbose" => config.verbose = true,
                "noverbose" => config.verbose = false,
                _ => warn!(setting, "unknown setting"),
            },
            Some(("prompt", value)) => {
                config.prompt = Some(value.to_string());
                config.show_prompt = true;
            }
            Some(("window", value)) => match value.trim().parse::<usize>() {
                Ok(size) if size > 0 => config.window_size = Some(size),
                _ => warn!(value, "invalid window size"),
            },
            Some(("undolevels", value)) => match value.trim().parse::<usize>() {
                Ok(levels) if levels > 0 => config.undo_levels = levels,
                _ => warn!(value, "invalid undo levels"),
            },
            Some((key, _)) => warn!(key, "unknown setting"),
        }
    }

    pub fn apply_config(session: &mut Session, config: &RcConfig) {
        if let Some(prompt) = &config.prompt {
            session.prompt = prompt.clone();
        }
        session.show_prompt = config.show_prompt;
        if let Some(size) = config.window_size {
            session.window_size = size;
        }
        session.undo.set_max_levels(config.undo_levels);
        session.verbose = config.verbose;
    }
}
