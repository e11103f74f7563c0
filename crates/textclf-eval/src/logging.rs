//! Color-coded console status lines.
//!
//! Status lines look like `<icon> <color><message><reset>`. They are emitted
//! through the `log` facade, and [`init_logger`] installs an `env_logger`
//! format that maps log levels onto the status kinds. Records logged with
//! target `success` (see the [`success!`](crate::success) macro) are shown
//! as `success` instead of `info`.
use std::io::Write;
use std::str::FromStr;

use log::{Level, LevelFilter, Record};

const RESET: &str = "\x1b[0m";

/// Log target recognised as a success status.
pub const SUCCESS_TARGET: &str = "success";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
    Debug,
    Warning,
    Success,
}

impl StatusKind {
    /// ANSI color escape and icon prefix for this kind.
    pub fn style(&self) -> (&'static str, &'static str) {
        match self {
            StatusKind::Info => ("\x1b[94m", "ℹ️ "),
            StatusKind::Error => ("\x1b[91m", "❌ "),
            StatusKind::Debug => ("\x1b[90m", "🐞 "),
            StatusKind::Warning => ("\x1b[93m", "⚠️ "),
            StatusKind::Success => ("\x1b[92m", "✅ "),
        }
    }

    fn from_record(record: &Record) -> Self {
        match record.level() {
            Level::Error => StatusKind::Error,
            Level::Warn => StatusKind::Warning,
            Level::Info if record.target() == SUCCESS_TARGET => StatusKind::Success,
            Level::Info => StatusKind::Info,
            Level::Debug | Level::Trace => StatusKind::Debug,
        }
    }
}

impl FromStr for StatusKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(StatusKind::Info),
            "error" => Ok(StatusKind::Error),
            "debug" => Ok(StatusKind::Debug),
            "warning" => Ok(StatusKind::Warning),
            "success" => Ok(StatusKind::Success),
            _ => Err(format!("Unknown status kind: {}", s)),
        }
    }
}

/// Format one status line for `kind`.
pub fn status_line(kind: StatusKind, text: &str) -> String {
    let (color, icon) = kind.style();
    format!("{} {}{}{}", icon, color, text, RESET)
}

/// Format a status line from a free-form kind name. Unknown names produce
/// the bare text with no icon or color.
pub fn status_line_named(kind: &str, text: &str) -> String {
    match kind.parse::<StatusKind>() {
        Ok(kind) => status_line(kind, text),
        Err(_) => format!(" {}{}", text, RESET),
    }
}

/// Install the status-line formatter as the global logger.
///
/// `env_var` names the environment variable holding the filter directives,
/// `default_filter` applies when it is unset. Calling this twice is harmless:
/// the second installation attempt is ignored.
pub fn init_logger(env_var: &str, default_filter: &str) {
    let _ = env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or(env_var, default_filter))
        .format(|buf, record| {
            let kind = StatusKind::from_record(record);
            writeln!(buf, "{}", status_line(kind, &record.args().to_string()))
        })
        .try_init();
}

/// Log a success status line.
#[macro_export]
macro_rules! success {
    ($($arg:tt)+) => {
        log::info!(target: $crate::logging::SUCCESS_TARGET, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_colors() {
        let line = status_line(StatusKind::Info, "hello");
        assert_eq!(line, "ℹ️  \x1b[94mhello\x1b[0m");

        let line = status_line(StatusKind::Success, "done");
        assert!(line.starts_with("✅"));
        assert!(line.contains("\x1b[92m"));
        assert!(line.ends_with(RESET));
    }

    #[test]
    fn test_status_line_unknown_kind_is_plain() {
        let line = status_line_named("verbose", "text");
        assert!(!line.contains("\x1b[9"));
        assert!(line.contains("text"));
    }

    #[test]
    fn test_status_kind_from_str() {
        assert_eq!("WARNING".parse::<StatusKind>().unwrap(), StatusKind::Warning);
        assert!("nope".parse::<StatusKind>().is_err());
    }
}
