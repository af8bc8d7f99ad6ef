//! Reporting (spec §4.6): a single in-place status line per mutation plus a
//! one-shot `[+]`-prefixed informational line, both optionally mirrored
//! (ANSI-stripped) to a log file. Ambient diagnostic logging (malformed URL,
//! unwritable log file) goes through `log()`, independent of the per-mutation
//! status surface, in the style of the teacher's own timestamped logger.

use chrono::Local;
use colored::*;
use std::fs::File;
use std::io::Write;

/// Overwrite width used by the CR + spaces + CR clear-line trick.
const CLEAR_WIDTH: usize = 100;

/// Severity for the ambient diagnostic logger (distinct from per-mutation
/// status lines, which always run at "info" level with their own format).
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn prefix(&self) -> ColoredString {
        match self {
            LogLevel::Info => "INF".cyan(),
            LogLevel::Warning => "WRN".yellow(),
            LogLevel::Error => "ERR".red(),
        }
    }
}

/// Prints a timestamped, level-tagged diagnostic line.
pub fn log(level: LogLevel, message: &str) {
    let time = Local::now().format("%I:%M%p").to_string().to_uppercase();
    println!("{} {} {}", time.dimmed(), level.prefix(), message);
}

/// Strips ANSI CSI escape sequences (`\x1B[...letter`), matching the grammar
/// `\x1B\[[0-?]*[ -/]*[@-~]`. Idempotent: stripping twice equals stripping once.
pub fn strip_ansi(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == 0x1b && i + 1 < bytes.len() && bytes[i + 1] == b'[' {
            let mut j = i + 2;
            while j < bytes.len() && (0x30..=0x3f).contains(&bytes[j]) {
                j += 1;
            }
            while j < bytes.len() && (0x20..=0x2f).contains(&bytes[j]) {
                j += 1;
            }
            if j < bytes.len() && (0x40..=0x7e).contains(&bytes[j]) {
                i = j + 1;
                continue;
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    out
}

/// Per-session status surface: an in-place overwritten line on stdout, plus
/// an optional append-only, ANSI-stripped mirror in a log file.
pub struct Reporter {
    pub quiet: bool,
    pub no_color: bool,
    log_file: Option<File>,
}

impl Reporter {
    pub fn new(log_file: Option<File>, no_color: bool, quiet: bool) -> Self {
        if no_color || cfg!(windows) {
            colored::control::set_override(false);
        }
        Reporter {
            quiet,
            no_color,
            log_file,
        }
    }

    /// Overwrites the current status line with `[name]: message`, colorized
    /// unless color is suppressed, and mirrors the ANSI-stripped text to the
    /// log file if one is configured.
    pub fn status(&mut self, name: &str, message: &str) {
        let padding = 13usize.saturating_sub(name.len());
        let bracketed = format!(
            "[{}]{}: {}",
            name.cyan(),
            " ".repeat(padding),
            message
        )
        .bold()
        .magenta()
        .to_string();

        if !self.quiet {
            print!("\r{}\r", " ".repeat(CLEAR_WIDTH));
            print!("{}", bracketed);
            let _ = std::io::stdout().flush();
        }
        self.log_line(&bracketed);
    }

    /// Emits a one-shot `[+]`-prefixed informational line (cookie count,
    /// banner fields, `[CRITICAL]` artifact notices).
    pub fn info(&mut self, message: &str) {
        let line = format!("{} {}", "[+]".bold().magenta(), message);
        if !self.quiet {
            println!("{}", line);
        }
        self.log_line(&line);
    }

    fn log_line(&mut self, rendered: &str) {
        if let Some(file) = self.log_file.as_mut() {
            let _ = writeln!(file, "{}", strip_ansi(rendered));
        }
    }

    /// Clears the final status line when the session ran in quiet mode.
    pub fn clear(&mut self) {
        if self.quiet {
            print!("\r{}\r", " ".repeat(CLEAR_WIDTH));
            let _ = std::io::stdout().flush();
        }
    }
}
