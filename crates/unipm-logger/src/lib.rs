use crossterm::{ExecutableCommand, cursor, terminal};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Instant;

/// Process-wide logger for the package-manager layer.
///
/// Status lines are transient (rewritten in place); everything else is a
/// prefixed line. Quiet mode drops everything except errors, verbose mode
/// additionally prints debug and shell-echo lines.
pub struct Logger {
    started: Instant,
    quiet: bool,
    verbose: bool,
}

enum Level {
    Info,
    Success,
    Warning,
    Error,
    Debug,
    Shell,
}

impl Level {
    fn prefix(&self) -> String {
        match self {
            Self::Info => "unipm".bright_cyan().bold().to_string(),
            Self::Success => "✓".bright_green().bold().to_string(),
            Self::Warning => "⚠".bright_yellow().bold().to_string(),
            Self::Error => "✗".bright_red().bold().to_string(),
            Self::Debug => "•".bright_black().bold().to_string(),
            Self::Shell => "$".bright_blue().bold().to_string(),
        }
    }

    fn paint(&self, message: &str) -> String {
        match self {
            Self::Info => message.white().to_string(),
            Self::Success => message.bright_green().to_string(),
            Self::Warning => message.bright_yellow().to_string(),
            Self::Error => message.bright_red().to_string(),
            Self::Debug | Self::Shell => message.bright_black().to_string(),
        }
    }
}

impl Logger {
    #[must_use]
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            started: Instant::now(),
            quiet,
            verbose,
        }
    }

    fn clear_status_line(&self) {
        if self.quiet {
            return;
        }

        let mut stdout = io::stdout();
        let _ = stdout.execute(cursor::MoveToColumn(0));
        let _ = stdout.execute(terminal::Clear(terminal::ClearType::CurrentLine));
        let _ = stdout.flush();
    }

    fn emit(&self, level: &Level, message: &str) {
        if self.quiet && !matches!(level, Level::Error) {
            return;
        }
        if matches!(level, Level::Debug | Level::Shell) && !self.verbose {
            return;
        }

        self.clear_status_line();
        println!("{} {}", level.prefix(), level.paint(message));
    }

    /// Transient progress line, overwritten by the next log call.
    pub fn status(&self, message: &str) {
        if self.quiet {
            return;
        }

        self.clear_status_line();
        print!("{} {}", "◦".bright_cyan(), message.bright_white());
        let _ = io::stdout().flush();
    }

    /// Final success line carrying the elapsed time since construction.
    pub fn finish(&self, message: &str) {
        if self.quiet {
            return;
        }

        let elapsed = self.started.elapsed();
        let took = if elapsed.as_millis() < 1000 {
            format!("{}ms", elapsed.as_millis())
        } else {
            format!("{:.2}s", elapsed.as_secs_f64())
        };

        self.clear_status_line();
        println!(
            "{} {} {}",
            "✓".bright_green().bold(),
            message.bright_green(),
            format!("[{took}]").bright_black()
        );
    }

    pub fn info(&self, message: &str) {
        self.emit(&Level::Info, message);
    }

    pub fn success(&self, message: &str) {
        self.emit(&Level::Success, message);
    }

    pub fn warn(&self, message: &str) {
        self.emit(&Level::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(&Level::Error, message);
    }

    pub fn debug(&self, message: &str) {
        self.emit(&Level::Debug, message);
    }

    pub fn shell(&self, command: &str) {
        self.emit(&Level::Shell, command);
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

pub fn init_logger(quiet: bool, verbose: bool) {
    let _ = LOGGER.set(Logger::new(quiet, verbose));
}

fn get_logger() -> &'static Logger {
    // Library callers that never ran the CLI entry point still get output.
    LOGGER.get_or_init(|| Logger::new(false, false))
}

pub fn status(message: &str) {
    get_logger().status(message);
}

pub fn info(message: &str) {
    get_logger().info(message);
}

pub fn success(message: &str) {
    get_logger().success(message);
}

pub fn warn(message: &str) {
    get_logger().warn(message);
}

pub fn error(message: &str) {
    get_logger().error(message);
}

pub fn debug(message: &str) {
    get_logger().debug(message);
}

pub fn shell(command: &str) {
    get_logger().shell(command);
}

pub fn finish(message: &str) {
    get_logger().finish(message);
}
