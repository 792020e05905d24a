use colored::Colorize;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, OnceLock};

/// Verbosity levels for console output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum VerbosityLevel {
    /// Only show errors
    Quiet = 0,
    /// Normal output (default)
    #[default]
    Normal = 1,
    /// Verbose output with additional info
    Verbose = 2,
    /// Debug output with detailed information
    Debug = 3,
}

impl fmt::Display for VerbosityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerbosityLevel::Quiet => write!(f, "quiet"),
            VerbosityLevel::Normal => write!(f, "normal"),
            VerbosityLevel::Verbose => write!(f, "verbose"),
            VerbosityLevel::Debug => write!(f, "debug"),
        }
    }
}

impl VerbosityLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "quiet" => Some(VerbosityLevel::Quiet),
            "normal" => Some(VerbosityLevel::Normal),
            "verbose" => Some(VerbosityLevel::Verbose),
            "debug" => Some(VerbosityLevel::Debug),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Console {
    verbosity: VerbosityLevel,
}

impl Console {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self { verbosity }
    }

    fn should_show(&self, level: VerbosityLevel) -> bool {
        self.verbosity >= level
    }

    pub fn info(&self, message: &str) {
        if self.should_show(VerbosityLevel::Normal) {
            println!("ℹ️  {}", message);
        }
    }

    pub fn thinking(&self) {
        if self.should_show(VerbosityLevel::Verbose) {
            println!("{}", "🔄 Thinking...".dimmed());
        }
    }

    /// Numbered agent/tool lifecycle line, e.g. `### (confluence) 3: Agent x started`.
    pub fn lifecycle(&self, line: &str) {
        if self.should_show(VerbosityLevel::Normal) {
            println!("{}", line.dimmed());
        }
    }

    pub fn tool_call(&self, tool_name: &str, args_summary: &str) {
        if !self.should_show(VerbosityLevel::Verbose) {
            return;
        }
        println!(
            "{} {}{}{}{}",
            "⏺".dimmed(),
            tool_name.green(),
            "(".dimmed(),
            args_summary.dimmed(),
            ")".dimmed()
        );
    }

    pub fn tool_result(&self, tool_name: &str, result: &str, max_length: usize) {
        if !self.should_show(VerbosityLevel::Debug) {
            return;
        }

        let truncated = if result.chars().count() > max_length {
            let mut s = result.chars().take(max_length).collect::<String>();
            s.push_str("...");
            s
        } else {
            result.to_string()
        };

        println!(
            "{} {} {}",
            "Tool".dimmed(),
            format!("'{}'", tool_name).cyan(),
            "result:".dimmed()
        );

        for (i, line) in truncated.lines().enumerate() {
            if i >= 15 {
                println!("  {}", "...".dimmed());
                break;
            }
            println!("  {}", line);
        }
    }

    /// Shown before the y/n question of the confirmation gate.
    pub fn confirmation_request(&self, tool_name: &str, arguments: &str) {
        // The question is never hidden, otherwise the prompt would hang silently.
        println!(
            "{} {}",
            "⚙️  Human in the loop required for tool call".yellow(),
            tool_name.green()
        );
        for line in arguments.lines() {
            println!("   {}", line.dimmed());
        }
    }

    pub fn authorization_required(&self, tool_name: &str, url: &str) {
        println!(
            "⚙️  Authorization required for tool call {}",
            tool_name.green()
        );
        println!("⚙️  Please authorize in your browser: {}", url.cyan());
        println!("⚙️  Waiting for you to complete authorization...");
    }

    pub fn authorization_granted(&self, tool_name: &str) {
        if self.should_show(VerbosityLevel::Normal) {
            println!("⚙️  Authorization granted for {}", tool_name);
        }
    }

    pub fn plain(&self, message: &str) {
        if self.should_show(VerbosityLevel::Normal) {
            println!("{}", message);
        }
    }

    /// Prompt text without a trailing newline. Always shown: a quiet console
    /// still needs to tell the user it is waiting for input.
    pub fn prompt(&self, message: &str) {
        print!("{}", message);
        let _ = std::io::stdout().flush();
    }

    pub fn newline(&self) {
        if self.should_show(VerbosityLevel::Normal) {
            println!();
        }
    }

    pub fn welcome(&self, model: &str, tool_count: usize) {
        if self.should_show(VerbosityLevel::Normal) {
            println!(
                "{}",
                format!(
                    "🚀 Welcome to the Confluence agent! Model: {}, tools loaded: {}",
                    model, tool_count
                )
                .green()
            );
            println!("Type 'exit' to quit.");
        }
    }

    pub fn tools_header(&self) {
        if self.should_show(VerbosityLevel::Normal) {
            println!("🔧 Available Tools:");
        }
    }

    pub fn max_steps_reached(&self, max_steps: usize) {
        if self.should_show(VerbosityLevel::Normal) {
            println!(
                "⚠️ Maximum conversation steps ({}) reached, stopping.",
                max_steps
            );
        }
    }
}

static GLOBAL_CONSOLE: OnceLock<Arc<Console>> = OnceLock::new();

pub fn init_console(verbosity: VerbosityLevel) {
    let _ = GLOBAL_CONSOLE.set(Arc::new(Console::new(verbosity)));
}

/// Returns the process console, falling back to a normal-verbosity one when
/// `init_console` was never called (library use, tests).
pub fn console() -> Arc<Console> {
    GLOBAL_CONSOLE
        .get_or_init(|| Arc::new(Console::default()))
        .clone()
}

impl Default for Console {
    fn default() -> Self {
        Self {
            verbosity: VerbosityLevel::Normal,
        }
    }
}
