// ABOUTME: Version info and REPL welcome/help text constants

pub const VERSION: &str = "0.1.0";
pub const WELCOME_MESSAGE: &str = "SimpleScript REPL v0.1.0";
pub const WELCOME_SUBTITLE: &str = "A small dynamically-typed scripting language";
pub const WELCOME_FOOTER: &str = "Type an expression to evaluate it. Ctrl-D to exit.";

pub const HELP_TEXT: &str = r#"
Available commands:
  Ctrl-D               - Exit the REPL
  Ctrl-C                - Cancel the current line

Type any SimpleScript expression to evaluate it.
"#;
