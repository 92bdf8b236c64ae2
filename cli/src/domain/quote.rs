//! Re-quoting of already-split arguments for the remote shell.
//!
//! The local shell has split the argv before we see it, so a value like
//! `key="value with spaces"` arrives as one argument. Sending it verbatim
//! would let the remote shell split it again.

/// Wraps `arg` in single quotes, closing and reopening the quote around every
/// embedded single quote.
#[must_use]
pub fn quote_arg(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r#"'"'"'"#))
}

/// Joins `command` and the individually quoted `args` into one command line.
#[must_use]
pub fn command_line(command: &str, args: &[String]) -> String {
    let mut line = command.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&quote_arg(arg));
    }
    line.trim().to_string()
}
