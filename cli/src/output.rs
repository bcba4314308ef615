use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

pub fn header(title: &str) {
    println!("{}", title.bold().underline());
}

pub fn field(label: &str, value: &str) {
    println!("  {:<12} {}", format!("{label}:").bold(), value);
}

pub fn hint(msg: &str) {
    eprintln!("{} {}", "hint:".cyan().bold(), msg.dimmed());
}

/// Print a failed command's error. `traceback` adds the cause chain.
pub fn report(err: &anyhow::Error, traceback: bool) {
    if traceback {
        eprintln!("{} {:?}", "error:".red().bold(), err);
    } else {
        eprintln!("{} {}", "error:".red().bold(), err);
        if err.chain().nth(1).is_some() {
            hint("rerun with --traceback for the full error chain");
        }
    }
}

/// Serialize `value` as JSON: compact without `indent`, pretty-printed with
/// that many spaces otherwise.
pub fn render_json<T: Serialize + ?Sized>(value: &T, indent: Option<usize>) -> Result<String> {
    let Some(width) = indent else {
        return Ok(serde_json::to_string(value)?);
    };
    let spaces = " ".repeat(width);
    let mut buffer = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(spaces.as_bytes()));
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buffer)?)
}
