//! Terminal output helpers.
//!
//! Colored status lines, elapsed-time formatting, and JSON output for
//! machine consumers.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
}

/// Lines of captured compiler output shown when a build fails.
pub const EXCERPT_LINES: usize = 20;

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    format!("{}m {}s", secs / 60, secs % 60)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

/// Last `max` lines of `text`, preceded by a count of what was cut.
pub fn tail(text: &str, max: usize) -> Vec<String> {
  let lines: Vec<&str> = text.trim_end().lines().collect();
  let skipped = lines.len().saturating_sub(max);
  let mut out = Vec::with_capacity(max + 1);
  if skipped > 0 {
    out.push(format!("... ({} earlier lines)", skipped));
  }
  out.extend(lines[skipped..].iter().map(|l| l.to_string()));
  out
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// Dimmed, indented excerpt of captured tool output on stderr.
pub fn print_excerpt(text: &str) {
  for line in tail(text, EXCERPT_LINES) {
    eprintln!("    {}", line.if_supports_color(Stream::Stderr, |s| s.dimmed()));
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
