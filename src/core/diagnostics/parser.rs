//! Turns human-readable compiler output into [`Diagnostic`] records.
//!
//! The parser is a line-oriented state machine. A header line
//! (`error[E0425]: message`) opens a record, `-->` and indented `help:` lines
//! decorate it, gutter lines (`10 |`, `  |`, `= note:`) are collected into its
//! snippet, and the record is emitted when the next header, a blank line or
//! the end of input is reached.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::domain::{Diagnostic, Severity, SourceLocation};

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(error|warning|note|help)(?:\[([A-Za-z0-9]+)\])?: (.*)$")
        .expect("header pattern is valid")
});

static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*--> (.+):(\d+):(\d+)\s*$").expect("location pattern is valid")
});

static SUGGESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(?:= )?help: (.*)$").expect("suggestion pattern is valid")
});

static SNIPPET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d+\s*)?\||^\s*= |^\s*\.\.\.\s*$").expect("snippet pattern is valid")
});

// Cargo roll-up lines that repeat what the individual records already say.
static SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"could not compile|generated \d+ warnings?|aborting due to")
        .expect("summary pattern is valid")
});

enum State {
    Idle,
    Header(Diagnostic),
    Snippet(Diagnostic, Vec<String>),
}

impl State {
    fn flush(self, out: &mut Vec<Diagnostic>) {
        match self {
            State::Idle => {}
            State::Header(diagnostic) => out.push(diagnostic),
            State::Snippet(mut diagnostic, lines) => {
                diagnostic.snippet = Some(lines.join("\n"));
                out.push(diagnostic);
            }
        }
    }

    fn step(self, line: &str, out: &mut Vec<Diagnostic>) -> State {
        if let Some(header) = parse_header(line) {
            self.flush(out);
            return match header {
                Header::Record(diagnostic) => State::Header(diagnostic),
                Header::Summary => State::Idle,
            };
        }

        if line.trim().is_empty() {
            self.flush(out);
            return State::Idle;
        }

        match self {
            State::Idle => State::Idle,
            State::Header(mut diagnostic) => {
                if attach(&mut diagnostic, line) {
                    State::Header(diagnostic)
                } else if SNIPPET.is_match(line) {
                    State::Snippet(diagnostic, vec![line.to_string()])
                } else {
                    State::Header(diagnostic)
                }
            }
            State::Snippet(mut diagnostic, mut lines) => {
                if !attach(&mut diagnostic, line) && SNIPPET.is_match(line) {
                    lines.push(line.to_string());
                }
                State::Snippet(diagnostic, lines)
            }
        }
    }
}

enum Header {
    Record(Diagnostic),
    Summary,
}

fn parse_header(line: &str) -> Option<Header> {
    let captures = HEADER.captures(line)?;
    let severity = Severity::parse(&captures[1])?;
    let message = &captures[3];

    if SUMMARY.is_match(message) {
        return Some(Header::Summary);
    }

    let mut diagnostic = Diagnostic::new(severity, message);
    diagnostic.code = captures.get(2).map(|code| code.as_str().to_string());
    Some(Header::Record(diagnostic))
}

/// Attaches a location or suggestion line. Returns false if the line is neither.
fn attach(diagnostic: &mut Diagnostic, line: &str) -> bool {
    if let Some(captures) = LOCATION.captures(line) {
        if diagnostic.location.is_none() {
            // Compiler positions are one-based; a zero is not a location.
            if let (Ok(line @ 1..), Ok(column @ 1..)) =
                (captures[2].parse::<u32>(), captures[3].parse::<u32>())
            {
                diagnostic.location = Some(SourceLocation {
                    file: captures[1].to_string(),
                    line,
                    column,
                });
            }
        }
        return true;
    }

    if let Some(captures) = SUGGESTION.captures(line) {
        let text = &captures[1];
        diagnostic.suggestion = Some(match diagnostic.suggestion.take() {
            Some(previous) => format!("{}\n{}", previous, text),
            None => text.to_string(),
        });
        return true;
    }

    false
}

/// Gutter, note and elision lines that quote source rather than report.
pub(crate) fn is_snippet_line(line: &str) -> bool {
    SNIPPET.is_match(line)
}

pub fn parse_diagnostics(output: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut state = State::Idle;

    for line in output.lines() {
        state = state.step(line, &mut diagnostics);
    }
    state.flush(&mut diagnostics);

    diagnostics
}

/// Renders records in the compiler's own layout, so the result parses back
/// into the same severities and messages.
pub fn format_for_display(diagnostics: &[Diagnostic]) -> String {
    let mut rendered = String::new();

    for diagnostic in diagnostics {
        rendered.push_str(diagnostic.severity.as_str());
        if let Some(code) = &diagnostic.code {
            rendered.push_str(&format!("[{}]", code));
        }
        rendered.push_str(&format!(": {}\n", diagnostic.message));

        if let Some(location) = &diagnostic.location {
            rendered.push_str(&format!(
                "  --> {}:{}:{}\n",
                location.file, location.line, location.column
            ));
        }
        if let Some(snippet) = &diagnostic.snippet {
            for line in snippet.lines() {
                rendered.push_str(line);
                rendered.push('\n');
            }
        }
        if let Some(suggestion) = &diagnostic.suggestion {
            for line in suggestion.lines() {
                rendered.push_str(&format!("   = help: {}\n", line));
            }
        }
        rendered.push('\n');
    }

    rendered
}
