//! The continuation-encoding translator.
//!
//! Rewrites a small imperative language extended with blocking
//! `sleep(ms)` and `thread { ... }` blocks into flat, non-blocking
//! code for a cooperative single-threaded runtime with no OS
//! scheduler: a `setup()`/`loop()` shape with a free-running
//! millisecond clock, the canonical target being embedded firmware.
//!
//! [`interpret`] is the public entry point. It expects exactly one
//! `void setup() { ... }` and one `void loop() { ... }` at top level;
//! everything else in the input is ambient code passed through
//! verbatim. Inside `loop()`, every direct child must be a
//! `thread { ... }` block — each is translated independently and
//! dispatched from the rebuilt `loop()` body.

pub mod config;
mod declaration;
mod error;
mod ids;
mod scope;
mod thread;
mod token;
mod translate;

use std::sync::OnceLock;

use regex::Regex;
use tracing::info;

pub use config::TranslateConfig;
pub use error::{Result, TranslateError};

use ids::IdGen;

fn setup_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"void\s+setup\s*\(\s*\)\s*\{").unwrap())
}

fn loop_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"void\s+loop\s*\(\s*\)\s*\{").unwrap())
}

struct EntryPoint {
    header_start: usize,
    open: usize,
    close: usize,
}

fn find_entry_point(source: &str, re: &Regex, name: &str) -> Result<EntryPoint> {
    let m = re
        .find(source)
        .ok_or_else(|| TranslateError::MalformedInput(format!("missing void {}() {{ ... }}", name)))?;
    let open = m.end() - 1;
    let (_, close) = token::first_top_level_braces(&source[open..])
        .map(|(o, c)| (o + open, c + open))
        .ok_or_else(|| TranslateError::MalformedInput(format!("unbalanced braces in {}()", name)))?;
    Ok(EntryPoint { header_start: m.start(), open, close })
}

/// Translate one complete program, using the default configuration.
pub fn interpret(source: &str) -> Result<String> {
    interpret_with_config(source, &TranslateConfig::default())
}

/// Translate one complete program with an explicit [`TranslateConfig`].
pub fn interpret_with_config(source: &str, config: &TranslateConfig) -> Result<String> {
    let setup_ep = find_entry_point(source, setup_re(), "setup")?;
    let loop_ep = find_entry_point(source, loop_re(), "loop")?;

    let setup_body = source[setup_ep.open + 1..setup_ep.close - 1].trim();
    let loop_body = source[loop_ep.open + 1..loop_ep.close - 1].trim();

    let mut spans = [
        (setup_ep.header_start, setup_ep.close),
        (loop_ep.header_start, loop_ep.close),
    ];
    spans.sort_unstable_by_key(|s| s.0);

    let mut other_code = String::new();
    let mut cursor = 0;
    for (start, end) in spans {
        other_code.push_str(&source[cursor..start]);
        cursor = end;
    }
    other_code.push_str(&source[cursor..]);

    let mut ids = IdGen::new();
    let (declarations, functions, calls) =
        thread::translate_threads(loop_body, &mut ids, &config.extra_type_words)?;

    let rendered_declarations = if config.sort_declarations {
        thread::sort_declarations(&declarations)
    } else {
        declarations
    };

    let output = thread::assemble(&other_code, &rendered_declarations, &functions, setup_body, &calls);
    info!(threads = calls.split(';').filter(|s| !s.trim().is_empty()).count(), "translation complete");
    Ok(output)
}

/// Translate one complete program, flattening any failure to a
/// `String` for callers that only want a message, not a typed error.
pub fn interpret_to_string(source: &str) -> std::result::Result<String, String> {
    interpret(source).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_setup() {
        let err = interpret("void loop() { thread { a(); } }").unwrap_err();
        assert!(matches!(err, TranslateError::MalformedInput(_)));
    }

    #[test]
    fn rejects_missing_loop() {
        let err = interpret("void setup() { }").unwrap_err();
        assert!(matches!(err, TranslateError::MalformedInput(_)));
    }

    #[test]
    fn translates_a_minimal_program() {
        let source = "void setup() { pinMode(7, OUTPUT); } void loop() { thread { digitalWrite(7, HIGH); } }";
        let output = interpret(source).unwrap();
        assert!(output.contains("unsigned long _mt0 = 0;"));
        assert!(output.contains("void _f0()"));
        assert!(output.contains("void setup() { pinMode(7, OUTPUT); }"));
        assert!(output.contains("void loop() { _mt0 = millis(); _f0(); }"));
    }

    #[test]
    fn preserves_ambient_code_around_entry_points() {
        let source = "int led = 7;\nvoid setup() { pinMode(led, OUTPUT); } void loop() { thread { } }\nvoid helper() { }";
        let output = interpret(source).unwrap();
        assert!(output.starts_with("int led = 7;\n"));
        assert!(output.contains("void helper() { }"));
    }
}
