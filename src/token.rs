//! The scope tokeniser.
//!
//! Given a brace-balanced region, classifies every statement inside it
//! into a [`LangToken`] of kind `parent` (a nested reserved-keyword
//! block), `sleep`, `child` (an ordinary terminated statement), or
//! `blob` (an already-rewritten literal, used for `break`/`continue`
//! placeholders).

use std::sync::OnceLock;

use regex::Regex;

use crate::declaration::{looks_like_declaration, parse_declaration};
use crate::declaration::ParsedDeclaration;
use crate::error::Result;
use crate::scope::ScopeData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Parent,
    Sleep,
    Child,
    Blob,
}

/// A classified slice of a scope string. `overridden_text`, when
/// present, replaces the default "slice from parent string" rendering —
/// this is how an initialised declaration becomes a reassignment in
/// place, how an uninitialised one becomes whitespace (the declaration
/// itself is hoisted), and how `break`/`continue` become placeholder
/// markers.
#[derive(Debug, Clone)]
pub struct LangToken {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub routineable: bool,
    pub overridden_text: Option<String>,
}

impl LangToken {
    /// The text this token contributes to the enclosing scope's
    /// rendering: the overridden text if present, else the original
    /// slice of `parent`.
    pub fn text<'a>(&'a self, parent: &'a str) -> &'a str {
        match &self.overridden_text {
            Some(t) => t.as_str(),
            None => &parent[self.start..self.end],
        }
    }
}

fn reserved_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:(?:if|for|while|switch)\s*\(.*?\)\s*\{)|(?:(?:else|thread)\s*\{)").unwrap()
    })
}

fn sleep_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^sleep\s*\(.+\)$").unwrap())
}

fn sleep_capture_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^sleep\s*\((.*)\)$").unwrap())
}

/// Extract the millisecond-count expression from a `sleep(EXPR);`
/// statement's text (with or without the trailing `;`).
pub fn sleep_target(raw: &str) -> Option<String> {
    let body = raw.trim().trim_end_matches(';').trim();
    sleep_capture_re()
        .captures(body)
        .map(|c| c[1].trim().to_string())
}

fn sleep_anywhere_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"sleep\s*\(").unwrap())
}

/// Whether `text` transitively contains a `sleep(...)` call anywhere,
/// at any nesting depth — the test that decides whether a loop needs
/// the cooperative (sleep-bearing) rewrite or can stay blocking.
pub fn contains_sleep(text: &str) -> bool {
    sleep_anywhere_re().is_match(text)
}

fn line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^}]+?;").unwrap())
}

/// Find every top-level (i.e. not nested inside another pair found this
/// way) `open ... close` pair in `s`, returning `(open_index,
/// end_index)` where `end_index` is one past the matching close byte.
pub fn match_top_level(s: &str, open: u8, close: u8) -> Vec<(usize, usize)> {
    let bytes = s.as_bytes();
    let mut pairs = Vec::new();
    let mut depth = 0usize;
    let mut open_at = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        if b == open {
            if depth == 0 {
                open_at = i;
            }
            depth += 1;
        } else if b == close {
            if depth == 1 {
                pairs.push((open_at, i + 1));
                depth = 0;
            } else if depth > 1 {
                depth -= 1;
            }
        }
    }
    pairs
}

/// Find every top-level `{ ... }` pair in `s`.
pub fn match_top_level_braces(s: &str) -> Vec<(usize, usize)> {
    match_top_level(s, b'{', b'}')
}

/// First top-level brace pair in `s`, if any.
pub fn first_top_level_braces(s: &str) -> Option<(usize, usize)> {
    match_top_level_braces(s).into_iter().next()
}

/// First top-level parenthesis pair in `s`, if any.
pub fn first_top_level_parens(s: &str) -> Option<(usize, usize)> {
    match_top_level(s, b'(', b')').into_iter().next()
}

/// Tokenise a brace-balanced region, registering any user variable
/// declarations found into `user_vars` and consulting `sd` for the
/// current `break`/`continue` substitution text. `extra_types` is
/// [`crate::config::TranslateConfig::extra_type_words`].
pub fn tokenise(
    scope: &str,
    sd: &ScopeData,
    user_vars: &mut ParsedDeclaration,
    extra_types: &[String],
) -> Result<Vec<LangToken>> {
    let mut tokens: Vec<LangToken> = Vec::new();

    let reserved_matches: Vec<_> = reserved_start_re().find_iter(scope).collect();
    let brace_pairs = match_top_level_braces(scope);

    for m in &reserved_matches {
        if let Some(&(open, close_end)) = brace_pairs
            .iter()
            .find(|&&(open, _)| (m.end() as isize - open as isize).unsigned_abs() <= 1)
        {
            tokens.push(LangToken {
                kind: TokenKind::Parent,
                start: m.start(),
                end: close_end,
                routineable: false,
                overridden_text: None,
            });
            let _ = open;
        }
    }

    for m in line_re().find_iter(scope) {
        let end = m.end();
        if tokens
            .iter()
            .any(|t| t.kind == TokenKind::Parent && t.start < end && end < t.end)
        {
            continue;
        }
        let raw = &scope[m.start()..m.end()];
        let body = raw.trim();
        let body = body.strip_suffix(';').unwrap_or(body).trim();

        if sleep_re().is_match(body) {
            tokens.push(LangToken {
                kind: TokenKind::Sleep,
                start: m.start(),
                end: m.end(),
                routineable: false,
                overridden_text: None,
            });
        } else if looks_like_declaration(body, extra_types) {
            let parsed = parse_declaration(body, extra_types)?;
            let reassigns: String = parsed
                .iter()
                .filter_map(|d| d.render_reassign())
                .map(|s| format!("{} ", s))
                .collect();
            let overridden = if reassigns.is_empty() {
                " ".to_string()
            } else {
                reassigns
            };
            user_vars.extend(parsed);
            tokens.push(LangToken {
                kind: TokenKind::Child,
                start: m.start(),
                end: m.end(),
                routineable: true,
                overridden_text: Some(overridden),
            });
        } else if body == "continue" {
            tokens.push(LangToken {
                kind: TokenKind::Blob,
                start: m.start(),
                end: m.end(),
                routineable: false,
                overridden_text: Some(sd.continue_text().to_string()),
            });
        } else if body == "break" {
            tokens.push(LangToken {
                kind: TokenKind::Blob,
                start: m.start(),
                end: m.end(),
                routineable: false,
                overridden_text: Some(sd.break_text().to_string()),
            });
        } else {
            tokens.push(LangToken {
                kind: TokenKind::Child,
                start: m.start(),
                end: m.end(),
                routineable: true,
                overridden_text: None,
            });
        }
    }

    tokens.sort_by_key(|t| t.start);
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn braces_top_level_only() {
        let s = "{ a { b } c }";
        let pairs = match_top_level_braces(s);
        assert_eq!(pairs, vec![(0, s.len())]);
    }

    #[test]
    fn tokenise_plain_statements() {
        let sd = ScopeData::new();
        let mut uv = ParsedDeclaration::new();
        let toks = tokenise("digitalWrite(7, HIGH); digitalWrite(7, LOW);", &sd, &mut uv, &[]).unwrap();
        assert_eq!(toks.len(), 2);
        assert!(toks.iter().all(|t| t.kind == TokenKind::Child));
    }

    #[test]
    fn tokenise_sleep() {
        let sd = ScopeData::new();
        let mut uv = ParsedDeclaration::new();
        let toks = tokenise("sleep(100);", &sd, &mut uv, &[]).unwrap();
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::Sleep);
        assert!(!toks[0].routineable);
    }

    #[test]
    fn tokenise_declaration_with_value_becomes_reassign() {
        let sd = ScopeData::new();
        let mut uv = ParsedDeclaration::new();
        let toks = tokenise("int i = 50;", &sd, &mut uv, &[]).unwrap();
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].overridden_text.as_deref(), Some("i = 50; "));
        assert_eq!(uv.decls.len(), 1);
    }

    #[test]
    fn tokenise_parent_block_not_duplicated_as_child() {
        let sd = ScopeData::new();
        let mut uv = ParsedDeclaration::new();
        let toks = tokenise("if (x > 0) { y = 1; }", &sd, &mut uv, &[]).unwrap();
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::Parent);
    }
}
