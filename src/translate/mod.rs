//! Construct translation.
//!
//! `Translator` owns the process-wide fresh-name supply and drives the
//! recursive descent that lowers a brace-balanced scope into its flat,
//! cooperative form: tokenise, slice at every `sleep`, group each
//! micro-scope's routineable runs into do-once latches, and recurse into
//! any nested `if`/`while`/`for`/`else` block.
//!
//! Submodules hold the construct-specific halves of the recursion:
//! [`if_else`] for `if`/`else`, [`while_loop`] for `while`, [`for_loop`]
//! for `for`. This file holds everything shared by all of them: the
//! sleep-slicer, the routine grouper, and the dispatcher that reads a
//! `parent` token's leading keyword and calls the right one.

mod for_loop;
mod if_else;
mod while_loop;

use crate::declaration::ParsedDeclaration;
use crate::error::{Result, TranslateError};
use crate::ids::{IdGen, MAIN_TIMER};
use crate::scope::ScopeData;
use crate::token::{self, LangToken, TokenKind};

pub struct Translator {
    pub ids: IdGen,
    /// Project-specific type words recognised in addition to the
    /// built-in set, from [`crate::config::TranslateConfig`].
    pub extra_types: Vec<String>,
}

impl Translator {
    pub fn new() -> Self {
        Translator { ids: IdGen::new(), extra_types: Vec::new() }
    }

    pub fn with_extra_types(ids: IdGen, extra_types: Vec<String>) -> Self {
        Translator { ids, extra_types }
    }

    /// The recursive workhorse: translate one brace-balanced scope,
    /// returning the auxiliary declarations it introduced and its
    /// rewritten text.
    pub fn rec_translate(
        &mut self,
        scope: &str,
        sd: &mut ScopeData,
        user_vars: &mut ParsedDeclaration,
    ) -> Result<(String, String)> {
        let tokens = token::tokenise(scope, sd, user_vars, &self.extra_types)?;

        if tokens.iter().any(|t| matches!(t.kind, TokenKind::Parent | TokenKind::Sleep)) {
            let micro_scopes = slice_at_sleeps(tokens);
            return self.translate_microscopes(&micro_scopes, scope, sd, user_vars);
        }

        if let Some(blob) = tokens.iter().find(|t| t.kind == TokenKind::Blob) {
            // A lone break/continue placeholder is not routineable and
            // carries its own rendering already.
            return Ok((String::new(), blob.text(scope).to_string()));
        }

        if tokens.iter().all(|t| t.kind == TokenKind::Child) && !tokens.is_empty() {
            let routine_var = self.ids.next_routine();
            sd.add_ref(routine_var, routine_var.reset_expr());
            let declare = declare_aux(routine_var, routine_var.kind().declared_type());
            let body: String = tokens.iter().map(|t| t.text(scope)).collect();
            let text = format!("if ({routine_var} == 0) {{ {body} {routine_var} = 1; }}");
            return Ok((declare, text));
        }

        // Empty scope (e.g. an `else {}` with nothing inside).
        Ok((String::new(), scope.to_string()))
    }

    /// Translate a sequence of micro-scopes, each the output of the
    /// sleep-slicer, concatenating their rendered text side by side
    /// (not recursively — micro-scopes are siblings in source order).
    fn translate_microscopes(
        &mut self,
        micro_scopes: &[Vec<LangToken>],
        parent_str: &str,
        sd: &mut ScopeData,
        user_vars: &mut ParsedDeclaration,
    ) -> Result<(String, String)> {
        let mut declaration = String::new();
        let mut result = String::new();

        for micro in micro_scopes {
            let mut micro_result = String::new();
            let mut sleep_token: Option<&LangToken> = None;

            for group in group_into_routines(micro) {
                match group {
                    Grouped::Single(tok) => match tok.kind {
                        TokenKind::Parent => {
                            let (dec, text) =
                                self.translate_reserved(tok.text(parent_str), sd, user_vars)?;
                            declaration.push_str(&dec);
                            micro_result.push_str(&text);
                        }
                        TokenKind::Sleep => sleep_token = Some(tok),
                        TokenKind::Child | TokenKind::Blob => {
                            micro_result.push_str(tok.text(parent_str));
                        }
                    },
                    Grouped::Routine(run) => {
                        let routine_var = self.ids.next_routine();
                        sd.add_ref(routine_var, routine_var.reset_expr());
                        declaration
                            .push_str(&declare_aux(routine_var, routine_var.kind().declared_type()));
                        let body: String = run.iter().map(|t| t.text(parent_str)).collect();
                        micro_result.push_str(&format!(
                            "if ({routine_var} == 0) {{ {body} {routine_var} = 1; }}"
                        ));
                    }
                }
            }

            if let Some(sleep_tok) = sleep_token {
                let (dec, wrapped) = self.translate_sleep(sleep_tok, &micro_result, parent_str, sd)?;
                declaration.push_str(&dec);
                micro_result = wrapped;
            }

            result.push_str(&micro_result);
        }

        Ok((declaration, result))
    }

    fn translate_sleep(
        &mut self,
        sleep_tok: &LangToken,
        content: &str,
        parent_str: &str,
        sd: &mut ScopeData,
    ) -> Result<(String, String)> {
        let target = token::sleep_target(sleep_tok.text(parent_str)).ok_or_else(|| {
            TranslateError::MalformedInput(format!(
                "could not parse sleep target from {:?}",
                sleep_tok.text(parent_str)
            ))
        })?;

        let (timer, timer_latch) = self.ids.next_timer_pair();
        sd.add_ref(timer, timer.reset_expr());
        sd.add_ref(timer_latch, timer_latch.reset_expr());

        let declaration = format!(
            "{}{}",
            declare_aux(timer, timer.kind().declared_type()),
            declare_aux(timer_latch, timer_latch.kind().declared_type()),
        );
        let text = format!(
            "if ({timer_latch} == 0) {{ {timer} = {MAIN_TIMER}; {timer_latch} = 1; }} \
             if ({MAIN_TIMER} - {timer} >= {target}) {{ {content} }} else {{ return; }} "
        );

        Ok((declaration, text))
    }

    /// Dispatch a `parent` token's text to the translator for its
    /// leading keyword.
    fn translate_reserved(
        &mut self,
        txt: &str,
        sd: &mut ScopeData,
        user_vars: &mut ParsedDeclaration,
    ) -> Result<(String, String)> {
        let construct = parse_construct(txt)?;
        match construct.keyword {
            "if" => self.translate_if(&construct, sd, user_vars),
            "else" => self.translate_else(&construct, sd, user_vars),
            "while" => self.translate_while(&construct, sd, user_vars),
            "for" => self.translate_for(&construct, sd, user_vars),
            "switch" => Err(TranslateError::UnsupportedConstruct(
                "switch is tokenised but has no translator; behaviour is undefined".to_string(),
            )),
            other => Err(TranslateError::UnsupportedConstruct(format!(
                "unrecognised reserved construct {:?}",
                other
            ))),
        }
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

/// A `parent` token's text broken into its keyword, condition (absent
/// for `else`/`thread`), and inner scope text (braces stripped).
pub struct Construct<'a> {
    pub keyword: &'static str,
    pub condition: Option<String>,
    pub inner_scope: &'a str,
}

const RESERVED_KEYWORDS: &[&str] = &["if", "for", "while", "switch", "else", "thread"];

pub fn parse_construct(txt: &str) -> Result<Construct<'_>> {
    let trimmed = txt.trim_start();
    let keyword = RESERVED_KEYWORDS
        .iter()
        .find(|k| {
            trimmed.starts_with(*k)
                && trimmed[k.len()..]
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_whitespace() || c == '(' || c == '{')
        })
        .copied()
        .ok_or_else(|| TranslateError::UnsupportedConstruct(format!("unrecognised construct: {:?}", txt)))?;

    let (open_b, close_b) = token::first_top_level_braces(txt)
        .ok_or_else(|| TranslateError::MalformedInput(format!("missing braces in {:?}", txt)))?;
    let inner_scope = txt[open_b + 1..close_b - 1].trim();

    let condition = if keyword == "else" || keyword == "thread" {
        None
    } else {
        let head = &txt[..open_b];
        let (po, pc) = token::first_top_level_parens(head).ok_or_else(|| {
            TranslateError::MalformedInput(format!("missing condition in {:?}", txt))
        })?;
        Some(head[po + 1..pc - 1].trim().to_string())
    };

    Ok(Construct { keyword, condition, inner_scope })
}

/// The sleep-slicer: partition a flat token list into micro-scopes, each
/// ending with at most one `sleep`, preserving source order. If there's
/// any tail after the last `sleep`, it becomes one final micro-scope
/// that runs unconditionally on the tick that releases the last gate.
pub fn slice_at_sleeps(tokens: Vec<LangToken>) -> Vec<Vec<LangToken>> {
    let sleep_positions: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.kind == TokenKind::Sleep)
        .map(|(i, _)| i)
        .collect();

    if sleep_positions.is_empty() {
        return vec![tokens];
    }

    let mut scopes = Vec::new();
    let mut prev_end = 0usize;
    for &pos in &sleep_positions {
        let end = pos + 1;
        scopes.push(tokens[prev_end..end].to_vec());
        prev_end = end;
    }
    if prev_end < tokens.len() {
        scopes.push(tokens[prev_end..].to_vec());
    }
    scopes
}

enum Grouped<'a> {
    Routine(Vec<&'a LangToken>),
    Single(&'a LangToken),
}

/// The routine grouper: within one micro-scope, maximal contiguous runs
/// of routineable tokens become one group; everything else passes
/// through as a single-item group.
fn group_into_routines(tokens: &[LangToken]) -> Vec<Grouped<'_>> {
    let mut out = Vec::new();
    let mut current: Vec<&LangToken> = Vec::new();
    for t in tokens {
        if t.routineable {
            current.push(t);
        } else {
            if !current.is_empty() {
                out.push(Grouped::Routine(std::mem::take(&mut current)));
            }
            out.push(Grouped::Single(t));
        }
    }
    if !current.is_empty() {
        out.push(Grouped::Routine(current));
    }
    out
}

/// Render `type name = 0;`, the form every auxiliary declaration takes
/// except a sleep-bearing `for`'s hoisted iterator (which keeps the
/// user's own initial value).
pub fn declare_aux(var: impl std::fmt::Display, vartype: &str) -> String {
    format!("{} {} = 0;", vartype, var)
}

pub fn declare_aux_with_value(var: impl std::fmt::Display, vartype: &str, val: &str) -> String {
    format!("{} {} = {};", vartype, var, val)
}

/// Render a reset block `id1 = expr1; id2 = expr2; ...`, sorted by the
/// identifier's own string form — the source sorted by a 7-character
/// prefix of the rendered assignment as a proxy for "sort by
/// identifier"; sorting directly on the identifier is the same outcome
/// without the magic constant.
pub fn render_reset_block(refs: &[(crate::ids::Ident, String)]) -> String {
    let mut owned: Vec<(String, String)> =
        refs.iter().map(|(id, expr)| (id.to_string(), expr.clone())).collect();
    owned.sort_by(|a, b| a.0.cmp(&b.0));
    owned.iter().map(|(id, expr)| format!("{} = {}; ", id, expr)).collect()
}

/// Word-boundary substitution of `old` with `new` in `text`, used to
/// rename a `for` loop's declared iterator name to its hoisted global.
/// Equivalent to a `(?<![\w])old(?![\w])` regex, spelled out by hand
/// since the `regex` crate doesn't support lookaround.
pub fn sub_var(text: &str, old: &str, new: &str) -> String {
    let bytes = text.as_bytes();
    let old_bytes = old.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(old_bytes) {
            let before_ok = i == 0 || !is_ident_byte(bytes[i - 1]);
            let after = i + old_bytes.len();
            let after_ok = after >= bytes.len() || !is_ident_byte(bytes[after]);
            if before_ok && after_ok {
                out.push_str(new);
                i = after;
                continue;
            }
        }
        let ch = text[i..].chars().next().expect("valid utf8 boundary");
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_var_respects_word_boundaries() {
        assert_eq!(sub_var("i = i + 1; ix = 2;", "i", "_i0"), "_i0 = _i0 + 1; ix = 2;");
    }

    #[test]
    fn slice_at_sleeps_no_sleep_single_scope() {
        let sd = ScopeData::new();
        let mut uv = ParsedDeclaration::new();
        let toks = token::tokenise("a(); b();", &sd, &mut uv, &[]).unwrap();
        let sliced = slice_at_sleeps(toks);
        assert_eq!(sliced.len(), 1);
        assert_eq!(sliced[0].len(), 2);
    }

    #[test]
    fn slice_at_sleeps_splits_on_each_sleep() {
        let sd = ScopeData::new();
        let mut uv = ParsedDeclaration::new();
        let toks = token::tokenise("sleep(i); a(); sleep(i); b();", &sd, &mut uv, &[]).unwrap();
        let sliced = slice_at_sleeps(toks);
        assert_eq!(sliced.len(), 2);
        assert_eq!(sliced[0].last().unwrap().kind, TokenKind::Sleep);
        assert_eq!(sliced[1].last().unwrap().kind, TokenKind::Sleep);
    }

    #[test]
    fn slice_at_sleeps_keeps_trailing_tail() {
        let sd = ScopeData::new();
        let mut uv = ParsedDeclaration::new();
        let toks = token::tokenise("sleep(i); a(); b();", &sd, &mut uv, &[]).unwrap();
        let sliced = slice_at_sleeps(toks);
        assert_eq!(sliced.len(), 2);
        assert_eq!(sliced[1].len(), 2);
        assert!(sliced[1].iter().all(|t| t.kind != TokenKind::Sleep));
    }
}
