//! `for` translation: blocking and sleep-bearing variants.
//!
//! Both variants first substitute the user's declared iterator name for
//! a fresh hoisted identifier everywhere it's used (condition, advance,
//! body), matching the `while` family's use of a captured/latched pair
//! for every other loop-carried quantity.

use tracing::debug;

use super::{declare_aux, declare_aux_with_value, render_reset_block, sub_var, Construct, Translator};
use crate::declaration::{parse_declaration, ParsedDeclaration};
use crate::error::{Result, TranslateError};
use crate::scope::ScopeData;
use crate::token::contains_sleep;

const PLACEHOLDER_GUARD: char = '\u{E000}';

fn break_marker(tag: u32) -> String {
    format!("{PLACEHOLDER_GUARD}BRK{tag}{PLACEHOLDER_GUARD}")
}

fn continue_marker(tag: u32) -> String {
    format!("{PLACEHOLDER_GUARD}CNT{tag}{PLACEHOLDER_GUARD}")
}

struct ForHead {
    var_type: String,
    var_name: String,
    v0: String,
    cond: String,
    advance: String,
}

/// Split a `for` head into its three `;`-separated segments and parse
/// the initialiser as a single-declarator declaration with a value.
/// Anything else (wrong segment count, a bare `T n;` with no `= v`) is
/// rejected rather than guessed at.
fn parse_for_head(raw: &str, extra_types: &[String]) -> Result<ForHead> {
    let segments: Vec<&str> = raw.split(';').map(str::trim).collect();
    if segments.len() != 3 {
        return Err(TranslateError::MalformedInput(format!(
            "for header must have exactly three ;-separated segments, got {}: {:?}",
            segments.len(),
            raw
        )));
    }

    let decls = parse_declaration(segments[0], extra_types)?;
    if decls.len() != 1 {
        return Err(TranslateError::UnsupportedConstruct(format!(
            "for initialiser must declare exactly one variable: {:?}",
            segments[0]
        )));
    }
    let decl = decls.into_iter().next().expect("checked len == 1");
    let v0 = decl.var_value.ok_or_else(|| {
        TranslateError::MalformedInput(format!(
            "for initialiser must assign an initial value: {:?}",
            segments[0]
        ))
    })?;

    Ok(ForHead {
        var_type: decl.var_type,
        var_name: decl.var_name,
        v0,
        cond: segments[1].to_string(),
        advance: segments[2].to_string(),
    })
}

impl Translator {
    pub(super) fn translate_for(
        &mut self,
        construct: &Construct<'_>,
        sd: &mut ScopeData,
        user_vars: &mut ParsedDeclaration,
    ) -> Result<(String, String)> {
        let head_raw = construct.condition.as_deref().expect("for always carries its header");

        if contains_sleep(construct.inner_scope) {
            self.translate_sleeping_for(head_raw, construct.inner_scope, sd, user_vars)
        } else {
            self.translate_blocking_for(head_raw, construct.inner_scope, sd)
        }
    }

    fn for_head(&self, head_raw: &str) -> Result<ForHead> {
        parse_for_head(head_raw, &self.extra_types)
    }

    /// The iterator stays a plain stack-local of the emitted `for`
    /// statement — there's nothing cooperative here to persist across
    /// ticks, so it never needs to be hoisted.
    fn translate_blocking_for(
        &mut self,
        head_raw: &str,
        inner_scope: &str,
        sd: &mut ScopeData,
    ) -> Result<(String, String)> {
        let head = self.for_head(head_raw)?;
        let iter = self.ids.next_iter();
        let iter_name = iter.to_string();

        let loop_exit = self.ids.next_loop_exit();
        debug!(construct = "for", variant = "blocking", iter = %iter, exit = %loop_exit, "translating construct");
        sd.add_ref(loop_exit, loop_exit.reset_expr());
        let declare = declare_aux(loop_exit, loop_exit.kind().declared_type());

        let cond = sub_var(&head.cond, &head.var_name, &iter_name);
        let advance = sub_var(&head.advance, &head.var_name, &iter_name);
        let inner = sub_var(inner_scope, &head.var_name, &iter_name);

        let text = format!(
            "if ({loop_exit} == 0) {{ for ({} {iter_name} = {}; {cond}; {advance}) {{ {inner} }} {loop_exit} = 1; }}",
            head.var_type, head.v0
        );

        Ok((declare, text))
    }

    /// The iterator is hoisted to a global re-initialised on every fresh
    /// outer entry to the loop, since the cooperative rewrite spreads
    /// one logical loop across many separate `loop()` calls and a
    /// stack-local wouldn't survive between them. `continue` and
    /// falling off the end of the body both resolve to the same
    /// trailing text: re-arm the per-iteration latches, apply the
    /// advance, and yield.
    fn translate_sleeping_for(
        &mut self,
        head_raw: &str,
        inner_scope: &str,
        sd: &mut ScopeData,
        user_vars: &mut ParsedDeclaration,
    ) -> Result<(String, String)> {
        let head = self.for_head(head_raw)?;
        let iter = self.ids.next_iter();
        let iter_name = iter.to_string();

        let loop_exit = self.ids.next_loop_exit();
        let (break_tag, continue_tag) = self.ids.next_placeholder_pair();
        debug!(
            construct = "for",
            variant = "sleeping",
            iter = %iter,
            exit = %loop_exit,
            break_tag,
            continue_tag,
            "translating construct"
        );
        let break_text = format!("{loop_exit} = 1; return;");

        let cond = sub_var(&head.cond, &head.var_name, &iter_name);
        let advance = sub_var(&head.advance, &head.var_name, &iter_name);
        let inner_scope = sub_var(inner_scope, &head.var_name, &iter_name);

        let prev_subs = sd.push_loop_subs(break_marker(break_tag), continue_marker(continue_tag));
        let mark = sd.mark();
        let (inner_dec, inner_text) = self.rec_translate(&inner_scope, sd, user_vars)?;
        sd.restore_subs(prev_subs);

        let reset_block = render_reset_block(
            &sd.delta_since(mark)
                .iter()
                .filter(|(id, _)| id.kind().resets_every_loop_iteration())
                .cloned()
                .collect::<Vec<_>>(),
        );

        sd.add_ref(iter, head.v0.clone());
        sd.add_ref(loop_exit, loop_exit.reset_expr());

        let continue_text = format!("{reset_block}{advance}; return;");
        let inner_text = inner_text
            .replace(&break_marker(break_tag), &break_text)
            .replace(&continue_marker(continue_tag), &continue_text);

        let declare = format!(
            "{}{}{}",
            declare_aux_with_value(&iter_name, &head.var_type, &head.v0),
            declare_aux(loop_exit, loop_exit.kind().declared_type()),
            inner_dec,
        );
        let text = format!(
            "if ({loop_exit} == 0) {{ if ({cond}) {{ {inner_text} {reset_block}{advance}; return; }} else {{ {loop_exit} = 1; }} }}"
        );

        Ok((declare, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::parse_construct;

    #[test]
    fn blocking_for_hoists_nothing_but_the_exit_latch() {
        let mut tr = Translator::new();
        let mut sd = ScopeData::new();
        let construct = parse_construct("for (int i = 0; i < 5; i = i + 1) { sum = sum + i; }").unwrap();
        let (dec, text) = tr.translate_blocking_for(
            construct.condition.as_deref().unwrap(),
            construct.inner_scope,
            &mut sd,
        ).unwrap();
        assert!(dec.contains("unsigned char _l0 = 0;"));
        assert_eq!(
            text,
            "if (_l0 == 0) { for (int _i0 = 0; _i0 < 5; _i0 = _i0 + 1) { sum = sum + _i0; } _l0 = 1; }"
        );
    }

    #[test]
    fn sleeping_for_hoists_iterator_with_initial_value() {
        let mut tr = Translator::new();
        let mut sd = ScopeData::new();
        let mut uv = ParsedDeclaration::new();
        let construct =
            parse_construct("for (int i = 0; i < 10; i = i + 1) { sleep(50); blink(); }").unwrap();
        let (dec, text) = tr.translate_for(&construct, &mut sd, &mut uv).unwrap();
        assert!(dec.contains("int _i0 = 0;"));
        assert!(text.contains("_i0 < 10"));
        assert!(text.contains("_i0 = _i0 + 1; return;"));
    }

    #[test]
    fn malformed_for_header_is_rejected() {
        let err = parse_for_head("int i = 0, i < 5, i = i + 1", &[]).unwrap_err();
        assert!(matches!(err, TranslateError::MalformedInput(_)));
    }

    #[test]
    fn for_header_without_initial_value_is_rejected() {
        let err = parse_for_head("int i; i < 5; i = i + 1", &[]).unwrap_err();
        assert!(matches!(err, TranslateError::MalformedInput(_)));
    }
}
