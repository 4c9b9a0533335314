//! Thread dispatcher and finaliser.
//!
//! `loop()`'s immediate `thread { ... }` children are each translated
//! independently with a fresh [`ScopeData`], wrapped into their own
//! generated function with a master reset appended, and their
//! user-declared variables are hoisted to file scope under fresh `_v`
//! names. The finaliser then assembles the whole output program.

use std::fmt::Write as _;

use tracing::debug;

use crate::declaration::ParsedDeclaration;
use crate::error::{Result, TranslateError};
use crate::ids::{IdGen, MAIN_TIMER};
use crate::scope::ScopeData;
use crate::token;
use crate::translate::{render_reset_block, sub_var, Translator};

/// One `thread { ... }` lowered to a generated function plus whatever
/// declarations (auxiliary and hoisted user variables) it introduced.
struct CompiledThread {
    declarations: String,
    function: String,
    call: String,
}

fn compile_thread(body: &str, ids: &mut IdGen, extra_types: &[String]) -> Result<CompiledThread> {
    let mut translator = Translator::with_extra_types(std::mem::take(ids), extra_types.to_vec());
    let mut sd = ScopeData::new();
    let mut user_vars = ParsedDeclaration::new();

    let (mut declaration, mut text) = translator.rec_translate(body, &mut sd, &mut user_vars)?;

    let reset_block = render_reset_block(sd.all_refs());
    text.push_str(&reset_block);

    let func_name = translator.ids.next_func_name();
    debug!(thread = %func_name, idents = sd.all_refs().len(), "compiled thread body");

    for decl in &user_vars.decls {
        let hoisted = translator.ids.next_var_name();
        let rendered = match &decl.var_value {
            Some(v) => format!("{} {} = {};", decl.var_type, hoisted, v),
            None => format!("{} {};", decl.var_type, hoisted),
        };
        declaration = sub_var(&declaration, &decl.var_name, &hoisted);
        text = sub_var(&text, &decl.var_name, &hoisted);
        declaration.push_str(&rendered);
    }

    let function = format!("void {func_name}() {{ {text} }}");
    *ids = translator.ids;

    Ok(CompiledThread { declarations: declaration, function, call: format!("{func_name}();") })
}

/// Strip the `thread {` prefix and trailing `}` from a `parent` token's
/// raw text, returning its inner body.
fn thread_body(raw_thread_token: &str) -> Result<&str> {
    let (open, close) = token::first_top_level_braces(raw_thread_token).ok_or_else(|| {
        TranslateError::MalformedInput(format!("thread block missing braces: {:?}", raw_thread_token))
    })?;
    Ok(raw_thread_token[open + 1..close - 1].trim())
}

/// Translate every `thread { ... }` child of `loop_body` (in source
/// order), returning the sorted auxiliary/hoisted declaration block,
/// every generated function, and the dispatch calls for the new
/// `loop()` body, in that order.
pub fn translate_threads(
    loop_body: &str,
    ids: &mut IdGen,
    extra_types: &[String],
) -> Result<(String, String, String)> {
    let pairs = token::match_top_level_braces(loop_body);
    let mut all_declarations = String::new();
    let mut all_functions = String::new();
    let mut all_calls = String::new();

    for (open, close) in pairs {
        let head_len = loop_body[..open].trim_end().len();
        if !loop_body[..head_len].ends_with("thread") {
            return Err(TranslateError::UnsupportedConstruct(format!(
                "loop() may only directly contain thread {{ ... }} blocks, found: {:?}",
                &loop_body[..close]
            )));
        }
        let thread_start = head_len - "thread".len();
        let raw = &loop_body[thread_start..close];
        let body = thread_body(raw)?;
        let compiled = compile_thread(body, ids, extra_types)?;

        all_declarations.push_str(&compiled.declarations);
        all_functions.push_str(&compiled.function);
        all_functions.push('\n');
        let _ = write!(all_calls, "{} ", compiled.call);
    }

    Ok((all_declarations, all_functions, all_calls.trim_end().to_string()))
}

/// Render the sorted auxiliary-declaration block as individual
/// statements, one per line, for diffability.
pub fn sort_declarations(raw: &str) -> String {
    let mut stmts: Vec<&str> = raw
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    stmts.sort_unstable();
    stmts.iter().map(|s| format!("{};\n", s)).collect()
}

/// Assemble the final output program per the finaliser layout: ambient
/// code, the main timer, declarations (already rendered by the caller,
/// sorted or not per [`crate::config::TranslateConfig`]), generated
/// functions, `setup()`, then `loop()`.
pub fn assemble(
    other_code: &str,
    rendered_declarations: &str,
    functions: &str,
    setup_body: &str,
    thread_calls: &str,
) -> String {
    format!(
        "{other}unsigned long {timer} = 0;\n{decls}\n{funcs}\nvoid setup() {{ {setup} }}\n\nvoid loop() {{ {timer} = millis(); {calls} }}\n",
        other = other_code,
        timer = MAIN_TIMER,
        decls = rendered_declarations,
        funcs = functions,
        setup = setup_body,
        calls = thread_calls,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_body_strips_wrapper() {
        assert_eq!(thread_body("thread { a(); b(); }").unwrap(), "a(); b();");
    }

    #[test]
    fn sort_declarations_is_stable_and_alphabetical() {
        let out = sort_declarations("unsigned char _r1 = 0;unsigned char _r0 = 0;");
        assert_eq!(out, "unsigned char _r0 = 0;\nunsigned char _r1 = 0;\n");
    }

    #[test]
    fn translate_threads_rejects_non_thread_children() {
        let mut ids = IdGen::new();
        let err = translate_threads("if (x) { y(); }", &mut ids, &[]).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedConstruct(_)));
    }

    #[test]
    fn translate_threads_compiles_two_sibling_threads() {
        let mut ids = IdGen::new();
        let (decls, funcs, calls) = translate_threads(
            "thread { digitalWrite(7, HIGH); } thread { digitalWrite(8, HIGH); }",
            &mut ids,
            &[],
        )
        .unwrap();
        assert!(funcs.contains("void _f0()"));
        assert!(funcs.contains("void _f1()"));
        assert!(calls.contains("_f0();"));
        assert!(calls.contains("_f1();"));
        assert!(decls.contains("_r0"));
    }
}
