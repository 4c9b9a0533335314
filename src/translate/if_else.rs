//! `if` and `else` translation.
//!
//! `if` is always cooperative: the condition is sampled exactly once
//! per cooperative entry to the construct (captured into `Cv` the first
//! time `Cvc` is unset), so that if the body yields on a `sleep` and the
//! tick re-enters this `if`, the already-decided branch persists instead
//! of re-evaluating a condition that may have since changed.

use tracing::debug;

use super::{declare_aux, Construct, Translator};
use crate::declaration::ParsedDeclaration;
use crate::error::Result;
use crate::scope::ScopeData;

impl Translator {
    pub(super) fn translate_if(
        &mut self,
        construct: &Construct<'_>,
        sd: &mut ScopeData,
        user_vars: &mut ParsedDeclaration,
    ) -> Result<(String, String)> {
        let condition = construct
            .condition
            .as_deref()
            .expect("if always has a condition");

        let (cond_val, cond_latch) = self.ids.next_cond_pair();
        debug!(construct = "if", cond = %cond_val, latch = %cond_latch, "translating construct");
        sd.add_ref(cond_val, cond_val.reset_expr());
        sd.add_ref(cond_latch, cond_latch.reset_expr());

        let (inner_dec, inner_text) = self.rec_translate(construct.inner_scope, sd, user_vars)?;

        let declare = format!(
            "{}{}{}",
            declare_aux(cond_val, cond_val.kind().declared_type()),
            declare_aux(cond_latch, cond_latch.kind().declared_type()),
            inner_dec,
        );
        let text = format!(
            "if ({cond_latch} == 0) {{ if ({condition}) {{ {cond_val} = 1; }} {cond_latch} = 1; }} \
             if ({cond_val} == 1) {{ {inner_text} }}"
        );

        Ok((declare, text))
    }

    pub(super) fn translate_else(
        &mut self,
        construct: &Construct<'_>,
        sd: &mut ScopeData,
        user_vars: &mut ParsedDeclaration,
    ) -> Result<(String, String)> {
        debug!(construct = "else", "translating construct");
        let (inner_dec, inner_text) = self.rec_translate(construct.inner_scope, sd, user_vars)?;
        Ok((inner_dec, format!(" else {{ {inner_text} }}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::parse_construct;

    #[test]
    fn sleep_free_if_matches_documented_shape() {
        let mut tr = Translator::new();
        let mut sd = ScopeData::new();
        let mut uv = ParsedDeclaration::new();
        let construct = parse_construct("if (x > 0) { y = 1; }").unwrap();
        let (dec, text) = tr.translate_if(&construct, &mut sd, &mut uv).unwrap();
        assert!(dec.contains("unsigned char _c0 = 0;"));
        assert!(dec.contains("unsigned char _c0_c = 0;"));
        assert!(dec.contains("unsigned char _r0 = 0;"));
        assert!(text.contains("if (_c0_c == 0) { if (x > 0) { _c0 = 1; } _c0_c = 1; }"));
        assert!(text.contains("if (_c0 == 1) { if (_r0 == 0) { y = 1; _r0 = 1; } }"));
    }
}
