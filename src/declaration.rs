//! User variable declarations.
//!
//! `T n;`, `T n = v;`, `T n1, n2;`, `T n1 = v1, n2 = v2;` — all names in
//! one statement share the leading type; later declarators may each
//! carry their own `= value`.
//!
//! The grammar accepted here is intentionally stricter than the shape
//! this was learned from: a multi-word type (`unsigned long`, built from
//! a qualifier plus a base type) is only accepted when the statement
//! declares a single variable. A multi-declarator statement (`a, b, c`)
//! must use a single-word type. This resolves the "declaration-regex
//! accepts some forms whose parser path is ambiguous" note by rejecting
//! the ambiguous forms outright instead of guessing at them.

use crate::error::{Result, TranslateError};

pub const QUALIFIER_WORDS: &[&str] = &["unsigned", "signed", "long", "short"];
pub const BASE_TYPE_WORDS: &[&str] = &[
    "sbyte", "byte", "short", "ushort", "int", "uint", "long", "ulong", "nint", "nuint", "float",
    "double", "char",
];

/// One user variable: its type, name, and optional initialiser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub var_type: String,
    pub var_name: String,
    pub var_value: Option<String>,
}

impl Declaration {
    /// Render as a standalone declaration: `type name = value;` or
    /// `type name;` with no initialiser.
    pub fn render_declare(&self) -> String {
        match &self.var_value {
            Some(v) => format!("{} {} = {};", self.var_type, self.var_name, v),
            None => format!("{} {};", self.var_type, self.var_name),
        }
    }

    /// Render as a reassignment at the declaration's original program
    /// point, used when the declaration itself is hoisted to the
    /// top-level auxiliary block and only the initialisation stays put.
    pub fn render_reassign(&self) -> Option<String> {
        self.var_value.as_ref().map(|v| format!("{} = {};", self.var_name, v))
    }
}

/// The ordered list of user variables declared within one thread body,
/// accumulated in source order as the tokeniser visits declaration
/// statements.
#[derive(Debug, Default, Clone)]
pub struct ParsedDeclaration {
    pub decls: Vec<Declaration>,
}

impl ParsedDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, more: Vec<Declaration>) {
        self.decls.extend(more);
    }
}

fn is_recognised_type_word(w: &str, extra: &[String]) -> bool {
    QUALIFIER_WORDS.contains(&w) || BASE_TYPE_WORDS.contains(&w) || extra.iter().any(|e| e == w)
}

/// Does this trimmed, semicolon-stripped statement body look like a
/// type declaration? (Cheap check used by the tokeniser to decide
/// token kind before committing to the full parse.) `extra` is
/// [`crate::config::TranslateConfig::extra_type_words`], letting a
/// project recognise vendor-specific numeric typedefs.
pub fn looks_like_declaration(stmt: &str, extra: &[String]) -> bool {
    let first_word = stmt.split_whitespace().next().unwrap_or("");
    is_recognised_type_word(first_word, extra)
}

/// Parse one declaration statement body (no trailing `;`) into one or
/// more `Declaration`s.
pub fn parse_declaration(stmt: &str, extra: &[String]) -> Result<Vec<Declaration>> {
    let declarators: Vec<&str> = stmt.split(',').map(str::trim).collect();
    if declarators.is_empty() || declarators[0].is_empty() {
        return Err(TranslateError::MalformedInput(format!(
            "empty declaration: {:?}",
            stmt
        )));
    }

    let (first_type, first_name, first_value) = split_first_declarator(declarators[0], extra)?;

    if declarators.len() == 1 {
        return Ok(vec![Declaration {
            var_type: first_type,
            var_name: first_name,
            var_value: first_value,
        }]);
    }

    // Multi-declarator: the shared type must be a single word, per the
    // strict grammar documented above.
    if first_type.split_whitespace().count() != 1 {
        return Err(TranslateError::UnsupportedConstruct(format!(
            "multi-declarator statement with a qualified type is ambiguous: {:?}",
            stmt
        )));
    }

    let mut out = vec![Declaration {
        var_type: first_type.clone(),
        var_name: first_name,
        var_value: first_value,
    }];
    for rest in &declarators[1..] {
        let (name, value) = split_name_value(rest)?;
        out.push(Declaration {
            var_type: first_type.clone(),
            var_name: name,
            var_value: value,
        });
    }
    Ok(out)
}

/// Split `TYPE_WORDS... NAME (= VALUE)?` into its three parts, validating
/// that every type word is recognised.
fn split_first_declarator(declarator: &str, extra: &[String]) -> Result<(String, String, Option<String>)> {
    let (head, value) = match declarator.split_once('=') {
        Some((h, v)) => (h.trim(), Some(v.trim().to_string())),
        None => (declarator.trim(), None),
    };
    let words: Vec<&str> = head.split_whitespace().collect();
    if words.len() < 2 {
        return Err(TranslateError::MalformedInput(format!(
            "declaration is missing a type or a name: {:?}",
            declarator
        )));
    }
    let name = words[words.len() - 1].to_string();
    let type_words = &words[..words.len() - 1];
    for w in type_words {
        if !is_recognised_type_word(w, extra) {
            return Err(TranslateError::UnsupportedConstruct(format!(
                "unrecognised type word {:?} in declaration {:?}",
                w, declarator
            )));
        }
    }
    Ok((type_words.join(" "), name, value))
}

fn split_name_value(declarator: &str) -> Result<(String, Option<String>)> {
    match declarator.split_once('=') {
        Some((n, v)) => Ok((n.trim().to_string(), Some(v.trim().to_string()))),
        None => {
            let n = declarator.trim();
            if n.is_empty() {
                return Err(TranslateError::MalformedInput(
                    "empty declarator in comma list".to_string(),
                ));
            }
            Ok((n.to_string(), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_declarator_no_value() {
        let d = parse_declaration("int x", &[]).unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].var_type, "int");
        assert_eq!(d[0].var_name, "x");
        assert_eq!(d[0].var_value, None);
    }

    #[test]
    fn single_declarator_with_value() {
        let d = parse_declaration("int i = 50", &[]).unwrap();
        assert_eq!(d[0].render_declare(), "int i = 50;");
        assert_eq!(d[0].render_reassign().unwrap(), "i = 50;");
    }

    #[test]
    fn qualified_type_single_declarator() {
        let d = parse_declaration("unsigned long x = 0", &[]).unwrap();
        assert_eq!(d[0].var_type, "unsigned long");
    }

    #[test]
    fn multi_declarator_shared_type() {
        let d = parse_declaration("int a = 1, b, c = 3", &[]).unwrap();
        assert_eq!(d.len(), 3);
        assert_eq!(d[1].var_name, "b");
        assert_eq!(d[1].var_value, None);
        assert_eq!(d[2].var_value.as_deref(), Some("3"));
    }

    #[test]
    fn multi_declarator_qualified_type_rejected() {
        let err = parse_declaration("unsigned long a, b", &[]).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedConstruct(_)));
    }

    #[test]
    fn unrecognised_type_rejected() {
        let err = parse_declaration("Widget w", &[]).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedConstruct(_)));
    }

    #[test]
    fn extra_type_word_recognised_when_configured() {
        let extra = vec!["int8_t".to_string()];
        let d = parse_declaration("int8_t x = 1", &extra).unwrap();
        assert_eq!(d[0].var_type, "int8_t");
    }
}
