//! The scope-data propagator.
//!
//! A single `ScopeData` is created per thread and threaded by mutable
//! reference through the entire recursive translation of that thread's
//! body. It tracks two things: every auxiliary identifier emitted so
//! far together with its reset expression, and the current textual
//! placeholder for `break`/`continue` as seen from the innermost
//! enclosing cooperative loop.
//!
//! Unlike the array this was learned from, `variable_refs` here only
//! ever grows — it is never pruned and re-merged mid-recursion. A
//! construct that needs to know "what did my own body just add" takes
//! a [`Mark`] before recursing and reads the slice after: the payoff is
//! that the same vector that feeds a loop's own per-iteration reset
//! block doubles, without any extra bookkeeping, as the per-thread
//! registry the master reset sweeps at the end of the thread.

use tracing::warn;

use crate::ids::Ident;

/// A position in `ScopeData::variable_refs`, taken before recursing
/// into a construct's inner scope so the construct can later compute
/// exactly the identifiers its own body introduced.
#[derive(Debug, Clone, Copy)]
pub struct Mark(usize);

#[derive(Debug, Default)]
pub struct ScopeData {
    /// Every auxiliary identifier emitted in or below this thread's
    /// translation so far, paired with the expression it resets to at
    /// the start of a cooperative iteration (or at the master reset).
    variable_refs: Vec<(Ident, String)>,
    /// Current placeholder text for `break`, if inside a sleep-bearing
    /// loop; `None` outside any cooperative loop (break/continue are
    /// then no-ops, per the warning-not-abort policy).
    break_sub: Option<String>,
    /// Current placeholder text for `continue`.
    continue_sub: Option<String>,
}

impl ScopeData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self) -> Mark {
        Mark(self.variable_refs.len())
    }

    pub fn add_ref(&mut self, id: Ident, reset_expr: impl Into<String>) {
        self.variable_refs.push((id, reset_expr.into()));
    }

    /// Every identifier introduced since `mark`, in emission order.
    pub fn delta_since(&self, mark: Mark) -> &[(Ident, String)] {
        &self.variable_refs[mark.0..]
    }

    /// The full per-thread registry, for the master reset block.
    pub fn all_refs(&self) -> &[(Ident, String)] {
        &self.variable_refs
    }

    /// The current `break` substitution, or `""` with a logged warning
    /// if there's no enclosing sleep-bearing loop — a `break` textually
    /// outside any loop is a no-op, not an abort.
    pub fn break_text(&self) -> &str {
        match self.break_sub.as_deref() {
            Some(s) => s,
            None => {
                warn!("break outside any loop; substituting a no-op");
                ""
            }
        }
    }

    /// The current `continue` substitution, with the same no-op-and-warn
    /// fallback as [`Self::break_text`].
    pub fn continue_text(&self) -> &str {
        match self.continue_sub.as_deref() {
            Some(s) => s,
            None => {
                warn!("continue outside any loop; substituting a no-op");
                ""
            }
        }
    }

    /// Push new `break`/`continue` placeholder text for the body of a
    /// freshly entered sleep-bearing loop, returning the previous
    /// values so the caller can restore them once the body has been
    /// translated. Scoping these properly (rather than leaving the
    /// loop's placeholder live for the rest of the thread) is what
    /// makes a `break`/`continue` lexically outside any loop resolve to
    /// the empty, no-op substitution.
    pub fn push_loop_subs(&mut self, break_text: String, continue_text: String) -> (Option<String>, Option<String>) {
        let prev = (self.break_sub.take(), self.continue_sub.take());
        self.break_sub = Some(break_text);
        self.continue_sub = Some(continue_text);
        prev
    }

    pub fn restore_subs(&mut self, prev: (Option<String>, Option<String>)) {
        self.break_sub = prev.0;
        self.continue_sub = prev.1;
    }
}
