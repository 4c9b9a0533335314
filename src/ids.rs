//! Fresh-name supply.
//!
//! Per-kind monotonic counters producing the auxiliary identifiers the
//! translator emits: `_t{n}` (timer), `_c{n}` (condition), `_r{n}`
//! (routine latch), `_i{n}` (for-iterator), `_l{n}` (loop-exit latch),
//! `_f{n}` (generated function), `_v{n}` (user variable rename), plus a
//! numeric-only supply feeding opaque `break`/`continue` placeholder tags.
//!
//! The prefix is kept as a typed [`IdentKind`] rather than re-derived by
//! matching on the rendered string later: the reset policy and the
//! per-iteration reset-set membership are properties of the kind, not of
//! a regex over the name, so they're carried on the value from the
//! moment it's minted.

use std::fmt;

/// The process-wide identifier carrying the host's current millisecond
/// clock, written once per cooperative tick by `loop()` and read-only to
/// every thread.
pub const MAIN_TIMER: &str = "_mt0";

/// The kind of auxiliary identifier, carrying everything the rest of the
/// pipeline needs to know about how to declare and reset it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentKind {
    /// `_t{n}` — captures `main_timer` at the moment a sleep gate opens.
    Timer,
    /// `_t{n}_c` — "has the timer been captured yet" latch for a sleep.
    TimerLatch,
    /// `_c{n}` — captured boolean value of an `if`/`while`/`for` condition.
    Cond,
    /// `_c{n}_c` — "has the condition been sampled yet" latch.
    CondLatch,
    /// `_r{n}` — do-once latch guarding a routine.
    Routine,
    /// `_l{n}` — exit latch for a loop construct.
    LoopExit,
    /// `_i{n}` — for-loop iterator, hoisted to a global.
    Iter,
}

impl IdentKind {
    /// The declared C-family type for this identifier in the output's
    /// auxiliary declaration block. `_i{n}` takes the user's declared
    /// loop-variable type instead, so it isn't covered here.
    pub fn declared_type(self) -> &'static str {
        match self {
            IdentKind::Timer => "unsigned long",
            IdentKind::TimerLatch
            | IdentKind::Cond
            | IdentKind::CondLatch
            | IdentKind::Routine
            | IdentKind::LoopExit => "unsigned char",
            IdentKind::Iter => unreachable!("Iter declares with the user's own type"),
        }
    }

    /// Whether this identifier's kind is reset at every iteration of an
    /// enclosing sleep-bearing loop. The `_i` iterator is deliberately
    /// excluded: it's re-initialised only when the whole loop restarts,
    /// never on a per-iteration basis (the `for` construct re-expands it
    /// as a `continue`-time advance instead).
    pub fn resets_every_loop_iteration(self) -> bool {
        !matches!(self, IdentKind::Iter)
    }
}

/// An auxiliary identifier minted by the fresh-name supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ident {
    kind: IdentKind,
    n: u32,
}

impl Ident {
    pub fn kind(self) -> IdentKind {
        self.kind
    }

    /// The reset-on-entry expression for this identifier: timers rewind
    /// to the shared main-timer identifier, everything else rewinds to 0.
    pub fn reset_expr(self) -> String {
        match self.kind {
            IdentKind::Timer => MAIN_TIMER.to_string(),
            _ => "0".to_string(),
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IdentKind::Timer => write!(f, "_t{}", self.n),
            IdentKind::TimerLatch => write!(f, "_t{}_c", self.n),
            IdentKind::Cond => write!(f, "_c{}", self.n),
            IdentKind::CondLatch => write!(f, "_c{}_c", self.n),
            IdentKind::Routine => write!(f, "_r{}", self.n),
            IdentKind::LoopExit => write!(f, "_l{}", self.n),
            IdentKind::Iter => write!(f, "_i{}", self.n),
        }
    }
}

/// The process-wide fresh-name supply. One `IdGen` is shared across an
/// entire compilation (all threads of one `interpret` call) so that
/// identifiers never collide between threads, even though each thread's
/// own registry of identifiers-to-reset is cleared independently.
#[derive(Debug, Default)]
pub struct IdGen {
    timer: u32,
    cond: u32,
    routine: u32,
    loop_exit: u32,
    iter: u32,
    func: u32,
    var: u32,
    placeholder: u32,
    /// Every `Ident` this generator has ever minted, checked on mint in
    /// debug builds only — a counter wired up wrong (e.g. a stale
    /// `IdGen` swapped back in after `std::mem::take`) would otherwise
    /// silently re-issue a name instead of panicking where it happened.
    #[cfg(debug_assertions)]
    issued: std::collections::HashSet<Ident>,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly constructed `Ident` as issued, panicking in
    /// debug builds if it was already minted. This is the one call site
    /// that could violate the fresh-name-supply invariant, so it's the
    /// one place the check lives.
    fn mint(&mut self, id: Ident) -> Ident {
        #[cfg(debug_assertions)]
        debug_assert!(self.issued.insert(id), "fresh name collision: {id} already issued");
        id
    }

    /// A sleep's timer pair: the captured-`main_timer` value and its
    /// one-shot capture latch. Both share one numeric id, matching the
    /// source's convention of deriving the checker name by string
    /// suffix rather than drawing a second counter.
    pub fn next_timer_pair(&mut self) -> (Ident, Ident) {
        let n = self.timer;
        self.timer += 1;
        (
            self.mint(Ident { kind: IdentKind::Timer, n }),
            self.mint(Ident { kind: IdentKind::TimerLatch, n }),
        )
    }

    /// An `if`/`while`/`for` condition's captured-value and sampled-latch
    /// pair, sharing one numeric id for the same reason as timers.
    pub fn next_cond_pair(&mut self) -> (Ident, Ident) {
        let n = self.cond;
        self.cond += 1;
        (
            self.mint(Ident { kind: IdentKind::Cond, n }),
            self.mint(Ident { kind: IdentKind::CondLatch, n }),
        )
    }

    pub fn next_routine(&mut self) -> Ident {
        let n = self.routine;
        self.routine += 1;
        self.mint(Ident { kind: IdentKind::Routine, n })
    }

    pub fn next_loop_exit(&mut self) -> Ident {
        let n = self.loop_exit;
        self.loop_exit += 1;
        self.mint(Ident { kind: IdentKind::LoopExit, n })
    }

    pub fn next_iter(&mut self) -> Ident {
        let n = self.iter;
        self.iter += 1;
        self.mint(Ident { kind: IdentKind::Iter, n })
    }

    /// A fresh generated-function name, e.g. `_f0`.
    pub fn next_func_name(&mut self) -> String {
        let n = self.func;
        self.func += 1;
        format!("_f{}", n)
    }

    /// A fresh name used only to rename one user-declared variable to a
    /// global, e.g. `_v0`. These never enter a thread's reset registry:
    /// they're a pure rename, substituted once at assembly time.
    pub fn next_var_name(&mut self) -> String {
        let n = self.var;
        self.var += 1;
        format!("_v{}", n)
    }

    /// A pair of opaque numeric tags used to mark `break`/`continue`
    /// placeholders inside a sleep-bearing loop body before their real
    /// substitution text is known.
    pub fn next_placeholder_pair(&mut self) -> (u32, u32) {
        let a = self.placeholder;
        self.placeholder += 1;
        let b = self.placeholder;
        self.placeholder += 1;
        (a, b)
    }
}
