//! Pattern terms and the matching protocol.
//!
//! A pattern has the shape of an expression but may carry placeholders
//! at its leaves. Matching walks pattern and candidate together,
//! top-down and left-to-right, filling a [`Bindings`] table. No
//! backtracking is needed: placeholders within one pattern never
//! overlap destructively, so the first failure is final.

use alloy_primitives::U256;
use eth_expr_data::{Expression, Opcode};
use smallvec::SmallVec;

/// What a placeholder is allowed to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// Binds only `Const` leaves; its binding projects to a word.
    Constant,
    /// Binds any expression.
    Wildcard,
}

/// Stable identity of a placeholder within one catalog environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderId(pub u8);

/// A variable leaf of a pattern. The same placeholder appearing twice
/// in a pattern must bind structurally equal subterms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    pub id: PlaceholderId,
    pub kind: PlaceholderKind,
}

impl Placeholder {
    pub const fn constant(id: PlaceholderId) -> Self {
        Placeholder { id, kind: PlaceholderKind::Constant }
    }

    pub const fn wildcard(id: PlaceholderId) -> Self {
        Placeholder { id, kind: PlaceholderKind::Wildcard }
    }
}

/// The five placeholder identities a catalog is built over: `a`, `b`,
/// `c` bind constants, `x`, `y` bind arbitrary expressions.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderEnv {
    pub a: Placeholder,
    pub b: Placeholder,
    pub c: Placeholder,
    pub x: Placeholder,
    pub y: Placeholder,
}

impl PlaceholderEnv {
    pub const fn new() -> Self {
        PlaceholderEnv {
            a: Placeholder::constant(PlaceholderId(0)),
            b: Placeholder::constant(PlaceholderId(1)),
            c: Placeholder::constant(PlaceholderId(2)),
            x: Placeholder::wildcard(PlaceholderId(3)),
            y: Placeholder::wildcard(PlaceholderId(4)),
        }
    }
}

impl Default for PlaceholderEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Match template: expression shape with placeholder leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Const(U256),
    Op(Opcode, Vec<Pattern>),
    Placeholder(Placeholder),
}

impl Pattern {
    pub fn constant(value: impl Into<U256>) -> Self {
        Pattern::Const(value.into())
    }

    /// Operator pattern; arity is a construction-site invariant.
    pub fn op(code: Opcode, args: Vec<Pattern>) -> Self {
        debug_assert_eq!(args.len(), code.arity(), "{code} pattern with wrong arity");
        Pattern::Op(code, args)
    }

    pub fn nullary(code: Opcode) -> Self {
        Pattern::op(code, Vec::new())
    }

    pub fn unary(code: Opcode, arg: impl Into<Pattern>) -> Self {
        Pattern::op(code, vec![arg.into()])
    }

    pub fn binary(code: Opcode, lhs: impl Into<Pattern>, rhs: impl Into<Pattern>) -> Self {
        Pattern::op(code, vec![lhs.into(), rhs.into()])
    }

    pub fn ternary(
        code: Opcode,
        a: impl Into<Pattern>,
        b: impl Into<Pattern>,
        c: impl Into<Pattern>,
    ) -> Self {
        Pattern::op(code, vec![a.into(), b.into(), c.into()])
    }

    /// Attempt to bind `expr` against this pattern. On success every
    /// placeholder of the pattern is present in the returned bindings.
    pub fn try_match(&self, expr: &Expression) -> Option<Bindings> {
        let mut binds = Bindings::new();
        self.match_into(expr, &mut binds).then_some(binds)
    }

    /// Matching core reused by the rewriter so it can recycle one
    /// bindings table across attempts. Partially filled bindings after
    /// a failed attempt must be cleared by the caller.
    pub(crate) fn match_into(&self, expr: &Expression, binds: &mut Bindings) -> bool {
        match (self, expr) {
            (Pattern::Const(want), Expression::Const(have)) => want == have,
            (Pattern::Op(code, args), Expression::Op(have, children)) => {
                code == have
                    && args
                        .iter()
                        .zip(children)
                        .all(|(pattern, child)| pattern.match_into(child, binds))
            }
            (Pattern::Placeholder(ph), _) => {
                if ph.kind == PlaceholderKind::Constant && !expr.is_const() {
                    return false;
                }
                binds.bind(*ph, expr)
            }
            _ => false,
        }
    }

    /// Occurrences of `ph` in this pattern, used to detect rewrites
    /// that drop copies of a bound subterm.
    pub fn count_placeholder(&self, ph: Placeholder) -> usize {
        match self {
            Pattern::Placeholder(here) => usize::from(here.id == ph.id),
            Pattern::Op(_, args) => {
                args.iter().map(|arg| arg.count_placeholder(ph)).sum()
            }
            Pattern::Const(_) => 0,
        }
    }
}

impl From<Placeholder> for Pattern {
    fn from(ph: Placeholder) -> Self {
        Pattern::Placeholder(ph)
    }
}

impl From<U256> for Pattern {
    fn from(value: U256) -> Self {
        Pattern::Const(value)
    }
}

impl From<u64> for Pattern {
    fn from(value: u64) -> Self {
        Pattern::Const(U256::from(value))
    }
}

/// Placeholder assignments collected during a single match attempt.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    slots: SmallVec<[(Placeholder, Expression); 4]>,
}

impl Bindings {
    pub fn new() -> Self {
        Bindings { slots: SmallVec::new() }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Record `ph := expr`; a placeholder seen before only rebinds to a
    /// structurally equal term.
    fn bind(&mut self, ph: Placeholder, expr: &Expression) -> bool {
        match self.slots.iter().find(|(bound, _)| bound.id == ph.id) {
            Some((_, existing)) => existing == expr,
            None => {
                self.slots.push((ph, expr.clone()));
                true
            }
        }
    }

    /// The expression bound to `ph`. Rule builders only query
    /// placeholders their own pattern binds, so absence is a bug.
    pub fn expr(&self, ph: Placeholder) -> &Expression {
        self.slots
            .iter()
            .find(|(bound, _)| bound.id == ph.id)
            .map(|(_, expr)| expr)
            .unwrap_or_else(|| panic!("placeholder {:?} queried but never bound", ph.id))
    }

    /// Word projection of a constant placeholder's binding.
    pub fn word(&self, ph: Placeholder) -> U256 {
        match self.expr(ph) {
            Expression::Const(value) => *value,
            other => panic!("placeholder {:?} bound to non-constant {other}", ph.id),
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &(Placeholder, Expression)> {
        self.slots.iter()
    }
}
