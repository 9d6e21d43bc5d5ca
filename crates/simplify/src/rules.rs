//! The simplification rule catalog.
//!
//! An ordered list of `(pattern, builder, removes_nonconstant)` rules,
//! built once per placeholder environment and shared read-only
//! afterwards. List position is match priority: the rewriter fires the
//! first rule whose pattern binds. Constant-folding entries come first
//! so that rules further down can assume fully constant nodes are
//! already gone.

use crate::pattern::{Bindings, Pattern, Placeholder, PlaceholderEnv};
use alloy_primitives::U256;
use eth_expr_data::{word, Expression, Opcode};
use index_vec::IndexVec;
use std::fmt;

index_vec::define_index_type! {
    pub struct RuleId = u32;
}

pub(crate) type Rules = IndexVec<RuleId, SimplificationRule>;

type Builder = Box<dyn Fn(&Bindings) -> Expression + Send + Sync>;

/// A single rewrite: match template, replacement builder, and whether
/// firing can drop a wildcard-bound subterm from the program.
pub struct SimplificationRule {
    pattern: Pattern,
    builder: Builder,
    removes_nonconstant: bool,
}

impl SimplificationRule {
    pub(crate) fn new(
        pattern: Pattern,
        removes_nonconstant: bool,
        builder: impl Fn(&Bindings) -> Expression + Send + Sync + 'static,
    ) -> Self {
        SimplificationRule { pattern, builder: Box::new(builder), removes_nonconstant }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Whether firing this rule discards a subterm that may carry a
    /// non-trivial computation; see the purity module.
    pub fn removes_nonconstant(&self) -> bool {
        self.removes_nonconstant
    }

    /// Construct the replacement for a successful match.
    pub fn build(&self, binds: &Bindings) -> Expression {
        (self.builder)(binds)
    }
}

impl fmt::Debug for SimplificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimplificationRule")
            .field("pattern", &self.pattern)
            .field("removes_nonconstant", &self.removes_nonconstant)
            .finish_non_exhaustive()
    }
}

/// The full rule list for one placeholder environment.
pub struct Catalog {
    env: PlaceholderEnv,
    rules: Rules,
}

impl Catalog {
    /// Build the catalog. Construction is not thread-safe to share
    /// mid-way; finish it before handing references out.
    pub fn build(env: PlaceholderEnv) -> Self {
        let mut rules = Rules::new();
        constant_folding(&mut rules, env);
        constant_identities(&mut rules, env);
        self_identities(&mut rules, env);
        logic_combinations(&mut rules, env);
        modulus_masks(&mut rules, env);
        address_masks(&mut rules, env);
        boolean_double_negation(&mut rules, env);
        associative_constant_motion(&mut rules, env);
        add_sub_constant_motion(&mut rules, env);
        Catalog { env, rules }
    }

    pub fn env(&self) -> PlaceholderEnv {
        self.env
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter_enumerated(&self) -> impl Iterator<Item = (RuleId, &SimplificationRule)> {
        self.rules.iter_enumerated()
    }

    pub(crate) fn rules(&self) -> &Rules {
        &self.rules
    }

    #[cfg(test)]
    pub(crate) fn from_rules(env: PlaceholderEnv, rules: Rules) -> Self {
        Catalog { env, rules }
    }
}

/// Construct the rule catalog for `env` once; see [`Catalog::build`].
pub fn build_catalog(env: PlaceholderEnv) -> Catalog {
    Catalog::build(env)
}

fn rule(
    rules: &mut Rules,
    pattern: Pattern,
    builder: impl Fn(&Bindings) -> Expression + Send + Sync + 'static,
) {
    rules.push(SimplificationRule::new(pattern, false, builder));
}

fn removing_rule(
    rules: &mut Rules,
    pattern: Pattern,
    builder: impl Fn(&Bindings) -> Expression + Send + Sync + 'static,
) {
    rules.push(SimplificationRule::new(pattern, true, builder));
}

fn fold1(rules: &mut Rules, a: Placeholder, code: Opcode, fold: fn(U256) -> U256) {
    rule(rules, Pattern::unary(code, a), move |m| Expression::constant(fold(m.word(a))));
}

fn fold2(
    rules: &mut Rules,
    a: Placeholder,
    b: Placeholder,
    code: Opcode,
    fold: fn(U256, U256) -> U256,
) {
    rule(rules, Pattern::binary(code, a, b), move |m| {
        Expression::constant(fold(m.word(a), m.word(b)))
    });
}

fn fold3(
    rules: &mut Rules,
    a: Placeholder,
    b: Placeholder,
    c: Placeholder,
    code: Opcode,
    fold: fn(U256, U256, U256) -> U256,
) {
    rule(rules, Pattern::ternary(code, a, b, c), move |m| {
        Expression::constant(fold(m.word(a), m.word(b), m.word(c)))
    });
}

/// Arithmetic on fully constant nodes.
fn constant_folding(rules: &mut Rules, env: PlaceholderEnv) {
    use Opcode as O;
    let PlaceholderEnv { a, b, c, .. } = env;

    fold2(rules, a, b, O::Add, word::add);
    fold2(rules, a, b, O::SAdd, word::add);
    fold2(rules, a, b, O::Mul, word::mul);
    fold2(rules, a, b, O::SMul, word::mul);
    fold2(rules, a, b, O::Sub, word::sub);
    fold2(rules, a, b, O::SSub, word::sub);
    fold2(rules, a, b, O::Div, word::udiv);
    fold2(rules, a, b, O::SDiv, word::sdiv);
    fold2(rules, a, b, O::Mod, word::umod);
    fold2(rules, a, b, O::SMod, word::smod);
    fold2(rules, a, b, O::Exp, word::exp);
    fold1(rules, a, O::Not, word::not);
    fold2(rules, a, b, O::Lt, word::lt);
    fold2(rules, a, b, O::Gt, word::gt);
    fold2(rules, a, b, O::SLt, word::slt);
    fold2(rules, a, b, O::SGt, word::sgt);
    fold2(rules, a, b, O::Eq, word::eq);
    fold1(rules, a, O::IsZero, word::iszero);
    fold2(rules, a, b, O::And, word::and);
    fold2(rules, a, b, O::Or, word::or);
    fold2(rules, a, b, O::Xor, word::xor);
    fold2(rules, a, b, O::Byte, word::byte);
    fold3(rules, a, b, c, O::AddMod, word::addmod);
    fold3(rules, a, b, c, O::MulMod, word::mulmod);
    fold2(rules, a, b, O::SignExtend, word::signextend);
    fold2(rules, a, b, O::Shl, word::shl);
    fold2(rules, a, b, O::Shr, word::shr);
}

/// Identities involving one known constant operand.
fn constant_identities(rules: &mut Rules, env: PlaceholderEnv) {
    use Opcode as O;
    let PlaceholderEnv { x, .. } = env;
    let ones = U256::MAX;

    let keep = move |m: &Bindings| m.expr(x).clone();
    let zero = |_: &Bindings| Expression::constant(U256::ZERO);
    let all_ones = move |_: &Bindings| Expression::constant(ones);
    let negate = move |m: &Bindings| {
        Expression::binary(O::Sub, Expression::constant(U256::ZERO), m.expr(x).clone())
    };
    let negate_checked = move |m: &Bindings| {
        Expression::binary(O::SSub, Expression::constant(U256::ZERO), m.expr(x).clone())
    };
    let not_x = move |m: &Bindings| Expression::unary(O::IsZero, m.expr(x).clone());

    rule(rules, Pattern::binary(O::Add, x, 0u64), keep);
    rule(rules, Pattern::binary(O::Add, 0u64, x), keep);
    rule(rules, Pattern::binary(O::SAdd, x, 0u64), keep);
    rule(rules, Pattern::binary(O::SAdd, 0u64, x), keep);
    rule(rules, Pattern::binary(O::Sub, x, 0u64), keep);
    rule(rules, Pattern::binary(O::SSub, x, 0u64), keep);

    removing_rule(rules, Pattern::binary(O::Mul, x, 0u64), zero);
    removing_rule(rules, Pattern::binary(O::Mul, 0u64, x), zero);
    rule(rules, Pattern::binary(O::Mul, x, 1u64), keep);
    rule(rules, Pattern::binary(O::Mul, 1u64, x), keep);
    rule(rules, Pattern::binary(O::Mul, x, ones), negate);
    rule(rules, Pattern::binary(O::Mul, ones, x), negate);
    removing_rule(rules, Pattern::binary(O::SMul, x, 0u64), zero);
    removing_rule(rules, Pattern::binary(O::SMul, 0u64, x), zero);
    rule(rules, Pattern::binary(O::SMul, x, 1u64), keep);
    rule(rules, Pattern::binary(O::SMul, 1u64, x), keep);
    rule(rules, Pattern::binary(O::SMul, x, ones), negate_checked);
    rule(rules, Pattern::binary(O::SMul, ones, x), negate_checked);

    removing_rule(rules, Pattern::binary(O::Div, x, 0u64), zero);
    removing_rule(rules, Pattern::binary(O::Div, 0u64, x), zero);
    rule(rules, Pattern::binary(O::Div, x, 1u64), keep);
    removing_rule(rules, Pattern::binary(O::SDiv, x, 0u64), zero);
    removing_rule(rules, Pattern::binary(O::SDiv, 0u64, x), zero);
    rule(rules, Pattern::binary(O::SDiv, x, 1u64), keep);

    rule(rules, Pattern::binary(O::And, x, ones), keep);
    rule(rules, Pattern::binary(O::And, ones, x), keep);
    removing_rule(rules, Pattern::binary(O::And, x, 0u64), zero);
    removing_rule(rules, Pattern::binary(O::And, 0u64, x), zero);
    rule(rules, Pattern::binary(O::Or, x, 0u64), keep);
    rule(rules, Pattern::binary(O::Or, 0u64, x), keep);
    removing_rule(rules, Pattern::binary(O::Or, x, ones), all_ones);
    removing_rule(rules, Pattern::binary(O::Or, ones, x), all_ones);
    rule(rules, Pattern::binary(O::Xor, x, 0u64), keep);
    rule(rules, Pattern::binary(O::Xor, 0u64, x), keep);

    removing_rule(rules, Pattern::binary(O::Mod, x, 0u64), zero);
    removing_rule(rules, Pattern::binary(O::Mod, 0u64, x), zero);

    rule(rules, Pattern::binary(O::Eq, x, 0u64), not_x);
    rule(rules, Pattern::binary(O::Eq, 0u64, x), not_x);
}

/// Operations applied to an expression and itself. All drop one copy of
/// the operand, so they are gated on its purity.
fn self_identities(rules: &mut Rules, env: PlaceholderEnv) {
    use Opcode as O;
    let PlaceholderEnv { x, .. } = env;

    let keep = move |m: &Bindings| m.expr(x).clone();
    let zero = |_: &Bindings| Expression::constant(U256::ZERO);
    let one = |_: &Bindings| Expression::constant(U256::ONE);

    removing_rule(rules, Pattern::binary(O::And, x, x), keep);
    removing_rule(rules, Pattern::binary(O::Or, x, x), keep);
    removing_rule(rules, Pattern::binary(O::Xor, x, x), zero);
    removing_rule(rules, Pattern::binary(O::Sub, x, x), zero);
    removing_rule(rules, Pattern::binary(O::SSub, x, x), zero);
    removing_rule(rules, Pattern::binary(O::Eq, x, x), one);
    removing_rule(rules, Pattern::binary(O::Lt, x, x), zero);
    removing_rule(rules, Pattern::binary(O::SLt, x, x), zero);
    removing_rule(rules, Pattern::binary(O::Gt, x, x), zero);
    removing_rule(rules, Pattern::binary(O::SGt, x, x), zero);
    removing_rule(rules, Pattern::binary(O::Mod, x, x), zero);
}

/// Combinations of the bitwise logic instructions.
fn logic_combinations(rules: &mut Rules, env: PlaceholderEnv) {
    use Opcode as O;
    let PlaceholderEnv { x, y, .. } = env;

    let keep_x = move |m: &Bindings| m.expr(x).clone();
    let keep_y = move |m: &Bindings| m.expr(y).clone();
    let zero = |_: &Bindings| Expression::constant(U256::ZERO);
    let all_ones = |_: &Bindings| Expression::constant(U256::MAX);

    rule(rules, Pattern::unary(O::Not, Pattern::unary(O::Not, x)), keep_x);

    removing_rule(rules, Pattern::binary(O::Xor, x, Pattern::binary(O::Xor, x, y)), keep_y);
    removing_rule(rules, Pattern::binary(O::Xor, x, Pattern::binary(O::Xor, y, x)), keep_y);
    removing_rule(rules, Pattern::binary(O::Xor, Pattern::binary(O::Xor, x, y), x), keep_y);
    removing_rule(rules, Pattern::binary(O::Xor, Pattern::binary(O::Xor, y, x), x), keep_y);

    removing_rule(rules, Pattern::binary(O::Or, x, Pattern::binary(O::And, x, y)), keep_x);
    removing_rule(rules, Pattern::binary(O::Or, x, Pattern::binary(O::And, y, x)), keep_x);
    removing_rule(rules, Pattern::binary(O::Or, Pattern::binary(O::And, x, y), x), keep_x);
    removing_rule(rules, Pattern::binary(O::Or, Pattern::binary(O::And, y, x), x), keep_x);

    removing_rule(rules, Pattern::binary(O::And, x, Pattern::binary(O::Or, x, y)), keep_x);
    removing_rule(rules, Pattern::binary(O::And, x, Pattern::binary(O::Or, y, x)), keep_x);
    removing_rule(rules, Pattern::binary(O::And, Pattern::binary(O::Or, x, y), x), keep_x);
    removing_rule(rules, Pattern::binary(O::And, Pattern::binary(O::Or, y, x), x), keep_x);

    removing_rule(rules, Pattern::binary(O::And, x, Pattern::unary(O::Not, x)), zero);
    removing_rule(rules, Pattern::binary(O::And, Pattern::unary(O::Not, x), x), zero);
    removing_rule(rules, Pattern::binary(O::Or, x, Pattern::unary(O::Not, x)), all_ones);
    removing_rule(rules, Pattern::binary(O::Or, Pattern::unary(O::Not, x), x), all_ones);
}

/// `MOD(X, 2^i)` is a bit mask.
fn modulus_masks(rules: &mut Rules, env: PlaceholderEnv) {
    use Opcode as O;
    let PlaceholderEnv { x, .. } = env;

    for i in 0..256usize {
        let power = U256::ONE << i;
        let mask = power - U256::ONE;
        rule(rules, Pattern::binary(O::Mod, x, power), move |m| {
            Expression::binary(O::And, m.expr(x).clone(), Expression::constant(mask))
        });
    }
}

/// Masking an environment opcode to address width is a no-op; the
/// machine already zero-extends the 160-bit value.
fn address_masks(rules: &mut Rules, _env: PlaceholderEnv) {
    use Opcode as O;
    let mask = (U256::ONE << 160usize) - U256::ONE;

    for code in [O::Address, O::Caller, O::Origin, O::Coinbase] {
        rule(rules, Pattern::binary(O::And, Pattern::nullary(code), mask), move |_| {
            Expression::nullary(code)
        });
        rule(rules, Pattern::binary(O::And, mask, Pattern::nullary(code)), move |_| {
            Expression::nullary(code)
        });
    }
}

/// Double negation collapses around opcodes that already produce a
/// boolean word.
fn boolean_double_negation(rules: &mut Rules, env: PlaceholderEnv) {
    use Opcode as O;
    let PlaceholderEnv { x, y, .. } = env;

    for code in [O::Eq, O::Lt, O::SLt, O::Gt, O::SGt] {
        rule(
            rules,
            Pattern::unary(
                O::IsZero,
                Pattern::unary(O::IsZero, Pattern::binary(code, x, y)),
            ),
            move |m| Expression::binary(code, m.expr(x).clone(), m.expr(y).clone()),
        );
    }

    rule(
        rules,
        Pattern::unary(O::IsZero, Pattern::unary(O::IsZero, Pattern::unary(O::IsZero, x))),
        move |m| Expression::unary(O::IsZero, m.expr(x).clone()),
    );

    rule(rules, Pattern::unary(O::IsZero, Pattern::binary(O::Xor, x, y)), move |m| {
        Expression::binary(O::Eq, m.expr(x).clone(), m.expr(y).clone())
    });
}

/// Move constants outward through associative operators. Coalescing
/// entries come before floating entries so a nested node holding two
/// constants collapses instead of drifting further out.
fn associative_constant_motion(rules: &mut Rules, env: PlaceholderEnv) {
    use Opcode as O;
    let PlaceholderEnv { a, b, x, y, .. } = env;

    let ops: [(Opcode, fn(U256, U256) -> U256); 7] = [
        (O::Add, word::add),
        (O::SAdd, word::add),
        (O::Mul, word::mul),
        (O::SMul, word::mul),
        (O::And, word::and),
        (O::Or, word::or),
        (O::Xor, word::xor),
    ];

    for (code, fold) in ops {
        // The nested node can hold its constant on either side.
        for inner in [Pattern::binary(code, x, a), Pattern::binary(code, a, x)] {
            // (X+A)+B -> X+(A+B)
            rule(rules, Pattern::binary(code, inner.clone(), b), move |m| {
                Expression::binary(
                    code,
                    m.expr(x).clone(),
                    Expression::constant(fold(m.word(a), m.word(b))),
                )
            });
            // (X+A)+Y -> (X+Y)+A
            rule(rules, Pattern::binary(code, inner.clone(), y), move |m| {
                Expression::binary(
                    code,
                    Expression::binary(code, m.expr(x).clone(), m.expr(y).clone()),
                    Expression::constant(m.word(a)),
                )
            });
            // B+(X+A) -> X+(A+B)
            rule(rules, Pattern::binary(code, b, inner.clone()), move |m| {
                Expression::binary(
                    code,
                    m.expr(x).clone(),
                    Expression::constant(fold(m.word(a), m.word(b))),
                )
            });
            // Y+(X+A) -> (Y+X)+A
            rule(rules, Pattern::binary(code, y, inner), move |m| {
                Expression::binary(
                    code,
                    Expression::binary(code, m.expr(y).clone(), m.expr(x).clone()),
                    Expression::constant(m.word(a)),
                )
            });
        }
    }
}

/// Constant motion across mixed addition and subtraction, for both the
/// wrapping pair and the overflow-checked pair.
fn add_sub_constant_motion(rules: &mut Rules, env: PlaceholderEnv) {
    use Opcode as O;
    let PlaceholderEnv { a, b, x, y, .. } = env;

    for (add, sub) in [(O::Add, O::Sub), (O::SAdd, O::SSub)] {
        for inner in [Pattern::binary(add, x, a), Pattern::binary(add, a, x)] {
            // (X + A) - B -> X + (A - B) or X - (B - A)
            rule(rules, Pattern::binary(sub, inner.clone(), b), move |m| {
                let (av, bv) = (m.word(a), m.word(b));
                if av < bv {
                    Expression::binary(
                        sub,
                        m.expr(x).clone(),
                        Expression::constant(word::sub(bv, av)),
                    )
                } else {
                    Expression::binary(
                        add,
                        m.expr(x).clone(),
                        Expression::constant(word::sub(av, bv)),
                    )
                }
            });
            // B - (X + A) -> (B - A) - X
            rule(rules, Pattern::binary(sub, b, inner), move |m| {
                Expression::binary(
                    sub,
                    Expression::constant(word::sub(m.word(b), m.word(a))),
                    m.expr(x).clone(),
                )
            });
        }

        // (X - A) + B and B + (X - A) -> X + (B - A) or X - (A - B)
        let diff = Pattern::binary(sub, x, a);
        for outer in [
            Pattern::binary(add, diff.clone(), b),
            Pattern::binary(add, b, diff.clone()),
        ] {
            rule(rules, outer, move |m| {
                let (av, bv) = (m.word(a), m.word(b));
                if bv < av {
                    Expression::binary(
                        sub,
                        m.expr(x).clone(),
                        Expression::constant(word::sub(av, bv)),
                    )
                } else {
                    Expression::binary(
                        add,
                        m.expr(x).clone(),
                        Expression::constant(word::sub(bv, av)),
                    )
                }
            });
        }

        // (X - A) - B -> X - (A + B)
        rule(rules, Pattern::binary(sub, diff, b), move |m| {
            Expression::binary(
                sub,
                m.expr(x).clone(),
                Expression::constant(word::add(m.word(a), m.word(b))),
            )
        });
        // (A - X) - B -> (A - B) - X
        rule(rules, Pattern::binary(sub, Pattern::binary(sub, a, x), b), move |m| {
            Expression::binary(
                sub,
                Expression::constant(word::sub(m.word(a), m.word(b))),
                m.expr(x).clone(),
            )
        });

        // (X + A) - Y and (A + X) - Y -> (X - Y) + A
        for inner in [Pattern::binary(add, x, a), Pattern::binary(add, a, x)] {
            rule(rules, Pattern::binary(sub, inner, y), move |m| {
                Expression::binary(
                    add,
                    Expression::binary(sub, m.expr(x).clone(), m.expr(y).clone()),
                    Expression::constant(m.word(a)),
                )
            });
        }
        // X - (Y + A) and X - (A + Y) -> (X - Y) - A
        for inner in [Pattern::binary(add, y, a), Pattern::binary(add, a, y)] {
            rule(rules, Pattern::binary(sub, x, inner), move |m| {
                Expression::binary(
                    sub,
                    Expression::binary(sub, m.expr(x).clone(), m.expr(y).clone()),
                    Expression::constant(m.word(a)),
                )
            });
        }
    }
}
