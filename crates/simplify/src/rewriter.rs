//! Fixed-point application of the rule catalog.
//!
//! Terms are rewritten bottom-up: children reach their fixed point
//! first, then the node itself is scanned against the catalog until no
//! rule fires. Every firing either shrinks the term or floats a
//! constant outward, so the loop converges; a fuel counter bounds it
//! anyway, and running dry is reported as a diagnostic on the result
//! instead of an error.

use crate::pattern::{Bindings, PlaceholderKind};
use crate::purity::{is_pure, PurityOracle};
use crate::rules::{Catalog, SimplificationRule};
use eth_expr_data::Expression;

/// Budget floor so small terms never starve mid-scan.
const MIN_FUEL: usize = 64;

/// Outcome of a simplification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simplified {
    /// Best term reached.
    pub expr: Expression,
    /// Number of rule firings performed.
    pub rewrites: usize,
    /// Set when the rewrite budget ran out before a fixed point. The
    /// catalog is designed so this never happens; callers should log it
    /// as a bug and keep going with `expr`.
    pub budget_exhausted: bool,
}

/// Rewrite `expr` to a fixed point of `catalog`. The catalog and
/// oracle are only read, so concurrent calls on disjoint terms may
/// share both.
pub fn simplify(expr: Expression, catalog: &Catalog, oracle: &dyn PurityOracle) -> Simplified {
    let fuel = expr.node_count().saturating_mul(catalog.len()).max(MIN_FUEL);
    let mut rewriter = Rewriter {
        catalog,
        oracle,
        binds: Bindings::new(),
        fuel,
        rewrites: 0,
        budget_exhausted: false,
    };
    let expr = rewriter.simplify_term(expr);
    Simplified { expr, rewrites: rewriter.rewrites, budget_exhausted: rewriter.budget_exhausted }
}

struct Rewriter<'a> {
    catalog: &'a Catalog,
    oracle: &'a dyn PurityOracle,
    /// Recycled across match attempts.
    binds: Bindings,
    fuel: usize,
    rewrites: usize,
    budget_exhausted: bool,
}

impl Rewriter<'_> {
    /// Bring `expr` to a fixed point: children first, then catalog
    /// scans at this node; a firing restarts the cycle on the
    /// replacement.
    fn simplify_term(&mut self, expr: Expression) -> Expression {
        let mut current = self.simplify_children(expr);
        while matches!(current, Expression::Op(..)) {
            match self.fire_first_match(&current) {
                Some(replacement) => current = self.simplify_children(replacement),
                None => break,
            }
        }
        current
    }

    fn simplify_children(&mut self, expr: Expression) -> Expression {
        match expr {
            Expression::Op(code, args) => {
                let args = args.into_iter().map(|arg| self.simplify_term(arg)).collect();
                Expression::Op(code, args)
            }
            leaf => leaf,
        }
    }

    /// One ordered catalog scan; the first admissible match wins.
    fn fire_first_match(&mut self, expr: &Expression) -> Option<Expression> {
        if self.budget_exhausted {
            return None;
        }
        for rule in self.catalog.rules().iter() {
            self.binds.clear();
            if !rule.pattern().match_into(expr, &mut self.binds) {
                continue;
            }
            let replacement = rule.build(&self.binds);
            if !self.removal_admissible(rule, &replacement) {
                continue;
            }
            if self.fuel == 0 {
                self.budget_exhausted = true;
                return None;
            }
            self.fuel -= 1;
            self.rewrites += 1;
            return Some(replacement);
        }
        None
    }

    /// A removing rule may only fire when every wildcard binding that
    /// loses copies between pattern and replacement is pure. A term
    /// that reappears as often as it was matched is not being dropped.
    fn removal_admissible(&self, rule: &SimplificationRule, replacement: &Expression) -> bool {
        if !rule.removes_nonconstant() {
            return true;
        }
        self.binds.iter().all(|(ph, bound)| {
            if ph.kind != PlaceholderKind::Wildcard {
                return true;
            }
            let matched = rule.pattern().count_placeholder(*ph);
            let kept = replacement.occurrences_of(bound);
            kept >= matched || is_pure(bound, self.oracle)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Pattern, PlaceholderEnv};
    use crate::purity::NoPurityInfo;
    use crate::rules::{Catalog, SimplificationRule};
    use eth_expr_data::{Expression, Opcode as O};
    use index_vec::index_vec;

    #[test]
    fn untouched_terms_come_back_unchanged() {
        let catalog = Catalog::build(PlaceholderEnv::new());
        let term = Expression::unary(O::SLoad, Expression::opaque(0));
        let out = simplify(term.clone(), &catalog, &NoPurityInfo);
        assert_eq!(out.expr, term);
        assert_eq!(out.rewrites, 0);
        assert!(!out.budget_exhausted);
    }

    #[test]
    fn leaves_are_already_fixed_points() {
        let catalog = Catalog::build(PlaceholderEnv::new());
        for term in [Expression::constant(alloy_primitives::U256::from(42u64)), Expression::opaque(9)] {
            let out = simplify(term.clone(), &catalog, &NoPurityInfo);
            assert_eq!(out.expr, term);
            assert_eq!(out.rewrites, 0);
        }
    }

    #[test]
    fn diverging_catalog_exhausts_budget_and_still_returns() {
        // A hand-built rule that swaps operands forever; the real
        // catalog never cycles, this pins down the backstop.
        let env = PlaceholderEnv::new();
        let (x, y) = (env.x, env.y);
        let swap = SimplificationRule::new(Pattern::binary(O::Add, x, y), false, move |m| {
            Expression::binary(O::Add, m.expr(y).clone(), m.expr(x).clone())
        });
        let catalog = Catalog::from_rules(env, index_vec![swap]);

        let term = Expression::binary(O::Add, Expression::opaque(0), Expression::opaque(1));
        let out = simplify(term, &catalog, &NoPurityInfo);
        assert!(out.budget_exhausted);
        assert!(out.rewrites >= MIN_FUEL);
        // The best-effort term is still a well-formed ADD of both
        // operands.
        match &out.expr {
            Expression::Op(O::Add, args) => assert_eq!(args.len(), 2),
            other => panic!("unexpected shape {other}"),
        }
    }
}
