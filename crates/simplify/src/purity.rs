//! Side-effect classification for removing rewrites.
//!
//! Rules that drop a wildcard-bound subterm are only admissible when
//! the dropped term is pure. Opcode nodes are classified intrinsically;
//! opaque leaves are looked up in a caller-supplied oracle, and an
//! absent entry is treated as impure.

use eth_expr_data::{Expression, OpaqueId};
use std::collections::HashMap;
use std::hash::BuildHasher;

/// Caller-supplied purity information for opaque leaves.
pub trait PurityOracle {
    /// `Some(true)` if the leaf is known pure, `Some(false)` if known
    /// impure, `None` when the oracle has no entry (treated as impure).
    fn is_pure(&self, id: OpaqueId) -> Option<bool>;
}

/// Oracle with no entries; every opaque leaf counts as impure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPurityInfo;

impl PurityOracle for NoPurityInfo {
    fn is_pure(&self, _id: OpaqueId) -> Option<bool> {
        None
    }
}

impl<S: BuildHasher> PurityOracle for HashMap<OpaqueId, bool, S> {
    fn is_pure(&self, id: OpaqueId) -> Option<bool> {
        self.get(&id).copied()
    }
}

/// Whether discarding `expr` from the program is unobservable.
pub fn is_pure(expr: &Expression, oracle: &dyn PurityOracle) -> bool {
    match expr {
        Expression::Const(_) => true,
        Expression::Op(code, args) => {
            !code.may_have_side_effects() && args.iter().all(|arg| is_pure(arg, oracle))
        }
        Expression::Opaque(id) => oracle.is_pure(*id).unwrap_or(false),
    }
}
