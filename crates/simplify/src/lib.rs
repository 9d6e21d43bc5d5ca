//! Peephole algebraic simplifier for 256-bit stack-machine expressions.
//!
//! Rewrites an expression tree into an equivalent but cheaper one by
//! repeatedly matching it against an ordered rule catalog: constant
//! folding, unit and absorber identities, bit-mask strength reduction,
//! and constant motion through the associative operators.
//!
//! Usage shape:
//! - `build_catalog` once per placeholder environment, then share it
//!   read-only;
//! - `simplify` per term, together with a caller-supplied
//!   [`PurityOracle`] describing which opaque subterms are safe to
//!   discard. Rewrites that would drop a possibly effectful subterm do
//!   not fire.

mod pattern;
mod purity;
mod rewriter;
mod rules;

pub use crate::{
    pattern::{Bindings, Pattern, Placeholder, PlaceholderEnv, PlaceholderId, PlaceholderKind},
    purity::{is_pure, NoPurityInfo, PurityOracle},
    rewriter::{simplify, Simplified},
    rules::{build_catalog, Catalog, RuleId, SimplificationRule},
};

#[cfg(test)]
mod tests;
