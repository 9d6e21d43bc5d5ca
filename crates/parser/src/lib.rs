//! Reader for the textual term form.
//!
//! Accepts exactly what `Display` on [`Expression`] writes: operator
//! applications as `(add #0 0x7)`, nullary opcodes bare (`address`),
//! opaque leaves as `#id`, constants in decimal or `0x` hex. Only test
//! suites and debugging sessions go through text; programs hand the
//! simplifier built terms directly.

use alloy_primitives::U256;
use chumsky::prelude::*;
use eth_expr_data::{Expression, Opcode};
use std::fmt::Write;

pub type ParseError = Simple<char>;

/// Parse a single term; the whole input must be consumed.
pub fn parse(source: &str) -> Result<Expression, Vec<ParseError>> {
    term().then_ignore(end()).parse(source)
}

/// Parse, panicking with rendered errors on failure.
pub fn parse_or_panic(source: &str) -> Expression {
    parse(source).unwrap_or_else(|errors| {
        let mut rendered = String::new();
        for error in &errors {
            writeln!(rendered, "  {:?}: {}", error.span(), error).expect("write to string");
        }
        panic!("failed to parse term {source:?}:\n{rendered}")
    })
}

fn term() -> impl Parser<char, Expression, Error = ParseError> {
    recursive(|term| {
        let opaque = just('#').ignore_then(text::int(10)).try_map(|digits: String, span| {
            digits
                .parse::<u64>()
                .map(Expression::opaque)
                .map_err(|err| Simple::custom(span, format!("bad opaque id: {err}")))
        });

        let hex = just("0x").ignore_then(text::digits(16)).try_map(|digits: String, span| {
            U256::from_str_radix(&digits, 16)
                .map(Expression::Const)
                .map_err(|err| Simple::custom(span, format!("bad hex literal: {err}")))
        });

        let dec = text::int(10).try_map(|digits: String, span| {
            U256::from_str_radix(&digits, 10)
                .map(Expression::Const)
                .map_err(|err| Simple::custom(span, format!("bad literal: {err}")))
        });

        let mnemonic = text::ident().try_map(|name: String, span| {
            Opcode::from_mnemonic(&name)
                .ok_or_else(|| Simple::custom(span, format!("unknown operator {name:?}")))
        });

        let application = mnemonic
            .clone()
            .padded()
            .then(term.padded().repeated())
            .delimited_by(just('('), just(')'))
            .try_map(|(code, args), span| {
                Expression::op(code, args).map_err(|err| Simple::custom(span, err.to_string()))
            });

        let bare = mnemonic.try_map(|code, span| {
            Expression::op(code, Vec::new())
                .map_err(|err| Simple::custom(span, err.to_string()))
        });

        choice((application, opaque, hex, dec, bare)).padded()
    })
}
