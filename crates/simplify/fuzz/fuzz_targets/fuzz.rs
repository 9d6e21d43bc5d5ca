#![no_main]

use alloy_primitives::U256;
use eth_expr_data::{Expression, Opcode};
use eth_expr_simplify::{build_catalog, simplify, NoPurityInfo, PlaceholderEnv};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let term = TermGenerator::new(data).generate(0);
    TermTester::new().test_term(term);
});

mod config {
    pub const MAX_DEPTH: u8 = 6;
    pub const OPAQUE_IDS: u64 = 4;
}

// Builds an arbitrary algebraic term directly from fuzzer bytes.
struct TermGenerator<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> TermGenerator<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn next_byte(&mut self) -> u8 {
        if self.offset >= self.data.len() {
            return 0;
        }
        let byte = self.data[self.offset];
        self.offset += 1;
        byte
    }

    fn next_word(&mut self) -> U256 {
        match self.next_byte() % 4 {
            0 => U256::ZERO,
            1 => U256::from(self.next_byte()),
            2 => U256::ONE << (self.next_byte() as usize % 256),
            _ => U256::MAX,
        }
    }

    fn leaf(&mut self) -> Expression {
        if self.next_byte() % 2 == 0 {
            Expression::Const(self.next_word())
        } else {
            Expression::opaque(self.next_byte() as u64 % config::OPAQUE_IDS)
        }
    }

    fn generate(&mut self, depth: u8) -> Expression {
        use Opcode as O;

        if depth >= config::MAX_DEPTH || self.offset >= self.data.len() {
            return self.leaf();
        }

        match self.next_byte() % 26 {
            0 => self.leaf(),
            1 => Expression::unary(O::IsZero, self.generate(depth + 1)),
            2 => Expression::unary(O::Not, self.generate(depth + 1)),
            3 => self.binary(O::Add, depth),
            4 => self.binary(O::Sub, depth),
            5 => self.binary(O::Mul, depth),
            6 => self.binary(O::Div, depth),
            7 => self.binary(O::SDiv, depth),
            8 => self.binary(O::Mod, depth),
            9 => self.binary(O::SMod, depth),
            10 => self.binary(O::Exp, depth),
            11 => self.binary(O::SignExtend, depth),
            12 => self.binary(O::Lt, depth),
            13 => self.binary(O::Gt, depth),
            14 => self.binary(O::SLt, depth),
            15 => self.binary(O::SGt, depth),
            16 => self.binary(O::Eq, depth),
            17 => self.binary(O::And, depth),
            18 => self.binary(O::Or, depth),
            19 => self.binary(O::Xor, depth),
            20 => self.binary(O::Byte, depth),
            21 => self.binary(O::Shl, depth),
            22 => self.binary(O::Shr, depth),
            23 => self.ternary(O::AddMod, depth),
            24 => self.ternary(O::MulMod, depth),
            _ => Expression::nullary(
                [O::Address, O::Caller, O::Origin, O::Coinbase]
                    [self.next_byte() as usize % 4],
            ),
        }
    }

    fn binary(&mut self, code: Opcode, depth: u8) -> Expression {
        Expression::binary(code, self.generate(depth + 1), self.generate(depth + 1))
    }

    fn ternary(&mut self, code: Opcode, depth: u8) -> Expression {
        Expression::ternary(
            code,
            self.generate(depth + 1),
            self.generate(depth + 1),
            self.generate(depth + 1),
        )
    }
}

struct TermTester;

impl TermTester {
    fn new() -> Self {
        Self
    }

    // We are hunting panics, non-convergence, and malformed output.
    fn test_term(&self, term: Expression) {
        let catalog = build_catalog(PlaceholderEnv::new());

        let out = simplify(term.clone(), &catalog, &NoPurityInfo);
        assert!(!out.budget_exhausted, "budget exhausted on {term}");
        Self::assert_arities(&out.expr);

        let again = simplify(out.expr.clone(), &catalog, &NoPurityInfo);
        assert_eq!(again.expr, out.expr, "not a fixed point: {term}");
        assert_eq!(again.rewrites, 0);
    }

    fn assert_arities(expr: &Expression) {
        if let Expression::Op(code, args) = expr {
            assert_eq!(args.len(), code.arity(), "bad arity in {expr}");
            args.iter().for_each(Self::assert_arities);
        }
    }
}
