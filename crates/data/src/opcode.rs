//! The operator set of the expression algebra.
//!
//! A closed enumeration of the EVM-like opcodes that can appear as
//! interior nodes of an expression tree. Arity and side-effect
//! classification are fixed per opcode; the rewriter only ever holds
//! rules for the algebraic core, everything else flows through
//! untouched.

use std::fmt;

/// All opcodes the expression algebra knows about. Modeled as
/// - Arithmetic (including the overflow-checking signed variants the
///   front end lowers checked operators to)
/// - Comparison & Bitwise Logic
/// - Environment reads that are constant within one rewrite scope
/// - State reads and calls that may observe or change mutable state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Opcode {
    // ========== Arithmetic ==========
    Add,
    Mul,
    Sub,
    Div,
    SDiv,
    Mod,
    SMod,
    AddMod,
    MulMod,
    Exp,
    SignExtend,

    // Overflow-checking signed variants. These trap when the unchecked
    // result would wrap, so they count as effectful below.
    SAdd,
    SSub,
    SMul,

    // ========== Comparison & Bitwise Logic ==========
    Lt,
    Gt,
    SLt,
    SGt,
    Eq,
    IsZero,
    And,
    Or,
    Xor,
    Not,
    Byte,
    Shl,
    Shr,
    Sar,

    // ========== Environment (fixed within a rewrite scope) ==========
    Address,
    Caller,
    Origin,
    Coinbase,
    CallValue,
    CallDataLoad,
    CallDataSize,
    Timestamp,
    Number,
    GasLimit,
    ChainId,

    // ========== State reads and calls ==========
    Keccak256,
    Balance,
    SelfBalance,
    ExtCodeSize,
    ExtCodeHash,
    BlockHash,
    Gas,
    MLoad,
    SLoad,
    TLoad,
    Create,
    Create2,
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
}

impl Opcode {
    /// Every opcode, in declaration order.
    pub const ALL: &'static [Opcode] = {
        use Opcode as O;
        &[
            O::Add,
            O::Mul,
            O::Sub,
            O::Div,
            O::SDiv,
            O::Mod,
            O::SMod,
            O::AddMod,
            O::MulMod,
            O::Exp,
            O::SignExtend,
            O::SAdd,
            O::SSub,
            O::SMul,
            O::Lt,
            O::Gt,
            O::SLt,
            O::SGt,
            O::Eq,
            O::IsZero,
            O::And,
            O::Or,
            O::Xor,
            O::Not,
            O::Byte,
            O::Shl,
            O::Shr,
            O::Sar,
            O::Address,
            O::Caller,
            O::Origin,
            O::Coinbase,
            O::CallValue,
            O::CallDataLoad,
            O::CallDataSize,
            O::Timestamp,
            O::Number,
            O::GasLimit,
            O::ChainId,
            O::Keccak256,
            O::Balance,
            O::SelfBalance,
            O::ExtCodeSize,
            O::ExtCodeHash,
            O::BlockHash,
            O::Gas,
            O::MLoad,
            O::SLoad,
            O::TLoad,
            O::Create,
            O::Create2,
            O::Call,
            O::CallCode,
            O::DelegateCall,
            O::StaticCall,
        ]
    };

    /// Number of argument subterms an interior node with this opcode
    /// carries.
    pub const fn arity(self) -> usize {
        use Opcode as O;
        match self {
            O::Address
            | O::Caller
            | O::Origin
            | O::Coinbase
            | O::CallValue
            | O::CallDataSize
            | O::Timestamp
            | O::Number
            | O::GasLimit
            | O::ChainId
            | O::SelfBalance
            | O::Gas => 0,

            O::IsZero
            | O::Not
            | O::CallDataLoad
            | O::Balance
            | O::ExtCodeSize
            | O::ExtCodeHash
            | O::BlockHash
            | O::MLoad
            | O::SLoad
            | O::TLoad => 1,

            O::Add
            | O::Mul
            | O::Sub
            | O::Div
            | O::SDiv
            | O::Mod
            | O::SMod
            | O::Exp
            | O::SignExtend
            | O::SAdd
            | O::SSub
            | O::SMul
            | O::Lt
            | O::Gt
            | O::SLt
            | O::SGt
            | O::Eq
            | O::And
            | O::Or
            | O::Xor
            | O::Byte
            | O::Shl
            | O::Shr
            | O::Sar
            | O::Keccak256 => 2,

            O::AddMod | O::MulMod | O::Create => 3,
            O::Create2 => 4,
            O::DelegateCall | O::StaticCall => 6,
            O::Call | O::CallCode => 7,
        }
    }

    /// Whether evaluating a node with this opcode can read mutable
    /// state, trap, or otherwise be observable. Discarding such a node
    /// changes program behaviour, so removing rewrites must not drop
    /// one. The checked arithmetic variants are included because they
    /// trap on overflow.
    pub const fn may_have_side_effects(self) -> bool {
        use Opcode as O;
        matches!(
            self,
            O::SAdd
                | O::SSub
                | O::SMul
                | O::Keccak256
                | O::Balance
                | O::SelfBalance
                | O::ExtCodeSize
                | O::ExtCodeHash
                | O::BlockHash
                | O::Gas
                | O::MLoad
                | O::SLoad
                | O::TLoad
                | O::Create
                | O::Create2
                | O::Call
                | O::CallCode
                | O::DelegateCall
                | O::StaticCall
        )
    }

    /// Lower-case assembly-style name.
    pub const fn mnemonic(self) -> &'static str {
        use Opcode as O;
        match self {
            O::Add => "add",
            O::Mul => "mul",
            O::Sub => "sub",
            O::Div => "div",
            O::SDiv => "sdiv",
            O::Mod => "mod",
            O::SMod => "smod",
            O::AddMod => "addmod",
            O::MulMod => "mulmod",
            O::Exp => "exp",
            O::SignExtend => "signextend",
            O::SAdd => "sadd",
            O::SSub => "ssub",
            O::SMul => "smul",
            O::Lt => "lt",
            O::Gt => "gt",
            O::SLt => "slt",
            O::SGt => "sgt",
            O::Eq => "eq",
            O::IsZero => "iszero",
            O::And => "and",
            O::Or => "or",
            O::Xor => "xor",
            O::Not => "not",
            O::Byte => "byte",
            O::Shl => "shl",
            O::Shr => "shr",
            O::Sar => "sar",
            O::Address => "address",
            O::Caller => "caller",
            O::Origin => "origin",
            O::Coinbase => "coinbase",
            O::CallValue => "callvalue",
            O::CallDataLoad => "calldataload",
            O::CallDataSize => "calldatasize",
            O::Timestamp => "timestamp",
            O::Number => "number",
            O::GasLimit => "gaslimit",
            O::ChainId => "chainid",
            O::Keccak256 => "keccak256",
            O::Balance => "balance",
            O::SelfBalance => "selfbalance",
            O::ExtCodeSize => "extcodesize",
            O::ExtCodeHash => "extcodehash",
            O::BlockHash => "blockhash",
            O::Gas => "gas",
            O::MLoad => "mload",
            O::SLoad => "sload",
            O::TLoad => "tload",
            O::Create => "create",
            O::Create2 => "create2",
            O::Call => "call",
            O::CallCode => "callcode",
            O::DelegateCall => "delegatecall",
            O::StaticCall => "staticcall",
        }
    }

    /// Reverse of [`Opcode::mnemonic`], case-insensitive.
    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        let lower = name.to_ascii_lowercase();
        Opcode::ALL.iter().copied().find(|op| op.mnemonic() == lower)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
