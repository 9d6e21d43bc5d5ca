//! 256-bit machine arithmetic.
//!
//! Every operation here is total and wraps modulo 2^256, mirroring the
//! target machine exactly: division and modulus by zero yield zero,
//! signed operations act on the two's-complement view of the same bits.
//! Comparison results are materialised as words (0 or 1) so that folded
//! subterms stay in the word domain.

use alloy_primitives::{I256, U256};

/// Largest shift distance that does not zero the operand.
const MAX_SHIFT: usize = 255;

pub fn add(a: U256, b: U256) -> U256 {
    a.wrapping_add(b)
}

pub fn sub(a: U256, b: U256) -> U256 {
    a.wrapping_sub(b)
}

pub fn mul(a: U256, b: U256) -> U256 {
    a.wrapping_mul(b)
}

/// Unsigned division; `b == 0` yields zero.
pub fn udiv(a: U256, b: U256) -> U256 {
    a.checked_div(b).unwrap_or_default()
}

/// Signed division on the two's-complement view; `MIN / -1` wraps back
/// to `MIN` and `b == 0` yields zero.
pub fn sdiv(a: U256, b: U256) -> U256 {
    let b = I256::from_raw(b);
    if b.is_zero() {
        return U256::ZERO;
    }
    I256::from_raw(a).wrapping_div(b).into_raw()
}

/// Unsigned modulus; `b == 0` yields zero.
pub fn umod(a: U256, b: U256) -> U256 {
    a.checked_rem(b).unwrap_or_default()
}

/// Signed truncated remainder, result takes the sign of the dividend.
pub fn smod(a: U256, b: U256) -> U256 {
    let b = I256::from_raw(b);
    if b.is_zero() {
        return U256::ZERO;
    }
    I256::from_raw(a).wrapping_rem(b).into_raw()
}

pub fn not(a: U256) -> U256 {
    !a
}

pub fn and(a: U256, b: U256) -> U256 {
    a & b
}

pub fn or(a: U256, b: U256) -> U256 {
    a | b
}

pub fn xor(a: U256, b: U256) -> U256 {
    a ^ b
}

pub fn lt(a: U256, b: U256) -> U256 {
    U256::from(a < b)
}

pub fn gt(a: U256, b: U256) -> U256 {
    U256::from(a > b)
}

pub fn slt(a: U256, b: U256) -> U256 {
    U256::from(I256::from_raw(a) < I256::from_raw(b))
}

pub fn sgt(a: U256, b: U256) -> U256 {
    U256::from(I256::from_raw(a) > I256::from_raw(b))
}

pub fn eq(a: U256, b: U256) -> U256 {
    U256::from(a == b)
}

pub fn iszero(a: U256) -> U256 {
    U256::from(a.is_zero())
}

/// Shift `value` left by `shift` bits; distances above 255 yield zero.
pub fn shl(shift: U256, value: U256) -> U256 {
    if shift > U256::from(MAX_SHIFT) {
        return U256::ZERO;
    }
    value << shift.to::<usize>()
}

/// Shift `value` right (logical) by `shift` bits; distances above 255
/// yield zero.
pub fn shr(shift: U256, value: U256) -> U256 {
    if shift > U256::from(MAX_SHIFT) {
        return U256::ZERO;
    }
    value >> shift.to::<usize>()
}

/// `a^b mod 2^256` by modular exponentiation.
pub fn exp(a: U256, b: U256) -> U256 {
    a.pow(b)
}

/// `(a + b) % n` computed without intermediate truncation; `n == 0`
/// yields zero.
pub fn addmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        return U256::ZERO;
    }
    a.add_mod(b, n)
}

/// `(a * b) % n` computed without intermediate truncation; `n == 0`
/// yields zero.
pub fn mulmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        return U256::ZERO;
    }
    a.mul_mod(b, n)
}

/// Sign-extend `x` from the byte at index `i` (0 = least significant).
/// Indices of 31 and above leave `x` unchanged.
pub fn signextend(i: U256, x: U256) -> U256 {
    if i >= U256::from(31u8) {
        return x;
    }
    let sign_bit = i.to::<usize>() * 8 + 7;
    let mask = (U256::ONE << sign_bit) - U256::ONE;
    if x.bit(sign_bit) { x | !mask } else { x & mask }
}

/// Byte `i` of `x`, counting from the most significant end; indices of
/// 32 and above yield zero.
pub fn byte(i: U256, x: U256) -> U256 {
    if i >= U256::from(32u8) {
        return U256::ZERO;
    }
    (x >> (8 * (31 - i.to::<usize>()))) & U256::from(0xffu8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(v: u64) -> U256 {
        U256::from(v)
    }

    const MIN_SIGNED: U256 = U256::from_limbs([0, 0, 0, 0x8000_0000_0000_0000]);

    #[test]
    fn wrapping_ring_ops() {
        assert_eq!(add(U256::MAX, w(1)), U256::ZERO);
        assert_eq!(sub(U256::ZERO, w(1)), U256::MAX);
        assert_eq!(mul(U256::MAX, w(2)), U256::MAX - w(1));
        assert_eq!(exp(w(2), w(256)), U256::ZERO);
        assert_eq!(exp(w(3), w(4)), w(81));
    }

    #[test]
    fn division_by_zero_is_zero() {
        assert_eq!(udiv(w(100), U256::ZERO), U256::ZERO);
        assert_eq!(umod(w(100), U256::ZERO), U256::ZERO);
        assert_eq!(sdiv(w(100), U256::ZERO), U256::ZERO);
        assert_eq!(smod(w(100), U256::ZERO), U256::ZERO);
    }

    #[test]
    fn signed_division_wraps_at_min() {
        // MIN / -1 cannot be represented and wraps back to MIN.
        assert_eq!(sdiv(MIN_SIGNED, U256::MAX), MIN_SIGNED);
        // -8 / 2 == -4
        let minus_8 = sub(U256::ZERO, w(8));
        let minus_4 = sub(U256::ZERO, w(4));
        assert_eq!(sdiv(minus_8, w(2)), minus_4);
    }

    #[test]
    fn signed_remainder_takes_dividend_sign() {
        let minus_7 = sub(U256::ZERO, w(7));
        let minus_1 = sub(U256::ZERO, w(1));
        assert_eq!(smod(minus_7, w(3)), minus_1);
        assert_eq!(smod(w(7), minus_1.wrapping_mul(w(3))), w(1));
    }

    #[test]
    fn signed_comparisons() {
        let minus_1 = U256::MAX;
        assert_eq!(slt(minus_1, w(0)), w(1));
        assert_eq!(sgt(w(0), minus_1), w(1));
        assert_eq!(lt(minus_1, w(0)), w(0));
        assert_eq!(gt(minus_1, w(0)), w(1));
    }

    #[test]
    fn shifts_beyond_width_are_zero() {
        assert_eq!(shl(w(255), w(1)), MIN_SIGNED);
        assert_eq!(shl(w(256), w(1)), U256::ZERO);
        assert_eq!(shr(w(256), U256::MAX), U256::ZERO);
        assert_eq!(shr(U256::MAX, w(1)), U256::ZERO);
        assert_eq!(shr(w(4), w(0x100)), w(0x10));
    }

    #[test]
    fn wide_modular_ops_do_not_truncate() {
        // (MAX + MAX) % MAX == 0, but only when the sum is kept wide.
        assert_eq!(addmod(U256::MAX, U256::MAX, U256::MAX), U256::ZERO);
        assert_eq!(addmod(U256::MAX, w(2), U256::MAX), w(2));
        // 2^256 ≡ 2 (mod 7), so MAX ≡ 1 (mod 7) and MAX·MAX ≡ 1.
        assert_eq!(mulmod(U256::MAX, U256::MAX, w(7)), w(1));
        assert_eq!(addmod(w(10), w(20), U256::ZERO), U256::ZERO);
        assert_eq!(mulmod(w(10), w(20), U256::ZERO), U256::ZERO);
    }

    #[test]
    fn sign_extension() {
        assert_eq!(signextend(w(0), w(0xff)), U256::MAX);
        assert_eq!(signextend(w(0), w(0x7f)), w(0x7f));
        assert_eq!(signextend(w(1), w(0x80ff)), sub(U256::ZERO, w(0x7f01)));
        assert_eq!(signextend(w(31), U256::MAX), U256::MAX);
        assert_eq!(signextend(U256::MAX, w(0x80)), w(0x80));
    }

    #[test]
    fn byte_extraction() {
        assert_eq!(byte(w(31), w(0xabcd)), w(0xcd));
        assert_eq!(byte(w(30), w(0xabcd)), w(0xab));
        assert_eq!(byte(w(0), w(0xabcd)), U256::ZERO);
        assert_eq!(byte(w(0), U256::MAX), w(0xff));
        assert_eq!(byte(w(32), U256::MAX), U256::ZERO);
    }
}
