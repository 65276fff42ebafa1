use crate::error::MathError;
use crate::SCALE;
use alloy_primitives::U256;

const U256_ONE: U256 = U256::ONE;
const U256_TWO: U256 = U256::from_limbs([2, 0, 0, 0]);
const U256_THREE: U256 = U256::from_limbs([3, 0, 0, 0]);

/// Computes `a * b / denominator` with full 512-bit intermediate precision,
/// returning a `MathError` on overflow or division by zero.
///
/// This mirrors the classic `FullMath.mulDiv` construction via the mulmod
/// identity and underpins the price, fee, and share calculations.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }

    // 512-bit product a * b = prod1 * 2^256 + prod0.
    let mm = a.mul_mod(b, U256::MAX);
    let prod0 = a.wrapping_mul(b);
    let (mut prod1, borrow) = mm.overflowing_sub(prod0);
    if borrow {
        prod1 = prod1.wrapping_sub(U256_ONE);
    }

    if prod1.is_zero() {
        return Ok(prod0.wrapping_div(denominator));
    }

    if denominator <= prod1 {
        return Err(MathError::Overflow);
    }

    // Subtract the remainder from the 512-bit product so it divides exactly.
    let remainder = a.mul_mod(b, denominator);
    let (mut prod0, borrow) = prod0.overflowing_sub(remainder);
    let mut prod1 = prod1;
    if borrow {
        prod1 = prod1.wrapping_sub(U256_ONE);
    }

    // Factor powers of two out of the denominator.
    let twos = denominator & denominator.wrapping_neg();
    let denominator = denominator.wrapping_div(twos);
    prod0 = prod0.wrapping_div(twos);

    let twos_comp = twos
        .wrapping_neg()
        .wrapping_div(twos)
        .wrapping_add(U256_ONE);
    prod0 |= prod1.wrapping_mul(twos_comp);

    // Invert the odd denominator mod 2^256 by Newton-Raphson; six rounds
    // double the correct bits from 8 past 256.
    let mut inv = U256_THREE.wrapping_mul(denominator) ^ U256_TWO;
    for _ in 0..6 {
        inv = inv.wrapping_mul(U256_TWO.wrapping_sub(denominator.wrapping_mul(inv)));
    }

    Ok(prod0.wrapping_mul(inv))
}

/// Like [`mul_div`], but rounds the result up when there is a non-zero
/// remainder, returning an overflow error if the result would exceed
/// `U256::MAX`.
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    let mut result = mul_div(a, b, denominator)?;

    if a.mul_mod(b, denominator) > U256::ZERO {
        if result == U256::MAX {
            return Err(MathError::Overflow);
        }
        result += U256::ONE;
    }
    Ok(result)
}

/// Divides `a` by `b`, rounding the result up to the next integer when there
/// is a non-zero remainder.
///
/// This will panic on division by zero, mirroring primitive integer division,
/// so callers must ensure `b != 0`.
pub fn div_rounding_up(a: U256, b: U256) -> U256 {
    let (quotient, remainder) = a.div_rem(b);
    if remainder.is_zero() {
        quotient
    } else {
        quotient + U256::ONE
    }
}

/// Computes `a * b >> 128`, rounding down. The Q128.128 product of a raw
/// amount and a price.
pub fn mul_shift_rounding_down(a: U256, b: U256) -> Result<U256, MathError> {
    mul_div(a, b, SCALE)
}

/// Computes `a * b >> 128`, rounding up.
pub fn mul_shift_rounding_up(a: U256, b: U256) -> Result<U256, MathError> {
    mul_div_rounding_up(a, b, SCALE)
}

/// Computes `(a << 128) / b`, rounding down. Divides a raw amount by a
/// Q128.128 price.
pub fn shift_div_rounding_down(a: U256, b: U256) -> Result<U256, MathError> {
    mul_div(a, SCALE, b)
}

/// Computes `(a << 128) / b`, rounding up.
pub fn shift_div_rounding_up(a: U256, b: U256) -> Result<U256, MathError> {
    mul_div_rounding_up(a, SCALE, b)
}

/// Narrows a `U256` to `u128`, erroring when the upper half is populated.
pub fn to_u128(x: U256) -> Result<u128, MathError> {
    let limbs = x.as_limbs();
    if limbs[2] != 0 || limbs[3] != 0 {
        return Err(MathError::Overflow);
    }
    Ok(((limbs[1] as u128) << 64) | limbs[0] as u128)
}

/// Narrows a `U256` to `u128`, saturating at `u128::MAX`.
pub fn to_u128_saturating(x: U256) -> u128 {
    let limbs = x.as_limbs();
    if limbs[2] != 0 || limbs[3] != 0 {
        return u128::MAX;
    }
    ((limbs[1] as u128) << 64) | limbs[0] as u128
}
