use crate::error::MathError;
use crate::{BASIS_POINT_MAX, MAX_BIN_ID, MID_BIN_ID, MIN_BIN_ID, SCALE, SCALE_OFFSET};
use alloy_primitives::U256;

const MASK_128: U256 = U256::from_limbs([u64::MAX, u64::MAX, 0, 0]);

/// Exponents at or beyond this magnitude cannot produce a representable
/// Q128.128 price for any valid bin step.
const MAX_POW_EXPONENT: u64 = 1 << 20;

/// Returns `1 + bin_step / BASIS_POINT_MAX` in Q128.128, the per-bin price
/// ratio. The step must be a non-zero fraction of one.
fn base_ratio(bin_step: u16) -> Result<U256, MathError> {
    if bin_step == 0 || bin_step >= BASIS_POINT_MAX {
        return Err(MathError::InvalidBinStep);
    }
    Ok(SCALE + (U256::from(bin_step) << SCALE_OFFSET) / U256::from(BASIS_POINT_MAX))
}

/// Raises a Q128.128 value to a signed integer power by square-and-multiply,
/// inverting out-of-range intermediates so every product stays below 2^256.
///
/// Fails with `Overflow`/`Underflow` when the result cannot be represented
/// in Q128.128, which bounds the bin ids the price function can serve.
pub fn pow(x: U256, exp: i64) -> Result<U256, MathError> {
    if exp == 0 {
        return Ok(SCALE);
    }

    let abs = exp.unsigned_abs();
    if abs >= MAX_POW_EXPONENT {
        return Err(if exp > 0 {
            MathError::Overflow
        } else {
            MathError::Underflow
        });
    }

    let mut invert = exp < 0;
    let mut squared = x;
    if x > MASK_128 {
        // work with the reciprocal so repeated squaring stays below 2^128
        squared = U256::MAX / x;
        invert = !invert;
    }

    let mut result = SCALE;
    for bit in 0..20 {
        if abs & (1 << bit) != 0 {
            result = (result * squared) >> SCALE_OFFSET;
        }
        squared = (squared * squared) >> SCALE_OFFSET;
    }

    if result.is_zero() {
        return Err(if invert {
            MathError::Overflow
        } else {
            MathError::Underflow
        });
    }

    if invert {
        result = U256::MAX / result;
    }

    Ok(result)
}

/// Returns the Q128.128 price of a bin: `(1 + bin_step / 10_000)` raised to
/// `id - MID_BIN_ID`. Strictly monotonic in `id`; `MID_BIN_ID` prices at
/// exactly 1.0.
pub fn get_price_from_id(id: u32, bin_step: u16) -> Result<U256, MathError> {
    if !(MIN_BIN_ID..=MAX_BIN_ID).contains(&id) {
        return Err(MathError::IdOutOfBounds);
    }
    pow(base_ratio(bin_step)?, id as i64 - MID_BIN_ID as i64)
}

/// Returns the bin id whose price is the largest not exceeding `price`,
/// clamped to the valid id range.
///
/// Inverse of [`get_price_from_id`] on its image: a price produced by a bin
/// id maps back to that exact id.
pub fn get_id_from_price(price: U256, bin_step: u16) -> Result<u32, MathError> {
    if price.is_zero() {
        return Err(MathError::ZeroValue);
    }
    base_ratio(bin_step)?;

    let (mut lo, mut hi) = (MIN_BIN_ID, MAX_BIN_ID);
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        match get_price_from_id(mid, bin_step) {
            Ok(p) if p <= price => lo = mid,
            Ok(_) => hi = mid - 1,
            // the probe underflowed Q128.128, so its true price is below any
            // representable target
            Err(MathError::Underflow) => lo = mid,
            Err(MathError::Overflow) => hi = mid - 1,
            Err(e) => return Err(e),
        }
    }
    Ok(lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mid_bin_prices_at_one() {
        for step in [1u16, 10, 25, 100, 500] {
            assert_eq!(get_price_from_id(MID_BIN_ID, step).unwrap(), SCALE);
        }
    }

    #[test]
    fn one_bin_up_matches_the_ratio() {
        let price = get_price_from_id(MID_BIN_ID + 1, 25).unwrap();
        let ratio = base_ratio(25).unwrap();
        assert!(price > SCALE);
        // double inversion in pow costs at most a few units at the 2^128 scale
        assert!(price.abs_diff(ratio) <= U256::from(1u64 << 8));
    }

    #[test]
    fn price_is_strictly_monotonic() {
        for step in [1u16, 25, 100] {
            let mut prev = get_price_from_id(MID_BIN_ID - 600, step).unwrap();
            for id in (MID_BIN_ID - 599)..(MID_BIN_ID + 600) {
                let price = get_price_from_id(id, step).unwrap();
                assert!(price > prev, "price not increasing at id {id} step {step}");
                prev = price;
            }
        }
    }

    #[test]
    fn opposite_offsets_are_near_reciprocal() {
        let up = get_price_from_id(MID_BIN_ID + 50, 25).unwrap();
        let down = get_price_from_id(MID_BIN_ID - 50, 25).unwrap();
        let product = crate::math::math_helpers::mul_div(up, down, SCALE).unwrap();
        assert!(product.abs_diff(SCALE) <= U256::from(1u128 << 70));
    }

    #[test]
    fn rejects_invalid_ids_and_steps() {
        assert!(matches!(
            get_price_from_id(0, 25),
            Err(MathError::IdOutOfBounds)
        ));
        assert!(matches!(
            get_price_from_id(MAX_BIN_ID + 1, 25),
            Err(MathError::IdOutOfBounds)
        ));
        assert!(matches!(
            get_price_from_id(MID_BIN_ID, 0),
            Err(MathError::InvalidBinStep)
        ));
        assert!(matches!(
            get_price_from_id(MID_BIN_ID, BASIS_POINT_MAX),
            Err(MathError::InvalidBinStep)
        ));
    }

    #[test]
    fn extreme_ids_fail_instead_of_saturating() {
        // a huge step at the bottom of the id space underflows Q128.128
        assert!(matches!(
            get_price_from_id(MIN_BIN_ID, 9_999),
            Err(MathError::Underflow)
        ));
    }

    #[test]
    fn id_price_round_trip() {
        // widest offset per step that still yields a representable price
        for (step, reach) in [(1u16, 500_000u32), (10, 50_000), (25, 20_000), (100, 8_000)] {
            for offset in [0u32, 1, 37, 1_000, reach] {
                for id in [MID_BIN_ID - offset, MID_BIN_ID + offset] {
                    let price = get_price_from_id(id, step).unwrap();
                    assert_eq!(get_id_from_price(price, step).unwrap(), id);
                }
            }
        }
    }

    #[test]
    fn id_from_price_floors_between_bins() {
        let price = get_price_from_id(MID_BIN_ID + 3, 25).unwrap();
        assert_eq!(
            get_id_from_price(price + U256::ONE, 25).unwrap(),
            MID_BIN_ID + 3
        );
        assert_eq!(
            get_id_from_price(price - U256::ONE, 25).unwrap(),
            MID_BIN_ID + 2
        );
    }

    #[test]
    fn id_from_price_rejects_zero() {
        assert!(matches!(
            get_id_from_price(U256::ZERO, 25),
            Err(MathError::ZeroValue)
        ));
    }
}
