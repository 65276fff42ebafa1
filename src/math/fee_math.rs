use crate::error::MathError;
use crate::math::math_helpers::{div_rounding_up, to_u128};
use crate::BASIS_POINT_MAX;
use alloy_primitives::U256;

/// Cap on the liquidity-provider fee rate, in basis points (10%).
pub const MAX_LP_FEE: u16 = 1_000;

/// Cap on each per-direction protocol sub-rate, in basis points (0.25%).
pub const MAX_PROTOCOL_FEE: u16 = 25;

/// Two per-direction protocol sub-rates packed into one integer: bits 0..16
/// hold the rate charged on X-to-Y swaps, bits 16..32 the Y-to-X rate. Both
/// are basis points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProtocolFee(u32);

impl ProtocolFee {
    pub const ZERO: Self = Self(0);

    /// Packs the two per-direction sub-rates.
    pub fn new(fee_x_to_y: u16, fee_y_to_x: u16) -> Self {
        Self(((fee_y_to_x as u32) << 16) | fee_x_to_y as u32)
    }

    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    /// The sub-rate charged for the given swap direction
    /// (`swap_for_y == true` sells X for Y).
    pub fn sub_rate(self, swap_for_y: bool) -> u16 {
        if swap_for_y {
            self.0 as u16
        } else {
            (self.0 >> 16) as u16
        }
    }

    /// Whether both halves respect [`MAX_PROTOCOL_FEE`].
    pub fn is_valid(self) -> bool {
        self.sub_rate(true) <= MAX_PROTOCOL_FEE && self.sub_rate(false) <= MAX_PROTOCOL_FEE
    }
}

/// Composes a protocol sub-rate with the LP rate. The protocol rate applies
/// to the gross amount and the LP rate to what remains, so the combination is
/// `p + l - p * l / BASIS_POINT_MAX` rather than a plain sum.
pub fn combined_fee(protocol_rate: u16, lp_rate: u16) -> u16 {
    let p = protocol_rate as u32;
    let l = lp_rate as u32;
    (p + l - p * l / BASIS_POINT_MAX as u32) as u16
}

/// The fee contained in a gross amount: `ceil(gross * rate / BASIS_POINT_MAX)`.
/// Fees round in the protocol's favor.
pub fn fee_amount_from(gross: u128, rate: u16) -> Result<u128, MathError> {
    let numerator = U256::from(gross) * U256::from(rate);
    to_u128(div_rounding_up(numerator, U256::from(BASIS_POINT_MAX)))
}

/// The fee to add on top of a net amount so that removing the fee from the
/// gross yields the net again: `ceil(net * rate / (BASIS_POINT_MAX - rate))`.
pub fn fee_amount_on(net: u128, rate: u16) -> Result<u128, MathError> {
    if rate >= BASIS_POINT_MAX {
        return Err(MathError::DivisionByZero);
    }
    let numerator = U256::from(net) * U256::from(rate);
    to_u128(div_rounding_up(
        numerator,
        U256::from(BASIS_POINT_MAX - rate),
    ))
}

/// The protocol's slice of a combined fee: `total_fee * protocol / combined`,
/// rounded down so the slice never exceeds the total.
pub fn split_protocol_share(total_fee: u128, protocol_rate: u16, combined_rate: u16) -> u128 {
    if protocol_rate == 0 || combined_rate == 0 || total_fee == 0 {
        return 0;
    }
    let share = U256::from(total_fee) * U256::from(protocol_rate) / U256::from(combined_rate);
    // protocol_rate <= combined_rate, so the quotient fits back in u128
    crate::math::math_helpers::to_u128_saturating(share)
}

/// The implicit-swap fee charged when a deposit into the active bin shifts
/// its composition: `ceil(amount * rate * (rate + BASIS_POINT_MAX) /
/// BASIS_POINT_MAX^2)`, where `amount` already includes the fee.
pub fn composition_fee_amount(amount_with_fee: u128, rate: u16) -> Result<u128, MathError> {
    let r = U256::from(rate);
    let d = U256::from(BASIS_POINT_MAX);
    let numerator = U256::from(amount_with_fee) * r * (r + d);
    to_u128(div_rounding_up(numerator, d * d))
}
