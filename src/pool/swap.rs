use crate::error::{Error, MathError, PoolError};
use crate::math::fee_math::{combined_fee, fee_amount_from, fee_amount_on, split_protocol_share};
use crate::math::math_helpers::{
    mul_shift_rounding_down, mul_shift_rounding_up, shift_div_rounding_down, shift_div_rounding_up,
    to_u128, to_u128_saturating,
};
use crate::math::packed_math::Amounts;
use crate::math::price_math::get_price_from_id;
use crate::pool::bin_pool::{Bin, BinPool};
use alloy_primitives::{I256, U256};

/// Net amounts owed per asset after an operation. Positive halves are owed to
/// the pool by the caller, negative halves are owed to the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BalanceDelta {
    pub x: I256,
    pub y: I256,
}

impl BalanceDelta {
    pub const ZERO: Self = Self {
        x: I256::ZERO,
        y: I256::ZERO,
    };

    /// Both halves owed to the pool.
    pub fn owed_to_pool(amounts: Amounts) -> Self {
        Self {
            x: I256::from_raw(U256::from(amounts.x)),
            y: I256::from_raw(U256::from(amounts.y)),
        }
    }

    /// Both halves owed to the caller.
    pub fn owed_to_caller(amounts: Amounts) -> Self {
        Self {
            x: -I256::from_raw(U256::from(amounts.x)),
            y: -I256::from_raw(U256::from(amounts.y)),
        }
    }

    /// Opposite-signed halves of a swap: the input owed to the pool, the
    /// output owed to the caller.
    pub fn swap(swap_for_y: bool, amount_in: u128, amount_out: u128) -> Self {
        let amounts_in = Amounts::from_in_side(swap_for_y, amount_in);
        let amounts_out = Amounts::from_out_side(swap_for_y, amount_out);
        Self {
            x: I256::from_raw(U256::from(amounts_in.x)) - I256::from_raw(U256::from(amounts_out.x)),
            y: I256::from_raw(U256::from(amounts_in.y)) - I256::from_raw(U256::from(amounts_out.y)),
        }
    }
}

/// One visited bin in a swap: the input it absorbed (fee included), the
/// output it released, and the fee charged there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapStep {
    pub id: u32,
    pub amounts_in: Amounts,
    pub amounts_out: Amounts,
    pub fee: Amounts,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapResult {
    pub delta: BalanceDelta,
    pub steps: Vec<SwapStep>,
}

/// The amounts a single bin exchanges for `amount_in_left` of input at its
/// price: `(amounts_in_with_fee, amounts_out, fee)`.
///
/// The bin's capacity is its out-reserve priced at the bin (rounded up, plus
/// the fee on top); a partial fill charges the fee out of the input and
/// credits output rounded down. Rounding always favors the pool.
pub fn bin_swap_amounts(
    reserves: Amounts,
    price: U256,
    fee_rate: u16,
    swap_for_y: bool,
    amount_in_left: u128,
) -> Result<(Amounts, Amounts, Amounts), Error> {
    let reserve_out = reserves.out_side(swap_for_y);
    if reserve_out == 0 {
        return Ok((Amounts::ZERO, Amounts::ZERO, Amounts::ZERO));
    }

    let max_in = if swap_for_y {
        to_u128_saturating(shift_div_rounding_up(U256::from(reserve_out), price)?)
    } else {
        to_u128_saturating(mul_shift_rounding_up(U256::from(reserve_out), price)?)
    };
    let max_fee = fee_amount_on(max_in, fee_rate)?;
    let max_in_with_fee = max_in.saturating_add(max_fee);

    let (fee, amount_in_with_fee, amount_out) = if amount_in_left >= max_in_with_fee {
        (max_fee, max_in_with_fee, reserve_out)
    } else {
        let fee = fee_amount_from(amount_in_left, fee_rate)?;
        let net = amount_in_left - fee;
        let out = if swap_for_y {
            to_u128_saturating(mul_shift_rounding_down(U256::from(net), price)?)
        } else {
            to_u128_saturating(shift_div_rounding_down(U256::from(net), price)?)
        };
        (fee, amount_in_left, out.min(reserve_out))
    };

    Ok((
        Amounts::from_in_side(swap_for_y, amount_in_with_fee),
        Amounts::from_out_side(swap_for_y, amount_out),
        Amounts::from_in_side(swap_for_y, fee),
    ))
}

impl BinPool {
    /// Executes an exact-input swap, walking bins from the active id in the
    /// trade's direction until the input is fully consumed.
    ///
    /// Fails with `OutOfLiquidity` when the index runs out of populated bins
    /// while input remains, leaving the pool untouched. On success the active
    /// id is the last bin visited and the returned delta carries the input
    /// owed to the pool and the output owed to the caller.
    pub fn swap(
        &mut self,
        swap_for_y: bool,
        bin_step: u16,
        amount_in: u128,
    ) -> Result<SwapResult, Error> {
        self.ensure_initialized()?;
        if amount_in == 0 {
            return Err(PoolError::InsufficientAmountIn.into());
        }

        let protocol_rate = self.slot0.protocol_fee.sub_rate(swap_for_y);
        let fee_rate = combined_fee(protocol_rate, self.slot0.lp_fee);

        let mut id = self.slot0.active_id;
        let mut amount_in_left = amount_in;
        let mut amount_out_total: u128 = 0;
        let mut steps: Vec<SwapStep> = Vec::new();
        let mut staged: Vec<(u32, Bin)> = Vec::new();
        let mut protocol_fees = self.protocol_fees;

        loop {
            let bin = self.bin(id);
            if bin.reserves.out_side(swap_for_y) > 0 {
                let price = get_price_from_id(id, bin_step)?;
                let (amounts_in_with_fee, amounts_out, fee) =
                    bin_swap_amounts(bin.reserves, price, fee_rate, swap_for_y, amount_in_left)?;

                let consumed = amounts_in_with_fee.in_side(swap_for_y);
                if consumed > 0 {
                    amount_in_left -= consumed;
                    amount_out_total = amount_out_total
                        .checked_add(amounts_out.out_side(swap_for_y))
                        .ok_or(MathError::Overflow)?;

                    let protocol_share = Amounts::from_in_side(
                        swap_for_y,
                        split_protocol_share(fee.in_side(swap_for_y), protocol_rate, fee_rate),
                    );
                    protocol_fees = protocol_fees.checked_add(protocol_share)?;

                    // the lp slice of the fee stays in the bin; the protocol
                    // slice leaves the pool entirely
                    let reserves = bin
                        .reserves
                        .checked_add(amounts_in_with_fee.checked_sub(protocol_share)?)?
                        .checked_sub(amounts_out)?;
                    staged.push((
                        id,
                        Bin {
                            reserves,
                            total_shares: bin.total_shares,
                        },
                    ));
                    steps.push(SwapStep {
                        id,
                        amounts_in: amounts_in_with_fee,
                        amounts_out,
                        fee,
                    });
                }
            }

            if amount_in_left == 0 {
                break;
            }
            id = self
                .get_next_non_empty_bin(swap_for_y, id)
                .ok_or(PoolError::OutOfLiquidity)?;
        }

        if amount_out_total == 0 {
            return Err(PoolError::InsufficientAmountOut.into());
        }

        for (bin_id, bin) in staged {
            self.bins.insert(bin_id, bin);
        }
        self.protocol_fees = protocol_fees;
        self.slot0.active_id = id;

        Ok(SwapResult {
            delta: BalanceDelta::swap(swap_for_y, amount_in, amount_out_total),
            steps,
        })
    }

    /// Read-only walk computing the output achievable for `amount_in`.
    /// Returns `(amount_in_left, amount_out, total_fee)`; leftover input is
    /// reported instead of erroring when liquidity runs out.
    pub fn get_swap_out(
        &self,
        swap_for_y: bool,
        bin_step: u16,
        amount_in: u128,
    ) -> Result<(u128, u128, u128), Error> {
        self.ensure_initialized()?;

        let protocol_rate = self.slot0.protocol_fee.sub_rate(swap_for_y);
        let fee_rate = combined_fee(protocol_rate, self.slot0.lp_fee);

        let mut id = self.slot0.active_id;
        let mut amount_in_left = amount_in;
        let mut amount_out: u128 = 0;
        let mut total_fee: u128 = 0;

        loop {
            let bin = self.bin(id);
            if bin.reserves.out_side(swap_for_y) > 0 {
                let price = get_price_from_id(id, bin_step)?;
                let (amounts_in_with_fee, amounts_out, fee) =
                    bin_swap_amounts(bin.reserves, price, fee_rate, swap_for_y, amount_in_left)?;

                amount_in_left -= amounts_in_with_fee.in_side(swap_for_y);
                amount_out = amount_out
                    .checked_add(amounts_out.out_side(swap_for_y))
                    .ok_or(MathError::Overflow)?;
                total_fee = total_fee
                    .checked_add(fee.in_side(swap_for_y))
                    .ok_or(MathError::Overflow)?;
            }

            if amount_in_left == 0 {
                break;
            }
            match self.get_next_non_empty_bin(swap_for_y, id) {
                Some(next) => id = next,
                None => break,
            }
        }

        Ok((amount_in_left, amount_out, total_fee))
    }

    /// Read-only walk computing the input required for a desired output.
    /// Returns `(amount_in, amount_out_left, total_fee)`; output the pool
    /// cannot serve is reported as leftover.
    pub fn get_swap_in(
        &self,
        swap_for_y: bool,
        bin_step: u16,
        amount_out: u128,
    ) -> Result<(u128, u128, u128), Error> {
        self.ensure_initialized()?;

        let protocol_rate = self.slot0.protocol_fee.sub_rate(swap_for_y);
        let fee_rate = combined_fee(protocol_rate, self.slot0.lp_fee);

        let mut id = self.slot0.active_id;
        let mut amount_out_left = amount_out;
        let mut amount_in: u128 = 0;
        let mut total_fee: u128 = 0;

        loop {
            let bin = self.bin(id);
            let reserve_out = bin.reserves.out_side(swap_for_y);
            if reserve_out > 0 {
                let price = get_price_from_id(id, bin_step)?;
                let amount_out_of_bin = amount_out_left.min(reserve_out);

                // price the desired output back into input, rounding against
                // the swapper
                let amount_in_without_fee = if swap_for_y {
                    to_u128(shift_div_rounding_up(U256::from(amount_out_of_bin), price)?)?
                } else {
                    to_u128(mul_shift_rounding_up(U256::from(amount_out_of_bin), price)?)?
                };
                let fee = fee_amount_on(amount_in_without_fee, fee_rate)?;

                amount_in = amount_in
                    .checked_add(amount_in_without_fee)
                    .and_then(|v| v.checked_add(fee))
                    .ok_or(MathError::Overflow)?;
                total_fee = total_fee.checked_add(fee).ok_or(MathError::Overflow)?;
                amount_out_left -= amount_out_of_bin;
            }

            if amount_out_left == 0 {
                break;
            }
            match self.get_next_non_empty_bin(swap_for_y, id) {
                Some(next) => id = next,
                None => break,
            }
        }

        Ok((amount_in, amount_out_left, total_fee))
    }
}
