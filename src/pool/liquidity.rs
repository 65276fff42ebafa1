use crate::error::{Error, MathError, PoolError};
use crate::math::fee_math::{combined_fee, composition_fee_amount, split_protocol_share};
use crate::math::math_helpers::{mul_div, to_u128};
use crate::math::packed_math::Amounts;
use crate::math::price_math::get_price_from_id;
use crate::pool::bin_pool::{Bin, BinPool};
use crate::pool::swap::BalanceDelta;
use crate::{FastMap, PRECISION};
use alloy_primitives::{Address, U256};

/// One leg of a mint: a target bin and the slice of the caller's total input
/// routed to it, as `PRECISION`-scaled fractions per asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiquidityShape {
    pub id: u32,
    pub dist_x: u64,
    pub dist_y: u64,
}

/// Per-bin outcome of a mint: the effective deposit and the shares created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinShares {
    pub id: u32,
    pub amounts: Amounts,
    pub shares: U256,
}

/// Per-bin payout of a burn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinAmounts {
    pub id: u32,
    pub amounts: Amounts,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintResult {
    pub delta: BalanceDelta,
    pub protocol_fees: Amounts,
    pub bins: Vec<BinShares>,
    pub composition_fees: Amounts,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BurnResult {
    pub delta: BalanceDelta,
    pub bins: Vec<BinAmounts>,
}

/// The implicit-swap fee for a deposit whose composition differs from the
/// bin's. Burning the fresh shares right back would return a different mix
/// than was deposited; the difference on the over-supplied side is charged at
/// the combined swap rate for that side's direction.
fn composition_fees(
    bin: &Bin,
    amounts_in: Amounts,
    price: U256,
    shares: U256,
    fee_rate_x: u16,
    fee_rate_y: u16,
) -> Result<Amounts, Error> {
    if shares.is_zero() {
        return Ok(Amounts::ZERO);
    }

    let grown = Bin {
        reserves: bin.reserves.checked_add(amounts_in)?,
        total_shares: bin
            .total_shares
            .checked_add(shares)
            .ok_or(PoolError::LiquidityOverflow)?,
    };
    let received = grown.amounts_out_of_bin(shares)?;

    if received.x > amounts_in.x {
        let fee = composition_fee_amount(
            amounts_in
                .y
                .checked_sub(received.y)
                .ok_or(MathError::Underflow)?,
            fee_rate_y,
        )?;
        Ok(Amounts::only_y(fee))
    } else if received.y > amounts_in.y {
        let fee = composition_fee_amount(
            amounts_in
                .x
                .checked_sub(received.x)
                .ok_or(MathError::Underflow)?,
            fee_rate_x,
        )?;
        Ok(Amounts::only_x(fee))
    } else {
        Ok(Amounts::ZERO)
    }
}

impl BinPool {
    /// Converts an ordered list of liquidity shapes into bin deposits and
    /// share mints for `recipient`.
    ///
    /// Each shape receives its `PRECISION`-scaled slice of `amounts_in`.
    /// Deposits into the active bin pay a composition fee when their mix
    /// deviates from the bin's; deposits elsewhere must sit entirely on the
    /// not-yet-swapped side. All changes are staged and committed only once
    /// every shape has been accepted.
    pub fn mint(
        &mut self,
        recipient: Address,
        shapes: &[LiquidityShape],
        amounts_in: Amounts,
        bin_step: u16,
    ) -> Result<MintResult, Error> {
        self.ensure_initialized()?;
        if shapes.is_empty() {
            return Err(PoolError::EmptyLiquidityShapes.into());
        }

        let mut sum_x: u128 = 0;
        let mut sum_y: u128 = 0;
        for shape in shapes {
            sum_x += shape.dist_x as u128;
            sum_y += shape.dist_y as u128;
        }
        if sum_x > PRECISION as u128 || sum_y > PRECISION as u128 {
            return Err(PoolError::DistributionExceedsPrecision.into());
        }

        let active_id = self.slot0.active_id;
        let fee_rate_x = combined_fee(self.slot0.protocol_fee.sub_rate(true), self.slot0.lp_fee);
        let fee_rate_y = combined_fee(self.slot0.protocol_fee.sub_rate(false), self.slot0.lp_fee);

        let mut staged_bins: FastMap<u32, Bin> = FastMap::default();
        let mut tree_inserts: Vec<u32> = Vec::new();
        let mut bins_out: Vec<BinShares> = Vec::with_capacity(shapes.len());
        let mut total_in = Amounts::ZERO;
        let mut protocol_total = Amounts::ZERO;
        let mut composition_total = Amounts::ZERO;

        for shape in shapes {
            let allotted = Amounts::new(
                split_distribution(amounts_in.x, shape.dist_x)?,
                split_distribution(amounts_in.y, shape.dist_y)?,
            );
            let price = get_price_from_id(shape.id, bin_step)?;
            let bin = staged_bins
                .get(&shape.id)
                .copied()
                .unwrap_or_else(|| self.bin(shape.id));

            if shape.id != active_id {
                Bin::verify_deposit_side(shape.id, active_id, allotted)?;
            }

            let (mut shares, effective) = bin.shares_and_effective_amounts(allotted, price)?;
            let mut bin_credit = effective;

            if shape.id == active_id {
                let fees =
                    composition_fees(&bin, effective, price, shares, fee_rate_x, fee_rate_y)?;
                if !fees.is_zero() {
                    // the implicit swap already happened; shares reflect the
                    // deposit net of its fee
                    let user_liquidity = Bin::liquidity(effective.checked_sub(fees)?, price)?;
                    let bin_liquidity = Bin::liquidity(bin.reserves, price)?;
                    shares = if bin.total_shares.is_zero() || bin_liquidity.is_zero() {
                        user_liquidity
                    } else {
                        mul_div(user_liquidity, bin.total_shares, bin_liquidity)?
                    };

                    let protocol_share = Amounts::new(
                        split_protocol_share(
                            fees.x,
                            self.slot0.protocol_fee.sub_rate(true),
                            fee_rate_x,
                        ),
                        split_protocol_share(
                            fees.y,
                            self.slot0.protocol_fee.sub_rate(false),
                            fee_rate_y,
                        ),
                    );
                    protocol_total = protocol_total.checked_add(protocol_share)?;
                    composition_total = composition_total.checked_add(fees)?;
                    bin_credit = effective.checked_sub(protocol_share)?;
                }
            }

            if effective.is_zero() {
                return Err(PoolError::ZeroAmountDeposited(shape.id).into());
            }
            if shares.is_zero() {
                return Err(PoolError::ZeroSharesMinted(shape.id).into());
            }

            let was_empty = bin.total_shares.is_zero();
            let new_bin = Bin {
                reserves: bin.reserves.checked_add(bin_credit)?,
                total_shares: bin
                    .total_shares
                    .checked_add(shares)
                    .ok_or(PoolError::LiquidityOverflow)?,
            };
            Bin::liquidity(new_bin.reserves, price)?;

            if was_empty {
                tree_inserts.push(shape.id);
            }
            staged_bins.insert(shape.id, new_bin);
            total_in = total_in.checked_add(effective)?;
            bins_out.push(BinShares {
                id: shape.id,
                amounts: effective,
                shares,
            });
        }

        let new_protocol_fees = self.protocol_fees.checked_add(protocol_total)?;

        // commit
        for id in tree_inserts {
            self.tree.add(id);
        }
        for (id, bin) in staged_bins {
            self.bins.insert(id, bin);
        }
        for entry in &bins_out {
            let position = self.positions.entry((recipient, entry.id)).or_default();
            *position += entry.shares;
        }
        self.protocol_fees = new_protocol_fees;

        Ok(MintResult {
            delta: BalanceDelta::owed_to_pool(total_in),
            protocol_fees: protocol_total,
            bins: bins_out,
            composition_fees: composition_total,
        })
    }

    /// Redeems shares across the listed bins for their proportional reserve
    /// payouts. Bins whose supply reaches zero are dropped from the index.
    pub fn burn(
        &mut self,
        owner: Address,
        ids: &[u32],
        share_amounts: &[U256],
    ) -> Result<BurnResult, Error> {
        self.ensure_initialized()?;
        if ids.is_empty() || ids.len() != share_amounts.len() {
            return Err(PoolError::BurnInputLengthMismatch.into());
        }

        let mut staged_bins: FastMap<u32, Bin> = FastMap::default();
        let mut staged_positions: FastMap<u32, U256> = FastMap::default();
        let mut tree_removals: Vec<u32> = Vec::new();
        let mut bins_out: Vec<BinAmounts> = Vec::with_capacity(ids.len());
        let mut total_out = Amounts::ZERO;

        for (&id, &amount) in ids.iter().zip(share_amounts) {
            if amount.is_zero() {
                return Err(PoolError::ZeroShares.into());
            }

            let bin = staged_bins.get(&id).copied().unwrap_or_else(|| self.bin(id));
            let position = staged_positions
                .get(&id)
                .copied()
                .unwrap_or_else(|| self.get_position(owner, id));
            if position < amount {
                return Err(PoolError::InsufficientPositionShares(id).into());
            }

            let payout = bin.amounts_out_of_bin(amount)?;
            if payout.is_zero() {
                return Err(PoolError::ZeroAmountsOut.into());
            }

            let new_bin = Bin {
                reserves: bin.reserves.checked_sub(payout)?,
                total_shares: bin
                    .total_shares
                    .checked_sub(amount)
                    .ok_or(MathError::Underflow)?,
            };
            if new_bin.total_shares.is_zero() {
                tree_removals.push(id);
            }

            staged_bins.insert(id, new_bin);
            staged_positions.insert(id, position - amount);
            total_out = total_out.checked_add(payout)?;
            bins_out.push(BinAmounts {
                id,
                amounts: payout,
            });
        }

        // commit
        for (id, bin) in staged_bins {
            if bin.total_shares.is_zero() {
                self.bins.remove(&id);
            } else {
                self.bins.insert(id, bin);
            }
        }
        for (id, position) in staged_positions {
            if position.is_zero() {
                self.positions.remove(&(owner, id));
            } else {
                self.positions.insert((owner, id), position);
            }
        }
        for id in tree_removals {
            self.tree.remove(id);
        }

        Ok(BurnResult {
            delta: BalanceDelta::owed_to_caller(total_out),
            bins: bins_out,
        })
    }

    /// Adds both amounts to the active bin without minting shares, growing
    /// every holder's claim pro rata. The bin must already have outstanding
    /// shares, and the grown reserves must still value at the bin's price.
    pub fn donate(
        &mut self,
        bin_step: u16,
        amount_x: u128,
        amount_y: u128,
    ) -> Result<(BalanceDelta, u32), Error> {
        self.ensure_initialized()?;

        let id = self.slot0.active_id;
        let bin = self.bin(id);
        if bin.total_shares.is_zero() {
            return Err(PoolError::NoLiquidityToReceiveFees.into());
        }

        let amounts = Amounts::new(amount_x, amount_y);
        if amounts.is_zero() {
            return Err(PoolError::InsufficientAmountIn.into());
        }

        let reserves = bin.reserves.checked_add(amounts)?;
        let price = get_price_from_id(id, bin_step)?;
        Bin::liquidity(reserves, price)?;

        self.bins.insert(
            id,
            Bin {
                reserves,
                total_shares: bin.total_shares,
            },
        );

        Ok((BalanceDelta::owed_to_pool(amounts), id))
    }
}

/// The slice of `total` routed to one shape: `total * dist / PRECISION`,
/// rounded down.
fn split_distribution(total: u128, dist: u64) -> Result<u128, Error> {
    if dist == 0 || total == 0 {
        return Ok(0);
    }
    let slice = mul_div(
        U256::from(total),
        U256::from(dist),
        U256::from(PRECISION),
    )?;
    Ok(to_u128(slice)?)
}
