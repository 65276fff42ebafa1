use crate::error::{Error, PoolError};
use crate::math::fee_math::{ProtocolFee, MAX_LP_FEE};
use crate::math::math_helpers::{mul_div, mul_div_rounding_up, to_u128};
use crate::math::packed_math::Amounts;
use crate::math::tree_math::TreeIndex;
use crate::{FastMap, MAX_BIN_ID, MIN_BIN_ID, SCALE, SCALE_OFFSET};
use alloy_primitives::{Address, U256};

/// The pool's top-of-state word: the active bin and the fee configuration.
///
/// A pool is initialized iff `active_id != 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Slot0 {
    pub active_id: u32,
    pub protocol_fee: ProtocolFee,
    pub lp_fee: u16,
}

/// A single price level: its reserve pair and the shares outstanding
/// against it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bin {
    pub reserves: Amounts,
    pub total_shares: U256,
}

impl Bin {
    /// The bin's value at a Q128.128 price, following the constant-sum
    /// formula `L = price * x + (y << 128)`.
    pub fn liquidity(amounts: Amounts, price: U256) -> Result<U256, PoolError> {
        let mut liquidity = U256::ZERO;
        if amounts.x > 0 {
            liquidity = price
                .checked_mul(U256::from(amounts.x))
                .ok_or(PoolError::LiquidityOverflow)?;
        }
        if amounts.y > 0 {
            liquidity = liquidity
                .checked_add(U256::from(amounts.y) << SCALE_OFFSET)
                .ok_or(PoolError::LiquidityOverflow)?;
        }
        Ok(liquidity)
    }

    /// The proportional reserve payout for burning `shares` against this bin,
    /// rounded down on both halves.
    pub fn amounts_out_of_bin(&self, shares: U256) -> Result<Amounts, Error> {
        let mut out = Amounts::ZERO;
        if self.reserves.x > 0 {
            out.x = to_u128(mul_div(
                shares,
                U256::from(self.reserves.x),
                self.total_shares,
            )?)?;
        }
        if self.reserves.y > 0 {
            out.y = to_u128(mul_div(
                shares,
                U256::from(self.reserves.y),
                self.total_shares,
            )?)?;
        }
        Ok(out)
    }

    /// Shares minted for a deposit under constant-value-per-share accounting,
    /// together with the effective amounts actually taken.
    ///
    /// When share rounding makes the deposit worth more than the shares it
    /// buys, the excess is shaved off the deposit (Y first, it is the quote
    /// side) instead of being silently absorbed by the bin.
    pub fn shares_and_effective_amounts(
        &self,
        amounts_in: Amounts,
        price: U256,
    ) -> Result<(U256, Amounts), Error> {
        let user_liquidity = Self::liquidity(amounts_in, price)?;
        if self.total_shares.is_zero() || user_liquidity.is_zero() {
            return Ok((user_liquidity, amounts_in));
        }

        let bin_liquidity = Self::liquidity(self.reserves, price)?;
        if bin_liquidity.is_zero() {
            return Ok((user_liquidity, amounts_in));
        }

        let shares = mul_div(user_liquidity, self.total_shares, bin_liquidity)?;
        let effective_liquidity = mul_div_rounding_up(shares, bin_liquidity, self.total_shares)?;

        let mut effective = amounts_in;
        if user_liquidity > effective_liquidity {
            let mut delta = user_liquidity - effective_liquidity;

            if delta >= SCALE {
                let dy = (delta >> SCALE_OFFSET).min(U256::from(effective.y));
                let dy = to_u128(dy)?;
                effective.y -= dy;
                delta -= U256::from(dy) << SCALE_OFFSET;
            }
            if delta >= price {
                let dx = (delta / price).min(U256::from(effective.x));
                effective.x -= to_u128(dx)?;
            }
        }

        Ok((shares, effective))
    }

    /// A deposit away from the active bin must sit entirely on the side the
    /// price has not yet reached: only Y below the active id, only X above.
    pub fn verify_deposit_side(id: u32, active_id: u32, amounts: Amounts) -> Result<(), PoolError> {
        if (id < active_id && amounts.x != 0) || (id > active_id && amounts.y != 0) {
            return Err(PoolError::DepositSideMismatch(id));
        }
        Ok(())
    }
}

/// The bin-ledger engine for one pool: bins, positions, and the bitmap index,
/// all exclusively owned by this instance.
///
/// Operations mutate the ledger and return signed balance deltas; asset
/// movement and settlement are the caller's concern. Every mutating operation
/// is all-or-nothing: a failure leaves the pool untouched.
#[derive(Clone, Debug, Default)]
pub struct BinPool {
    pub slot0: Slot0,
    pub(crate) bins: FastMap<u32, Bin>,
    pub(crate) positions: FastMap<(Address, u32), U256>,
    pub(crate) tree: TreeIndex,
    pub(crate) protocol_fees: Amounts,
}

impl BinPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.slot0.active_id != 0
    }

    /// Sets the starting price level and fee configuration. Fails on a second
    /// call, on an out-of-range id, or on rates above their caps.
    pub fn initialize(
        &mut self,
        active_id: u32,
        protocol_fee: ProtocolFee,
        lp_fee: u16,
    ) -> Result<(), PoolError> {
        if self.is_initialized() {
            return Err(PoolError::AlreadyInitialized);
        }
        if !(MIN_BIN_ID..=MAX_BIN_ID).contains(&active_id) {
            return Err(PoolError::InvalidActiveId);
        }
        if !protocol_fee.is_valid() {
            return Err(PoolError::ProtocolFeeTooLarge);
        }
        if lp_fee > MAX_LP_FEE {
            return Err(PoolError::LpFeeTooLarge);
        }
        self.slot0 = Slot0 {
            active_id,
            protocol_fee,
            lp_fee,
        };
        Ok(())
    }

    pub fn set_protocol_fee(&mut self, protocol_fee: ProtocolFee) -> Result<(), PoolError> {
        if !self.is_initialized() {
            return Err(PoolError::NotInitialized);
        }
        if !protocol_fee.is_valid() {
            return Err(PoolError::ProtocolFeeTooLarge);
        }
        self.slot0.protocol_fee = protocol_fee;
        Ok(())
    }

    pub fn set_lp_fee(&mut self, lp_fee: u16) -> Result<(), PoolError> {
        if !self.is_initialized() {
            return Err(PoolError::NotInitialized);
        }
        if lp_fee > MAX_LP_FEE {
            return Err(PoolError::LpFeeTooLarge);
        }
        self.slot0.lp_fee = lp_fee;
        Ok(())
    }

    /// The reserve pair of a bin, zero for bins never deposited into.
    pub fn get_bin(&self, id: u32) -> Amounts {
        self.bins.get(&id).map(|bin| bin.reserves).unwrap_or_default()
    }

    /// An owner's share count in a bin.
    pub fn get_position(&self, owner: Address, id: u32) -> U256 {
        self.positions
            .get(&(owner, id))
            .copied()
            .unwrap_or_default()
    }

    /// Nearest populated bin strictly beyond `id` in the direction a swap
    /// would travel (`swap_for_y` descends).
    pub fn get_next_non_empty_bin(&self, swap_for_y: bool, id: u32) -> Option<u32> {
        if swap_for_y {
            self.tree.find_first_right(id)
        } else {
            self.tree.find_first_left(id)
        }
    }

    /// Drains the accrued protocol fees, returning what was collected.
    pub fn collect_protocol_fees(&mut self) -> Amounts {
        std::mem::take(&mut self.protocol_fees)
    }

    pub(crate) fn bin(&self, id: u32) -> Bin {
        self.bins.get(&id).copied().unwrap_or_default()
    }

    pub(crate) fn ensure_initialized(&self) -> Result<(), PoolError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(PoolError::NotInitialized)
        }
    }
}
