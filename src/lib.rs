//! Discretized-liquidity AMM math and an in-memory bin-pool engine in pure Rust.
//!
//! Liquidity is partitioned into discrete, monotonically priced bins. Each bin
//! holds its own reserve pair and its own pool of ownership shares. This crate
//! exposes:
//! - Low-level math primitives (`math::*`) for prices, fees, packed amount
//!   pairs, and the three-level bitmap index over the bin-id space.
//! - A lightweight in-memory [`BinPool`] that can execute swaps, mint and burn
//!   liquidity, and accept fee donations, returning signed balance deltas.
//!
//! The engine never moves value itself: every operation computes the deltas the
//! caller owes or is owed and mutates only the pool's bookkeeping state.
//!
//! # Examples
//!
//! ## Pure math
//! ```
//! use bin_pool_math::{math::price_math, MID_BIN_ID, SCALE};
//!
//! // The mid-range bin prices at exactly 1.0 in Q128.128.
//! let price = price_math::get_price_from_id(MID_BIN_ID, 25).unwrap();
//! assert_eq!(price, SCALE);
//! assert_eq!(price_math::get_id_from_price(price, 25).unwrap(), MID_BIN_ID);
//! ```
//!
//! ## Minting and swapping against an in-memory pool
//! ```
//! use bin_pool_math::{
//!     pool::liquidity::LiquidityShape, Address, Amounts, BinPool, MID_BIN_ID, PRECISION,
//!     ProtocolFee,
//! };
//!
//! let mut pool = BinPool::new();
//! pool.initialize(MID_BIN_ID, ProtocolFee::ZERO, 10).unwrap();
//!
//! // Seed the active bin with both assets.
//! let shapes = [LiquidityShape {
//!     id: MID_BIN_ID,
//!     dist_x: PRECISION,
//!     dist_y: PRECISION,
//! }];
//! let minted = pool
//!     .mint(Address::ZERO, &shapes, Amounts::new(1_000_000, 1_000_000), 25)
//!     .unwrap();
//! assert_eq!(minted.bins.len(), 1);
//!
//! // Sell 1000 X for Y at a price of 1.0 with a 0.1% fee.
//! let result = pool.swap(true, 25, 1_000).unwrap();
//! assert!(result.delta.y < alloy_primitives::I256::ZERO);
//! assert_eq!(pool.slot0.active_id, MID_BIN_ID);
//! ```

pub use alloy_primitives::{Address, I256, U256};

pub mod error;
mod hash;
pub mod math;
pub mod pool;

pub use hash::FastMap;
pub use math::fee_math::ProtocolFee;
pub use math::packed_math::Amounts;
pub use math::tree_math::TreeIndex;
pub use pool::bin_pool::{Bin, BinPool, Slot0};
pub use pool::swap::BalanceDelta;

/// Number of fractional bits in the Q128.128 price representation.
pub const SCALE_OFFSET: u8 = 128;

/// 1.0 in Q128.128.
pub const SCALE: U256 = U256::from_limbs([0, 0, 1, 0]);

/// Denominator for fee rates and for the bin step, in basis points.
pub const BASIS_POINT_MAX: u16 = 10_000;

/// Denominator for liquidity-shape distributions.
pub const PRECISION: u64 = 1_000_000_000_000_000_000;

/// Smallest valid bin id. Id 0 is the uninitialized sentinel.
pub const MIN_BIN_ID: u32 = 1;

/// Largest valid bin id (24-bit id space).
pub const MAX_BIN_ID: u32 = (1 << 24) - 1;

/// The bin id whose price is exactly 1.0.
pub const MID_BIN_ID: u32 = 1 << 23;
