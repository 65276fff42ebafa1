use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MathError {
    #[error("Math error - overflow")]
    Overflow,
    #[error("Math error - underflow")]
    Underflow,
    #[error("Math error - division by zero")]
    DivisionByZero,
    #[error("BitMath error - zero input value")]
    ZeroValue,
    #[error("Math error - bin id out of bounds")]
    IdOutOfBounds,
    #[error("Math error - invalid bin step")]
    InvalidBinStep,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("Pool error - already initialized")]
    AlreadyInitialized,
    #[error("Pool error - not initialized")]
    NotInitialized,
    #[error("Pool error - active id out of range")]
    InvalidActiveId,
    #[error("Pool error - protocol fee exceeds cap")]
    ProtocolFeeTooLarge,
    #[error("Pool error - lp fee exceeds cap")]
    LpFeeTooLarge,

    #[error("Pool error - empty liquidity shape list")]
    EmptyLiquidityShapes,
    #[error("Pool error - distribution sum exceeds precision")]
    DistributionExceedsPrecision,
    #[error("Pool error - burn id and share lists are malformed")]
    BurnInputLengthMismatch,
    #[error("Pool error - zero shares requested")]
    ZeroShares,

    #[error("Pool error - deposit minted zero shares at bin {0}")]
    ZeroSharesMinted(u32),
    #[error("Pool error - zero amount deposited at bin {0}")]
    ZeroAmountDeposited(u32),
    #[error("Pool error - zero amounts out")]
    ZeroAmountsOut,
    #[error("Pool error - insufficient amount in")]
    InsufficientAmountIn,
    #[error("Pool error - insufficient amount out")]
    InsufficientAmountOut,

    #[error("Pool error - out of liquidity")]
    OutOfLiquidity,
    #[error("Pool error - no liquidity to receive fees")]
    NoLiquidityToReceiveFees,
    #[error("Pool error - bin liquidity overflow")]
    LiquidityOverflow,
    #[error("Pool error - insufficient position shares at bin {0}")]
    InsufficientPositionShares(u32),

    #[error("Pool error - deposit on the wrong side of the active bin, id: {0}")]
    DepositSideMismatch(u32),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    MathError(#[from] crate::error::MathError),

    #[error(transparent)]
    PoolError(#[from] crate::error::PoolError),
}
