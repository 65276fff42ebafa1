pub mod bit_math;
pub mod fee_math;
pub mod math_helpers;
pub mod packed_math;
pub mod price_math;
pub mod tree_math;
