use crate::error::MathError;
use alloy_primitives::U256;

/// Returns the index (0-255) of the most significant set bit in a `U256`,
/// or `MathError::ZeroValue` if the input is zero.
pub fn most_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::ZeroValue);
    }
    Ok(255 - x.leading_zeros() as u8)
}

/// Returns the index (0-255) of the least significant set bit in a `U256`,
/// or `MathError::ZeroValue` if the input is zero.
pub fn least_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::ZeroValue);
    }
    Ok(x.trailing_zeros() as u8)
}

/// Returns the highest set bit of `word` strictly below `bit`, scanning
/// toward index 0. `None` when no such bit is set.
pub fn closest_bit_right(word: U256, bit: u8) -> Option<u8> {
    if bit == 0 {
        return None;
    }
    let mask = (U256::ONE << bit) - U256::ONE;
    let masked = word & mask;
    if masked.is_zero() {
        None
    } else {
        Some(255 - masked.leading_zeros() as u8)
    }
}

/// Returns the lowest set bit of `word` strictly above `bit`, scanning
/// toward index 255. `None` when no such bit is set.
pub fn closest_bit_left(word: U256, bit: u8) -> Option<u8> {
    if bit == 255 {
        return None;
    }
    let mask = U256::MAX << (bit + 1);
    let masked = word & mask;
    if masked.is_zero() {
        None
    } else {
        Some(masked.trailing_zeros() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------- most_significant_bit tests -------------------------

    #[test]
    fn msb_errors_on_zero() {
        assert!(matches!(
            most_significant_bit(U256::ZERO),
            Err(MathError::ZeroValue)
        ));
    }

    #[test]
    fn msb_of_power_of_two() {
        assert_eq!(most_significant_bit(U256::from(1u64 << 7)).unwrap(), 7);
    }

    #[test]
    fn msb_of_multiple_bits() {
        // binary: 1001_0100, MSB = bit 7
        assert_eq!(most_significant_bit(U256::from(0b1001_0100u64)).unwrap(), 7);
    }

    #[test]
    fn msb_of_max_u256() {
        assert_eq!(most_significant_bit(U256::MAX).unwrap(), 255);
    }

    // ------------------------- least_significant_bit tests -------------------------

    #[test]
    fn lsb_errors_on_zero() {
        assert!(matches!(
            least_significant_bit(U256::ZERO),
            Err(MathError::ZeroValue)
        ));
    }

    #[test]
    fn lsb_of_power_of_two() {
        assert_eq!(least_significant_bit(U256::from(1u64 << 12)).unwrap(), 12);
    }

    #[test]
    fn lsb_of_max_u256() {
        assert_eq!(least_significant_bit(U256::MAX).unwrap(), 0);
    }

    // ------------------------- strict neighbor scans -------------------------

    #[test]
    fn closest_right_is_strict() {
        let word = U256::from(0b1001_0100u64);
        assert_eq!(closest_bit_right(word, 7), Some(4));
        assert_eq!(closest_bit_right(word, 5), Some(4));
        assert_eq!(closest_bit_right(word, 4), Some(2));
        assert_eq!(closest_bit_right(word, 2), None);
        assert_eq!(closest_bit_right(word, 0), None);
    }

    #[test]
    fn closest_left_is_strict() {
        let word = U256::from(0b1001_0100u64);
        assert_eq!(closest_bit_left(word, 0), Some(2));
        assert_eq!(closest_bit_left(word, 2), Some(4));
        assert_eq!(closest_bit_left(word, 4), Some(7));
        assert_eq!(closest_bit_left(word, 7), None);
        assert_eq!(closest_bit_left(word, 255), None);
    }

    #[test]
    fn closest_scans_handle_word_extremes() {
        let word = (U256::ONE << 255) | U256::ONE;
        assert_eq!(closest_bit_right(word, 255), Some(0));
        assert_eq!(closest_bit_left(word, 0), Some(255));
        assert_eq!(closest_bit_right(word, 1), Some(0));
        assert_eq!(closest_bit_left(word, 254), Some(255));
    }

    #[test]
    fn closest_scans_on_empty_word() {
        assert_eq!(closest_bit_right(U256::ZERO, 128), None);
        assert_eq!(closest_bit_left(U256::ZERO, 128), None);
    }
}
