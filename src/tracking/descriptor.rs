//! Binary descriptor comparison.

/// Binary descriptor size ceiling, in bits. Wider descriptors are a
/// configuration error rejected at the tracker boundary.
pub const MAX_DESCRIPTOR_BITS: usize = 512;

/// Computes the Hamming distance between two binary descriptors of equal
/// byte length: byte-wise XOR followed by popcount, summed.
///
/// Returns the number of differing bits, in `[0, 8 * a.len()]`.
#[inline]
pub fn hamming_distance(a: &[u8], b: &[u8]) -> u32 {
    debug_assert_eq!(a.len(), b.len(), "descriptor lengths differ");
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x ^ y).count_ones())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_descriptors_have_zero_distance() {
        let d = [0xDE, 0xAD, 0xBE, 0xEF];
        assert_eq!(hamming_distance(&d, &d), 0);
    }

    #[test]
    fn test_complement_flips_every_bit() {
        let a = [0x00u8; 32];
        let b = [0xFFu8; 32];
        assert_eq!(hamming_distance(&a, &b), 256);
    }

    #[test]
    fn test_single_bit_difference() {
        let a = [0b0000_0000, 0b1010_1010];
        let b = [0b0000_0001, 0b1010_1010];
        assert_eq!(hamming_distance(&a, &b), 1);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = [0x12, 0x34, 0x56];
        let b = [0x65, 0x43, 0x21];
        assert_eq!(hamming_distance(&a, &b), hamming_distance(&b, &a));
    }
}
