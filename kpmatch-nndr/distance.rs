/// Hamming distance between two packed binary descriptors.
/// Popcount of each XOR-ed byte, summed.
#[inline]
pub fn hamming_distance(a: &[u8], b: &[u8]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x ^ y).count_ones())
        .sum()
}

/// Sum of squared differences between two float descriptors
#[inline]
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hamming_identical() {
        let a = [0b1010_1010u8; 32];
        assert_eq!(hamming_distance(&a, &a), 0);
    }

    #[test]
    fn test_hamming_all_bits() {
        let a = [0x00u8; 61];
        let b = [0xffu8; 61];
        assert_eq!(hamming_distance(&a, &b), 61 * 8);
    }

    #[test]
    fn test_hamming_single_bit() {
        let a = [0u8, 0, 0, 0];
        let b = [0u8, 0, 0b0001_0000, 0];
        assert_eq!(hamming_distance(&a, &b), 1);
    }

    #[test]
    fn test_squared_euclidean() {
        assert_eq!(squared_euclidean(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(squared_euclidean(&[1.5; 64], &[1.5; 64]), 0.0);
    }
}
