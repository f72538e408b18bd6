//! Tests for `CandidateBitset` membership bookkeeping

#[cfg(test)]
mod tests {
    use photomosaic::collections::CandidateBitset;

    // Verifies a new bitset holds no candidates
    // Verified by initializing with every bit set
    #[test]
    fn test_new_bitset() {
        let bitset = CandidateBitset::new(10);
        assert!((0..10).all(|candidate| !bitset.contains(candidate)));
    }

    // Tests insertion reports whether the index was new
    // Verified by always returning true from insert
    #[test]
    fn test_insert_reports_new() {
        let mut bitset = CandidateBitset::new(10);
        assert!(bitset.insert(5));
        assert!(!bitset.insert(5));
        assert!(bitset.contains(5));
        assert!(!bitset.contains(3));
    }

    // Tests that indices beyond the pool size are ignored
    // Verified by growing the bitset on out-of-range insert
    #[test]
    fn test_out_of_range_ignored() {
        let mut bitset = CandidateBitset::new(4);
        assert!(!bitset.insert(4));
        assert!(!bitset.contains(4));
        assert!(!bitset.insert(9));
        assert!(bitset.insert(3));
    }
}
