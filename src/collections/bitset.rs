use bitvec::prelude::*;

/// Fixed-size bitset over candidate pool indices
///
/// Uses the 0-based pool index of each candidate. Provides O(1) membership
/// testing for "already used" bookkeeping in the assignment strategies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateBitset {
    bits: BitVec,
}

impl CandidateBitset {
    /// Create a bitset with no candidates present
    pub fn new(pool_size: usize) -> Self {
        Self {
            bits: bitvec![0; pool_size],
        }
    }

    /// Insert a candidate index, returning whether it was newly added
    ///
    /// Indices beyond the pool size are ignored.
    pub fn insert(&mut self, candidate: usize) -> bool {
        match self.bits.get_mut(candidate) {
            Some(mut bit) if !*bit => {
                *bit = true;
                true
            }
            _ => false,
        }
    }

    /// Test candidate membership
    pub fn contains(&self, candidate: usize) -> bool {
        self.bits.get(candidate).as_deref() == Some(&true)
    }
}
