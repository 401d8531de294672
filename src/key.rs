//! Fixed-width key arithmetic.
//!
//! A branch stores its common prefix as `(prefix, mask)` where `mask` is a
//! run of low-order ones (`2^k - 1`). The branching bit is the highest bit of
//! the mask, so `prefix` has it cleared along with everything below it.

use std::fmt::Debug;
use std::hash::Hash;
use std::ops::{BitAnd, BitXor, Not, Shr};

/// An unsigned integer usable as a trie key.
///
/// `BITS` is the key width. All mask and shift arithmetic in the trie is done
/// in `Self`, so the width can never disagree with the key type.
pub trait PatriciaKey:
    Copy
    + Ord
    + Hash
    + Debug
    + BitAnd<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
    + Shr<u32, Output = Self>
{
    const BITS: u32;
    const ZERO: Self;
    const ONE: Self;
    const MAX: Self;

    fn leading_zeros(self) -> u32;
    fn count_ones(self) -> u32;
    fn wrapping_add(self, rhs: Self) -> Self;
}

macro_rules! impl_patricia_key {
    ($($t:ty),*) => {$(
        impl PatriciaKey for $t {
            const BITS: u32 = <$t>::BITS;
            const ZERO: Self = 0;
            const ONE: Self = 1;
            const MAX: Self = <$t>::MAX;

            #[inline]
            fn leading_zeros(self) -> u32 {
                <$t>::leading_zeros(self)
            }

            #[inline]
            fn count_ones(self) -> u32 {
                <$t>::count_ones(self)
            }

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$t>::wrapping_add(self, rhs)
            }
        }
    )*};
}

impl_patricia_key!(u8, u16, u32, u64, u128, usize);

// =============================================================================
// Prefix arithmetic
// =============================================================================

/// Clears the bits covered by `mask`.
#[inline]
pub(crate) fn mask_off<K: PatriciaKey>(x: K, mask: K) -> K {
    x & !mask
}

/// Smallest `2^k - 1` covering every bit where `a` and `b` differ.
///
/// `a` and `b` must differ. The shift amount is at most `BITS - 1`, so the top
/// bit case yields `MAX` without overflow.
#[inline]
pub(crate) fn lcp_mask<K: PatriciaKey>(a: K, b: K) -> K {
    let diff = a ^ b;
    debug_assert!(diff != K::ZERO, "lcp of identical prefixes");
    K::MAX >> diff.leading_zeros()
}

/// The branching bit of a canonical mask: its highest set bit.
#[inline]
pub(crate) fn branch_bit<K: PatriciaKey>(mask: K) -> K {
    debug_assert!(is_canonical_mask(mask));
    (mask >> 1).wrapping_add(K::ONE)
}

/// Whether `x` has a zero at the branching bit of `mask`.
#[inline]
pub(crate) fn is_left<K: PatriciaKey>(x: K, mask: K) -> bool {
    x & branch_bit(mask) == K::ZERO
}

#[inline]
pub(crate) fn is_canonical_mask<K: PatriciaKey>(mask: K) -> bool {
    mask != K::ZERO && mask & mask.wrapping_add(K::ONE) == K::ZERO
}

// =============================================================================
// Prefix query result
// =============================================================================

/// A bit prefix reported by [`IntPatricia::prefix`](crate::IntPatricia::prefix).
///
/// `bits` holds the prefix with every masked bit cleared. `mask` marks the
/// low-order "don't care" bits. A leaf reports its full key with a zero mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Prefix<K> {
    bits: K,
    mask: K,
}

impl<K: PatriciaKey> Prefix<K> {
    #[inline]
    pub(crate) fn new(bits: K, mask: K) -> Self {
        debug_assert_eq!(bits & mask, K::ZERO);
        Self { bits, mask }
    }

    #[inline]
    pub fn bits(&self) -> K {
        self.bits
    }

    #[inline]
    pub fn mask(&self) -> K {
        self.mask
    }

    /// Number of high-order bits of `bits` that are meaningful.
    #[inline]
    pub fn significant_bits(&self) -> u32 {
        K::BITS - self.mask.count_ones()
    }

    /// Whether `key` falls under this prefix.
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        mask_off(key, self.mask) == self.bits
    }
}
