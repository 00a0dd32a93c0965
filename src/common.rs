//! Structures common to the chain traversal: seeds, chain elements and the
//! depth of a chain.
use crate::errors::Error;
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

#[cfg(feature = "serde_enabled")]
use serde::{Deserialize, Serialize};

/// Byte size of a chain element (the output size of the one-way function).
pub const VALUE_SIZE: usize = 32;

/// A single element of the hash chain, represented as an array of bytes. The
/// seed is the element at position zero; every other element is obtained by
/// hashing its predecessor once.
#[cfg_attr(feature = "serde_enabled", serde_with::serde_as)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Zeroize)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct ChainValue(
    #[cfg_attr(feature = "serde_enabled", serde_as(as = "serde_with::Bytes"))]
    pub(crate)  [u8; VALUE_SIZE],
);

impl ChainValue {
    /// Return `Self` as its byte representation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Tries to convert a slice of `bytes` as `Self`.
    ///
    /// # Errors
    /// This function returns an error if the length of `bytes` is not equal
    /// to `VALUE_SIZE`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() == VALUE_SIZE {
            let mut v = [0u8; VALUE_SIZE];
            v.copy_from_slice(bytes);
            Ok(ChainValue(v))
        } else {
            Err(Error::InvalidValueSize(bytes.len()))
        }
    }
}

impl AsRef<[u8]> for ChainValue {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Seed of a hash chain. The seed doubles as the chain element at position
/// zero, i.e. the value released in the very last round.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize)]
#[zeroize(drop)]
pub struct Seed(pub(crate) [u8; 32]);

impl Seed {
    /// Byte representation size of a `Seed`.
    pub const SIZE: usize = 32;

    /// Create a zero seed
    pub fn zero() -> Seed {
        Seed([0u8; Self::SIZE])
    }

    /// Takes a mutable reference of `self` and overwrites it with zero
    pub fn set_zero(&mut self) {
        self.0.copy_from_slice(&[0u8; Self::SIZE])
    }

    /// Creates a `Seed` from a byte array of length `Self::SIZE`.
    pub fn from_bytes(b: [u8; Self::SIZE]) -> Seed {
        Seed(b)
    }

    /// Creates a `Seed` from a slice.
    ///
    /// # Panics
    /// Function panics when `b.len() != Self::SIZE`.
    pub fn from_slice(b: &[u8]) -> Seed {
        assert_eq!(b.len(), Self::SIZE);
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(b);
        Seed(out)
    }

    /// Generate a fresh seed with the given random number generator.
    pub fn generate<T: RngCore + CryptoRng>(rng: &mut T) -> Seed {
        let mut bytes = [0u8; Self::SIZE];
        rng.fill_bytes(&mut bytes);
        Seed(bytes)
    }

    /// Consume the seed, returning the chain element at position zero.
    pub(crate) fn into_value(mut self) -> ChainValue {
        let mut out = [0u8; VALUE_SIZE];
        out.copy_from_slice(&self.0);
        self.set_zero();
        ChainValue(out)
    }
}

impl AsRef<[u8]> for Seed {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Structure that represents the depth of the chain, i.e. the base-two
/// logarithm of its length.
#[derive(Debug, Copy, Clone)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct Depth(pub u32);

impl Depth {
    /// Compute the chain length associated with the given `Depth`.
    pub fn total(self) -> u64 {
        1u64 << self.0
    }

    /// Compute half of the chain length associated with the given `Depth`.
    pub fn half(self) -> u64 {
        assert!(self.0 > 0);
        1u64 << (self.0 - 1)
    }

    /// Derive the depth from a chain length.
    ///
    /// # Errors
    /// The chain length must be a power of two, and at least two: the
    /// levelled schedule needs at least one checkpoint level.
    pub fn from_chain_length(chain_length: u64) -> Result<Depth, Error> {
        if chain_length < 2 || !chain_length.is_power_of_two() {
            return Err(Error::InvalidChainLength(chain_length));
        }
        Ok(Depth(chain_length.trailing_zeros()))
    }
}

impl PartialEq for Depth {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Depth {}
