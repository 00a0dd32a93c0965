//! Amortized reverse-order traversal of a hash chain.
//!
//! A traversal over a chain of length `n` releases the elements
//! `x_(n-1), x_(n-2), ..., x_0`, one per round, while storing only `log2(n)`
//! checkpoints and hashing at most `2 * log2(n) + 1` times per round. The
//! commitment `x_n` is returned once by [`Traversal::initialize`] and never
//! kept here; verifying a released element against it is the relying party's
//! job (see [`crate::chain::verify`]).
use crate::common::{ChainValue, Depth, Seed};
use crate::errors::Error;
use crate::pebbles::{Pebble, PebbleSet};
use crate::traits::ChainFunction;

/// Traversal state: the round counter plus the live pebbles. The seed is
/// consumed at initialization and survives only as the final output.
#[derive(Debug, Clone)]
pub struct Traversal<F: ChainFunction> {
    chain: F,
    round: u64,
    pebbles: PebbleSet,
}

impl<F: ChainFunction> Traversal<F> {
    /// Walk the chain once from `seed`, placing the initial pebbles along
    /// the way. Returns the traversal paused before round one, together with
    /// the commitment `x_n` to hand to verifiers.
    ///
    /// # Errors
    /// `InvalidChainLength` unless `chain_length` is a power of two and at
    /// least 2. A chain of length 1 is rejected even though it is a power of
    /// two: it has no checkpoint levels and degenerates to storing the seed
    /// outright, so callers wanting it should keep the seed themselves.
    pub fn initialize(
        chain: F,
        seed: Seed,
        chain_length: u64,
    ) -> Result<(Self, ChainValue), Error> {
        let depth = Depth::from_chain_length(chain_length)?;
        let (pebbles, commitment) = PebbleSet::bootstrap(&chain, seed, depth);
        Ok((
            Traversal {
                chain,
                round: 0,
                pebbles,
            },
            commitment,
        ))
    }

    /// Advance one round and release its chain element: round `r` yields the
    /// element at position `n - r`, so outputs run from `x_(n-1)` down to the
    /// seed `x_0` in round `n`.
    ///
    /// # Errors
    /// `ExhaustedChain` once all `n` outputs have been released. The
    /// traversal is unchanged by a failed call and cannot be reset; a fresh
    /// chain needs a fresh seed.
    pub fn next_output(&mut self) -> Result<ChainValue, Error> {
        let n = self.pebbles.depth().total();
        if self.round >= n {
            return Err(Error::ExhaustedChain);
        }
        let position = n - (self.round + 1);

        self.pebbles.advance_round(&self.chain);
        let output = self.pebbles.release(&self.chain, position)?;
        self.round += 1;
        Ok(output)
    }

    /// Rounds completed so far, in `[0, n]`.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Total number of outputs this traversal was initialized for.
    pub fn chain_length(&self) -> u64 {
        self.pebbles.depth().total()
    }

    /// Outputs not yet released.
    pub fn remaining(&self) -> u64 {
        self.chain_length() - self.round
    }

    /// The live checkpoints, exposed for inspection.
    pub fn pebbles(&self) -> &PebbleSet {
        &self.pebbles
    }

    /// Convert `Self` into its byte representation, suitable for resuming
    /// after a restart. The encoding returns the following array, all
    /// integers big endian:
    /// ( chain_length || round || pebble_0 || ... || pebble_(t-1) )
    pub fn to_bytes(&self) -> Vec<u8> {
        let pebbles = self.pebbles.pebbles();
        let mut data = Vec::with_capacity(16 + pebbles.len() * Pebble::SIZE);
        data.extend_from_slice(&self.chain_length().to_be_bytes());
        data.extend_from_slice(&self.round.to_be_bytes());
        for pebble in pebbles {
            data.extend_from_slice(&pebble.to_bytes());
        }
        data
    }

    /// Resume a traversal from bytes produced by [`Traversal::to_bytes`].
    /// The chain function is not part of the encoding and must match the one
    /// the state was produced with.
    ///
    /// Persist-then-release discipline is the caller's: writing the state
    /// *before* handing out the round's output makes a crash re-release at
    /// most the already-public element, never skip ahead.
    ///
    /// # Errors
    /// `InvalidStateSize` if the length does not match the encoded chain
    /// length, `InvalidChainLength` if that length is itself malformed, and
    /// `CorruptState` if the pebbles fail any consistency check.
    pub fn from_bytes(chain: F, bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < 16 {
            return Err(Error::InvalidStateSize(bytes.len()));
        }

        let mut chain_length = [0u8; 8];
        let mut round = [0u8; 8];
        chain_length.copy_from_slice(&bytes[..8]);
        round.copy_from_slice(&bytes[8..16]);
        let chain_length = u64::from_be_bytes(chain_length);
        let round = u64::from_be_bytes(round);

        let depth = Depth::from_chain_length(chain_length)?;
        let expected = 16 + depth.0 as usize * Pebble::SIZE;
        if bytes.len() != expected {
            return Err(Error::InvalidStateSize(bytes.len()));
        }
        if round > chain_length {
            return Err(Error::CorruptState("round beyond the chain length"));
        }

        let pebbles = bytes[16..]
            .chunks(Pebble::SIZE)
            .map(Pebble::from_bytes)
            .collect::<Result<Vec<_>, _>>()?;
        let pebbles = PebbleSet::from_parts(depth, round, pebbles)?;

        Ok(Traversal {
            chain,
            round,
            pebbles,
        })
    }
}
