//! Ready-made instantiations of the one-way function, plus the caller-side
//! commitment and verification helpers.
use crate::common::{ChainValue, Depth, Seed, VALUE_SIZE};
use crate::errors::Error;
use crate::traits::ChainFunction;
use blake2::digest::{Update, VariableOutput};
use blake2::VarBlake2b;
use sha2::{Digest, Sha256};

/// Chain function backed by Blake2b with a 32 byte output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake2bChain;

impl ChainFunction for Blake2bChain {
    fn apply_once(&self, value: &ChainValue) -> ChainValue {
        let mut out = [0u8; VALUE_SIZE];
        let mut h = VarBlake2b::new(VALUE_SIZE).expect("valid size");
        h.update(value.as_bytes());
        h.finalize_variable(|res| out.copy_from_slice(res));
        ChainValue(out)
    }
}

/// Chain function backed by SHA-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Chain;

impl ChainFunction for Sha256Chain {
    fn apply_once(&self, value: &ChainValue) -> ChainValue {
        let mut out = [0u8; VALUE_SIZE];
        out.copy_from_slice(&Sha256::digest(value.as_bytes()));
        ChainValue(out)
    }
}

/// Compute the public commitment of a chain, i.e. the element at position
/// `chain_length` obtained by hashing the seed `chain_length` times. The
/// commitment is what the caller publishes; every released value is later
/// checked against it.
///
/// # Errors
/// Fails with `InvalidChainLength` unless `chain_length` is a power of two
/// of at least two.
pub fn commitment<F: ChainFunction>(
    chain: &F,
    seed: &Seed,
    chain_length: u64,
) -> Result<ChainValue, Error> {
    let depth = Depth::from_chain_length(chain_length)?;
    let x0 = seed.clone().into_value();
    Ok(chain.apply_times(&x0, depth.total()))
}

/// Verify a value released at round `round` against the chain commitment.
/// A genuine value at round `round` sits `round` hash applications below the
/// commitment, so the check needs no trust in the traversal state.
pub fn verify<F: ChainFunction>(
    chain: &F,
    commitment: &ChainValue,
    value: &ChainValue,
    round: u64,
) -> bool {
    &chain.apply_times(value, round) == commitment
}
