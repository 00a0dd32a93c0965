//! Amortized traversal of a one-way hash chain.
//!
//! "Fractal Hash Sequence Representation and Traversal"
//! By Markus Jakobsson
//! <https://eprint.iacr.org/2002/001>
//!
//! A chain of length `n = 2^t` is generated from a secret seed by iterating a
//! one-way function, and its endpoint is published as a commitment. The
//! traversal then releases the chain elements one per round in reverse
//! generation order, keeping `t` checkpoint pebbles alive and performing a
//! logarithmic number of hash applications per round.
#![warn(missing_docs, rust_2018_idioms)]

mod common;
mod errors;
pub mod chain;
pub mod pebbles;
pub mod traits;
pub mod traversal;

pub use crate::chain::{commitment, verify, Blake2bChain, Sha256Chain};
pub use crate::common::{ChainValue, Depth, Seed, VALUE_SIZE};
pub use crate::errors::Error;
pub use crate::traits::ChainFunction;
pub use crate::traversal::Traversal;
