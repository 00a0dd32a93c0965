//! Traits that define the one-way function driving a hash chain
use crate::common::ChainValue;

/// The one-way function from which the chain is built. Implementations must
/// be pure and deterministic: the traversal assumes that hashing the element
/// at position `p` always yields the element at position `p + 1`.
///
/// The same implementation must be used to generate the chain, to traverse
/// it, and to verify released values against the commitment.
///
/// # Example
/// ```
/// use hashchain_pebbles::traits::ChainFunction;
/// use hashchain_pebbles::{Blake2bChain, ChainValue};
///
/// let chain = Blake2bChain;
/// let x0 = ChainValue::from_bytes(&[0u8; 32]).unwrap();
/// let x2 = chain.apply_times(&x0, 2);
/// assert_eq!(chain.apply_once(&chain.apply_once(&x0)), x2);
/// ```
pub trait ChainFunction {
    /// One invocation of the one-way function.
    fn apply_once(&self, value: &ChainValue) -> ChainValue;

    /// `count` sequential invocations of the one-way function. Used for
    /// bootstrap and verification; the per-round hot path only ever applies
    /// single steps.
    fn apply_times(&self, value: &ChainValue, count: u64) -> ChainValue {
        let mut current = value.clone();
        for _ in 0..count {
            current = self.apply_once(&current);
        }
        current
    }
}
