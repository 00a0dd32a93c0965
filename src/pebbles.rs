//! Checkpoint pebbles and their scheduling.
//!
//! The chain positions in `(0, n)` are split by their lowest set bit: a
//! position with lowest set bit `k >= 1` is held by the pebble at level
//! `k - 1`, while odd positions are derived on demand with a single hash from
//! the even anchor directly below them. Position zero (the seed itself) is
//! anchored permanently at level `t - 1` and released in the final round.
//!
//! A level `k - 1` pebble sweeps its targets downwards in strides of
//! `2^(k+1)`. When a target is consumed, the pebble copies its next
//! construction source from a strictly higher level (or the seed anchor) and
//! rebuilds with `2^k` hash steps, applying at most two of them per round.
//! Two steps per round is the rate that makes every handoff provable: an
//! adjacent-level source finishes its own rebuild exactly one round before
//! the copy takes place.
use crate::common::{ChainValue, Depth, Seed, VALUE_SIZE};
use crate::errors::Error;
use crate::traits::ChainFunction;
use zeroize::Zeroize;

#[cfg(feature = "serde_enabled")]
use serde::{Deserialize, Serialize};

/// Steps applied per pebble per round while a rebuild is in progress.
const STEPS_PER_ROUND: u64 = 2;

/// A partially- or fully-constructed checkpoint of the chain. The pebble is
/// ripe once `steps_remaining` reaches zero, at which point `value` is the
/// chain element at `target_position`.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize)]
#[zeroize(drop)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct Pebble {
    level: u32,
    target_position: u64,
    steps_remaining: u64,
    value: ChainValue,
}

impl Pebble {
    /// Byte size of a serialized pebble:
    /// ( level || target_position || steps_remaining || value )
    pub const SIZE: usize = 4 + 8 + 8 + VALUE_SIZE;

    /// Level of this pebble, in `[0, log2(n))`.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// The chain position this pebble is ripening towards.
    pub fn target_position(&self) -> u64 {
        self.target_position
    }

    /// Hash applications left until the pebble holds its target exactly.
    pub fn steps_remaining(&self) -> u64 {
        self.steps_remaining
    }

    /// A pebble is ripe when its value is the element at `target_position`.
    pub fn is_ripe(&self) -> bool {
        self.steps_remaining == 0
    }

    fn advance<F: ChainFunction>(&mut self, chain: &F) {
        let budget = self.steps_remaining.min(STEPS_PER_ROUND);
        for _ in 0..budget {
            self.value = chain.apply_once(&self.value);
        }
        self.steps_remaining -= budget;
    }

    /// Convert `Self` into its byte representation. The encoding returns the
    /// following array of size `Self::SIZE`, all integers big endian:
    /// ( level || target_position || steps_remaining || value )
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut data = [0u8; Self::SIZE];
        data[..4].copy_from_slice(&self.level.to_be_bytes());
        data[4..12].copy_from_slice(&self.target_position.to_be_bytes());
        data[12..20].copy_from_slice(&self.steps_remaining.to_be_bytes());
        data[20..].copy_from_slice(self.value.as_bytes());
        data
    }

    /// Convert the slice of bytes into `Self`.
    ///
    /// # Errors
    /// The function fails if `bytes.len()` is not of the expected size.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != Self::SIZE {
            return Err(Error::InvalidStateSize(bytes.len()));
        }

        let mut level = [0u8; 4];
        let mut target = [0u8; 8];
        let mut steps = [0u8; 8];
        level.copy_from_slice(&bytes[..4]);
        target.copy_from_slice(&bytes[4..12]);
        steps.copy_from_slice(&bytes[12..20]);
        let value = ChainValue::from_bytes(&bytes[20..])?;

        Ok(Pebble {
            level: u32::from_be_bytes(level),
            target_position: u64::from_be_bytes(target),
            steps_remaining: u64::from_be_bytes(steps),
            value,
        })
    }
}

/// The set of live checkpoints of a traversal: exactly `log2(n)` pebbles
/// with pairwise-distinct levels, regardless of the round.
#[derive(Debug, Clone, Zeroize)]
#[zeroize(drop)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct PebbleSet {
    #[zeroize(skip)]
    depth: Depth,
    pebbles: Vec<Pebble>,
}

impl PebbleSet {
    /// Build the initial pebble set by walking the chain once from the seed.
    /// The seed is consumed: its bytes become the level `t - 1` anchor and
    /// the local copy is wiped on drop. Returns the set together with the
    /// chain commitment, i.e. the element at position `n`.
    ///
    /// This is the one-time O(n) setup cost; every later operation is
    /// logarithmic in the chain length.
    pub fn bootstrap<F: ChainFunction>(
        chain: &F,
        seed: Seed,
        depth: Depth,
    ) -> (PebbleSet, ChainValue) {
        let t = depth.0 as usize;
        let n = depth.total();
        let x0 = seed.into_value();

        // Record the element at n - 2^k for every level k - 1 on the way up.
        let mut checkpoints: Vec<Option<ChainValue>> = vec![None; t - 1];
        let mut current = x0.clone();
        for position in 1..n {
            current = chain.apply_once(&current);
            let gap = n - position;
            if gap.is_power_of_two() {
                let k = gap.trailing_zeros() as usize;
                if k >= 1 && k < t {
                    checkpoints[k - 1] = Some(current.clone());
                }
            }
        }
        let commitment = chain.apply_once(&current);

        let mut pebbles = Vec::with_capacity(t);
        for (i, checkpoint) in checkpoints.iter_mut().enumerate() {
            pebbles.push(Pebble {
                level: i as u32,
                target_position: n - (1u64 << (i + 1)),
                steps_remaining: 0,
                value: checkpoint.take().expect("recorded during bootstrap walk"),
            });
        }
        pebbles.push(Pebble {
            level: (t - 1) as u32,
            target_position: 0,
            steps_remaining: 0,
            value: x0,
        });

        (PebbleSet { depth, pebbles }, commitment)
    }

    /// Reassemble a pebble set from its parts, checking every internal
    /// consistency invariant against the given round.
    ///
    /// # Errors
    /// `CorruptState` if the pebbles cannot belong to a traversal of this
    /// depth paused after `round`.
    pub(crate) fn from_parts(depth: Depth, round: u64, pebbles: Vec<Pebble>) -> Result<Self, Error> {
        let t = depth.0 as usize;
        let n = depth.total();

        if pebbles.len() != t {
            return Err(Error::CorruptState("wrong number of pebbles"));
        }

        for (i, pebble) in pebbles.iter().enumerate() {
            if pebble.level as usize != i {
                return Err(Error::CorruptState("pebble levels out of order"));
            }
        }

        let anchor = &pebbles[t - 1];
        if anchor.target_position != 0 || anchor.steps_remaining != 0 {
            return Err(Error::CorruptState("seed anchor moved"));
        }

        for pebble in &pebbles[..t - 1] {
            let k = pebble.level + 1;
            let stride = 1u64 << k;
            let p = pebble.target_position;
            if p < stride || p > n - stride || (p >> k) & 1 == 0 {
                return Err(Error::CorruptState("target off the pebble's lattice"));
            }
            if pebble.steps_remaining > stride {
                return Err(Error::CorruptState("steps exceed the rebuild stride"));
            }
            let release_round = n - p;
            if release_round < round {
                // Already released: this level is spent and must sit idle.
                if p >> k != 1 || pebble.steps_remaining != 0 {
                    return Err(Error::CorruptState("released target still pending"));
                }
            } else if pebble.steps_remaining > STEPS_PER_ROUND * (release_round - round) {
                return Err(Error::CorruptState("steps inconsistent with round"));
            }
        }

        Ok(PebbleSet { depth, pebbles })
    }

    /// Depth of the chain this set belongs to.
    pub fn depth(&self) -> Depth {
        self.depth
    }

    /// The live pebbles, ordered by level.
    pub fn pebbles(&self) -> &[Pebble] {
        &self.pebbles
    }

    /// Apply this round's construction work: at most two hash steps for
    /// every pebble whose rebuild is still in progress.
    pub fn advance_round<F: ChainFunction>(&mut self, chain: &F) {
        for pebble in &mut self.pebbles {
            if !pebble.is_ripe() {
                pebble.advance(chain);
            }
        }
    }

    /// Release the chain element at `position`, assuming all pebbles have
    /// already been advanced for the current round. Even positions are taken
    /// from their ripe pebble, which is then retargeted; odd positions are
    /// derived with one extra hash from the anchor directly below.
    ///
    /// # Errors
    /// `CorruptState` if the pebble meant to serve `position` is not ripe at
    /// it. This cannot happen for a set evolved from `bootstrap`; it guards
    /// states reassembled from persisted bytes.
    pub fn release<F: ChainFunction>(
        &mut self,
        chain: &F,
        position: u64,
    ) -> Result<ChainValue, Error> {
        if position == 0 {
            let anchor = self.holder(0)?;
            return Ok(anchor.value.clone());
        }

        let k = position.trailing_zeros();
        if k == 0 {
            let anchor = self.holder(position - 1)?;
            return Ok(chain.apply_once(&anchor.value));
        }

        let index = (k - 1) as usize;
        let ripe = self
            .pebbles
            .get(index)
            .filter(|p| p.is_ripe() && p.target_position == position)
            .is_some();
        if !ripe {
            return Err(Error::CorruptState("pebble not ripe at required position"));
        }

        let released = self.pebbles[index].value.clone();
        self.reschedule(chain, index)?;
        Ok(released)
    }

    /// Point the pebble at `index` to the next position on its lattice and
    /// start the rebuild from its construction source, spending this round's
    /// step budget immediately.
    fn reschedule<F: ChainFunction>(&mut self, chain: &F, index: usize) -> Result<(), Error> {
        let k = (index + 1) as u32;
        let consumed = self.pebbles[index].target_position;

        if consumed >> k < 3 {
            // No position of this level remains below the consumed one.
            return Ok(());
        }

        let target = consumed - (1u64 << (k + 1));
        let source_position = target - (1u64 << k);
        let source = self.holder(source_position)?.value.clone();

        let pebble = &mut self.pebbles[index];
        pebble.target_position = target;
        pebble.steps_remaining = 1u64 << k;
        pebble.value = source;
        pebble.advance(chain);
        Ok(())
    }

    /// The pebble holding `position` ripe right now. Positions with lowest
    /// set bit `k` live at level `k - 1`; position zero is the seed anchor.
    fn holder(&self, position: u64) -> Result<&Pebble, Error> {
        let index = if position == 0 {
            self.pebbles.len() - 1
        } else {
            position.trailing_zeros() as usize - 1
        };
        self.pebbles
            .get(index)
            .filter(|p| p.is_ripe() && p.target_position == position)
            .ok_or(Error::CorruptState("anchor not ripe at required position"))
    }
}


#[cfg(feature = "serde_enabled")]
#[cfg(test)]
mod test_serde {
    use super::*;
    use crate::chain::Blake2bChain;

    #[test]
    fn pebble_set_json_round_trip() {
        let (set, _) = PebbleSet::bootstrap(&Blake2bChain, Seed::zero(), Depth(4));
        let json = serde_json::to_string(&set).unwrap();
        let back: PebbleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pebbles(), set.pebbles());
    }
}
