use std::cell::Cell;
use std::rc::Rc;

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

use hashchain_pebbles::{
    commitment, verify, Blake2bChain, ChainFunction, ChainValue, Seed, Sha256Chain, Traversal,
    VALUE_SIZE,
};

/// Wraps a chain function and counts its applications.
#[derive(Debug, Clone)]
struct CountingChain {
    inner: Blake2bChain,
    hashes: Rc<Cell<u64>>,
}

impl CountingChain {
    fn new() -> (CountingChain, Rc<Cell<u64>>) {
        let hashes = Rc::new(Cell::new(0));
        let chain = CountingChain {
            inner: Blake2bChain,
            hashes: hashes.clone(),
        };
        (chain, hashes)
    }
}

impl ChainFunction for CountingChain {
    fn apply_once(&self, value: &ChainValue) -> ChainValue {
        self.hashes.set(self.hashes.get() + 1);
        self.inner.apply_once(value)
    }
}

#[test]
fn released_outputs_verify_against_commitment() {
    let chain = Blake2bChain;
    for t in 1..=8u32 {
        let n = 1u64 << t;
        let seed = Seed::from_bytes([t as u8; Seed::SIZE]);
        let expected = commitment(&chain, &seed, n).unwrap();
        let (mut traversal, published) = Traversal::initialize(chain, seed, n).unwrap();
        assert_eq!(published, expected);

        for round in 1..=n {
            let output = traversal.next_output().unwrap();
            assert!(verify(&chain, &published, &output, round), "n={} round={}", n, round);
            assert!(!verify(&chain, &published, &output, round + 1));
        }
    }
}

#[test]
fn outputs_match_direct_iteration() {
    let chain = Sha256Chain;
    let n = 32u64;
    let seed_bytes = [9u8; Seed::SIZE];
    let x0 = ChainValue::from_bytes(&seed_bytes).unwrap();
    let (mut traversal, published) =
        Traversal::initialize(chain, Seed::from_bytes(seed_bytes), n).unwrap();

    assert_eq!(published, chain.apply_times(&x0, n));
    for round in 1..=n {
        assert_eq!(traversal.next_output().unwrap(), chain.apply_times(&x0, n - round));
    }
}

#[test]
fn work_and_storage_stay_logarithmic() {
    for t in 1..=10u32 {
        let n = 1u64 << t;
        let (chain, hashes) = CountingChain::new();
        let (mut traversal, _) =
            Traversal::initialize(chain, Seed::from_bytes([1u8; Seed::SIZE]), n).unwrap();
        assert_eq!(hashes.get(), n, "setup walks the chain exactly once");

        hashes.set(0);
        let mut total = 0;
        for round in 1..=n {
            hashes.set(0);
            traversal.next_output().unwrap();
            let this_round = hashes.get();
            assert!(
                this_round <= 2 * t as u64 + 1,
                "n={} round={} used {} hashes",
                n,
                round,
                this_round
            );
            total += this_round;
            assert_eq!(traversal.pebbles().pebbles().len(), t as usize);
        }
        // Ordered so the intermediate stays non-negative at t = 1.
        assert_eq!(total, n * t as u64 / 2 + 2 - n);
    }
}

#[test]
fn smallest_chain_costs_one_hash_after_setup() {
    let (chain, hashes) = CountingChain::new();
    let (mut traversal, _) =
        Traversal::initialize(chain, Seed::from_bytes([2u8; Seed::SIZE]), 2).unwrap();

    hashes.set(0);
    traversal.next_output().unwrap(); // x_1, derived from the seed anchor
    traversal.next_output().unwrap(); // the seed itself
    assert_eq!(hashes.get(), 1);
}

#[test]
fn resume_after_restart_releases_the_same_sequence() {
    let chain = Blake2bChain;
    let n = 128u64;
    let (mut live, _) =
        Traversal::initialize(chain, Seed::from_bytes([5u8; Seed::SIZE]), n).unwrap();

    // Restart from persisted bytes before every single round.
    for _ in 0..n {
        let bytes = live.to_bytes();
        assert_eq!(bytes.len(), 16 + 7 * (4 + 8 + 8 + VALUE_SIZE));
        let mut resumed = Traversal::from_bytes(chain, &bytes).unwrap();
        let expected = resumed.next_output().unwrap();
        assert_eq!(live.next_output().unwrap(), expected);
    }
}

#[derive(Debug, Clone)]
struct TestSeed(Seed);

impl Arbitrary for TestSeed {
    fn arbitrary<G: Gen>(g: &mut G) -> TestSeed {
        let mut bytes = [0u8; Seed::SIZE];
        for byte in bytes.iter_mut() {
            *byte = u8::arbitrary(g);
        }
        TestSeed(Seed::from_bytes(bytes))
    }
}

#[derive(Debug, Clone, Copy)]
struct TestDepth(u32);

impl Arbitrary for TestDepth {
    fn arbitrary<G: Gen>(g: &mut G) -> TestDepth {
        TestDepth(u32::arbitrary(g) % 7 + 1)
    }
}

#[quickcheck]
fn prop_every_output_verifies(seed: TestSeed, depth: TestDepth) {
    let chain = Blake2bChain;
    let n = 1u64 << depth.0;
    let (mut traversal, published) = Traversal::initialize(chain, seed.0, n).unwrap();
    for round in 1..=n {
        let output = traversal.next_output().unwrap();
        assert!(verify(&chain, &published, &output, round));
    }
}

#[quickcheck]
fn prop_resume_is_transparent(seed: TestSeed, depth: TestDepth, cut: u64) {
    let chain = Blake2bChain;
    let n = 1u64 << depth.0;
    let cut = cut % n;
    let (mut traversal, _) = Traversal::initialize(chain, seed.0, n).unwrap();
    for _ in 0..cut {
        traversal.next_output().unwrap();
    }
    let mut resumed = Traversal::from_bytes(chain, &traversal.to_bytes()).unwrap();
    for _ in cut..n {
        assert_eq!(resumed.next_output().unwrap(), traversal.next_output().unwrap());
    }
}
