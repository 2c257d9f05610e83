//! Seedable random source for all musical choices.
//!
//! Every random decision in a drone session (root, scale, waveforms,
//! modulation picks, walk steps) flows through a PCG32 generator seeded
//! per session, so tests can inject a fixed seed and replay a session
//! deterministically.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Create the session RNG from a 64-bit seed.
pub fn create_rng(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

/// Derive an independent seed for a sub-component (e.g. the noise bed),
/// so audio-rate randomness does not perturb the musical stream.
pub fn derive_seed(seed: u64, key: &str) -> u64 {
    // splitmix64-style finalizer over seed + key bytes
    let mut x = seed;
    for &b in key.as_bytes() {
        x = x.wrapping_add(b as u64).wrapping_add(0x9E37_79B9_7F4A_7C15);
        x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        x ^= x >> 31;
    }
    x
}

/// Pick a uniform random index into a collection of the given length.
pub fn pick_index(rng: &mut Pcg32, len: usize) -> usize {
    rng.gen_range(0..len)
}

/// Pick a uniform random element from a slice.
pub fn pick<'a, T>(rng: &mut Pcg32, items: &'a [T]) -> &'a T {
    &items[pick_index(rng, items.len())]
}

/// In-place shuffle: repeatedly swap the last unprocessed element with a
/// uniformly random earlier-or-equal element, shrinking the unprocessed
/// range by one each step.
pub fn shuffle<T>(rng: &mut Pcg32, items: &mut [T]) {
    let mut counter = items.len();
    while counter > 0 {
        let index = rng.gen_range(0..counter);
        counter -= 1;
        items.swap(counter, index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rng_deterministic_per_seed() {
        let mut a = create_rng(42);
        let mut b = create_rng(42);
        let va: Vec<u32> = (0..50).map(|_| a.gen_range(0..1000)).collect();
        let vb: Vec<u32> = (0..50).map(|_| b.gen_range(0..1000)).collect();
        assert_eq!(va, vb);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = create_rng(1);
        let mut b = create_rng(2);
        let va: Vec<u32> = (0..20).map(|_| a.gen_range(0..1000)).collect();
        let vb: Vec<u32> = (0..20).map(|_| b.gen_range(0..1000)).collect();
        assert_ne!(va, vb);
    }

    #[test]
    fn derived_seeds_independent() {
        let noise = derive_seed(7, "noise");
        let walk = derive_seed(7, "walk");
        assert_ne!(noise, walk);
        assert_eq!(noise, derive_seed(7, "noise"));
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = create_rng(99);
        let original: Vec<i32> = (0..23).collect();
        let mut shuffled = original.clone();
        shuffle(&mut rng, &mut shuffled);

        assert_eq!(shuffled.len(), original.len());
        let mut sorted = shuffled.clone();
        sorted.sort();
        assert_eq!(sorted, original, "shuffle must preserve the multiset");
    }

    #[test]
    fn shuffle_handles_empty_and_single() {
        let mut rng = create_rng(3);
        let mut empty: Vec<i32> = vec![];
        shuffle(&mut rng, &mut empty);
        assert!(empty.is_empty());

        let mut one = vec![5];
        shuffle(&mut rng, &mut one);
        assert_eq!(one, vec![5]);
    }

    #[test]
    fn pick_stays_in_bounds() {
        let mut rng = create_rng(17);
        let items = [10, 20, 30];
        for _ in 0..100 {
            let v = *pick(&mut rng, &items);
            assert!(items.contains(&v));
        }
    }
}
