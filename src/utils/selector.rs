//! Weighted prize selection.
//!
//! Selection is a cumulative-distribution inversion over the eligible
//! candidates in the order they are given: candidate `i` wins iff the roll lies
//! in `[sum(weight[..i]), sum(weight[..=i]))`. Only the roll is random, so a
//! fixed order and a fixed roll always reproduce the same winner.

use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};

/// Anything that can take part in a weighted draw.
pub trait Weighted {
    fn weight(&self) -> u64;
    fn remaining(&self) -> i64;

    fn is_selectable(&self) -> bool {
        self.weight() > 0 && self.remaining() > 0
    }
}

/// Sum of weights over selectable candidates.
pub fn total_weight<T: Weighted>(candidates: &[T]) -> u64 {
    candidates
        .iter()
        .filter(|c| c.is_selectable())
        .map(Weighted::weight)
        .sum()
}

/// Maps a roll in `[0, total_weight)` to the index of the winning candidate.
///
/// Returns `None` when nothing is selectable or the roll is out of range.
pub fn pick_with_roll<T: Weighted>(candidates: &[T], roll: u64) -> Option<usize> {
    let mut acc = 0u64;
    for (idx, c) in candidates.iter().enumerate() {
        if !c.is_selectable() {
            continue;
        }
        acc += c.weight();
        if roll < acc {
            return Some(idx);
        }
    }
    None
}

/// Picks one candidate with a cryptographically secure generator.
pub fn pick<T, R>(candidates: &[T], rng: &mut R) -> Option<usize>
where
    T: Weighted,
    R: RngCore + CryptoRng,
{
    let total = total_weight(candidates);
    if total == 0 {
        return None;
    }
    let roll = rng.gen_range(0..total);
    pick_with_roll(candidates, roll)
}

/// [`pick`] backed by the operating system's CSPRNG.
pub fn pick_secure<T: Weighted>(candidates: &[T]) -> Option<usize> {
    pick(candidates, &mut OsRng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Slot {
        weight: u64,
        remaining: i64,
    }

    impl Weighted for Slot {
        fn weight(&self) -> u64 {
            self.weight
        }
        fn remaining(&self) -> i64 {
            self.remaining
        }
    }

    fn slot(weight: u64, remaining: i64) -> Slot {
        Slot { weight, remaining }
    }

    #[test]
    fn roll_maps_to_cumulative_ranges() {
        let slots = vec![slot(1, 5), slot(3, 5), slot(6, 5)];
        assert_eq!(pick_with_roll(&slots, 0), Some(0));
        assert_eq!(pick_with_roll(&slots, 1), Some(1));
        assert_eq!(pick_with_roll(&slots, 3), Some(1));
        assert_eq!(pick_with_roll(&slots, 4), Some(2));
        assert_eq!(pick_with_roll(&slots, 9), Some(2));
        assert_eq!(pick_with_roll(&slots, 10), None);
    }

    #[test]
    fn exhausted_and_zero_weight_slots_are_skipped() {
        let slots = vec![slot(5, 0), slot(0, 10), slot(2, 1), slot(3, 1)];
        assert_eq!(total_weight(&slots), 5);
        assert_eq!(pick_with_roll(&slots, 0), Some(2));
        assert_eq!(pick_with_roll(&slots, 1), Some(2));
        assert_eq!(pick_with_roll(&slots, 2), Some(3));
    }

    #[test]
    fn empty_pool_has_no_winner() {
        let slots = vec![slot(5, 0), slot(0, 3)];
        assert_eq!(pick_secure(&slots), None);
        assert_eq!(pick_secure::<Slot>(&[]), None);
    }

    #[test]
    fn frequencies_match_weights() {
        let slots = vec![
            slot(1, i64::MAX),
            slot(2, i64::MAX),
            slot(3, i64::MAX),
            slot(14, i64::MAX),
        ];
        let trials = 100_000u64;
        let mut counts = [0u64; 4];
        for _ in 0..trials {
            let idx = pick_secure(&slots).unwrap();
            counts[idx] += 1;
        }

        let total = total_weight(&slots) as f64;
        let chi_squared: f64 = slots
            .iter()
            .zip(counts.iter())
            .map(|(s, &observed)| {
                let expected = trials as f64 * s.weight as f64 / total;
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();
        // df = 3, p = 0.0001
        assert!(chi_squared < 21.11, "chi-squared too large: {chi_squared}");
    }
}
