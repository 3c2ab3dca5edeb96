//! Random derangements: permutations where nobody is mapped to themselves.

use std::{collections::HashSet, hash::Hash};

use rand::{seq::SliceRandom, Rng};
use serde::Deserialize;
use thiserror::Error;

/// How a derangement is sampled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerangementPolicy {
    /// Shuffle, then everyone gifts the next person in the shuffled order.
    ///
    /// The result is always a single cycle through all participants, so only a subset of the
    /// derangements can come out. Never needs a retry.
    #[default]
    SingleCycle,
    /// Shuffle the targets until nobody gets themselves.
    ///
    /// Uniform over all derangements, about `e` shuffles on average.
    Uniform,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DerangementError {
    #[error("At least 2 participants are needed, got {count}")]
    InsufficientParticipants { count: usize },
    #[error("Participants must be distinct")]
    DuplicateParticipant,
}

/// Pairs every item with a different item so that each one appears exactly once on each side.
///
/// Pairs are returned as `(giver, receiver)`.
pub fn derange<T, R>(
    items: &[T],
    policy: DerangementPolicy,
    rng: &mut R,
) -> Result<Vec<(T, T)>, DerangementError>
where
    T: Copy + Eq + Hash,
    R: Rng + ?Sized,
{
    if items.len() < 2 {
        return Err(DerangementError::InsufficientParticipants { count: items.len() });
    }

    let mut seen = HashSet::with_capacity(items.len());
    if !items.iter().all(|item| seen.insert(*item)) {
        return Err(DerangementError::DuplicateParticipant);
    }

    let pairs = match policy {
        DerangementPolicy::SingleCycle => single_cycle(items, rng),
        DerangementPolicy::Uniform => uniform(items, rng),
    };

    Ok(pairs)
}

fn single_cycle<T: Copy, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<(T, T)> {
    let mut order = items.to_vec();
    order.shuffle(rng);

    let successors = order.iter().cycle().skip(1);
    order.iter().copied().zip(successors.copied()).collect()
}

fn uniform<T: Copy + Eq, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<(T, T)> {
    let mut targets = items.to_vec();

    loop {
        targets.shuffle(rng);

        if items.iter().zip(&targets).all(|(giver, target)| giver != target) {
            break;
        }
    }

    items.iter().copied().zip(targets).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use map_macro::hash_map;
    use rand::{rngs::StdRng, SeedableRng};
    use test_log::test;

    use super::{derange, DerangementError, DerangementPolicy};

    const POLICIES: [DerangementPolicy; 2] =
        [DerangementPolicy::SingleCycle, DerangementPolicy::Uniform];

    fn assert_derangement(items: &[u32], pairs: &[(u32, u32)]) {
        assert_eq!(pairs.len(), items.len());

        let mut givers = pairs.iter().map(|(giver, _)| *giver).collect::<Vec<_>>();
        let mut receivers = pairs.iter().map(|(_, receiver)| *receiver).collect::<Vec<_>>();
        let mut expected = items.to_vec();
        givers.sort();
        receivers.sort();
        expected.sort();

        assert_eq!(givers, expected);
        assert_eq!(receivers, expected);
        assert!(pairs.iter().all(|(giver, receiver)| giver != receiver));
    }

    fn cycle_lengths(pairs: &[(u32, u32)]) -> Vec<usize> {
        let targets = pairs.iter().copied().collect::<HashMap<_, _>>();
        let mut visited = Vec::new();
        let mut lengths = Vec::new();

        for (start, _) in pairs {
            if visited.contains(start) {
                continue;
            }

            let mut length = 0;
            let mut current = *start;
            loop {
                visited.push(current);
                length += 1;
                current = targets[&current];
                if current == *start {
                    break;
                }
            }
            lengths.push(length);
        }

        lengths
    }

    #[test]
    fn too_few_participants() {
        let mut rng = StdRng::seed_from_u64(1);

        for policy in POLICIES {
            assert_eq!(
                derange::<u32, _>(&[], policy, &mut rng),
                Err(DerangementError::InsufficientParticipants { count: 0 })
            );
            assert_eq!(
                derange(&[7u32], policy, &mut rng),
                Err(DerangementError::InsufficientParticipants { count: 1 })
            );
        }
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut rng = StdRng::seed_from_u64(2);

        for policy in POLICIES {
            assert_eq!(
                derange(&[1u32, 2, 1], policy, &mut rng),
                Err(DerangementError::DuplicateParticipant)
            );
        }
    }

    #[test]
    fn two_participants_swap() {
        let mut rng = StdRng::seed_from_u64(3);

        for policy in POLICIES {
            for _ in 0..20 {
                let pairs = derange(&[1u32, 2], policy, &mut rng)
                    .unwrap()
                    .into_iter()
                    .collect::<HashMap<_, _>>();
                assert_eq!(pairs, hash_map! { 1 => 2, 2 => 1 });
            }
        }
    }

    #[test]
    fn valid_for_many_sizes() {
        let mut rng = StdRng::seed_from_u64(4);

        for policy in POLICIES {
            for size in 2..=60u32 {
                let items = (100..100 + size).collect::<Vec<_>>();
                for _ in 0..5 {
                    let pairs = derange(&items, policy, &mut rng).unwrap();
                    assert_derangement(&items, &pairs);
                }
            }
        }
    }

    #[test]
    fn single_cycle_visits_everyone() {
        let mut rng = StdRng::seed_from_u64(5);
        let items = (1..=12).collect::<Vec<u32>>();

        for _ in 0..50 {
            let pairs = derange(&items, DerangementPolicy::SingleCycle, &mut rng).unwrap();
            assert_eq!(cycle_lengths(&pairs), vec![12]);
        }
    }

    #[test]
    fn uniform_produces_shorter_cycles() {
        let mut rng = StdRng::seed_from_u64(6);
        let items = [1u32, 2, 3, 4];

        // 3 of the 9 derangements of 4 items are two swaps.
        let found_swaps = (0..300).any(|_| {
            let pairs = derange(&items, DerangementPolicy::Uniform, &mut rng).unwrap();
            cycle_lengths(&pairs) == vec![2, 2]
        });

        assert!(found_swaps);
    }

    #[test]
    fn policy_names() {
        #[derive(serde::Deserialize)]
        struct Config {
            policy: DerangementPolicy,
        }

        let config: Config = envy::from_iter([("POLICY".to_string(), "uniform".to_string())])
            .unwrap();
        assert_eq!(config.policy, DerangementPolicy::Uniform);

        let config: Config =
            envy::from_iter([("POLICY".to_string(), "single_cycle".to_string())]).unwrap();
        assert_eq!(config.policy, DerangementPolicy::SingleCycle);
    }
}
