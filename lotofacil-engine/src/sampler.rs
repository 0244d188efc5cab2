use std::collections::HashSet;
use std::ops::RangeInclusive;

use chrono::{DateTime, Local};
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, warn};

use lotofacil_db::models::{validate_numbers, DrawHistory, PICK_COUNT, POOL_SIZE};

use crate::analysis::{compute_frequency, top_frequent, FrequencyTable};
use crate::config::{BetConfig, SamplingPolicy};
use crate::error::{EngineError, EngineResult};

/// Accepted even counts when the parity constraint is on.
pub const BALANCED_EVENS: RangeInclusive<usize> = 7..=8;

/// A complete 15-number bet, sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Bet {
    numbers: [u8; PICK_COUNT],
    anchored: bool,
}

impl Bet {
    fn from_picks(mut picks: Vec<u8>, anchored: bool) -> Self {
        debug_assert!(validate_numbers(&picks).is_ok(), "malformed bet {:?}", picks);
        picks.sort_unstable();
        let mut numbers = [0u8; PICK_COUNT];
        numbers.copy_from_slice(&picks);
        Self { numbers, anchored }
    }

    pub fn numbers(&self) -> &[u8; PICK_COUNT] {
        &self.numbers
    }

    /// Whether the bet was built on the anchor set.
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.binary_search(&number).is_ok()
    }

    pub fn even_count(&self) -> usize {
        self.numbers.iter().filter(|&&n| n % 2 == 0).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BetSlate {
    pub generated_at: DateTime<Local>,
    /// Anchor numbers, most frequent first.
    pub anchors: Vec<u8>,
    pub bets: Vec<Bet>,
}

/// The `count` most frequent numbers of the table, ties by ascending number.
pub fn anchor_set(freq: &FrequencyTable, count: usize) -> Vec<u8> {
    top_frequent(freq, count).into_iter().map(|c| c.number).collect()
}

/// Builds `total_bets` distinct bets; the first `anchored_bets` contain the
/// anchor set, the rest are drawn uniformly from the whole pool.
///
/// Histories shorter than `min_history` are refused with
/// [`EngineError::InsufficientHistory`]; there is no random fallback.
pub fn generate_bets(history: &DrawHistory, config: &BetConfig) -> EngineResult<BetSlate> {
    config.validate()?;
    if history.len() < config.min_history {
        return Err(EngineError::InsufficientHistory {
            required: config.min_history,
            available: history.len(),
        });
    }

    let freq = compute_frequency(history, config.anchor_window);
    let anchors = anchor_set(&freq, config.anchor_count);
    if config.enforce_parity && config.anchored_bets > 0 {
        check_parity_reachable(&anchors)?;
    }
    debug!(
        window = freq.draws_counted(),
        anchors = ?anchors,
        policy = ?config.sampling,
        "selected anchor set"
    );

    let mut rng: StdRng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    let mut seen: HashSet<[u8; PICK_COUNT]> = HashSet::with_capacity(config.total_bets);
    let mut bets = Vec::with_capacity(config.total_bets);

    for i in 0..config.total_bets {
        let anchored = i < config.anchored_bets;
        let (base, policy) = if anchored {
            (anchors.as_slice(), config.sampling)
        } else {
            (&[][..], SamplingPolicy::Uniform)
        };

        let bet = accept_bet(base, policy, anchored, &freq, config, &seen, &mut rng)?;
        seen.insert(*bet.numbers());
        bets.push(bet);
    }

    Ok(BetSlate {
        generated_at: Local::now(),
        anchors,
        bets,
    })
}

/// Anchors with more than 8 even (or 8 odd) numbers can never reach a 7/8 split.
fn check_parity_reachable(anchors: &[u8]) -> EngineResult<()> {
    let even = anchors.iter().filter(|&&n| n % 2 == 0).count();
    let odd = anchors.len() - even;
    let max_side = *BALANCED_EVENS.end();
    if even > max_side || odd > max_side {
        return Err(EngineError::ParityUnsatisfiable { even, odd });
    }
    Ok(())
}

/// Rejection sampling, bounded by `max_attempts`.
fn accept_bet(
    base: &[u8],
    policy: SamplingPolicy,
    anchored: bool,
    freq: &FrequencyTable,
    config: &BetConfig,
    seen: &HashSet<[u8; PICK_COUNT]>,
    rng: &mut StdRng,
) -> EngineResult<Bet> {
    for attempt in 1..=config.max_attempts {
        let bet = Bet::from_picks(complete_bet(base, policy, freq, rng)?, anchored);

        if config.enforce_parity && !BALANCED_EVENS.contains(&bet.even_count()) {
            continue;
        }
        if seen.contains(bet.numbers()) {
            continue;
        }
        if attempt > 1 {
            debug!(attempt, "bet accepted after rejections");
        }
        return Ok(bet);
    }

    warn!(attempts = config.max_attempts, anchored, "gave up sampling a bet");
    Err(EngineError::SamplingExhausted {
        attempts: config.max_attempts,
    })
}

/// Extends `base` to 15 numbers, sampling without replacement.
fn complete_bet(
    base: &[u8],
    policy: SamplingPolicy,
    freq: &FrequencyTable,
    rng: &mut StdRng,
) -> EngineResult<Vec<u8>> {
    let mut picks = Vec::with_capacity(PICK_COUNT);
    picks.extend_from_slice(base);
    let mut candidates: Vec<u8> = (1..=POOL_SIZE).filter(|n| !base.contains(n)).collect();

    while picks.len() < PICK_COUNT {
        let idx = match policy {
            SamplingPolicy::Uniform => rng.random_range(0..candidates.len()),
            SamplingPolicy::FrequencyWeighted => {
                let weights: Vec<u32> = candidates.iter().map(|&n| freq.count(n) + 1).collect();
                let dist = WeightedIndex::new(&weights)
                    .map_err(|e| EngineError::Sampling(e.to_string()))?;
                dist.sample(rng)
            }
        };
        picks.push(candidates.swap_remove(idx));
    }

    Ok(picks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{draw, make_test_draws, repeat_draw};

    const LOW: [u8; 15] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

    fn seeded(seed: u64) -> BetConfig {
        BetConfig { seed: Some(seed), ..BetConfig::default() }
    }

    fn assert_valid(bet: &Bet) {
        assert!(validate_numbers(bet.numbers()).is_ok(), "invalid bet {:?}", bet.numbers());
        assert!(bet.numbers().windows(2).all(|w| w[0] < w[1]), "unsorted bet {:?}", bet.numbers());
    }

    #[test]
    fn test_bets_are_valid() {
        let history = make_test_draws(60);
        for seed in 0..20 {
            let slate = generate_bets(&history, &seeded(seed)).unwrap();
            assert_eq!(slate.bets.len(), 7);
            slate.bets.iter().for_each(assert_valid);
        }
    }

    #[test]
    fn test_anchored_bets_contain_anchors() {
        let history = make_test_draws(60);
        let slate = generate_bets(&history, &seeded(3)).unwrap();
        assert_eq!(slate.anchors.len(), 4);

        for (i, bet) in slate.bets.iter().enumerate() {
            assert_eq!(bet.is_anchored(), i < 5);
            if bet.is_anchored() {
                assert!(slate.anchors.iter().all(|&a| bet.contains(a)), "bet {i} misses anchors");
            }
        }
    }

    #[test]
    fn test_anchor_set_follows_frequency() {
        // 7 and 19 in every draw, the rest rotating through the other 23.
        let others: Vec<u8> = (1..=25).filter(|&n| n != 7 && n != 19).collect();
        let draws = (0..20)
            .map(|c| {
                let mut numbers = vec![7u8, 19];
                numbers.extend((0..13).map(|j| others[(c * 13 + j) % others.len()]));
                draw(c as u32 + 1, &numbers)
            })
            .collect();
        let history = DrawHistory::new(draws).unwrap();
        let freq = compute_frequency(&history, 50);
        assert_eq!(anchor_set(&freq, 2), vec![7, 19]);
    }

    #[test]
    fn test_empty_history_refused() {
        let result = generate_bets(&DrawHistory::default(), &BetConfig::default());
        assert!(matches!(
            result,
            Err(EngineError::InsufficientHistory { required: 10, available: 0 })
        ));
    }

    #[test]
    fn test_min_history_threshold() {
        assert!(matches!(
            generate_bets(&make_test_draws(9), &seeded(1)),
            Err(EngineError::InsufficientHistory { required: 10, available: 9 })
        ));
        assert!(generate_bets(&make_test_draws(10), &seeded(1)).is_ok());
    }

    #[test]
    fn test_bets_distinct_within_slate() {
        let history = make_test_draws(60);
        let config = BetConfig { total_bets: 40, anchored_bets: 30, ..seeded(11) };
        let slate = generate_bets(&history, &config).unwrap();
        let unique: HashSet<_> = slate.bets.iter().map(|b| *b.numbers()).collect();
        assert_eq!(unique.len(), 40);
    }

    #[test]
    fn test_parity_enforced() {
        let history = make_test_draws(60);
        for seed in 0..10 {
            let config = BetConfig { enforce_parity: true, ..seeded(seed) };
            let slate = generate_bets(&history, &config).unwrap();
            for bet in &slate.bets {
                assert!(BALANCED_EVENS.contains(&bet.even_count()), "even count {}", bet.even_count());
            }
        }
    }

    #[test]
    fn test_parity_unreachable_fails_fast() {
        // Every even number plus 1, 3 and 5. All counts tie, so the top 12
        // are 1..=6 then 8, 10, .., 18: nine even anchors.
        let numbers: [u8; 15] = [1, 2, 3, 4, 5, 6, 8, 10, 12, 14, 16, 18, 20, 22, 24];
        let history = repeat_draw(20, &numbers);
        let config = BetConfig { anchor_count: 12, enforce_parity: true, ..seeded(1) };
        let result = generate_bets(&history, &config);
        assert!(matches!(result, Err(EngineError::ParityUnsatisfiable { even: 9, odd: 3 })));
    }

    #[test]
    fn test_sampling_exhausted_is_bounded() {
        // Fifteen anchors leave a single possible anchored bet.
        let history = repeat_draw(20, &LOW);
        let config = BetConfig {
            anchor_count: 15,
            anchored_bets: 2,
            total_bets: 2,
            max_attempts: 50,
            ..seeded(1)
        };
        let result = generate_bets(&history, &config);
        assert!(matches!(result, Err(EngineError::SamplingExhausted { attempts: 50 })));
    }

    #[test]
    fn test_full_anchor_set_needs_no_sampling() {
        let history = repeat_draw(20, &LOW);
        let config = BetConfig { anchor_count: 15, anchored_bets: 1, total_bets: 1, ..seeded(1) };
        let slate = generate_bets(&history, &config).unwrap();
        assert_eq!(slate.bets[0].numbers(), &LOW);
    }

    #[test]
    fn test_seed_determinism() {
        let history = make_test_draws(60);
        let a = generate_bets(&history, &seeded(123)).unwrap();
        let b = generate_bets(&history, &seeded(123)).unwrap();
        assert_eq!(a.anchors, b.anchors);
        assert_eq!(a.bets, b.bets);
    }

    #[test]
    fn test_unseeded_calls_differ() {
        let history = make_test_draws(60);
        let config = BetConfig::default();
        let slates: HashSet<Vec<[u8; PICK_COUNT]>> = (0..100)
            .map(|_| {
                let slate = generate_bets(&history, &config).unwrap();
                slate.bets.iter().map(|b| *b.numbers()).collect()
            })
            .collect();
        assert!(slates.len() >= 99, "only {} distinct slates out of 100", slates.len());
    }

    #[test]
    fn test_weighted_policy_favours_frequent_numbers() {
        // 1..=15 drawn every time, 16..=25 never.
        let history = repeat_draw(50, &LOW);
        let low_share = |sampling: SamplingPolicy| {
            let config = BetConfig {
                total_bets: 50,
                anchored_bets: 50,
                sampling,
                ..seeded(5)
            };
            let slate = generate_bets(&history, &config).unwrap();
            let lows: usize = slate
                .bets
                .iter()
                .map(|b| b.numbers().iter().filter(|&&n| n <= 15).count())
                .sum();
            lows as f64 / slate.bets.len() as f64
        };

        // Weighted bets must still be distinct, so they cannot all be LOW.
        assert!(low_share(SamplingPolicy::FrequencyWeighted) > 12.0);
        assert!(low_share(SamplingPolicy::Uniform) < 11.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let history = make_test_draws(60);
        let config = BetConfig { anchored_bets: 9, ..BetConfig::default() };
        assert!(matches!(generate_bets(&history, &config), Err(EngineError::InvalidConfig(_))));
    }
}
