//! Statistics and bet generation over a Lotofácil draw history.
//!
//! Both entry points are pure functions of the supplied history and
//! configuration: [`get_statistics`] and [`generate_bets`].

pub mod analysis;
pub mod config;
pub mod error;
pub mod sampler;

pub use analysis::{get_statistics, StatisticsReport};
pub use config::{BetConfig, EngineConfig, SamplingPolicy, StatsConfig};
pub use error::{EngineError, EngineResult};
pub use sampler::{generate_bets, Bet, BetSlate};

#[cfg(test)]
pub(crate) fn draw(contest: u32, numbers: &[u8]) -> lotofacil_db::models::DrawRecord {
    let date = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        + chrono::Days::new(contest as u64);
    lotofacil_db::models::DrawRecord::new(contest, date, numbers, Default::default()).unwrap()
}

/// `n` contests with identical numbers.
#[cfg(test)]
pub(crate) fn repeat_draw(n: u32, numbers: &[u8]) -> lotofacil_db::models::DrawHistory {
    let draws = (1..=n).map(|c| draw(c, numbers)).collect();
    lotofacil_db::models::DrawHistory::new(draws).unwrap()
}

/// Contests 1..=n; contest c draws 15 consecutive numbers (mod 25) starting at
/// `3c`, so every number shows up with slightly different frequencies.
#[cfg(test)]
pub(crate) fn make_test_draws(n: usize) -> lotofacil_db::models::DrawHistory {
    let draws = (1..=n)
        .map(|c| {
            let numbers: Vec<u8> = (0..15).map(|j| ((c * 3 + j) % 25) as u8 + 1).collect();
            draw(c as u32, &numbers)
        })
        .collect();
    lotofacil_db::models::DrawHistory::new(draws).unwrap()
}
