use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use lotofacil_db::models::{DrawHistory, DrawRecord, PICK_COUNT, POOL_SIZE};

use crate::config::StatsConfig;
use crate::error::{EngineError, EngineResult};

/// Occurrences of every number 1..=25 over a window of recent draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyTable {
    counts: [u32; POOL_SIZE as usize],
    draws_counted: usize,
}

impl FrequencyTable {
    /// Count for `number`, which must lie in 1..=25.
    pub fn count(&self, number: u8) -> u32 {
        self.counts[(number - 1) as usize]
    }

    pub fn draws_counted(&self) -> usize {
        self.draws_counted
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &c)| ((i + 1) as u8, c))
    }

    /// All numbers, most frequent first; equal counts by ascending number.
    pub fn ranking(&self) -> Vec<NumberCount> {
        let mut ranked: Vec<NumberCount> = self
            .iter()
            .map(|(number, count)| NumberCount { number, count })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.number.cmp(&b.number)));
        ranked
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberCount {
    pub number: u8,
    pub count: u32,
}

/// Draws elapsed since a number last came out (0 = in the latest draw).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberGap {
    pub number: u8,
    pub gap: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParitySplit {
    pub even: f64,
    pub odd: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatestDraw {
    pub contest_number: u32,
    pub draw_date: NaiveDate,
    pub numbers: [u8; PICK_COUNT],
}

impl From<&DrawRecord> for LatestDraw {
    fn from(draw: &DrawRecord) -> Self {
        Self {
            contest_number: draw.contest_number(),
            draw_date: draw.draw_date(),
            numbers: *draw.numbers(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub total_draws: usize,
    /// Draws actually counted for the hot/cold lists.
    pub hot_cold_window: usize,
    /// Draws actually scanned for overdue numbers.
    pub overdue_window: usize,
    pub latest: LatestDraw,
    pub most_frequent: Vec<NumberCount>,
    pub least_frequent: Vec<NumberCount>,
    pub overdue: Vec<u8>,
    pub average_sum: f64,
    pub parity: ParitySplit,
    /// Index `d` holds how many drawn numbers end in digit `d`.
    pub digit_endings: [u32; 10],
    pub gaps: Vec<NumberGap>,
}

/// Counts each number over the `window` most recent draws (`draws[0]` is
/// the latest). Shorter histories are counted in full.
pub fn compute_frequency(draws: &[DrawRecord], window: usize) -> FrequencyTable {
    let mut counts = [0u32; POOL_SIZE as usize];
    let mut draws_counted = 0;

    for draw in draws.iter().take(window) {
        for &n in draw.numbers() {
            counts[(n - 1) as usize] += 1;
        }
        draws_counted += 1;
    }

    FrequencyTable { counts, draws_counted }
}

/// The `k` most frequent numbers (k is capped at 25).
pub fn top_frequent(freq: &FrequencyTable, k: usize) -> Vec<NumberCount> {
    freq.ranking().into_iter().take(k).collect()
}

/// The `k` least frequent numbers, least frequent first.
///
/// This is the tail of [`FrequencyTable::ranking`] read backwards, so with
/// `2k <= 25` it never shares a number with [`top_frequent`], even when
/// counts tie.
pub fn bottom_frequent(freq: &FrequencyTable, k: usize) -> Vec<NumberCount> {
    freq.ranking().into_iter().rev().take(k).collect()
}

/// Numbers absent from the `recent_window` most recent draws, ascending.
pub fn overdue_numbers(draws: &[DrawRecord], recent_window: usize) -> Vec<u8> {
    let mut seen = [false; POOL_SIZE as usize];
    for draw in draws.iter().take(recent_window) {
        for &n in draw.numbers() {
            seen[(n - 1) as usize] = true;
        }
    }
    (1..=POOL_SIZE).filter(|&n| !seen[(n - 1) as usize]).collect()
}

pub fn average_sum(draws: &[DrawRecord]) -> EngineResult<f64> {
    if draws.is_empty() {
        return Err(EngineError::InsufficientData("average sum of an empty history"));
    }
    let total: u64 = draws.iter().map(|d| d.sum() as u64).sum();
    Ok(total as f64 / draws.len() as f64)
}

/// Mean even and odd counts per draw. Not rounded.
pub fn average_parity(draws: &[DrawRecord]) -> EngineResult<ParitySplit> {
    if draws.is_empty() {
        return Err(EngineError::InsufficientData("parity split of an empty history"));
    }
    let evens: usize = draws.iter().map(|d| d.even_count()).sum();
    let odds = draws.len() * PICK_COUNT - evens;
    let n = draws.len() as f64;
    Ok(ParitySplit {
        even: evens as f64 / n,
        odd: odds as f64 / n,
    })
}

/// Over the whole supplied history, how many drawn numbers end in each digit.
pub fn digit_ending_distribution(draws: &[DrawRecord]) -> [u32; 10] {
    let mut endings = [0u32; 10];
    for draw in draws {
        for &n in draw.numbers() {
            endings[(n % 10) as usize] += 1;
        }
    }
    endings
}

/// Current gap of every number; numbers never drawn get `draws.len()`.
pub fn number_gaps(draws: &[DrawRecord]) -> Vec<NumberGap> {
    let mut gaps: [Option<u32>; POOL_SIZE as usize] = [None; POOL_SIZE as usize];

    for (t, draw) in draws.iter().enumerate() {
        for &n in draw.numbers() {
            let slot = &mut gaps[(n - 1) as usize];
            if slot.is_none() {
                *slot = Some(t as u32);
            }
        }
    }

    (1..=POOL_SIZE)
        .map(|number| NumberGap {
            number,
            gap: gaps[(number - 1) as usize].unwrap_or(draws.len() as u32),
        })
        .collect()
}

/// Builds the full report. Fails on an empty history rather than reporting zeros.
pub fn get_statistics(history: &DrawHistory, config: &StatsConfig) -> EngineResult<StatisticsReport> {
    config.validate()?;
    let latest = history
        .latest()
        .ok_or(EngineError::InsufficientData("no draws in history"))?;

    let freq = compute_frequency(history, config.hot_cold_window);
    debug!(
        draws = history.len(),
        window = freq.draws_counted(),
        "computed hot/cold frequencies"
    );

    Ok(StatisticsReport {
        total_draws: history.len(),
        hot_cold_window: freq.draws_counted(),
        overdue_window: config.overdue_window.min(history.len()),
        latest: LatestDraw::from(latest),
        most_frequent: top_frequent(&freq, config.ranking_size),
        least_frequent: bottom_frequent(&freq, config.ranking_size),
        overdue: overdue_numbers(history, config.overdue_window),
        average_sum: average_sum(history)?,
        parity: average_parity(history)?,
        digit_endings: digit_ending_distribution(history),
        gaps: number_gaps(history),
    })
}
