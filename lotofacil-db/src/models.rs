use std::collections::BTreeMap;
use std::ops::Deref;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Highest number that can be drawn (numbers run 1..=25).
pub const POOL_SIZE: u8 = 25;
/// Numbers drawn per contest.
pub const PICK_COUNT: usize = 15;
/// Prize tiers by number of hits, best first.
pub const PRIZE_TIERS: [u8; 5] = [15, 14, 13, 12, 11];
/// Payout shown for a tier nobody won.
pub const EMPTY_PAYOUT: &str = "R$0,00";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRecord {
    #[error("expected 15 numbers, got {0}")]
    WrongCount(usize),

    #[error("number {0} out of range (1-25)")]
    OutOfRange(u8),

    #[error("duplicate number: {0}")]
    Duplicate(u8),

    #[error("contest number must be positive, got {0}")]
    InvalidContest(u32),

    #[error("unknown prize tier: {0} hits")]
    UnknownTier(u8),

    #[error("contest {0} appears more than once")]
    DuplicateContest(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrizeTier {
    pub winner_count: u32,
    pub payout: String,
}

impl PrizeTier {
    pub fn empty() -> Self {
        Self {
            winner_count: 0,
            payout: EMPTY_PAYOUT.to_string(),
        }
    }
}

/// One published contest. Fields are private so a record can only exist
/// through [`DrawRecord::new`], which enforces the 15-distinct-in-range rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawRecord {
    contest_number: u32,
    draw_date: NaiveDate,
    numbers: [u8; PICK_COUNT],
    prize_tiers: BTreeMap<u8, PrizeTier>,
}

impl DrawRecord {
    pub fn new(
        contest_number: u32,
        draw_date: NaiveDate,
        numbers: &[u8],
        prize_tiers: BTreeMap<u8, PrizeTier>,
    ) -> Result<Self, InvalidRecord> {
        if contest_number == 0 {
            return Err(InvalidRecord::InvalidContest(contest_number));
        }
        if let Some(&tier) = prize_tiers.keys().find(|t| !PRIZE_TIERS.contains(t)) {
            return Err(InvalidRecord::UnknownTier(tier));
        }
        let numbers = validate_numbers(numbers)?;
        Ok(Self {
            contest_number,
            draw_date,
            numbers,
            prize_tiers,
        })
    }

    pub fn contest_number(&self) -> u32 {
        self.contest_number
    }

    pub fn draw_date(&self) -> NaiveDate {
        self.draw_date
    }

    /// Drawn numbers, sorted ascending.
    pub fn numbers(&self) -> &[u8; PICK_COUNT] {
        &self.numbers
    }

    pub fn prize_tiers(&self) -> &BTreeMap<u8, PrizeTier> {
        &self.prize_tiers
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.binary_search(&number).is_ok()
    }

    pub fn sum(&self) -> u32 {
        self.numbers.iter().map(|&n| n as u32).sum()
    }

    pub fn even_count(&self) -> usize {
        self.numbers.iter().filter(|&&n| n % 2 == 0).count()
    }

    /// Tiers 15 down to 11, with unpublished tiers reported as nobody winning.
    pub fn tiers_descending(&self) -> Vec<(u8, PrizeTier)> {
        PRIZE_TIERS
            .iter()
            .map(|&tier| {
                let prize = self.prize_tiers.get(&tier).cloned().unwrap_or_else(PrizeTier::empty);
                (tier, prize)
            })
            .collect()
    }
}

/// Checks the 15-distinct-numbers-in-[1,25] rule and returns the numbers sorted.
pub fn validate_numbers(numbers: &[u8]) -> Result<[u8; PICK_COUNT], InvalidRecord> {
    if numbers.len() != PICK_COUNT {
        return Err(InvalidRecord::WrongCount(numbers.len()));
    }
    let mut seen = [false; POOL_SIZE as usize + 1];
    for &n in numbers {
        if n < 1 || n > POOL_SIZE {
            return Err(InvalidRecord::OutOfRange(n));
        }
        if seen[n as usize] {
            return Err(InvalidRecord::Duplicate(n));
        }
        seen[n as usize] = true;
    }
    let mut sorted = [0u8; PICK_COUNT];
    sorted.copy_from_slice(numbers);
    sorted.sort_unstable();
    Ok(sorted)
}

/// Draws deduplicated by contest number, most recent first (`history[0]` is
/// the latest contest).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawHistory {
    draws: Vec<DrawRecord>,
}

impl DrawHistory {
    pub fn new(mut draws: Vec<DrawRecord>) -> Result<Self, InvalidRecord> {
        draws.sort_by(|a, b| b.contest_number.cmp(&a.contest_number));
        if let Some(pair) = draws
            .windows(2)
            .find(|w| w[0].contest_number == w[1].contest_number)
        {
            return Err(InvalidRecord::DuplicateContest(pair[0].contest_number));
        }
        Ok(Self { draws })
    }

    pub fn latest(&self) -> Option<&DrawRecord> {
        self.draws.first()
    }

    pub fn into_inner(self) -> Vec<DrawRecord> {
        self.draws
    }
}

impl Deref for DrawHistory {
    type Target = [DrawRecord];

    fn deref(&self) -> &Self::Target {
        &self.draws
    }
}
