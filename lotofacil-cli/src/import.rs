use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::ValueEnum;
use tracing::{info, warn};

use lotofacil_db::db::insert_draw;
use lotofacil_db::models::{DrawRecord, EMPTY_PAYOUT, PICK_COUNT, PRIZE_TIERS, PrizeTier};
use lotofacil_db::rusqlite::Connection;

/// Column layouts accepted by the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum SchemaVersion {
    /// Official results spreadsheet: Concurso, Data Sorteio, Bola1..Bola15,
    /// Ganhadores/Rateio N acertos.
    #[default]
    Caixa,
    /// Minimal export: concurso, data, n1..n15.
    Compact,
}

impl SchemaVersion {
    pub fn default_delimiter(&self) -> u8 {
        match self {
            SchemaVersion::Caixa => b';',
            SchemaVersion::Compact => b',',
        }
    }

    fn contest_column(&self) -> &'static str {
        match self {
            SchemaVersion::Caixa => "Concurso",
            SchemaVersion::Compact => "concurso",
        }
    }

    fn date_column(&self) -> &'static str {
        match self {
            SchemaVersion::Caixa => "Data Sorteio",
            SchemaVersion::Compact => "data",
        }
    }

    fn number_column(&self, i: usize) -> String {
        match self {
            SchemaVersion::Caixa => format!("Bola{}", i),
            SchemaVersion::Compact => format!("n{}", i),
        }
    }

    fn tier_columns(&self, tier: u8) -> Option<(String, String)> {
        match self {
            SchemaVersion::Caixa => Some((
                format!("Ganhadores {} acertos", tier),
                format!("Rateio {} acertos", tier),
            )),
            SchemaVersion::Compact => None,
        }
    }
}

/// Header names resolved to column indices, once per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    contest: usize,
    date: usize,
    numbers: Vec<usize>,
    tiers: Vec<(u8, usize, usize)>,
}

impl ColumnMap {
    pub fn resolve(headers: &csv::StringRecord, schema: SchemaVersion) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .with_context(|| format!("missing column '{}' for {:?} schema", name, schema))
        };

        let contest = find(schema.contest_column())?;
        let date = find(schema.date_column())?;
        let numbers = (1..=PICK_COUNT)
            .map(|i| find(&schema.number_column(i)))
            .collect::<Result<Vec<_>>>()?;

        let mut tiers = Vec::new();
        for tier in PRIZE_TIERS {
            if let Some((winners, payout)) = schema.tier_columns(tier) {
                tiers.push((tier, find(&winners)?, find(&payout)?));
            }
        }

        Ok(Self { contest, date, numbers, tiers })
    }

    pub fn parse_record(&self, record: &csv::StringRecord) -> Result<DrawRecord> {
        let get = |idx: usize| field(record, idx);

        let raw_contest = get(self.contest)?;
        let contest: u32 = raw_contest
            .parse()
            .with_context(|| format!("cannot parse contest number '{}'", raw_contest))?;
        let date = parse_date(get(self.date)?)?;

        let numbers = self
            .numbers
            .iter()
            .map(|&idx| {
                let s = get(idx)?;
                s.parse::<u8>()
                    .with_context(|| format!("cannot parse '{}' (index {})", s, idx))
            })
            .collect::<Result<Vec<u8>>>()?;

        let mut prize_tiers = BTreeMap::new();
        for &(tier, winners_idx, payout_idx) in &self.tiers {
            let winner_count = parse_winner_count(get(winners_idx)?)?;
            let payout = match get(payout_idx)? {
                "" => EMPTY_PAYOUT.to_string(),
                s => s.to_string(),
            };
            prize_tiers.insert(tier, PrizeTier { winner_count, payout });
        }

        let draw = DrawRecord::new(contest, date, &numbers, prize_tiers)
            .with_context(|| format!("contest {} rejected", contest))?;
        Ok(draw)
    }
}

fn field(record: &csv::StringRecord, idx: usize) -> Result<&str> {
    record
        .get(idx)
        .map(str::trim)
        .with_context(|| format!("missing field at index {}", idx))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .with_context(|| format!("invalid date '{}' (expected dd/mm/yyyy)", raw))
}

/// Winner counts may carry Brazilian thousands separators ("1.234").
fn parse_winner_count(raw: &str) -> Result<u32> {
    if raw.is_empty() {
        return Ok(0);
    }
    let digits = raw.replace('.', "");
    digits
        .parse::<u32>()
        .with_context(|| format!("cannot parse winner count '{}'", raw))
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(
    conn: &Connection,
    path: &Path,
    schema: SchemaVersion,
    delimiter: Option<u8>,
) -> Result<ImportResult> {
    let reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.unwrap_or_else(|| schema.default_delimiter()))
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("cannot open {:?}", path))?;
    import_records(conn, reader, schema)
}

pub fn import_records<R: Read>(
    conn: &Connection,
    mut reader: csv::Reader<R>,
    schema: SchemaVersion,
) -> Result<ImportResult> {
    let headers = reader.headers().context("cannot read header row")?.clone();
    let columns = ColumnMap::resolve(&headers, schema)?;

    let tx = conn.unchecked_transaction()
        .context("cannot start transaction")?;

    let mut result = ImportResult::default();

    for record_result in reader.records() {
        result.total_records += 1;
        let line = result.total_records;
        match record_result {
            Ok(record) => match columns.parse_record(&record) {
                Ok(draw) => match insert_draw(&tx, &draw) {
                    Ok(true) => result.inserted += 1,
                    Ok(false) => result.skipped += 1,
                    Err(e) => {
                        warn!(line, "insert failed: {:#}", e);
                        result.errors += 1;
                    }
                },
                Err(e) => {
                    warn!(line, "parse failed: {:#}", e);
                    result.errors += 1;
                }
            },
            Err(e) => {
                warn!(line, "read failed: {}", e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("commit failed")?;

    if result.total_records == 0 {
        bail!("no data rows found");
    }
    info!(
        total = result.total_records,
        inserted = result.inserted,
        skipped = result.skipped,
        errors = result.errors,
        "import finished"
    );
    Ok(result)
}
