use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::debug;

use crate::models::{DrawHistory, DrawRecord, PrizeTier};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    contest_number  INTEGER PRIMARY KEY,
    draw_date       TEXT NOT NULL,
    numbers         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS prize_tiers (
    contest_number  INTEGER NOT NULL REFERENCES draws(contest_number),
    tier            INTEGER NOT NULL,
    winner_count    INTEGER NOT NULL DEFAULT 0,
    payout          TEXT NOT NULL DEFAULT 'R$0,00',
    PRIMARY KEY (contest_number, tier)
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lotofacil.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create directory {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("cannot open database {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("migration failed")?;
    Ok(())
}

/// Inserts a draw and its prize tiers. Returns `false` when the contest is
/// already stored; existing rows are never overwritten.
pub fn insert_draw(conn: &Connection, draw: &DrawRecord) -> Result<bool> {
    let numbers = draw
        .numbers()
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",");

    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (contest_number, draw_date, numbers) VALUES (?1, ?2, ?3)",
        rusqlite::params![draw.contest_number(), draw.draw_date(), numbers],
    ).with_context(|| format!("cannot insert contest {}", draw.contest_number()))?;

    if changed == 0 {
        return Ok(false);
    }

    for (tier, prize) in draw.prize_tiers() {
        conn.execute(
            "INSERT INTO prize_tiers (contest_number, tier, winner_count, payout) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![draw.contest_number(), tier, prize.winner_count, prize.payout],
        ).with_context(|| format!("cannot insert tier {} of contest {}", tier, draw.contest_number()))?;
    }

    Ok(true)
}

/// Most recent `limit` draws, newest first.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<DrawRecord>> {
    fetch_draws(conn, limit as i64)
}

/// Every stored draw as a validated history.
pub fn fetch_history(conn: &Connection) -> Result<DrawHistory> {
    let draws = fetch_draws(conn, -1)?;
    let history = DrawHistory::new(draws).context("stored history is inconsistent")?;
    Ok(history)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

pub fn latest_contest(conn: &Connection) -> Result<Option<u32>> {
    let latest: Option<u32> = conn.query_row(
        "SELECT MAX(contest_number) FROM draws",
        [],
        |row| row.get(0),
    )?;
    Ok(latest)
}

// SQLite treats a negative LIMIT as "no limit".
fn fetch_draws(conn: &Connection, limit: i64) -> Result<Vec<DrawRecord>> {
    let mut tiers = fetch_tiers(conn, limit)?;

    let mut stmt = conn.prepare(
        "SELECT contest_number, draw_date, numbers
         FROM draws ORDER BY contest_number DESC LIMIT ?1"
    )?;
    let rows = stmt.query_map([limit], |row| {
        Ok((
            row.get::<_, u32>(0)?,
            row.get::<_, NaiveDate>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?.collect::<Result<Vec<_>, _>>()?;

    let draws = rows
        .into_iter()
        .map(|(contest, date, numbers)| {
            let numbers = parse_numbers(&numbers)
                .with_context(|| format!("contest {}: corrupt number list", contest))?;
            let prize_tiers = tiers.remove(&contest).unwrap_or_default();
            DrawRecord::new(contest, date, &numbers, prize_tiers)
                .with_context(|| format!("contest {}: invalid stored draw", contest))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(count = draws.len(), "fetched draws");
    Ok(draws)
}

fn fetch_tiers(conn: &Connection, limit: i64) -> Result<HashMap<u32, BTreeMap<u8, PrizeTier>>> {
    let mut stmt = conn.prepare(
        "SELECT t.contest_number, t.tier, t.winner_count, t.payout
         FROM prize_tiers t
         JOIN (SELECT contest_number FROM draws ORDER BY contest_number DESC LIMIT ?1) d
           ON d.contest_number = t.contest_number"
    )?;
    let rows = stmt.query_map([limit], |row| {
        Ok((
            row.get::<_, u32>(0)?,
            row.get::<_, u8>(1)?,
            PrizeTier {
                winner_count: row.get(2)?,
                payout: row.get(3)?,
            },
        ))
    })?.collect::<Result<Vec<_>, _>>()?;

    let mut by_contest: HashMap<u32, BTreeMap<u8, PrizeTier>> = HashMap::new();
    for (contest, tier, prize) in rows {
        by_contest.entry(contest).or_default().insert(tier, prize);
    }
    Ok(by_contest)
}

fn parse_numbers(s: &str) -> Result<Vec<u8>> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<u8>()
                .with_context(|| format!("cannot parse '{}'", part))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_draw(contest: u32, day: u32) -> DrawRecord {
        let numbers: Vec<u8> = (1..=15).collect();
        let tiers = BTreeMap::from([
            (15, PrizeTier { winner_count: 1, payout: "R$1.800.000,00".to_string() }),
            (11, PrizeTier { winner_count: 300_000, payout: "R$6,00".to_string() }),
        ]);
        DrawRecord::new(
            contest,
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            &numbers,
            tiers,
        ).unwrap()
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_count() {
        let conn = memory_db();
        assert_eq!(count_draws(&conn).unwrap(), 0);

        insert_draw(&conn, &test_draw(1, 1)).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = memory_db();

        let inserted = insert_draw(&conn, &test_draw(1, 1)).unwrap();
        assert!(inserted);
        let inserted = insert_draw(&conn, &test_draw(1, 1)).unwrap();
        assert!(!inserted);
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_fetch_order() {
        let conn = memory_db();

        insert_draw(&conn, &test_draw(1, 1)).unwrap();
        insert_draw(&conn, &test_draw(3, 5)).unwrap();
        insert_draw(&conn, &test_draw(2, 3)).unwrap();

        let draws = fetch_last_draws(&conn, 10).unwrap();
        let contests: Vec<u32> = draws.iter().map(|d| d.contest_number()).collect();
        assert_eq!(contests, vec![3, 2, 1]);

        let draws = fetch_last_draws(&conn, 2).unwrap();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].contest_number(), 3);
    }

    #[test]
    fn test_roundtrip_preserves_record() {
        let conn = memory_db();
        let draw = test_draw(42, 9);
        insert_draw(&conn, &draw).unwrap();

        let history = fetch_history(&conn).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0], draw);
        assert_eq!(history[0].prize_tiers()[&11].winner_count, 300_000);
    }

    #[test]
    fn test_latest_contest() {
        let conn = memory_db();
        assert_eq!(latest_contest(&conn).unwrap(), None);

        insert_draw(&conn, &test_draw(5, 1)).unwrap();
        insert_draw(&conn, &test_draw(9, 2)).unwrap();
        assert_eq!(latest_contest(&conn).unwrap(), Some(9));
    }
}
