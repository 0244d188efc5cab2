use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};

use crate::import::ImportResult;
use lotofacil_db::models::DrawRecord;
use lotofacil_engine::{BetSlate, StatisticsReport};

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:02}", n))
        .collect::<Vec<_>>()
        .join(" ")
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn display_draws(draws: &[DrawRecord]) {
    if draws.is_empty() {
        println!("No draws to display.");
        return;
    }

    let mut table = new_table(vec!["Contest", "Date", "Numbers", "15-hit winners"]);

    for draw in draws {
        let winners = draw
            .prize_tiers()
            .get(&15)
            .map(|p| p.winner_count.to_string())
            .unwrap_or_else(|| "—".to_string());

        table.add_row(vec![
            draw.contest_number().to_string(),
            draw.draw_date().format("%d/%m/%Y").to_string(),
            join_numbers(draw.numbers()),
            winners,
        ]);
    }

    println!("{table}");
}

pub fn display_latest(draw: &DrawRecord) {
    println!(
        "\nContest {} — {}",
        draw.contest_number(),
        draw.draw_date().format("%d/%m/%Y")
    );
    println!("{}\n", join_numbers(draw.numbers()));

    let mut table = new_table(vec!["Tier", "Winners", "Payout"]);
    for (tier, prize) in draw.tiers_descending() {
        table.add_row(vec![
            format!("{} hits", tier),
            prize.winner_count.to_string(),
            prize.payout,
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import finished:");
    println!("  Rows read          : {}", result.total_records);
    println!("  Inserted           : {}", result.inserted);
    println!("  Duplicates skipped : {}", result.skipped);
    if result.errors > 0 {
        println!("  Errors             : {}", result.errors);
    }
}

pub fn display_stats(report: &StatisticsReport) {
    println!(
        "\nStatistics over {} draws (latest: contest {}, {})\n",
        report.total_draws,
        report.latest.contest_number,
        report.latest.draw_date.format("%d/%m/%Y")
    );

    println!("── Hot and cold (last {} draws) ──", report.hot_cold_window);
    let mut table = new_table(vec!["Rank", "Hot", "Count", "Cold", "Count"]);
    for (i, (hot, cold)) in report
        .most_frequent
        .iter()
        .zip(report.least_frequent.iter())
        .enumerate()
    {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format!("{:02}", hot.number)).fg(Color::Red),
            Cell::new(hot.count),
            Cell::new(format!("{:02}", cold.number)).fg(Color::Blue),
            Cell::new(cold.count),
        ]);
    }
    println!("{table}");

    let overdue = if report.overdue.is_empty() {
        "none".to_string()
    } else {
        join_numbers(&report.overdue)
    };
    println!("\nAbsent from the last {} draws: {}", report.overdue_window, overdue);
    println!("Average sum: {:.1}", report.average_sum);
    println!(
        "Average split: {:.1} even / {:.1} odd",
        report.parity.even, report.parity.odd
    );

    println!("\n── Final digit ──");
    let mut table = new_table(vec!["Digit", "Count"]);
    for (digit, count) in report.digit_endings.iter().enumerate() {
        table.add_row(vec![digit.to_string(), count.to_string()]);
    }
    println!("{table}");

    println!("\n── Draws since last seen ──");
    let mut gaps = report.gaps.clone();
    gaps.sort_by(|a, b| b.gap.cmp(&a.gap).then(a.number.cmp(&b.number)));
    let mut table = new_table(vec!["Number", "Gap"]);
    for gap in gaps.iter().filter(|g| g.gap > 0) {
        table.add_row(vec![format!("{:02}", gap.number), gap.gap.to_string()]);
    }
    println!("{table}");
}

pub fn display_bets(slate: &BetSlate) {
    println!(
        "\nBets generated {} — anchors: {}\n",
        slate.generated_at.format("%Y-%m-%d %H:%M"),
        join_numbers(&slate.anchors)
    );

    let mut table = new_table(vec!["#", "Numbers", "Even", "Kind"]);
    for (i, bet) in slate.bets.iter().enumerate() {
        let kind = if bet.is_anchored() {
            Cell::new("anchored").fg(Color::Green)
        } else {
            Cell::new("random")
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(join_numbers(bet.numbers())),
            Cell::new(bet.even_count()),
            kind,
        ]);
    }
    println!("{table}");
}
