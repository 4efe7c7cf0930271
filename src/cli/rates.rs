use super::ui;
use crate::core::currency::CurrencyCode;
use crate::core::fetcher::QuoteFetcher;
use crate::core::quote::QuoteSource;
use crate::core::rates::{DisplayRow, compare_snapshots};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::{Cell, Table};

/// How the previous snapshot of the live view is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Latest rates against the calendar day before.
    PreviousDay,
    /// The two most recent trading days of the past week.
    TradingDays,
}

pub async fn run(
    source: &(dyn QuoteSource + Send + Sync),
    base: &CurrencyCode,
    watchlist: &[CurrencyCode],
    comparison: Comparison,
    as_of: NaiveDate,
) -> Result<()> {
    let fetcher = QuoteFetcher::new(source);

    let spinner = ui::new_spinner("Fetching exchange rates...");
    let pair = match comparison {
        Comparison::PreviousDay => fetcher.live(base, as_of).await,
        Comparison::TradingDays => fetcher.recent(base, as_of).await,
    };
    spinner.finish_and_clear();

    let Some(pair) = pair else {
        println!(
            "{}",
            ui::style_text("No rate data available right now.", ui::StyleType::Error)
        );
        return Ok(());
    };

    let rows = select_rows(compare_snapshots(&pair.current, &pair.previous), watchlist);
    if rows.is_empty() {
        println!("No rates found for the selected currencies.");
        return Ok(());
    }

    println!(
        "\n{} {}",
        ui::style_text(&format!("Exchange rates in {base}"), ui::StyleType::Title),
        ui::style_text(
            &format!("(compared with {})", pair.previous.date),
            ui::StyleType::Subtle
        )
    );
    println!("{}", rates_table(base, &rows));
    Ok(())
}

/// Keeps the watchlist order. An empty watchlist keeps every row.
fn select_rows(rows: Vec<DisplayRow>, watchlist: &[CurrencyCode]) -> Vec<DisplayRow> {
    if watchlist.is_empty() {
        return rows;
    }
    watchlist
        .iter()
        .filter_map(|code| rows.iter().find(|row| &row.code == code).cloned())
        .collect()
}

fn rates_table(base: &CurrencyCode, rows: &[DisplayRow]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Unit"),
        ui::header_cell("Buying"),
        ui::header_cell("Sales"),
        ui::header_cell("Change"),
        ui::header_cell("Date"),
    ]);

    for row in rows {
        table.add_row(vec![
            Cell::new(format!("{}/{}", row.code, base)),
            ui::rate_cell(row.buying),
            ui::rate_cell(row.sales),
            ui::change_cell(row.change_pct),
            Cell::new(row.date.to_string()),
        ]);
    }
    table
}
