use super::ui;
use crate::core::analytics::SeriesSummary;
use crate::core::currency::CurrencyCode;
use crate::core::fetcher::QuoteFetcher;
use crate::core::quote::QuoteSource;
use crate::core::rates::{DisplayRow, format_rate, normalize_series, series_rows};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{Cell, Table};

pub async fn run(
    source: &(dyn QuoteSource + Send + Sync),
    base: &CurrencyCode,
    target: &CurrencyCode,
    days: u32,
    as_of: NaiveDate,
) -> Result<()> {
    let fetcher = QuoteFetcher::new(source);

    let spinner = ui::new_spinner(&format!("Fetching {target}/{base} history..."));
    let raw = fetcher.history(base, target, days, as_of).await;
    spinner.finish_and_clear();

    if raw.is_empty() {
        println!("No history available for {target}/{base}.");
        return Ok(());
    }

    let series = normalize_series(&raw)
        .with_context(|| format!("Received an unusable {target} rate in the history"))?;
    let summary = SeriesSummary::from_series(&series)?;

    println!(
        "\n{} {}",
        ui::style_text(&format!("{target} / {base}"), ui::StyleType::Title),
        ui::style_text(&summary.current.date.to_string(), ui::StyleType::Subtle)
    );
    let change = ui::format_change(summary.change.pct);
    let change = if ui::is_gain(summary.change.pct) {
        ui::style_text(&change, ui::StyleType::Success)
    } else {
        ui::style_text(&change, ui::StyleType::Error)
    };
    println!("{}  {}", format_rate(summary.current.rate), change);

    println!("{}", stats_table(&summary, days));
    println!("{}", daily_table(base, &series_rows(target, &series)));
    Ok(())
}

fn stats_table(summary: &SeriesSummary, days: u32) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Open"),
        ui::header_cell(&format!("High ({days}d)")),
        ui::header_cell(&format!("Low ({days}d)")),
        ui::header_cell(&format!("Average ({days}d)")),
    ]);
    table.add_row(vec![
        ui::rate_cell(summary.stats.open),
        ui::rate_cell(summary.stats.high),
        ui::rate_cell(summary.stats.low),
        ui::rate_cell(summary.stats.average),
    ]);
    table
}

fn daily_table(base: &CurrencyCode, rows: &[DisplayRow]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell(&format!("Rate ({base})")),
        ui::header_cell("Buying"),
        ui::header_cell("Sales"),
        ui::header_cell("Change"),
    ]);

    // Newest first.
    for row in rows.iter().rev() {
        table.add_row(vec![
            Cell::new(row.date.to_string()),
            ui::rate_cell(row.rate),
            ui::rate_cell(row.buying),
            ui::rate_cell(row.sales),
            ui::change_cell(row.change_pct),
        ]);
    }
    table
}
