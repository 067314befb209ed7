//! Output formatting for finished reports.
//!
//! Supports an aligned plain-text table, JSON, and CSV, each written to any
//! [`std::io::Write`].

use anyhow::Result;
use clap::ValueEnum;
use csv::WriterBuilder;
use std::io::Write;
use tracing::debug;

use crate::analyzers::types::{AggregatedRow, Report};

const HEADERS: [&str; 5] = [
    "City/District",
    "Region",
    "Transaction Count",
    "Transaction Amount",
    "Average Transaction Amount",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &Report) {
    debug!("{:#?}", report);
}

pub fn write_report<W: Write>(out: W, report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => write_table(out, report),
        OutputFormat::Json => write_json(out, report),
        OutputFormat::Csv => write_csv(out, report),
    }
}

/// Writes the report as pretty-printed JSON.
pub fn write_json<W: Write>(mut out: W, report: &Report) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;
    Ok(())
}

/// Writes a header, one record per row, and the totals record last.
pub fn write_csv<W: Write>(out: W, report: &Report) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);

    writer.write_record(HEADERS)?;
    let totals = report.totals.as_row();
    for row in report.rows.iter().chain(std::iter::once(&totals)) {
        writer.write_record([
            row.name.clone(),
            row.region.clone(),
            row.count.to_string(),
            row.amount.to_string(),
            row.average.to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes an aligned text table with whole-number, comma-grouped values.
pub fn write_table<W: Write>(mut out: W, report: &Report) -> Result<()> {
    let totals = report.totals.as_row();
    let cells: Vec<[String; 5]> = report
        .rows
        .iter()
        .chain(std::iter::once(&totals))
        .map(table_cells)
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    writeln!(out, "{} {}", report.selection, report.period)?;
    write_line(&mut out, &HEADERS.map(String::from), &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(out, "{}", rule.join("  "))?;
    for row in &cells {
        write_line(&mut out, row, &widths)?;
    }

    Ok(())
}

fn table_cells(row: &AggregatedRow) -> [String; 5] {
    [
        row.name.clone(),
        row.region.clone(),
        format_number(row.count as f64),
        format_number(row.amount),
        format_number(row.average),
    ]
}

fn write_line<W: Write>(out: &mut W, cells: &[String; 5], widths: &[usize; 5]) -> Result<()> {
    writeln!(
        out,
        "{:<w0$}  {:<w1$}  {:>w2$}  {:>w3$}  {:>w4$}",
        cells[0],
        cells[1],
        cells[2],
        cells[3],
        cells[4],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
        w4 = widths[4],
    )?;
    Ok(())
}

/// Rounds to a whole number and groups thousands with commas.
pub fn format_number(value: f64) -> String {
    let rounded = format!("{:.0}", value);
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) if rest != "0" => ("-", rest),
        Some(rest) => ("", rest),
        None => ("", rounded.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}")
}
