//! Human-readable run output on stdout

use colored::*;
use voltage_verify::{ResultRecord, Status, SummaryCounts};

/// Name column width
const NAME_WIDTH: usize = 38;
/// Names longer than this are cut
const NAME_MAX: usize = 37;
const DETAIL_INDENT: &str = "      ";

/// Shorten `name` to fit the name column, marking the cut with an ellipsis
pub fn truncate_name(name: &str) -> String {
    if name.chars().count() > NAME_MAX {
        let mut short: String = name.chars().take(NAME_MAX - 1).collect();
        short.push('…');
        short
    } else {
        name.to_string()
    }
}

/// Padded status cell, coloured unless colours are disabled
fn status_cell(status: Status) -> ColoredString {
    let cell = format!("{:<4}", status);
    match status {
        Status::Ok => cell.green(),
        Status::Warn => cell.yellow(),
        Status::Fail => cell.red().bold(),
    }
}

/// Main line for one record, with the status cell already rendered
pub fn record_line(record: &ResultRecord, status: &str) -> String {
    format!(
        "{}  slave={:>3}  fc={}  addr={:>6}  qty={:<3}  {:<width$}  -> {}",
        status,
        record.slave,
        record.fc,
        record.address,
        record.quantity,
        truncate_name(&record.name),
        record.display,
        width = NAME_WIDTH
    )
}

/// Indented description / expectation / error lines
pub fn detail_lines(record: &ResultRecord) -> Vec<String> {
    let mut lines = Vec::new();
    if !record.description.is_empty() {
        lines.push(format!("{}{}", DETAIL_INDENT, record.description));
    }
    if !record.expected.is_empty() {
        lines.push(format!("{}expect: {}", DETAIL_INDENT, record.expected));
    }
    if !record.error.is_empty() {
        lines.push(format!("{}note: {}", DETAIL_INDENT, record.error));
    }
    lines
}

/// Print one record as soon as it is produced
pub fn print_record(record: &ResultRecord) {
    let status = status_cell(record.status).to_string();
    println!("{}", record_line(record, &status));
    for line in detail_lines(record) {
        println!("{}", line);
    }
}

pub fn summary_line(counts: &SummaryCounts) -> String {
    format!(
        "Summary: OK={}  WARN={}  FAIL={}",
        counts.ok, counts.warn, counts.fail
    )
}
