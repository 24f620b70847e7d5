use colored::*;
use prettytable::{color, Attr, Cell, Row, Table};

use crate::output::{format_bytes, Report, Reporter};

const HEADERS: [&str; 7] = ["Slot", "Address", "Size", "Category", "Status", "Seq", "Origin"];

pub(crate) fn build_table(report: &Report, use_colors: bool) -> Table {
    let mut table = Table::new();

    let header_cells: Vec<Cell> = HEADERS
        .iter()
        .map(|header| {
            if use_colors {
                Cell::new(header)
                    .with_style(Attr::Bold)
                    .with_style(Attr::ForegroundColor(color::CYAN))
            } else {
                Cell::new(header).with_style(Attr::Bold)
            }
        })
        .collect();
    table.add_row(Row::new(header_cells));

    for block in &report.blocks {
        table.add_row(Row::new(vec![
            Cell::new(&block.slot.to_string()),
            Cell::new(&format!("{:#x}", block.address)),
            Cell::new(&format_bytes(block.size as u64)),
            Cell::new(&block.category.to_string()),
            Cell::new(&block.status.to_string()),
            Cell::new(&block.sequence.to_string()),
            Cell::new(&block.origin.to_string()),
        ]));
    }

    table
}

fn display_table(report: &Report) {
    let use_colors = std::env::var("NO_COLOR").is_err();

    println!(
        "{} outstanding blocks ({}/{} slots in use)",
        "[memtrack]".blue().bold(),
        report.total_blocks,
        report.capacity
    );

    build_table(report, use_colors).printstd();

    println!(
        "{}: {} blocks, {} ({} bytes)",
        "Summary".yellow().bold(),
        report.total_blocks,
        format_bytes(report.total_bytes as u64),
        report.total_bytes
    );
}

fn display_no_blocks_message(report: &Report) {
    println!(
        "{} No outstanding blocks ({} slots free)",
        "[memtrack]".blue().bold(),
        report.capacity
    );
}

pub(crate) struct TextReporter;

impl Reporter for TextReporter {
    fn report(&self, report: &Report) -> Result<(), Box<dyn std::error::Error>> {
        print!("{}", report.to_text());
        Ok(())
    }
}

pub(crate) struct TableReporter;

impl Reporter for TableReporter {
    fn report(&self, report: &Report) -> Result<(), Box<dyn std::error::Error>> {
        if report.is_empty() {
            display_no_blocks_message(report);
            return Ok(());
        }

        display_table(report);
        Ok(())
    }
}

pub(crate) struct JsonReporter;

impl Reporter for JsonReporter {
    fn report(&self, report: &Report) -> Result<(), Box<dyn std::error::Error>> {
        println!("{}", serde_json::to_string(report)?);
        Ok(())
    }
}

pub(crate) struct JsonPrettyReporter;

impl Reporter for JsonPrettyReporter {
    fn report(&self, report: &Report) -> Result<(), Box<dyn std::error::Error>> {
        println!("{}", serde_json::to_string_pretty(report)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Category, Origin, Status};
    use crate::output::BlockEntry;

    #[test]
    fn test_table_has_header_and_one_row_per_block() {
        let report = Report {
            blocks: vec![BlockEntry {
                slot: 2,
                address: 0xbeef,
                size: 4096,
                category: Category::Persistent,
                status: Status::Allocated,
                sequence: 9,
                origin: Origin::new("lib.rs", 40),
            }],
            total_blocks: 1,
            total_bytes: 4096,
            capacity: 10,
        };

        let table = build_table(&report, false);
        assert_eq!(table.len(), 2);

        let rendered = table.to_string();
        assert!(rendered.contains("0xbeef"));
        assert!(rendered.contains("4.0 KB"));
        assert!(rendered.contains("Persistent"));
        assert!(rendered.contains("lib.rs:40"));
    }
}
