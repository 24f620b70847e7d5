use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::block::{Category, Origin, Status};
use crate::heap::HeapSource;
use crate::registry::Registry;

pub const JSON_ENV: &str = "MEMTRACK_JSON";

/// One outstanding block as it appears in a report.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BlockEntry {
    pub slot: usize,
    pub address: usize,
    pub size: usize,
    pub category: Category,
    pub status: Status,
    pub sequence: u64,
    pub origin: Origin,
}

/// Point-in-time copy of a registry's contents.
///
/// Blocks come first, in slot order, followed by the totals. The [`fmt::Display`]
/// impl renders the plain-text report, which contains no colour codes or
/// timestamps, so two reports of the same state are byte-identical.
///
/// # Examples
///
/// ```rust
/// use memtrack::{Category, Origin, Registry};
///
/// let mut registry = Registry::new();
/// let ptr = registry
///     .track_allocate(32, Origin::new("main.rs", 3), Category::Dynamic)
///     .unwrap();
///
/// let report = registry.snapshot();
/// assert_eq!(report.total_blocks, 1);
/// assert_eq!(report.total_bytes, 32);
/// assert!(report.to_string().contains("Total Allocated: 32 bytes"));
///
/// unsafe { registry.track_free(ptr.as_ptr(), Origin::new("main.rs", 9)) };
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub blocks: Vec<BlockEntry>,
    pub total_blocks: usize,
    pub total_bytes: usize,
    pub capacity: usize,
}

impl Report {
    pub fn from_registry<H: HeapSource>(registry: &Registry<H>) -> Self {
        let blocks = registry
            .blocks()
            .map(|(slot, record)| BlockEntry {
                slot,
                address: record.address,
                size: record.size,
                category: record.category,
                status: record.status,
                sequence: record.sequence,
                origin: record.origin.clone(),
            })
            .collect();

        Self {
            blocks,
            total_blocks: registry.outstanding_count(),
            total_bytes: registry.outstanding_bytes(),
            capacity: registry.capacity(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Print to stdout in `format`, unless `MEMTRACK_JSON` overrides it.
    pub fn print(&self, format: Format) -> Result<(), Box<dyn std::error::Error>> {
        Format::from_env(format).reporter().report(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- MEMORY ALLOCATION REPORT ---")?;
        for block in &self.blocks {
            writeln!(
                f,
                "Block {}: {:#x}, {} bytes, Type: {}, Status: {}, Seq: {}, Allocated in: {}",
                block.slot,
                block.address,
                block.size,
                block.category,
                block.status,
                block.sequence,
                block.origin
            )?;
        }
        writeln!(f, "Total Blocks: {}", self.total_blocks)?;
        writeln!(f, "Total Allocated: {} bytes", self.total_bytes)
    }
}

/// Output format for [`Registry::print_report`].
///
/// * `Text` - the plain report returned by [`Registry::generate_report`]
/// * `Table` - human-readable table (default)
/// * `Json` - compact JSON (single line)
/// * `JsonPretty` - indented JSON
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    Text,
    #[default]
    Table,
    Json,
    JsonPretty,
}

impl Format {
    /// `default`, unless `MEMTRACK_JSON` asks for JSON (`true`/`1`, or `pretty`).
    pub fn from_env(default: Format) -> Format {
        Self::from_lookup(default, |var| std::env::var(var).ok())
    }

    pub(crate) fn from_lookup<F>(default: Format, lookup: F) -> Format
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(JSON_ENV) {
            Some(v) if v.eq_ignore_ascii_case("pretty") => Format::JsonPretty,
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Format::Json,
            _ => default,
        }
    }

    pub fn reporter(self) -> Box<dyn Reporter> {
        match self {
            Format::Text => Box::new(crate::reporters::TextReporter),
            Format::Table => Box::new(crate::reporters::TableReporter),
            Format::Json => Box::new(crate::reporters::JsonReporter),
            Format::JsonPretty => Box::new(crate::reporters::JsonPrettyReporter),
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Format::Text),
            "table" => Ok(Format::Table),
            "json" => Ok(Format::Json),
            "json-pretty" | "pretty" => Ok(Format::JsonPretty),
            other => Err(format!(
                "unknown format '{other}', expected one of: text, table, json, json-pretty"
            )),
        }
    }
}

/// Trait for implementing custom report output.
///
/// # Examples
///
/// ```rust
/// use memtrack::{Report, Reporter};
/// use std::error::Error;
///
/// struct LeakCounter;
///
/// impl Reporter for LeakCounter {
///     fn report(&self, report: &Report) -> Result<(), Box<dyn Error>> {
///         eprintln!("{} blocks still live", report.total_blocks);
///         Ok(())
///     }
/// }
/// ```
pub trait Reporter: Send + Sync {
    fn report(&self, report: &Report) -> Result<(), Box<dyn std::error::Error>>;
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log(THRESHOLD).floor() as usize).min(UNITS.len() - 1);
    let unit_value = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", unit_value, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        Report {
            blocks: vec![
                BlockEntry {
                    slot: 0,
                    address: 0x1000,
                    size: 20,
                    category: Category::Dynamic,
                    status: Status::Allocated,
                    sequence: 1,
                    origin: Origin::new("src/main.rs", 12),
                },
                BlockEntry {
                    slot: 3,
                    address: 0x2040,
                    size: 50,
                    category: Category::Temporary,
                    status: Status::Allocated,
                    sequence: 4,
                    origin: Origin::new("src/main.rs", 17),
                },
            ],
            total_blocks: 2,
            total_bytes: 70,
            capacity: 1000,
        }
    }

    #[test]
    fn test_text_report_layout() {
        let expected = "\
--- MEMORY ALLOCATION REPORT ---
Block 0: 0x1000, 20 bytes, Type: Dynamic, Status: Allocated, Seq: 1, Allocated in: src/main.rs:12
Block 3: 0x2040, 50 bytes, Type: Temporary, Status: Allocated, Seq: 4, Allocated in: src/main.rs:17
Total Blocks: 2
Total Allocated: 70 bytes
";
        assert_eq!(sample().to_text(), expected);
    }

    #[test]
    fn test_empty_text_report() {
        let report = Report {
            blocks: vec![],
            total_blocks: 0,
            total_bytes: 0,
            capacity: 8,
        };
        assert!(report.is_empty());
        assert_eq!(
            report.to_text(),
            "--- MEMORY ALLOCATION REPORT ---\nTotal Blocks: 0\nTotal Allocated: 0 bytes\n"
        );
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let report = sample();
        let json = serde_json::to_string(&report).unwrap();
        let parsed: Report = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, report);
        assert!(json.contains("\"category\":\"temporary\""));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("table".parse::<Format>().unwrap(), Format::Table);
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("json-pretty".parse::<Format>().unwrap(), Format::JsonPretty);
        assert_eq!("text".parse::<Format>().unwrap(), Format::Text);
        assert!("yaml".parse::<Format>().is_err());
    }

    fn json_env(value: &'static str) -> impl Fn(&str) -> Option<String> {
        move |var| (var == JSON_ENV).then(|| value.to_string())
    }

    #[test]
    fn test_json_env_overrides_format() {
        assert_eq!(Format::from_lookup(Format::Table, json_env("1")), Format::Json);
        assert_eq!(Format::from_lookup(Format::Text, json_env("TRUE")), Format::Json);
        assert_eq!(Format::from_lookup(Format::Table, json_env("pretty")), Format::JsonPretty);
        assert_eq!(Format::from_lookup(Format::Text, json_env("0")), Format::Text);
        assert_eq!(Format::from_lookup(Format::Table, |_| None), Format::Table);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(70), "70 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024 + 512 * 1024), "5.5 MB");
    }
}
