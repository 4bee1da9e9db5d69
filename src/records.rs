//! # Records
//!
//! The boundary between the export-parsing collaborator and the layout
//! engine. Rows arrive as JSON objects keyed by column name; this module
//! maps them to `EntryRecord`s, orders them by day, resolves photo
//! filenames to pixel dimensions and produces layout-ready `Entry` values.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::PhotobookConfig;
use crate::model::{Entry, ImageSpec, TextRun};

/// Which column of an exported row holds which field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub title: String,
    pub date: String,
    pub images: String,
    pub text: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            title: "Title".to_string(),
            date: "Day".to_string(),
            images: "Photos".to_string(),
            text: "Text".to_string(),
        }
    }
}

/// A normalized export row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EntryRecord {
    pub title: String,
    /// The day label as exported, with `@` removed.
    pub day: String,
    pub date: Option<NaiveDate>,
    pub image_filenames: Vec<String>,
    pub text: String,
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

fn cell_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| cell_text(Some(v)))
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse an exported day label: `"January 5, 2024"` or `"2024-01-05"`.
pub fn parse_day(label: &str) -> Option<NaiveDate> {
    let cleaned = label.replace('@', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(cleaned, "%B %d, %Y")
        .or_else(|_| NaiveDate::parse_from_str(cleaned, "%Y-%m-%d"))
        .ok()
}

impl EntryRecord {
    /// Read one row. Missing columns become empty fields; the photo column
    /// may be a comma-separated string or a JSON array.
    pub fn from_row(row: &Map<String, Value>, columns: &ColumnMapping) -> Self {
        let day = cell_text(row.get(&columns.date)).replace('@', "");
        let day = day.trim().to_string();
        let date = parse_day(&day);
        if date.is_none() && !day.is_empty() {
            tracing::debug!(day = %day, "unrecognized day label, entry treated as undated");
        }
        Self {
            title: cell_text(row.get(&columns.title)),
            day,
            date,
            image_filenames: cell_list(row.get(&columns.images)),
            text: cell_text(row.get(&columns.text)),
        }
    }

    /// `"{day} - {title}"`, or whichever half is present.
    pub fn display_title(&self) -> String {
        match (self.day.is_empty(), self.title.is_empty()) {
            (false, false) => format!("{} - {}", self.day, self.title),
            (false, true) => self.day.clone(),
            (true, false) => self.title.clone(),
            (true, true) => String::new(),
        }
    }
}

/// Sort records by date, undated last, keeping the export order among equal
/// days. With `max_date`, later and undated records are dropped.
pub fn order_records(mut records: Vec<EntryRecord>, max_date: Option<NaiveDate>) -> Vec<EntryRecord> {
    records.sort_by_key(|r| (r.date.is_none(), r.date));
    if let Some(limit) = max_date {
        let before = records.len();
        records.retain(|r| r.date.is_some_and(|d| d <= limit));
        tracing::debug!(
            dropped = before - records.len(),
            max_date = %limit,
            "filtered records by date"
        );
    }
    records
}

/// Pixel dimensions of every known photo, keyed by filename, after the
/// long-edge cap is applied.
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    images: HashMap<String, ImageSpec>,
}

impl ImageCatalog {
    pub fn new(images: impl IntoIterator<Item = ImageSpec>, max_long_edge: u32) -> Self {
        let images = images
            .into_iter()
            .map(|img| (img.source_id().to_string(), img.downsampled(max_long_edge)))
            .collect();
        Self { images }
    }

    pub fn get(&self, filename: &str) -> Option<&ImageSpec> {
        self.images.get(filename)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Resolve filenames in order, skipping the ones the catalog does not know.
    pub fn resolve(&self, filenames: &[String]) -> Vec<ImageSpec> {
        filenames
            .iter()
            .filter_map(|name| {
                let found = self.get(name).cloned();
                if found.is_none() {
                    tracing::warn!(filename = %name, "image not found, skipping");
                }
                found
            })
            .collect()
    }
}

impl Entry {
    pub fn from_record(record: &EntryRecord, catalog: &ImageCatalog) -> Self {
        Self {
            title: record.display_title(),
            images: catalog.resolve(&record.image_filenames),
            text: TextRun::parse(&record.text),
            date: record.date,
        }
    }
}

/// The JSON document consumed by the CLI and `layout_json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookInput {
    pub config: PhotobookConfig,
    /// Pixel dimensions of the photos referenced by the rows.
    pub images: Vec<ImageSpec>,
    /// Exported rows, keyed by the column names in `config.columns`.
    pub entries: Vec<Map<String, Value>>,
    pub max_date: Option<NaiveDate>,
}

impl BookInput {
    /// Normalize, order and resolve the rows into layout-ready entries.
    pub fn to_entries(&self) -> Vec<Entry> {
        let records = self
            .entries
            .iter()
            .map(|row| EntryRecord::from_row(row, &self.config.columns))
            .collect();
        let catalog = ImageCatalog::new(
            self.images.iter().cloned(),
            self.config.max_image_long_edge_px,
        );
        order_records(records, self.max_date)
            .iter()
            .map(|record| Entry::from_record(record, &catalog))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    fn record(title: &str, day: &str) -> EntryRecord {
        EntryRecord {
            title: title.to_string(),
            day: day.to_string(),
            date: parse_day(day),
            ..Default::default()
        }
    }

    #[test]
    fn parses_export_day_formats() {
        assert_eq!(
            parse_day("@January 5, 2024"),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
        assert_eq!(parse_day("2024-03-09"), NaiveDate::from_ymd_opt(2024, 3, 9));
        assert_eq!(parse_day("someday"), None);
        assert_eq!(parse_day(""), None);
    }

    #[test]
    fn row_with_comma_separated_photos() {
        let r = EntryRecord::from_row(
            &row(json!({
                "Title": " Lisbon ",
                "Day": "@March 2, 2024",
                "Photos": "a.jpg, b.jpg,,c.jpg",
                "Text": "Tram 28."
            })),
            &ColumnMapping::default(),
        );
        assert_eq!(r.title, "Lisbon");
        assert_eq!(r.day, "March 2, 2024");
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 3, 2));
        assert_eq!(r.image_filenames, vec!["a.jpg", "b.jpg", "c.jpg"]);
        assert_eq!(r.display_title(), "March 2, 2024 - Lisbon");
    }

    #[test]
    fn row_with_custom_columns_and_array_photos() {
        let columns = ColumnMapping {
            title: "Name".to_string(),
            date: "When".to_string(),
            images: "Pics".to_string(),
            text: "Body".to_string(),
        };
        let r = EntryRecord::from_row(
            &row(json!({ "Name": "Porto", "Pics": ["x.png", "y.png"] })),
            &columns,
        );
        assert_eq!(r.image_filenames, vec!["x.png", "y.png"]);
        assert_eq!(r.date, None);
        assert_eq!(r.display_title(), "Porto");
    }

    #[test]
    fn ordering_puts_undated_last() {
        let ordered = order_records(
            vec![
                record("c", ""),
                record("b", "January 9, 2024"),
                record("a", "January 2, 2024"),
            ],
            None,
        );
        let titles: Vec<_> = ordered.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn max_date_drops_later_and_undated() {
        let ordered = order_records(
            vec![
                record("late", "February 1, 2024"),
                record("undated", ""),
                record("early", "January 2, 2024"),
            ],
            NaiveDate::from_ymd_opt(2024, 1, 31),
        );
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].title, "early");
    }

    #[test]
    fn catalog_skips_unknown_files_and_caps_size() {
        let catalog = ImageCatalog::new(
            vec![ImageSpec::new("a.jpg", 6000, 4000).unwrap()],
            2400,
        );
        let resolved = catalog.resolve(&["missing.jpg".to_string(), "a.jpg".to_string()]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].pixel_width(), 2400);
        assert_eq!(resolved[0].pixel_height(), 1600);
    }

    #[test]
    fn book_input_produces_ordered_entries() {
        let input: BookInput = serde_json::from_value(json!({
            "images": [{ "sourceId": "a.jpg", "pixelWidth": 800, "pixelHeight": 600 }],
            "entries": [
                { "Title": "Second", "Day": "May 2, 2024", "Text": "b" },
                { "Title": "First", "Day": "May 1, 2024", "Photos": "a.jpg", "Text": "a\n\nmore" }
            ]
        }))
        .unwrap();
        let entries = input.to_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "May 1, 2024 - First");
        assert_eq!(entries[0].images.len(), 1);
        assert_eq!(entries[0].text.paragraphs.len(), 2);
        assert_eq!(entries[1].title, "May 2, 2024 - Second");
    }
}
