use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::core::error::{ScoutError, ScoutResult};
use crate::core::types::PlaceDetails;

#[derive(Debug, Serialize)]
struct DetailsRow<'a> {
    url: &'a str,
    name: Option<&'a str>,
    address: Option<&'a str>,
    website: Option<&'a str>,
    phone: Option<&'a str>,
    rating: Option<f64>,
    operating_hours: Option<&'a str>,
    permanently_closed: bool,
    scraped_at: String,
}

/// Appends one row per scraped detail page; the header is written only when
/// the file is created.
#[derive(Debug, Clone)]
pub struct DetailsWriter {
    path: PathBuf,
}

impl DetailsWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, details: &[PlaceDetails]) -> ScoutResult<usize> {
        if details.is_empty() {
            return Ok(0);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ScoutError::storage(&self.path, e))?;
        let is_new = file
            .metadata()
            .map_err(|e| ScoutError::storage(&self.path, e))?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        for d in details {
            writer
                .serialize(DetailsRow {
                    url: &d.url,
                    name: d.name.as_deref(),
                    address: d.address.as_deref(),
                    website: d.website.as_deref(),
                    phone: d.phone.as_deref(),
                    rating: d.rating,
                    operating_hours: d.operating_hours.as_deref(),
                    permanently_closed: d.permanently_closed,
                    scraped_at: timestamp.clone(),
                })
                .map_err(|e| ScoutError::storage(&self.path, e))?;
        }
        writer
            .flush()
            .map_err(|e| ScoutError::storage(&self.path, e))?;

        info!("Appended {} detail rows to {}", details.len(), self.path.display());
        Ok(details.len())
    }
}

/// Columns appended after the input columns when enriching a collection.
pub const DETAIL_COLUMNS: [&str; 7] = [
    "Name",
    "Address",
    "Website",
    "Phone",
    "Rating",
    "Operating_Hours",
    "Permanently_Closed",
];

/// Detail cells in [`DETAIL_COLUMNS`] order. `None` (no page) leaves every
/// cell empty, including the closed flag.
pub fn detail_cells(details: Option<&PlaceDetails>) -> Vec<String> {
    let Some(d) = details else {
        return vec![String::new(); DETAIL_COLUMNS.len()];
    };
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    vec![
        text(&d.name),
        text(&d.address),
        text(&d.website),
        text(&d.phone),
        d.rating.map(|r| r.to_string()).unwrap_or_default(),
        text(&d.operating_hours),
        if d.permanently_closed { "YES" } else { "NO" }.to_string(),
    ]
}

/// Writes an input collection's rows with detail columns appended.
#[derive(Debug, Clone)]
pub struct EnrichedWriter {
    path: PathBuf,
    header: Vec<String>,
}

impl EnrichedWriter {
    pub fn new(path: impl Into<PathBuf>, input_headers: &[String]) -> Self {
        let mut header = input_headers.to_vec();
        header.extend(DETAIL_COLUMNS.iter().map(|c| c.to_string()));
        Self {
            path: path.into(),
            header,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append complete rows and flush. The header goes out only when the
    /// file is new.
    pub fn append(&self, rows: &[Vec<String>]) -> ScoutResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ScoutError::storage(&self.path, e))?;
        let is_new = file
            .metadata()
            .map_err(|e| ScoutError::storage(&self.path, e))?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);
        if is_new {
            writer
                .write_record(&self.header)
                .map_err(|e| ScoutError::storage(&self.path, e))?;
        }
        for row in rows {
            writer
                .write_record(row)
                .map_err(|e| ScoutError::storage(&self.path, e))?;
        }
        writer
            .flush()
            .map_err(|e| ScoutError::storage(&self.path, e))?;
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enriched_header_once_and_empty_cells_without_page() {
        let dir = tempfile::tempdir().unwrap();
        let headers = vec!["search_item".to_string(), "url".to_string()];
        let writer = EnrichedWriter::new(dir.path().join("out.csv"), &headers);

        let d = PlaceDetails {
            url: "u1".into(),
            name: Some("Cafe A".into()),
            rating: Some(4.5),
            ..Default::default()
        };
        let mut row = vec!["Cafe".to_string(), "u1".to_string()];
        row.extend(detail_cells(Some(&d)));
        writer.append(&[row]).unwrap();

        let mut row = vec!["Cafe".to_string(), "u2".to_string()];
        row.extend(detail_cells(None));
        writer.append(&[row]).unwrap();

        let text = std::fs::read_to_string(writer.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "search_item,url,Name,Address,Website,Phone,Rating,Operating_Hours,Permanently_Closed",
                "Cafe,u1,Cafe A,,,,4.5,,NO",
                "Cafe,u2,,,,,,,",
            ]
        );
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DetailsWriter::new(dir.path().join("details.csv"));

        let d = PlaceDetails {
            url: "https://maps.test/place/a".into(),
            name: Some("Cafe A".into()),
            phone: Some("+919876543210".into()),
            rating: Some(4.5),
            ..Default::default()
        };
        assert_eq!(writer.append(std::slice::from_ref(&d)).unwrap(), 1);
        assert_eq!(writer.append(&[d]).unwrap(), 1);
        assert_eq!(writer.append(&[]).unwrap(), 0);

        let text = std::fs::read_to_string(writer.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("url,name,address,website,phone,rating"));
        assert_eq!(text.matches("scraped_at").count(), 1);
        assert!(lines[1].contains("Cafe A"));
    }
}
