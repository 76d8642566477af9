use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Column names of a constituent record, in source-table order.
pub const COLUMNS: [&str; 5] = [
    "code",
    "name",
    "asset_type",
    "theoretical_quantity",
    "participation_percent",
];

/// One row of the index composition table.
///
/// Quantity and percentage are kept exactly as published (Brazilian number
/// formatting, e.g. `"4.357.695.436"` and `"7,876"`); coercion is left to the
/// downstream ETL job.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConstituentRecord {
    pub code: String,
    pub name: String,
    pub asset_type: String,
    pub theoretical_quantity: String,
    pub participation_percent: String,
}

impl ConstituentRecord {
    /// Build a record from the five cell texts of a table row, in column order.
    pub fn from_cells(cells: [String; 5]) -> Self {
        let [code, name, asset_type, theoretical_quantity, participation_percent] = cells;
        Self {
            code,
            name,
            asset_type,
            theoretical_quantity,
            participation_percent,
        }
    }

    /// Field values in column order, matching [`COLUMNS`].
    pub fn fields(&self) -> [&str; 5] {
        [
            self.code.as_str(),
            self.name.as_str(),
            self.asset_type.as_str(),
            self.theoretical_quantity.as_str(),
            self.participation_percent.as_str(),
        ]
    }
}

/// All constituent records captured on one day, in source order.
///
/// An empty dataset is a valid result ("nothing published"), distinct from
/// an extraction failure.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ConstituentDataset {
    pub capture_date: NaiveDate,
    pub records: Vec<ConstituentRecord>,
}

impl ConstituentDataset {
    pub fn new(capture_date: NaiveDate, records: Vec<ConstituentRecord>) -> Self {
        Self {
            capture_date,
            records,
        }
    }

    pub fn empty(capture_date: NaiveDate) -> Self {
        Self::new(capture_date, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Fully rendered HTML of the target page. Consumed once by the extractor.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
}

impl RenderedPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// Hive-style partitioned location of one day's file.
///
/// The same relative key is used for the local file (under a data root) and
/// for the remote object, so the two always line up:
/// `raw/date=2025-07-18/ibov_20250718.parquet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey {
    date: NaiveDate,
    format: String,
}

impl StorageKey {
    pub const PREFIX: &'static str = "raw";
    pub const FILE_STEM: &'static str = "ibov";

    pub fn new(date: NaiveDate, format: impl Into<String>) -> Self {
        Self {
            date,
            format: format.into(),
        }
    }

    /// Key for a Parquet file captured on `date`.
    pub fn parquet(date: NaiveDate) -> Self {
        Self::new(date, "parquet")
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Partition directory, e.g. `raw/date=2025-07-18`.
    pub fn partition(&self) -> String {
        format!("{}/date={}", Self::PREFIX, self.date.format("%Y-%m-%d"))
    }

    /// File name, e.g. `ibov_20250718.parquet`.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.{}",
            Self::FILE_STEM,
            self.date.format("%Y%m%d"),
            self.format
        )
    }

    /// Remote object key, always `/`-separated.
    pub fn object_key(&self) -> String {
        format!("{}/{}", self.partition(), self.file_name())
    }

    /// Local file path under `root`.
    pub fn local_path(&self, root: &Path) -> PathBuf {
        root.join(Self::PREFIX)
            .join(format!("date={}", self.date.format("%Y-%m-%d")))
            .join(self.file_name())
    }
}

/// What a successful persist left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistReceipt {
    pub local_path: PathBuf,
    pub bucket: String,
    pub object_key: String,
    pub bytes: u64,
    /// SHA-256 of the uploaded file
    pub digest: String,
}

/// Compute a SHA-256 hash of a byte slice, returned as 64-char hex.
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}
