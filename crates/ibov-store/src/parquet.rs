//! Parquet encoding of a [`ConstituentDataset`].
//!
//! One row group, five required UTF8 columns named after
//! [`ibov_core::models::COLUMNS`], Snappy compression. The capture date is
//! stored in the file's key-value metadata so a file can be read back
//! without knowing its path.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use ibov_core::AppError;
use ibov_core::models::{COLUMNS, ConstituentDataset, ConstituentRecord};
use parquet::basic::Compression;
use parquet::data_type::{ByteArray, ByteArrayType};
use parquet::errors::ParquetError;
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::writer::SerializedFileWriter;
use parquet::format::KeyValue;
use parquet::record::RowAccessor;
use parquet::schema::parser::parse_message_type;

const CAPTURE_DATE_KEY: &str = "ibov.capture_date";

const SCHEMA: &str = "
message ibov_constituent {
    REQUIRED BYTE_ARRAY code (UTF8);
    REQUIRED BYTE_ARRAY name (UTF8);
    REQUIRED BYTE_ARRAY asset_type (UTF8);
    REQUIRED BYTE_ARRAY theoretical_quantity (UTF8);
    REQUIRED BYTE_ARRAY participation_percent (UTF8);
}
";

fn storage_err(context: &str) -> impl Fn(ParquetError) -> AppError + '_ {
    move |e| AppError::StorageError(format!("{context}: {e}"))
}

fn io_err(context: &str) -> impl Fn(std::io::Error) -> AppError + '_ {
    move |e| AppError::StorageError(format!("{context}: {e}"))
}

/// Write `dataset` to `path`, creating parent directories. Returns the file
/// size in bytes. An empty dataset produces a valid file with no rows.
pub fn write_parquet(dataset: &ConstituentDataset, path: &Path) -> Result<u64, AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(io_err(&format!("Failed to create {}", parent.display())))?;
    }

    let schema = Arc::new(parse_message_type(SCHEMA).map_err(storage_err("Invalid schema"))?);
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_key_value_metadata(Some(vec![KeyValue::new(
            CAPTURE_DATE_KEY.to_string(),
            dataset.capture_date.format("%Y-%m-%d").to_string(),
        )]))
        .build();

    let file = File::create(path).map_err(io_err(&format!("Failed to create {}", path.display())))?;
    let mut writer = SerializedFileWriter::new(file, schema, Arc::new(props))
        .map_err(storage_err("Failed to open Parquet writer"))?;

    if !dataset.is_empty() {
        let mut row_group = writer
            .next_row_group()
            .map_err(storage_err("Failed to start row group"))?;

        let mut column = 0;
        while let Some(mut col_writer) = row_group
            .next_column()
            .map_err(storage_err("Failed to open column"))?
        {
            let values: Vec<ByteArray> = dataset
                .records
                .iter()
                .map(|record| ByteArray::from(record.fields()[column]))
                .collect();
            col_writer
                .typed::<ByteArrayType>()
                .write_batch(&values, None, None)
                .map_err(storage_err(COLUMNS[column]))?;
            col_writer
                .close()
                .map_err(storage_err(COLUMNS[column]))?;
            column += 1;
        }

        row_group
            .close()
            .map_err(storage_err("Failed to close row group"))?;
    }

    writer
        .close()
        .map_err(storage_err("Failed to finalize Parquet file"))?;

    let size = fs::metadata(path)
        .map_err(io_err(&format!("Failed to stat {}", path.display())))?
        .len();
    Ok(size)
}

/// Read a file written by [`write_parquet`] back into a dataset.
pub fn read_parquet(path: &Path) -> Result<ConstituentDataset, AppError> {
    let file = File::open(path).map_err(io_err(&format!("Failed to open {}", path.display())))?;
    let reader =
        SerializedFileReader::new(file).map_err(storage_err("Not a readable Parquet file"))?;

    let capture_date = reader
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .and_then(|kv| kv.iter().find(|entry| entry.key == CAPTURE_DATE_KEY))
        .and_then(|entry| entry.value.as_deref())
        .ok_or_else(|| {
            AppError::StorageError(format!(
                "{} has no {CAPTURE_DATE_KEY} metadata",
                path.display()
            ))
        })
        .and_then(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                AppError::StorageError(format!("Invalid capture date '{raw}': {e}"))
            })
        })?;

    let columns: Vec<String> = reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    if columns != COLUMNS {
        return Err(AppError::StorageError(format!(
            "Unexpected columns {columns:?}, expected {COLUMNS:?}"
        )));
    }

    let mut records = Vec::new();
    let rows = reader
        .get_row_iter(None)
        .map_err(storage_err("Failed to read rows"))?;
    for row in rows {
        let row = row.map_err(storage_err("Failed to decode row"))?;
        let cell = |i: usize| -> Result<String, AppError> {
            row.get_string(i)
                .cloned()
                .map_err(storage_err(COLUMNS[i]))
        };
        records.push(ConstituentRecord::from_cells([
            cell(0)?,
            cell(1)?,
            cell(2)?,
            cell(3)?,
            cell(4)?,
        ]));
    }

    Ok(ConstituentDataset::new(capture_date, records))
}
