use crate::error::{FinderError, Result};
use crate::models::{ExportFormat, ImageEntry};
use crate::utils;
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chrono::{Local, NaiveDateTime};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_xlsxwriter::{Format, Workbook};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Column headers, in order. Downstream consumers expect these labels verbatim.
pub const COLUMN_HEADERS: [&str; 4] = ["이미지 주소", "이미지 명", "이미지 크기(MB)", "이미지 서버주소"];

/// Writes scan findings to a timestamped spreadsheet in the output directory
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
    format: ExportFormat,
}

impl Exporter {
    pub fn new<P: Into<PathBuf>>(output_dir: P, format: ExportFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
        }
    }

    /// Export using the current local time in the file name
    pub fn export(&self, entries: &[ImageEntry]) -> Result<PathBuf> {
        self.export_at(entries, Local::now().naive_local())
    }

    /// Export with an explicit timestamp; returns the artifact path
    pub fn export_at(&self, entries: &[ImageEntry], timestamp: NaiveDateTime) -> Result<PathBuf> {
        if entries.is_empty() {
            return Err(FinderError::NothingToExport);
        }

        utils::ensure_output_dir(&self.output_dir)?;
        let output_path = utils::output_file_path(&self.output_dir, timestamp, self.format);

        let written = match self.format {
            ExportFormat::Xlsx => write_xlsx(&output_path, entries),
            ExportFormat::Parquet => write_parquet(&output_path, entries),
        };

        if let Err(e) = written {
            if output_path.exists() {
                if let Err(remove_err) = std::fs::remove_file(&output_path) {
                    warn!("Failed to remove partial file {}: {}", output_path.display(), remove_err);
                }
            }
            return Err(e);
        }

        info!("Wrote {} rows to {}", entries.len(), output_path.display());
        Ok(output_path)
    }
}

fn export_error(path: &Path, message: impl ToString) -> FinderError {
    FinderError::Export {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

/// Single sheet, header row first, no index column
pub fn write_xlsx(output_path: &Path, entries: &[ImageEntry]) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    let err = |e: rust_xlsxwriter::XlsxError| export_error(output_path, e);

    for (col, header) in COLUMN_HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(err)?;
    }

    for (i, entry) in entries.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, entry.path.as_str()).map_err(err)?;
        worksheet.write_string(row, 1, entry.name.as_str()).map_err(err)?;
        worksheet.write_number(row, 2, entry.size_mb).map_err(err)?;
        worksheet.write_string(row, 3, entry.server_url.as_str()).map_err(err)?;
    }

    worksheet.set_column_width(0, 60.0).map_err(err)?;
    worksheet.set_column_width(1, 30.0).map_err(err)?;
    worksheet.set_column_width(2, 16.0).map_err(err)?;
    worksheet.set_column_width(3, 80.0).map_err(err)?;

    workbook.save(output_path).map_err(err)?;
    Ok(())
}

/// Arrow schema mirroring the spreadsheet columns
pub fn create_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(COLUMN_HEADERS[0], DataType::Utf8, false),
        Field::new(COLUMN_HEADERS[1], DataType::Utf8, false),
        Field::new(COLUMN_HEADERS[2], DataType::Float64, false),
        Field::new(COLUMN_HEADERS[3], DataType::Utf8, false),
    ]))
}

/// Convert entries to an Arrow RecordBatch
pub fn entries_to_record_batch(
    entries: &[ImageEntry],
) -> std::result::Result<RecordBatch, ArrowError> {
    let paths: StringArray = entries.iter().map(|e| Some(e.path.as_str())).collect();
    let names: StringArray = entries.iter().map(|e| Some(e.name.as_str())).collect();
    let sizes: Float64Array = entries.iter().map(|e| Some(e.size_mb)).collect();
    let urls: StringArray = entries.iter().map(|e| Some(e.server_url.as_str())).collect();

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(paths),
        Arc::new(names),
        Arc::new(sizes),
        Arc::new(urls),
    ];

    RecordBatch::try_new(create_schema(), arrays)
}

pub fn write_parquet(output_path: &Path, entries: &[ImageEntry]) -> Result<()> {
    let batch = entries_to_record_batch(entries).map_err(|e| export_error(output_path, e))?;
    let file = File::create(output_path)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_dictionary_enabled(true)
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .map_err(|e| export_error(output_path, e))?;
    writer.write(&batch).map_err(|e| export_error(output_path, e))?;
    writer.close().map_err(|e| export_error(output_path, e))?;

    Ok(())
}
