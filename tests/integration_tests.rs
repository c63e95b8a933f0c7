use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::NaiveDate;
use std::fs::{self, File};
use std::path::Path;
use large_image_finder::{
    models::{ExportFormat, ScanConfig},
    scanner::{build_server_url, scan_directory},
    writer::{Exporter, COLUMN_HEADERS},
    FinderError,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tempfile::TempDir;

const MB: u64 = 1024 * 1024;

fn write_sized(path: &Path, size: u64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap().set_len(size).unwrap();
}

/// Helper function to create a photo library with a mix of sizes and types
fn create_test_structure() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path();

    write_sized(&base.join("a.jpg"), 2 * MB);
    write_sized(&base.join("b.png"), 5 * MB);
    write_sized(&base.join("notes.txt"), 10 * MB);
    write_sized(&base.join("albums/2023/beach.JPEG"), 4 * MB + MB / 2);
    write_sized(&base.join("albums/2023/thumb.gif"), 100 * 1024);
    write_sized(&base.join("albums/raw/scan.tiff"), 3 * MB);
    write_sized(&base.join("albums/raw/poster.webp"), 8 * MB);
    write_sized(&base.join("docs/manual.pdf"), 6 * MB);

    temp_dir
}

fn test_config(output_dir: &Path) -> ScanConfig {
    ScanConfig {
        base_url: "https://images.example.com".to_string(),
        output_dir: output_dir.to_path_buf(),
        ..Default::default()
    }
}

#[test]
fn test_small_and_non_image_files_excluded() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path();
    write_sized(&base.join("a.jpg"), 2 * MB);
    write_sized(&base.join("b.png"), 5 * MB);
    write_sized(&base.join("notes.txt"), 10 * MB);

    let result = scan_directory(base, test_config(base)).unwrap();

    assert_eq!(result.total_image_count, 2);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].name, "b.png");
    assert_eq!(result.entries[0].size_mb, 5.0);
}

#[test]
fn test_entry_invariants() {
    let test_dir = create_test_structure();
    let config = test_config(test_dir.path());
    let threshold = config.size_threshold_bytes;
    let base_url = config.base_url.clone();

    let result = scan_directory(test_dir.path(), config).unwrap();

    // jpg, png, JPEG, gif, tiff, webp
    assert_eq!(result.total_image_count, 6);
    assert!(result.total_image_count >= result.entries.len() as u64);

    let mut names: Vec<_> = result.entries.iter().map(|e| e.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["b.png", "beach.JPEG", "poster.webp"]);

    for entry in &result.entries {
        assert!(entry.size_bytes > threshold);
        assert!(entry.size_bytes as f64 / MB as f64 > 3.0);
        assert_eq!(
            entry.size_mb,
            ((entry.size_bytes as f64 / MB as f64) * 10.0).round() / 10.0
        );
        assert_eq!(entry.server_url, build_server_url(&base_url, &entry.path));
        assert!(Path::new(&entry.path).exists());
    }

    let beach = result
        .entries
        .iter()
        .find(|e| e.name == "beach.JPEG")
        .unwrap();
    assert_eq!(beach.size_mb, 4.5);
}

#[test]
fn test_missing_decoded_path_is_counted_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path();
    write_sized(&base.join("phantom%2Dshot.png"), 6 * MB);
    write_sized(&base.join("real.png"), 6 * MB);

    let result = scan_directory(base, test_config(base)).unwrap();

    assert_eq!(result.total_image_count, 2);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].name, "real.png");
    assert_eq!(result.stats.missing_paths, 1);
    assert_eq!(result.stats.errors_encountered, 0);
}

#[test]
fn test_empty_directory_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("result");
    let scan_root = temp_dir.path().join("empty");
    fs::create_dir(&scan_root).unwrap();

    let result = scan_directory(&scan_root, test_config(&output_dir)).unwrap();

    assert_eq!(result.total_image_count, 0);
    assert!(result.entries.is_empty());

    let exporter = Exporter::new(&output_dir, ExportFormat::Xlsx);
    assert!(matches!(
        exporter.export(&result.entries),
        Err(FinderError::NothingToExport)
    ));
    assert!(!output_dir.exists());
}

#[test]
fn test_end_to_end_scan_and_export_xlsx() {
    let test_dir = create_test_structure();
    let output_root = TempDir::new().unwrap();
    let output_dir = output_root.path().join("nested/result");

    let config = test_config(&output_dir);
    let exporter = Exporter::new(config.output_dir.clone(), config.format);
    let result = scan_directory(test_dir.path(), config).unwrap();

    let timestamp = NaiveDate::from_ymd_opt(2025, 6, 30)
        .unwrap()
        .and_hms_opt(23, 59, 1)
        .unwrap();
    let output = exporter.export_at(&result.entries, timestamp).unwrap();

    assert_eq!(output, output_dir.join("large_images_20250630_235901.xlsx"));
    assert!(output.exists());

    let mut workbook: Xlsx<_> = open_workbook(&output).unwrap();
    let range = workbook.worksheet_range("Sheet1").unwrap();
    let rows: Vec<_> = range.rows().collect();

    assert_eq!(rows.len(), result.entries.len() + 1);
    for (col, header) in COLUMN_HEADERS.iter().enumerate() {
        assert_eq!(rows[0][col], Data::String(header.to_string()));
    }

    for (row, entry) in rows[1..].iter().zip(&result.entries) {
        assert_eq!(row.len(), 4);
        assert_eq!(row[0], Data::String(entry.path.clone()));
        assert_eq!(row[1], Data::String(entry.name.clone()));
        assert_eq!(row[2], Data::Float(entry.size_mb));
        assert_eq!(row[3], Data::String(entry.server_url.clone()));
    }
}

#[test]
fn test_end_to_end_scan_and_export_parquet() {
    let test_dir = create_test_structure();
    let output_dir = TempDir::new().unwrap();

    let config = ScanConfig {
        format: ExportFormat::Parquet,
        ..test_config(output_dir.path())
    };
    let exporter = Exporter::new(config.output_dir.clone(), config.format);
    let result = scan_directory(test_dir.path(), config).unwrap();

    let output = exporter.export(&result.entries).unwrap();
    let file_name = output.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("large_images_"));
    assert!(file_name.ends_with(".parquet"));
    // large_images_YYYYMMDD_HHMMSS.parquet
    assert_eq!(file_name.len(), "large_images_".len() + 15 + ".parquet".len());

    let file = File::open(&output).unwrap();
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
    let reader = builder.build().unwrap();

    let mut total_rows = 0;
    for batch_result in reader {
        let batch = batch_result.unwrap();
        assert_eq!(batch.num_columns(), 4);
        total_rows += batch.num_rows();
    }

    assert_eq!(total_rows, result.entries.len());
}

#[test]
fn test_output_dir_creation_failure_propagates() {
    let test_dir = create_test_structure();
    let blocker = test_dir.path().join("notes.txt");

    let result = scan_directory(test_dir.path(), test_config(test_dir.path())).unwrap();
    let exporter = Exporter::new(blocker.join("result"), ExportFormat::Xlsx);

    let err = exporter.export(&result.entries).unwrap_err();
    assert!(matches!(err, FinderError::OutputDirectory { .. }));
}

#[test]
fn test_scan_rejects_missing_root() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nowhere");

    let err = scan_directory(&missing, test_config(temp_dir.path())).unwrap_err();
    assert!(matches!(err, FinderError::InvalidInputDirectory(_)));
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_isolated() {
    use std::os::unix::fs::PermissionsExt;

    let test_dir = create_test_structure();
    let locked = test_dir.path().join("locked");
    write_sized(&locked.join("hidden.png"), 5 * MB);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits, so only check that the scan still completes
    let result = scan_directory(test_dir.path(), test_config(test_dir.path()));
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let result = result.unwrap();
    assert!(result.entries.iter().any(|e| e.name == "b.png"));
    assert!(result.entries.iter().any(|e| e.name == "poster.webp"));
}
