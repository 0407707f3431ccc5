//! Black-box coverage of the scenarios in the distilled spec's testable
//! properties and concrete examples: a clean extraction, a TPMERC filter
//! that drops everything, an atomic rollback that preserves a
//! pre-existing sibling file, and a forbidden destination rejected before
//! any network call.

use datafin_ingest::domain::ProcessingMode;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn pad(field: &str, width: usize) -> String {
    format!("{:width$}", field, width = width)
}

/// Build one synthetic 245-byte COTAHIST data row with the given tpmerc
/// code and close price (in cents), matching the field layout tested in
/// `quotes::parser`.
fn cotahist_data_row(tpmerc: &str, close_cents: i64) -> String {
    let mut line = String::new();
    line.push_str("01");
    line.push_str("20231201");
    line.push_str("02");
    line.push_str(&pad("PETR4", 12));
    line.push_str(tpmerc);
    line.push_str(&pad("PETROBRAS", 12));
    line.push_str(&pad("PN", 10));
    line.push_str(&" ".repeat(7));
    line.push_str(&format!("{:013}", 350000));
    line.push_str(&format!("{:013}", 355000));
    line.push_str(&format!("{:013}", 348000));
    line.push_str(&format!("{:013}", 351000));
    line.push_str(&format!("{:013}", close_cents));
    line.push_str(&format!("{:013}", 352000));
    line.push_str(&format!("{:013}", 353000));
    line.push_str(&format!("{:05}", 1200));
    line.push_str(&format!("{:018}", 500000));
    line.push_str(&format!("{:018}", 1762500000i64));
    line.push_str(&" ".repeat(42));
    line.push_str(&pad("BRPETRACNPR6", 12));
    line.push_str(&" ".repeat(3));
    line
}

fn make_cotahist_zip(dir: &Path, year: i32, tpmerc: &str) -> std::path::PathBuf {
    let path = dir.join(format!("COTAHIST_A{}.ZIP", year));
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    writer
        .start_file(format!("COTAHIST_A{}.TXT", year), options)
        .unwrap();

    let header = format!("00{}", " ".repeat(243));
    let trailer = format!("99{}", " ".repeat(243));
    let data = cotahist_data_row(tpmerc, 3525);

    writeln!(writer, "{}", header).unwrap();
    writeln!(writer, "{}", data).unwrap();
    writeln!(writer, "{}", trailer).unwrap();
    writer.finish().unwrap();
    path
}

#[tokio::test]
async fn scenario_successful_small_extraction() {
    let staging = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    make_cotahist_zip(staging.path(), 2023, "010");

    let classes = vec!["ações".to_string()];
    let result = datafin_ingest::extract_quotes(
        staging.path(),
        out.path(),
        &classes,
        2023,
        2023,
        "q",
        ProcessingMode::Slow,
    )
    .await
    .unwrap();

    assert_eq!(result.total_files, 1);
    assert_eq!(result.success_count, 1);
    assert_eq!(result.error_count, 0);
    assert_eq!(result.total_records, 1);
    assert_eq!(result.output_file, Some(out.path().join("q.col")));
}

#[tokio::test]
async fn scenario_tpmerc_filter_drops_options() {
    let staging = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    make_cotahist_zip(staging.path(), 2023, "070");

    let classes = vec!["ações".to_string()];
    let result = datafin_ingest::extract_quotes(
        staging.path(),
        out.path(),
        &classes,
        2023,
        2023,
        "q",
        ProcessingMode::Slow,
    )
    .await
    .unwrap();

    assert_eq!(result.total_records, 0);
}

#[tokio::test]
async fn scenario_forbidden_path_rejected_before_any_http_call() {
    let err = datafin_ingest::download_cvm(Path::new("/etc/xyz"), &["DFP"], 2023, 2023)
        .await
        .unwrap_err();
    assert!(matches!(err, datafin_ingest::error::IngestError::SecurityError(_)));
}

#[test]
fn scenario_atomic_rollback_preserves_pre_existing_sibling() {
    let dest = TempDir::new().unwrap();
    std::fs::write(dest.path().join("keep.col"), b"pre-existing contents").unwrap();

    let zip_dir = TempDir::new().unwrap();
    let zip_path = zip_dir.path().join("doc.zip");
    let file = std::fs::File::create(&zip_path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    writer.start_file("valid.csv", options).unwrap();
    writeln!(writer, "a;b").unwrap();
    writeln!(writer, "1;2").unwrap();

    // A genuinely oversized member, compared against an injected cap well
    // below its real size, so the guard trips without staging gigabytes.
    writer.start_file("oversized.csv", options).unwrap();
    writeln!(writer, "a;b").unwrap();
    writeln!(writer, "{}", "9".repeat(256)).unwrap();
    writer.finish().unwrap();

    let result =
        datafin_ingest::transcoder::transcode_with_size_guard(&zip_path, dest.path(), 64);

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        datafin_ingest::error::IngestError::CorruptedZipError(_)
    ));

    assert_eq!(
        std::fs::read(dest.path().join("keep.col")).unwrap(),
        b"pre-existing contents"
    );
    assert!(!dest.path().join("valid.col").exists());
    assert!(!dest.path().join("oversized.col").exists());
}
