//! Quotes aggregator, grounded on the teacher's concurrent-fetch shape in
//! `pricing/resolver.rs` and the distilled spec's §4.8 component design.
//! Discovers staged COTAHIST archives for a year range, parses them with
//! bounded concurrency, and concatenates per-archive shards into one
//! final columnar file.

use crate::domain::{ExtractionResult, InstrumentClass, OutputFilename, ProcessingMode, YearRange};
use crate::error::IngestError;
use crate::governor::ResourceGovernor;
use crate::quotes::parser::parse_line;
use crate::validators::validate_destination;
use crate::zip_stream::ZipStreamer;
use arrow::array::{Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Debug, Clone)]
pub struct QuotesAggregatorConfig {
    pub classes: Vec<String>,
    pub initial_year: i32,
    pub last_year: i32,
    pub output_name: String,
    pub mode: ProcessingMode,
}

pub fn quote_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("date", DataType::Utf8, false),
        Field::new("bdi", DataType::Utf8, false),
        Field::new("ticker", DataType::Utf8, false),
        Field::new("tpmerc", DataType::Utf8, false),
        Field::new("short_name", DataType::Utf8, false),
        Field::new("specification", DataType::Utf8, false),
        Field::new("open", DataType::Utf8, false),
        Field::new("high", DataType::Utf8, false),
        Field::new("low", DataType::Utf8, false),
        Field::new("avg", DataType::Utf8, false),
        Field::new("close", DataType::Utf8, false),
        Field::new("best_buy", DataType::Utf8, false),
        Field::new("best_sell", DataType::Utf8, false),
        Field::new("trades", DataType::Int64, false),
        Field::new("quantity", DataType::Int64, false),
        Field::new("volume", DataType::Utf8, false),
        Field::new("isin", DataType::Utf8, false),
    ]))
}

fn records_to_batch(records: &[crate::domain::QuoteRecord]) -> Result<RecordBatch, IngestError> {
    let schema = quote_schema();
    let date: StringArray = records.iter().map(|r| Some(r.date.format("%Y-%m-%d").to_string())).collect();
    let bdi: StringArray = records.iter().map(|r| Some(r.bdi.clone())).collect();
    let ticker: StringArray = records.iter().map(|r| Some(r.ticker.clone())).collect();
    let tpmerc: StringArray = records.iter().map(|r| Some(r.tpmerc.clone())).collect();
    let short_name: StringArray = records.iter().map(|r| Some(r.short_name.clone())).collect();
    let specification: StringArray = records.iter().map(|r| Some(r.specification.clone())).collect();
    let open: StringArray = records.iter().map(|r| Some(r.open.to_string())).collect();
    let high: StringArray = records.iter().map(|r| Some(r.high.to_string())).collect();
    let low: StringArray = records.iter().map(|r| Some(r.low.to_string())).collect();
    let avg: StringArray = records.iter().map(|r| Some(r.avg.to_string())).collect();
    let close: StringArray = records.iter().map(|r| Some(r.close.to_string())).collect();
    let best_buy: StringArray = records.iter().map(|r| Some(r.best_buy.to_string())).collect();
    let best_sell: StringArray = records.iter().map(|r| Some(r.best_sell.to_string())).collect();
    let trades: Int64Array = records.iter().map(|r| Some(r.trades)).collect();
    let quantity: Int64Array = records.iter().map(|r| Some(r.quantity)).collect();
    let volume: StringArray = records.iter().map(|r| Some(r.volume.to_string())).collect();
    let isin: StringArray = records.iter().map(|r| Some(r.isin.clone())).collect();

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(date),
            Arc::new(bdi),
            Arc::new(ticker),
            Arc::new(tpmerc),
            Arc::new(short_name),
            Arc::new(specification),
            Arc::new(open),
            Arc::new(high),
            Arc::new(low),
            Arc::new(avg),
            Arc::new(close),
            Arc::new(best_buy),
            Arc::new(best_sell),
            Arc::new(trades),
            Arc::new(quantity),
            Arc::new(volume),
            Arc::new(isin),
        ],
    )
    .map_err(|e| IngestError::ExtractionError(e.to_string()))
}

/// Discover ZIP archives under `staging_dir` whose filename contains any
/// year in `range`.
fn discover_archives(staging_dir: &Path, range: &YearRange) -> Result<Vec<PathBuf>, IngestError> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(staging_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("zip")
            && path.extension().and_then(|e| e.to_str()) != Some("ZIP")
        {
            continue;
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if range.years().any(|y| name.contains(&y.to_string())) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Parse one archive to a shard file, returning the row count and any
/// recorded per-file error.
fn process_archive(
    path: &Path,
    accepted_tpmerc: &HashSet<String>,
    shard_dir: &Path,
    chunk_size: usize,
) -> Result<(PathBuf, u64), IngestError> {
    let mut streamer = ZipStreamer::open(path)?;
    let shard_path = shard_dir.join(format!(
        "{}.shard.col",
        path.file_stem().and_then(|s| s.to_str()).unwrap_or("archive")
    ));

    let schema = quote_schema();
    let mut writer = crate::columnar::ShardWriter::create(&shard_path, schema)?;
    let mut batch = Vec::with_capacity(chunk_size);

    for index in 0..streamer.member_count() {
        let member = streamer.open_member(index)?;
        for line in member.lines() {
            let line = line.map_err(IngestError::Io)?;
            if let Some(record) = parse_line(&line, accepted_tpmerc) {
                batch.push(record);
                if batch.len() >= chunk_size {
                    let arrow_batch = records_to_batch(&batch)?;
                    writer.write_batch(&arrow_batch)?;
                    batch.clear();
                }
            }
        }
    }

    if !batch.is_empty() {
        let arrow_batch = records_to_batch(&batch)?;
        writer.write_batch(&arrow_batch)?;
    }

    let rows = writer.finish()?;
    Ok((shard_path, rows))
}

/// Extract quotes for `classes` across `[initial_year, last_year]` from
/// every matching archive in `staging_dir`, writing the consolidated
/// result to `<destination_dir>/<output_name>.col`.
pub async fn extract_quotes(
    staging_dir: &Path,
    destination_dir: &Path,
    classes: &[impl AsRef<str>],
    initial_year: i32,
    last_year: i32,
    output_name: &str,
    mode: ProcessingMode,
) -> Result<ExtractionResult, IngestError> {
    let accepted_tpmerc = InstrumentClass::parse_filter_set(classes)?;
    let output_name = OutputFilename::new(output_name)?;
    let destination_dir = validate_destination(destination_dir)?;
    let range = YearRange::new(initial_year, last_year, crate::domain::YearFamily::Cotahist)?;

    let archives = discover_archives(staging_dir, &range)?;
    let mut result = ExtractionResult::new(archives.len());

    if archives.is_empty() {
        return Ok(result);
    }

    let governor = ResourceGovernor::global();
    let chunk_size = governor.safe_chunk_size(100_000);
    let worker_count = match mode {
        ProcessingMode::Fast => governor.safe_worker_count(num_cpus_fallback()),
        ProcessingMode::Slow => 1,
    };

    let shard_dir = destination_dir.clone();
    let semaphore = Arc::new(Semaphore::new(worker_count.max(1)));
    let mut join_set = JoinSet::new();

    for path in archives {
        let permit = semaphore.clone().acquire_owned().await.unwrap();
        let accepted_tpmerc = accepted_tpmerc.clone();
        let shard_dir = shard_dir.clone();

        join_set.spawn_blocking(move || {
            let _permit = permit;
            process_archive(&path, &accepted_tpmerc, &shard_dir, chunk_size)
        });
    }

    tracing::info!(archives = result.total_files, worker_count, mode = %format!("{:?}", mode), "starting quotes extraction");

    let mut shard_paths = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(Ok((shard_path, rows))) => {
                tracing::info!(shard = %shard_path.display(), rows, "archive processed");
                result.record_success(rows);
                shard_paths.push(shard_path);
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "archive processing failed");
                result.record_error(err.to_string())
            }
            Err(join_err) => {
                tracing::warn!(error = %join_err, "archive processing task panicked");
                result.record_error(join_err.to_string())
            }
        }
    }

    if !shard_paths.is_empty() {
        let output_path = destination_dir.join(format!("{}.col", output_name));
        crate::columnar::concatenate_shards(&shard_paths, &output_path)?;
        for shard in &shard_paths {
            let _ = std::fs::remove_file(shard);
        }
        tracing::info!(output = %output_path.display(), total_records = result.total_records, "quotes extraction finished");
        result.output_file = Some(output_path);
    }

    Ok(result)
}

fn num_cpus_fallback() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_archives_matches_year_in_filename() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("COTAHIST_A2023.ZIP"), b"x").unwrap();
        std::fs::write(dir.path().join("COTAHIST_A2019.ZIP"), b"x").unwrap();
        std::fs::write(dir.path().join("ignored.txt"), b"x").unwrap();

        let range = YearRange::new(2022, 2023, crate::domain::YearFamily::Cotahist).unwrap();
        let found = discover_archives(dir.path(), &range).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].file_name().unwrap().to_str().unwrap().contains("2023"));
    }

    #[tokio::test]
    async fn test_extract_quotes_with_no_matching_archives_returns_empty_result() {
        let staging = tempfile::TempDir::new().unwrap();
        let out = tempfile::TempDir::new().unwrap();
        let classes = vec!["ações".to_string()];

        let result = extract_quotes(
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

        assert_eq!(result.total_files, 0);
        assert!(result.output_file.is_none());
    }
}
