//! Shared columnar (Parquet/Arrow) writer helpers used by the transcoder
//! (§4.6) and the quotes aggregator (§4.8). The spec leaves the concrete
//! columnar format an implementation choice; this follows the
//! Arrow/Parquet stack already present in the retrieved pack rather than
//! inventing a bespoke on-disk layout.

use crate::error::IngestError;
use arrow::array::RecordBatch;
use arrow::datatypes::SchemaRef;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::arrow_writer::ArrowWriter;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A single shard file accumulating row groups across chunked appends.
/// Stays open for the lifetime of one extraction; `finish` flushes the
/// Parquet footer.
pub struct ShardWriter {
    writer: ArrowWriter<File>,
    rows_written: u64,
}

impl ShardWriter {
    pub fn create(path: &Path, schema: SchemaRef) -> Result<Self, IngestError> {
        let file = File::create(path)?;
        let writer = ArrowWriter::try_new(file, schema, None)
            .map_err(|e| IngestError::ExtractionError(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    pub fn write_batch(&mut self, batch: &RecordBatch) -> Result<(), IngestError> {
        self.writer
            .write(batch)
            .map_err(|e| IngestError::ExtractionError(e.to_string()))?;
        self.rows_written += batch.num_rows() as u64;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn finish(self) -> Result<u64, IngestError> {
        self.writer
            .close()
            .map_err(|e| IngestError::ExtractionError(e.to_string()))?;
        Ok(self.rows_written)
    }
}

/// Concatenate a set of shard Parquet files (all sharing the same schema)
/// into a single output file, written atomically via a `.tmp` staging
/// path renamed on success.
pub fn concatenate_shards(shards: &[PathBuf], output: &Path) -> Result<u64, IngestError> {
    let Some(first) = shards.first() else {
        return Ok(0);
    };

    let schema = read_schema(first)?;
    let tmp_path = {
        let mut name = output.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    };

    let mut writer = ShardWriter::create(&tmp_path, schema)?;

    for shard in shards {
        let file = File::open(shard)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| IngestError::ExtractionError(format!("{}: {}", shard.display(), e)))?
            .build()
            .map_err(|e| IngestError::ExtractionError(format!("{}: {}", shard.display(), e)))?;

        for batch in reader {
            let batch = batch.map_err(|e| IngestError::ExtractionError(e.to_string()))?;
            writer.write_batch(&batch)?;
        }
    }

    let total_rows = writer.finish()?;
    std::fs::rename(&tmp_path, output)?;
    Ok(total_rows)
}

fn read_schema(path: &Path) -> Result<SchemaRef, IngestError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| IngestError::ExtractionError(format!("{}: {}", path.display(), e)))?;
    Ok(builder.schema().clone())
}
