// ==============================================================================
// output.rs - Parquet Export
// ==============================================================================
// Description: Writes typed arrays and per-sample call data to Parquet files
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 0.1.0
// ==============================================================================

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::builder::TypedArray;
use crate::calldata::CallDataArray;

/// Write one typed array to a Parquet file
///
/// The Arrow schema, including per-field storage/arity metadata, is stored
/// in the file.
pub fn write_parquet(array: &TypedArray, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    write_batch(array.record_batch(), path)?;
    info!(
        "Parquet output complete: {} rows → {}",
        array.num_rows(),
        path.display()
    );
    Ok(path.to_path_buf())
}

/// Write one Parquet file per sample into `dir`
///
/// Files are named after the sample, in sample order.
pub fn write_calldata_parquet(data: &CallDataArray, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    // Create output directory
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(data.len());
    for (sample, array) in data.iter() {
        let path = dir.join(format!("{}.parquet", file_stem(sample)));
        write_batch(array.record_batch(), &path)
            .with_context(|| format!("Failed to write call data for sample {}", sample))?;
        written.push(path);
    }

    info!(
        "Call data output complete: {} samples × {} variants → {}",
        data.len(),
        data.num_variants(),
        dir.display()
    );
    Ok(written)
}

fn write_batch(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create Parquet file {}", path.display()))?;

    // Configure Parquet writer with Snappy compression
    let props = WriterProperties::builder()
        .set_compression(parquet::basic::Compression::SNAPPY)
        .build();

    // Write the batch and close to flush the footer
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("Failed to create Parquet writer")?;
    writer.write(batch).context("Failed to write Parquet data")?;
    writer.close().context("Failed to close Parquet writer")?;
    Ok(())
}

/// Sample name made safe for use as a file name
fn file_stem(sample: &str) -> String {
    sample
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ArrayBuilder;
    use crate::models::{FieldDeclaration, HeaderMeta, Number, Row, Scalar, Value, VcfType};
    use crate::schema::{FieldOverrides, SchemaResolver, STANDARD_DEFAULTS};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::sync::Arc;

    fn array(rows: usize) -> TypedArray {
        let header = HeaderMeta {
            infos: vec![FieldDeclaration::new("HQ", VcfType::Integer, Number::Count(2))],
            ..Default::default()
        };
        let fields = vec!["POS".to_string(), "HQ".to_string()];
        let schema = Arc::new(
            SchemaResolver::new(&header, &STANDARD_DEFAULTS)
                .resolve_variants(Some(&fields), &FieldOverrides::new())
                .unwrap(),
        );
        let rows: Vec<crate::error::Result<Row>> = (0..rows as i64)
            .map(|i| {
                Ok(vec![
                    Value::Scalar(Scalar::Integer(i)),
                    Value::Tuple(vec![Some(Scalar::Integer(i)), None]),
                ])
            })
            .collect();
        ArrayBuilder::from_rows(schema, rows).unwrap()
    }

    fn read_back(path: &Path) -> RecordBatch {
        let file = fs::File::open(path).unwrap();
        let mut reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        reader.next().unwrap().unwrap()
    }

    #[test]
    fn test_write_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("variants.parquet");
        let array = array(3);

        let written = write_parquet(&array, &path).unwrap();
        assert_eq!(written, path);

        let batch = read_back(&path);
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.schema().field(0).name(), "POS");
        assert_eq!(batch.schema().field(1).name(), "HQ");
    }

    #[test]
    fn test_write_calldata_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let data = CallDataArray::from_parts(
            vec!["NA00001".to_string(), "sample/2".to_string()],
            vec![array(2), array(2)],
        )
        .unwrap();

        let written = write_calldata_parquet(&data, dir.path().join("calls")).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("NA00001.parquet"));
        assert!(written[1].ends_with("sample_2.parquet"));
        assert_eq!(read_back(&written[1]).num_rows(), 2);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("NA00001"), "NA00001");
        assert_eq!(file_stem("a b/c"), "a_b_c");
    }
}
