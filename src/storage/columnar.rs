//! Arrow/Parquet export of tables
//!
//! Concatenated tables can be large (millions of rows per split); a Parquet
//! copy loads far faster in downstream training code than the text form.
//! Columns are `Float64`, non-nullable, named `c0..cN`.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use super::Table;
use crate::{Error, Result};

impl Table {
    /// Convert to an Arrow record batch, one `Float64` column per table column
    ///
    /// # Errors
    /// Returns error if Arrow rejects the batch
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let fields: Vec<Field> = (0..self.num_columns())
            .map(|c| Field::new(format!("c{c}"), DataType::Float64, false))
            .collect();
        let columns: Vec<ArrayRef> = (0..self.num_columns())
            .map(|c| {
                Arc::new(Float64Array::from_iter_values(self.rows().map(|row| row[c]))) as ArrayRef
            })
            .collect();
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }

    /// Rebuild a table from record batches sharing one `Float64` schema
    ///
    /// # Errors
    /// Returns [`Error::Shape`] on non-`Float64` columns or mismatched batches
    pub fn from_record_batches(batches: &[RecordBatch]) -> Result<Self> {
        let mut table = Self::default();
        for batch in batches {
            let mut values = Vec::with_capacity(batch.num_rows() * batch.num_columns());
            let columns = batch
                .columns()
                .iter()
                .map(|column| {
                    column
                        .as_any()
                        .downcast_ref::<Float64Array>()
                        .ok_or_else(|| {
                            Error::Shape(format!(
                                "expected Float64 column, got {:?}",
                                column.data_type()
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            for row in 0..batch.num_rows() {
                values.extend(columns.iter().map(|column| column.value(row)));
            }
            table.append(&Self::new(values, batch.num_rows(), batch.num_columns())?)?;
        }
        Ok(table)
    }
}

/// Write a table to a Parquet file, overwriting `path`
///
/// # Errors
/// Returns error if the file cannot be created or encoded
pub fn write_parquet<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    let batch = table.to_record_batch()?;
    let file = File::create(path)
        .map_err(|e| Error::data_access(path, format!("cannot create: {e}")))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Read a Parquet file written by [`write_parquet`]
///
/// # Errors
/// Returns error if the file is missing or not a `Float64` table
pub fn read_parquet<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| Error::data_access(path, format!("cannot open: {e}")))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    Table::from_record_batches(&batches)
}
