//! Conversion between [`Dataset`] and Arrow record batches
//!
//! Ingestion and export collaborators speak Arrow; the engine itself only
//! needs two physical types: Float64 for numbers and Utf8 for labels.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use super::{Column, Dataset};
use crate::{Error, Result};

impl Dataset {
    /// Convert to an Arrow record batch (Float64 / Utf8 columns, non-null).
    ///
    /// # Errors
    /// Returns error if Arrow rejects the batch.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut fields = Vec::with_capacity(self.num_columns());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.num_columns());

        for (name, column) in self.columns() {
            match column {
                Column::Numeric(values) => {
                    fields.push(Field::new(name, DataType::Float64, false));
                    arrays.push(Arc::new(Float64Array::from(values.clone())));
                }
                Column::Categorical(labels) => {
                    fields.push(Field::new(name, DataType::Utf8, false));
                    arrays.push(Arc::new(StringArray::from(labels.clone())));
                }
            }
        }

        let options = RecordBatchOptions::new().with_row_count(Some(self.num_rows()));
        let batch =
            RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
        Ok(batch)
    }

    /// Build a dataset from an Arrow record batch.
    ///
    /// Integer and float columns become numeric (cast to Float64), string
    /// columns become categorical.
    ///
    /// # Errors
    /// Returns error if a column contains nulls or has an unsupported type.
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        let mut dataset = Self::new();

        for (field, array) in schema.fields().iter().zip(batch.columns()) {
            if array.null_count() > 0 {
                return Err(Error::InvalidInput(format!(
                    "column {} contains {} null values",
                    field.name(),
                    array.null_count()
                )));
            }

            let column = match field.data_type() {
                DataType::Utf8 | DataType::LargeUtf8 => {
                    let utf8 = cast(array, &DataType::Utf8)?;
                    let labels = utf8
                        .as_any()
                        .downcast_ref::<StringArray>()
                        .ok_or_else(|| unsupported(field.name(), field.data_type()))?;
                    Column::Categorical(
                        (0..labels.len()).map(|i| labels.value(i).to_string()).collect(),
                    )
                }
                DataType::Float64
                | DataType::Float32
                | DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64 => {
                    let floats = cast(array, &DataType::Float64)?;
                    let values = floats
                        .as_any()
                        .downcast_ref::<Float64Array>()
                        .ok_or_else(|| unsupported(field.name(), field.data_type()))?;
                    Column::Numeric(values.values().to_vec())
                }
                other => return Err(unsupported(field.name(), other)),
            };

            dataset.push_column(field.name().clone(), column)?;
        }

        Ok(dataset)
    }
}

fn unsupported(name: &str, data_type: &DataType) -> Error {
    Error::ColumnType {
        column: name.to_string(),
        expected: "number or text",
        detail: format!("unsupported Arrow type {data_type:?}"),
    }
}
