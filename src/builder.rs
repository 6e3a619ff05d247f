// ==============================================================================
// builder.rs - Typed Array Construction
// ==============================================================================
// Description: Appends extracted rows into Arrow column builders and exposes
//              the finished columnar array
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 0.1.0
// ==============================================================================
// Layout per column:
//   arity 1  → Int32 / Float32 / Boolean / Utf8 array
//   arity N  → FixedSizeList<N> of the element type (null slots allowed)
//   FILTER   → Struct { joined: Utf8, PASS: Boolean, <filter id>: Boolean, ... }
// ==============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanBuilder, FixedSizeListBuilder, Float32Builder, Int32Builder,
    StringBuilder, StructArray,
};
use arrow::datatypes::{DataType, Field, Fields, Float32Type, Int32Type, Schema as ArrowSchema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use crate::error::{ConversionError, Result};
use crate::models::{FilterFlags, Row, Scalar, Value};
use crate::schema::{FieldSpec, Schema, StorageType};

/// Child name of the joined FILTER text inside the FILTER struct
pub const FILTER_JOINED: &str = "joined";

/// Check that a scalar can be stored under the given storage type
pub(crate) fn check_scalar(storage: &StorageType, value: &Scalar) -> std::result::Result<(), String> {
    match storage {
        StorageType::Int32 => to_i32(value).map(|_| ()),
        StorageType::Float32 => to_f32(value).map(|_| ()),
        StorageType::Boolean => to_bool(value).map(|_| ()),
        StorageType::Str(_) => Ok(()),
        StorageType::Filter => Err("a single value cannot fill a FILTER column".to_string()),
    }
}

fn to_i32(value: &Scalar) -> std::result::Result<i32, String> {
    match value {
        Scalar::Integer(n) => {
            i32::try_from(*n).map_err(|_| format!("{} does not fit a 32-bit integer", n))
        }
        Scalar::Flag(b) => Ok(i32::from(*b)),
        Scalar::String(s) => s
            .trim()
            .parse::<i32>()
            .map_err(|_| format!("'{}' is not an integer", s)),
        Scalar::Character(c) => c
            .to_digit(10)
            .map(|d| d as i32)
            .ok_or_else(|| format!("'{}' is not an integer", c)),
        Scalar::Float(x) => Err(format!("float {} cannot be stored as an integer", x)),
    }
}

fn to_f32(value: &Scalar) -> std::result::Result<f32, String> {
    match value {
        Scalar::Float(x) => Ok(*x),
        Scalar::Integer(n) => Ok(*n as f32),
        Scalar::String(s) => s
            .trim()
            .parse::<f32>()
            .map_err(|_| format!("'{}' is not a number", s)),
        Scalar::Flag(_) | Scalar::Character(_) => {
            Err(format!("{:?} cannot be stored as a float", value))
        }
    }
}

fn to_bool(value: &Scalar) -> std::result::Result<bool, String> {
    match value {
        Scalar::Flag(b) => Ok(*b),
        Scalar::Integer(n) => Ok(*n != 0),
        _ => Err(format!("{:?} cannot be stored as a boolean", value)),
    }
}

/// Cut text to at most `width` bytes without splitting a character
fn bounded(text: &str, width: usize) -> &str {
    if text.len() <= width {
        return text;
    }
    let mut end = width;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Arrow builder for one column
enum ColumnBuilder {
    Int32(Int32Builder),
    Float32(Float32Builder),
    Boolean(BooleanBuilder),
    Str(StringBuilder, usize),
    Int32List(FixedSizeListBuilder<Int32Builder>),
    Float32List(FixedSizeListBuilder<Float32Builder>),
    BooleanList(FixedSizeListBuilder<BooleanBuilder>),
    StrList(FixedSizeListBuilder<StringBuilder>, usize),
    Filter {
        joined: StringBuilder,
        names: Vec<String>,
        flags: Vec<BooleanBuilder>,
    },
}

impl ColumnBuilder {
    fn new(spec: &FieldSpec, filter_columns: &[String]) -> Self {
        let n = spec.arity as i32;
        match (&spec.storage, spec.arity) {
            (StorageType::Filter, _) => ColumnBuilder::Filter {
                joined: StringBuilder::new(),
                names: filter_columns.to_vec(),
                flags: filter_columns.iter().map(|_| BooleanBuilder::new()).collect(),
            },
            (StorageType::Int32, 1) => ColumnBuilder::Int32(Int32Builder::new()),
            (StorageType::Float32, 1) => ColumnBuilder::Float32(Float32Builder::new()),
            (StorageType::Boolean, 1) => ColumnBuilder::Boolean(BooleanBuilder::new()),
            (StorageType::Str(w), 1) => ColumnBuilder::Str(StringBuilder::new(), *w),
            (StorageType::Int32, _) => {
                ColumnBuilder::Int32List(FixedSizeListBuilder::new(Int32Builder::new(), n))
            }
            (StorageType::Float32, _) => {
                ColumnBuilder::Float32List(FixedSizeListBuilder::new(Float32Builder::new(), n))
            }
            (StorageType::Boolean, _) => {
                ColumnBuilder::BooleanList(FixedSizeListBuilder::new(BooleanBuilder::new(), n))
            }
            (StorageType::Str(w), _) => {
                ColumnBuilder::StrList(FixedSizeListBuilder::new(StringBuilder::new(), n), *w)
            }
        }
    }

    fn append(&mut self, spec: &FieldSpec, value: Value) -> Result<()> {
        let fail = |reason: String| ConversionError::violation(&spec.name, reason);

        match (self, value) {
            (ColumnBuilder::Int32(b), Value::Scalar(s)) => b.append_value(to_i32(&s).map_err(fail)?),
            (ColumnBuilder::Float32(b), Value::Scalar(s)) => {
                b.append_value(to_f32(&s).map_err(fail)?)
            }
            (ColumnBuilder::Boolean(b), Value::Scalar(s)) => {
                b.append_value(to_bool(&s).map_err(fail)?)
            }
            (ColumnBuilder::Str(b, w), Value::Scalar(s)) => b.append_value(bounded(&s.to_string(), *w)),
            (ColumnBuilder::Int32List(b), Value::Tuple(items)) => {
                check_len(spec, items.len())?;
                for item in items {
                    match item {
                        Some(s) => b.values().append_value(to_i32(&s).map_err(fail)?),
                        None => b.values().append_null(),
                    }
                }
                b.append(true);
            }
            (ColumnBuilder::Float32List(b), Value::Tuple(items)) => {
                check_len(spec, items.len())?;
                for item in items {
                    match item {
                        Some(s) => b.values().append_value(to_f32(&s).map_err(fail)?),
                        None => b.values().append_null(),
                    }
                }
                b.append(true);
            }
            (ColumnBuilder::BooleanList(b), Value::Tuple(items)) => {
                check_len(spec, items.len())?;
                for item in items {
                    match item {
                        Some(s) => b.values().append_value(to_bool(&s).map_err(fail)?),
                        None => b.values().append_null(),
                    }
                }
                b.append(true);
            }
            (ColumnBuilder::StrList(b, w), Value::Tuple(items)) => {
                check_len(spec, items.len())?;
                for item in items {
                    match item {
                        Some(s) => b.values().append_value(bounded(&s.to_string(), *w)),
                        None => b.values().append_null(),
                    }
                }
                b.append(true);
            }
            (ColumnBuilder::Filter { joined, flags, .. }, Value::Filter(cell)) => {
                if cell.flags.len() != flags.len() {
                    return Err(fail(format!(
                        "expected {} filter flags, got {}",
                        flags.len(),
                        cell.flags.len()
                    )));
                }
                joined.append_value(&cell.joined);
                for (builder, flag) in flags.iter_mut().zip(cell.flags) {
                    builder.append_value(flag);
                }
            }
            (_, Value::Tuple(items)) => {
                return Err(fail(format!(
                    "expected a single value, got a sequence of {}",
                    items.len()
                )))
            }
            (_, Value::Filter(_)) => {
                return Err(fail("FILTER flags in a non-FILTER column".to_string()))
            }
            (ColumnBuilder::Filter { .. }, Value::Scalar(s)) => {
                return Err(fail(format!("expected FILTER flags, got {:?}", s)))
            }
            (_, Value::Scalar(s)) => {
                return Err(fail(format!(
                    "expected {} values, got single value {:?}",
                    spec.arity, s
                )))
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<ArrayRef> {
        let array: ArrayRef = match self {
            ColumnBuilder::Int32(b) => Arc::new(b.finish()),
            ColumnBuilder::Float32(b) => Arc::new(b.finish()),
            ColumnBuilder::Boolean(b) => Arc::new(b.finish()),
            ColumnBuilder::Str(b, _) => Arc::new(b.finish()),
            ColumnBuilder::Int32List(b) => Arc::new(b.finish()),
            ColumnBuilder::Float32List(b) => Arc::new(b.finish()),
            ColumnBuilder::BooleanList(b) => Arc::new(b.finish()),
            ColumnBuilder::StrList(b, _) => Arc::new(b.finish()),
            ColumnBuilder::Filter {
                joined,
                names,
                flags,
            } => {
                let mut fields = vec![Field::new(FILTER_JOINED, DataType::Utf8, false)];
                let mut children: Vec<ArrayRef> = vec![Arc::new(joined.finish())];
                for (name, builder) in names.iter().zip(flags.iter_mut()) {
                    fields.push(Field::new(name, DataType::Boolean, false));
                    children.push(Arc::new(builder.finish()));
                }
                Arc::new(StructArray::try_new(Fields::from(fields), children, None)?)
            }
        };
        Ok(array)
    }
}

fn check_len(spec: &FieldSpec, len: usize) -> Result<()> {
    if len != spec.arity {
        return Err(ConversionError::violation(
            &spec.name,
            format!("expected {} values, got {}", spec.arity, len),
        ));
    }
    Ok(())
}

/// Incrementally builds a [`TypedArray`] from rows
///
/// The row count does not need to be known in advance.
pub struct ArrayBuilder {
    schema: Arc<Schema>,
    columns: Vec<ColumnBuilder>,
    rows: usize,
}

impl ArrayBuilder {
    pub fn new(schema: Arc<Schema>) -> Self {
        let columns = schema
            .fields()
            .iter()
            .map(|spec| ColumnBuilder::new(spec, schema.filter_columns()))
            .collect();
        Self {
            schema,
            columns,
            rows: 0,
        }
    }

    /// Pull every row from `rows` and build the array
    ///
    /// Stops at the first error; no partial array is returned.
    pub fn from_rows<I, E>(schema: Arc<Schema>, rows: I) -> Result<TypedArray>
    where
        I: IntoIterator<Item = std::result::Result<Row, E>>,
        E: Into<ConversionError>,
    {
        let mut builder = Self::new(schema);
        for row in rows {
            builder.append(row.map_err(Into::into)?)?;
        }
        builder.finish()
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Append one row
    ///
    /// # Errors
    /// * `SchemaViolation` - the row length or a cell's shape/type does not match the schema
    pub fn append(&mut self, row: Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ConversionError::violation(
                "<row>",
                format!("expected {} columns, got {}", self.columns.len(), row.len()),
            ));
        }
        for ((column, spec), value) in self
            .columns
            .iter_mut()
            .zip(self.schema.fields())
            .zip(row)
        {
            column.append(spec, value)?;
        }
        self.rows += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<TypedArray> {
        let arrays = self
            .columns
            .iter_mut()
            .map(|c| c.finish())
            .collect::<Result<Vec<_>>>()?;

        let fields: Vec<Field> = self
            .schema
            .fields()
            .iter()
            .zip(&arrays)
            .map(|(spec, array)| {
                let metadata = HashMap::from([
                    ("storage".to_string(), spec.storage.to_string()),
                    ("arity".to_string(), spec.arity.to_string()),
                ]);
                Field::new(&spec.name, array.data_type().clone(), false).with_metadata(metadata)
            })
            .collect();

        let options = RecordBatchOptions::new().with_row_count(Some(self.rows));
        let batch =
            RecordBatch::try_new_with_options(Arc::new(ArrowSchema::new(fields)), arrays, &options)?;

        Ok(TypedArray {
            schema: self.schema,
            batch,
        })
    }
}

/// Fixed-layout columnar array of rows under one schema
///
/// Row order equals input record order.
#[derive(Debug, Clone)]
pub struct TypedArray {
    schema: Arc<Schema>,
    batch: RecordBatch,
}

impl TypedArray {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.names().collect()
    }

    /// Column storage by field name
    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        let index = self.index_of(name)?;
        Ok(self.batch.column(index))
    }

    /// Read one cell back as a [`Value`]
    pub fn value(&self, name: &str, row: usize) -> Result<Value> {
        let index = self.index_of(name)?;
        if row >= self.num_rows() {
            return Err(ConversionError::OutOfBounds {
                index: row,
                len: self.num_rows(),
            });
        }
        Ok(read_cell(&self.schema.fields()[index], self.batch.column(index), row))
    }

    pub fn record_batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_record_batch(self) -> RecordBatch {
        self.batch
    }

    /// Same column names, storage and arity
    pub(crate) fn same_layout(&self, other: &TypedArray) -> bool {
        self.batch.schema() == other.batch.schema()
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.schema
            .index_of(name)
            .ok_or_else(|| ConversionError::UnknownField {
                field: name.to_string(),
                section: "array",
            })
    }
}

/// Decode one cell of a column built by [`ArrayBuilder`]
pub(crate) fn read_cell(spec: &FieldSpec, array: &ArrayRef, row: usize) -> Value {
    if spec.storage == StorageType::Filter {
        let cell = array.as_struct();
        let joined = cell.column(0).as_string::<i32>().value(row).to_string();
        let flags = cell.columns()[1..]
            .iter()
            .map(|c| c.as_boolean().value(row))
            .collect();
        return Value::Filter(FilterFlags { joined, flags });
    }

    if spec.arity == 1 {
        return match read_scalar(&spec.storage, array.as_ref(), row) {
            Some(s) => Value::Scalar(s),
            None => Value::Tuple(Vec::new()),
        };
    }

    let slot = array.as_fixed_size_list().value(row);
    Value::Tuple(
        (0..slot.len())
            .map(|i| read_scalar(&spec.storage, slot.as_ref(), i))
            .collect(),
    )
}

fn read_scalar(storage: &StorageType, array: &dyn Array, i: usize) -> Option<Scalar> {
    if array.is_null(i) {
        return None;
    }
    let value = match storage {
        StorageType::Int32 => Scalar::Integer(array.as_primitive::<Int32Type>().value(i) as i64),
        StorageType::Float32 => Scalar::Float(array.as_primitive::<Float32Type>().value(i)),
        StorageType::Boolean => Scalar::Flag(array.as_boolean().value(i)),
        StorageType::Str(_) | StorageType::Filter => {
            Scalar::String(array.as_string::<i32>().value(i).to_string())
        }
    };
    Some(value)
}
