// ==============================================================================
// grid.rs - Sample × Variant Grid View
// ==============================================================================
// Description: Two-dimensional [sample][variant] access over per-sample call
//              data arrays without copying column storage
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 0.1.0
// ==============================================================================

use arrow::array::ArrayRef;

use crate::builder::read_cell;
use crate::calldata::{check_aligned, CallDataArray};
use crate::error::{ConversionError, Result};
use crate::models::Value;
use crate::schema::{FieldSpec, Schema};

/// Borrowed [sample][variant] view over a [`CallDataArray`]
#[derive(Debug, Clone, Copy)]
pub struct Grid2D<'a> {
    data: &'a CallDataArray,
}

impl<'a> Grid2D<'a> {
    /// Build the view
    ///
    /// # Errors
    /// * `Alignment` - the per-sample arrays differ in schema or row count
    pub fn new(data: &'a CallDataArray) -> Result<Self> {
        let mut arrays = data.iter();
        if let Some((first_name, first)) = arrays.next() {
            for (name, array) in arrays {
                check_aligned(first_name, first, name, array)?;
            }
        }
        Ok(Self { data })
    }

    /// (samples, variants)
    pub fn shape(&self) -> (usize, usize) {
        (self.data.len(), self.data.num_variants())
    }

    pub fn sample_names(&self) -> &'a [String] {
        self.data.sample_names()
    }

    /// Shared per-sample schema; `None` when there are no samples
    pub fn schema(&self) -> Option<&'a Schema> {
        self.data.arrays().first().map(|a| a.schema())
    }

    /// One field across every sample
    pub fn column(&self, name: &str) -> Result<GridColumn<'a>> {
        let unknown = || ConversionError::UnknownField {
            field: name.to_string(),
            section: "call data",
        };
        let schema = self.schema().ok_or_else(unknown)?;
        let spec = schema.field(name).ok_or_else(unknown)?;
        let columns = self
            .data
            .arrays()
            .iter()
            .map(|a| a.column(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(GridColumn {
            spec,
            columns,
            variants: self.data.num_variants(),
        })
    }

    /// Cell [sample][variant] of one field
    pub fn value(&self, name: &str, sample: usize, variant: usize) -> Result<Value> {
        self.column(name)?.get(sample, variant)
    }
}

/// One field of the grid: a borrowed column per sample
#[derive(Debug, Clone)]
pub struct GridColumn<'a> {
    spec: &'a FieldSpec,
    columns: Vec<&'a ArrayRef>,
    variants: usize,
}

impl<'a> GridColumn<'a> {
    pub fn spec(&self) -> &'a FieldSpec {
        self.spec
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.columns.len(), self.variants)
    }

    /// Underlying storage of one sample's column
    pub fn sample(&self, sample: usize) -> Result<&'a ArrayRef> {
        self.columns
            .get(sample)
            .copied()
            .ok_or(ConversionError::OutOfBounds {
                index: sample,
                len: self.columns.len(),
            })
    }

    pub fn get(&self, sample: usize, variant: usize) -> Result<Value> {
        let column = self.sample(sample)?;
        if variant >= self.variants {
            return Err(ConversionError::OutOfBounds {
                index: variant,
                len: self.variants,
            });
        }
        Ok(read_cell(self.spec, column, variant))
    }

    /// All values of one variant across samples
    pub fn variant(&self, variant: usize) -> Result<Vec<Value>> {
        (0..self.columns.len())
            .map(|s| self.get(s, variant))
            .collect()
    }
}
