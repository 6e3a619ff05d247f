// ==============================================================================
// convert.rs - Conversion Entry Points
// ==============================================================================
// Description: Drives schema resolution, row extraction and array building
//              for per-variant and per-sample conversions
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 0.1.0
// ==============================================================================
// Pipeline:
//   HeaderMeta → SchemaResolver → Schema
//   records → ValueExtractor | CallDataExtractor → ArrayBuilder(s)
//   → TypedArray | CallDataArray
// ==============================================================================

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::builder::{ArrayBuilder, TypedArray};
use crate::calldata::{CallDataArray, CallDataBuilder, CallDataExtractor};
use crate::error::{ConversionError, Result};
use crate::models::{HeaderMeta, VariantRecord};
use crate::parsers::VcfSource;
use crate::schema::{
    FieldOverride, FieldOverrides, SchemaResolver, ShortSequencePolicy, TypeDefaults,
    STANDARD_DEFAULTS,
};
use crate::variants::ValueExtractor;

/// Parameters shared by both conversion calls
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Explicit field list; `None` selects the default field set
    pub fields: Option<Vec<String>>,

    /// Per-field storage/arity/fill/converter overrides
    pub overrides: FieldOverrides,

    pub short_sequences: ShortSequencePolicy,

    /// VCF type → storage/fill tables
    pub defaults: &'static TypeDefaults,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            fields: None,
            overrides: FieldOverrides::new(),
            short_sequences: ShortSequencePolicy::default(),
            defaults: &STANDARD_DEFAULTS,
        }
    }
}

impl ConversionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the conversion to these fields, in this order
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_override(mut self, field: impl Into<String>, over: FieldOverride) -> Self {
        self.overrides.insert(field.into(), over);
        self
    }

    pub fn with_overrides(mut self, overrides: FieldOverrides) -> Self {
        self.overrides.extend(overrides);
        self
    }

    pub fn with_short_sequences(mut self, policy: ShortSequencePolicy) -> Self {
        self.short_sequences = policy;
        self
    }

    pub fn with_defaults(mut self, defaults: &'static TypeDefaults) -> Self {
        self.defaults = defaults;
        self
    }
}

/// Per-variant conversion over any record stream
///
/// # Arguments
/// * `header` - Header declarations used to resolve the schema
/// * `records` - Records in input order
/// * `options` - Field selection and overrides
///
/// # Returns
/// * `Result<TypedArray>` - One row per record, or the first error
///
/// # Errors
/// * `UnknownField` - an unknown field or override key, raised before any record is pulled
/// * `SchemaViolation` - an override conflicts with its field, or a value does not fit its column
pub fn info_array_from_records<I, E>(
    header: &HeaderMeta,
    records: I,
    options: &ConversionOptions,
) -> Result<TypedArray>
where
    I: IntoIterator<Item = std::result::Result<VariantRecord, E>>,
    E: Into<ConversionError>,
{
    // Resolve the full layout before pulling any record
    let schema = Arc::new(
        SchemaResolver::new(header, options.defaults)
            .resolve_variants(options.fields.as_deref(), &options.overrides)?,
    );
    debug!("Variant schema has {} columns", schema.len());

    // Stream records into the column builders, one row each
    let extractor = ValueExtractor::new(&schema, options.short_sequences);
    let mut builder = ArrayBuilder::new(Arc::clone(&schema));
    for record in records {
        let record = record.map_err(Into::into)?;
        builder.append(extractor.extract(&record))?;
    }

    let array = builder.finish()?;
    info!(
        "Built variant array: {} rows × {} columns",
        array.num_rows(),
        array.num_columns()
    );
    Ok(array)
}

/// Per-sample conversion over any record stream
///
/// Sample names come from `header`; every record must carry one sample entry
/// per declared sample.
///
/// # Errors
/// * `UnknownField` - a requested name is neither a FORMAT id nor a call attribute
/// * `Alignment` - a record's sample count differs from the header
/// * `SchemaViolation` - a value does not fit its column
pub fn calldata_from_records<I, E>(
    header: &HeaderMeta,
    records: I,
    options: &ConversionOptions,
) -> Result<CallDataArray>
where
    I: IntoIterator<Item = std::result::Result<VariantRecord, E>>,
    E: Into<ConversionError>,
{
    // Resolve the full layout before pulling any record
    let schema = Arc::new(
        SchemaResolver::new(header, options.defaults)
            .resolve_calldata(options.fields.as_deref(), &options.overrides)?,
    );
    debug!(
        "Call data schema has {} columns for {} samples",
        schema.len(),
        header.samples.len()
    );

    // One builder per sample, fed one row per record
    let extractor = CallDataExtractor::new(&schema, options.short_sequences);
    let mut builder = CallDataBuilder::new(Arc::clone(&schema), header.samples.clone());
    for record in records {
        let record = record.map_err(Into::into)?;
        builder.append(extractor.extract(&record))?;
    }

    let data = builder.finish()?;
    info!(
        "Built call data: {} samples × {} variants",
        data.len(),
        data.num_variants()
    );
    Ok(data)
}

/// Convert a VCF file into a per-variant array
///
/// # Example
/// ```no_run
/// use vcfarray::convert::{vcf_to_info_array, ConversionOptions};
///
/// let options = ConversionOptions::new().with_fields(["CHROM", "POS", "DP"]);
/// let array = vcf_to_info_array("sample.vcf", &options)?;
/// println!("{} variants", array.num_rows());
/// # Ok::<(), vcfarray::error::ConversionError>(())
/// ```
pub fn vcf_to_info_array(path: impl AsRef<Path>, options: &ConversionOptions) -> Result<TypedArray> {
    // Open VCF and take a copy of the header before borrowing the reader
    let mut source = VcfSource::open(path)?;
    let header = source.header().clone();
    info_array_from_records(&header, source.records(), options)
}

/// Convert a VCF file into per-sample call data arrays
pub fn vcf_to_calldata(path: impl AsRef<Path>, options: &ConversionOptions) -> Result<CallDataArray> {
    // Open VCF and take a copy of the header before borrowing the reader
    let mut source = VcfSource::open(path)?;
    let header = source.header().clone();
    calldata_from_records(&header, source.records(), options)
}
