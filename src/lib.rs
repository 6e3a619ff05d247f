// ==============================================================================
// lib.rs - VCF Array Converter Library
// ==============================================================================
// Description: Library interface for converting VCF records into typed
//              columnar arrays
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 0.1.0
// ==============================================================================

pub mod parsers;
pub mod error;
pub mod models;
pub mod genotype;
pub mod schema;
pub mod builder;
pub mod variants;
pub mod calldata;
pub mod grid;
pub mod convert;
pub mod config;
pub mod output;

pub use builder::{ArrayBuilder, TypedArray};
pub use calldata::{CallDataArray, CallDataBuilder, CallDataExtractor};
pub use config::ConversionConfig;
pub use convert::{
    calldata_from_records, info_array_from_records, vcf_to_calldata, vcf_to_info_array,
    ConversionOptions,
};
pub use error::{ConversionError, Result};
pub use grid::{Grid2D, GridColumn};
pub use schema::{FieldOverride, Schema, SchemaResolver, ShortSequencePolicy, StorageType};
pub use variants::ValueExtractor;
