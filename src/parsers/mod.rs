// ==============================================================================
// parsers/mod.rs - File parser modules
// ==============================================================================
// Description: Readers that turn on-disk variant files into in-memory records
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 0.1.0
// ==============================================================================

pub mod vcf;

pub use vcf::{VcfReadError, VcfRecords, VcfSource};
