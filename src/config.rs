// ==============================================================================
// config.rs - Conversion Configuration Files
// ==============================================================================
// Description: JSON configuration for field selection, short-sequence policy
//              and per-field overrides
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 0.1.0
// ==============================================================================
// Format:
//   {
//     "fields": ["CHROM", "POS", "DP"],
//     "short_sequences": "pad" | "keep_short",
//     "overrides": { "AA": { "storage": { "str": 4 }, "arity": 1, "fill": "" } }
//   }
// Converters cannot be expressed in a file; attach them in code.
// ==============================================================================

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::convert::ConversionOptions;
use crate::schema::{FieldOverrides, ShortSequencePolicy};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Parsed configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    pub fields: Option<Vec<String>>,
    pub short_sequences: ShortSequencePolicy,
    pub overrides: FieldOverrides,
}

impl ConversionConfig {
    /// Load a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        debug!(
            "Loaded config {}: {} overrides",
            path.display(),
            config.overrides.len()
        );
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn into_options(self) -> ConversionOptions {
        let mut options = ConversionOptions::new()
            .with_overrides(self.overrides)
            .with_short_sequences(self.short_sequences);
        options.fields = self.fields;
        options
    }
}
