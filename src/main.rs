// ==============================================================================
// main.rs - VCF Array Converter Entry Point
// ==============================================================================
// Description: Command line front-end converting VCF files into Parquet
//              variant tables and per-sample call data
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 0.1.0
// ==============================================================================

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vcfarray::config::ConversionConfig;
use vcfarray::convert::{vcf_to_calldata, vcf_to_info_array, ConversionOptions};
use vcfarray::output::{write_calldata_parquet, write_parquet};
use vcfarray::schema::ShortSequencePolicy;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert per-variant fields (fixed columns, derived flags, INFO)
    Info {
        #[command(flatten)]
        common: CommonArgs,

        /// Parquet file to write
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert per-sample FORMAT fields and call attributes
    Calldata {
        #[command(flatten)]
        common: CommonArgs,

        /// Directory receiving one Parquet file per sample
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Input VCF (.vcf or .vcf.gz)
    input: PathBuf,

    /// Comma-separated field list (default: all fields)
    #[arg(short, long, value_delimiter = ',')]
    fields: Option<Vec<String>>,

    /// JSON configuration file with field selection and overrides
    #[arg(short, long, env = "VCFARRAY_CONFIG")]
    config: Option<PathBuf>,

    /// Leave short sequences unpadded (trailing slots stored as nulls)
    #[arg(long)]
    keep_short: bool,
}

impl CommonArgs {
    fn options(&self) -> Result<ConversionOptions> {
        // Config file first, command line flags override it
        let mut options = match &self.config {
            Some(path) => ConversionConfig::load(path)?.into_options(),
            None => ConversionOptions::new(),
        };
        if let Some(fields) = &self.fields {
            options.fields = Some(fields.clone());
        }
        if self.keep_short {
            options.short_sequences = ShortSequencePolicy::KeepShort;
        }
        Ok(options)
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vcfarray=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command line arguments
    let cli = Cli::parse();

    match cli.command {
        Command::Info { common, output } => {
            let options = common.options()?;
            info!("Converting variants from {}", common.input.display());
            let array = vcf_to_info_array(&common.input, &options)
                .with_context(|| format!("Failed to convert {}", common.input.display()))?;

            // Print summary
            println!(
                "{}: {} variants × {} columns [{}]",
                common.input.display(),
                array.num_rows(),
                array.num_columns(),
                array.column_names().join(", ")
            );

            // Write Parquet output if requested
            if let Some(path) = output {
                write_parquet(&array, &path)?;
            }
        }
        Command::Calldata { common, output_dir } => {
            let options = common.options()?;
            info!("Converting call data from {}", common.input.display());
            let data = vcf_to_calldata(&common.input, &options)
                .with_context(|| format!("Failed to convert {}", common.input.display()))?;

            // Print one summary line per sample
            for (sample, array) in data.iter() {
                println!(
                    "{}: {} variants × {} columns",
                    sample,
                    array.num_rows(),
                    array.num_columns()
                );
            }

            // Write one Parquet file per sample if requested
            if let Some(dir) = output_dir {
                write_calldata_parquet(&data, &dir)?;
            }
        }
    }

    Ok(())
}
