// ==============================================================================
// parsers/vcf.rs - VCF record source
// ==============================================================================
// Description: Reads VCF headers and records with noodles-vcf and maps them
//              onto the crate's header and record models
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 0.1.0
// ==============================================================================
// References:
// - VCF 4.2 Spec: https://samtools.github.io/hts-specs/VCFv4.2.pdf
// - noodles-vcf: https://docs.rs/noodles-vcf/0.81.0/noodles_vcf/
// ==============================================================================
// Mapping:
//   FILTER PASS or '.'  → empty filter list
//   ID '.'              → None, multiple IDs joined with ';'
//   ALT '.'             → empty ALT list
//   INFO/FORMAT '.'     → key treated as absent
//   FORMAT GT           → Genotype plus its rendered text
// ==============================================================================

use std::collections::HashMap;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use noodles_vcf as vcf;
use noodles_vcf::header::record::value::map::format::{Number as FormatNumber, Type as FormatType};
use noodles_vcf::header::record::value::map::info::{Number, Type as InfoType};
use noodles_vcf::variant::record::info::field::{value::Array as ValueArray, Value};
use noodles_vcf::variant::record::samples::series::value::genotype::Phasing;
use noodles_vcf::variant::record::samples::series::value::Array as SamplesArray;
use noodles_vcf::variant::record::samples::series::Value as SV;
use noodles_vcf::variant::record::{AlternateBases, Filters, Ids, Samples};
use noodles_vcf::variant::Record;
use thiserror::Error;
use tracing::{debug, info};

use crate::genotype::Genotype;
use crate::models::{self, FieldDeclaration, HeaderMeta, RawValue, Sample, Scalar, VariantRecord, VcfType};
use crate::schema::PASS;

/// VCF reading errors
#[derive(Error, Debug)]
pub enum VcfReadError {
    #[error("Failed to open VCF file: {0}")]
    Open(String),

    #[error("Failed to read VCF header: {0}")]
    Header(String),

    #[error("Failed to parse VCF record {record}: {reason}")]
    Record { record: usize, reason: String },
}

/// Open VCF file with its header already read
///
/// Records are pulled lazily, one at a time, through [`VcfSource::records`].
pub struct VcfSource {
    path: PathBuf,
    reader: vcf::io::Reader<Box<dyn BufRead>>,
    header: vcf::Header,
    meta: HeaderMeta,
}

impl VcfSource {
    /// Open a plain or BGZF-compressed VCF file and read its header
    ///
    /// # Arguments
    /// * `path` - Path to a `.vcf` or `.vcf.gz` file
    ///
    /// # Example
    /// ```no_run
    /// use vcfarray::parsers::VcfSource;
    ///
    /// let mut source = VcfSource::open("sample.vcf")?;
    /// println!("{} samples", source.header().samples.len());
    /// for record in source.records() {
    ///     let record = record?;
    ///     println!("{}:{}", record.chrom, record.pos);
    /// }
    /// # Ok::<(), vcfarray::parsers::VcfReadError>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self, VcfReadError> {
        let path = path.as_ref();

        // Open VCF file using noodles builder (detects BGZF from the extension)
        let mut reader = vcf::io::reader::Builder::default()
            .build_from_path(path)
            .map_err(|e| VcfReadError::Open(format!("{}: {}", path.display(), e)))?;

        // Read header
        let header = reader
            .read_header()
            .map_err(|e| VcfReadError::Header(format!("{}: {}", path.display(), e)))?;

        // Collect declarations and sample names
        let meta = header_meta(&header);
        info!(
            "Opened {} ({} INFO, {} FORMAT, {} FILTER, {} samples)",
            path.display(),
            meta.infos.len(),
            meta.formats.len(),
            meta.filters.len(),
            meta.samples.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            header,
            meta,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header declarations and sample names
    pub fn header(&self) -> &HeaderMeta {
        &self.meta
    }

    /// Forward-only iterator over the remaining records
    pub fn records(&mut self) -> VcfRecords<'_> {
        VcfRecords {
            reader: &mut self.reader,
            header: &self.header,
            record: vcf::Record::default(),
            count: 0,
            done: false,
        }
    }
}

/// Lazy record iterator borrowed from a [`VcfSource`]
///
/// Reuses a single noodles record buffer across reads. Iteration ends at
/// end of file or after the first error.
pub struct VcfRecords<'a> {
    reader: &'a mut vcf::io::Reader<Box<dyn BufRead>>,
    header: &'a vcf::Header,
    record: vcf::Record,
    count: usize,
    done: bool,
}

impl Iterator for VcfRecords<'_> {
    type Item = Result<VariantRecord, VcfReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // Read next record into the reused buffer
        match self.reader.read_record(&mut self.record) {
            Ok(0) => {
                self.done = true;
                debug!("Reached end of input after {} records", self.count);
                None
            }
            Ok(_) => {
                self.count += 1;
                let result = convert_record(&self.record, self.header).map_err(|e| {
                    VcfReadError::Record {
                        record: self.count,
                        reason: e.to_string(),
                    }
                });
                if result.is_err() {
                    self.done = true;
                }
                Some(result)
            }
            Err(e) => {
                self.done = true;
                Some(Err(VcfReadError::Record {
                    record: self.count + 1,
                    reason: e.to_string(),
                }))
            }
        }
    }
}

/// Collect header declarations, filter ids and sample names in header order
fn header_meta(header: &vcf::Header) -> HeaderMeta {
    // Extract INFO declarations
    let infos = header
        .infos()
        .iter()
        .map(|(id, info)| {
            FieldDeclaration::new(id.as_str(), info_type(info.ty()), info_number(info.number()))
        })
        .collect();

    // Extract FORMAT declarations
    let formats = header
        .formats()
        .iter()
        .map(|(id, format)| {
            FieldDeclaration::new(
                id.as_str(),
                format_type(format.ty()),
                format_number(format.number()),
            )
        })
        .collect();

    let filters = header.filters().keys().map(|id| id.to_string()).collect();
    let samples = header.sample_names().iter().map(|s| s.to_string()).collect();

    HeaderMeta {
        infos,
        formats,
        filters,
        samples,
    }
}

fn info_type(ty: InfoType) -> VcfType {
    match ty {
        InfoType::Integer => VcfType::Integer,
        InfoType::Float => VcfType::Float,
        InfoType::Flag => VcfType::Flag,
        InfoType::Character => VcfType::Character,
        InfoType::String => VcfType::String,
    }
}

fn format_type(ty: FormatType) -> VcfType {
    match ty {
        FormatType::Integer => VcfType::Integer,
        FormatType::Float => VcfType::Float,
        FormatType::Character => VcfType::Character,
        FormatType::String => VcfType::String,
    }
}

fn info_number(number: Number) -> models::Number {
    match number {
        Number::Count(n) => models::Number::Count(n),
        _ => models::Number::Unknown,
    }
}

fn format_number(number: FormatNumber) -> models::Number {
    match number {
        FormatNumber::Count(n) => models::Number::Count(n),
        _ => models::Number::Unknown,
    }
}

/// Map one noodles record onto a [`VariantRecord`]
fn convert_record(record: &vcf::Record, header: &vcf::Header) -> io::Result<VariantRecord> {
    let chrom = record.reference_sequence_name().to_string();

    let pos = match record.variant_start() {
        Some(result) => usize::from(result?) as i64,
        None => return Err(io::Error::new(io::ErrorKind::InvalidData, "missing position")),
    };

    // Multiple IDs are joined with ';'
    let ids_field = record.ids();
    let ids: Vec<&str> = ids_field.iter().collect();
    let id = if ids.is_empty() {
        None
    } else {
        Some(ids.join(";"))
    };

    let reference = record.reference_bases().to_string();

    // ALT '.' yields no alleles
    let alternates = record
        .alternate_bases()
        .iter()
        .map(|alt| alt.map(str::to_string))
        .collect::<io::Result<Vec<_>>>()?;

    let quality = record.quality_score().transpose()?;

    // PASS is stored as an empty filter list
    let filters = record
        .filters()
        .iter(header)
        .map(|f| f.map(str::to_string))
        .collect::<io::Result<Vec<_>>>()?
        .into_iter()
        .filter(|f| f != PASS)
        .collect();

    // INFO and FORMAT values go through the Record trait
    let variant: &dyn Record = record;
    let info = info_values(variant, header)?;
    let samples = sample_values(variant, header)?;

    Ok(VariantRecord {
        chrom,
        pos,
        id,
        reference,
        alternates,
        quality,
        filters,
        info,
        samples,
    })
}

fn info_values(record: &dyn Record, header: &vcf::Header) -> io::Result<HashMap<String, RawValue>> {
    let mut values = HashMap::new();
    for result in record.info().iter(header) {
        let (key, value) = result?;
        let raw = match value {
            Some(Value::Integer(n)) => RawValue::Scalar(Scalar::Integer(i64::from(n))),
            Some(Value::Float(x)) => RawValue::Scalar(Scalar::Float(x)),
            Some(Value::Flag) => RawValue::Scalar(Scalar::Flag(true)),
            Some(Value::Character(c)) => RawValue::Scalar(Scalar::Character(c)),
            Some(Value::String(s)) => RawValue::Scalar(Scalar::String(s.to_string())),
            Some(Value::Array(ValueArray::Integer(items))) => RawValue::Sequence(
                items
                    .iter()
                    .map(|v| v.map(|n| n.map(|n| Scalar::Integer(i64::from(n)))))
                    .collect::<io::Result<_>>()?,
            ),
            Some(Value::Array(ValueArray::Float(items))) => RawValue::Sequence(
                items
                    .iter()
                    .map(|v| v.map(|x| x.map(Scalar::Float)))
                    .collect::<io::Result<_>>()?,
            ),
            Some(Value::Array(ValueArray::Character(items))) => RawValue::Sequence(
                items
                    .iter()
                    .map(|v| v.map(|c| c.map(Scalar::Character)))
                    .collect::<io::Result<_>>()?,
            ),
            Some(Value::Array(ValueArray::String(items))) => RawValue::Sequence(
                items
                    .iter()
                    .map(|v| v.map(|s| s.map(|s| Scalar::String(s.to_string()))))
                    .collect::<io::Result<_>>()?,
            ),
            None => continue,
        };
        values.insert(key.to_string(), raw);
    }
    Ok(values)
}

fn sample_values(record: &dyn Record, header: &vcf::Header) -> io::Result<Vec<Sample>> {
    let samples = record.samples()?;
    let mut out = Vec::with_capacity(header.sample_names().len());

    for sample in samples.iter() {
        let mut parsed = Sample::default();
        for result in sample.iter(header) {
            let (key, value) = result?;
            let raw = match value {
                Some(SV::Genotype(gt)) => {
                    let mut alleles = Vec::new();
                    let mut phased = false;
                    for allele in gt.iter() {
                        let (position, phasing) = allele?;
                        alleles.push(position);
                        phased |= matches!(phasing, Phasing::Phased);
                    }
                    let genotype = Genotype::new(alleles, phased);
                    let text = genotype.to_string();
                    parsed.genotype = Some(genotype);
                    RawValue::Scalar(Scalar::String(text))
                }
                Some(SV::Integer(n)) => RawValue::Scalar(Scalar::Integer(i64::from(n))),
                Some(SV::Float(x)) => RawValue::Scalar(Scalar::Float(x)),
                Some(SV::Character(c)) => RawValue::Scalar(Scalar::Character(c)),
                Some(SV::String(s)) => RawValue::Scalar(Scalar::String(s.to_string())),
                Some(SV::Array(SamplesArray::Integer(items))) => RawValue::Sequence(
                    items
                        .iter()
                        .map(|v| v.map(|n| n.map(|n| Scalar::Integer(i64::from(n)))))
                        .collect::<io::Result<_>>()?,
                ),
                Some(SV::Array(SamplesArray::Float(items))) => RawValue::Sequence(
                    items
                        .iter()
                        .map(|v| v.map(|x| x.map(Scalar::Float)))
                        .collect::<io::Result<_>>()?,
                ),
                Some(SV::Array(SamplesArray::Character(items))) => RawValue::Sequence(
                    items
                        .iter()
                        .map(|v| v.map(|c| c.map(Scalar::Character)))
                        .collect::<io::Result<_>>()?,
                ),
                Some(SV::Array(SamplesArray::String(items))) => RawValue::Sequence(
                    items
                        .iter()
                        .map(|v| v.map(|s| s.map(|s| Scalar::String(s.to_string()))))
                        .collect::<io::Result<_>>()?,
                ),
                None => continue,
            };
            parsed.fields.insert(key.to_string(), raw);
        }
        out.push(parsed);
    }

    Ok(out)
}
