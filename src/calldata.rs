// ==============================================================================
// calldata.rs - Per-Sample Call Data Extraction
// ==============================================================================
// Description: Builds one typed array per sample from FORMAT values and the
//              genotype-derived call attributes
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 0.1.0
// ==============================================================================
// Alignment:
//   Every record contributes exactly one row to every sample's array, so row i
//   of each per-sample array refers to the i-th input variant. A record whose
//   sample count differs from the header is rejected.
// ==============================================================================

use std::sync::Arc;

use crate::builder::{ArrayBuilder, TypedArray};
use crate::error::{ConversionError, Result};
use crate::genotype::GT_UNKNOWN;
use crate::grid::Grid2D;
use crate::models::{RawValue, Row, Sample, Scalar, Value, VariantRecord};
use crate::schema::{CallAttribute, FieldSource, FieldSpec, Schema, ShortSequencePolicy};
use crate::variants::annotation_value;

/// Builds per-sample rows from records under a resolved call data schema
pub struct CallDataExtractor<'a> {
    schema: &'a Schema,
    policy: ShortSequencePolicy,
}

impl<'a> CallDataExtractor<'a> {
    pub fn new(schema: &'a Schema, policy: ShortSequencePolicy) -> Self {
        Self { schema, policy }
    }

    /// One row per sample, in record sample order
    pub fn extract(&self, record: &VariantRecord) -> Vec<Row> {
        record
            .samples
            .iter()
            .map(|sample| self.extract_sample(sample))
            .collect()
    }

    pub fn extract_sample(&self, sample: &Sample) -> Row {
        self.schema
            .fields()
            .iter()
            .map(|spec| self.extract_field(sample, spec))
            .collect()
    }

    fn extract_field(&self, sample: &Sample, spec: &FieldSpec) -> Value {
        match spec.source {
            FieldSource::Format => annotation_value(sample.get(&spec.name), spec, self.policy),
            FieldSource::Call(attr) => {
                let raw = call_attribute(sample, attr);
                match &spec.converter {
                    Some(convert) => Value::from(convert(&RawValue::Scalar(raw))),
                    None => Value::Scalar(raw),
                }
            }
            FieldSource::Variant(_) | FieldSource::Info => {
                unreachable!("resolve_calldata never yields variant-level field '{}'", spec.name)
            }
        }
    }
}

fn call_attribute(sample: &Sample, attr: CallAttribute) -> Scalar {
    let gt = sample.genotype.as_ref();
    match attr {
        CallAttribute::Called => Scalar::Flag(sample.is_called()),
        CallAttribute::GtType => {
            Scalar::Integer(gt.map(|g| g.gt_type()).unwrap_or(GT_UNKNOWN) as i64)
        }
        CallAttribute::IsHet => Scalar::Flag(gt.map(|g| g.is_het()).unwrap_or(false)),
        CallAttribute::IsVariant => Scalar::Flag(gt.map(|g| g.is_variant()).unwrap_or(false)),
    }
}

/// Per-sample call data arrays keyed by sample name
///
/// Samples keep the order in which they were first inserted. Every array
/// shares one schema and one row count.
#[derive(Debug, Clone, Default)]
pub struct CallDataArray {
    samples: Vec<String>,
    arrays: Vec<TypedArray>,
}

impl CallDataArray {
    /// Assemble from parallel sample names and arrays
    ///
    /// # Errors
    /// * `Alignment` - the lists differ in length, a sample name repeats,
    ///   or the arrays disagree in layout or row count
    pub fn from_parts(samples: Vec<String>, arrays: Vec<TypedArray>) -> Result<Self> {
        if samples.len() != arrays.len() {
            return Err(ConversionError::Alignment(format!(
                "{} sample names for {} arrays",
                samples.len(),
                arrays.len()
            )));
        }
        let mut data = Self::default();
        for (sample, array) in samples.into_iter().zip(arrays) {
            data.insert(sample, array)?;
        }
        Ok(data)
    }

    /// Add one sample's array
    pub fn insert(&mut self, sample: impl Into<String>, array: TypedArray) -> Result<()> {
        let sample = sample.into();
        if self.samples.contains(&sample) {
            return Err(ConversionError::Alignment(format!(
                "sample '{}' appears more than once",
                sample
            )));
        }
        if let Some(first) = self.arrays.first() {
            check_aligned(&self.samples[0], first, &sample, &array)?;
        }
        self.samples.push(sample);
        self.arrays.push(array);
        Ok(())
    }

    pub fn sample_names(&self) -> &[String] {
        &self.samples
    }

    pub fn get(&self, sample: &str) -> Option<&TypedArray> {
        self.samples
            .iter()
            .position(|s| s == sample)
            .map(|i| &self.arrays[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedArray)> {
        self.samples
            .iter()
            .map(String::as_str)
            .zip(self.arrays.iter())
    }

    pub fn arrays(&self) -> &[TypedArray] {
        &self.arrays
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Variants per sample (0 when there are no samples)
    pub fn num_variants(&self) -> usize {
        self.arrays.first().map(|a| a.num_rows()).unwrap_or(0)
    }

    /// Dense [sample][variant] view over this data
    pub fn grid(&self) -> Result<Grid2D<'_>> {
        Grid2D::new(self)
    }
}

pub(crate) fn check_aligned(
    first_name: &str,
    first: &TypedArray,
    name: &str,
    array: &TypedArray,
) -> Result<()> {
    if !first.same_layout(array) {
        return Err(ConversionError::Alignment(format!(
            "sample '{}' has a different schema than sample '{}'",
            name, first_name
        )));
    }
    if first.num_rows() != array.num_rows() {
        return Err(ConversionError::Alignment(format!(
            "sample '{}' has {} rows, sample '{}' has {}",
            name,
            array.num_rows(),
            first_name,
            first.num_rows()
        )));
    }
    Ok(())
}

/// Streams records into one [`ArrayBuilder`] per sample
pub struct CallDataBuilder {
    samples: Vec<String>,
    builders: Vec<ArrayBuilder>,
    records: usize,
}

impl CallDataBuilder {
    pub fn new(schema: Arc<Schema>, samples: Vec<String>) -> Self {
        let builders = samples
            .iter()
            .map(|_| ArrayBuilder::new(Arc::clone(&schema)))
            .collect();
        Self {
            samples,
            builders,
            records: 0,
        }
    }

    /// Append the per-sample rows of one record
    ///
    /// # Errors
    /// * `Alignment` - the row count differs from the number of samples
    /// * `SchemaViolation` - a row does not fit the schema
    pub fn append(&mut self, rows: Vec<Row>) -> Result<()> {
        if rows.len() != self.samples.len() {
            return Err(ConversionError::Alignment(format!(
                "record {} has {} samples, header declares {}",
                self.records + 1,
                rows.len(),
                self.samples.len()
            )));
        }
        for (builder, row) in self.builders.iter_mut().zip(rows) {
            builder.append(row)?;
        }
        self.records += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    pub fn finish(self) -> Result<CallDataArray> {
        let arrays = self
            .builders
            .into_iter()
            .map(ArrayBuilder::finish)
            .collect::<Result<Vec<_>>>()?;
        CallDataArray::from_parts(self.samples, arrays)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::Genotype;
    use crate::models::{FieldDeclaration, HeaderMeta, Number, VcfType};
    use crate::schema::{FieldOverride, FieldOverrides, SchemaResolver, STANDARD_DEFAULTS};

    fn header() -> HeaderMeta {
        HeaderMeta {
            formats: vec![
                FieldDeclaration::new("GT", VcfType::String, Number::Count(1)),
                FieldDeclaration::new("GQ", VcfType::Integer, Number::Count(1)),
                FieldDeclaration::new("HQ", VcfType::Integer, Number::Count(2)),
            ],
            samples: vec!["NA00001".to_string(), "NA00002".to_string()],
            ..Default::default()
        }
    }

    fn resolve(fields: Option<&[&str]>, overrides: &FieldOverrides) -> Arc<Schema> {
        let header = header();
        let names: Option<Vec<String>> =
            fields.map(|f| f.iter().map(|s| s.to_string()).collect());
        Arc::new(
            SchemaResolver::new(&header, &STANDARD_DEFAULTS)
                .resolve_calldata(names.as_deref(), overrides)
                .unwrap(),
        )
    }

    fn sample(gt: &str) -> Sample {
        Sample::from_genotype(Genotype::parse(gt).unwrap())
    }

    fn record(samples: Vec<Sample>) -> VariantRecord {
        VariantRecord {
            chrom: "20".to_string(),
            pos: 14370,
            reference: "G".to_string(),
            alternates: vec!["A".to_string()],
            samples,
            ..Default::default()
        }
    }

    fn scalar(value: impl Into<Scalar>) -> Value {
        Value::Scalar(value.into())
    }

    #[test]
    fn test_call_attributes() {
        let schema = resolve(None, &FieldOverrides::new());
        let extractor = CallDataExtractor::new(&schema, ShortSequencePolicy::Pad);

        let rows = extractor.extract(&record(vec![
            sample("0|0").with_field("GQ", RawValue::Scalar(Scalar::Integer(48))),
            sample("1/1"),
        ]));
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec![
                scalar("0|0"),
                scalar(48i64),
                Value::Tuple(vec![Some(Scalar::Integer(0)); 2]),
                scalar(true),
                scalar(0i64),
                scalar(false),
                scalar(false),
            ]
        );
        assert_eq!(rows[1][4], scalar(2i64));
        assert_eq!(rows[1][6], scalar(true));
    }

    #[test]
    fn test_missing_genotype() {
        let schema = resolve(Some(&["GT", "called", "gt_type", "is_het", "is_variant"]), &FieldOverrides::new());
        let extractor = CallDataExtractor::new(&schema, ShortSequencePolicy::Pad);

        let row = extractor.extract_sample(&Sample::default());
        assert_eq!(
            row,
            vec![scalar(""), scalar(false), scalar(-1i64), scalar(false), scalar(false)]
        );

        let row = extractor.extract_sample(&sample("./."));
        assert_eq!(row[0], scalar("./."));
        assert_eq!(row[2], scalar(-1i64));
    }

    #[test]
    fn test_format_arity() {
        let schema = resolve(Some(&["HQ"]), &FieldOverrides::new());
        let s = sample("0|1").with_field("HQ", RawValue::sequence([51i64]));

        let row = CallDataExtractor::new(&schema, ShortSequencePolicy::Pad).extract_sample(&s);
        assert_eq!(
            row[0],
            Value::Tuple(vec![Some(Scalar::Integer(51)), Some(Scalar::Integer(0))])
        );
        let row = CallDataExtractor::new(&schema, ShortSequencePolicy::KeepShort).extract_sample(&s);
        assert_eq!(row[0], Value::Tuple(vec![Some(Scalar::Integer(51)), None]));
    }

    #[test]
    fn test_format_converter() {
        let mut overrides = FieldOverrides::new();
        overrides.insert(
            "GQ".to_string(),
            FieldOverride::converter(|raw| match raw {
                RawValue::Scalar(Scalar::Integer(n)) => RawValue::Scalar(Scalar::Integer(n / 10)),
                other => other.clone(),
            }),
        );
        let schema = resolve(Some(&["GQ"]), &overrides);
        let extractor = CallDataExtractor::new(&schema, ShortSequencePolicy::Pad);
        let s = sample("0|0").with_field("GQ", RawValue::Scalar(Scalar::Integer(48)));
        assert_eq!(extractor.extract_sample(&s), vec![scalar(4i64)]);
        assert_eq!(extractor.extract_sample(&sample("0|0")), vec![scalar(0i64)]);
    }

    #[test]
    fn test_builder_alignment() {
        let schema = resolve(Some(&["GT", "called"]), &FieldOverrides::new());
        let extractor = CallDataExtractor::new(&schema, ShortSequencePolicy::Pad);
        let mut builder = CallDataBuilder::new(
            Arc::clone(&schema),
            vec!["NA00001".to_string(), "NA00002".to_string()],
        );

        builder
            .append(extractor.extract(&record(vec![sample("0|0"), sample("1|0")])))
            .unwrap();
        builder
            .append(extractor.extract(&record(vec![sample("1/1"), Sample::default()])))
            .unwrap();
        let err = builder
            .append(extractor.extract(&record(vec![sample("0|0")])))
            .unwrap_err();
        assert!(matches!(err, ConversionError::Alignment(_)));
        assert_eq!(builder.len(), 2);

        let data = builder.finish().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.num_variants(), 2);
        assert_eq!(data.sample_names(), &["NA00001", "NA00002"]);
        let second = data.get("NA00002").unwrap();
        assert_eq!(second.value("GT", 0).unwrap(), scalar("1|0"));
        assert_eq!(second.value("called", 1).unwrap(), scalar(false));
        assert!(data.get("NA00003").is_none());

        let names: Vec<&str> = data.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["NA00001", "NA00002"]);
    }

    #[test]
    fn test_from_parts_checks() {
        let schema = resolve(Some(&["called"]), &FieldOverrides::new());
        let extractor = CallDataExtractor::new(&schema, ShortSequencePolicy::Pad);
        let build = |n: usize| {
            let rows: Vec<Result<Row>> = (0..n)
                .map(|_| Ok(extractor.extract_sample(&sample("0|1"))))
                .collect();
            ArrayBuilder::from_rows(Arc::clone(&schema), rows).unwrap()
        };

        let err = CallDataArray::from_parts(vec!["A".to_string(), "B".to_string()], vec![build(2), build(3)])
            .unwrap_err();
        assert!(matches!(err, ConversionError::Alignment(_)));

        let err = CallDataArray::from_parts(vec!["A".to_string(), "A".to_string()], vec![build(2), build(2)])
            .unwrap_err();
        assert!(matches!(err, ConversionError::Alignment(_)));

        let err = CallDataArray::from_parts(vec!["A".to_string()], vec![build(2), build(2)]).unwrap_err();
        assert!(matches!(err, ConversionError::Alignment(_)));

        let other = resolve(Some(&["gt_type"]), &FieldOverrides::new());
        let rows: Vec<Result<Row>> = vec![Ok(vec![scalar(0i64)]), Ok(vec![scalar(1i64)])];
        let mismatched = ArrayBuilder::from_rows(other, rows).unwrap();
        let err = CallDataArray::from_parts(vec!["A".to_string(), "B".to_string()], vec![build(2), mismatched])
            .unwrap_err();
        assert!(matches!(err, ConversionError::Alignment(_)));
    }

    #[test]
    fn test_empty_call_data() {
        let schema = resolve(None, &FieldOverrides::new());
        let data = CallDataBuilder::new(schema, Vec::new()).finish().unwrap();
        assert!(data.is_empty());
        assert_eq!(data.num_variants(), 0);
    }
}
