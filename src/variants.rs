// ==============================================================================
// variants.rs - Per-Variant Row Extraction
// ==============================================================================
// Description: Turns one VCF record into one row: fixed columns, FILTER flags,
//              variant classification, genotype aggregates and INFO values
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 0.1.0
// ==============================================================================
// Variant classification (REF/ALT):
//   is_snp        REF and every ALT are single bases and differ
//   is_indel      some ALT differs in length from REF
//   is_deletion   is_indel and every ALT is shorter than REF
//   is_transition is_snp with one ALT and the pair is A<->G or C<->T
// ==============================================================================

use std::collections::HashSet;

use crate::models::{FilterFlags, RawValue, Row, Scalar, Value, VariantRecord};
use crate::schema::{FieldSource, FieldSpec, Schema, ShortSequencePolicy, StorageType, VariantAttribute};

impl VariantRecord {
    pub fn is_snp(&self) -> bool {
        !self.alternates.is_empty()
            && self.reference.len() == 1
            && self
                .alternates
                .iter()
                .all(|alt| alt.len() == 1 && !alt.eq_ignore_ascii_case(&self.reference))
    }

    pub fn is_indel(&self) -> bool {
        self.alternates
            .iter()
            .any(|alt| alt.len() != self.reference.len())
    }

    pub fn is_deletion(&self) -> bool {
        self.is_indel()
            && self
                .alternates
                .iter()
                .all(|alt| alt.len() < self.reference.len())
    }

    pub fn is_transition(&self) -> bool {
        if !self.is_snp() || self.alternates.len() != 1 {
            return false;
        }
        let pair = (
            self.reference.to_ascii_uppercase(),
            self.alternates[0].to_ascii_uppercase(),
        );
        matches!(
            (pair.0.as_str(), pair.1.as_str()),
            ("A", "G") | ("G", "A") | ("C", "T") | ("T", "C")
        )
    }

    /// Samples whose genotype is fully specified
    pub fn num_called(&self) -> usize {
        self.samples.iter().filter(|s| s.is_called()).count()
    }

    pub fn num_unknown(&self) -> usize {
        self.samples.len() - self.num_called()
    }

    /// Fraction of samples called; 0 when the record has no samples
    pub fn call_rate(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.num_called() as f32 / self.samples.len() as f32
    }

    /// REF plus the distinct ALT alleles used by any sample's genotype
    pub fn num_alleles(&self) -> usize {
        let used: HashSet<usize> = self
            .samples
            .iter()
            .filter_map(|s| s.genotype.as_ref())
            .flat_map(|gt| gt.alt_indices())
            .collect();
        1 + used.len()
    }
}

/// Resolve an INFO or FORMAT value against its column layout
///
/// Absent values resolve to the fill value; a converter, when set, sees the
/// present raw value and its result is used verbatim.
pub(crate) fn annotation_value(
    raw: Option<&RawValue>,
    spec: &FieldSpec,
    policy: ShortSequencePolicy,
) -> Value {
    let raw = match raw {
        Some(raw) => raw,
        None => return spec.fill_value(),
    };

    if let Some(convert) = &spec.converter {
        return Value::from(convert(raw));
    }

    if spec.arity == 1 {
        return match raw {
            RawValue::Scalar(s) => Value::Scalar(s.clone()),
            RawValue::Sequence(items) => Value::Scalar(
                items
                    .first()
                    .cloned()
                    .flatten()
                    .unwrap_or_else(|| spec.fill.clone()),
            ),
        };
    }

    let items: Vec<Option<Scalar>> = match raw {
        RawValue::Scalar(Scalar::String(text)) => text
            .split(',')
            .map(|part| Some(Scalar::String(part.to_string())))
            .collect(),
        RawValue::Scalar(s) => vec![Some(s.clone())],
        RawValue::Sequence(items) => items.clone(),
    };

    let mut tuple: Vec<Option<Scalar>> = items
        .into_iter()
        .take(spec.arity)
        .map(|item| Some(item.unwrap_or_else(|| spec.fill.clone())))
        .collect();
    let pad = match policy {
        ShortSequencePolicy::Pad => Some(spec.fill.clone()),
        ShortSequencePolicy::KeepShort => None,
    };
    tuple.resize(spec.arity, pad);
    Value::Tuple(tuple)
}

/// Builds per-variant rows from records under a resolved schema
pub struct ValueExtractor<'a> {
    schema: &'a Schema,
    policy: ShortSequencePolicy,
}

impl<'a> ValueExtractor<'a> {
    pub fn new(schema: &'a Schema, policy: ShortSequencePolicy) -> Self {
        Self { schema, policy }
    }

    /// One row per record, cells in schema order
    pub fn extract(&self, record: &VariantRecord) -> Row {
        self.schema
            .fields()
            .iter()
            .map(|spec| self.extract_field(record, spec))
            .collect()
    }

    /// Lazily map a record stream to a row stream
    pub fn rows<I, E>(&'a self, records: I) -> impl Iterator<Item = Result<Row, E>> + 'a
    where
        I: IntoIterator<Item = Result<VariantRecord, E>>,
        I::IntoIter: 'a,
        E: 'a,
    {
        records
            .into_iter()
            .map(move |record| record.map(|r| self.extract(&r)))
    }

    fn extract_field(&self, record: &VariantRecord, spec: &FieldSpec) -> Value {
        match spec.source {
            FieldSource::Variant(attr) => self.attribute(record, spec, attr),
            FieldSource::Info => annotation_value(record.info.get(&spec.name), spec, self.policy),
            FieldSource::Call(_) | FieldSource::Format => {
                unreachable!("resolve_variants never yields call-level field '{}'", spec.name)
            }
        }
    }

    fn attribute(&self, record: &VariantRecord, spec: &FieldSpec, attr: VariantAttribute) -> Value {
        let raw = match raw_attribute(record, attr) {
            Some(raw) => raw,
            None => return spec.fill_value(),
        };

        if let Some(convert) = &spec.converter {
            return match (convert(&raw), &spec.storage) {
                // Sequences returned for ALT or FILTER are stored as comma-joined text
                (RawValue::Sequence(items), StorageType::Str(_)) => {
                    Value::Scalar(Scalar::String(join_items(&items)))
                }
                (converted, _) => Value::from(converted),
            };
        }

        match (attr, raw) {
            (VariantAttribute::Filter, RawValue::Sequence(_)) => {
                let joined = record.filters.join(",");
                if spec.storage == StorageType::Filter {
                    Value::Filter(self.filter_flags(record, joined))
                } else {
                    Value::Scalar(Scalar::String(joined))
                }
            }
            (_, RawValue::Sequence(items)) => Value::Scalar(Scalar::String(join_items(&items))),
            (_, RawValue::Scalar(s)) => Value::Scalar(s),
        }
    }

    fn filter_flags(&self, record: &VariantRecord, joined: String) -> FilterFlags {
        let flags = self
            .schema
            .filter_columns()
            .iter()
            .enumerate()
            .map(|(i, id)| {
                if i == 0 {
                    record.filters.is_empty()
                } else {
                    record.filters.iter().any(|f| f == id)
                }
            })
            .collect();
        FilterFlags { joined, flags }
    }
}

fn join_items(items: &[Option<Scalar>]) -> String {
    items
        .iter()
        .flatten()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Raw value of a fixed or derived attribute; `None` when the column is missing
fn raw_attribute(record: &VariantRecord, attr: VariantAttribute) -> Option<RawValue> {
    let scalar = match attr {
        VariantAttribute::Chrom => Scalar::String(record.chrom.clone()),
        VariantAttribute::Pos => Scalar::Integer(record.pos),
        VariantAttribute::Id => Scalar::String(record.id.clone()?),
        VariantAttribute::Ref => Scalar::String(record.reference.clone()),
        VariantAttribute::Alt => return Some(RawValue::sequence(record.alternates.iter().map(String::as_str))),
        VariantAttribute::Qual => Scalar::Float(record.quality?),
        VariantAttribute::Filter => return Some(RawValue::sequence(record.filters.iter().map(String::as_str))),
        VariantAttribute::IsSnp => Scalar::Flag(record.is_snp()),
        VariantAttribute::IsIndel => Scalar::Flag(record.is_indel()),
        VariantAttribute::IsDeletion => Scalar::Flag(record.is_deletion()),
        VariantAttribute::IsTransition => Scalar::Flag(record.is_transition()),
        VariantAttribute::NumCalled => Scalar::Integer(record.num_called() as i64),
        VariantAttribute::NumUnknown => Scalar::Integer(record.num_unknown() as i64),
        VariantAttribute::CallRate => Scalar::Float(record.call_rate()),
        VariantAttribute::NumAlleles => Scalar::Integer(record.num_alleles() as i64),
    };
    Some(RawValue::Scalar(scalar))
}
