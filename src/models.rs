// ==============================================================================
// models.rs - Variant Record and Header Data Models
// ==============================================================================
// Description: In-memory representation of VCF records, header declarations
//              and row values flowing between extraction and array building
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 0.1.0
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::genotype::Genotype;

/// Value type declared for an INFO or FORMAT field in the VCF header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VcfType {
    Integer,
    Float,
    Character,
    String,
    Flag,
}

impl VcfType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VcfType::Integer => "Integer",
            VcfType::Float => "Float",
            VcfType::Character => "Character",
            VcfType::String => "String",
            VcfType::Flag => "Flag",
        }
    }
}

/// Declared number of values for a header field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Number {
    /// Fixed count (`Number=0`, `Number=1`, `Number=2`, ...)
    Count(usize),
    /// Variable or allele/genotype dependent (`A`, `R`, `G`, `.`)
    Unknown,
}

impl Number {
    /// Arity used when the caller does not request one.
    ///
    /// Counts above one are honoured; everything else falls back to a single value.
    pub fn default_arity(&self) -> usize {
        match self {
            Number::Count(n) if *n > 1 => *n,
            _ => 1,
        }
    }
}

/// One `##INFO` or `##FORMAT` header declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    pub id: String,
    pub ty: VcfType,
    pub number: Number,
}

impl FieldDeclaration {
    pub fn new(id: impl Into<String>, ty: VcfType, number: Number) -> Self {
        Self {
            id: id.into(),
            ty,
            number,
        }
    }
}

/// Header metadata needed to resolve a schema
///
/// All collections keep header declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMeta {
    pub infos: Vec<FieldDeclaration>,
    pub formats: Vec<FieldDeclaration>,
    pub filters: Vec<String>,
    pub samples: Vec<String>,
}

impl HeaderMeta {
    pub fn info(&self, id: &str) -> Option<&FieldDeclaration> {
        self.infos.iter().find(|d| d.id == id)
    }

    pub fn format(&self, id: &str) -> Option<&FieldDeclaration> {
        self.formats.iter().find(|d| d.id == id)
    }
}

/// A single typed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Float(f32),
    Flag(bool),
    Character(char),
    String(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Integer(n) => write!(f, "{}", n),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Flag(b) => write!(f, "{}", b),
            Scalar::Character(c) => write!(f, "{}", c),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

/// Raw INFO/FORMAT value as delivered by the parser
///
/// `None` elements inside a sequence are in-sequence missing markers (`.`).
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Scalar(Scalar),
    Sequence(Vec<Option<Scalar>>),
}

impl RawValue {
    pub fn sequence<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        RawValue::Sequence(items.into_iter().map(|v| Some(v.into())).collect())
    }
}

impl From<Scalar> for RawValue {
    fn from(value: Scalar) -> Self {
        RawValue::Scalar(value)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Integer(n)
    }
}

impl From<f32> for Scalar {
    fn from(x: f32) -> Self {
        Scalar::Float(x)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Flag(b)
    }
}

/// Per-sample FORMAT data for one record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    /// Parsed GT call, if the sample has one
    pub genotype: Option<Genotype>,

    /// FORMAT field id -> value (`GT` holds the rendered call text)
    pub fields: HashMap<String, RawValue>,
}

impl Sample {
    /// Build a sample from a genotype call alone
    pub fn from_genotype(genotype: Genotype) -> Self {
        let mut fields = HashMap::new();
        fields.insert(
            "GT".to_string(),
            RawValue::Scalar(Scalar::String(genotype.to_string())),
        );
        Self {
            genotype: Some(genotype),
            fields,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: RawValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key)
    }

    /// True when the sample carries a genotype with every allele specified
    pub fn is_called(&self) -> bool {
        self.genotype.as_ref().map(|gt| gt.is_called()).unwrap_or(false)
    }
}

/// One VCF data line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantRecord {
    pub chrom: String,

    /// 1-based position
    pub pos: i64,

    /// `None` when the ID column is `.`
    pub id: Option<String>,

    pub reference: String,

    /// Alternate alleles; empty when the ALT column is `.`
    pub alternates: Vec<String>,

    pub quality: Option<f32>,

    /// Failed filter ids; empty means PASS
    pub filters: Vec<String>,

    /// INFO keys present on this record only
    pub info: HashMap<String, RawValue>,

    /// Per-sample data in header sample order
    pub samples: Vec<Sample>,
}

/// Nested FILTER cell: joined text plus one indicator per filter column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterFlags {
    pub joined: String,
    pub flags: Vec<bool>,
}

/// One cell of an output row
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    /// Fixed-arity tuple; `None` slots are stored as nulls
    Tuple(Vec<Option<Scalar>>),
    Filter(FilterFlags),
}

impl From<RawValue> for Value {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::Scalar(s) => Value::Scalar(s),
            RawValue::Sequence(items) => Value::Tuple(items),
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

/// Row of cells positionally aligned with a schema
pub type Row = Vec<Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_arity() {
        assert_eq!(Number::Count(0).default_arity(), 1);
        assert_eq!(Number::Count(1).default_arity(), 1);
        assert_eq!(Number::Count(2).default_arity(), 2);
        assert_eq!(Number::Unknown.default_arity(), 1);
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Integer(14370).to_string(), "14370");
        assert_eq!(Scalar::Float(0.5).to_string(), "0.5");
        assert_eq!(Scalar::Float(29.0).to_string(), "29");
        assert_eq!(Scalar::Character('A').to_string(), "A");
        assert_eq!(Scalar::Flag(true).to_string(), "true");
    }

    #[test]
    fn test_scalar_from_json() {
        let values: Vec<Scalar> = serde_json::from_str(r#"[0, 0.5, false, "", "x"]"#).unwrap();
        assert_eq!(values[0], Scalar::Integer(0));
        assert_eq!(values[1], Scalar::Float(0.5));
        assert_eq!(values[2], Scalar::Flag(false));
        assert_eq!(values[3], Scalar::String(String::new()));
        assert_eq!(values[4], Scalar::Character('x'));
    }

    #[test]
    fn test_sample_from_genotype() {
        let sample = Sample::from_genotype(Genotype::new(vec![Some(0), Some(1)], true));
        assert!(sample.is_called());
        assert_eq!(
            sample.get("GT"),
            Some(&RawValue::Scalar(Scalar::String("0|1".to_string())))
        );
    }

    #[test]
    fn test_header_lookup() {
        let header = HeaderMeta {
            infos: vec![FieldDeclaration::new("DP", VcfType::Integer, Number::Count(1))],
            ..Default::default()
        };
        assert_eq!(header.info("DP").map(|d| d.ty), Some(VcfType::Integer));
        assert!(header.info("AF").is_none());
        assert!(header.format("DP").is_none());
    }
}
