// ==============================================================================
// schema.rs - Schema Resolution
// ==============================================================================
// Description: Resolves requested field names against fixed attributes and
//              header declarations into an ordered column schema
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 0.1.0
// ==============================================================================
// Resolution order for every field (explicit overrides always win):
//   storage type: built-in attribute type, else VCF type table
//   arity:        1 for attributes, else declared Number (> 1) or 1
//   fill value:   storage default for attributes, else VCF type table
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::builder::check_scalar;
use crate::error::{ConversionError, Result};
use crate::models::{FieldDeclaration, HeaderMeta, RawValue, Scalar, Value, VcfType};

/// Name of the always-present FILTER indicator column
pub const PASS: &str = "PASS";

/// Column storage layout for one scalar element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    Int32,
    Float32,
    Boolean,
    /// Bounded text, at most this many bytes
    Str(usize),
    /// Nested FILTER structure (joined text plus one boolean per filter id)
    Filter,
}

impl StorageType {
    /// Type-appropriate fill value for this storage
    pub fn default_fill(&self) -> Scalar {
        match self {
            StorageType::Int32 => Scalar::Integer(0),
            StorageType::Float32 => Scalar::Float(0.0),
            StorageType::Boolean => Scalar::Flag(false),
            StorageType::Str(_) | StorageType::Filter => Scalar::String(String::new()),
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageType::Int32 => f.write_str("i4"),
            StorageType::Float32 => f.write_str("f4"),
            StorageType::Boolean => f.write_str("b1"),
            StorageType::Str(width) => write!(f, "a{}", width),
            StorageType::Filter => f.write_str("filter"),
        }
    }
}

/// VCF type → storage type and fill value tables
///
/// The standard table is [`STANDARD_DEFAULTS`]; callers pass a table to the
/// resolver explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefaults {
    /// Width of `String` INFO/FORMAT values and text attributes
    pub string_width: usize,
    /// Width of `Character` INFO/FORMAT values
    pub character_width: usize,
}

pub static STANDARD_DEFAULTS: TypeDefaults = TypeDefaults {
    string_width: 20,
    character_width: 1,
};

impl TypeDefaults {
    pub fn storage(&self, ty: VcfType) -> StorageType {
        match ty {
            VcfType::Integer => StorageType::Int32,
            VcfType::Float => StorageType::Float32,
            VcfType::Character => StorageType::Str(self.character_width),
            VcfType::String => StorageType::Str(self.string_width),
            VcfType::Flag => StorageType::Boolean,
        }
    }

    pub fn fill(&self, ty: VcfType) -> Scalar {
        match ty {
            VcfType::Integer => Scalar::Integer(0),
            VcfType::Float => Scalar::Float(0.0),
            VcfType::Character | VcfType::String => Scalar::String(String::new()),
            VcfType::Flag => Scalar::Flag(false),
        }
    }
}

/// Fixed VCF columns and attributes derived from them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantAttribute {
    Chrom,
    Pos,
    Id,
    Ref,
    Alt,
    Qual,
    Filter,
    IsSnp,
    IsIndel,
    IsDeletion,
    IsTransition,
    NumCalled,
    NumUnknown,
    CallRate,
    NumAlleles,
}

impl VariantAttribute {
    pub const ALL: [VariantAttribute; 15] = [
        VariantAttribute::Chrom,
        VariantAttribute::Pos,
        VariantAttribute::Id,
        VariantAttribute::Ref,
        VariantAttribute::Alt,
        VariantAttribute::Qual,
        VariantAttribute::Filter,
        VariantAttribute::IsSnp,
        VariantAttribute::IsIndel,
        VariantAttribute::IsDeletion,
        VariantAttribute::IsTransition,
        VariantAttribute::NumCalled,
        VariantAttribute::NumUnknown,
        VariantAttribute::CallRate,
        VariantAttribute::NumAlleles,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            VariantAttribute::Chrom => "CHROM",
            VariantAttribute::Pos => "POS",
            VariantAttribute::Id => "ID",
            VariantAttribute::Ref => "REF",
            VariantAttribute::Alt => "ALT",
            VariantAttribute::Qual => "QUAL",
            VariantAttribute::Filter => "FILTER",
            VariantAttribute::IsSnp => "is_snp",
            VariantAttribute::IsIndel => "is_indel",
            VariantAttribute::IsDeletion => "is_deletion",
            VariantAttribute::IsTransition => "is_transition",
            VariantAttribute::NumCalled => "num_called",
            VariantAttribute::NumUnknown => "num_unknown",
            VariantAttribute::CallRate => "call_rate",
            VariantAttribute::NumAlleles => "num_alleles",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    fn storage(&self, defaults: &TypeDefaults) -> StorageType {
        match self {
            VariantAttribute::Chrom
            | VariantAttribute::Id
            | VariantAttribute::Ref
            | VariantAttribute::Alt => StorageType::Str(defaults.string_width),
            VariantAttribute::Pos => StorageType::Int32,
            VariantAttribute::Qual => StorageType::Float32,
            VariantAttribute::Filter => StorageType::Filter,
            VariantAttribute::IsSnp
            | VariantAttribute::IsIndel
            | VariantAttribute::IsDeletion
            | VariantAttribute::IsTransition => StorageType::Boolean,
            VariantAttribute::NumCalled
            | VariantAttribute::NumUnknown
            | VariantAttribute::NumAlleles => StorageType::Int32,
            VariantAttribute::CallRate => StorageType::Float32,
        }
    }
}

/// Per-call attributes derived from a sample's genotype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallAttribute {
    Called,
    GtType,
    IsHet,
    IsVariant,
}

impl CallAttribute {
    pub const ALL: [CallAttribute; 4] = [
        CallAttribute::Called,
        CallAttribute::GtType,
        CallAttribute::IsHet,
        CallAttribute::IsVariant,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CallAttribute::Called => "called",
            CallAttribute::GtType => "gt_type",
            CallAttribute::IsHet => "is_het",
            CallAttribute::IsVariant => "is_variant",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    fn storage(&self) -> StorageType {
        match self {
            CallAttribute::GtType => StorageType::Int32,
            _ => StorageType::Boolean,
        }
    }
}

/// Where a column's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Variant(VariantAttribute),
    Info,
    Call(CallAttribute),
    Format,
}

/// User value converter; receives the present raw value and its result is used verbatim
pub type Converter = Arc<dyn Fn(&RawValue) -> RawValue + Send + Sync>;

/// What to do when an INFO/FORMAT sequence is shorter than the column arity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortSequencePolicy {
    /// Pad the missing trailing slots with the fill value
    #[default]
    Pad,
    /// Leave the missing trailing slots empty (stored as nulls)
    KeepShort,
}

/// Per-field override of the resolved defaults
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldOverride {
    pub storage: Option<StorageType>,
    pub arity: Option<usize>,
    pub fill: Option<Scalar>,
    #[serde(skip)]
    pub converter: Option<Converter>,
}

impl FieldOverride {
    pub fn storage(storage: StorageType) -> Self {
        Self {
            storage: Some(storage),
            ..Default::default()
        }
    }

    pub fn arity(arity: usize) -> Self {
        Self {
            arity: Some(arity),
            ..Default::default()
        }
    }

    pub fn fill(fill: Scalar) -> Self {
        Self {
            fill: Some(fill),
            ..Default::default()
        }
    }

    pub fn converter<F>(f: F) -> Self
    where
        F: Fn(&RawValue) -> RawValue + Send + Sync + 'static,
    {
        Self {
            converter: Some(Arc::new(f)),
            ..Default::default()
        }
    }
}

impl fmt::Debug for FieldOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOverride")
            .field("storage", &self.storage)
            .field("arity", &self.arity)
            .field("fill", &self.fill)
            .field("converter", &self.converter.is_some())
            .finish()
    }
}

pub type FieldOverrides = HashMap<String, FieldOverride>;

/// Resolved layout of one column
#[derive(Clone)]
pub struct FieldSpec {
    pub name: String,
    pub source: FieldSource,
    pub storage: StorageType,
    pub arity: usize,
    pub fill: Scalar,
    pub converter: Option<Converter>,
}

impl FieldSpec {
    /// Fill value shaped to the column arity
    pub fn fill_value(&self) -> Value {
        if self.arity == 1 {
            Value::Scalar(self.fill.clone())
        } else {
            Value::Tuple(vec![Some(self.fill.clone()); self.arity])
        }
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("storage", &self.storage)
            .field("arity", &self.arity)
            .field("fill", &self.fill)
            .field("converter", &self.converter.is_some())
            .finish()
    }
}

/// Ordered, immutable column layout shared by extractors and builders
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    filter_columns: Vec<String>,
}

impl Schema {
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// FILTER indicator columns: `PASS` then the header-declared filter ids
    pub fn filter_columns(&self) -> &[String] {
        &self.filter_columns
    }
}

/// Builds schemas from header metadata
pub struct SchemaResolver<'a> {
    header: &'a HeaderMeta,
    defaults: &'a TypeDefaults,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(header: &'a HeaderMeta, defaults: &'a TypeDefaults) -> Self {
        Self { header, defaults }
    }

    /// Default per-variant field set: fixed and derived attributes, then every INFO id
    pub fn default_variant_fields(&self) -> Vec<String> {
        VariantAttribute::ALL
            .iter()
            .map(|a| a.name().to_string())
            .chain(self.header.infos.iter().map(|d| d.id.clone()))
            .collect()
    }

    /// Default per-sample field set: every FORMAT id, then the derived call attributes
    pub fn default_call_fields(&self) -> Vec<String> {
        self.header
            .formats
            .iter()
            .map(|d| d.id.clone())
            .chain(CallAttribute::ALL.iter().map(|a| a.name().to_string()))
            .collect()
    }

    /// Resolve the per-variant schema
    ///
    /// # Errors
    /// * `UnknownField` - a name is neither an attribute nor a declared INFO
    ///   field, or an override names no known field
    /// * `DuplicateField` - a name is requested twice
    /// * `SchemaViolation` - an override is inconsistent with the field
    pub fn resolve_variants(
        &self,
        fields: Option<&[String]>,
        overrides: &FieldOverrides,
    ) -> Result<Schema> {
        self.check_overrides(overrides)?;

        let names = match fields {
            Some(names) => names.to_vec(),
            None => self.default_variant_fields(),
        };

        let mut specs = Vec::with_capacity(names.len());
        for name in &names {
            let spec = match VariantAttribute::from_name(name) {
                Some(attr) => {
                    let storage = attr.storage(self.defaults);
                    let fill = storage.default_fill();
                    self.field(name, FieldSource::Variant(attr), storage, 1, fill, overrides)?
                }
                None => {
                    let decl = self.header.info(name).ok_or_else(|| {
                        ConversionError::UnknownField {
                            field: name.clone(),
                            section: "INFO",
                        }
                    })?;
                    self.declared(decl, FieldSource::Info, overrides)?
                }
            };
            specs.push(spec);
        }

        self.finish(specs)
    }

    /// Resolve the per-sample call data schema
    ///
    /// Fails like [`SchemaResolver::resolve_variants`], with FORMAT ids and
    /// call attributes as the known names.
    pub fn resolve_calldata(
        &self,
        fields: Option<&[String]>,
        overrides: &FieldOverrides,
    ) -> Result<Schema> {
        self.check_overrides(overrides)?;

        let names = match fields {
            Some(names) => names.to_vec(),
            None => self.default_call_fields(),
        };

        let mut specs = Vec::with_capacity(names.len());
        for name in &names {
            let spec = match self.header.format(name) {
                Some(decl) => self.declared(decl, FieldSource::Format, overrides)?,
                None => {
                    let attr = CallAttribute::from_name(name).ok_or_else(|| {
                        ConversionError::UnknownField {
                            field: name.clone(),
                            section: "FORMAT",
                        }
                    })?;
                    let storage = attr.storage();
                    let fill = storage.default_fill();
                    self.field(name, FieldSource::Call(attr), storage, 1, fill, overrides)?
                }
            };
            specs.push(spec);
        }

        self.finish(specs)
    }

    /// Reject override keys that name no attribute and no header declaration
    ///
    /// Keys for known fields outside the requested set are accepted, so one
    /// override file can serve both the variant and the call data schema.
    fn check_overrides(&self, overrides: &FieldOverrides) -> Result<()> {
        let mut keys: Vec<&String> = overrides.keys().collect();
        keys.sort();
        for name in keys {
            let known = VariantAttribute::from_name(name).is_some()
                || CallAttribute::from_name(name).is_some()
                || self.header.info(name).is_some()
                || self.header.format(name).is_some();
            if !known {
                return Err(ConversionError::UnknownField {
                    field: name.clone(),
                    section: "override",
                });
            }
        }
        Ok(())
    }

    fn declared(
        &self,
        decl: &FieldDeclaration,
        source: FieldSource,
        overrides: &FieldOverrides,
    ) -> Result<FieldSpec> {
        self.field(
            &decl.id,
            source,
            self.defaults.storage(decl.ty),
            decl.number.default_arity(),
            self.defaults.fill(decl.ty),
            overrides,
        )
    }

    fn field(
        &self,
        name: &str,
        source: FieldSource,
        storage: StorageType,
        arity: usize,
        fill: Scalar,
        overrides: &FieldOverrides,
    ) -> Result<FieldSpec> {
        let mut spec = FieldSpec {
            name: name.to_string(),
            source,
            storage,
            arity,
            fill,
            converter: None,
        };

        if let Some(over) = overrides.get(name) {
            if let Some(storage) = &over.storage {
                // A storage override without a fill resets the fill to the new storage default
                if over.fill.is_none() && *storage != spec.storage {
                    spec.fill = storage.default_fill();
                }
                spec.storage = storage.clone();
            }
            if let Some(arity) = over.arity {
                spec.arity = arity;
            }
            if let Some(fill) = &over.fill {
                spec.fill = fill.clone();
            }
            spec.converter = over.converter.clone();

            // Converted FILTER values are stored flat, as text
            if spec.converter.is_some()
                && over.storage.is_none()
                && spec.storage == StorageType::Filter
            {
                spec.storage = StorageType::Str(self.defaults.string_width);
                if over.fill.is_none() {
                    spec.fill = spec.storage.default_fill();
                }
            }
        }

        validate(&spec)?;
        Ok(spec)
    }

    fn finish(&self, fields: Vec<FieldSpec>) -> Result<Schema> {
        let mut seen = HashSet::new();
        for spec in &fields {
            if !seen.insert(spec.name.as_str()) {
                return Err(ConversionError::DuplicateField(spec.name.clone()));
            }
        }

        let filter_columns = std::iter::once(PASS.to_string())
            .chain(self.header.filters.iter().filter(|id| *id != PASS).cloned())
            .collect();

        let schema = Schema {
            fields,
            filter_columns,
        };
        debug!(
            "Resolved schema: [{}]",
            schema
                .fields()
                .iter()
                .map(|f| format!("{}:{}x{}", f.name, f.storage, f.arity))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(schema)
    }
}

fn validate(spec: &FieldSpec) -> Result<()> {
    if spec.arity == 0 {
        return Err(ConversionError::violation(&spec.name, "arity must be at least 1"));
    }

    // Fixed, derived and call attributes hold one value per row
    if matches!(spec.source, FieldSource::Variant(_) | FieldSource::Call(_)) && spec.arity != 1 {
        return Err(ConversionError::violation(
            &spec.name,
            format!("attribute has arity 1, got {}", spec.arity),
        ));
    }

    let is_filter_attr = spec.source == FieldSource::Variant(VariantAttribute::Filter);
    if spec.storage == StorageType::Filter {
        if !is_filter_attr {
            return Err(ConversionError::violation(
                &spec.name,
                "filter storage is only available for the FILTER field",
            ));
        }
        if spec.converter.is_some() {
            return Err(ConversionError::violation(
                &spec.name,
                "converted FILTER values need text storage",
            ));
        }
        return Ok(());
    }

    check_scalar(&spec.storage, &spec.fill)
        .map_err(|reason| ConversionError::violation(&spec.name, format!("fill value: {}", reason)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Number;

    fn header() -> HeaderMeta {
        HeaderMeta {
            infos: vec![
                FieldDeclaration::new("NS", VcfType::Integer, Number::Count(1)),
                FieldDeclaration::new("AF", VcfType::Float, Number::Unknown),
                FieldDeclaration::new("AA", VcfType::String, Number::Count(1)),
                FieldDeclaration::new("DB", VcfType::Flag, Number::Count(0)),
                FieldDeclaration::new("XY", VcfType::Integer, Number::Count(3)),
            ],
            formats: vec![
                FieldDeclaration::new("GT", VcfType::String, Number::Count(1)),
                FieldDeclaration::new("HQ", VcfType::Integer, Number::Count(2)),
            ],
            filters: vec!["q10".to_string(), "s50".to_string()],
            samples: vec!["A".to_string(), "B".to_string()],
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_variant_fields() {
        let header = header();
        let resolver = SchemaResolver::new(&header, &STANDARD_DEFAULTS);
        let schema = resolver.resolve_variants(None, &FieldOverrides::new()).unwrap();

        let names: Vec<&str> = schema.names().collect();
        assert_eq!(&names[..7], &["CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER"]);
        assert_eq!(&names[15..], &["NS", "AF", "AA", "DB", "XY"]);
        assert_eq!(schema.len(), 20);
        assert_eq!(schema.filter_columns(), &["PASS", "q10", "s50"]);
    }

    #[test]
    fn test_type_resolution() {
        let header = header();
        let resolver = SchemaResolver::new(&header, &STANDARD_DEFAULTS);
        let schema = resolver.resolve_variants(None, &FieldOverrides::new()).unwrap();

        assert_eq!(schema.field("CHROM").unwrap().storage, StorageType::Str(20));
        assert_eq!(schema.field("POS").unwrap().storage, StorageType::Int32);
        assert_eq!(schema.field("QUAL").unwrap().storage, StorageType::Float32);
        assert_eq!(schema.field("FILTER").unwrap().storage, StorageType::Filter);
        assert_eq!(schema.field("is_snp").unwrap().storage, StorageType::Boolean);
        assert_eq!(schema.field("call_rate").unwrap().storage, StorageType::Float32);
        assert_eq!(schema.field("NS").unwrap().storage, StorageType::Int32);
        assert_eq!(schema.field("AF").unwrap().storage, StorageType::Float32);
        assert_eq!(schema.field("AA").unwrap().storage, StorageType::Str(20));
        assert_eq!(schema.field("DB").unwrap().storage, StorageType::Boolean);
    }

    #[test]
    fn test_arity_and_fill_resolution() {
        let header = header();
        let resolver = SchemaResolver::new(&header, &STANDARD_DEFAULTS);
        let schema = resolver.resolve_variants(None, &FieldOverrides::new()).unwrap();

        assert_eq!(schema.field("AF").unwrap().arity, 1);
        assert_eq!(schema.field("DB").unwrap().arity, 1);
        assert_eq!(schema.field("XY").unwrap().arity, 3);
        assert_eq!(schema.field("ID").unwrap().fill, Scalar::String(String::new()));
        assert_eq!(schema.field("NS").unwrap().fill, Scalar::Integer(0));
        assert_eq!(schema.field("DB").unwrap().fill, Scalar::Flag(false));
        assert_eq!(
            schema.field("XY").unwrap().fill_value(),
            Value::Tuple(vec![Some(Scalar::Integer(0)); 3])
        );
    }

    #[test]
    fn test_explicit_field_list() {
        let header = header();
        let resolver = SchemaResolver::new(&header, &STANDARD_DEFAULTS);
        let fields = names(&["CHROM", "POS", "NS"]);
        let schema = resolver.resolve_variants(Some(&fields), &FieldOverrides::new()).unwrap();

        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["CHROM", "POS", "NS"]);
        assert!(schema.field("ID").is_none());
    }

    #[test]
    fn test_unknown_field() {
        let header = header();
        let resolver = SchemaResolver::new(&header, &STANDARD_DEFAULTS);
        let fields = names(&["CHROM", "NOPE"]);
        let err = resolver.resolve_variants(Some(&fields), &FieldOverrides::new()).unwrap_err();
        assert!(matches!(err, ConversionError::UnknownField { ref field, .. } if field == "NOPE"));

        // FORMAT ids are not INFO fields
        let fields = names(&["HQ"]);
        assert!(resolver.resolve_variants(Some(&fields), &FieldOverrides::new()).is_err());
    }

    #[test]
    fn test_duplicate_field() {
        let header = header();
        let resolver = SchemaResolver::new(&header, &STANDARD_DEFAULTS);
        let fields = names(&["POS", "POS"]);
        let err = resolver.resolve_variants(Some(&fields), &FieldOverrides::new()).unwrap_err();
        assert!(matches!(err, ConversionError::DuplicateField(ref f) if f == "POS"));
    }

    #[test]
    fn test_overrides_win() {
        let header = header();
        let resolver = SchemaResolver::new(&header, &STANDARD_DEFAULTS);
        let mut overrides = FieldOverrides::new();
        overrides.insert("AF".to_string(), FieldOverride::arity(2));
        overrides.insert("NS".to_string(), FieldOverride::fill(Scalar::Integer(-1)));
        overrides.insert("AA".to_string(), FieldOverride::storage(StorageType::Str(5)));
        overrides.insert(
            "DB".to_string(),
            FieldOverride::storage(StorageType::Int32),
        );

        let schema = resolver.resolve_variants(None, &overrides).unwrap();
        assert_eq!(schema.field("AF").unwrap().arity, 2);
        assert_eq!(schema.field("NS").unwrap().fill, Scalar::Integer(-1));
        assert_eq!(schema.field("AA").unwrap().storage, StorageType::Str(5));
        let db = schema.field("DB").unwrap();
        assert_eq!(db.storage, StorageType::Int32);
        assert_eq!(db.fill, Scalar::Integer(0));
    }

    #[test]
    fn test_invalid_overrides() {
        let header = header();
        let resolver = SchemaResolver::new(&header, &STANDARD_DEFAULTS);

        let mut overrides = FieldOverrides::new();
        overrides.insert("NS".to_string(), FieldOverride::fill(Scalar::from("many")));
        assert!(matches!(
            resolver.resolve_variants(None, &overrides),
            Err(ConversionError::SchemaViolation { .. })
        ));

        let mut overrides = FieldOverrides::new();
        overrides.insert("NS".to_string(), FieldOverride::arity(0));
        assert!(resolver.resolve_variants(None, &overrides).is_err());

        let mut overrides = FieldOverrides::new();
        overrides.insert("NS".to_string(), FieldOverride::storage(StorageType::Filter));
        assert!(resolver.resolve_variants(None, &overrides).is_err());
    }

    #[test]
    fn test_filter_as_text() {
        let header = header();
        let resolver = SchemaResolver::new(&header, &STANDARD_DEFAULTS);
        let mut overrides = FieldOverrides::new();
        overrides.insert("FILTER".to_string(), FieldOverride::storage(StorageType::Str(20)));
        let schema = resolver.resolve_variants(None, &overrides).unwrap();
        let filter = schema.field("FILTER").unwrap();
        assert_eq!(filter.storage, StorageType::Str(20));
        assert_eq!(filter.fill, Scalar::String(String::new()));
    }

    #[test]
    fn test_attribute_arity_fixed() {
        let header = header();
        let resolver = SchemaResolver::new(&header, &STANDARD_DEFAULTS);

        let mut overrides = FieldOverrides::new();
        overrides.insert("POS".to_string(), FieldOverride::arity(2));
        let fields = names(&["POS"]);
        let err = resolver.resolve_variants(Some(&fields), &overrides).unwrap_err();
        assert!(matches!(err, ConversionError::SchemaViolation { ref field, .. } if field == "POS"));

        let mut overrides = FieldOverrides::new();
        overrides.insert("gt_type".to_string(), FieldOverride::arity(3));
        let err = resolver.resolve_calldata(None, &overrides).unwrap_err();
        assert!(matches!(err, ConversionError::SchemaViolation { ref field, .. } if field == "gt_type"));

        // arity 1 restated is harmless
        let mut overrides = FieldOverrides::new();
        overrides.insert("POS".to_string(), FieldOverride::arity(1));
        assert!(resolver.resolve_variants(Some(&fields), &overrides).is_ok());
    }

    #[test]
    fn test_filter_converter_stored_as_text() {
        let header = header();
        let resolver = SchemaResolver::new(&header, &STANDARD_DEFAULTS);

        let mut overrides = FieldOverrides::new();
        overrides.insert("FILTER".to_string(), FieldOverride::converter(|raw| raw.clone()));
        let schema = resolver.resolve_variants(None, &overrides).unwrap();
        let filter = schema.field("FILTER").unwrap();
        assert_eq!(filter.storage, StorageType::Str(20));
        assert_eq!(filter.fill, Scalar::String(String::new()));
        assert!(filter.converter.is_some());

        // explicit nested storage cannot hold converter output
        overrides.get_mut("FILTER").unwrap().storage = Some(StorageType::Filter);
        let err = resolver.resolve_variants(None, &overrides).unwrap_err();
        assert!(matches!(err, ConversionError::SchemaViolation { ref field, .. } if field == "FILTER"));
    }

    #[test]
    fn test_sources_match_schema_kind() {
        let header = header();
        let resolver = SchemaResolver::new(&header, &STANDARD_DEFAULTS);

        let variants = resolver.resolve_variants(None, &FieldOverrides::new()).unwrap();
        assert!(variants
            .fields()
            .iter()
            .all(|f| matches!(f.source, FieldSource::Variant(_) | FieldSource::Info)));

        let calls = resolver.resolve_calldata(None, &FieldOverrides::new()).unwrap();
        assert!(calls
            .fields()
            .iter()
            .all(|f| matches!(f.source, FieldSource::Call(_) | FieldSource::Format)));
    }

    #[test]
    fn test_unknown_override_key() {
        let header = header();
        let resolver = SchemaResolver::new(&header, &STANDARD_DEFAULTS);

        let mut overrides = FieldOverrides::new();
        overrides.insert("NOPE".to_string(), FieldOverride::arity(2));
        let err = resolver.resolve_variants(None, &overrides).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::UnknownField { ref field, section: "override" } if field == "NOPE"
        ));
        assert!(resolver.resolve_calldata(None, &overrides).is_err());

        // a FORMAT override does not disturb the variant schema
        let mut overrides = FieldOverrides::new();
        overrides.insert("HQ".to_string(), FieldOverride::arity(3));
        let schema = resolver.resolve_variants(None, &overrides).unwrap();
        assert!(schema.field("HQ").is_none());
        let calls = resolver.resolve_calldata(None, &overrides).unwrap();
        assert_eq!(calls.field("HQ").unwrap().arity, 3);
    }

    #[test]
    fn test_declared_pass_not_duplicated() {
        let mut header = header();
        header.filters.insert(0, PASS.to_string());
        let resolver = SchemaResolver::new(&header, &STANDARD_DEFAULTS);
        let schema = resolver.resolve_variants(None, &FieldOverrides::new()).unwrap();
        assert_eq!(schema.filter_columns(), &["PASS", "q10", "s50"]);
    }

    #[test]
    fn test_calldata_schema() {
        let header = header();
        let resolver = SchemaResolver::new(&header, &STANDARD_DEFAULTS);
        let schema = resolver.resolve_calldata(None, &FieldOverrides::new()).unwrap();

        assert_eq!(
            schema.names().collect::<Vec<_>>(),
            vec!["GT", "HQ", "called", "gt_type", "is_het", "is_variant"]
        );
        assert_eq!(schema.field("HQ").unwrap().arity, 2);
        assert_eq!(schema.field("gt_type").unwrap().storage, StorageType::Int32);
        assert_eq!(schema.field("called").unwrap().storage, StorageType::Boolean);

        let fields = names(&["NS"]);
        let err = resolver.resolve_calldata(Some(&fields), &FieldOverrides::new()).unwrap_err();
        assert!(matches!(err, ConversionError::UnknownField { section: "FORMAT", .. }));
    }

    #[test]
    fn test_custom_defaults_table() {
        let header = header();
        let defaults = TypeDefaults {
            string_width: 8,
            character_width: 1,
        };
        let resolver = SchemaResolver::new(&header, &defaults);
        let schema = resolver.resolve_variants(None, &FieldOverrides::new()).unwrap();
        assert_eq!(schema.field("AA").unwrap().storage, StorageType::Str(8));
        assert_eq!(schema.field("CHROM").unwrap().storage, StorageType::Str(8));
    }

    #[test]
    fn test_override_from_json() {
        let over: FieldOverride =
            serde_json::from_str(r#"{"storage": {"str": 4}, "arity": 2, "fill": ""}"#).unwrap();
        assert_eq!(over.storage, Some(StorageType::Str(4)));
        assert_eq!(over.arity, Some(2));
        assert_eq!(over.fill, Some(Scalar::String(String::new())));
        assert!(over.converter.is_none());

        let storage: StorageType = serde_json::from_str(r#""int32""#).unwrap();
        assert_eq!(storage, StorageType::Int32);
    }
}
