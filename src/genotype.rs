// ==============================================================================
// genotype.rs - Genotype Call Classification
// ==============================================================================
// Description: Parsed VCF GT calls and the per-call statistics derived from them
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 0.1.0
// ==============================================================================
// Algorithm:
//   Given the allele indices of a call (0 = REF, 1.. = ALT, '.' = missing):
//   - any allele missing          → uncalled, gt_type -1
//   - all alleles 0 (e.g. 0|0)     → homozygous reference, gt_type 0
//   - alleles differ (e.g. 0/1)    → heterozygous, gt_type 1
//   - all alleles equal, non-zero  → homozygous alternate, gt_type 2
// ==============================================================================

use std::fmt;

/// Genotype type codes stored in the `gt_type` column
pub const GT_UNKNOWN: i32 = -1;
pub const GT_HOM_REF: i32 = 0;
pub const GT_HET: i32 = 1;
pub const GT_HOM_ALT: i32 = 2;

/// One sample's GT call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genotype {
    alleles: Vec<Option<usize>>,
    phased: bool,
}

impl Genotype {
    pub fn new(alleles: Vec<Option<usize>>, phased: bool) -> Self {
        Self { alleles, phased }
    }

    /// Parse GT text such as `0|0`, `1/2`, `./.` or haploid `1`
    ///
    /// Returns `None` for text that is not a genotype call.
    ///
    /// # Examples
    /// ```
    /// use vcfarray::genotype::Genotype;
    ///
    /// let gt = Genotype::parse("0|1").unwrap();
    /// assert!(gt.is_het());
    /// assert!(gt.is_phased());
    /// assert_eq!(Genotype::parse("./.").unwrap().gt_type(), -1);
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }

        let phased = text.contains('|');
        let mut alleles = Vec::new();
        for part in text.split(|c| c == '|' || c == '/') {
            match part {
                "." => alleles.push(None),
                _ => alleles.push(Some(part.parse::<usize>().ok()?)),
            }
        }

        Some(Self { alleles, phased })
    }

    pub fn alleles(&self) -> &[Option<usize>] {
        &self.alleles
    }

    pub fn is_phased(&self) -> bool {
        self.phased
    }

    /// Every allele is specified
    pub fn is_called(&self) -> bool {
        !self.alleles.is_empty() && self.alleles.iter().all(|a| a.is_some())
    }

    /// Summary code: 0 hom-ref, 1 het, 2 hom-alt, -1 uncalled
    pub fn gt_type(&self) -> i32 {
        if !self.is_called() {
            return GT_UNKNOWN;
        }
        if self.is_het() {
            GT_HET
        } else if self.alleles.iter().all(|a| *a == Some(0)) {
            GT_HOM_REF
        } else {
            GT_HOM_ALT
        }
    }

    /// Called, and the alleles are not all identical
    pub fn is_het(&self) -> bool {
        self.is_called() && self.alleles.windows(2).any(|w| w[0] != w[1])
    }

    /// Called, and at least one allele differs from the reference
    pub fn is_variant(&self) -> bool {
        self.is_called() && self.alleles.iter().any(|a| *a != Some(0))
    }

    /// Called ALT allele indices (1-based into ALT)
    pub fn alt_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.alleles.iter().filter_map(|a| *a).filter(|&a| a > 0)
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.phased { '|' } else { '/' };
        for (i, allele) in self.alleles.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", sep)?;
            }
            match allele {
                Some(a) => write!(f, "{}", a)?,
                None => f.write_str(".")?,
            }
        }
        Ok(())
    }
}
