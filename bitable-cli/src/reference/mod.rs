//! Reference data: factory names, product rules and compliant grade marks
//!
//! Loaded once at startup from the embedded TOML document, or from a file
//! given with `--reference`, and shared read-only afterwards.

mod factories;
mod products;

pub use factories::FactoryNameMap;
pub use products::{ProductCatalog, ProductRule};

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_REFERENCE: &str = include_str!("default.toml");

/// On-disk layout of the reference document
#[derive(Debug, Deserialize)]
struct ReferenceFile {
    #[serde(default)]
    compliant_grades: Vec<String>,
    #[serde(default)]
    factories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    products: Vec<ProductRule>,
}

/// Immutable lookup data used by the extractors
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub factories: FactoryNameMap,
    pub products: ProductCatalog,
    compliant_grades: Vec<String>,
}

impl ReferenceData {
    /// The reference data shipped with the binary
    pub fn embedded() -> Result<Self> {
        Self::from_toml(DEFAULT_REFERENCE).context("Embedded reference data is invalid")
    }

    /// Load reference data from a TOML file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read reference file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid reference file: {}", path.display()))
    }

    /// Embedded data, or the given file when present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::embedded(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ReferenceFile = toml::from_str(content).context("Failed to parse reference TOML")?;
        let factories = FactoryNameMap::from_groups(&file.factories)?;
        let products = ProductCatalog::new(file.products);
        log::debug!(
            "Reference data: {} factory names for {} factories, {} product rules",
            factories.long_name_count(),
            factories.codes().count(),
            products.rules().len()
        );
        Ok(Self {
            factories,
            products,
            compliant_grades: file
                .compliant_grades
                .into_iter()
                .map(|g| g.trim().to_string())
                .collect(),
        })
    }

    /// True when a grade mark means "no deficiency"
    pub fn is_compliant_grade(&self, grade: &str) -> bool {
        let grade = grade.trim();
        self.compliant_grades.iter().any(|g| g.eq_ignore_ascii_case(grade))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_reference_resolves_every_long_name() {
        let reference = ReferenceData::embedded().unwrap();
        let groups: ReferenceFile = toml::from_str(DEFAULT_REFERENCE).unwrap();
        for (code, long_names) in &groups.factories {
            for long_name in long_names {
                assert_eq!(reference.factories.resolve(long_name), Some(code.as_str()));
            }
        }
        assert_eq!(reference.factories.codes().count(), 8);
    }

    #[test]
    fn test_embedded_products_keep_file_order() {
        let reference = ReferenceData::embedded().unwrap();
        assert_eq!(reference.products.classify("速冻调理九块鸡"), Some("速冻调理九块鸡2.0"));
        assert_eq!(reference.products.classify("九块鸡"), Some("九块鸡"));
        assert_eq!(reference.products.classify("大翅根 60-70g"), Some("大翅根（60-70）"));
        assert_eq!(reference.products.classify("鸡胸肉"), None);
    }

    #[test]
    fn test_compliant_grades() {
        let reference = ReferenceData::embedded().unwrap();
        assert!(reference.is_compliant_grade("符合"));
        assert!(reference.is_compliant_grade("n/a"));
        assert!(!reference.is_compliant_grade("S"));
    }

    #[test]
    fn test_custom_reference_document() {
        let reference = ReferenceData::from_toml(
            r#"
            compliant_grades = ["OK"]

            [factories]
            "A厂" = ["甲公司"]

            [[products]]
            label = "鸡翅"
            contains = ["翅"]
            "#,
        )
        .unwrap();
        assert_eq!(reference.factories.resolve("甲公司"), Some("A厂"));
        assert_eq!(reference.products.classify("鸡翅中"), Some("鸡翅"));
        assert!(reference.is_compliant_grade("ok"));
    }

    #[test]
    fn test_invalid_reference_is_an_error() {
        assert!(ReferenceData::from_toml("factories = 3").is_err());
    }
}
