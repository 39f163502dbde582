//! Product classification by keyword rules

use serde::{Deserialize, Serialize};

/// One classification rule: all keywords must appear in the text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRule {
    /// Label written to bitable
    pub label: String,
    /// Keywords that must all be present
    pub contains: Vec<String>,
}

impl ProductRule {
    pub fn matches(&self, text: &str) -> bool {
        !self.contains.is_empty() && self.contains.iter().all(|k| text.contains(k.as_str()))
    }
}

/// Ordered product rules; earlier rules take precedence
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    rules: Vec<ProductRule>,
}

impl ProductCatalog {
    pub fn new(rules: Vec<ProductRule>) -> Self {
        Self { rules }
    }

    /// Label of the first rule matching `text`
    pub fn classify(&self, text: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matches(text))
            .map(|rule| rule.label.as_str())
    }

    pub fn rules(&self) -> &[ProductRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(label: &str, contains: &[&str]) -> ProductRule {
        ProductRule {
            label: label.to_string(),
            contains: contains.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn catalog() -> ProductCatalog {
        ProductCatalog::new(vec![
            rule("速冻调理九块鸡2.0", &["速冻调理九块鸡"]),
            rule("九块鸡", &["九块鸡"]),
            rule("琵琶腿（140）", &["琵琶腿", "140"]),
            rule("琵琶腿（110）", &["琵琶腿", "110"]),
        ])
    }

    #[test]
    fn test_earlier_rule_wins() {
        let c = catalog();
        assert_eq!(c.classify("速冻调理九块鸡（大）"), Some("速冻调理九块鸡2.0"));
        assert_eq!(c.classify("原味九块鸡"), Some("九块鸡"));
    }

    #[test]
    fn test_all_keywords_required() {
        let c = catalog();
        assert_eq!(c.classify("琵琶腿110g"), Some("琵琶腿（110）"));
        assert_eq!(c.classify("琵琶腿140g"), Some("琵琶腿（140）"));
        assert_eq!(c.classify("琵琶腿"), None);
    }

    #[test]
    fn test_rule_without_keywords_never_matches() {
        let c = ProductCatalog::new(vec![rule("anything", &[])]);
        assert_eq!(c.classify("whatever"), None);
    }
}
