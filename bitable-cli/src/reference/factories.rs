//! Factory name lookup
//!
//! Reports name factories by their full legal entity name; bitable fields use a
//! short factory code. The map is built once from reference data and never
//! mutated.

use anyhow::{Result, bail};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Long legal entity name -> short factory code
#[derive(Debug, Clone, Default)]
pub struct FactoryNameMap {
    by_long_name: HashMap<String, String>,
    codes: BTreeSet<String>,
}

impl FactoryNameMap {
    /// Build from `code -> [long names]`, rejecting a long name claimed by two codes
    pub fn from_groups(groups: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut by_long_name = HashMap::new();
        let mut codes = BTreeSet::new();

        for (code, long_names) in groups {
            let code = code.trim().to_string();
            for long_name in long_names {
                let long_name = long_name.trim().to_string();
                if let Some(existing) = by_long_name.get(&long_name) {
                    if existing != &code {
                        bail!(
                            "Factory name '{}' is mapped to both '{}' and '{}'",
                            long_name,
                            existing,
                            code
                        );
                    }
                }
                by_long_name.insert(long_name, code.clone());
            }
            codes.insert(code);
        }

        Ok(Self {
            by_long_name,
            codes,
        })
    }

    /// Resolve a name found in a report to its short code.
    ///
    /// Long names map to their code and a name that already is a known code is
    /// returned unchanged. Unknown names resolve to `None` and the caller
    /// discards the row.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        if let Some(code) = self.by_long_name.get(name) {
            return Some(code.as_str());
        }
        self.codes.get(name).map(|c| c.as_str())
    }

    /// All known short codes, sorted
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(|c| c.as_str())
    }

    /// Number of long names known
    pub fn long_name_count(&self) -> usize {
        self.by_long_name.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> BTreeMap<String, Vec<String>> {
        let mut groups = BTreeMap::new();
        groups.insert(
            "浦城一厂".to_string(),
            vec![
                "福建圣农发展（浦城）有限公司一厂".to_string(),
                "福建圣农发展（浦城）有限公司肉鸡加工一厂".to_string(),
            ],
        );
        groups.insert("政和工厂".to_string(), vec!["圣农发展（政和）有限公司".to_string()]);
        groups
    }

    #[test]
    fn test_resolve_long_names() {
        let map = FactoryNameMap::from_groups(&groups()).unwrap();
        assert_eq!(map.resolve("福建圣农发展（浦城）有限公司一厂"), Some("浦城一厂"));
        assert_eq!(map.resolve("福建圣农发展（浦城）有限公司肉鸡加工一厂"), Some("浦城一厂"));
        assert_eq!(map.resolve(" 圣农发展（政和）有限公司 "), Some("政和工厂"));
        assert_eq!(map.long_name_count(), 3);
        assert_eq!(map.codes().collect::<Vec<_>>(), vec!["政和工厂", "浦城一厂"]);
    }

    #[test]
    fn test_short_code_passes_through() {
        let map = FactoryNameMap::from_groups(&groups()).unwrap();
        assert_eq!(map.resolve("政和工厂"), Some("政和工厂"));
    }

    #[test]
    fn test_unknown_name_is_discarded() {
        let map = FactoryNameMap::from_groups(&groups()).unwrap();
        assert_eq!(map.resolve("某某食品有限公司"), None);
        assert_eq!(map.resolve(""), None);
    }

    #[test]
    fn test_conflicting_long_name_is_rejected() {
        let mut groups = groups();
        groups.insert("浦城二厂".to_string(), vec!["福建圣农发展（浦城）有限公司一厂".to_string()]);
        assert!(FactoryNameMap::from_groups(&groups).is_err());
    }
}
