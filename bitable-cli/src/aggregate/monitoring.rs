//! Hierarchical fold of monitoring rows and the per-factory summaries
//! written back to the source row.

use std::collections::BTreeMap;

use crate::extract::MonitoringRow;

pub const FAILED_STATUS: &str = "不合格";
pub const WING_MARKERS: &[&str] = &["翅中", "翅根"];
pub const PIECE_WEIGHT_POINT: &str = "单枚重量";

const INFO_SEPARATOR: &str = "、";
const ENTRY_SEPARATOR: &str = ",";

/// One product inspected at one factory on one day
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObservationKey {
    pub factory: String,
    pub date: String,
    pub product: String,
}

/// control point -> measured values
pub type PointValues = BTreeMap<String, Vec<String>>;
/// control group -> points
pub type GroupPoints = BTreeMap<String, PointValues>;
/// status -> groups
pub type StatusGroups = BTreeMap<String, GroupPoints>;

/// Which summary a field carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    Deviation,
    WingMedian,
}

impl SummaryKind {
    /// Field name on the source row for a factory
    pub fn field_name(&self, factory: &str) -> String {
        match self {
            SummaryKind::Deviation => format!("{}（偏差）", factory),
            SummaryKind::WingMedian => format!("{}（翅类中值）", factory),
        }
    }
}

/// One summary line before flattening
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub key: ObservationKey,
    pub info: String,
}

impl SummaryLine {
    fn render(&self) -> String {
        format!(
            "{}*{}*{}*{}",
            self.key.date, self.key.factory, self.key.product, self.info
        )
    }
}

/// A flattened field ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryField {
    pub factory: String,
    pub kind: SummaryKind,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitoringAggregate {
    observations: BTreeMap<ObservationKey, StatusGroups>,
}

impl MonitoringAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a row in; rows other than raw-chicken quality checks are ignored.
    /// Returns whether the row was kept.
    pub fn add(&mut self, row: MonitoringRow) -> bool {
        if !row.is_quality_check() {
            return false;
        }
        let key = ObservationKey {
            factory: row.factory,
            date: row.date,
            product: row.product,
        };
        self.observations
            .entry(key)
            .or_default()
            .entry(row.status)
            .or_default()
            .entry(row.group)
            .or_default()
            .entry(row.point)
            .or_default()
            .push(row.value);
        true
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Failed control points per observation, empty info when none failed
    pub fn deviation_summary(&self) -> Vec<SummaryLine> {
        self.observations
            .iter()
            .map(|(key, statuses)| {
                let points: Vec<&str> = statuses
                    .get(FAILED_STATUS)
                    .into_iter()
                    .flat_map(|groups| groups.values())
                    .flat_map(|points| points.keys())
                    .map(String::as_str)
                    .collect();
                SummaryLine {
                    key: key.clone(),
                    info: points.join(INFO_SEPARATOR),
                }
            })
            .collect()
    }

    /// Piece weights of wing products, from the first matching control point
    pub fn wing_median_summary(&self) -> Vec<SummaryLine> {
        self.observations
            .iter()
            .filter(|(key, _)| WING_MARKERS.iter().any(|m| key.product.contains(m)))
            .filter_map(|(key, statuses)| {
                let values = statuses
                    .values()
                    .flat_map(|groups| groups.values())
                    .flat_map(|points| points.iter())
                    .find(|(point, _)| point.contains(PIECE_WEIGHT_POINT))
                    .map(|(_, values)| values)?;
                Some(SummaryLine {
                    key: key.clone(),
                    info: values.join(INFO_SEPARATOR).replace(',', INFO_SEPARATOR),
                })
            })
            .collect()
    }

    /// Both summaries flattened into one field per factory and kind
    pub fn factory_fields(&self) -> Vec<FactoryField> {
        let mut fields = flatten(SummaryKind::Deviation, self.deviation_summary());
        fields.extend(flatten(SummaryKind::WingMedian, self.wing_median_summary()));
        fields
    }
}

impl FromIterator<MonitoringRow> for MonitoringAggregate {
    fn from_iter<I: IntoIterator<Item = MonitoringRow>>(iter: I) -> Self {
        let mut aggregate = Self::new();
        for row in iter {
            aggregate.add(row);
        }
        aggregate
    }
}

fn flatten(kind: SummaryKind, lines: Vec<SummaryLine>) -> Vec<FactoryField> {
    let mut by_factory: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for line in lines {
        by_factory
            .entry(line.key.factory.clone())
            .or_default()
            .push(line.render());
    }
    by_factory
        .into_iter()
        .map(|(factory, entries)| FactoryField {
            name: kind.field_name(&factory),
            value: entries.join(ENTRY_SEPARATOR),
            factory,
            kind,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::monitoring::{TARGET_CATEGORY, TARGET_MODULE, TARGET_STEP};

    fn row(factory: &str, date: &str, product: &str, point: &str, status: &str, value: &str) -> MonitoringRow {
        MonitoringRow {
            row: 2,
            factory: factory.to_string(),
            product: product.to_string(),
            category: TARGET_CATEGORY.to_string(),
            module: TARGET_MODULE.to_string(),
            step: TARGET_STEP.to_string(),
            group: "品质".to_string(),
            point: point.to_string(),
            date: date.to_string(),
            status: status.to_string(),
            value: value.to_string(),
            standard: String::new(),
        }
    }

    #[test]
    fn test_only_quality_checks_are_kept() {
        let mut aggregate = MonitoringAggregate::new();
        let mut other = row("政和工厂", "2024-03-15", "九块鸡", "外观", "合格", "");
        other.step = "腌制".to_string();
        assert!(!aggregate.add(other));
        assert!(aggregate.add(row("政和工厂", "2024-03-15", "九块鸡", "外观", "合格", "")));
        assert_eq!(aggregate.len(), 1);
    }

    #[test]
    fn test_deviation_summary_lists_failed_points() {
        let aggregate: MonitoringAggregate = vec![
            row("政和工厂", "2024-03-15", "九块鸡", "外观", "不合格", ""),
            row("政和工厂", "2024-03-15", "九块鸡", "异物", "不合格", ""),
            row("政和工厂", "2024-03-15", "九块鸡", "温度", "合格", "4"),
            row("政和工厂", "2024-03-16", "九块鸡", "温度", "合格", "4"),
        ]
        .into_iter()
        .collect();

        let fields = aggregate.factory_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "政和工厂（偏差）");
        assert_eq!(
            fields[0].value,
            "2024-03-15*政和工厂*九块鸡*外观、异物,2024-03-16*政和工厂*九块鸡*"
        );
    }

    #[test]
    fn test_wing_median_uses_first_weight_point() {
        let aggregate: MonitoringAggregate = vec![
            row("浦城一厂", "2024-03-15", "辣翅用翅中", "单枚重量（中值）", "合格", "35,36"),
            row("浦城一厂", "2024-03-15", "辣翅用翅中", "单枚重量（中值）", "合格", "37"),
            row("浦城一厂", "2024-03-15", "九块鸡", "单枚重量", "合格", "99"),
        ]
        .into_iter()
        .collect();

        let wing = aggregate.wing_median_summary();
        assert_eq!(wing.len(), 1);
        assert_eq!(wing[0].info, "35、36、37");

        let fields = aggregate.factory_fields();
        let median = fields
            .iter()
            .find(|f| f.kind == SummaryKind::WingMedian)
            .unwrap();
        assert_eq!(median.name, "浦城一厂（翅类中值）");
        assert_eq!(median.value, "2024-03-15*浦城一厂*辣翅用翅中*35、36、37");
    }

    #[test]
    fn test_factories_get_separate_fields() {
        let aggregate: MonitoringAggregate = vec![
            row("浦城一厂", "2024-03-15", "九块鸡", "外观", "不合格", ""),
            row("政和工厂", "2024-03-15", "九块鸡", "外观", "不合格", ""),
        ]
        .into_iter()
        .collect();
        let names: Vec<String> = aggregate.factory_fields().into_iter().map(|f| f.name).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"浦城一厂（偏差）".to_string()));
        assert!(names.contains(&"政和工厂（偏差）".to_string()));
    }
}
