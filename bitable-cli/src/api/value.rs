//! Field values written to bitable records

use std::collections::BTreeMap;

use crate::workbook::Cell;

/// A record's fields, ordered by name
pub type Fields = BTreeMap<String, FieldValue>;

/// A scalar field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// Whole number
    Int(i64),
    /// Decimal number
    Number(f64),
    /// Milliseconds since the Unix epoch, for date fields
    Timestamp(i64),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// Value of a worksheet cell; blank cells have no value.
    ///
    /// Whole numbers become integers so that `30.0` is sent as `30`. Date
    /// cells are sent as their display text; callers needing a date field
    /// normalize to [`FieldValue::Timestamp`] themselves.
    pub fn from_cell(cell: &Cell) -> Option<Self> {
        if cell.is_empty() {
            return None;
        }
        Some(match cell {
            Cell::Number(n) => match cell.as_whole_number() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Number(*n),
            },
            Cell::Text(s) => FieldValue::Text(s.trim().to_string()),
            other => FieldValue::Text(other.display_text()),
        })
    }

    /// JSON value for API calls
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::json!(*i),
            FieldValue::Number(f) => serde_json::json!(*f),
            FieldValue::Timestamp(ms) => serde_json::json!(*ms),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Timestamp(ms) => write!(f, "{} (ms)", ms),
        }
    }
}

/// The `{"field": value}` object sent in create and update bodies
pub fn fields_to_json(fields: &Fields) -> serde_json::Value {
    serde_json::Value::Object(
        fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cell() {
        assert_eq!(FieldValue::from_cell(&Cell::Number(30.0)), Some(FieldValue::Int(30)));
        assert_eq!(FieldValue::from_cell(&Cell::Number(92.5)), Some(FieldValue::Number(92.5)));
        assert_eq!(FieldValue::from_cell(&Cell::text(" 品名 ")), Some(FieldValue::text("品名")));
        assert_eq!(FieldValue::from_cell(&Cell::text("  ")), None);
        assert_eq!(FieldValue::from_cell(&Cell::Empty), None);
    }

    #[test]
    fn test_fields_to_json() {
        let mut fields = Fields::new();
        fields.insert("工厂名称".to_string(), FieldValue::text("浦城一厂"));
        fields.insert("审核开始日期".to_string(), FieldValue::Timestamp(1_709_222_400_000));
        fields.insert("QSA得分".to_string(), FieldValue::Number(92.5));
        assert_eq!(
            fields_to_json(&fields),
            serde_json::json!({
                "工厂名称": "浦城一厂",
                "审核开始日期": 1_709_222_400_000i64,
                "QSA得分": 92.5
            })
        );
    }
}
