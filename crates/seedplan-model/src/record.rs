//! In-memory rows and the dataset snapshot they belong to.

use serde::{Deserialize, Serialize};

use crate::schema::{ResolvedColumns, Schema};

/// One logical row with the source line it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// 1-based line of the record start in the source text (0 when synthesized).
    pub line: usize,
    pub fields: Vec<String>,
}

impl Record {
    pub fn new(line: usize, fields: Vec<String>) -> Self {
        Self { line, fields }
    }

    /// Field text at `index`, or `""` when the row is shorter.
    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn set_field(&mut self, index: usize, value: String) {
        if let Some(slot) = self.fields.get_mut(index) {
            *slot = value;
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when every field is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|value| value.trim().is_empty())
    }

    /// Caller-visible identifier.
    pub fn identifier(&self, columns: &ResolvedColumns) -> &str {
        self.field(columns.id).trim()
    }

    /// Dedup key value.
    pub fn key(&self, columns: &ResolvedColumns) -> &str {
        self.field(columns.key).trim()
    }

    /// Registration key used as the dedup tiebreaker.
    pub fn registration_key(&self, columns: &ResolvedColumns) -> Option<&str> {
        columns.tiebreak.map(|index| self.field(index).trim())
    }
}

/// Header plus ordered rows; the unit every pipeline stage consumes and produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub schema: Schema,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(schema: Schema, records: Vec<Record>) -> Self {
        Self { schema, records }
    }

    pub fn width(&self) -> usize {
        self.schema.width()
    }

    pub fn header(&self) -> &[String] {
        self.schema.columns()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when every record has exactly the schema width.
    pub fn is_rectangular(&self) -> bool {
        let width = self.width();
        self.records.iter().all(|record| record.len() == width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_access_tolerates_short_rows() {
        let record = Record::new(2, vec!["1".to_string()]);
        assert_eq!(record.field(0), "1");
        assert_eq!(record.field(5), "");
    }

    #[test]
    fn provenance_accessors_trim() {
        let columns = ResolvedColumns {
            key: 0,
            tiebreak: Some(1),
            id: 0,
            ..ResolvedColumns::default()
        };
        let record = Record::new(
            2,
            vec![" 374 ".to_string(), "20250315-0002 ".to_string()],
        );
        assert_eq!(record.key(&columns), "374");
        assert_eq!(record.identifier(&columns), "374");
        assert_eq!(record.registration_key(&columns), Some("20250315-0002"));
    }

    #[test]
    fn blank_detection() {
        assert!(Record::new(3, vec![" ".to_string(), String::new()]).is_blank());
        assert!(!Record::new(3, vec![String::new(), "x".to_string()]).is_blank());
    }
}
