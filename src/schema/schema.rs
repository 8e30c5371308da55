use serde::{Serialize, Deserialize};
use crate::core::error::{Error, Result};

/// How the sorter compares a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKeyType {
    Text,     // Case-insensitive byte order
    Numeric,  // Leading numeric prefix compared as a number
}

/// Which configured index directory a collection is cached under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexHome {
    Pangenome,
    ComparisonGenome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub sort_type: SortKeyType,
}

/// Ordered column layout of one collection's cached table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,     // Key of the record array inside the upstream object
    pub suffix: String,   // File name suffix, e.g. "_orthologs"
    pub home: IndexHome,
    pub fields: Vec<ColumnDefinition>,
}

impl CollectionSchema {
    pub fn new(name: &str, suffix: &str, home: IndexHome) -> Self {
        CollectionSchema {
            name: name.to_string(),
            suffix: suffix.to_string(),
            home,
            fields: Vec::new(),
        }
    }

    pub fn add_text_field(mut self, name: &str) -> Self {
        self.fields.push(ColumnDefinition {
            name: name.to_string(),
            sort_type: SortKeyType::Text,
        });
        self
    }

    pub fn add_numeric_field(mut self, name: &str) -> Self {
        self.fields.push(ColumnDefinition {
            name: name.to_string(),
            sort_type: SortKeyType::Numeric,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// 1-based column position and sort type of a field
    pub fn column(&self, name: &str) -> Result<(usize, SortKeyType)> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .map(|i| (i + 1, self.fields[i].sort_type))
            .ok_or_else(|| Error::unknown_sort_column(name, &self.field_names()))
    }

    /// Object-store projection paths selecting only this schema's fields
    pub fn projection_paths(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|f| format!("/{}/[*]/{}", self.name, f.name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    fn schema() -> CollectionSchema {
        CollectionSchema::new("orthologs", "_orthologs", IndexHome::Pangenome)
            .add_text_field("id")
            .add_numeric_field("count")
    }

    #[test]
    fn columns_are_one_based() {
        let schema = schema();
        assert_eq!(schema.column("id").unwrap(), (1, SortKeyType::Text));
        assert_eq!(schema.column("count").unwrap(), (2, SortKeyType::Numeric));
    }

    #[test]
    fn unknown_column_is_rejected() {
        let err = schema().column("missing").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownSortColumn);
        assert!(err.context.contains("count"));
    }

    #[test]
    fn projection_selects_each_field() {
        assert_eq!(
            schema().projection_paths(),
            vec!["/orthologs/[*]/id".to_string(), "/orthologs/[*]/count".to_string()]
        );
    }
}
