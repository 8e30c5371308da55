use serde_json::Value;
use crate::core::error::{Error, Result};
use crate::core::types::Record;
use crate::schema::schema::CollectionSchema;

pub const FIELD_SEPARATOR: char = '\t';
pub const MULTI_VALUE_SEPARATOR: char = ',';

/// Tab-separated line format of cached tables.
///
/// Lossy by construction: a missing field, a null and an empty string all
/// encode to an empty cell, and an empty cell always decodes to `None`.
pub struct RecordCodec;

impl RecordCodec {
    /// Encode one upstream record (a JSON object) as a newline-terminated line
    pub fn encode(record: &Value, schema: &CollectionSchema) -> String {
        let mut line = String::new();

        for (i, field) in schema.fields.iter().enumerate() {
            if i > 0 {
                line.push(FIELD_SEPARATOR);
            }
            let text = record.get(&field.name).map(Self::to_text).unwrap_or_default();
            Self::push_cell(&mut line, &text);
        }

        line.push('\n');
        line
    }

    /// Decode one cached line back into a record in schema order
    pub fn decode(line: &str, schema: &CollectionSchema) -> Result<Record> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        let cells: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if cells.len() != schema.len() {
            return Err(Error::malformed_record(
                &schema.name,
                line,
                format!("expected {} columns, found {}", schema.len(), cells.len()),
            ));
        }

        let mut record = Record::with_capacity(cells.len());
        for (field, cell) in schema.fields.iter().zip(cells) {
            let value = if cell.is_empty() { None } else { Some(cell.to_string()) };
            record.add_field(field.name.clone(), value);
        }

        Ok(record)
    }

    /// Render a field value as cell text
    pub fn to_text(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter(|item| !Self::is_blank(item))
                    .map(Self::element_text)
                    .collect();
                parts.join(&MULTI_VALUE_SEPARATOR.to_string())
            }
            other => other.to_string(),
        }
    }

    fn element_text(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),   // Nested arrays/objects as compact JSON
        }
    }

    fn is_blank(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => false,
        }
    }

    // One record per line: separators inside values become spaces
    fn push_cell(line: &mut String, text: &str) {
        line.extend(text.chars().map(|c| match c {
            '\t' | '\n' | '\r' => ' ',
            c => c,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::core::error::ErrorKind;
    use crate::schema::schema::IndexHome;

    fn schema() -> CollectionSchema {
        CollectionSchema::new("orthologs", "_orthologs", IndexHome::Pangenome)
            .add_text_field("id")
            .add_text_field("type")
            .add_text_field("members")
    }

    #[test]
    fn encodes_fields_in_schema_order() {
        let line = RecordCodec::encode(
            &json!({"type": "foo", "id": "X1", "extra": "ignored", "members": ["a", "", "b"]}),
            &schema(),
        );
        assert_eq!(line, "X1\tfoo\ta,b\n");
    }

    #[test]
    fn missing_and_null_encode_empty() {
        let line = RecordCodec::encode(&json!({"id": "X1", "type": null}), &schema());
        assert_eq!(line, "X1\t\t\n");
    }

    #[test]
    fn nested_values_render_as_json() {
        let line = RecordCodec::encode(
            &json!({"id": 7, "type": 0.5, "members": [["g1", 1.0, "ref/1"], null]}),
            &schema(),
        );
        assert_eq!(line, "7\t0.5\t[\"g1\",1.0,\"ref/1\"]\n");
    }

    #[test]
    fn embedded_separators_are_flattened() {
        let line = RecordCodec::encode(&json!({"id": "a\tb", "type": "c\nd"}), &schema());
        assert_eq!(line, "a b\tc d\t\n");
    }

    #[test]
    fn round_trip_collapses_empty_to_absent() {
        let schema = schema();
        let line = RecordCodec::encode(&json!({"id": "X1", "type": "", "members": ["m"]}), &schema);
        let record = RecordCodec::decode(&line, &schema).unwrap();

        assert_eq!(record.get_field("id"), Some("X1"));
        assert_eq!(record.fields[1], ("type".to_string(), None));
        assert_eq!(record.get_field("members"), Some("m"));
    }

    #[test]
    fn wrong_column_count_is_malformed() {
        let err = RecordCodec::decode("only\ttwo\n", &schema()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedRecord);
        assert!(err.context.contains("[only\ttwo]"));
        assert!(err.context.contains("orthologs"));
    }
}
