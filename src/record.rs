//! Input records and their validation.
//!
//! Raw entries arrive as untyped JSON. Each one is validated once into an
//! [`Entry`]; everything downstream consumes the typed shape.

use crate::config::InputSettings;
use crate::error::{KartkaError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A validated vocabulary entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Unique note identifier.
    pub id: String,
    /// Source-language word or phrase.
    pub source_text: String,
    /// Target-language translation.
    pub target_text: String,
    /// Example sentences, in authored order.
    pub examples: Vec<String>,
    /// Prerecorded audio files to attach as-is (no synthesis).
    pub recordings: Vec<PathBuf>,
}

impl Entry {
    pub fn new(
        id: impl Into<String>,
        source_text: impl Into<String>,
        target_text: impl Into<String>,
        examples: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_text: source_text.into(),
            target_text: target_text.into(),
            examples,
            recordings: Vec::new(),
        }
    }
}

/// Validate one raw JSON entry.
///
/// No coercion is attempted: a number where a string is expected, or a
/// scalar where the examples list is expected, is a hard error naming the
/// offending field.
pub fn validate(raw: &Value, fields: &InputSettings) -> Result<Entry> {
    let object = raw.as_object().ok_or_else(|| {
        KartkaError::validation("<entry>", format!("Entry is not an object: {}", raw))
    })?;

    let id = required_string(object, &fields.id_field)?;
    check_id(&id).map_err(|message| KartkaError::validation(&fields.id_field, message))?;
    let source_text = required_string(object, &fields.source_field)
        .map_err(|e| in_entry(e, &id))?;
    let target_text = required_string(object, &fields.target_field)
        .map_err(|e| in_entry(e, &id))?;

    let examples = match object.get(&fields.examples_field) {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(KartkaError::validation(
                    &fields.examples_field,
                    format!("Example {} of entry {} is not a string: {}", i, id, other),
                )),
            })
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(KartkaError::validation(
                &fields.examples_field,
                format!("Examples of entry {} is not a list: {}", id, other),
            ))
        }
        None => {
            return Err(KartkaError::validation(
                &fields.examples_field,
                format!("Examples of entry {} is missing", id),
            ))
        }
    };

    Ok(Entry {
        id,
        source_text,
        target_text,
        examples,
        recordings: Vec::new(),
    })
}

/// Ids become part of audio file names and `[sound:...]` references, so
/// they must be a single plain path segment.
fn check_id(id: &str) -> std::result::Result<(), String> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(format!("Invalid id {:?}", id));
    }
    match id.chars().find(|c| matches!(c, '/' | '\\' | '\0' | ']')) {
        Some(c) => Err(format!("Id {:?} contains forbidden character {:?}", id, c)),
        None => Ok(()),
    }
}

fn required_string(object: &serde_json::Map<String, Value>, field: &str) -> Result<String> {
    match object.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(KartkaError::validation(
            field,
            format!("Expected a string, got {}", other),
        )),
        None => Err(KartkaError::validation(field, "Field is missing")),
    }
}

fn in_entry(err: KartkaError, id: &str) -> KartkaError {
    match err {
        KartkaError::Validation { field, message } => KartkaError::Validation {
            field,
            message: format!("{} (entry {})", message, id),
        },
        other => other,
    }
}

/// Read the input file as an ordered list of raw entries.
pub fn load_entries(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path).map_err(|e| KartkaError::io(path, e))?;
    let data: Value = serde_json::from_str(&content)?;

    match data {
        Value::Array(entries) => {
            debug!("Loaded {} raw entries from {:?}", entries.len(), path);
            Ok(entries)
        }
        other => Err(KartkaError::validation(
            "<root>",
            format!("Input must be a JSON array of entries, got {}", type_name(&other)),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
