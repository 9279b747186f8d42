//! Declared output schemas for structured extraction.
//!
//! The extraction service is asked for "a single JSON object with exactly
//! these fields". [`OutputSchema`] is the provider-neutral description of
//! that object; each provider turns it into whatever its API expects (a
//! strict JSON Schema for Azure OpenAI) and the answer is checked against it
//! before it is deserialised into the target type.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Primitive type of one schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Boolean,
}

impl FieldKind {
    /// JSON Schema `type` keyword for this kind.
    pub fn json_type(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Boolean => value.is_boolean(),
        }
    }
}

/// One named field of an [`OutputSchema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
}

/// A flat object schema: field name → primitive type. All fields required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSchema {
    /// Schema name sent to the service (letters, digits, `_` and `-`).
    pub name: String,
    pub fields: Vec<SchemaField>,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a required field.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(SchemaField {
            name: name.into(),
            kind,
        });
        self
    }

    /// Render as a strict JSON Schema object: every field required, no
    /// additional properties.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for f in &self.fields {
            properties.insert(f.name.clone(), json!({ "type": f.kind.json_type() }));
        }
        let required: Vec<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Check that `value` is an object with exactly the declared fields, each
    /// of the declared type.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        let obj = value
            .as_object()
            .ok_or_else(|| format!("expected a JSON object, got {}", type_name(value)))?;

        for f in &self.fields {
            match obj.get(&f.name) {
                None => return Err(format!("missing field '{}'", f.name)),
                Some(v) if !f.kind.matches(v) => {
                    return Err(format!(
                        "field '{}' should be {}, got {}",
                        f.name,
                        f.kind.json_type(),
                        type_name(v)
                    ))
                }
                Some(_) => {}
            }
        }

        if let Some(extra) = obj
            .keys()
            .find(|k| !self.fields.iter().any(|f| &f.name == *k))
        {
            return Err(format!("unexpected field '{}'", extra));
        }

        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A record type that can be requested from a structured-extraction service.
pub trait ExtractionTarget: DeserializeOwned + Serialize {
    fn schema() -> OutputSchema;
}

/// The three answers pulled from a customer account statement.
///
/// Serialises with the exact key names and order of the output artifact:
/// `customerName`, `accountNumber`, `balanceUSD`. The balance stays a string;
/// no currency parsing is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountSummary {
    #[serde(rename = "customerName")]
    pub customer_name: String,
    #[serde(rename = "accountNumber")]
    pub account_number: String,
    #[serde(rename = "balanceUSD")]
    pub balance_usd: String,
}

impl ExtractionTarget for AccountSummary {
    fn schema() -> OutputSchema {
        OutputSchema::new("ExtractedAnswers")
            .field("customerName", FieldKind::String)
            .field("accountNumber", FieldKind::String)
            .field("balanceUSD", FieldKind::String)
    }
}
