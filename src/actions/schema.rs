//! Declarative extraction schemas and the shared validator.
//!
//! Every action describes its parameters as a static list of
//! [`FieldSpec`]s. The same list drives the JSON Schema handed to the
//! model, the type check of whatever the model returns, and the query
//! string sent upstream with defaults filled in.

use serde_json::{json, Map, Value};

use crate::error::Error;
use crate::Result;

/// Primitive type of an extracted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
}

impl FieldKind {
    /// JSON Schema type name.
    pub fn json_type(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
        }
    }
}

/// Default for an optional field, usable in `const` descriptors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Str(&'static str),
    Int(i64),
    Bool(bool),
}

impl DefaultValue {
    pub fn to_value(&self) -> Value {
        match *self {
            DefaultValue::Str(s) => json!(s),
            DefaultValue::Int(n) => json!(n),
            DefaultValue::Bool(b) => json!(b),
        }
    }
}

/// One named parameter of an action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<DefaultValue>,
    pub description: &'static str,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
            description,
        }
    }

    pub const fn optional(
        name: &'static str,
        kind: FieldKind,
        default: DefaultValue,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: Some(default),
            description,
        }
    }
}

/// Field-name to type/optionality/default mapping for one action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionSchema {
    pub fields: &'static [FieldSpec],
}

/// Parameters that passed validation. Unknown keys are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedParams {
    values: Map<String, Value>,
}

impl ExtractedParams {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ExtractionSchema {
    pub const EMPTY: ExtractionSchema = ExtractionSchema { fields: &[] };

    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// JSON Schema for constrained generation.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in self.fields {
            let mut prop = json!({
                "type": field.kind.json_type(),
                "description": field.description,
            });
            if let Some(default) = field.default {
                prop["default"] = default.to_value();
            }
            properties.insert(field.name.to_string(), prop);
        }

        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Human-readable field list for prompts.
    pub fn describe(&self) -> String {
        self.fields
            .iter()
            .map(|f| {
                let presence = match (f.required, f.default) {
                    (true, _) => "required".to_string(),
                    (false, Some(d)) => format!("optional, default {}", d.to_value()),
                    (false, None) => "optional".to_string(),
                };
                format!(
                    "- {} ({}, {}): {}",
                    f.name,
                    f.kind.json_type(),
                    presence,
                    f.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Type-check a candidate object.
    ///
    /// Required fields must be present and correctly typed. Optional
    /// fields may be absent or null, otherwise they must be correctly
    /// typed too. Every problem is reported, not just the first.
    pub fn validate(&self, candidate: &Value) -> Result<ExtractedParams> {
        let Some(obj) = candidate.as_object() else {
            return Err(Error::InvalidExtraction {
                problems: vec![format!("expected an object, got {}", type_name(candidate))],
            });
        };

        let mut problems = Vec::new();
        let mut values = Map::new();

        for field in self.fields {
            match obj.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        problems.push(format!("missing required field '{}'", field.name));
                    }
                }
                Some(value) if field.kind.matches(value) => {
                    values.insert(field.name.to_string(), value.clone());
                }
                Some(value) => problems.push(format!(
                    "field '{}' should be a {}, got {}",
                    field.name,
                    field.kind.json_type(),
                    type_name(value)
                )),
            }
        }

        if problems.is_empty() {
            Ok(ExtractedParams { values })
        } else {
            Err(Error::InvalidExtraction { problems })
        }
    }

    /// Extracted values with declared defaults filled in, in schema order.
    pub fn resolve(&self, params: &ExtractedParams) -> Vec<(&'static str, Value)> {
        self.fields
            .iter()
            .filter_map(|f| {
                params
                    .get(f.name)
                    .cloned()
                    .or_else(|| f.default.map(|d| d.to_value()))
                    .map(|v| (f.name, v))
            })
            .collect()
    }

    /// Query-string pairs for the upstream request.
    pub fn query_params(&self, params: &ExtractedParams) -> Vec<(&'static str, String)> {
        self.resolve(params)
            .into_iter()
            .map(|(name, value)| (name, render_query_value(&value)))
            .collect()
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

/// Render a JSON scalar the way it appears in a query string.
///
/// Integral floats (a model answering `10.0`) render without the
/// fractional part.
pub fn render_query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => (f as i64).to_string(),
                    Some(f) => f.to_string(),
                    None => n.to_string(),
                }
            }
        }
        other => other.to_string(),
    }
}
