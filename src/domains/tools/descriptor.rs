//! Tool descriptor: the metadata a tool package declares in `tool.json`.

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::ToolError;

/// Keys every descriptor must carry as non-empty strings.
pub const REQUIRED_KEYS: [&str; 4] = ["name", "description", "category", "icon"];

/// Immutable metadata for one discovered tool.
///
/// Built once per discovery pass by [`ToolDescriptor::from_value`]; a refresh
/// replaces the whole registry rather than editing descriptors in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    category: String,
    icon: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,

    /// Front-end script references. Absolute URLs, or paths relative to the
    /// tool's asset directory, possibly containing glob wildcards.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    imports: Vec<String>,

    /// Named sub-views, in declaration order, without duplicates.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    panels: Vec<String>,

    /// Any other keys the tool declared (author, endpoints, ...).
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ToolDescriptor {
    /// Validate a raw JSON value and build a descriptor from it.
    pub fn from_value(value: Value) -> Result<Self, ToolError> {
        let Value::Object(mut map) = value else {
            return Err(ToolError::invalid_descriptor(
                "descriptor must be a JSON object",
            ));
        };

        let [name, description, category, icon] =
            REQUIRED_KEYS.map(|key| take_required(&mut map, key));

        Ok(Self {
            name: name?,
            description: description?,
            category: category?,
            icon: icon?,
            version: take_optional_string(&mut map, "version")?,
            imports: take_string_list(&mut map, "imports")?,
            panels: dedup(take_string_list(&mut map, "panels")?),
            extra: map,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn panels(&self) -> &[String] {
        &self.panels
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

fn take_required(map: &mut Map<String, Value>, key: &str) -> Result<String, ToolError> {
    match map.remove(key) {
        None => Err(ToolError::invalid_descriptor(format!(
            "missing required key '{key}'"
        ))),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(_) => Err(ToolError::invalid_descriptor(format!(
            "'{key}' must be a non-empty string"
        ))),
    }
}

fn take_optional_string(
    map: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<String>, ToolError> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ToolError::invalid_descriptor(format!(
            "'{key}' must be a string"
        ))),
    }
}

fn take_string_list(map: &mut Map<String, Value>, key: &str) -> Result<Vec<String>, ToolError> {
    let items = match map.remove(key) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ToolError::invalid_descriptor(format!(
                "'{key}' must be a list of strings"
            )));
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            _ => Err(ToolError::invalid_descriptor(format!(
                "'{key}' must be a list of strings"
            ))),
        })
        .collect()
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(items.len());
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}
