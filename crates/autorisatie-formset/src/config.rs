//! Props accepted by the formset at its JSON boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rows::RowData;

/// Management counters handed over by the server-side formset.
///
/// Field names on the wire match the management form verbatim. Counts are
/// unsigned, so a negative or non-integer count is rejected while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSetConfig {
    pub prefix: String,
    #[serde(rename = "INITIAL_FORMS")]
    pub initial_forms: u32,
    #[serde(rename = "TOTAL_FORMS")]
    pub total_forms: u32,
    #[serde(rename = "MIN_NUM_FORMS")]
    pub min_num_forms: u32,
    #[serde(rename = "MAX_NUM_FORMS")]
    pub max_num_forms: u32,
}

impl FormSetConfig {
    pub fn new(
        prefix: impl Into<String>,
        initial_forms: u32,
        total_forms: u32,
        min_num_forms: u32,
        max_num_forms: u32,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            initial_forms,
            total_forms,
            min_num_forms,
            max_num_forms,
        }
    }

    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(input).map_err(ConfigError::Config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid formset config: {0}")]
    Config(#[source] serde_json::Error),
    #[error("invalid form data: {0}")]
    FormData(#[source] serde_json::Error),
    #[error("form data must be an array, found {found}")]
    FormDataNotArray { found: &'static str },
    #[error("form data row {index} must be an object, found {found}")]
    RowNotObject { index: usize, found: &'static str },
}

/// Everything the formset needs at mount.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSetProps {
    pub config: FormSetConfig,
    pub form_data: Vec<RowData>,
}

impl FormSetProps {
    pub fn new(config: FormSetConfig, form_data: Vec<RowData>) -> Self {
        Self { config, form_data }
    }

    /// Parse both props from their JSON text.
    pub fn from_json(config: &str, form_data: &str) -> Result<Self, ConfigError> {
        let config = FormSetConfig::from_json(config)?;
        let form_data: Value = serde_json::from_str(form_data).map_err(ConfigError::FormData)?;
        Ok(Self {
            config,
            form_data: rows_from_value(form_data)?,
        })
    }

    pub fn from_value(config: Value, form_data: Value) -> Result<Self, ConfigError> {
        let config = serde_json::from_value(config).map_err(ConfigError::Config)?;
        Ok(Self {
            config,
            form_data: rows_from_value(form_data)?,
        })
    }
}

fn rows_from_value(value: Value) -> Result<Vec<RowData>, ConfigError> {
    let Value::Array(items) = value else {
        return Err(ConfigError::FormDataNotArray {
            found: json_kind(&value),
        });
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(row) => Ok(row),
            other => Err(ConfigError::RowNotObject {
                index,
                found: json_kind(&other),
            }),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
