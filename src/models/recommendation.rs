use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// Field names the recommendation service may use for each logical field.
///
/// Names are tried in order; the first one present on an entry wins.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    pub id: &'static [&'static str],
    pub score: &'static [&'static str],
}

/// The recommendation service reports scores under a localized name ("оценка")
pub const ORACLE_FIELDS: FieldMap = FieldMap {
    id: &["id"],
    score: &["оценка", "score", "rating"],
};

/// One ranked entry returned by the recommendation service
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct RawRecommendation {
    /// Identifier in the service's own id space, not a catalog id
    pub external_id: i64,
    /// Ranking score; unused by normalization
    pub score: f64,
}

impl RawRecommendation {
    pub fn new(external_id: i64, score: f64) -> Self {
        Self { external_id, score }
    }

    /// Decodes one payload entry, accepting numbers or numeric strings
    pub fn from_value(value: &Value, fields: &FieldMap) -> AppResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            AppError::Decode(format!("expected an object, got {}", value))
        })?;

        let external_id = match lookup(object, fields.id) {
            Some((name, raw)) => parse_i64(name, raw)?,
            None => {
                return Err(AppError::Decode(format!(
                    "entry has no identifier field (expected one of {:?})",
                    fields.id
                )))
            }
        };

        let score = match lookup(object, fields.score) {
            Some((name, raw)) => parse_f64(name, raw)?,
            None => 0.0,
        };

        Ok(Self { external_id, score })
    }

    /// Decodes a full response body. Empty and `null` bodies yield no entries.
    pub fn parse_payload(body: &str, fields: &FieldMap) -> AppResult<Vec<Self>> {
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let value: Value = serde_json::from_str(body)
            .map_err(|e| AppError::Decode(format!("invalid JSON: {}", e)))?;

        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(entries) => entries
                .iter()
                .map(|entry| Self::from_value(entry, fields))
                .collect(),
            other => Err(AppError::Decode(format!(
                "expected an array of recommendations, got {}",
                other
            ))),
        }
    }
}

fn lookup<'a>(
    object: &'a Map<String, Value>,
    names: &'static [&'static str],
) -> Option<(&'static str, &'a Value)> {
    names.iter().find_map(|name| {
        object
            .get(*name)
            .filter(|v| !v.is_null())
            .map(|v| (*name, v))
    })
}

fn parse_i64(field: &str, value: &Value) -> AppResult<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| AppError::Decode(format!("field `{}` is not an integer: {}", field, n))),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
            AppError::Decode(format!("field `{}` is not a valid integer: {:?}", field, s))
        }),
        other => Err(AppError::Decode(format!(
            "field `{}` has unexpected type: {}",
            field, other
        ))),
    }
}

fn parse_f64(field: &str, value: &Value) -> AppResult<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| AppError::Decode(format!("field `{}` is not a number: {}", field, n))),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            AppError::Decode(format!("field `{}` is not a valid number: {:?}", field, s))
        }),
        other => Err(AppError::Decode(format!(
            "field `{}` has unexpected type: {}",
            field, other
        ))),
    }
}
