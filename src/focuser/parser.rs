use serde::Deserialize;
use serde_json::Value;

use super::DeviceState;
use super::error::ParseError;

/// Fields recognised in a status response. Each one is optional; anything the
/// firmware adds later is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusReport {
    pub absolute_position: Option<f64>,
    pub min_position: Option<f64>,
    pub max_position: Option<f64>,
    pub uptime: Option<String>,
}

#[derive(Deserialize)]
struct RawStatus {
    #[serde(default, rename = "absolutePosition")]
    absolute_position: Option<Value>,
    #[serde(default, rename = "minPosition")]
    min_position: Option<Value>,
    #[serde(default, rename = "maxPosition")]
    max_position: Option<Value>,
    #[serde(default)]
    uptime: Option<Value>,
}

pub fn parse_status(body: &[u8]) -> Result<StatusReport, ParseError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    if !value.is_object() {
        return Err(ParseError::NotAnObject);
    }
    let raw: RawStatus =
        serde_json::from_value(value).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let report = StatusReport {
        absolute_position: numeric("absolutePosition", raw.absolute_position)?,
        min_position: numeric("minPosition", raw.min_position)?,
        max_position: numeric("maxPosition", raw.max_position)?,
        uptime: raw.uptime.and_then(|v| match v {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        }),
    };

    if let (Some(min), Some(max)) = (report.min_position, report.max_position) {
        if min > max {
            return Err(ParseError::InvalidBounds { min, max });
        }
    }
    Ok(report)
}

/// Numbers are taken as-is; numeric strings are accepted because some
/// firmware builds template the value into the body as text.
fn numeric(field: &'static str, value: Option<Value>) -> Result<Option<f64>, ParseError> {
    let value = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };
    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if f.is_finite() => Ok(Some(f)),
        _ => Err(ParseError::InvalidField {
            field,
            value: value.to_string(),
        }),
    }
}

impl StatusReport {
    /// Overlay the reported fields on `state`, leaving absent ones alone.
    /// Bounds are checked after merging, so a single reported bound cannot
    /// cross the one already held; on error `state` is untouched.
    pub fn apply_to(&self, state: &mut DeviceState) -> Result<(), ParseError> {
        let mut merged = *state;
        if let Some(min) = self.min_position {
            merged.min_position = min;
        }
        if let Some(max) = self.max_position {
            merged.max_position = max;
        }
        if let Some(position) = self.absolute_position {
            merged.absolute_position = position;
        }
        if merged.min_position > merged.max_position {
            return Err(ParseError::InvalidBounds {
                min: merged.min_position,
                max: merged.max_position,
            });
        }
        *state = merged;
        Ok(())
    }
}
