use crate::config::ConfigError;
use crate::transport::TransportError;

/// The device answered, but the status body is unusable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("status response is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("status response is not a JSON object")]
    NotAnObject,
    #[error("field '{field}' is not numeric: {value}")]
    InvalidField { field: &'static str, value: String },
    #[error("reported bounds are inverted: min {min} > max {max}")]
    InvalidBounds { min: f64, max: f64 },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectError {
    #[error("focuser unreachable: {0}")]
    Transport(#[from] TransportError),
    #[error("focuser replied with an unusable status: {0}")]
    Parse(#[from] ParseError),
    #[error("invalid focuser config: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MoveError {
    #[error("requested position {target} is outside the range [{min}, {max}]")]
    RangeViolation { target: f64, min: f64, max: f64 },
    #[error("move to {target} failed after power cycle, position unknown (last known {last_known}): {source}")]
    PositionUnknown {
        target: i64,
        last_known: f64,
        #[source]
        source: TransportError,
    },
}
