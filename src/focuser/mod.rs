pub mod controller;
pub mod error;
pub mod parser;
pub mod power;

pub use controller::MotionController;
pub use error::{ConnectError, MoveError, ParseError};
pub use parser::StatusReport;
pub use power::PowerCycler;

use serde::Serialize;

/// Last known position and travel limits, in device ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviceState {
    pub absolute_position: f64,
    pub min_position: f64,
    pub max_position: f64,
}

impl DeviceState {
    /// State assumed before the first connect: the configured static range,
    /// parked in the middle of it.
    pub fn with_range(min_position: f64, max_position: f64) -> Self {
        Self {
            absolute_position: min_position + (max_position - min_position) / 2.0,
            min_position,
            max_position,
        }
    }

    pub fn contains(&self, ticks: f64) -> bool {
        self.min_position <= ticks && ticks <= self.max_position
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inward,
    Outward,
}

impl Direction {
    pub fn sign(&self) -> i64 {
        match self {
            Self::Inward => -1,
            Self::Outward => 1,
        }
    }
}

/// Progress of a single move request. `Rejected`, `Succeeded` and `Failed`
/// are terminal. The range check and the switch from a failed first attempt
/// to power cycling happen without awaiting, so neither gets a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePhase {
    Idle,
    Rejected,
    Sending,
    PowerCycling,
    RetrySending,
    Succeeded,
    Failed,
}

impl MovePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Succeeded | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    Ok,
    Alert,
}

/// What the host gets back from a move: terminal status, the position the
/// controller now believes in, and the reason when the status is `Alert`.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveResult {
    pub status: MoveStatus,
    pub position: f64,
    pub error: Option<MoveError>,
}

impl MoveResult {
    pub(crate) fn ok(position: f64) -> Self {
        Self {
            status: MoveStatus::Ok,
            position,
            error: None,
        }
    }

    pub(crate) fn alert(position: f64, error: MoveError) -> Self {
        Self {
            status: MoveStatus::Alert,
            position,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == MoveStatus::Ok
    }

    /// The device may be somewhere other than `position`; re-connect before
    /// trusting relative moves again.
    pub fn position_unknown(&self) -> bool {
        matches!(self.error, Some(MoveError::PositionUnknown { .. }))
    }
}
