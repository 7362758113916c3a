//! Motion-control core for a network-attached telescope focuser.
//!
//! The focuser firmware exposes a single HTTP/JSON endpoint. A host (the
//! astronomy-software shell) builds a [`focuser::MotionController`] once,
//! hands it a [`config::FocuserConfig`] and a [`transport::DeviceTransport`],
//! and then drives it with connect / absolute / relative move requests.

pub mod config;
pub mod focuser;
pub mod transport;

pub use config::{ApproachDirection, FocuserConfig};
pub use focuser::{
    ConnectError, DeviceState, Direction, MotionController, MoveError, MovePhase, MoveResult,
    MoveStatus, ParseError, PowerCycler,
};
pub use transport::http::HttpTransport;
pub use transport::{DeviceTransport, TransportError};
