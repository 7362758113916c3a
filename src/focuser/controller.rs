use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::error::{ConnectError, MoveError};
use super::parser::parse_status;
use super::power::PowerCycler;
use super::{DeviceState, Direction, MovePhase, MoveResult};
use crate::config::{ConfigError, FocuserConfig};
use crate::transport::DeviceTransport;

/// Timeout for the status query issued on connect.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for a move command; longer than a full-range traversal.
pub const MOVE_TIMEOUT: Duration = Duration::from_secs(40);

/// Owns the focuser's position and turns move requests into device commands.
///
/// Every operation takes `&mut self`, so a single controller can only run one
/// command at a time. Hosts that share it between threads must wrap it in a
/// mutex themselves.
pub struct MotionController<T> {
    config: FocuserConfig,
    transport: T,
    power: PowerCycler,
    state: DeviceState,
    phase: MovePhase,
    connected: bool,
    position_verified: bool,
}

impl<T: DeviceTransport> MotionController<T> {
    pub fn new(config: FocuserConfig, transport: T) -> Self {
        let state = DeviceState::with_range(config.min_position, config.max_position);
        Self::with_state(config, transport, state)
    }

    /// Start from a known state, e.g. one restored by the host.
    pub fn with_state(config: FocuserConfig, transport: T, state: DeviceState) -> Self {
        Self {
            config,
            transport,
            power: PowerCycler::default(),
            state,
            phase: MovePhase::Idle,
            connected: false,
            position_verified: false,
        }
    }

    pub fn with_power_cycler(mut self, power: PowerCycler) -> Self {
        self.power = power;
        self
    }

    pub fn config(&self) -> &FocuserConfig {
        &self.config
    }

    /// Replace the configuration between moves. Bounds already reported by
    /// the device are kept. An invalid config is refused and the current one
    /// stays in place.
    pub fn update_config(&mut self, config: FocuserConfig) -> Result<(), ConfigError> {
        config
            .validate()
            .inspect_err(|e| warn!("Rejected focuser config: {}", e))?;
        info!(
            "Focuser config updated: endpoint={}, backlash={}, approach='{}'",
            config.endpoint, config.backlash_steps, config.always_approach
        );
        if !self.connected {
            self.state.min_position = config.min_position;
            self.state.max_position = config.max_position;
        }
        self.config = config;
        Ok(())
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn position(&self) -> f64 {
        self.state.absolute_position
    }

    /// Phase reached by the most recent move request. Once a move returns
    /// this is terminal; a non-terminal phase means the move's future was
    /// dropped while it was in that phase.
    pub fn phase(&self) -> MovePhase {
        self.phase
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// False after a move failed even after a power cycle, until the next
    /// successful connect.
    pub fn is_position_verified(&self) -> bool {
        self.position_verified
    }

    /// Query the device once and refresh position and bounds from its
    /// status response. No retry and no power cycle happen here.
    pub async fn connect(&mut self) -> Result<DeviceState, ConnectError> {
        info!("Connecting to focuser at {}", self.config.endpoint);

        let body = self
            .transport
            .get(&self.config.endpoint, CONNECT_TIMEOUT)
            .await
            .inspect_err(|e| error!("Connection to focuser failed: {}", e))?;

        let report =
            parse_status(&body).inspect_err(|e| error!("Focuser status unusable: {}", e))?;
        if let Some(uptime) = &report.uptime {
            debug!("Focuser uptime {}", uptime);
        }

        report
            .apply_to(&mut self.state)
            .inspect_err(|e| error!("Focuser status unusable: {}", e))?;
        self.connected = true;
        self.position_verified = true;
        info!(
            "Connected: position={} range=[{}, {}]",
            self.state.absolute_position, self.state.min_position, self.state.max_position
        );
        Ok(self.state)
    }

    /// Install `config` and connect with it, for hosts that hand over the
    /// configuration at connect time.
    pub async fn connect_with(
        &mut self,
        config: FocuserConfig,
    ) -> Result<DeviceState, ConnectError> {
        self.update_config(config)?;
        self.connect().await
    }

    pub fn disconnect(&mut self) {
        info!("Disconnecting from focuser at {}", self.config.endpoint);
        self.connected = false;
    }

    /// Operator-requested power cycle. The position is unverified afterwards.
    pub async fn power_cycle(&mut self) -> bool {
        self.position_verified = false;
        self.power.cycle(&self.transport, &self.config).await
    }

    pub async fn move_absolute(&mut self, target: i64) -> MoveResult {
        if !self.state.contains(target as f64) {
            return self.reject(target as f64);
        }

        let url = self.config.move_url(target);
        info!("Focuser is moving to {}", target);

        self.phase = MovePhase::Sending;
        let first = match self.transport.get(&url, MOVE_TIMEOUT).await {
            Ok(_) => return self.finish_move(target),
            Err(e) => e,
        };

        warn!("Move command failed: {}. Power cycling and retrying once", first);

        self.phase = MovePhase::PowerCycling;
        if !self.power.cycle(&self.transport, &self.config).await {
            warn!("Power cycle did not complete cleanly, retrying anyway");
        }

        self.phase = MovePhase::RetrySending;
        match self.transport.get(&url, MOVE_TIMEOUT).await {
            Ok(_) => {
                info!("Move succeeded after power cycle");
                self.finish_move(target)
            }
            Err(source) => {
                self.phase = MovePhase::Failed;
                self.position_verified = false;
                let err = MoveError::PositionUnknown {
                    target,
                    last_known: self.state.absolute_position,
                    source,
                };
                error!("{}", err);
                MoveResult::alert(self.state.absolute_position, err)
            }
        }
    }

    /// Translate to an absolute target and delegate; range checking lives
    /// only in [`Self::move_absolute`].
    pub async fn move_relative(&mut self, direction: Direction, ticks: u32) -> MoveResult {
        let current = self.state.absolute_position.round();
        let target = current + f64::from(ticks) * direction.sign() as f64;
        debug!(
            "Relative move {:?} by {} from {} -> {}",
            direction, ticks, current, target
        );
        match as_ticks(target) {
            Some(target) => self.move_absolute(target).await,
            None => self.reject(target),
        }
    }

    fn reject(&mut self, target: f64) -> MoveResult {
        self.phase = MovePhase::Rejected;
        let err = MoveError::RangeViolation {
            target,
            min: self.state.min_position,
            max: self.state.max_position,
        };
        warn!("{}", err);
        MoveResult::alert(self.state.absolute_position, err)
    }

    fn finish_move(&mut self, target: i64) -> MoveResult {
        // The move response carries no position; trust the commanded one.
        self.state.absolute_position = target as f64;
        self.phase = MovePhase::Succeeded;
        info!("Focuser reached {}", target);
        MoveResult::ok(self.state.absolute_position)
    }
}

/// Whole ticks the firmware can be commanded to; `None` past the `i64` range.
fn as_ticks(target: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper check is exclusive.
    if target.is_finite() && target >= i64::MIN as f64 && target < i64::MAX as f64 {
        Some(target as i64)
    } else {
        None
    }
}
