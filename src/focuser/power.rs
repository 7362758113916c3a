use std::time::Duration;

use tracing::{info, warn};

use crate::config::FocuserConfig;
use crate::transport::DeviceTransport;

/// Remote off/on toggle of the focuser's supply, used to recover hung
/// firmware before a move is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerCycler {
    /// Wait between power-off and power-on.
    pub settle_delay: Duration,
    /// Wait after power-on for the microcontroller and its network stack.
    pub boot_delay: Duration,
    /// Timeout for each switch request.
    pub request_timeout: Duration,
}

impl Default for PowerCycler {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(3),
            boot_delay: Duration::from_secs(12),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl PowerCycler {
    /// Best effort: returns whether both switch requests succeeded, but the
    /// caller retries regardless. Without any power URL configured nothing
    /// is sent and no time is spent waiting.
    pub async fn cycle<T: DeviceTransport + ?Sized>(
        &self,
        transport: &T,
        config: &FocuserConfig,
    ) -> bool {
        if !config.can_power_cycle() {
            warn!("No power switch URLs configured, skipping power cycle");
            return false;
        }

        info!("Power cycling focuser");
        let off = self
            .switch(transport, "off", config.power_off_url.as_deref())
            .await;
        tokio::time::sleep(self.settle_delay).await;

        let on = self
            .switch(transport, "on", config.power_on_url.as_deref())
            .await;
        info!("Waiting {:?} for focuser to boot", self.boot_delay);
        tokio::time::sleep(self.boot_delay).await;

        off && on
    }

    async fn switch<T: DeviceTransport + ?Sized>(
        &self,
        transport: &T,
        label: &str,
        url: Option<&str>,
    ) -> bool {
        let Some(url) = url else {
            warn!("Power-{} URL not configured", label);
            return false;
        };
        match transport.get(url, self.request_timeout).await {
            Ok(_) => {
                info!("Power-{} request sent to {}", label, url);
                true
            }
            Err(e) => {
                warn!("Power-{} request failed: {}", label, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{MockTransport, unreachable};
    use tokio::time::Instant;

    fn config() -> FocuserConfig {
        let mut config = FocuserConfig::new("http://h/focuser");
        config.power_off_url = Some("http://relay/off".into());
        config.power_on_url = Some("http://relay/on".into());
        config
    }

    #[tokio::test(start_paused = true)]
    async fn sends_off_then_on_with_delays() {
        let transport = MockTransport::new();
        let cycler = PowerCycler::default();
        let start = Instant::now();

        assert!(cycler.cycle(&transport, &config()).await);

        assert_eq!(transport.urls(), vec!["http://relay/off", "http://relay/on"]);
        assert!(start.elapsed() >= Duration::from_secs(15));
        assert!(
            transport
                .calls()
                .iter()
                .all(|(_, timeout)| *timeout == cycler.request_timeout)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_switch_is_reported_but_sequence_completes() {
        let transport =
            MockTransport::new().script("http://relay/off", [Err(unreachable("http://relay/off"))]);
        let cycler = PowerCycler::default();

        assert!(!cycler.cycle(&transport, &config()).await);
        assert_eq!(transport.urls(), vec!["http://relay/off", "http://relay/on"]);
    }

    #[tokio::test(start_paused = true)]
    async fn skipped_without_power_urls() {
        let transport = MockTransport::new();
        let start = Instant::now();

        let cycled = PowerCycler::default()
            .cycle(&transport, &FocuserConfig::new("http://h/focuser"))
            .await;

        assert!(!cycled);
        assert!(transport.calls().is_empty());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
