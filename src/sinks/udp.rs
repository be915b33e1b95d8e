use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::{debug, instrument, trace};

use crate::AlertEvent;
use crate::config::ForwardConfig;
use crate::error::{MonitorError, MonitorResult};

use super::{AlertSink, SEVERITY};

/// Pushes alerts as single datagrams to a log collector.
///
/// Fire-and-forget: send failures are logged at debug level and never
/// surface as errors, and nothing is retried.
pub struct UdpSink {
    socket: UdpSocket,
    target: SocketAddr,
    timeout: Duration,
}

impl UdpSink {
    /// Resolve the collector address and bind a local socket for it.
    pub async fn connect(config: &ForwardConfig, timeout: Duration) -> MonitorResult<Self> {
        let target = tokio::net::lookup_host((config.host.as_str(), config.port))
            .await
            .map_err(|e| {
                MonitorError::config_invalid(format!("cannot resolve {}: {e}", config.host))
            })?
            .next()
            .ok_or_else(|| {
                MonitorError::config_invalid(format!("no address found for {}", config.host))
            })?;

        let bind_addr: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| MonitorError::config_invalid(format!("cannot bind UDP socket: {e}")))?;

        debug!("forwarding alerts to udp://{target}");

        Ok(Self {
            socket,
            target,
            timeout,
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// `WARNING leaf1 google-dns 8.8.8.8 150.000000 ...`
    pub fn format_payload(event: &AlertEvent) -> String {
        format!("{SEVERITY} {}", event.record())
    }
}

#[async_trait]
impl AlertSink for UdpSink {
    #[instrument(skip_all, fields(target = %self.target))]
    async fn emit(&self, event: &AlertEvent) -> MonitorResult<()> {
        let payload = Self::format_payload(event);

        match tokio::time::timeout(self.timeout, self.socket.send_to(payload.as_bytes(), self.target))
            .await
        {
            Ok(Ok(sent)) => trace!("forwarded {sent} bytes"),
            Ok(Err(e)) => debug!("dropping forwarded alert: {e}"),
            Err(_) => debug!("dropping forwarded alert: send timed out"),
        }

        Ok(())
    }
}
