//! Network infrastructure: implements `NetworkProbe` with a bounded TCP dial.

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

use crate::application::ports::NetworkProbe;
use crate::domain::ApplianceError;
use crate::domain::endpoint::join_host_port;

/// Upper bound on a single reachability dial.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Production implementation that performs real network checks.
pub struct TokioNetworkProbe;

impl NetworkProbe for TokioNetworkProbe {
    async fn check_tcp_connectivity(&self, host: &str, port: u16) -> Result<bool, ApplianceError> {
        let addr = join_host_port(host, port);
        match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr)).await {
            Ok(Ok(_stream)) => Ok(true),
            Ok(Err(e)) => {
                debug!(%addr, error = %e, "tcp dial failed");
                Ok(false)
            }
            Err(_) => {
                debug!(%addr, "tcp dial timed out");
                Ok(false)
            }
        }
    }
}
