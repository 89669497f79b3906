use std::time::Duration;

use tracing::{debug, warn};

use crate::core::HealthStatus;
use crate::error::TransportError;
use crate::transport::{HttpTransport, endpoint};

pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// `GET {base_url}/health`. Only a 2xx status counts as reachable.
pub fn check_health(
    transport: &dyn HttpTransport,
    base_url: &str,
    timeout: Duration,
) -> Result<HealthStatus, TransportError> {
    let url = endpoint(base_url, "health");
    debug!(%url, ?timeout, "probing service health");

    let reply = transport.get(&url, timeout).inspect_err(|err| {
        warn!(%url, kind = %err.kind, "health probe failed: {}", err.message);
    })?;

    if !reply.is_success() {
        warn!(%url, status = reply.status, "health probe returned non-2xx status");
        return Err(TransportError::status(url, reply.status));
    }

    Ok(HealthStatus::reachable_from_body(&reply.body))
}
