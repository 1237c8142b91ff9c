use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode};
use ipnetwork::IpNetwork;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_governor::GovernorError;
use tower_governor::key_extractor::KeyExtractor;

/// Token bucket for one tier of routes, expressed the way the governor layer consumes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quota {
    pub replenish_every_ns: u64,
    pub burst: u32,
}

impl Quota {
    /// Rates are clamped to 1..=1e9 per second and bursts to at least 1, so the layer always builds.
    #[must_use]
    pub fn per_second(rate: u32, burst: u32) -> Self {
        let rate = rate.clamp(1, 1_000_000_000);
        Self { replenish_every_ns: u64::from(1_000_000_000 / rate), burst: burst.max(1) }
    }
}

/// Rate-limit key: the caller's address as seen past our own proxies.
///
/// `X-Forwarded-For` is only read when the socket peer is a trusted proxy; the client is then
/// the rightmost hop that is not one.
#[derive(Clone, Debug)]
pub struct ClientIpKey {
    proxies: Arc<[IpNetwork]>,
}

impl ClientIpKey {
    #[must_use]
    pub fn new(proxies: Vec<IpNetwork>) -> Self {
        Self { proxies: proxies.into() }
    }

    #[must_use]
    pub fn client_ip(&self, headers: &HeaderMap, peer: IpAddr) -> IpAddr {
        if !self.is_proxy(peer) {
            return peer;
        }

        let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) else {
            return peer;
        };
        for hop in forwarded.rsplit(',') {
            match hop.trim().parse::<IpAddr>() {
                Ok(ip) if !self.is_proxy(ip) => return ip,
                _ => {}
            }
        }
        peer
    }

    fn is_proxy(&self, ip: IpAddr) -> bool {
        self.proxies.iter().any(|net| net.contains(ip))
    }
}

impl KeyExtractor for ClientIpKey {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let ConnectInfo(peer) =
            req.extensions().get::<ConnectInfo<SocketAddr>>().ok_or(GovernorError::UnableToExtractKey)?;
        Ok(self.client_ip(req.headers(), peer.ip()))
    }
}

/// Shared by both rate-limit tiers: the client key and the decision counter.
#[derive(Clone, Debug)]
pub struct RateLimitService {
    pub client_key: ClientIpKey,
    decisions: Counter<u64>,
}

impl RateLimitService {
    #[must_use]
    pub fn new(trusted_proxies: Vec<IpNetwork>) -> Self {
        let decisions = global::meter("alertdavao-server")
            .u64_counter("alertdavao_rate_limit_decisions_total")
            .with_description("Requests let through or throttled by the rate limiter")
            .build();
        Self { client_key: ClientIpKey::new(trusted_proxies), decisions }
    }

    /// Counts the limiter's verdict for a finished response and warns on throttling.
    pub fn record(&self, status: StatusCode, retry_after: Option<&str>) {
        let throttled = status == StatusCode::TOO_MANY_REQUESTS;
        if throttled {
            tracing::warn!(retry_after_secs = retry_after.unwrap_or("unknown"), "Request throttled");
        }
        let outcome = if throttled { "throttled" } else { "allowed" };
        self.decisions.add(1, &[KeyValue::new("outcome", outcome)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ClientIpKey {
        ClientIpKey::new(vec!["10.0.0.0/8".parse().unwrap(), "127.0.0.1/32".parse().unwrap()])
    }

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", value.parse().unwrap());
        headers
    }

    #[test]
    fn test_direct_client_cannot_spoof_forwarded_for() {
        let peer: IpAddr = "203.0.113.9".parse().unwrap();
        assert_eq!(key().client_ip(&forwarded("1.2.3.4"), peer), peer);
    }

    #[test]
    fn test_proxy_chain_resolves_rightmost_outside_hop() {
        let peer: IpAddr = "127.0.0.1".parse().unwrap();
        let headers = forwarded("192.0.2.1, 198.51.100.7, garbage, 10.1.1.1");
        assert_eq!(key().client_ip(&headers, peer), "198.51.100.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_proxy_without_outside_hop_keys_on_peer() {
        let peer: IpAddr = "10.0.0.2".parse().unwrap();
        assert_eq!(key().client_ip(&forwarded("10.0.0.3"), peer), peer);
        assert_eq!(key().client_ip(&HeaderMap::new(), peer), peer);
    }

    #[test]
    fn test_quota_never_degenerates() {
        assert_eq!(Quota::per_second(10, 20), Quota { replenish_every_ns: 100_000_000, burst: 20 });
        assert_eq!(Quota::per_second(0, 0), Quota { replenish_every_ns: 1_000_000_000, burst: 1 });
        assert_eq!(Quota::per_second(u32::MAX, 5).replenish_every_ns, 1);
    }
}
