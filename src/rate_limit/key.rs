//! Deriving the client key a request is counted against.

use axum::extract::ConnectInfo;
use http::header::{HeaderName, HeaderValue};
use http::Request;
use std::net::{IpAddr, SocketAddr};

/// Shared key for requests no extractor could attribute to a client.
pub const UNKNOWN_CLIENT: &str = "unknown";

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Pulls a client key out of a request.
pub trait KeyExtractor: Clone + Send + Sync + 'static {
    /// `None` when the request carries nothing to key on.
    fn extract<B>(&self, req: &Request<B>) -> Option<String>;
}

/// Keys requests by caller IP (port stripped).
///
/// By default only the socket peer address is used, read from axum's
/// `ConnectInfo<SocketAddr>` extension. Behind a reverse proxy every request
/// would share the proxy's address, so [`PeerIp::behind_proxy`] consults
/// `X-Forwarded-For` (first hop) and then `X-Real-IP` before falling back to
/// the peer address. Only enable it when a trusted proxy sets those headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeerIp {
    trust_forwarded: bool,
}

impl PeerIp {
    /// Socket peer address only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer proxy-supplied forwarding headers.
    pub fn behind_proxy() -> Self {
        Self { trust_forwarded: true }
    }

    fn forwarded<B>(req: &Request<B>) -> Option<IpAddr> {
        let headers = req.headers();
        headers
            .get(X_FORWARDED_FOR)
            .and_then(first_hop)
            .or_else(|| headers.get(X_REAL_IP).and_then(parse_ip))
    }
}

impl KeyExtractor for PeerIp {
    fn extract<B>(&self, req: &Request<B>) -> Option<String> {
        let forwarded = if self.trust_forwarded { Self::forwarded(req) } else { None };
        forwarded
            .or_else(|| {
                req.extensions().get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| addr.ip())
            })
            .map(|ip| ip.to_string())
    }
}

fn first_hop(value: &HeaderValue) -> Option<IpAddr> {
    value.to_str().ok()?.split(',').next()?.trim().parse().ok()
}

fn parse_ip(value: &HeaderValue) -> Option<IpAddr> {
    value.to_str().ok()?.trim().parse().ok()
}

/// Keys requests by the value of a header, e.g. an API key or tenant id.
#[derive(Debug, Clone)]
pub struct HeaderKey {
    name: HeaderName,
}

impl HeaderKey {
    /// Key on the value of `name`. Missing or blank values yield no key.
    pub fn new(name: HeaderName) -> Self {
        Self { name }
    }
}

impl KeyExtractor for HeaderKey {
    fn extract<B>(&self, req: &Request<B>) -> Option<String> {
        let value = req.headers().get(&self.name)?.to_str().ok()?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_peer(addr: &str) -> Request<()> {
        let mut req = Request::new(());
        let addr: SocketAddr = addr.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        req
    }

    #[test]
    fn peer_ip_strips_port() {
        let req = with_peer("203.0.113.9:51234");
        assert_eq!(PeerIp::new().extract(&req).as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn peer_ip_ignores_forwarded_headers_by_default() {
        let mut req = with_peer("10.0.0.2:80");
        req.headers_mut().insert(X_FORWARDED_FOR, HeaderValue::from_static("198.51.100.1"));
        assert_eq!(PeerIp::new().extract(&req).as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn behind_proxy_uses_first_forwarded_hop() {
        let mut req = with_peer("10.0.0.2:80");
        req.headers_mut()
            .insert(X_FORWARDED_FOR, HeaderValue::from_static(" 198.51.100.1 , 10.0.0.1"));
        assert_eq!(PeerIp::behind_proxy().extract(&req).as_deref(), Some("198.51.100.1"));
    }

    #[test]
    fn behind_proxy_falls_back_to_real_ip_then_peer() {
        let mut req = with_peer("10.0.0.2:80");
        req.headers_mut().insert(X_FORWARDED_FOR, HeaderValue::from_static("garbage"));
        req.headers_mut().insert(X_REAL_IP, HeaderValue::from_static("2001:db8::7"));
        assert_eq!(PeerIp::behind_proxy().extract(&req).as_deref(), Some("2001:db8::7"));

        let req = with_peer("10.0.0.3:80");
        assert_eq!(PeerIp::behind_proxy().extract(&req).as_deref(), Some("10.0.0.3"));
    }

    #[test]
    fn no_peer_info_yields_none() {
        assert_eq!(PeerIp::new().extract(&Request::new(())), None);
    }

    #[test]
    fn header_key_reads_trimmed_value() {
        let extractor = HeaderKey::new(HeaderName::from_static("x-api-key"));
        let mut req = Request::new(());
        assert_eq!(extractor.extract(&req), None);
        req.headers_mut().insert("x-api-key", HeaderValue::from_static(" tenant-7 "));
        assert_eq!(extractor.extract(&req).as_deref(), Some("tenant-7"));
    }
}
