//! Request origin capture for audit events.

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{HeaderMap, header, request::Parts};

use drivenow_auth::AuditSource;

/// Extract the audit source from request headers, falling back to the peer
/// address for the IP.
///
/// `x-forwarded-for` (first hop) wins over `x-real-ip`, which wins over the
/// socket address.
pub fn extract_audit_source(headers: &HeaderMap, peer: Option<SocketAddr>) -> AuditSource {
    let ip_address: Option<IpAddr> = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse().ok())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse().ok())
        })
        .or_else(|| peer.map(|addr| addr.ip()));

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    AuditSource::new(ip_address, user_agent)
}

/// Extractor wrapping [`AuditSource`].
///
/// Works with or without `ConnectInfo`, so routers driven directly in tests
/// still get header-derived sources.
#[derive(Debug, Clone)]
pub struct ClientSource(pub AuditSource);

impl<S> FromRequestParts<S> for ClientSource
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self(extract_audit_source(&parts.headers, peer)))
    }
}
