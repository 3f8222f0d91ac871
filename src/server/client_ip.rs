use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::SocketAddr;

/// Headers set by reverse proxies, in order of preference.
const FORWARDING_HEADERS: &[&str] = &[
    "X-Forwarded-For",
    "Proxy-Client-IP",
    "WL-Proxy-Client-IP",
    "X-Real-IP",
];

/// Network address the request originated from. Empty when neither the
/// proxy headers nor the connection tell us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

fn from_forwarding_headers(headers: &HeaderMap) -> Option<String> {
    FORWARDING_HEADERS.iter().find_map(|name| {
        let value = headers.get(*name)?.to_str().ok()?;
        // X-Forwarded-For is "client, proxy1, proxy2"
        let first = value.split(',').next()?.trim();
        if first.is_empty() || first.eq_ignore_ascii_case("unknown") {
            None
        } else {
            Some(first.to_string())
        }
    })
}

pub fn client_ip_from_parts(parts: &Parts) -> String {
    from_forwarding_headers(&parts.headers)
        .or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_default()
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(client_ip_from_parts(parts)))
    }
}
