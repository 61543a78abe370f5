//! Source-address resolution shared by the rate limiter and the contact
//! handlers.

use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};

pub static X_FORWARDED_FOR: &str = "x-forwarded-for";

/// The caller's address as seen by the server, inserted into request
/// extensions by [`crate::middleware::rate_limit::rate_limit_middleware`].
/// `None` when neither the socket nor a trusted proxy header names one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

impl ClientIp {
    pub fn to_storage(self) -> Option<String> {
        self.0.map(|ip| ip.to_string())
    }
}

pub fn resolve<B>(req: &Request<B>, trust_proxy: bool) -> ClientIp {
    if trust_proxy {
        if let Some(ip) = forwarded_for(req.headers()) {
            return ClientIp(Some(ip));
        }
    }
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    ClientIp(peer)
}

/// First (client-most) entry of `X-Forwarded-For`.
fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse().ok())
}
