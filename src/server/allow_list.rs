use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::config::{Environment, ServerConfig};
use super::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Set of client addresses allowed through to the upload routes.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    allowed: HashSet<IpAddr>,
    bypass: bool,
    trust_forwarded_for: bool,
}

impl AllowList {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            allowed: config.allowed_ips.iter().map(IpAddr::to_canonical).collect(),
            bypass: config.environment == Environment::Development,
            trust_forwarded_for: config.trust_forwarded_for,
        }
    }

    /// IPv4-mapped IPv6 addresses match their plain IPv4 form.
    pub fn permits(&self, ip: Option<IpAddr>) -> bool {
        if self.bypass {
            return true;
        }
        ip.is_some_and(|ip| self.allowed.contains(&ip.to_canonical()))
    }

    /// Address of the caller: the first `X-Forwarded-For` hop when trusted,
    /// otherwise the peer address of the connection.
    pub fn client_ip(&self, request: &Request) -> Option<IpAddr> {
        if self.trust_forwarded_for {
            if let Some(ip) = forwarded_ip(request.headers()) {
                return Some(ip);
            }
        }
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(FORWARDED_FOR)?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Middleware rejecting callers outside the allow-list with 403.
pub async fn enforce_allow_list(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let ip = state.allow_list.client_ip(&request);
    if state.allow_list.permits(ip) {
        return next.run(request).await;
    }

    tracing::warn!(
        ip = ?ip,
        path = %request.uri().path(),
        "rejected request from address outside the allow-list"
    );
    (
        StatusCode::FORBIDDEN,
        Json(serde_json::json!({ "error": "Forbidden" })),
    )
        .into_response()
}
