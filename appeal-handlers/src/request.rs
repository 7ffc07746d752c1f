use std::collections::HashMap;
use std::net::Ipv4Addr;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, header};

/// Cookie carrying the CSRF state set by the login page.
pub const CSRF_COOKIE: &str = "__Secure-CSRFState";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
pub const UNKNOWN_IP: &str = "Unknown";

/// An inbound request as seen by a stage.
#[derive(Clone, Debug, Default)]
pub struct StageRequest {
    pub method: Method,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl StageRequest {
    /// Non-empty query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// The `state` query parameter must be present and equal the CSRF cookie.
    pub fn csrf_state_matches(&self) -> bool {
        match (self.query_param("state"), self.cookie(CSRF_COOKIE)) {
            (Some(state), Some(cookie)) => state == cookie,
            _ => false,
        }
    }

    /// Best-effort originating address: the first IPv4 entry of the
    /// forwarded-for chain, else its first entry, else `Unknown`.
    pub fn forwarded_ip(&self) -> String {
        let raw = self
            .headers
            .get(FORWARDED_FOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        let entries: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .collect();

        entries
            .iter()
            .find(|entry| entry.parse::<Ipv4Addr>().is_ok())
            .or_else(|| entries.first())
            .map(|entry| (*entry).to_owned())
            .unwrap_or_else(|| UNKNOWN_IP.to_owned())
    }
}
