use std::{collections::BTreeMap, net::SocketAddr};

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DROPPED_HEADERS: [&str; 3] = ["cookie", "authorization", "proxy-authorization"];

/// Request context a policy may key on besides the submission itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSignals {
    /// Identifier assigned on receipt.
    pub request_id: String,
    /// Receive time.
    pub received_at: DateTime<Utc>,
    /// `user-agent` header, if sent.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Peer socket address, when the server knows it.
    #[serde(default)]
    pub remote_addr: Option<String>,
    /// `x-forwarded-for` chain, first hop first.
    #[serde(default)]
    pub forwarded_for: Vec<String>,
    /// Remaining headers with lower-cased names. Credentials are never kept.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl RequestSignals {
    /// Captures signals from request headers and the peer address.
    #[must_use]
    pub fn capture(headers: &HeaderMap, remote: Option<SocketAddr>) -> Self {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let forwarded_for = headers
            .get_all("x-forwarded-for")
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|hop| !hop.is_empty())
            .map(str::to_string)
            .collect();
        let mut kept = BTreeMap::new();
        for (name, value) in headers {
            let name = name.as_str().to_ascii_lowercase();
            if DROPPED_HEADERS.contains(&name.as_str()) {
                continue;
            }
            if let Ok(value) = value.to_str() {
                kept.entry(name)
                    .and_modify(|existing: &mut String| {
                        existing.push_str(", ");
                        existing.push_str(value);
                    })
                    .or_insert_with(|| value.to_string());
            }
        }
        Self {
            request_id: Uuid::new_v4().to_string(),
            received_at: Utc::now(),
            user_agent,
            remote_addr: remote.map(|addr| addr.to_string()),
            forwarded_for,
            headers: kept,
        }
    }

    /// Signals for an in-process call with no HTTP request behind it.
    #[must_use]
    pub fn empty() -> Self {
        Self::capture(&HeaderMap::new(), None)
    }

    /// Best guess at the client address: first forwarded hop, else the peer IP.
    #[must_use]
    pub fn client_ip(&self) -> Option<&str> {
        self.forwarded_for.first().map(String::as_str).or_else(|| {
            self.remote_addr
                .as_deref()
                .map(|addr| addr.rsplit_once(':').map_or(addr, |(host, _)| host))
        })
    }
}
