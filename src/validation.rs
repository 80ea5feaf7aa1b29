//! Validation of proposed target configurations.
//!
//! The dashboard submits a proposal (target URL, API key, interval) before the
//! operator writes it into the config file. All problems are collected so the
//! form can show them together.

use std::net::IpAddr;

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{API_KEY_VISIBLE_PREFIX, MIN_API_KEY_LENGTH, MIN_PING_INTERVAL_SECS};

/// Body of `POST /api/config`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigProposal {
    pub target_url: Option<String>,
    pub api_key: Option<String>,
    /// Accepts a JSON number or a numeric string. An explicit `null` is kept
    /// as `Some(Value::Null)` so it is rejected rather than treated as absent.
    #[serde(default, deserialize_with = "present")]
    pub interval: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A proposal that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProposal {
    pub target_url: String,
    pub api_key: String,
    pub interval: Option<i64>,
}

impl ValidProposal {
    /// API key reduced to its first few characters
    pub fn masked_api_key(&self) -> String {
        mask_api_key(&self.api_key)
    }
}

pub fn mask_api_key(key: &str) -> String {
    let prefix: String = key.chars().take(API_KEY_VISIBLE_PREFIX).collect();
    format!("{}******", prefix)
}

/// Validate a proposal, returning every error found in field order.
pub fn validate_proposal(proposal: &ConfigProposal) -> Result<ValidProposal, Vec<String>> {
    let mut errors = Vec::new();

    let target_url = proposal.target_url.as_deref().unwrap_or("");
    if target_url.is_empty() {
        errors.push("targetUrl is required".to_string());
    } else {
        errors.extend(check_target_url(target_url));
    }

    let api_key = proposal.api_key.as_deref().unwrap_or("");
    if api_key.is_empty() {
        errors.push("apiKey is required".to_string());
    } else if api_key.chars().count() < MIN_API_KEY_LENGTH {
        errors.push(format!(
            "apiKey must be at least {} characters long",
            MIN_API_KEY_LENGTH
        ));
    }

    let interval = match &proposal.interval {
        None => None,
        Some(value) => match parse_interval(value) {
            Some(n) if n >= MIN_PING_INTERVAL_SECS as i64 => Some(n),
            _ => {
                errors.push(format!(
                    "interval must be a number >= {} seconds",
                    MIN_PING_INTERVAL_SECS
                ));
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidProposal {
        target_url: target_url.to_string(),
        api_key: api_key.to_string(),
        interval,
    })
}

fn check_target_url(raw: &str) -> Vec<String> {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) => return vec!["targetUrl is not a valid URL".to_string()],
    };

    let mut errors = Vec::new();
    if !matches!(url.scheme(), "http" | "https") {
        errors.push("targetUrl must use http:// or https:// protocol".to_string());
    }
    if url.host_str().map(is_local_host).unwrap_or(false) {
        errors.push("targetUrl cannot be a local or private IP address".to_string());
    }
    errors
}

/// Hosts that would make the server ping itself or its private network.
pub fn is_local_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost")
        || host.starts_with("192.168.")
        || host.starts_with("10.")
    {
        return true;
    }

    // IPv6 literals come back from the URL parser in brackets
    let literal = host.trim_start_matches('[').trim_end_matches(']');
    match literal.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => {
            ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
        }
        Ok(IpAddr::V6(ip)) => {
            ip.is_loopback() || ip.is_unspecified() || is_unique_local_v6(ip.segments()[0])
        }
        Err(_) => false,
    }
}

fn is_unique_local_v6(first_segment: u16) -> bool {
    // fc00::/7
    first_segment & 0xfe00 == 0xfc00
}

/// Interpret an interval value the way a lenient form would: integers as-is,
/// floats truncated, strings by their leading integer.
fn parse_interval(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
