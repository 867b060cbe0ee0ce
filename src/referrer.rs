// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Referrer allow-list matching.
//!
//! A missing referrer is always permitted: it cannot be told apart from a
//! client that strips the header for privacy.

use tracing::debug;
use url::Url;

/// Decide whether `referrer` is permitted by `allowed_domains`.
///
/// - empty allow-list: allowed
/// - absent or empty referrer: allowed (whitespace is not empty)
/// - unparseable referrer or no host: denied
/// - host equal to an allowed domain, or a subdomain of one: allowed
///
/// Hosts are compared lowercase on both sides.
pub fn allowed<S: AsRef<str>>(allowed_domains: &[S], referrer: Option<&str>) -> bool {
    if allowed_domains.is_empty() {
        return true;
    }

    let referrer = match referrer {
        Some(r) if !r.is_empty() => r,
        _ => {
            debug!("No referrer, allowing direct submission");
            return true;
        }
    };

    let host = match referrer_host(referrer) {
        Some(host) => host,
        None => {
            debug!("Referrer has no parseable host");
            return false;
        }
    };

    let matched = allowed_domains
        .iter()
        .map(|d| d.as_ref().trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .any(|domain| host_matches(&host, &domain));

    debug!(host = %host, matched, "Referrer domain checked");
    matched
}

/// Extract the lowercase host from a referrer URL.
pub fn referrer_host(referrer: &str) -> Option<String> {
    let url = Url::parse(referrer).ok()?;
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.trim_end_matches('.').to_lowercase())
}

/// Exact match, or `host` ends with `"." + domain`.
fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
