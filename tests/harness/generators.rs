// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators for traffic simulation.

use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of IP addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// Referrer pages on the form owner's site and its subdomains.
pub fn generate_site_referrers(count: usize, domain: &str) -> Vec<String> {
    (0..count)
        .map(|i| match i % 3 {
            0 => format!("https://{domain}/contact"),
            1 => format!("https://www.{domain}/page/{i}"),
            _ => format!("https://blog.{domain}/post/{i}?ref=footer"),
        })
        .collect()
}

/// Referrers a scraper or cross-site embed would send.
pub fn generate_foreign_referrers(domain: &str) -> Vec<String> {
    vec![
        "https://malicious.com/page".to_string(),
        format!("https://evil{domain}/contact"),
        format!("https://{domain}.attacker.net/"),
        format!("http://{domain}-login.com/"),
        "not a url".to_string(),
        "https://127.0.0.1/".to_string(),
    ]
}

/// Urlencoded bodies a person filling in the form would send.
pub fn generate_legit_bodies(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            format!(
                "name=Visitor+{i}&email=visitor{i}%40mail.example.net&message=Hello+number+{i}"
            )
        })
        .collect()
}

/// Bodies from bots that fill every input, including the hidden one.
pub fn generate_honeypot_bodies(count: usize, honeypot_field: &str) -> Vec<String> {
    (0..count)
        .map(|i| {
            format!(
                "name=Buy+now+{i}&email=bot{i}%40spam.example&message=cheap&{honeypot_field}=http%3A%2F%2Fspam.example"
            )
        })
        .collect()
}

/// Addresses on the form's block-list.
pub fn generate_blocked_senders() -> Vec<&'static str> {
    vec!["spam@x.com", "troll@badsite.org", "offers@deals.example"]
}

/// Bodies that put a blocked address under one of the sender field names,
/// with varying case and padding.
pub fn generate_blocked_sender_bodies(count: usize) -> Vec<String> {
    let senders = generate_blocked_senders();
    let fields = ["email", "user_email", "contact_email", "from", "sender", "reply_to"];
    (0..count)
        .map(|i| {
            let sender = senders[i % senders.len()];
            let sender = if i % 2 == 0 {
                sender.to_uppercase()
            } else {
                format!("+{sender}+")
            };
            format!(
                "name=Repeat+{i}&{}={}&message=again",
                fields[i % fields.len()],
                sender.replace('@', "%40")
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(256);
        assert_eq!(ips.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_site_referrers_stay_on_domain() {
        for referrer in generate_site_referrers(30, "example.com") {
            assert!(referrer.contains("example.com/"));
        }
    }

    #[test]
    fn test_blocked_sender_bodies_vary_field() {
        let bodies = generate_blocked_sender_bodies(6);
        assert!(bodies[0].contains("&email="));
        assert!(bodies[5].contains("&reply_to="));
    }
}
