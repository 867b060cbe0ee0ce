// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Traffic mixes for gate simulation.

use super::metrics::Outcome;

/// Kind of sender behind one simulated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrafficKind {
    /// A person on the owner's site
    Legitimate,
    /// Posted from another site or a lookalike domain
    ForeignReferrer,
    /// Privacy-conscious client that strips the Referer header
    MissingReferrer,
    /// Bot that filled the hidden field
    HoneypotBot,
    /// Sender on the form's block-list
    BlockedSender,
}

impl TrafficKind {
    /// Outcome the gate should produce for this kind.
    pub fn expected_outcome(self) -> Outcome {
        match self {
            Self::Legitimate | Self::MissingReferrer => Outcome::Accepted,
            Self::ForeignReferrer => Outcome::Rejected,
            Self::HoneypotBot | Self::BlockedSender => Outcome::SilentlyDropped,
        }
    }
}

/// Traffic mix configuration. Ratios are shares of the total (0.0-1.0);
/// whatever is left over is legitimate traffic.
#[derive(Debug, Clone)]
pub struct TrafficConfig {
    /// Total number of requests to send
    pub total_requests: usize,
    /// Number of unique client IPs
    pub unique_ips: usize,
    /// Share of requests from foreign referrers
    pub foreign_referrer_ratio: f64,
    /// Share of requests without a referrer
    pub missing_referrer_ratio: f64,
    /// Share of requests with the honeypot filled
    pub honeypot_ratio: f64,
    /// Share of requests from blocked senders
    pub blocked_sender_ratio: f64,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            unique_ips: 10,
            foreign_referrer_ratio: 0.0,
            missing_referrer_ratio: 0.0,
            honeypot_ratio: 0.0,
            blocked_sender_ratio: 0.0,
        }
    }
}

/// Predefined traffic mixes.
impl TrafficConfig {
    /// Only real visitors.
    pub fn legitimate_only() -> Self {
        Self {
            total_requests: 60,
            unique_ips: 30,
            ..Default::default()
        }
    }

    /// Form-filling bots hitting the endpoint directly.
    pub fn honeypot_bots() -> Self {
        Self {
            total_requests: 80,
            unique_ips: 40,
            honeypot_ratio: 1.0,
            ..Default::default()
        }
    }

    /// Cross-site posts and lookalike domains.
    pub fn referrer_spoofing() -> Self {
        Self {
            total_requests: 60,
            unique_ips: 20,
            foreign_referrer_ratio: 1.0,
            ..Default::default()
        }
    }

    /// Real visitors whose browsers send no referrer.
    pub fn privacy_clients() -> Self {
        Self {
            total_requests: 40,
            unique_ips: 20,
            missing_referrer_ratio: 1.0,
            ..Default::default()
        }
    }

    /// Repeat offenders already on the block-list.
    pub fn blocklisted_spammers() -> Self {
        Self {
            total_requests: 50,
            unique_ips: 5,
            blocked_sender_ratio: 1.0,
            ..Default::default()
        }
    }

    /// A realistic spam campaign mixed into normal traffic.
    pub fn mixed_campaign() -> Self {
        Self {
            total_requests: 200,
            unique_ips: 50,
            foreign_referrer_ratio: 0.15,
            missing_referrer_ratio: 0.05,
            honeypot_ratio: 0.3,
            blocked_sender_ratio: 0.1,
        }
    }

    /// Deterministically pick the kind of the `index`-th request so that
    /// each kind gets roughly its configured share.
    pub fn kind_for(&self, index: usize) -> TrafficKind {
        let x = spread(index);
        let mut threshold = 0.0;
        for (ratio, kind) in [
            (self.foreign_referrer_ratio, TrafficKind::ForeignReferrer),
            (self.missing_referrer_ratio, TrafficKind::MissingReferrer),
            (self.honeypot_ratio, TrafficKind::HoneypotBot),
            (self.blocked_sender_ratio, TrafficKind::BlockedSender),
        ] {
            threshold += ratio;
            if x < threshold {
                return kind;
            }
        }
        TrafficKind::Legitimate
    }
}

/// Low-discrepancy value in [0, 1) for an index.
fn spread(index: usize) -> f64 {
    (index as f64 * 0.618033988749895) % 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_mixes() {
        let bots = TrafficConfig::honeypot_bots();
        assert!((0..bots.total_requests).all(|i| bots.kind_for(i) == TrafficKind::HoneypotBot));

        let people = TrafficConfig::legitimate_only();
        assert!((0..people.total_requests).all(|i| people.kind_for(i) == TrafficKind::Legitimate));
    }

    #[test]
    fn test_mixed_shares_are_close() {
        let config = TrafficConfig::mixed_campaign();
        let bots = (0..config.total_requests)
            .filter(|&i| config.kind_for(i) == TrafficKind::HoneypotBot)
            .count();
        let share = bots as f64 / config.total_requests as f64;
        assert!((share - 0.3).abs() < 0.05, "honeypot share {share}");
    }
}
