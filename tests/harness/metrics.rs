// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Metrics collection for traffic simulation results.

use super::traffic::TrafficKind;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Collects metrics during a traffic simulation.
#[derive(Debug, Default)]
pub struct SimulationMetrics {
    /// Start time of the run
    start_time: Option<Instant>,
    /// End time of the run
    end_time: Option<Instant>,
    /// Count of requests by outcome
    outcomes: HashMap<Outcome, usize>,
    /// Count of requests by (traffic kind, outcome)
    by_kind: HashMap<(TrafficKind, Outcome), usize>,
    /// Distinct redirect targets seen on 303 responses
    redirects: HashMap<String, usize>,
    /// Latency samples (microseconds)
    latencies: Vec<u64>,
}

/// Observed outcome for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// 303 and a new record
    Accepted,
    /// 303 and nothing stored
    SilentlyDropped,
    /// 403
    Rejected,
    /// Anything else
    Unexpected,
}

impl SimulationMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of a run.
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Mark the end of a run.
    pub fn finish(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Record a request outcome.
    pub fn record(
        &mut self,
        kind: TrafficKind,
        outcome: Outcome,
        redirect: Option<&str>,
        latency: Duration,
    ) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        *self.by_kind.entry((kind, outcome)).or_insert(0) += 1;
        if let Some(location) = redirect {
            *self.redirects.entry(location.to_string()).or_insert(0) += 1;
        }
        self.latencies.push(latency.as_micros() as u64);
    }

    /// Get total request count.
    pub fn total_requests(&self) -> usize {
        self.outcomes.values().sum()
    }

    /// Get count for a specific outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Get count for one kind of traffic ending in one outcome.
    pub fn count_for(&self, kind: TrafficKind, outcome: Outcome) -> usize {
        self.by_kind.get(&(kind, outcome)).copied().unwrap_or(0)
    }

    /// Total requests of one kind, whatever the outcome.
    pub fn sent(&self, kind: TrafficKind) -> usize {
        self.by_kind
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, n)| n)
            .sum()
    }

    /// Number of distinct redirect targets handed out.
    pub fn distinct_redirects(&self) -> usize {
        self.redirects.len()
    }

    /// Get duration of the run.
    pub fn duration(&self) -> Duration {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => end.duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    /// Ratio of requests that did not produce a record.
    pub fn block_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        let accepted = self.count(Outcome::Accepted);
        (total - accepted) as f64 / total as f64
    }

    /// Get p99 latency in microseconds.
    pub fn p99_latency_us(&self) -> u64 {
        if self.latencies.is_empty() {
            return 0;
        }
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        let idx = (sorted.len() as f64 * 0.99) as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    /// Generate a summary report.
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            total_requests: self.total_requests(),
            accepted: self.count(Outcome::Accepted),
            silently_dropped: self.count(Outcome::SilentlyDropped),
            rejected: self.count(Outcome::Rejected),
            unexpected: self.count(Outcome::Unexpected),
            duration_ms: self.duration().as_millis() as u64,
            block_rate: self.block_rate(),
            p99_latency_us: self.p99_latency_us(),
            distinct_redirects: self.distinct_redirects(),
        }
    }
}

/// Summary report of simulation metrics.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub total_requests: usize,
    pub accepted: usize,
    pub silently_dropped: usize,
    pub rejected: usize,
    pub unexpected: usize,
    pub duration_ms: u64,
    pub block_rate: f64,
    pub p99_latency_us: u64,
    pub distinct_redirects: usize,
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Traffic Simulation Report ===")?;
        writeln!(f, "Duration:          {} ms", self.duration_ms)?;
        writeln!(f, "Total Requests:    {}", self.total_requests)?;
        writeln!(f)?;
        writeln!(f, "--- Outcomes ---")?;
        writeln!(f, "Accepted:          {}", self.accepted)?;
        writeln!(f, "Silently Dropped:  {}", self.silently_dropped)?;
        writeln!(f, "Rejected:          {}", self.rejected)?;
        writeln!(f, "Unexpected:        {}", self.unexpected)?;
        writeln!(f, "Block Rate:        {:.1}%", self.block_rate * 100.0)?;
        writeln!(f, "Redirect Targets:  {}", self.distinct_redirects)?;
        writeln!(f)?;
        writeln!(f, "--- Latency ---")?;
        writeln!(f, "P99:               {} us", self.p99_latency_us)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        let mut metrics = SimulationMetrics::new();
        metrics.start();

        metrics.record(
            TrafficKind::Legitimate,
            Outcome::Accepted,
            Some("/f/a/thank-you"),
            Duration::from_micros(100),
        );
        metrics.record(
            TrafficKind::HoneypotBot,
            Outcome::SilentlyDropped,
            Some("/f/a/thank-you"),
            Duration::from_micros(80),
        );
        metrics.record(
            TrafficKind::ForeignReferrer,
            Outcome::Rejected,
            None,
            Duration::from_micros(50),
        );

        metrics.finish();

        assert_eq!(metrics.total_requests(), 3);
        assert_eq!(metrics.count(Outcome::Accepted), 1);
        assert_eq!(metrics.sent(TrafficKind::HoneypotBot), 1);
        assert_eq!(metrics.distinct_redirects(), 1);
        assert!((metrics.block_rate() - 2.0 / 3.0).abs() < 0.01);
    }
}
