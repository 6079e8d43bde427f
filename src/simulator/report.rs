//! Per-scenario outcome tally.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use super::client::Probe;

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub scenario: String,
    pub total: u64,
    pub expected: u64,
    pub unexpected: u64,
    pub transport_errors: u64,
    pub statuses: BTreeMap<u16, u64>,
    pub elapsed: Duration,
    pub cancelled: bool,
    latencies: Vec<Duration>,
}

impl Report {
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, probe: &Probe) {
        self.total += 1;
        if probe.expected {
            self.expected += 1;
        } else {
            self.unexpected += 1;
            tracing::warn!(
                operation = %probe.operation,
                status = probe.status.as_u16(),
                "Unexpected status"
            );
        }
        *self.statuses.entry(probe.status.as_u16()).or_default() += 1;
        self.latencies.push(probe.latency);
    }

    /// A request that never produced a status. Counts as a failure.
    pub fn record_transport_error(&mut self) {
        self.total += 1;
        self.transport_errors += 1;
    }

    pub fn merge(&mut self, other: Report) {
        self.total += other.total;
        self.expected += other.expected;
        self.unexpected += other.unexpected;
        self.transport_errors += other.transport_errors;
        for (status, count) in other.statuses {
            *self.statuses.entry(status).or_default() += count;
        }
        self.latencies.extend(other.latencies);
        self.cancelled |= other.cancelled;
    }

    /// Failures are unexpected statuses plus transport errors.
    pub fn failures(&self) -> u64 {
        self.unexpected + self.transport_errors
    }

    /// Nearest-rank percentile over the recorded latencies.
    pub fn percentile(&self, p: f64) -> Option<Duration> {
        if self.latencies.is_empty() {
            return None;
        }
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        let rank = ((p.clamp(0.0, 100.0) / 100.0) * sorted.len() as f64).ceil() as usize;
        Some(sorted[rank.saturating_sub(1).min(sorted.len() - 1)])
    }
}

fn millis(d: Option<Duration>) -> String {
    d.map(|d| format!("{:.1}ms", d.as_secs_f64() * 1000.0))
        .unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = if self.cancelled { " (cancelled)" } else { "" };
        writeln!(f, "=== {}{} ===", self.scenario, suffix)?;
        writeln!(
            f,
            "requests: {}  expected: {}  unexpected: {}  transport errors: {}",
            self.total, self.expected, self.unexpected, self.transport_errors
        )?;
        let statuses: Vec<String> = self
            .statuses
            .iter()
            .map(|(status, count)| format!("{}={}", status, count))
            .collect();
        writeln!(f, "statuses: {}", statuses.join(" "))?;
        write!(
            f,
            "latency p50: {}  p95: {}  p99: {}  elapsed: {:.1}s",
            millis(self.percentile(50.0)),
            millis(self.percentile(95.0)),
            millis(self.percentile(99.0)),
            self.elapsed.as_secs_f64()
        )
    }
}
