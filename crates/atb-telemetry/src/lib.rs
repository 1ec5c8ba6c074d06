// SPDX-License-Identifier: MIT OR Apache-2.0
//! atb-telemetry
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Structured metrics for tool dispatches. The dispatcher records one
//! [`CallMetrics`] per invocation when a [`MetricsCollector`] is attached;
//! collection never changes a call's result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

// ---------------------------------------------------------------------------
// CallMetrics
// ---------------------------------------------------------------------------

/// Metrics captured for a single tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallMetrics {
    /// Vendor identifier of the backend that served the call.
    pub vendor: String,
    /// Name of the invoked tool.
    pub tool: String,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Whether the call returned successfully.
    pub ok: bool,
    /// When the call finished.
    pub recorded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// MetricsSummary
// ---------------------------------------------------------------------------

/// Aggregated statistics across recorded calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricsSummary {
    /// Number of calls recorded.
    pub count: usize,
    /// Mean duration in milliseconds.
    pub mean_duration_ms: f64,
    /// Median (p50) duration in milliseconds.
    pub p50_duration_ms: f64,
    /// 99th-percentile duration in milliseconds.
    pub p99_duration_ms: f64,
    /// Error rate (failed calls / total calls).
    pub error_rate: f64,
    /// Per-vendor call counts (deterministic ordering).
    pub vendor_counts: BTreeMap<String, usize>,
    /// Per-tool call counts (deterministic ordering).
    pub tool_counts: BTreeMap<String, usize>,
}

/// Compute a percentile value from a **sorted** slice.
fn percentile(sorted: &[u64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0] as f64;
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] as f64 * (1.0 - frac) + sorted[upper] as f64 * frac
}

// ---------------------------------------------------------------------------
// MetricsCollector
// ---------------------------------------------------------------------------

/// Thread-safe collector for call metrics.
///
/// Cloning is cheap; clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<Mutex<Vec<CallMetrics>>>,
}

impl MetricsCollector {
    /// Create a new, empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call.
    pub fn record(&self, metrics: CallMetrics) {
        debug!(
            vendor = %metrics.vendor,
            tool = %metrics.tool,
            duration_ms = metrics.duration_ms,
            ok = metrics.ok,
            "call recorded"
        );
        if let Ok(mut calls) = self.inner.lock() {
            calls.push(metrics);
        }
    }

    /// Snapshot of everything recorded so far.
    pub fn calls(&self) -> Vec<CallMetrics> {
        self.inner.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of recorded calls.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregate the recorded calls into a [`MetricsSummary`].
    pub fn summary(&self) -> MetricsSummary {
        let calls = self.calls();
        if calls.is_empty() {
            return MetricsSummary::default();
        }

        let mut durations: Vec<u64> = calls.iter().map(|c| c.duration_ms).collect();
        durations.sort_unstable();
        let total: u64 = durations.iter().sum();
        let errors = calls.iter().filter(|c| !c.ok).count();

        let mut vendor_counts = BTreeMap::new();
        let mut tool_counts = BTreeMap::new();
        for call in &calls {
            *vendor_counts.entry(call.vendor.clone()).or_insert(0) += 1;
            *tool_counts.entry(call.tool.clone()).or_insert(0) += 1;
        }

        MetricsSummary {
            count: calls.len(),
            mean_duration_ms: total as f64 / calls.len() as f64,
            p50_duration_ms: percentile(&durations, 50.0),
            p99_duration_ms: percentile(&durations, 99.0),
            error_rate: errors as f64 / calls.len() as f64,
            vendor_counts,
            tool_counts,
        }
    }
}
