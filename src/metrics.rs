//! Request/operation counters, exposed at `/metrics` (JSON) and
//! `/metrics/prometheus` (text). Mirrors the shape of the teacher's
//! `openai::metrics::Metrics` — per-operation counters behind `RwLock`,
//! a bounded latency history, and a `get_stats` snapshot — scoped down to
//! this service's four discovery operations and its error taxonomy.

use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::RwLock;

const MAX_LATENCY_HISTORY: usize = 1000;

fn percentile(sorted_data: &[u64], p: u8) -> u64 {
    if sorted_data.is_empty() {
        return 0;
    }
    let clamped = u128::from(p.min(100));
    let len = sorted_data.len() as u128;
    let raw_index = (len * clamped).div_ceil(100);
    let safe_index = raw_index.saturating_sub(1).min(len.saturating_sub(1));
    let index = usize::try_from(safe_index).unwrap_or(sorted_data.len().saturating_sub(1));
    sorted_data.get(index).copied().unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Register,
    Unregister,
    FullSync,
    IncrementalSync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    AuthenticationInvalid,
    RateLimitExceeded,
    RequestDataMissing,
    RequestDataInvalid,
}

#[derive(Clone, Default, Serialize)]
pub struct MetricsStats {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub success_rate: f64,
    pub register_total: u64,
    pub unregister_total: u64,
    pub full_sync_total: u64,
    pub incremental_sync_total: u64,
    pub authentication_invalid_total: u64,
    pub rate_limit_exceeded_total: u64,
    pub request_data_missing_total: u64,
    pub request_data_invalid_total: u64,
    pub avg_latency_ms: f64,
    pub p50_latency_ms: u64,
    pub p95_latency_ms: u64,
    pub p99_latency_ms: u64,
}

struct Counters {
    total_requests: u64,
    failed_requests: u64,
    register_total: u64,
    unregister_total: u64,
    full_sync_total: u64,
    incremental_sync_total: u64,
    authentication_invalid_total: u64,
    rate_limit_exceeded_total: u64,
    request_data_missing_total: u64,
    request_data_invalid_total: u64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            total_requests: 0,
            failed_requests: 0,
            register_total: 0,
            unregister_total: 0,
            full_sync_total: 0,
            incremental_sync_total: 0,
            authentication_invalid_total: 0,
            rate_limit_exceeded_total: 0,
            request_data_missing_total: 0,
            request_data_invalid_total: 0,
        }
    }
}

pub struct Metrics {
    counters: RwLock<Counters>,
    request_durations_ms: RwLock<VecDeque<u64>>,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(Counters::default()),
            request_durations_ms: RwLock::new(VecDeque::new()),
        }
    }

    /// Records one handled request: which operation it was, what it
    /// resolved to, and how long it took.
    pub async fn record(&self, op: Operation, outcome: Outcome, duration_ms: u64) {
        let mut counters = self.counters.write().await;
        counters.total_requests += 1;
        match op {
            Operation::Register => counters.register_total += 1,
            Operation::Unregister => counters.unregister_total += 1,
            Operation::FullSync => counters.full_sync_total += 1,
            Operation::IncrementalSync => counters.incremental_sync_total += 1,
        }
        match outcome {
            Outcome::Success => {}
            Outcome::AuthenticationInvalid => {
                counters.failed_requests += 1;
                counters.authentication_invalid_total += 1;
            }
            Outcome::RateLimitExceeded => {
                counters.failed_requests += 1;
                counters.rate_limit_exceeded_total += 1;
            }
            Outcome::RequestDataMissing => {
                counters.failed_requests += 1;
                counters.request_data_missing_total += 1;
            }
            Outcome::RequestDataInvalid => {
                counters.failed_requests += 1;
                counters.request_data_invalid_total += 1;
            }
        }
        drop(counters);

        let mut durations = self.request_durations_ms.write().await;
        durations.push_back(duration_ms);
        if durations.len() > MAX_LATENCY_HISTORY {
            durations.pop_front();
        }
    }

    #[must_use]
    pub async fn get_stats(&self) -> MetricsStats {
        let counters = self.counters.read().await;
        let success_rate = if counters.total_requests > 0 {
            (counters.total_requests - counters.failed_requests) as f64
                / counters.total_requests as f64
                * 100.0
        } else {
            0.0
        };

        let durations = self.request_durations_ms.read().await;
        let mut sorted_durations: Vec<u64> = durations.iter().copied().collect();
        sorted_durations.sort_unstable();
        let avg_latency_ms = if sorted_durations.is_empty() {
            0.0
        } else {
            let total: f64 = sorted_durations.iter().map(|&x| x as f64).sum();
            total / sorted_durations.len() as f64
        };

        MetricsStats {
            total_requests: counters.total_requests,
            failed_requests: counters.failed_requests,
            success_rate,
            register_total: counters.register_total,
            unregister_total: counters.unregister_total,
            full_sync_total: counters.full_sync_total,
            incremental_sync_total: counters.incremental_sync_total,
            authentication_invalid_total: counters.authentication_invalid_total,
            rate_limit_exceeded_total: counters.rate_limit_exceeded_total,
            request_data_missing_total: counters.request_data_missing_total,
            request_data_invalid_total: counters.request_data_invalid_total,
            avg_latency_ms,
            p50_latency_ms: percentile(&sorted_durations, 50),
            p95_latency_ms: percentile(&sorted_durations, 95),
            p99_latency_ms: percentile(&sorted_durations, 99),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
