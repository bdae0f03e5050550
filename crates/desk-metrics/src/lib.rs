use std::sync::Arc;

use opentelemetry::{KeyValue, global, metrics::Counter};

#[derive(Debug)]
pub struct MetricsRegistry {
    pub dashboard: Arc<DashboardMetrics>,
}

impl MetricsRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            dashboard: DashboardMetrics::new(),
        })
    }
}

#[derive(Debug)]
pub struct DashboardMetrics {
    fetches: Counter<u64>,
    fallbacks: Counter<u64>,
    cache_writes: Counter<u64>,
    cache_reads: Counter<u64>,
}

impl DashboardMetrics {
    fn new() -> Arc<Self> {
        let meter = global::meter("repairdesk");
        let fetches = meter
            .u64_counter("dashboard_fetch_total")
            .with_description("Number of completed dashboard fetches, by outcome")
            .with_unit("count")
            .init();

        let fallbacks = meter
            .u64_counter("dashboard_fallback_total")
            .with_description("Number of times the zero payload was committed instead of real data")
            .with_unit("count")
            .init();

        let cache_writes = meter
            .u64_counter("dashboard_cache_writes_total")
            .with_description("Number of payload cache writes, by result")
            .with_unit("count")
            .init();

        let cache_reads = meter
            .u64_counter("dashboard_cache_reads_total")
            .with_description("Number of startup payload cache reads, by result")
            .with_unit("count")
            .init();

        Arc::new(Self {
            fetches,
            fallbacks,
            cache_writes,
            cache_reads,
        })
    }

    pub fn record_fetch(&self, outcome: FetchOutcome) {
        self.fetches
            .add(1, &[KeyValue::new("outcome", outcome.as_str())]);
    }

    pub fn record_fallback(&self, reason: FallbackReason) {
        self.fallbacks
            .add(1, &[KeyValue::new("reason", reason.as_str())]);
    }

    pub fn record_cache_write(&self, ok: bool) {
        self.cache_writes.add(
            1,
            &[KeyValue::new("result", if ok { "ok" } else { "failed" })],
        );
    }

    pub fn record_cache_read(&self, result: CacheRead) {
        self.cache_reads
            .add(1, &[KeyValue::new("result", result.as_str())]);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    Success,
    Transport,
    Status,
    Unauthorized,
    Malformed,
    /// A newer fetch was issued before this one completed.
    Superseded,
}

impl FetchOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Transport => "transport",
            Self::Status => "status",
            Self::Unauthorized => "unauthorized",
            Self::Malformed => "malformed",
            Self::Superseded => "superseded",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackReason {
    /// The fetch failed and the zero payload was committed.
    FetchFailed,
}

impl FallbackReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FetchFailed => "fetch_failed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheRead {
    Hit,
    Miss,
    /// A cache file exists but could not be read or parsed.
    Unreadable,
}

impl CacheRead {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Unreadable => "unreadable",
        }
    }
}
