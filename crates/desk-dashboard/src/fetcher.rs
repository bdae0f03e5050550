use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use repairdesk_client::{AggregatePayload, ClientError, DashboardApi, SessionContext};
use repairdesk_metrics::{CacheRead, DashboardMetrics, FallbackReason, FetchOutcome};
use tokio::{
    sync::watch,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::PayloadStore;

/// Why the last fetch fell back to the zero payload. Only ever shown to the user as the
/// generic error placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Dashboard request failed")]
    Transport,
    #[error("Dashboard request returned HTTP {0}")]
    Status(u16),
    #[error("Session is not authenticated")]
    Unauthorized,
    #[error("Dashboard response was not valid JSON")]
    Malformed,
}

impl From<&ClientError> for FetchError {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::Unauthorized | ClientError::Forbidden { .. } => Self::Unauthorized,
            ClientError::StatusError(status) if status.as_u16() == 401 => Self::Unauthorized,
            ClientError::StatusError(status) => Self::Status(status.as_u16()),
            ClientError::JsonError(_) => Self::Malformed,
            ClientError::HttpError(e) if e.is_decode() => Self::Malformed,
            _ => Self::Transport,
        }
    }
}

impl FetchError {
    const fn outcome(self) -> FetchOutcome {
        match self {
            Self::Transport => FetchOutcome::Transport,
            Self::Status(_) => FetchOutcome::Status,
            Self::Unauthorized => FetchOutcome::Unauthorized,
            Self::Malformed => FetchOutcome::Malformed,
        }
    }
}

/// What the dashboard currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardState {
    /// `None` only before the first attempt completes and when nothing was cached.
    pub data: Option<Arc<AggregatePayload>>,
    pub loading: bool,
    pub error: Option<FetchError>,
    /// Ticket of the fetch this state belongs to.
    pub generation: u64,
}

/// Owns the dashboard payload and publishes every state change on a watch channel.
pub struct DashboardFetcher {
    api: Arc<dyn DashboardApi>,
    store: Arc<dyn PayloadStore>,
    metrics: Arc<DashboardMetrics>,
    session: Option<SessionContext>,
    state: watch::Sender<DashboardState>,
    generation: AtomicU64,
}

impl DashboardFetcher {
    /// Starts from the cached payload when there is one.
    pub fn new(
        api: Arc<dyn DashboardApi>,
        store: Arc<dyn PayloadStore>,
        metrics: Arc<DashboardMetrics>,
    ) -> Self {
        let cached = match store.load() {
            Ok(Some(payload)) => {
                debug!("Loaded cached dashboard payload");
                metrics.record_cache_read(CacheRead::Hit);
                Some(Arc::new(payload))
            }
            Ok(None) => {
                metrics.record_cache_read(CacheRead::Miss);
                None
            }
            Err(err) => {
                warn!(error = %err, "Ignoring unreadable dashboard cache");
                metrics.record_cache_read(CacheRead::Unreadable);
                None
            }
        };

        let (state, _) = watch::channel(DashboardState {
            data: cached,
            ..DashboardState::default()
        });

        Self {
            api,
            store,
            metrics,
            session: None,
            state,
            generation: AtomicU64::new(0),
        }
    }

    /// Signs the session out whenever the backend rejects it.
    #[must_use]
    pub fn with_session(mut self, session: SessionContext) -> Self {
        self.session = Some(session);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Fetches the dashboard once and commits either the response or the zero payload.
    ///
    /// Calls may overlap; only the most recently issued one commits its result.
    pub async fn fetch(&self) -> DashboardState {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
            state.generation = ticket;
        });

        let result = self.api.get_dashboard().await;

        let (payload, error) = match result {
            Ok(payload) => (payload, None),
            Err(err) => {
                let fetch_error = FetchError::from(&err);
                warn!(error = %err, generation = ticket, "Dashboard fetch failed, using fallback payload");
                if fetch_error == FetchError::Unauthorized
                    && let Some(session) = &self.session
                {
                    session.mark_unauthorized();
                }
                (AggregatePayload::fallback(), Some(fetch_error))
            }
        };

        let payload = Arc::new(payload);
        let committed = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != ticket {
                return false;
            }
            state.data = Some(Arc::clone(&payload));
            state.error = error;
            state.loading = false;
            state.generation = ticket;
            true
        });

        if !committed {
            debug!(generation = ticket, "Discarding superseded dashboard fetch");
            self.metrics.record_fetch(FetchOutcome::Superseded);
            return self.state();
        }

        match error {
            None => self.metrics.record_fetch(FetchOutcome::Success),
            Some(err) => {
                self.metrics.record_fetch(err.outcome());
                self.metrics.record_fallback(FallbackReason::FetchFailed);
            }
        }

        match self.store.save(&payload) {
            Ok(()) => self.metrics.record_cache_write(true),
            Err(err) => {
                warn!(error = %err, "Failed to update dashboard cache");
                self.metrics.record_cache_write(false);
            }
        }

        self.state()
    }

    /// Refetches every `refresh_interval` until `shutdown` is cancelled. The first fetch
    /// happens immediately.
    pub async fn run_forever(&self, refresh_interval: Duration, shutdown: CancellationToken) {
        let mut ticker = interval(refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    info!("Dashboard refresh loop shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let state = self.fetch().await;
                    debug!(generation = state.generation, failed = state.error.is_some(), "Dashboard refreshed");
                }
            }
        }
    }
}
