//! Delivery of completed work phases to stats sinks.
//!
//! Recorders are told about a completion after local stats are saved. Their
//! failures are logged and swallowed by the notifier: a remote outage never
//! rolls back or blocks a local completion.

use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinHandle;
use url::Url;

use crate::error::{ConfigError, CoreError, Result};
use crate::storage::StatsApiConfig;
use crate::timer::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub duration_seconds: u64,
    pub completed_at: DateTime<Utc>,
    pub mode: Phase,
}

pub trait StatsRecorder {
    fn record_completion(&self, record: &CompletionRecord) -> Result<()>;
}

impl<T: StatsRecorder + ?Sized> StatsRecorder for Rc<T> {
    fn record_completion(&self, record: &CompletionRecord) -> Result<()> {
        (**self).record_completion(record)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    /// Per-attempt limit, connect through response body.
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// POSTs completions to `<base_url>/api/v1/log/session`.
///
/// Fire-and-forget: `record_completion` returns once delivery is handed off.
/// Network errors and 5xx responses are retried with exponential backoff;
/// other statuses fail immediately.
///
/// Deliveries spawned on a runtime are tracked; a caller about to shut that
/// runtime down should [`flush`](Self::flush) first. Clones share the
/// pending set.
#[derive(Debug, Clone)]
pub struct HttpStatsRecorder {
    client: Client,
    endpoint: Url,
    auth_token: Option<String>,
    retry: RetryPolicy,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl HttpStatsRecorder {
    pub fn new(base_url: &str, auth_token: Option<String>, retry: RetryPolicy) -> Result<Self> {
        let raw = format!("{}/api/v1/log/session", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&raw).map_err(|e| ConfigError::InvalidValue {
            key: "stats_api.base_url".into(),
            message: e.to_string(),
        })?;
        let client = Client::builder().timeout(retry.request_timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            auth_token,
            retry,
            pending: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn from_config(cfg: &StatsApiConfig) -> Result<Self> {
        Self::new(&cfg.base_url, cfg.auth_token.clone(), cfg.retry_policy())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Deliveries spawned and not yet finished.
    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .map(|pending| pending.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }

    /// Wait up to `limit` for spawned deliveries. Returns `false` when the
    /// limit ran out first; unfinished deliveries are then aborted.
    pub async fn flush(&self, limit: Duration) -> bool {
        let mut handles: Vec<JoinHandle<()>> = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => return true,
        };
        if handles.is_empty() {
            return true;
        }

        let drained = tokio::time::timeout(limit, async {
            for handle in handles.iter_mut() {
                let _ = handle.await;
            }
        })
        .await
        .is_ok();

        if !drained {
            tracing::warn!(
                count = handles.len(),
                "stats API deliveries still pending at shutdown; abandoning"
            );
            for handle in &handles {
                handle.abort();
            }
        }
        drained
    }

    /// Deliver one record, retrying per the policy.
    ///
    /// # Errors
    /// Returns the last failure once attempts are exhausted, or immediately
    /// for a non-retryable status.
    pub async fn deliver(&self, record: &CompletionRecord) -> Result<()> {
        let session_type = if record.mode == Phase::Work { "focus" } else { "break" };
        let body = json!({
            "session_type": session_type,
            "minutes_spent": record.duration_seconds / 60,
            "duration_seconds": record.duration_seconds,
            "completed_at": record.completed_at.to_rfc3339(),
        });

        let max_attempts = self.retry.max_attempts.max(1);
        let mut delay = self.retry.initial_backoff;

        for attempt in 1..=max_attempts {
            let mut request = self.client.post(self.endpoint.clone()).json(&body);
            if let Some(token) = &self.auth_token {
                request = request.bearer_auth(token);
            }
            let last = attempt == max_attempts;

            match request.send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::info!(attempt, "completion delivered to stats API");
                    return Ok(());
                }
                Ok(resp) if resp.status().is_server_error() && !last => {
                    tracing::warn!(attempt, status = %resp.status(), "stats API error; retrying");
                }
                Ok(resp) => {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();
                    return Err(CoreError::StatsApi {
                        message: format!("HTTP {status}: {text}"),
                        source: None,
                    });
                }
                Err(e) if !last => {
                    tracing::warn!(attempt, error = %e, "stats API unreachable; retrying");
                }
                Err(e) => return Err(e.into()),
            }

            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2);
        }

        Err(CoreError::StatsApi {
            message: "no delivery attempts made".into(),
            source: None,
        })
    }
}

impl StatsRecorder for HttpStatsRecorder {
    fn record_completion(&self, record: &CompletionRecord) -> Result<()> {
        if self.auth_token.is_none() {
            tracing::warn!("not authenticated; skipping stats API delivery");
            return Ok(());
        }

        let this = self.clone();
        let record = record.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let task = handle.spawn(async move {
                    if let Err(e) = this.deliver(&record).await {
                        tracing::warn!(error = %e, "stats API delivery failed");
                    }
                });
                if let Ok(mut pending) = self.pending.lock() {
                    pending.retain(|h| !h.is_finished());
                    pending.push(task);
                }
            }
            Err(_) => {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()?;
                if let Err(e) = runtime.block_on(this.deliver(&record)) {
                    tracing::warn!(error = %e, "stats API delivery failed");
                }
            }
        }
        Ok(())
    }
}
