// ── Edit session ──
//
// Drives every edit through the read-modify-write cycle:
//
//   Idle → Fetching → Applying → Persisting → Reconciling → Idle
//                                                   any → Failed
//
// One edit runs at a time. Network awaits race a cancellation token.
// The last-known document only changes after a successful persist.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use gatectl_api::GatewayClient;

use crate::config::{SessionConfig, WriteMode};
use crate::edit::Edit;
use crate::error::{CoreError, FailureReason};
use crate::mode::{GatewayMode, ModeCell};
use crate::model::{Bind, Config, Listener, LoadReport, PrunedReference, RouteLocator};

// ── EditPhase ───────────────────────────────────────────────────────

/// Where the session is in the edit cycle, observable by consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum EditPhase {
    #[default]
    Idle,
    Fetching,
    Applying,
    Persisting,
    Reconciling,
    Failed,
}

impl EditPhase {
    pub fn is_busy(self) -> bool {
        !matches!(self, Self::Idle | Self::Failed)
    }
}

// ── Selection ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerRef {
    pub port: u16,
    pub name: String,
}

/// What the front end currently has focused. Pruned on every reconcile
/// so a stale locator never survives into the next edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub listener: Option<ListenerRef>,
    pub route: Option<RouteLocator>,
    pub target: Option<String>,
}

impl Selection {
    /// Clear every part that no longer resolves. Returns whether anything
    /// was cleared.
    pub fn prune(&mut self, config: &Config) -> bool {
        let mut cleared = false;
        if self
            .listener
            .as_ref()
            .is_some_and(|l| config.find_listener(l.port, &l.name).is_err())
        {
            self.listener = None;
            cleared = true;
        }
        if self.route.as_ref().is_some_and(|at| !config.resolves(at)) {
            self.route = None;
            cleared = true;
        }
        if self
            .target
            .as_ref()
            .is_some_and(|name| config.target(name).is_none())
        {
            self.target = None;
            cleared = true;
        }
        cleared
    }
}

// ── EditOutcome ─────────────────────────────────────────────────────

/// Result of a completed edit.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    /// The document now held as last-known.
    pub config: Arc<Config>,
    /// Target references dropped while loading the reconciled document.
    pub pruned: Vec<PrunedReference>,
    /// `false` when the post-write re-fetch failed and the locally
    /// applied document was kept instead.
    pub reconciled: bool,
    pub selection_cleared: bool,
}

// ── Session ─────────────────────────────────────────────────────────

/// Read-modify-write driver for one gateway.
///
/// Cheaply cloneable via `Arc<SessionInner>`.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    client: GatewayClient,
    phase: watch::Sender<EditPhase>,
    snapshot: watch::Sender<Option<Arc<Config>>>,
    selection: Mutex<Selection>,
    /// Held for the duration of one edit.
    edit_slot: Mutex<()>,
    mode: ModeCell,
    /// Session-wide token; cancelling it aborts any edit in flight.
    cancel: CancellationToken,
}

impl Session {
    /// Create a session with its own mode cell.
    pub fn new(config: SessionConfig) -> Result<Self, CoreError> {
        Self::with_mode(config, ModeCell::init())
    }

    /// Create a session sharing an existing mode cell.
    pub fn with_mode(config: SessionConfig, mode: ModeCell) -> Result<Self, CoreError> {
        let client = GatewayClient::new(config.url.as_str(), &config.transport()).map_err(|e| {
            CoreError::Config {
                message: e.to_string(),
            }
        })?;
        let (phase, _) = watch::channel(EditPhase::Idle);
        let (snapshot, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                client,
                phase,
                snapshot,
                selection: Mutex::new(Selection::default()),
                edit_slot: Mutex::new(()),
                mode,
                cancel: CancellationToken::new(),
            }),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn mode(&self) -> &ModeCell {
        &self.inner.mode
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn phase(&self) -> EditPhase {
        *self.inner.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<EditPhase> {
        self.inner.phase.subscribe()
    }

    /// `true` while an edit is between Fetching and Reconciling.
    pub fn is_busy(&self) -> bool {
        self.phase().is_busy()
    }

    /// The last-known document, if one has been fetched.
    pub fn snapshot(&self) -> Option<Arc<Config>> {
        self.inner.snapshot.borrow().clone()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<Option<Arc<Config>>> {
        self.inner.snapshot.subscribe()
    }

    pub async fn selection(&self) -> Selection {
        self.inner.selection.lock().await.clone()
    }

    pub async fn select(&self, selection: Selection) {
        *self.inner.selection.lock().await = selection;
    }

    /// Abort any edit in flight and refuse network work from now on.
    pub fn cancel(&self) {
        self.inner.cancel.cancel();
    }

    fn set_phase(&self, phase: EditPhase) {
        let prev = self.inner.phase.send_replace(phase);
        if prev != phase {
            debug!(from = %prev, to = %phase, "edit phase");
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Fetch the document and make it the last-known one.
    pub async fn refresh(&self) -> Result<(Arc<Config>, LoadReport), CoreError> {
        let raw = self
            .guarded(&CancellationToken::new(), self.inner.client.get_config())
            .await?
            .map_err(|e| self.fetch_failed(e))?;
        let (config, report) = self.load(raw)?;
        let config = Arc::new(config);
        self.inner.snapshot.send_replace(Some(Arc::clone(&config)));
        self.inner.selection.lock().await.prune(&config);
        Ok((config, report))
    }

    /// Determine whether the gateway serves an editable local config.
    pub async fn probe_mode(&self) -> Result<GatewayMode, CoreError> {
        match self.refresh().await {
            Ok(_) => Ok(GatewayMode::Local),
            Err(CoreError::ReadOnly) => Ok(GatewayMode::Xds),
            Err(e) => Err(e),
        }
    }

    /// `GET /binds`, typed.
    pub async fn list_binds(&self) -> Result<Vec<Bind>, CoreError> {
        self.list_binds_with(&CancellationToken::new()).await
    }

    pub async fn list_binds_with(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Bind>, CoreError> {
        let raw = self
            .guarded(cancel, self.inner.client.list_binds())
            .await??;
        decode_all(raw)
    }

    /// `GET /listeners`, typed.
    pub async fn list_listeners(&self) -> Result<Vec<Listener>, CoreError> {
        self.list_listeners_with(&CancellationToken::new()).await
    }

    pub async fn list_listeners_with(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Listener>, CoreError> {
        let raw = self
            .guarded(cancel, self.inner.client.list_listeners())
            .await??;
        decode_all(raw)
    }

    // ── Edits ────────────────────────────────────────────────────────

    /// Run one edit through the full cycle.
    pub async fn apply(&self, edit: Edit) -> Result<EditOutcome, CoreError> {
        self.apply_with(edit, &CancellationToken::new()).await
    }

    /// Like [`apply`](Self::apply), also aborting when `cancel` fires.
    pub async fn apply_with(
        &self,
        edit: Edit,
        cancel: &CancellationToken,
    ) -> Result<EditOutcome, CoreError> {
        if self.inner.mode.get().is_read_only() {
            return Err(CoreError::ReadOnly);
        }
        let Ok(_slot) = self.inner.edit_slot.try_lock() else {
            return Err(CoreError::EditInProgress);
        };

        let result = self.run(&edit, cancel).await;
        match &result {
            Ok(outcome) => {
                self.set_phase(EditPhase::Idle);
                info!(
                    edit = %edit.describe(),
                    reconciled = outcome.reconciled,
                    "edit applied"
                );
            }
            Err(CoreError::Cancelled) => {
                self.set_phase(EditPhase::Idle);
                debug!(edit = %edit.describe(), "edit cancelled");
            }
            Err(e) => {
                self.set_phase(EditPhase::Failed);
                warn!(edit = %edit.describe(), error = %e, "edit failed");
            }
        }
        result
    }

    async fn run(&self, edit: &Edit, cancel: &CancellationToken) -> Result<EditOutcome, CoreError> {
        let client = &self.inner.client;

        // Fetch the authoritative document.
        self.set_phase(EditPhase::Fetching);
        let raw = self
            .guarded(cancel, client.get_config())
            .await?
            .map_err(|e| self.fetch_failed(e))?;
        let (mut current, _) = self.load(raw)?;
        if let Some(previous) = self.snapshot() {
            current.carry_route_ids(&previous);
        }

        // Exactly one structural edit.
        self.set_phase(EditPhase::Applying);
        let next = edit.apply(&current)?;

        self.set_phase(EditPhase::Persisting);
        self.persist(edit, &current, &next, cancel).await?;

        // Re-read what the gateway actually holds now. The write has
        // landed, so cancellation here only skips the re-read.
        self.set_phase(EditPhase::Reconciling);
        let (stored, pruned, reconciled) = match self.guarded(cancel, client.get_config()).await {
            Ok(Ok(raw)) => match Config::from_value(raw) {
                Ok((mut fresh, report)) => {
                    fresh.carry_route_ids(&next);
                    (fresh, report.pruned, true)
                }
                Err(e) => {
                    warn!(error = %e, "reconciled document did not load; keeping applied copy");
                    (next, Vec::new(), false)
                }
            },
            Ok(Err(e)) => {
                warn!(error = %e, "reconcile fetch failed; keeping applied copy");
                (next, Vec::new(), false)
            }
            Err(e) => {
                warn!(error = %e, "reconcile interrupted after persist; keeping applied copy");
                (next, Vec::new(), false)
            }
        };

        let stored = Arc::new(stored);
        self.inner.snapshot.send_replace(Some(Arc::clone(&stored)));
        let selection_cleared = self.inner.selection.lock().await.prune(&stored);
        if selection_cleared {
            debug!("cleared stale selection");
        }

        Ok(EditOutcome {
            config: stored,
            pruned,
            reconciled,
            selection_cleared,
        })
    }

    async fn persist(
        &self,
        edit: &Edit,
        current: &Config,
        next: &Config,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        let client = &self.inner.client;
        let endpoints = self.inner.config.write_mode == WriteMode::Endpoints;

        let result = match edit {
            Edit::AddListener { port, listener } if endpoints => {
                let body = encode(listener)?;
                self.guarded(cancel, client.create_listener(*port, &body))
                    .await?
            }
            Edit::AddTarget { target } if endpoints => {
                let body = encode(target)?;
                self.guarded(cancel, client.create_target(target.kind.family(), &body))
                    .await?
            }
            Edit::UpdateTarget { target } if endpoints => {
                let body = encode(target)?;
                self.guarded(cancel, client.update_target(target.kind.family(), &body))
                    .await?
            }
            Edit::DeleteTarget { name } if endpoints => {
                let family = current
                    .target(name)
                    .map(|t| t.kind.family())
                    .ok_or_else(|| CoreError::Internal(format!("target '{name}' vanished")))?;
                self.guarded(cancel, client.delete_target(family, name))
                    .await?
            }
            _ => {
                let body = next.to_value()?;
                self.guarded(cancel, client.put_config(&body)).await?
            }
        };
        result.map_err(|e| CoreError::persist(&e))
    }

    // ── Helpers ──────────────────────────────────────────────────────

    /// Race `fut` against both the caller's and the session's token.
    async fn guarded<T, F>(
        &self,
        cancel: &CancellationToken,
        fut: F,
    ) -> Result<Result<T, gatectl_api::Error>, CoreError>
    where
        F: Future<Output = Result<T, gatectl_api::Error>>,
    {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CoreError::Cancelled),
            () = self.inner.cancel.cancelled() => Err(CoreError::Cancelled),
            res = fut => Ok(res),
        }
    }

    /// Map a fetch failure, noting xDS mode when the gateway reports it.
    fn fetch_failed(&self, err: gatectl_api::Error) -> CoreError {
        if err.is_local_config_unavailable() {
            self.inner.mode.set(GatewayMode::Xds);
            return CoreError::ReadOnly;
        }
        CoreError::from(err)
    }

    fn load(&self, raw: serde_json::Value) -> Result<(Config, LoadReport), CoreError> {
        let loaded = Config::from_value(raw).map_err(|e| CoreError::Fetch {
            reason: FailureReason::Decode,
            message: e.to_string(),
        })?;
        self.inner.mode.set(GatewayMode::Local);
        Ok(loaded)
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, CoreError> {
    serde_json::to_value(value).map_err(|e| CoreError::Internal(e.to_string()))
}

fn decode_all<T: serde::de::DeserializeOwned>(
    raw: Vec<serde_json::Value>,
) -> Result<Vec<T>, CoreError> {
    raw.into_iter()
        .map(|v| {
            serde_json::from_value(v).map_err(|e| CoreError::Fetch {
                reason: FailureReason::Decode,
                message: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::RouteRef;
    use serde_json::json;

    #[test]
    fn busy_phases() {
        assert!(!EditPhase::Idle.is_busy());
        assert!(!EditPhase::Failed.is_busy());
        assert!(EditPhase::Persisting.is_busy());
    }

    #[test]
    fn selection_prunes_only_stale_parts() {
        let (config, _) = Config::from_value(json!({
            "binds": [{ "port": 80, "listeners": [{ "name": "l", "routes": [{ "name": "r" }] }] }],
            "targets": [{ "name": "t", "mcp": {} }]
        }))
        .unwrap();

        let mut sel = Selection {
            listener: Some(ListenerRef {
                port: 80,
                name: "l".into(),
            }),
            route: Some(RouteLocator::http(80, "l", RouteRef::Index(3))),
            target: Some("t".into()),
        };
        assert!(sel.prune(&config));
        assert!(sel.listener.is_some());
        assert!(sel.route.is_none());
        assert_eq!(sel.target.as_deref(), Some("t"));
        assert!(!sel.prune(&config));
    }
}
