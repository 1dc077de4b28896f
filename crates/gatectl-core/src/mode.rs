// ── Gateway mode cell ──
//
// Whether the gateway serves an editable local config or is driven by
// xDS. One owned cell per process, broadcast to subscribers through a
// `watch` channel. Lifecycle: `init` → `set`/`subscribe` → `close`.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum GatewayMode {
    /// Not probed yet.
    #[default]
    Unknown,
    /// Local config file; edits allowed.
    Local,
    /// xDS-driven; the local document is read-only.
    Xds,
}

impl GatewayMode {
    pub fn is_read_only(self) -> bool {
        self == Self::Xds
    }
}

/// Shared, observable gateway mode. Clones share the same cell.
#[derive(Debug, Clone)]
pub struct ModeCell {
    inner: Arc<ModeInner>,
}

#[derive(Debug)]
struct ModeInner {
    /// `None` once closed; subscribers then see the channel end.
    tx: Mutex<Option<watch::Sender<GatewayMode>>>,
    rx: watch::Receiver<GatewayMode>,
}

impl ModeCell {
    /// Create a cell in the `Unknown` state.
    pub fn init() -> Self {
        let (tx, rx) = watch::channel(GatewayMode::Unknown);
        Self {
            inner: Arc::new(ModeInner {
                tx: Mutex::new(Some(tx)),
                rx,
            }),
        }
    }

    pub fn get(&self) -> GatewayMode {
        *self.inner.rx.borrow()
    }

    /// Receive every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<GatewayMode> {
        self.inner.rx.clone()
    }

    /// Record a new mode. Subscribers are only woken on an actual change.
    /// Returns `false` after `close`.
    pub fn set(&self, mode: GatewayMode) -> bool {
        let guard = self.inner.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = guard.as_ref() else {
            return false;
        };
        tx.send_if_modified(|current| {
            if *current == mode {
                return false;
            }
            debug!(from = %current, to = %mode, "gateway mode changed");
            *current = mode;
            true
        });
        true
    }

    /// Stop broadcasting. The last value stays readable through `get`.
    pub fn close(&self) {
        self.inner
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_closed(&self) -> bool {
        self.inner
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl Default for ModeCell {
    fn default() -> Self {
        Self::init()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_changes() {
        let cell = ModeCell::init();
        let mut rx = cell.subscribe();
        assert_eq!(cell.get(), GatewayMode::Unknown);

        assert!(cell.set(GatewayMode::Xds));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), GatewayMode::Xds);
        assert!(cell.get().is_read_only());
    }

    #[tokio::test]
    async fn same_value_does_not_notify() {
        let cell = ModeCell::init();
        cell.set(GatewayMode::Local);
        let mut rx = cell.subscribe();
        rx.borrow_and_update();
        cell.set(GatewayMode::Local);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn close_ends_the_channel() {
        let cell = ModeCell::init();
        let clone = cell.clone();
        let mut rx = cell.subscribe();
        cell.set(GatewayMode::Local);
        clone.close();

        assert!(cell.is_closed());
        assert!(!cell.set(GatewayMode::Xds));
        assert_eq!(cell.get(), GatewayMode::Local);
        rx.borrow_and_update();
        assert!(rx.changed().await.is_err());
    }
}
