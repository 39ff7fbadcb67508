//! Change notification for progress trees
//!
//! A single revision counter owned by the tree root. Producers bump it on
//! every successful update; observers wait for it to move and then re-read
//! aggregates. Wakeups coalesce under load: the payload is only "re-read
//! now", so dropped intermediate deliveries lose nothing as long as one
//! arrives after the most recent change, which the watch channel
//! guarantees.

use tokio::sync::watch;

/// Sender half, owned by the tree.
#[derive(Debug)]
pub(crate) struct ChangeSignal {
    tx: watch::Sender<u64>,
}

impl ChangeSignal {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx }
    }

    /// Bump the revision. Never blocks the caller; delivery is a no-op
    /// when nobody is subscribed.
    pub(crate) fn raise(&self) {
        self.tx.send_modify(|rev| *rev += 1);
    }

    pub(crate) fn subscribe(&self) -> ChangeListener {
        ChangeListener {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiver half handed to observers.
///
/// Dropping a listener, or all of them, does not affect tree data.
#[derive(Debug, Clone)]
pub struct ChangeListener {
    rx: watch::Receiver<u64>,
}

impl ChangeListener {
    /// Wait until the revision moves past the last one this listener saw,
    /// then return it. Returns `None` once the tree is gone.
    pub async fn changed(&mut self) -> Option<u64> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Current revision without waiting. One bump per successful update,
    /// regardless of how deliveries coalesced.
    pub fn revision(&self) -> u64 {
        *self.rx.borrow()
    }
}
