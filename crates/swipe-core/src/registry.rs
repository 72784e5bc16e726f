#![forbid(unsafe_code)]

//! Controllers keyed by row identity.
//!
//! [`RowRegistry`] creates a [`RowController`] when a row mounts and drops it
//! when the row unmounts, so per-row state lives exactly as long as the row.
//! All controllers share one validated [`SwipeConfig`].
//!
//! With [`RowRegistry::with_commit_channel`], a committed row sends its key
//! down an `mpsc` channel instead of running a closure. The application's
//! control thread drains the receiver, whichever thread ticked the settle.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use ahash::RandomState;
use tracing::{debug, warn};
use web_time::Instant;

use crate::config::SwipeConfig;
use crate::controller::{CommitCallback, RowController};
use crate::error::Result;
use crate::logging::TARGET;

/// Map from row key to its controller.
pub struct RowRegistry<K> {
    config: Arc<SwipeConfig>,
    rows: HashMap<K, Arc<RowController>, RandomState>,
    commits: Option<Sender<K>>,
}

impl<K: Debug> Debug for RowRegistry<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowRegistry")
            .field("rows", &self.rows.len())
            .field("commit_channel", &self.commits.is_some())
            .finish()
    }
}

impl<K> RowRegistry<K>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
{
    /// Registry whose rows commit through per-row closures.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `config` fails validation.
    pub fn new(config: SwipeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            rows: HashMap::with_hasher(RandomState::new()),
            commits: None,
        })
    }

    /// Registry whose rows report commits on the returned receiver.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `config` fails validation.
    pub fn with_commit_channel(config: SwipeConfig) -> Result<(Self, Receiver<K>)> {
        let (tx, rx) = mpsc::channel();
        let mut registry = Self::new(config)?;
        registry.commits = Some(tx);
        Ok((registry, rx))
    }

    #[must_use]
    pub fn config(&self) -> &SwipeConfig {
        &self.config
    }

    /// Mount `key`, reporting its commit on the registry channel (if any).
    ///
    /// Mounting a key that is already present returns the existing
    /// controller unchanged.
    pub fn mount(&mut self, key: K) -> Arc<RowController> {
        let callback: CommitCallback = match &self.commits {
            Some(tx) => {
                let tx = tx.clone();
                let sent = key.clone();
                Box::new(move || {
                    if tx.send(sent).is_err() {
                        warn!(target: TARGET, "commit receiver dropped");
                    }
                })
            }
            None => Box::new(|| {}),
        };
        self.insert(key, callback)
    }

    /// Mount `key` with its own commit closure.
    pub fn mount_with(
        &mut self,
        key: K,
        on_commit: impl FnOnce() + Send + 'static,
    ) -> Arc<RowController> {
        self.insert(key, Box::new(on_commit))
    }

    fn insert(&mut self, key: K, callback: CommitCallback) -> Arc<RowController> {
        if let Some(existing) = self.rows.get(&key) {
            return Arc::clone(existing);
        }
        let controller = Arc::new(RowController::with_validated(
            Arc::clone(&self.config),
            callback,
        ));
        debug!(target: TARGET, key = ?key, row = controller.id(), "row mounted");
        self.rows.insert(key, Arc::clone(&controller));
        controller
    }

    /// Drop the row's state. A pending commit callback is dropped with it.
    pub fn unmount(&mut self, key: &K) -> Option<Arc<RowController>> {
        let removed = self.rows.remove(key);
        if let Some(ctl) = &removed {
            debug!(target: TARGET, key = ?key, row = ctl.id(), "row unmounted");
        }
        removed
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<Arc<RowController>> {
        self.rows.get(key).cloned()
    }

    /// Reconcile with the list's visible keys: unmount everything not in
    /// `visible`. Returns how many rows were dropped.
    pub fn retain_mounted<'a>(&mut self, visible: impl IntoIterator<Item = &'a K>) -> usize
    where
        K: 'a,
    {
        let keep: std::collections::HashSet<&K, RandomState> = visible.into_iter().collect();
        let before = self.rows.len();
        self.rows.retain(|k, _| keep.contains(k));
        before - self.rows.len()
    }

    /// Tick every row that has an animation in motion. Returns how many
    /// rows were ticked.
    pub fn tick_all(&self, now: Instant) -> usize {
        let mut ticked = 0;
        for ctl in self.rows.values() {
            if ctl.needs_tick() {
                ctl.tick(now);
                ticked += 1;
            }
        }
        ticked
    }

    /// Whether any row still needs frames.
    #[must_use]
    pub fn needs_tick(&self) -> bool {
        self.rows.values().any(|ctl| ctl.needs_tick())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.rows.keys()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
