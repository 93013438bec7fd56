//! Scoped close/reopen of the store connection.
//!
//! `TodoStore::detach` closes the connection and returns a [`DetachedStore`].
//! Whatever happens while the guard is alive, dropping it reopens the
//! connection; [`DetachedStore::reattach`] does the same but reports failure.

use std::path::Path;

use tracing::{error, warn};

use crate::error::Result;
use crate::storage::sqlite::{ConnectionState, TodoStore};

/// A store whose connection is closed for file-level work.
///
/// Holds the store's unique borrow, so nothing else can use the store until
/// the guard is gone.
#[must_use = "dropping the guard immediately reopens the connection"]
pub struct DetachedStore<'a> {
    store: &'a mut TodoStore,
    reattached: bool,
}

impl<'a> DetachedStore<'a> {
    pub(crate) fn new(store: &'a mut TodoStore) -> Self {
        Self {
            store,
            reattached: false,
        }
    }

    /// Path of the closed database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.store.state()
    }

    /// Reopen the connection and report whether it worked.
    ///
    /// # Errors
    ///
    /// Returns `Error::StorageInit` if the file cannot be reopened; the store
    /// is then left `Closed` and `TodoStore::initialize` can retry.
    pub fn reattach(mut self) -> Result<()> {
        self.reattached = true;
        self.store.reattach()
    }
}

impl Drop for DetachedStore<'_> {
    fn drop(&mut self) {
        if self.reattached {
            return;
        }

        warn!(path = %self.store.path().display(), "Reopening connection on early exit");
        if let Err(e) = self.store.reattach() {
            error!(error = %e, "Failed to reopen connection");
        }
    }
}
