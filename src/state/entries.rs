//! Cached list of the user's suggestion entries.
//!
//! DESIGN
//! ======
//! The cache is a mirror of the server, never edited locally. A successful
//! fetch replaces it wholesale; a deletion is followed by a refetch because
//! entry numbers are assigned by the server and can shift. Failures land in
//! the `error` slot and leave the last good list in place.
//!
//! Each refresh takes a generation number; a response is applied only if no
//! newer refresh started in the meantime.

#[cfg(test)]
#[path = "entries_test.rs"]
mod entries_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use super::store::Store;
use crate::net::{ApiError, Entry, SurveyApi};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntriesState {
    pub items: Vec<Entry>,
    pub loading: bool,
    pub error: Option<String>,
}

impl EntriesState {
    /// Entries paired with the number to display for each.
    pub fn numbered(&self) -> impl Iterator<Item = (i64, &Entry)> {
        self.items
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.display_number(position), entry))
    }
}

#[derive(Clone)]
pub struct EntryRepository {
    api: SurveyApi,
    state: Store<EntriesState>,
    generation: Arc<AtomicU64>,
}

impl EntryRepository {
    #[must_use]
    pub fn new(api: SurveyApi) -> Self {
        Self { api, state: Store::new(EntriesState::default()), generation: Arc::new(AtomicU64::new(0)) }
    }

    #[must_use]
    pub fn snapshot(&self) -> EntriesState {
        self.state.get()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EntriesState> {
        self.state.subscribe()
    }

    /// Refetch the full list and replace the cache.
    ///
    /// # Errors
    ///
    /// Returns the fetch error after recording its message in the error
    /// slot; the previous list is kept.
    pub async fn refresh(&self) -> Result<Vec<Entry>, ApiError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.update(|s| s.loading = true);

        let result = self.api.list_entries().await;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "discarding superseded entry refresh");
            return result;
        }

        match &result {
            Ok(items) => {
                tracing::info!(count = items.len(), "entries refreshed");
                let items = items.clone();
                self.state.update(|s| {
                    s.items = items;
                    s.loading = false;
                    s.error = None;
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "entry refresh failed; keeping cached list");
                let message = e.to_string();
                self.state.update(|s| {
                    s.loading = false;
                    s.error = Some(message);
                });
            }
        }
        result
    }

    /// Delete the entry with server id `id`, then refetch.
    ///
    /// Confirming the deletion with the user is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns the delete error (recorded in the error slot) without
    /// refetching, or the error of the follow-up refresh.
    pub async fn remove(&self, id: i64) -> Result<Vec<Entry>, ApiError> {
        if let Err(e) = self.api.delete_entry(id).await {
            tracing::warn!(id, error = %e, "entry delete failed");
            let message = e.to_string();
            self.state.update(|s| s.error = Some(message));
            return Err(e);
        }
        tracing::info!(id, "entry deleted");
        self.refresh().await
    }

    /// Drop the cached list and any error; used when the session ends.
    pub(crate) fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.set(EntriesState::default());
    }
}
